//! Case conversion filters available in every template.

use std::collections::HashMap;

use heck::{
    ToKebabCase, ToLowerCamelCase, ToPascalCase, ToShoutySnakeCase, ToSnakeCase, ToTitleCase,
};
use tera::{Tera, Value};

type Convert = fn(&str) -> String;

const CASE_FILTERS: &[(&str, Convert)] = &[
    ("snake_case", |s| s.to_snake_case()),
    ("pascal_case", |s| s.to_pascal_case()),
    ("camel_case", |s| s.to_lower_camel_case()),
    ("kebab_case", |s| s.to_kebab_case()),
    ("title_case", |s| s.to_title_case()),
    ("shouty_snake_case", |s| s.to_shouty_snake_case()),
];

/// Register the case filters on `tera`.
pub(crate) fn register(tera: &mut Tera) {
    for &(name, convert) in CASE_FILTERS {
        tera.register_filter(
            name,
            move |value: &Value, _args: &HashMap<String, Value>| -> tera::Result<Value> {
                let s = value
                    .as_str()
                    .ok_or_else(|| tera::Error::msg(format!("{name} filter expects a string")))?;
                Ok(Value::String(convert(s)))
            },
        );
    }
}
