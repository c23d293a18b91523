//! Helpers for end-to-end rendering tests
//!
// Not every test target uses every helper.
#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Once;

use serde_json::Value;
use strata::Locals;
use tempfile::TempDir;

static TRACING: Once = Once::new();

/// Install a test-friendly subscriber once per test binary.
///
/// Set `RUST_LOG=strata_core=trace` to follow frame and block resolution.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Template files used across the inheritance tests, written with the
/// default `.tera` suffix.
const FIXTURES: &[(&str, &str)] = &[
    (
        "basic.text",
        "Basic\n{% for item in items %}{{ item }}\n{% endfor %}",
    ),
    (
        "base.text",
        "Base\n\
         {@ block title @}Default Title{@ endblock @}\n\
         {@ block subtitle @}Default Subtitle{@ endblock @}\n",
    ),
    (
        "one_step_1.text",
        "{@ extends \"base.text\" @}\n\
         {@ block title @}Title{@ endblock @}\n\
         {@ block subtitle @}Subtitle{@ endblock @}\n",
    ),
    ("parent_locals_1.text", "Base\n{{ first }}\n"),
    (
        "parent_locals_2.text",
        "{@ extends \"parent_locals_1.text\" first=items.0 @}\n",
    ),
    (
        "two_step_1.text",
        "{@ extends \"base.text\" @}\n\
         {@ block title @}Title{@ endblock @}\n",
    ),
    (
        "two_step_2.text",
        "{@ extends \"two_step_1.text\" @}\n\
         {@ block subtitle @}Subtitle{@ endblock @}\n",
    ),
    (
        "nested_two_step_1.text",
        "{@ extends \"base.text\" @}\n\
         {@ block title @}Title - {@ slot title @}{@ endblock @}\n",
    ),
    (
        "nested_two_step_2.text",
        "{@ extends \"nested_two_step_1.text\" @}\n\
         {@ block title @}Subtitle{@ endblock @}\n",
    ),
    ("scope_object.text", "Base\n{{ some_text }}\n"),
    (
        "sanitized.html",
        "{% set amp = \"&\" %}Sanitized {{ amp }}\nNot sanitized {{ amp | safe }}\n",
    ),
    (
        "with_sub_template.html",
        "<h1>Title</h1>\n{@ render \"subtitle.html\" text=\"Subtitle\" @}\n",
    ),
    ("subtitle.html", "<h2>{{ text }}</h2>\n"),
    (
        "layouts/page.html",
        "<title>{@ block title @}Default{@ endblock @}</title>\n\
         <main>\n\
         {@ block content @}\n\
         <p>No content</p>\n\
         {@ endblock @}\n\
         </main>\n",
    ),
    (
        "child.html",
        "{@ extends \"layouts/page.html\" @}\n\
         {@ block title @}Child Title{@ endblock @}\n",
    ),
    ("main_layout", "<main>{@ block content @}{@ endblock @}</main>"),
    (
        "nested_leaf",
        "{@ extends \"main_layout\" @}\n\
         {@ block content @}X{@ block inner @}I{@ endblock @}{@ endblock @}\n",
    ),
    ("brackets", "[{@ slot t @}]"),
    (
        "declared_twice",
        "{@ extends \"brackets\" @}\n\
         {@ block t @}first{@ endblock @}\n\
         {@ block t @}second{@ endblock @}\n",
    ),
    (
        "maybe_framed",
        "{@ if framed @}\n\
         {@ extends \"main_layout\" @}\n\
         {@ block content @}{{ title }}{@ endblock @}\n\
         {@ else @}\n\
         {{ title }}\n\
         {@ endif @}\n",
    ),
    (
        "quoted_args",
        "{@ render \"subtitle.html\" text=\"Q@}A\" @}\n",
    ),
    ("cycle_a", "{@ extends \"cycle_b\" @}\n"),
    ("cycle_b", "{@ extends \"cycle_a\" @}\n"),
    ("orphan", "{@ extends \"nowhere\" @}\n"),
];

/// Write every fixture into a fresh temporary directory.
pub fn fixture_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (name, source) in FIXTURES {
        write_template(dir.path(), name, source);
    }
    dir
}

/// Write `source` as the template `name` (suffix appended) under `root`.
pub fn write_template(root: &Path, name: &str, source: &str) {
    let path = root.join(format!("{name}.tera"));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create template dir");
    }
    fs::write(path, source).expect("write template");
}

/// Build locals from a JSON object literal.
pub fn locals(value: Value) -> Locals {
    match value {
        Value::Object(map) => map,
        other => panic!("locals must be a JSON object, got {other}"),
    }
}

/// Assert that every expected line appears among the output's lines.
pub fn assert_lines_match(content: &str, expected: &[&str]) {
    let lines: Vec<&str> = content.lines().collect();
    for line in expected {
        assert!(
            lines.contains(line),
            "expected line {line:?} in output:\n{content}"
        );
    }
}
