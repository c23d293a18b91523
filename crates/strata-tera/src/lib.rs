//! Tera-backed template engine for Strata.
//!
//! Template files are Tera source with a handful of inheritance directives
//! delimited by `{@ … @}`. The directives call into the Strata render context;
//! the text between them is compiled and evaluated by Tera with the render's
//! locals and scope bindings.
//!
//! ```text
//! {@ extends "layouts/base" title="Posts" @}
//! {@ block content @}
//! <ul>{% for post in posts %}<li>{{ post.title | title_case }}</li>{% endfor %}</ul>
//! {@ endblock @}
//! ```
//!
//! Tera control structures cannot span a directive: each run of text between
//! directives must be a complete Tera template on its own. To choose between
//! directives, use `{@ if name @} … {@ else @} … {@ endif @}`, which tests a
//! local or scope binding (prefix the name with `not` to negate it):
//!
//! ```text
//! {@ if embedded @}
//! {@ extends "layouts/bare" @}
//! {@ else @}
//! {@ extends "layouts/site" @}
//! {@ endif @}
//! ```
//!
//! # Modules
//!
//! - `compiler` — [`TeraCompiler`] and [`TeraTemplate`]
//! - `filters` — Case conversion filters (`snake_case`, `pascal_case`, …)
//! - `loader` — File reading and decoding
//! - `parser` — Directive parsing

mod compiler;
mod filters;
mod loader;
mod parser;

pub use compiler::{TeraCompiler, TeraTemplate, ESCAPE_HTML};
