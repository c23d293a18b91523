//! Template inheritance core for Strata.
//!
//! A child template asks to be rendered inside a parent with `extends`, and the
//! parent marks named insertion points with `block`. The child's declarations
//! are kept in a frame arena that stays alive while the render loop walks up
//! the extends chain, so every ancestor sees the overrides declared below it.
//!
//! This crate does not parse template source. Engines plug in through
//! [`TemplateCompiler`] and [`CompiledTemplate`]; `strata-tera` provides one
//! backed by Tera.
//!
//! # Modules
//!
//! - [`context`] — Per-render context: `extends`, `block`, sub-renders, scope lookup
//! - [`engine`] — The extends render loop and the compiled template cache
//! - [`error`] — Render error types
//! - [`frame`] — Frame arena and block lookup
//! - [`options`] — Template options and TOML configuration
//! - [`scope`] — Scope capability trait and bindings
//! - [`template`] — Compiler seams and closure-backed templates

pub mod context;
pub mod engine;
pub mod error;
pub mod frame;
pub mod options;
pub mod scope;
pub mod template;

/// Variables a template is rendered with.
pub type Locals = serde_json::Map<String, serde_json::Value>;

pub use context::{ExtensionRequest, TemplateContext};
pub use engine::Engine;
pub use error::{EngineError, RenderError, RenderResult};
pub use frame::{BlockProvider, FrameId, FrameStack};
pub use options::TemplateOptions;
pub use scope::{EmptyScope, Scope, ScopeBindings};
pub use template::{CompiledTemplate, FnTemplate, InMemoryCompiler, TemplateCompiler};
