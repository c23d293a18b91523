//! Strata: template inheritance with `extends` and wrappable blocks.
//!
//! A child template extends a parent and fills the parent's named blocks. Chains
//! may be arbitrarily deep, and an intermediate template's block can wrap the
//! content supplied further down the chain by calling the same block again.
//!
//! This crate bundles the inheritance core ([`strata_core`]) with the Tera-backed
//! compiler ([`strata_tera`]) and offers a [`render`] function backed by one
//! engine per thread.
//!
//! ```no_run
//! use serde_json::json;
//! use strata::{Locals, TemplateOptions};
//!
//! let options = TemplateOptions::new().with_base_path("templates");
//! let mut locals = Locals::new();
//! locals.insert("items".to_string(), json!(["a", "b"]));
//!
//! // Renders templates/posts/index.html.tera and every template it extends.
//! let html = strata::render("posts/index.html", &locals, &options)?;
//! # Ok::<(), strata::RenderError>(())
//! ```

pub use strata_core::{
    BlockProvider, CompiledTemplate, EmptyScope, Engine, EngineError, ExtensionRequest,
    FnTemplate, FrameId, FrameStack, InMemoryCompiler, Locals, RenderError, RenderResult, Scope,
    ScopeBindings, TemplateCompiler, TemplateContext, TemplateOptions,
};
pub use strata_tera::{TeraCompiler, TeraTemplate, ESCAPE_HTML};

thread_local! {
    static ENGINE: Engine = tera_engine();
}

/// Create an engine backed by the Tera compiler, with its own template cache.
pub fn tera_engine() -> Engine {
    Engine::new(TeraCompiler::new())
}

/// Render `template_path` through this thread's engine.
///
/// Compiled templates are cached per thread by resolved path; edits to a
/// template file are not picked up until [`clear_cache`] is called.
pub fn render(
    template_path: &str,
    locals: &Locals,
    options: &TemplateOptions,
) -> RenderResult<String> {
    ENGINE.with(|engine| engine.render(template_path, locals, options))
}

/// Drop this thread's compiled templates.
pub fn clear_cache() {
    ENGINE.with(Engine::clear_cache);
}
