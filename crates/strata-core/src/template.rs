//! Seams to the underlying template engine.
//!
//! The core never parses template source. A [`TemplateCompiler`] turns a
//! resolved path into a [`CompiledTemplate`], and the compiled template calls
//! back into the [`TemplateContext`] for `extends` and `block` while it renders.
//!
//! [`InMemoryCompiler`] registers templates written as Rust closures, which is
//! enough to embed layouts in code and to exercise the inheritance machinery
//! without a text engine.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::context::TemplateContext;
use crate::error::{RenderError, RenderResult};
use crate::options::TemplateOptions;
use crate::Locals;

/// A compiled, reusable template unit.
pub trait CompiledTemplate: fmt::Debug + Send + Sync {
    /// Render against the context of the current render chain.
    fn render(&self, ctx: &mut TemplateContext<'_>, locals: &Locals) -> RenderResult<String>;
}

/// Produces compiled templates from resolved paths.
pub trait TemplateCompiler: Send + Sync {
    /// Compile the template at `path`. I/O and syntax failures abort the render.
    fn compile(&self, path: &Path, options: &TemplateOptions)
        -> RenderResult<Arc<dyn CompiledTemplate>>;
}

type RenderFn = dyn Fn(&mut TemplateContext<'_>, &Locals) -> RenderResult<String> + Send + Sync;

/// A template implemented by a Rust closure.
#[derive(Clone)]
pub struct FnTemplate {
    name: String,
    render: Arc<RenderFn>,
}

impl FnTemplate {
    pub fn new<F>(name: impl Into<String>, render: F) -> Self
    where
        F: Fn(&mut TemplateContext<'_>, &Locals) -> RenderResult<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }
}

impl fmt::Debug for FnTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnTemplate").field("name", &self.name).finish()
    }
}

impl CompiledTemplate for FnTemplate {
    fn render(&self, ctx: &mut TemplateContext<'_>, locals: &Locals) -> RenderResult<String> {
        (self.render)(ctx, locals)
    }
}

/// A compiler serving closure templates registered under resolved paths.
#[derive(Debug, Default)]
pub struct InMemoryCompiler {
    templates: HashMap<PathBuf, Arc<FnTemplate>>,
}

impl InMemoryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template under its resolved path (suffix and base path included).
    pub fn add<F>(&mut self, path: impl Into<PathBuf>, render: F)
    where
        F: Fn(&mut TemplateContext<'_>, &Locals) -> RenderResult<String> + Send + Sync + 'static,
    {
        let path = path.into();
        let template = FnTemplate::new(path.display().to_string(), render);
        self.templates.insert(path, Arc::new(template));
    }

    /// Builder form of [`InMemoryCompiler::add`].
    #[must_use]
    pub fn with<F>(mut self, path: impl Into<PathBuf>, render: F) -> Self
    where
        F: Fn(&mut TemplateContext<'_>, &Locals) -> RenderResult<String> + Send + Sync + 'static,
    {
        self.add(path, render);
        self
    }
}

impl TemplateCompiler for InMemoryCompiler {
    fn compile(
        &self,
        path: &Path,
        _options: &TemplateOptions,
    ) -> RenderResult<Arc<dyn CompiledTemplate>> {
        match self.templates.get(path) {
            Some(template) => Ok(Arc::clone(template) as Arc<dyn CompiledTemplate>),
            None => Err(RenderError::resolution(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "template not registered"),
            )),
        }
    }
}
