//! The extends render loop and the compiled template cache.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::context::{ExtensionRequest, TemplateContext};
use crate::error::{RenderError, RenderResult};
use crate::options::TemplateOptions;
use crate::template::{CompiledTemplate, TemplateCompiler};
use crate::Locals;

/// Renders templates through a compiler, following `extends` chains.
///
/// Compiled templates are memoized by resolved path. The cache is safe to share
/// across threads; each call to [`Engine::render`] gets its own context.
pub struct Engine {
    compiler: Arc<dyn TemplateCompiler>,
    cache: DashMap<PathBuf, Arc<dyn CompiledTemplate>>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create an engine with an empty cache around `compiler`.
    pub fn new(compiler: impl TemplateCompiler + 'static) -> Self {
        Self::with_compiler(Arc::new(compiler))
    }

    /// Create an engine around a compiler that is shared with other engines.
    pub fn with_compiler(compiler: Arc<dyn TemplateCompiler>) -> Self {
        Self {
            compiler,
            cache: DashMap::new(),
        }
    }

    /// Render `template_path` and every template it extends, returning the
    /// output of the last template in the chain.
    pub fn render(
        &self,
        template_path: &str,
        locals: &Locals,
        options: &TemplateOptions,
    ) -> RenderResult<String> {
        let mut context = TemplateContext::new(self, options);
        self.render_chain(template_path.to_string(), locals.clone(), options, &mut context)
    }

    fn render_chain(
        &self,
        mut template_path: String,
        mut locals: Locals,
        options: &TemplateOptions,
        context: &mut TemplateContext<'_>,
    ) -> RenderResult<String> {
        let mut depth = 0usize;

        loop {
            context.create_frame();
            let resolved = options.resolve(&template_path);
            let template = self.compiled(&resolved, options)?;

            tracing::debug!(path = %resolved.display(), depth, "Rendering template");
            let content = template.render(context, &locals)?;

            let Some(ExtensionRequest {
                path: parent,
                locals: parent_locals,
            }) = context.take_extension()
            else {
                return Ok(content);
            };

            depth += 1;
            if let Some(limit) = options.max_extends_depth {
                if depth > limit {
                    return Err(RenderError::ExtendsDepthExceeded {
                        path: options.resolve(&parent),
                        limit,
                    });
                }
            }
            tracing::trace!(child = %resolved.display(), parent = %parent, "Template extends parent");
            template_path = parent;
            locals = parent_locals;
        }
    }

    /// Fetch a compiled template, compiling and caching it on first use.
    ///
    /// Two threads may compile the same path at once; the first entry stored wins.
    fn compiled(
        &self,
        resolved: &Path,
        options: &TemplateOptions,
    ) -> RenderResult<Arc<dyn CompiledTemplate>> {
        if let Some(cached) = self.cache.get(resolved) {
            return Ok(Arc::clone(cached.value()));
        }

        tracing::debug!(path = %resolved.display(), "Compiling template");
        let compiled = self.compiler.compile(resolved, options)?;
        let entry = self
            .cache
            .entry(resolved.to_path_buf())
            .or_insert(compiled);
        Ok(Arc::clone(entry.value()))
    }

    /// Number of compiled templates held in the cache.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }

    /// Drop every compiled template, forcing recompilation on next use.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}
