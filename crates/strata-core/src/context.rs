//! The rendering context handed to every template in a render chain.
//!
//! One context lives for a whole top-level render. It carries the frame arena,
//! the pending extension request, the scope, and the options used for
//! sub-renders. Templates talk to it through four instructions: [`extends`],
//! [`block`], [`render`] and [`lookup`].
//!
//! [`extends`]: TemplateContext::extends
//! [`block`]: TemplateContext::block
//! [`render`]: TemplateContext::render
//! [`lookup`]: TemplateContext::lookup

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use serde_json::Value;

use crate::engine::Engine;
use crate::error::{RenderError, RenderResult};
use crate::frame::{BlockProvider, FrameId, FrameStack};
use crate::options::TemplateOptions;
use crate::scope::{EmptyScope, Scope};
use crate::Locals;

/// A template's request to be rendered inside another one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionRequest {
    /// Unresolved path of the template to extend.
    pub path: String,
    /// Locals the extended template is rendered with.
    pub locals: Locals,
}

/// Per-render state shared by every template in one extends chain: the frame
/// arena, the pending extension request, and the scope and options.
pub struct TemplateContext<'e> {
    engine: &'e Engine,
    options: &'e TemplateOptions,
    scope: Arc<dyn Scope>,
    frames: FrameStack,
    extension: Option<ExtensionRequest>,
}

impl fmt::Debug for TemplateContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateContext")
            .field("scope", &self.scope)
            .field("frames", &self.frames)
            .field("extension", &self.extension)
            .finish_non_exhaustive()
    }
}

impl<'e> TemplateContext<'e> {
    /// Create a context with an empty frame arena, using the options' scope or an empty one.
    pub fn new(engine: &'e Engine, options: &'e TemplateOptions) -> Self {
        let scope = options
            .scope
            .clone()
            .unwrap_or_else(|| Arc::new(EmptyScope));
        Self {
            engine,
            options,
            scope,
            frames: FrameStack::new(),
            extension: None,
        }
    }

    /// Options of the render this context belongs to.
    pub fn options(&self) -> &'e TemplateOptions {
        self.options
    }

    /// The frame arena, for inspection.
    pub fn frames(&self) -> &FrameStack {
        &self.frames
    }

    /// Push a frame for the next template in the chain.
    pub fn create_frame(&mut self) -> FrameId {
        self.frames.create_frame()
    }

    /// Ask for the current template to be rendered inside `template_path`.
    /// The last request made during a pass wins.
    pub fn extends(&mut self, template_path: impl Into<String>, locals: Locals) {
        let path = template_path.into();
        if let Some(previous) = &self.extension {
            tracing::warn!(previous = %previous.path, next = %path, "Template extends more than once, keeping the last");
        }
        self.extension = Some(ExtensionRequest { path, locals });
    }

    /// Whether the template being rendered has asked to extend another.
    pub fn is_extending(&self) -> bool {
        self.extension.is_some()
    }

    /// Return and clear the pending extension request.
    pub fn take_extension(&mut self) -> Option<ExtensionRequest> {
        self.extension.take()
    }

    /// Declare or render the block `name`.
    ///
    /// While the current template is extending another, this declares `name` in
    /// the current frame and produces nothing. Otherwise the nearest frame that
    /// declared `name` supplies the content, rendered with that frame's parent
    /// made current so nested blocks delegate one level further. Without any
    /// declaration the given default is rendered, or nothing at all.
    ///
    /// Fails with [`RenderError::InvalidUsage`] only when no template has been
    /// rendered through this context yet.
    pub fn block(&mut self, name: &str, provider: Option<BlockProvider>) -> RenderResult<String> {
        if self.frames.is_empty() {
            return Err(RenderError::invalid_usage(name));
        }
        // Inside an override from the leaf-most template there is no frame
        // further down the chain, so only the default can apply.
        let Some(current) = self.frames.current() else {
            return self.render_default(provider);
        };

        if self.is_extending() {
            let provider = provider.ok_or_else(|| RenderError::missing_provider(name))?;
            if self.frames.declare(current, name, provider) {
                tracing::warn!(block = name, frame = current.index(), "Block declared twice in one template, keeping the last");
            } else {
                tracing::trace!(block = name, frame = current.index(), "Declared block");
            }
            return Ok(String::new());
        }

        if let Some((declaring, declared)) = self.frames.find_declaring(name, current) {
            tracing::trace!(block = name, frame = declaring.index(), "Rendering block override");
            let parent = self.frames.parent_of(declaring);
            return self.with_frame(parent, |ctx| declared(ctx));
        }

        self.render_default(provider)
    }

    fn render_default(&mut self, provider: Option<BlockProvider>) -> RenderResult<String> {
        match provider {
            Some(default) => default(self),
            None => Ok(String::new()),
        }
    }

    /// [`block`](Self::block) with a default content closure.
    pub fn block_with<F>(&mut self, name: &str, default: F) -> RenderResult<String>
    where
        F: Fn(&mut TemplateContext<'_>) -> RenderResult<String> + 'static,
    {
        self.block(name, Some(Rc::new(default)))
    }

    /// [`block`](Self::block) without default content.
    pub fn slot(&mut self, name: &str) -> RenderResult<String> {
        self.block(name, None)
    }

    /// Run `f` with `frame` as the current frame, restoring the previous one afterwards.
    pub fn with_frame<T>(
        &mut self,
        frame: Option<FrameId>,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.frames.set_current(frame);
        let result = f(self);
        self.frames.set_current(previous);
        result
    }

    /// Render an independent template with the same options but a fresh context.
    pub fn render(&self, template_path: &str, locals: &Locals) -> RenderResult<String> {
        self.engine.render(template_path, locals, self.options)
    }

    /// Resolve a bare name against the scope.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        self.scope.lookup(name)
    }

    /// The scope bare names resolve against.
    pub fn scope(&self) -> &dyn Scope {
        self.scope.as_ref()
    }
}
