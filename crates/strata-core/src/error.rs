//! # Render Error Types
//!
//! Every failure aborts the top-level render that triggered it; nothing here is
//! retried, since rendering is deterministic and would fail the same way again.

use std::error::Error as StdError;
use std::path::PathBuf;

use thiserror::Error;

/// Render operation result type
pub type RenderResult<T> = Result<T, RenderError>;

/// Error reported by an underlying template engine
pub type EngineError = Box<dyn StdError + Send + Sync>;

/// Errors raised while resolving, compiling or rendering a template chain
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid block usage: '{block}' called before any template was rendered")]
    InvalidUsage { block: String },

    #[error("Block '{block}' declared while extending a template but no default content was given")]
    MissingProvider { block: String },

    #[error("Failed to read template {}: {source}", path.display())]
    Resolution {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Syntax error in {}: {message}", path.display())]
    Syntax { path: PathBuf, message: String },

    /// `message` joins the engine error with its causes.
    #[error("Failed to compile {}: {message}", path.display())]
    Compile {
        path: PathBuf,
        message: String,
        #[source]
        source: EngineError,
    },

    /// `message` joins the engine error with its causes.
    #[error("Failed to render {}: {message}", path.display())]
    Render {
        path: PathBuf,
        message: String,
        #[source]
        source: EngineError,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Extends chain exceeded {limit} levels at {}", path.display())]
    ExtendsDepthExceeded { path: PathBuf, limit: usize },
}

impl RenderError {
    /// Create an invalid usage error for a block instruction
    pub fn invalid_usage(block: impl Into<String>) -> Self {
        Self::InvalidUsage {
            block: block.into(),
        }
    }

    /// Create a missing provider error for a block declaration
    pub fn missing_provider(block: impl Into<String>) -> Self {
        Self::MissingProvider {
            block: block.into(),
        }
    }

    /// Create a resolution error for a template that could not be read
    pub fn resolution(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resolution {
            path: path.into(),
            source,
        }
    }

    /// Create a syntax error for a malformed template
    pub fn syntax(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Syntax {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a compile error reported by the underlying engine
    pub fn compile(path: impl Into<PathBuf>, source: impl Into<EngineError>) -> Self {
        let source = source.into();
        Self::Compile {
            path: path.into(),
            message: chain_message(source.as_ref()),
            source,
        }
    }

    /// Create a render error reported by the underlying engine
    pub fn render(path: impl Into<PathBuf>, source: impl Into<EngineError>) -> Self {
        let source = source.into();
        Self::Render {
            path: path.into(),
            message: chain_message(source.as_ref()),
            source,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Whether the error was caused by template source (as opposed to usage or I/O)
    #[must_use]
    pub fn is_template_error(&self) -> bool {
        matches!(
            self,
            RenderError::Syntax { .. } | RenderError::Compile { .. } | RenderError::Render { .. }
        )
    }
}

/// Engines tend to wrap the useful message in their source chain.
fn chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
