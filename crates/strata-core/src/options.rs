//! Template options: path resolution, text decoding and engine pass-through settings.
//!
//! Options deserialize from TOML with kebab-case keys. Keys that are not
//! recognized here are kept verbatim in [`TemplateOptions::engine`] and handed
//! to the template compiler untouched.
//!
//! ```toml
//! base-path = "templates"
//! suffix = ".tera"
//! default-encoding = "utf-8"
//! max-extends-depth = 32
//! escape-html = true
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{RenderError, RenderResult};
use crate::scope::Scope;

fn default_suffix() -> String {
    ".tera".to_string()
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

fn default_outvar() -> String {
    "_output".to_string()
}

/// Options shared by every template rendered in one top-level render call,
/// including independent sub-renders.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TemplateOptions {
    /// Object whose members are visible by bare name inside templates.
    #[serde(skip)]
    pub scope: Option<Arc<dyn Scope>>,

    /// Directory prefix for template paths. Paths are used as given when unset.
    pub base_path: Option<PathBuf>,

    /// Suffix appended to every template path before resolution.
    #[serde(default = "default_suffix")]
    pub suffix: String,

    /// Encoding label used to decode template files.
    #[serde(default = "default_encoding")]
    pub default_encoding: String,

    /// Name of the output accumulator, passed through to the compiler.
    #[serde(default = "default_outvar")]
    pub outvar: String,

    /// Maximum number of ancestors an extends chain may render. Unbounded when unset.
    pub max_extends_depth: Option<usize>,

    /// Engine-specific options (e.g. `escape_html`), passed through unmodified.
    #[serde(flatten)]
    pub engine: serde_json::Map<String, Value>,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        Self {
            scope: None,
            base_path: None,
            suffix: default_suffix(),
            default_encoding: default_encoding(),
            outvar: default_outvar(),
            max_extends_depth: None,
            engine: serde_json::Map::new(),
        }
    }
}

impl TemplateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a TOML document.
    pub fn from_toml_str(contents: &str) -> RenderResult<Self> {
        toml::from_str(contents).map_err(|e| RenderError::config(e.to_string()))
    }

    /// Load options from a TOML file.
    pub fn load(path: &Path) -> RenderResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            RenderError::config(format!("failed to read {}: {e}", path.display()))
        })?;
        let options = toml::from_str(&contents).map_err(|e| {
            RenderError::config(format!("failed to parse {}: {e}", path.display()))
        })?;
        tracing::debug!(?path, "Loaded template options");
        Ok(options)
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Scope + 'static) -> Self {
        self.scope = Some(Arc::new(scope));
        self
    }

    #[must_use]
    pub fn with_base_path(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.default_encoding = label.into();
        self
    }

    #[must_use]
    pub fn with_max_extends_depth(mut self, limit: usize) -> Self {
        self.max_extends_depth = Some(limit);
        self
    }

    #[must_use]
    pub fn with_engine_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.engine.insert(key.into(), value);
        self
    }

    /// Look up an engine option, accepting either `snake_case` or `kebab-case` keys.
    pub fn engine_option(&self, key: &str) -> Option<&Value> {
        self.engine
            .get(key)
            .or_else(|| self.engine.get(&key.replace('_', "-")))
    }

    /// Read a boolean engine option; absent or non-boolean values are `false`.
    pub fn engine_flag(&self, key: &str) -> bool {
        self.engine_option(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Resolve a template path: append the suffix, then join with the base path.
    pub fn resolve(&self, template_path: &str) -> PathBuf {
        let file = format!("{template_path}{}", self.suffix);
        match &self.base_path {
            Some(base) => base.join(file),
            None => PathBuf::from(file),
        }
    }
}
