//! Read template files from disk and decode them to text.

use std::path::Path;

use encoding_rs::Encoding;
use strata_core::{RenderError, RenderResult};

/// Read the template at `path`, decoding it with the encoding named by `label`.
///
/// A byte-order mark overrides the label. Malformed sequences are replaced
/// rather than rejected, and logged.
pub(crate) fn read_template(path: &Path, label: &str) -> RenderResult<String> {
    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| RenderError::config(format!("unknown encoding: {label}")))?;
    let bytes = std::fs::read(path).map_err(|e| RenderError::resolution(path, e))?;

    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        tracing::warn!(?path, encoding = used.name(), "Template contains malformed sequences");
    }
    Ok(text.into_owned())
}
