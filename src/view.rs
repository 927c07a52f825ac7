//! Template rendering hook for [`crate::PdfLayer::load_view`].
//!
//! The client does not ship a template engine. Applications plug theirs in
//! by implementing [`ViewRenderer`]; a plain closure works too.

use crate::error::PdfLayerError;
use serde_json::Value;

/// Turns a view name plus data into an HTML string.
pub trait ViewRenderer: Send + Sync {
    /// Render `view` with `data`; `merge_data` is layered on top of `data`
    /// by engines that support it.
    fn render(&self, view: &str, data: &Value, merge_data: &Value) -> Result<String, PdfLayerError>;
}

impl<F> ViewRenderer for F
where
    F: Fn(&str, &Value, &Value) -> Result<String, PdfLayerError> + Send + Sync,
{
    fn render(&self, view: &str, data: &Value, merge_data: &Value) -> Result<String, PdfLayerError> {
        self(view, data, merge_data)
    }
}
