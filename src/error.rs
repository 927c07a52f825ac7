//! Error types for the pdflayer client.
//!
//! Every fallible operation returns [`PdfLayerError`]. The variants fall into
//! a small taxonomy exposed through [`PdfLayerError::kind`]:
//!
//! * **Service**: the remote API answered with an error payload. The
//!   structured [`ServiceError`] carries the service's own code and message.
//! * **Transport**: the HTTP exchange itself failed (DNS, TLS, timeout).
//! * **ResourceRead**: a document source passed to
//!   [`crate::PdfLayer::load_file`] could not be read.
//! * **UndefinedOperation**: a dynamic call named something the client
//!   cannot resolve. Raised before any network activity.
//!
//! Nothing here is retried by the library. Callers that want backoff wrap
//! their own [`crate::Transport`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdflayer client.
#[derive(Debug, Error)]
pub enum PdfLayerError {
    // ── Service errors ────────────────────────────────────────────────────
    /// The API reported a failure in its response body.
    #[error(transparent)]
    Service(#[from] ServiceError),

    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request could not be completed.
    #[error("Request to '{uri}' failed: {reason}\nCheck your internet connection.")]
    Transport { uri: String, reason: String },

    /// The HTTP request exceeded the configured timeout.
    #[error("Request to '{uri}' timed out after {secs}s\nIncrease PDF_LAYER_TIMEOUT.")]
    TransportTimeout { uri: String, secs: u64 },

    // ── Document source errors ────────────────────────────────────────────
    /// A local document source does not exist.
    #[error("Document not found: '{path}'")]
    ResourceNotFound { path: String },

    /// A local document source exists but cannot be read.
    #[error("Permission denied reading '{path}'")]
    ResourcePermissionDenied { path: String },

    /// A local or remote document source could not be read.
    #[error("Failed to read '{path}': {reason}")]
    ResourceReadFailed { path: String, reason: String },

    // ── Dynamic call errors ───────────────────────────────────────────────
    /// The name is neither a known operation nor a `set…` option setter.
    #[error("Call to undefined method PdfLayer::{name}()")]
    UndefinedOperation { name: String },

    /// The name belongs to an operation that has to be called directly.
    #[error("PdfLayer::{name}() cannot be called with a single option value")]
    ReservedOperation { name: String },

    // ── View errors ───────────────────────────────────────────────────────
    /// `load_view` was called on a client built without a view renderer.
    #[error("No view renderer configured; cannot render view '{view}'")]
    ViewRendererMissing { view: String },

    /// The view renderer failed.
    #[error("Failed to render view '{view}': {reason}")]
    ViewRenderFailed { view: String, reason: String },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not write the rendered PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Configuration is missing a value or holds an unusable one.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Coarse classification of a [`PdfLayerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Service,
    Transport,
    ResourceRead,
    UndefinedOperation,
    View,
    Output,
    Config,
}

impl PdfLayerError {
    /// Which part of the taxonomy this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfLayerError::Service(_) => ErrorKind::Service,
            PdfLayerError::Transport { .. } | PdfLayerError::TransportTimeout { .. } => {
                ErrorKind::Transport
            }
            PdfLayerError::ResourceNotFound { .. }
            | PdfLayerError::ResourcePermissionDenied { .. }
            | PdfLayerError::ResourceReadFailed { .. } => ErrorKind::ResourceRead,
            PdfLayerError::UndefinedOperation { .. } | PdfLayerError::ReservedOperation { .. } => {
                ErrorKind::UndefinedOperation
            }
            PdfLayerError::ViewRendererMissing { .. } | PdfLayerError::ViewRenderFailed { .. } => {
                ErrorKind::View
            }
            PdfLayerError::OutputWriteFailed { .. } => ErrorKind::Output,
            PdfLayerError::InvalidConfig(_) => ErrorKind::Config,
        }
    }

    /// The service error, when the API itself rejected the request.
    pub fn as_service_error(&self) -> Option<&ServiceError> {
        match self {
            PdfLayerError::Service(e) => Some(e),
            _ => None,
        }
    }
}

/// The nested `error` object of a failed API response.
///
/// ```json
/// {"success": false, "error": {"code": 134, "type": "foo", "info": "Error message"}}
/// ```
///
/// Fields other than `code`, `type` and `info` are kept in [`extra`](Self::extra).
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
pub struct ServiceError {
    #[serde(default)]
    pub code: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub info: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ServiceError {
    /// The human-readable message reported by the service.
    pub fn message(&self) -> &str {
        &self.info
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pdflayer API error {}", self.code)?;
        if !self.kind.is_empty() {
            write!(f, " ({})", self.kind)?;
        }
        write!(f, ": {}", self.info)
    }
}
