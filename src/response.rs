//! HTTP-response shaped wrapper for a rendered PDF.

use bytes::Bytes;

/// Filename used by `stream` / `download` when the caller passes none.
pub const DEFAULT_FILENAME: &str = "document.pdf";

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// How a browser should present the PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Show in the browser.
    Inline,
    /// Offer as a download.
    Attachment,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// A PDF ready to be handed to any web framework.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfResponse {
    pub body: Bytes,
    pub disposition: Disposition,
    pub filename: String,
}

impl PdfResponse {
    pub fn new(body: Bytes, disposition: Disposition, filename: impl Into<String>) -> Self {
        Self {
            body,
            disposition,
            filename: filename.into(),
        }
    }

    pub fn status(&self) -> u16 {
        200
    }

    pub fn content_type(&self) -> &'static str {
        PDF_CONTENT_TYPE
    }

    /// `inline; filename="foo.pdf"` or `attachment; filename="foo.pdf"`.
    pub fn content_disposition(&self) -> String {
        format!(
            "{}; filename=\"{}\"",
            self.disposition.as_str(),
            self.filename.replace('"', "\\\"")
        )
    }

    /// Header pairs in the order they should be sent.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Content-Type", self.content_type().to_string()),
            ("Content-Disposition", self.content_disposition()),
        ]
    }

    pub fn into_body(self) -> Bytes {
        self.body
    }
}
