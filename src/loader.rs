//! Document loaders: where the HTML comes from.
//!
//! The service converts either a URL it fetches itself (`document_url`) or
//! HTML sent in the request body (`document_html`). Each loader sets the
//! matching parameters and returns the client for chaining.

use crate::client::PdfLayer;
use crate::error::PdfLayerError;
use crate::params::ParamValue;
use crate::request::form_encode;
use md5::{Digest, Md5};
use serde_json::Value;
use tracing::debug;

/// Orientation used by [`PdfLayer::set_paper_size`].
pub const DEFAULT_ORIENTATION: &str = "portrait";

impl PdfLayer {
    /// Convert the page at `url`.
    ///
    /// `document_url` holds the URL-encoded `url`. With a secret keyword
    /// configured, `secret_key` is set to `md5(url + keyword)` computed over
    /// the unencoded URL.
    pub fn load_url(&mut self, url: &str) -> &mut Self {
        self.params.set("document_url", form_encode(url));

        if let Some(keyword) = self.config.secret_keyword.as_deref().filter(|k| !k.is_empty()) {
            self.params.set("secret_key", secret_key(url, keyword));
        }
        debug!("Loaded document URL ({} chars)", url.len());
        self
    }

    /// Convert the given HTML. `encoding` becomes `text_encoding`.
    pub fn load_html(&mut self, html: impl Into<ParamValue>, encoding: Option<&str>) -> &mut Self {
        let html = html.into();
        debug!("Loaded HTML document ({} bytes)", html.as_form_bytes().len());
        self.params.set("document_html", html);

        if let Some(encoding) = encoding {
            self.params.set("text_encoding", encoding);
        }
        self
    }

    /// Render `view` through the configured [`crate::ViewRenderer`] and
    /// convert the result.
    pub fn load_view(
        &mut self,
        view: &str,
        data: &Value,
        merge_data: &Value,
        encoding: Option<&str>,
    ) -> Result<&mut Self, PdfLayerError> {
        let renderer = self
            .view
            .clone()
            .ok_or_else(|| PdfLayerError::ViewRendererMissing { view: view.into() })?;
        let html = renderer.render(view, data, merge_data)?;
        Ok(self.load_html(html, encoding))
    }

    /// Convert the HTML stored at `path`, a local path or an `http(s)` URL.
    ///
    /// For remote documents the `charset` of the response's `Content-Type`
    /// becomes `text_encoding`. Read failures are returned as-is; they are
    /// never reported as service errors.
    pub async fn load_file(&mut self, path: &str) -> Result<&mut Self, PdfLayerError> {
        let resource = self.files.read(path).await?;
        let encoding = resource.charset();
        debug!(
            "Loaded {} ({} bytes, encoding {:?})",
            path,
            resource.bytes.len(),
            encoding
        );
        Ok(self.load_html(resource.bytes.to_vec(), encoding.as_deref()))
    }

    /// Set `page_size` and `orientation`.
    pub fn set_paper(&mut self, layout: &str, orientation: &str) -> &mut Self {
        self.params.set("page_size", layout);
        self.params.set("orientation", orientation);
        self
    }

    /// [`set_paper`](Self::set_paper) with portrait orientation.
    pub fn set_paper_size(&mut self, layout: &str) -> &mut Self {
        self.set_paper(layout, DEFAULT_ORIENTATION)
    }
}

/// Lower-case hex MD5 of `url` followed by `keyword`.
pub fn secret_key(url: &str, keyword: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(url.as_bytes());
    hasher.update(keyword.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
