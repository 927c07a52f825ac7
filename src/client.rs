//! The conversion client: parameter accumulation plus one memoized call.
//!
//! A [`PdfLayer`] collects options, then converts exactly once. The first
//! call to [`PdfLayer::output`] (directly or through `stream`, `download`
//! or `save`) builds the request, performs the single outbound POST and
//! caches the PDF bytes. Every later output call returns the cached bytes
//! without touching the network, even if parameters changed in between.
//! Build a fresh client for a new document.
//!
//! ```text
//! load_* / set_* / call / assign ──▶ ParameterStore
//!                                         │
//! output() ──▶ build_request ──▶ Transport::post ──▶ classify ──▶ cache
//! ```

use crate::classify::classify;
use crate::config::PdfLayerConfig;
use crate::error::PdfLayerError;
use crate::params::{ParamValue, ParameterStore};
use crate::request::{build_request, PreparedRequest, RequestArg, RequestPart};
use crate::response::{Disposition, PdfResponse};
use crate::source::{Filesystem, LocalFilesystem};
use crate::transport::{http_client, redact_access_key, HttpTransport, Transport};
use crate::view::ViewRenderer;
use bytes::Bytes;
use once_cell::unsync::OnceCell;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A single-document pdflayer client.
///
/// # Example
/// ```rust,no_run
/// use pdflayer_client::{PdfLayer, PdfLayerConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = PdfLayerConfig::from_env()?;
/// let mut pdf = PdfLayer::new(config)?;
/// pdf.load_html("<h1>Invoice #42</h1>", None)
///     .set_paper("A4", "landscape")
///     .call("setWatermarkInBackground", true)?;
/// pdf.save("invoice.pdf").await?;
/// # Ok(())
/// # }
/// ```
pub struct PdfLayer {
    pub(crate) config: Arc<PdfLayerConfig>,
    pub(crate) params: ParameterStore,
    pdf: Option<Bytes>,
    transport: Arc<dyn Transport>,
    pub(crate) files: Arc<dyn Filesystem>,
    pub(crate) view: Option<Arc<dyn ViewRenderer>>,
}

impl fmt::Debug for PdfLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfLayer")
            .field("config", &self.config)
            .field("params", &self.params.keys().collect::<Vec<_>>())
            .field("pdf", &self.pdf.as_ref().map(|b| b.len()))
            .field("view", &self.view.as_ref().map(|_| "<dyn ViewRenderer>"))
            .finish()
    }
}

impl PdfLayer {
    /// Client with the default HTTP transport and local file system.
    pub fn new(config: impl Into<Arc<PdfLayerConfig>>) -> Result<Self, PdfLayerError> {
        Self::builder(config).build()
    }

    pub fn builder(config: impl Into<Arc<PdfLayerConfig>>) -> PdfLayerBuilder {
        PdfLayerBuilder {
            config: config.into(),
            transport: None,
            files: None,
            view: None,
        }
    }

    pub fn config(&self) -> &PdfLayerConfig {
        &self.config
    }

    /// Whether the conversion already ran and its bytes are cached.
    pub fn is_rendered(&self) -> bool {
        self.pdf.is_some()
    }

    // ── Output ────────────────────────────────────────────────────────────

    /// The rendered PDF.
    ///
    /// Performs the conversion on first use and caches the result. A failed
    /// conversion caches nothing, so calling again retries.
    pub async fn output(&mut self) -> Result<Bytes, PdfLayerError> {
        if let Some(ref pdf) = self.pdf {
            debug!("Returning cached PDF ({} bytes)", pdf.len());
            return Ok(pdf.clone());
        }

        let request = self.see_request_args();
        info!(
            "Converting document: {} query bytes, {} body fields",
            request.uri.len(),
            request.post_params.len()
        );

        let body = self
            .transport
            .post(&request.uri, &request.post_params)
            .await?;

        let pdf = classify(body).map_err(|e| {
            warn!(
                "pdflayer rejected {}: {}",
                redact_access_key(&request.uri),
                e
            );
            PdfLayerError::Service(e)
        })?;

        info!("Conversion complete: {} bytes", pdf.len());
        self.pdf = Some(pdf.clone());
        Ok(pdf)
    }

    /// Response that displays the PDF in the browser.
    pub async fn stream(&mut self, filename: Option<&str>) -> Result<PdfResponse, PdfLayerError> {
        self.respond(Disposition::Inline, filename).await
    }

    /// Response that makes the browser download the PDF.
    pub async fn download(&mut self, filename: Option<&str>) -> Result<PdfResponse, PdfLayerError> {
        self.respond(Disposition::Attachment, filename).await
    }

    async fn respond(
        &mut self,
        disposition: Disposition,
        filename: Option<&str>,
    ) -> Result<PdfResponse, PdfLayerError> {
        let body = self.output().await?;
        Ok(PdfResponse::new(
            body,
            disposition,
            filename.unwrap_or(crate::response::DEFAULT_FILENAME),
        ))
    }

    /// Write the PDF to `path`.
    pub async fn save(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, PdfLayerError> {
        let pdf = self.output().await?;
        self.files.write(path.as_ref(), &pdf).await?;
        Ok(self)
    }

    // ── Parameters ────────────────────────────────────────────────────────

    /// Merge `params` into the current options; later values win.
    pub fn add_params<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.set_params(params, false)
    }

    /// Merge `params`, or with `replace` swap the whole option set for them.
    pub fn set_params<I, K, V>(&mut self, params: I, replace: bool) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.params.merge(params, replace);
        debug!(
            "Parameters {}: {} keys",
            if replace { "replaced" } else { "merged" },
            self.params.len()
        );
        self
    }

    /// Drop every current option (including defaults and `test`) and install
    /// `params` verbatim.
    pub fn replace_params<I, K, V>(&mut self, params: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.set_params(params, true)
    }

    /// Current options.
    pub fn see_params(&self) -> ParameterStore {
        self.params.snapshot()
    }

    /// The request `output` would send right now.
    pub fn see_request_args(&self) -> PreparedRequest {
        build_request(&self.params, &self.config)
    }

    /// One side of [`see_request_args`](Self::see_request_args).
    pub fn see_request_arg(&self, part: RequestPart) -> RequestArg {
        self.see_request_args().part(part)
    }
}

/// Builder for [`PdfLayer`], for swapping in custom collaborators.
pub struct PdfLayerBuilder {
    config: Arc<PdfLayerConfig>,
    transport: Option<Arc<dyn Transport>>,
    files: Option<Arc<dyn Filesystem>>,
    view: Option<Arc<dyn ViewRenderer>>,
}

impl PdfLayerBuilder {
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn filesystem(mut self, files: Arc<dyn Filesystem>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn view_renderer(mut self, view: Arc<dyn ViewRenderer>) -> Self {
        self.view = Some(view);
        self
    }

    pub fn build(self) -> Result<PdfLayer, PdfLayerError> {
        let timeout = self.config.timeout_secs;
        // One connection pool for the API call and remote document reads.
        let client = OnceCell::new();
        let transport = match self.transport {
            Some(t) => t,
            None => {
                let client = client.get_or_try_init(|| http_client(timeout))?;
                Arc::new(HttpTransport::with_client(client.clone(), timeout))
            }
        };
        let files = match self.files {
            Some(f) => f,
            None => {
                let client = client.get_or_try_init(|| http_client(timeout))?;
                Arc::new(LocalFilesystem::with_client(client.clone(), timeout))
            }
        };

        Ok(PdfLayer {
            params: self.config.initial_params(),
            config: self.config,
            pdf: None,
            transport,
            files,
            view: self.view,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTransport {
        calls: AtomicUsize,
        body: &'static [u8],
    }

    #[async_trait]
    impl Transport for CountingTransport {
        async fn post(&self, _uri: &str, _post: &ParameterStore) -> Result<Bytes, PdfLayerError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Bytes::from_static(self.body))
        }
    }

    fn client(body: &'static [u8]) -> (PdfLayer, Arc<CountingTransport>) {
        let transport = Arc::new(CountingTransport {
            calls: AtomicUsize::new(0),
            body,
        });
        let config = PdfLayerConfig::builder("testAccessKey").build().unwrap();
        let pdf = PdfLayer::builder(config)
            .transport(transport.clone())
            .build()
            .unwrap();
        (pdf, transport)
    }

    #[tokio::test]
    async fn output_is_memoized() {
        let (mut pdf, transport) = client(b"generatedPDF");
        assert!(!pdf.is_rendered());
        for _ in 0..3 {
            assert_eq!(pdf.output().await.unwrap(), Bytes::from_static(b"generatedPDF"));
        }
        pdf.stream(None).await.unwrap();
        pdf.download(Some("bar.pdf")).await.unwrap();
        assert!(pdf.is_rendered());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failures_are_not_cached() {
        let (mut pdf, transport) =
            client(br#"{"success":false,"error":{"code":134,"type":"foo","info":"Error message"}}"#);
        let err = pdf.output().await.unwrap_err();
        assert_eq!(err.as_service_error().map(|e| e.code), Some(134));
        assert!(!pdf.is_rendered());
        assert!(pdf.output().await.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn new_client_starts_with_sandbox_marker() {
        let (pdf, _) = client(b"");
        assert_eq!(pdf.see_params(), ParameterStore::from_iter([("test", 1)]));
    }

    #[test]
    fn params_methods() {
        let (mut pdf, _) = client(b"");
        pdf.add_params([("creator", ParamValue::from("someone")), ("watermark_in_background", ParamValue::Int(1))]);
        pdf.add_params([("creator", ParamValue::from("mathieutu")), ("no_hyperlinks", ParamValue::Int(1))]);
        let params = pdf.see_params();
        assert_eq!(params.get("creator"), Some(&ParamValue::from("mathieutu")));
        assert_eq!(params.get("no_hyperlinks"), Some(&ParamValue::Int(1)));
        assert_eq!(params.get("watermark_in_background"), Some(&ParamValue::Int(1)));

        pdf.replace_params([("grayscale", true)]);
        pdf.set_params([("low_quality", true)], false);
        assert_eq!(
            pdf.see_params(),
            ParameterStore::from_iter([("grayscale", true), ("low_quality", true)])
        );
        assert_eq!(
            pdf.see_request_arg(RequestPart::Uri),
            RequestArg::Uri(
                "https://api.pdflayer.com/api/convert?access_key=testAccessKey&grayscale=1&low_quality=1"
                    .into()
            )
        );
    }
}
