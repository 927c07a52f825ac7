//! Document sources and output files.
//!
//! [`Filesystem`] reads the HTML behind [`crate::PdfLayer::load_file`] and
//! writes the PDF for [`crate::PdfLayer::save`]. The default
//! [`LocalFilesystem`] reads local paths with tokio and `http(s)` URLs with
//! reqwest, keeping the remote `Content-Type` so the caller can pick up the
//! document's charset.

use crate::error::PdfLayerError;
use crate::transport::http_client;
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Content read from a document source.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub bytes: Bytes,
    /// `Content-Type` header of a remote read; `None` for local files.
    pub content_type: Option<String>,
}

impl Resource {
    pub fn local(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    /// The upper-cased `charset` declared by the content type, if any.
    pub fn charset(&self) -> Option<String> {
        self.content_type.as_deref().and_then(charset_from_content_type)
    }
}

#[async_trait]
pub trait Filesystem: Send + Sync {
    /// Read a local path or a network URL.
    async fn read(&self, path: &str) -> Result<Resource, PdfLayerError>;

    /// Write `bytes` to `path`, replacing any existing file.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), PdfLayerError>;
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

static RE_CHARSET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*[\w/]+;\s*?charset=(\S+)").unwrap());

/// Extract the charset token from a `Content-Type` value, upper-cased.
///
/// `text/html; charset=utf-8` → `UTF-8`.
pub fn charset_from_content_type(content_type: &str) -> Option<String> {
    RE_CHARSET
        .captures(content_type)
        .map(|c| c[1].trim_matches('"').to_uppercase())
}

/// Default [`Filesystem`]: tokio for local paths, reqwest for URLs.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl LocalFilesystem {
    pub fn new(timeout_secs: u64) -> Result<Self, PdfLayerError> {
        Ok(Self::with_client(http_client(timeout_secs)?, timeout_secs))
    }

    /// Share an existing `reqwest` client, typically the transport's.
    pub fn with_client(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    async fn read_local(&self, path: &str) -> Result<Resource, PdfLayerError> {
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                debug!("Read {} bytes from {}", bytes.len(), path);
                Ok(Resource::local(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PdfLayerError::ResourceNotFound { path: path.into() })
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(PdfLayerError::ResourcePermissionDenied { path: path.into() })
            }
            Err(e) => Err(PdfLayerError::ResourceReadFailed {
                path: path.into(),
                reason: e.to_string(),
            }),
        }
    }

    async fn read_remote(&self, url: &str) -> Result<Resource, PdfLayerError> {
        info!("Fetching document from: {}", url);
        let failed = |reason: String| PdfLayerError::ResourceReadFailed {
            path: url.to_string(),
            reason,
        };

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                failed(format!("timed out after {}s", self.timeout_secs))
            } else {
                failed(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;
        debug!(
            "Fetched {} bytes from {} ({:?})",
            bytes.len(),
            url,
            content_type
        );

        Ok(Resource {
            bytes,
            content_type,
        })
    }
}

#[async_trait]
impl Filesystem for LocalFilesystem {
    async fn read(&self, path: &str) -> Result<Resource, PdfLayerError> {
        if is_url(path) {
            self.read_remote(path).await
        } else {
            self.read_local(path).await
        }
    }

    /// Atomic write: write to a sibling temp file, then rename.
    async fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), PdfLayerError> {
        let write_failed = |source| PdfLayerError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_failed)?;
        }

        let tmp_path = temp_path(path);
        if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_failed(e));
        }
        if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(write_failed(e));
        }

        info!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

/// `out/doc.pdf` → `out/doc.pdf.tmp`, keeping the whole file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("output"));
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/page.html"));
        assert!(is_url("http://example.com/"));
        assert!(!is_url("/tmp/page.html"));
        assert!(!is_url("page.html"));
        assert!(!is_url(""));
    }

    #[test]
    fn charset_detection() {
        assert_eq!(
            charset_from_content_type("text/html; charset=utf-8").as_deref(),
            Some("UTF-8")
        );
        assert_eq!(
            charset_from_content_type("text/html;charset=ISO-8859-1").as_deref(),
            Some("ISO-8859-1")
        );
        assert_eq!(
            charset_from_content_type("TEXT/HTML; CHARSET=\"windows-1252\"").as_deref(),
            Some("WINDOWS-1252")
        );
        assert_eq!(charset_from_content_type("text/html"), None);
        assert_eq!(charset_from_content_type(""), None);
    }

    #[test]
    fn local_resources_have_no_charset() {
        assert_eq!(Resource::local(b"<h1/>".to_vec()).charset(), None);
    }

    #[tokio::test]
    async fn missing_local_file_is_a_read_failure() {
        let fs = LocalFilesystem::new(5).unwrap();
        let err = fs.read("/definitely/not/here.html").await.unwrap_err();
        assert!(matches!(err, PdfLayerError::ResourceNotFound { .. }));
    }

    #[tokio::test]
    async fn write_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested/out/doc.pdf");
        let fs = LocalFilesystem::new(5).unwrap();
        fs.write(&target, b"generatedPDF").await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"generatedPDF");
        assert!(!target.with_extension("pdf.tmp").exists());
    }

    #[test]
    fn temp_path_keeps_full_file_name() {
        assert_eq!(temp_path(Path::new("out/doc.pdf")), Path::new("out/doc.pdf.tmp"));
        assert_eq!(temp_path(Path::new("out/doc.html")), Path::new("out/doc.html.tmp"));
        assert_eq!(temp_path(Path::new("doc")), Path::new("doc.tmp"));
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        std::fs::create_dir(&target).unwrap();

        let fs = LocalFilesystem::new(5).unwrap();
        let err = fs.write(&target, b"generatedPDF").await.unwrap_err();

        assert!(matches!(err, PdfLayerError::OutputWriteFailed { .. }));
        assert!(!dir.path().join("out.pdf.tmp").exists());
        assert!(target.is_dir());
    }
}
