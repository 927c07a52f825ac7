//! The single outbound HTTP call.
//!
//! [`Transport`] is the seam between request shaping and the network. The
//! client only ever calls [`Transport::post`] once per instance; retries,
//! proxies, or recording fakes can all be layered in by implementing it.

use crate::error::PdfLayerError;
use crate::params::ParameterStore;
use crate::request::encode_form;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// Sends a form-encoded POST and returns the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, uri: &str, post_params: &ParameterStore) -> Result<Bytes, PdfLayerError>;
}

/// Default [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout_secs: u64,
}

impl HttpTransport {
    pub fn new(timeout_secs: u64) -> Result<Self, PdfLayerError> {
        Ok(Self::with_client(http_client(timeout_secs)?, timeout_secs))
    }

    /// Wrap an existing `reqwest` client (shared pools, custom TLS, proxies).
    pub fn with_client(client: reqwest::Client, timeout_secs: u64) -> Self {
        Self {
            client,
            timeout_secs,
        }
    }

    fn map_err(&self, uri: &str, e: reqwest::Error) -> PdfLayerError {
        if e.is_timeout() {
            PdfLayerError::TransportTimeout {
                uri: redact_access_key(uri),
                secs: self.timeout_secs,
            }
        } else {
            PdfLayerError::Transport {
                uri: redact_access_key(uri),
                reason: e.without_url().to_string(),
            }
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, uri: &str, post_params: &ParameterStore) -> Result<Bytes, PdfLayerError> {
        let body = encode_form(post_params);
        debug!("POST {} ({} body bytes)", redact_access_key(uri), body.len());

        let response = self
            .client
            .post(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_err(uri, e))?;

        // Error payloads come back as 200 with a JSON body; the status is not
        // what tells success from failure.
        debug!("Response status: {}", response.status());

        response.bytes().await.map_err(|e| self.map_err(uri, e))
    }
}

/// The `reqwest` client used by the default transport and file system.
pub fn http_client(timeout_secs: u64) -> Result<reqwest::Client, PdfLayerError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("pdflayer-client/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| PdfLayerError::InvalidConfig(format!("HTTP client: {e}")))
}

/// Replace the `access_key` query value so URIs can be logged.
pub fn redact_access_key(uri: &str) -> String {
    let Some((base, query)) = uri.split_once('?') else {
        return uri.to_string();
    };
    let query = query
        .split('&')
        .map(|pair| {
            if pair.starts_with("access_key=") {
                "access_key=***"
            } else {
                pair
            }
        })
        .collect::<Vec<_>>()
        .join("&");
    format!("{base}?{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_key_is_redacted() {
        assert_eq!(
            redact_access_key("https://api.pdflayer.com/api/convert?access_key=abc&test=1"),
            "https://api.pdflayer.com/api/convert?access_key=***&test=1"
        );
        assert_eq!(redact_access_key("http://x/y"), "http://x/y");
    }
}
