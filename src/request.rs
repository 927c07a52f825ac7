//! Request shaping: split parameters between the query string and the body.
//!
//! The service takes almost every option as a query parameter, but the two
//! HTML payloads can be arbitrarily large and must travel in the POST body:
//!
//! ```text
//! POST {endpoint}?access_key=…&page_size=A4&test=1
//! Content-Type: application/x-www-form-urlencoded
//!
//! document_html=…&header_html=…
//! ```

use crate::config::PdfLayerConfig;
use crate::params::ParameterStore;
use serde::Serialize;
use std::str::FromStr;
use url::form_urlencoded;

/// Keys that are always sent in the request body, never in the URL.
pub const BODY_KEYS: [&str; 2] = ["document_html", "header_html"];

/// A fully shaped request, ready for a [`crate::Transport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedRequest {
    /// Endpoint plus the URL-encoded query string.
    pub uri: String,
    /// Body fields, with their raw (not URL-encoded) values.
    pub post_params: ParameterStore,
}

/// One side of a [`PreparedRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart {
    Uri,
    PostParams,
}

impl FromStr for RequestPart {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uri" => Ok(RequestPart::Uri),
            "postParams" | "post_params" => Ok(RequestPart::PostParams),
            other => Err(format!(
                "unknown request part '{other}' (expected 'uri' or 'postParams')"
            )),
        }
    }
}

/// The value of a single [`RequestPart`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RequestArg {
    Uri(String),
    PostParams(ParameterStore),
}

impl PreparedRequest {
    pub fn part(&self, part: RequestPart) -> RequestArg {
        match part {
            RequestPart::Uri => RequestArg::Uri(self.uri.clone()),
            RequestPart::PostParams => RequestArg::PostParams(self.post_params.clone()),
        }
    }
}

/// Build the request for the current parameters.
///
/// `access_key` always comes first in the query string; the remaining query
/// parameters follow in store order. Pure function of its inputs.
pub fn build_request(params: &ParameterStore, config: &PdfLayerConfig) -> PreparedRequest {
    let mut query = String::new();
    append_pair(&mut query, "access_key", config.access_key.as_bytes());

    let mut post_params = ParameterStore::new();
    for (key, value) in params.iter() {
        if is_body_key(key) {
            post_params.set(key, value.clone());
        } else {
            append_pair(&mut query, key, &value.as_form_bytes());
        }
    }

    PreparedRequest {
        uri: format!("{}?{}", config.endpoint, query),
        post_params,
    }
}

/// Encode fields as an `application/x-www-form-urlencoded` body.
pub fn encode_form(fields: &ParameterStore) -> String {
    let mut body = String::new();
    for (key, value) in fields.iter() {
        append_pair(&mut body, key, &value.as_form_bytes());
    }
    body
}

pub fn is_body_key(key: &str) -> bool {
    BODY_KEYS.contains(&key)
}

/// Form-URL-encode a value (space becomes `+`).
pub fn form_encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

fn append_pair(target: &mut String, key: &str, value: &[u8]) {
    if !target.is_empty() {
        target.push('&');
    }
    target.extend(form_urlencoded::byte_serialize(key.as_bytes()));
    target.push('=');
    target.extend(form_urlencoded::byte_serialize(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ParamValue;

    fn config() -> PdfLayerConfig {
        PdfLayerConfig::builder("testAccessKey").build().unwrap()
    }

    #[test]
    fn access_key_first_then_query_params() {
        let params = ParameterStore::from_iter([("grayscale", true), ("low_quality", true)]);
        let req = build_request(&params, &config());
        assert_eq!(
            req.uri,
            "https://api.pdflayer.com/api/convert?access_key=testAccessKey&grayscale=1&low_quality=1"
        );
        assert!(req.post_params.is_empty());
    }

    #[test]
    fn html_goes_to_body_verbatim() {
        let mut params = ParameterStore::new();
        params.set("document_html", "<h1>Hello world!</h1>");
        params.set("header_html", "<p>a & b</p>");
        params.set("page_size", "A4");
        let req = build_request(&params, &config());

        let body = |key: &str| req.post_params.get(key).and_then(ParamValue::as_str);
        assert_eq!(body("document_html"), Some("<h1>Hello world!</h1>"));
        assert_eq!(body("header_html"), Some("<p>a & b</p>"));
        assert!(!req.uri.contains("document_html"));
        assert!(!req.uri.contains("header_html"));
        assert!(req.uri.ends_with("&page_size=A4"));
    }

    #[test]
    fn query_values_are_url_encoded() {
        let params = ParameterStore::from_iter([("document_name", "my report & co")]);
        let req = build_request(&params, &config());
        assert!(req.uri.ends_with("&document_name=my+report+%26+co"), "{}", req.uri);
    }

    #[test]
    fn only_access_key_without_params() {
        let req = build_request(&ParameterStore::new(), &config());
        assert_eq!(
            req.uri,
            "https://api.pdflayer.com/api/convert?access_key=testAccessKey"
        );
    }

    #[test]
    fn building_is_idempotent() {
        let params = ParameterStore::from_iter([("a", "1"), ("document_html", "<p/>")]);
        let cfg = config();
        assert_eq!(build_request(&params, &cfg), build_request(&params, &cfg));
    }

    #[test]
    fn form_body_encoding() {
        let fields = ParameterStore::from_iter([("document_html", "<h1>Hi there</h1>")]);
        assert_eq!(encode_form(&fields), "document_html=%3Ch1%3EHi+there%3C%2Fh1%3E");
    }

    #[test]
    fn request_part_parsing() {
        assert_eq!("uri".parse::<RequestPart>(), Ok(RequestPart::Uri));
        assert_eq!("postParams".parse::<RequestPart>(), Ok(RequestPart::PostParams));
        assert!("body".parse::<RequestPart>().is_err());
    }
}
