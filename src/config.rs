//! Client configuration.
//!
//! [`PdfLayerConfig`] is built once, either through its builder or from the
//! environment, and never changes afterwards. Clients hold it behind an
//! `Arc`, so one configuration can back any number of [`crate::PdfLayer`]
//! instances.
//!
//! The sandbox flag is resolved here and nowhere else: the environment is
//! read exactly once, through a reader the caller can replace in tests.

use crate::error::PdfLayerError;
use crate::params::{ParamValue, ParameterStore};
use std::fmt;

/// Public conversion endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.pdflayer.com/api/convert";

/// Default HTTP timeout for the conversion call and remote document reads.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

pub const ENV_ACCESS_KEY: &str = "PDF_LAYER_ACCESS_KEY";
pub const ENV_ENDPOINT: &str = "PDF_LAYER_ENDPOINT";
pub const ENV_SECRET_KEYWORD: &str = "PDF_LAYER_SECRET_KEYWORD";
pub const ENV_SANDBOX: &str = "PDF_LAYER_SANDBOX";
pub const ENV_TIMEOUT: &str = "PDF_LAYER_TIMEOUT";
pub const ENV_APP_ENV: &str = "APP_ENV";

/// Configuration for a pdflayer client.
///
/// # Example
/// ```rust
/// use pdflayer_client::PdfLayerConfig;
///
/// let config = PdfLayerConfig::builder("my-access-key")
///     .secret_keyword("s3cret")
///     .sandbox(false)
///     .default_param("author", "Jane Doe")
///     .build()
///     .unwrap();
/// assert!(!config.sandbox);
/// ```
#[derive(Clone)]
pub struct PdfLayerConfig {
    /// API access key, always sent as the first query parameter.
    pub access_key: String,

    /// Conversion endpoint. Default: [`DEFAULT_ENDPOINT`].
    pub endpoint: String,

    /// Shared keyword used to sign `document_url` requests.
    ///
    /// When set, [`crate::PdfLayer::load_url`] adds a `secret_key` parameter
    /// the service uses to check the request came from the account owner.
    pub secret_keyword: Option<String>,

    /// Sandbox mode: every new client starts with `test=1`, so conversions
    /// are watermarked and do not count against the production quota.
    pub sandbox: bool,

    /// Parameters every new client starts with.
    pub default_params: ParameterStore,

    /// HTTP timeout in seconds for the default transport. Default: 120.
    pub timeout_secs: u64,
}

impl fmt::Debug for PdfLayerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfLayerConfig")
            .field("access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field(
                "secret_keyword",
                &self.secret_keyword.as_ref().map(|_| "<redacted>"),
            )
            .field("sandbox", &self.sandbox)
            .field("default_params", &self.default_params)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl PdfLayerConfig {
    /// Create a new builder. Sandbox mode is on until turned off explicitly.
    pub fn builder(access_key: impl Into<String>) -> PdfLayerConfigBuilder {
        PdfLayerConfigBuilder {
            config: PdfLayerConfig {
                access_key: access_key.into(),
                endpoint: DEFAULT_ENDPOINT.to_string(),
                secret_keyword: None,
                sandbox: true,
                default_params: ParameterStore::new(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
        }
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<PdfLayerConfig, PdfLayerError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Load configuration through `reader`, which maps a variable name to
    /// its value.
    ///
    /// | Variable | Meaning |
    /// |----------|---------|
    /// | `PDF_LAYER_ACCESS_KEY` | required |
    /// | `PDF_LAYER_ENDPOINT` | default [`DEFAULT_ENDPOINT`] |
    /// | `PDF_LAYER_SECRET_KEYWORD` | optional |
    /// | `PDF_LAYER_SANDBOX` | truthy forces sandbox on |
    /// | `APP_ENV` | sandbox is on unless this is `production` |
    /// | `PDF_LAYER_TIMEOUT` | seconds, default 120 |
    pub fn from_env_with<F>(reader: F) -> Result<PdfLayerConfig, PdfLayerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| reader(key).filter(|v| !v.trim().is_empty());

        let access_key = read(ENV_ACCESS_KEY).ok_or_else(|| {
            PdfLayerError::InvalidConfig(format!("{ENV_ACCESS_KEY} is not set"))
        })?;

        let mut builder = PdfLayerConfig::builder(access_key).sandbox(sandbox_from_env(&reader));
        if let Some(endpoint) = read(ENV_ENDPOINT) {
            builder = builder.endpoint(endpoint);
        }
        if let Some(keyword) = read(ENV_SECRET_KEYWORD) {
            builder = builder.secret_keyword(keyword);
        }
        if let Some(timeout) = read(ENV_TIMEOUT) {
            let secs = timeout.trim().parse::<u64>().map_err(|_| {
                PdfLayerError::InvalidConfig(format!(
                    "{ENV_TIMEOUT} must be a number of seconds, got '{timeout}'"
                ))
            })?;
            builder = builder.timeout_secs(secs);
        }
        builder.build()
    }

    /// The parameter set a freshly constructed client starts with.
    pub fn initial_params(&self) -> ParameterStore {
        let mut params = self.default_params.clone();
        if self.sandbox {
            params.set("test", 1);
        }
        params
    }
}

/// Builder for [`PdfLayerConfig`].
#[derive(Debug)]
pub struct PdfLayerConfigBuilder {
    config: PdfLayerConfig,
}

impl PdfLayerConfigBuilder {
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn secret_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.config.secret_keyword = Some(keyword.into());
        self
    }

    pub fn sandbox(mut self, v: bool) -> Self {
        self.config.sandbox = v;
        self
    }

    pub fn default_param(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.config.default_params.set(key, value);
        self
    }

    pub fn default_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        self.config.default_params.merge(params, false);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PdfLayerConfig, PdfLayerError> {
        let c = &self.config;
        if c.access_key.trim().is_empty() {
            return Err(PdfLayerError::InvalidConfig(
                "access key must not be empty".into(),
            ));
        }
        if url::Url::parse(&c.endpoint).is_err() {
            return Err(PdfLayerError::InvalidConfig(format!(
                "endpoint is not a valid URL: '{}'",
                c.endpoint
            )));
        }
        if c.timeout_secs == 0 {
            return Err(PdfLayerError::InvalidConfig(
                "timeout must be at least 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Sandbox mode as the environment sets it: a truthy `PDF_LAYER_SANDBOX`
/// forces it on, otherwise it is on unless `APP_ENV` is `production`.
pub fn sandbox_from_env<F>(reader: F) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| reader(key).filter(|v| !v.trim().is_empty());
    match read(ENV_SANDBOX) {
        Some(v) if is_truthy(&v) => true,
        _ => read(ENV_APP_ENV).as_deref() != Some("production"),
    }
}

/// Loose boolean parsing for environment values: anything non-empty is true
/// except the usual spellings of false/null/empty.
fn is_truthy(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    let v = v
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(&v);
    !matches!(v, "" | "false" | "0" | "null" | "empty")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn builder_defaults() {
        let config = PdfLayerConfig::builder("key").build().unwrap();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.sandbox);
        assert!(config.secret_keyword.is_none());
        assert!(config.default_params.is_empty());
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn builder_rejects_bad_values() {
        assert!(PdfLayerConfig::builder("  ").build().is_err());
        assert!(PdfLayerConfig::builder("key")
            .endpoint("not a url")
            .build()
            .is_err());
        assert!(PdfLayerConfig::builder("key").timeout_secs(0).build().is_err());
    }

    #[test]
    fn initial_params_add_test_marker_in_sandbox() {
        let config = PdfLayerConfig::builder("key")
            .default_param("author", "Mathieu TUDISCO")
            .build()
            .unwrap();
        let params = config.initial_params();
        assert_eq!(params.get("author"), Some(&ParamValue::from("Mathieu TUDISCO")));
        assert_eq!(params.get("test"), Some(&ParamValue::Int(1)));

        let config = PdfLayerConfig::builder("key").sandbox(false).build().unwrap();
        assert!(!config.initial_params().contains_key("test"));
    }

    #[test]
    fn from_env_requires_access_key() {
        let err = PdfLayerConfig::from_env_with(env(&[])).unwrap_err();
        assert!(err.to_string().contains(ENV_ACCESS_KEY));
    }

    #[test]
    fn from_env_reads_all_fields() {
        let config = PdfLayerConfig::from_env_with(env(&[
            (ENV_ACCESS_KEY, "abc"),
            (ENV_ENDPOINT, "http://localhost:8080/convert"),
            (ENV_SECRET_KEYWORD, "foo"),
            (ENV_TIMEOUT, "30"),
            (ENV_APP_ENV, "production"),
        ]))
        .unwrap();
        assert_eq!(config.access_key, "abc");
        assert_eq!(config.endpoint, "http://localhost:8080/convert");
        assert_eq!(config.secret_keyword.as_deref(), Some("foo"));
        assert_eq!(config.timeout_secs, 30);
        assert!(!config.sandbox);
    }

    #[test]
    fn sandbox_defaults_on_outside_production() {
        let config =
            PdfLayerConfig::from_env_with(env(&[(ENV_ACCESS_KEY, "abc"), (ENV_APP_ENV, "local")]))
                .unwrap();
        assert!(config.sandbox);

        let config = PdfLayerConfig::from_env_with(env(&[(ENV_ACCESS_KEY, "abc")])).unwrap();
        assert!(config.sandbox);
    }

    #[test]
    fn sandbox_from_env_alone() {
        assert!(sandbox_from_env(env(&[])));
        assert!(!sandbox_from_env(env(&[(ENV_APP_ENV, "production")])));
        assert!(sandbox_from_env(env(&[(ENV_APP_ENV, "production"), (ENV_SANDBOX, "1")])));
        assert!(sandbox_from_env(env(&[(ENV_APP_ENV, "staging"), (ENV_SANDBOX, "0")])));
    }

    #[test]
    fn sandbox_flag_overrides_production() {
        let config = PdfLayerConfig::from_env_with(env(&[
            (ENV_ACCESS_KEY, "abc"),
            (ENV_APP_ENV, "production"),
            (ENV_SANDBOX, "true"),
        ]))
        .unwrap();
        assert!(config.sandbox);

        // A falsy flag defers to APP_ENV.
        let config = PdfLayerConfig::from_env_with(env(&[
            (ENV_ACCESS_KEY, "abc"),
            (ENV_APP_ENV, "production"),
            (ENV_SANDBOX, "false"),
        ]))
        .unwrap();
        assert!(!config.sandbox);
    }

    #[test]
    fn invalid_timeout_is_reported() {
        let err = PdfLayerConfig::from_env_with(env(&[
            (ENV_ACCESS_KEY, "abc"),
            (ENV_TIMEOUT, "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("soon"));
    }

    #[test]
    fn truthy_values() {
        for v in ["1", "true", "TRUE", "yes", "on"] {
            assert!(is_truthy(v), "{v}");
        }
        for v in ["", "0", "false", "(false)", "null", "(empty)"] {
            assert!(!is_truthy(v), "{v}");
        }
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = PdfLayerConfig::builder("super-secret-key")
            .secret_keyword("keyword")
            .build()
            .unwrap();
        let dbg = format!("{config:?}");
        assert!(!dbg.contains("super-secret-key"));
        assert!(!dbg.contains("keyword\""));
    }
}
