//! Static client configuration.
//!
//! A [`UcsConfig`] is immutable once built. Changing a setting means building a
//! new config (see [`UcsConfig::to_builder`]), so a config shared behind an
//! `Arc` can never change under a request in flight.

use std::env;
use std::time::Duration;

use reqwest::header::HeaderName;

use crate::error::{Result, UcsError};

pub const DEFAULT_ACCESS_CODE_HEADER: &str = "accessCode";
pub const DEFAULT_RANDOM_KEY_HEADER: &str = "randomKey";
pub const DEFAULT_USER_TOKEN_HEADER: &str = "Authorization";
pub const DEFAULT_CLIENT_TOKEN_HEADER: &str = "Client-Authorization";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_RANDOM_KEY_LENGTH: usize = 6;

/// Configuration for talking to one UCS deployment.
#[derive(Debug, Clone)]
pub struct UcsConfig {
    pub(crate) base_url: String,
    pub(crate) access_code: String,
    pub(crate) access_code_header: HeaderName,
    pub(crate) random_key_header: HeaderName,
    pub(crate) user_token_header: HeaderName,
    pub(crate) client_token_header: HeaderName,
    pub(crate) timeout: Duration,
    pub(crate) random_key_length: usize,
    pub(crate) client_id: Option<String>,
    pub(crate) client_secret: Option<String>,
    pub(crate) client_token: Option<String>,
}

impl UcsConfig {
    pub fn builder(base_url: impl Into<String>, access_code: impl Into<String>) -> UcsConfigBuilder {
        UcsConfigBuilder::new(base_url, access_code)
    }

    /// Load configuration from environment variables.
    ///
    /// Reads `.env` if present. `UCS_BASE_URL` and `UCS_ACCESS_CODE` are
    /// required; everything else falls back to the defaults.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup using the `UCS_*` names.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| UcsError::Config(format!("{} must be set", key)))
        };

        let mut builder = UcsConfigBuilder::new(required("UCS_BASE_URL")?, required("UCS_ACCESS_CODE")?);

        if let Some(raw) = lookup("UCS_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| {
                UcsError::Config(format!("UCS_TIMEOUT_SECS must be a number, got {:?}", raw))
            })?;
            builder = builder.timeout_secs(secs);
        }

        let optional = |key: &str| lookup(key).filter(|v| !v.is_empty());
        match (optional("UCS_CLIENT_ID"), optional("UCS_CLIENT_SECRET")) {
            (Some(id), Some(secret)) => builder = builder.client_id_and_secret(id, secret),
            (Some(_), None) => {
                return Err(UcsError::Config(
                    "UCS_CLIENT_SECRET must be set when UCS_CLIENT_ID is".into(),
                ))
            }
            (None, Some(_)) => {
                return Err(UcsError::Config(
                    "UCS_CLIENT_ID must be set when UCS_CLIENT_SECRET is".into(),
                ))
            }
            (None, None) => {}
        }
        if let Some(token) = lookup("UCS_CLIENT_TOKEN") {
            builder = builder.client_token(token);
        }

        builder = builder.header_names(
            lookup("UCS_ACCESS_CODE_HEADER").unwrap_or_else(|| DEFAULT_ACCESS_CODE_HEADER.into()),
            lookup("UCS_RANDOM_KEY_HEADER").unwrap_or_else(|| DEFAULT_RANDOM_KEY_HEADER.into()),
            lookup("UCS_USER_TOKEN_HEADER").unwrap_or_else(|| DEFAULT_USER_TOKEN_HEADER.into()),
            lookup("UCS_CLIENT_TOKEN_HEADER").unwrap_or_else(|| DEFAULT_CLIENT_TOKEN_HEADER.into()),
        );

        builder.build()
    }

    /// A builder seeded with this config's values.
    pub fn to_builder(&self) -> UcsConfigBuilder {
        UcsConfigBuilder {
            base_url: self.base_url.clone(),
            access_code: self.access_code.clone(),
            access_code_header: self.access_code_header.as_str().to_string(),
            random_key_header: self.random_key_header.as_str().to_string(),
            user_token_header: self.user_token_header.as_str().to_string(),
            client_token_header: self.client_token_header.as_str().to_string(),
            timeout_secs: self.timeout.as_secs(),
            random_key_length: self.random_key_length,
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            client_token: self.client_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn access_code(&self) -> &str {
        &self.access_code
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_token_header(&self) -> &HeaderName {
        &self.user_token_header
    }

    pub fn client_token_header(&self) -> &HeaderName {
        &self.client_token_header
    }

    /// Full URL for a path relative to the base URL.
    pub(crate) fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Fluent builder for [`UcsConfig`].
#[derive(Debug, Clone)]
pub struct UcsConfigBuilder {
    base_url: String,
    access_code: String,
    access_code_header: String,
    random_key_header: String,
    user_token_header: String,
    client_token_header: String,
    timeout_secs: u64,
    random_key_length: usize,
    client_id: Option<String>,
    client_secret: Option<String>,
    client_token: Option<String>,
}

impl UcsConfigBuilder {
    pub fn new(base_url: impl Into<String>, access_code: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            access_code: access_code.into(),
            access_code_header: DEFAULT_ACCESS_CODE_HEADER.to_string(),
            random_key_header: DEFAULT_RANDOM_KEY_HEADER.to_string(),
            user_token_header: DEFAULT_USER_TOKEN_HEADER.to_string(),
            client_token_header: DEFAULT_CLIENT_TOKEN_HEADER.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            random_key_length: DEFAULT_RANDOM_KEY_LENGTH,
            client_id: None,
            client_secret: None,
            client_token: None,
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn access_code(mut self, access_code: impl Into<String>) -> Self {
        self.access_code = access_code.into();
        self
    }

    /// Set the timeout in seconds. Zero is ignored and keeps the current value.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        if secs > 0 {
            self.timeout_secs = secs;
        }
        self
    }

    /// Number of digits in the per-request random key. Zero is ignored.
    pub fn random_key_length(mut self, length: usize) -> Self {
        if length > 0 {
            self.random_key_length = length;
        }
        self
    }

    pub fn client_token(mut self, token: impl Into<String>) -> Self {
        self.client_token = Some(token.into());
        self
    }

    pub fn client_id_and_secret(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.client_id = Some(id.into());
        self.client_secret = Some(secret.into());
        self
    }

    pub fn header_names(
        mut self,
        access_code: impl Into<String>,
        random_key: impl Into<String>,
        user_token: impl Into<String>,
        client_token: impl Into<String>,
    ) -> Self {
        self.access_code_header = access_code.into();
        self.random_key_header = random_key.into();
        self.user_token_header = user_token.into();
        self.client_token_header = client_token.into();
        self
    }

    /// Validate header names and produce the config.
    ///
    /// Base URL and credentials are checked when a request is signed, not
    /// here, so a config can be built before every credential is known.
    pub fn build(self) -> Result<UcsConfig> {
        Ok(UcsConfig {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            access_code: self.access_code,
            access_code_header: parse_header_name(&self.access_code_header)?,
            random_key_header: parse_header_name(&self.random_key_header)?,
            user_token_header: parse_header_name(&self.user_token_header)?,
            client_token_header: parse_header_name(&self.client_token_header)?,
            timeout: Duration::from_secs(self.timeout_secs),
            random_key_length: self.random_key_length,
            client_id: self.client_id,
            client_secret: self.client_secret,
            client_token: self.client_token,
        })
    }
}

fn parse_header_name(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|_| UcsError::Config(format!("invalid header name: {:?}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = UcsConfig::builder("https://ucs.example.com/", "app-1")
            .build()
            .unwrap();

        assert_eq!(config.base_url(), "https://ucs.example.com");
        assert_eq!(config.access_code(), "app-1");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.random_key_length, 6);
        assert_eq!(config.access_code_header.as_str(), "accesscode");
        assert_eq!(config.user_token_header().as_str(), "authorization");
        assert_eq!(config.client_token_header().as_str(), "client-authorization");
    }

    #[test]
    fn test_zero_timeout_keeps_default() {
        let config = UcsConfig::builder("http://ucs", "app")
            .timeout_secs(0)
            .build()
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));

        let config = UcsConfig::builder("http://ucs", "app")
            .timeout_secs(5)
            .build()
            .unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_invalid_header_name() {
        let err = UcsConfig::builder("http://ucs", "app")
            .header_names("access code", "randomKey", "Authorization", "Client-Authorization")
            .build()
            .unwrap_err();
        assert!(matches!(err, UcsError::Config(_)));
    }

    #[test]
    fn test_to_builder_produces_independent_config() {
        let original = UcsConfig::builder("http://ucs-a", "app")
            .client_token("ct")
            .build()
            .unwrap();
        let changed = original.to_builder().base_url("http://ucs-b").build().unwrap();

        assert_eq!(original.base_url(), "http://ucs-a");
        assert_eq!(changed.base_url(), "http://ucs-b");
        assert_eq!(changed.client_token.as_deref(), Some("ct"));
    }

    #[test]
    fn test_from_lookup() {
        let config = UcsConfig::from_lookup(lookup_from(&[
            ("UCS_BASE_URL", "http://ucs:8019"),
            ("UCS_ACCESS_CODE", "code-1"),
            ("UCS_TIMEOUT_SECS", "12"),
            ("UCS_CLIENT_ID", "cid"),
            ("UCS_CLIENT_SECRET", "csecret"),
            ("UCS_USER_TOKEN_HEADER", "X-User-Token"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "http://ucs:8019");
        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.client_id.as_deref(), Some("cid"));
        assert_eq!(config.client_secret.as_deref(), Some("csecret"));
        assert_eq!(config.user_token_header().as_str(), "x-user-token");
        assert_eq!(config.random_key_header.as_str(), "randomkey");
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = UcsConfig::from_lookup(lookup_from(&[("UCS_BASE_URL", "http://ucs")])).unwrap_err();
        match err {
            UcsError::Config(msg) => assert!(msg.contains("UCS_ACCESS_CODE")),
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_unpaired_client_credentials() {
        let err = UcsConfig::from_lookup(lookup_from(&[
            ("UCS_BASE_URL", "http://ucs"),
            ("UCS_ACCESS_CODE", "code"),
            ("UCS_CLIENT_ID", "cid"),
        ]))
        .unwrap_err();
        match err {
            UcsError::Config(msg) => assert!(msg.contains("UCS_CLIENT_SECRET")),
            other => panic!("expected Config, got {:?}", other),
        }

        let err = UcsConfig::from_lookup(lookup_from(&[
            ("UCS_BASE_URL", "http://ucs"),
            ("UCS_ACCESS_CODE", "code"),
            ("UCS_CLIENT_SECRET", "csecret"),
        ]))
        .unwrap_err();
        match err {
            UcsError::Config(msg) => assert!(msg.contains("UCS_CLIENT_ID")),
            other => panic!("expected Config, got {:?}", other),
        }
    }

    #[test]
    fn test_from_lookup_bad_timeout() {
        let err = UcsConfig::from_lookup(lookup_from(&[
            ("UCS_BASE_URL", "http://ucs"),
            ("UCS_ACCESS_CODE", "code"),
            ("UCS_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, UcsError::Config(_)));
    }
}
