//! Per-request header construction.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue};

use crate::config::UcsConfig;
use crate::error::{Result, UcsError};
use crate::types::{AuthMode, ClientAuthMode};

/// Scheme prefixed to both the user and client credential headers.
pub const BEARER_TYPE: &str = "Bearer";

/// Builds the header set for one outbound UCS call.
///
/// Borrows the config and never mutates it; the only per-call inputs are the
/// auth mode and the credentials passed in.
pub struct RequestSigner<'a> {
    config: &'a UcsConfig,
    client_token: Option<&'a str>,
}

impl<'a> RequestSigner<'a> {
    pub fn new(config: &'a UcsConfig) -> Self {
        Self {
            config,
            client_token: None,
        }
    }

    /// Use `token` instead of the configured client token for
    /// [`ClientAuthMode::Token`], e.g. to validate a caller's token.
    pub fn client_token(mut self, token: Option<&'a str>) -> Self {
        self.client_token = token;
        self
    }

    /// Produce headers for one call.
    ///
    /// `user_token` is only read in [`AuthMode::User`]; `client_auth` is only
    /// read in [`AuthMode::Client`], where it is required.
    pub fn sign(
        &self,
        mode: AuthMode,
        user_token: Option<&str>,
        client_auth: Option<ClientAuthMode>,
    ) -> Result<HeaderMap> {
        if self.config.base_url.is_empty() {
            return Err(UcsError::Config("UCS base URL is not set".into()));
        }

        let (name, credential) = match mode {
            AuthMode::User => {
                let token = user_token
                    .filter(|t| !t.is_empty())
                    .ok_or_else(|| UcsError::Config("user token is required for UCS".into()))?;
                (&self.config.user_token_header, token.to_string())
            }
            AuthMode::Client => {
                let client_auth = client_auth.ok_or_else(|| {
                    UcsError::UnsupportedMode("client requests need a client auth mode".into())
                })?;
                (&self.config.client_token_header, self.client_credential(client_auth)?)
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            self.config.access_code_header.clone(),
            header_value(&self.config.access_code, "access code")?,
        );
        headers.insert(
            self.config.random_key_header.clone(),
            header_value(&random_key(self.config.random_key_length), "random key")?,
        );
        headers.insert(
            name.clone(),
            header_value(&format!("{} {}", BEARER_TYPE, credential), "credential")?,
        );

        Ok(headers)
    }

    fn client_credential(&self, mode: ClientAuthMode) -> Result<String> {
        match mode {
            ClientAuthMode::Token => self
                .client_token
                .or(self.config.client_token.as_deref())
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .ok_or_else(|| UcsError::Config("client token is not set".into())),
            ClientAuthMode::IdAndSecret => {
                let id = self.config.client_id.as_deref().unwrap_or_default();
                let secret = self.config.client_secret.as_deref().unwrap_or_default();
                if id.is_empty() || secret.is_empty() {
                    return Err(UcsError::Config(
                        "client id and secret are required, or use a client token".into(),
                    ));
                }
                Ok(encode_client_credential(id, secret))
            }
        }
    }
}

/// `base64(id + "@" + secret)` with the standard padded alphabet.
pub fn encode_client_credential(client_id: &str, client_secret: &str) -> String {
    STANDARD.encode(format!("{}@{}", client_id, client_secret))
}

/// Decimal digit string of `length` characters.
pub fn random_key(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.random_range(0..10u8)))
        .collect()
}

fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| UcsError::Config(format!("{} is not a valid header value", what)))
}
