//! The authenticated UCS client.

use std::sync::Arc;
use std::time::Instant;

use reqwest::Method;
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{UcsConfig, UcsConfigBuilder};
use crate::decoder::ResultDecoder;
use crate::error::{Result, UcsError};
use crate::signer::RequestSigner;
use crate::transport::{OutboundRequest, RawResponse, ReqwestTransport, Transport};
use crate::types::{AuthMode, ClientAuthMode, FormData, JwtUser, PermitResult, ResultOutcome};

pub const VALIDATE_JWT_PATH: &str = "/api/v1/ucs/jwt/validate";
pub const VALIDATE_CLIENT_PATH: &str = "/api/v1/ucs/client/validate";
pub const VALIDATE_PERM_BY_CODE_PATH: &str = "/api/v1/ucs/users/validate-perm-operation-by-code";
pub const VALIDATE_PERM_BY_ACTION_PATH: &str = "/api/v1/ucs/users/validate-perm-action";

/// One general authenticated call.
///
/// ```rust,ignore
/// let req = UcsRequest::new(Method::GET, "/api/v1/ucs/users").user_token(token);
/// let users: ResultOutcome<Vec<User>> = client.request(req).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UcsRequest {
    method: Method,
    path: String,
    form: Option<FormData>,
    mode: AuthMode,
    client_auth: Option<ClientAuthMode>,
    user_token: Option<String>,
    client_token: Option<String>,
    cancel: Option<CancellationToken>,
}

impl UcsRequest {
    /// A user-mode request with no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            form: None,
            mode: AuthMode::User,
            client_auth: None,
            user_token: None,
            client_token: None,
            cancel: None,
        }
    }

    /// Sign with the end-user token.
    pub fn user_token(mut self, token: impl Into<String>) -> Self {
        self.mode = AuthMode::User;
        self.user_token = Some(token.into());
        self
    }

    /// Sign with the application credential.
    pub fn client_auth(mut self, mode: ClientAuthMode) -> Self {
        self.mode = AuthMode::Client;
        self.client_auth = Some(mode);
        self
    }

    /// Sign with a caller-supplied client token rather than the configured one.
    pub fn client_token(mut self, token: impl Into<String>) -> Self {
        self.mode = AuthMode::Client;
        self.client_auth = Some(ClientAuthMode::Token);
        self.client_token = Some(token.into());
        self
    }

    /// Set the auth mode explicitly, e.g. after parsing it from configuration.
    pub fn mode(mut self, mode: AuthMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn form(mut self, form: FormData) -> Self {
        self.form = Some(form);
        self
    }

    /// Add a single form field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.form
            .get_or_insert_with(FormData::new)
            .insert(name.into(), value.into());
        self
    }

    /// Abort the in-flight call when `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Client for the UCS API.
///
/// Cheap to clone and safe to share across tasks: configuration is immutable
/// and every per-user credential is a call parameter.
#[derive(Clone)]
pub struct UcsClient {
    config: Arc<UcsConfig>,
    transport: Arc<dyn Transport>,
}

impl UcsClient {
    pub fn builder(base_url: impl Into<String>, access_code: impl Into<String>) -> UcsClientBuilder {
        UcsClientBuilder {
            config: UcsConfigBuilder::new(base_url, access_code),
            transport: None,
        }
    }

    /// Create a client using the reqwest transport.
    pub fn new(config: UcsConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.timeout())?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    pub fn with_transport(config: UcsConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config: Arc::new(config),
            transport,
        }
    }

    /// Create from `UCS_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(UcsConfig::from_env()?)
    }

    /// A builder seeded with this client's settings and transport.
    ///
    /// The builder produces a new client; this one is left unchanged.
    pub fn to_builder(&self) -> UcsClientBuilder {
        UcsClientBuilder {
            config: self.config.to_builder(),
            transport: Some(self.transport.clone()),
        }
    }

    pub fn config(&self) -> &UcsConfig {
        &self.config
    }

    /// Validate an end-user JWT and return the identity it carries.
    pub async fn validate_user_token(&self, user_token: &str) -> Result<ResultOutcome<JwtUser>> {
        let req = UcsRequest::new(Method::GET, VALIDATE_JWT_PATH).user_token(user_token);
        let outcome: ResultOutcome<JwtUser> = self.request(req).await?;

        Ok(outcome.map(|mut user| {
            user.token = user_token.to_string();
            user
        }))
    }

    /// Validate this application's own credentials.
    pub async fn validate_client(&self, mode: ClientAuthMode) -> Result<ResultOutcome<()>> {
        let req = UcsRequest::new(Method::GET, VALIDATE_CLIENT_PATH).client_auth(mode);
        self.request_empty(req).await
    }

    /// Validate a client token presented by another application.
    pub async fn validate_client_token(&self, client_token: &str) -> Result<ResultOutcome<()>> {
        let req = UcsRequest::new(Method::GET, VALIDATE_CLIENT_PATH).client_token(client_token);
        self.request_empty(req).await
    }

    /// Check that the user holds the operation permission `code`.
    pub async fn check_permission_by_code(
        &self,
        user_token: &str,
        code: &str,
        fulfill_jwt: bool,
        fulfill_org_ids: bool,
    ) -> Result<ResultOutcome<PermitResult>> {
        let req = UcsRequest::new(Method::POST, VALIDATE_PERM_BY_CODE_PATH)
            .user_token(user_token)
            .field("code", code)
            .field("fulfillJwt", flag(fulfill_jwt))
            .field("fulfillOrgIds", flag(fulfill_org_ids));

        self.request(req).await
    }

    /// Check that the user may call `method path` on `service`.
    pub async fn check_permission_by_action(
        &self,
        user_token: &str,
        service: &str,
        method: &str,
        path: &str,
        fulfill_jwt: bool,
        fulfill_org_ids: bool,
    ) -> Result<ResultOutcome<PermitResult>> {
        let req = UcsRequest::new(Method::POST, VALIDATE_PERM_BY_ACTION_PATH)
            .user_token(user_token)
            .field("service", service)
            .field("method", method)
            .field("path", path)
            .field("fulfillJwt", flag(fulfill_jwt))
            .field("fulfillOrgIds", flag(fulfill_org_ids));

        self.request(req).await
    }

    /// Call any UCS endpoint as the given user.
    pub async fn user_request<T: DeserializeOwned>(
        &self,
        user_token: &str,
        method: Method,
        path: &str,
        form: Option<FormData>,
    ) -> Result<ResultOutcome<T>> {
        let mut req = UcsRequest::new(method, path).user_token(user_token);
        req.form = form;
        self.request(req).await
    }

    /// Call any UCS endpoint as this application.
    pub async fn client_request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        form: Option<FormData>,
        client_auth: ClientAuthMode,
    ) -> Result<ResultOutcome<T>> {
        let mut req = UcsRequest::new(method, path).client_auth(client_auth);
        req.form = form;
        self.request(req).await
    }

    /// Perform a general authenticated call and decode `result` into `T`.
    pub async fn request<T: DeserializeOwned>(&self, req: UcsRequest) -> Result<ResultOutcome<T>> {
        let response = self.execute(req).await?;
        ResultDecoder::decode(response.status, &response.body)
    }

    /// Perform a general authenticated call whose result is ignored.
    pub async fn request_empty(&self, req: UcsRequest) -> Result<ResultOutcome<()>> {
        let response = self.execute(req).await?;
        ResultDecoder::decode_empty(response.status, &response.body)
    }

    async fn execute(&self, req: UcsRequest) -> Result<RawResponse> {
        let headers = RequestSigner::new(&self.config)
            .client_token(req.client_token.as_deref())
            .sign(req.mode, req.user_token.as_deref(), req.client_auth)?;

        let outbound = OutboundRequest {
            method: req.method.clone(),
            url: self.config.url_for(&req.path),
            headers,
            form: req.form.filter(|f| !f.is_empty()),
        };

        let start = Instant::now();
        let response = match req.cancel {
            Some(token) => tokio::select! {
                res = self.transport.send(outbound) => res?,
                _ = token.cancelled() => {
                    warn!(method = %req.method, path = %req.path, "UCS request cancelled");
                    return Err(UcsError::Transport("request cancelled".into()));
                }
            },
            None => self.transport.send(outbound).await?,
        };

        debug!(
            method = %req.method,
            path = %req.path,
            mode = %req.mode,
            status = %response.status,
            duration_ms = start.elapsed().as_millis(),
            "UCS request"
        );

        Ok(response)
    }
}

/// Fluent builder for [`UcsClient`].
pub struct UcsClientBuilder {
    config: UcsConfigBuilder,
    transport: Option<Arc<dyn Transport>>,
}

impl UcsClientBuilder {
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config = self.config.base_url(base_url);
        self
    }

    pub fn access_code(mut self, access_code: impl Into<String>) -> Self {
        self.config = self.config.access_code(access_code);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config = self.config.timeout_secs(secs);
        self
    }

    pub fn random_key_length(mut self, length: usize) -> Self {
        self.config = self.config.random_key_length(length);
        self
    }

    pub fn client_token(mut self, token: impl Into<String>) -> Self {
        self.config = self.config.client_token(token);
        self
    }

    pub fn client_id_and_secret(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config = self.config.client_id_and_secret(id, secret);
        self
    }

    pub fn header_names(
        mut self,
        access_code: impl Into<String>,
        random_key: impl Into<String>,
        user_token: impl Into<String>,
        client_token: impl Into<String>,
    ) -> Self {
        self.config = self
            .config
            .header_names(access_code, random_key, user_token, client_token);
        self
    }

    /// Send through a custom transport instead of reqwest.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<UcsClient> {
        let config = self.config.build()?;
        match self.transport {
            Some(transport) => Ok(UcsClient::with_transport(config, transport)),
            None => UcsClient::new(config),
        }
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
