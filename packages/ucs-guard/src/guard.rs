use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};
use ucs_client::{JwtUser, PermitResult, ResultOutcome, UcsClient, UcsError};

use crate::error::GuardRejection;
use crate::extract::{UcsPermit, UcsUser};
use crate::handler::AfterAuthHandler;

/// What a guarded route requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardCheck {
    /// A valid user JWT
    User,
    /// The user holds operation permission `code`
    PermissionByCode { code: String, fulfill_org_ids: bool },
    /// The user may perform `method path` on the guard's service.
    /// `None` means "use the incoming request's method / path".
    PermissionByAction {
        method: Option<String>,
        path: Option<String>,
        fulfill_org_ids: bool,
    },
    /// The caller presents a valid client token
    Client,
}

impl GuardCheck {
    pub fn permission(code: impl Into<String>) -> Self {
        GuardCheck::PermissionByCode {
            code: code.into(),
            fulfill_org_ids: false,
        }
    }

    /// Action check using the incoming request's method and path.
    pub fn action() -> Self {
        GuardCheck::PermissionByAction {
            method: None,
            path: None,
            fulfill_org_ids: false,
        }
    }

    pub fn action_for(method: impl Into<String>, path: impl Into<String>) -> Self {
        GuardCheck::PermissionByAction {
            method: Some(method.into()),
            path: Some(path.into()),
            fulfill_org_ids: false,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            GuardCheck::User => "user",
            GuardCheck::PermissionByCode { .. } => "permission_by_code",
            GuardCheck::PermissionByAction { .. } => "permission_by_action",
            GuardCheck::Client => "client",
        }
    }
}

/// One guard: a client, the check it performs, and an optional callback.
///
/// Each guarded route (or router) declares its own guard:
///
/// ```rust,ignore
/// let guard = Arc::new(UcsGuard::new(client, GuardCheck::permission("UCS_USER_LIST")));
/// let app = Router::new()
///     .route("/users", get(list_users))
///     .route_layer(axum::middleware::from_fn_with_state(guard, ucs_guard_middleware));
/// ```
#[derive(Clone)]
pub struct UcsGuard {
    client: UcsClient,
    check: GuardCheck,
    service: Option<String>,
    after: Option<Arc<dyn AfterAuthHandler>>,
}

impl UcsGuard {
    pub fn new(client: UcsClient, check: GuardCheck) -> Self {
        Self {
            client,
            check,
            service: None,
            after: None,
        }
    }

    /// Service name sent with action checks.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_after_handler(mut self, handler: Arc<dyn AfterAuthHandler>) -> Self {
        self.after = Some(handler);
        self
    }

    pub fn check(&self) -> &GuardCheck {
        &self.check
    }

    /// Run the check against an incoming request.
    ///
    /// On success the request carries [`UcsUser`] (and [`UcsPermit`] for
    /// permission checks) in its extensions.
    pub async fn authorize(&self, request: &mut Request) -> Result<(), GuardRejection> {
        match &self.check {
            GuardCheck::User => {
                let token = self.user_token(request.headers())?;
                let outcome = self.client.validate_user_token(&token).await?;
                let mut user =
                    accept(outcome, GuardRejection::Unauthorized)?.ok_or(GuardRejection::UnresolvedIdentity)?;
                user.token = token;
                self.finish(request, user, None).await
            }
            GuardCheck::PermissionByCode {
                code,
                fulfill_org_ids,
            } => {
                let token = self.user_token(request.headers())?;
                let outcome = self
                    .client
                    .check_permission_by_code(&token, code, true, *fulfill_org_ids)
                    .await?;
                let permit = accept(outcome, GuardRejection::Forbidden)?.unwrap_or_default();
                self.finish_permit(request, token, permit).await
            }
            GuardCheck::PermissionByAction {
                method,
                path,
                fulfill_org_ids,
            } => {
                let service = self.service.as_deref().ok_or_else(|| {
                    UcsError::Config("action checks need a service name on the guard".into())
                })?;
                let token = self.user_token(request.headers())?;
                let method = method
                    .clone()
                    .unwrap_or_else(|| request.method().as_str().to_string());
                let path = path
                    .clone()
                    .unwrap_or_else(|| request.uri().path().to_string());

                let outcome = self
                    .client
                    .check_permission_by_action(&token, service, &method, &path, true, *fulfill_org_ids)
                    .await?;
                let permit = accept(outcome, GuardRejection::Forbidden)?.unwrap_or_default();
                self.finish_permit(request, token, permit).await
            }
            GuardCheck::Client => {
                let token = bearer_token(request.headers(), self.client.config().client_token_header())
                    .ok_or(GuardRejection::MissingToken)?;
                let outcome = self.client.validate_client_token(&token).await?;
                accept(outcome, GuardRejection::Unauthorized)?;
                Ok(())
            }
        }
    }

    fn user_token(&self, headers: &HeaderMap) -> Result<String, GuardRejection> {
        bearer_token(headers, self.client.config().user_token_header()).ok_or(GuardRejection::MissingToken)
    }

    async fn finish_permit(
        &self,
        request: &mut Request,
        token: String,
        permit: PermitResult,
    ) -> Result<(), GuardRejection> {
        // checks are always sent with fulfill_jwt, so the user must come back
        let mut user = permit.jwt_user.clone().ok_or(GuardRejection::UnresolvedIdentity)?;
        user.token = token;
        self.finish(request, user, Some(permit)).await
    }

    async fn finish(
        &self,
        request: &mut Request,
        user: JwtUser,
        permit: Option<PermitResult>,
    ) -> Result<(), GuardRejection> {
        if let Some(handler) = &self.after {
            let org_ids = permit.as_ref().map(|p| p.org_ids.as_slice()).unwrap_or_default();
            handler.handle(&user, org_ids).await?;
        }

        debug!(check = self.check.name(), user = %user.id, "UCS check passed");

        request.extensions_mut().insert(UcsUser(user));
        if let Some(permit) = permit {
            request.extensions_mut().insert(UcsPermit(permit));
        }
        Ok(())
    }
}

/// Guard middleware for `axum::middleware::from_fn_with_state`.
///
/// Rejects the request with a [`GuardRejection`] response if the check fails;
/// the inner handler never runs in that case.
pub async fn ucs_guard_middleware(
    State(guard): State<Arc<UcsGuard>>,
    mut request: Request,
    next: Next,
) -> Result<Response, GuardRejection> {
    if let Err(rejection) = guard.authorize(&mut request).await {
        warn!(
            check = guard.check.name(),
            method = %request.method(),
            path = %request.uri().path(),
            code = rejection.code(),
            error = %rejection,
            "UCS guard rejected request"
        );
        return Err(rejection);
    }

    Ok(next.run(request).await)
}

/// Turn a failed outcome into `reject(message)`.
fn accept<T>(
    outcome: ResultOutcome<T>,
    reject: fn(String) -> GuardRejection,
) -> Result<Option<T>, GuardRejection> {
    outcome.into_result().map_err(|err| match err {
        UcsError::Denied(message) => reject(message),
        other => GuardRejection::Ucs(other),
    })
}

/// Token from `header`, with or without the `Bearer ` prefix.
fn bearer_token(headers: &HeaderMap, header: &axum::http::HeaderName) -> Option<String> {
    let raw = headers.get(header)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
