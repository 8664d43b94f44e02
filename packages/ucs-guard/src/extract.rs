//! Access to the identity attached by the guard.

use std::ops::Deref;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use ucs_client::{JwtUser, PermitResult};

use crate::error::GuardRejection;

/// The identity resolved by the guard, available to handlers as an extractor.
///
/// ```rust,ignore
/// async fn me(UcsUser(user): UcsUser) -> String {
///     user.name
/// }
/// ```
#[derive(Debug, Clone)]
pub struct UcsUser(pub JwtUser);

/// The permission-check payload, attached by the permission guards.
#[derive(Debug, Clone)]
pub struct UcsPermit(pub PermitResult);

impl Deref for UcsUser {
    type Target = JwtUser;

    fn deref(&self) -> &JwtUser {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UcsUser
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UcsUser>()
            .cloned()
            .ok_or(GuardRejection::MissingIdentity)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for UcsPermit
where
    S: Send + Sync,
{
    type Rejection = GuardRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<UcsPermit>()
            .cloned()
            .ok_or(GuardRejection::MissingIdentity)
    }
}
