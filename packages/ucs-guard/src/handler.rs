//! Post-authentication callbacks.

use async_trait::async_trait;
use ucs_client::JwtUser;

use crate::error::GuardRejection;

/// Runs after a guard check succeeds and before the route handler.
///
/// Registered on a [`UcsGuard`](crate::UcsGuard) at startup. Returning an
/// error rejects the request with that error.
#[async_trait]
pub trait AfterAuthHandler: Send + Sync {
    async fn handle(&self, user: &JwtUser, org_ids: &[String]) -> Result<(), GuardRejection>;
}
