//! Axum middleware that guards routes with UCS checks.
//!
//! Each guarded route declares its check explicitly with a [`UcsGuard`]:
//! token validation, a permission code, a permission action, or a client
//! token. On success the resolved identity is available to handlers through
//! the [`UcsUser`] extractor; on failure the request is rejected with a
//! [`GuardRejection`] and the handler never runs.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use axum::{middleware::from_fn_with_state, routing::get, Router};
//! use ucs_guard::{ucs_guard_middleware, GuardCheck, UcsGuard, UcsUser};
//!
//! async fn me(user: UcsUser) -> String {
//!     user.name.clone()
//! }
//!
//! let guard = Arc::new(UcsGuard::new(client, GuardCheck::User));
//! let app: Router = Router::new()
//!     .route("/me", get(me))
//!     .route_layer(from_fn_with_state(guard, ucs_guard_middleware));
//! ```

pub mod error;
pub mod extract;
pub mod guard;
pub mod handler;

pub use error::GuardRejection;
pub use extract::{UcsPermit, UcsUser};
pub use guard::{ucs_guard_middleware, GuardCheck, UcsGuard};
pub use handler::AfterAuthHandler;
