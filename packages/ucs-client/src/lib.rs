//! Typed REST client for the UCS authentication and authorization service.
//!
//! Validates user JWTs and client credentials, checks permissions, and makes
//! general authenticated calls against the UCS API. Every call is signed with
//! the configured access code, a fresh random key, and either a user bearer
//! token or a client credential.
//!
//! # Example
//!
//! ```rust,ignore
//! use ucs_client::{ClientAuthMode, UcsClient};
//!
//! let client = UcsClient::builder("https://ucs.example.com", "my-access-code")
//!     .client_id_and_secret("my-app", "s3cret")
//!     .timeout_secs(10)
//!     .build()?;
//!
//! let outcome = client.validate_user_token(&token).await?;
//! if let Some(user) = outcome.into_result()? {
//!     println!("hello {}", user.name);
//! }
//!
//! let permit = client
//!     .check_permission_by_code(&token, "UCS_USER_LIST", true, false)
//!     .await?;
//! ```
//!
//! Remote rejections come back as data (`ResultOutcome::is_success() == false`);
//! only configuration, transport and decode problems are errors.

pub mod client;
pub mod config;
pub mod decoder;
pub mod error;
pub mod signer;
pub mod testing;
pub mod transport;
pub mod types;

pub use client::{
    UcsClient, UcsClientBuilder, UcsRequest, VALIDATE_CLIENT_PATH, VALIDATE_JWT_PATH,
    VALIDATE_PERM_BY_ACTION_PATH, VALIDATE_PERM_BY_CODE_PATH,
};
pub use config::{UcsConfig, UcsConfigBuilder};
pub use decoder::{ResultDecoder, TRANSPORT_ERROR_MESSAGE};
pub use error::{ErrorKind, Result, UcsError};
pub use signer::{RequestSigner, BEARER_TYPE};
pub use transport::{OutboundRequest, RawResponse, ReqwestTransport, Transport};
pub use types::{AuthMode, ClientAuthMode, FormData, JwtUser, PermitResult, ResultOutcome};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;
