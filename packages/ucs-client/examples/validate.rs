//! Validate a user token and this application's client credentials against UCS.
//!
//! ```sh
//! UCS_BASE_URL=http://localhost:8019 UCS_ACCESS_CODE=... UCS_CLIENT_ID=... \
//!     UCS_CLIENT_SECRET=... cargo run -p ucs-client --example validate -- <user-jwt>
//! ```

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ucs_client::{ClientAuthMode, UcsClient};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,ucs_client=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let client = UcsClient::from_env().context("Failed to load UCS configuration")?;

    let client_check = client.validate_client(ClientAuthMode::IdAndSecret).await?;
    tracing::info!(
        success = client_check.is_success(),
        message = client_check.message(),
        "Client validation"
    );

    if let Some(token) = std::env::args().nth(1) {
        let outcome = client.validate_user_token(&token).await?;
        match outcome.into_result() {
            Ok(Some(user)) => tracing::info!(id = %user.id, name = %user.name, "Token is valid"),
            Ok(None) => tracing::info!("Token is valid"),
            Err(e) => tracing::warn!(error = %e, "Token rejected"),
        }
    }

    Ok(())
}
