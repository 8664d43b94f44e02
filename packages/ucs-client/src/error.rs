//! Error types for the UCS client.

use thiserror::Error;

/// Result type for UCS client operations.
pub type Result<T> = std::result::Result<T, UcsError>;

/// UCS client errors.
///
/// A remote rejection (non-zero envelope code) is normally returned as data in
/// a [`ResultOutcome`](crate::ResultOutcome); `Denied` only appears once a
/// caller converts an outcome with [`ResultOutcome::into_result`](crate::ResultOutcome::into_result).
#[derive(Debug, Error)]
pub enum UcsError {
    /// A required setting or credential is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// UCS rejected the token, client or permission
    #[error("Denied by UCS: {0}")]
    Denied(String),

    /// Network failure, timeout or cancellation
    #[error("Transport error: {0}")]
    Transport(String),

    /// Envelope or result payload does not match the requested shape
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Unknown or missing auth mode
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),
}

/// Coarse classification of a [`UcsError`], for callers that map failures to
/// responses without matching on messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Denied,
    Configuration,
    Transport,
    Decode,
    UnsupportedMode,
}

impl UcsError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UcsError::Config(_) => ErrorKind::Configuration,
            UcsError::Denied(_) => ErrorKind::Denied,
            UcsError::Transport(_) => ErrorKind::Transport,
            UcsError::Decode(_) => ErrorKind::Decode,
            UcsError::UnsupportedMode(_) => ErrorKind::UnsupportedMode,
        }
    }
}

impl ErrorKind {
    /// Stable machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Denied => "denied",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Transport => "transport",
            ErrorKind::Decode => "decode",
            ErrorKind::UnsupportedMode => "unsupported_mode",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(UcsError::Config("x".into()).kind(), ErrorKind::Configuration);
        assert_eq!(UcsError::Denied("x".into()).kind(), ErrorKind::Denied);
        assert_eq!(UcsError::Transport("x".into()).kind(), ErrorKind::Transport);
        assert_eq!(
            UcsError::UnsupportedMode("x".into()).kind(),
            ErrorKind::UnsupportedMode
        );

        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert_eq!(UcsError::from(parse_err).kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_display() {
        let err = UcsError::Config("UCS base URL is not set".into());
        assert_eq!(err.to_string(), "Configuration error: UCS base URL is not set");

        let err = UcsError::Transport("request cancelled".into());
        assert_eq!(err.to_string(), "Transport error: request cancelled");
        let err = UcsError::Denied("token expired".into());
        assert_eq!(err.to_string(), "Denied by UCS: token expired");
    }
}
