//! UCS wire types and call outcomes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Result, UcsError};

/// Form fields sent with a POST. Ordered so the encoded body is stable.
pub type FormData = BTreeMap<String, String>;

// =============================================================================
// Auth modes
// =============================================================================

/// Which credential a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthMode {
    /// End-user bearer token in the user-token header
    User,
    /// Application credential in the client-token header
    Client,
}

/// How a client-mode request proves the application's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClientAuthMode {
    /// A pre-issued client token
    Token,
    /// `base64(client_id + "@" + client_secret)`
    IdAndSecret,
}

impl FromStr for AuthMode {
    type Err = UcsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(AuthMode::User),
            "CLIENT" => Ok(AuthMode::Client),
            _ => Err(UcsError::UnsupportedMode(format!(
                "unknown request type [{}]",
                s
            ))),
        }
    }
}

impl FromStr for ClientAuthMode {
    type Err = UcsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "TOKEN" => Ok(ClientAuthMode::Token),
            "ID_AND_SECRET" => Ok(ClientAuthMode::IdAndSecret),
            _ => Err(UcsError::UnsupportedMode(format!(
                "unknown client auth type [{}]",
                s
            ))),
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMode::User => f.write_str("USER"),
            AuthMode::Client => f.write_str("CLIENT"),
        }
    }
}

impl fmt::Display for ClientAuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientAuthMode::Token => f.write_str("TOKEN"),
            ClientAuthMode::IdAndSecret => f.write_str("ID_AND_SECRET"),
        }
    }
}

// =============================================================================
// Envelope
// =============================================================================

/// Response wrapper returned by every UCS endpoint.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Envelope {
    #[serde(deserialize_with = "code_as_string")]
    pub code: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub result: Value,
}

impl Envelope {
    pub fn is_success(&self) -> bool {
        self.code == "0"
    }
}

/// UCS sends `code` as a string, but some deployments emit a bare number.
fn code_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "envelope code must be a string or number, got {}",
            other
        ))),
    }
}

// =============================================================================
// Outcome
// =============================================================================

/// Outcome of a UCS call.
///
/// Either `success` with an optional result, or a failure with a non-empty
/// message and no result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    rename_all = "camelCase",
    try_from = "OutcomeWire<T>",
    bound(deserialize = "T: Deserialize<'de>")
)]
pub struct ResultOutcome<T> {
    success: bool,
    message: String,
    result: Option<T>,
}

/// Unchecked serialized form of a [`ResultOutcome`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OutcomeWire<T> {
    success: bool,
    #[serde(default)]
    message: String,
    result: Option<T>,
}

impl<T> TryFrom<OutcomeWire<T>> for ResultOutcome<T> {
    type Error = String;

    fn try_from(wire: OutcomeWire<T>) -> std::result::Result<Self, Self::Error> {
        if wire.success {
            return Ok(ResultOutcome::success(wire.result));
        }
        if wire.message.is_empty() {
            return Err("failed outcome must carry a message".into());
        }
        if wire.result.is_some() {
            return Err("failed outcome must not carry a result".into());
        }
        Ok(ResultOutcome::failure(wire.message))
    }
}

impl<T> ResultOutcome<T> {
    pub fn success(result: Option<T>) -> Self {
        Self {
            success: true,
            message: String::new(),
            result,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            result: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Transform the result value, keeping success and message.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResultOutcome<U> {
        ResultOutcome {
            success: self.success,
            message: self.message,
            result: self.result.map(f),
        }
    }

    /// Convert into a `Result`, turning a remote rejection into [`UcsError::Denied`].
    pub fn into_result(self) -> Result<Option<T>> {
        if self.success {
            Ok(self.result)
        } else {
            Err(UcsError::Denied(self.message))
        }
    }
}

// =============================================================================
// Identity & permissions
// =============================================================================

/// User identity decoded from a validated JWT.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtUser {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// Device id the token was issued to
    #[serde(default)]
    pub did: String,

    /// The bearer token that was validated. Not part of the wire payload.
    #[serde(skip)]
    pub token: String,
}

/// Payload returned by the permission-check endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermitResult {
    /// Present when the check was made with `fulfill_jwt`
    #[serde(default)]
    pub jwt_user: Option<JwtUser>,

    /// Present when the check was made with `fulfill_org_ids`
    #[serde(default)]
    pub org_ids: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_modes() {
        assert_eq!("user".parse::<AuthMode>().unwrap(), AuthMode::User);
        assert_eq!("CLIENT".parse::<AuthMode>().unwrap(), AuthMode::Client);
        assert_eq!(
            "id_and_secret".parse::<ClientAuthMode>().unwrap(),
            ClientAuthMode::IdAndSecret
        );

        let err = "ADMIN".parse::<AuthMode>().unwrap_err();
        assert!(matches!(err, UcsError::UnsupportedMode(_)));
        let err = "PASSWORD".parse::<ClientAuthMode>().unwrap_err();
        assert!(matches!(err, UcsError::UnsupportedMode(_)));
    }

    #[test]
    fn test_envelope_numeric_code() {
        let env: Envelope = serde_json::from_value(json!({"code": 0, "message": ""})).unwrap();
        assert!(env.is_success());
        assert!(env.result.is_null());

        let env: Envelope =
            serde_json::from_value(json!({"code": "10001", "message": "expired"})).unwrap();
        assert!(!env.is_success());
        assert_eq!(env.message, "expired");
    }

    #[test]
    fn test_envelope_rejects_object_code() {
        let res = serde_json::from_value::<Envelope>(json!({"code": {}, "message": ""}));
        assert!(res.is_err());
    }

    #[test]
    fn test_outcome_into_result() {
        let ok: ResultOutcome<u32> = ResultOutcome::success(Some(7));
        assert_eq!(ok.into_result().unwrap(), Some(7));

        let denied: ResultOutcome<u32> = ResultOutcome::failure("no permission");
        match denied.into_result() {
            Err(UcsError::Denied(msg)) => assert_eq!(msg, "no permission"),
            other => panic!("expected Denied, got {:?}", other),
        }
    }

    #[test]
    fn test_outcome_wire_shape() {
        let outcome: ResultOutcome<JwtUser> = ResultOutcome::failure("bad token");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"success": false, "message": "bad token", "result": null})
        );
    }

    #[test]
    fn test_outcome_deserialize_keeps_invariant() {
        let ok: ResultOutcome<u32> =
            serde_json::from_value(json!({"success": true, "message": "", "result": 3})).unwrap();
        assert_eq!(ok, ResultOutcome::success(Some(3)));

        let failed: ResultOutcome<u32> =
            serde_json::from_value(json!({"success": false, "message": "expired", "result": null}))
                .unwrap();
        assert_eq!(failed, ResultOutcome::failure("expired"));

        let empty_message =
            serde_json::from_value::<ResultOutcome<u32>>(json!({"success": false, "message": ""}));
        assert!(empty_message.is_err());

        let failure_with_result = serde_json::from_value::<ResultOutcome<u32>>(
            json!({"success": false, "message": "no", "result": 1}),
        );
        assert!(failure_with_result.is_err());
    }

    #[test]
    fn test_jwt_user_token_not_on_wire() {
        let user = JwtUser {
            name: "alice".into(),
            token: "secret".into(),
            ..Default::default()
        };
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("token").is_none());
    }

    #[test]
    fn test_permit_result_defaults() {
        let permit: PermitResult = serde_json::from_value(json!({})).unwrap();
        assert!(permit.jwt_user.is_none());
        assert!(permit.org_ids.is_empty());

        let permit: PermitResult = serde_json::from_value(json!({
            "jwtUser": {"id": "u1", "name": "bob"},
            "orgIds": ["o1", "o2"]
        }))
        .unwrap();
        assert_eq!(permit.jwt_user.unwrap().name, "bob");
        assert_eq!(permit.org_ids, vec!["o1", "o2"]);
    }
}
