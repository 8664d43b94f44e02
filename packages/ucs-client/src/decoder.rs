//! Envelope parsing and result decoding.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::Result;
use crate::types::{Envelope, ResultOutcome};

/// Message returned for any non-200 response. The real status and body are
/// only logged.
pub const TRANSPORT_ERROR_MESSAGE: &str = "访问UCS发生错误";

/// Turns a raw UCS response into a [`ResultOutcome`].
///
/// Stateless: the same status and body always decode to the same outcome.
pub struct ResultDecoder;

impl ResultDecoder {
    /// Decode `result` into `T`. A null or missing result yields `None`.
    pub fn decode<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<ResultOutcome<T>> {
        Self::decode_with(status, body, |value| {
            if value.is_null() {
                return Ok(None);
            }
            Ok(Some(serde_json::from_value(value)?))
        })
    }

    /// Decode an envelope whose result carries nothing the caller wants.
    pub fn decode_empty(status: StatusCode, body: &str) -> Result<ResultOutcome<()>> {
        Self::decode_with(status, body, |_| Ok(None))
    }

    /// Decode with a caller-supplied conversion of the `result` value.
    ///
    /// The conversion only runs for a successful envelope.
    pub fn decode_with<T, F>(status: StatusCode, body: &str, convert: F) -> Result<ResultOutcome<T>>
    where
        F: FnOnce(Value) -> Result<Option<T>>,
    {
        if status != StatusCode::OK {
            warn!(status = %status, body = %body, "UCS returned non-200 status");
            return Ok(ResultOutcome::failure(TRANSPORT_ERROR_MESSAGE));
        }

        let envelope: Envelope = serde_json::from_str(body)?;
        if !envelope.is_success() {
            let message = if envelope.message.is_empty() {
                format!("UCS rejected the request (code {})", envelope.code)
            } else {
                envelope.message
            };
            return Ok(ResultOutcome::failure(message));
        }

        Ok(ResultOutcome::success(convert(envelope.result)?))
    }
}
