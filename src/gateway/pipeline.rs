//! Pure request/response interceptors.
//!
//! The gateway composes these around the transport:
//! `classify_response(transport(attach_credential(request)))`. They carry no
//! state, so the credential and status rules are tested without a session or
//! a network.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::types::{InboundResponse, OutboundRequest};
use crate::error::ApiError;

pub const UNAUTHORIZED: u16 = 401;

/// Set the bearer header iff a token is present; strip it otherwise.
#[must_use]
pub fn attach_credential(mut request: OutboundRequest, token: Option<&str>) -> OutboundRequest {
    request.authorization = token.map(|token| format!("Bearer {token}"));
    request
}

/// Map a response to the caller-facing result. 401 becomes
/// `ApiError::Unauthorized`; any other non-2xx passes through as `Rejected`.
///
/// # Errors
///
/// Returns an error for every non-2xx status.
pub fn classify_response(response: InboundResponse) -> Result<Value, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    if response.status == UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }
    Err(ApiError::Rejected { status: response.status, body: response.body })
}

/// Like `classify_response` but without special meaning for 401. Used on
/// endpoints where 401 means "bad credentials", not "session expired".
///
/// # Errors
///
/// Returns an error for every non-2xx status.
pub fn classify_public_response(response: InboundResponse) -> Result<Value, ApiError> {
    if response.is_success() {
        return Ok(response.body);
    }
    Err(ApiError::Rejected { status: response.status, body: response.body })
}

/// Deserialize a response body into the caller's type.
///
/// # Errors
///
/// Returns `ApiError::Decode` if the body does not match `T`.
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
