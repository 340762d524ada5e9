//! Error taxonomy for the request pipeline.
//!
//! DESIGN
//! ======
//! Four failure classes reach callers: local validation, forced logout (401),
//! remote rejection (any other non-2xx), and transport failure. Storage and
//! decode failures ride alongside. Every variant carries a grepable `E_*` code
//! so the view layer can branch without string matching.

use serde_json::Value;

// =============================================================================
// ERROR CODES
// =============================================================================

/// Stable, grepable code for an error value.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;
}

// =============================================================================
// VALIDATION
// =============================================================================

/// Input rejected locally before any network call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid username format")]
    InvalidUsername,
    #[error("invalid email format")]
    InvalidEmail,
    #[error("password must be at least {min} characters long")]
    PasswordTooShort { min: usize },
    #[error("title must be at least {min} characters long")]
    TitleTooShort { min: usize },
    #[error("description cannot exceed {max} characters")]
    DescriptionTooLong { max: usize },
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

impl ErrorCode for ValidationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUsername => "E_INVALID_USERNAME",
            Self::InvalidEmail => "E_INVALID_EMAIL",
            Self::PasswordTooShort { .. } => "E_PASSWORD_TOO_SHORT",
            Self::TitleTooShort { .. } => "E_TITLE_TOO_SHORT",
            Self::DescriptionTooLong { .. } => "E_DESCRIPTION_TOO_LONG",
            Self::MissingField(_) => "E_MISSING_FIELD",
        }
    }
}

// =============================================================================
// STORAGE
// =============================================================================

/// Durable storage failure.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage file is malformed: {0}")]
    Format(#[from] serde_json::Error),
}

impl ErrorCode for StorageError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Io(_) => "E_STORAGE_IO",
            Self::Format(_) => "E_STORAGE_FORMAT",
        }
    }
}

// =============================================================================
// API
// =============================================================================

/// Failure of any operation that goes through the request gateway.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The server answered 401. The session has already been cleared and the
    /// login redirect issued by the time the caller sees this.
    #[error("unauthorized: session cleared")]
    Unauthorized,

    /// Any other non-2xx status. `body` is passed through untouched.
    #[error("request rejected with status {status}")]
    Rejected { status: u16, body: Value },

    #[error("transport failed: {0}")]
    Transport(String),

    #[error("response decode failed: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ApiError {
    /// HTTP status carried by the error, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Human-readable message the server attached to a rejection, if any.
    ///
    /// Understands `{"detail": ..}`, `{"error": ..}`, `{"message": ..}` and
    /// field-error maps like `{"email": ["This email is already in use."]}`.
    #[must_use]
    pub fn server_message(&self) -> Option<String> {
        match self {
            Self::Rejected { body, .. } => server_message_from_body(body),
            _ => None,
        }
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.error_code(),
            Self::Unauthorized => "E_UNAUTHORIZED",
            Self::Rejected { .. } => "E_REJECTED",
            Self::Transport(_) => "E_TRANSPORT",
            Self::Decode(_) => "E_DECODE",
            Self::Storage(e) => e.error_code(),
        }
    }
}

pub(crate) fn server_message_from_body(body: &Value) -> Option<String> {
    match body {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(map) => {
            for key in ["detail", "error", "message"] {
                if let Some(Value::String(s)) = map.get(key) {
                    return Some(s.clone());
                }
            }
            map.iter().find_map(|(field, value)| {
                let first = match value {
                    Value::Array(items) => items.first().and_then(Value::as_str),
                    Value::String(s) => Some(s.as_str()),
                    _ => None,
                }?;
                Some(format!("{field}: {first}"))
            })
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
