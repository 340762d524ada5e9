//! Login, registration, logout and current-user lookup.
//!
//! SYSTEM CONTEXT
//! ==============
//! Login is the only legitimate source of a session token. Registration is a
//! separate step and never authenticates; the caller is sent to the login
//! view afterwards.
//!
//! ERROR HANDLING
//! ==============
//! Input is validated locally first. Obviously invalid input never costs a
//! round trip and never mutates the session.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ValidationError};
use crate::gateway::pipeline::decode;
use crate::gateway::{Gateway, OutboundRequest};
use crate::navigator::View;

pub const LOGIN_MIN_PASSWORD_LEN: usize = 6;
pub const REGISTER_MIN_PASSWORD_LEN: usize = 8;

const TOKEN_PATH: &str = "token/";
const REGISTER_PATH: &str = "register/";
const CURRENT_USER_PATH: &str = "current_user/";

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]{3,20}$").expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid regex"));

// =============================================================================
// VALIDATION
// =============================================================================

/// # Errors
///
/// `InvalidUsername` unless 3–20 ASCII letters or digits.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUsername)
    }
}

/// # Errors
///
/// `InvalidEmail` unless shaped like `local@domain.tld` with no whitespace.
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if EMAIL_RE.is_match(email) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail)
    }
}

/// # Errors
///
/// `PasswordTooShort` if fewer than `min` characters.
pub fn validate_password(password: &str, min: usize) -> Result<(), ValidationError> {
    if password.chars().count() >= min {
        Ok(())
    } else {
        Err(ValidationError::PasswordTooShort { min })
    }
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access: String,
}

/// Identity of the authenticated user as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, serde::Serialize)]
pub struct CurrentUser {
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

// =============================================================================
// SERVICE
// =============================================================================

pub struct AuthService {
    gateway: Arc<Gateway>,
}

impl AuthService {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// Exchange credentials for an access token and store it.
    ///
    /// Returns the view to show next.
    ///
    /// # Errors
    ///
    /// `Validation` before any network call; `Rejected` when the server
    /// refuses the credentials; `Transport`/`Decode`/`Storage` otherwise.
    pub async fn login(&self, username: &str, password: &str) -> Result<View, ApiError> {
        validate_username(username)?;
        validate_password(password, LOGIN_MIN_PASSWORD_LEN)?;

        let body = json!({ "username": username, "password": password });
        let response = self
            .gateway
            .dispatch_public(OutboundRequest::post(TOKEN_PATH, body))
            .await
            .inspect_err(|e| tracing::info!(%username, error = %e, "login failed"))?;
        let TokenResponse { access } = decode(response)?;

        self.gateway.session().set(&access)?;
        tracing::info!(%username, "logged in");
        Ok(View::Books)
    }

    /// Create an account. Leaves the session untouched and returns the login
    /// view for the caller to navigate to.
    ///
    /// # Errors
    ///
    /// `Validation` before any network call; `Rejected` carrying the server's
    /// field errors (e.g. username or email already in use).
    pub async fn register(&self, username: &str, email: &str, password: &str) -> Result<View, ApiError> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password, REGISTER_MIN_PASSWORD_LEN)?;

        let body = json!({ "username": username, "email": email, "password": password });
        self.gateway
            .dispatch_public(OutboundRequest::post(REGISTER_PATH, body))
            .await
            .inspect_err(|e| tracing::info!(%username, error = %e, "registration failed"))?;
        tracing::info!(%username, "registered");
        Ok(View::Login)
    }

    /// Drop the session and send the user to the login view. Safe to call
    /// with no session.
    ///
    /// # Errors
    ///
    /// `Storage` if the durable copy could not be removed. The in-memory
    /// session and the redirect happen regardless.
    pub fn logout(&self) -> Result<(), ApiError> {
        let cleared = self.gateway.session().clear();
        self.gateway.navigator().redirect_to(self.gateway.login_path());
        match cleared {
            Ok(had_token) => {
                tracing::info!(had_token, "logged out");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn current_user(&self) -> Result<CurrentUser, ApiError> {
        self.gateway.fetch(OutboundRequest::get(CURRENT_USER_PATH)).await
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
