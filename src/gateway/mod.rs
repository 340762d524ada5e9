//! Request gateway: the one path every API call takes.
//!
//! ARCHITECTURE
//! ============
//! `dispatch` = snapshot session → `attach_credential` → transport →
//! `classify_response` → forced logout on 401. The interceptors are pure
//! functions in `pipeline`; the gateway owns the side effects (session
//! invalidation and the login redirect).
//!
//! ORDERING
//! ========
//! The credential is read before transmission. On 401 the session is cleared
//! and the redirect issued before `dispatch` returns, so any caller error
//! handling runs against an already-invalidated session.
//!
//! CONCURRENCY
//! ===========
//! Calls are independent; nothing is queued or deduplicated. The forced
//! logout is keyed on the session generation captured at dispatch, so a burst
//! of 401s against the same session produces one clear and one redirect, and
//! a late 401 from a session that has since been replaced is ignored.

pub mod http;
pub mod pipeline;
pub mod types;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::navigator::{Navigator, View};
use crate::session::SessionStore;
pub use http::HttpTransport;
use pipeline::{attach_credential, classify_public_response, classify_response, decode};
pub use types::{InboundResponse, Method, OutboundRequest, Transport, TransportError};

pub struct Gateway {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
    login_path: String,
}

impl Gateway {
    #[must_use]
    pub fn new(
        transport: Arc<dyn Transport>,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
        config: &ClientConfig,
    ) -> Self {
        Self { transport, session, navigator, login_path: View::Login.path(config).to_owned() }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    #[must_use]
    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    #[must_use]
    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Get, path, None).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Post, path, Some(body)).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn put(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Put, path, Some(body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Delete, path, None).await
    }

    /// Any verb with an optional JSON body.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn request(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value, ApiError> {
        let mut request = OutboundRequest::new(method, path);
        request.body = body;
        self.dispatch(request).await
    }

    /// Send an authenticated request and return the response body.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` on 401, after the session was cleared and the login
    ///   redirect issued.
    /// - `Rejected` on any other non-2xx status, body untouched.
    /// - `Transport` if no response arrived.
    /// - `Storage` if the session could not be read.
    pub async fn dispatch(&self, request: OutboundRequest) -> Result<Value, ApiError> {
        let snapshot = self.session.snapshot()?;
        let request = attach_credential(request, snapshot.token.as_deref());
        let method = request.method;
        let path = request.path.clone();
        tracing::debug!(%method, %path, authenticated = request.authorization.is_some(), "dispatch");

        let response = self.transport.send(request).await.map_err(|e| {
            tracing::warn!(%method, %path, error = %e, "transport failed");
            ApiError::Transport(e.0)
        })?;
        let status = response.status;
        let result = classify_response(response);

        match &result {
            Err(ApiError::Unauthorized) => self.force_logout(snapshot.generation),
            Err(_) => tracing::debug!(%method, %path, status, "request rejected"),
            Ok(_) => tracing::trace!(%method, %path, status, "request ok"),
        }
        result
    }

    /// Send a request and deserialize the body into `T`.
    ///
    /// # Errors
    ///
    /// As [`Gateway::dispatch`], plus `Decode` if the body does not match `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, request: OutboundRequest) -> Result<T, ApiError> {
        decode(self.dispatch(request).await?)
    }

    /// Send a request without a credential and without the 401 logout hook.
    /// For the endpoints that create a session in the first place.
    ///
    /// # Errors
    ///
    /// `Rejected` on any non-2xx (401 included), `Transport` if no response
    /// arrived.
    pub async fn dispatch_public(&self, request: OutboundRequest) -> Result<Value, ApiError> {
        let request = attach_credential(request, None);
        tracing::debug!(method = %request.method, path = %request.path, "dispatch public");
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| ApiError::Transport(e.0))?;
        classify_public_response(response)
    }

    fn force_logout(&self, generation: u64) {
        match self.session.invalidate(generation) {
            Ok(true) => {
                tracing::warn!(redirect = %self.login_path, "unauthorized response; session cleared");
                self.navigator.redirect_to(&self.login_path);
            }
            Ok(false) => {
                tracing::debug!("unauthorized response for a session that is already gone");
            }
            Err(e) => {
                tracing::error!(error = %e, "session storage clear failed during forced logout");
                self.navigator.redirect_to(&self.login_path);
            }
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
