//! One handle wiring the session, gateway and services together.
//!
//! Every service shares the same `Gateway`, so they all see the same session
//! and a 401 from any of them logs the user out of all of them.

use std::sync::Arc;

use crate::auth::AuthService;
use crate::books::BooksApi;
use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::favourites::Favourites;
use crate::gateway::{Gateway, HttpTransport, Transport};
use crate::navigator::Navigator;
use crate::session::SessionStore;
use crate::storage::{DurableStorage, FileStorage};

pub struct BookshareClient {
    config: ClientConfig,
    gateway: Arc<Gateway>,
    auth: AuthService,
    books: BooksApi,
    favourites: Favourites,
}

impl BookshareClient {
    /// Client over the HTTP transport with caller-supplied storage.
    ///
    /// # Errors
    ///
    /// `Transport` if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        storage: Arc<dyn DurableStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config).map_err(|e| ApiError::Transport(e.0))?;
        Ok(Self::with_transport(config, Arc::new(transport), storage, navigator))
    }

    /// Client persisting its session to `config.session_file`.
    ///
    /// # Errors
    ///
    /// `Transport` if the HTTP client cannot be built.
    pub fn from_config(config: ClientConfig, navigator: Arc<dyn Navigator>) -> Result<Self, ApiError> {
        let storage = Arc::new(FileStorage::new(config.session_file.clone()));
        tracing::debug!(path = %config.session_file.display(), base_url = %config.api_base_url, "client configured");
        Self::new(config, storage, navigator)
    }

    #[must_use]
    pub fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        storage: Arc<dyn DurableStorage>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let session = Arc::new(SessionStore::new(storage));
        let gateway = Arc::new(Gateway::new(transport, session, navigator, &config));
        Self {
            auth: AuthService::new(gateway.clone()),
            books: BooksApi::new(gateway.clone()),
            favourites: Favourites::new(gateway.clone()),
            gateway,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        self.gateway.session()
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    #[must_use]
    pub fn books(&self) -> &BooksApi {
        &self.books
    }

    #[must_use]
    pub fn favourites(&self) -> &Favourites {
        &self.favourites
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
