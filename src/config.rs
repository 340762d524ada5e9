//! Client configuration parsed from environment variables.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api/";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_REGISTER_PATH: &str = "/register";
pub const DEFAULT_BOOKS_PATH: &str = "/books";
pub const DEFAULT_SESSION_FILE: &str = ".bookshare/session.json";

/// Key the access token lives under in durable storage.
pub const TOKEN_KEY: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL every resource path is resolved against. Always ends in `/`.
    pub api_base_url: String,
    pub login_path: String,
    pub register_path: String,
    pub books_path: String,
    pub session_file: PathBuf,
    /// `None` leaves the transport default in place.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            login_path: DEFAULT_LOGIN_PATH.to_owned(),
            register_path: DEFAULT_REGISTER_PATH.to_owned(),
            books_path: DEFAULT_BOOKS_PATH.to_owned(),
            session_file: default_session_file(),
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `BOOKSHARE_API_BASE_URL`: default `http://127.0.0.1:8000/api/`
    /// - `BOOKSHARE_LOGIN_PATH`: default `/login`
    /// - `BOOKSHARE_SESSION_FILE`: default `<local data dir>/bookshare/session.json`
    /// - `BOOKSHARE_CONNECT_TIMEOUT_SECS`: unset means no client-side limit
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let api_base_url = env_string("BOOKSHARE_API_BASE_URL")
            .map_or(defaults.api_base_url, |raw| normalize_base_url(&raw));
        let login_path = env_string("BOOKSHARE_LOGIN_PATH").unwrap_or(defaults.login_path);
        let session_file = env_string("BOOKSHARE_SESSION_FILE").map_or(defaults.session_file, PathBuf::from);
        let connect_timeout = env_string("BOOKSHARE_CONNECT_TIMEOUT_SECS")
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        Self { api_base_url, login_path, session_file, connect_timeout, ..defaults }
    }

    /// Replace the base URL, normalizing the trailing slash.
    #[must_use]
    pub fn with_api_base_url(mut self, base_url: &str) -> Self {
        self.api_base_url = normalize_base_url(base_url);
        self
    }

    #[must_use]
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.session_file = path.into();
        self
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

pub(crate) fn normalize_base_url(raw: &str) -> String {
    format!("{}/", raw.trim().trim_end_matches('/'))
}

fn default_session_file() -> PathBuf {
    dirs::data_local_dir().map_or_else(
        || PathBuf::from(DEFAULT_SESSION_FILE),
        |dir| dir.join("bookshare").join("session.json"),
    )
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
