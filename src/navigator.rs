//! Navigation capability used for forced and explicit logout redirects.

use std::sync::Mutex;

use crate::config::ClientConfig;
use crate::storage::lock;

/// Views the client can send the user to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Books,
}

impl View {
    /// Path for this view under the given config.
    #[must_use]
    pub fn path(self, config: &ClientConfig) -> &str {
        match self {
            Self::Login => &config.login_path,
            Self::Register => &config.register_path,
            Self::Books => &config.books_path,
        }
    }
}

/// Something that can move the user agent to another view.
pub trait Navigator: Send + Sync {
    fn redirect_to(&self, path: &str);
}

/// Keeps every redirect in order. Used by tests and headless embedders that
/// poll for "where should the user be now".
#[derive(Debug, Default)]
pub struct RecordingNavigator {
    history: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn history(&self) -> Vec<String> {
        lock(&self.history).clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        lock(&self.history).last().cloned()
    }
}

impl Navigator for RecordingNavigator {
    fn redirect_to(&self, path: &str) {
        lock(&self.history).push(path.to_owned());
    }
}

/// Emits a tracing event and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn redirect_to(&self, path: &str) {
        tracing::info!(%path, "redirect");
    }
}

#[cfg(test)]
#[path = "navigator_test.rs"]
mod tests;
