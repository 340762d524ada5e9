//! Session store: the single access token shared by every outbound call.
//!
//! SYSTEM CONTEXT
//! ==============
//! The gateway reads the token before each dispatch and invalidates it when
//! the server answers 401. Login sets it, logout clears it. Nothing else
//! mutates it.
//!
//! DESIGN
//! ======
//! Memory is a write-through cache over `DurableStorage`: every mutation hits
//! storage before the in-memory copy, inside the same lock, so a reader can
//! never observe a value that storage does not hold. The cache starts
//! unloaded and is filled from storage on first read (the restart case).
//!
//! Each mutation bumps a generation counter. A dispatch captures a snapshot;
//! `invalidate` only clears if the generation is unchanged, which collapses a
//! burst of concurrent 401s into a single logout.

use std::sync::{Arc, Mutex};

use crate::config::TOKEN_KEY;
use crate::error::StorageError;
use crate::storage::{DurableStorage, lock};

/// Token and generation as seen by one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub token: Option<String>,
    pub generation: u64,
}

#[derive(Debug, Default)]
struct SessionState {
    // `None` until the first storage read.
    cached: Option<Option<String>>,
    generation: u64,
}

pub struct SessionStore {
    storage: Arc<dyn DurableStorage>,
    key: String,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").field("key", &self.key).finish_non_exhaustive()
    }
}

impl SessionStore {
    #[must_use]
    pub fn new(storage: Arc<dyn DurableStorage>) -> Self {
        Self::with_key(storage, TOKEN_KEY)
    }

    #[must_use]
    pub fn with_key(storage: Arc<dyn DurableStorage>, key: &str) -> Self {
        Self { storage, key: key.to_owned(), state: Mutex::new(SessionState::default()) }
    }

    /// Current token, loading it from storage on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has to be loaded and storage fails.
    pub fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self.snapshot()?.token)
    }

    /// Current token plus the generation it belongs to.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has to be loaded and storage fails.
    pub fn snapshot(&self) -> Result<SessionSnapshot, StorageError> {
        let mut state = lock(&self.state);
        let token = self.loaded(&mut state)?.clone();
        Ok(SessionSnapshot { token, generation: state.generation })
    }

    /// Whether a token is currently held.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has to be loaded and storage fails.
    pub fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self.get()?.is_some())
    }

    /// Store a new token, durable copy first.
    ///
    /// # Errors
    ///
    /// Returns an error if storage rejects the write; memory is left as it was.
    pub fn set(&self, token: &str) -> Result<(), StorageError> {
        let mut state = lock(&self.state);
        self.storage.write(&self.key, token)?;
        state.cached = Some(Some(token.to_owned()));
        state.generation += 1;
        tracing::debug!(generation = state.generation, "session token stored");
        Ok(())
    }

    /// Drop the token. Returns whether one was held. Idempotent.
    ///
    /// Memory is cleared even when storage fails, so a token that is being
    /// discarded is never sent again by this process.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read or cleared.
    pub fn clear(&self) -> Result<bool, StorageError> {
        let mut state = lock(&self.state);
        let had_token = self.loaded(&mut state).map(Option::is_some);
        self.discard(&mut state)?;
        had_token
    }

    /// Clear the session only if nothing has touched it since `generation`
    /// was observed. Returns whether this call cleared it.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be cleared; memory is still cleared.
    pub fn invalidate(&self, generation: u64) -> Result<bool, StorageError> {
        let mut state = lock(&self.state);
        if state.generation != generation {
            return Ok(false);
        }
        self.discard(&mut state)?;
        Ok(true)
    }

    fn loaded<'a>(&self, state: &'a mut SessionState) -> Result<&'a Option<String>, StorageError> {
        if state.cached.is_none() {
            let token = self.storage.read(&self.key)?;
            state.cached = Some(token);
        }
        Ok(&*state.cached.get_or_insert(None))
    }

    fn discard(&self, state: &mut SessionState) -> Result<(), StorageError> {
        state.cached = Some(None);
        state.generation += 1;
        tracing::debug!(generation = state.generation, "session token cleared");
        self.storage.clear(&self.key)
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
