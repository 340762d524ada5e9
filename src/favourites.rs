//! Favourite records and local membership tracking.
//!
//! DESIGN
//! ======
//! The view asks "is book N a favourite?" but the API deletes by favourite
//! record id. `FavouriteSet` keeps the book-id → record-id mapping so a
//! removal can never be issued with the wrong id; `BookId` and `FavouriteId`
//! are distinct types for the same reason.
//!
//! Local membership only changes after the server confirmed the change.
//! A response that lands after a forced logout still updates this local
//! index; that is harmless because the index is rebuilt on the next refresh.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::books::{Book, BookId};
use crate::error::ApiError;
use crate::gateway::{Gateway, OutboundRequest};
use crate::storage::lock;

const FAVOURITES_PATH: &str = "favourites/";

/// Server-assigned favourite record id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FavouriteId(pub u64);

impl std::fmt::Display for FavouriteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `book` field of a favourite: a bare id or the embedded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FavouriteBook {
    Id(BookId),
    Embedded(Book),
}

impl FavouriteBook {
    #[must_use]
    pub fn book_id(&self) -> BookId {
        match self {
            Self::Id(id) => *id,
            Self::Embedded(book) => book.id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favourite {
    pub id: FavouriteId,
    pub book: FavouriteBook,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

impl Favourite {
    #[must_use]
    pub fn book_id(&self) -> BookId {
        self.book.book_id()
    }
}

// =============================================================================
// MEMBERSHIP
// =============================================================================

/// Book ids the user has favourited, each with its favourite record id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FavouriteSet {
    by_book: BTreeMap<BookId, FavouriteId>,
}

impl FavouriteSet {
    #[must_use]
    pub fn from_records(records: &[Favourite]) -> Self {
        let mut set = Self::default();
        for record in records {
            set.insert(record);
        }
        set
    }

    #[must_use]
    pub fn contains(&self, book_id: BookId) -> bool {
        self.by_book.contains_key(&book_id)
    }

    #[must_use]
    pub fn record_for(&self, book_id: BookId) -> Option<FavouriteId> {
        self.by_book.get(&book_id).copied()
    }

    pub fn insert(&mut self, record: &Favourite) {
        self.by_book.insert(record.book_id(), record.id);
    }

    /// Forget a book; returns the record id it was stored under.
    pub fn remove_book(&mut self, book_id: BookId) -> Option<FavouriteId> {
        self.by_book.remove(&book_id)
    }

    /// Forget whichever book a record id belongs to.
    pub fn remove_record(&mut self, favourite_id: FavouriteId) -> Option<BookId> {
        let book_id = self
            .by_book
            .iter()
            .find_map(|(book, record)| (*record == favourite_id).then_some(*book))?;
        self.by_book.remove(&book_id);
        Some(book_id)
    }

    pub fn book_ids(&self) -> impl Iterator<Item = BookId> + '_ {
        self.by_book.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_book.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_book.is_empty()
    }
}

// =============================================================================
// REMOTE CALLS
// =============================================================================

pub struct FavouritesApi {
    gateway: Arc<Gateway>,
}

impl FavouritesApi {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn list(&self) -> Result<Vec<Favourite>, ApiError> {
        self.gateway.fetch(OutboundRequest::get(FAVOURITES_PATH)).await
    }

    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn add(&self, book_id: BookId) -> Result<Favourite, ApiError> {
        self.gateway
            .fetch(OutboundRequest::post(FAVOURITES_PATH, json!({ "book": book_id })))
            .await
    }

    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn remove(&self, favourite_id: FavouriteId) -> Result<(), ApiError> {
        self.gateway
            .delete(&format!("{FAVOURITES_PATH}{favourite_id}/"))
            .await?;
        Ok(())
    }
}

// =============================================================================
// COORDINATOR
// =============================================================================

/// Remote favourites plus the local membership index, kept in step.
pub struct Favourites {
    api: FavouritesApi,
    set: Mutex<FavouriteSet>,
}

impl Favourites {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { api: FavouritesApi::new(gateway), set: Mutex::new(FavouriteSet::default()) }
    }

    /// Reload the index from the server.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`]. The index is left as it was on failure.
    pub async fn refresh(&self) -> Result<Vec<Favourite>, ApiError> {
        let records = self.api.list().await?;
        *lock(&self.set) = FavouriteSet::from_records(&records);
        Ok(records)
    }

    #[must_use]
    pub fn contains(&self, book_id: BookId) -> bool {
        lock(&self.set).contains(book_id)
    }

    #[must_use]
    pub fn snapshot(&self) -> FavouriteSet {
        lock(&self.set).clone()
    }

    /// Favourite a book. Already-favourited books return their existing
    /// record id without a network call.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`]. Membership is unchanged on failure.
    pub async fn add(&self, book_id: BookId) -> Result<FavouriteId, ApiError> {
        if let Some(existing) = lock(&self.set).record_for(book_id) {
            return Ok(existing);
        }
        let record = self.api.add(book_id).await?;
        lock(&self.set).insert(&record);
        tracing::info!(book_id = %book_id, favourite_id = %record.id, "favourite added");
        Ok(record.id)
    }

    /// Unfavourite a book by looking up its record id. Returns whether a
    /// removal was issued; a book that is not a favourite is a no-op.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`]. Membership is unchanged on failure.
    pub async fn remove(&self, book_id: BookId) -> Result<bool, ApiError> {
        let Some(favourite_id) = lock(&self.set).record_for(book_id) else {
            return Ok(false);
        };
        self.remove_record(favourite_id).await?;
        Ok(true)
    }

    /// Delete a favourite record by its own id.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`]. Membership is unchanged on failure.
    pub async fn remove_record(&self, favourite_id: FavouriteId) -> Result<(), ApiError> {
        self.api.remove(favourite_id).await?;
        let book_id = lock(&self.set).remove_record(favourite_id);
        tracing::info!(?book_id, %favourite_id, "favourite removed");
        Ok(())
    }
}

#[cfg(test)]
#[path = "favourites_test.rs"]
mod tests;
