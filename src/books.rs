//! Book records and their CRUD calls.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::{ApiError, ValidationError};
use crate::gateway::{Gateway, OutboundRequest};

pub const TITLE_MIN_LEN: usize = 3;
pub const DESCRIPTION_MAX_LEN: usize = 500;

const BOOKS_PATH: &str = "books/";

/// Server-assigned book id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(pub u64);

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Owner's username.
    pub owner: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Book {
    /// Only the owner may edit or delete a book.
    #[must_use]
    pub fn is_owned_by(&self, username: &str) -> bool {
        self.owner == username
    }
}

/// Fields a user supplies when creating or editing a book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookDraft {
    pub title: String,
    pub description: String,
}

impl BookDraft {
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into() }
    }

    /// Rules for a new book.
    ///
    /// # Errors
    ///
    /// `TitleTooShort` or `DescriptionTooLong`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.chars().count() < TITLE_MIN_LEN {
            return Err(ValidationError::TitleTooShort { min: TITLE_MIN_LEN });
        }
        if self.description.chars().count() > DESCRIPTION_MAX_LEN {
            return Err(ValidationError::DescriptionTooLong { max: DESCRIPTION_MAX_LEN });
        }
        Ok(())
    }

    /// Rules for an edit: both fields must be filled in, then the create rules.
    ///
    /// # Errors
    ///
    /// `MissingField`, `TitleTooShort` or `DescriptionTooLong`.
    pub fn validate_for_update(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::MissingField("title"));
        }
        if self.description.is_empty() {
            return Err(ValidationError::MissingField("description"));
        }
        self.validate()
    }
}

fn book_path(id: BookId) -> String {
    format!("{BOOKS_PATH}{id}/")
}

pub struct BooksApi {
    gateway: Arc<Gateway>,
}

impl BooksApi {
    #[must_use]
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    /// All books, optionally filtered by a case-insensitive title search.
    ///
    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<Book>, ApiError> {
        let mut request = OutboundRequest::get(BOOKS_PATH);
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            request = request.with_query("search", term);
        }
        self.gateway.fetch(request).await
    }

    /// # Errors
    ///
    /// `Validation` before any network call, otherwise see [`Gateway::dispatch`].
    pub async fn create(&self, draft: &BookDraft) -> Result<Book, ApiError> {
        draft.validate()?;
        let book: Book = self
            .gateway
            .fetch(OutboundRequest::post(BOOKS_PATH, json!(draft)))
            .await?;
        tracing::info!(id = %book.id, "book created");
        Ok(book)
    }

    /// # Errors
    ///
    /// `Validation` before any network call, otherwise see [`Gateway::dispatch`].
    pub async fn update(&self, id: BookId, draft: &BookDraft) -> Result<Book, ApiError> {
        draft.validate_for_update()?;
        let book = self
            .gateway
            .fetch(OutboundRequest::put(book_path(id), json!(draft)))
            .await?;
        tracing::info!(%id, "book updated");
        Ok(book)
    }

    /// # Errors
    ///
    /// See [`Gateway::dispatch`].
    pub async fn delete(&self, id: BookId) -> Result<(), ApiError> {
        self.gateway.delete(&book_path(id)).await?;
        tracing::info!(%id, "book deleted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "books_test.rs"]
mod tests;
