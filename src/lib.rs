//! Bookshare client core: session lifecycle and the authenticated request
//! pipeline for the book-sharing API.
//!
//! ARCHITECTURE
//! ============
//! `SessionStore` holds the one access token over a `DurableStorage`.
//! `Gateway` attaches it to every call and forces a logout plus a login
//! redirect (through a `Navigator`) when the server answers 401. The
//! `auth`, `books` and `favourites` services sit on top of the gateway, and
//! `BookshareClient` wires them together.

pub mod auth;
pub mod books;
pub mod client;
pub mod config;
pub mod error;
pub mod favourites;
pub mod gateway;
pub mod navigator;
pub mod session;
pub mod storage;

#[cfg(test)]
mod test_support;

pub use auth::{AuthService, CurrentUser};
pub use books::{Book, BookDraft, BookId, BooksApi};
pub use client::BookshareClient;
pub use config::ClientConfig;
pub use error::{ApiError, ErrorCode, StorageError, ValidationError};
pub use favourites::{Favourite, FavouriteId, FavouriteSet, Favourites, FavouritesApi};
pub use gateway::{Gateway, HttpTransport, Method, OutboundRequest, Transport};
pub use navigator::{LogNavigator, Navigator, RecordingNavigator, View};
pub use session::{SessionSnapshot, SessionStore};
pub use storage::{DurableStorage, FileStorage, MemoryStorage};
