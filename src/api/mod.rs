//! Client for the remote news service.
//!
//! Two read operations (keyword search and top headlines) plus API key
//! validation. Wire records are mapped to [`crate::storage::NewArticle`].

mod newsapi;
mod wire;

pub use newsapi::{build_http_client, ApiError, NewsClient, ALL_LANGUAGES, MAX_HEADLINES};
pub use wire::REMOVED_SENTINEL;
