use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another process holds a lock on the database file
    #[error("The news database is locked by another process. Please close it and try again.")]
    Locked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Map a sqlx error to `Locked` when SQLite reports lock contention
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::Locked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY (5), SQLITE_LOCKED (6) and SQLITE_CANTOPEN (14) all surface as text only.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

// ============================================================================
// Input Types
// ============================================================================

/// An article as delivered by the news service, not yet persisted.
///
/// Description and content are always present (empty when the service omitted
/// them); author and image url stay optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArticle {
    pub title: String,
    pub author: Option<String>,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: Option<String>,
}

// ============================================================================
// Data Structures
// ============================================================================

/// A locally stored article.
///
/// `favorite` and `archived` are independent; archiving is the soft-delete
/// step before permanent removal.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub description: String,
    pub content: String,
    pub url: String,
    pub image_url: Option<String>,
    pub favorite: bool,
    pub archived: bool,
    /// Unix seconds
    pub created_at: i64,
}

/// A user-added country code for the headlines filter
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Country {
    pub id: i64,
    pub name: String,
}

/// A user-added category for the headlines filter
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// One entry of the search history log
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Search {
    pub id: i64,
    pub keyword: String,
    /// Unix seconds
    pub created_at: i64,
}
