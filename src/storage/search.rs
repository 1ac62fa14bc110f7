use anyhow::{bail, Result};

use super::schema::Database;
use super::types::Search;
use crate::util::{strip_control_chars, MAX_SEARCH_QUERY_LENGTH};

/// Maximum number of history rows returned in one listing
const MAX_HISTORY: i64 = 500;

impl Database {
    // ========================================================================
    // Search History Operations
    // ========================================================================

    /// Append a keyword to the search log, returning the new row ID.
    pub async fn record_search(&self, keyword: &str) -> Result<i64> {
        let keyword = strip_control_chars(keyword);
        let keyword = keyword.trim();
        if keyword.is_empty() {
            bail!("Search keyword cannot be empty");
        }
        if keyword.len() > MAX_SEARCH_QUERY_LENGTH {
            bail!(
                "Search keyword exceeds maximum length of {} characters",
                MAX_SEARCH_QUERY_LENGTH
            );
        }

        let now = chrono::Utc::now().timestamp();
        let row: (i64,) =
            sqlx::query_as("INSERT INTO searches (keyword, created_at) VALUES (?, ?) RETURNING id")
                .bind(keyword)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.0)
    }

    /// Past searches, most recent first.
    pub async fn get_search_history(&self) -> Result<Vec<Search>> {
        let rows = sqlx::query_as::<_, Search>(
            r#"
            SELECT id, keyword, created_at
            FROM searches
            ORDER BY created_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(MAX_HISTORY)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Delete a single history entry. Returns whether a row was removed.
    pub async fn delete_search(&self, search_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM searches WHERE id = ?")
            .bind(search_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete the whole search history, returning how many rows were removed.
    pub async fn clear_search_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM searches")
            .execute(&self.pool)
            .await?;
        tracing::debug!(removed = result.rows_affected(), "Cleared search history");
        Ok(result.rows_affected())
    }
}
