use anyhow::Result;

use super::schema::Database;
use super::types::{Article, NewArticle};

/// Maximum number of articles to return from any single query (OOM protection)
const MAX_ARTICLES: i64 = 2000;

impl Database {
    // ========================================================================
    // Article Mutations
    // ========================================================================

    /// Save an article as a favorite, returning its row ID.
    ///
    /// Idempotent by url: saving an article that is already stored marks the
    /// existing row as favorite instead of inserting a second copy. The
    /// archived flag and original `created_at` are left untouched.
    pub async fn save_article(&self, article: &NewArticle) -> Result<i64> {
        let now = chrono::Utc::now().timestamp();
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO articles (title, author, description, content, url, image_url, favorite, created_at)
            VALUES (?, ?, ?, ?, ?, ?, 1, ?)
            ON CONFLICT(url) DO UPDATE SET favorite = 1
            RETURNING id
        "#,
        )
        .bind(&article.title)
        .bind(&article.author)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.url)
        .bind(&article.image_url)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!(id = row.0, url = %article.url, "Saved article");
        Ok(row.0)
    }

    /// Move an article to the archive. Returns whether the row changed.
    ///
    /// Uses `WHERE archived = 0` so repeated calls are no-ops.
    pub async fn archive_article(&self, article_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET archived = 1 WHERE id = ? AND archived = 0")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Take an article out of the archive. The favorite flag is not touched.
    pub async fn restore_article(&self, article_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE articles SET archived = 0 WHERE id = ? AND archived = 1")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Permanently delete an article. Returns whether a row was removed.
    pub async fn delete_article(&self, article_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ?")
            .bind(article_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ========================================================================
    // Article Queries
    // ========================================================================

    /// Favorites that are not archived, newest first.
    pub async fn get_favorite_articles(&self) -> Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, author, description, content, url, image_url,
                   favorite, archived, created_at
            FROM articles
            WHERE favorite = 1 AND archived = 0
            ORDER BY created_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(MAX_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    /// Archived articles regardless of favorite state, newest first.
    pub async fn get_archived_articles(&self) -> Result<Vec<Article>> {
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, author, description, content, url, image_url,
                   favorite, archived, created_at
            FROM articles
            WHERE archived = 1
            ORDER BY created_at DESC, id DESC
            LIMIT ?
        "#,
        )
        .bind(MAX_ARTICLES)
        .fetch_all(&self.pool)
        .await?;

        Ok(articles)
    }

    /// Get a single article by its ID.
    pub async fn get_article_by_id(&self, article_id: i64) -> Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(
            r#"
            SELECT id, title, author, description, content, url, image_url,
                   favorite, archived, created_at
            FROM articles
            WHERE id = ?
        "#,
        )
        .bind(article_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(article)
    }
}
