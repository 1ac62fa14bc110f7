use crate::storage::{Article, Database, NewArticle};

pub const SAVE_SUCCESS_MESSAGE: &str = "Article saved successfully!";
pub const SAVE_FAILURE_MESSAGE: &str = "Failed to save article.";

/// Saved (favorite, not archived) articles.
pub struct ArticlesViewModel {
    db: Database,
    pub favorites: Vec<Article>,
    pub error: Option<String>,
}

impl ArticlesViewModel {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            favorites: Vec::new(),
            error: None,
        }
    }

    pub async fn load_favorites(&mut self) {
        match self.db.get_favorite_articles().await {
            Ok(favorites) => {
                self.favorites = favorites;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load favorites");
                self.error = Some(format!("Failed to load saved articles: {}", e));
            }
        }
    }

    /// Archive an article, then refresh the list.
    pub async fn move_to_trash(&mut self, article_id: i64) {
        match self.db.archive_article(article_id).await {
            Ok(true) => tracing::debug!(article_id, "Article archived"),
            Ok(false) => {
                self.error = Some(format!("No saved article with id {}", article_id));
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, article_id, "Failed to archive article");
                self.error = Some(format!("Failed to archive article: {}", e));
                return;
            }
        }
        self.load_favorites().await;
    }

    /// Save an article as a favorite and return the message to show.
    pub async fn save(&self, article: &NewArticle) -> &'static str {
        match self.db.save_article(article).await {
            Ok(id) => {
                tracing::info!(article_id = id, url = %article.url, "Article saved");
                SAVE_SUCCESS_MESSAGE
            }
            Err(e) => {
                tracing::warn!(error = %e, url = %article.url, "Failed to save article");
                SAVE_FAILURE_MESSAGE
            }
        }
    }
}
