use crate::storage::{Article, Database};

/// Archived articles, which can be restored or deleted for good.
pub struct ArchiveViewModel {
    db: Database,
    pub archived: Vec<Article>,
    pub error: Option<String>,
}

impl ArchiveViewModel {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            archived: Vec::new(),
            error: None,
        }
    }

    pub async fn load_archived(&mut self) {
        match self.db.get_archived_articles().await {
            Ok(archived) => {
                self.archived = archived;
                self.error = None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load archived articles");
                self.error = Some(format!("Failed to load archived articles: {}", e));
            }
        }
    }

    /// Clear the archived flag and refresh.
    pub async fn restore(&mut self, article_id: i64) {
        let result = self.db.restore_article(article_id).await;
        if self.check_changed(result, article_id, "restore") {
            self.load_archived().await;
        }
    }

    /// Delete permanently and refresh.
    pub async fn delete(&mut self, article_id: i64) {
        let result = self.db.delete_article(article_id).await;
        if self.check_changed(result, article_id, "delete") {
            self.load_archived().await;
        }
    }

    fn check_changed(&mut self, result: anyhow::Result<bool>, article_id: i64, action: &str) -> bool {
        match result {
            Ok(true) => {
                tracing::debug!(article_id, action, "Archive entry updated");
                true
            }
            Ok(false) => {
                self.error = Some(format!("No article with id {}", article_id));
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, article_id, action, "Archive operation failed");
                self.error = Some(format!("Failed to {} article: {}", action, e));
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::NewArticle;

    async fn setup_with_archived() -> (Database, ArchiveViewModel, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let id = db
            .save_article(&NewArticle {
                title: "Old news".to_string(),
                author: Some("Reporter".to_string()),
                description: String::new(),
                content: String::new(),
                url: "https://e.com/old".to_string(),
                image_url: None,
            })
            .await
            .unwrap();
        db.archive_article(id).await.unwrap();
        (db.clone(), ArchiveViewModel::new(db), id)
    }

    #[tokio::test]
    async fn test_load_archived() {
        let (_db, mut vm, id) = setup_with_archived().await;
        vm.load_archived().await;
        assert_eq!(vm.archived.len(), 1);
        assert_eq!(vm.archived[0].id, id);
    }

    #[tokio::test]
    async fn test_restore_returns_to_favorites() {
        let (db, mut vm, id) = setup_with_archived().await;
        vm.restore(id).await;

        assert!(vm.archived.is_empty());
        assert!(vm.error.is_none());
        let favorites = db.get_favorite_articles().await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert!(!favorites[0].archived);
        assert!(favorites[0].favorite);
    }

    #[tokio::test]
    async fn test_delete_is_permanent() {
        let (db, mut vm, id) = setup_with_archived().await;
        vm.delete(id).await;

        assert!(vm.archived.is_empty());
        assert!(db.get_article_by_id(id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_id_sets_error() {
        let (_db, mut vm, _id) = setup_with_archived().await;
        vm.delete(999).await;
        assert_eq!(vm.error.as_deref(), Some("No article with id 999"));
    }
}
