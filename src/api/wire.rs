//! JSON shapes returned by the news service.
use serde::Deserialize;

use crate::storage::NewArticle;

/// Title the service substitutes for articles pulled by the publisher.
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// Successful response body.
#[derive(Debug, Deserialize)]
pub(crate) struct NewsResponse {
    #[serde(default)]
    pub articles: Vec<WireArticle>,
}

/// Error body, e.g. `{"status":"error","code":"apiKeyInvalid","message":"..."}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireArticle {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    pub url: String,
    #[serde(default)]
    pub url_to_image: Option<String>,
}

impl WireArticle {
    fn is_removed(&self) -> bool {
        self.title == REMOVED_SENTINEL
    }

    fn into_new_article(self) -> NewArticle {
        NewArticle {
            title: self.title,
            author: self.author,
            description: self.description.unwrap_or_default(),
            content: self.content.unwrap_or_default(),
            url: self.url,
            image_url: self.url_to_image,
        }
    }
}

/// Drop removed entries, keep at most `limit`, and convert to local articles.
pub(crate) fn map_articles(wire: Vec<WireArticle>, limit: Option<usize>) -> Vec<NewArticle> {
    wire.into_iter()
        .filter(|a| !a.is_removed())
        .take(limit.unwrap_or(usize::MAX))
        .map(WireArticle::into_new_article)
        .collect()
}
