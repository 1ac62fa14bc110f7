use crate::api::NewsClient;
use crate::storage::NewArticle;

/// The short list of top headlines for the selected country and category.
pub struct HeadlinesViewModel {
    client: NewsClient,
    pub headlines: Vec<NewArticle>,
    pub error: Option<String>,
    pub is_loading: bool,
}

impl HeadlinesViewModel {
    pub fn new(client: NewsClient) -> Self {
        Self {
            client,
            headlines: Vec::new(),
            error: None,
            is_loading: false,
        }
    }

    /// Replace the headlines. An empty `category` means no category filter.
    pub async fn load(&mut self, country: &str, category: &str) {
        self.is_loading = true;
        self.error = None;

        match self.client.fetch_top_headlines(country, Some(category)).await {
            Ok(headlines) => self.headlines = headlines,
            Err(e) => {
                tracing::warn!(error = %e, country = %country, category = %category, "Failed to load headlines");
                self.headlines.clear();
                self.error = Some(format!("An error occurred: {}", e));
            }
        }

        self.is_loading = false;
    }
}
