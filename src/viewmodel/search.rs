use crate::api::NewsClient;
use crate::storage::{Database, NewArticle};

pub const NO_RESULTS_MESSAGE: &str = "No articles found for the given keyword and language.";

/// Keyword search state: current results, last error, in-flight flag.
pub struct SearchViewModel {
    db: Database,
    client: NewsClient,
    pub articles: Vec<NewArticle>,
    pub error: Option<String>,
    pub is_searching: bool,
}

impl SearchViewModel {
    pub fn new(db: Database, client: NewsClient) -> Self {
        Self {
            db,
            client,
            articles: Vec::new(),
            error: None,
            is_searching: false,
        }
    }

    /// Run a keyword search and record it in history.
    ///
    /// A blank keyword leaves all state untouched. Failures land in `error`.
    pub async fn perform_search(&mut self, keyword: &str, language: &str) {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return;
        }

        self.is_searching = true;
        self.error = None;
        self.articles.clear();

        if let Err(e) = self.db.record_search(keyword).await {
            tracing::warn!(error = %e, "Failed to record search history");
        }

        match self.client.fetch_news(keyword, language).await {
            Ok(articles) if articles.is_empty() => {
                self.error = Some(NO_RESULTS_MESSAGE.to_string());
            }
            Ok(articles) => {
                self.articles = articles;
            }
            Err(e) => {
                tracing::warn!(error = %e, keyword = %keyword, "Search failed");
                self.error = Some(format!("An error occurred: {}", e));
            }
        }

        self.is_searching = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(server: &MockServer, key: Option<&str>) -> (Database, SearchViewModel) {
        let db = Database::open(":memory:").await.unwrap();
        let client = NewsClient::new(
            reqwest::Client::new(),
            &format!("{}/v2/", server.uri()),
            key.map(|k| SecretString::from(k.to_string())),
        )
        .unwrap();
        (db.clone(), SearchViewModel::new(db, client))
    }

    fn response(titles: &[&str]) -> ResponseTemplate {
        let articles: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| serde_json::json!({"title": t, "url": format!("https://e.com/{i}")}))
            .collect();
        ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok", "articles": articles}))
    }

    #[tokio::test]
    async fn test_blank_keyword_is_noop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(response(&["x"]))
            .expect(0)
            .mount(&server)
            .await;
        let (db, mut vm) = setup(&server, Some("k")).await;

        vm.perform_search("   ", "all").await;

        assert!(vm.articles.is_empty());
        assert!(vm.error.is_none());
        assert!(!vm.is_searching);
        assert!(db.get_search_history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_results_populated_and_history_recorded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .respond_with(response(&["One", "[Removed]", "Two"]))
            .mount(&server)
            .await;
        let (db, mut vm) = setup(&server, Some("k")).await;

        vm.perform_search(" rust ", "en").await;

        assert_eq!(vm.articles.len(), 2);
        assert!(vm.error.is_none());
        assert!(!vm.is_searching);
        let history = db.get_search_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].keyword, "rust");
    }

    #[tokio::test]
    async fn test_empty_results_set_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(response(&["[Removed]"]))
            .mount(&server)
            .await;
        let (_db, mut vm) = setup(&server, Some("k")).await;

        vm.perform_search("nothing", "all").await;

        assert!(vm.articles.is_empty());
        assert_eq!(vm.error.as_deref(), Some(NO_RESULTS_MESSAGE));
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_clears_previous_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(response(&["One"]))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let (db, mut vm) = setup(&server, Some("k")).await;

        vm.perform_search("first", "all").await;
        assert_eq!(vm.articles.len(), 1);

        vm.perform_search("second", "all").await;
        assert!(vm.articles.is_empty());
        let error = vm.error.as_deref().unwrap();
        assert!(error.starts_with("An error occurred: "));
        assert!(!vm.is_searching);

        // Both keywords recorded even though the second fetch failed
        assert_eq!(db.get_search_history().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_message() {
        let server = MockServer::start().await;
        let (_db, mut vm) = setup(&server, None).await;

        vm.perform_search("rust", "all").await;

        assert_eq!(vm.error.as_deref(), Some("An error occurred: API key is missing."));
    }
}
