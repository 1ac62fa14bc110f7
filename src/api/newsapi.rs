use futures::StreamExt;
use reqwest::redirect::Policy;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use super::wire::{map_articles, ErrorBody, NewsResponse};
use crate::storage::NewArticle;
use crate::util::{validate_api_base, MAX_SEARCH_QUERY_LENGTH};

const MAX_RESPONSE_SIZE: usize = 5 * 1024 * 1024; // 5MB

/// Page size requested from `everything`
const SEARCH_PAGE_SIZE: &str = "100";

/// Page size requested from `top-headlines`
const HEADLINES_PAGE_SIZE: &str = "10";

/// Headlines kept after filtering
pub const MAX_HEADLINES: usize = 4;

/// Language value meaning "no language filter"
pub const ALL_LANGUAGES: &str = "all";

/// Failures talking to the news service.
///
/// Callers only show the message; no variant is retried.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("API key is missing.")]
    MissingApiKey,
    #[error("Failed to construct URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid search query: {0}")]
    InvalidQuery(String),
    /// Never built from a `reqwest::Error` that still carries its URL, since
    /// request URLs contain the API key. Use [`ApiError::network`].
    #[error("Network error: {0}")]
    Network(reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("News service error ({status}): {message}")]
    Service { status: u16, code: Option<String>, message: String },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Redirect policy: at most 3 hops, no loops, no HTTPS to HTTP downgrade.
///
/// Request URLs carry the API key in the query string, so only the host and
/// path of each hop are logged.
fn create_redirect_policy() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() >= 3 {
            return attempt.error("Too many redirects (max 3)");
        }

        let url = attempt.url();
        if attempt.previous().iter().any(|prev| prev.as_str() == url.as_str()) {
            return attempt.error("Redirect loop detected");
        }

        let downgrade = attempt
            .previous()
            .last()
            .is_some_and(|prev| prev.scheme() == "https" && url.scheme() != "https");
        if downgrade {
            return attempt.error("Refusing redirect from HTTPS to HTTP");
        }

        tracing::debug!(
            host = url.host_str().unwrap_or(""),
            path = url.path(),
            hop = attempt.previous().len() + 1,
            "Following redirect"
        );

        attempt.follow()
    })
}

impl ApiError {
    fn network(err: reqwest::Error) -> Self {
        ApiError::Network(err.without_url())
    }
}

/// Build the shared HTTP client used for all news requests.
pub fn build_http_client(timeout: Duration) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .redirect(create_redirect_policy())
        .user_agent(concat!("newsroom/", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()
        .map_err(ApiError::network)?;
    Ok(client)
}

/// Client for the NewsAPI `everything` and `top-headlines` endpoints.
pub struct NewsClient {
    http: reqwest::Client,
    base: Url,
    api_key: Option<SecretString>,
}

impl std::fmt::Debug for NewsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsClient")
            .field("base", &self.base.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl NewsClient {
    /// Create a client rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// `ApiError::InvalidUrl` if the base is unparsable, or plain HTTP on a
    /// host other than localhost.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: Option<SecretString>,
    ) -> Result<Self, ApiError> {
        let base = validate_api_base(base_url).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.scheme() == "http" {
            tracing::warn!(base_url = %base, "Using non-HTTPS news base URL (localhost only)");
        }
        Ok(Self { http, base, api_key })
    }

    /// Search all articles for `keyword`.
    ///
    /// `language` of `"all"` (or empty) disables the language filter. Entries
    /// titled `[Removed]` are dropped.
    pub async fn fetch_news(
        &self,
        keyword: &str,
        language: &str,
    ) -> Result<Vec<NewArticle>, ApiError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(ApiError::InvalidQuery("keyword is empty".to_string()));
        }
        if keyword.len() > MAX_SEARCH_QUERY_LENGTH {
            return Err(ApiError::InvalidQuery(format!(
                "keyword exceeds {} characters",
                MAX_SEARCH_QUERY_LENGTH
            )));
        }

        let mut params = vec![("q", keyword), ("pageSize", SEARCH_PAGE_SIZE)];
        let language = language.trim();
        if !language.is_empty() && language != ALL_LANGUAGES {
            params.push(("language", language));
        }

        tracing::info!(keyword = %keyword, language = %language, "Fetching news");
        let wire = self.perform_request("everything", &params).await?;
        let articles = map_articles(wire, None);
        tracing::debug!(count = articles.len(), "Search returned articles");
        Ok(articles)
    }

    /// Top headlines for a country, optionally narrowed to a category.
    ///
    /// At most [`MAX_HEADLINES`] articles are returned, counted after
    /// `[Removed]` entries are dropped.
    pub async fn fetch_top_headlines(
        &self,
        country: &str,
        category: Option<&str>,
    ) -> Result<Vec<NewArticle>, ApiError> {
        let mut params = vec![("country", country.trim()), ("pageSize", HEADLINES_PAGE_SIZE)];
        let category = category.map(str::trim).filter(|c| !c.is_empty());
        if let Some(category) = category {
            params.push(("category", category));
        }

        tracing::info!(country = %country, category = ?category, "Fetching top headlines");
        let wire = self.perform_request("top-headlines", &params).await?;
        Ok(map_articles(wire, Some(MAX_HEADLINES)))
    }

    /// Check a candidate key with a one-article headlines request.
    ///
    /// Returns `true` only for HTTP 200. Network failures count as invalid.
    pub async fn validate_api_key(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }

        let url = match self.endpoint_url(
            "top-headlines",
            &[("country", "us"), ("pageSize", "1")],
            key,
        ) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Could not build key validation URL");
                return false;
            }
        };

        match self.http.get(url).send().await {
            Ok(response) => {
                let ok = response.status() == reqwest::StatusCode::OK;
                tracing::debug!(status = response.status().as_u16(), "API key validation response");
                ok
            }
            Err(e) => {
                tracing::warn!(error = %e.without_url(), "Error validating API key");
                false
            }
        }
    }

    fn endpoint_url(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
        api_key: &str,
    ) -> Result<Url, ApiError> {
        let mut url = self
            .base
            .join(endpoint)
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("apiKey", api_key);
        Ok(url)
    }

    async fn perform_request(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<Vec<super::wire::WireArticle>, ApiError> {
        let api_key = self
            .api_key
            .as_ref()
            .map(|k| k.expose_secret())
            .filter(|k| !k.trim().is_empty())
            .ok_or(ApiError::MissingApiKey)?;

        let url = self.endpoint_url(endpoint, params, api_key)?;
        let response = self.http.get(url).send().await.map_err(ApiError::network)?;
        let status = response.status();
        let body = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;

        if !status.is_success() {
            return Err(service_error(status.as_u16(), &body));
        }

        let decoded: NewsResponse = serde_json::from_slice(&body)?;
        Ok(decoded.articles)
    }
}

/// Prefer the service's own message when the error body is readable.
fn service_error(status: u16, body: &[u8]) -> ApiError {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(ErrorBody {
            code,
            message: Some(message),
        }) => {
            tracing::debug!(status, code = ?code, "News service returned an error body");
            ApiError::Service {
                status,
                code,
                message,
            }
        }
        _ => ApiError::HttpStatus(status),
    }
}

async fn read_limited_bytes(response: reqwest::Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, key: Option<&str>) -> NewsClient {
        NewsClient::new(
            reqwest::Client::new(),
            &format!("{}/v2/", server.uri()),
            key.map(|k| SecretString::from(k.to_string())),
        )
        .unwrap()
    }

    fn article_json(title: &str, n: usize) -> serde_json::Value {
        serde_json::json!({
            "title": title,
            "author": null,
            "description": "desc",
            "content": null,
            "url": format!("https://example.com/{n}"),
            "urlToImage": null
        })
    }

    fn body(titles: &[&str]) -> serde_json::Value {
        let articles: Vec<_> = titles
            .iter()
            .enumerate()
            .map(|(i, t)| article_json(t, i))
            .collect();
        serde_json::json!({ "status": "ok", "totalResults": titles.len(), "articles": articles })
    }

    #[tokio::test]
    async fn test_fetch_news_builds_query_and_filters_removed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param("q", "climate change"))
            .and(query_param("pageSize", "100"))
            .and(query_param("language", "en"))
            .and(query_param("apiKey", "k-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&[
                "One",
                "[Removed]",
                "Two",
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k-123"));
        let articles = client.fetch_news("climate change", "en").await.unwrap();

        let titles: Vec<_> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["One", "Two"]);
        assert_eq!(articles[0].content, "");
        assert_eq!(articles[0].description, "desc");
    }

    #[tokio::test]
    async fn test_fetch_news_all_languages_omits_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/everything"))
            .and(query_param_is_missing("language"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["One"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let articles = client.fetch_news("rust", ALL_LANGUAGES).await.unwrap();
        assert_eq!(articles.len(), 1);
    }

    #[tokio::test]
    async fn test_top_headlines_truncated_to_four() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("country", "no"))
            .and(query_param("pageSize", "10"))
            .and(query_param("category", "sports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&[
                "[Removed]", "a", "b", "c", "d", "e", "f",
            ])))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let headlines = client
            .fetch_top_headlines("no", Some("sports"))
            .await
            .unwrap();

        let titles: Vec<_> = headlines.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["a", "b", "c", "d"]);
    }

    #[tokio::test]
    async fn test_top_headlines_fewer_than_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param_is_missing("category"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&["only"])))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let headlines = client.fetch_top_headlines("us", Some("  ")).await.unwrap();
        assert_eq!(headlines.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_api_key_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&[])))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        let result = client.fetch_news("rust", "all").await;
        assert!(matches!(result, Err(ApiError::MissingApiKey)));

        let client = client_for(&server, Some("   "));
        let result = client.fetch_top_headlines("us", None).await;
        assert!(matches!(result, Err(ApiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_service_error_message_surfaces() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "status": "error",
                "code": "apiKeyInvalid",
                "message": "Your API key is invalid or incorrect."
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("bad"));
        let err = client.fetch_news("rust", "all").await.unwrap_err();
        match &err {
            ApiError::Service { status, code, .. } => {
                assert_eq!(*status, 401);
                assert_eq!(code.as_deref(), Some("apiKeyInvalid"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Your API key is invalid"));
    }

    #[tokio::test]
    async fn test_http_error_without_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let err = client.fetch_news("rust", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::HttpStatus(500)));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let err = client.fetch_news("rust", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_oversized_response_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(MAX_RESPONSE_SIZE + 1)))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k"));
        let err = client.fetch_news("rust", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(_)));
    }

    #[tokio::test]
    async fn test_network_error() {
        // Nothing listens on this port once the listener is dropped
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = NewsClient::new(
            reqwest::Client::new(),
            &format!("http://127.0.0.1:{port}/v2/"),
            Some(SecretString::from("k".to_string())),
        )
        .unwrap();

        let err = client.fetch_news("rust", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }

    #[tokio::test]
    async fn test_network_error_does_not_expose_key() {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let client = NewsClient::new(
            reqwest::Client::new(),
            &format!("http://127.0.0.1:{port}/v2/"),
            Some(SecretString::from("TOPSECRET-KEY-42".to_string())),
        )
        .unwrap();

        let err = client.fetch_news("rust", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
        assert!(!err.to_string().contains("TOPSECRET-KEY-42"));
        assert!(!format!("{:?}", err).contains("TOPSECRET-KEY-42"));

        let err = client.fetch_top_headlines("us", None).await.unwrap_err();
        assert!(!err.to_string().contains("TOPSECRET-KEY-42"));
    }

    #[tokio::test]
    async fn test_empty_keyword_rejected() {
        let server = MockServer::start().await;
        let client = client_for(&server, Some("k"));
        let err = client.fetch_news("  ", "all").await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_validate_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("apiKey", "good"))
            .and(query_param("pageSize", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body(&[])))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v2/top-headlines"))
            .and(query_param("apiKey", "bad"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_for(&server, None);
        assert!(client.validate_api_key("good").await);
        assert!(!client.validate_api_key("bad").await);
        assert!(!client.validate_api_key("").await);
    }

    #[test]
    fn test_insecure_base_rejected() {
        let result = NewsClient::new(reqwest::Client::new(), "http://newsapi.org/v2/", None);
        assert!(matches!(result, Err(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = NewsClient::new(
            reqwest::Client::new(),
            "https://newsapi.org/v2/",
            Some(SecretString::from("hidden-key".to_string())),
        )
        .unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("hidden-key"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(Duration::from_secs(5)).is_ok());
    }
}
