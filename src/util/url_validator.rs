use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,
    /// Plain HTTP was requested for a host other than localhost.
    #[error("Insecure URL: HTTPS required (except localhost for testing)")]
    Insecure,
}

/// Validate an article link before handing it to the system browser.
///
/// Only `http`/`https` URLs with a host are accepted, so a publisher cannot
/// smuggle `file://` or custom scheme handlers through the news service.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if !matches!(url.host_str(), Some(host) if !host.is_empty()) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}

/// Validate the news service base URL.
///
/// The API key travels in the query string, so plain HTTP is refused unless
/// the host is `localhost` or `127.0.0.1` (mock servers in tests). A trailing
/// slash is added when missing so endpoint paths join under the base path.
pub fn validate_api_base(base: &str) -> Result<Url, UrlValidationError> {
    let mut url = Url::parse(base.trim())?;

    match url.scheme() {
        "https" => {}
        "http" => {
            let is_localhost = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
            if !is_localhost {
                return Err(UrlValidationError::Insecure);
            }
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if url.host_str().is_none() {
        return Err(UrlValidationError::MissingHost);
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}
