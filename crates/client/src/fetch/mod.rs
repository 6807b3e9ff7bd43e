//! HTTP page fetching.
//!
//! ### URL Canonicalization
//! - Trim whitespace, ensure scheme (default: `https`)
//! - Lowercase host, remove fragments
//! - Preserve query string
//!
//! ### Fetch Limits
//! - Max redirects: 5
//! - Max body bytes: 10MB (configurable), enforced while streaming
//! - Per-request timeout; the caller's analysis deadline wraps it

pub mod url;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::{Client, StatusCode, header};
use seoscope_core::{AppConfig, Error};

pub use self::url::{UrlError, canonicalize, page_origin};

/// Configuration for the page fetcher.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "SEOAnalyzer/1.0")
    pub user_agent: String,

    /// Maximum response body size in bytes (default: 10MB)
    pub max_bytes: usize,

    /// Request timeout (default: 15s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "SEOAnalyzer/1.0".to_string(),
            max_bytes: 10 * 1024 * 1024,
            timeout: Duration::from_secs(15),
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.fetch_timeout(),
            ..Self::default()
        }
    }
}

/// A fetched page body and the metadata scoring needs.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL after redirects
    pub final_url: ::url::Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response body bytes
    pub body: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Declared Content-Length when present, else the body length
    pub page_size: usize,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

impl FetchedPage {
    /// A `200 OK` HTML page served from `final_url`.
    pub fn html(final_url: ::url::Url, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        Self {
            final_url,
            status: StatusCode::OK,
            content_type: Some("text/html; charset=utf-8".to_string()),
            page_size: body.len(),
            body,
            headers: header::HeaderMap::new(),
            fetch_ms: 0,
        }
    }

    /// Whether the body looks like something an HTML parser can read.
    ///
    /// A missing Content-Type is given the benefit of the doubt.
    pub fn is_markup(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(ct) => {
                let ct = ct.to_ascii_lowercase();
                ct.contains("html") || ct.contains("xml") || ct.starts_with("text/")
            }
        }
    }
}

/// Source of page bodies for analysis.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch `url`, failing with a fetch-stage [`Error`] on transport errors,
    /// non-success status, or an oversized body.
    async fn fetch(&self, url: &::url::Url) -> Result<FetchedPage, Error>;
}

/// `reqwest`-backed [`Fetcher`].
pub struct HttpFetcher {
    http: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn too_large(&self, len: usize) -> Error {
        Error::FetchTooLarge(format!("{len} bytes exceeds {}", self.config.max_bytes))
    }
}

fn transport_error(url: &::url::Url, err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::FetchTimeout(format!("{url}: {err}"))
    } else {
        Error::HttpError(format!("{url}: network error: {err}"))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &::url::Url) -> Result<FetchedPage, Error> {
        let start = Instant::now();

        let mut response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .send()
            .await
            .map_err(|e| transport_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::HttpError(format!("{url}: status {}", status.as_u16())));
        }

        let declared = response.content_length().and_then(|len| usize::try_from(len).ok());
        if let Some(len) = declared
            && len > self.config.max_bytes
        {
            return Err(self.too_large(len));
        }

        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let mut body = BytesMut::with_capacity(declared.unwrap_or(0).min(self.config.max_bytes));
        while let Some(chunk) = response.chunk().await.map_err(|e| transport_error(url, &e))? {
            if body.len() + chunk.len() > self.config.max_bytes {
                return Err(self.too_large(body.len() + chunk.len()));
            }
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();

        let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(str::to_string);
        let page_size = declared.filter(|len| *len > 0).unwrap_or(body.len());
        let fetch_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        tracing::debug!(
            url = %url,
            final_url = %final_url,
            fetch_ms,
            bytes = body.len(),
            "fetched page"
        );

        Ok(FetchedPage { final_url, status, content_type, body, headers, page_size, fetch_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(content_type: Option<&str>) -> FetchedPage {
        FetchedPage {
            final_url: ::url::Url::parse("https://example.com/").unwrap(),
            status: StatusCode::OK,
            content_type: content_type.map(str::to_string),
            body: Bytes::from_static(b"<html></html>"),
            headers: header::HeaderMap::new(),
            page_size: 13,
            fetch_ms: 5,
        }
    }

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.user_agent, "SEOAnalyzer/1.0");
        assert_eq!(config.max_bytes, 10 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_redirects, 5);
    }

    #[test]
    fn test_fetch_config_from_app() {
        let app = AppConfig { user_agent: "probe/2".into(), max_bytes: 1024, fetch_timeout_ms: 2_500, ..Default::default() };
        let config = FetchConfig::from_app(&app);
        assert_eq!(config.user_agent, "probe/2");
        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.timeout, Duration::from_millis(2_500));
    }

    #[test]
    fn test_html_constructor() {
        let page = FetchedPage::html(::url::Url::parse("https://example.com/").unwrap(), "<p>hi</p>".to_string());
        assert_eq!(page.status, StatusCode::OK);
        assert_eq!(page.page_size, 9);
        assert!(page.is_markup());
    }

    #[test]
    fn test_is_markup() {
        assert!(page(None).is_markup());
        assert!(page(Some("text/html; charset=utf-8")).is_markup());
        assert!(page(Some("application/xhtml+xml")).is_markup());
        assert!(!page(Some("image/png")).is_markup());
        assert!(!page(Some("application/pdf")).is_markup());
    }

    #[tokio::test]
    async fn test_http_fetcher_new() {
        let fetcher = HttpFetcher::new(FetchConfig::default());
        assert!(fetcher.is_ok());
    }
}
