//! URL canonicalization so equivalent spellings share one cache key.

use seoscope_core::Error;
use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("invalid URL: {0}")]
    Invalid(String),
}

impl From<UrlError> for Error {
    fn from(err: UrlError) -> Self {
        match err {
            UrlError::Empty => Error::InvalidInput("url must not be empty".into()),
            other => Error::InvalidUrl(other.to_string()),
        }
    }
}

/// Canonical form of a user-supplied page URL.
///
/// 1. Trim surrounding whitespace
/// 2. Default the scheme to `https` when none is given
/// 3. Accept only `http` and `https`
/// 4. Lowercase the host and drop the fragment
/// 5. Leave the query string untouched
pub fn canonicalize(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.contains("://") { trimmed.to_string() } else { format!("https://{trimmed}") };
    let mut parsed = Url::parse(&with_scheme).map_err(|e| UrlError::Invalid(format!("{trimmed}: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(UrlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    let host = parsed.host_str().map(str::to_lowercase).ok_or_else(|| UrlError::MissingHost(trimmed.into()))?;
    parsed.set_host(Some(&host)).map_err(|e| UrlError::Invalid(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// `scheme://host[:port]` of a page, used for internal-link matching.
pub fn page_origin(url: &Url) -> String {
    url.origin().ascii_serialization()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_defaults_to_https() {
        let url = canonicalize("example.com/pricing").unwrap();
        assert_eq!(url.as_str(), "https://example.com/pricing");
    }

    #[test]
    fn test_canonicalize_equivalent_spellings_match() {
        let a = canonicalize("  EXAMPLE.com ").unwrap();
        let b = canonicalize("https://example.com/").unwrap();
        let c = canonicalize("https://Example.COM/#top").unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
    }

    #[test]
    fn test_canonicalize_keeps_query_order() {
        let url = canonicalize("https://example.com/search?b=2&a=1#results").unwrap();
        assert_eq!(url.query(), Some("b=2&a=1"));
        assert_eq!(url.fragment(), None);
    }

    #[test]
    fn test_canonicalize_keeps_plain_http() {
        let url = canonicalize("http://example.com").unwrap();
        assert_eq!(url.scheme(), "http");
    }

    #[test]
    fn test_canonicalize_rejects_other_schemes() {
        assert!(matches!(canonicalize("ftp://example.com/file"), Err(UrlError::UnsupportedScheme(s)) if s == "ftp"));
        assert!(matches!(canonicalize("file:///etc/hosts"), Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty_is_invalid_input() {
        assert!(matches!(canonicalize("   "), Err(UrlError::Empty)));
        let err: Error = canonicalize("").unwrap_err().into();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_canonicalize_garbage_is_invalid_url() {
        let err: Error = canonicalize("https://exa mple.com").unwrap_err().into();
        assert!(matches!(err, Error::InvalidUrl(_)));
    }

    #[test]
    fn test_page_origin() {
        let url = Url::parse("https://example.com:8443/a/b?c").unwrap();
        assert_eq!(page_origin(&url), "https://example.com:8443");

        let url = Url::parse("http://example.com/").unwrap();
        assert_eq!(page_origin(&url), "http://example.com");
    }
}
