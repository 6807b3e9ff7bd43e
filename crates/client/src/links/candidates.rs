//! Outbound link harvesting from a parsed page.

use std::collections::HashSet;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::fetch::page_origin;

static ANCHOR: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse("a[href]").ok());

/// Where a link points relative to the page that carries it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Internal,
    External,
}

/// A unique, absolute `http(s)` link found on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCandidate {
    pub url: String,
    pub kind: LinkKind,
}

/// Collect every unique link worth probing from `<a href>` elements.
///
/// Empty and bare `#` hrefs are skipped. Everything else is resolved against
/// `page_url`, stripped of its fragment, and kept only if it is `http` or
/// `https`. Duplicates are dropped by exact string match after resolution.
/// A link is internal when it starts with the page origin.
pub fn collect_candidates(document: &Html, page_url: &Url) -> Vec<LinkCandidate> {
    let Some(selector) = ANCHOR.as_ref() else {
        return Vec::new();
    };

    let origin_prefix = format!("{}/", page_origin(page_url));
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for element in document.select(selector) {
        let Some(href) = element.value().attr("href") else { continue };
        let href = href.trim();
        if href.is_empty() || href == "#" {
            continue;
        }

        let Ok(mut resolved) = page_url.join(href) else {
            tracing::trace!(href, "skipping unresolvable link");
            continue;
        };
        if !matches!(resolved.scheme(), "http" | "https") {
            continue;
        }
        resolved.set_fragment(None);

        let url = resolved.to_string();
        if !seen.insert(url.clone()) {
            continue;
        }

        let kind = if url.starts_with(&origin_prefix) { LinkKind::Internal } else { LinkKind::External };
        candidates.push(LinkCandidate { url, kind });
    }

    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(html: &str, page: &str) -> Vec<LinkCandidate> {
        let document = Html::parse_document(html);
        collect_candidates(&document, &Url::parse(page).unwrap())
    }

    #[test]
    fn test_resolves_relative_forms() {
        let links = collect(
            r#"<body>
                <a href="/about">About</a>
                <a href="contact">Contact</a>
                <a href="//cdn.example.org/lib.js">CDN</a>
                <a href="https://other.example/page">Other</a>
            </body>"#,
            "https://example.com/blog/",
        );

        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.com/about",
                "https://example.com/blog/contact",
                "https://cdn.example.org/lib.js",
                "https://other.example/page",
            ]
        );
        assert_eq!(links[0].kind, LinkKind::Internal);
        assert_eq!(links[1].kind, LinkKind::Internal);
        assert_eq!(links[2].kind, LinkKind::External);
        assert_eq!(links[3].kind, LinkKind::External);
    }

    #[test]
    fn test_skips_empty_hash_and_duplicates() {
        let links = collect(
            r##"<body>
                <a href="">Empty</a>
                <a href="#">Top</a>
                <a href="  ">Blank</a>
                <a href="/pricing">Pricing</a>
                <a href="https://example.com/pricing">Pricing again</a>
                <a href="/pricing#plans">Plans</a>
            </body>"##,
            "https://example.com/",
        );

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "https://example.com/pricing");
    }

    #[test]
    fn test_drops_non_http_schemes() {
        let links = collect(
            r#"<body>
                <a href="mailto:team@example.com">Mail</a>
                <a href="javascript:void(0)">JS</a>
                <a href="tel:+15550100">Call</a>
                <a href="http://example.com/plain">Plain</a>
            </body>"#,
            "https://example.com/",
        );

        assert_eq!(links.len(), 1);
        assert_eq!(links[0].url, "http://example.com/plain");
        assert_eq!(links[0].kind, LinkKind::External);
    }

    #[test]
    fn test_lookalike_host_is_external() {
        let links = collect(r#"<a href="https://example.com.evil.test/">x</a>"#, "https://example.com/");
        assert_eq!(links[0].kind, LinkKind::External);
    }

    #[test]
    fn test_no_links() {
        assert!(collect("<p>No links here</p>", "https://example.com/").is_empty());
    }
}
