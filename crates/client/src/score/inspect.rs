//! On-page signals read from a parsed document.
//!
//! Everything here is synchronous. [`inspect_page`] parses the body, reads
//! every section, and drops the document before returning, so callers never
//! hold a parsed tree across an `.await`.

use std::collections::{BTreeMap, HashMap};

use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::report::{ContentAnalysis, HeaderAnalysis, MetaAnalysis, TitleAnalysis};
use crate::links::{LinkCandidate, collect_candidates};

const KEYWORD_MIN_LEN: usize = 4;
const KEYWORD_LIMIT: usize = 10;

/// Everything the scorer needs from a page's markup.
#[derive(Debug, Clone)]
pub struct PageInspection {
    pub title: TitleAnalysis,
    pub meta: MetaAnalysis,
    pub headers: HeaderAnalysis,
    pub content: ContentAnalysis,
    /// A viewport meta tag sets `width=device-width`.
    pub mobile_optimized: bool,
    pub links: Vec<LinkCandidate>,
}

/// Parse `body` and read every on-page section.
pub fn inspect_page(body: &str, page_url: &Url) -> PageInspection {
    let document = Html::parse_document(body);
    PageInspection {
        title: analyze_title(&document),
        meta: analyze_meta(&document),
        headers: analyze_headers(&document),
        content: analyze_content(&document),
        mobile_optimized: is_mobile_optimized(&document),
        links: collect_candidates(&document, page_url),
    }
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            tracing::warn!(css, error = %e, "invalid selector");
            Vec::new()
        }
    }
}

fn meta_content(document: &Html, name: &str) -> String {
    select(document, &format!("meta[name='{name}']"))
        .first()
        .and_then(|element| element.value().attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default()
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// 100 for 30 to 60 characters, 50 when shorter, 70 when longer, 0 when absent.
pub fn analyze_title(document: &Html) -> TitleAnalysis {
    let title = select(document, "title").first().map(element_text).unwrap_or_default();
    let length = title.chars().count();

    let score = match length {
        0 => 0,
        30..=60 => 100,
        1..30 => 50,
        _ => 70,
    };

    TitleAnalysis { title, length, has_title: length > 0, score }
}

pub fn analyze_meta(document: &Html) -> MetaAnalysis {
    let description = meta_content(document, "description");
    let keywords = meta_content(document, "keywords");
    let robots = meta_content(document, "robots");
    let viewport = meta_content(document, "viewport");

    let description_length = description.chars().count();
    let has_description = description_length > 0;
    let has_keywords = !keywords.is_empty();

    let mut score = 0;
    if has_description {
        score += if (120..=160).contains(&description_length) { 40 } else { 20 };
    }
    if has_keywords {
        score += 20;
    }
    if !viewport.is_empty() {
        score += 20;
    }
    if !robots.is_empty() {
        score += 20;
    }

    MetaAnalysis { description, description_length, has_description, keywords, has_keywords, robots, viewport, score }
}

pub fn analyze_headers(document: &Html) -> HeaderAnalysis {
    let h1 = select(document, "h1");
    let h2_count = select(document, "h2").len();
    let h3_count = select(document, "h3").len();

    let mut score = match h1.len() {
        0 => 0,
        1 => 40,
        _ => 20,
    };
    if h2_count > 0 {
        score += 30;
    }
    if h3_count > 0 {
        score += 30;
    }

    HeaderAnalysis {
        h1_count: h1.len(),
        h2_count,
        h3_count,
        h1_text: h1.iter().map(element_text).collect(),
        score,
    }
}

pub fn analyze_content(document: &Html) -> ContentAnalysis {
    let text = select(document, "body").first().map(element_text).unwrap_or_default();
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();

    let images = select(document, "img");
    let total_images = images.len();
    let images_with_alt = images.iter().filter(|img| img.value().attr("alt").is_some()).count();
    let has_images = total_images > 0;

    let mut score = 0;
    if word_count >= 300 {
        score += 30;
    }
    if has_images {
        score += 20;
        if images_with_alt == total_images {
            score += 30;
        } else if images_with_alt > 0 {
            score += 20;
        }
    }

    ContentAnalysis {
        word_count,
        keyword_density: keyword_density(&words),
        has_images,
        images_with_alt,
        total_images,
        score,
    }
}

/// Share of the most frequent words, in percent rounded to two decimals.
///
/// Words shorter than four characters are ignored. Ties break alphabetically.
fn keyword_density(words: &[&str]) -> BTreeMap<String, f64> {
    if words.is_empty() {
        return BTreeMap::new();
    }

    let mut counts: HashMap<String, usize> = HashMap::new();
    for word in words {
        let word: String = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if word.chars().count() >= KEYWORD_MIN_LEN {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(KEYWORD_LIMIT);

    let total = words.len() as f64;
    ranked
        .into_iter()
        .map(|(word, count)| (word, (count as f64 / total * 10_000.0).round() / 100.0))
        .collect()
}

pub fn is_mobile_optimized(document: &Html) -> bool {
    select(document, "meta[name='viewport']").iter().any(|element| {
        element.value().attr("content").is_some_and(|content| content.to_lowercase().contains("width=device-width"))
    })
}
