//! Analysis report types, serialized in camelCase for API clients.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Complete SEO analysis of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoAnalysis {
    pub url: String,
    pub title: TitleAnalysis,
    pub meta: MetaAnalysis,
    pub headers: HeaderAnalysis,
    pub content: ContentAnalysis,
    pub performance: Performance,
    pub links: LinkAnalysis,
    /// Weighted overall score, 0 to 100.
    pub score: f64,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleAnalysis {
    pub title: String,
    /// Length in characters.
    pub length: usize,
    pub has_title: bool,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaAnalysis {
    pub description: String,
    pub description_length: usize,
    pub has_description: bool,
    pub keywords: String,
    pub has_keywords: bool,
    pub robots: String,
    pub viewport: String,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderAnalysis {
    pub h1_count: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub h1_text: Vec<String>,
    pub score: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    pub word_count: usize,
    /// Most frequent words mapped to their share of all words, in percent.
    pub keyword_density: BTreeMap<String, f64>,
    pub has_images: bool,
    pub images_with_alt: usize,
    pub total_images: usize,
    pub score: u32,
}

/// How far a measurement is from its target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Good,
    Minor,
    Moderate,
    Major,
    Critical,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Performance {
    /// Bytes.
    pub page_size: usize,
    /// Milliseconds.
    pub load_time: u64,
    pub mobile_optimized: bool,
    pub score: u32,
    pub page_size_severity: Severity,
    pub load_time_severity: Severity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkAnalysis {
    pub internal_links: usize,
    pub external_links: usize,
    pub broken_links: usize,
    /// Links that got a verdict before the link deadline.
    pub checked_links: usize,
    pub score: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_are_camel_case() {
        let perf = Performance { page_size: 10, load_time: 20, page_size_severity: Severity::Minor, ..Default::default() };
        let json = serde_json::to_value(&perf).unwrap();
        assert_eq!(json["pageSize"], 10);
        assert_eq!(json["loadTime"], 20);
        assert_eq!(json["pageSizeSeverity"], "minor");
        assert_eq!(json["loadTimeSeverity"], "good");

        let headers = HeaderAnalysis { h1_count: 1, h1_text: vec!["Hi".into()], ..Default::default() };
        let json = serde_json::to_value(&headers).unwrap();
        assert_eq!(json["h1Count"], 1);
        assert_eq!(json["h1Text"][0], "Hi");

        let meta = MetaAnalysis { description_length: 5, ..Default::default() };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["descriptionLength"], 5);
        assert_eq!(json["hasDescription"], false);
    }
}
