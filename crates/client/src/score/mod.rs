//! SEO scoring of a fetched page.
//!
//! Pure and deterministic: section analyzers read a parsed document, and the
//! rules turn measurements into scores and recommendations. No I/O happens
//! here.

mod inspect;
mod report;
mod rules;

pub use inspect::{
    PageInspection, analyze_content, analyze_headers, analyze_meta, analyze_title, inspect_page, is_mobile_optimized,
};
pub use report::{
    ContentAnalysis, HeaderAnalysis, LinkAnalysis, MetaAnalysis, Performance, SeoAnalysis, Severity, TitleAnalysis,
};
pub use rules::{analyze_links, analyze_performance, overall_score, recommendations};

use crate::links::LinkTally;

/// Assemble the final report from the page inspection and measurements.
pub fn build_report(
    url: &str, inspection: PageInspection, page_size: usize, load_time_ms: u64, tally: &LinkTally,
) -> SeoAnalysis {
    let mut analysis = SeoAnalysis {
        url: url.to_string(),
        title: inspection.title,
        meta: inspection.meta,
        headers: inspection.headers,
        content: inspection.content,
        performance: analyze_performance(page_size, load_time_ms, inspection.mobile_optimized),
        links: analyze_links(tally),
        score: 0.0,
        recommendations: Vec::new(),
    };
    analysis.score = overall_score(&analysis);
    analysis.recommendations = recommendations(&analysis);
    analysis
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_build_report_end_to_end() {
        let html = format!(
            r#"<html>
                <head>
                    <title>A reasonably descriptive page title here</title>
                    <meta name="description" content="{}">
                    <meta name="viewport" content="width=device-width, initial-scale=1">
                </head>
                <body><h1>Heading</h1><h2>Sub</h2><p>{}</p></body>
            </html>"#,
            "d".repeat(130),
            "content ".repeat(320)
        );
        let page = Url::parse("https://example.com/").unwrap();
        let inspection = inspect_page(&html, &page);
        let tally = LinkTally { internal: 5, external: 2, checked: 7, broken: 0 };

        let report = build_report(page.as_str(), inspection, html.len(), 250, &tally);

        assert_eq!(report.url, "https://example.com/");
        assert_eq!(report.title.score, 100);
        assert_eq!(report.meta.score, 60);
        assert_eq!(report.headers.score, 70);
        assert_eq!(report.content.score, 30);
        assert_eq!(report.performance.score, 100);
        assert_eq!(report.links.score, 100);
        let expected = 100.0 * 0.2 + 60.0 * 0.2 + 70.0 * 0.15 + 30.0 * 0.2 + 100.0 * 0.15 + 100.0 * 0.1;
        assert!((report.score - expected).abs() < 1e-9);
        assert!(report.recommendations.is_empty());
    }
}
