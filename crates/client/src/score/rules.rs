//! Performance and link scoring, the weighted total, and recommendations.

use super::report::{LinkAnalysis, Performance, SeoAnalysis, Severity};
use crate::links::LinkTally;

const WEIGHT_TITLE: f64 = 0.2;
const WEIGHT_META: f64 = 0.2;
const WEIGHT_HEADERS: f64 = 0.15;
const WEIGHT_CONTENT: f64 = 0.2;
const WEIGHT_PERFORMANCE: f64 = 0.15;
const WEIGHT_LINKS: f64 = 0.1;

fn page_size_severity(page_size: usize) -> Severity {
    let kib = page_size as f64 / 1024.0;
    if kib > 5120.0 {
        Severity::Critical
    } else if kib > 2048.0 {
        Severity::Major
    } else if kib > 1024.0 {
        Severity::Moderate
    } else if kib > 500.0 {
        Severity::Minor
    } else {
        Severity::Good
    }
}

fn load_time_severity(load_time_ms: u64) -> Severity {
    match load_time_ms {
        3001.. => Severity::Critical,
        2001..=3000 => Severity::Major,
        1501..=2000 => Severity::Moderate,
        1001..=1500 => Severity::Minor,
        _ => Severity::Good,
    }
}

fn severity_penalty(severity: Severity) -> u32 {
    match severity {
        Severity::Good => 0,
        Severity::Minor => 10,
        Severity::Moderate => 20,
        Severity::Major => 30,
        Severity::Critical => 40,
    }
}

/// Start at 100 and subtract up to 40 for size, 40 for load time, and 20
/// for a missing mobile viewport.
pub fn analyze_performance(page_size: usize, load_time_ms: u64, mobile_optimized: bool) -> Performance {
    let page_size_severity = page_size_severity(page_size);
    let load_time_severity = load_time_severity(load_time_ms);

    let mut penalty = severity_penalty(page_size_severity) + severity_penalty(load_time_severity);
    if !mobile_optimized {
        penalty += 20;
    }

    Performance {
        page_size,
        load_time: load_time_ms,
        mobile_optimized,
        score: 100u32.saturating_sub(penalty),
        page_size_severity,
        load_time_severity,
    }
}

pub fn analyze_links(tally: &LinkTally) -> LinkAnalysis {
    let internal_penalty = match tally.internal {
        0 => 40,
        1..3 => 30,
        3..5 => 20,
        _ => 0,
    };
    let external_penalty = match tally.external {
        0 => 30,
        51.. => 15,
        _ => 0,
    };
    let broken_penalty = match tally.broken {
        0 => 0,
        1..=3 => 10,
        4..=5 => 20,
        _ => 30,
    };

    LinkAnalysis {
        internal_links: tally.internal,
        external_links: tally.external,
        broken_links: tally.broken,
        checked_links: tally.checked,
        score: 100u32.saturating_sub(internal_penalty + external_penalty + broken_penalty),
    }
}

pub fn overall_score(analysis: &SeoAnalysis) -> f64 {
    f64::from(analysis.title.score) * WEIGHT_TITLE
        + f64::from(analysis.meta.score) * WEIGHT_META
        + f64::from(analysis.headers.score) * WEIGHT_HEADERS
        + f64::from(analysis.content.score) * WEIGHT_CONTENT
        + f64::from(analysis.performance.score) * WEIGHT_PERFORMANCE
        + f64::from(analysis.links.score) * WEIGHT_LINKS
}

pub fn recommendations(analysis: &SeoAnalysis) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut push = |text: &str| out.push(text.to_string());

    let title = &analysis.title;
    if !title.has_title {
        push("Add a title tag to your page");
    } else if title.length < 30 {
        push("Title tag is too short (should be 30-60 characters)");
    } else if title.length > 60 {
        push("Title tag is too long (should be 30-60 characters)");
    }

    let meta = &analysis.meta;
    if !meta.has_description {
        push("Add a meta description");
    } else if meta.description_length < 120 {
        push("Meta description is too short (should be 120-160 characters)");
    } else if meta.description_length > 160 {
        push("Meta description is too long (should be 120-160 characters)");
    }

    match analysis.headers.h1_count {
        0 => push("Add an H1 heading"),
        1 => {}
        _ => push("Multiple H1 headings found - consider using only one"),
    }

    let content = &analysis.content;
    if content.word_count < 300 {
        push("Add more content (aim for at least 300 words)");
    }
    if content.total_images > 0 && content.images_with_alt < content.total_images {
        push("Add alt text to all images");
    }

    let performance = &analysis.performance;
    match performance.page_size_severity {
        Severity::Critical => push(
            "Critical: Page size is extremely large (>5MB). Consider optimizing images, minifying CSS/JS, and removing unnecessary resources",
        ),
        Severity::Major => {
            push("Major: Page size is very large (>2MB). Optimize images and consider lazy loading for non-critical resources")
        }
        Severity::Moderate => {
            push("Moderate: Page size is large (>1MB). Look for opportunities to optimize images and resources")
        }
        Severity::Minor => push("Minor: Page size is above optimal (>500KB). Consider basic optimization techniques"),
        Severity::Good => {}
    }
    match performance.load_time_severity {
        Severity::Critical => push(
            "Critical: Page load time is extremely slow (>3s). Consider using a CDN, optimizing server response time, and reducing resource size",
        ),
        Severity::Major => {
            push("Major: Page load time is slow (>2s). Optimize server response time and consider resource optimization")
        }
        Severity::Moderate => {
            push("Moderate: Page load time is above optimal (>1.5s). Look for opportunities to improve performance")
        }
        Severity::Minor => push("Minor: Page load time is slightly above optimal (>1s). Consider fine-tuning performance"),
        Severity::Good => {}
    }
    if !performance.mobile_optimized {
        push(
            "Add a proper viewport meta tag for mobile optimization (e.g., <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">)",
        );
    }

    let links = &analysis.links;
    if links.broken_links > 0 {
        out.push(format!("Fix broken links: Found {} broken link(s)", links.broken_links));
    }
    if links.internal_links < 3 {
        out.push("Add more internal links to improve site navigation and SEO (aim for at least 3-5)".into());
    }
    if links.external_links == 0 {
        out.push("Add relevant external links to authoritative sources to improve content credibility".into());
    } else if links.external_links > 50 {
        out.push(format!(
            "Consider reducing the number of external links (current: {}) to maintain focus",
            links.external_links
        ));
    }

    out
}
