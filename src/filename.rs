//! Best-effort company-name derivation and report filenames.
//!
//! The heuristics are an ordered list of patterns probed first against the
//! rendered analysis (tags stripped), then against the original report text.
//! The first match whose cleaned-up capture lands in the 3–49 character
//! range wins; anything else falls back to the literal `"Company"`. This is
//! a convenience for the download filename, not a guarantee — unusual report
//! text is allowed to miss.

use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Fallback name when no heuristic matches.
pub const FALLBACK_COMPANY: &str = "Company";

// Patterns probed against the analysis text. Lazy captures keep the match
// anchored to the shortest run of name-like characters before the verb.
static ANALYSIS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)company\s+([a-z0-9\s&.-]+?)(?:\s+reported|\s+announced|\s+showed|\s+demonstrated)",
        r"(?i)([a-z0-9\s&.-]+?)\s+reported\s+strong",
        r"(?i)([a-z0-9\s&.-]+?)\s+announced",
        r"(?i)([a-z0-9\s&.-]+?)\s+showed\s+positive",
        r"(?i)([a-z0-9\s&.-]+?)\s+demonstrated",
        r"(?i)([a-z0-9\s&.-]+?)\s+achieved",
        r"(?i)([a-z0-9\s&.-]+?)\s+experienced",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("company pattern is valid"))
    .collect()
});

// Patterns probed against the raw report text when the analysis yields
// nothing usable.
static REPORT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)([a-z0-9\s&.-]+?)\s+(?:quarterly|annual|financial)\s+report",
        r"(?i)([a-z0-9\s&.-]+?)\s+(?:inc|corp|corporation|company|ltd|limited)\b",
        r"(?i)([a-z0-9\s&.-]+?)\s+reported\s+results",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("report pattern is valid"))
    .collect()
});

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("tag pattern is valid"));

/// Derive a company name from the rendered analysis HTML and/or the original
/// report text. Returns [`FALLBACK_COMPANY`] when nothing plausible matches.
pub fn derive_company_name(analysis_html: &str, report_text: &str) -> String {
    let analysis_text = TAG_RE.replace_all(analysis_html, " ");

    if let Some(name) = first_match(&ANALYSIS_PATTERNS, &analysis_text) {
        return name;
    }
    // Same ordered heuristics against the raw report, then the weaker
    // suffix-based patterns that only make sense for report prose.
    if let Some(name) = first_match(&ANALYSIS_PATTERNS, report_text) {
        return name;
    }
    if let Some(name) = first_match(&REPORT_PATTERNS, report_text) {
        return name;
    }
    FALLBACK_COMPANY.to_string()
}

/// Probe the ordered pattern list; keep the first bounded-length capture.
fn first_match(patterns: &[Regex], text: &str) -> Option<String> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text) {
            let cleaned = clean_name(&caps[1]);
            // 3–49 characters: long enough to be a name, short enough to be
            // a filename component.
            if (3..50).contains(&cleaned.len()) {
                return Some(cleaned);
            }
        }
    }
    None
}

/// Collapse whitespace and strip punctuation from a candidate name.
fn clean_name(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Normalise a company name into a filename slug: lowercase, punctuation
/// stripped, whitespace collapsed to single hyphens.
pub fn company_slug(name: &str) -> String {
    clean_name(name)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Build the analysis download filename for a given date:
/// `<company-slug>-Report-<YYYY-MM-DD>.html`.
pub fn report_filename(company_name: &str, date: NaiveDate) -> String {
    format!(
        "{}-Report-{}.html",
        company_slug(company_name),
        date.format("%Y-%m-%d")
    )
}

/// [`report_filename`] for today's local date.
pub fn report_filename_today(company_name: &str) -> String {
    report_filename(company_name, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derives_from_reported_strong_pattern() {
        let name = derive_company_name("", "Acme Corp reported strong Q3 results");
        assert!(
            company_slug(&name).starts_with("acme-corp"),
            "got slug {:?}",
            company_slug(&name)
        );
    }

    #[test]
    fn analysis_text_is_probed_before_report_text() {
        let html = "<p>Globex announced a new product line.</p>";
        let name = derive_company_name(html, "Initech quarterly report");
        assert!(name.to_lowercase().contains("globex"), "got {name:?}");
    }

    #[test]
    fn unrecognisable_text_falls_back_to_company() {
        assert_eq!(derive_company_name("", "nothing matches here"), "Company");
        assert_eq!(derive_company_name("", ""), "Company");
    }

    #[test]
    fn over_long_captures_are_rejected() {
        let long = format!("{} announced results", "x".repeat(80));
        assert_eq!(derive_company_name("", &long), "Company");
    }

    #[test]
    fn slug_is_lowercase_and_hyphenated() {
        assert_eq!(company_slug("Acme Corp"), "acme-corp");
        assert_eq!(company_slug("  Wayne   Enterprises  "), "wayne-enterprises");
    }

    #[test]
    fn filename_combines_slug_and_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 5).unwrap();
        assert_eq!(
            report_filename("Acme Corp", date),
            "acme-corp-Report-2026-08-05.html"
        );
        assert_eq!(report_filename("Company", date), "company-Report-2026-08-05.html");
    }
}
