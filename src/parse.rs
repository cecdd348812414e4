//! Parse the model's free-form response into named sections.
//!
//! The model is asked (see [`crate::prompts`]) to wrap each part of its
//! answer in one of seven known tags, `<executive_summary>…</executive_summary>`
//! and friends. This module extracts those sections; the dot-matches-newline
//! flag on each pattern lets section bodies span paragraphs. Parsing is a
//! pure function: the same text always yields the same result, in the same
//! fixed key order regardless of the order the tags appear in.
//!
//! A response containing none of the tags is not an error — models
//! occasionally ignore format instructions — it degrades to
//! [`AnalysisBody::Raw`] and the renderer falls back to plain paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// The seven recognised section keys, in their fixed display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKey {
    ExecutiveSummary,
    KeyPerformanceIndicators,
    MarketTrends,
    AiDevelopments,
    FutureOutlook,
    RisksAndChallenges,
    Conclusion,
}

impl SectionKey {
    /// All keys in fixed display order. Parsing and rendering both iterate
    /// this array, which is what guarantees output order is independent of
    /// input order.
    pub const ALL: [SectionKey; 7] = [
        SectionKey::ExecutiveSummary,
        SectionKey::KeyPerformanceIndicators,
        SectionKey::MarketTrends,
        SectionKey::AiDevelopments,
        SectionKey::FutureOutlook,
        SectionKey::RisksAndChallenges,
        SectionKey::Conclusion,
    ];

    /// The wire-format tag name, as it appears in the model output.
    pub fn tag(self) -> &'static str {
        match self {
            SectionKey::ExecutiveSummary => "executive_summary",
            SectionKey::KeyPerformanceIndicators => "key_performance_indicators",
            SectionKey::MarketTrends => "market_trends",
            SectionKey::AiDevelopments => "ai_developments",
            SectionKey::FutureOutlook => "future_outlook",
            SectionKey::RisksAndChallenges => "risks_and_challenges",
            SectionKey::Conclusion => "conclusion",
        }
    }

    /// Reverse lookup from a tag name.
    pub fn from_tag(tag: &str) -> Option<SectionKey> {
        SectionKey::ALL.into_iter().find(|k| k.tag() == tag)
    }
}

/// One extracted section: key plus trimmed body text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub key: SectionKey,
    pub body: String,
}

/// The parsed shape of a model response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisBody {
    /// At least one recognised tag was found. Sections are in fixed key
    /// order; absent keys are omitted.
    Sections(Vec<Section>),
    /// No recognised tags; the response is kept verbatim.
    Raw(String),
}

impl AnalysisBody {
    /// Number of recognised sections (zero for raw responses).
    pub fn section_count(&self) -> usize {
        match self {
            AnalysisBody::Sections(s) => s.len(),
            AnalysisBody::Raw(_) => 0,
        }
    }

    /// Body text of a specific section, if present.
    pub fn section(&self, key: SectionKey) -> Option<&str> {
        match self {
            AnalysisBody::Sections(s) => s
                .iter()
                .find(|sec| sec.key == key)
                .map(|sec| sec.body.as_str()),
            AnalysisBody::Raw(_) => None,
        }
    }
}

// One lazily-compiled pattern per key. `(?s)` lets `.` cross newlines so a
// section body may contain blank lines; the lazy `.*?` stops at the first
// matching close tag.
static SECTION_PATTERNS: Lazy<Vec<(SectionKey, Regex)>> = Lazy::new(|| {
    SectionKey::ALL
        .into_iter()
        .map(|key| {
            let tag = key.tag();
            let re = Regex::new(&format!(r"(?s)<{tag}>(.*?)</{tag}>"))
                .expect("section tag pattern is valid");
            (key, re)
        })
        .collect()
});

/// Extract the recognised sections from a raw model response.
///
/// Keys are probed in fixed order; a key whose tag pair is absent is simply
/// omitted. If no key matches at all the whole response is returned as
/// [`AnalysisBody::Raw`] so the caller can fall back to plain rendering.
pub fn parse_response(response: &str) -> AnalysisBody {
    let sections: Vec<Section> = SECTION_PATTERNS
        .iter()
        .filter_map(|(key, re)| {
            re.captures(response).map(|caps| Section {
                key: *key,
                body: caps[1].trim().to_string(),
            })
        })
        .collect();

    if sections.is_empty() {
        AnalysisBody::Raw(response.to_string())
    } else {
        AnalysisBody::Sections(sections)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_a_single_section() {
        let body = parse_response("<executive_summary>Strong quarter.</executive_summary>");
        assert_eq!(body.section_count(), 1);
        assert_eq!(
            body.section(SectionKey::ExecutiveSummary),
            Some("Strong quarter.")
        );
    }

    #[test]
    fn extracts_all_seven_sections() {
        let mut response = String::new();
        for key in SectionKey::ALL {
            response.push_str(&format!("<{0}>body of {0}</{0}>\n", key.tag()));
        }
        let body = parse_response(&response);
        assert_eq!(body.section_count(), 7);
        for key in SectionKey::ALL {
            assert_eq!(
                body.section(key),
                Some(format!("body of {}", key.tag()).as_str())
            );
        }
    }

    #[test]
    fn output_order_is_fixed_regardless_of_input_order() {
        let response = "<conclusion>last</conclusion>\
                        <market_trends>middle</market_trends>\
                        <executive_summary>first</executive_summary>";
        match parse_response(response) {
            AnalysisBody::Sections(sections) => {
                let keys: Vec<SectionKey> = sections.iter().map(|s| s.key).collect();
                assert_eq!(
                    keys,
                    vec![
                        SectionKey::ExecutiveSummary,
                        SectionKey::MarketTrends,
                        SectionKey::Conclusion
                    ]
                );
            }
            AnalysisBody::Raw(_) => panic!("expected sections"),
        }
    }

    #[test]
    fn bodies_may_span_multiple_lines() {
        let response = "<future_outlook>\nGrowth expected.\n\nMargins stable.\n</future_outlook>";
        let body = parse_response(response);
        assert_eq!(
            body.section(SectionKey::FutureOutlook),
            Some("Growth expected.\n\nMargins stable.")
        );
    }

    #[test]
    fn bodies_are_trimmed() {
        let body = parse_response("<conclusion>   padded   </conclusion>");
        assert_eq!(body.section(SectionKey::Conclusion), Some("padded"));
    }

    #[test]
    fn unmatched_tags_are_omitted_not_errors() {
        let response = "<executive_summary>ok</executive_summary><unknown_tag>x</unknown_tag>";
        let body = parse_response(response);
        assert_eq!(body.section_count(), 1);
    }

    #[test]
    fn zero_matches_degrades_to_raw() {
        let response = "The model ignored the tag instructions entirely.";
        match parse_response(response) {
            AnalysisBody::Raw(text) => assert_eq!(text, response),
            AnalysisBody::Sections(_) => panic!("expected raw fallback"),
        }
    }

    #[test]
    fn parsing_is_deterministic() {
        let response = "<executive_summary>A</executive_summary><conclusion>B</conclusion>";
        assert_eq!(parse_response(response), parse_response(response));
    }

    #[test]
    fn tag_round_trip() {
        for key in SectionKey::ALL {
            assert_eq!(SectionKey::from_tag(key.tag()), Some(key));
        }
        assert_eq!(SectionKey::from_tag("not_a_tag"), None);
    }
}
