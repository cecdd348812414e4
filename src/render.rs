//! Render a parsed analysis into an HTML fragment.
//!
//! Rendering is a pure function of the parsed body: the same input yields
//! byte-identical output, so re-rendering is always safe. The fragment is
//! what the download endpoint wraps into a full document
//! ([`crate::report::wrap_analysis_document`]).
//!
//! Body formatting rule: a section body splits on blank lines into
//! paragraphs. Inside a paragraph, if any continuation line starts with a
//! bullet marker (`-` or `*`), the first line renders as an introductory
//! `<p>` and the marked lines become a `<ul>` (markers stripped, items
//! trimmed; unmarked continuation lines are dropped). Otherwise the whole
//! paragraph renders as one `<p>` block.

use crate::parse::{AnalysisBody, Section, SectionKey};

/// Human-readable title for a known section key.
pub fn section_title(key: SectionKey) -> &'static str {
    match key {
        SectionKey::ExecutiveSummary => "Executive Summary",
        SectionKey::KeyPerformanceIndicators => "Key Performance Indicators",
        SectionKey::MarketTrends => "Market Trends",
        SectionKey::AiDevelopments => "AI Developments",
        SectionKey::FutureOutlook => "Future Outlook",
        SectionKey::RisksAndChallenges => "Risks and Challenges",
        SectionKey::Conclusion => "Conclusion",
    }
}

/// Fallback title for tags outside the lookup table: underscores become
/// spaces and each word is capitalised.
pub fn titleize(tag: &str) -> String {
    tag.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render the full analysis as an HTML fragment.
///
/// Sections are emitted in fixed key order ([`SectionKey::ALL`]) no matter
/// how the input vector is ordered. A raw body renders its paragraphs under
/// a single "Analysis Results" heading.
pub fn render_analysis(body: &AnalysisBody) -> String {
    match body {
        AnalysisBody::Sections(sections) => {
            let mut html = String::from("<div class=\"analysis-results\">");
            for key in SectionKey::ALL {
                if let Some(section) = sections.iter().find(|s| s.key == key) {
                    html.push_str(&render_section(section));
                }
            }
            html.push_str("</div>");
            html
        }
        AnalysisBody::Raw(text) => format!(
            "<div class=\"analysis-results\">\
             <div class=\"analysis-section\"><h3>Analysis Results</h3>\
             <div class=\"section-content\">{}</div></div></div>",
            format_paragraphs(text)
        ),
    }
}

fn render_section(section: &Section) -> String {
    format!(
        "<div class=\"analysis-section\"><h3>{}</h3><div class=\"section-content\">{}</div></div>",
        section_title(section.key),
        format_section_body(&section.body)
    )
}

/// Format one section body: paragraphs plus bullet lists.
pub fn format_section_body(content: &str) -> String {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|paragraph| {
            let lines: Vec<&str> = paragraph.lines().collect();
            let has_bullets = lines
                .iter()
                .skip(1)
                .any(|line| is_bullet(line.trim_start()));
            if has_bullets {
                let intro = lines[0].trim();
                let items: String = lines[1..]
                    .iter()
                    .map(|line| line.trim())
                    .filter(|line| is_bullet(line))
                    .map(|line| format!("<li>{}</li>", escape_html(strip_bullet(line))))
                    .collect();
                format!("<p>{}</p><ul>{}</ul>", escape_html(intro), items)
            } else {
                format!("<p>{}</p>", escape_html(paragraph))
            }
        })
        .collect()
}

/// Format plain text (the raw fallback) as simple paragraphs.
pub fn format_paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p)))
        .collect()
}

fn is_bullet(line: &str) -> bool {
    line.starts_with('-') || line.starts_with('*')
}

fn strip_bullet(line: &str) -> &str {
    line.strip_prefix('-')
        .or_else(|| line.strip_prefix('*'))
        .unwrap_or(line)
        .trim()
}

/// Minimal HTML escaping for text interpolated into the fragment. The model
/// output is untrusted; without this a stray `<script>` in a section body
/// would survive into the downloaded document.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_response;

    #[test]
    fn known_titles_come_from_the_lookup_table() {
        assert_eq!(section_title(SectionKey::ExecutiveSummary), "Executive Summary");
        assert_eq!(section_title(SectionKey::AiDevelopments), "AI Developments");
        assert_eq!(
            section_title(SectionKey::RisksAndChallenges),
            "Risks and Challenges"
        );
    }

    #[test]
    fn titleize_fallback_capitalises_each_word() {
        assert_eq!(titleize("quarterly_cash_flow"), "Quarterly Cash Flow");
        assert_eq!(titleize("summary"), "Summary");
    }

    #[test]
    fn plain_paragraphs_render_as_p_blocks() {
        let html = format_section_body("First paragraph.\n\nSecond paragraph.");
        assert_eq!(html, "<p>First paragraph.</p><p>Second paragraph.</p>");
    }

    #[test]
    fn bullet_paragraph_renders_intro_plus_list() {
        let html = format_section_body("Highlights:\n- revenue up\n* margin stable");
        assert_eq!(
            html,
            "<p>Highlights:</p><ul><li>revenue up</li><li>margin stable</li></ul>"
        );
    }

    #[test]
    fn unmarked_continuation_lines_are_dropped_from_lists() {
        let html = format_section_body("Intro\n- one\nnot a bullet\n- two");
        assert_eq!(html, "<p>Intro</p><ul><li>one</li><li>two</li></ul>");
    }

    #[test]
    fn body_text_is_escaped() {
        let html = format_section_body("Revenue <b>up</b> & climbing");
        assert_eq!(html, "<p>Revenue &lt;b&gt;up&lt;/b&gt; &amp; climbing</p>");
    }

    #[test]
    fn shuffled_sections_render_in_fixed_order() {
        let body = AnalysisBody::Sections(vec![
            Section {
                key: SectionKey::Conclusion,
                body: "Last.".into(),
            },
            Section {
                key: SectionKey::ExecutiveSummary,
                body: "First.".into(),
            },
        ]);
        let html = render_analysis(&body);
        let exec = html.find("Executive Summary").expect("has summary");
        let conc = html.find("Conclusion").expect("has conclusion");
        assert!(exec < conc, "fixed order must win over input order");
    }

    #[test]
    fn raw_body_renders_under_generic_heading() {
        let html = render_analysis(&AnalysisBody::Raw("Plain answer.".into()));
        assert!(html.contains("<h3>Analysis Results</h3>"));
        assert!(html.contains("<p>Plain answer.</p>"));
    }

    #[test]
    fn rendering_is_idempotent_and_byte_identical() {
        let body = parse_response(
            "<executive_summary>Solid.\n\nPoints:\n- a\n- b</executive_summary>\
             <conclusion>Done.</conclusion>",
        );
        let first = render_analysis(&body);
        let second = render_analysis(&body);
        assert_eq!(first, second);
    }
}
