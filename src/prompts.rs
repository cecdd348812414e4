//! Prompt template constants.
//!
//! Centralising the placeholder token and the default template here serves
//! two purposes:
//!
//! 1. **Single source of truth** — the validator, the substitution step, and
//!    the CLI default all reference the same constant, so the placeholder
//!    can never drift between them.
//!
//! 2. **Testability** — unit tests can assert the template carries every
//!    section tag the parser recognises without calling any model.

/// The literal token in a prompt template that is replaced by the report
/// text before the prompt is sent to the model.
pub const REPORT_PLACEHOLDER: &str = "{{COMPANY_REPORT}}";

/// Default analysis prompt. Instructs the model to answer inside the seven
/// section tags that [`crate::parse::parse_response`] recognises; responses
/// that ignore the tags still render through the raw-text fallback.
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a financial analyst. Analyze the following company report and produce a structured assessment.

Company report:
{{COMPANY_REPORT}}

Answer using exactly these XML-style tags, in this order, and nothing outside them:

<executive_summary>A concise overview of the report's most important points.</executive_summary>
<key_performance_indicators>Revenue, margins, growth rates, and other notable figures.</key_performance_indicators>
<market_trends>Market and industry trends the report reflects or reacts to.</market_trends>
<ai_developments>Any AI-related initiatives, investments, or products mentioned.</ai_developments>
<future_outlook>Guidance, forecasts, and stated plans.</future_outlook>
<risks_and_challenges>Risks, headwinds, and open problems.</risks_and_challenges>
<conclusion>Your overall assessment in two or three sentences.</conclusion>

Use plain prose inside each tag. Bullet lists (lines starting with "-") are allowed after an introductory sentence."#;

/// Substitute the report text into a prompt template.
///
/// Callers validate placeholder presence separately
/// ([`crate::analyze::AnalysisRequest::validate`]); a template without the
/// token passes through unchanged here.
pub fn fill_template(template: &str, report_text: &str) -> String {
    template.replacen(REPORT_PLACEHOLDER, report_text, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::SectionKey;

    #[test]
    fn default_template_contains_placeholder() {
        assert!(DEFAULT_PROMPT_TEMPLATE.contains(REPORT_PLACEHOLDER));
    }

    #[test]
    fn default_template_names_every_section_tag() {
        for key in SectionKey::ALL {
            let open = format!("<{}>", key.tag());
            let close = format!("</{}>", key.tag());
            assert!(
                DEFAULT_PROMPT_TEMPLATE.contains(&open)
                    && DEFAULT_PROMPT_TEMPLATE.contains(&close),
                "template missing tag pair for {}",
                key.tag()
            );
        }
    }

    #[test]
    fn fill_template_replaces_first_occurrence() {
        let filled = fill_template("Analyze: {{COMPANY_REPORT}}", "Acme had a good year.");
        assert_eq!(filled, "Analyze: Acme had a good year.");
    }
}
