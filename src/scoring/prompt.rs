//! Lead quality prompt and reply parsing

use crate::core::error::InferenceError;
use crate::search::params::ScoringCriteria;
use crate::search::results::Lead;

const INSTRUCTIONS: &str = "You are a B2B sales lead qualification assistant. \
Rate the quality of the following lead as a sales prospect on a scale from 0 to 100, \
where 100 is an ideal prospect. Respond with a single integer and nothing else.";

/// Build the inference prompt for one lead
pub fn build_prompt(lead: &Lead, criteria: &ScoringCriteria) -> String {
    let field = |value: &Option<String>| {
        value
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or("unknown")
            .to_string()
    };

    let engagement = lead
        .last_engagement_score
        .filter(|v| v.is_finite())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "none".to_string());

    let criteria = serde_json::to_string(criteria).unwrap_or_else(|_| "{}".to_string());

    format!(
        "{}\n\nName: {}\nEmail: {}\nIndustry: {}\nCompany size: {}\nLast engagement score: {}\nScoring criteria: {}\n\nScore:",
        INSTRUCTIONS,
        field(&lead.name),
        field(&lead.email),
        field(&lead.industry),
        field(&lead.company_size),
        engagement,
        criteria
    )
}

/// Parse a model reply into a 0..=100 score.
///
/// Accepts a bare integer, optionally quoted or fenced, with a trailing
/// period or a `/100` suffix. Anything else is malformed.
pub fn parse_score(reply: &str) -> Result<u8, InferenceError> {
    let trimmed = reply
        .trim()
        .trim_matches(|c: char| c == '`' || c == '"' || c == '\'' || c.is_whitespace())
        .trim_end_matches('.');
    let number = trimmed.strip_suffix("/100").unwrap_or(trimmed).trim();

    let value: i64 = number
        .parse()
        .map_err(|_| InferenceError::Malformed(truncate(reply, 64)))?;

    if !(0..=100).contains(&value) {
        return Err(InferenceError::OutOfRange(value));
    }
    Ok(value as u8)
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
