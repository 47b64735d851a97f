/// Score used when the model reply contains no usable rating.
pub const UNSCORED: i32 = -1;

const MIN_SCORE: i32 = 1;
const MAX_SCORE: i32 = 7;

/// Return the first whitespace-delimited token of `reply` that is an integer
/// in `1..=7`, or [`UNSCORED`].
///
/// Punctuation hugging a token ("5.", "(6)", "**4**") is ignored; a leading
/// minus sign is kept so "-3" is never read as 3.
pub fn parse_relevance_score(reply: &str) -> i32 {
    reply
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric() && c != '-'))
        .filter_map(|token| token.parse::<i32>().ok())
        .find(|score| (MIN_SCORE..=MAX_SCORE).contains(score))
        .unwrap_or(UNSCORED)
}

/// Parse a tag list from a model reply, keeping at most `max_tags`.
///
/// A JSON array of strings is used as is. Anything else is recovered by
/// dropping brackets and splitting on commas and newlines.
pub fn parse_tags(reply: &str, max_tags: usize) -> Vec<String> {
    let text = strip_code_fence(reply.trim());

    let tags = match serde_json::from_str::<Vec<String>>(text) {
        Ok(tags) => tags,
        Err(_) => text
            .replace(['[', ']'], "")
            .split([',', '\n'])
            .map(|tag| tag.trim().trim_matches(|c| c == '"' || c == '\'').trim().to_string())
            .collect(),
    };

    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .take(max_tags)
        .collect()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}
