//! Bounded truncation of rendered field values.
//!
//! The truncation notice always comes first. Content is appended, quoted,
//! only when there is room for a meaningful fragment of it.

/// Leading text of every truncated value.
pub const TRUNCATION_PREFIX: &str =
    "Truncated. You can change this behaviour in [core]max_templated_field_length. ";

/// Trailing text of every truncated value.
pub const TRUNCATION_SUFFIX: &str = "...";

/// Smallest content fragment worth showing after the notice.
pub const MIN_CONTENT_LENGTH: i64 = 7;

/// Notice emitted when no content fits.
pub fn truncation_notice() -> String {
    format!("{}{}", TRUNCATION_PREFIX, TRUNCATION_SUFFIX)
}

/// Truncates `rendered` so it fits in `max_length` characters behind the
/// truncation notice.
///
/// - `max_length <= 0` yields an empty string.
/// - If the notice alone does not fit, the notice is returned anyway.
/// - If fewer than [`MIN_CONTENT_LENGTH`] characters of content would fit,
///   only the notice is returned.
/// - Otherwise the leading content is quoted and appended, and trimmed
///   until the result is shorter than `max_length`.
pub fn truncate_rendered_value(rendered: &str, max_length: i64) -> String {
    if max_length <= 0 {
        return String::new();
    }

    let notice = truncation_notice();
    if char_len(&notice) >= max_length {
        return notice;
    }

    let overhead = char_len(TRUNCATION_PREFIX) + 2 + char_len(TRUNCATION_SUFFIX);
    let available = max_length - overhead;
    if available < MIN_CONTENT_LENGTH {
        return notice;
    }

    let (quote, unquoted) = choose_quote(rendered);
    let mut content: String = unquoted.chars().take(available as usize).collect();
    trim_end_in_place(&mut content);

    let target_length = max_length - 1;
    let mut result = build(quote, &content);
    while char_len(&result) > target_length && !content.is_empty() {
        content.pop();
        trim_end_in_place(&mut content);
        result = build(quote, &content);
    }
    result
}

/// Picks the quote character and the content to quote.
///
/// Existing outer quotes are reused and stripped. Otherwise double quotes
/// are used for content holding only single quotes, single quotes for
/// everything else.
fn choose_quote(value: &str) -> (char, &str) {
    if let Some(first) = value.chars().next() {
        if (first == '"' || first == '\'') && value.ends_with(first) {
            // Quotes are one byte wide; a lone quote has empty content.
            let inner = value.get(1..value.len() - 1).unwrap_or("");
            return (first, inner);
        }
    }

    if value.contains('\'') && !value.contains('"') {
        ('"', value)
    } else {
        ('\'', value)
    }
}

fn build(quote: char, content: &str) -> String {
    format!(
        "{}{}{}{}{}",
        TRUNCATION_PREFIX, quote, content, quote, TRUNCATION_SUFFIX
    )
}

fn trim_end_in_place(content: &mut String) {
    let trimmed = content.trim_end().len();
    content.truncate(trimmed);
}

fn char_len(s: &str) -> i64 {
    s.chars().count() as i64
}
