// src/utils/parse.rs

//! Tolerant conversions from raw label text to typed values.
//!
//! Every function here is total: malformed input degrades to a zero value
//! instead of an error, so a half-rendered listing still yields a record.

use std::sync::OnceLock;

use regex::Regex;

/// Parse an integer, ignoring thousands separators. Returns 0 on failure.
pub fn parse_int(text: &str) -> u64 {
    text.trim().replace(',', "").parse().unwrap_or(0)
}

/// Parse a decimal number. Returns 0.0 on failure.
pub fn parse_float(text: &str) -> f64 {
    text.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Extract the count from a star-bucket label such as `"5 stars, 1,234 reviews"`.
///
/// The count is the third whitespace-delimited token.
pub fn star_bucket(label: &str) -> u64 {
    label.split_whitespace().nth(2).map_or(0, parse_int)
}

/// Pull the aggregate rating out of a label such as `"4.6 stars "`.
pub fn rating_from_label(label: &str) -> f64 {
    static RATING: OnceLock<Regex> = OnceLock::new();
    let pattern = RATING.get_or_init(|| Regex::new(r"\d+(?:\.\d+)?").expect("valid regex"));

    pattern
        .find(label)
        .map_or(0.0, |m| parse_float(m.as_str()))
}

/// Case-insensitive comparison of the first two words of two strings.
///
/// Strings with fewer than two words never match.
pub fn first_two_words_match(a: &str, b: &str) -> bool {
    let mut left = a.split_whitespace();
    let mut right = b.split_whitespace();

    for _ in 0..2 {
        match (left.next(), right.next()) {
            (Some(x), Some(y)) if x.to_lowercase() == y.to_lowercase() => {}
            _ => return false,
        }
    }
    true
}

/// Normalise review text: drop escaped ampersand artifacts and trim.
pub fn clean_review_text(text: &str) -> String {
    text.replace("\\u0026", "")
        .replace("&amp;", "")
        .replace('&', "")
        .trim()
        .to_string()
}
