//! Utility functions and helpers.

pub mod parse;
pub mod url;

pub use parse::{
    clean_review_text, first_two_words_match, parse_float, parse_int, rating_from_label,
    star_bucket,
};
pub use url::{coordinates, path_contains, resolve_url, search_url};
