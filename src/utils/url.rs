// src/utils/url.rs

//! URL helpers for the map search interface.

use url::Url;

/// Build the search URL for a free-text query.
///
/// Spaces become `+`; no other escaping is applied. `{query}` and `{lang}`
/// are substituted in the template.
///
/// # Examples
/// ```
/// use places_crawler::utils::url::search_url;
///
/// assert_eq!(
///     search_url("https://www.google.com/maps/search/{query}/?hl={lang}", "en", "Laba africa"),
///     "https://www.google.com/maps/search/Laba+africa/?hl=en"
/// );
/// ```
pub fn search_url(template: &str, language: &str, query: &str) -> String {
    template
        .replace("{query}", &query.replace(' ', "+"))
        .replace("{lang}", language)
}

/// Extract `"lat,lon"` from the `@lat,lon,zoom/` segment of a listing URL.
///
/// Returns an empty string when the `@` marker or the `/` that closes the
/// segment is missing.
pub fn coordinates(url: &str) -> String {
    let Some(at) = url.find('@') else {
        return String::new();
    };
    let rest = &url[at + 1..];
    let Some(slash) = rest.find('/') else {
        return String::new();
    };

    let mut parts = rest[..slash].split(',');
    match (parts.next(), parts.next()) {
        (Some(lat), Some(lon)) if !lat.is_empty() && !lon.is_empty() => format!("{lat},{lon}"),
        _ => String::new(),
    }
}

/// Resolve a potentially relative link against the page it was found on.
pub fn resolve_url(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|base| base.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Check whether `url` contains `marker` in its path.
///
/// Falls back to a plain substring check for strings that do not parse as URLs.
pub fn path_contains(url: &str, marker: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().contains(marker),
        Err(_) => url.contains(marker),
    }
}
