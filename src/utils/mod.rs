use std::sync::LazyLock;

use regex::Regex;

static POST_SHORTCODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(?:p|reels?|tv)/(?P<code>[A-Za-z0-9_-]+)").expect("Invalid regex")
});

const FALLBACK_FILENAME: &str = "video.mp4";

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}

/// Pick the name a saved video should get.
///
/// Uses the resolver's filename when it has one, otherwise falls back to the
/// post shortcode (`/p/<code>/`, `/reel/<code>/`, ...) and finally to a fixed name.
pub fn suggested_filename(resolved: &str, post_url: &str) -> String {
    let resolved = sanitize_filename(resolved);
    if !resolved.is_empty() {
        return resolved;
    }

    POST_SHORTCODE
        .captures(post_url)
        .map(|caps| format!("{}.mp4", &caps["code"]))
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}
