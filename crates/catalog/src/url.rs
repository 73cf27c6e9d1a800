//! Video URL canonicalization.

/// Marker identifying the short-link URL form.
pub const SHORT_LINK_MARKER: &str = "youtu.be/";

/// Prefix of the canonical long-form URL; the video ID follows it.
pub const CANONICAL_PREFIX: &str = "https://www.youtube.com/watch?v=";

/// Rewrite a short-link URL into the canonical long form.
///
/// The ID is the text after the last short-link marker, up to the first `?`.
/// Any other URL is returned trimmed but otherwise unchanged, which makes the
/// function idempotent.
pub fn normalize_video_url(url: &str) -> String {
    let url = url.trim();
    match url.rsplit_once(SHORT_LINK_MARKER) {
        Some((_, tail)) => {
            let id = tail.split('?').next().unwrap_or_default();
            format!("{CANONICAL_PREFIX}{id}")
        }
        None => url.to_string(),
    }
}

/// Video ID of a canonical URL, if it has one.
pub fn video_id(url: &str) -> Option<&str> {
    let (_, query) = url.split_once('?')?;
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix("v="))
        .filter(|id| !id.is_empty())
}
