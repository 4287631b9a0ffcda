//! Filename derivation and sanitization for downloaded files and directories.

use url::Url;

/// Replaces characters that are unsafe in a single path component.
///
/// Separators, reserved characters and control characters become `_`;
/// leading/trailing whitespace and dots are trimmed so a title like `..`
/// can never escape its parent directory. Non-ASCII text is kept as is.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|ch| match ch {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    mapped
        .trim()
        .trim_matches('.')
        .trim()
        .to_string()
}

/// Filename for the image at `index`, taken from the last URL path segment.
///
/// Falls back to `img{index}` (keeping the URL extension when present) for
/// URLs without a usable segment.
#[must_use]
pub fn image_filename(url: &str, index: usize) -> String {
    let segment = Url::parse(url).ok().and_then(|parsed| {
        parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back().map(str::to_string))
    });

    if let Some(segment) = segment.filter(|s| !s.is_empty()) {
        let decoded = match urlencoding::decode(&segment) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => segment.clone(),
        };
        let sanitized = sanitize_filename(&decoded);
        if !sanitized.is_empty() {
            return sanitized;
        }
    }

    match extension_from_url(url) {
        Some(ext) => format!("img{index}{ext}"),
        None => format!("img{index}"),
    }
}

/// Lowercased extension (with the dot) of the last URL path segment.
pub(crate) fn extension_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let last_segment = parsed.path_segments()?.next_back()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = &last_segment[dot_index..];
    if ext.len() <= 1 || ext.len() > 12 {
        return None;
    }
    Some(ext.to_lowercase())
}
