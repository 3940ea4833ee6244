//! Public URLs for stored media paths.

/// Turn a stored path into a public URL under `base`.
///
/// Empty paths have no URL; absolute `http(s)` URLs are returned unchanged.
#[must_use]
pub fn media_url(base: &str, path: &str) -> Option<String> {
    let path = path.trim();
    if path.is_empty() {
        return None;
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Some(path.to_owned());
    }
    Some(format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_url() {
        assert_eq!(
            media_url("https://media.example.com/", "/items/1/a.jpg").as_deref(),
            Some("https://media.example.com/items/1/a.jpg")
        );
        assert_eq!(
            media_url("/media", "logo.png").as_deref(),
            Some("/media/logo.png")
        );
        assert_eq!(
            media_url("/media", "https://cdn.example.com/x.png").as_deref(),
            Some("https://cdn.example.com/x.png")
        );
        assert_eq!(media_url("/media", "  "), None);
    }
}
