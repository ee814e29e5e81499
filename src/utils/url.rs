use sha2::{Digest, Sha256};
pub use url::Url;

/// Resolves a possibly-relative reference against a base URL
///
/// Standard relative-URL resolution: an absolute reference is returned as-is,
/// a relative one is joined onto the base. Malformed references surface the
/// parse error so the caller can decide whether the failure is fatal.
pub fn resolve_url(base_url: &Url, target: &str) -> Result<Url, url::ParseError> {
    Url::options().base_url(Some(base_url)).parse(target)
}

/// Checks whether a reference is an inline data resource
pub fn is_data_url(reference: &str) -> bool {
    reference.trim_start().starts_with("data:")
}

/// Returns the final path segment of a URL, if any
///
/// `https://example.com/css/style.css` yields `style.css`;
/// `https://example.com/` yields nothing.
pub fn final_path_segment(url: &Url) -> Option<String> {
    let segment = url
        .path_segments()
        .and_then(|segments| segments.last().map(|s| s.to_string()))?;

    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Computes a short stable hash of a string
///
/// Used for fallback asset filenames and inline asset identity. Sixteen hex
/// characters of SHA-256 keep names readable while staying unique within a
/// single capture run.
pub fn url_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();

    digest
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Computes the short content hash of a byte payload
pub fn payload_hash(payload: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(payload);
    let digest = hasher.finalize();

    digest
        .iter()
        .take(8)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

/// Derives the capture directory name for a page URL
///
/// The host name is lowercased, a leading "www." is stripped, and dots become
/// underscores, so `https://www.Example.com/page` maps to `example_com`.
/// URLs without a host (data URLs, file URLs) fall back to a hash-derived name.
pub fn directory_name_for_url(url: &Url) -> String {
    match url.host_str() {
        Some(host) if !host.is_empty() => {
            let lowercased = host.to_lowercase();
            let stripped = lowercased.strip_prefix("www.").unwrap_or(&lowercased);
            stripped.replace('.', "_")
        }
        _ => format!("page_{}", url_hash(url.as_str())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_url_relative() {
        let base = Url::parse("https://example.com/").unwrap();
        let resolved = resolve_url(&base, "style.css").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/style.css");
    }

    #[test]
    fn test_resolve_url_absolute_kept() {
        let base = Url::parse("https://example.com/dir/page.html").unwrap();
        let resolved = resolve_url(&base, "https://cdn.example.org/app.js").unwrap();
        assert_eq!(resolved.as_str(), "https://cdn.example.org/app.js");
    }

    #[test]
    fn test_resolve_url_parent_directory() {
        let base = Url::parse("https://example.com/a/b/page.html").unwrap();
        let resolved = resolve_url(&base, "../img/logo.png").unwrap();
        assert_eq!(resolved.as_str(), "https://example.com/a/img/logo.png");
    }

    #[test]
    fn test_is_data_url() {
        assert!(is_data_url("data:image/png;base64,iVBORw0KGgo="));
        assert!(!is_data_url("https://example.com/image.png"));
        assert!(!is_data_url("/relative/path.css"));
    }

    #[test]
    fn test_final_path_segment() {
        let url = Url::parse("https://example.com/css/style.css").unwrap();
        assert_eq!(final_path_segment(&url), Some("style.css".to_string()));

        let root = Url::parse("https://example.com/").unwrap();
        assert_eq!(final_path_segment(&root), None);
    }

    #[test]
    fn test_url_hash_is_stable() {
        let a = url_hash("https://example.com/style.css");
        let b = url_hash("https://example.com/style.css");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn test_directory_name_for_url() {
        let url = Url::parse("https://www.Example.com/some/page").unwrap();
        assert_eq!(directory_name_for_url(&url), "example_com");

        let bare = Url::parse("https://futuretools.io").unwrap();
        assert_eq!(directory_name_for_url(&bare), "futuretools_io");
    }

    #[test]
    fn test_directory_name_without_host() {
        let url = Url::parse("data:text/html,hello").unwrap();
        assert!(directory_name_for_url(&url).starts_with("page_"));
    }
}
