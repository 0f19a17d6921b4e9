//! URL resolution for consistent cache keys.

use url::Url;

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a URL string against the app origin.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Join relative references (`/offline`, `static/app.js`) onto `base`
/// 3. Keep absolute URLs (CDN assets, extension URLs) as they are
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
///
/// Scheme filtering is left to the fetch policy so extension URLs can be
/// recognized and bypassed rather than rejected.
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut resolved = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    resolved.set_fragment(None);

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("http://localhost:8000/").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&origin(), "/offline").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/offline");
    }

    #[test]
    fn test_resolve_root() {
        let url = resolve(&origin(), "/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/");
    }

    #[test]
    fn test_resolve_absolute_cdn_url() {
        let url = resolve(&origin(), "https://cdn.jsdelivr.net/npm/bootstrap@5.3.0/dist/css/bootstrap.min.css").unwrap();
        assert_eq!(url.host_str(), Some("cdn.jsdelivr.net"));
        assert_eq!(url.scheme(), "https");
    }

    #[test]
    fn test_resolve_lowercases_host() {
        let url = resolve(&origin(), "https://CDN.Example.COM/app.js").unwrap();
        assert_eq!(url.host_str(), Some("cdn.example.com"));
    }

    #[test]
    fn test_resolve_removes_fragment() {
        let url = resolve(&origin(), "/conductor#contratos").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/conductor");
    }

    #[test]
    fn test_resolve_preserves_query() {
        let url = resolve(&origin(), "/validar-vehiculo?plate=ABC123&b=2").unwrap();
        assert_eq!(url.query(), Some("plate=ABC123&b=2"));
    }

    #[test]
    fn test_resolve_keeps_extension_scheme() {
        let url = resolve(&origin(), "chrome-extension://abcdef/content.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&origin(), "  /login  ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/login");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&origin(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&origin(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_invalid() {
        let result = resolve(&origin(), "http://[::1");
        assert!(matches!(result, Err(UrlError::InvalidUrl(_))));
    }
}
