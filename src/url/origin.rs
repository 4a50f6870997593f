use url::Url;

/// Returns the origin (scheme + host + port) of a URL as a string
///
/// Default ports are omitted, so `https://example.com:443/a` and
/// `https://example.com/b` share the origin `https://example.com`.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use site_recce::url::origin_of;
///
/// let url = Url::parse("https://Example.com/path?q=1").unwrap();
/// assert_eq!(origin_of(&url), "https://example.com");
///
/// let url = Url::parse("http://localhost:8080/").unwrap();
/// assert_eq!(origin_of(&url), "http://localhost:8080");
/// ```
pub fn origin_of(url: &Url) -> String {
    url.origin().ascii_serialization()
}

/// Checks whether two URLs share scheme, host and port
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Returns the URL with its query string and fragment removed
///
/// Strings that do not parse as absolute URLs are cut at the first `?` or `#`
/// so relative request paths still collapse onto one key.
pub fn strip_query(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw
            .split(|c| c == '?' || c == '#')
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_origin_simple() {
        assert_eq!(origin_of(&url("https://example.com/a/b")), "https://example.com");
    }

    #[test]
    fn test_origin_keeps_explicit_port() {
        assert_eq!(
            origin_of(&url("http://127.0.0.1:4000/page")),
            "http://127.0.0.1:4000"
        );
    }

    #[test]
    fn test_origin_drops_default_port() {
        assert_eq!(
            origin_of(&url("https://example.com:443/page")),
            "https://example.com"
        );
    }

    #[test]
    fn test_same_origin_same_site() {
        assert!(same_origin(
            &url("https://example.com/"),
            &url("https://example.com/a/b?x=1")
        ));
    }

    #[test]
    fn test_same_origin_different_scheme() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("http://example.com/")
        ));
    }

    #[test]
    fn test_same_origin_subdomain_is_different() {
        assert!(!same_origin(
            &url("https://example.com/"),
            &url("https://blog.example.com/")
        ));
    }

    #[test]
    fn test_same_origin_different_port() {
        assert!(!same_origin(
            &url("http://localhost:8080/"),
            &url("http://localhost:9090/")
        ));
    }

    #[test]
    fn test_strip_query_absolute() {
        assert_eq!(
            strip_query("https://example.com/api/items?page=2"),
            "https://example.com/api/items"
        );
    }

    #[test]
    fn test_strip_query_with_fragment() {
        assert_eq!(
            strip_query("https://example.com/api/items?page=2#top"),
            "https://example.com/api/items"
        );
    }

    #[test]
    fn test_strip_query_relative() {
        assert_eq!(strip_query("/api/items?page=1"), "/api/items");
    }

    #[test]
    fn test_strip_query_without_query() {
        assert_eq!(
            strip_query("https://example.com/api/items"),
            "https://example.com/api/items"
        );
    }
}
