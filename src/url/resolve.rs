use crate::{UrlError, UrlResult};
use url::Url;

/// Resolves an href found on a page into an absolute URL
///
/// # Resolution Rules
///
/// 1. Surrounding whitespace is trimmed
/// 2. Empty hrefs are rejected
/// 3. Fragment-only hrefs (`#top`) are rejected without being resolved
/// 4. Everything else is joined onto `base`
///
/// No canonicalization happens beyond what `Url` serialization does
/// (lowercase scheme and host, default port dropped, empty path becomes `/`).
/// Trailing slashes, query parameter order and fragments are kept, so
/// `/x` and `/x/` are different URLs.
///
/// # Returns
///
/// * `Some(Url)` - The absolute URL
/// * `None` - The href is empty, fragment-only, or cannot be resolved
///
/// # Examples
///
/// ```
/// use url::Url;
/// use vitrine::url::resolve_href;
///
/// let base = Url::parse("http://example.com").unwrap();
/// let url = resolve_href(&base, " /valid ").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/valid");
/// assert!(resolve_href(&base, "#top").is_none());
/// ```
pub fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    match try_resolve(base, href) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("{}", e);
            None
        }
    }
}

/// Joins `href` onto `base`, keeping the failure reason
pub fn try_resolve(base: &Url, href: &str) -> UrlResult<Url> {
    base.join(href).map_err(|e| UrlError::Resolve {
        href: href.to_string(),
        base: base.to_string(),
        message: e.to_string(),
    })
}

/// Parses a seed URL and checks it is usable as a crawl entry point
pub fn parse_seed(seed: &str) -> UrlResult<Url> {
    let url = Url::parse(seed).map_err(|e| UrlError::Resolve {
        href: seed.to_string(),
        base: String::new(),
        message: e.to_string(),
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingDomain);
    }

    Ok(url)
}
