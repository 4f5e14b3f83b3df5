/// Checks if a host belongs to the allowed domain
///
/// A host matches when it is the domain itself or any subdomain of it:
/// - "example.com" matches "example.com"
/// - "example.com" matches "www.example.com" and "api.v2.example.com"
/// - "example.com" does not match "myexample.com" or "example.com.org"
///
/// Comparison is ASCII case-insensitive; hosts parsed by `url` are already
/// lowercase, configured domains may not be.
///
/// # Examples
///
/// ```
/// use vitrine::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("example.com", "www.example.com"));
/// assert!(!matches_domain("example.com", "notexample.com"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() || host.len() < domain.len() {
        return false;
    }

    let (prefix, suffix) = host.split_at(host.len() - domain.len());
    suffix.eq_ignore_ascii_case(domain) && (prefix.is_empty() || prefix.ends_with('.'))
}
