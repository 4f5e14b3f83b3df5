//! URL handling module for Vitrine
//!
//! This module resolves hrefs into absolute URLs and decides whether a host
//! belongs to the crawled domain.

mod matcher;
mod resolve;

pub use matcher::matches_domain;
pub use resolve::{parse_seed, resolve_href, try_resolve};

use url::Url;

/// Checks whether a URL's host lies inside the allowed domain
///
/// URLs without a host (`mailto:`, `javascript:`, `data:`) never match.
pub fn is_in_domain(url: &Url, domain: &str) -> bool {
    url.host_str()
        .map(|host| matches_domain(domain, host))
        .unwrap_or(false)
}
