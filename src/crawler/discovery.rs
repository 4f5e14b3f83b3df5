//! Link discovery
//!
//! Turns the anchors of a fetched page into absolute candidate URLs. What
//! happens to them (dedup, policy) is up to the frontier.

use crate::crawler::parser::Document;
use crate::url::resolve_href;
use url::Url;

/// Yields the absolute URL of every followable anchor in `document`
///
/// - Anchors without a (non-empty) href never show up
/// - Fragment-only hrefs (`#top`) are skipped without being resolved
/// - Everything else is trimmed and resolved against `base`
/// - Hrefs that cannot be resolved are dropped
pub fn discover_links<'a>(
    base: &'a Url,
    document: &impl Document,
) -> impl Iterator<Item = Url> + 'a {
    document.find_anchors().into_iter().filter_map(move |href| {
        let resolved = resolve_href(base, &href);
        if resolved.is_none() {
            tracing::debug!("Ignoring [{}]", href);
        }
        resolved
    })
}
