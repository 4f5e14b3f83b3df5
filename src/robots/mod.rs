//! Robots.txt handling module
//!
//! The crawl takes one robots.txt snapshot at startup and checks every
//! candidate URL against it for the generic agent.
//!
//! # Fetch Failure Policy
//!
//! | Outcome of `GET /robots.txt` | Policy |
//! |------------------------------|--------|
//! | 2xx | Parse the body |
//! | 4xx | No robots file: allow everything |
//! | 5xx or transport error | Read the configured fallback file |
//! | ... and no fallback / unreadable | Abort startup |

mod parser;

pub use parser::{ParsedRobots, GENERIC_AGENT};

use crate::{Result, VitrineError};
use reqwest::Client;
use std::path::Path;
use url::Url;

/// Returns the well-known robots.txt location for the origin of `site`
pub fn robots_url(site: &Url) -> Result<Url> {
    Ok(site.join("/robots.txt")?)
}

/// Fetches the robots.txt snapshot for the crawled site
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `site` - Any URL on the site (normally the seed)
/// * `fallback` - Local robots.txt to use when the live one is unavailable
///
/// # Returns
///
/// * `Ok(ParsedRobots)` - The policy for this run
/// * `Err(VitrineError::Robots)` - Unavailable and no usable fallback
pub async fn fetch_robots(
    client: &Client,
    site: &Url,
    fallback: Option<&Path>,
) -> Result<ParsedRobots> {
    let url = robots_url(site)?;
    tracing::info!("Fetching robots.txt from {}", url);

    let failure = match client.get(url.as_str()).send().await {
        Ok(response) => {
            let status = response.status();
            if status.is_success() {
                let body = response.text().await.map_err(|e| VitrineError::Http {
                    url: url.to_string(),
                    source: e,
                })?;
                tracing::debug!("robots.txt: {} bytes", body.len());
                return Ok(ParsedRobots::from_content(&body));
            }

            if status.is_client_error() {
                tracing::info!("No robots.txt at {} (HTTP {}), allowing all", url, status);
                return Ok(ParsedRobots::allow_all());
            }

            format!("HTTP {}", status.as_u16())
        }
        Err(e) => e.to_string(),
    };

    tracing::warn!("Could not fetch {}: {}", url, failure);
    load_fallback(fallback, &failure)
}

/// Reads the local fallback robots.txt, or fails with the original reason
fn load_fallback(fallback: Option<&Path>, failure: &str) -> Result<ParsedRobots> {
    let Some(path) = fallback else {
        return Err(VitrineError::Robots(format!(
            "robots.txt unavailable ({}) and no fallback file configured",
            failure
        )));
    };

    match std::fs::read_to_string(path) {
        Ok(content) => {
            tracing::info!("Using fallback robots.txt from {}", path.display());
            Ok(ParsedRobots::from_content(&content))
        }
        Err(e) => Err(VitrineError::Robots(format!(
            "robots.txt unavailable ({}) and fallback {} unreadable: {}",
            failure,
            path.display(),
            e
        ))),
    }
}
