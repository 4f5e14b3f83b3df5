//! Admission policy for candidate URLs
//!
//! The gate combines three immutable inputs: the allowed domain, the robots
//! snapshot and the blacklist pattern. It knows nothing about which URLs have
//! already been seen; deduplication is layered on top by the frontier.

use crate::config::validation::compile_pattern;
use crate::config::SiteConfig;
use crate::robots::ParsedRobots;
use crate::url::is_in_domain;
use crate::ConfigResult;
use regex::Regex;
use url::Url;

/// Why a URL was refused, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Host missing or outside the allowed domain
    OffDomain,
    /// Disallowed by robots.txt for the generic agent
    Robots,
    /// Matched the blacklist pattern
    Blacklisted,
}

/// Decides whether a URL may ever be visited during this run
#[derive(Debug, Clone)]
pub struct PolicyGate {
    domain: String,
    robots: ParsedRobots,
    blacklist: Regex,
}

impl PolicyGate {
    /// Creates a gate from already-compiled inputs
    pub fn new(domain: impl Into<String>, robots: ParsedRobots, blacklist: Regex) -> Self {
        Self {
            domain: domain.into(),
            robots,
            blacklist,
        }
    }

    /// Creates a gate from the site configuration and a robots snapshot
    pub fn from_config(site: &SiteConfig, robots: ParsedRobots) -> ConfigResult<Self> {
        let blacklist = compile_pattern("blacklist_pattern", &site.blacklist_pattern)?;
        Ok(Self::new(site.domain.clone(), robots, blacklist))
    }

    /// Returns true when the URL passes every check
    pub fn can_visit(&self, url: &Url) -> bool {
        self.check(url).is_ok()
    }

    /// Evaluates the checks in order, stopping at the first failure
    ///
    /// 1. Host equals the allowed domain or is a subdomain of it
    /// 2. robots.txt allows the URL for `*`
    /// 3. URL does not match the blacklist
    pub fn check(&self, url: &Url) -> Result<(), Rejection> {
        if !is_in_domain(url, &self.domain) {
            return Err(Rejection::OffDomain);
        }

        if !self.robots.is_allowed_generic(url.as_str()) {
            return Err(Rejection::Robots);
        }

        if self.blacklist.is_match(url.as_str()) {
            return Err(Rejection::Blacklisted);
        }

        Ok(())
    }
}
