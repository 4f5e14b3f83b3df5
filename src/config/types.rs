use serde::Deserialize;

/// Main configuration structure for Vitrine
///
/// Every section has defaults, so an empty file (or no file at all) yields a
/// crawler for the reference storefront.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Which URL relative hrefs are resolved against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkBase {
    /// The configured seed URL (site root)
    #[default]
    Site,
    /// The final URL of the page the link was found on
    Page,
}

/// Worker pool and transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Skip TLS certificate validation
    #[serde(rename = "accept-invalid-certs", default)]
    pub accept_invalid_certs: bool,

    #[serde(rename = "link-base", default)]
    pub link_base: LinkBase,

    /// Queue the links found on fetched pages; off means only the seeds
    /// (and sitemap entries) are visited
    #[serde(rename = "follow-links", default = "default_follow_links")]
    pub follow_links: bool,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default = "default_contact_url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email", default = "default_contact_email")]
    pub contact_email: String,
}

/// The site being crawled and the admission policy inputs
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Allowed host; subdomains of it are allowed too
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Entry point, also the default base for relative links
    #[serde(rename = "seed-url", default = "default_seed_url")]
    pub seed_url: String,

    /// URLs matching this regex are never visited
    #[serde(rename = "blacklist-pattern", default = "default_blacklist_pattern")]
    pub blacklist_pattern: String,

    /// Local robots.txt used when the live one cannot be fetched
    #[serde(rename = "robots-fallback-path", default)]
    pub robots_fallback_path: Option<String>,

    /// Root sitemap (or sitemap index); its product sitemaps seed the frontier
    #[serde(rename = "sitemap-url", default)]
    pub sitemap_url: Option<String>,

    /// Child sitemaps whose URL matches this regex hold product pages
    #[serde(rename = "product-sitemap-pattern", default = "default_product_sitemap_pattern")]
    pub product_sitemap_pattern: String,
}

/// Product page recognition and field extraction
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Regex the requested URL must match to be a product page
    #[serde(rename = "product-page-pattern", default = "default_product_page_pattern")]
    pub product_page_pattern: String,

    /// Substring of the final URL that marks a "product not found" redirect
    #[serde(rename = "not-found-marker", default = "default_not_found_marker")]
    pub not_found_marker: String,

    /// Regex matched against `class` attributes to find the product name
    #[serde(rename = "product-name-class", default = "default_product_name_class")]
    pub product_name_class: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file
    #[serde(rename = "csv-path", default = "default_csv_path")]
    pub csv_path: String,

    /// Log to this file instead of stdout
    #[serde(rename = "log-path", default)]
    pub log_path: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            request_timeout_secs: default_request_timeout(),
            accept_invalid_certs: false,
            link_base: LinkBase::default(),
            follow_links: default_follow_links(),
        }
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: default_contact_url(),
            contact_email: default_contact_email(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            domain: default_domain(),
            seed_url: default_seed_url(),
            blacklist_pattern: default_blacklist_pattern(),
            robots_fallback_path: None,
            sitemap_url: None,
            product_sitemap_pattern: default_product_sitemap_pattern(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            product_page_pattern: default_product_page_pattern(),
            not_found_marker: default_not_found_marker(),
            product_name_class: default_product_name_class(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: default_csv_path(),
            log_path: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

fn default_workers() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_crawler_name() -> String {
    "vitrine".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_contact_url() -> String {
    "https://github.com/vitrine-crawler/vitrine".to_string()
}

fn default_contact_email() -> String {
    "crawler@vitrine.dev".to_string()
}

fn default_domain() -> String {
    "epocacosmeticos.com.br".to_string()
}

fn default_seed_url() -> String {
    "http://epocacosmeticos.com.br".to_string()
}

fn default_blacklist_pattern() -> String {
    r"(\?PS=20&map|checkout/cart/add|^mailto:)".to_string()
}

fn default_follow_links() -> bool {
    true
}

fn default_product_sitemap_pattern() -> String {
    r"sitemap-produtos.*\.xml".to_string()
}

fn default_product_page_pattern() -> String {
    r".*/p$".to_string()
}

fn default_not_found_marker() -> String {
    "ProductLinkNotFound".to_string()
}

fn default_product_name_class() -> String {
    r"\bproductName\b".to_string()
}

fn default_csv_path() -> String {
    "data/vitrine.csv".to_string()
}
