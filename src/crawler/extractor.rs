//! Product page recognition and field extraction

use crate::config::validation::compile_pattern;
use crate::config::ExtractionConfig;
use crate::crawler::parser::Document;
use crate::ConfigResult;
use regex::Regex;
use url::Url;

/// One extracted product
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRecord {
    pub page_url: String,
    pub page_title: String,
    pub product_name: String,
}

/// Decides which pages are product pages and pulls their fields
#[derive(Debug, Clone)]
pub struct Extractor {
    product_page: Regex,
    not_found_marker: String,
    product_name_class: Regex,
}

impl Extractor {
    pub fn new(product_page: Regex, not_found_marker: impl Into<String>, product_name_class: Regex) -> Self {
        Self {
            product_page,
            not_found_marker: not_found_marker.into(),
            product_name_class,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> ConfigResult<Self> {
        Ok(Self::new(
            compile_pattern("product_page_pattern", &config.product_page_pattern)?,
            config.not_found_marker.clone(),
            compile_pattern("product_name_class", &config.product_name_class)?,
        ))
    }

    /// True iff the requested URL has the product page shape and the final
    /// URL (after redirects) is not the site's "product not found" page
    pub fn is_product_page(&self, final_url: &str, original_url: &str) -> bool {
        self.product_page.is_match(original_url) && !final_url.contains(&self.not_found_marker)
    }

    /// Pulls the page title and the first product name out of a document
    ///
    /// A missing title or product name is a normal outcome (a page built
    /// from another template) and yields `None`.
    pub fn extract(&self, document: &impl Document, page_url: &Url) -> Option<CrawlRecord> {
        let page_title = document.title()?;
        let product_name = document
            .find_by_class_pattern(&self.product_name_class)
            .into_iter()
            .next()
            .filter(|name| !name.is_empty())?;

        Some(CrawlRecord {
            page_url: page_url.to_string(),
            page_title,
            product_name,
        })
    }
}
