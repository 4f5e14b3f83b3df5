//! HTML document access for the crawler
//!
//! Workers never query HTML directly; they go through the `Document`
//! capability so that extraction and link discovery can be tested against
//! hand-built documents.

use regex::Regex;
use scraper::{Html, Selector};

/// Read-only queries the crawler needs from a parsed page
pub trait Document {
    /// Returns the trimmed `<title>` text, if present and non-empty
    fn title(&self) -> Option<String>;

    /// Returns the raw `href` of every `<a>` element that has a non-empty one
    fn find_anchors(&self) -> Vec<String>;

    /// Returns the trimmed text of every element whose `class` attribute
    /// matches `pattern`, in document order
    fn find_by_class_pattern(&self, pattern: &Regex) -> Vec<String>;
}

/// `Document` backed by the `scraper` HTML5 parser
///
/// `scraper::Html` is not `Send`; keep these values out of `.await` points.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    /// Parses an HTML body. Parsing never fails; broken markup yields a
    /// best-effort tree.
    ///
    /// # Example
    ///
    /// ```
    /// use vitrine::crawler::{Document, HtmlDocument};
    ///
    /// let doc = HtmlDocument::parse(r#"<title>Test</title><a href="/page">Link</a>"#);
    /// assert_eq!(doc.title(), Some("Test".to_string()));
    /// assert_eq!(doc.find_anchors(), vec!["/page".to_string()]);
    /// ```
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    fn select_all(&self, css: &str) -> Vec<scraper::ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.html.select(&selector).collect(),
            Err(e) => {
                tracing::error!("Invalid selector {}: {:?}", css, e);
                Vec::new()
            }
        }
    }
}

impl Document for HtmlDocument {
    fn title(&self) -> Option<String> {
        self.select_all("title")
            .into_iter()
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn find_anchors(&self) -> Vec<String> {
        self.select_all("a[href]")
            .into_iter()
            .filter_map(|element| element.value().attr("href"))
            .filter(|href| !href.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn find_by_class_pattern(&self, pattern: &Regex) -> Vec<String> {
        self.select_all("[class]")
            .into_iter()
            .filter(|element| {
                element
                    .value()
                    .attr("class")
                    .is_some_and(|class| pattern.is_match(class))
            })
            .map(|element| element.text().collect::<String>().trim().to_string())
            .collect()
    }
}
