use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::sanitize::sanitize_text;

/// Buckets used when harvesting a rendered page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContentCategory {
    Paragraphs,
    Headings,
    Divs,
    Spans,
    Articles,
    Sections,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 6] = [
        ContentCategory::Paragraphs,
        ContentCategory::Headings,
        ContentCategory::Divs,
        ContentCategory::Spans,
        ContentCategory::Articles,
        ContentCategory::Sections,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContentCategory::Paragraphs => "Paragraphs",
            ContentCategory::Headings => "Headings",
            ContentCategory::Divs => "Divs",
            ContentCategory::Spans => "Spans",
            ContentCategory::Articles => "Articles",
            ContentCategory::Sections => "Sections",
        }
    }

    fn selector(self) -> &'static str {
        match self {
            ContentCategory::Paragraphs => "p",
            ContentCategory::Headings => "h1, h2, h3, h4, h5, h6",
            ContentCategory::Divs => {
                "div[class*='content'], div[class*='text'], div[class*='description']"
            }
            ContentCategory::Spans => "span[class*='text'], span[class*='content']",
            ContentCategory::Articles => "article",
            ContentCategory::Sections => "section",
        }
    }
}

/// Text harvested from a fully rendered page, keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContents {
    pub contents: BTreeMap<ContentCategory, Vec<String>>,
}

impl PageContents {
    /// Parse `html` and collect the trimmed text of every element matching
    /// each category. Every category is present, possibly empty.
    pub fn harvest(html: &str) -> Self {
        let document = Html::parse_document(html);
        let mut contents = BTreeMap::new();

        for category in ContentCategory::ALL {
            let Ok(selector) = Selector::parse(category.selector()) else {
                warn!(category = category.label(), "Skipping unparsable selector");
                contents.insert(category, Vec::new());
                continue;
            };

            let texts: Vec<String> = document
                .select(&selector)
                .map(element_text)
                .filter(|text| !text.is_empty())
                .collect();

            contents.insert(category, texts);
        }

        Self { contents }
    }

    pub fn get(&self, category: ContentCategory) -> &[String] {
        self.contents
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn fragment_count(&self) -> usize {
        self.contents.values().map(Vec::len).sum()
    }

    /// Flatten into one newline-separated document, in category order.
    pub fn to_text(&self) -> String {
        self.contents
            .values()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    let pieces: Vec<&str> = element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect();
    sanitize_text(&pieces.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <h1>Main title</h1>
        <h3>  Sub   </h3>
        <p>Intro <b>bold</b> words</p>
        <p>   </p>
        <div class="main-content">Body copy</div>
        <div class="navbar">Menu</div>
        <div class="product-description">Details</div>
        <span class="text-muted">Muted</span>
        <span class="badge">Badge</span>
        <article>Story</article>
        <section>Part</section>
    </body></html>"#;

    #[test]
    fn test_harvest_categories() {
        let page = PageContents::harvest(PAGE);

        assert_eq!(page.get(ContentCategory::Paragraphs), ["Intro bold words"]);
        assert_eq!(page.get(ContentCategory::Headings), ["Main title", "Sub"]);
        assert_eq!(page.get(ContentCategory::Divs), ["Body copy", "Details"]);
        assert_eq!(page.get(ContentCategory::Spans), ["Muted"]);
        assert_eq!(page.get(ContentCategory::Articles), ["Story"]);
        assert_eq!(page.get(ContentCategory::Sections), ["Part"]);
    }

    #[test]
    fn test_all_categories_present() {
        let page = PageContents::harvest("<html><body></body></html>");
        assert_eq!(page.contents.len(), 6);
        assert_eq!(page.fragment_count(), 0);
        assert_eq!(page.to_text(), "");
    }

    #[test]
    fn test_to_text_follows_category_order() {
        let page = PageContents::harvest(
            "<html><body><section>S</section><p>P</p><h2>H</h2></body></html>",
        );
        assert_eq!(page.to_text(), "P\nH\nS");
    }

    #[test]
    fn test_serializes_under_contents_key() {
        let page = PageContents::harvest("<html><body><p>x</p></body></html>");
        let value = serde_json::to_value(&page).unwrap();
        assert_eq!(value["contents"]["Paragraphs"][0], "x");
        assert!(value["contents"]["Sections"].as_array().unwrap().is_empty());
    }
}
