//! Plain HTTP extraction: one GET, no JavaScript.

use std::time::Duration;

use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

use crate::error::IngestError;
use crate::sanitize::{sanitize_bytes, sanitize_text};

pub const STATIC_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Elements whose text is never rendered.
const INVISIBLE_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: STATIC_USER_AGENT.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

pub struct StaticExtractor {
    client: reqwest::Client,
}

impl StaticExtractor {
    pub fn new(config: &FetchConfig) -> Result<Self, IngestError> {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `url` and flatten its document into text. No retries: any
    /// network or status failure goes straight back to the caller.
    pub async fn extract(&self, url: &str) -> Result<String, IngestError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let text = text_from_html(&sanitize_bytes(&body));

        debug!(url, chars = text.len(), "Static extraction complete");
        Ok(text)
    }
}

/// Walk the document in order, collecting visible text.
///
/// Paragraphs are emitted whole and wrapped in newlines; every other text
/// node has its whitespace collapsed and is appended with no separator.
/// Image sources are appended at the end, space-joined.
pub fn text_from_html(html: &str) -> String {
    let document = Html::parse_document(html);

    let mut text = String::new();
    collect_text(document.root_element(), &mut text);

    let images: Vec<&str> = match Selector::parse("img[src]") {
        Ok(selector) => document
            .select(&selector)
            .filter_map(|img| img.value().attr("src"))
            .collect(),
        Err(_) => Vec::new(),
    };

    if !images.is_empty() {
        if !text.is_empty() && !text.ends_with(char::is_whitespace) {
            text.push(' ');
        }
        text.push_str(&images.join(" "));
    }

    text
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                let cleaned = sanitize_text(text);
                let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
                out.push_str(&collapsed);
            }
            Node::Element(el) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };

                match el.name() {
                    name if INVISIBLE_TAGS.contains(&name) => {}
                    "p" => {
                        out.push('\n');
                        out.push_str(&sanitize_text(&child_el.text().collect::<String>()));
                        out.push('\n');
                    }
                    _ => collect_text(child_el, out),
                }
            }
            _ => {}
        }
    }
}
