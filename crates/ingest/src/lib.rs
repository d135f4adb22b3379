pub mod browser;
pub mod content;
pub mod error;
pub mod reader;
pub mod sanitize;
pub mod static_html;
pub mod strategy;

pub use browser::{BrowserConfig, ChromeSession, NodeHandle, PageDriver, extract_dynamic, extract_dynamic_with};
pub use content::{ContentCategory, PageContents};
pub use error::IngestError;
pub use reader::JsonReader;
pub use sanitize::{sanitize_bytes, sanitize_text};
pub use static_html::{FetchConfig, StaticExtractor, text_from_html};
pub use strategy::{ExpansionReport, ExpansionStrategy, Pacing, XPathToggle, default_strategies};

/// Where the text for a schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// Fetch over plain HTTP.
    StaticUrl(String),
    /// Render in a headless browser and open collapsed sections first.
    DynamicUrl(String),
    /// An uploaded JSON document.
    Json(String),
}

impl ContentSource {
    pub fn url(&self) -> Option<&str> {
        match self {
            ContentSource::StaticUrl(url) | ContentSource::DynamicUrl(url) => Some(url.as_str()),
            ContentSource::Json(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IngestConfig {
    pub fetch: FetchConfig,
    pub browser: BrowserConfig,
}

/// Run the extractor matching `source` and return model-ready text.
pub async fn extract_text(source: &ContentSource, config: &IngestConfig) -> Result<String, IngestError> {
    match source {
        ContentSource::StaticUrl(url) => StaticExtractor::new(&config.fetch)?.extract(url).await,
        ContentSource::DynamicUrl(url) => {
            let contents = extract_dynamic(url, &config.browser, default_strategies()).await?;
            Ok(contents.to_text())
        }
        ContentSource::Json(raw) => JsonReader::pretty(raw).ok_or(IngestError::InvalidJson),
    }
}
