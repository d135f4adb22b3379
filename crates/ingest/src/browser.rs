//! Headless-browser extraction for pages that only render their content
//! after scripts run and sections are clicked open.
//!
//! The flow is navigate, expand, harvest. Navigation and expansion are best
//! effort; only a browser that cannot start or a DOM that cannot be read
//! fails the extraction. The browser belongs to a single call and is shut
//! down when that call returns, whichever way it returns.

use std::ffi::OsStr;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use crate::content::PageContents;
use crate::error::IngestError;
use crate::strategy::{ExpansionStrategy, Pacing, expand_all};

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/110.0.0.0 Safari/537.36";

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    pub window_size: (u32, u32),
    pub user_agent: String,
    /// Wait after the initial navigation.
    pub navigation_settle: Duration,
    pub pacing: Pacing,
    /// Wait after all strategies ran, before the DOM is read.
    pub final_settle: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            window_size: (1920, 1080),
            user_agent: BROWSER_USER_AGENT.to_string(),
            navigation_settle: Duration::from_secs(2),
            pacing: Pacing::default(),
            final_settle: Duration::from_secs(3),
        }
    }
}

/// Opaque reference to a DOM node on the page being driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeHandle(pub u32);

/// The slice of browser behaviour extraction needs.
pub trait PageDriver {
    fn navigate(&self, url: &str) -> Result<()>;

    /// All nodes matching `xpath`; no match is an empty list, not an error.
    fn find_by_xpath(&self, xpath: &str) -> Result<Vec<NodeHandle>>;

    /// Call a JS function with `this` bound to `node`.
    fn call_function_on(&self, node: NodeHandle, function: &str) -> Result<()>;

    /// Serialized DOM as it currently stands.
    fn html(&self) -> Result<String>;
}

/// A launched Chrome with one tab. Dropping it closes the tab and kills the
/// browser process.
pub struct ChromeSession {
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .window_size(Some(config.window_size))
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| anyhow!("Invalid browser launch options: {}", e))?;

        let browser = Browser::new(options).context("Failed to launch headless Chrome")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;
        tab.set_user_agent(&config.user_agent, None, None)
            .context("Failed to set user agent")?;

        debug!("Headless browser launched");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }
}

impl PageDriver for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab.navigate_to(url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn find_by_xpath(&self, xpath: &str) -> Result<Vec<NodeHandle>> {
        match self.tab.find_elements_by_xpath(xpath) {
            Ok(elements) => Ok(elements.iter().map(|el| NodeHandle(el.node_id)).collect()),
            Err(e) if e.downcast_ref::<NoElementFound>().is_some() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn call_function_on(&self, node: NodeHandle, function: &str) -> Result<()> {
        let element = Element::new(&self.tab, node.0)?;
        element.call_js_fn(function, vec![], false)?;
        Ok(())
    }

    fn html(&self) -> Result<String> {
        self.tab.get_content()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!(error = %e, "Tab already closed");
        }
        debug!("Headless browser released");
    }
}

/// Render `url` in a fresh headless browser, open collapsed sections with
/// `strategies`, then harvest the expanded DOM.
pub async fn extract_dynamic(
    url: &str,
    config: &BrowserConfig,
    strategies: Vec<Box<dyn ExpansionStrategy>>,
) -> Result<PageContents, IngestError> {
    extract_dynamic_with(ChromeSession::launch, url, config, strategies).await
}

/// Same as [`extract_dynamic`] with the driver supplied by `launch`. The
/// driver is dropped before this returns, on success and on failure.
pub async fn extract_dynamic_with<D, L>(
    launch: L,
    url: &str,
    config: &BrowserConfig,
    strategies: Vec<Box<dyn ExpansionStrategy>>,
) -> Result<PageContents, IngestError>
where
    D: PageDriver,
    L: FnOnce(&BrowserConfig) -> Result<D> + Send + 'static,
{
    let url = url.to_string();
    let config = config.clone();

    tokio::task::spawn_blocking(move || {
        let session = launch(&config).map_err(IngestError::Browser)?;
        render_and_harvest(&session, &url, &config, &strategies)
    })
    .await?
}

/// The three extraction phases against an already running page.
pub fn render_and_harvest(
    page: &dyn PageDriver,
    url: &str,
    config: &BrowserConfig,
    strategies: &[Box<dyn ExpansionStrategy>],
) -> Result<PageContents, IngestError> {
    match page.navigate(url) {
        Ok(()) => {
            sleep(config.navigation_settle);

            let report = expand_all(page, strategies, &config.pacing);
            info!(
                url,
                activated = report.activated,
                activation_failures = report.activation_failures,
                strategies_failed = report.strategies_failed,
                "Expanded collapsible sections"
            );

            sleep(config.final_settle);
        }
        Err(e) => warn!(url, error = %e, "Expansion error, harvesting current DOM"),
    }

    let html = page
        .html()
        .context("Failed to read rendered page")
        .map_err(IngestError::Browser)?;

    let contents = PageContents::harvest(&html);
    debug!(url, fragments = contents.fragment_count(), "Harvested rendered page");
    Ok(contents)
}
