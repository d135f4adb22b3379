//! Ways of finding and opening collapsed UI before a page is harvested.

use std::thread::sleep;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, warn};

use crate::browser::{NodeHandle, PageDriver};

const SCROLL_INTO_VIEW: &str = "function() { this.scrollIntoView(true); }";
const CLICK: &str = "function() { this.click(); }";

/// Pauses between the steps of a single activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    pub after_scroll: Duration,
    pub after_click: Duration,
}

impl Pacing {
    pub fn none() -> Self {
        Self {
            after_scroll: Duration::ZERO,
            after_click: Duration::ZERO,
        }
    }
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            after_scroll: Duration::from_millis(500),
            after_click: Duration::from_secs(1),
        }
    }
}

/// A heuristic for collapsed sections: find candidates, then open them one
/// at a time.
pub trait ExpansionStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn candidates(&self, page: &dyn PageDriver) -> Result<Vec<NodeHandle>>;

    fn activate(&self, page: &dyn PageDriver, node: NodeHandle, pacing: &Pacing) -> Result<()>;
}

/// Elements matched by an XPath expression, opened with a scripted click.
#[derive(Debug, Clone)]
pub struct XPathToggle {
    name: String,
    xpath: String,
}

impl XPathToggle {
    pub fn new(name: impl Into<String>, xpath: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            xpath: xpath.into(),
        }
    }
}

impl ExpansionStrategy for XPathToggle {
    fn name(&self) -> &str {
        &self.name
    }

    fn candidates(&self, page: &dyn PageDriver) -> Result<Vec<NodeHandle>> {
        page.find_by_xpath(&self.xpath)
    }

    fn activate(&self, page: &dyn PageDriver, node: NodeHandle, pacing: &Pacing) -> Result<()> {
        page.call_function_on(node, SCROLL_INTO_VIEW)?;
        sleep(pacing.after_scroll);

        page.call_function_on(node, CLICK)?;
        sleep(pacing.after_click);

        Ok(())
    }
}

/// Bootstrap data-toggle links, collapsed/angle-icon links, ARIA collapsed
/// links and accordion buttons.
pub fn default_strategies() -> Vec<Box<dyn ExpansionStrategy>> {
    vec![
        Box::new(XPathToggle::new("data-toggle", "//a[@data-toggle='collapse']")),
        Box::new(XPathToggle::new("collapsed-class", "//a[contains(@class, 'collapsed')]")),
        Box::new(XPathToggle::new("angle-icon", "//a[contains(@class, 'icon-angle-right')]")),
        Box::new(XPathToggle::new("aria-expanded", "//a[@aria-expanded='false']")),
        Box::new(XPathToggle::new("accordion-button", "//button[contains(@class, 'accordion-button')]")),
    ]
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionReport {
    pub strategies_run: usize,
    pub strategies_failed: usize,
    pub activated: usize,
    pub activation_failures: usize,
}

/// Run every strategy in order. A strategy that cannot locate anything, or
/// an element that refuses to open, is logged and skipped.
pub fn expand_all(
    page: &dyn PageDriver,
    strategies: &[Box<dyn ExpansionStrategy>],
    pacing: &Pacing,
) -> ExpansionReport {
    let mut report = ExpansionReport::default();

    for strategy in strategies {
        report.strategies_run += 1;

        let nodes = match strategy.candidates(page) {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Strategy failed");
                report.strategies_failed += 1;
                continue;
            }
        };

        debug!(strategy = strategy.name(), candidates = nodes.len(), "Expanding");

        for node in nodes {
            match strategy.activate(page, node, pacing) {
                Ok(()) => report.activated += 1,
                Err(e) => {
                    warn!(strategy = strategy.name(), node = node.0, error = %e, "Click error");
                    report.activation_failures += 1;
                }
            }
        }
    }

    report
}
