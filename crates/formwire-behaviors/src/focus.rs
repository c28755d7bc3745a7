#![forbid(unsafe_code)]

//! Focus management.
//!
//! - On load, the first success header or error summary becomes focusable
//!   (`tabindex="0"` unless set) and takes focus.
//! - `#content` becomes programmatically focusable (`tabindex="-1"` unless
//!   set) and skip links move focus to it.
//! - Clicking an error-summary link to `#section_*` focuses the first field
//!   of that section after a short delay, once the browser has scrolled.

use std::time::Duration;

use formwire_a11y::ensure_tabindex;
use formwire_dom::{Document, EventKind, NodeId, Selector};
use formwire_runtime::{Behavior, DEFAULT_FOCUS_DELAY_MS, Page, Result, RuntimeConfig};
use serde::{Deserialize, Serialize};

/// Elements that take focus when the page loads.
pub const ALERT_SELECTOR: &str = ".success-header, .error-summary";

/// Links from the error summary to form sections.
pub const SECTION_LINK_SELECTOR: &str = r##".error-summary [href^="#section_"]"##;

/// Fields eligible for focus inside a section.
pub const FIELD_SELECTOR: &str = "input, textarea, select";

/// Id of the main content region.
pub const CONTENT_ID: &str = "content";

/// Focus settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    /// Delay before focusing a section's first field.
    pub delay_ms: u64,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_FOCUS_DELAY_MS,
        }
    }
}

impl FocusConfig {
    /// Focus settings carried by the runtime configuration.
    #[must_use]
    pub const fn from_runtime(config: &RuntimeConfig) -> Self {
        Self {
            delay_ms: config.focus_delay_ms,
        }
    }

    /// Delay as a duration.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

/// First focusable field inside the element with id `section`.
#[must_use]
pub fn section_field(doc: &Document, section: &str) -> Option<NodeId> {
    let section = doc.by_id(section)?;
    let fields = Selector::parse(FIELD_SELECTOR).ok()?;
    doc.query_first_within(section, &fields)
}

/// Focus management behavior; one instance per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct FocusHandler {
    config: FocusConfig,
}

impl FocusHandler {
    /// Handler with explicit settings.
    #[must_use]
    pub const fn new(config: FocusConfig) -> Self {
        Self { config }
    }

    /// Bind the page-level handler.
    pub fn bind_with(page: &mut Page, config: FocusConfig) -> Result<()> {
        let alert = page
            .document()
            .query_first(&Selector::parse(ALERT_SELECTOR)?);
        if let Some(alert) = alert {
            ensure_tabindex(page.document_mut(), alert, 0)?;
            page.focus(alert)?;
        }

        if let Some(content) = page.document().by_id(CONTENT_ID) {
            ensure_tabindex(page.document_mut(), content, -1)?;
            for link in page.document().select(".skiplink")? {
                page.on(link, EventKind::Click, move |page, _| page.focus(content));
            }
        }

        let delay = config.delay();
        for link in page
            .document()
            .query_all(&Selector::parse(SECTION_LINK_SELECTOR)?)
        {
            page.on(link, EventKind::Click, move |page, _| {
                let section = page
                    .document()
                    .attr(link, "href")
                    .and_then(|href| href.strip_prefix('#'))
                    .map(str::to_owned);
                let Some(field) = section.and_then(|s| section_field(page.document(), &s)) else {
                    return Ok(());
                };
                page.set_timeout(delay, move |page| page.focus(field));
                Ok(())
            });
        }
        Ok(())
    }
}

impl Behavior for FocusHandler {
    fn name(&self) -> &'static str {
        "focus"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(vec![doc.root()])
    }

    fn bind(&self, page: &mut Page, _node: NodeId) -> Result<()> {
        Self::bind_with(page, self.config)
    }
}
