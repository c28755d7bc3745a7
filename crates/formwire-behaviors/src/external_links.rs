#![forbid(unsafe_code)]

//! External link tracking.
//!
//! Clicks on `a[rel=external]` are held back, reported to the page's
//! analytics sink, then followed: a `target` other than `_self`, `_parent`
//! or `_top` opens a new window, anything else navigates in place.
//!
//! The reported event carries the category (`External links` unless the
//! link sets `data-event-category`), the href, and the page action (the
//! location path unless the link sets `data-event-action`) as its label.
//!
//! Without an analytics sink nothing is bound and links behave natively.

use formwire_dom::{Document, EventKind, NodeId};
use formwire_runtime::{AnalyticsEvent, Behavior, Navigation, Page, Result};
use serde::{Deserialize, Serialize};

/// Links bound by [`ExternalLinks`].
pub const SELECTOR: &str = "a[rel=external]";

/// Category reported when a link does not override it.
pub const DEFAULT_CATEGORY: &str = "External links";

/// Reporting settings; `None` fields fall back to page defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalLinksConfig {
    /// Event category.
    pub category: Option<String>,
    /// Page action, sent as the event label.
    pub action: Option<String>,
}

impl ExternalLinksConfig {
    /// Read `data-event-category` and `data-event-action` from a link.
    #[must_use]
    pub fn from_element(doc: &Document, node: NodeId) -> Self {
        let attr = |name: &str| {
            doc.attr(node, name)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Self {
            category: attr("data-event-category"),
            action: attr("data-event-action"),
        }
    }
}

/// Whether `target` keeps the navigation in the current browsing context.
#[must_use]
pub fn is_same_context(target: Option<&str>) -> bool {
    match target {
        None | Some("") => true,
        Some(t) => ["_self", "_parent", "_top"]
            .iter()
            .any(|k| t.eq_ignore_ascii_case(k)),
    }
}

/// External link tracking behavior; one instance per link.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExternalLinks;

impl ExternalLinks {
    /// Bind `node` with explicit settings. Returns whether anything was bound.
    pub fn bind_with(page: &mut Page, node: NodeId, config: &ExternalLinksConfig) -> bool {
        if page.env().analytics().is_none() {
            tracing::debug!(link = ?node, "no analytics sink, external link left native");
            return false;
        }
        let category = config
            .category
            .clone()
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());
        let action = config
            .action
            .clone()
            .unwrap_or_else(|| page.env().location_path().to_owned());
        page.on(node, EventKind::Click, move |page, event| {
            event.prevent_default();
            let doc = page.document();
            let href = doc.attr(node, "href").unwrap_or_default().to_owned();
            let target = doc.attr(node, "target").map(str::to_owned);
            if let Some(sink) = page.env().analytics() {
                sink.send(AnalyticsEvent {
                    category: category.clone(),
                    action: href.clone(),
                    label: action.clone(),
                });
            }
            let navigation = match target {
                Some(target) if !is_same_context(Some(&target)) => Navigation::Open { url: href, target },
                _ => Navigation::Assign(href),
            };
            page.navigate(navigation);
            Ok(())
        });
        true
    }
}

impl Behavior for ExternalLinks {
    fn name(&self) -> &'static str {
        "external-links"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.select(SELECTOR)?)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let config = ExternalLinksConfig::from_element(page.document(), node);
        Self::bind_with(page, node, &config);
        Ok(())
    }
}
