#![forbid(unsafe_code)]

//! Form behaviors for formwire pages.
//!
//! Each behavior is a [`formwire_runtime::Behavior`]: it discovers the
//! elements it applies to by selector and binds one instance per element.
//! Instances subscribe to the shared render topic so a single
//! `page.render()` brings every derived state (visibility, text, totals,
//! selection) back in line with the form.
//!
//! | Behavior | Selector | Module |
//! |----------|----------|--------|
//! | `conditional` | `[data-conditional], .js-Conditional` | [`conditional`] |
//! | `templated` | `.js-TemplatedElement` | [`templated`] |
//! | `details` | `.js-Details` | [`details`] |
//! | `selection` | `label input[type=radio\|checkbox]` | [`selection`] |
//! | `totals` | `.js-CalculateTotals` | [`totals`] |
//! | `unsaved-changes` | page | [`guard`] |
//! | `focus` | page | [`focus`] |
//! | `external-links` | `a[rel=external]` | [`external_links`] |
//! | `button-keys` | page (delegated) | [`button_keys`] |
//! | `nojs-cleanup` | `.nojs-only[name=split_form]` | [`nojs`] |
//!
//! [`default_registry`] registers all of them.

pub mod button_keys;
pub mod conditional;
pub mod config;
pub mod details;
pub mod external_links;
pub mod focus;
pub mod group;
pub mod guard;
pub mod nojs;
pub mod selection;
pub mod templated;
pub mod totals;

pub use button_keys::ButtonKeys;
pub use conditional::{Conditional, ConditionalConfig, ConditionalInstance, ConditionalProtocol};
pub use config::{BEHAVIOR_NAMES, BehaviorConfig, default_registry};
pub use details::{Details, DetailsConfig, DetailsInstance};
pub use external_links::{ExternalLinks, ExternalLinksConfig};
pub use focus::{FocusConfig, FocusHandler};
pub use guard::{DeadlineSource, GuardConfig, GuardInstance, UnsavedChangesGuard};
pub use nojs::NoJsCleanup;
pub use selection::SelectionButtons;
pub use templated::{Template, Templated, TemplatedConfig, TemplatedInstance};
pub use totals::{Totals, TotalsConfig, TotalsInstance};

use formwire_dom::{Document, NodeId};
use formwire_runtime::Result;

/// Short element description for errors and logs: `tag#id` or `tag`.
pub(crate) fn describe(doc: &Document, node: NodeId) -> String {
    let tag = doc.tag_name(node).unwrap_or("#node");
    match doc.id_of(node).filter(|id| !id.is_empty()) {
        Some(id) => format!("{tag}#{id}"),
        None => tag.to_owned(),
    }
}

/// Id of `node`, assigning `{prefix}-{index}` (bumped past collisions) when
/// it has none.
pub(crate) fn ensure_id(
    doc: &mut Document,
    node: NodeId,
    prefix: &str,
    index: usize,
) -> Result<String> {
    if let Some(id) = doc.id_of(node).filter(|id| !id.is_empty()) {
        return Ok(id.to_owned());
    }
    let mut n = index;
    let mut candidate = format!("{prefix}-{n}");
    while doc.by_id(&candidate).is_some_and(|other| other != node) {
        n += 1;
        candidate = format!("{prefix}-{n}");
    }
    doc.set_attr(node, "id", &candidate)?;
    Ok(candidate)
}

#[cfg(test)]
pub(crate) fn test_page(html: &str) -> formwire_runtime::Page {
    use formwire_runtime::{ManualClock, Page, PageEnvironment};
    use std::rc::Rc;

    Page::new(
        Document::parse(html).unwrap(),
        PageEnvironment::new(),
        Rc::new(ManualClock::at_unix(0)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn existing_id_is_kept() {
        let mut doc = Document::parse(r#"<div id="keep"></div>"#).unwrap();
        let div = doc.by_id("keep").unwrap();
        assert_eq!(ensure_id(&mut doc, div, "js-x", 0).unwrap(), "keep");
    }

    #[test]
    fn generated_id_skips_taken_ones() {
        let mut doc = Document::parse(r#"<p id="js-x-0"></p><p class="t"></p>"#).unwrap();
        let target = doc.select(".t").unwrap()[0];
        assert_eq!(ensure_id(&mut doc, target, "js-x", 0).unwrap(), "js-x-1");
        assert_eq!(doc.by_id("js-x-1"), Some(target));
        assert_eq!(describe(&doc, target), "p#js-x-1");
    }
}
