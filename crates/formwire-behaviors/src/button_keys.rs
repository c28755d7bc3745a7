#![forbid(unsafe_code)]

//! Space activates links that present themselves as buttons.
//!
//! Browsers activate links on Enter only. A delegated window listener turns
//! Space on any `a[role=button]` (including ones added after load) into a
//! click and suppresses the page scroll.

use formwire_dom::{Document, EventKind, Key, NodeId, Selector};
use formwire_runtime::{Behavior, Page, Result};

/// Elements whose Space key press becomes a click.
pub const SELECTOR: &str = "a[role=button]";

/// Button-role keyboard activation; one delegated instance per page.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonKeys;

impl Behavior for ButtonKeys {
    fn name(&self) -> &'static str {
        "button-keys"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(vec![doc.root()])
    }

    fn bind(&self, page: &mut Page, _node: NodeId) -> Result<()> {
        let selector = Selector::parse(SELECTOR)?;
        page.on_window(EventKind::KeyDown, move |page, event| {
            let Some(target) = event.target else {
                return Ok(());
            };
            if event.key != Some(Key::Space)
                || event.default_prevented()
                || !page.document().matches(target, &selector)
            {
                return Ok(());
            }
            event.prevent_default();
            page.click(target)?;
            Ok(())
        });
        Ok(())
    }
}
