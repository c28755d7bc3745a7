#![forbid(unsafe_code)]

//! Disclosure widget.
//!
//! Turns a container into an accessible open/closed toggle:
//!
//! ```html
//! <div class="js-Details" data-summary-open="Hide details">
//!   <a class="details-trigger" href="#details-content"><span class="summary">View details</span></a>
//!   <div class="details-content" id="details-content">Content</div>
//! </div>
//! ```
//!
//! The `open` class on the container is the source of truth. Binding
//! prepends an arrow icon to the trigger, gives it `role="button"` and
//! `aria-controls`, and marks the content as a polite live region.
//!
//! # Invariants
//!
//! 1. After every update: open iff trigger `aria-expanded="true"` iff the
//!    content is displayed without `aria-hidden` or `hidden`.
//! 2. With `data-summary-open`, the summary shows that text while open and
//!    the bind-time text while closed; without it the summary is untouched.
//! 3. Toggling twice restores the bind-time state exactly.

use std::rc::Rc;

use formwire_a11y::{LIVE_POLITE, ShownHidden, apply_hidden, set_expanded};
use formwire_dom::{Document, EventKind, Key, NodeId, Selector};
use formwire_runtime::{Behavior, Engine, Page, RENDER, Result};
use serde::{Deserialize, Serialize};

use crate::ensure_id;

/// Elements bound by [`Details`].
pub const SELECTOR: &str = ".js-Details";

/// Class marking the open state on the container.
pub const OPEN_CLASS: &str = "open";

const ARROW_CLOSED: &str = "\u{25ba}";
const ARROW_OPEN: &str = "\u{25bc}";

/// Configuration of one disclosure widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailsConfig {
    /// Summary text shown while open.
    #[serde(default)]
    pub open_text: Option<String>,
}

impl DetailsConfig {
    /// Read `data-summary-open` from the container.
    #[must_use]
    pub fn from_element(doc: &Document, node: NodeId) -> Self {
        Self {
            open_text: doc
                .attr(node, "data-summary-open")
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
        }
    }
}

/// One bound disclosure widget.
#[derive(Debug)]
pub struct DetailsInstance {
    container: NodeId,
    triggers: Vec<NodeId>,
    icons: Vec<NodeId>,
    summary_text: Option<NodeId>,
    content: NodeId,
    open_text: Option<String>,
    closed_text: String,
}

impl DetailsInstance {
    /// The `.js-Details` container.
    #[must_use]
    pub const fn container(&self) -> NodeId {
        self.container
    }

    /// The controlled content region.
    #[must_use]
    pub const fn content(&self) -> NodeId {
        self.content
    }

    /// Whether the container is open.
    #[must_use]
    pub fn is_open(&self, doc: &Document) -> bool {
        doc.has_class(self.container, OPEN_CLASS)
    }

    /// Flip the open class and update the page.
    pub fn toggle(&self, doc: &mut Document) -> Result<bool> {
        doc.toggle_class(self.container, OPEN_CLASS)?;
        self.update_state(doc)?;
        Ok(self.is_open(doc))
    }

    /// Project the open class onto the trigger, content, icon and summary.
    pub fn update_state(&self, doc: &mut Document) -> Result<()> {
        let open = self.is_open(doc);
        for trigger in &self.triggers {
            set_expanded(doc, *trigger, open)?;
        }
        apply_hidden(doc, self.content, !open, ShownHidden::Remove)?;
        let (from, to, arrow) = if open {
            ("arrow-closed", "arrow-open", ARROW_OPEN)
        } else {
            ("arrow-open", "arrow-closed", ARROW_CLOSED)
        };
        for icon in &self.icons {
            doc.remove_class(*icon, from)?;
            doc.add_class(*icon, to)?;
            doc.set_text_content(*icon, arrow)?;
        }
        if let (Some(open_text), Some(summary)) = (&self.open_text, self.summary_text) {
            let text = if open { open_text } else { &self.closed_text };
            doc.set_text_content(summary, text)?;
        }
        Ok(())
    }
}

/// Disclosure widget behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Details;

impl Details {
    /// Bind `node` with an explicit configuration.
    ///
    /// Returns `None` when the container has no `.details-trigger` or no
    /// `.details-content`.
    pub fn bind_with(
        page: &mut Page,
        node: NodeId,
        config: &DetailsConfig,
    ) -> Result<Option<Rc<DetailsInstance>>> {
        let doc = page.document_mut();
        let triggers = doc.query_all_within(node, &Selector::parse(".details-trigger")?);
        let content = doc.query_first_within(node, &Selector::parse(".details-content")?);
        let Some(content) = content.filter(|_| !triggers.is_empty()) else {
            tracing::debug!(container = ?node, "details markup incomplete");
            return Ok(None);
        };

        let mut icons = Vec::with_capacity(triggers.len());
        for trigger in &triggers {
            let icon = doc.insert_element(
                *trigger,
                0,
                "i",
                vec![("class".to_owned(), "arrow arrow-closed".to_owned())],
            )?;
            doc.create_text(icon, ARROW_CLOSED)?;
            icons.push(icon);
        }

        let index = doc
            .index_among(node, &Selector::parse(SELECTOR)?)
            .unwrap_or_default();
        let id = ensure_id(doc, content, "js-details", index)?;
        for trigger in &triggers {
            doc.set_attr(*trigger, "role", "button")?;
            doc.set_attr(*trigger, "aria-controls", &id)?;
            doc.set_attr(*trigger, "aria-expanded", "false")?;
        }
        doc.set_attr(content, "aria-hidden", "true")?;
        doc.set_attr(content, "aria-live", LIVE_POLITE)?;

        let summary_text = doc.query_first_within(triggers[0], &Selector::parse(".summary")?);
        let closed_text = summary_text.map(|s| doc.text_content(s)).unwrap_or_default();
        let instance = Rc::new(DetailsInstance {
            container: node,
            triggers,
            icons,
            summary_text,
            content,
            open_text: config.open_text.clone(),
            closed_text,
        });
        instance.update_state(page.document_mut())?;

        for trigger in instance.triggers.clone() {
            let inst = Rc::clone(&instance);
            page.on(trigger, EventKind::Click, move |page, event| {
                event.prevent_default();
                let open = inst.toggle(page.document_mut())?;
                tracing::debug!(container = ?inst.container, open, "details toggled");
                Ok(())
            });
            page.on(trigger, EventKind::KeyDown, move |page, event| {
                let activates = match event.key {
                    Some(Key::Space) => true,
                    Some(Key::Enter) => page.env().engine() != Engine::Presto,
                    _ => false,
                };
                if activates {
                    event.prevent_default();
                    page.click(trigger)?;
                }
                Ok(())
            });
        }
        let inst = Rc::clone(&instance);
        page.subscribe(RENDER, move |page| inst.update_state(page.document_mut()));
        Ok(Some(instance))
    }
}

impl Behavior for Details {
    fn name(&self) -> &'static str {
        "details"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.select(SELECTOR)?)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let config = DetailsConfig::from_element(page.document(), node);
        Self::bind_with(page, node, &config).map(drop)
    }
}
