#![forbid(unsafe_code)]

//! ARIA state helpers shared by the formwire behaviors.
//!
//! Every behavior that shows or hides content keeps the visual state and the
//! accessibility attributes in lock-step. The helpers here are the only
//! place those attributes are written, so the pairing rules live in one spot.
//!
//! # Invariants
//!
//! 1. [`apply_visibility`] always writes display state, `aria-expanded`,
//!    `aria-hidden` and `hidden` together; no partial update is observable.
//! 2. [`append_token`] never produces a duplicate token and never drops an
//!    existing one.
//! 3. [`ensure_tabindex`] never overwrites an author-supplied `tabindex`.

use ahash::AHashSet;
use formwire_dom::{Document, NodeId, Result};

/// `aria-live` value used for regions whose content changes in place.
pub const LIVE_POLITE: &str = "polite";

/// How `aria-hidden` is written when an element is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShownHidden {
    /// Remove `aria-hidden` entirely.
    #[default]
    Remove,
    /// Write `aria-hidden="false"`.
    ExplicitFalse,
}

/// Show or hide `node`, updating display state and ARIA attributes together.
///
/// Shown: `aria-expanded="true"`, `aria-hidden` per `shown_hidden`, no
/// `hidden` attribute. Hidden: `aria-expanded="false"`,
/// `aria-hidden="true"`, `hidden` present.
pub fn apply_visibility(
    doc: &mut Document,
    node: NodeId,
    visible: bool,
    shown_hidden: ShownHidden,
) -> Result<()> {
    set_expanded(doc, node, visible)?;
    apply_hidden(doc, node, !visible, shown_hidden)
}

/// Show or hide `node` without touching `aria-expanded`.
///
/// Used for regions controlled by a separate element that carries the
/// expanded state itself.
pub fn apply_hidden(
    doc: &mut Document,
    node: NodeId,
    hidden: bool,
    shown_hidden: ShownHidden,
) -> Result<()> {
    doc.set_displayed(node, !hidden)?;
    if hidden {
        doc.set_attr(node, "aria-hidden", "true")?;
        doc.set_attr(node, "hidden", "")?;
    } else {
        match shown_hidden {
            ShownHidden::Remove => {
                doc.remove_attr(node, "aria-hidden")?;
            }
            ShownHidden::ExplicitFalse => doc.set_attr(node, "aria-hidden", "false")?,
        }
        doc.remove_attr(node, "hidden")?;
    }
    Ok(())
}

/// Write `aria-expanded` on a controlling element.
pub fn set_expanded(doc: &mut Document, node: NodeId, expanded: bool) -> Result<()> {
    doc.set_attr(node, "aria-expanded", if expanded { "true" } else { "false" })
}

/// Append `token` to a space-separated attribute (e.g. `aria-controls`).
///
/// Returns whether the attribute changed. Existing duplicates are left as
/// they are; the new token is only added when absent.
pub fn append_token(doc: &mut Document, node: NodeId, attr: &str, token: &str) -> Result<bool> {
    let token = token.trim();
    if token.is_empty() {
        return Ok(false);
    }
    let current = doc.attr(node, attr).unwrap_or_default().to_owned();
    let existing: AHashSet<&str> = current.split_ascii_whitespace().collect();
    if existing.contains(token) {
        return Ok(false);
    }
    let next = if current.trim().is_empty() {
        token.to_owned()
    } else {
        format!("{} {token}", current.trim_end())
    };
    doc.set_attr(node, attr, &next)?;
    Ok(true)
}

/// Tokens of a space-separated attribute.
#[must_use]
pub fn tokens(doc: &Document, node: NodeId, attr: &str) -> Vec<String> {
    doc.attr(node, attr)
        .map(|v| v.split_ascii_whitespace().map(str::to_owned).collect())
        .unwrap_or_default()
}

/// Set `tabindex` only when the element has none. Returns whether it was set.
pub fn ensure_tabindex(doc: &mut Document, node: NodeId, value: i32) -> Result<bool> {
    if doc.has_attr(node, "tabindex") {
        return Ok(false);
    }
    doc.set_attr(node, "tabindex", &value.to_string())?;
    Ok(true)
}

/// Observed visual and ARIA state of one element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AriaState {
    /// Own display state.
    pub displayed: bool,
    /// `aria-expanded` value, if present.
    pub expanded: Option<String>,
    /// `aria-hidden` value, if present.
    pub aria_hidden: Option<String>,
    /// Whether the `hidden` attribute is present.
    pub hidden_attr: bool,
}

impl AriaState {
    /// Capture the state of `node`.
    #[must_use]
    pub fn capture(doc: &Document, node: NodeId) -> Self {
        Self {
            displayed: doc.is_displayed(node),
            expanded: doc.attr(node, "aria-expanded").map(str::to_owned),
            aria_hidden: doc.attr(node, "aria-hidden").map(str::to_owned),
            hidden_attr: doc.has_attr(node, "hidden"),
        }
    }

    /// Whether the attributes agree with the display state.
    ///
    /// Shown means `aria-expanded="true"` with no `hidden` attribute and an
    /// `aria-hidden` that is absent or `"false"`; hidden is the inverse.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.displayed {
            self.expanded.as_deref() == Some("true")
                && !self.hidden_attr
                && matches!(self.aria_hidden.as_deref(), None | Some("false"))
        } else {
            self.expanded.as_deref() == Some("false")
                && self.hidden_attr
                && self.aria_hidden.as_deref() == Some("true")
        }
    }
}
