#![forbid(unsafe_code)]

//! Conditional reveal.
//!
//! Shows an element while the value of a named input group matches a
//! regular expression, and hides it otherwise. Two markup protocols are
//! recognised:
//!
//! ```html
//! <!-- attribute protocol -->
//! <div id="target_1" data-conditional="plea" data-conditional-value="^guilty$">
//! <!-- legacy protocol -->
//! <div class="js-Conditional" data-conditional-trigger="plea" data-conditional-value="^guilty$">
//! ```
//!
//! An element carrying both is bound once, with the attribute protocol.
//!
//! # Invariants
//!
//! 1. After every evaluation the subject is displayed iff the group value
//!    matches, and `aria-expanded`, `aria-hidden` and `hidden` agree with it.
//! 2. Every member of the trigger group lists the subject id in
//!    `aria-controls` exactly once; tokens already present are kept.
//! 3. Evaluation depends only on the current group value, so repeating it
//!    (for example on a second "render") changes nothing.
//!
//! # Failure Modes
//!
//! | Failure | Effect |
//! |---------|--------|
//! | No trigger name | [`Error::MissingAttribute`], instance not bound |
//! | No `data-conditional-value` | [`Error::MissingAttribute`], instance not bound |
//! | Pattern does not compile | [`Error::InvalidPattern`], instance not bound |
//! | Trigger group empty | Bound; the subject stays hidden |

use std::rc::Rc;

use formwire_a11y::{LIVE_POLITE, ShownHidden, append_token, apply_visibility};
use formwire_dom::{Document, EventKind, NodeId, Selector};
use formwire_runtime::{Behavior, Error, Page, RENDER, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{describe, ensure_id, group};

/// Elements bound by [`Conditional`].
pub const SELECTOR: &str = "[data-conditional], .js-Conditional";

const ATTR_TRIGGER: &str = "data-conditional";
const ATTR_LEGACY_TRIGGER: &str = "data-conditional-trigger";
const ATTR_PATTERN: &str = "data-conditional-value";

/// Which markup protocol declared the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionalProtocol {
    /// `data-conditional` names the trigger. Shown subjects lose
    /// `aria-hidden`; the subject is marked as a polite live region.
    #[default]
    Attribute,
    /// `js-Conditional` class with `data-conditional-trigger`. Shown subjects
    /// carry `aria-hidden="false"`.
    Legacy,
}

impl ConditionalProtocol {
    const fn shown_hidden(self) -> ShownHidden {
        match self {
            Self::Attribute => ShownHidden::Remove,
            Self::Legacy => ShownHidden::ExplicitFalse,
        }
    }
}

/// Configuration of one conditional element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionalConfig {
    /// `name` shared by the trigger inputs.
    pub trigger: String,
    /// Regular expression tested against the group value.
    pub pattern: String,
    /// Declaring protocol.
    #[serde(default)]
    pub protocol: ConditionalProtocol,
}

impl ConditionalConfig {
    /// Read the configuration from the subject's attributes.
    pub fn from_element(doc: &Document, node: NodeId) -> Result<Self> {
        let (protocol, trigger_attr) = if doc.has_attr(node, ATTR_TRIGGER) {
            (ConditionalProtocol::Attribute, ATTR_TRIGGER)
        } else {
            (ConditionalProtocol::Legacy, ATTR_LEGACY_TRIGGER)
        };
        let trigger = doc
            .attr(node, trigger_attr)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_attribute(trigger_attr, describe(doc, node)))?;
        let pattern = doc
            .attr(node, ATTR_PATTERN)
            .ok_or_else(|| Error::missing_attribute(ATTR_PATTERN, describe(doc, node)))?;
        Ok(Self {
            trigger: trigger.to_owned(),
            pattern: pattern.to_owned(),
            protocol,
        })
    }
}

/// One bound conditional element.
#[derive(Debug)]
pub struct ConditionalInstance {
    subject: NodeId,
    members: Vec<NodeId>,
    pattern: Regex,
    protocol: ConditionalProtocol,
}

impl ConditionalInstance {
    /// The element being shown and hidden.
    #[must_use]
    pub const fn subject(&self) -> NodeId {
        self.subject
    }

    /// Trigger inputs captured at bind time.
    #[must_use]
    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    /// Whether the current group value matches the pattern.
    #[must_use]
    pub fn is_satisfied(&self, doc: &Document) -> bool {
        group::group_value(doc, &self.members).is_some_and(|v| self.pattern.is_match(&v))
    }

    /// Apply the current match state to the subject; returns visibility.
    pub fn evaluate(&self, doc: &mut Document) -> Result<bool> {
        let visible = self.is_satisfied(doc);
        apply_visibility(doc, self.subject, visible, self.protocol.shown_hidden())?;
        tracing::trace!(subject = ?self.subject, visible, "conditional evaluated");
        Ok(visible)
    }
}

/// Conditional reveal behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Conditional;

impl Conditional {
    /// Bind `node` with an explicit configuration.
    pub fn bind_with(
        page: &mut Page,
        node: NodeId,
        config: &ConditionalConfig,
    ) -> Result<Rc<ConditionalInstance>> {
        let pattern = Regex::new(&config.pattern).map_err(|source| Error::InvalidPattern {
            pattern: config.pattern.clone(),
            source,
        })?;
        let members = group::named(page.document(), &config.trigger);
        if members.is_empty() {
            tracing::debug!(trigger = %config.trigger, "conditional trigger group is empty");
        }

        let doc = page.document_mut();
        let index = doc
            .index_among(node, &Selector::parse(SELECTOR)?)
            .unwrap_or_default();
        let id = ensure_id(doc, node, "js-conditional", index)?;
        for member in &members {
            append_token(doc, *member, "aria-controls", &id)?;
        }
        if config.protocol == ConditionalProtocol::Attribute {
            doc.set_attr(node, "aria-live", LIVE_POLITE)?;
        }

        let instance = Rc::new(ConditionalInstance {
            subject: node,
            members,
            pattern,
            protocol: config.protocol,
        });
        instance.evaluate(page.document_mut())?;

        for member in instance.members.clone() {
            let inst = Rc::clone(&instance);
            page.on(member, EventKind::Change, move |page, _| {
                inst.evaluate(page.document_mut()).map(drop)
            });
        }
        let inst = Rc::clone(&instance);
        page.subscribe(RENDER, move |page| inst.evaluate(page.document_mut()).map(drop));
        Ok(instance)
    }
}

impl Behavior for Conditional {
    fn name(&self) -> &'static str {
        "conditional"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.select(SELECTOR)?)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let config = ConditionalConfig::from_element(page.document(), node)?;
        Self::bind_with(page, node, &config).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page;
    use formwire_a11y::AriaState;
    use pretty_assertions::assert_eq;

    const ATTRIBUTE_FIXTURE: &str = r#"
        <form>
          <input type="radio" name="trigger_name" id="radio_1" value="true">
          <input type="radio" name="trigger_name" id="radio_2" value="false" aria-controls="test">
          <input type="radio" name="trigger_name" id="radio_3" value="other" aria-controls="target_1">
        </form>
        <div id="target_1" data-conditional="trigger_name" data-conditional-value="^true$">Shown</div>
    "#;

    fn by_id(page: &Page, id: &str) -> NodeId {
        page.document().by_id(id).unwrap()
    }

    #[test]
    fn bind_wires_aria_controls_without_duplicates() {
        let mut page = test_page(ATTRIBUTE_FIXTURE);
        let target = by_id(&page, "target_1");
        Conditional.bind(&mut page, target).unwrap();
        let doc = page.document();
        assert_eq!(doc.attr(by_id(&page, "radio_1"), "aria-controls"), Some("target_1"));
        assert_eq!(
            doc.attr(by_id(&page, "radio_2"), "aria-controls"),
            Some("test target_1")
        );
        assert_eq!(doc.attr(by_id(&page, "radio_3"), "aria-controls"), Some("target_1"));
    }

    #[test]
    fn unmatched_subject_starts_hidden_and_polite() {
        let mut page = test_page(ATTRIBUTE_FIXTURE);
        let target = by_id(&page, "target_1");
        Conditional.bind(&mut page, target).unwrap();
        let doc = page.document();
        assert_eq!(doc.attr(target, "aria-expanded"), Some("false"));
        assert_eq!(doc.attr(target, "aria-live"), Some("polite"));
        assert!(!doc.is_displayed(target));
        assert!(AriaState::capture(doc, target).is_consistent());
    }

    #[test]
    fn clicking_matching_radio_reveals_subject() {
        let mut page = test_page(ATTRIBUTE_FIXTURE);
        let target = by_id(&page, "target_1");
        Conditional.bind(&mut page, target).unwrap();

        page.click(by_id(&page, "radio_1")).unwrap();
        let shown = AriaState::capture(page.document(), target);
        assert!(shown.displayed);
        assert_eq!(shown.expanded.as_deref(), Some("true"));
        assert_eq!(shown.aria_hidden, None);
        assert!(!shown.hidden_attr);

        page.click(by_id(&page, "radio_2")).unwrap();
        let hidden = AriaState::capture(page.document(), target);
        assert!(!hidden.displayed);
        assert_eq!(hidden.aria_hidden.as_deref(), Some("true"));
        assert!(hidden.hidden_attr);
    }

    #[test]
    fn legacy_protocol_writes_explicit_false() {
        let mut page = test_page(
            r#"<select name="court"><option value="a">A</option><option value="b">B</option></select>
               <div class="js-Conditional" data-conditional-trigger="court" data-conditional-value="b">Court B</div>"#,
        );
        let subject = page.document().select(".js-Conditional").unwrap()[0];
        let select = page.document().select("select").unwrap()[0];
        Conditional.bind(&mut page, subject).unwrap();
        assert!(!page.document().is_displayed(subject));

        page.fill(select, "b").unwrap();
        let doc = page.document();
        assert!(doc.is_displayed(subject));
        assert_eq!(doc.attr(subject, "aria-hidden"), Some("false"));
        assert_eq!(doc.attr(subject, "aria-live"), None);
        assert_eq!(doc.id_of(subject), Some("js-conditional-0"));
        assert_eq!(doc.attr(select, "aria-controls"), Some("js-conditional-0"));
    }

    #[test]
    fn both_protocols_on_one_element_bind_once_as_attribute() {
        let page = test_page(
            r#"<input type=checkbox name=c value=yes>
               <div class="js-Conditional" data-conditional="c" data-conditional-trigger="c"
                    data-conditional-value="yes"></div>"#,
        );
        let found = Conditional.discover(page.document()).unwrap();
        assert_eq!(found.len(), 1);
        let config = ConditionalConfig::from_element(page.document(), found[0]).unwrap();
        assert_eq!(config.protocol, ConditionalProtocol::Attribute);
    }

    #[test]
    fn repeated_evaluation_is_idempotent() {
        let mut page = test_page(ATTRIBUTE_FIXTURE);
        let target = by_id(&page, "target_1");
        Conditional.bind(&mut page, target).unwrap();
        page.click(by_id(&page, "radio_1")).unwrap();
        let before = page.document().outer_html(target);
        page.render().unwrap();
        page.render().unwrap();
        assert_eq!(page.document().outer_html(target), before);
        assert!(page.document().is_displayed(target));
    }

    #[test]
    fn missing_pattern_is_an_error() {
        let mut page = test_page(r#"<input name=t><div data-conditional="t"></div>"#);
        let subject = page.document().select("div").unwrap()[0];
        let err = Conditional.bind(&mut page, subject).unwrap_err();
        assert!(matches!(
            err,
            Error::MissingAttribute { attribute: "data-conditional-value", .. }
        ));
    }

    #[test]
    fn bad_pattern_is_reported_before_any_write() {
        let mut page = test_page(
            r#"<input name=t><div data-conditional="t" data-conditional-value="(unclosed"></div>"#,
        );
        let subject = page.document().select("div").unwrap()[0];
        let input = page.document().select("input").unwrap()[0];
        let err = Conditional.bind(&mut page, subject).unwrap_err();
        assert!(matches!(err, Error::InvalidPattern { .. }));
        assert!(!page.document().has_attr(input, "aria-controls"));
        assert_eq!(page.listener_count(input, EventKind::Change), 0);
    }

    #[test]
    fn text_input_pattern_is_unanchored() {
        let mut page = test_page(
            r#"<input name=postcode value=""><div data-conditional="postcode" data-conditional-value="^M\d"></div>"#,
        );
        let subject = page.document().select("div").unwrap()[0];
        let input = page.document().select("input").unwrap()[0];
        let config = ConditionalConfig::from_element(page.document(), subject).unwrap();
        let instance = Conditional::bind_with(&mut page, subject, &config).unwrap();
        assert!(!instance.is_satisfied(page.document()));
        page.fill(input, "M1 2AB").unwrap();
        assert!(instance.is_satisfied(page.document()));
        assert!(page.document().is_displayed(subject));
    }
}
