#![forbid(unsafe_code)]

//! Templated text.
//!
//! Rewrites an element's text from the checked radio of a named group:
//!
//! ```html
//! <div class="js-TemplatedElement"
//!      data-template-trigger="plea"
//!      data-template="You are pleading {value}"
//!      data-template-defaults-for="not sure">Choose a plea</div>
//! ```
//!
//! With a [`Template::Placeholder`] the selection's display value (its
//! `data-template-value`, else the text of its enclosing label, else its
//! `value`) is trimmed, compared with `data-template-defaults-for`,
//! lowercased, and substituted for the first `{value}`. With a
//! [`Template::Lookup`] (`data-templates='{"guilty": "..."}'`) the raw radio
//! value selects a whole replacement text.
//!
//! `data-template-delegate` moves the output to the first element matching
//! that selector.
//!
//! # Invariants
//!
//! 1. The original text is read from the output element when the instance
//!    binds; instances only write on `change` or "render", so every
//!    instance sharing an output element sees the same original text.
//! 2. No selection, an empty display value, the defaults-for value or an
//!    unmapped lookup key all restore the original text exactly.
//! 3. Only the first `{value}` token is substituted.

use std::collections::BTreeMap;
use std::rc::Rc;

use formwire_dom::{Document, EventKind, NodeId, Selector};
use formwire_runtime::{Behavior, Error, Page, RENDER, Result};
use serde::{Deserialize, Serialize};

use crate::{describe, group};

/// Elements bound by [`Templated`].
pub const SELECTOR: &str = ".js-TemplatedElement";

/// Token replaced by the selection's display value.
pub const PLACEHOLDER: &str = "{value}";

/// How the output text is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Text with a `{value}` token.
    Placeholder(String),
    /// Replacement text per raw radio value.
    Lookup(BTreeMap<String, String>),
}

impl Default for Template {
    fn default() -> Self {
        Self::Placeholder(PLACEHOLDER.to_owned())
    }
}

/// Configuration of one templated element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatedConfig {
    /// `name` of the trigger radios.
    pub trigger: String,
    /// Output template.
    #[serde(default)]
    pub template: Template,
    /// Display value that restores the original text.
    #[serde(default)]
    pub defaults_for: Option<String>,
    /// Selector of the element that receives the text.
    #[serde(default)]
    pub delegate: Option<String>,
}

impl TemplatedConfig {
    /// Read the configuration from the subject's attributes.
    pub fn from_element(doc: &Document, node: NodeId) -> Result<Self> {
        let trigger = doc
            .attr(node, "data-template-trigger")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::missing_attribute("data-template-trigger", describe(doc, node)))?;
        let template = match doc.attr(node, "data-templates") {
            Some(raw) => Template::Lookup(serde_json::from_str(raw).map_err(|err| {
                Error::invalid_attribute("data-templates", raw, err.to_string())
            })?),
            None => Template::Placeholder(
                doc.attr(node, "data-template")
                    .filter(|t| !t.is_empty())
                    .unwrap_or(PLACEHOLDER)
                    .to_owned(),
            ),
        };
        let non_empty = |name: &str| {
            doc.attr(node, name)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
        };
        Ok(Self {
            trigger: trigger.to_owned(),
            template,
            defaults_for: non_empty("data-template-defaults-for"),
            delegate: non_empty("data-template-delegate"),
        })
    }
}

/// Substitute `value` for the first [`PLACEHOLDER`] in `template`.
#[must_use]
pub fn populate(template: &str, value: &str) -> String {
    template.replacen(PLACEHOLDER, value, 1)
}

/// One bound templated element.
#[derive(Debug)]
pub struct TemplatedInstance {
    target: NodeId,
    original_text: String,
    members: Vec<NodeId>,
    template: Template,
    defaults_for: Option<String>,
}

impl TemplatedInstance {
    /// Element receiving the text.
    #[must_use]
    pub const fn target(&self) -> NodeId {
        self.target
    }

    /// Text the target had when the instance bound.
    #[must_use]
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Display value of the checked radio: its `data-template-value`, the
    /// text of a parent label, or its value, trimmed.
    fn display_value(&self, doc: &Document) -> Option<String> {
        let checked = group::checked_member(doc, &self.members)?;
        let label_text = || {
            doc.parent_element(checked)
                .filter(|p| doc.tag_name(*p) == Some("label"))
                .map(|label| doc.text_content(label))
                .filter(|text| !text.trim().is_empty())
        };
        let value = doc
            .attr(checked, "data-template-value")
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .or_else(label_text)
            .or_else(|| doc.value(checked))?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_owned())
    }

    /// Text the target should show now.
    #[must_use]
    pub fn current_text(&self, doc: &Document) -> String {
        match &self.template {
            Template::Placeholder(template) => match self.display_value(doc) {
                Some(value) if self.defaults_for.as_deref() != Some(value.as_str()) => {
                    populate(template, &value.to_lowercase())
                }
                _ => self.original_text.clone(),
            },
            Template::Lookup(templates) => group::checked_member(doc, &self.members)
                .and_then(|n| doc.value(n))
                .and_then(|v| templates.get(&v).cloned())
                .unwrap_or_else(|| self.original_text.clone()),
        }
    }

    /// Write [`Self::current_text`] into the target when it differs.
    pub fn update(&self, doc: &mut Document) -> Result<()> {
        let text = self.current_text(doc);
        if doc.text_content(self.target) != text {
            doc.set_text_content(self.target, &text)?;
        }
        Ok(())
    }
}

/// Templated text behavior.
#[derive(Debug, Clone, Copy, Default)]
pub struct Templated;

impl Templated {
    /// Bind `node` with an explicit configuration.
    ///
    /// Returns `None` when the delegate selector matches nothing.
    pub fn bind_with(
        page: &mut Page,
        node: NodeId,
        config: &TemplatedConfig,
    ) -> Result<Option<Rc<TemplatedInstance>>> {
        let doc = page.document();
        let target = match &config.delegate {
            Some(selector) => {
                let selector = Selector::parse(selector)?;
                let Some(target) = doc.query_first(&selector) else {
                    tracing::debug!(delegate = %selector, "template delegate not found");
                    return Ok(None);
                };
                target
            }
            None => node,
        };
        let instance = Rc::new(TemplatedInstance {
            target,
            original_text: doc.text_content(target),
            members: group::radios(doc, &config.trigger),
            template: config.template.clone(),
            defaults_for: config.defaults_for.clone(),
        });

        for member in instance.members.clone() {
            let inst = Rc::clone(&instance);
            page.on(member, EventKind::Change, move |page, _| {
                inst.update(page.document_mut())
            });
        }
        let inst = Rc::clone(&instance);
        page.subscribe(RENDER, move |page| inst.update(page.document_mut()));
        Ok(Some(instance))
    }
}

impl Behavior for Templated {
    fn name(&self) -> &'static str {
        "templated"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.select(SELECTOR)?)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let config = TemplatedConfig::from_element(page.document(), node)?;
        Self::bind_with(page, node, &config).map(drop)
    }
}
