#![forbid(unsafe_code)]

//! Arena-backed element tree with form-control state.
//!
//! A [`Document`] owns every node it ever created. Nodes are addressed by
//! [`NodeId`], which stays valid for the lifetime of the document; detached
//! nodes simply stop being reachable from the root.
//!
//! # Form state
//!
//! Controls carry *properties* separate from their attributes, mirroring the
//! browser split between `value`/`checked` and the `value=`/`checked`
//! markup. A property is derived from the markup until it is first written,
//! after which the written value wins.
//!
//! # Invariants
//!
//! 1. Document order is depth-first pre-order from the root.
//! 2. Tag and attribute names are stored lower-case.
//! 3. A node has at most one parent and appears once in that parent's
//!    child list.

use std::fmt::Write as _;

use crate::error::{DomError, Result};
use crate::selector::Selector;

/// Handle to a node of a [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position of the node in the document arena.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Form control classification used by value extraction and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `<input type=radio>`.
    Radio,
    /// `<input type=checkbox>`.
    Checkbox,
    /// Any free-text `<input>` (text, email, number, password, ...).
    Text,
    /// `<input type=hidden>`.
    Hidden,
    /// Submit, reset, image and plain buttons.
    Button,
    /// `<input type=file>`.
    File,
    /// `<textarea>`.
    TextArea,
    /// `<select>`.
    Select,
}

impl ControlKind {
    /// Whether the control is checkable (radio or checkbox).
    #[must_use]
    pub const fn is_checkable(self) -> bool {
        matches!(self, Self::Radio | Self::Checkbox)
    }
}

/// Element payload: tag, ordered attributes and mutable properties.
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    value: Option<String>,
    checked: Option<bool>,
    selected: Option<bool>,
    displayed: Option<bool>,
}

impl Element {
    fn new(tag: &str, attrs: Vec<(String, String)>) -> Self {
        let mut normalized: Vec<(String, String)> = Vec::with_capacity(attrs.len());
        for (name, value) in attrs {
            let name = name.to_ascii_lowercase();
            if !normalized.iter().any(|(existing, _)| *existing == name) {
                normalized.push((name, value));
            }
        }
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: normalized,
            value: None,
            checked: None,
            selected: None,
            displayed: None,
        }
    }

    /// Lower-case tag name.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Attribute value by (case-insensitive) name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Attributes in source order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Whether the whitespace-separated `class` list contains `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|list| list.split_ascii_whitespace().any(|c| c == class))
    }

    fn set_attr(&mut self, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        match self.attrs.iter_mut().find(|(key, _)| *key == name) {
            Some((_, existing)) => {
                existing.clear();
                existing.push_str(value);
            }
            None => self.attrs.push((name, value.to_owned())),
        }
    }

    fn remove_attr(&mut self, name: &str) -> bool {
        let before = self.attrs.len();
        self.attrs.retain(|(key, _)| !key.eq_ignore_ascii_case(name));
        before != self.attrs.len()
    }

    /// Control classification, `None` for non-controls.
    #[must_use]
    pub fn control_kind(&self) -> Option<ControlKind> {
        match self.tag.as_str() {
            "textarea" => Some(ControlKind::TextArea),
            "select" => Some(ControlKind::Select),
            "button" => Some(ControlKind::Button),
            "input" => {
                let ty = self.attr("type").unwrap_or("text").to_ascii_lowercase();
                Some(match ty.as_str() {
                    "radio" => ControlKind::Radio,
                    "checkbox" => ControlKind::Checkbox,
                    "hidden" => ControlKind::Hidden,
                    "submit" | "reset" | "button" | "image" => ControlKind::Button,
                    "file" => ControlKind::File,
                    _ => ControlKind::Text,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
enum NodeKind {
    Root,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// Elements that never have children.
const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Elements whose text is serialized without escaping.
const RAW_TEXT_TAGS: &[&str] = &["script", "style"];

/// In-memory document.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
    active: Option<NodeId>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document containing only the root.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Root,
            }],
            root: NodeId(0),
            active: None,
        }
    }

    /// The document root. It is not an element and matches no selector.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    fn node(&self, id: NodeId) -> Result<&Node> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode(id))
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode(id))
    }

    /// Element payload for `id`, `None` for text nodes, the root or unknown ids.
    #[must_use]
    pub fn element(&self, id: NodeId) -> Option<&Element> {
        match self.nodes.get(id.0).map(|n| &n.kind) {
            Some(NodeKind::Element(el)) => Some(el),
            _ => None,
        }
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut Element> {
        match &mut self.node_mut(id)?.kind {
            NodeKind::Element(el) => Ok(el),
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    /// Whether `id` is an element.
    #[must_use]
    pub fn is_element(&self, id: NodeId) -> bool {
        self.element(id).is_some()
    }

    // ---------------------------------------------------------------------
    // Tree construction
    // ---------------------------------------------------------------------

    /// Append a new element as the last child of `parent`.
    pub fn create_element(
        &mut self,
        parent: NodeId,
        tag: &str,
        attrs: Vec<(String, String)>,
    ) -> Result<NodeId> {
        let at = self.node(parent)?.children.len();
        self.insert_element(parent, at, tag, attrs)
    }

    /// Insert a new element at child position `index` of `parent`.
    ///
    /// `index` is clamped to the child count.
    pub fn insert_element(
        &mut self,
        parent: NodeId,
        index: usize,
        tag: &str,
        attrs: Vec<(String, String)>,
    ) -> Result<NodeId> {
        self.ensure_container(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind: NodeKind::Element(Element::new(tag, attrs)),
        });
        let children = &mut self.node_mut(parent)?.children;
        let index = index.min(children.len());
        children.insert(index, id);
        Ok(id)
    }

    /// Append a text node to `parent`.
    pub fn create_text(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.ensure_container(parent)?;
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            kind: NodeKind::Text(text.to_owned()),
        });
        self.node_mut(parent)?.children.push(id);
        Ok(id)
    }

    fn ensure_container(&self, parent: NodeId) -> Result<()> {
        match &self.node(parent)?.kind {
            NodeKind::Root => Ok(()),
            NodeKind::Element(el) if !VOID_TAGS.contains(&el.tag.as_str()) => Ok(()),
            _ => Err(DomError::NotAnElement(parent)),
        }
    }

    /// Remove `id` (and its subtree) from its parent.
    ///
    /// Detaching the active element clears focus.
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.node_mut(parent)?.children.retain(|child| *child != id);
            self.node_mut(id)?.parent = None;
        }
        if let Some(active) = self.active
            && (active == id || self.is_descendant_of(active, id))
        {
            self.active = None;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Navigation
    // ---------------------------------------------------------------------

    /// Parent node, `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    /// Parent if it is an element.
    #[must_use]
    pub fn parent_element(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).filter(|p| self.is_element(*p))
    }

    /// Child nodes (elements and text) in order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0)
            .map_or(&[][..], |n| n.children.as_slice())
    }

    /// Element children in order.
    #[must_use]
    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|c| self.is_element(*c))
            .collect()
    }

    /// Ancestors from the parent upwards, excluding the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent_element(id), move |n| self.parent_element(*n))
    }

    /// Whether `id` sits strictly below `ancestor`.
    #[must_use]
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(id);
        while let Some(node) = cursor {
            if node == ancestor {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    /// Whether the node is reachable from the root.
    #[must_use]
    pub fn is_connected(&self, id: NodeId) -> bool {
        id == self.root || self.is_descendant_of(id, self.root)
    }

    /// Descendant elements of `id` in document order, excluding `id`.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_elements(id, &mut out);
        out
    }

    /// Every connected element in document order.
    #[must_use]
    pub fn elements(&self) -> Vec<NodeId> {
        self.descendants(self.root)
    }

    fn collect_elements(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(id) {
            if self.is_element(*child) {
                out.push(*child);
                self.collect_elements(*child, out);
            }
        }
    }

    // ---------------------------------------------------------------------
    // Attributes and classes
    // ---------------------------------------------------------------------

    /// Lower-case tag name of an element.
    #[must_use]
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(Element::tag)
    }

    /// Attribute value.
    #[must_use]
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.element(id).and_then(|el| el.attr(name))
    }

    /// Whether the attribute is present (any value).
    #[must_use]
    pub fn has_attr(&self, id: NodeId, name: &str) -> bool {
        self.attr(id, name).is_some()
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) -> Result<()> {
        self.element_mut(id)?.set_attr(name, value);
        Ok(())
    }

    /// Remove an attribute; returns whether it was present.
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Result<bool> {
        Ok(self.element_mut(id)?.remove_attr(name))
    }

    /// The `id` attribute.
    #[must_use]
    pub fn id_of(&self, id: NodeId) -> Option<&str> {
        self.attr(id, "id").filter(|v| !v.is_empty())
    }

    /// First connected element whose `id` attribute equals `id`.
    #[must_use]
    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|node| self.attr(*node, "id") == Some(id))
    }

    /// Whether the element's class list contains `class`.
    #[must_use]
    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.element(id).is_some_and(|el| el.has_class(class))
    }

    /// Add `class` unless already present.
    pub fn add_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        let el = self.element_mut(id)?;
        if el.has_class(class) {
            return Ok(());
        }
        let mut list = el.attr("class").unwrap_or_default().trim().to_owned();
        if !list.is_empty() {
            list.push(' ');
        }
        list.push_str(class);
        el.set_attr("class", &list);
        Ok(())
    }

    /// Remove every occurrence of `class`.
    pub fn remove_class(&mut self, id: NodeId, class: &str) -> Result<()> {
        let el = self.element_mut(id)?;
        let Some(list) = el.attr("class") else {
            return Ok(());
        };
        let kept: Vec<&str> = list
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        let joined = kept.join(" ");
        el.set_attr("class", &joined);
        Ok(())
    }

    /// Toggle `class`; returns whether it is present afterwards.
    pub fn toggle_class(&mut self, id: NodeId, class: &str) -> Result<bool> {
        if self.has_class(id, class) {
            self.remove_class(id, class)?;
            Ok(false)
        } else {
            self.add_class(id, class)?;
            Ok(true)
        }
    }

    // ---------------------------------------------------------------------
    // Text
    // ---------------------------------------------------------------------

    /// Concatenated text of the node and its descendants.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        if let NodeKind::Text(text) = &node.kind {
            out.push_str(text);
            return;
        }
        for child in &node.children {
            self.collect_text(*child, out);
        }
    }

    /// Replace all children of an element with a single text node.
    pub fn set_text_content(&mut self, id: NodeId, text: &str) -> Result<()> {
        self.ensure_container(id)?;
        let old = std::mem::take(&mut self.node_mut(id)?.children);
        for child in old {
            self.node_mut(child)?.parent = None;
        }
        if !text.is_empty() {
            self.create_text(id, text)?;
        }
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Form controls
    // ---------------------------------------------------------------------

    /// Control classification of an element.
    #[must_use]
    pub fn control_kind(&self, id: NodeId) -> Option<ControlKind> {
        self.element(id).and_then(Element::control_kind)
    }

    /// Current value of a form control; `None` for non-controls.
    ///
    /// Checkable inputs without a `value` attribute report `"on"`. A select
    /// reports its selected option, falling back to the first option.
    #[must_use]
    pub fn value(&self, id: NodeId) -> Option<String> {
        let el = self.element(id)?;
        if el.tag == "option" {
            return Some(self.option_value(id));
        }
        let kind = el.control_kind()?;
        if let Some(dirty) = &el.value {
            return Some(dirty.clone());
        }
        Some(match kind {
            ControlKind::TextArea => self.text_content(id),
            ControlKind::Select => self.selected_option(id).map_or_else(String::new, |opt| {
                self.option_value(opt)
            }),
            ControlKind::Radio | ControlKind::Checkbox => {
                el.attr("value").unwrap_or("on").to_owned()
            }
            _ => el.attr("value").unwrap_or_default().to_owned(),
        })
    }

    /// Write the value property of a control.
    ///
    /// For a select this selects the first option with a matching value and
    /// deselects the rest; an unmatched value leaves no option selected.
    pub fn set_value(&mut self, id: NodeId, value: &str) -> Result<()> {
        if self.control_kind(id) == Some(ControlKind::Select) {
            let options = self.options(id);
            let mut matched = false;
            for opt in options {
                let hit = !matched && self.option_value(opt) == value;
                matched |= hit;
                self.element_mut(opt)?.selected = Some(hit);
            }
            return Ok(());
        }
        self.element_mut(id)?.value = Some(value.to_owned());
        Ok(())
    }

    /// Option elements of a select in document order.
    #[must_use]
    pub fn options(&self, select: NodeId) -> Vec<NodeId> {
        self.descendants(select)
            .into_iter()
            .filter(|n| self.tag_name(*n) == Some("option"))
            .collect()
    }

    /// The selected option of a select.
    #[must_use]
    pub fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options = self.options(select);
        let explicit = options.iter().copied().find(|opt| self.is_selected(*opt));
        let any_dirty = options
            .iter()
            .any(|opt| self.element(*opt).is_some_and(|el| el.selected.is_some()));
        if explicit.is_some() || any_dirty {
            explicit
        } else {
            options.first().copied()
        }
    }

    fn is_selected(&self, option: NodeId) -> bool {
        self.element(option)
            .is_some_and(|el| el.selected.unwrap_or_else(|| el.attr("selected").is_some()))
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(v) => v.to_owned(),
            None => self.text_content(option).trim().to_owned(),
        }
    }

    /// Checkedness of a radio or checkbox (`false` for other nodes).
    #[must_use]
    pub fn checked(&self, id: NodeId) -> bool {
        self.element(id)
            .is_some_and(|el| el.checked.unwrap_or_else(|| el.attr("checked").is_some()))
    }

    /// Write the checked property.
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> Result<()> {
        self.element_mut(id)?.checked = Some(checked);
        Ok(())
    }

    /// Whether the element carries the `disabled` attribute.
    #[must_use]
    pub fn is_disabled(&self, id: NodeId) -> bool {
        self.has_attr(id, "disabled")
    }

    /// Nearest `<form>` ancestor.
    #[must_use]
    pub fn form_of(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|a| self.tag_name(*a) == Some("form"))
    }

    // ---------------------------------------------------------------------
    // Display and focus
    // ---------------------------------------------------------------------

    /// The element's own display state (what `show()`/`hide()` manipulate).
    ///
    /// Until written it follows the `hidden` attribute and an inline
    /// `display: none` style.
    #[must_use]
    pub fn is_displayed(&self, id: NodeId) -> bool {
        let Some(el) = self.element(id) else {
            return false;
        };
        el.displayed.unwrap_or_else(|| {
            let styled_none = el.attr("style").is_some_and(|style| {
                style
                    .split(';')
                    .filter_map(|decl| decl.split_once(':'))
                    .any(|(k, v)| {
                        k.trim().eq_ignore_ascii_case("display")
                            && v.trim().eq_ignore_ascii_case("none")
                    })
            });
            el.attr("hidden").is_none() && !styled_none
        })
    }

    /// Write the display state.
    pub fn set_displayed(&mut self, id: NodeId, displayed: bool) -> Result<()> {
        self.element_mut(id)?.displayed = Some(displayed);
        Ok(())
    }

    /// Displayed itself and every ancestor is displayed.
    #[must_use]
    pub fn is_visible(&self, id: NodeId) -> bool {
        self.is_connected(id)
            && self.is_displayed(id)
            && self.ancestors(id).all(|a| self.is_displayed(a))
    }

    /// The focused element.
    #[must_use]
    pub const fn active_element(&self) -> Option<NodeId> {
        self.active
    }

    /// Record the focused element without firing events.
    pub fn set_active_element(&mut self, id: Option<NodeId>) {
        self.active = id;
    }

    // ---------------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------------

    /// Connected elements matching `selector`, in document order.
    #[must_use]
    pub fn query_all(&self, selector: &Selector) -> Vec<NodeId> {
        self.query_all_within(self.root, selector)
    }

    /// Descendants of `scope` matching `selector`, in document order.
    #[must_use]
    pub fn query_all_within(&self, scope: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|n| selector.matches(self, *n))
            .collect()
    }

    /// First connected element matching `selector`.
    #[must_use]
    pub fn query_first(&self, selector: &Selector) -> Option<NodeId> {
        self.query_all(selector).into_iter().next()
    }

    /// First descendant of `scope` matching `selector`.
    #[must_use]
    pub fn query_first_within(&self, scope: NodeId, selector: &Selector) -> Option<NodeId> {
        self.query_all_within(scope, selector).into_iter().next()
    }

    /// Parse `selector` and return every match.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>> {
        Ok(self.query_all(&Selector::parse(selector)?))
    }

    /// Whether the element matches `selector`.
    #[must_use]
    pub fn matches(&self, id: NodeId, selector: &Selector) -> bool {
        selector.matches(self, id)
    }

    /// The element itself or its nearest ancestor matching `selector`.
    #[must_use]
    pub fn closest(&self, id: NodeId, selector: &Selector) -> Option<NodeId> {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|n| selector.matches(self, *n))
    }

    /// Position of `id` among all elements matching `selector`.
    #[must_use]
    pub fn index_among(&self, id: NodeId, selector: &Selector) -> Option<usize> {
        self.query_all(selector).iter().position(|n| *n == id)
    }

    // ---------------------------------------------------------------------
    // Serialization
    // ---------------------------------------------------------------------

    /// Serialize the node and its subtree as markup.
    ///
    /// Properties (value, checked, display) are not reflected; only
    /// attributes and text are. `script` and `style` bodies are written
    /// verbatim.
    #[must_use]
    pub fn outer_html(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.write_html(id, &mut out);
        out
    }

    /// Serialize the children of the root.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for child in self.children(self.root) {
            self.write_html(*child, &mut out);
        }
        out
    }

    fn write_html(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        match &node.kind {
            NodeKind::Root => {
                for child in &node.children {
                    self.write_html(*child, out);
                }
            }
            NodeKind::Text(text) => out.push_str(&escape(text, false)),
            NodeKind::Element(el) => {
                out.push('<');
                out.push_str(&el.tag);
                for (name, value) in &el.attrs {
                    let _ = write!(out, " {name}=\"{}\"", escape(value, true));
                }
                out.push('>');
                if VOID_TAGS.contains(&el.tag.as_str()) {
                    return;
                }
                if RAW_TEXT_TAGS.contains(&el.tag.as_str()) {
                    out.push_str(&self.text_content(id));
                } else {
                    for child in &node.children {
                        self.write_html(*child, out);
                    }
                }
                let _ = write!(out, "</{}>", el.tag);
            }
        }
    }
}

fn escape(text: &str, attribute: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}
