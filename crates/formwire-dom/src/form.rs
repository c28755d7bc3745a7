#![forbid(unsafe_code)]

//! `application/x-www-form-urlencoded` serialization of form controls.
//!
//! Produces the same string a browser script library builds from a set of
//! forms: successful controls in document order, `name=value` pairs joined
//! with `&`, spaces encoded as `+`.
//!
//! A control is successful when it has a non-empty `name`, is not disabled,
//! is not a button or file input, and, for radios and checkboxes, is checked.

use url::form_urlencoded;

use crate::document::{ControlKind, Document, NodeId};

/// Name/value pairs of the successful controls below `scope`.
#[must_use]
pub fn successful_controls(doc: &Document, scope: NodeId) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for node in doc.descendants(scope) {
        let Some(kind) = doc.control_kind(node) else {
            continue;
        };
        let Some(name) = doc.attr(node, "name").filter(|n| !n.is_empty()) else {
            continue;
        };
        if doc.is_disabled(node) || matches!(kind, ControlKind::Button | ControlKind::File) {
            continue;
        }
        if kind.is_checkable() && !doc.checked(node) {
            continue;
        }
        if kind == ControlKind::Select && doc.selected_option(node).is_none() {
            continue;
        }
        let value = doc.value(node).unwrap_or_default();
        pairs.push((name.to_owned(), value));
    }
    pairs
}

/// Serialize a single form (or any subtree).
#[must_use]
pub fn serialize_form(doc: &Document, form: NodeId) -> String {
    encode(&successful_controls(doc, form))
}

/// Serialize every `<form>` of the document, concatenated in document order.
#[must_use]
pub fn serialize_forms(doc: &Document) -> String {
    let pairs: Vec<(String, String)> = doc
        .elements()
        .into_iter()
        .filter(|n| doc.tag_name(*n) == Some("form"))
        .flat_map(|form| successful_controls(doc, form))
        .collect();
    encode(&pairs)
}

fn encode(pairs: &[(String, String)]) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .finish()
}
