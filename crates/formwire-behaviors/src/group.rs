#![forbid(unsafe_code)]

//! Trigger groups: the inputs that share a `name`.
//!
//! Several behaviors react to "the value of the inputs named X". The group is
//! looked up document-wide, the way a `[name="X"]` query would, and its value
//! is read according to the kind of its first member.

use formwire_dom::{ControlKind, Document, NodeId};

/// Every connected element whose `name` attribute equals `name`.
#[must_use]
pub fn named(doc: &Document, name: &str) -> Vec<NodeId> {
    doc.elements()
        .into_iter()
        .filter(|n| doc.attr(*n, "name") == Some(name))
        .collect()
}

/// Radios whose `name` attribute equals `name`.
#[must_use]
pub fn radios(doc: &Document, name: &str) -> Vec<NodeId> {
    named(doc, name)
        .into_iter()
        .filter(|n| doc.control_kind(*n) == Some(ControlKind::Radio))
        .collect()
}

/// The checked radio among `members`, if any.
#[must_use]
pub fn checked_member(doc: &Document, members: &[NodeId]) -> Option<NodeId> {
    members.iter().copied().find(|n| doc.checked(*n))
}

/// Current value of a trigger group.
///
/// The first member decides how the group is read:
///
/// | First member | Value |
/// |--------------|-------|
/// | radio | value of the checked radio |
/// | checkbox | value of the first checked checkbox |
/// | anything else | its own value (select: the selected option) |
///
/// `None` when nothing is checked or the group is empty.
#[must_use]
pub fn group_value(doc: &Document, members: &[NodeId]) -> Option<String> {
    let first = *members.first()?;
    match doc.control_kind(first) {
        Some(ControlKind::Radio | ControlKind::Checkbox) => {
            checked_member(doc, members).and_then(|n| doc.value(n))
        }
        _ => doc.value(first),
    }
}
