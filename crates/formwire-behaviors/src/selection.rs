#![forbid(unsafe_code)]

//! Selection styling for label-wrapped radios and checkboxes.
//!
//! The enclosing `<label>` carries `selected` while its input is checked and
//! `focused` while the input has focus. Checking a radio clears `selected`
//! from the labels of every radio with the same name in the same form
//! (or the whole document when the radio is outside any form).
//!
//! # Invariants
//!
//! 1. After any update a label has `selected` iff its input is checked.
//! 2. Within a radio group at most one label has `selected`.

use formwire_dom::{ControlKind, Document, EventKind, NodeId, Selector};
use formwire_runtime::{Behavior, Page, RENDER, Result};

/// Inputs bound by [`SelectionButtons`].
pub const SELECTOR: &str = "label input[type=radio], label input[type=checkbox]";

/// Class on the label of a checked input.
pub const SELECTED_CLASS: &str = "selected";

/// Class on the label of a focused input.
pub const FOCUSED_CLASS: &str = "focused";

fn enclosing_label(doc: &Document, input: NodeId) -> Option<NodeId> {
    doc.ancestors(input)
        .find(|n| doc.tag_name(*n) == Some("label"))
}

/// Radios sharing `input`'s name within its form, or document-wide.
fn radio_group(doc: &Document, input: NodeId) -> Vec<NodeId> {
    let Some(name) = doc.attr(input, "name") else {
        return vec![input];
    };
    let form = doc.form_of(input);
    let scope = form.unwrap_or_else(|| doc.root());
    doc.descendants(scope)
        .into_iter()
        .filter(|n| {
            doc.control_kind(*n) == Some(ControlKind::Radio) && doc.attr(*n, "name") == Some(name)
        })
        .collect()
}

/// Re-derive `selected` for the label around `input`.
pub fn refresh(doc: &mut Document, input: NodeId) -> Result<()> {
    let Some(label) = enclosing_label(doc, input) else {
        return Ok(());
    };
    if !doc.checked(input) {
        doc.remove_class(label, SELECTED_CLASS)?;
        return Ok(());
    }
    if doc.control_kind(input) == Some(ControlKind::Radio) {
        let others: Vec<NodeId> = radio_group(doc, input)
            .into_iter()
            .filter_map(|n| enclosing_label(doc, n))
            .collect();
        for other in others {
            doc.remove_class(other, SELECTED_CLASS)?;
        }
    }
    doc.add_class(label, SELECTED_CLASS)?;
    Ok(())
}

fn set_focused(doc: &mut Document, input: NodeId, focused: bool) -> Result<()> {
    if let Some(label) = enclosing_label(doc, input) {
        if focused {
            doc.add_class(label, FOCUSED_CLASS)?;
        } else {
            doc.remove_class(label, FOCUSED_CLASS)?;
        }
    }
    Ok(())
}

/// Selection styling behavior; one instance per input.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionButtons;

impl Behavior for SelectionButtons {
    fn name(&self) -> &'static str {
        "selection"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.query_all(&Selector::parse(SELECTOR)?))
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        page.on(node, EventKind::Change, move |page, _| {
            refresh(page.document_mut(), node)
        });
        page.on(node, EventKind::Focus, move |page, _| {
            set_focused(page.document_mut(), node, true)
        });
        page.on(node, EventKind::Blur, move |page, _| {
            set_focused(page.document_mut(), node, false)
        });
        page.subscribe(RENDER, move |page| refresh(page.document_mut(), node));
        refresh(page.document_mut(), node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_page;

    const FIXTURE: &str = r#"
        <form id="test-form">
          <label id="label1"><input type="radio" name="radio" id="radio1" value="1"> One</label>
          <label id="label2"><input type="radio" name="radio" id="radio2" value="2" checked> Two</label>
          <label id="label3"><input type="radio" name="radio" id="radio3" value="3"> Three</label>
          <label id="label4"><input type="checkbox" name="check" id="checkbox1"> Check</label>
        </form>
    "#;

    fn bound() -> Page {
        let mut page = test_page(FIXTURE);
        let inputs = SelectionButtons.discover(page.document()).unwrap();
        assert_eq!(inputs.len(), 4);
        for input in inputs {
            SelectionButtons.bind(&mut page, input).unwrap();
        }
        page
    }

    fn node(page: &Page, id: &str) -> NodeId {
        page.document().by_id(id).unwrap()
    }

    fn selected(page: &Page) -> Vec<&'static str> {
        ["label1", "label2", "label3", "label4"]
            .into_iter()
            .filter(|id| page.document().has_class(node(page, id), SELECTED_CLASS))
            .collect()
    }

    #[test]
    fn initial_state_marks_checked_labels() {
        let page = bound();
        assert_eq!(selected(&page), vec!["label2"]);
    }

    #[test]
    fn checking_radio_clears_group() {
        let mut page = bound();
        let radio = node(&page, "radio1");
        page.click(radio).unwrap();
        assert_eq!(selected(&page), vec!["label1"]);
        let radio = node(&page, "radio3");
        page.click(radio).unwrap();
        assert_eq!(selected(&page), vec!["label3"]);
    }

    #[test]
    fn checkbox_toggles_its_own_label() {
        let mut page = bound();
        let checkbox = node(&page, "checkbox1");
        page.click(checkbox).unwrap();
        assert_eq!(selected(&page), vec!["label2", "label4"]);
        page.click(checkbox).unwrap();
        assert_eq!(selected(&page), vec!["label2"]);
    }

    #[test]
    fn focus_and_blur_mark_label() {
        let mut page = bound();
        let radio = node(&page, "radio1");
        let label = node(&page, "label1");
        page.focus(radio).unwrap();
        assert!(page.document().has_class(label, FOCUSED_CLASS));
        page.blur().unwrap();
        assert!(!page.document().has_class(label, FOCUSED_CLASS));
    }

    #[test]
    fn groups_in_other_forms_are_untouched() {
        let mut page = test_page(
            r#"<form><label id=a><input type=radio name=r id=ra checked></label></form>
               <form><label id=b><input type=radio name=r id=rb></label></form>"#,
        );
        for input in SelectionButtons.discover(page.document()).unwrap() {
            SelectionButtons.bind(&mut page, input).unwrap();
        }
        let rb = node(&page, "rb");
        page.click(rb).unwrap();
        let doc = page.document();
        assert!(doc.has_class(node(&page, "a"), SELECTED_CLASS));
        assert!(doc.has_class(node(&page, "b"), SELECTED_CLASS));
    }

    #[test]
    fn render_repairs_stale_classes() {
        let mut page = bound();
        let label = node(&page, "label1");
        page.document_mut().add_class(label, SELECTED_CLASS).unwrap();
        page.render().unwrap();
        assert_eq!(selected(&page), vec!["label2"]);
    }
}
