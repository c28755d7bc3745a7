#![forbid(unsafe_code)]

//! Integration tests: templated text, disclosure widgets and selection state.

use formwire_dom::Key;
use formwire_harness::{PageBuilder, fixtures};
use pretty_assertions::assert_eq;

// ============================================================================
// Templated text
// ============================================================================

#[test]
fn templated_follows_selected_radio() {
    let mut t = PageBuilder::new(fixtures::TEMPLATED).build();
    assert_eq!(t.text("templated"), "Default content");
    t.click("radio_1");
    assert_eq!(t.text("templated"), "Templated content, value = one");
    t.click("radio_2");
    assert_eq!(t.text("templated"), "Templated content, value = two");
}

#[test]
fn excluded_value_restores_original_text() {
    let mut t = PageBuilder::new(fixtures::TEMPLATED).build();
    t.click("radio_1");
    t.click("radio_3");
    assert_eq!(t.text("templated"), "Default content");
}

#[test]
fn delegate_receives_the_text() {
    let mut t = PageBuilder::new(fixtures::TEMPLATED).build();
    assert_eq!(t.text("delegate"), "Another element");
    t.click("radio_2");
    assert_eq!(t.text("delegate"), "Delegated two");
    assert_eq!(t.text("delegating"), "unused");
}

// ============================================================================
// Disclosure
// ============================================================================

#[test]
fn details_bind_closed_and_accessible() {
    let t = PageBuilder::new(fixtures::DETAILS).build();
    assert_eq!(t.attr("trigger", "role").as_deref(), Some("button"));
    assert_eq!(t.attr("trigger", "aria-controls").as_deref(), Some("details-content"));
    assert_eq!(t.attr("trigger", "aria-expanded").as_deref(), Some("false"));
    assert!(!t.displayed("details-content"));
    assert_eq!(t.attr("details-content", "aria-hidden").as_deref(), Some("true"));
}

#[test]
fn details_toggle_twice_restores_state() {
    let mut t = PageBuilder::new(fixtures::DETAILS).build();
    assert!(t.click("trigger"));
    assert!(t.has_class("details", "open"));
    assert!(t.displayed("details-content"));
    assert_eq!(t.text("summary"), "Hide details");

    t.click("trigger");
    assert!(!t.has_class("details", "open"));
    assert!(!t.displayed("details-content"));
    assert_eq!(t.attr("trigger", "aria-expanded").as_deref(), Some("false"));
    assert_eq!(t.text("summary"), "View details");
    assert!(t.navigations().is_empty());
}

#[test]
fn details_space_key_toggles() {
    let mut t = PageBuilder::new(fixtures::DETAILS).build();
    assert!(t.key("trigger", Key::Space));
    assert!(t.has_class("details", "open"));
}

// ============================================================================
// Selection state
// ============================================================================

#[test]
fn checked_labels_start_selected() {
    let t = PageBuilder::new(fixtures::SELECTION).build();
    assert!(t.has_class("label_2", "selected"));
    assert!(!t.has_class("label_1", "selected"));
    assert!(t.has_class("label_other", "selected"));
}

#[test]
fn choosing_a_radio_clears_its_group_in_one_step() {
    let mut t = PageBuilder::new(fixtures::SELECTION).build();
    t.click("choice_1");
    assert!(t.has_class("label_1", "selected"));
    assert!(!t.has_class("label_2", "selected"));
    assert!(!t.has_class("label_3", "selected"));
    assert!(t.has_class("label_other", "selected"));
}

#[test]
fn clicking_the_label_selects_too() {
    let mut t = PageBuilder::new(fixtures::SELECTION).build();
    t.click("label_3");
    assert!(t.has_class("label_3", "selected"));
    assert!(!t.has_class("label_2", "selected"));
}

#[test]
fn checkbox_and_focus_classes() {
    let mut t = PageBuilder::new(fixtures::SELECTION).build();
    t.click("agree");
    assert!(t.has_class("label_check", "selected"));
    t.focus("agree");
    assert!(t.has_class("label_check", "focused"));
    t.blur();
    assert!(!t.has_class("label_check", "focused"));
    t.click("agree");
    assert!(!t.has_class("label_check", "selected"));
}
