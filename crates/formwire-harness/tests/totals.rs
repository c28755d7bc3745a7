#![forbid(unsafe_code)]

//! Integration tests: running totals.

use formwire_harness::{PageBuilder, fixtures};
use pretty_assertions::assert_eq;

#[test]
fn initial_totals_follow_precision() {
    let t = PageBuilder::new(fixtures::TOTALS).build();
    assert_eq!(t.text("total"), "22.00");
    assert_eq!(t.text("total_4dp"), "22.0000");
}

#[test]
fn non_numeric_term_counts_as_zero() {
    let mut t = PageBuilder::new(fixtures::TOTALS).build();
    t.fill("term_2", "five");
    assert_eq!(t.text("total"), "17.00");
    t.fill("term_3", "1,000");
    assert_eq!(t.text("total"), "1,017.00");
}

#[test]
fn cascade_reaches_grand_total() {
    let mut t = PageBuilder::new(fixtures::TOTALS_CASCADE).build();
    assert_eq!(t.text("sub_1"), "20.00");
    assert_eq!(t.text("sub_2"), "2.00");
    assert_eq!(t.text("grand"), "22.00");

    t.fill("a_1", "0.5");
    assert_eq!(t.text("sub_1"), "10.50");
    assert_eq!(t.text("grand"), "12.50");
}

#[test]
fn render_after_direct_edit_resynchronises() {
    let mut t = PageBuilder::new(fixtures::TOTALS).build();
    let term = t.node("term_1");
    t.page.document_mut().set_value(term, "100").unwrap();
    assert_eq!(t.text("total"), "22.00");
    t.render();
    assert_eq!(t.text("total"), "112.00");
}

#[test]
fn repeated_render_is_stable() {
    let mut t = PageBuilder::new(fixtures::TOTALS_CASCADE).build();
    let before = t.digest();
    t.render();
    t.render();
    assert_eq!(before, t.digest());
}
