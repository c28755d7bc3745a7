#![forbid(unsafe_code)]

//! Integration tests: registry bootstrap across every behavior.

use formwire_behaviors::BEHAVIOR_NAMES;
use formwire_harness::{PageBuilder, fixtures};
use formwire_runtime::{RENDER, RuntimeConfig};
use pretty_assertions::assert_eq;

#[test]
fn every_fixture_bootstraps_cleanly() {
    for html in [
        fixtures::TOTALS,
        fixtures::TOTALS_CASCADE,
        fixtures::CONDITIONAL,
        fixtures::TEMPLATED,
        fixtures::DETAILS,
        fixtures::SELECTION,
        fixtures::GUARD,
        fixtures::GUARD_INLINE,
        fixtures::ERROR_SUMMARY,
        fixtures::LINKS,
    ] {
        let t = PageBuilder::new(html).build();
        let report = t.report().unwrap();
        assert!(report.is_clean(), "{:?}", report.failed);
    }
}

#[test]
fn second_bootstrap_binds_nothing_new() {
    let mut t = PageBuilder::new(fixtures::CONDITIONAL).build();
    let first = t.report().unwrap().bound.len();
    assert!(first > 0);
    let subscribers = t.page.subscriber_count(RENDER);

    let (bound, skipped) = {
        let again = t.bootstrap();
        (again.bound.len(), again.skipped.len())
    };
    assert_eq!(bound, 0);
    assert_eq!(skipped, first);
    assert_eq!(t.page.subscriber_count(RENDER), subscribers);
}

#[test]
fn inserted_markup_is_bound_on_the_next_pass() {
    let mut t = PageBuilder::new(fixtures::CONDITIONAL).build();
    let form = t.node("plea_form");
    t.page
        .document_mut()
        .append_markup(
            form,
            r#"<p id="late" data-conditional="plea" data-conditional-value="guilty">Late</p>"#,
        )
        .unwrap();

    let report = t.bootstrap();
    assert_eq!(report.bound_count("conditional"), 1);
    assert!(!t.displayed("late"));
    t.click("plea_guilty");
    assert!(t.displayed("late"));
}

#[test]
#[tracing_test::traced_test]
fn broken_instance_is_isolated_and_logged() {
    let html = r#"
        <input type="radio" name="plea" value="guilty" id="g">
        <div id="broken" data-conditional="plea" data-conditional-value="[">Broken</div>
        <div id="fine" data-conditional="plea" data-conditional-value="guilty">Fine</div>
        <div id="no_pattern" class="js-Conditional" data-conditional-trigger="plea">None</div>"#;
    let mut t = PageBuilder::new(html).build();
    let report = t.report().unwrap();
    assert_eq!(report.failed.len(), 2);
    assert_eq!(report.bound_count("conditional"), 1);
    assert!(logs_contain("bind failed"));

    assert_eq!(t.attr("broken", "aria-hidden"), None);
    t.click("g");
    assert!(t.displayed("fine"));
}

#[test]
fn disabled_behaviors_are_skipped() {
    let config = RuntimeConfig {
        disabled_behaviors: vec!["totals".into(), "nojs-cleanup".into()],
        ..RuntimeConfig::default()
    };
    let html = format!(
        r#"{}<input class="nojs-only" type="submit" name="split_form" id="split">"#,
        fixtures::TOTALS
    );
    let t = PageBuilder::new(html).config(config).build();
    let report = t.report().unwrap();
    assert_eq!(report.disabled, vec!["nojs-cleanup", "totals"]);
    assert_eq!(t.text("total"), "0");
    assert!(t.doc().by_id("split").is_some());
}

#[test]
fn behaviors_bind_in_registry_order() {
    let t = PageBuilder::new(fixtures::SELECTION).build();
    let order: Vec<&str> = t
        .report()
        .unwrap()
        .bound
        .iter()
        .map(|key| key.behavior)
        .fold(Vec::new(), |mut acc, name| {
            if acc.last() != Some(&name) {
                acc.push(name);
            }
            acc
        });
    let expected: Vec<&str> = BEHAVIOR_NAMES
        .iter()
        .copied()
        .filter(|name| order.contains(name))
        .collect();
    assert_eq!(order, expected);
}

#[test]
fn revealing_content_does_not_count_as_an_edit() {
    let html = format!("{}{}", fixtures::CONDITIONAL, fixtures::DETAILS);
    let mut t = PageBuilder::new(html).build();
    t.click("trigger");
    t.render();
    assert_eq!(t.unload(), None);
    t.click("plea_guilty");
    assert!(t.unload().is_some());
}
