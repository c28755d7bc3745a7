#![forbid(unsafe_code)]

//! Integration tests: focus management, external links, button-role keys.

use formwire_dom::Key;
use formwire_harness::{PageBuilder, fixtures};
use formwire_runtime::{AnalyticsEvent, Engine, Navigation, RuntimeConfig};
use pretty_assertions::assert_eq;

// ============================================================================
// Focus
// ============================================================================

#[test]
fn error_summary_takes_focus_on_load() {
    let t = PageBuilder::new(fixtures::ERROR_SUMMARY).build();
    assert_eq!(t.attr("errors", "tabindex").as_deref(), Some("0"));
    assert_eq!(t.active_id().as_deref(), Some("errors"));
    assert_eq!(t.attr("content", "tabindex").as_deref(), Some("-1"));
}

#[test]
fn summary_links_focus_first_field_after_delay() {
    for n in 1..=4 {
        let mut t = PageBuilder::new(fixtures::ERROR_SUMMARY).build();
        t.click(&format!("link_{n}"));
        assert_eq!(t.active_id().as_deref(), Some("errors"));
        assert_eq!(t.wait(250), 1);
        assert_eq!(t.active_id(), Some(format!("field_{n}")));
        assert_eq!(t.navigations(), &[Navigation::Fragment(format!("section_{n}"))]);
    }
}

#[test]
fn configured_delay_applies() {
    let config = RuntimeConfig {
        focus_delay_ms: 1_000,
        ..RuntimeConfig::default()
    };
    let mut t = PageBuilder::new(fixtures::ERROR_SUMMARY).config(config).build();
    t.click("link_3");
    assert_eq!(t.wait(999), 0);
    assert_eq!(t.wait(1), 1);
    assert_eq!(t.active_id().as_deref(), Some("field_3"));
}

#[test]
fn skip_link_moves_focus_to_content() {
    let mut t = PageBuilder::new(fixtures::ERROR_SUMMARY).build();
    t.click("skip");
    assert_eq!(t.active_id().as_deref(), Some("content"));
}

// ============================================================================
// External links
// ============================================================================

#[test]
fn external_link_is_reported_then_followed() {
    let config = RuntimeConfig {
        location_path: "/plea/enter-urn".into(),
        ..RuntimeConfig::default()
    };
    let mut t = PageBuilder::new(fixtures::LINKS)
        .config(config)
        .with_analytics()
        .build();
    assert!(t.click("external"));
    assert!(t.click("external_blank"));

    let events = t.analytics.as_ref().map(|a| a.events()).unwrap_or_default();
    assert_eq!(
        events,
        vec![
            AnalyticsEvent {
                category: "External links".into(),
                action: "http://www.example.com".into(),
                label: "/plea/enter-urn".into(),
            },
            AnalyticsEvent {
                category: "External links".into(),
                action: "http://www.example.com/new".into(),
                label: "/plea/enter-urn".into(),
            },
        ]
    );
    assert_eq!(
        t.navigations(),
        &[
            Navigation::Assign("http://www.example.com".into()),
            Navigation::Open {
                url: "http://www.example.com/new".into(),
                target: "_blank".into(),
            },
        ]
    );
}

#[test]
fn external_link_without_analytics_is_native() {
    let mut t = PageBuilder::new(fixtures::LINKS).build();
    assert!(!t.click("external"));
    assert_eq!(t.navigations(), &[Navigation::Assign("http://www.example.com".into())]);
}

// ============================================================================
// Button-role links
// ============================================================================

#[test]
fn space_activates_button_role_link() {
    let mut t = PageBuilder::new(fixtures::LINKS).build();
    assert!(t.key("button_link", Key::Space));
    assert_eq!(t.navigations(), &[Navigation::Assign("/plea/guilty".into())]);
}

#[test]
fn enter_on_button_role_link_clicks_once() {
    for engine in [Engine::Standard, Engine::Presto] {
        let config = RuntimeConfig {
            engine,
            ..RuntimeConfig::default()
        };
        let mut t = PageBuilder::new(fixtures::LINKS).config(config).build();
        t.key("button_link", Key::Enter);
        assert_eq!(
            t.navigations(),
            &[Navigation::Assign("/plea/guilty".into())],
            "{engine:?}"
        );
    }
}
