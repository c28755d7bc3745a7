#![forbid(unsafe_code)]

//! What the page knows about the world outside its document.
//!
//! HTTP response headers, the rendering engine, the current location and an
//! optional analytics sink. None of these change after the page loads.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// Browser engine family, for the few places behavior differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// Any engine that does not turn Enter on a role=button element into a click.
    #[default]
    Standard,
    /// Legacy Opera: Enter on a focusable role=button element already clicks.
    Presto,
}

/// One analytics event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalyticsEvent {
    /// Event category, e.g. `External links`.
    pub category: String,
    /// Event action, e.g. the page path.
    pub action: String,
    /// Event label, e.g. the link href.
    pub label: String,
}

/// Receiver of analytics events.
pub trait AnalyticsSink {
    /// Record one event.
    fn send(&self, event: AnalyticsEvent);
}

/// Sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAnalytics {
    events: RefCell<Vec<AnalyticsEvent>>,
}

impl RecordingAnalytics {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    #[must_use]
    pub fn events(&self) -> Vec<AnalyticsEvent> {
        self.events.borrow().clone()
    }
}

impl AnalyticsSink for RecordingAnalytics {
    fn send(&self, event: AnalyticsEvent) {
        tracing::debug!(
            category = %event.category,
            action = %event.action,
            label = %event.label,
            "analytics event"
        );
        self.events.borrow_mut().push(event);
    }
}

/// Load-time facts about the page.
#[derive(Clone, Default)]
pub struct PageEnvironment {
    headers: Vec<(String, String)>,
    engine: Engine,
    location_path: String,
    analytics: Option<Rc<dyn AnalyticsSink>>,
}

impl fmt::Debug for PageEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageEnvironment")
            .field("headers", &self.headers)
            .field("engine", &self.engine)
            .field("location_path", &self.location_path)
            .field("analytics", &self.analytics.is_some())
            .finish()
    }
}

impl PageEnvironment {
    /// Environment with no headers, the standard engine and path `/`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            location_path: "/".to_owned(),
            ..Self::default()
        }
    }

    /// Add a response header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the engine.
    #[must_use]
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    /// Set the location path.
    #[must_use]
    pub fn with_location_path(mut self, path: impl Into<String>) -> Self {
        self.location_path = path.into();
        self
    }

    /// Install an analytics sink.
    #[must_use]
    pub fn with_analytics(mut self, sink: Rc<dyn AnalyticsSink>) -> Self {
        self.analytics = Some(sink);
        self
    }

    /// First header named `name` (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Engine family.
    #[must_use]
    pub const fn engine(&self) -> Engine {
        self.engine
    }

    /// Current location path.
    #[must_use]
    pub fn location_path(&self) -> &str {
        &self.location_path
    }

    /// Analytics sink, if any.
    #[must_use]
    pub fn analytics(&self) -> Option<&Rc<dyn AnalyticsSink>> {
        self.analytics.as_ref()
    }
}
