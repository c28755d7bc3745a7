#![forbid(unsafe_code)]

//! Test harness for formwire.
//!
//! [`PageBuilder`] assembles a page with headers, configuration, an
//! analytics recorder and a manual clock, bootstraps every behavior, and
//! returns a [`TestPage`] whose helpers address elements by id. Helpers
//! panic with a descriptive message when an id is missing, like assertion
//! macros do.
//!
//! [`fixtures`] holds the reference pages the integration tests share.
//!
//! ```
//! use formwire_harness::{PageBuilder, fixtures};
//!
//! let mut t = PageBuilder::new(fixtures::TOTALS).build();
//! assert_eq!(t.text("total"), "22.00");
//! t.fill("term_1", "11");
//! assert_eq!(t.text("total"), "23.00");
//! ```

pub mod fixtures;

use std::rc::Rc;
use std::time::Duration;

use formwire_a11y::AriaState;
use formwire_dom::{Document, Key, NodeId};
use formwire_runtime::{
    InitReport, ManualClock, Navigation, Page, PageEnvironment, RecordingAnalytics, Registry,
    RuntimeConfig,
};

/// Builder for a bootstrapped [`TestPage`].
#[derive(Debug, Clone)]
pub struct PageBuilder {
    html: String,
    headers: Vec<(String, String)>,
    config: RuntimeConfig,
    start_unix: u64,
    analytics: bool,
}

impl PageBuilder {
    /// Page from markup, at Unix time 1 700 000 000 with default config.
    #[must_use]
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            headers: Vec::new(),
            config: RuntimeConfig::default(),
            start_unix: 1_700_000_000,
            analytics: false,
        }
    }

    /// Add a response header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    /// Use `config` for the environment and the registry.
    #[must_use]
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Start the clock at `secs` after the Unix epoch.
    #[must_use]
    pub fn at_unix(mut self, secs: u64) -> Self {
        self.start_unix = secs;
        self
    }

    /// Record analytics events.
    #[must_use]
    pub fn with_analytics(mut self) -> Self {
        self.analytics = true;
        self
    }

    /// Build without binding any behavior.
    #[must_use]
    pub fn build_unbound(self) -> TestPage {
        let doc = Document::parse(&self.html)
            .unwrap_or_else(|err| panic!("fixture markup does not parse: {err}"));
        let mut env: PageEnvironment = self.config.environment();
        for (name, value) in self.headers {
            env = env.with_header(name, value);
        }
        let analytics = self.analytics.then(|| Rc::new(RecordingAnalytics::new()));
        if let Some(sink) = &analytics {
            env = env.with_analytics(sink.clone());
        }
        let clock = Rc::new(ManualClock::at_unix(self.start_unix));
        TestPage {
            page: Page::new(doc, env, clock.clone()),
            clock,
            analytics,
            config: self.config,
            registry: None,
            report: None,
        }
    }

    /// Build and bootstrap every enabled behavior.
    #[must_use]
    pub fn build(self) -> TestPage {
        let mut page = self.build_unbound();
        page.bootstrap();
        page
    }
}

/// A page under test.
pub struct TestPage {
    /// The page itself.
    pub page: Page,
    /// The page clock.
    pub clock: Rc<ManualClock>,
    /// Analytics recorder, when requested.
    pub analytics: Option<Rc<RecordingAnalytics>>,
    config: RuntimeConfig,
    registry: Option<Registry>,
    report: Option<InitReport>,
}

impl TestPage {
    /// Run the registry over the document; repeat calls bind only new elements.
    pub fn bootstrap(&mut self) -> &InitReport {
        let report = if let Some(registry) = self.registry.as_mut() {
            registry
                .init_all(&mut self.page)
                .map_err(formwire::Error::from)
        } else {
            formwire::bootstrap(&mut self.page, &self.config).map(|(registry, report)| {
                self.registry = Some(registry);
                report
            })
        };
        let report = report.unwrap_or_else(|err| panic!("bootstrap failed: {err}"));
        self.report.insert(report)
    }

    /// Report of the last bootstrap.
    #[must_use]
    pub fn report(&self) -> Option<&InitReport> {
        self.report.as_ref()
    }

    /// The document.
    #[must_use]
    pub fn doc(&self) -> &Document {
        self.page.document()
    }

    /// Element with id `id`.
    #[must_use]
    pub fn node(&self, id: &str) -> NodeId {
        self.doc()
            .by_id(id)
            .unwrap_or_else(|| panic!("no element with id {id:?}"))
    }

    /// First element matching `selector`.
    #[must_use]
    pub fn first(&self, selector: &str) -> NodeId {
        self.doc()
            .select(selector)
            .ok()
            .and_then(|nodes| nodes.first().copied())
            .unwrap_or_else(|| panic!("no element matches {selector:?}"))
    }

    /// Click the element with id `id`; returns whether the default was prevented.
    pub fn click(&mut self, id: &str) -> bool {
        let node = self.node(id);
        self.page
            .click(node)
            .unwrap_or_else(|err| panic!("click #{id} failed: {err}"))
            .default_prevented()
    }

    /// Set the value of `id` and fire `change`.
    pub fn fill(&mut self, id: &str, value: &str) {
        let node = self.node(id);
        self.page
            .fill(node, value)
            .unwrap_or_else(|err| panic!("fill #{id} failed: {err}"));
    }

    /// Press `key` on `id`; returns whether the default was prevented.
    pub fn key(&mut self, id: &str, key: Key) -> bool {
        let node = self.node(id);
        self.page
            .key_down(node, key)
            .unwrap_or_else(|err| panic!("key on #{id} failed: {err}"))
            .default_prevented()
    }

    /// Focus `id`.
    pub fn focus(&mut self, id: &str) {
        let node = self.node(id);
        self.page
            .focus(node)
            .unwrap_or_else(|err| panic!("focus #{id} failed: {err}"));
    }

    /// Remove focus.
    pub fn blur(&mut self) {
        self.page
            .blur()
            .unwrap_or_else(|err| panic!("blur failed: {err}"));
    }

    /// Submit the form `id`.
    pub fn submit(&mut self, id: &str) {
        let node = self.node(id);
        self.page
            .submit(node)
            .unwrap_or_else(|err| panic!("submit #{id} failed: {err}"));
    }

    /// Publish "render"; returns the number of handlers run.
    pub fn render(&mut self) -> usize {
        self.page
            .render()
            .unwrap_or_else(|err| panic!("render failed: {err}"))
    }

    /// Attempt to leave the page.
    pub fn unload(&mut self) -> Option<String> {
        self.page
            .before_unload()
            .unwrap_or_else(|err| panic!("beforeunload failed: {err}"))
    }

    /// Advance the clock by `ms` and run due timers; returns how many fired.
    pub fn wait(&mut self, ms: u64) -> usize {
        self.clock.advance(Duration::from_millis(ms));
        self.page
            .run_due_timers()
            .unwrap_or_else(|err| panic!("timer failed: {err}"))
    }

    /// Text content of `id`.
    #[must_use]
    pub fn text(&self, id: &str) -> String {
        self.doc().text_content(self.node(id))
    }

    /// Attribute of `id`.
    #[must_use]
    pub fn attr(&self, id: &str, name: &str) -> Option<String> {
        self.doc().attr(self.node(id), name).map(str::to_owned)
    }

    /// Whether `id` carries `class`.
    #[must_use]
    pub fn has_class(&self, id: &str, class: &str) -> bool {
        self.doc().has_class(self.node(id), class)
    }

    /// Whether `id` is displayed (its own display state).
    #[must_use]
    pub fn displayed(&self, id: &str) -> bool {
        self.doc().is_displayed(self.node(id))
    }

    /// Observed ARIA state of `id`.
    #[must_use]
    pub fn aria(&self, id: &str) -> AriaState {
        AriaState::capture(self.doc(), self.node(id))
    }

    /// Id of the focused element.
    #[must_use]
    pub fn active_id(&self) -> Option<String> {
        let doc = self.doc();
        doc.active_element()
            .and_then(|node| doc.id_of(node).map(str::to_owned))
    }

    /// Navigations requested so far.
    #[must_use]
    pub fn navigations(&self) -> &[Navigation] {
        self.page.navigations()
    }

    /// Serialized document.
    #[must_use]
    pub fn html(&self) -> String {
        self.doc().to_html()
    }

    /// BLAKE3 digest of the serialized document.
    #[must_use]
    pub fn digest(&self) -> String {
        let html = self.html();
        let digest = blake3::hash(html.as_bytes()).to_hex().to_string();
        tracing::trace!(%digest, len = html.len(), "document digest");
        digest
    }
}

/// Assert that the element's ARIA attributes agree with its display state.
#[macro_export]
macro_rules! assert_aria_consistent {
    ($page:expr, $id:expr) => {{
        let state = $page.aria($id);
        assert!(
            state.is_consistent(),
            "ARIA state of #{} disagrees with display: {:?}",
            $id,
            state
        );
    }};
}
