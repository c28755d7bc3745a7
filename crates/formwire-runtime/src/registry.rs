#![forbid(unsafe_code)]

//! Behavior discovery and one-time binding.
//!
//! A [`Behavior`] names the elements it applies to ([`Behavior::discover`])
//! and wires one instance onto each ([`Behavior::bind`]). The [`Registry`]
//! runs every registered behavior over the document and remembers which
//! `(behavior, element)` pairs it has already bound.
//!
//! # Invariants
//!
//! 1. **At most one instance per key**: an [`InstanceKey`] is bound at most
//!    once per registry, however often [`Registry::init_all`] runs.
//! 2. **Failure isolation**: a failing `bind` is recorded in the
//!    [`InitReport`] and never prevents sibling instances from binding.
//! 3. **Binding order**: behaviors bind in registration order; within one
//!    behavior, in the order `discover` returns.
//! 4. **Single render**: a successful `init_all` publishes exactly one
//!    "render" after every instance is bound.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Effect |
//! |---------|-------|--------|
//! | Bind error | Missing/invalid attribute, bad pattern | Logged at `warn`, listed in [`InitReport::failed`], key stays unbound |
//! | Discover error | Unparseable selector | Behavior skipped for this run, listed in [`InitReport::failed`] |
//! | Render error | A render handler failed | `init_all` returns the error |

use std::fmt;

use ahash::AHashSet;
use formwire_dom::{Document, NodeId};

use crate::error::{Error, Result};
use crate::page::Page;

/// Unique identity of a bound behavior instance.
///
/// The `(behavior, node)` pair: one behavior can bind many nodes, and one
/// node can host several different behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceKey {
    /// Behavior name, as returned by [`Behavior::name`].
    pub behavior: &'static str,
    /// Subject element.
    pub node: NodeId,
}

impl InstanceKey {
    /// Create a key.
    #[must_use]
    pub const fn new(behavior: &'static str, node: NodeId) -> Self {
        Self { behavior, node }
    }

    /// Canonical string form: `"behavior::index"`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{}::{}", self.behavior, self.node.index())
    }
}

impl fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

/// A declaratively attached page behavior.
pub trait Behavior {
    /// Stable name, used for instance keys and configuration.
    fn name(&self) -> &'static str;

    /// Elements this behavior applies to, in binding order.
    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>>;

    /// Wire one instance onto `node`.
    ///
    /// On error the page must be left as if the instance never existed,
    /// apart from harmless attribute writes.
    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()>;
}

/// One failed bind.
#[derive(Debug)]
pub struct BindFailure {
    /// Behavior name.
    pub behavior: &'static str,
    /// Subject element, `None` when discovery itself failed.
    pub node: Option<NodeId>,
    /// What went wrong.
    pub error: Error,
}

/// Outcome of one [`Registry::init_all`] run.
#[derive(Debug, Default)]
pub struct InitReport {
    /// Instances bound in this run, in binding order.
    pub bound: Vec<InstanceKey>,
    /// Keys skipped because they were already bound.
    pub skipped: Vec<InstanceKey>,
    /// Instances (or discoveries) that failed.
    pub failed: Vec<BindFailure>,
    /// Behaviors not run because configuration disabled them.
    pub disabled: Vec<&'static str>,
}

impl InitReport {
    /// Whether nothing failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Number of instances bound for `behavior` in this run.
    #[must_use]
    pub fn bound_count(&self, behavior: &str) -> usize {
        self.bound.iter().filter(|k| k.behavior == behavior).count()
    }
}

/// Explicit registry of behaviors; owned by the caller, never global.
#[derive(Default)]
pub struct Registry {
    behaviors: Vec<Box<dyn Behavior>>,
    disabled: AHashSet<String>,
    bound: AHashSet<InstanceKey>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "behaviors",
                &self.behaviors.iter().map(|b| b.name()).collect::<Vec<_>>(),
            )
            .field("disabled", &self.disabled)
            .field("bound", &self.bound.len())
            .finish()
    }
}

impl Registry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a behavior; later registrations bind later.
    pub fn register(&mut self, behavior: impl Behavior + 'static) -> &mut Self {
        self.behaviors.push(Box::new(behavior));
        self
    }

    /// Skip the behavior called `name` in future runs.
    pub fn disable(&mut self, name: impl Into<String>) -> &mut Self {
        self.disabled.insert(name.into());
        self
    }

    /// Registered behavior names in binding order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.behaviors.iter().map(|b| b.name()).collect()
    }

    /// Whether `key` has been bound.
    #[must_use]
    pub fn is_bound(&self, key: InstanceKey) -> bool {
        self.bound.contains(&key)
    }

    /// Number of bound instances.
    #[must_use]
    pub fn bound_len(&self) -> usize {
        self.bound.len()
    }

    /// Bind every behavior to every matching element not yet bound, then
    /// publish one "render".
    pub fn init_all(&mut self, page: &mut Page) -> Result<InitReport> {
        let _span = tracing::info_span!("registry.init_all", behaviors = self.behaviors.len())
            .entered();
        let mut report = InitReport::default();
        for behavior in &self.behaviors {
            let name = behavior.name();
            if self.disabled.contains(name) {
                report.disabled.push(name);
                continue;
            }
            let nodes = match behavior.discover(page.document()) {
                Ok(nodes) => nodes,
                Err(error) => {
                    tracing::warn!(behavior = name, %error, "discovery failed");
                    report.failed.push(BindFailure {
                        behavior: name,
                        node: None,
                        error,
                    });
                    continue;
                }
            };
            for node in nodes {
                let key = InstanceKey::new(name, node);
                if self.bound.contains(&key) {
                    report.skipped.push(key);
                    continue;
                }
                match behavior.bind(page, node) {
                    Ok(()) => {
                        tracing::debug!(instance = %key, "bound");
                        self.bound.insert(key);
                        report.bound.push(key);
                    }
                    Err(error) => {
                        tracing::warn!(instance = %key, %error, "bind failed");
                        report.failed.push(BindFailure {
                            behavior: name,
                            node: Some(node),
                            error,
                        });
                    }
                }
            }
        }
        tracing::info!(
            bound = report.bound.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "behaviors initialised"
        );
        page.render()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::environment::PageEnvironment;
    use formwire_dom::Selector;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Marker {
        selector: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Behavior for Marker {
        fn name(&self) -> &'static str {
            "marker"
        }

        fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
            Ok(doc.query_all(&Selector::parse(self.selector)?))
        }

        fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
            if page.document().has_attr(node, "data-broken") {
                return Err(Error::missing_attribute("data-needed", "div"));
            }
            self.log.borrow_mut().push(format!("bind {}", node.index()));
            let log = Rc::clone(&self.log);
            page.subscribe(crate::bus::RENDER, move |_| {
                log.borrow_mut().push(format!("render {}", node.index()));
                Ok(())
            });
            Ok(())
        }
    }

    fn page(html: &str) -> Page {
        Page::new(
            Document::parse(html).unwrap(),
            PageEnvironment::new(),
            Rc::new(ManualClock::at_unix(0)),
        )
    }

    #[test]
    fn init_all_is_idempotent_per_element() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: ".m",
            log: Rc::clone(&log),
        });
        let mut page = page("<div class=m></div><div class=m></div>");

        let first = registry.init_all(&mut page).unwrap();
        assert_eq!(first.bound.len(), 2);
        let second = registry.init_all(&mut page).unwrap();
        assert!(second.bound.is_empty());
        assert_eq!(second.skipped.len(), 2);
        assert_eq!(page.subscriber_count(crate::bus::RENDER), 2);
        let binds = log.borrow().iter().filter(|l| l.starts_with("bind")).count();
        assert_eq!(binds, 2);
    }

    #[test]
    fn newly_added_elements_bind_on_rerun() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: ".m",
            log: Rc::clone(&log),
        });
        let mut page = page("<div class=m></div>");
        registry.init_all(&mut page).unwrap();
        let root = page.document().root();
        page.document_mut()
            .append_markup(root, "<div class=m></div>")
            .unwrap();
        let report = registry.init_all(&mut page).unwrap();
        assert_eq!(report.bound.len(), 1);
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn bind_failure_is_isolated() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: ".m",
            log: Rc::clone(&log),
        });
        let mut page = page("<div class=m data-broken></div><div class=m></div>");
        let report = registry.init_all(&mut page).unwrap();
        assert_eq!(report.bound.len(), 1);
        assert_eq!(report.failed.len(), 1);
        assert!(matches!(
            report.failed[0].error,
            Error::MissingAttribute { attribute: "data-needed", .. }
        ));
        assert!(!report.is_clean());
    }

    #[test]
    #[tracing_test::traced_test]
    fn bind_failure_is_logged() {
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: ".m",
            log: Rc::default(),
        });
        let mut page = page("<div class=m data-broken></div>");
        registry.init_all(&mut page).unwrap();
        assert!(logs_contain("bind failed"));
        assert!(logs_contain("data-needed"));
    }

    #[test]
    fn render_published_once_after_all_binds() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: ".m",
            log: Rc::clone(&log),
        });
        let mut page = page("<div class=m></div><div class=m></div>");
        registry.init_all(&mut page).unwrap();
        let entries = log.borrow();
        let kinds: Vec<&str> = entries.iter().map(|l| &l[..l.find(' ').unwrap()]).collect();
        assert_eq!(kinds, vec!["bind", "bind", "render", "render"]);
    }

    #[test]
    fn disabled_behaviors_are_skipped() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = Registry::new();
        registry
            .register(Marker {
                selector: ".m",
                log: Rc::clone(&log),
            })
            .disable("marker");
        let mut page = page("<div class=m></div>");
        let report = registry.init_all(&mut page).unwrap();
        assert_eq!(report.disabled, vec!["marker"]);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn discovery_error_is_reported() {
        let mut registry = Registry::new();
        registry.register(Marker {
            selector: "a + b",
            log: Rc::default(),
        });
        let mut page = page("<div></div>");
        let report = registry.init_all(&mut page).unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(report.failed[0].node.is_none());
    }

    #[test]
    fn instance_key_display() {
        let doc = Document::parse("<p></p>").unwrap();
        let key = InstanceKey::new("details", doc.elements()[0]);
        assert_eq!(key.to_string(), format!("details::{}", doc.elements()[0].index()));
    }
}
