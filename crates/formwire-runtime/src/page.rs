#![forbid(unsafe_code)]

//! The page: a document plus everything a browser tab adds around it.
//!
//! [`Page`] owns the [`Document`], per-element and window-level event
//! listeners, the [`EventBus`], a timer queue and the injected [`Clock`]. It
//! also performs the native actions a browser would (checking a radio on
//! click, following a link, submitting a form) so behaviors can be exercised
//! exactly as a user would drive them.
//!
//! # Dispatch
//!
//! Events travel from the target up through its ancestors, then to window
//! listeners, unless the kind does not bubble (`focus`, `blur`) or a listener
//! stops propagation. Each listener list is snapshotted before it runs, so a
//! listener added during a dispatch sees the next event, not the current one.
//!
//! # Invariants
//!
//! 1. Listeners on one element for one kind run in registration order.
//! 2. The default action runs only after every listener returned `Ok` and
//!    none called `prevent_default`.
//! 3. Timers run in due order, ties broken by scheduling order, and only when
//!    [`Page::run_due_timers`] is called.
//! 4. At most one element is focused; focusing a new element blurs the old
//!    one first.
//!
//! # Failure Modes
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Listener returns `Err` | Dispatch stops; no default action; error returned |
//! | Timer task returns `Err` | Remaining due timers stay queued; error returned |
//! | Action on a detached node | Dispatch reaches only the detached subtree |

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use ahash::AHashMap;
use formwire_dom::{ControlKind, Document, Event, EventKind, Key, NodeId, serialize_form};
use web_time::SystemTime;

use crate::bus::{self, EventBus, RENDER, SubscriptionId};
use crate::clock::{Clock, SystemClock};
use crate::environment::{Engine, PageEnvironment};
use crate::error::Result;

/// Element or window event listener.
pub type Listener = Rc<dyn Fn(&mut Page, &mut Event) -> Result<()>>;

/// Deferred work scheduled with [`Page::set_timeout`].
pub type TimerTask = Box<dyn FnOnce(&mut Page) -> Result<()>>;

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Identifies a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// A navigation the page performed or requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// In-page jump to `#fragment`.
    Fragment(String),
    /// `location.href = url`.
    Assign(String),
    /// `window.open(url, target)`.
    Open { url: String, target: String },
    /// Form submission with its encoded body.
    Submit {
        form: NodeId,
        action: Option<String>,
        body: String,
    },
}

struct Timer {
    id: TimerId,
    due: SystemTime,
    task: TimerTask,
}

/// A loaded page.
pub struct Page {
    doc: Document,
    env: PageEnvironment,
    clock: Rc<dyn Clock>,
    bus: EventBus<Page>,
    listeners: AHashMap<(NodeId, EventKind), Vec<(ListenerId, Listener)>>,
    window_listeners: AHashMap<EventKind, Vec<(ListenerId, Listener)>>,
    next_listener: u64,
    timers: Vec<Timer>,
    next_timer: u64,
    navigations: Vec<Navigation>,
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("env", &self.env)
            .field("bus", &self.bus)
            .field("listeners", &self.listeners.values().map(Vec::len).sum::<usize>())
            .field("timers", &self.timers.len())
            .field("navigations", &self.navigations)
            .finish_non_exhaustive()
    }
}

impl Page {
    /// Create a page over `doc`.
    #[must_use]
    pub fn new(doc: Document, env: PageEnvironment, clock: Rc<dyn Clock>) -> Self {
        Self {
            doc,
            env,
            clock,
            bus: EventBus::new(),
            listeners: AHashMap::new(),
            window_listeners: AHashMap::new(),
            next_listener: 0,
            timers: Vec::new(),
            next_timer: 0,
            navigations: Vec::new(),
        }
    }

    /// Create a page that reads the system clock.
    #[must_use]
    pub fn with_system_clock(doc: Document, env: PageEnvironment) -> Self {
        Self::new(doc, env, Rc::new(SystemClock))
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    /// The document.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The document, mutably.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Load-time environment.
    #[must_use]
    pub fn env(&self) -> &PageEnvironment {
        &self.env
    }

    /// Current time from the injected clock.
    #[must_use]
    pub fn now(&self) -> SystemTime {
        self.clock.now()
    }

    /// Navigations performed so far.
    #[must_use]
    pub fn navigations(&self) -> &[Navigation] {
        &self.navigations
    }

    /// Record a navigation.
    pub fn navigate(&mut self, navigation: Navigation) {
        tracing::info!(?navigation, "navigate");
        self.navigations.push(navigation);
    }

    // ---------------------------------------------------------------------
    // Bus
    // ---------------------------------------------------------------------

    /// Subscribe to a bus topic.
    pub fn subscribe(
        &mut self,
        topic: &str,
        handler: impl Fn(&mut Page) -> Result<()> + 'static,
    ) -> SubscriptionId {
        self.bus.subscribe(topic, handler)
    }

    /// Cancel a bus subscription.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Number of handlers subscribed to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.bus.subscriber_count(topic)
    }

    /// Publish `topic`; returns how many handlers ran.
    pub fn publish(&mut self, topic: &str) -> Result<usize> {
        let handlers = self.bus.snapshot(topic);
        bus::run_handlers(self, topic, &handlers)
    }

    /// Ask every behavior to re-derive its visible state.
    pub fn render(&mut self) -> Result<usize> {
        self.publish(RENDER)
    }

    // ---------------------------------------------------------------------
    // Listeners
    // ---------------------------------------------------------------------

    fn next_listener_id(&mut self) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        id
    }

    /// Listen for `kind` on `node`.
    pub fn on(
        &mut self,
        node: NodeId,
        kind: EventKind,
        listener: impl Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.listeners
            .entry((node, kind))
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Listen for `kind` at window level.
    pub fn on_window(
        &mut self,
        kind: EventKind,
        listener: impl Fn(&mut Page, &mut Event) -> Result<()> + 'static,
    ) -> ListenerId {
        let id = self.next_listener_id();
        self.window_listeners
            .entry(kind)
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    /// Remove a listener. Returns whether it existed.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let lists = self
            .listeners
            .values_mut()
            .chain(self.window_listeners.values_mut());
        for list in lists {
            if let Some(pos) = list.iter().position(|(lid, _)| *lid == id) {
                list.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of listeners for `kind` on `node`.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, kind: EventKind) -> usize {
        self.listeners.get(&(node, kind)).map_or(0, Vec::len)
    }

    /// Deliver `event` to its target, ancestors and window listeners.
    pub fn dispatch(&mut self, event: &mut Event) -> Result<()> {
        let _span =
            tracing::trace_span!("page.dispatch", event = %event.kind, target = ?event.target)
                .entered();
        if let Some(target) = event.target {
            let path: Vec<NodeId> = if event.kind.bubbles() {
                std::iter::once(target).chain(self.doc.ancestors(target)).collect()
            } else {
                vec![target]
            };
            for node in path {
                event.current_target = Some(node);
                let list = self
                    .listeners
                    .get(&(node, event.kind))
                    .cloned()
                    .unwrap_or_default();
                for (_, listener) in list {
                    listener(self, event)?;
                }
                if event.propagation_stopped() {
                    return Ok(());
                }
            }
            if !event.kind.bubbles() {
                return Ok(());
            }
        }
        event.current_target = None;
        let list = self
            .window_listeners
            .get(&event.kind)
            .cloned()
            .unwrap_or_default();
        for (_, listener) in list {
            listener(self, event)?;
            if event.propagation_stopped() {
                break;
            }
        }
        Ok(())
    }

    /// Fire a synthetic event of `kind` at `node` (no default action).
    pub fn trigger(&mut self, node: NodeId, kind: EventKind) -> Result<Event> {
        let mut event = Event::new(kind, Some(node));
        self.dispatch(&mut event)?;
        Ok(event)
    }

    // ---------------------------------------------------------------------
    // Native actions
    // ---------------------------------------------------------------------

    /// Click `node` and run the browser's default action unless prevented.
    pub fn click(&mut self, node: NodeId) -> Result<Event> {
        let mut event = Event::new(EventKind::Click, Some(node));
        self.dispatch(&mut event)?;
        if !event.default_prevented() {
            self.click_default(node)?;
        }
        Ok(event)
    }

    fn click_default(&mut self, node: NodeId) -> Result<()> {
        if self.doc.is_disabled(node) {
            return Ok(());
        }
        match self.doc.control_kind(node) {
            Some(ControlKind::Radio) => {
                if !self.doc.checked(node) {
                    self.check_radio(node)?;
                    self.trigger(node, EventKind::Change)?;
                }
            }
            Some(ControlKind::Checkbox) => {
                let checked = self.doc.checked(node);
                self.doc.set_checked(node, !checked)?;
                self.trigger(node, EventKind::Change)?;
            }
            Some(ControlKind::Button) => {
                if self.is_submit_button(node)
                    && let Some(form) = self.doc.form_of(node)
                {
                    self.submit(form)?;
                }
            }
            Some(_) => {}
            None => {
                if self.doc.tag_name(node) == Some("a") {
                    if let Some(href) = self.doc.attr(node, "href").map(str::to_owned) {
                        self.follow_href(&href);
                    }
                } else if let Some(control) = self.label_control(node) {
                    self.click(control)?;
                }
            }
        }
        Ok(())
    }

    fn follow_href(&mut self, href: &str) {
        if let Some(fragment) = href.strip_prefix('#') {
            self.navigate(Navigation::Fragment(fragment.to_owned()));
        } else if !href.starts_with("javascript:") {
            self.navigate(Navigation::Assign(href.to_owned()));
        }
    }

    fn is_submit_button(&self, node: NodeId) -> bool {
        let ty = self
            .doc
            .attr(node, "type")
            .map(str::to_ascii_lowercase);
        match self.doc.tag_name(node) {
            Some("button") => matches!(ty.as_deref(), None | Some("submit")),
            Some("input") => matches!(ty.as_deref(), Some("submit" | "image")),
            _ => false,
        }
    }

    /// The control a click on `node` activates through its enclosing label.
    fn label_control(&self, node: NodeId) -> Option<NodeId> {
        let label = std::iter::once(node)
            .chain(self.doc.ancestors(node))
            .find(|n| self.doc.tag_name(*n) == Some("label"))?;
        if let Some(target) = self.doc.attr(label, "for") {
            return self.doc.by_id(target);
        }
        self.doc
            .descendants(label)
            .into_iter()
            .find(|n| {
                self.doc
                    .control_kind(*n)
                    .is_some_and(|k| k != ControlKind::Button)
            })
    }

    fn check_radio(&mut self, node: NodeId) -> Result<()> {
        let name = self.doc.attr(node, "name").map(str::to_owned);
        if let Some(name) = name.filter(|n| !n.is_empty()) {
            let form = self.doc.form_of(node);
            let group: Vec<NodeId> = self
                .doc
                .elements()
                .into_iter()
                .filter(|n| {
                    *n != node
                        && self.doc.control_kind(*n) == Some(ControlKind::Radio)
                        && self.doc.attr(*n, "name") == Some(name.as_str())
                        && self.doc.form_of(*n) == form
                })
                .collect();
            for other in group {
                self.doc.set_checked(other, false)?;
            }
        }
        self.doc.set_checked(node, true)?;
        Ok(())
    }

    /// Press `key` on `node`.
    ///
    /// Unless prevented, Enter on a link or button clicks it, as does Space
    /// on a button. On [`Engine::Presto`], Enter also clicks elements with
    /// `role="button"`.
    pub fn key_down(&mut self, node: NodeId, key: Key) -> Result<Event> {
        let mut event = Event::key_down(node, key);
        self.dispatch(&mut event)?;
        if event.default_prevented() {
            return Ok(event);
        }
        let is_link = self.doc.tag_name(node) == Some("a") && self.doc.has_attr(node, "href");
        let is_button = self.doc.control_kind(node) == Some(ControlKind::Button);
        let role_button = self.doc.attr(node, "role") == Some("button");
        let activates = match key {
            Key::Enter => {
                is_link || is_button || (role_button && self.env.engine() == Engine::Presto)
            }
            Key::Space => is_button,
            _ => false,
        };
        if activates {
            self.click(node)?;
        }
        Ok(event)
    }

    /// Move focus to `node`, blurring the previous element.
    pub fn focus(&mut self, node: NodeId) -> Result<()> {
        if self.doc.active_element() == Some(node) {
            return Ok(());
        }
        self.blur()?;
        self.doc.set_active_element(Some(node));
        self.trigger(node, EventKind::Focus)?;
        Ok(())
    }

    /// Remove focus from the active element.
    pub fn blur(&mut self) -> Result<()> {
        if let Some(old) = self.doc.active_element() {
            self.doc.set_active_element(None);
            self.trigger(old, EventKind::Blur)?;
        }
        Ok(())
    }

    /// Change a control's value as the user would, firing `change`.
    pub fn fill(&mut self, node: NodeId, value: &str) -> Result<Event> {
        self.doc.set_value(node, value)?;
        self.trigger(node, EventKind::Change)
    }

    /// Submit `form`, unless a listener prevents it.
    pub fn submit(&mut self, form: NodeId) -> Result<Event> {
        let mut event = Event::new(EventKind::Submit, Some(form));
        self.dispatch(&mut event)?;
        if !event.default_prevented() {
            let body = serialize_form(&self.doc, form);
            let action = self.doc.attr(form, "action").map(str::to_owned);
            self.navigate(Navigation::Submit { form, action, body });
        }
        Ok(event)
    }

    /// Attempt to leave the page; returns the confirmation message, if any.
    pub fn before_unload(&mut self) -> Result<Option<String>> {
        let mut event = Event::new(EventKind::BeforeUnload, None);
        self.dispatch(&mut event)?;
        Ok(event.into_return_value())
    }

    // ---------------------------------------------------------------------
    // Timers
    // ---------------------------------------------------------------------

    /// Run `task` once `delay` has elapsed on the page clock.
    pub fn set_timeout(
        &mut self,
        delay: Duration,
        task: impl FnOnce(&mut Page) -> Result<()> + 'static,
    ) -> TimerId {
        let id = TimerId(self.next_timer);
        self.next_timer += 1;
        let due = self.now() + delay;
        tracing::trace!(?id, ?delay, "timer scheduled");
        self.timers.push(Timer {
            id,
            due,
            task: Box::new(task),
        });
        id
    }

    /// Cancel a pending timer. Returns whether it was pending.
    pub fn clear_timeout(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        before != self.timers.len()
    }

    /// Number of timers not yet run.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Run every timer whose due time has passed; returns how many ran.
    pub fn run_due_timers(&mut self) -> Result<usize> {
        let mut ran = 0;
        loop {
            let now = self.now();
            let next = self
                .timers
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due <= now)
                .min_by_key(|(_, t)| (t.due, t.id))
                .map(|(i, _)| i);
            let Some(index) = next else {
                return Ok(ran);
            };
            let timer = self.timers.remove(index);
            (timer.task)(self)?;
            ran += 1;
        }
    }
}
