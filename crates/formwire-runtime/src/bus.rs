#![forbid(unsafe_code)]

//! Synchronous publish/subscribe channel shared by all behaviors.
//!
//! An [`EventBus<C>`] maps topic names to handler lists. Handlers receive a
//! mutable context (the [`Page`](crate::Page) in practice) so a "render"
//! broadcast can mutate the document directly.
//!
//! # Invariants
//!
//! 1. Handlers of one topic run in subscription order.
//! 2. `publish` is synchronous: every handler has returned (or one failed)
//!    before `publish` returns.
//! 3. The handler list is snapshotted when a publish starts. Handlers added
//!    during the dispatch first run on the next publish; handlers removed
//!    during the dispatch still run in the current one.
//! 4. Unsubscribing an unknown or already-removed id is a no-op.
//!
//! # Failure Modes
//!
//! | Failure | Effect |
//! |---------|--------|
//! | Handler returns `Err` | Remaining handlers of that publish are skipped; the error is returned |
//! | Publish on a topic nobody subscribed | Returns `Ok(0)` |

use std::fmt;
use std::rc::Rc;

use ahash::AHashMap;

use crate::error::Result;

/// Topic every behavior subscribes to for re-evaluation.
pub const RENDER: &str = "render";

/// Handler invoked with the bus context.
pub type BusHandler<C> = Rc<dyn Fn(&mut C) -> Result<()>>;

/// Identifies one subscription for later removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Topic-keyed handler registry.
pub struct EventBus<C> {
    topics: AHashMap<String, Vec<(SubscriptionId, BusHandler<C>)>>,
    next_id: u64,
}

impl<C> Default for EventBus<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for EventBus<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .topics
            .iter()
            .map(|(topic, handlers)| (topic.as_str(), handlers.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus")
            .field("topics", &counts)
            .finish()
    }
}

impl<C> EventBus<C> {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            topics: AHashMap::new(),
            next_id: 0,
        }
    }

    /// Register `handler` for `topic`.
    pub fn subscribe(
        &mut self,
        topic: &str,
        handler: impl Fn(&mut C) -> Result<()> + 'static,
    ) -> SubscriptionId {
        self.subscribe_rc(topic, Rc::new(handler))
    }

    /// Register an already shared handler.
    pub fn subscribe_rc(&mut self, topic: &str, handler: BusHandler<C>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.topics
            .entry(topic.to_owned())
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a subscription. Returns whether it existed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for handlers in self.topics.values_mut() {
            if let Some(pos) = handlers.iter().position(|(sid, _)| *sid == id) {
                handlers.remove(pos);
                return true;
            }
        }
        false
    }

    /// Number of handlers subscribed to `topic`.
    #[must_use]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics.get(topic).map_or(0, Vec::len)
    }

    /// Copy of the handler list for `topic`, in subscription order.
    #[must_use]
    pub fn snapshot(&self, topic: &str) -> Vec<BusHandler<C>> {
        self.topics
            .get(topic)
            .map(|handlers| handlers.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }

    /// Publish `topic` to a context that does not own this bus.
    ///
    /// Returns the number of handlers that ran.
    pub fn publish(&self, ctx: &mut C, topic: &str) -> Result<usize> {
        run_handlers(ctx, topic, &self.snapshot(topic))
    }
}

/// Run a snapshotted handler list, stopping at the first failure.
pub fn run_handlers<C>(ctx: &mut C, topic: &str, handlers: &[BusHandler<C>]) -> Result<usize> {
    let _span = tracing::debug_span!("bus.publish", topic, handlers = handlers.len()).entered();
    for (ran, handler) in handlers.iter().enumerate() {
        if let Err(err) = handler(ctx) {
            tracing::debug!(topic, ran, error = %err, "bus handler failed");
            return Err(err);
        }
    }
    Ok(handlers.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use proptest::prelude::*;

    #[derive(Default)]
    struct Log(Vec<&'static str>);

    #[test]
    fn handlers_run_in_subscription_order() {
        let mut bus: EventBus<Log> = EventBus::new();
        bus.subscribe(RENDER, |log| {
            log.0.push("a");
            Ok(())
        });
        bus.subscribe(RENDER, |log| {
            log.0.push("b");
            Ok(())
        });
        bus.subscribe("other", |log| {
            log.0.push("x");
            Ok(())
        });
        let mut log = Log::default();
        assert_eq!(bus.publish(&mut log, RENDER).unwrap(), 2);
        assert_eq!(log.0, vec!["a", "b"]);
    }

    #[test]
    fn failing_handler_aborts_remaining_dispatch() {
        let mut bus: EventBus<Log> = EventBus::new();
        bus.subscribe(RENDER, |log| {
            log.0.push("first");
            Ok(())
        });
        bus.subscribe(RENDER, |_| Err(Error::Handler("boom".into())));
        bus.subscribe(RENDER, |log| {
            log.0.push("never");
            Ok(())
        });
        let mut log = Log::default();
        let err = bus.publish(&mut log, RENDER).unwrap_err();
        assert!(matches!(err, Error::Handler(ref m) if m == "boom"));
        assert_eq!(log.0, vec!["first"]);
    }

    #[test]
    fn unknown_topic_runs_nothing() {
        let bus: EventBus<Log> = EventBus::new();
        let mut log = Log::default();
        assert_eq!(bus.publish(&mut log, "nobody").unwrap(), 0);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let mut bus: EventBus<Log> = EventBus::new();
        let a = bus.subscribe(RENDER, |log| {
            log.0.push("a");
            Ok(())
        });
        bus.subscribe(RENDER, |log| {
            log.0.push("b");
            Ok(())
        });
        assert!(bus.unsubscribe(a));
        assert!(!bus.unsubscribe(a));
        let mut log = Log::default();
        bus.publish(&mut log, RENDER).unwrap();
        assert_eq!(log.0, vec!["b"]);
        assert_eq!(bus.subscriber_count(RENDER), 1);
    }

    #[test]
    fn snapshot_is_detached_from_later_subscriptions() {
        let mut bus: EventBus<Log> = EventBus::new();
        bus.subscribe(RENDER, |log| {
            log.0.push("a");
            Ok(())
        });
        let snap = bus.snapshot(RENDER);
        bus.subscribe(RENDER, |log| {
            log.0.push("late");
            Ok(())
        });
        let mut log = Log::default();
        run_handlers(&mut log, RENDER, &snap).unwrap();
        assert_eq!(log.0, vec!["a"]);
    }

    proptest! {
        #[test]
        fn surviving_handlers_keep_subscription_order(
            subs in proptest::collection::vec((0usize..3, any::<bool>()), 0..24),
        ) {
            let topics = ["render", "change", "submit"];
            let mut bus: EventBus<Vec<usize>> = EventBus::new();
            let mut ids = Vec::new();
            for (index, (topic, _)) in subs.iter().enumerate() {
                ids.push(bus.subscribe(topics[*topic], move |log: &mut Vec<usize>| {
                    log.push(index);
                    Ok(())
                }));
            }
            for (id, (_, remove)) in ids.iter().zip(&subs) {
                if *remove {
                    prop_assert!(bus.unsubscribe(*id));
                }
            }
            for (t, topic) in topics.iter().enumerate() {
                let mut log = Vec::new();
                let ran = bus.publish(&mut log, topic).unwrap();
                let expected: Vec<usize> = subs
                    .iter()
                    .enumerate()
                    .filter(|(_, (st, remove))| *st == t && !remove)
                    .map(|(index, _)| index)
                    .collect();
                prop_assert_eq!(ran, expected.len());
                prop_assert_eq!(log, expected);
            }
        }
    }
}
