#![forbid(unsafe_code)]

//! Page runtime for formwire behaviors.
//!
//! - [`Page`]: document, listeners, timers, clock and native user actions.
//! - [`EventBus`]: synchronous topic dispatch; behaviors share the
//!   [`RENDER`] topic.
//! - [`Registry`]: discovers and binds [`Behavior`]s exactly once per element.
//! - [`RuntimeConfig`]: configuration as data (TOML/JSON).
//!
//! # Architecture
//!
//! Everything is single-threaded. Behavior instances are `Rc`-shared state
//! captured by the listeners and bus handlers they register; handlers receive
//! `&mut Page`, so they mutate the document directly and may fire further
//! events. Handler lists are cloned before dispatch, so a handler can
//! register or remove handlers without invalidating the running dispatch.

pub mod bus;
pub mod clock;
pub mod config;
pub mod environment;
pub mod error;
pub mod page;
pub mod registry;

pub use bus::{BusHandler, EventBus, RENDER, SubscriptionId};
pub use clock::{Clock, ManualClock, SystemClock, from_unix_seconds, unix_seconds};
pub use config::{DEFAULT_FOCUS_DELAY_MS, RuntimeConfig};
pub use environment::{AnalyticsEvent, AnalyticsSink, Engine, PageEnvironment, RecordingAnalytics};
pub use error::{Error, Result};
pub use page::{Listener, ListenerId, Navigation, Page, TimerId, TimerTask};
pub use registry::{BindFailure, Behavior, InitReport, InstanceKey, Registry};
