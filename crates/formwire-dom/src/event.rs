#![forbid(unsafe_code)]

//! DOM event values.
//!
//! An [`Event`] is created by the page for each dispatch and handed to every
//! listener by mutable reference, so listeners can cancel the default action
//! or stop propagation the way browser handlers do.

use std::fmt;

use crate::document::NodeId;

/// Event types the behaviors listen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Activation (mouse click or synthesized from the keyboard).
    Click,
    /// Committed value change of a form control.
    Change,
    /// Custom notification that a computed value was re-rendered.
    Update,
    /// Element received focus.
    Focus,
    /// Element lost focus.
    Blur,
    /// A key went down while the target had focus.
    KeyDown,
    /// A form is being submitted.
    Submit,
    /// The page is about to be unloaded.
    BeforeUnload,
}

impl EventKind {
    /// Whether events of this kind propagate to ancestors.
    #[must_use]
    pub const fn bubbles(self) -> bool {
        !matches!(self, Self::Focus | Self::Blur | Self::BeforeUnload)
    }

    /// DOM event name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Change => "change",
            Self::Update => "update",
            Self::Focus => "focus",
            Self::Blur => "blur",
            Self::KeyDown => "keydown",
            Self::Submit => "submit",
            Self::BeforeUnload => "beforeunload",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Keys the behaviors distinguish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Space bar (key code 32).
    Space,
    /// Enter / Return (key code 13).
    Enter,
    /// Escape (key code 27).
    Escape,
    /// Tab (key code 9).
    Tab,
    /// Any other printable character.
    Char(char),
}

impl Key {
    /// Legacy numeric key code.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::Space => 32,
            Self::Enter => 13,
            Self::Escape => 27,
            Self::Tab => 9,
            Self::Char(c) => c as u32,
        }
    }
}

/// One dispatch of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// What happened.
    pub kind: EventKind,
    /// Element the event was fired at; `None` for window events.
    pub target: Option<NodeId>,
    /// Element whose listener is currently running.
    pub current_target: Option<NodeId>,
    /// Key for [`EventKind::KeyDown`].
    pub key: Option<Key>,
    default_prevented: bool,
    propagation_stopped: bool,
    return_value: Option<String>,
}

impl Event {
    /// Create an event aimed at `target`.
    #[must_use]
    pub fn new(kind: EventKind, target: Option<NodeId>) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            key: None,
            default_prevented: false,
            propagation_stopped: false,
            return_value: None,
        }
    }

    /// Key-down event for `key` at `target`.
    #[must_use]
    pub fn key_down(target: NodeId, key: Key) -> Self {
        Self {
            key: Some(key),
            ..Self::new(EventKind::KeyDown, Some(target))
        }
    }

    /// Cancel the default action.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a listener cancelled the default action.
    #[must_use]
    pub const fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Stop bubbling after the current element's listeners have run.
    pub fn stop_propagation(&mut self) {
        self.propagation_stopped = true;
    }

    /// Whether bubbling was stopped.
    #[must_use]
    pub const fn propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Set the unload confirmation message.
    pub fn set_return_value(&mut self, message: impl Into<String>) {
        self.return_value = Some(message.into());
    }

    /// Unload confirmation message set by a listener.
    #[must_use]
    pub fn return_value(&self) -> Option<&str> {
        self.return_value.as_deref()
    }

    /// Consume the event, yielding its unload message.
    #[must_use]
    pub fn into_return_value(self) -> Option<String> {
        self.return_value
    }
}
