#![forbid(unsafe_code)]

//! Scripted user actions.
//!
//! One action per line; blank lines and `#` comments are skipped. Selectors
//! are a single token (no spaces); the first matching element is used.
//!
//! ```text
//! click #plea_guilty
//! fill [name=fine] 120
//! key a.button space
//! submit form
//! wait 250
//! render
//! unload
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use formwire_dom::{Key, NodeId};
use formwire_runtime::{ManualClock, Page};

use crate::{Error, Result};

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Click the element.
    Click(String),
    /// Set a control's value and fire `change`.
    Fill { selector: String, value: String },
    /// Press a key on the element.
    Key { selector: String, key: Key },
    /// Submit a form.
    Submit(String),
    /// Move focus to the element.
    Focus(String),
    /// Remove focus.
    Blur,
    /// Publish "render".
    Render,
    /// Advance the clock and run due timers.
    Wait(Duration),
    /// Attempt to leave the page.
    Unload,
}

fn parse_key(raw: &str) -> std::result::Result<Key, String> {
    match raw.to_ascii_lowercase().as_str() {
        "space" => Ok(Key::Space),
        "enter" | "return" => Ok(Key::Enter),
        "escape" | "esc" => Ok(Key::Escape),
        "tab" => Ok(Key::Tab),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Key::Char(c)),
                _ => Err(format!("unknown key {raw:?}")),
            }
        }
    }
}

impl FromStr for Action {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        let (target, arg) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
        let arg = arg.trim();
        let selector = || {
            if target.is_empty() {
                Err(format!("`{verb}` needs a selector"))
            } else {
                Ok(target.to_owned())
            }
        };
        match verb {
            "click" => Ok(Self::Click(selector()?)),
            "fill" => Ok(Self::Fill {
                selector: selector()?,
                value: arg.to_owned(),
            }),
            "key" => Ok(Self::Key {
                selector: selector()?,
                key: parse_key(arg)?,
            }),
            "submit" => Ok(Self::Submit(selector()?)),
            "focus" => Ok(Self::Focus(selector()?)),
            "blur" => Ok(Self::Blur),
            "render" => Ok(Self::Render),
            "wait" => target
                .parse::<u64>()
                .map(|ms| Self::Wait(Duration::from_millis(ms)))
                .map_err(|_| format!("`wait` needs milliseconds, got {target:?}")),
            "unload" => Ok(Self::Unload),
            other => Err(format!("unknown action {other:?}")),
        }
    }
}

/// Result of one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The action ran; `prevented` when a listener cancelled the default.
    Dispatched { prevented: bool },
    /// Render handlers notified.
    Rendered(usize),
    /// Timers fired after a wait.
    Timers(usize),
    /// Unload attempt and its confirmation message.
    Unload(Option<String>),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dispatched { prevented: true } => f.write_str("default prevented"),
            Self::Dispatched { prevented: false } => f.write_str("ok"),
            Self::Rendered(n) => write!(f, "{n} render handlers"),
            Self::Timers(n) => write!(f, "{n} timers fired"),
            Self::Unload(Some(message)) => write!(f, "unload blocked: {message}"),
            Self::Unload(None) => f.write_str("unload allowed"),
        }
    }
}

/// Ordered list of actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    actions: Vec<Action>,
}

impl Script {
    /// Parse a script, one action per line.
    pub fn parse(src: &str) -> Result<Self> {
        let actions = src
            .lines()
            .enumerate()
            .filter(|(_, line)| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with('#')
            })
            .map(|(i, line)| {
                line.parse()
                    .map_err(|reason| Error::Script { line: i + 1, reason })
            })
            .collect::<Result<_>>()?;
        Ok(Self { actions })
    }

    /// Script from already parsed actions.
    #[must_use]
    pub fn from_actions(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Parsed actions.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Run every action in order; `clock` must be the page's clock.
    pub fn run(&self, page: &mut Page, clock: &ManualClock) -> Result<Vec<Outcome>> {
        self.actions
            .iter()
            .map(|action| {
                let _span = tracing::debug_span!("script.action", ?action).entered();
                run_action(page, clock, action)
            })
            .collect()
    }
}

fn resolve(page: &Page, selector: &str) -> Result<NodeId> {
    page.document()
        .select(selector)?
        .first()
        .copied()
        .ok_or_else(|| Error::NoMatch(selector.to_owned()))
}

fn run_action(page: &mut Page, clock: &ManualClock, action: &Action) -> Result<Outcome> {
    let event = match action {
        Action::Click(selector) => page.click(resolve(page, selector)?)?,
        Action::Fill { selector, value } => page.fill(resolve(page, selector)?, value)?,
        Action::Key { selector, key } => page.key_down(resolve(page, selector)?, *key)?,
        Action::Submit(selector) => page.submit(resolve(page, selector)?)?,
        Action::Focus(selector) => {
            page.focus(resolve(page, selector)?)?;
            return Ok(Outcome::Dispatched { prevented: false });
        }
        Action::Blur => {
            page.blur()?;
            return Ok(Outcome::Dispatched { prevented: false });
        }
        Action::Render => return Ok(Outcome::Rendered(page.render()?)),
        Action::Wait(by) => {
            clock.advance(*by);
            return Ok(Outcome::Timers(page.run_due_timers()?));
        }
        Action::Unload => return Ok(Outcome::Unload(page.before_unload()?)),
    };
    Ok(Outcome::Dispatched {
        prevented: event.default_prevented(),
    })
}
