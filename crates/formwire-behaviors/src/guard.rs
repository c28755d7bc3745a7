#![forbid(unsafe_code)]

//! Unsaved-changes guard.
//!
//! Snapshots the serialized state of every form when it binds and, when the
//! user tries to leave, returns a confirmation message if the state has
//! changed since. Submitting any form disables the guard, and so does
//! passing the session deadline.
//!
//! # Message
//!
//! First non-empty of: the configured message, the value of a
//! `[name=promptOnChangeMessage]` field, an inline
//! `var promptOnChangeMessage = "..."` script, [`DEFAULT_MESSAGE`].
//!
//! # Deadline
//!
//! First available of:
//!
//! | Source | Deadline |
//! |--------|----------|
//! | Configured deadline | as given |
//! | `Refresh: N` header | `Date` header (or now) + N seconds |
//! | `<meta http-equiv="refresh" content="N">` | now + (N - 1) seconds |
//! | Inline `var sessionTimeout = <unix seconds>` | as given |
//!
//! # Invariants
//!
//! 1. Once disabled the guard never prompts again.
//! 2. Disabling replaces the snapshot with the state at that moment.
//! 3. An unchanged snapshot never prompts.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use formwire_dom::{Document, EventKind, NodeId, serialize_forms};
use formwire_runtime::{
    Behavior, Error, Page, Result, RuntimeConfig, from_unix_seconds, unix_seconds,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use web_time::SystemTime;

/// Message used when the page supplies none.
pub const DEFAULT_MESSAGE: &str = "You have entered some information";

/// Name of the hidden field that may carry the message.
pub const MESSAGE_FIELD: &str = "promptOnChangeMessage";

const INLINE_MESSAGE: &str = r#"var\s+promptOnChangeMessage\s*=\s*(?:"((?:[^"\\]|\\.)*)"|'((?:[^'\\]|\\.)*)')"#;
const INLINE_TIMEOUT: &str = r"var\s+sessionTimeout\s*=\s*(\d+)";

/// Explicit guard settings; page-derived values fill the gaps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuardConfig {
    /// Message overriding anything the page declares.
    pub message: Option<String>,
    /// Deadline (Unix seconds) overriding anything the page declares.
    pub deadline_unix: Option<i64>,
}

impl GuardConfig {
    /// Guard settings carried by the runtime configuration.
    #[must_use]
    pub fn from_runtime(config: &RuntimeConfig) -> Self {
        Self {
            message: config.prompt_message.clone(),
            deadline_unix: config.deadline_unix,
        }
    }
}

/// Where the session deadline came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineSource {
    /// [`GuardConfig::deadline_unix`].
    Config,
    /// `Refresh` response header.
    RefreshHeader,
    /// `<meta http-equiv="refresh">`.
    MetaRefresh,
    /// Inline `sessionTimeout` script variable.
    InlineScript,
}

// ---------------------------------------------------------------------------
// Page scanning
// ---------------------------------------------------------------------------

/// Values declared by inline `<script>` blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineVars {
    /// `promptOnChangeMessage`, unescaped.
    pub message: Option<String>,
    /// `sessionTimeout`, Unix seconds.
    pub session_timeout: Option<i64>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| Error::InvalidPattern {
        pattern: pattern.to_owned(),
        source,
    })
}

fn unescape_js(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Scan inline scripts for the guard's variables; the first declaration wins.
pub fn inline_vars(doc: &Document) -> Result<InlineVars> {
    let message_re = compile(INLINE_MESSAGE)?;
    let timeout_re = compile(INLINE_TIMEOUT)?;
    let mut vars = InlineVars::default();
    for script in doc.select("script")? {
        let source = doc.text_content(script);
        if vars.message.is_none()
            && let Some(caps) = message_re.captures(&source)
        {
            vars.message = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| unescape_js(m.as_str()));
        }
        if vars.session_timeout.is_none() {
            vars.session_timeout = timeout_re
                .captures(&source)
                .and_then(|caps| caps[1].parse().ok());
        }
    }
    Ok(vars)
}

/// Leading seconds of a `Refresh` header or meta `content` (`"60;url=/x"`).
#[must_use]
pub fn refresh_seconds(content: &str) -> Option<u64> {
    content
        .split([';', ','])
        .next()
        .and_then(|secs| secs.trim().parse().ok())
}

fn meta_refresh(doc: &Document) -> Result<Option<u64>> {
    Ok(doc
        .select("meta[http-equiv]")?
        .into_iter()
        .filter(|m| {
            doc.attr(*m, "http-equiv")
                .is_some_and(|v| v.eq_ignore_ascii_case("refresh"))
        })
        .find_map(|m| doc.attr(m, "content").and_then(refresh_seconds)))
}

/// Resolve the prompt message.
pub fn resolve_message(doc: &Document, config: &GuardConfig) -> Result<String> {
    if let Some(message) = config.message.as_ref().filter(|m| !m.is_empty()) {
        return Ok(message.clone());
    }
    let field = crate::group::named(doc, MESSAGE_FIELD)
        .into_iter()
        .find_map(|n| doc.value(n).filter(|v| !v.is_empty()));
    if let Some(message) = field {
        return Ok(message);
    }
    Ok(inline_vars(doc)?
        .message
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| DEFAULT_MESSAGE.to_owned()))
}

/// Resolve the session deadline against the page clock.
pub fn resolve_deadline(
    page: &Page,
    config: &GuardConfig,
) -> Result<Option<(SystemTime, DeadlineSource)>> {
    if let Some(secs) = config.deadline_unix {
        return Ok(Some((from_unix_seconds(secs), DeadlineSource::Config)));
    }
    let now = page.now();
    if let Some(refresh) = page.env().header("Refresh").and_then(refresh_seconds) {
        let base = match page.env().header("Date") {
            Some(date) => match chrono::DateTime::parse_from_rfc2822(date) {
                Ok(parsed) => parsed.timestamp(),
                Err(err) => {
                    tracing::debug!(%date, %err, "unparseable Date header, using clock");
                    unix_seconds(now)
                }
            },
            None => unix_seconds(now),
        };
        let secs = base.saturating_add(i64::try_from(refresh).unwrap_or(i64::MAX));
        return Ok(Some((from_unix_seconds(secs), DeadlineSource::RefreshHeader)));
    }
    if let Some(refresh) = meta_refresh(page.document())? {
        let deadline = now + Duration::from_secs(refresh.saturating_sub(1));
        return Ok(Some((deadline, DeadlineSource::MetaRefresh)));
    }
    Ok(inline_vars(page.document())?
        .session_timeout
        .map(|secs| (from_unix_seconds(secs), DeadlineSource::InlineScript)))
}

// ---------------------------------------------------------------------------
// Instance
// ---------------------------------------------------------------------------

/// The bound guard.
#[derive(Debug)]
pub struct GuardInstance {
    message: String,
    deadline: Option<(SystemTime, DeadlineSource)>,
    snapshot: RefCell<String>,
    enabled: Cell<bool>,
}

impl GuardInstance {
    /// Prompt message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Session deadline, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline.map(|(at, _)| at)
    }

    /// Where the deadline came from.
    #[must_use]
    pub fn deadline_source(&self) -> Option<DeadlineSource> {
        self.deadline.map(|(_, source)| source)
    }

    /// Whether the guard can still prompt.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    /// Serialized form state the guard compares against.
    #[must_use]
    pub fn snapshot(&self) -> String {
        self.snapshot.borrow().clone()
    }

    /// Whether the forms differ from the snapshot.
    #[must_use]
    pub fn fields_changed(&self, doc: &Document) -> bool {
        serialize_forms(doc) != *self.snapshot.borrow()
    }

    /// Stop prompting; the snapshot becomes the current state.
    pub fn disable(&self, doc: &Document) {
        *self.snapshot.borrow_mut() = serialize_forms(doc);
        if self.enabled.replace(false) {
            tracing::debug!("unsaved-changes guard disabled");
        }
    }

    /// The message to show if the user leaves now.
    pub fn check(&self, page: &Page) -> Option<String> {
        if let Some(deadline) = self.deadline()
            && page.now() >= deadline
            && self.is_enabled()
        {
            tracing::info!("session deadline passed, leaving without prompt");
            self.disable(page.document());
        }
        (self.is_enabled() && self.fields_changed(page.document())).then(|| self.message.clone())
    }
}

/// Unsaved-changes guard behavior; one instance per page.
#[derive(Debug, Clone, Default)]
pub struct UnsavedChangesGuard {
    config: GuardConfig,
}

impl UnsavedChangesGuard {
    /// Guard with explicit settings.
    #[must_use]
    pub fn new(config: GuardConfig) -> Self {
        Self { config }
    }

    /// Bind the page-level guard.
    pub fn bind_with(page: &mut Page, config: &GuardConfig) -> Result<Rc<GuardInstance>> {
        let message = resolve_message(page.document(), config)?;
        let deadline = resolve_deadline(page, config)?;
        let instance = Rc::new(GuardInstance {
            message,
            deadline,
            snapshot: RefCell::new(serialize_forms(page.document())),
            enabled: Cell::new(true),
        });
        tracing::debug!(
            snapshot = %instance.snapshot.borrow(),
            deadline = ?instance.deadline_source(),
            "unsaved-changes guard bound"
        );

        for form in page.document().select("form")? {
            let inst = Rc::clone(&instance);
            page.on(form, EventKind::Submit, move |page, _| {
                inst.disable(page.document());
                Ok(())
            });
        }
        let inst = Rc::clone(&instance);
        page.on_window(EventKind::BeforeUnload, move |page, event| {
            if let Some(message) = inst.check(page) {
                event.set_return_value(message);
            }
            Ok(())
        });
        Ok(instance)
    }
}

impl Behavior for UnsavedChangesGuard {
    fn name(&self) -> &'static str {
        "unsaved-changes"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(vec![doc.root()])
    }

    fn bind(&self, page: &mut Page, _node: NodeId) -> Result<()> {
        Self::bind_with(page, &self.config).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwire_runtime::{ManualClock, PageEnvironment};
    use pretty_assertions::assert_eq;

    const START: u64 = 1_700_000_000;

    const FIXTURE: &str = r#"
        <form action="/plea">
          <input type="text" name="testField" value="test value">
          <button type="submit">Continue</button>
        </form>
    "#;

    fn page_with(html: &str, env: PageEnvironment) -> (Page, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::at_unix(START));
        let page = Page::new(Document::parse(html).unwrap(), env, clock.clone());
        (page, clock)
    }

    fn guard(page: &mut Page) -> Rc<GuardInstance> {
        UnsavedChangesGuard::bind_with(page, &GuardConfig::default()).unwrap()
    }

    fn field(page: &Page) -> NodeId {
        page.document().select("[name=testField]").unwrap()[0]
    }

    #[test]
    fn snapshot_is_serialized_forms() {
        let (mut page, _) = page_with(FIXTURE, PageEnvironment::new());
        let guard = guard(&mut page);
        assert_eq!(guard.snapshot(), "testField=test+value");
        assert_eq!(guard.message(), DEFAULT_MESSAGE);
        assert!(guard.is_enabled());
    }

    #[test]
    fn unmodified_page_leaves_silently() {
        let (mut page, _) = page_with(FIXTURE, PageEnvironment::new());
        guard(&mut page);
        assert_eq!(page.before_unload().unwrap(), None);
    }

    #[test]
    fn edited_page_prompts() {
        let (mut page, _) = page_with(FIXTURE, PageEnvironment::new());
        guard(&mut page);
        let input = field(&page);
        page.fill(input, "changed").unwrap();
        assert_eq!(page.before_unload().unwrap().as_deref(), Some(DEFAULT_MESSAGE));
    }

    #[test]
    fn submit_disables_for_good() {
        let (mut page, _) = page_with(FIXTURE, PageEnvironment::new());
        let guard = guard(&mut page);
        let input = field(&page);
        page.fill(input, "changed").unwrap();
        let form = page.document().select("form").unwrap()[0];
        page.submit(form).unwrap();
        assert!(!guard.is_enabled());
        assert_eq!(guard.snapshot(), "testField=changed");
        page.fill(input, "changed again").unwrap();
        assert_eq!(page.before_unload().unwrap(), None);
    }

    #[test]
    fn hidden_field_supplies_message() {
        let html = FIXTURE.replace(
            "</form>",
            r#"<input type="hidden" name="promptOnChangeMessage" value="New message"></form>"#,
        );
        let (mut page, _) = page_with(&html, PageEnvironment::new());
        assert_eq!(guard(&mut page).message(), "New message");
    }

    #[test]
    fn inline_script_supplies_message_and_timeout() {
        let html = format!(
            r#"{FIXTURE}<script>
                 var promptOnChangeMessage = "Leave \"now\"?";
                 var sessionTimeout = {};
               </script>"#,
            START + 30
        );
        let (mut page, clock) = page_with(&html, PageEnvironment::new());
        let guard = guard(&mut page);
        assert_eq!(guard.message(), r#"Leave "now"?"#);
        assert_eq!(guard.deadline_source(), Some(DeadlineSource::InlineScript));

        let input = field(&page);
        page.fill(input, "changed").unwrap();
        clock.advance(Duration::from_secs(30));
        assert_eq!(page.before_unload().unwrap(), None);
        assert!(!guard.is_enabled());
    }

    #[test]
    fn configured_message_wins() {
        let (mut page, _) = page_with(FIXTURE, PageEnvironment::new());
        let config = GuardConfig {
            message: Some("Configured".into()),
            deadline_unix: None,
        };
        let guard = UnsavedChangesGuard::bind_with(&mut page, &config).unwrap();
        assert_eq!(guard.message(), "Configured");
    }

    #[test]
    fn meta_refresh_deadline_is_one_second_early() {
        let html = format!(r#"<meta http-equiv="Refresh" content="60;url=/session-timeout/">{FIXTURE}"#);
        let (mut page, clock) = page_with(&html, PageEnvironment::new());
        let guard = guard(&mut page);
        assert_eq!(guard.deadline_source(), Some(DeadlineSource::MetaRefresh));
        let input = field(&page);
        page.fill(input, "changed").unwrap();

        clock.advance(Duration::from_secs(58));
        assert!(page.before_unload().unwrap().is_some());
        clock.advance(Duration::from_secs(3));
        assert_eq!(page.before_unload().unwrap(), None);
    }

    #[test]
    fn refresh_header_uses_date_header() {
        let env = PageEnvironment::new()
            .with_header("Refresh", "3600")
            .with_header("Date", "Tue, 14 Nov 2023 22:13:20 GMT");
        let (mut page, _) = page_with(FIXTURE, env);
        let guard = guard(&mut page);
        assert_eq!(guard.deadline_source(), Some(DeadlineSource::RefreshHeader));
        assert_eq!(guard.deadline(), Some(from_unix_seconds(1_700_000_000 + 3600)));
    }

    #[test]
    fn refresh_header_without_date_uses_clock() {
        let env = PageEnvironment::new().with_header("refresh", "60; url=/timeout");
        let (mut page, _) = page_with(FIXTURE, env);
        let guard = guard(&mut page);
        let expected = from_unix_seconds(i64::try_from(START).unwrap() + 60);
        assert_eq!(guard.deadline(), Some(expected));
    }

    #[test]
    fn configured_deadline_beats_headers() {
        let env = PageEnvironment::new().with_header("Refresh", "60");
        let (mut page, _) = page_with(FIXTURE, env);
        let config = GuardConfig {
            message: None,
            deadline_unix: Some(42),
        };
        let guard = UnsavedChangesGuard::bind_with(&mut page, &config).unwrap();
        assert_eq!(guard.deadline_source(), Some(DeadlineSource::Config));
        assert_eq!(guard.deadline(), Some(from_unix_seconds(42)));
    }

    #[test]
    fn refresh_seconds_parses_leading_number() {
        assert_eq!(refresh_seconds("60"), Some(60));
        assert_eq!(refresh_seconds(" 5 ;url=/x"), Some(5));
        assert_eq!(refresh_seconds("soon"), None);
    }

    #[test]
    fn single_quoted_inline_message() {
        let doc = Document::parse(r"<script>var promptOnChangeMessage = 'It\'s unsaved';</script>")
            .unwrap();
        let vars = inline_vars(&doc).unwrap();
        assert_eq!(vars.message.as_deref(), Some("It's unsaved"));
        assert_eq!(vars.session_timeout, None);
    }
}
