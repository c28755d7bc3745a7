#![forbid(unsafe_code)]

//! Runtime configuration as data.
//!
//! [`RuntimeConfig`] carries the page-independent knobs: the unload prompt
//! override, the focus delay, the engine, disabled behaviors and an explicit
//! session deadline. It loads from TOML or JSON; every field has a default,
//! so an empty document is a valid configuration.
//!
//! ```toml
//! prompt_message = "You have unsaved answers"
//! focus_delay_ms = 250
//! engine = "standard"
//! disabled_behaviors = ["external-links"]
//! deadline_unix = 1700003600
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use web_time::SystemTime;

use crate::clock::from_unix_seconds;
use crate::environment::{Engine, PageEnvironment};
use crate::error::{Error, Result};

/// Default delay before focusing a field targeted from the error summary.
pub const DEFAULT_FOCUS_DELAY_MS: u64 = 250;

/// Upper bound accepted for `focus_delay_ms`.
pub const MAX_FOCUS_DELAY_MS: u64 = 10_000;

/// Page-independent runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Overrides any page-supplied unload prompt.
    pub prompt_message: Option<String>,
    /// Delay before focusing the first field of an error-summary target.
    pub focus_delay_ms: u64,
    /// Engine quirks to emulate.
    pub engine: Engine,
    /// Location path reported to analytics.
    pub location_path: String,
    /// Behavior names to skip at bootstrap.
    pub disabled_behaviors: Vec<String>,
    /// Explicit session deadline (Unix seconds); overrides header-derived ones.
    pub deadline_unix: Option<i64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            prompt_message: None,
            focus_delay_ms: DEFAULT_FOCUS_DELAY_MS,
            engine: Engine::Standard,
            location_path: "/".to_owned(),
            disabled_behaviors: Vec::new(),
            deadline_unix: None,
        }
    }
}

impl RuntimeConfig {
    /// Parse a TOML document.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(src: &str) -> Result<Self> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(src: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a `.toml` or `.json` file.
    #[cfg(feature = "policy-config")]
    pub fn load(path: &Path) -> Result<Self> {
        let src = std::fs::read_to_string(path).map_err(|source| Error::ConfigIo {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&src)?
        } else {
            Self::from_toml_str(&src)?
        };
        tracing::debug!(path = %path.display(), ?config, "runtime config loaded");
        Ok(config)
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        if self.focus_delay_ms > MAX_FOCUS_DELAY_MS {
            return Err(Error::ConfigValue {
                key: "focus_delay_ms",
                reason: format!("{} exceeds {MAX_FOCUS_DELAY_MS}", self.focus_delay_ms),
            });
        }
        if self.disabled_behaviors.iter().any(|n| n.trim().is_empty()) {
            return Err(Error::ConfigValue {
                key: "disabled_behaviors",
                reason: "empty behavior name".to_owned(),
            });
        }
        Ok(())
    }

    /// Focus delay as a duration.
    #[must_use]
    pub const fn focus_delay(&self) -> Duration {
        Duration::from_millis(self.focus_delay_ms)
    }

    /// Explicit deadline as an instant.
    #[must_use]
    pub fn deadline(&self) -> Option<SystemTime> {
        self.deadline_unix.map(from_unix_seconds)
    }

    /// Base environment carrying the engine and location path.
    #[must_use]
    pub fn environment(&self) -> PageEnvironment {
        PageEnvironment::new()
            .with_engine(self.engine)
            .with_location_path(self.location_path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write as _;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(
            RuntimeConfig::from_toml_str("").unwrap(),
            RuntimeConfig::default()
        );
        assert_eq!(
            RuntimeConfig::from_json_str("{}").unwrap(),
            RuntimeConfig::default()
        );
    }

    #[test]
    fn toml_fields_parse() {
        let config = RuntimeConfig::from_toml_str(
            r#"
            prompt_message = "Leave?"
            focus_delay_ms = 100
            engine = "presto"
            disabled_behaviors = ["details"]
            deadline_unix = 1700000000
            "#,
        )
        .unwrap();
        assert_eq!(config.prompt_message.as_deref(), Some("Leave?"));
        assert_eq!(config.focus_delay(), Duration::from_millis(100));
        assert_eq!(config.engine, Engine::Presto);
        assert_eq!(config.disabled_behaviors, vec!["details".to_owned()]);
        assert_eq!(config.deadline(), Some(from_unix_seconds(1_700_000_000)));
        assert_eq!(config.environment().engine(), Engine::Presto);
    }

    #[test]
    fn unknown_keys_and_bad_values_are_rejected() {
        assert!(matches!(
            RuntimeConfig::from_toml_str("focus_delay = 1"),
            Err(Error::ConfigToml(_))
        ));
        assert!(matches!(
            RuntimeConfig::from_json_str(r#"{"focus_delay_ms": 999999}"#),
            Err(Error::ConfigValue { key: "focus_delay_ms", .. })
        ));
        assert!(matches!(
            RuntimeConfig::from_json_str(r#"{"engine": "gecko"}"#),
            Err(Error::ConfigJson(_))
        ));
    }

    #[test]
    fn load_picks_format_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("formwire.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"location_path": "/plea/your-details"}}"#).unwrap();
        let config = RuntimeConfig::load(&path).unwrap();
        assert_eq!(config.location_path, "/plea/your-details");

        let missing = dir.path().join("absent.toml");
        assert!(matches!(
            RuntimeConfig::load(&missing),
            Err(Error::ConfigIo { .. })
        ));
    }
}
