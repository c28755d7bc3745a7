//! Runtime error type.
//!
//! Behaviors report configuration problems through this type; the
//! [`Registry`](crate::Registry) collects them per instance instead of
//! aborting the bootstrap.

use formwire_dom::DomError;

/// Errors raised while binding behaviors or dispatching events.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A document operation failed.
    #[error(transparent)]
    Dom(#[from] DomError),

    /// The subject element lacks an attribute the behavior needs.
    #[error("<{element}> is missing required attribute `{attribute}`")]
    MissingAttribute {
        attribute: &'static str,
        element: String,
    },

    /// An attribute is present but unusable.
    #[error("attribute `{attribute}` has invalid value {value:?}: {reason}")]
    InvalidAttribute {
        attribute: &'static str,
        value: String,
        reason: String,
    },

    /// A regular expression failed to compile.
    #[error("invalid pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A configuration file could not be read.
    #[error("cannot read config {path}")]
    ConfigIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A TOML configuration document is malformed.
    #[cfg(feature = "policy-config")]
    #[error("invalid TOML config")]
    ConfigToml(#[from] toml::de::Error),

    /// A JSON configuration document is malformed.
    #[cfg(feature = "policy-config")]
    #[error("invalid JSON config")]
    ConfigJson(#[from] serde_json::Error),

    /// A configuration value is out of range or unknown.
    #[error("invalid config value for `{key}`: {reason}")]
    ConfigValue { key: &'static str, reason: String },

    /// An event or bus handler failed.
    #[error("handler failed: {0}")]
    Handler(String),
}

impl Error {
    /// Build a [`Error::MissingAttribute`] naming the subject's tag.
    pub fn missing_attribute(attribute: &'static str, element: impl Into<String>) -> Self {
        Self::MissingAttribute {
            attribute,
            element: element.into(),
        }
    }

    /// Build an [`Error::InvalidAttribute`].
    pub fn invalid_attribute(
        attribute: &'static str,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidAttribute {
            attribute,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;
