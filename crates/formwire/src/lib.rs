#![forbid(unsafe_code)]

//! formwire public facade.
//!
//! Progressive-enhancement behaviors for server-rendered forms, run against
//! an in-memory document. This crate re-exports the building blocks and adds
//! the glue an embedder needs: [`bootstrap`], [`init_tracing`] and a scripted
//! action runner ([`script`]).
//!
//! # Example
//!
//! ```
//! use formwire::prelude::*;
//!
//! let html = r#"
//!   <input class="term" value="10"><input class="term" value="12">
//!   <p class="js-CalculateTotals">0</p>"#;
//! let mut page = Page::with_system_clock(Document::parse(html)?, PageEnvironment::new());
//! let (_registry, report) = formwire::bootstrap(&mut page, &RuntimeConfig::default())?;
//! assert!(report.is_clean());
//! let total = page.document().select(".js-CalculateTotals")?[0];
//! assert_eq!(page.document().text_content(total), "22.00");
//! # Ok::<(), formwire::Error>(())
//! ```

pub mod logging;
pub mod script;

pub use formwire_a11y as a11y;
pub use formwire_behaviors as behaviors;
pub use formwire_dom as dom;
pub use formwire_runtime as runtime;

pub use logging::{LogConfig, LogFormat, init_tracing};
pub use script::{Action, Script};

use formwire_runtime::{InitReport, Page, Registry, RuntimeConfig};

/// Commonly used types.
pub mod prelude {
    pub use formwire_behaviors::{BehaviorConfig, default_registry};
    pub use formwire_dom::{Document, EventKind, Key, NodeId, Selector};
    pub use formwire_runtime::{
        Behavior, InitReport, ManualClock, Navigation, Page, PageEnvironment, Registry,
        RuntimeConfig,
    };
}

/// Errors surfaced by the facade and the command-line runner.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Binding, dispatch or configuration failed.
    #[error(transparent)]
    Runtime(#[from] formwire_runtime::Error),

    /// A document operation failed.
    #[error(transparent)]
    Dom(#[from] formwire_dom::DomError),

    /// An input file could not be read.
    #[error("cannot read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A script line could not be parsed.
    #[error("script line {line}: {reason}")]
    Script { line: usize, reason: String },

    /// A header argument is not `Name: value`.
    #[error("header {0:?} is not `Name: value`")]
    Header(String),

    /// A script action named an element that does not exist.
    #[error("no element matches {0:?}")]
    NoMatch(String),

    /// The tracing subscriber could not be installed.
    #[error("cannot install tracing subscriber: {0}")]
    Logging(String),
}

/// Facade result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Bind every behavior enabled by `config` and run the initial render.
///
/// The returned registry remembers what it bound; calling
/// [`Registry::init_all`] again after inserting markup binds only the new
/// elements.
pub fn bootstrap(page: &mut Page, config: &RuntimeConfig) -> Result<(Registry, InitReport)> {
    let _span = tracing::info_span!("bootstrap").entered();
    let mut registry = formwire_behaviors::default_registry(config);
    let report = registry.init_all(page)?;
    Ok((registry, report))
}
