#![forbid(unsafe_code)]

//! Behavior configuration as data, and the standard registry.
//!
//! Element-bound behaviors normally read their settings from `data-*`
//! attributes; [`BehaviorConfig`] carries the same settings explicitly so an
//! instance can be bound from code or a configuration file:
//!
//! ```json
//! {"behavior": "totals", "terms": ".fine", "precision": 0}
//! ```

use formwire_dom::NodeId;
use formwire_runtime::{Page, Registry, Result, RuntimeConfig};
use serde::{Deserialize, Serialize};

use crate::button_keys::ButtonKeys;
use crate::conditional::{Conditional, ConditionalConfig};
use crate::details::{Details, DetailsConfig};
use crate::external_links::{ExternalLinks, ExternalLinksConfig};
use crate::focus::{FocusConfig, FocusHandler};
use crate::guard::{GuardConfig, UnsavedChangesGuard};
use crate::nojs::NoJsCleanup;
use crate::selection::SelectionButtons;
use crate::templated::{Templated, TemplatedConfig};
use crate::totals::{Totals, TotalsConfig};

/// Names of the behaviors in [`default_registry`], in binding order.
pub const BEHAVIOR_NAMES: [&str; 10] = [
    "nojs-cleanup",
    "conditional",
    "details",
    "external-links",
    "focus",
    "unsaved-changes",
    "selection",
    "templated",
    "totals",
    "button-keys",
];

/// Settings for one behavior instance, tagged by behavior name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "behavior", rename_all = "kebab-case")]
pub enum BehaviorConfig {
    /// Conditional reveal.
    Conditional(ConditionalConfig),
    /// Templated text.
    Templated(TemplatedConfig),
    /// Disclosure widget.
    Details(DetailsConfig),
    /// Running total.
    Totals(TotalsConfig),
    /// Unsaved-changes guard (page level).
    UnsavedChanges(GuardConfig),
    /// Focus management (page level).
    Focus(FocusConfig),
    /// External link tracking.
    ExternalLinks(ExternalLinksConfig),
}

impl BehaviorConfig {
    /// Name of the behavior this configures.
    #[must_use]
    pub const fn behavior(&self) -> &'static str {
        match self {
            Self::Conditional(_) => "conditional",
            Self::Templated(_) => "templated",
            Self::Details(_) => "details",
            Self::Totals(_) => "totals",
            Self::UnsavedChanges(_) => "unsaved-changes",
            Self::Focus(_) => "focus",
            Self::ExternalLinks(_) => "external-links",
        }
    }

    /// Bind one instance to `node` with these settings.
    ///
    /// Page-level behaviors ignore `node`.
    pub fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        let _span = tracing::debug_span!("behavior.bind", behavior = self.behavior()).entered();
        match self {
            Self::Conditional(config) => Conditional::bind_with(page, node, config).map(drop),
            Self::Templated(config) => Templated::bind_with(page, node, config).map(drop),
            Self::Details(config) => Details::bind_with(page, node, config).map(drop),
            Self::Totals(config) => Totals::bind_with(page, node, config).map(drop),
            Self::UnsavedChanges(config) => UnsavedChangesGuard::bind_with(page, config).map(drop),
            Self::Focus(config) => FocusHandler::bind_with(page, *config),
            Self::ExternalLinks(config) => {
                ExternalLinks::bind_with(page, node, config);
                Ok(())
            }
        }
    }
}

/// Registry with every behavior, configured from `config`.
///
/// Names in `disabled_behaviors` are skipped; unknown names are logged.
#[must_use]
pub fn default_registry(config: &RuntimeConfig) -> Registry {
    let mut registry = Registry::new();
    registry
        .register(NoJsCleanup)
        .register(Conditional)
        .register(Details)
        .register(ExternalLinks)
        .register(FocusHandler::new(FocusConfig::from_runtime(config)))
        .register(UnsavedChangesGuard::new(GuardConfig::from_runtime(config)))
        .register(SelectionButtons)
        .register(Templated)
        .register(Totals)
        .register(ButtonKeys);
    for name in &config.disabled_behaviors {
        if !BEHAVIOR_NAMES.contains(&name.as_str()) {
            tracing::warn!(behavior = %name, "disabling unknown behavior");
        }
        registry.disable(name.clone());
    }
    registry
}
