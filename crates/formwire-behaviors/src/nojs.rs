#![forbid(unsafe_code)]

//! Removes controls that only make sense without scripting.
//!
//! Pages render a split-form submit for script-less browsers; once behaviors
//! run, the single-page flow replaces it.

use formwire_dom::{Document, NodeId};
use formwire_runtime::{Behavior, Page, Result};

/// Elements removed at bootstrap.
pub const SELECTOR: &str = ".nojs-only[name=split_form]";

/// No-script fallback removal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoJsCleanup;

impl Behavior for NoJsCleanup {
    fn name(&self) -> &'static str {
        "nojs-cleanup"
    }

    fn discover(&self, doc: &Document) -> Result<Vec<NodeId>> {
        Ok(doc.select(SELECTOR)?)
    }

    fn bind(&self, page: &mut Page, node: NodeId) -> Result<()> {
        page.document_mut().detach(node)?;
        Ok(())
    }
}
