#![forbid(unsafe_code)]

//! CSS selectors over the document arena.
//!
//! Parsing uses scraper's selector grammar (the `selectors` crate that
//! backs Servo's style engine), so author selectors such as
//! `.term:not(.excluded)`, `h2 + p`, `li:nth-child(2n)` or `a:first-of-type`
//! work as they would in a browser. Matching walks the [`Document`] arena
//! directly through [`selectors::Element`].
//!
//! # Limits
//!
//! | Selector | Result |
//! |----------|--------|
//! | Type, class, id, attribute (all operators), combinators | Matched |
//! | `:not`, `:is`, `:where`, structural pseudo-classes | Matched |
//! | State pseudo-classes (`:checked`, `:focus`, ...) | Rejected at parse time |
//! | Pseudo-elements | Rejected at parse time |

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use cssparser::ParserInput;
use scraper::selector::{Parser as SelectorParser, Simple};
use selectors::attr::{AttrSelectorOperation, CaseSensitivity, NamespaceConstraint};
use selectors::matching::{
    self, ElementSelectorFlags, IgnoreNthChildForInvalidation, MatchingContext, MatchingMode,
    NeedsSelectorFlags, QuirksMode,
};
use selectors::parser::{ParseRelative, SelectorImpl, SelectorList};
use selectors::{NthIndexCache, OpaqueElement};

use crate::document::{Document, NodeId};
use crate::error::{DomError, Result};

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed selector list.
#[derive(Clone)]
pub struct Selector {
    source: String,
    list: Arc<SelectorList<Simple>>,
}

impl Selector {
    /// Parse a selector list.
    pub fn parse(source: &str) -> Result<Self> {
        let trimmed = source.trim();
        if trimmed.is_empty() {
            return Err(DomError::selector(source, "empty selector"));
        }
        let mut input = ParserInput::new(trimmed);
        let mut parser = cssparser::Parser::new(&mut input);
        let list = SelectorList::parse(&SelectorParser, &mut parser, ParseRelative::No)
            .map_err(|err| DomError::selector(source, format!("{:?}", err.kind)))?;
        Ok(Self {
            source: trimmed.to_owned(),
            list: Arc::new(list),
        })
    }

    /// The selector text as given (trimmed).
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether `node` matches any selector in the list.
    #[must_use]
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(element) = ArenaElement::new(doc, node) else {
            return false;
        };
        let mut nth_cache = NthIndexCache::default();
        let mut context = MatchingContext::new(
            MatchingMode::Normal,
            None,
            &mut nth_cache,
            QuirksMode::NoQuirks,
            NeedsSelectorFlags::No,
            IgnoreNthChildForInvalidation::No,
        );
        matching::matches_selector_list(&self.list, &element, &mut context)
    }
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Selector").field(&self.source).finish()
    }
}

impl PartialEq for Selector {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Selector {}

impl FromStr for Selector {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ============================================================================
// selectors::Element over the arena
// ============================================================================

type Impl = Simple;

/// An element of a [`Document`] as seen by the selector matcher.
#[derive(Clone, Copy)]
struct ArenaElement<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl fmt::Debug for ArenaElement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}> {:?}", self.tag(), self.id)
    }
}

impl<'a> ArenaElement<'a> {
    fn new(doc: &'a Document, id: NodeId) -> Option<Self> {
        doc.is_element(id).then_some(Self { doc, id })
    }

    fn tag(&self) -> &'a str {
        self.doc.tag_name(self.id).unwrap_or_default()
    }

    fn attr(&self, name: &str) -> Option<&'a str> {
        self.doc.attr(self.id, name)
    }

    fn sibling_element(&self, step: isize) -> Option<Self> {
        let parent = self.doc.parent(self.id)?;
        let siblings = self.doc.children(parent);
        let mut index = siblings.iter().position(|n| *n == self.id)?;
        loop {
            index = index.checked_add_signed(step)?;
            let candidate = *siblings.get(index)?;
            if let Some(element) = Self::new(self.doc, candidate) {
                return Some(element);
            }
        }
    }
}

impl selectors::Element for ArenaElement<'_> {
    type Impl = Impl;

    fn opaque(&self) -> OpaqueElement {
        match self.doc.element(self.id) {
            Some(element) => OpaqueElement::new(element),
            None => OpaqueElement::new(self.doc),
        }
    }

    fn parent_element(&self) -> Option<Self> {
        self.doc
            .parent_element(self.id)
            .and_then(|parent| Self::new(self.doc, parent))
    }

    fn parent_node_is_shadow_root(&self) -> bool {
        false
    }

    fn containing_shadow_host(&self) -> Option<Self> {
        None
    }

    fn is_pseudo_element(&self) -> bool {
        false
    }

    fn prev_sibling_element(&self) -> Option<Self> {
        self.sibling_element(-1)
    }

    fn next_sibling_element(&self) -> Option<Self> {
        self.sibling_element(1)
    }

    fn first_element_child(&self) -> Option<Self> {
        self.doc
            .children(self.id)
            .iter()
            .find_map(|child| Self::new(self.doc, *child))
    }

    fn is_html_element_in_html_document(&self) -> bool {
        true
    }

    fn has_local_name(&self, name: &<Impl as SelectorImpl>::BorrowedLocalName) -> bool {
        self.tag() == &*name.0
    }

    fn has_namespace(&self, ns: &<Impl as SelectorImpl>::BorrowedNamespaceUrl) -> bool {
        ns.is_empty() || &**ns == HTML_NAMESPACE
    }

    fn is_same_type(&self, other: &Self) -> bool {
        self.tag() == other.tag()
    }

    fn attr_matches(
        &self,
        ns: &NamespaceConstraint<&<Impl as SelectorImpl>::NamespaceUrl>,
        local_name: &<Impl as SelectorImpl>::LocalName,
        operation: &AttrSelectorOperation<&<Impl as SelectorImpl>::AttrValue>,
    ) -> bool {
        if let NamespaceConstraint::Specific(url) = ns
            && !url.is_empty()
        {
            return false;
        }
        self.attr(&local_name.0)
            .is_some_and(|value| operation.eval_str(value))
    }

    fn match_non_ts_pseudo_class(
        &self,
        _pc: &<Impl as SelectorImpl>::NonTSPseudoClass,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn match_pseudo_element(
        &self,
        _pe: &<Impl as SelectorImpl>::PseudoElement,
        _context: &mut MatchingContext<Self::Impl>,
    ) -> bool {
        false
    }

    fn apply_selector_flags(&self, _flags: ElementSelectorFlags) {}

    fn is_link(&self) -> bool {
        matches!(self.tag(), "a" | "area" | "link") && self.attr("href").is_some()
    }

    fn is_html_slot_element(&self) -> bool {
        false
    }

    fn has_id(
        &self,
        id: &<Impl as SelectorImpl>::Identifier,
        case_sensitivity: CaseSensitivity,
    ) -> bool {
        self.attr("id")
            .is_some_and(|value| case_sensitivity.eq(value.as_bytes(), id.0.as_bytes()))
    }

    fn has_class(
        &self,
        name: &<Impl as SelectorImpl>::Identifier,
        case_sensitivity: CaseSensitivity,
    ) -> bool {
        self.attr("class").is_some_and(|list| {
            list.split_ascii_whitespace()
                .any(|class| case_sensitivity.eq(class.as_bytes(), name.0.as_bytes()))
        })
    }

    fn imported_part(
        &self,
        _name: &<Impl as SelectorImpl>::Identifier,
    ) -> Option<<Impl as SelectorImpl>::Identifier> {
        None
    }

    fn is_part(&self, _name: &<Impl as SelectorImpl>::Identifier) -> bool {
        false
    }

    fn is_empty(&self) -> bool {
        self.doc.children(self.id).iter().all(|child| {
            !self.doc.is_element(*child) && self.doc.text_content(*child).is_empty()
        })
    }

    fn is_root(&self) -> bool {
        self.doc.parent(self.id) == Some(self.doc.root())
    }
}
