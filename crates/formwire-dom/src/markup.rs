#![forbid(unsafe_code)]

//! Markup loading.
//!
//! Markup goes through scraper's html5ever tree builder, so the arena sees
//! the same tree a browser would build: implied end tags, foster parenting,
//! character references and raw-text elements are handled by the parser.
//! The resulting tree is copied into the [`Document`] arena; comments,
//! doctypes and processing instructions are dropped.
//!
//! | Input | Parsed as |
//! |-------|-----------|
//! | Starts with `<!doctype` or `<html` | Whole document (`html`/`head`/`body` kept) |
//! | Anything else | Fragment in a `<body>` context |
//!
//! Parsing never fails; malformed markup is recovered the way browsers
//! recover it.

use scraper::{Html, Node};

use crate::document::{Document, NodeId};
use crate::error::Result;

impl Document {
    /// Parse markup into a fresh document.
    pub fn parse(html: &str) -> Result<Self> {
        let mut doc = Self::new();
        let root = doc.root();
        if is_whole_document(html) {
            doc.graft(root, &Html::parse_document(html), true)?;
        } else {
            doc.graft(root, &Html::parse_fragment(html), false)?;
        }
        Ok(doc)
    }

    /// Parse a fragment and append the resulting nodes under `parent`.
    pub fn append_markup(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
        let before = self.children(parent).len();
        self.graft(parent, &Html::parse_fragment(html), false)?;
        Ok(self.children(parent)[before..].to_vec())
    }

    /// Copy a parsed tree under `parent`. With `whole`, the `<html>` element
    /// itself is copied; otherwise only its children (the fragment).
    fn graft(&mut self, parent: NodeId, parsed: &Html, whole: bool) -> Result<()> {
        let top = parsed.root_element();
        let mut pending: Vec<_> = if whole {
            vec![(*top, parent)]
        } else {
            top.children().rev().map(|child| (child, parent)).collect()
        };
        while let Some((node, parent)) = pending.pop() {
            match node.value() {
                Node::Element(element) => {
                    let attrs = element
                        .attrs()
                        .map(|(name, value)| (name.to_owned(), value.to_owned()))
                        .collect();
                    let id = self.create_element(parent, element.name(), attrs)?;
                    pending.extend(node.children().rev().map(|child| (child, id)));
                }
                Node::Text(text) => {
                    self.create_text(parent, text)?;
                }
                _ => {}
            }
        }
        Ok(())
    }
}

fn is_whole_document(html: &str) -> bool {
    let head: String = html
        .trim_start()
        .chars()
        .take(9)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    head.starts_with("<!doctype") || head.starts_with("<html")
}
