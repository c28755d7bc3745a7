#![forbid(unsafe_code)]

//! In-memory document model for formwire.
//!
//! `formwire-dom` is the browser stand-in the behaviors run against: an
//! element arena ([`Document`]) loaded from markup through scraper's
//! html5ever parser, queried with CSS selectors ([`Selector`]), carrying
//! form-control state, display state and focus.
//!
//! # Example
//!
//! ```
//! use formwire_dom::{Document, Selector};
//!
//! let mut doc = Document::parse(r#"<p class="total">0.00</p>"#).unwrap();
//! let total = doc.query_first(&Selector::parse(".total").unwrap()).unwrap();
//! doc.set_text_content(total, "22.00").unwrap();
//! assert_eq!(doc.to_html(), r#"<p class="total">22.00</p>"#);
//! ```

pub mod document;
pub mod error;
pub mod event;
pub mod form;
pub mod markup;
pub mod selector;

pub use document::{ControlKind, Document, Element, NodeId};
pub use error::{DomError, Result};
pub use event::{Event, EventKind, Key};
pub use form::{serialize_form, serialize_forms, successful_controls};
pub use selector::Selector;
