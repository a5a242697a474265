//! In-memory HTML document: the tree the assembler writes into and the
//! spoiler listener reacts on.

pub mod document;
pub mod events;
pub mod node;

pub use document::{Document, DomError};
pub use events::{ClickEvent, ClickListener};
pub use node::{Attribute, Element, NodeId, NodeKind};
