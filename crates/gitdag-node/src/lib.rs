//! Format translation for gitdag.
//!
//! A source object becomes a destination node in two steps:
//!
//! 1. [`frame`] prepends git's `"<kind> <size>\0"` header to the raw payload,
//!    producing the canonical bytes the destination stores.
//! 2. [`parse`] decodes canonical bytes into a [`GitNode`], whose
//!    [`fields`](GitNode::fields) can be walked in encoding order.
//!
//! [`extract_links`] then lists every object hash a node references.

pub mod error;
pub mod frame;
pub mod links;
pub mod node;
pub mod parse;

pub use error::{NodeError, NodeResult};
pub use frame::{frame, split_header, translate, Translated};
pub use links::extract_links;
pub use node::{Blob, Commit, EntryMode, FieldValue, GitNode, Tag, Tree, TreeEntry};
pub use parse::parse;
