//! Foundation types for gitdag.
//!
//! gitdag migrates a git object graph into a content-addressed DAG store.
//! This crate holds the identifiers shared by every other gitdag crate.
//!
//! # Key Types
//!
//! - [`ObjectHash`] -- 20-byte identifier of a source git object
//! - [`ContentId`] -- destination-store address derived from an [`ObjectHash`]
//! - [`ObjectKind`] -- the type tag of a source object

pub mod cid;
pub mod error;
pub mod hash;
pub mod kind;

pub use cid::ContentId;
pub use error::TypeError;
pub use hash::ObjectHash;
pub use kind::ObjectKind;
