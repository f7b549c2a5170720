//! Storage collaborators for gitdag.
//!
//! The migration core never touches storage directly. It talks to three
//! seams defined here:
//!
//! - [`ObjectStore`] -- the source git object database, read-only
//! - [`MigrationTracker`] -- remembers which objects earlier runs migrated
//! - [`NodeSink`] -- the destination DAG store's write path
//!
//! # Backends
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based source store for tests and embedding
//! - [`LooseObjectStore`] -- reads zlib-compressed loose objects from a git dir
//! - [`InMemoryTracker`] -- in-process migration tracker
//! - [`InMemoryDagStore`] -- `HashMap`-based destination store
//! - [`DirDagStore`] -- one file per node under a directory
//!
//! # Design Rules
//!
//! 1. Source objects are immutable; every read is side-effect free.
//! 2. Destination writes are idempotent: writing a node twice is a no-op.
//! 3. All I/O errors are propagated, never silently ignored.

pub mod dag;
pub mod error;
pub mod loose;
pub mod memory;
pub mod object;
pub mod traits;

pub use dag::{DirDagStore, InMemoryDagStore};
pub use error::{StoreError, StoreResult};
pub use loose::LooseObjectStore;
pub use memory::{InMemoryObjectStore, InMemoryTracker};
pub use object::EncodedObject;
pub use traits::{BlockSource, MigrationTracker, NodeSink, ObjectStore};
