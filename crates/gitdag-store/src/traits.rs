use async_trait::async_trait;
use bytes::Bytes;
use gitdag_types::{ContentId, ObjectHash};

use crate::error::StoreResult;
use crate::object::EncodedObject;

/// Read-only source object database.
///
/// Implementations must be side-effect free: reading an object never changes
/// what later reads return. Reads may block; the scheduler calls them on the
/// blocking thread pool.
pub trait ObjectStore: Send + Sync {
    /// Read an object by hash.
    ///
    /// Returns `StoreError::NotFound` if the object does not exist and
    /// `StoreError::Io` on read failures.
    fn encoded_object(&self, hash: &ObjectHash) -> StoreResult<EncodedObject>;

    /// Check whether an object exists.
    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        match self.encoded_object(hash) {
            Ok(_) => Ok(true),
            Err(crate::StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Records which source objects have been migrated.
///
/// Lets a run skip objects an earlier run already migrated. An entry is
/// added only once the object and its whole dependency closure are in the
/// destination store.
pub trait MigrationTracker: Send + Sync {
    /// Returns `true` if `hash` was migrated before.
    fn has_entry(&self, hash: &ObjectHash) -> StoreResult<bool>;

    /// Record `hash` as migrated.
    fn add_entry(&self, hash: &ObjectHash) -> StoreResult<()>;
}

/// Write path of the destination DAG store.
///
/// Called from worker tasks, concurrently with itself, at most once per
/// distinct source hash per run.
#[async_trait]
pub trait NodeSink: Send + Sync {
    /// Store the canonical bytes of the node translated from `source_hex`.
    async fn commit_node(&self, source_hex: &str, canonical: Bytes) -> StoreResult<()>;
}

/// Read path of the destination DAG store.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Canonical bytes of a stored node, or `None` if it is absent.
    async fn block(&self, cid: &ContentId) -> StoreResult<Option<Bytes>>;
}
