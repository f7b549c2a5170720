use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use gitdag_types::{ObjectHash, ObjectKind};

use crate::error::{StoreError, StoreResult};
use crate::object::EncodedObject;
use crate::traits::{MigrationTracker, ObjectStore};

/// Domain tag for ids of objects inserted without an explicit hash.
const SYNTHETIC_ID_DOMAIN: &[u8] = b"gitdag-synthetic-v1:";

/// In-memory, HashMap-based source object store.
///
/// Intended for tests and embedding. Objects are cloned on read. Every read
/// is counted so callers can assert how often the store was consulted.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<ObjectHash, EncodedObject>>,
    reads: AtomicUsize,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
            reads: AtomicUsize::new(0),
        }
    }

    /// Store `data` under a caller-chosen hash.
    pub fn insert_with_hash(&self, hash: ObjectHash, kind: ObjectKind, data: Vec<u8>) {
        self.objects
            .write()
            .expect("lock poisoned")
            .insert(hash, EncodedObject::new(kind, data));
    }

    /// Store `data` and return a stable id derived from its kind and bytes.
    ///
    /// The id is a truncated BLAKE3 digest, not git's SHA-1, so it is only
    /// meaningful inside this store. Useful for building synthetic graphs.
    pub fn insert(&self, kind: ObjectKind, data: Vec<u8>) -> ObjectHash {
        let mut hasher = blake3::Hasher::new();
        hasher.update(SYNTHETIC_ID_DOMAIN);
        hasher.update(kind.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(&data);
        let digest = hasher.finalize();
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&digest.as_bytes()[..20]);
        let hash = ObjectHash::from_raw(raw);
        self.insert_with_hash(hash, kind, data);
        hash
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Number of `encoded_object` calls served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn encoded_object(&self, hash: &ObjectHash) -> StoreResult<EncodedObject> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let map = self.objects.read().expect("lock poisoned");
        map.get(hash).cloned().ok_or(StoreError::NotFound(*hash))
    }

    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        Ok(self.objects.read().expect("lock poisoned").contains_key(hash))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}

#[derive(Default)]
struct TrackerState {
    entries: HashSet<ObjectHash>,
    order: Vec<ObjectHash>,
}

/// In-process [`MigrationTracker`].
///
/// Remembers the order entries were added in, which is the order objects
/// completed.
#[derive(Default)]
pub struct InMemoryTracker {
    state: RwLock<TrackerState>,
}

impl InMemoryTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tracker that already knows `hashes`.
    pub fn with_entries(hashes: impl IntoIterator<Item = ObjectHash>) -> Self {
        let tracker = Self::new();
        {
            let mut state = tracker.state.write().expect("lock poisoned");
            for hash in hashes {
                if state.entries.insert(hash) {
                    state.order.push(hash);
                }
            }
        }
        tracker
    }

    /// Entries in the order they were added.
    pub fn entries(&self) -> Vec<ObjectHash> {
        self.state.read().expect("lock poisoned").order.clone()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.state.read().expect("lock poisoned").order.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl MigrationTracker for InMemoryTracker {
    fn has_entry(&self, hash: &ObjectHash) -> StoreResult<bool> {
        Ok(self.state.read().expect("lock poisoned").entries.contains(hash))
    }

    fn add_entry(&self, hash: &ObjectHash) -> StoreResult<()> {
        let mut state = self.state.write().expect("lock poisoned");
        if state.entries.insert(*hash) {
            state.order.push(*hash);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTracker")
            .field("entry_count", &self.len())
            .finish()
    }
}
