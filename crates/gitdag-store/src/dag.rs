//! Destination DAG stores.
//!
//! Nodes are keyed by the [`ContentId`] derived from the source hash handed
//! to [`NodeSink::commit_node`]. Both stores are idempotent: committing the
//! same node twice keeps the first copy.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;
use gitdag_types::ContentId;
use tracing::debug;

use crate::error::StoreResult;
use crate::traits::{BlockSource, NodeSink};

/// In-memory destination store.
pub struct InMemoryDagStore {
    nodes: RwLock<HashMap<ContentId, Bytes>>,
    commits: AtomicUsize,
}

impl InMemoryDagStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
            commits: AtomicUsize::new(0),
        }
    }

    /// Canonical bytes stored under `cid`.
    pub fn get(&self, cid: &ContentId) -> Option<Bytes> {
        self.nodes.read().expect("lock poisoned").get(cid).cloned()
    }

    /// Number of distinct nodes stored.
    pub fn len(&self) -> usize {
        self.nodes.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing was stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of `commit_node` calls received, duplicates included.
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::Relaxed)
    }
}

impl Default for InMemoryDagStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeSink for InMemoryDagStore {
    async fn commit_node(&self, source_hex: &str, canonical: Bytes) -> StoreResult<()> {
        let cid = ContentId::from_hex_hash(source_hex)?;
        self.commits.fetch_add(1, Ordering::Relaxed);
        self.nodes
            .write()
            .expect("lock poisoned")
            .entry(cid)
            .or_insert(canonical);
        Ok(())
    }
}

#[async_trait]
impl BlockSource for InMemoryDagStore {
    async fn block(&self, cid: &ContentId) -> StoreResult<Option<Bytes>> {
        Ok(self.get(cid))
    }
}

impl std::fmt::Debug for InMemoryDagStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryDagStore")
            .field("node_count", &self.len())
            .finish()
    }
}

/// Destination store writing one file per node, named by content id.
///
/// Files are written to a temporary name and renamed into place, so a
/// reader never observes a partially written node.
#[derive(Clone, Debug)]
pub struct DirDagStore {
    root: PathBuf,
}

impl DirDagStore {
    /// Open (creating if needed) a store rooted at `root`.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Directory holding the nodes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn node_path(&self, cid: &ContentId) -> PathBuf {
        self.root.join(cid.to_string())
    }
}

#[async_trait]
impl NodeSink for DirDagStore {
    async fn commit_node(&self, source_hex: &str, canonical: Bytes) -> StoreResult<()> {
        let cid = ContentId::from_hex_hash(source_hex)?;
        let path = self.node_path(&cid);
        if tokio::fs::try_exists(&path).await? {
            return Ok(());
        }

        let tmp = self.root.join(format!(".{cid}.tmp"));
        tokio::fs::write(&tmp, &canonical).await?;
        tokio::fs::rename(&tmp, &path).await?;
        debug!(cid = %cid, bytes = canonical.len(), "wrote node");
        Ok(())
    }
}

#[async_trait]
impl BlockSource for DirDagStore {
    async fn block(&self, cid: &ContentId) -> StoreResult<Option<Bytes>> {
        match tokio::fs::read(self.node_path(cid)).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
