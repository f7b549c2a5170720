use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use gitdag_push::{Push, PushOptions};
use gitdag_store::{BlockSource, MigrationTracker, NodeSink, ObjectStore};
use gitdag_types::ContentId;
use tracing::{info, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::names::validate_ref_name;
use crate::refs::{RefResolver, RemoteRefs};

/// The operations a remote-helper session drives.
#[async_trait]
pub trait ProtocolHandler: Send {
    /// Prepare for a session. Called once before any other method.
    async fn initialize(&mut self) -> RemoteResult<()>;

    /// Capability lines advertised to git.
    fn capabilities(&self) -> Vec<String>;

    /// `"<value> <ref>"` lines describing the remote's refs.
    async fn list(&mut self, for_push: bool) -> RemoteResult<Vec<String>>;

    /// Migrate `local_ref` and point `remote_ref` at it. Returns the root
    /// content id.
    async fn push(&mut self, local_ref: &str, remote_ref: &str) -> RemoteResult<String>;

    /// Canonical bytes of the node named by `identifier`.
    async fn provide_block(&self, identifier: &str) -> RemoteResult<Vec<u8>>;

    /// End the session.
    async fn finish(&mut self) -> RemoteResult<()>;
}

/// Handler that migrates local refs into a content-addressed DAG store.
pub struct DagRemote<S> {
    resolver: RefResolver,
    push: Push,
    dest: Arc<S>,
    refs: RemoteRefs,
    initialized: bool,
}

impl<S> DagRemote<S>
where
    S: NodeSink + BlockSource + 'static,
{
    pub fn new(
        git_dir: impl AsRef<Path>,
        store: Arc<dyn ObjectStore>,
        tracker: Arc<dyn MigrationTracker>,
        dest: Arc<S>,
        options: PushOptions,
        refs: RemoteRefs,
    ) -> Self {
        let push = Push::new(store, tracker, dest.clone(), options);
        Self {
            resolver: RefResolver::new(git_dir),
            push,
            dest,
            refs,
            initialized: false,
        }
    }

    pub fn refs(&self) -> &RemoteRefs {
        &self.refs
    }

    fn ensure_initialized(&self) -> RemoteResult<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(RemoteError::NotInitialized)
        }
    }
}

#[async_trait]
impl<S> ProtocolHandler for DagRemote<S>
where
    S: NodeSink + BlockSource + 'static,
{
    async fn initialize(&mut self) -> RemoteResult<()> {
        if !self.resolver.git_dir().is_dir() {
            warn!(git_dir = %self.resolver.git_dir().display(), "git directory does not exist");
        }
        self.initialized = true;
        Ok(())
    }

    fn capabilities(&self) -> Vec<String> {
        vec!["push".to_string(), "option".to_string()]
    }

    async fn list(&mut self, for_push: bool) -> RemoteResult<Vec<String>> {
        self.ensure_initialized()?;
        let mut lines: Vec<String> = self
            .refs
            .iter()
            .map(|(name, hash)| format!("{hash} {name}"))
            .collect();
        // Git only needs the symbolic HEAD when fetching.
        if !for_push {
            if let Some(head) = self.resolver.head_target()? {
                if self.refs.get(&head).is_some() {
                    lines.push(format!("@{head} HEAD"));
                }
            }
        }
        Ok(lines)
    }

    async fn push(&mut self, local_ref: &str, remote_ref: &str) -> RemoteResult<String> {
        self.ensure_initialized()?;
        validate_ref_name(remote_ref)?;
        if local_ref.is_empty() {
            self.refs.remove(remote_ref);
            info!(remote_ref, "deleted remote ref");
            return Ok(String::new());
        }

        let root = self.resolver.resolve(local_ref)?;
        let report = self.push.push(root).await?;
        self.refs.set(remote_ref, root)?;
        info!(
            local_ref,
            remote_ref,
            cid = %report.content_id,
            processed = report.counters.processed,
            "pushed"
        );
        Ok(report.content_id.to_string())
    }

    async fn provide_block(&self, identifier: &str) -> RemoteResult<Vec<u8>> {
        let cid: ContentId = identifier.parse()?;
        match self.dest.block(&cid).await? {
            Some(bytes) => Ok(bytes.to_vec()),
            None => Err(RemoteError::BlockNotFound(identifier.to_string())),
        }
    }

    async fn finish(&mut self) -> RemoteResult<()> {
        self.refs.save()?;
        self.initialized = false;
        Ok(())
    }
}

impl<S> std::fmt::Debug for DagRemote<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DagRemote")
            .field("git_dir", &self.resolver.git_dir())
            .field("refs", &self.refs.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gitdag_store::{InMemoryDagStore, InMemoryObjectStore, InMemoryTracker};
    use gitdag_types::{ObjectHash, ObjectKind};
    use std::fs;

    pub(crate) struct Repo {
        pub dir: tempfile::TempDir,
        pub store: Arc<InMemoryObjectStore>,
        pub commit: ObjectHash,
        pub blob: ObjectHash,
    }

    /// A git dir whose `main` branch points at commit -> tree -> blob.
    pub(crate) fn repo() -> Repo {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads")).unwrap();

        let store = Arc::new(InMemoryObjectStore::new());
        let blob = store.insert(ObjectKind::Blob, b"hello".to_vec());
        let mut tree = b"100644 hello.txt\0".to_vec();
        tree.extend_from_slice(blob.as_bytes());
        let tree = store.insert(ObjectKind::Tree, tree);
        let commit = store.insert(
            ObjectKind::Commit,
            format!("tree {tree}\nauthor a\ncommitter c\n\ninit\n").into_bytes(),
        );

        fs::write(dir.path().join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(dir.path().join("refs/heads/main"), format!("{commit}\n")).unwrap();
        Repo { dir, store, commit, blob }
    }

    pub(crate) fn remote(repo: &Repo, refs: RemoteRefs) -> (DagRemote<InMemoryDagStore>, Arc<InMemoryDagStore>) {
        let dest = Arc::new(InMemoryDagStore::new());
        let options = PushOptions {
            handle_interrupt: false,
            ..PushOptions::default()
        };
        let remote = DagRemote::new(
            repo.dir.path(),
            repo.store.clone(),
            Arc::new(InMemoryTracker::new()),
            dest.clone(),
            options,
            refs,
        );
        (remote, dest)
    }

    #[tokio::test]
    async fn requires_initialize() {
        let repo = repo();
        let (mut remote, _) = remote(&repo, RemoteRefs::in_memory());
        assert!(matches!(remote.list(false).await, Err(RemoteError::NotInitialized)));
    }

    #[tokio::test]
    async fn push_records_ref_and_returns_cid() {
        let repo = repo();
        let (mut remote, dest) = remote(&repo, RemoteRefs::in_memory());
        remote.initialize().await.unwrap();

        let cid = remote.push("refs/heads/main", "refs/heads/main").await.unwrap();
        assert_eq!(cid, ContentId::from_object_hash(&repo.commit).to_string());
        assert_eq!(dest.len(), 3);
        assert_eq!(remote.refs().get("refs/heads/main"), Some(&repo.commit));

        let lines = remote.list(false).await.unwrap();
        assert_eq!(
            lines,
            vec![
                format!("{} refs/heads/main", repo.commit),
                "@refs/heads/main HEAD".to_string(),
            ]
        );
        assert_eq!(remote.list(true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_remote_lists_nothing() {
        let repo = repo();
        let (mut remote, _) = remote(&repo, RemoteRefs::in_memory());
        remote.initialize().await.unwrap();
        assert!(remote.list(false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_local_ref() {
        let repo = repo();
        let (mut remote, _) = remote(&repo, RemoteRefs::in_memory());
        remote.initialize().await.unwrap();
        let err = remote.push("refs/heads/nope", "refs/heads/nope").await.unwrap_err();
        assert!(matches!(err, RemoteError::RefNotFound(_)));
        assert!(remote.refs().is_empty());
    }

    #[tokio::test]
    async fn delete_removes_ref() {
        let repo = repo();
        let (mut remote, _) = remote(&repo, RemoteRefs::in_memory());
        remote.initialize().await.unwrap();
        remote.push("main", "refs/heads/main").await.unwrap();
        assert_eq!(remote.push("", "refs/heads/main").await.unwrap(), "");
        assert!(remote.refs().is_empty());
    }

    #[tokio::test]
    async fn provides_pushed_blocks() {
        let repo = repo();
        let (mut remote, _) = remote(&repo, RemoteRefs::in_memory());
        remote.initialize().await.unwrap();
        remote.push("main", "refs/heads/main").await.unwrap();

        let cid = ContentId::from_object_hash(&repo.blob).to_string();
        assert_eq!(remote.provide_block(&cid).await.unwrap(), b"blob 5\0hello");

        let absent = ContentId::from_object_hash(&ObjectHash::from_raw([7; 20])).to_string();
        assert!(matches!(
            remote.provide_block(&absent).await,
            Err(RemoteError::BlockNotFound(_))
        ));
        assert!(matches!(
            remote.provide_block("bogus").await,
            Err(RemoteError::InvalidId(_))
        ));
    }

    #[tokio::test]
    async fn finish_persists_refs() {
        let repo = repo();
        let path = repo.dir.path().join("gitdag/origin/refs.json");
        let (mut remote, _) = remote(&repo, RemoteRefs::load(&path).unwrap());
        remote.initialize().await.unwrap();
        remote.push("main", "refs/heads/main").await.unwrap();
        remote.finish().await.unwrap();

        let reloaded = RemoteRefs::load(&path).unwrap();
        assert_eq!(reloaded.get("refs/heads/main"), Some(&repo.commit));
    }
}
