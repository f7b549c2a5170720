//! Local ref resolution and the table of refs pushed to the remote.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use gitdag_types::ObjectHash;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{RemoteError, RemoteResult};
use crate::names::validate_ref_name;

/// Git stops following symbolic refs after this many hops.
const MAX_SYMREF_DEPTH: usize = 5;

/// Resolves ref names against a git directory.
///
/// Looks at loose ref files first, then `packed-refs`. A bare name is tried
/// as `<name>`, `refs/<name>`, `refs/tags/<name>` and `refs/heads/<name>` in
/// that order, like `git rev-parse`.
#[derive(Clone, Debug)]
pub struct RefResolver {
    git_dir: PathBuf,
}

impl RefResolver {
    pub fn new(git_dir: impl AsRef<Path>) -> Self {
        Self {
            git_dir: git_dir.as_ref().to_path_buf(),
        }
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Resolve a 40-hex literal or a ref name to an object hash.
    pub fn resolve(&self, name: &str) -> RemoteResult<ObjectHash> {
        if let Ok(hash) = ObjectHash::from_hex(name) {
            return Ok(hash);
        }
        validate_ref_name(name)?;
        for candidate in candidates(name) {
            if let Some(hash) = self.resolve_full(&candidate, 0)? {
                debug!(name, resolved = %candidate, hash = %hash.short_hex(), "resolved ref");
                return Ok(hash);
            }
        }
        Err(RemoteError::RefNotFound(name.to_string()))
    }

    /// The branch `HEAD` points to, or `None` if it is detached or missing.
    pub fn head_target(&self) -> RemoteResult<Option<String>> {
        match read_optional(&self.git_dir.join("HEAD"))? {
            Some(content) => Ok(content
                .trim()
                .strip_prefix("ref:")
                .map(|target| target.trim().to_string())),
            None => Ok(None),
        }
    }

    fn resolve_full(&self, name: &str, depth: usize) -> RemoteResult<Option<ObjectHash>> {
        if depth > MAX_SYMREF_DEPTH {
            return Err(RemoteError::SymrefLoop(name.to_string()));
        }
        if let Some(content) = read_optional(&self.git_dir.join(name))? {
            let content = content.trim();
            if let Some(target) = content.strip_prefix("ref:") {
                let target = target.trim();
                trace!(name, target, "following symbolic ref");
                return self.resolve_full(target, depth + 1);
            }
            return Ok(Some(ObjectHash::from_hex(content)?));
        }
        self.packed(name)
    }

    fn packed(&self, name: &str) -> RemoteResult<Option<ObjectHash>> {
        let Some(content) = read_optional(&self.git_dir.join("packed-refs"))? else {
            return Ok(None);
        };
        for line in content.lines() {
            if line.starts_with('#') || line.starts_with('^') {
                continue;
            }
            if let Some((hex, refname)) = line.split_once(' ') {
                if refname.trim() == name {
                    return Ok(Some(ObjectHash::from_hex(hex)?));
                }
            }
        }
        Ok(None)
    }
}

fn candidates(name: &str) -> Vec<String> {
    if name.starts_with("refs/") || name == "HEAD" {
        return vec![name.to_string()];
    }
    vec![
        name.to_string(),
        format!("refs/{name}"),
        format!("refs/tags/{name}"),
        format!("refs/heads/{name}"),
    ]
}

/// Contents of `path`, or `None` if it is missing or a directory.
fn read_optional(path: &Path) -> RemoteResult<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) if path.is_dir() => {
            trace!(path = %path.display(), error = %e, "skipping directory");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Refs the remote holds, each pointing at a migrated root object.
///
/// Optionally backed by a JSON file that is rewritten on [`save`](Self::save).
#[derive(Clone, Debug, Default)]
pub struct RemoteRefs {
    refs: BTreeMap<String, ObjectHash>,
    path: Option<PathBuf>,
}

#[derive(Serialize, Deserialize)]
struct RefFile {
    refs: BTreeMap<String, ObjectHash>,
}

impl RemoteRefs {
    /// An empty table that is never persisted.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the table stored at `path`; a missing file is an empty table.
    pub fn load(path: impl AsRef<Path>) -> RemoteResult<Self> {
        let path = path.as_ref().to_path_buf();
        let refs = match read_optional(&path)? {
            Some(content) => serde_json::from_str::<RefFile>(&content)?.refs,
            None => BTreeMap::new(),
        };
        Ok(Self {
            refs,
            path: Some(path),
        })
    }

    /// Write the table back if it is file-backed.
    pub fn save(&self) -> RemoteResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let body = serde_json::to_string_pretty(&RefFile { refs: self.refs.clone() })?;
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&ObjectHash> {
        self.refs.get(name)
    }

    pub fn set(&mut self, name: &str, hash: ObjectHash) -> RemoteResult<()> {
        validate_ref_name(name)?;
        self.refs.insert(name.to_string(), hash);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Option<ObjectHash> {
        self.refs.remove(name)
    }

    /// All refs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ObjectHash)> {
        self.refs.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const A: &str = "8ab686eafeb1f44702738c8b0f24f2567c36da6d";
    const B: &str = "1111111111111111111111111111111111111111";

    fn git_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("refs/heads")).unwrap();
        fs::create_dir_all(dir.path().join("refs/tags")).unwrap();
        dir
    }

    #[test]
    fn literal_hash_resolves_to_itself() {
        let dir = git_dir();
        let r = RefResolver::new(dir.path());
        assert_eq!(r.resolve(A).unwrap().to_hex(), A);
    }

    #[test]
    fn loose_branch_by_short_name() {
        let dir = git_dir();
        fs::write(dir.path().join("refs/heads/main"), format!("{A}\n")).unwrap();
        let r = RefResolver::new(dir.path());
        assert_eq!(r.resolve("main").unwrap().to_hex(), A);
        assert_eq!(r.resolve("refs/heads/main").unwrap().to_hex(), A);
    }

    #[test]
    fn tag_wins_over_branch() {
        let dir = git_dir();
        fs::write(dir.path().join("refs/heads/v1"), A).unwrap();
        fs::write(dir.path().join("refs/tags/v1"), B).unwrap();
        let r = RefResolver::new(dir.path());
        assert_eq!(r.resolve("v1").unwrap().to_hex(), B);
    }

    #[test]
    fn head_symref_is_followed() {
        let dir = git_dir();
        fs::write(dir.path().join("HEAD"), "ref: refs/heads/main\n").unwrap();
        fs::write(dir.path().join("refs/heads/main"), A).unwrap();
        let r = RefResolver::new(dir.path());
        assert_eq!(r.resolve("HEAD").unwrap().to_hex(), A);
        assert_eq!(r.head_target().unwrap().as_deref(), Some("refs/heads/main"));
    }

    #[test]
    fn packed_refs_are_consulted() {
        let dir = git_dir();
        fs::write(
            dir.path().join("packed-refs"),
            format!("# pack-refs with: peeled fully-peeled sorted\n{A} refs/heads/main\n{B} refs/tags/v2\n^{A}\n"),
        )
        .unwrap();
        let r = RefResolver::new(dir.path());
        assert_eq!(r.resolve("main").unwrap().to_hex(), A);
        assert_eq!(r.resolve("v2").unwrap().to_hex(), B);
    }

    #[test]
    fn symref_loop_is_detected() {
        let dir = git_dir();
        fs::write(dir.path().join("refs/heads/a"), "ref: refs/heads/b").unwrap();
        fs::write(dir.path().join("refs/heads/b"), "ref: refs/heads/a").unwrap();
        let r = RefResolver::new(dir.path());
        assert!(matches!(r.resolve("refs/heads/a"), Err(RemoteError::SymrefLoop(_))));
    }

    #[test]
    fn missing_ref() {
        let dir = git_dir();
        let r = RefResolver::new(dir.path());
        assert!(matches!(r.resolve("nope"), Err(RemoteError::RefNotFound(_))));
        assert!(r.head_target().unwrap().is_none());
    }

    #[test]
    fn detached_head_has_no_target() {
        let dir = git_dir();
        fs::write(dir.path().join("HEAD"), A).unwrap();
        assert!(RefResolver::new(dir.path()).head_target().unwrap().is_none());
    }

    #[test]
    fn remote_refs_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("remote/refs.json");

        let mut refs = RemoteRefs::load(&path).unwrap();
        assert!(refs.is_empty());
        refs.set("refs/heads/main", ObjectHash::from_hex(A).unwrap()).unwrap();
        refs.save().unwrap();

        let reloaded = RemoteRefs::load(&path).unwrap();
        assert_eq!(reloaded.get("refs/heads/main").unwrap().to_hex(), A);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn remote_refs_reject_bad_names() {
        let mut refs = RemoteRefs::in_memory();
        assert!(refs.set("refs/heads/../x", ObjectHash::null()).is_err());
        assert!(refs.save().is_ok());
    }
}
