//! Loose-object reader for on-disk git repositories.
//!
//! Each loose object lives at `objects/<2 hex>/<38 hex>` as a zlib stream
//! of `"<kind> <size>\0<payload>"`. Packed objects are not read; a hash that
//! only exists inside a pack reports `NotFound`.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use flate2::read::ZlibDecoder;
use gitdag_types::{ObjectHash, ObjectKind};
use tracing::trace;

use crate::error::{StoreError, StoreResult};
use crate::object::EncodedObject;
use crate::traits::ObjectStore;

/// [`ObjectStore`] over the loose objects of a git directory.
#[derive(Clone, Debug)]
pub struct LooseObjectStore {
    objects_dir: PathBuf,
}

impl LooseObjectStore {
    /// Open the object database of `git_dir` (the `.git` directory).
    pub fn open(git_dir: impl AsRef<Path>) -> Self {
        Self {
            objects_dir: git_dir.as_ref().join("objects"),
        }
    }

    /// The `objects/` directory being read.
    pub fn objects_dir(&self) -> &Path {
        &self.objects_dir
    }

    fn object_path(&self, hash: &ObjectHash) -> PathBuf {
        self.objects_dir.join(hash.loose_path())
    }
}

impl ObjectStore for LooseObjectStore {
    fn encoded_object(&self, hash: &ObjectHash) -> StoreResult<EncodedObject> {
        let path = self.object_path(hash);
        let file = match File::open(&path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(*hash))
            }
            Err(e) => return Err(StoreError::Io(e)),
        };

        let mut inflated = Vec::new();
        ZlibDecoder::new(file).read_to_end(&mut inflated)?;
        trace!(hash = %hash, bytes = inflated.len(), "read loose object");
        decode_loose(hash, inflated)
    }

    fn contains(&self, hash: &ObjectHash) -> StoreResult<bool> {
        Ok(self.object_path(hash).is_file())
    }
}

fn decode_loose(hash: &ObjectHash, mut inflated: Vec<u8>) -> StoreResult<EncodedObject> {
    let corrupt = |reason: &str| StoreError::CorruptObject {
        hash: *hash,
        reason: reason.to_string(),
    };

    let nul = inflated
        .iter()
        .position(|b| *b == 0)
        .ok_or_else(|| corrupt("missing header terminator"))?;
    let header = std::str::from_utf8(&inflated[..nul]).map_err(|_| corrupt("non-utf8 header"))?;
    let (kind, size) = header
        .split_once(' ')
        .ok_or_else(|| corrupt("malformed header"))?;
    let kind: ObjectKind = kind.parse().map_err(|_| corrupt("unknown object kind"))?;
    if !kind.is_base() {
        return Err(corrupt("delta kinds cannot be loose objects"));
    }
    let size: u64 = size.parse().map_err(|_| corrupt("malformed size"))?;

    let data = inflated.split_off(nul + 1);
    if data.len() as u64 != size {
        return Err(corrupt(&format!(
            "header size {size} does not match payload length {}",
            data.len()
        )));
    }

    Ok(EncodedObject { kind, size, data })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn write_loose(git_dir: &Path, hash: &ObjectHash, raw: &[u8]) {
        let path = git_dir.join("objects").join(hash.loose_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(raw).unwrap();
        std::fs::write(path, enc.finish().unwrap()).unwrap();
    }

    #[test]
    fn reads_loose_blob() {
        let dir = tempfile::tempdir().unwrap();
        let hash = ObjectHash::from_raw([0xab; 20]);
        write_loose(dir.path(), &hash, b"blob 5\0hello");

        let store = LooseObjectStore::open(dir.path());
        let obj = store.encoded_object(&hash).unwrap();
        assert_eq!(obj.kind, ObjectKind::Blob);
        assert_eq!(obj.size, 5);
        assert_eq!(obj.data, b"hello");
        assert!(store.contains(&hash).unwrap());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LooseObjectStore::open(dir.path());
        let hash = ObjectHash::from_raw([1; 20]);
        assert!(matches!(store.encoded_object(&hash), Err(StoreError::NotFound(_))));
        assert!(!store.contains(&hash).unwrap());
    }

    #[test]
    fn size_mismatch_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let hash = ObjectHash::from_raw([2; 20]);
        write_loose(dir.path(), &hash, b"blob 9\0hello");

        let store = LooseObjectStore::open(dir.path());
        let err = store.encoded_object(&hash).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn unknown_kind_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let hash = ObjectHash::from_raw([3; 20]);
        write_loose(dir.path(), &hash, b"note 1\0x");

        let store = LooseObjectStore::open(dir.path());
        let err = store.encoded_object(&hash).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn garbage_stream_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let hash = ObjectHash::from_raw([4; 20]);
        let path = dir.path().join("objects").join(hash.loose_path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"definitely not zlib").unwrap();

        let store = LooseObjectStore::open(dir.path());
        assert!(matches!(store.encoded_object(&hash), Err(StoreError::Io(_))));
    }
}
