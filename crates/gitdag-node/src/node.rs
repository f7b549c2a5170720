use bytes::Bytes;
use gitdag_types::{ObjectHash, ObjectKind};

/// A parsed source object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GitNode {
    Commit(Commit),
    Tree(Tree),
    Blob(Blob),
    Tag(Tag),
}

/// One value in a node's ordered key/value view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldValue {
    /// Reference to another object of this repository.
    Link(ObjectHash),
    /// Reference to a commit of another repository (submodule).
    Gitlink(ObjectHash),
    /// Textual header value.
    Text(String),
    /// Opaque bytes (messages, blob contents).
    Bytes(Bytes),
}

impl GitNode {
    /// The kind of object this node was parsed from.
    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Commit(_) => ObjectKind::Commit,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tag(_) => ObjectKind::Tag,
        }
    }

    /// The node's key/value pairs in encoding order.
    ///
    /// Commits yield `tree`, each `parent`, `author`, `committer`, the
    /// remaining headers and `message`. Trees yield one pair per entry keyed
    /// by entry name. Tags yield `object`, `type`, `tag`, `tagger`, the
    /// remaining headers and `message`. Blobs yield a single `data` pair.
    pub fn fields(&self) -> Vec<(String, FieldValue)> {
        match self {
            Self::Commit(c) => c.fields(),
            Self::Tree(t) => t
                .entries
                .iter()
                .map(|e| {
                    let value = if e.mode == EntryMode::Gitlink {
                        FieldValue::Gitlink(e.hash)
                    } else {
                        FieldValue::Link(e.hash)
                    };
                    (e.name.clone(), value)
                })
                .collect(),
            Self::Blob(b) => vec![("data".into(), FieldValue::Bytes(b.data.clone()))],
            Self::Tag(t) => t.fields(),
        }
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// A commit: root tree, parents, identities, extra headers and message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Commit {
    pub tree: ObjectHash,
    pub parents: Vec<ObjectHash>,
    pub author: Option<String>,
    pub committer: Option<String>,
    /// Headers other than the above, in order. Continuation lines are
    /// joined with `\n`.
    pub extra_headers: Vec<(String, String)>,
    /// Tags embedded by `mergetag` headers.
    pub merge_tags: Vec<Tag>,
    pub message: Bytes,
}

impl Commit {
    fn fields(&self) -> Vec<(String, FieldValue)> {
        let mut fields = vec![("tree".to_string(), FieldValue::Link(self.tree))];
        for parent in &self.parents {
            fields.push(("parent".into(), FieldValue::Link(*parent)));
        }
        if let Some(author) = &self.author {
            fields.push(("author".into(), FieldValue::Text(author.clone())));
        }
        if let Some(committer) = &self.committer {
            fields.push(("committer".into(), FieldValue::Text(committer.clone())));
        }
        let mut merge_tags = self.merge_tags.iter();
        for (key, value) in &self.extra_headers {
            let tag = if key == "mergetag" { merge_tags.next() } else { None };
            let value = match tag {
                Some(tag) => FieldValue::Link(tag.object),
                None => FieldValue::Text(value.clone()),
            };
            fields.push((key.clone(), value));
        }
        fields.push(("message".into(), FieldValue::Bytes(self.message.clone())));
        fields
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode of a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
    /// Subtree (0o040000).
    Directory,
    /// Submodule commit (0o160000).
    Gitlink,
}

impl EntryMode {
    /// Canonical octal mode value.
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
            Self::Directory => 0o040000,
            Self::Gitlink => 0o160000,
        }
    }

    /// Classify an octal mode as git does.
    ///
    /// Old repositories contain non-canonical file modes such as `100664`;
    /// any `100xxx` mode is a regular file, executable if any execute bit is
    /// set.
    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits & 0o170000 {
            0o040000 => Some(Self::Directory),
            0o120000 => Some(Self::Symlink),
            0o160000 => Some(Self::Gitlink),
            0o100000 if bits & 0o111 != 0 => Some(Self::Executable),
            0o100000 => Some(Self::Regular),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// A single entry in a tree object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: EntryMode,
    /// Entry name. Non-utf8 names are converted lossily.
    pub name: String,
    pub hash: ObjectHash,
}

/// A directory listing, in encoding order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tree {
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the tree has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Blob / Tag
// ---------------------------------------------------------------------------

/// File contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Blob {
    pub data: Bytes,
}

/// An annotated tag.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tag {
    pub object: ObjectHash,
    pub target_kind: ObjectKind,
    pub name: String,
    pub tagger: Option<String>,
    pub extra_headers: Vec<(String, String)>,
    pub message: Bytes,
}

impl Tag {
    fn fields(&self) -> Vec<(String, FieldValue)> {
        let mut fields = vec![
            ("object".to_string(), FieldValue::Link(self.object)),
            ("type".into(), FieldValue::Text(self.target_kind.to_string())),
            ("tag".into(), FieldValue::Text(self.name.clone())),
        ];
        if let Some(tagger) = &self.tagger {
            fields.push(("tagger".into(), FieldValue::Text(tagger.clone())));
        }
        for (key, value) in &self.extra_headers {
            fields.push((key.clone(), FieldValue::Text(value.clone())));
        }
        fields.push(("message".into(), FieldValue::Bytes(self.message.clone())));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u8) -> ObjectHash {
        ObjectHash::from_raw([n; 20])
    }

    #[test]
    fn entry_mode_classification() {
        assert_eq!(EntryMode::from_mode_bits(0o100644), Some(EntryMode::Regular));
        assert_eq!(EntryMode::from_mode_bits(0o100664), Some(EntryMode::Regular));
        assert_eq!(EntryMode::from_mode_bits(0o100755), Some(EntryMode::Executable));
        assert_eq!(EntryMode::from_mode_bits(0o040000), Some(EntryMode::Directory));
        assert_eq!(EntryMode::from_mode_bits(0o160000), Some(EntryMode::Gitlink));
        assert_eq!(EntryMode::from_mode_bits(0o120000), Some(EntryMode::Symlink));
        assert_eq!(EntryMode::from_mode_bits(0o777), None);
    }

    #[test]
    fn entry_mode_display_is_six_octal_digits() {
        assert_eq!(EntryMode::Directory.to_string(), "040000");
        assert_eq!(EntryMode::Regular.to_string(), "100644");
    }

    #[test]
    fn commit_fields_in_order() {
        let commit = Commit {
            tree: h(1),
            parents: vec![h(2), h(3)],
            author: Some("a".into()),
            committer: Some("c".into()),
            extra_headers: vec![("encoding".into(), "latin-1".into())],
            merge_tags: vec![],
            message: Bytes::from_static(b"msg\n"),
        };
        let keys: Vec<String> = GitNode::Commit(commit).fields().into_iter().map(|(k, _)| k).collect();
        assert_eq!(
            keys,
            ["tree", "parent", "parent", "author", "committer", "encoding", "message"]
        );
    }

    #[test]
    fn tree_fields_mark_gitlinks() {
        let tree = Tree {
            entries: vec![
                TreeEntry { mode: EntryMode::Regular, name: "a".into(), hash: h(1) },
                TreeEntry { mode: EntryMode::Gitlink, name: "sub".into(), hash: h(2) },
            ],
        };
        let fields = GitNode::Tree(tree).fields();
        assert_eq!(fields[0], ("a".into(), FieldValue::Link(h(1))));
        assert_eq!(fields[1], ("sub".into(), FieldValue::Gitlink(h(2))));
    }

    #[test]
    fn tag_fields_start_with_object() {
        let tag = Tag {
            object: h(9),
            target_kind: ObjectKind::Commit,
            name: "v1".into(),
            tagger: None,
            extra_headers: vec![],
            message: Bytes::new(),
        };
        let node = GitNode::Tag(tag);
        assert_eq!(node.kind(), ObjectKind::Tag);
        assert_eq!(node.fields()[0], ("object".into(), FieldValue::Link(h(9))));
    }

    #[test]
    fn tree_lookup() {
        let tree = Tree {
            entries: vec![TreeEntry { mode: EntryMode::Directory, name: "src".into(), hash: h(4) }],
        };
        assert_eq!(tree.get("src").unwrap().hash, h(4));
        assert!(tree.get("missing").is_none());
        assert_eq!(tree.len(), 1);
        assert!(Tree::default().is_empty());
    }
}
