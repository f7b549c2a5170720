use gitdag_types::{ObjectKind, TypeError};
use thiserror::Error;

/// Errors from framing and parsing nodes.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// The kind has no standalone canonical form.
    #[error("unsupported object kind: {0}")]
    UnsupportedKind(ObjectKind),

    /// The `"<kind> <size>\0"` header is missing or unreadable.
    #[error("malformed header: {0}")]
    MalformedHeader(String),

    /// The header size disagrees with the payload.
    #[error("size mismatch: header says {declared}, payload has {actual} bytes")]
    SizeMismatch { declared: u64, actual: u64 },

    /// The payload does not follow the encoding of its kind.
    #[error("malformed {kind}: {reason}")]
    Malformed { kind: ObjectKind, reason: String },

    /// An embedded hash is not valid.
    #[error("invalid hash: {0}")]
    InvalidHash(#[from] TypeError),
}

impl NodeError {
    pub(crate) fn malformed(kind: ObjectKind, reason: impl Into<String>) -> Self {
        Self::Malformed {
            kind,
            reason: reason.into(),
        }
    }
}

/// Result alias for node operations.
pub type NodeResult<T> = Result<T, NodeError>;
