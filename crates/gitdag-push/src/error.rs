use gitdag_node::NodeError;
use gitdag_store::StoreError;
use gitdag_types::{ObjectHash, TypeError};
use thiserror::Error;

/// Errors that abort a migration run.
#[derive(Debug, Error)]
pub enum PushError {
    /// The root hash is not 40 hex characters.
    #[error("invalid object hash {input:?}: {source}")]
    InvalidHash {
        input: String,
        #[source]
        source: TypeError,
    },

    /// The source store has no such object.
    #[error("object not found: {0}")]
    NotFound(ObjectHash),

    /// Reading the object from the source store failed.
    #[error("reading {hash}: {source}")]
    Io {
        hash: ObjectHash,
        #[source]
        source: StoreError,
    },

    /// The object has an unsupported kind or a malformed encoding.
    #[error("translating {hash}: {source}")]
    Translation {
        hash: ObjectHash,
        #[source]
        source: NodeError,
    },

    /// The destination store rejected the node.
    #[error("committing {hash}: {source}")]
    Sink {
        hash: ObjectHash,
        #[source]
        source: StoreError,
    },

    /// The migration tracker failed.
    #[error("tracking {hash}: {source}")]
    Tracker {
        hash: ObjectHash,
        #[source]
        source: StoreError,
    },

    /// The run was interrupted by a signal.
    #[error("interrupted")]
    Interrupted,

    /// The worklist drained while `0` still waited on its dependencies.
    /// Only a graph with a back-edge can produce this.
    #[error("dependency cycle: {0} can never complete")]
    DependencyCycle(ObjectHash),

    /// A sink worker task died without reporting.
    #[error("sink worker failed: {0}")]
    Worker(String),

    /// Dependency bookkeeping reached an impossible state.
    #[error("dependency bookkeeping violated at {hash}: {reason}")]
    Invariant { hash: ObjectHash, reason: String },
}

impl PushError {
    /// Classify a source-store failure for `hash`.
    pub(crate) fn from_resolve(hash: ObjectHash, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(missing) => Self::NotFound(missing),
            source => Self::Io { hash, source },
        }
    }

    pub(crate) fn invariant(hash: ObjectHash, reason: impl Into<String>) -> Self {
        Self::Invariant {
            hash,
            reason: reason.into(),
        }
    }
}

/// Result alias for push operations.
pub type PushResult<T> = Result<T, PushError>;
