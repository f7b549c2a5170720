use gitdag_push::PushError;
use gitdag_store::StoreError;
use gitdag_types::TypeError;
use thiserror::Error;

/// Errors raised while serving a remote-helper session.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// A local ref could not be resolved to an object.
    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// A ref name failed validation.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// Symbolic refs nest deeper than git allows.
    #[error("symbolic ref loop at {0}")]
    SymrefLoop(String),

    /// The destination store has no node for this id.
    #[error("block not found: {0}")]
    BlockNotFound(String),

    /// A line the helper does not understand.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// Input ended before the blank line closing a push batch.
    #[error("input ended with unanswered pushes: {}", .0.join(", "))]
    UnterminatedBatch(Vec<String>),

    /// A handler method was called before `initialize`.
    #[error("handler not initialized")]
    NotInitialized,

    #[error("push failed: {0}")]
    Push(#[from] PushError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid identifier: {0}")]
    InvalidId(#[from] TypeError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for remote-helper operations.
pub type RemoteResult<T> = Result<T, RemoteError>;
