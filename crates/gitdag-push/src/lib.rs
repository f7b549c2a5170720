//! Dependency-ordered migration of a git object graph.
//!
//! [`Push`] walks the object graph below a root hash, translates every
//! object into a destination node exactly once, and hands the node to a
//! [`NodeSink`](gitdag_store::NodeSink) from a bounded pool of worker tasks.
//! An object is recorded as migrated only after every object it references
//! has been, and after its own node write succeeded.
//!
//! # Moving parts
//!
//! - [`WorkItem`] -- FIFO worklist entries: objects to process and completions
//! - [`DependencyTracker`] -- outstanding-child counts and waiting parents
//! - [`ConcurrentSink`] -- semaphore-bounded sink workers
//! - [`Cancellation`] -- first-error-wins abort channel
//! - [`ProgressReporter`] -- injected progress output

pub mod cancel;
pub mod config;
pub mod deps;
pub mod error;
pub mod progress;
pub mod push;
pub mod sink;
pub mod work;

pub use cancel::{CancelHandle, Cancellation};
pub use config::PushOptions;
pub use deps::{DependencyState, DependencyTracker};
pub use error::{PushError, PushResult};
pub use progress::{Progress, ProgressReporter, TracingProgress};
pub use push::{Push, PushCounters, PushReport};
pub use sink::ConcurrentSink;
pub use work::WorkItem;
