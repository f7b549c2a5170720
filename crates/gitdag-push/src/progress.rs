use std::fmt;

use gitdag_types::{ContentId, ObjectHash};
use tracing::info;

/// A snapshot of a running migration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Progress {
    /// Objects translated and dispatched so far.
    pub processed: u64,
    /// Work items ever enqueued.
    pub scheduled: u64,
    /// Objects discovered but not yet complete.
    pub in_flight: usize,
    /// The object just processed.
    pub hash: ObjectHash,
    /// Its destination content id.
    pub content_id: ContentId,
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} (P:{}) {} {}",
            self.processed, self.scheduled, self.in_flight, self.hash, self.content_id
        )
    }
}

/// Receives progress snapshots from the scheduler.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &Progress);
}

/// Logs progress at info level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report(&self, progress: &Progress) {
        info!(
            processed = progress.processed,
            scheduled = progress.scheduled,
            in_flight = progress.in_flight,
            "{progress}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_format() {
        let hash = ObjectHash::from_raw([0x11; 20]);
        let p = Progress {
            processed: 100,
            scheduled: 240,
            in_flight: 7,
            hash,
            content_id: ContentId::from_object_hash(&hash),
        };
        let hex = "11".repeat(20);
        assert_eq!(p.to_string(), format!("100/240 (P:7) {hex} f01781114{hex}"));
    }
}
