//! Bounded pool of sink writers.

use std::sync::Arc;

use bytes::Bytes;
use gitdag_store::NodeSink;
use gitdag_types::ObjectHash;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{trace, warn};

use crate::cancel::CancelHandle;
use crate::error::{PushError, PushResult};

/// Runs [`NodeSink::commit_node`] calls on worker tasks, at most
/// `concurrency` at a time.
///
/// A successful write is acknowledged with the object's hash on the ack
/// channel. A failed write cancels the run.
pub struct ConcurrentSink {
    sink: Arc<dyn NodeSink>,
    permits: Arc<Semaphore>,
    workers: JoinSet<()>,
    acks: mpsc::UnboundedSender<ObjectHash>,
    cancel: CancelHandle,
}

impl ConcurrentSink {
    pub fn new(
        sink: Arc<dyn NodeSink>,
        concurrency: usize,
        acks: mpsc::UnboundedSender<ObjectHash>,
        cancel: CancelHandle,
    ) -> Self {
        Self {
            sink,
            permits: Arc::new(Semaphore::new(concurrency.max(1))),
            workers: JoinSet::new(),
            acks,
            cancel,
        }
    }

    /// Hand `canonical` to a worker, waiting for a free slot first.
    pub async fn submit(&mut self, hash: ObjectHash, canonical: Bytes) -> PushResult<()> {
        self.reap()?;
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| PushError::Worker("sink semaphore closed".into()))?;

        let sink = self.sink.clone();
        let acks = self.acks.clone();
        let cancel = self.cancel.clone();
        self.workers.spawn(async move {
            let _permit = permit;
            let source_hex = hash.to_hex();
            trace!(hash = %hash.short_hex(), bytes = canonical.len(), "committing node");
            match sink.commit_node(&source_hex, canonical).await {
                Ok(()) => {
                    // The receiver is gone only once the run has ended.
                    let _ = acks.send(hash);
                }
                Err(source) => {
                    warn!(hash = %source_hex, error = %source, "sink rejected node");
                    cancel.cancel(PushError::Sink { hash, source });
                }
            }
        });
        Ok(())
    }

    /// Wait for the next worker to exit. `None` when no worker is running.
    pub async fn join_next(&mut self) -> Option<PushResult<()>> {
        self.workers
            .join_next()
            .await
            .map(|joined| joined.map_err(worker_error))
    }

    /// Wait for every dispatched write to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "sink worker failed while draining");
            }
        }
    }

    /// Collect workers that already exited so the set stays small.
    fn reap(&mut self) -> PushResult<()> {
        while let Some(joined) = self.workers.try_join_next() {
            joined.map_err(worker_error)?;
        }
        Ok(())
    }
}

fn worker_error(e: JoinError) -> PushError {
    PushError::Worker(e.to_string())
}

impl std::fmt::Debug for ConcurrentSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentSink")
            .field("available", &self.permits.available_permits())
            .field("workers", &self.workers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::Cancellation;
    use async_trait::async_trait;
    use gitdag_store::{StoreError, StoreResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Sink that tracks how many calls overlap.
    #[derive(Default)]
    struct SlowSink {
        active: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl NodeSink for SlowSink {
        async fn commit_node(&self, _source_hex: &str, _canonical: Bytes) -> StoreResult<()> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NodeSink for FailingSink {
        async fn commit_node(&self, _source_hex: &str, _canonical: Bytes) -> StoreResult<()> {
            Err(StoreError::Backend("disk full".into()))
        }
    }

    fn h(n: u8) -> ObjectHash {
        ObjectHash::from_raw([n; 20])
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let backend = Arc::new(SlowSink::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = Cancellation::new();
        let mut sink = ConcurrentSink::new(backend.clone(), 2, tx, cancel.handle());

        for n in 0..8 {
            sink.submit(h(n), Bytes::from_static(b"blob 0\0")).await.unwrap();
        }
        sink.drain().await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 8);
        assert!(backend.peak.load(Ordering::SeqCst) <= 2);
        let mut acked = Vec::new();
        while let Ok(hash) = rx.try_recv() {
            acked.push(hash);
        }
        assert_eq!(acked.len(), 8);
    }

    #[tokio::test]
    async fn failure_cancels_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut cancel = Cancellation::new();
        let mut sink = ConcurrentSink::new(Arc::new(FailingSink), 4, tx, cancel.handle());

        sink.submit(h(7), Bytes::new()).await.unwrap();
        sink.drain().await;

        match cancel.try_recv() {
            Some(PushError::Sink { hash, .. }) => assert_eq!(hash, h(7)),
            other => panic!("unexpected {other:?}"),
        }
        assert!(rx.try_recv().is_err());
    }
}
