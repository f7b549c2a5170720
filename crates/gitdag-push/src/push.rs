//! The migration scheduler.
//!
//! A run is a single-threaded loop over a FIFO worklist. Processing an
//! object reads it from the source store, frames it, dispatches the framed
//! node to a sink worker and records one dependency per child not yet
//! migrated. Completion items travel through the same worklist, so the
//! cascade from a leaf up to the root never recurses.
//!
//! An object completes (and is recorded in the [`MigrationTracker`]) once
//! every child completed and its own sink write was acknowledged. Sink
//! acknowledgements and failures arrive over channels that the loop drains
//! between items.

use std::collections::VecDeque;
use std::sync::Arc;

use gitdag_node::{extract_links, translate};
use gitdag_store::{MigrationTracker, NodeSink, ObjectStore};
use gitdag_types::{ContentId, ObjectHash};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, trace};

use crate::cancel::{Cancellation, InterruptGuard};
use crate::config::PushOptions;
use crate::deps::DependencyTracker;
use crate::error::{PushError, PushResult};
use crate::progress::{Progress, ProgressReporter, TracingProgress};
use crate::sink::ConcurrentSink;
use crate::work::WorkItem;

/// Monotonic counters of one run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PushCounters {
    /// Objects translated and dispatched.
    pub processed: u64,
    /// Work items ever enqueued, completions included.
    pub scheduled: u64,
    /// Object items dropped because the object was already migrated or
    /// already processed this run.
    pub skipped: u64,
    /// Sink writes acknowledged.
    pub committed: u64,
    /// Objects recorded in the migration tracker.
    pub completed: u64,
}

/// Outcome of a successful run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub root: ObjectHash,
    pub content_id: ContentId,
    #[serde(flatten)]
    pub counters: PushCounters,
}

/// Migrates object graphs from an [`ObjectStore`] into a [`NodeSink`].
///
/// ```ignore
/// let push = Push::new(store, tracker, sink, PushOptions::default());
/// let report = push.push_hash("8ab686eafeb1f44702738c8b0f24f2567c36da6d").await?;
/// println!("{}", report.content_id);
/// ```
pub struct Push {
    store: Arc<dyn ObjectStore>,
    tracker: Arc<dyn MigrationTracker>,
    sink: Arc<dyn NodeSink>,
    options: PushOptions,
    reporter: Arc<dyn ProgressReporter>,
}

impl Push {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        tracker: Arc<dyn MigrationTracker>,
        sink: Arc<dyn NodeSink>,
        options: PushOptions,
    ) -> Self {
        Self {
            store,
            tracker,
            sink,
            options,
            reporter: Arc::new(TracingProgress),
        }
    }

    /// Replace the default tracing progress output.
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Migrate the object named by a 40-character hex hash and everything
    /// reachable from it.
    pub async fn push_hash(&self, hash_hex: &str) -> PushResult<PushReport> {
        let root = ObjectHash::from_hex(hash_hex).map_err(|source| PushError::InvalidHash {
            input: hash_hex.to_string(),
            source,
        })?;
        self.push(root).await
    }

    /// Migrate `root` and everything reachable from it.
    ///
    /// On error, sink writes already dispatched are allowed to finish before
    /// this returns; nothing new is dispatched.
    #[instrument(skip_all, fields(root = %root.short_hex()))]
    pub async fn push(&self, root: ObjectHash) -> PushResult<PushReport> {
        let mut run = Run::new(self, root);
        let _interrupt = self
            .options
            .handle_interrupt
            .then(|| InterruptGuard::spawn(run.cancel.handle()));

        let outcome = run.drive().await;
        run.sink.drain().await;
        match &outcome {
            Ok(report) => info!(
                processed = report.counters.processed,
                skipped = report.counters.skipped,
                cid = %report.content_id,
                "push complete"
            ),
            Err(e) => debug!(error = %e, "push failed"),
        }
        outcome
    }
}

impl std::fmt::Debug for Push {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Push").field("options", &self.options).finish()
    }
}

/// State of one `push` call.
struct Run<'a> {
    push: &'a Push,
    root: ObjectHash,
    queue: VecDeque<WorkItem>,
    deps: DependencyTracker,
    sink: ConcurrentSink,
    acks: mpsc::UnboundedReceiver<ObjectHash>,
    cancel: Cancellation,
    /// Sink writes dispatched but not yet acknowledged.
    unacked: usize,
    counters: PushCounters,
    last_processed: Option<ObjectHash>,
    last_reported: u64,
}

impl<'a> Run<'a> {
    fn new(push: &'a Push, root: ObjectHash) -> Self {
        let (ack_tx, acks) = mpsc::unbounded_channel();
        let cancel = Cancellation::new();
        let sink = ConcurrentSink::new(
            push.sink.clone(),
            push.options.effective_concurrency(),
            ack_tx,
            cancel.handle(),
        );
        Self {
            push,
            root,
            queue: VecDeque::new(),
            deps: DependencyTracker::new(),
            sink,
            acks,
            cancel,
            unacked: 0,
            counters: PushCounters::default(),
            last_processed: None,
            last_reported: 0,
        }
    }

    async fn drive(&mut self) -> PushResult<PushReport> {
        self.deps.track(self.root);
        self.enqueue(WorkItem::Object(self.root));

        loop {
            self.fold_acks()?;
            if let Some(err) = self.cancel.try_recv() {
                return Err(err);
            }

            let Some(item) = self.queue.pop_front() else {
                if self.unacked == 0 {
                    break;
                }
                self.wait_for_sink().await?;
                continue;
            };
            trace!(%item, queued = self.queue.len(), "next item");
            match item {
                WorkItem::Object(hash) => self.process(hash).await?,
                WorkItem::Complete(hash) => self.complete(hash)?,
            }
        }

        if let Some(stuck) = self.deps.first_pending() {
            return Err(PushError::DependencyCycle(stuck));
        }
        self.report_final();
        Ok(PushReport {
            root: self.root,
            content_id: ContentId::from_object_hash(&self.root),
            counters: self.counters,
        })
    }

    fn enqueue(&mut self, item: WorkItem) {
        self.counters.scheduled += 1;
        self.queue.push_back(item);
    }

    async fn process(&mut self, hash: ObjectHash) -> PushResult<()> {
        if self.deps.is_completed(&hash) || self.deps.is_resolved(&hash) {
            self.counters.skipped += 1;
            trace!(hash = %hash.short_hex(), "already processed");
            return Ok(());
        }
        if self.has_entry(&hash)? {
            self.counters.skipped += 1;
            debug!(hash = %hash.short_hex(), "already migrated");
            for parent in self.deps.finish(&hash)? {
                self.enqueue(WorkItem::Complete(parent));
            }
            return Ok(());
        }

        let store = self.push.store.clone();
        let object = tokio::task::spawn_blocking(move || store.encoded_object(&hash))
            .await
            .map_err(|e| PushError::Worker(e.to_string()))?
            .map_err(|e| PushError::from_resolve(hash, e))?;
        let translated = translate(object.kind, object.size, &object.data)
            .map_err(|source| PushError::Translation { hash, source })?;
        self.counters.processed += 1;
        self.last_processed = Some(hash);

        let mut children = 0usize;
        for child in extract_links(&translated.node) {
            if self.deps.is_completed(&child) {
                continue;
            }
            if !self.deps.is_tracked(&child) && self.has_entry(&child)? {
                continue;
            }
            if self.deps.add_dependency(hash, child)? {
                self.enqueue(WorkItem::Object(child));
            }
            children += 1;
        }
        if self.deps.mark_resolved(&hash)? {
            self.enqueue(WorkItem::Complete(hash));
        }
        trace!(hash = %hash.short_hex(), kind = %object.kind, children, "processed");

        self.sink.submit(hash, translated.canonical).await?;
        self.unacked += 1;

        let interval = self.push.options.progress_interval;
        if interval > 0 && self.counters.processed % interval == 0 {
            self.report(hash);
        }
        Ok(())
    }

    fn complete(&mut self, hash: ObjectHash) -> PushResult<()> {
        if !self.deps.try_begin_completion(&hash)? {
            trace!(hash = %hash.short_hex(), "completion waits for sink");
            return Ok(());
        }
        self.push
            .tracker
            .add_entry(&hash)
            .map_err(|source| PushError::Tracker { hash, source })?;
        self.counters.completed += 1;
        for parent in self.deps.finish(&hash)? {
            self.enqueue(WorkItem::Complete(parent));
        }
        Ok(())
    }

    fn has_entry(&self, hash: &ObjectHash) -> PushResult<bool> {
        self.push
            .tracker
            .has_entry(hash)
            .map_err(|source| PushError::Tracker { hash: *hash, source })
    }

    fn acknowledge(&mut self, hash: ObjectHash) -> PushResult<()> {
        self.unacked = self.unacked.saturating_sub(1);
        self.counters.committed += 1;
        if self.deps.mark_committed(&hash)? {
            self.enqueue(WorkItem::Complete(hash));
        }
        Ok(())
    }

    fn fold_acks(&mut self) -> PushResult<()> {
        while let Ok(hash) = self.acks.try_recv() {
            self.acknowledge(hash)?;
        }
        Ok(())
    }

    /// Block until a sink worker reports. Only called with an empty queue.
    async fn wait_for_sink(&mut self) -> PushResult<()> {
        tokio::select! {
            biased;
            Some(err) = self.cancel.recv() => Err(err),
            Some(hash) = self.acks.recv() => self.acknowledge(hash),
            Some(joined) = self.sink.join_next() => joined,
            else => Err(PushError::Worker("sink workers exited without reporting".into())),
        }
    }

    fn report(&mut self, hash: ObjectHash) {
        self.last_reported = self.counters.processed;
        let progress = Progress {
            processed: self.counters.processed,
            scheduled: self.counters.scheduled,
            in_flight: self.deps.pending(),
            hash,
            content_id: ContentId::from_object_hash(&hash),
        };
        self.push.reporter.report(&progress);
    }

    fn report_final(&mut self) {
        if let Some(hash) = self.last_processed {
            if self.last_reported != self.counters.processed {
                self.report(hash);
            }
        }
    }
}
