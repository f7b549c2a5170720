//! First-error-wins cancellation.
//!
//! Failures raised away from the scheduler (sink workers, the signal
//! listener) are posted to a channel with room for exactly one error. The
//! scheduler drains it between work items; later errors are dropped.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::PushError;

/// Sending half of a [`Cancellation`]. Cheap to clone.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    tx: mpsc::Sender<PushError>,
}

impl CancelHandle {
    /// Request that the run abort with `err`.
    ///
    /// Returns `false` if another error already claimed the slot.
    pub fn cancel(&self, err: PushError) -> bool {
        match self.tx.try_send(err) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(err)) => {
                debug!(error = %err, "run already aborting, dropping error");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Receiving half, owned by the scheduler for the duration of one run.
#[derive(Debug)]
pub struct Cancellation {
    handle: CancelHandle,
    rx: mpsc::Receiver<PushError>,
}

impl Cancellation {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel(1);
        Self {
            handle: CancelHandle { tx },
            rx,
        }
    }

    /// A handle for posting errors.
    pub fn handle(&self) -> CancelHandle {
        self.handle.clone()
    }

    /// The pending error, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<PushError> {
        self.rx.try_recv().ok()
    }

    /// Wait for an error. Never returns `None` while `self` is alive since
    /// it keeps a sender of its own.
    pub async fn recv(&mut self) -> Option<PushError> {
        self.rx.recv().await
    }
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

/// Background Ctrl-C listener for one run. Aborted when dropped.
///
/// Aborting stops the listener but leaves tokio's SIGINT handler installed.
pub(crate) struct InterruptGuard(JoinHandle<()>);

impl InterruptGuard {
    pub(crate) fn spawn(handle: CancelHandle) -> Self {
        Self(tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, aborting push");
                handle.cancel(PushError::Interrupted);
            }
        }))
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}
