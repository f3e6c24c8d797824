//! Single-slot background worker for scans

use std::future::Future;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Runs at most one scan at a time
///
/// Submitting a new task cancels an unfinished predecessor and waits for it
/// to unwind before the new one is spawned.
#[derive(Debug, Default)]
pub struct ScanWorker {
    slot: Mutex<Option<JoinHandle<()>>>,
}

async fn cancel(handle: JoinHandle<()>) {
    if handle.is_finished() {
        return;
    }

    debug!("Cancelling unfinished scan");
    handle.abort();
    if let Err(e) = handle.await {
        if e.is_panic() {
            warn!("Scan task panicked: {}", e);
        }
    }
}

impl ScanWorker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current task with `task`
    pub async fn submit<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().await;
        if let Some(handle) = slot.take() {
            cancel(handle).await;
        }
        *slot = Some(tokio::spawn(task));
    }

    /// Cancel the current task, if any
    ///
    /// The worker stays usable; the next submission spawns a fresh task.
    pub async fn shutdown(&self) {
        let handle = self.slot.lock().await.take();
        if let Some(handle) = handle {
            cancel(handle).await;
        }
    }

    /// Check if a task is still running
    pub async fn is_busy(&self) -> bool {
        self.slot
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the current task to complete
    #[cfg(test)]
    pub async fn settle(&self) {
        let handle = self.slot.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
