//! Background expiry sweeper.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::TtlCache;

/// A store whose stale entries can be dropped in one pass.
pub trait Sweep: Send + Sync + 'static {
    /// Removes stale entries and returns how many were removed.
    fn sweep(&self) -> usize;

    /// Entries left in the store.
    fn remaining(&self) -> usize;

    /// Name used in sweep logs.
    fn name(&self) -> &'static str {
        "cache"
    }
}

impl<V> Sweep for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn sweep(&self) -> usize {
        self.purge_expired()
    }

    fn remaining(&self) -> usize {
        self.len()
    }
}

/// Handle to a running sweep loop.
///
/// The loop sweeps a shared store (a [`TtlCache`] or any other [`Sweep`]
/// implementor) once per interval, independent of read traffic. Call
/// [`Sweeper::stop`] for an orderly shutdown; dropping the handle aborts
/// the task.
pub struct Sweeper {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Sweeper {
    /// Spawns the sweep loop on the current tokio runtime.
    ///
    /// The first pass runs one full `interval` after start.
    pub fn start<S: Sweep>(store: Arc<S>, interval: Duration) -> Self {
        let name = store.name();
        let (shutdown, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // Consume the immediate first tick.
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = store.sweep();
                        if removed > 0 {
                            debug!(store = name, removed, remaining = store.remaining(), "Swept stale entries");
                        }
                    }
                    _ = &mut stop_rx => break,
                }
            }
        });

        info!(store = name, interval_secs = interval.as_secs_f64(), "Sweeper started");

        Self {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// Stops the loop and waits for it to exit.
    pub async fn stop(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Sweeper exited abnormally");
            }
        }
        info!("Sweeper stopped");
    }

    /// Returns true while the loop is running.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
