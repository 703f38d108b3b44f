use std::future::Future;
use std::sync::{Arc, Mutex};

use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Sink for best-effort side effects (cache writes, hit counters, evictions).
/// Callers hand work off and move on; failures end up in the log only.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, label: &'static str, fut: F)
    where
        F: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let task = async move {
            if let Err(e) = fut.await {
                warn!(task = label, error = %e, "background task failed");
            }
        };
        match self.tasks.lock() {
            Ok(mut set) => {
                while set.try_join_next().is_some() {}
                set.spawn(task);
            }
            Err(_) => {
                // poisoned lock: still run the work, just untracked
                tokio::spawn(task);
            }
        }
    }

    /// Waits for everything spawned so far.
    pub async fn flush(&self) {
        let mut pending = match self.tasks.lock() {
            Ok(mut set) => std::mem::take(&mut *set),
            Err(_) => return,
        };
        let mut n = 0usize;
        while let Some(res) = pending.join_next().await {
            n += 1;
            if let Err(e) = res {
                warn!(error = %e, "background task panicked or was cancelled");
            }
        }
        debug!(completed = n, "background tasks flushed");
    }

    pub fn pending(&self) -> usize {
        self.tasks.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn flush_waits_for_spawned_work() {
        let bg = BackgroundTasks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let c = counter.clone();
            bg.spawn("count", async move {
                tokio::task::yield_now().await;
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
        bg.flush().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(bg.pending(), 0);
    }

    #[tokio::test]
    async fn failures_do_not_propagate() {
        let bg = BackgroundTasks::new();
        bg.spawn("fails", async { anyhow::bail!("store offline") });
        bg.flush().await;
    }
}
