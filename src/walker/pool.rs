//! Fixed-size worker pool over a shared worklist.
//!
//! Each worker is a plain OS thread running the same loop: pop a batch,
//! run the action on each item, let the lease drop mark the batch
//! complete. Workers exit when the worklist reports termination.

use crate::error::WalkError;
use crate::walker::Worklist;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A set of joined-on-demand worker threads.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start up to `workers` threads named `name-0..`, each popping
    /// batches of up to `batch` items and running `action` per item.
    ///
    /// Thread-start failures are reported and tolerated; the pool runs
    /// short-handed. Zero started workers is fatal: nobody would ever
    /// drain the worklist.
    pub fn spawn<T, F>(
        worklist: Arc<Worklist<T>>,
        workers: usize,
        batch: usize,
        name: &str,
        action: F,
    ) -> Result<Self, WalkError>
    where
        T: Send + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let action = Arc::new(action);
        let mut handles = Vec::with_capacity(workers);

        for id in 0..workers {
            let worklist = Arc::clone(&worklist);
            let action = Arc::clone(&action);
            let builder = thread::Builder::new().name(format!("{name}-{id}"));
            let spawned = builder.spawn(move || {
                while let Some((items, _lease)) = worklist.pop_batch(batch) {
                    for item in items {
                        action(item);
                    }
                }
            });
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // run short-handed if some threads can't start
                    warn!(worker = id, error = %e, "failed to start worker thread");
                    eprintln!("{name}: cannot start worker thread: {e}");
                }
            }
        }

        if handles.is_empty() {
            return Err(WalkError::NoWorkersStarted);
        }
        debug!(requested = workers, started = handles.len(), "workers started");

        Ok(Self { handles })
    }

    /// Number of workers actually running.
    pub fn started(&self) -> usize {
        self.handles.len()
    }

    /// Wait for every worker to exit. A worker that cannot be joined
    /// (it panicked) is fatal: completion can no longer be determined.
    pub fn join(self) -> Result<(), WalkError> {
        for handle in self.handles {
            handle.join().map_err(|_| WalkError::JoinFailed)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    #[test]
    fn test_pool_drains_worklist() {
        let worklist = Arc::new(Worklist::new());
        for i in 0..100u64 {
            worklist.push(i);
        }

        let sum = Arc::new(AtomicU64::new(0));
        let pool = {
            let sum = Arc::clone(&sum);
            WorkerPool::spawn(Arc::clone(&worklist), 4, 1, "test", move |item| {
                sum.fetch_add(item, Ordering::Relaxed);
            })
            .unwrap()
        };

        assert_eq!(pool.started(), 4);
        pool.join().unwrap();
        assert_eq!(sum.load(Ordering::Relaxed), (0..100).sum::<u64>());
    }

    #[test]
    fn test_pool_workers_feed_each_other() {
        let worklist = Arc::new(Worklist::new());
        worklist.push(0u32);

        let count = Arc::new(AtomicU64::new(0));
        let pool = {
            let count = Arc::clone(&count);
            let feeder = Arc::clone(&worklist);
            WorkerPool::spawn(Arc::clone(&worklist), 8, 1, "test", move |depth| {
                count.fetch_add(1, Ordering::Relaxed);
                if depth < 5 {
                    feeder.push(depth + 1);
                    feeder.push(depth + 1);
                }
            })
            .unwrap()
        };

        pool.join().unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 63);
    }

    #[test]
    fn test_pool_batched_consumption() {
        let worklist = Arc::new(Worklist::with_external_feed());
        let count = Arc::new(AtomicU64::new(0));
        let pool = {
            let count = Arc::clone(&count);
            WorkerPool::spawn(Arc::clone(&worklist), 2, 10, "test", move |_item: u32| {
                count.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap()
        };

        for i in 0..95 {
            worklist.push(i);
        }
        worklist.mark_eof();
        pool.join().unwrap();
        assert_eq!(count.load(Ordering::Relaxed), 95);
    }

    #[test]
    fn test_join_surfaces_worker_panic() {
        let worklist = Arc::new(Worklist::new());
        worklist.push(());

        let pool = WorkerPool::spawn(Arc::clone(&worklist), 2, 1, "test", |_item| {
            panic!("action failed");
        })
        .unwrap();

        assert!(matches!(pool.join(), Err(WalkError::JoinFailed)));
    }
}
