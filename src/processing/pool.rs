//! Fixed-capacity task pool.
//!
//! A permit is taken from a semaphore before each task is spawned and held
//! until the task finishes, so at most `capacity` tasks run at once and
//! submission waits while the pool is full. Results are collected in
//! completion order.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    capacity: usize,
}

impl WorkerPool {
    /// A pool running at most `capacity` tasks at once, clamped to
    /// `1..=Semaphore::MAX_PERMITS`.
    pub fn new(capacity: usize) -> WorkerPool {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        WorkerPool {
            permits: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Run `task` for every item and collect the outputs.
    ///
    /// A task that panics is logged and contributes no output.
    pub async fn run<I, F, Fut, T>(&self, items: I, task: F) -> Vec<T>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut tasks = JoinSet::new();
        let mut outputs = Vec::new();

        for item in items {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    log::error!("worker pool closed: {e}");
                    break;
                }
            };
            let fut = task(item);
            tasks.spawn(async move {
                let output = fut.await;
                drop(permit);
                output
            });

            while let Some(joined) = tasks.try_join_next() {
                collect(joined, &mut outputs);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            collect(joined, &mut outputs);
        }
        outputs
    }
}

fn collect<T>(joined: Result<T, JoinError>, outputs: &mut Vec<T>) {
    match joined {
        Ok(output) => outputs.push(output),
        Err(e) => log::error!("worker task failed: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_in_flight_never_exceeds_capacity() {
        let pool = WorkerPool::new(3);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let outputs = pool
            .run(0..20u32, |n| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    n * 2
                }
            })
            .await;

        assert!(peak.load(Ordering::SeqCst) <= 3, "peak={peak:?}");
        assert!(peak.load(Ordering::SeqCst) >= 2, "pool should run tasks in parallel");
        let mut outputs = outputs;
        outputs.sort_unstable();
        assert_eq!(outputs, (0..20u32).map(|n| n * 2).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_zero_capacity_is_one() {
        let pool = WorkerPool::new(0);
        assert_eq!(pool.capacity(), 1);
        let outputs = pool.run(vec!["a", "b"], |s| async move { s.len() }).await;
        assert_eq!(outputs, vec![1, 1]);
    }

    #[tokio::test]
    async fn test_oversized_capacity_is_capped() {
        let pool = WorkerPool::new(usize::MAX);
        assert_eq!(pool.capacity(), Semaphore::MAX_PERMITS);
        let outputs = pool.run(vec![7u32], |n| async move { n + 1 }).await;
        assert_eq!(outputs, vec![8]);
    }

    #[tokio::test]
    async fn test_panicking_task_is_dropped() {
        let pool = WorkerPool::new(2);
        let mut outputs = pool
            .run(1..=4u32, |n| async move {
                if n == 3 {
                    panic!("task {n} blew up");
                }
                n
            })
            .await;
        outputs.sort_unstable();
        assert_eq!(outputs, vec![1, 2, 4]);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let pool = WorkerPool::new(4);
        let outputs: Vec<u32> = pool.run(Vec::<u32>::new(), |n| async move { n }).await;
        assert!(outputs.is_empty());
    }
}
