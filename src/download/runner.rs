//! Bounded fan-out of independent async tasks with a join barrier.
//!
//! [`BoundedRunner::run_all`] spawns every task on the tokio runtime while
//! holding at most `max_parallel` permits at a time. A permit is acquired
//! *before* the task is spawned, so pending tasks never occupy the runtime.
//! Task errors and panics are logged under the task label and counted in the
//! returned [`RunReport`]; they never abort siblings or the barrier.
//!
//! # Example
//!
//! ```
//! use comic_crawler::download::{BoundedRunner, Task};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let runner = BoundedRunner::new(5)?;
//! let tasks = (0..10)
//!     .map(|i| Task::new(format!("task-{i}"), async move { Ok::<_, std::io::Error>(()) }))
//!     .collect();
//! let report = runner.run_all(tasks).await?;
//! assert_eq!(report.succeeded(), 10);
//! # Ok(())
//! # }
//! ```

use std::fmt::Display;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use super::constants::{MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Error type for runner construction and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

type BoxedTask<E> = Pin<Box<dyn Future<Output = Result<(), E>> + Send + 'static>>;

/// A labelled unit of work. The label identifies the task in logs.
pub struct Task<E> {
    label: String,
    future: BoxedTask<E>,
}

impl<E> Task<E> {
    /// Wraps `future` under `label`.
    pub fn new<F>(label: impl Into<String>, future: F) -> Self
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
    {
        Self {
            label: label.into(),
            future: Box::pin(future),
        }
    }
}

impl<E> std::fmt::Debug for Task<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Outcome counts of one [`BoundedRunner::run_all`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    succeeded: usize,
    failed: usize,
    panicked: usize,
}

impl RunReport {
    /// Tasks that returned `Ok`.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    /// Tasks that returned `Err`.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Tasks that panicked.
    #[must_use]
    pub fn panicked(&self) -> usize {
        self.panicked
    }

    /// Every dispatched task.
    #[must_use]
    pub fn total(&self) -> usize {
        self.succeeded + self.failed + self.panicked
    }

    /// True when every task succeeded (vacuously true for zero tasks).
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.panicked == 0
    }
}

/// Runs tasks with a fixed upper bound on how many are in flight.
#[derive(Debug, Clone, Copy)]
pub struct BoundedRunner {
    max_parallel: usize,
}

impl BoundedRunner {
    /// Creates a runner allowing `max_parallel` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::InvalidConcurrency`] if the value is outside
    /// 1..=100.
    pub fn new(max_parallel: usize) -> Result<Self, RunnerError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&max_parallel) {
            return Err(RunnerError::InvalidConcurrency {
                value: max_parallel,
            });
        }
        Ok(Self { max_parallel })
    }

    /// Returns the configured bound.
    #[must_use]
    pub fn max_parallel(&self) -> usize {
        self.max_parallel
    }

    /// Runs every task and waits for all of them.
    ///
    /// Task order is not preserved. Individual task failures do NOT cause
    /// this method to error; they are logged and counted.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::SemaphoreClosed`] if the semaphore is closed.
    #[instrument(skip(self, tasks), fields(max_parallel = self.max_parallel, task_count = tasks.len()))]
    pub async fn run_all<E>(&self, tasks: Vec<Task<E>>) -> Result<RunReport, RunnerError>
    where
        E: Display + Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|_| RunnerError::SemaphoreClosed)?;

            let Task { label, future } = task;
            let handle = tokio::spawn(async move {
                let _permit = permit;
                future.await
            });
            handles.push((label, handle));
        }

        debug!(task_count = handles.len(), "waiting for tasks to complete");

        let mut report = RunReport::default();
        for (label, handle) in handles {
            match handle.await {
                Ok(Ok(())) => report.succeeded += 1,
                Ok(Err(e)) => {
                    warn!(task = %label, error = %e, "task failed");
                    report.failed += 1;
                }
                Err(e) => {
                    warn!(task = %label, error = %e, "task panicked");
                    report.panicked += 1;
                }
            }
        }

        debug!(
            succeeded = report.succeeded,
            failed = report.failed,
            panicked = report.panicked,
            "all tasks finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn test_runner_rejects_zero_concurrency() {
        assert!(matches!(
            BoundedRunner::new(0),
            Err(RunnerError::InvalidConcurrency { value: 0 })
        ));
    }

    #[test]
    fn test_runner_rejects_concurrency_above_max() {
        assert!(matches!(
            BoundedRunner::new(101),
            Err(RunnerError::InvalidConcurrency { value: 101 })
        ));
    }

    #[test]
    fn test_runner_accepts_bounds() {
        assert_eq!(BoundedRunner::new(1).unwrap().max_parallel(), 1);
        assert_eq!(BoundedRunner::new(100).unwrap().max_parallel(), 100);
    }

    #[test]
    fn test_invalid_concurrency_message_names_range() {
        let error = RunnerError::InvalidConcurrency { value: 0 };
        let msg = error.to_string();
        assert!(msg.contains('0'));
        assert!(msg.contains("between 1 and 100"));
    }

    #[tokio::test]
    async fn test_run_all_with_no_tasks_returns_empty_report() {
        let runner = BoundedRunner::new(3).unwrap();
        let report = runner.run_all::<String>(Vec::new()).await.unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.all_succeeded());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_run_all_never_exceeds_bound() {
        let runner = BoundedRunner::new(3).unwrap();
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..20)
            .map(|i| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                Task::new(format!("t{i}"), async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, String>(())
                })
            })
            .collect();

        let report = runner.run_all(tasks).await.unwrap();
        assert_eq!(report.succeeded(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_run_all_isolates_failures_and_panics() {
        let runner = BoundedRunner::new(2).unwrap();
        let finished = Arc::new(AtomicUsize::new(0));

        let mut tasks = Vec::new();
        for i in 0..5 {
            let finished = Arc::clone(&finished);
            tasks.push(Task::new(format!("ok{i}"), async move {
                finished.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }));
        }
        tasks.push(Task::new("bad", async { Err("boom".to_string()) }));
        let explode = true;
        tasks.push(Task::new("panics", async move {
            assert!(!explode, "task blew up");
            Ok(())
        }));

        let report = runner.run_all(tasks).await.unwrap();
        assert_eq!(report.succeeded(), 5);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.panicked(), 1);
        assert_eq!(report.total(), 7);
        assert!(!report.all_succeeded());
        assert_eq!(finished.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_task_debug_shows_label() {
        let task = Task::new("chapter-1", async { Ok::<_, String>(()) });
        assert!(format!("{task:?}").contains("chapter-1"));
    }
}
