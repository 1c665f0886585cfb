// Thu Jan 22 2026 - Alex

use crate::runtime::error::{SchedulerError, TaskError};
use crate::runtime::future::{self, TaskFuture};
use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct HostId(pub usize);

impl fmt::Display for HostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "host-{}", self.0)
    }
}

/// Where a task is meant to run.
///
/// The in-process pool records host affinity in [`StatsSnapshot::host_dispatches`]
/// but does not enforce it: a `Host` task runs on whichever worker is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    #[default]
    Any,
    Host(HostId),
}

/// Runs submitted closures on a rayon pool and hands back typed futures.
///
/// Cloning is cheap and yields a handle to the same pool. Every task receives
/// the handle so it can submit nested work without ambient state.
#[derive(Clone)]
pub struct TaskScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    pool: rayon::ThreadPool,
    thread_count: usize,
    stats: SchedulerStats,
}

#[derive(Default)]
struct SchedulerStats {
    submitted: AtomicUsize,
    completed: AtomicUsize,
    panicked: AtomicUsize,
    host_dispatches: Mutex<BTreeMap<HostId, usize>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    pub submitted: usize,
    pub completed: usize,
    pub panicked: usize,
    pub host_dispatches: BTreeMap<HostId, usize>,
}

impl TaskScheduler {
    pub fn new(thread_count: usize) -> Result<Self, SchedulerError> {
        if thread_count == 0 {
            return Err(SchedulerError::InvalidThreadCount(thread_count));
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(thread_count)
            .thread_name(|i| format!("orchestrator-worker-{}", i))
            .build()?;

        log::debug!("Started scheduler with {} workers", thread_count);

        Ok(Self {
            inner: Arc::new(SchedulerInner {
                pool,
                thread_count,
                stats: SchedulerStats::default(),
            }),
        })
    }

    /// Queue `task`; it runs at most once. A panic inside the task resolves
    /// the future to [`TaskError::Panicked`] instead of unwinding the worker.
    pub fn submit<T, F>(&self, name: impl Into<String>, placement: Placement, task: F) -> TaskFuture<T>
    where
        T: Send + 'static,
        F: FnOnce(&TaskScheduler) -> T + Send + 'static,
    {
        let name = name.into();
        let (future, completer) = future::pending(name.clone());

        self.inner.stats.submitted.fetch_add(1, Ordering::SeqCst);
        if let Placement::Host(host) = placement {
            *self.inner.stats.host_dispatches.lock().entry(host).or_insert(0) += 1;
        }
        log::trace!("Submitting task '{}' ({:?})", name, placement);

        let scheduler = self.clone();
        self.inner.pool.spawn(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| task(&scheduler)));
            let result = match outcome {
                Ok(value) => {
                    scheduler.inner.stats.completed.fetch_add(1, Ordering::SeqCst);
                    Ok(value)
                }
                Err(payload) => {
                    scheduler.inner.stats.panicked.fetch_add(1, Ordering::SeqCst);
                    let message = panic_message(payload.as_ref());
                    log::warn!("Task '{}' panicked: {}", name, message);
                    Err(TaskError::Panicked { task: name, message })
                }
            };
            completer.complete(result);
        });

        future
    }

    /// Barrier over `futures`. Results come back in the order of the input
    /// list, whatever order the tasks finished in.
    pub fn await_all<T>(&self, futures: Vec<TaskFuture<T>>) -> Vec<Result<T, TaskError>> {
        futures.into_iter().map(TaskFuture::wait).collect()
    }

    pub fn thread_count(&self) -> usize {
        self.inner.thread_count
    }

    pub fn stats(&self) -> StatsSnapshot {
        let stats = &self.inner.stats;
        StatsSnapshot {
            submitted: stats.submitted.load(Ordering::SeqCst),
            completed: stats.completed.load(Ordering::SeqCst),
            panicked: stats.panicked.load(Ordering::SeqCst),
            host_dispatches: stats.host_dispatches.lock().clone(),
        }
    }
}

impl fmt::Debug for TaskScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskScheduler")
            .field("thread_count", &self.inner.thread_count)
            .finish()
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
