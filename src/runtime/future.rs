// Thu Jan 22 2026 - Alex

use crate::runtime::error::TaskError;
use parking_lot::{Condvar, Mutex};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

struct Slot<T> {
    value: Mutex<Option<Result<T, TaskError>>>,
    ready: Condvar,
}

/// The eventual result of one submitted task.
pub struct TaskFuture<T> {
    name: String,
    slot: Arc<Slot<T>>,
}

/// Write side of a [`TaskFuture`]. Dropping it unfilled resolves the future
/// to [`TaskError::Abandoned`], so a waiter never hangs on a lost task.
pub(crate) struct Completer<T> {
    name: String,
    slot: Option<Arc<Slot<T>>>,
}

pub(crate) fn pending<T>(name: String) -> (TaskFuture<T>, Completer<T>) {
    let slot = Arc::new(Slot {
        value: Mutex::new(None),
        ready: Condvar::new(),
    });
    let future = TaskFuture {
        name: name.clone(),
        slot: slot.clone(),
    };
    let completer = Completer {
        name,
        slot: Some(slot),
    };
    (future, completer)
}

impl<T> Completer<T> {
    pub(crate) fn complete(mut self, result: Result<T, TaskError>) {
        if let Some(slot) = self.slot.take() {
            fill(&slot, result);
        }
    }
}

impl<T> Drop for Completer<T> {
    fn drop(&mut self) {
        if let Some(slot) = self.slot.take() {
            fill(&slot, Err(TaskError::Abandoned(self.name.clone())));
        }
    }
}

fn fill<T>(slot: &Slot<T>, result: Result<T, TaskError>) {
    let mut value = slot.value.lock();
    if value.is_none() {
        *value = Some(result);
    }
    slot.ready.notify_all();
}

impl<T> TaskFuture<T> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_ready(&self) -> bool {
        self.slot.value.lock().is_some()
    }

    /// Block until the task finishes.
    ///
    /// On a pool worker the wait keeps executing other queued pool jobs, so a
    /// task waiting on tasks it submitted itself cannot starve the pool.
    pub fn wait(self) -> Result<T, TaskError> {
        loop {
            if let Some(result) = self.slot.value.lock().take() {
                return result;
            }

            match rayon::yield_now() {
                Some(rayon::Yield::Executed) => continue,
                Some(rayon::Yield::Idle) => {
                    let mut value = self.slot.value.lock();
                    if value.is_none() {
                        self.slot.ready.wait_for(&mut value, Duration::from_millis(1));
                    }
                }
                None => {
                    let mut value = self.slot.value.lock();
                    while value.is_none() {
                        self.slot.ready.wait(&mut value);
                    }
                }
            }
        }
    }
}

impl<T> fmt::Debug for TaskFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskFuture")
            .field("name", &self.name)
            .field("ready", &self.is_ready())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_complete_then_wait() {
        let (future, completer) = pending::<u32>("t".to_string());
        assert!(!future.is_ready());
        completer.complete(Ok(5));
        assert!(future.is_ready());
        assert_eq!(future.wait(), Ok(5));
    }

    #[test]
    fn test_wait_across_threads() {
        let (future, completer) = pending::<String>("t".to_string());
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            completer.complete(Ok("done".to_string()));
        });
        assert_eq!(future.wait().unwrap(), "done");
        handle.join().unwrap();
    }

    #[test]
    fn test_dropped_completer_abandons() {
        let (future, completer) = pending::<u32>("lost".to_string());
        drop(completer);
        assert_eq!(future.wait(), Err(TaskError::Abandoned("lost".to_string())));
    }
}
