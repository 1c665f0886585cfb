// Thu Jan 22 2026 - Alex

use crate::config::RunConfig;
use crate::runtime::scheduler::TaskScheduler;
use crate::runtime::store::ObjectStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation shared by a run and every unit below it.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capabilities handed explicitly to every unit of work in a run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub config: Arc<RunConfig>,
    pub scheduler: TaskScheduler,
    pub store: ObjectStore,
    pub cancel: CancelFlag,
}

impl RunContext {
    pub fn new(config: RunConfig, scheduler: TaskScheduler, store: ObjectStore) -> Self {
        Self {
            config: Arc::new(config),
            scheduler,
            store,
            cancel: CancelFlag::new(),
        }
    }
}
