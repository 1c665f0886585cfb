// Thu Jan 22 2026 - Alex

pub mod context;
pub mod error;
pub mod future;
pub mod placement;
pub mod scheduler;
pub mod store;

pub use context::{CancelFlag, RunContext};
pub use error::{PlacementError, SchedulerError, StoreError, TaskError};
pub use future::TaskFuture;
pub use placement::{LocalPlacement, PlacementService, PlacementStrategy, Reservation, Slot, SlotGuard};
pub use scheduler::{HostId, Placement, StatsSnapshot, TaskScheduler};
pub use store::{Handle, ObjectStore};
