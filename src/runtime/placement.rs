// Thu Jan 22 2026 - Alex

use crate::runtime::error::PlacementError;
use crate::runtime::scheduler::HostId;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementStrategy {
    /// Every slot on a distinct host.
    Spread,
    /// Fill hosts one after another.
    Pack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub reservation: u64,
    pub host: HostId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    id: u64,
    slots: Vec<Slot>,
}

impl Reservation {
    pub fn new(id: u64, slots: Vec<Slot>) -> Self {
        Self { id, slots }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Split into one guard per slot; each releases its slot when dropped.
    pub fn into_guards(self, service: &Arc<dyn PlacementService>) -> Vec<SlotGuard> {
        self.slots.into_iter()
            .map(|slot| SlotGuard {
                slot,
                service: Arc::clone(service),
            })
            .collect()
    }
}

pub trait PlacementService: Send + Sync {
    fn reserve(&self, n_slots: usize, strategy: PlacementStrategy) -> Result<Reservation, PlacementError>;

    fn release_slot(&self, slot: &Slot);

    /// Largest reservation `strategy` could satisfy right now.
    fn capacity(&self, strategy: PlacementStrategy) -> usize;

    fn release(&self, reservation: Reservation) {
        for slot in reservation.slots() {
            self.release_slot(slot);
        }
    }
}

/// Holds one reserved slot for as long as it lives.
pub struct SlotGuard {
    slot: Slot,
    service: Arc<dyn PlacementService>,
}

impl SlotGuard {
    pub fn host(&self) -> HostId {
        self.slot.host
    }

    pub fn slot(&self) -> Slot {
        self.slot
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.service.release_slot(&self.slot);
    }
}

impl fmt::Debug for SlotGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotGuard").field("slot", &self.slot).finish()
    }
}

/// A fixed set of simulated hosts, each offering the same number of slots.
pub struct LocalPlacement {
    slots_per_host: usize,
    in_use: Mutex<Vec<usize>>,
    next_id: AtomicU64,
}

impl LocalPlacement {
    pub fn new(hosts: usize, slots_per_host: usize) -> Self {
        Self {
            slots_per_host,
            in_use: Mutex::new(vec![0; hosts]),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn active_slots(&self) -> usize {
        self.in_use.lock().iter().sum()
    }
}

impl PlacementService for LocalPlacement {
    fn reserve(&self, n_slots: usize, strategy: PlacementStrategy) -> Result<Reservation, PlacementError> {
        let mut in_use = self.in_use.lock();
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let hosts: Vec<usize> = match strategy {
            PlacementStrategy::Spread => {
                // Least loaded hosts first; ties go to the lower host id.
                let mut free: Vec<usize> = (0..in_use.len())
                    .filter(|&h| in_use[h] < self.slots_per_host)
                    .collect();
                free.sort_by_key(|&h| (in_use[h], h));
                if free.len() < n_slots {
                    return Err(PlacementError::Insufficient {
                        requested: n_slots,
                        available: free.len(),
                    });
                }
                free.truncate(n_slots);
                free
            }
            PlacementStrategy::Pack => {
                let mut picked = Vec::with_capacity(n_slots);
                for h in 0..in_use.len() {
                    for _ in in_use[h]..self.slots_per_host {
                        if picked.len() == n_slots {
                            break;
                        }
                        picked.push(h);
                    }
                }
                if picked.len() < n_slots {
                    return Err(PlacementError::Insufficient {
                        requested: n_slots,
                        available: picked.len(),
                    });
                }
                picked
            }
        };

        for &h in &hosts {
            in_use[h] += 1;
        }

        log::debug!("Reservation {}: {} slots ({:?})", id, hosts.len(), strategy);

        Ok(Reservation::new(
            id,
            hosts.into_iter()
                .map(|h| Slot {
                    reservation: id,
                    host: HostId(h),
                })
                .collect(),
        ))
    }

    fn release_slot(&self, slot: &Slot) {
        let mut in_use = self.in_use.lock();
        match in_use.get_mut(slot.host.0) {
            Some(count) if *count > 0 => {
                *count -= 1;
                log::trace!("Released slot on {} (reservation {})", slot.host, slot.reservation);
            }
            _ => log::warn!("Release of unknown slot on {} (reservation {})", slot.host, slot.reservation),
        }
    }

    fn capacity(&self, strategy: PlacementStrategy) -> usize {
        let in_use = self.in_use.lock();
        match strategy {
            PlacementStrategy::Spread => in_use.iter().filter(|&&n| n < self.slots_per_host).count(),
            PlacementStrategy::Pack => in_use.iter().map(|&n| self.slots_per_host.saturating_sub(n)).sum(),
        }
    }
}
