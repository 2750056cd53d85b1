//! Pending chunk adds shared by the simulation and drain threads
//!
//! Every coordinate the streaming window wants is in exactly one of three
//! states: queued (waiting for a drain), in flight (being generated and
//! meshed), or committed (its `Add` op has been sent to the registry).
//! Cancelling removes it from whichever state it is in, so a late drain
//! result for a cancelled coordinate is dropped instead of being added.
//!
//! All registry ops are sent while holding the pending lock. That keeps the
//! op order consistent with the state transitions: a `Remove` can never be
//! overtaken by the `Add` it cancelled.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rayon::prelude::*;

use crate::render::mesher::{ChunkMesh, mesh_chunk};
use crate::render::registry::RegistryQueue;
use crate::voxel::chunk::ChunkCoord;
use crate::voxel::world::World;

/// Snapshot of the pending-add bookkeeping
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamingStats {
    /// Coordinates waiting for a drain
    pub pending: usize,
    /// Coordinates being resolved by a drain right now
    pub in_flight: usize,
    /// Coordinates whose `Add` has been sent
    pub committed: usize,
    /// Scene generation; bumped on every reset
    pub epoch: u64,
}

/// Result of one [`PendingAdds::drain`] call
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Coordinates resolved and meshed
    pub resolved: usize,
    /// Results forwarded to the registry
    pub committed: usize,
    /// Results dropped because they were cancelled meanwhile
    pub discarded: usize,
}

#[derive(Default)]
struct PendingState {
    order: VecDeque<ChunkCoord>,
    queued: HashSet<ChunkCoord>,
    in_flight: HashSet<ChunkCoord>,
    committed: HashSet<ChunkCoord>,
    epoch: u64,
}

impl PendingState {
    fn is_requested(&self, coord: ChunkCoord) -> bool {
        self.queued.contains(&coord) || self.in_flight.contains(&coord) || self.committed.contains(&coord)
    }

    fn enqueue(&mut self, coord: ChunkCoord) -> bool {
        if self.is_requested(coord) {
            return false;
        }
        self.queued.insert(coord);
        self.order.push_back(coord);
        true
    }
}

/// Pending-add list plus the registry queue it feeds
pub struct PendingAdds {
    state: Mutex<PendingState>,
    registry: RegistryQueue,
}

impl PendingAdds {
    pub fn new(registry: RegistryQueue) -> Self {
        Self {
            state: Mutex::new(PendingState::default()),
            registry,
        }
    }

    fn lock(&self) -> MutexGuard<'_, PendingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue coordinates that are not already queued, in flight or committed.
    /// Returns how many were newly queued.
    pub fn request<I>(&self, coords: I) -> usize
    where
        I: IntoIterator<Item = ChunkCoord>,
    {
        let mut state = self.lock();
        coords.into_iter().filter(|&coord| state.enqueue(coord)).count()
    }

    /// Forget coordinates and send a `Remove` for each
    pub fn cancel<I>(&self, coords: I)
    where
        I: IntoIterator<Item = ChunkCoord>,
    {
        let mut state = self.lock();
        for coord in coords {
            // Stale entries in `order` are skipped by the drain
            state.queued.remove(&coord);
            state.in_flight.remove(&coord);
            state.committed.remove(&coord);
            self.registry.enqueue_remove(coord);
        }
    }

    /// Drop all bookkeeping, send `Clear`, start a new epoch and queue
    /// `coords`. Returns the new epoch.
    pub fn reset<I>(&self, coords: I) -> u64
    where
        I: IntoIterator<Item = ChunkCoord>,
    {
        let mut state = self.lock();
        let epoch = state.epoch + 1;
        *state = PendingState {
            epoch,
            ..Default::default()
        };
        self.registry.enqueue_clear();
        for coord in coords {
            state.enqueue(coord);
        }
        epoch
    }

    /// Current epoch
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    pub fn is_requested(&self, coord: ChunkCoord) -> bool {
        self.lock().is_requested(coord)
    }

    pub fn stats(&self) -> StreamingStats {
        let state = self.lock();
        StreamingStats {
            pending: state.queued.len(),
            in_flight: state.in_flight.len(),
            committed: state.committed.len(),
            epoch: state.epoch,
        }
    }

    /// Resolve queued coordinates against `world` and forward the results.
    ///
    /// `epoch` must be the epoch observed together with `world` (read under
    /// the scene lock). If a reset happened since, nothing is taken. Chunk
    /// generation and meshing run without the pending lock, in parallel.
    pub fn drain(&self, world: &World, epoch: u64, batch_limit: Option<usize>) -> DrainReport {
        let batch = self.take_batch(epoch, batch_limit);
        if batch.is_empty() {
            return DrainReport::default();
        }

        let results: Vec<(ChunkCoord, ChunkMesh)> = batch
            .par_iter()
            .map(|&coord| (coord, mesh_chunk(&world.get_chunk(coord))))
            .collect();

        self.commit(epoch, results)
    }

    /// Move up to `batch_limit` queued coordinates into the in-flight set
    fn take_batch(&self, epoch: u64, batch_limit: Option<usize>) -> Vec<ChunkCoord> {
        let mut state = self.lock();
        if state.epoch != epoch {
            return Vec::new();
        }

        let limit = batch_limit.unwrap_or(usize::MAX);
        let mut batch = Vec::new();
        while batch.len() < limit {
            let Some(coord) = state.order.pop_front() else {
                break;
            };
            if state.queued.remove(&coord) {
                state.in_flight.insert(coord);
                batch.push(coord);
            }
        }
        batch
    }

    /// Forward results that are still wanted; drop the rest
    fn commit(&self, epoch: u64, results: Vec<(ChunkCoord, ChunkMesh)>) -> DrainReport {
        let mut report = DrainReport {
            resolved: results.len(),
            ..Default::default()
        };

        let mut state = self.lock();
        for (coord, mesh) in results {
            if state.epoch == epoch && state.in_flight.remove(&coord) {
                state.committed.insert(coord);
                self.registry.enqueue_add(coord, mesh);
                report.committed += 1;
            } else {
                log::trace!("Discarding cancelled chunk {:?}", coord);
                report.discarded += 1;
            }
        }

        log::debug!(
            "Drained {} chunks ({} committed, {} discarded, {} still queued)",
            report.resolved,
            report.committed,
            report.discarded,
            state.queued.len()
        );
        report
    }
}
