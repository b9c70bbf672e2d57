//! Scoped scratch arena for one restore event.

use crate::core::{RestoreError, Result};
use bumpalo::Bump;
use serde::{Deserialize, Serialize};
use std::alloc::Layout;
use std::cell::Cell;
use tracing::{Level, event};

/// Sizing of the per-event scratch arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArenaConfig {
    pub primary_segment_size: usize,
    pub secondary_segment_size: usize,
    /// Ceiling on scratch bytes beyond the two initial segments.
    pub scratch_space_limit: usize,
}

impl ArenaConfig {
    pub const DEFAULT_SEGMENT_SIZE: usize = 1 << 20;
    pub const DEFAULT_SCRATCH_SPACE_LIMIT: usize = 256 << 20;

    pub fn initial_capacity(&self) -> usize {
        self.primary_segment_size
            .saturating_add(self.secondary_segment_size)
    }

    pub fn total_limit(&self) -> usize {
        self.initial_capacity()
            .saturating_add(self.scratch_space_limit)
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            primary_segment_size: Self::DEFAULT_SEGMENT_SIZE,
            secondary_segment_size: Self::DEFAULT_SEGMENT_SIZE,
            scratch_space_limit: Self::DEFAULT_SCRATCH_SPACE_LIMIT,
        }
    }
}

/// Bump arena owned by the orchestrator for one restore event.
///
/// Everything allocated here is released when the arena is dropped, on
/// every exit path. Requested bytes never exceed
/// [`ArenaConfig::total_limit`], however large bumpalo rounds its chunks.
pub struct RestoreArena {
    bump: Bump,
    config: ArenaConfig,
    requested: Cell<usize>,
}

impl RestoreArena {
    pub fn acquire(config: ArenaConfig) -> Result<Self> {
        let bump = Bump::try_with_capacity(config.initial_capacity()).map_err(|_| {
            RestoreError::Allocation {
                requested: config.initial_capacity(),
            }
        })?;
        bump.set_allocation_limit(Some(config.total_limit()));
        event!(
            Level::DEBUG,
            capacity = config.initial_capacity(),
            limit = config.total_limit(),
            "restore arena acquired"
        );
        Ok(Self {
            bump,
            config,
            requested: Cell::new(0),
        })
    }

    pub fn config(&self) -> ArenaConfig {
        self.config
    }

    /// Zeroed scratch buffer of `len` bytes.
    #[allow(clippy::mut_from_ref)]
    pub fn alloc_bytes(&self, len: usize) -> Result<&mut [u8]> {
        let requested = self
            .requested
            .get()
            .checked_add(len)
            .filter(|total| *total <= self.config.total_limit())
            .ok_or(RestoreError::Allocation { requested: len })?;
        let layout = Layout::array::<u8>(len).map_err(|_| RestoreError::Allocation { requested: len })?;
        let ptr = self
            .bump
            .try_alloc_layout(layout)
            .map_err(|_| RestoreError::Allocation { requested: len })?;
        self.requested.set(requested);

        // SAFETY: `try_alloc_layout` returned a fresh, exclusively owned block
        // of `len` bytes that lives as long as `self.bump`. It is zeroed
        // before the slice is formed.
        unsafe {
            ptr.as_ptr().write_bytes(0, len);
            Ok(std::slice::from_raw_parts_mut(ptr.as_ptr(), len))
        }
    }

    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }

    /// Bytes handed out by [`alloc_bytes`](Self::alloc_bytes) so far.
    pub fn requested_bytes(&self) -> usize {
        self.requested.get()
    }
}

impl Drop for RestoreArena {
    fn drop(&mut self) {
        event!(
            Level::DEBUG,
            allocated = self.bump.allocated_bytes(),
            "restore arena released"
        );
    }
}
