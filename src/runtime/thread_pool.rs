use crate::config::MAX_COMPILATION_THREADS;
use crate::core::{RestoreError, Result};
use log::{debug, warn};
use serde::Serialize;
use std::sync::Mutex;

/// Resize contract of the live compilation thread pool.
pub trait CompilationThreadControl: Send + Sync {
    /// Number of threads currently able to take compilation requests.
    fn live_count(&self) -> Result<usize>;

    /// Activates or suspends threads until `target` are usable. Returns the
    /// resulting live count.
    fn set_usable_threads(&self, target: usize) -> Result<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompilationThreadState {
    Active,
    Suspended,
}

#[derive(Debug)]
struct PoolState {
    /// Slot per created thread; slots are never destroyed, only suspended.
    threads: Vec<CompilationThreadState>,
    max_threads: usize,
}

impl PoolState {
    fn active(&self) -> usize {
        self.threads
            .iter()
            .filter(|state| **state == CompilationThreadState::Active)
            .count()
    }
}

/// Compilation thread pool kept in memory.
#[derive(Debug)]
pub struct CompilationThreadPool {
    state: Mutex<PoolState>,
}

impl CompilationThreadPool {
    pub fn new(active: usize) -> Self {
        Self::with_max(active, MAX_COMPILATION_THREADS)
    }

    pub fn with_max(active: usize, max_threads: usize) -> Self {
        let active = active.min(max_threads);
        Self {
            state: Mutex::new(PoolState {
                threads: vec![CompilationThreadState::Active; active],
                max_threads,
            }),
        }
    }

    /// Total created threads, active or suspended.
    pub fn created_count(&self) -> Result<usize> {
        Ok(self.state.lock()?.threads.len())
    }

    pub fn states(&self) -> Result<Vec<CompilationThreadState>> {
        Ok(self.state.lock()?.threads.clone())
    }
}

impl Default for CompilationThreadPool {
    fn default() -> Self {
        Self::new(1)
    }
}

impl CompilationThreadControl for CompilationThreadPool {
    fn live_count(&self) -> Result<usize> {
        Ok(self.state.lock()?.active())
    }

    fn set_usable_threads(&self, target: usize) -> Result<usize> {
        if target == 0 {
            return Err(RestoreError::InvalidOptionValue {
                option: "compilation threads".into(),
                value: target.to_string(),
            });
        }

        let mut state = self.state.lock()?;
        let target = if target > state.max_threads {
            warn!(
                "Requested {} compilation threads, limiting to {}",
                target, state.max_threads
            );
            state.max_threads
        } else {
            target
        };

        let before = state.active();

        // Grow: wake suspended threads first, then create new ones.
        let mut active = before;
        for slot in state.threads.iter_mut() {
            if active >= target {
                break;
            }
            if *slot == CompilationThreadState::Suspended {
                *slot = CompilationThreadState::Active;
                active += 1;
            }
        }
        while active < target {
            state.threads.push(CompilationThreadState::Active);
            active += 1;
        }

        // Shrink: suspend from the highest slot down.
        for slot in state.threads.iter_mut().rev() {
            if active <= target {
                break;
            }
            if *slot == CompilationThreadState::Active {
                *slot = CompilationThreadState::Suspended;
                active -= 1;
            }
        }

        if before != active {
            debug!("Compilation threads resized from {} to {}", before, active);
        }
        Ok(active)
    }
}
