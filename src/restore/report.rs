use crate::core::RestoreError;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestorePhase {
    CompilerMode,
    OptionDispatch,
    RemoteCompilation,
    ThreadPool,
    InvalidationSweep,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub enum RemoteOutcome {
    /// JIT disabled, or the phase did not run.
    #[default]
    Skipped,
    Enabled { address: Option<String> },
    Disabled,
    /// Remote compilation was off before the checkpoint and nothing asked
    /// for it.
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ThreadPoolResize {
    pub from: usize,
    pub to: usize,
}

/// What one restore event did.
///
/// Returned for inspection only; the resume path may drop it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub jit_enabled: bool,
    pub aot_enabled: bool,
    pub merge_compiler_options: bool,
    pub remote: RemoteOutcome,
    pub thread_pool: Option<ThreadPoolResize>,
    /// Signatures whose compiled bodies were invalidated.
    pub invalidated: Vec<String>,
    pub diagnostics: Vec<RestoreError>,
    pub fatal: Option<RestoreError>,
    pub phases_run: Vec<RestorePhase>,
    /// Tokens no phase consumed.
    pub unprocessed: Vec<String>,
    pub completed: bool,
}

impl RestoreReport {
    pub fn ran(&self, phase: RestorePhase) -> bool {
        self.phases_run.contains(&phase)
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}
