//! Restore-time reconfiguration engine.
//!
//! [`RestoreOrchestrator`] runs the phases in order: compiler mode and
//! detailed options, per-option handlers, remote compilation (JIT only),
//! thread pool reconciliation, then the invalidation sweep.

pub mod arena;
pub mod context;
pub mod mode;
pub mod orchestrator;
pub mod pool;
pub mod remote;
pub mod report;
pub mod sweep;

pub use arena::{ArenaConfig, RestoreArena};
pub use context::RestoreContext;
pub use mode::{CompilerModeConfigurator, ModeDecision};
pub use orchestrator::RestoreOrchestrator;
pub use pool::ThreadPoolReconciler;
pub use remote::RemoteCompilationReconfigurer;
pub use report::{RemoteOutcome, RestorePhase, RestoreReport, ThreadPoolResize};
pub use sweep::{MethodInvalidationSweep, SweepOutcome, SIGNATURE_BUFFER_SIZE};
