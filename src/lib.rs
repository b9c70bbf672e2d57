// ============================================================================
// jit-restore Library
// ============================================================================

pub mod config;
pub mod core;
pub mod options;
pub mod restore;
pub mod runtime;

// Re-export main types for convenience
pub use config::{CompilerMode, CompilerSettings, PersistentCompilerConfig, VerboseLevel};
pub use crate::core::{RestoreError, Result};
pub use options::{ArgumentIndex, HandlerTable, RestoreArgumentStream, RestoreOption};
pub use restore::{
    ArenaConfig, RemoteOutcome, RestoreContext, RestoreOrchestrator, RestorePhase, RestoreReport,
};
pub use runtime::{
    CompilationThreadControl, CompilationThreadPool, CompiledMethodRecord, InMemoryRuntime,
    JitServerClient, LoadedClass, MethodRegistry, MethodSignature, VerboseLog,
};

/// Runs one restore event over `tokens` with the default handler table.
///
/// # Examples
///
/// ```
/// use jit_restore::{CompilationThreadControl, InMemoryRuntime, process_options_post_restore};
///
/// let runtime = InMemoryRuntime::default();
/// let report = process_options_post_restore(
///     runtime.context(),
///     ["-Xnojit", "-XX:CompilationThreads=2"],
/// );
///
/// assert!(!report.jit_enabled);
/// assert!(report.aot_enabled);
/// assert_eq!(runtime.thread_pool.live_count().unwrap(), 2);
/// ```
pub fn process_options_post_restore<I, S>(ctx: RestoreContext<'_>, tokens: I) -> RestoreReport
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut stream = RestoreArgumentStream::from_tokens(tokens);
    RestoreOrchestrator::new(ctx).process_options_post_restore(&mut stream)
}
