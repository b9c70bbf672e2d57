//! Runtime collaborators the restore engine drives, with in-memory
//! implementations.

pub mod filter;
pub mod methods;
pub mod remote;
pub mod thread_pool;
pub mod verbose;

pub use filter::{CompileFilter, FilterSource, FixedFilterSource, MethodFilter, OptionSetFilterSource};
pub use methods::{CompiledMethodRecord, LoadedClass, MethodRegistry, MethodSignature, MethodTable};
pub use remote::{JitServerClient, RemoteCompilationService};
pub use thread_pool::{CompilationThreadControl, CompilationThreadPool};
pub use verbose::VerboseLog;

use crate::config::{CompilerSettings, PersistentCompilerConfig, SubOptionParser};
use crate::restore::{ArenaConfig, RestoreContext};

/// A self-contained runtime: configuration, loaded methods, compilation
/// threads and the remote client, all in memory.
#[derive(Debug, Default)]
pub struct InMemoryRuntime {
    pub config: PersistentCompilerConfig,
    pub methods: MethodRegistry,
    pub thread_pool: CompilationThreadPool,
    pub option_parser: SubOptionParser,
    pub remote: JitServerClient,
    pub filters: OptionSetFilterSource,
    pub verbose: VerboseLog,
}

impl InMemoryRuntime {
    pub fn new(settings: CompilerSettings, live_threads: usize) -> Self {
        Self {
            config: PersistentCompilerConfig::new(settings),
            thread_pool: CompilationThreadPool::new(live_threads),
            ..Self::default()
        }
    }

    pub fn context(&self) -> RestoreContext<'_> {
        RestoreContext {
            config: &self.config,
            methods: &self.methods,
            thread_pool: &self.thread_pool,
            option_parser: &self.option_parser,
            remote: &self.remote,
            filters: &self.filters,
            verbose: &self.verbose,
            arena: ArenaConfig::default(),
        }
    }
}
