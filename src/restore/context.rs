use super::arena::ArenaConfig;
use crate::config::{OptionSetParser, PersistentCompilerConfig};
use crate::runtime::{
    CompilationThreadControl, FilterSource, MethodTable, RemoteCompilationService, VerboseLog,
};

/// Collaborators a restore event works against.
///
/// Everything except the arena sizing is borrowed from the runtime; the
/// context itself is cheap to copy.
#[derive(Clone, Copy)]
pub struct RestoreContext<'r> {
    pub config: &'r PersistentCompilerConfig,
    pub methods: &'r dyn MethodTable,
    pub thread_pool: &'r dyn CompilationThreadControl,
    pub option_parser: &'r dyn OptionSetParser,
    pub remote: &'r dyn RemoteCompilationService,
    pub filters: &'r dyn FilterSource,
    pub verbose: &'r VerboseLog,
    pub arena: ArenaConfig,
}

impl<'r> RestoreContext<'r> {
    pub fn with_arena(mut self, arena: ArenaConfig) -> Self {
        self.arena = arena;
        self
    }

    pub fn with_option_parser(mut self, option_parser: &'r dyn OptionSetParser) -> Self {
        self.option_parser = option_parser;
        self
    }

    pub fn with_filters(mut self, filters: &'r dyn FilterSource) -> Self {
        self.filters = filters;
        self
    }
}
