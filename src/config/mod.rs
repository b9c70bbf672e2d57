pub mod option_set;
pub mod settings;

pub use option_set::{CompilerOptionSet, OptionSetParser, ParseOutcome, SubOptionParser};
pub use settings::{
    CompilerMode, CompilerSettings, PersistentCompilerConfig, RemoteCompilationSettings,
    VerboseLevel, MAX_COMPILATION_THREADS,
};
