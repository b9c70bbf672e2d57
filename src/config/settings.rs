use super::option_set::CompilerOptionSet;
use crate::core::Result;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Upper bound on usable compilation threads.
pub const MAX_COMPILATION_THREADS: usize = 15;

/// Default JITServer port.
pub const DEFAULT_JITSERVER_PORT: u16 = 38400;

/// Default JITServer socket timeout in milliseconds.
pub const DEFAULT_JITSERVER_TIMEOUT_MS: u64 = 30_000;

/// Which compiler a detailed option string targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompilerMode {
    Jit,
    Aot,
}

impl CompilerMode {
    pub fn name(self) -> &'static str {
        match self {
            CompilerMode::Jit => "JIT",
            CompilerMode::Aot => "AOT",
        }
    }
}

/// Verbose diagnostic level, read from `-Xjit:verbose={...}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VerboseLevel {
    Off,
    CheckpointRestore,
    CheckpointRestoreDetails,
}

impl VerboseLevel {
    pub fn from_option_set(options: &CompilerOptionSet) -> Self {
        let Some(verbose) = options.value("verbose") else {
            return VerboseLevel::Off;
        };
        let mut level = VerboseLevel::Off;
        for item in verbose.split(['|', ',']).map(str::trim) {
            match item {
                "checkpointRestoreDetails" => level = level.max(VerboseLevel::CheckpointRestoreDetails),
                "checkpointRestore" => level = level.max(VerboseLevel::CheckpointRestore),
                _ => {}
            }
        }
        level
    }

    pub fn enabled(self, required: VerboseLevel) -> bool {
        required != VerboseLevel::Off && self >= required
    }
}

/// Remote compilation (JITServer client) configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCompilationSettings {
    pub enabled: bool,
    pub address: Option<String>,
    pub aot_cache_name: Option<String>,
    pub port: u16,
    pub timeout_ms: u64,
    pub ssl_key: Option<String>,
    pub ssl_cert: Option<String>,
    pub ssl_root_certs: Option<String>,
    pub use_aot_cache: bool,
    pub require_server: bool,
    pub log_connections: bool,
    pub aot_cache_max_bytes: Option<u64>,
    pub local_sync_compiles: bool,
}

impl Default for RemoteCompilationSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            address: None,
            aot_cache_name: None,
            port: DEFAULT_JITSERVER_PORT,
            timeout_ms: DEFAULT_JITSERVER_TIMEOUT_MS,
            ssl_key: None,
            ssl_cert: None,
            ssl_root_certs: None,
            use_aot_cache: false,
            require_server: false,
            log_connections: false,
            aot_cache_max_bytes: None,
            local_sync_compiles: true,
        }
    }
}

/// Process-wide compiler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerSettings {
    pub jit_enabled: bool,
    pub aot_enabled: bool,
    /// Merge restore-time detailed options onto the existing set instead of
    /// replacing it.
    pub merge_compiler_options: bool,
    /// Target number of usable compilation threads.
    pub compilation_threads: usize,
    pub print_code_cache: bool,
    pub late_scc_disclaim_time_ms: Option<u64>,
    pub sampling_expiration_time_s: Option<u64>,
    pub aggressiveness_level: Option<u32>,
    pub jni_accelerator: Option<String>,
    pub do_not_process_env_vars: bool,
    pub jit_options: CompilerOptionSet,
    pub aot_options: CompilerOptionSet,
    pub remote: RemoteCompilationSettings,
}

impl CompilerSettings {
    pub fn option_set(&self, mode: CompilerMode) -> &CompilerOptionSet {
        match mode {
            CompilerMode::Jit => &self.jit_options,
            CompilerMode::Aot => &self.aot_options,
        }
    }

    pub fn option_set_mut(&mut self, mode: CompilerMode) -> &mut CompilerOptionSet {
        match mode {
            CompilerMode::Jit => &mut self.jit_options,
            CompilerMode::Aot => &mut self.aot_options,
        }
    }

    pub fn is_enabled(&self, mode: CompilerMode) -> bool {
        match mode {
            CompilerMode::Jit => self.jit_enabled,
            CompilerMode::Aot => self.aot_enabled,
        }
    }

    pub fn verbose(&self) -> VerboseLevel {
        VerboseLevel::from_option_set(&self.jit_options)
    }

    pub fn full_speed_debug(&self) -> bool {
        self.jit_options.is_set("fullSpeedDebug")
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            jit_enabled: true,
            aot_enabled: true,
            merge_compiler_options: false,
            compilation_threads: default_compilation_threads(),
            print_code_cache: false,
            late_scc_disclaim_time_ms: None,
            sampling_expiration_time_s: None,
            aggressiveness_level: None,
            jni_accelerator: None,
            do_not_process_env_vars: false,
            jit_options: CompilerOptionSet::new(),
            aot_options: CompilerOptionSet::new(),
            remote: RemoteCompilationSettings::default(),
        }
    }
}

/// One fewer than the available CPUs, capped at 7 and at least 1.
pub fn default_compilation_threads() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.saturating_sub(1).clamp(1, 7)
}

/// Compiler configuration shared between the restore engine and the live
/// compiler.
///
/// Reads and writes go through [`read`](Self::read) and
/// [`update`](Self::update); nothing hands out a long-lived reference.
#[derive(Debug, Default)]
pub struct PersistentCompilerConfig {
    inner: RwLock<CompilerSettings>,
}

impl PersistentCompilerConfig {
    pub fn new(settings: CompilerSettings) -> Self {
        Self {
            inner: RwLock::new(settings),
        }
    }

    pub fn snapshot(&self) -> Result<CompilerSettings> {
        Ok(self.inner.read()?.clone())
    }

    pub fn read<R>(&self, f: impl FnOnce(&CompilerSettings) -> R) -> Result<R> {
        let guard = self.inner.read()?;
        Ok(f(&*guard))
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut CompilerSettings) -> R) -> Result<R> {
        let mut guard = self.inner.write()?;
        Ok(f(&mut *guard))
    }
}
