//! Per-option handlers for the post-restore catalog scan.
//!
//! Every catalog entry maps to exactly one [`OptionHandler`]. The default
//! table is derived from an exhaustive `match`, so adding a catalog entry
//! without a handler fails to compile; tables built from explicit entries
//! are checked for coverage when constructed.

use super::args::{ArgumentIndex, RestoreArgumentIndex};
use super::catalog::RestoreOption;
use super::precedence::TogglePair;
use crate::config::{CompilerSettings, MAX_COMPILATION_THREADS};
use crate::core::{RestoreError, Result};
use std::collections::HashMap;
use tracing::{Level, event};

/// Highest accepted `-XaggressivenessLevel`.
pub const MAX_AGGRESSIVENESS_LEVEL: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionHandler {
    /// Consumed while selecting JIT/AOT mode.
    ModeSelection,
    /// Read later by the remote compilation phase.
    RemoteCompilation,
    /// Startup-only; consumed and ignored.
    Discard,
    CompilationThreads,
    SamplingExpirationTime,
    AggressivenessLevel,
    LateSccDisclaimTime,
    PrintCodeCache,
    DoNotProcessEnvVars,
    JniAccelerator,
    /// Recognized but cannot change after restore.
    Unsupported,
}

impl OptionHandler {
    pub fn for_option(option: RestoreOption) -> Self {
        use RestoreOption::*;

        match option {
            Xjit | XjitColon | Xnojit | Xaot | XaotColon | Xnoaot
            | MergeCompilerOptionsEnable | MergeCompilerOptionsDisable => OptionHandler::ModeSelection,

            UseJitServerEnable | UseJitServerDisable | JitServerAddress | JitServerAotCacheName
            | JitServerPort | JitServerTimeout | JitServerSslKey | JitServerSslCert
            | JitServerSslRootCerts | JitServerUseAotCacheEnable | JitServerUseAotCacheDisable
            | RequireJitServerEnable | RequireJitServerDisable | JitServerLogConnectionsEnable
            | JitServerLogConnectionsDisable | JitServerAotmx | JitServerLocalSyncCompilesEnable
            | JitServerLocalSyncCompilesDisable => OptionHandler::RemoteCompilation,

            Xnodfpbd | Xdfpbd | Xhysteresis | Xnoquickstart | Xquickstart | XtlhPrefetch
            | XnotlhPrefetch | XlockReservation | Xnoclassgc | Xlp | XlpCodeCache | Xcodecache
            | Xcodecachetotal | XXcodecachetotal | XXdeterministic
            | RuntimeInstrumentationEnable | RuntimeInstrumentationDisable | PerfToolEnable
            | PerfToolDisable | JitServerTechPreviewMessageEnable
            | JitServerTechPreviewMessageDisable | JitServerMetricsEnable
            | JitServerMetricsDisable | JitServerMetricsPort | JitServerMetricsSslKey
            | JitServerMetricsSslCert | JitServerShareRomClassesEnable
            | JitServerShareRomClassesDisable | JitServerAotCachePersistenceEnable
            | JitServerAotCachePersistenceDisable | JitServerAotCacheDir => OptionHandler::Discard,

            CompilationThreads | XcompilationThreads => OptionHandler::CompilationThreads,
            XsamplingExpirationTime => OptionHandler::SamplingExpirationTime,
            XaggressivenessLevel => OptionHandler::AggressivenessLevel,
            LateSccDisclaimTime => OptionHandler::LateSccDisclaimTime,
            PrintCodeCacheEnable | PrintCodeCacheDisable => OptionHandler::PrintCodeCache,
            DoNotProcessJitEnvVars => OptionHandler::DoNotProcessEnvVars,
            XjniAcc => OptionHandler::JniAccelerator,
            Xlockword | XtuneElastic => OptionHandler::Unsupported,
        }
    }

    pub fn apply(
        self,
        option: RestoreOption,
        args: &mut RestoreArgumentIndex<'_>,
        settings: &mut CompilerSettings,
    ) -> Result<()> {
        match self {
            OptionHandler::ModeSelection | OptionHandler::RemoteCompilation => Ok(()),

            OptionHandler::Discard => {
                let consumed = args.consume_all(option.as_str(), option.match_mode());
                if consumed > 0 {
                    event!(Level::DEBUG, option = %option, consumed, "ignoring startup-only option");
                }
                Ok(())
            }

            OptionHandler::CompilationThreads => {
                // Both spellings feed one setting; the later token wins.
                let located = [RestoreOption::CompilationThreads, RestoreOption::XcompilationThreads]
                    .map(|candidate| (args.take_option(candidate), candidate));
                let (index, spelling) = if located[1].0 > located[0].0 {
                    located[1]
                } else {
                    located[0]
                };
                if !index.is_present() {
                    return Ok(());
                }
                let count = args.integer_value(index, spelling.as_str())?;
                let count = usize::try_from(count)
                    .ok()
                    .filter(|count| *count > 0)
                    .ok_or_else(|| invalid_value(args, index, spelling))?;
                if count > MAX_COMPILATION_THREADS {
                    event!(
                        Level::WARN,
                        requested = count,
                        max = MAX_COMPILATION_THREADS,
                        "compilation thread target capped"
                    );
                }
                let count = count.min(MAX_COMPILATION_THREADS);
                settings.compilation_threads = count;
                event!(Level::DEBUG, threads = count, "compilation thread target set");
                Ok(())
            }

            OptionHandler::SamplingExpirationTime => {
                let index = args.take_option(option);
                if index.is_present() {
                    settings.sampling_expiration_time_s = Some(args.integer_value(index, option.as_str())?);
                }
                Ok(())
            }

            OptionHandler::AggressivenessLevel => {
                let index = args.take_option(option);
                if index.is_present() {
                    let level = args.integer_value(index, option.as_str())?;
                    if level > MAX_AGGRESSIVENESS_LEVEL {
                        return Err(invalid_value(args, index, option));
                    }
                    settings.aggressiveness_level = Some(level as u32);
                }
                Ok(())
            }

            OptionHandler::LateSccDisclaimTime => {
                let index = args.take_option(option);
                if index.is_present() {
                    settings.late_scc_disclaim_time_ms = Some(args.integer_value(index, option.as_str())?);
                }
                Ok(())
            }

            OptionHandler::PrintCodeCache => {
                let pair = TogglePair::take(
                    args,
                    RestoreOption::PrintCodeCacheEnable,
                    RestoreOption::PrintCodeCacheDisable,
                );
                if let Some(enabled) = pair.decision() {
                    settings.print_code_cache = enabled;
                }
                Ok(())
            }

            OptionHandler::DoNotProcessEnvVars => {
                if args.take_option(option).is_present() {
                    settings.do_not_process_env_vars = true;
                }
                Ok(())
            }

            OptionHandler::JniAccelerator => {
                let index = args.take_option(option);
                if !index.is_present() {
                    return Ok(());
                }
                let raw = args.suffix_after(index, option.as_str()).unwrap_or_default();
                let filter = raw
                    .strip_prefix('{')
                    .and_then(|inner| inner.strip_suffix('}'))
                    .unwrap_or(raw);
                if filter.is_empty() {
                    return Err(invalid_value(args, index, option));
                }
                settings.jni_accelerator = Some(filter.to_string());
                Ok(())
            }

            OptionHandler::Unsupported => {
                let index = args.take_option(option);
                match args.token(index) {
                    Some(token) => Err(RestoreError::Unsupported(token.to_string())),
                    None => Ok(()),
                }
            }
        }
    }
}

fn invalid_value(
    args: &RestoreArgumentIndex<'_>,
    index: ArgumentIndex,
    option: RestoreOption,
) -> RestoreError {
    RestoreError::InvalidOptionValue {
        option: option.as_str().to_string(),
        value: args
            .suffix_after(index, option.as_str())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Mapping from catalog entry to handler.
#[derive(Debug, Clone)]
pub struct HandlerTable {
    handlers: HashMap<RestoreOption, OptionHandler>,
}

impl HandlerTable {
    pub fn with_default_handlers() -> Self {
        Self {
            handlers: RestoreOption::ALL
                .iter()
                .map(|&option| (option, OptionHandler::for_option(option)))
                .collect(),
        }
    }

    /// Builds a table from explicit entries, rejecting any that leave a
    /// catalog entry uncovered or cover one twice.
    pub fn from_entries(entries: &[(RestoreOption, OptionHandler)]) -> Result<Self> {
        let mut handlers = HashMap::with_capacity(entries.len());
        let mut duplicated = Vec::new();
        for &(option, handler) in entries {
            if handlers.insert(option, handler).is_some() {
                duplicated.push(option.as_str().to_string());
            }
        }

        let table = Self { handlers };
        let missing = table.missing();
        if !missing.is_empty() || !duplicated.is_empty() {
            return Err(RestoreError::HandlerDrift { missing, duplicated });
        }
        Ok(table)
    }

    #[cfg(test)]
    pub(crate) fn unchecked(entries: &[(RestoreOption, OptionHandler)]) -> Self {
        Self {
            handlers: entries.iter().copied().collect(),
        }
    }

    fn missing(&self) -> Vec<String> {
        RestoreOption::ALL
            .iter()
            .filter(|option| !self.handlers.contains_key(option))
            .map(|option| option.as_str().to_string())
            .collect()
    }

    pub fn verify(&self) -> Result<()> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(RestoreError::HandlerDrift {
                missing,
                duplicated: Vec::new(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn handler_for(&self, option: RestoreOption) -> Result<OptionHandler> {
        self.handlers
            .get(&option)
            .copied()
            .ok_or_else(|| RestoreError::MissingHandler(option.as_str().to_string()))
    }

    /// Runs every catalog entry's handler in catalog order.
    ///
    /// Recoverable handler errors are returned as diagnostics; a missing
    /// handler aborts the scan.
    pub fn dispatch_all(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        settings: &mut CompilerSettings,
    ) -> Result<Vec<RestoreError>> {
        let mut diagnostics = Vec::new();
        for &option in RestoreOption::ALL {
            let handler = self.handler_for(option)?;
            if let Err(err) = handler.apply(option, args, settings) {
                if err.is_fatal() {
                    return Err(err);
                }
                event!(Level::WARN, option = %option, error = %err, "restore option rejected");
                diagnostics.push(err);
            }
        }
        Ok(diagnostics)
    }
}

impl Default for HandlerTable {
    fn default() -> Self {
        Self::with_default_handlers()
    }
}
