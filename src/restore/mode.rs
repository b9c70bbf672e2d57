//! JIT/AOT enablement, merge-vs-replace, and detailed option application.

use super::context::RestoreContext;
use crate::config::{CompilerMode, CompilerOptionSet, VerboseLevel};
use crate::core::{RestoreError, Result};
use crate::options::{
    ArgumentIndex, HandlerTable, MatchMode, RestoreArgumentIndex, RestoreOption, TogglePair,
};
use tracing::{Level, event, info_span};

/// Every token that selects a compiler mode or carries its detailed
/// options.
const MODE_OPTIONS: [RestoreOption; 6] = [
    RestoreOption::Xjit,
    RestoreOption::XjitColon,
    RestoreOption::Xnojit,
    RestoreOption::Xaot,
    RestoreOption::XaotColon,
    RestoreOption::Xnoaot,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeDecision {
    pub jit_enabled: bool,
    pub aot_enabled: bool,
    pub merge: bool,
}

impl ModeDecision {
    pub fn any_enabled(&self) -> bool {
        self.jit_enabled || self.aot_enabled
    }

    pub fn is_enabled(&self, mode: CompilerMode) -> bool {
        match mode {
            CompilerMode::Jit => self.jit_enabled,
            CompilerMode::Aot => self.aot_enabled,
        }
    }
}

pub struct CompilerModeConfigurator<'c, 'r> {
    ctx: &'c RestoreContext<'r>,
}

impl<'c, 'r> CompilerModeConfigurator<'c, 'r> {
    pub fn new(ctx: &'c RestoreContext<'r>) -> Self {
        Self { ctx }
    }

    /// Resolves JIT/AOT enablement and applies detailed options.
    ///
    /// A malformed detailed option string is pushed onto `diagnostics` and
    /// skipped; it does not fail the phase.
    pub fn configure(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        diagnostics: &mut Vec<RestoreError>,
    ) -> Result<ModeDecision> {
        let span = info_span!("restore.mode.configure");
        let _enter = span.enter();

        let jit_enabled =
            TogglePair::find(args, RestoreOption::Xjit, RestoreOption::Xnojit).resolve_or(true);
        let aot_enabled =
            TogglePair::find(args, RestoreOption::Xaot, RestoreOption::Xnoaot).resolve_or(true);

        let previous_merge = self.ctx.config.update(|settings| {
            settings.jit_enabled = jit_enabled;
            settings.aot_enabled = aot_enabled;
            settings.merge_compiler_options
        })?;
        event!(Level::INFO, jit_enabled, aot_enabled, "compiler modes resolved");

        if !jit_enabled && !aot_enabled {
            consume_mode_options(args);
            return Ok(ModeDecision {
                jit_enabled,
                aot_enabled,
                merge: previous_merge,
            });
        }

        let merge = TogglePair::take(
            args,
            RestoreOption::MergeCompilerOptionsEnable,
            RestoreOption::MergeCompilerOptionsDisable,
        )
        .resolve_or(false);
        self.ctx
            .config
            .update(|settings| settings.merge_compiler_options = merge)?;

        let decision = ModeDecision {
            jit_enabled,
            aot_enabled,
            merge,
        };

        // AOT first so JIT options land last in shared state.
        for mode in [CompilerMode::Aot, CompilerMode::Jit] {
            if decision.is_enabled(mode) {
                self.apply_detailed_options(mode, merge, args, diagnostics)?;
            }
        }
        consume_mode_options(args);

        let verbose = self.ctx.config.read(|settings| settings.verbose())?;
        self.ctx.verbose.write(
            verbose,
            VerboseLevel::CheckpointRestoreDetails,
            format!(
                "Post-restore JIT enabled={} AOT enabled={} mergeCompilerOptions={}",
                jit_enabled, aot_enabled, merge
            ),
        )?;

        Ok(decision)
    }

    fn apply_detailed_options(
        &self,
        mode: CompilerMode,
        merge: bool,
        args: &RestoreArgumentIndex<'_>,
        diagnostics: &mut Vec<RestoreError>,
    ) -> Result<()> {
        let option = match mode {
            CompilerMode::Jit => RestoreOption::XjitColon,
            CompilerMode::Aot => RestoreOption::XaotColon,
        };

        let indices: Vec<ArgumentIndex> = if merge {
            args.find_all(option.as_str(), MatchMode::Prefix)
        } else {
            let last = args.find_option(option);
            last.is_present().then_some(last).into_iter().collect()
        };

        let mut parsed: Vec<CompilerOptionSet> = Vec::with_capacity(indices.len());
        for index in indices {
            let text = args.suffix_after(index, option.as_str()).unwrap_or_default();
            let outcome = self.ctx.option_parser.parse(text);
            if outcome.is_complete() {
                parsed.push(outcome.options);
            } else {
                let err = RestoreError::MalformedOptionString {
                    option: args.token(index).unwrap_or(option.as_str()).to_string(),
                    remainder: outcome.remainder.to_string(),
                };
                event!(Level::WARN, mode = mode.name(), error = %err, "detailed options abandoned");
                diagnostics.push(err);
            }
        }

        if parsed.is_empty() {
            return Ok(());
        }

        self.ctx.config.update(|settings| {
            let options = settings.option_set_mut(mode);
            if !merge {
                options.clear();
            }
            for set in &parsed {
                options.merge_from(set);
            }
        })?;
        event!(
            Level::DEBUG,
            mode = mode.name(),
            merge,
            applied = parsed.len(),
            "detailed options applied"
        );
        Ok(())
    }

    /// Runs every remaining catalog option through its handler.
    pub fn dispatch_remaining(
        &self,
        handlers: &HandlerTable,
        args: &mut RestoreArgumentIndex<'_>,
        diagnostics: &mut Vec<RestoreError>,
    ) -> Result<()> {
        let span = info_span!("restore.options.dispatch");
        let _enter = span.enter();

        let rejected = self
            .ctx
            .config
            .update(|settings| handlers.dispatch_all(args, settings))??;
        diagnostics.extend(rejected);
        Ok(())
    }
}

fn consume_mode_options(args: &mut RestoreArgumentIndex<'_>) {
    for option in MODE_OPTIONS {
        args.consume_all(option.as_str(), option.match_mode());
    }
}
