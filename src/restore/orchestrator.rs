//! Single entry point for restore-time reconfiguration.

use super::arena::RestoreArena;
use super::context::RestoreContext;
use super::mode::CompilerModeConfigurator;
use super::pool::ThreadPoolReconciler;
use super::remote::RemoteCompilationReconfigurer;
use super::report::{RestorePhase, RestoreReport};
use super::sweep::MethodInvalidationSweep;
use crate::config::VerboseLevel;
use crate::core::{RestoreError, Result};
use crate::options::{HandlerTable, RestoreArgumentIndex, RestoreArgumentStream};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::{Level, event, info_span};

pub struct RestoreOrchestrator<'r> {
    ctx: RestoreContext<'r>,
    handlers: HandlerTable,
}

impl<'r> RestoreOrchestrator<'r> {
    pub fn new(ctx: RestoreContext<'r>) -> Self {
        Self {
            ctx,
            handlers: HandlerTable::with_default_handlers(),
        }
    }

    pub fn with_handlers(ctx: RestoreContext<'r>, handlers: HandlerTable) -> Self {
        Self { ctx, handlers }
    }

    /// Applies the restore-time options in `stream` to the running compiler.
    ///
    /// Never fails and never panics outward: errors and panics raised by a
    /// phase end up in the returned report. Recoverable errors let later
    /// phases run; handler drift stops the pass.
    pub fn process_options_post_restore(&self, stream: &mut RestoreArgumentStream) -> RestoreReport {
        let span = info_span!("restore.process_options", tokens = stream.len());
        let _enter = span.enter();

        let mut report = RestoreReport::default();
        let result = panic::catch_unwind(AssertUnwindSafe(|| self.run(stream, &mut report)));

        match result {
            Ok(Ok(())) => report.completed = true,
            Ok(Err(err)) if err.is_fatal() => {
                event!(Level::ERROR, error = %err, "restore reconfiguration halted");
                report.fatal = Some(err);
            }
            Ok(Err(err)) => {
                event!(Level::ERROR, error = %err, "restore reconfiguration aborted");
                report.diagnostics.push(err);
            }
            Err(payload) => {
                let err = RestoreError::Panicked(panic_message(payload.as_ref()));
                event!(Level::ERROR, error = %err, "restore reconfiguration panicked");
                report.diagnostics.push(err);
            }
        }

        report.unprocessed = stream
            .unconsumed()
            .map(|(_, token)| token.to_string())
            .collect();
        self.log_failures(&report);
        report
    }

    fn run(&self, stream: &mut RestoreArgumentStream, report: &mut RestoreReport) -> Result<()> {
        self.handlers.verify()?;
        let mut args = RestoreArgumentIndex::new(stream);
        let mut diagnostics = Vec::new();

        let mode = CompilerModeConfigurator::new(&self.ctx);
        let decision = absorb(
            report,
            RestorePhase::CompilerMode,
            mode.configure(&mut args, &mut diagnostics),
        )?;

        if let Some(decision) = decision {
            report.jit_enabled = decision.jit_enabled;
            report.aot_enabled = decision.aot_enabled;
            report.merge_compiler_options = decision.merge;

            if decision.any_enabled() {
                absorb(
                    report,
                    RestorePhase::OptionDispatch,
                    mode.dispatch_remaining(&self.handlers, &mut args, &mut diagnostics),
                )?;
            }

            if decision.jit_enabled {
                let remote = RemoteCompilationReconfigurer::new(&self.ctx);
                if let Some(outcome) = absorb(
                    report,
                    RestorePhase::RemoteCompilation,
                    remote.reconfigure(&mut args, &mut diagnostics),
                )? {
                    report.remote = outcome;
                }
            }
        }
        report.diagnostics.append(&mut diagnostics);

        let pool = ThreadPoolReconciler::new(&self.ctx);
        if let Some(resize) = absorb(report, RestorePhase::ThreadPool, pool.reconcile())? {
            report.thread_pool = resize;
        }

        // The arena only backs the sweep; failing to get one skips just that phase.
        let verbose = self.verbose_level();
        let swept = RestoreArena::acquire(self.ctx.arena)
            .and_then(|arena| MethodInvalidationSweep::new(&self.ctx, &arena).run(verbose));
        if let Some(outcome) = absorb(report, RestorePhase::InvalidationSweep, swept)? {
            report.invalidated = outcome.invalidated;
        }

        Ok(())
    }

    fn verbose_level(&self) -> VerboseLevel {
        self.ctx
            .config
            .read(|settings| settings.verbose())
            .unwrap_or(VerboseLevel::Off)
    }

    fn log_failures(&self, report: &RestoreReport) {
        let verbose = self.verbose_level();
        let failures = report.diagnostics.iter().chain(report.fatal.iter());
        for err in failures {
            if let Err(log_err) = self.ctx.verbose.write(
                verbose,
                VerboseLevel::CheckpointRestore,
                format!("Failed to process options post restore: {}", err),
            ) {
                event!(Level::WARN, error = %log_err, "verbose log unavailable");
            }
        }
    }
}

/// Records a phase result. Recoverable errors become diagnostics and
/// yield `None`; fatal errors are returned.
fn absorb<T>(report: &mut RestoreReport, phase: RestorePhase, result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => {
            report.phases_run.push(phase);
            Ok(Some(value))
        }
        Err(err) if err.is_fatal() => Err(err),
        Err(err) => {
            event!(Level::WARN, phase = ?phase, error = %err, "restore phase failed");
            report.diagnostics.push(err);
            Ok(None)
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
