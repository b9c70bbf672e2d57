//! Invalidation of compiled methods the current filter no longer admits.

use super::arena::RestoreArena;
use super::context::RestoreContext;
use crate::config::VerboseLevel;
use crate::core::Result;
use crate::runtime::LoadedClass;
use tracing::{Level, event, info_span};

/// Signatures up to this many bytes are rendered on the stack.
pub const SIGNATURE_BUFFER_SIZE: usize = 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// `false` when no filter was configured and nothing was walked.
    pub filtered: bool,
    pub examined: usize,
    pub invalidated: Vec<String>,
}

pub struct MethodInvalidationSweep<'c, 'r> {
    ctx: &'c RestoreContext<'r>,
    arena: &'c RestoreArena,
}

impl<'c, 'r> MethodInvalidationSweep<'c, 'r> {
    pub fn new(ctx: &'c RestoreContext<'r>, arena: &'c RestoreArena) -> Self {
        Self { ctx, arena }
    }

    pub fn run(&self, verbose: VerboseLevel) -> Result<SweepOutcome> {
        let span = info_span!("restore.sweep");
        let _enter = span.enter();

        let settings = self.ctx.config.snapshot()?;
        let Some(filter) = self.ctx.filters.current_filter(&settings)? else {
            event!(Level::DEBUG, "no compile filter configured; sweep skipped");
            return Ok(SweepOutcome::default());
        };

        let mut outcome = SweepOutcome {
            filtered: true,
            ..SweepOutcome::default()
        };
        let mut stack_buf = [0u8; SIGNATURE_BUFFER_SIZE];

        self.ctx.methods.walk_classes(&mut |class: &LoadedClass| {
            for method in &class.methods {
                if !method.is_compiled() {
                    continue;
                }
                outcome.examined += 1;

                let len = method.signature.encoded_len();
                let buf: &mut [u8] = if len <= stack_buf.len() {
                    &mut stack_buf[..]
                } else {
                    self.arena.alloc_bytes(len)?
                };
                let signature = method.signature.encode_into(buf)?;
                if filter.can_be_compiled(signature) {
                    continue;
                }

                let body = method.body();
                if self.ctx.methods.invalidate_method_body(method) {
                    self.ctx.verbose.write(
                        verbose,
                        VerboseLevel::CheckpointRestoreDetails,
                        format!("Invalidating {} ({:#x})", signature, body),
                    )?;
                    outcome.invalidated.push(signature.to_string());
                }
            }
            Ok(())
        })?;

        event!(
            Level::INFO,
            examined = outcome.examined,
            invalidated = outcome.invalidated.len(),
            "invalidation sweep finished"
        );
        Ok(outcome)
    }
}
