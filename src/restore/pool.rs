use super::context::RestoreContext;
use super::report::ThreadPoolResize;
use crate::core::Result;
use tracing::{Level, event};

/// Brings the live compilation thread count in line with the configured
/// target. Runs whether or not compilation is enabled.
pub struct ThreadPoolReconciler<'c, 'r> {
    ctx: &'c RestoreContext<'r>,
}

impl<'c, 'r> ThreadPoolReconciler<'c, 'r> {
    pub fn new(ctx: &'c RestoreContext<'r>) -> Self {
        Self { ctx }
    }

    /// `None` when no resize was needed.
    pub fn reconcile(&self) -> Result<Option<ThreadPoolResize>> {
        let target = self
            .ctx
            .config
            .read(|settings| settings.compilation_threads)?;
        let live = self.ctx.thread_pool.live_count()?;
        if target == live {
            return Ok(None);
        }

        let resized = self.ctx.thread_pool.set_usable_threads(target)?;
        event!(Level::INFO, from = live, to = resized, "compilation thread pool resized");
        Ok(Some(ThreadPoolResize {
            from: live,
            to: resized,
        }))
    }
}
