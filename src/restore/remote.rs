//! Enable/disable of remote compilation and its endpoint settings.

use super::context::RestoreContext;
use super::report::RemoteOutcome;
use crate::core::{RestoreError, Result};
use crate::options::{RestoreArgumentIndex, RestoreOption, TogglePair};
use tracing::{Level, event, info_span};

pub struct RemoteCompilationReconfigurer<'c, 'r> {
    ctx: &'c RestoreContext<'r>,
}

impl<'c, 'r> RemoteCompilationReconfigurer<'c, 'r> {
    pub fn new(ctx: &'c RestoreContext<'r>) -> Self {
        Self { ctx }
    }

    /// Only meaningful while JIT is enabled; the caller decides.
    ///
    /// When neither `-XX:+UseJITServer` nor `-XX:-UseJITServer` appears, the
    /// client stays enabled if it was before, and a restore-time address
    /// enables it.
    pub fn reconfigure(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        diagnostics: &mut Vec<RestoreError>,
    ) -> Result<RemoteOutcome> {
        let span = info_span!("restore.remote.reconfigure");
        let _enter = span.enter();

        let pair = TogglePair::take(
            args,
            RestoreOption::UseJitServerEnable,
            RestoreOption::UseJitServerDisable,
        );
        let (previously_enabled, full_speed_debug) = self
            .ctx
            .config
            .read(|settings| (settings.remote.enabled, settings.full_speed_debug()))?;
        let address_given = args.find_option(RestoreOption::JitServerAddress).is_present();
        let enabled = pair.resolve_or(previously_enabled || address_given);

        if !enabled && !previously_enabled && !pair.is_present() {
            event!(Level::DEBUG, "remote compilation stays disabled");
            return Ok(RemoteOutcome::Unchanged);
        }
        if !enabled {
            self.ctx
                .config
                .update(|settings| settings.remote.enabled = false)?;
            self.ctx.remote.teardown()?;
            event!(Level::INFO, "remote compilation disabled");
            return Ok(RemoteOutcome::Disabled);
        }

        let mut remote = self.ctx.config.read(|settings| settings.remote.clone())?;
        remote.enabled = true;

        if let Err(err) = self.ctx.remote.parse_common_options(args, &mut remote) {
            diagnostics.push(err);
        }
        if let Err(err) = self
            .ctx
            .remote
            .parse_local_sync_compiles(args, &mut remote, full_speed_debug)
        {
            diagnostics.push(err);
        }

        let address = args.take_option(RestoreOption::JitServerAddress);
        if let Some(value) = args.option_value(address, '=') {
            remote.address = Some(value.to_string());
        }
        let cache_name = args.take_option(RestoreOption::JitServerAotCacheName);
        if let Some(value) = args.option_value(cache_name, '=') {
            remote.aot_cache_name = Some(value.to_string());
        }

        let address = remote.address.clone();
        self.ctx.config.update(|settings| settings.remote = remote)?;
        event!(
            Level::INFO,
            address = address.as_deref().unwrap_or("<default>"),
            "remote compilation enabled"
        );
        Ok(RemoteOutcome::Enabled { address })
    }
}
