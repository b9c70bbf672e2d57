use crate::config::RemoteCompilationSettings;
use crate::core::{RestoreError, Result};
use crate::options::{ArgumentIndex, RestoreArgumentIndex, RestoreOption, TogglePair};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::{Level, event};

/// Remote compilation subsystem, as seen by the restore engine.
pub trait RemoteCompilationService: Send + Sync {
    /// Reads the pass-through remote options from the restore stream.
    fn parse_common_options(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        remote: &mut RemoteCompilationSettings,
    ) -> Result<()>;

    fn parse_local_sync_compiles(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        remote: &mut RemoteCompilationSettings,
        full_speed_debug: bool,
    ) -> Result<()>;

    /// Releases the client side of the remote channel. Safe to call when
    /// nothing is connected.
    fn teardown(&self) -> Result<()>;
}

/// Parses a size with an optional `K`, `M` or `G` suffix into bytes.
pub fn parse_memory_size(text: &str) -> Option<u64> {
    let (digits, multiplier) = match text.chars().last()? {
        'k' | 'K' => (&text[..text.len() - 1], 1u64 << 10),
        'm' | 'M' => (&text[..text.len() - 1], 1u64 << 20),
        'g' | 'G' => (&text[..text.len() - 1], 1u64 << 30),
        _ => (text, 1),
    };
    digits.parse::<u64>().ok()?.checked_mul(multiplier)
}

/// JITServer client configuration surface.
#[derive(Debug, Default)]
pub struct JitServerClient {
    connected: AtomicBool,
    teardowns: AtomicUsize,
}

impl JitServerClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connected() -> Self {
        Self {
            connected: AtomicBool::new(true),
            teardowns: AtomicUsize::new(0),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Number of teardowns that actually disconnected the client.
    pub fn teardown_count(&self) -> usize {
        self.teardowns.load(Ordering::Acquire)
    }

    fn string_value(
        args: &mut RestoreArgumentIndex<'_>,
        option: RestoreOption,
    ) -> Result<Option<String>> {
        let index = args.take_option(option);
        if !index.is_present() {
            return Ok(None);
        }
        match args.suffix_after(index, option.as_str()) {
            Some(value) if !value.is_empty() => Ok(Some(value.to_string())),
            other => Err(RestoreError::InvalidOptionValue {
                option: option.as_str().to_string(),
                value: other.unwrap_or_default().to_string(),
            }),
        }
    }

    fn port(args: &mut RestoreArgumentIndex<'_>) -> Result<Option<u16>> {
        let option = RestoreOption::JitServerPort;
        let index = args.take_option(option);
        if !index.is_present() {
            return Ok(None);
        }
        let port = args.integer_value(index, option.as_str())?;
        u16::try_from(port)
            .ok()
            .filter(|port| *port != 0)
            .map(Some)
            .ok_or_else(|| RestoreError::InvalidOptionValue {
                option: option.as_str().to_string(),
                value: port.to_string(),
            })
    }

    fn aot_cache_max(args: &mut RestoreArgumentIndex<'_>) -> Result<Option<u64>> {
        let option = RestoreOption::JitServerAotmx;
        let index: ArgumentIndex = args.take_option(option);
        if !index.is_present() {
            return Ok(None);
        }
        let raw = args.suffix_after(index, option.as_str()).unwrap_or_default();
        parse_memory_size(raw)
            .map(Some)
            .ok_or_else(|| RestoreError::InvalidOptionValue {
                option: option.as_str().to_string(),
                value: raw.to_string(),
            })
    }
}

fn keep_first(first: &mut Option<RestoreError>, result: Result<()>) {
    if let Err(err) = result {
        event!(Level::WARN, error = %err, "remote compilation option rejected");
        first.get_or_insert(err);
    }
}

impl RemoteCompilationService for JitServerClient {
    /// Every option is processed even when an earlier one is rejected; the
    /// first rejection is returned.
    fn parse_common_options(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        remote: &mut RemoteCompilationSettings,
    ) -> Result<()> {
        let mut first_error = None;

        keep_first(&mut first_error, Self::port(args).map(|port| {
            if let Some(port) = port {
                remote.port = port;
            }
        }));

        let timeout = args.take_option(RestoreOption::JitServerTimeout);
        if timeout.is_present() {
            keep_first(
                &mut first_error,
                args.integer_value(timeout, RestoreOption::JitServerTimeout.as_str())
                    .map(|ms| remote.timeout_ms = ms),
            );
        }

        for (option, slot) in [
            (RestoreOption::JitServerSslKey, &mut remote.ssl_key),
            (RestoreOption::JitServerSslCert, &mut remote.ssl_cert),
            (RestoreOption::JitServerSslRootCerts, &mut remote.ssl_root_certs),
        ] {
            keep_first(&mut first_error, Self::string_value(args, option).map(|value| {
                if value.is_some() {
                    *slot = value;
                }
            }));
        }

        for (enable, disable, flag) in [
            (
                RestoreOption::JitServerUseAotCacheEnable,
                RestoreOption::JitServerUseAotCacheDisable,
                &mut remote.use_aot_cache,
            ),
            (
                RestoreOption::RequireJitServerEnable,
                RestoreOption::RequireJitServerDisable,
                &mut remote.require_server,
            ),
            (
                RestoreOption::JitServerLogConnectionsEnable,
                RestoreOption::JitServerLogConnectionsDisable,
                &mut remote.log_connections,
            ),
        ] {
            if let Some(enabled) = TogglePair::take(args, enable, disable).decision() {
                *flag = enabled;
            }
        }

        keep_first(&mut first_error, Self::aot_cache_max(args).map(|size| {
            if size.is_some() {
                remote.aot_cache_max_bytes = size;
            }
        }));

        first_error.map_or(Ok(()), Err)
    }

    fn parse_local_sync_compiles(
        &self,
        args: &mut RestoreArgumentIndex<'_>,
        remote: &mut RemoteCompilationSettings,
        full_speed_debug: bool,
    ) -> Result<()> {
        let pair = TogglePair::take(
            args,
            RestoreOption::JitServerLocalSyncCompilesEnable,
            RestoreOption::JitServerLocalSyncCompilesDisable,
        );
        let requested = pair.resolve_or(remote.local_sync_compiles);
        remote.local_sync_compiles = requested && !full_speed_debug;
        Ok(())
    }

    fn teardown(&self) -> Result<()> {
        if self.connected.swap(false, Ordering::AcqRel) {
            self.teardowns.fetch_add(1, Ordering::AcqRel);
            event!(Level::INFO, "JITServer client disconnected");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::RestoreArgumentStream;

    fn parse(tokens: &[&str]) -> (Result<()>, RemoteCompilationSettings) {
        let mut stream = RestoreArgumentStream::from_tokens(tokens.iter().copied());
        let mut args = RestoreArgumentIndex::new(&mut stream);
        let mut remote = RemoteCompilationSettings::default();
        let result = JitServerClient::new().parse_common_options(&mut args, &mut remote);
        (result, remote)
    }

    #[test]
    fn test_memory_size_suffixes() {
        assert_eq!(parse_memory_size("512"), Some(512));
        assert_eq!(parse_memory_size("4K"), Some(4096));
        assert_eq!(parse_memory_size("300m"), Some(300 << 20));
        assert_eq!(parse_memory_size("2G"), Some(2 << 30));
        assert_eq!(parse_memory_size("G"), None);
        assert_eq!(parse_memory_size(""), None);
    }

    #[test]
    fn test_common_options() {
        let (result, remote) = parse(&[
            "-XX:JITServerPort=38500",
            "-XX:JITServerTimeout=5000",
            "-XX:JITServerSSLRootCerts=/certs/ca.pem",
            "-XX:+JITServerUseAOTCache",
            "-XX:+RequireJITServer",
            "-XX:-RequireJITServer",
            "-XX:JITServerAOTmx=64M",
        ]);
        assert!(result.is_ok());
        assert_eq!(remote.port, 38500);
        assert_eq!(remote.timeout_ms, 5000);
        assert_eq!(remote.ssl_root_certs.as_deref(), Some("/certs/ca.pem"));
        assert!(remote.use_aot_cache);
        assert!(!remote.require_server);
        assert!(!remote.log_connections);
        assert_eq!(remote.aot_cache_max_bytes, Some(64 << 20));
    }

    #[test]
    fn test_bad_value_does_not_stop_other_options() {
        let (result, remote) = parse(&["-XX:JITServerPort=99999", "-XX:JITServerTimeout=10"]);
        assert!(matches!(result, Err(RestoreError::InvalidOptionValue { .. })));
        assert_eq!(remote.port, crate::config::settings::DEFAULT_JITSERVER_PORT);
        assert_eq!(remote.timeout_ms, 10);
    }

    #[test]
    fn test_local_sync_compiles_forced_off_under_full_speed_debug() {
        let client = JitServerClient::new();
        let mut stream = RestoreArgumentStream::from_tokens(["-XX:+JITServerLocalSyncCompiles"]);
        let mut args = RestoreArgumentIndex::new(&mut stream);
        let mut remote = RemoteCompilationSettings::default();

        client.parse_local_sync_compiles(&mut args, &mut remote, true).unwrap();
        assert!(!remote.local_sync_compiles);

        let mut remote = RemoteCompilationSettings::default();
        client.parse_local_sync_compiles(&mut args, &mut remote, false).unwrap();
        assert!(remote.local_sync_compiles);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let client = JitServerClient::connected();
        client.teardown().unwrap();
        client.teardown().unwrap();
        assert!(!client.is_connected());
        assert_eq!(client.teardown_count(), 1);
    }
}
