//! Catalog of external options recognized after a restore.
//!
//! Every option carries its literal spelling and the match mode used to
//! locate it in the restore stream. The catalog is closed: handlers are
//! assigned per variant in [`crate::options::handlers`].

use serde::Serialize;

/// How a catalog pattern is compared against a raw token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MatchMode {
    /// Token equals the pattern.
    Exact,
    /// Token starts with the pattern; the rest is a value.
    Prefix,
    /// Token equals the pattern, or is the pattern followed by `:` and a
    /// sub-option list.
    OptionalList,
}

impl MatchMode {
    pub fn matches(self, token: &str, pattern: &str) -> bool {
        match self {
            MatchMode::Exact => token == pattern,
            MatchMode::Prefix => token.starts_with(pattern),
            MatchMode::OptionalList => match token.strip_prefix(pattern) {
                Some(rest) => rest.is_empty() || rest.starts_with(':'),
                None => false,
            },
        }
    }
}

macro_rules! restore_options {
    ($($variant:ident => ($text:expr, $mode:ident)),* $(,)?) => {
        /// A recognized restore-time option.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub enum RestoreOption {
            $($variant),*
        }

        impl RestoreOption {
            /// Every option, in dispatch order.
            pub const ALL: &'static [RestoreOption] = &[$(RestoreOption::$variant),*];

            /// Literal spelling on the command line.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(RestoreOption::$variant => $text),*
                }
            }

            pub fn match_mode(self) -> MatchMode {
                match self {
                    $(RestoreOption::$variant => MatchMode::$mode),*
                }
            }
        }
    };
}

restore_options! {
    // Compiler mode selection
    Xjit => ("-Xjit", OptionalList),
    XjitColon => ("-Xjit:", Prefix),
    Xnojit => ("-Xnojit", OptionalList),
    Xaot => ("-Xaot", OptionalList),
    XaotColon => ("-Xaot:", Prefix),
    Xnoaot => ("-Xnoaot", OptionalList),
    MergeCompilerOptionsEnable => ("-XX:+MergeCompilerOptions", Exact),
    MergeCompilerOptionsDisable => ("-XX:-MergeCompilerOptions", Exact),

    // Remote compilation
    UseJitServerEnable => ("-XX:+UseJITServer", Exact),
    UseJitServerDisable => ("-XX:-UseJITServer", Exact),
    JitServerAddress => ("-XX:JITServerAddress=", Prefix),
    JitServerAotCacheName => ("-XX:JITServerAOTCacheName=", Prefix),
    JitServerPort => ("-XX:JITServerPort=", Prefix),
    JitServerTimeout => ("-XX:JITServerTimeout=", Prefix),
    JitServerSslKey => ("-XX:JITServerSSLKey=", Prefix),
    JitServerSslCert => ("-XX:JITServerSSLCert=", Prefix),
    JitServerSslRootCerts => ("-XX:JITServerSSLRootCerts=", Prefix),
    JitServerUseAotCacheEnable => ("-XX:+JITServerUseAOTCache", Exact),
    JitServerUseAotCacheDisable => ("-XX:-JITServerUseAOTCache", Exact),
    RequireJitServerEnable => ("-XX:+RequireJITServer", Exact),
    RequireJitServerDisable => ("-XX:-RequireJITServer", Exact),
    JitServerLogConnectionsEnable => ("-XX:+JITServerLogConnections", Exact),
    JitServerLogConnectionsDisable => ("-XX:-JITServerLogConnections", Exact),
    JitServerAotmx => ("-XX:JITServerAOTmx=", Prefix),
    JitServerLocalSyncCompilesEnable => ("-XX:+JITServerLocalSyncCompiles", Exact),
    JitServerLocalSyncCompilesDisable => ("-XX:-JITServerLocalSyncCompiles", Exact),

    // Startup-only options, ignored after restore
    Xnodfpbd => ("-Xnodfpbd", OptionalList),
    Xdfpbd => ("-Xdfpbd", OptionalList),
    Xhysteresis => ("-Xhysteresis", Prefix),
    Xnoquickstart => ("-Xnoquickstart", OptionalList),
    Xquickstart => ("-Xquickstart", OptionalList),
    XtlhPrefetch => ("-XtlhPrefetch", OptionalList),
    XnotlhPrefetch => ("-XnotlhPrefetch", OptionalList),
    XlockReservation => ("-XlockReservation", OptionalList),
    Xnoclassgc => ("-Xnoclassgc", OptionalList),
    Xlp => ("-Xlp", OptionalList),
    XlpCodeCache => ("-Xlp:codecache:", Prefix),
    Xcodecache => ("-Xcodecache", Prefix),
    Xcodecachetotal => ("-Xcodecachetotal", Prefix),
    XXcodecachetotal => ("-XX:codecachetotal=", Prefix),
    XXdeterministic => ("-XX:deterministic=", Prefix),
    RuntimeInstrumentationEnable => ("-XX:+RuntimeInstrumentation", Exact),
    RuntimeInstrumentationDisable => ("-XX:-RuntimeInstrumentation", Exact),
    PerfToolEnable => ("-XX:+PerfTool", Exact),
    PerfToolDisable => ("-XX:-PerfTool", Exact),
    JitServerTechPreviewMessageEnable => ("-XX:+JITServerTechPreviewMessage", Exact),
    JitServerTechPreviewMessageDisable => ("-XX:-JITServerTechPreviewMessage", Exact),
    JitServerMetricsEnable => ("-XX:+JITServerMetrics", Exact),
    JitServerMetricsDisable => ("-XX:-JITServerMetrics", Exact),
    JitServerMetricsPort => ("-XX:JITServerMetricsPort=", Prefix),
    JitServerMetricsSslKey => ("-XX:JITServerMetricsSSLKey=", Prefix),
    JitServerMetricsSslCert => ("-XX:JITServerMetricsSSLCert=", Prefix),
    JitServerShareRomClassesEnable => ("-XX:+JITServerShareROMClasses", Exact),
    JitServerShareRomClassesDisable => ("-XX:-JITServerShareROMClasses", Exact),
    JitServerAotCachePersistenceEnable => ("-XX:+JITServerAOTCachePersistence", Exact),
    JitServerAotCachePersistenceDisable => ("-XX:-JITServerAOTCachePersistence", Exact),
    JitServerAotCacheDir => ("-XX:JITServerAOTCacheDir=", Prefix),

    // Options with post-restore handlers
    CompilationThreads => ("-XX:CompilationThreads=", Prefix),
    XcompilationThreads => ("-XcompilationThreads", Prefix),
    XsamplingExpirationTime => ("-XsamplingExpirationTime", Prefix),
    XaggressivenessLevel => ("-XaggressivenessLevel", Prefix),
    LateSccDisclaimTime => ("-XX:LateSCCDisclaimTime=", Prefix),
    PrintCodeCacheEnable => ("-XX:+PrintCodeCache", Exact),
    PrintCodeCacheDisable => ("-XX:-PrintCodeCache", Exact),
    DoNotProcessJitEnvVars => ("-XX:doNotProcessJitEnvVars", Exact),
    XjniAcc => ("-XjniAcc:", Prefix),
    Xlockword => ("-Xlockword", OptionalList),
    XtuneElastic => ("-Xtune:elastic", Exact),
}

impl std::fmt::Display for RestoreOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
