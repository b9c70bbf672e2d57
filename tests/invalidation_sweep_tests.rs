use jit_restore::restore::{MethodInvalidationSweep, RestoreArena, SIGNATURE_BUFFER_SIZE};
use jit_restore::runtime::FixedFilterSource;
use jit_restore::{
    ArenaConfig, CompiledMethodRecord, CompilerSettings, InMemoryRuntime, LoadedClass,
    MethodSignature, RestoreError, RestorePhase, VerboseLevel, process_options_post_restore,
};

fn detailed_runtime() -> InMemoryRuntime {
    let mut settings = CompilerSettings::default();
    settings
        .jit_options
        .set("verbose", Some("checkpointRestoreDetails".to_string()));
    InMemoryRuntime::new(settings, 1)
}

fn invalidation_lines(runtime: &InMemoryRuntime) -> Vec<String> {
    runtime
        .verbose
        .lines()
        .unwrap()
        .into_iter()
        .filter(|line| line.starts_with("Invalidating "))
        .collect()
}

#[test]
fn test_invalidation_happens_once_with_one_log_line() {
    let rt = detailed_runtime();
    rt.methods
        .register(
            LoadedClass::new("Foo")
                .with_method(CompiledMethodRecord::compiled(MethodSignature::new("Foo", "bar", "()V"), 0x40)),
        )
        .unwrap();
    let filters = FixedFilterSource::new(|sig: &str| !sig.starts_with("Foo."));

    let first = process_options_post_restore(rt.context().with_filters(&filters), Vec::<String>::new());
    let second = process_options_post_restore(rt.context().with_filters(&filters), Vec::<String>::new());

    assert_eq!(first.invalidated, vec!["Foo.bar()V".to_string()]);
    assert!(second.invalidated.is_empty());
    assert!(second.ran(RestorePhase::InvalidationSweep));

    let lines = invalidation_lines(&rt);
    assert_eq!(lines, vec!["Invalidating Foo.bar()V (0x40)".to_string()]);
}

#[test]
fn test_interpreted_methods_are_not_touched() {
    let rt = detailed_runtime();
    rt.methods
        .register(
            LoadedClass::new("Foo")
                .with_method(CompiledMethodRecord::interpreted(MethodSignature::new("Foo", "cold", "()V"))),
        )
        .unwrap();
    let filters = FixedFilterSource::new(|_: &str| false);

    let report = process_options_post_restore(rt.context().with_filters(&filters), ["-Xjit"]);

    assert!(report.invalidated.is_empty());
    assert!(invalidation_lines(&rt).is_empty());
}

#[test]
fn test_no_filter_means_no_sweep_work() {
    let rt = InMemoryRuntime::default();
    rt.methods
        .register(
            LoadedClass::new("Foo")
                .with_method(CompiledMethodRecord::compiled(MethodSignature::new("Foo", "bar", "()V"), 1)),
        )
        .unwrap();

    let report = process_options_post_restore(rt.context(), ["-Xjit:count=0"]);

    assert!(report.invalidated.is_empty());
    assert_eq!(rt.methods.compiled_count().unwrap(), 1);
}

#[test]
fn test_long_signature_uses_arena() {
    let rt = InMemoryRuntime::default();
    let class_name = format!("pkg/{}", "x".repeat(SIGNATURE_BUFFER_SIZE * 2));
    let signature = MethodSignature::new(class_name.as_str(), "m", "()V");
    let expected = signature.to_string();
    rt.methods
        .register(LoadedClass::new(class_name.as_str()).with_method(CompiledMethodRecord::compiled(signature, 1)))
        .unwrap();

    let filters = FixedFilterSource::new(|sig: &str| !sig.starts_with("pkg/"));
    let ctx = rt.context().with_filters(&filters);
    let arena = RestoreArena::acquire(ArenaConfig::default()).unwrap();
    let outcome = MethodInvalidationSweep::new(&ctx, &arena)
        .run(VerboseLevel::Off)
        .unwrap();

    assert!(outcome.filtered);
    assert_eq!(outcome.examined, 1);
    assert_eq!(arena.requested_bytes(), expected.len());
    assert_eq!(outcome.invalidated, vec![expected]);
}

#[test]
fn test_scratch_exhaustion_is_recoverable() {
    let rt = InMemoryRuntime::default();
    let class_name = "y".repeat(64 * 1024);
    rt.methods
        .register(
            LoadedClass::new(class_name.as_str())
                .with_method(CompiledMethodRecord::compiled(MethodSignature::new(class_name.as_str(), "m", "()V"), 1)),
        )
        .unwrap();
    let filters = FixedFilterSource::new(|_: &str| false);
    let ctx = rt
        .context()
        .with_filters(&filters)
        .with_arena(ArenaConfig {
            primary_segment_size: 64,
            secondary_segment_size: 64,
            scratch_space_limit: 64,
        });

    let report = process_options_post_restore(ctx, ["-XX:CompilationThreads=2"]);

    assert!(report.completed);
    assert!(report.ran(RestorePhase::ThreadPool));
    assert!(!report.ran(RestorePhase::InvalidationSweep));
    assert!(matches!(report.diagnostics[..], [RestoreError::Allocation { .. }]));
    assert_eq!(rt.methods.compiled_count().unwrap(), 1);
}
