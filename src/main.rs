use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use jit_restore::config::{OptionSetParser, SubOptionParser};
use jit_restore::{
    CompiledMethodRecord, CompilerSettings, InMemoryRuntime, LoadedClass, MethodSignature,
    process_options_post_restore,
};
use std::collections::BTreeMap;

#[derive(Parser)]
#[command(name = "jit-restore")]
#[command(about = "Replays restore-time compiler options against an in-memory runtime")]
struct Cli {
    /// Live compilation threads before the restore.
    #[arg(long, default_value_t = 1)]
    threads: usize,
    /// Compiled method loaded before the restore, as `class.method(descriptor)`.
    #[arg(long)]
    method: Vec<String>,
    /// Detailed `-Xjit:` options in effect before the checkpoint.
    #[arg(long)]
    startup_jit: Option<String>,
    /// Restore-time option tokens, e.g. `-- -Xjit:count=0 -XX:CompilationThreads=2`.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    options: Vec<String>,
}

fn parse_signature(text: &str) -> Result<MethodSignature> {
    let paren = text
        .find('(')
        .ok_or_else(|| anyhow!("method '{}' has no descriptor", text))?;
    let (qualified, descriptor) = text.split_at(paren);
    let (class_name, method_name) = qualified
        .rsplit_once('.')
        .ok_or_else(|| anyhow!("method '{}' has no class", text))?;
    if class_name.is_empty() || method_name.is_empty() {
        bail!("method '{}' is incomplete", text);
    }
    Ok(MethodSignature::new(class_name, method_name, descriptor))
}

fn build_runtime(cli: &Cli) -> Result<InMemoryRuntime> {
    let mut settings = CompilerSettings::default();
    if let Some(startup) = &cli.startup_jit {
        let outcome = SubOptionParser.parse(startup);
        if !outcome.is_complete() {
            bail!("malformed startup options near '{}'", outcome.remainder);
        }
        settings.jit_options = outcome.options;
    }

    let runtime = InMemoryRuntime::new(settings, cli.threads);

    let mut classes: BTreeMap<String, LoadedClass> = BTreeMap::new();
    for (i, text) in cli.method.iter().enumerate() {
        let signature = parse_signature(text)?;
        let body = 0x1000 + i * 0x40;
        classes
            .entry(signature.class_name.clone())
            .or_insert_with(|| LoadedClass::new(signature.class_name.clone()))
            .methods
            .push(CompiledMethodRecord::compiled(signature, body).into());
    }
    for class in classes.into_values() {
        runtime
            .methods
            .register(class)
            .context("failed to register loaded class")?;
    }

    Ok(runtime)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = build_runtime(&cli)?;

    let report = process_options_post_restore(runtime.context(), cli.options.iter().cloned());
    let settings = runtime
        .config
        .snapshot()
        .context("failed to read compiler settings")?;

    for line in runtime.verbose.lines().context("failed to read verbose log")? {
        eprintln!("{}", line);
    }

    let output = serde_json::json!({
        "settings": settings,
        "report": report,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signature() {
        let sig = parse_signature("java/lang/String.hashCode()I").unwrap();
        assert_eq!(sig.class_name, "java/lang/String");
        assert_eq!(sig.method_name, "hashCode");
        assert_eq!(sig.descriptor, "()I");

        assert!(parse_signature("NoDescriptor.m").is_err());
        assert!(parse_signature("nodot()V").is_err());
        assert!(parse_signature(".m()V").is_err());
    }
}
