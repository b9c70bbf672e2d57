//! Compile filters: which method signatures may hold compiled code.

use crate::config::{CompilerOptionSet, CompilerSettings};
use crate::core::{RestoreError, Result};
use lru::LruCache;
use regex::Regex;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

lazy_static::lazy_static! {
    static ref GLOB_REGEX_CACHE: Mutex<LruCache<String, Arc<Regex>>> =
        Mutex::new(LruCache::new(NonZeroUsize::new(128).unwrap_or(NonZeroUsize::MIN)));
}

/// Predicate over a rendered method signature.
pub trait CompileFilter: Send + Sync {
    fn can_be_compiled(&self, signature: &str) -> bool;
}

impl<F> CompileFilter for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn can_be_compiled(&self, signature: &str) -> bool {
        self(signature)
    }
}

/// Supplies the filter that is current at sweep time.
pub trait FilterSource: Send + Sync {
    /// `None` when no filter facility is configured.
    fn current_filter(&self, settings: &CompilerSettings) -> Result<Option<Arc<dyn CompileFilter>>>;
}

/// Converts a `*`/`?` glob into an anchored regex.
///
/// A glob with no `.` names a class and matches any of its methods.
fn glob_to_regex(glob: &str) -> String {
    let mut regex = String::with_capacity(glob.len() + 8);
    regex.push('^');
    for c in glob.chars() {
        match c {
            '*' => regex.push_str(".*"),
            '?' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut [0u8; 4]))),
        }
    }
    if !glob.contains('.') {
        regex.push_str(r"\..*");
    }
    regex.push('$');
    regex
}

fn compiled_glob(glob: &str) -> Result<Arc<Regex>> {
    {
        let mut cache = GLOB_REGEX_CACHE.lock()?;
        if let Some(regex) = cache.get(glob) {
            return Ok(Arc::clone(regex));
        }
    }

    let compiled = Regex::new(&glob_to_regex(glob)).map_err(|e| RestoreError::InvalidOptionValue {
        option: "filter".into(),
        value: format!("{} ({})", glob, e),
    })?;
    let compiled = Arc::new(compiled);

    GLOB_REGEX_CACHE
        .lock()?
        .put(glob.to_string(), Arc::clone(&compiled));
    Ok(compiled)
}

fn compile_globs<'a>(globs: impl IntoIterator<Item = &'a str>) -> Result<Vec<Arc<Regex>>> {
    globs
        .into_iter()
        .map(str::trim)
        .filter(|glob| !glob.is_empty())
        .map(compiled_glob)
        .collect()
}

/// Limit/exclude glob filter built from the detailed JIT options.
#[derive(Debug, Clone, Default)]
pub struct MethodFilter {
    limit: Vec<Arc<Regex>>,
    exclude: Vec<Arc<Regex>>,
}

impl MethodFilter {
    pub fn new<'a>(
        limit: impl IntoIterator<Item = &'a str>,
        exclude: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self> {
        Ok(Self {
            limit: compile_globs(limit)?,
            exclude: compile_globs(exclude)?,
        })
    }

    /// Reads `limit={...}` and `exclude={...}`. Returns `None` when neither
    /// is set.
    pub fn from_option_set(options: &CompilerOptionSet) -> Result<Option<Self>> {
        let limit = options.value("limit");
        let exclude = options.value("exclude");
        if limit.is_none() && exclude.is_none() {
            return Ok(None);
        }
        Self::new(
            limit.unwrap_or_default().split(','),
            exclude.unwrap_or_default().split(','),
        )
        .map(Some)
    }
}

impl CompileFilter for MethodFilter {
    fn can_be_compiled(&self, signature: &str) -> bool {
        if self.exclude.iter().any(|regex| regex.is_match(signature)) {
            return false;
        }
        self.limit.is_empty() || self.limit.iter().any(|regex| regex.is_match(signature))
    }
}

/// Builds a [`MethodFilter`] from the current JIT option set.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptionSetFilterSource;

impl FilterSource for OptionSetFilterSource {
    fn current_filter(&self, settings: &CompilerSettings) -> Result<Option<Arc<dyn CompileFilter>>> {
        Ok(MethodFilter::from_option_set(&settings.jit_options)?
            .map(|filter| Arc::new(filter) as Arc<dyn CompileFilter>))
    }
}

/// Always returns the filter it was built with.
#[derive(Clone, Default)]
pub struct FixedFilterSource {
    filter: Option<Arc<dyn CompileFilter>>,
}

impl FixedFilterSource {
    pub fn new(filter: impl CompileFilter + 'static) -> Self {
        Self {
            filter: Some(Arc::new(filter)),
        }
    }

    pub fn none() -> Self {
        Self { filter: None }
    }
}

impl FilterSource for FixedFilterSource {
    fn current_filter(&self, _settings: &CompilerSettings) -> Result<Option<Arc<dyn CompileFilter>>> {
        Ok(self.filter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{OptionSetParser, SubOptionParser};

    #[test]
    fn test_glob_to_regex() {
        assert_eq!(glob_to_regex("java/lang/*"), r"^java/lang/.*\..*$");
        assert_eq!(glob_to_regex("A.f?"), r"^A\.f.$");
    }

    #[test]
    fn test_limit_only_allows_matches() {
        let filter = MethodFilter::new(["java/lang/*"], None::<&str>).unwrap();
        assert!(filter.can_be_compiled("java/lang/String.hashCode()I"));
        assert!(!filter.can_be_compiled("java/util/HashMap.get(Ljava/lang/Object;)Ljava/lang/Object;"));
    }

    #[test]
    fn test_exclude_wins_over_limit() {
        let filter = MethodFilter::new(["java/*"], ["java/lang/String.hash*"]).unwrap();
        assert!(!filter.can_be_compiled("java/lang/String.hashCode()I"));
        assert!(filter.can_be_compiled("java/lang/String.length()I"));
    }

    #[test]
    fn test_filter_from_option_set() {
        let options = SubOptionParser
            .parse("count=0,exclude={Foo.bar*,Baz}")
            .options;
        let filter = MethodFilter::from_option_set(&options).unwrap().unwrap();
        assert!(!filter.can_be_compiled("Foo.bar()V"));
        assert!(!filter.can_be_compiled("Baz.anything()V"));
        assert!(filter.can_be_compiled("Foo.qux()V"));

        let plain = SubOptionParser.parse("count=0").options;
        assert!(MethodFilter::from_option_set(&plain).unwrap().is_none());
    }

    #[test]
    fn test_closure_filter_and_sources() {
        let settings = CompilerSettings::default();
        assert!(OptionSetFilterSource.current_filter(&settings).unwrap().is_none());
        assert!(FixedFilterSource::none().current_filter(&settings).unwrap().is_none());

        let source = FixedFilterSource::new(|sig: &str| !sig.starts_with("Bad"));
        let filter = source.current_filter(&settings).unwrap().unwrap();
        assert!(!filter.can_be_compiled("Bad.m()V"));
        assert!(filter.can_be_compiled("Good.m()V"));
    }
}
