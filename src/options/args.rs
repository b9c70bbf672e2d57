//! Restore-time argument stream and the search index over it.

use super::catalog::{MatchMode, RestoreOption};
use crate::core::{RestoreError, Result};
use serde::Serialize;
use std::fmt;

/// Position of a token in the restore stream, or "not present".
///
/// Ordering follows stream position; an absent index sorts before every
/// present one, so a later token always wins a comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ArgumentIndex(Option<usize>);

impl ArgumentIndex {
    pub const NOT_PRESENT: ArgumentIndex = ArgumentIndex(None);

    pub fn at(position: usize) -> Self {
        Self(Some(position))
    }

    pub fn is_present(self) -> bool {
        self.0.is_some()
    }

    pub fn position(self) -> Option<usize> {
        self.0
    }
}

impl fmt::Display for ArgumentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(position) => write!(f, "{}", position),
            None => f.write_str("-1"),
        }
    }
}

#[derive(Debug, Clone)]
struct RestoreArg {
    text: String,
    consumed: bool,
}

/// Ordered option tokens captured at restore time.
#[derive(Debug, Clone, Default)]
pub struct RestoreArgumentStream {
    args: Vec<RestoreArg>,
}

impl RestoreArgumentStream {
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: tokens
                .into_iter()
                .map(|text| RestoreArg {
                    text: text.into(),
                    consumed: false,
                })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn get(&self, index: ArgumentIndex) -> Option<&str> {
        index
            .position()
            .and_then(|position| self.args.get(position))
            .map(|arg| arg.text.as_str())
    }

    pub fn is_consumed(&self, index: ArgumentIndex) -> bool {
        index
            .position()
            .and_then(|position| self.args.get(position))
            .is_some_and(|arg| arg.consumed)
    }

    /// Tokens that no search consumed.
    pub fn unconsumed(&self) -> impl Iterator<Item = (ArgumentIndex, &str)> {
        self.args
            .iter()
            .enumerate()
            .filter(|(_, arg)| !arg.consumed)
            .map(|(position, arg)| (ArgumentIndex::at(position), arg.text.as_str()))
    }
}

/// Search interface over a [`RestoreArgumentStream`].
///
/// Consumed tokens are invisible to every later search regardless of match
/// mode.
pub struct RestoreArgumentIndex<'s> {
    stream: &'s mut RestoreArgumentStream,
}

impl<'s> RestoreArgumentIndex<'s> {
    pub fn new(stream: &'s mut RestoreArgumentStream) -> Self {
        Self { stream }
    }

    fn live_matches<'a>(
        &'a self,
        pattern: &'a str,
        mode: MatchMode,
    ) -> impl DoubleEndedIterator<Item = usize> + 'a {
        self.stream
            .args
            .iter()
            .enumerate()
            .filter(move |(_, arg)| !arg.consumed && mode.matches(&arg.text, pattern))
            .map(|(position, _)| position)
    }

    pub fn find_last(&self, pattern: &str, mode: MatchMode) -> ArgumentIndex {
        ArgumentIndex(self.live_matches(pattern, mode).next_back())
    }

    pub fn find_first(&self, pattern: &str, mode: MatchMode) -> ArgumentIndex {
        ArgumentIndex(self.live_matches(pattern, mode).next())
    }

    /// All live matches in stream order.
    pub fn find_all(&self, pattern: &str, mode: MatchMode) -> Vec<ArgumentIndex> {
        self.live_matches(pattern, mode)
            .map(ArgumentIndex::at)
            .collect()
    }

    pub fn find_and_consume_last(&mut self, pattern: &str, mode: MatchMode) -> ArgumentIndex {
        let index = self.find_last(pattern, mode);
        self.consume(index);
        index
    }

    /// Finds the last live match and consumes every match, so earlier
    /// occurrences cannot resurface in a later scan.
    pub fn take_last(&mut self, pattern: &str, mode: MatchMode) -> ArgumentIndex {
        let index = self.find_last(pattern, mode);
        self.consume_all(pattern, mode);
        index
    }

    pub fn take_option(&mut self, option: RestoreOption) -> ArgumentIndex {
        self.take_last(option.as_str(), option.match_mode())
    }

    pub fn find_option(&self, option: RestoreOption) -> ArgumentIndex {
        self.find_last(option.as_str(), option.match_mode())
    }

    pub fn consume(&mut self, index: ArgumentIndex) {
        if let Some(arg) = index
            .position()
            .and_then(|position| self.stream.args.get_mut(position))
        {
            arg.consumed = true;
        }
    }

    pub fn consume_all(&mut self, pattern: &str, mode: MatchMode) -> usize {
        let mut count = 0;
        for arg in self.stream.args.iter_mut() {
            if !arg.consumed && mode.matches(&arg.text, pattern) {
                arg.consumed = true;
                count += 1;
            }
        }
        count
    }

    pub fn token(&self, index: ArgumentIndex) -> Option<&str> {
        self.stream.get(index)
    }

    /// Text following the first `delimiter` in the token at `index`.
    pub fn option_value(&self, index: ArgumentIndex, delimiter: char) -> Option<&str> {
        self.token(index)
            .and_then(|token| token.split_once(delimiter))
            .map(|(_, value)| value)
    }

    /// Text following `pattern` in the token at `index`.
    pub fn suffix_after(&self, index: ArgumentIndex, pattern: &str) -> Option<&str> {
        self.token(index)
            .and_then(|token| token.strip_prefix(pattern))
    }

    /// Parses the integer that follows `pattern`, with or without an `=`.
    pub fn integer_value(&self, index: ArgumentIndex, pattern: &str) -> Result<u64> {
        let raw = self.suffix_after(index, pattern).unwrap_or_default();
        let digits = raw.strip_prefix('=').unwrap_or(raw);
        digits
            .parse::<u64>()
            .map_err(|_| RestoreError::InvalidOptionValue {
                option: pattern.to_string(),
                value: raw.to_string(),
            })
    }

    pub fn stream(&self) -> &RestoreArgumentStream {
        &*self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(tokens: &[&str]) -> RestoreArgumentStream {
        RestoreArgumentStream::from_tokens(tokens.iter().copied())
    }

    #[test]
    fn test_absent_index_sorts_first() {
        assert!(ArgumentIndex::NOT_PRESENT < ArgumentIndex::at(0));
        assert!(ArgumentIndex::at(0) < ArgumentIndex::at(1));
        assert_eq!(ArgumentIndex::default(), ArgumentIndex::NOT_PRESENT);
        assert_eq!(ArgumentIndex::NOT_PRESENT.to_string(), "-1");
    }

    #[test]
    fn test_find_last_and_first() {
        let mut s = stream(&["-Xjit", "-Xnojit", "-Xjit:count=0"]);
        let args = RestoreArgumentIndex::new(&mut s);

        assert_eq!(args.find_last("-Xjit", MatchMode::OptionalList), ArgumentIndex::at(2));
        assert_eq!(args.find_first("-Xjit", MatchMode::OptionalList), ArgumentIndex::at(0));
        assert_eq!(args.find_last("-Xjit", MatchMode::Exact), ArgumentIndex::at(0));
        assert_eq!(args.find_last("-Xaot", MatchMode::Exact), ArgumentIndex::NOT_PRESENT);
    }

    #[test]
    fn test_consumed_token_is_invisible_to_every_mode() {
        let mut s = stream(&["-Xjit:count=0"]);
        let mut args = RestoreArgumentIndex::new(&mut s);

        let index = args.find_and_consume_last("-Xjit:", MatchMode::Prefix);
        assert_eq!(index, ArgumentIndex::at(0));

        assert!(!args.find_last("-Xjit:", MatchMode::Prefix).is_present());
        assert!(!args.find_last("-Xjit", MatchMode::OptionalList).is_present());
        assert!(!args.find_first("-X", MatchMode::Prefix).is_present());
        assert!(args.find_all("-Xjit", MatchMode::OptionalList).is_empty());
        assert!(s.is_consumed(ArgumentIndex::at(0)));
    }

    #[test]
    fn test_take_last_consumes_earlier_occurrences() {
        let mut s = stream(&[
            "-XX:CompilationThreads=4",
            "-Xint",
            "-XX:CompilationThreads=2",
        ]);
        let mut args = RestoreArgumentIndex::new(&mut s);

        let index = args.take_last("-XX:CompilationThreads=", MatchMode::Prefix);
        assert_eq!(index, ArgumentIndex::at(2));
        assert!(!args.find_last("-XX:CompilationThreads=", MatchMode::Prefix).is_present());

        let left: Vec<_> = s.unconsumed().map(|(_, text)| text).collect();
        assert_eq!(left, vec!["-Xint"]);
    }

    #[test]
    fn test_find_all_in_stream_order() {
        let mut s = stream(&["-Xjit:a", "-Xaot:b", "-Xjit:c"]);
        let args = RestoreArgumentIndex::new(&mut s);
        assert_eq!(
            args.find_all("-Xjit:", MatchMode::Prefix),
            vec![ArgumentIndex::at(0), ArgumentIndex::at(2)]
        );
    }

    #[test]
    fn test_option_value_splits_on_first_delimiter() {
        let mut s = stream(&["-XX:JITServerAddress=host:9043"]);
        let args = RestoreArgumentIndex::new(&mut s);
        assert_eq!(args.option_value(ArgumentIndex::at(0), '='), Some("host:9043"));
        assert_eq!(args.option_value(ArgumentIndex::NOT_PRESENT, '='), None);
    }

    #[test]
    fn test_integer_value() {
        let mut s = stream(&["-XX:CompilationThreads=2", "-XcompilationThreads4", "-XX:CompilationThreads=x"]);
        let args = RestoreArgumentIndex::new(&mut s);

        assert_eq!(args.integer_value(ArgumentIndex::at(0), "-XX:CompilationThreads=").unwrap(), 2);
        assert_eq!(args.integer_value(ArgumentIndex::at(1), "-XcompilationThreads").unwrap(), 4);
        assert!(matches!(
            args.integer_value(ArgumentIndex::at(2), "-XX:CompilationThreads="),
            Err(RestoreError::InvalidOptionValue { .. })
        ));
    }
}
