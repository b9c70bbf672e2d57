//! Detailed compiler option sets and the sub-option string parser.
//!
//! A detailed option string is the text after `-Xjit:` or `-Xaot:`, e.g.
//! `count=0,limit={java/lang/*,java/util/*},fullSpeedDebug`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Concrete sub-options for one compiler mode.
///
/// Bare flags are stored with no value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerOptionSet {
    options: BTreeMap<String, Option<String>>,
}

impl CompilerOptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: Option<String>) {
        self.options.insert(name.into(), value);
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.options.contains_key(name)
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(|value| value.as_deref())
    }

    pub fn clear(&mut self) {
        self.options.clear();
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Overlays `other`; its entries override same-named ones.
    pub fn merge_from(&mut self, other: &CompilerOptionSet) {
        for (name, value) in &other.options {
            self.options.insert(name.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.options
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_deref()))
    }
}

/// Result of parsing a detailed option string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome<'t> {
    pub options: CompilerOptionSet,
    /// Text starting at the first item that could not be parsed; empty on
    /// success.
    pub remainder: &'t str,
}

impl ParseOutcome<'_> {
    pub fn is_complete(&self) -> bool {
        self.remainder.is_empty()
    }
}

/// Turns a detailed option string into concrete options.
pub trait OptionSetParser: Send + Sync {
    fn parse<'t>(&self, text: &'t str) -> ParseOutcome<'t>;
}

/// Parser for `name[=value]` items separated by commas.
///
/// Values wrapped in braces may contain commas; the braces are stripped.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubOptionParser;

impl SubOptionParser {
    pub fn new() -> Self {
        Self
    }

    /// Length of a valid option name at the start of `text`.
    fn name_len(text: &str) -> Option<usize> {
        let mut chars = text.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_alphabetic() => {}
            _ => return None,
        }
        let end = chars
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        Some(end)
    }

    /// Splits a value off the front of `text`, returning the value and the
    /// number of bytes it occupied.
    fn value_len(text: &str) -> Option<(&str, usize)> {
        if let Some(inner) = text.strip_prefix('{') {
            let mut depth = 1usize;
            for (i, c) in inner.char_indices() {
                match c {
                    '{' => depth += 1,
                    '}' => {
                        depth -= 1;
                        if depth == 0 {
                            return Some((&inner[..i], i + 2));
                        }
                    }
                    _ => {}
                }
            }
            return None;
        }

        let end = text.find(',').unwrap_or(text.len());
        let value = &text[..end];
        if value.is_empty() || value.contains('{') || value.contains('}') {
            return None;
        }
        Some((value, end))
    }
}

impl OptionSetParser for SubOptionParser {
    fn parse<'t>(&self, text: &'t str) -> ParseOutcome<'t> {
        let mut options = CompilerOptionSet::new();
        let mut rest = text;

        while !rest.is_empty() {
            let item_start = rest;
            let Some(name_len) = Self::name_len(rest) else {
                return ParseOutcome { options, remainder: item_start };
            };
            let name = &rest[..name_len];
            rest = &rest[name_len..];

            let value = match rest.strip_prefix('=') {
                Some(after_eq) => match Self::value_len(after_eq) {
                    Some((value, consumed)) => {
                        rest = &after_eq[consumed..];
                        Some(value.to_string())
                    }
                    None => return ParseOutcome { options, remainder: item_start },
                },
                None => None,
            };

            match rest.strip_prefix(',') {
                Some(after_comma) => rest = after_comma,
                None if rest.is_empty() => {}
                None => return ParseOutcome { options, remainder: item_start },
            }

            options.set(name, value);
        }

        ParseOutcome { options, remainder: "" }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags_and_values() {
        let outcome = SubOptionParser.parse("count=0,fullSpeedDebug,optLevel=warm");
        assert!(outcome.is_complete());
        assert_eq!(outcome.options.value("count"), Some("0"));
        assert!(outcome.options.is_set("fullSpeedDebug"));
        assert_eq!(outcome.options.value("fullSpeedDebug"), None);
        assert_eq!(outcome.options.value("optLevel"), Some("warm"));
    }

    #[test]
    fn test_parse_braced_value_keeps_commas() {
        let outcome = SubOptionParser.parse("limit={java/lang/*,java/util/*},count=10");
        assert!(outcome.is_complete());
        assert_eq!(outcome.options.value("limit"), Some("java/lang/*,java/util/*"));
        assert_eq!(outcome.options.value("count"), Some("10"));
    }

    #[test]
    fn test_parse_empty_string() {
        let outcome = SubOptionParser.parse("");
        assert!(outcome.is_complete());
        assert!(outcome.options.is_empty());
    }

    #[test]
    fn test_malformed_item_returns_remainder() {
        let outcome = SubOptionParser.parse("count=0,=oops,optLevel=hot");
        assert_eq!(outcome.remainder, "=oops,optLevel=hot");
        assert_eq!(outcome.options.value("count"), Some("0"));
        assert!(!outcome.options.is_set("optLevel"));
    }

    #[test]
    fn test_unbalanced_brace_is_malformed() {
        let outcome = SubOptionParser.parse("limit={java/lang/*");
        assert_eq!(outcome.remainder, "limit={java/lang/*");
    }

    #[test]
    fn test_empty_value_is_malformed() {
        let outcome = SubOptionParser.parse("count=");
        assert_eq!(outcome.remainder, "count=");
    }

    #[test]
    fn test_merge_from_overrides() {
        let mut base = SubOptionParser.parse("count=0,optLevel=warm").options;
        let overlay = SubOptionParser.parse("optLevel=hot").options;
        base.merge_from(&overlay);
        assert_eq!(base.value("count"), Some("0"));
        assert_eq!(base.value("optLevel"), Some("hot"));
    }
}
