//! Parser settings: prefixes, separators, aggregation and suggestion knobs.
//!
//! A [`Settings`] value travels with the schema and is published unchanged on
//! the snapshot so help renderers and completion generators see the exact
//! grammar the parser accepted.

/// Tunable grammar and pipeline settings for a schema.
///
/// The defaults describe the conventional GNU-flavoured grammar:
///
/// ```text
/// --name value   --name=value   --name:value   -n value   -abc   @args.txt   --
/// ```
///
/// # Example
///
/// ```rust,ignore
/// let mut builder = Schema::builder();
/// builder.settings_mut().max_errors = 5;
/// builder.settings_mut().unknown_as_positionals = true;
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Settings {
    /// Prefix introducing a long switch (`--name`). Also the end-of-options
    /// sentinel when it appears alone.
    pub long_prefix: String,

    /// Prefix character introducing a short switch and short clusters.
    /// `None` disables short switches entirely.
    pub short_prefix: Option<char>,

    /// Characters accepted between a switch and an attached value
    /// (`--name=value`, `--name:value`).
    pub value_separators: Vec<char>,

    /// Prefix character marking an argument-file token (`@args.txt`).
    /// `None` disables argument-file expansion.
    pub file_prefix: Option<char>,

    /// Maximum recursive argument-file expansion depth.
    pub max_expansion_depth: usize,

    /// Prefix prepended to long switches of negatable booleans
    /// (`--feature` gains `--no-feature`).
    pub negation_prefix: String,

    /// When `true`, stages accumulate errors up to [`max_errors`](Self::max_errors);
    /// when `false`, the first failing stage wins.
    pub aggregate_errors: bool,

    /// Upper bound on the number of accumulated errors.
    pub max_errors: usize,

    /// Attach "did you mean" candidates to unknown switches and domains.
    pub suggestions: bool,

    /// Maximum Damerau-Levenshtein distance for a suggestion candidate.
    pub max_edit_distance: usize,

    /// Demote unknown switches to positionals instead of reporting them.
    pub unknown_as_positionals: bool,

    /// Optional terminal-width hint, carried through the snapshot for the
    /// host's help renderer. The core never reads it.
    pub terminal_width: Option<usize>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            long_prefix: "--".to_string(),
            short_prefix: Some('-'),
            value_separators: vec!['=', ':'],
            file_prefix: Some('@'),
            max_expansion_depth: 16,
            negation_prefix: "no-".to_string(),
            aggregate_errors: true,
            max_errors: 20,
            suggestions: true,
            max_edit_distance: 2,
            unknown_as_positionals: false,
            terminal_width: None,
        }
    }
}

impl Settings {
    /// Returns `true` when `token` is the end-of-options sentinel.
    #[must_use]
    pub fn is_sentinel(&self, token: &str) -> bool {
        token == self.long_prefix
    }

    /// Returns `true` when `token` begins with the long prefix and carries
    /// at least one further character.
    #[must_use]
    pub fn looks_long(&self, token: &str) -> bool {
        token.len() > self.long_prefix.len() && token.starts_with(&self.long_prefix)
    }

    /// Returns `true` when `token` begins with the short prefix, carries at
    /// least one further character, and is not a long switch.
    #[must_use]
    pub fn looks_short(&self, token: &str) -> bool {
        if self.looks_long(token) || self.is_sentinel(token) {
            return false;
        }

        match self.short_prefix {
            Some(prefix) => {
                let mut chars = token.chars();
                chars.next() == Some(prefix) && chars.next().is_some()
            }
            None => false,
        }
    }

    /// Returns `true` when `token` looks like any kind of switch.
    ///
    /// Used by the parser to decide whether the next token may serve as a
    /// detached option value.
    #[must_use]
    pub fn looks_switch(&self, token: &str) -> bool {
        self.looks_long(token) || self.looks_short(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_grammar() {
        let s = Settings::default();
        assert_eq!(s.long_prefix, "--");
        assert_eq!(s.short_prefix, Some('-'));
        assert_eq!(s.value_separators, vec!['=', ':']);
        assert_eq!(s.file_prefix, Some('@'));
        assert_eq!(s.max_errors, 20);
        assert_eq!(s.max_edit_distance, 2);
    }

    #[test]
    fn test_sentinel_detection() {
        let s = Settings::default();
        assert!(s.is_sentinel("--"));
        assert!(!s.is_sentinel("---"));
        assert!(!s.is_sentinel("-"));
    }

    #[test]
    fn test_long_detection() {
        let s = Settings::default();
        assert!(s.looks_long("--name"));
        assert!(!s.looks_long("--"));
        assert!(!s.looks_long("-n"));
        assert!(!s.looks_long("name"));
    }

    #[test]
    fn test_short_detection() {
        let s = Settings::default();
        assert!(s.looks_short("-n"));
        assert!(s.looks_short("-abc"));
        assert!(!s.looks_short("-"));
        assert!(!s.looks_short("--name"));
        assert!(!s.looks_short("--"));
    }

    #[test]
    fn test_short_disabled() {
        let s = Settings {
            short_prefix: None,
            ..Settings::default()
        };
        assert!(!s.looks_short("-n"));
        assert!(!s.looks_switch("-n"));
    }
}
