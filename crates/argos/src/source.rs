//! Source attribution for parsed values.
//!
//! Every value cell records where its value originated, enabling precedence
//! enforcement (a command-line value is never overwritten by the
//! environment, an environment value never by a default) and host-side
//! auditing of a parse result.

use std::fmt::{self, Display, Formatter};

/// Indicates where a parsed value originated from.
///
/// # Precedence
///
/// Sources form a strict ladder; a cell only ever moves up it:
///
/// 1. **Command line** — bound by the parser from a token.
/// 2. **Environment** — bound by the environment fallback pass.
/// 3. **Default** — produced by the spec's default producer.
/// 4. **Missing** — no source supplied a value.
///
/// For constraint evaluation, only [`Source::User`] and
/// [`Source::Environment`] count as "provided by the operator"; a default
/// value never satisfies a presence condition.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Source {
    /// Value was bound from a command-line token.
    User,

    /// Value was read from an environment variable.
    Environment,

    /// Value came from the spec's default producer.
    Default,

    /// No source supplied a value.
    Missing,
}

impl Source {
    /// Whether this source counts as operator-provided for constraint
    /// presence conditions.
    #[must_use]
    pub const fn is_provided(self) -> bool {
        matches!(self, Self::User | Self::Environment)
    }

    /// Rank on the precedence ladder; higher ranks overwrite lower ones.
    pub(crate) const fn rank(self) -> u8 {
        match self {
            Self::User => 3,
            Self::Environment => 2,
            Self::Default => 1,
            Self::Missing => 0,
        }
    }
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "command line"),

            Self::Environment => write!(f, "environment variable"),

            Self::Default => write!(f, "default value"),

            Self::Missing => write!(f, "not set"),
        }
    }
}

/// Source attribution for all owners of a parse result.
///
/// Returned by `Matches::origins()`. When printed, produces an aligned
/// table:
///
/// ```text
/// Value sources:
/// --------------------------------------------------
///   name     <- command line
///   port     <- environment variable [PORT]
///   verbose  <- default value
/// ```
#[derive(Clone, Debug, Default)]
pub struct Origins {
    entries: Vec<OriginEntry>,
}

/// One row of the provenance table.
#[derive(Clone, Debug)]
pub struct OriginEntry {
    /// The schema-unique owner name.
    pub owner: String,

    /// Where the owner's value came from.
    pub source: Source,

    /// The environment variable consulted, when the source is
    /// [`Source::Environment`].
    pub env_name: Option<String>,
}

impl Origins {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, owner: impl Into<String>, source: Source, env_name: Option<String>) {
        self.entries.push(OriginEntry {
            owner: owner.into(),
            source,
            env_name,
        });
    }

    /// Returns all entries in owner declaration order.
    #[must_use]
    pub fn entries(&self) -> &[OriginEntry] {
        &self.entries
    }

    /// Looks up the source for a specific owner by name.
    #[must_use]
    pub fn get(&self, owner: &str) -> Option<Source> {
        self.entries
            .iter()
            .find(|entry| entry.owner == owner)
            .map(|entry| entry.source)
    }

    /// Returns an iterator over owner names and their sources.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Source)> {
        self.entries
            .iter()
            .map(|entry| (entry.owner.as_str(), entry.source))
    }
}

impl Display for Origins {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "Value sources:")?;
        writeln!(f, "{}", "-".repeat(50))?;

        // Find max owner name length for alignment
        let max_len = self
            .entries
            .iter()
            .map(|entry| entry.owner.len())
            .max()
            .unwrap_or(0);

        for entry in &self.entries {
            write!(
                f,
                "  {:<width$}  <- {}",
                entry.owner,
                entry.source,
                width = max_len,
            )?;

            match &entry.env_name {
                Some(name) if entry.source == Source::Environment => {
                    writeln!(f, " [{name}]")?;
                }
                _ => writeln!(f)?,
            }
        }

        Ok(())
    }
}
