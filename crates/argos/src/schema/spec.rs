//! Runtime spec records held by the registry.

use std::fmt;
use std::sync::Arc;

use crate::convert::Converter;
use crate::settings::Settings;
use crate::validate::Validator;
use crate::value::Value;

/// Container shape of an option's value cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Arity {
    /// One value; re-binding replaces.
    Scalar,
    /// Ordered, append-per-occurrence.
    List,
    /// Deduplicated, first occurrence wins.
    Set,
    /// Occurrence counter; no values.
    Count,
    /// Exactly `n` values per occurrence.
    Fixed(usize),
}

/// Container shape of a positional's value cell.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PositionalArity {
    /// One token fills the slot.
    Single,
    /// Greedy ordered collection.
    List,
    /// Greedy deduplicated collection.
    Set,
}

impl PositionalArity {
    pub(crate) const fn is_variadic(self) -> bool {
        matches!(self, Self::List | Self::Set)
    }
}

/// How an option treats values.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ValuePolicy {
    /// A value must be supplied with every occurrence.
    RequiresValue,
    /// Presence is the value; no value token is accepted.
    FlagOnly,
    /// An attached value is used when present, otherwise the presence
    /// default binds.
    OptionalValue,
}

/// Pipeline-short-circuiting option actions.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum EagerAction {
    /// Publish a help outcome and stop.
    ShowHelp,
    /// Publish a version outcome and stop.
    ShowVersion,
}

/// A declared switch in prefix-free form.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SwitchForm {
    /// Long switch name (matched after the long prefix).
    Long(String),
    /// Short switch character (matched after the short prefix).
    Short(char),
}

impl SwitchForm {
    /// Renders the user-facing token for this switch.
    pub(crate) fn display(&self, settings: &Settings) -> String {
        match self {
            Self::Long(name) => format!("{}{name}", settings.long_prefix),
            Self::Short(ch) => match settings.short_prefix {
                Some(prefix) => format!("{prefix}{ch}"),
                None => format!("{ch}"),
            },
        }
    }
}

/// A registered named option.
pub(crate) struct OptionSpec {
    pub name: String,
    pub switches: Vec<SwitchForm>,
    pub arity: Arity,
    pub policy: ValuePolicy,
    /// Value bound by bare presence under [`ValuePolicy::OptionalValue`].
    pub presence: Option<Value>,
    pub converter: Converter,
    pub default: Option<Arc<dyn Fn() -> Value + Send + Sync>>,
    pub env: Option<String>,
    pub hidden: bool,
    pub negatable: bool,
    pub eager: Option<EagerAction>,
    /// Domain indices this option is limited to; `None` means all domains.
    pub scope: Option<Vec<u32>>,
    pub min_required: u32,
    /// Marker honoured by the host layer after parsing (interactive
    /// prompting); the core only carries it to the snapshot.
    pub interactive: bool,
    pub help: Option<String>,
    pub value_name: Option<String>,
    pub validators: Vec<Validator>,
}

impl fmt::Debug for OptionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OptionSpec")
            .field("name", &self.name)
            .field("switches", &self.switches)
            .field("arity", &self.arity)
            .field("policy", &self.policy)
            .field("env", &self.env)
            .field("min_required", &self.min_required)
            .finish_non_exhaustive()
    }
}

impl OptionSpec {
    /// The user-facing display name: first long switch, else first short,
    /// else the owner name.
    pub(crate) fn display_name(&self, settings: &Settings) -> String {
        let long = self
            .switches
            .iter()
            .find(|s| matches!(s, SwitchForm::Long(_)));
        match long.or_else(|| self.switches.first()) {
            Some(switch) => switch.display(settings),
            None => self.name.clone(),
        }
    }

    /// All rendered switch tokens, negations included.
    pub(crate) fn rendered_switches(&self, settings: &Settings) -> Vec<String> {
        let mut out: Vec<String> = self
            .switches
            .iter()
            .map(|s| s.display(settings))
            .collect();

        if self.negatable {
            for switch in &self.switches {
                if let SwitchForm::Long(name) = switch {
                    out.push(format!(
                        "{}{}{name}",
                        settings.long_prefix, settings.negation_prefix
                    ));
                }
            }
        }

        out
    }
}

/// A registered positional slot.
pub(crate) struct PositionalSpec {
    pub name: String,
    pub arity: PositionalArity,
    /// Total order within the schedule; assigned in declaration order.
    pub seq: u32,
    pub min_required: u32,
    pub converter: Converter,
    pub scope: Option<Vec<u32>>,
    pub help: Option<String>,
    pub value_name: Option<String>,
    pub validators: Vec<Validator>,
}

impl fmt::Debug for PositionalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PositionalSpec")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("seq", &self.seq)
            .field("min_required", &self.min_required)
            .finish_non_exhaustive()
    }
}

impl PositionalSpec {
    /// Display name used in diagnostics.
    pub(crate) fn display_name(&self) -> String {
        format!("<{}>", self.name)
    }
}

/// A registered domain (concrete or fragment).
#[derive(Debug)]
pub(crate) struct DomainSpec {
    pub name: String,
    pub aliases: Vec<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    /// Fragments are never selectable; they contribute constraints through
    /// inheritance only.
    pub fragment: bool,
    /// Directly inherited domain indices, in declaration order.
    pub parents: Vec<u32>,
    pub constraints: Vec<crate::schema::constraint::Constraint>,
}

/// Maps a global owner id onto the option or positional table.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum OwnerKind {
    Option(u32),
    Positional(u32),
}
