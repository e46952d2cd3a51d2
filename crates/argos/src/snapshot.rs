//! Frozen, side-effect-free description of a schema.
//!
//! The snapshot is the sole surface visible to help renderers and
//! shell-completion generators: settings, domains, options with resolved
//! switches (negation forms included), positionals, every constraint record
//! tagged with its declaring domain, and any schema-construction errors.
//! It is captured once at `build()` time and never changes afterwards.

use crate::error::{GroupKind, SchemaError};
use crate::schema::constraint::CondMode;
use crate::schema::spec::{Arity, EagerAction, PositionalArity, ValuePolicy};
use crate::settings::Settings;

/// Immutable projection of a built schema.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot {
    /// The grammar and pipeline settings the parser will apply.
    pub settings: Settings,

    /// All domains in declaration order, fragments included.
    pub domains: Vec<DomainInfo>,

    /// All options in declaration order, hidden ones included.
    pub options: Vec<OptionInfo>,

    /// All positionals in schedule order.
    pub positionals: Vec<PositionalInfo>,

    /// Every constraint record, tagged with its declaring domain.
    pub constraints: Vec<ConstraintInfo>,

    /// Schema-construction errors; non-empty means parses fail fast.
    pub errors: Vec<SchemaError>,
}

impl Snapshot {
    /// Options that belong in help output.
    pub fn visible_options(&self) -> impl Iterator<Item = &OptionInfo> {
        self.options.iter().filter(|option| !option.hidden)
    }

    /// Concrete (selectable) domains.
    pub fn selectable_domains(&self) -> impl Iterator<Item = &DomainInfo> {
        self.domains.iter().filter(|domain| !domain.fragment)
    }

    /// Looks up a domain description by name.
    #[must_use]
    pub fn domain(&self, name: &str) -> Option<&DomainInfo> {
        self.domains.iter().find(|domain| domain.name == name)
    }

    /// Whether the schema failed construction.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Description of one option spec.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct OptionInfo {
    /// Schema-unique owner name.
    pub name: String,

    /// Rendered switch tokens, negation forms included.
    pub switches: Vec<String>,

    /// Container shape.
    pub arity: Arity,

    /// Value policy.
    pub policy: ValuePolicy,

    /// Eager action, if any.
    pub eager: Option<EagerAction>,

    /// Environment fallback variable.
    pub env: Option<String>,

    /// Excluded from help output (still parsed).
    pub hidden: bool,

    /// Whether negation switches were derived.
    pub negatable: bool,

    /// Interactive-input marker for the host layer.
    pub interactive: bool,

    /// Whether a default producer is configured.
    pub has_default: bool,

    /// Minimum required occurrences; 0 means optional.
    pub min_required: u32,

    /// Domains the option is limited to; `None` means all.
    pub domains: Option<Vec<String>>,

    /// Help text.
    pub help: Option<String>,

    /// Expected-value description.
    pub value_name: Option<String>,
}

/// Description of one positional spec.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PositionalInfo {
    /// Schema-unique owner name.
    pub name: String,

    /// Container shape.
    pub arity: PositionalArity,

    /// Position in the schedule.
    pub seq: u32,

    /// Minimum required count; 0 means optional.
    pub min_required: u32,

    /// Domains the positional is limited to; `None` means all.
    pub domains: Option<Vec<String>>,

    /// Help text.
    pub help: Option<String>,

    /// Expected-value description.
    pub value_name: Option<String>,
}

/// Description of one domain.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DomainInfo {
    /// Owner name; doubles as the selection token for concrete domains.
    pub name: String,

    /// Additional selection tokens.
    pub aliases: Vec<String>,

    /// Short label for listings.
    pub label: Option<String>,

    /// Longer description.
    pub description: Option<String>,

    /// Fragments contribute constraints only and cannot be selected.
    pub fragment: bool,

    /// Names of directly inherited domains, in declaration order.
    pub inherits: Vec<String>,
}

/// Description of one constraint record.
///
/// Owner references use owner names. `domain` is the declaring domain
/// (`None` for schema-level constraints).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ConstraintInfo {
    /// Unconditional requirement.
    Require {
        /// The required owner.
        owner: String,
        /// Declaring domain.
        domain: Option<String>,
    },

    /// Presence-conditional requirement.
    Conditional {
        /// The conditionally required owner.
        owner: String,
        /// The quantifier over the refs.
        mode: CondMode,
        /// The referenced owners.
        refs: Vec<String>,
        /// Declaring domain.
        domain: Option<String>,
    },

    /// Value-conditional requirement.
    ConditionalOnValue {
        /// The conditionally required owner.
        owner: String,
        /// The owner whose value is inspected.
        reference: String,
        /// The rendered condition text.
        condition: String,
        /// Declaring domain.
        domain: Option<String>,
    },

    /// Group constraint.
    Group {
        /// The group flavour.
        kind: GroupKind,
        /// The member owners.
        members: Vec<String>,
        /// Declaring domain.
        domain: Option<String>,
    },

    /// Mutual exclusion.
    Conflict {
        /// The mutually exclusive owners.
        members: Vec<String>,
        /// Declaring domain.
        domain: Option<String>,
    },
}
