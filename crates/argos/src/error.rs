//! Parse and schema-construction error taxonomy.
//!
//! Errors are values: the pipeline never unwinds for its own failures. Each
//! variant carries a unique `argos::` diagnostic code; suggestion lists and
//! other context render through miette's dynamic help. Aggregated failures
//! group under [`Error::Multiple`] via `#[related]`.

use std::fmt::{self, Display, Formatter};

use miette::Diagnostic;
use thiserror::Error as ThisError;

/// Programmatic error classification, mirroring the diagnostic codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    /// A token looked like a switch but matched no spec.
    UnknownOption,
    /// A positional failed domain selection.
    UnknownDomain,
    /// A value-requiring spec had no value available.
    MissingValue,
    /// A converter or validator rejected a value.
    InvalidValue,
    /// A positional arrived with no schedule slot left.
    UnexpectedPositional,
    /// A `Require` constraint was violated.
    MissingRequired,
    /// A conditional requirement was violated.
    ConditionalRequirement,
    /// An exactly-one / at-most-one / at-least-one group was violated.
    GroupViolation,
    /// Mutually exclusive options were bound together.
    Conflict,
    /// The schema itself failed construction.
    SchemaInvalid,
    /// Argument-file expansion failed.
    ArgumentFile,
    /// Aggregate of several errors.
    Multiple,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UnknownOption => "unknown-option",
            Self::UnknownDomain => "unknown-domain",
            Self::MissingValue => "missing-value",
            Self::InvalidValue => "invalid-value",
            Self::UnexpectedPositional => "unexpected-positional",
            Self::MissingRequired => "missing-required",
            Self::ConditionalRequirement => "conditional-requirement",
            Self::GroupViolation => "group-violation",
            Self::Conflict => "conflict",
            Self::SchemaInvalid => "schema-invalid",
            Self::ArgumentFile => "argument-file",
            Self::Multiple => "multiple",
        };
        f.write_str(name)
    }
}

/// The group constraint flavours.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GroupKind {
    /// Exactly one member must be provided.
    ExactlyOne,
    /// At most one member may be provided.
    AtMostOne,
    /// At least one member must be provided.
    AtLeastOne,
}

impl Display for GroupKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactlyOne => write!(f, "exactly one"),
            Self::AtMostOne => write!(f, "at most one"),
            Self::AtLeastOne => write!(f, "at least one"),
        }
    }
}

/// Errors produced by parsing, validation and constraint evaluation.
#[derive(Clone, Debug, ThisError, Diagnostic)]
#[non_exhaustive]
pub enum Error {
    /// A token looked like a switch but matched no visible spec.
    #[error("unknown option '{token}'")]
    #[diagnostic(code(argos::unknown_option))]
    UnknownOption {
        /// The offending token as written.
        token: String,

        /// Ranked suggestion candidates, best first.
        suggestions: Vec<String>,

        /// Rendered "did you mean" text.
        #[help]
        help: Option<String>,
    },

    /// The first positional matched no concrete domain name or alias.
    #[error("unknown command '{token}'")]
    #[diagnostic(code(argos::unknown_domain))]
    UnknownDomain {
        /// The offending token.
        token: String,

        /// Ranked suggestion candidates, best first.
        suggestions: Vec<String>,

        /// Rendered "did you mean" text.
        #[help]
        help: Option<String>,
    },

    /// A value-requiring spec had no value available.
    #[error("missing value for '{option}'")]
    #[diagnostic(code(argos::missing_value))]
    MissingValue {
        /// Display name of the offending switch or positional.
        option: String,

        /// The expected-value description.
        #[help]
        expected: Option<String>,
    },

    /// A converter or validator rejected a value.
    #[error("invalid value for '{option}': {reason}")]
    #[diagnostic(code(argos::invalid_value))]
    InvalidValue {
        /// Display name of the offending switch or positional.
        option: String,

        /// The raw value as supplied.
        value: String,

        /// The converter or validator rejection message.
        reason: String,

        /// The environment variable the value came from, when it did not
        /// arrive on the command line.
        env: Option<String>,

        /// Source note ("value came from environment variable PORT").
        #[help]
        help: Option<String>,
    },

    /// A positional token arrived with no schedule slot left.
    #[error("unexpected argument '{token}'")]
    #[diagnostic(code(argos::unexpected_positional))]
    UnexpectedPositional {
        /// The unconsumed positional token.
        token: String,
    },

    /// A `Require` constraint was violated.
    #[error("{message}")]
    #[diagnostic(code(argos::missing_required))]
    MissingRequired {
        /// Display name of the required owner.
        option: String,

        /// The configured minimum occurrence count.
        minimum: u32,

        /// The domain that contributed the requirement, if any.
        domain: Option<String>,

        /// Rendered message ("'--name' is required", "at least 2 ...").
        message: String,
    },

    /// A conditional requirement (`require-if-*`) was violated.
    #[error("'{option}' is required {condition}")]
    #[diagnostic(code(argos::conditional_requirement))]
    ConditionalRequirement {
        /// Display name of the required owner.
        option: String,

        /// Rendered trigger condition ("when '--tls' is provided").
        condition: String,

        /// Display names of the triggering refs.
        triggers: Vec<String>,

        /// The domain that contributed the requirement, if any.
        domain: Option<String>,
    },

    /// A group constraint was violated.
    #[error("{message}")]
    #[diagnostic(code(argos::group_violation))]
    GroupViolation {
        /// The group flavour.
        kind: GroupKind,

        /// Display names of all group members.
        members: Vec<String>,

        /// Display names of the members actually provided.
        bound: Vec<String>,

        /// The domain that contributed the group, if any.
        domain: Option<String>,

        /// Rendered message.
        message: String,
    },

    /// Mutually exclusive options were provided together.
    #[error("conflicting options provided: {}", .bound.join(", "))]
    #[diagnostic(code(argos::conflict))]
    Conflict {
        /// Display names of the members actually provided.
        bound: Vec<String>,

        /// The domain that contributed the conflict rule, if any.
        domain: Option<String>,
    },

    /// The schema failed construction; parsing did not start.
    #[error("invalid schema: {} construction error(s)", .problems.len())]
    #[diagnostic(
        code(argos::schema_invalid),
        help("fix the schema description before parsing")
    )]
    SchemaInvalid {
        /// All captured construction errors.
        #[related]
        problems: Vec<SchemaError>,
    },

    /// Argument-file expansion failed; token production stopped.
    #[error("cannot expand argument file '{path}': {reason}")]
    #[diagnostic(code(argos::argument_file))]
    ArgumentFile {
        /// The path as written after the file prefix.
        path: String,

        /// What went wrong.
        reason: String,
    },

    /// Several errors, rendered together.
    #[error("{} parse error(s)", .errors.len())]
    #[diagnostic(code(argos::multiple))]
    Multiple {
        /// All accumulated errors.
        #[related]
        errors: Vec<Error>,
    },
}

impl Error {
    /// The taxonomy kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownOption { .. } => ErrorKind::UnknownOption,
            Self::UnknownDomain { .. } => ErrorKind::UnknownDomain,
            Self::MissingValue { .. } => ErrorKind::MissingValue,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::UnexpectedPositional { .. } => ErrorKind::UnexpectedPositional,
            Self::MissingRequired { .. } => ErrorKind::MissingRequired,
            Self::ConditionalRequirement { .. } => ErrorKind::ConditionalRequirement,
            Self::GroupViolation { .. } => ErrorKind::GroupViolation,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::SchemaInvalid { .. } => ErrorKind::SchemaInvalid,
            Self::ArgumentFile { .. } => ErrorKind::ArgumentFile,
            Self::Multiple { .. } => ErrorKind::Multiple,
        }
    }

    /// Creates an unknown-option error with rendered suggestions.
    pub(crate) fn unknown_option(token: impl Into<String>, suggestions: Vec<String>) -> Self {
        let help = render_suggestions(&suggestions);
        Self::UnknownOption {
            token: token.into(),
            suggestions,
            help,
        }
    }

    /// Creates an unknown-domain error with rendered suggestions.
    pub(crate) fn unknown_domain(token: impl Into<String>, suggestions: Vec<String>) -> Self {
        let help = render_suggestions(&suggestions);
        Self::UnknownDomain {
            token: token.into(),
            suggestions,
            help,
        }
    }

    /// Creates a missing-value error.
    pub(crate) fn missing_value(option: impl Into<String>, expected: Option<String>) -> Self {
        Self::MissingValue {
            option: option.into(),
            expected: expected.map(|e| format!("expected {e}")),
        }
    }

    /// Creates an invalid-value error for a command-line sourced value.
    pub(crate) fn invalid_value(
        option: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
            env: None,
            help: None,
        }
    }

    /// Creates an invalid-value error citing an environment source.
    pub(crate) fn invalid_env_value(
        option: impl Into<String>,
        env: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        let env = env.into();
        let help = Some(format!("value came from environment variable {env}"));
        Self::InvalidValue {
            option: option.into(),
            value: value.into(),
            reason: reason.into(),
            env: Some(env),
            help,
        }
    }

    /// Creates a missing-required error.
    pub(crate) fn missing_required(
        option: impl Into<String>,
        minimum: u32,
        domain: Option<String>,
    ) -> Self {
        let option = option.into();
        let message = if minimum > 1 {
            format!("at least {minimum} occurrences of '{option}' required")
        } else {
            format!("'{option}' is required")
        };

        Self::MissingRequired {
            option,
            minimum,
            domain,
            message,
        }
    }

    /// Creates a group-violation error.
    pub(crate) fn group_violation(
        kind: GroupKind,
        members: Vec<String>,
        bound: Vec<String>,
        domain: Option<String>,
    ) -> Self {
        let listed = members.join(", ");
        let message = format!(
            "{kind} of ({listed}) must be provided, but {} {} provided",
            bound.len(),
            if bound.len() == 1 { "was" } else { "were" },
        );

        Self::GroupViolation {
            kind,
            members,
            bound,
            domain,
            message,
        }
    }

    /// Collects multiple errors into a single error value.
    ///
    /// Returns `None` for an empty list; a single error is returned
    /// unwrapped rather than wrapped.
    #[must_use]
    pub fn multiple(errors: Vec<Error>) -> Option<Self> {
        match errors.len() {
            0 => None,
            1 => errors.into_iter().next(),
            _ => Some(Self::Multiple { errors }),
        }
    }
}

fn render_suggestions(suggestions: &[String]) -> Option<String> {
    match suggestions {
        [] => None,
        [only] => Some(format!("did you mean '{only}'?")),
        many => Some(format!("did you mean one of: {}?", many.join(", "))),
    }
}

// ============================================================================
// Schema construction errors
// ============================================================================

/// Errors detected while the schema was described.
///
/// These are accumulated on the snapshot rather than thrown; a parse against
/// a broken schema fails fast with [`Error::SchemaInvalid`].
#[derive(Clone, Debug, PartialEq, ThisError, Diagnostic)]
#[non_exhaustive]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum SchemaError {
    /// The same switch literal is claimed by two specs.
    #[error("switch '{switch}' declared by both '{first}' and '{second}'")]
    #[diagnostic(code(argos::schema::duplicate_switch))]
    DuplicateSwitch {
        /// The clashing switch literal.
        switch: String,
        /// Owner that declared it first.
        first: String,
        /// Owner that declared it again.
        second: String,
    },

    /// Two specs share an owner name.
    #[error("owner name '{owner}' declared twice")]
    #[diagnostic(code(argos::schema::duplicate_owner))]
    DuplicateOwner {
        /// The duplicated owner name.
        owner: String,
    },

    /// A derived negation switch collides with an explicit switch.
    #[error("negation switch '{switch}' for '{owner}' collides with an explicit switch")]
    #[diagnostic(code(argos::schema::negation_collision))]
    NegationCollision {
        /// The derived switch literal.
        switch: String,
        /// The negatable owner.
        owner: String,
    },

    /// A domain name or alias is used for selection twice.
    #[error("domain selector '{selector}' used by both '{first}' and '{second}'")]
    #[diagnostic(code(argos::schema::duplicate_domain))]
    DuplicateDomainSelector {
        /// The clashing name or alias.
        selector: String,
        /// Domain that declared it first.
        first: String,
        /// Domain that declared it again.
        second: String,
    },

    /// Domain inheritance is cyclic.
    #[error("domain inheritance cycle: {}", .cycle.join(" -> "))]
    #[diagnostic(code(argos::schema::inheritance_cycle))]
    InheritanceCycle {
        /// The cycle in traversal order, first domain repeated last.
        cycle: Vec<String>,
    },

    /// A fragment domain declared selection aliases.
    #[error("fragment domain '{domain}' may not declare selection aliases")]
    #[diagnostic(code(argos::schema::fragment_alias))]
    FragmentAlias {
        /// The offending fragment.
        domain: String,
    },

    /// A positional is scheduled after a variadic one.
    #[error("positional '{positional}' follows variadic positional '{variadic}'")]
    #[diagnostic(code(argos::schema::positional_after_variadic))]
    PositionalAfterVariadic {
        /// The positional declared too late.
        positional: String,
        /// The variadic positional that must stay last.
        variadic: String,
    },

    /// More than one variadic positional is active in one domain closure.
    #[error("domain '{domain}' schedules two variadic positionals: '{first}' and '{second}'")]
    #[diagnostic(code(argos::schema::multiple_variadic))]
    MultipleVariadic {
        /// The affected domain ("<root>" for the global schedule).
        domain: String,
        /// First variadic positional.
        first: String,
        /// Second variadic positional.
        second: String,
    },

    /// A fixed-arity option was declared with zero values per occurrence.
    #[error("option '{owner}' declares fixed arity of zero values")]
    #[diagnostic(code(argos::schema::zero_fixed_arity))]
    ZeroFixedArity {
        /// The offending owner.
        owner: String,
    },
}

// ============================================================================
// Aggregation buffer
// ============================================================================

/// Bounded error accumulator shared by the pipeline stages.
#[derive(Debug)]
pub(crate) struct Diagnostics {
    errors: Vec<Error>,
    cap: usize,
    aggregate: bool,
}

impl Diagnostics {
    pub(crate) fn new(cap: usize, aggregate: bool) -> Self {
        Self {
            errors: Vec::new(),
            cap: cap.max(1),
            aggregate,
        }
    }

    /// Records an error unless the buffer is already at capacity. In
    /// non-aggregating mode only the first error is kept.
    pub(crate) fn push(&mut self, error: Error) {
        let limit = if self.aggregate { self.cap } else { 1 };
        if self.errors.len() < limit {
            self.errors.push(error);
        }
    }

    /// Whether the pipeline should keep running stages after the current
    /// one: aggregating mode runs everything, otherwise the first
    /// non-empty stage wins.
    pub(crate) fn stage_may_continue(&self) -> bool {
        self.aggregate || self.errors.is_empty()
    }

    pub(crate) fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::UnknownOption.to_string(), "unknown-option");
        assert_eq!(ErrorKind::GroupViolation.to_string(), "group-violation");
        assert_eq!(ErrorKind::SchemaInvalid.to_string(), "schema-invalid");
    }

    #[test]
    fn test_suggestion_help_rendering() {
        let err = Error::unknown_option("--verbsoe", vec!["--verbose".to_string()]);
        match &err {
            Error::UnknownOption { help, .. } => {
                assert_eq!(help.as_deref(), Some("did you mean '--verbose'?"));
            }
            other => panic!("unexpected {other:?}"),
        }

        let err = Error::unknown_option("--x", vec![]);
        match &err {
            Error::UnknownOption { help, .. } => assert!(help.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_required_messages() {
        let single = Error::missing_required("--name", 1, None);
        assert_eq!(single.to_string(), "'--name' is required");

        let several = Error::missing_required("--tag", 3, None);
        assert_eq!(
            several.to_string(),
            "at least 3 occurrences of '--tag' required"
        );
    }

    #[test]
    fn test_group_violation_message() {
        let err = Error::group_violation(
            GroupKind::ExactlyOne,
            vec!["--key".into(), "--token".into()],
            vec!["--key".into(), "--token".into()],
            None,
        );
        let text = err.to_string();
        assert!(text.contains("exactly one"), "{text}");
        assert!(text.contains("--key, --token"), "{text}");
        assert!(text.contains("2 were provided"), "{text}");
    }

    #[test]
    fn test_multiple_unwraps_single() {
        let one = Error::multiple(vec![Error::unknown_option("--x", vec![])]).unwrap();
        assert_eq!(one.kind(), ErrorKind::UnknownOption);

        assert!(Error::multiple(vec![]).is_none());

        let two = Error::multiple(vec![
            Error::unknown_option("--x", vec![]),
            Error::unknown_option("--y", vec![]),
        ])
        .unwrap();
        assert_eq!(two.kind(), ErrorKind::Multiple);
    }

    #[test]
    fn test_diagnostics_cap() {
        let mut diagnostics = Diagnostics::new(3, true);
        for i in 0..10 {
            diagnostics.push(Error::unknown_option(format!("--{i}"), vec![]));
        }
        assert_eq!(diagnostics.into_errors().len(), 3);
    }

    #[test]
    fn test_diagnostics_first_error_mode() {
        let mut diagnostics = Diagnostics::new(20, false);
        diagnostics.push(Error::unknown_option("--a", vec![]));
        diagnostics.push(Error::unknown_option("--b", vec![]));

        assert!(!diagnostics.stage_may_continue());
        let errors = diagnostics.into_errors();
        assert_eq!(errors.len(), 1);
    }
}
