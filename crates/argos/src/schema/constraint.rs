//! Constraint records and their construction surface.
//!
//! Constraints carry owner indices, never closures over host fields; the
//! one exception is the `require-if-value` predicate, which is an erased
//! read-only test over the referenced cell's dynamic value.
//!
//! # Example
//!
//! ```rust,ignore
//! builder.constrain(require(&name));
//! builder.constrain(exactly_one([key.owner(), token.owner()]));
//! builder.constrain_in(&auth, require_if_value(
//!     &cert, &proto, "when '--proto' is 'https'", |p: &String| p == "https",
//! ));
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::GroupKind;
use crate::schema::handle::{HandleRef, OwnerId, ScalarHandle};
use crate::value::{FromValue, Value};

/// Quantifier for conditional requirements.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CondMode {
    /// Fires when any ref is provided.
    AnyPresent,
    /// Fires when every ref is provided.
    AllPresent,
    /// Fires when any ref is missing.
    AnyAbsent,
    /// Fires when every ref is missing.
    AllAbsent,
}

impl fmt::Display for CondMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AnyPresent => write!(f, "any of"),
            Self::AllPresent => write!(f, "all of"),
            Self::AnyAbsent => write!(f, "any missing of"),
            Self::AllAbsent => write!(f, "all missing of"),
        }
    }
}

/// Erased predicate over a referenced cell's value.
#[derive(Clone)]
pub struct ValuePredicate {
    /// Condition text rendered into the violation message.
    pub(crate) condition: String,
    pub(crate) test: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl fmt::Debug for ValuePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValuePredicate")
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}

impl ValuePredicate {
    pub(crate) fn matches(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

/// A requirement, group or conflict record.
#[derive(Clone, Debug)]
pub enum Constraint {
    /// The owner must be bound at least its configured minimum times.
    Require(OwnerId),

    /// The owner must be bound when the quantified presence condition over
    /// `refs` holds.
    RequireIf {
        /// The conditionally required owner.
        owner: OwnerId,
        /// The quantifier over `refs`.
        mode: CondMode,
        /// The referenced owners.
        refs: Vec<OwnerId>,
    },

    /// The owner must be bound when `reference` is bound and the predicate
    /// accepts its value.
    RequireIfValue {
        /// The conditionally required owner.
        owner: OwnerId,
        /// The owner whose value is inspected.
        reference: OwnerId,
        /// The predicate and its rendered condition.
        predicate: ValuePredicate,
    },

    /// Exactly-one / at-most-one / at-least-one over the member set.
    Group {
        /// The group flavour.
        kind: GroupKind,
        /// The member owners.
        members: Vec<OwnerId>,
    },

    /// At most one member may be bound.
    Conflict {
        /// The mutually exclusive owners.
        members: Vec<OwnerId>,
    },
}

fn owners(refs: impl IntoIterator<Item = OwnerId>) -> Vec<OwnerId> {
    refs.into_iter().collect()
}

/// The owner must be provided (at least its configured minimum times).
pub fn require(owner: &impl HandleRef) -> Constraint {
    Constraint::Require(owner.owner())
}

/// The owner must be provided when any ref is provided.
pub fn require_if_any_present(
    owner: &impl HandleRef,
    refs: impl IntoIterator<Item = OwnerId>,
) -> Constraint {
    Constraint::RequireIf {
        owner: owner.owner(),
        mode: CondMode::AnyPresent,
        refs: owners(refs),
    }
}

/// The owner must be provided when every ref is provided.
pub fn require_if_all_present(
    owner: &impl HandleRef,
    refs: impl IntoIterator<Item = OwnerId>,
) -> Constraint {
    Constraint::RequireIf {
        owner: owner.owner(),
        mode: CondMode::AllPresent,
        refs: owners(refs),
    }
}

/// The owner must be provided when any ref is missing.
pub fn require_if_any_absent(
    owner: &impl HandleRef,
    refs: impl IntoIterator<Item = OwnerId>,
) -> Constraint {
    Constraint::RequireIf {
        owner: owner.owner(),
        mode: CondMode::AnyAbsent,
        refs: owners(refs),
    }
}

/// The owner must be provided when every ref is missing.
pub fn require_if_all_absent(
    owner: &impl HandleRef,
    refs: impl IntoIterator<Item = OwnerId>,
) -> Constraint {
    Constraint::RequireIf {
        owner: owner.owner(),
        mode: CondMode::AllAbsent,
        refs: owners(refs),
    }
}

/// The owner must be provided when `reference` is bound and `predicate`
/// accepts its value. `condition` is the text rendered into the violation
/// ("when '--proto' is 'https'").
pub fn require_if_value<T, F>(
    owner: &impl HandleRef,
    reference: &ScalarHandle<T>,
    condition: impl Into<String>,
    predicate: F,
) -> Constraint
where
    T: FromValue,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    Constraint::RequireIfValue {
        owner: owner.owner(),
        reference: reference.owner(),
        predicate: ValuePredicate {
            condition: condition.into(),
            test: Arc::new(move |value| {
                T::from_value(value).is_some_and(|typed| predicate(&typed))
            }),
        },
    }
}

/// Exactly one member must be provided.
pub fn exactly_one(members: impl IntoIterator<Item = OwnerId>) -> Constraint {
    Constraint::Group {
        kind: GroupKind::ExactlyOne,
        members: owners(members),
    }
}

/// At most one member may be provided.
pub fn at_most_one(members: impl IntoIterator<Item = OwnerId>) -> Constraint {
    Constraint::Group {
        kind: GroupKind::AtMostOne,
        members: owners(members),
    }
}

/// At least one member must be provided.
pub fn at_least_one(members: impl IntoIterator<Item = OwnerId>) -> Constraint {
    Constraint::Group {
        kind: GroupKind::AtLeastOne,
        members: owners(members),
    }
}

/// The members are mutually exclusive.
pub fn conflict(members: impl IntoIterator<Item = OwnerId>) -> Constraint {
    Constraint::Conflict {
        members: owners(members),
    }
}
