//! Parse outcomes and the typed result set.

use crate::cell::{self, ValueCell};
use crate::error::Error;
use crate::schema::handle::{
    CountHandle, FixedHandle, HandleRef, ListHandle, ScalarHandle, SetHandle,
};
use crate::schema::registry::Schema;
use crate::schema::spec::OwnerKind;
use crate::snapshot::Snapshot;
use crate::source::{Origins, Source};
use crate::value::{FromValue, KeyValue};

/// The result of one parse invocation.
#[derive(Debug)]
pub enum Outcome {
    /// Parsing, validation and constraint evaluation all succeeded.
    Parsed(Matches),

    /// An eager help switch was seen; nothing else ran.
    Help {
        /// The frozen schema description for the host's renderer.
        snapshot: Snapshot,
        /// The domain active at the point the switch was seen.
        domain: Option<String>,
    },

    /// An eager version switch was seen; nothing else ran.
    Version {
        /// The frozen schema description.
        snapshot: Snapshot,
    },

    /// One or more stages recorded errors.
    Failed {
        /// Accumulated errors, bounded by the configured cap.
        errors: Vec<Error>,
    },
}

impl Outcome {
    /// The matches, when parsing succeeded.
    #[must_use]
    pub fn matches(&self) -> Option<&Matches> {
        match self {
            Self::Parsed(matches) => Some(matches),
            _ => None,
        }
    }

    /// The error list, when parsing failed.
    #[must_use]
    pub fn errors(&self) -> Option<&[Error]> {
        match self {
            Self::Failed { errors } => Some(errors),
            _ => None,
        }
    }

    /// Unwraps the matches.
    ///
    /// # Panics
    ///
    /// Panics when the outcome is not `Parsed`.
    #[must_use]
    #[track_caller]
    pub fn unwrap_matches(self) -> Matches {
        match self {
            Self::Parsed(matches) => matches,
            Self::Help { .. } => panic!("expected Parsed, got Help"),
            Self::Version { .. } => panic!("expected Parsed, got Version"),
            Self::Failed { errors } => {
                panic!("expected Parsed, got Failed: {errors:?}")
            }
        }
    }

    /// Unwraps the error list.
    ///
    /// # Panics
    ///
    /// Panics when the outcome is not `Failed`.
    #[must_use]
    #[track_caller]
    pub fn unwrap_errors(self) -> Vec<Error> {
        match self {
            Self::Failed { errors } => errors,
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}

/// The populated value set of a successful parse.
///
/// Queried by the typed handles the schema builder returned. A handle from
/// a different schema produces unspecified (but memory-safe) answers.
#[derive(Debug)]
pub struct Matches {
    cells: Vec<ValueCell>,
    domain: Option<String>,
    owner_names: Vec<String>,
    env_names: Vec<Option<String>>,
}

impl Matches {
    pub(crate) fn from_parts(
        schema: &Schema,
        cells: Vec<ValueCell>,
        active: Option<u32>,
    ) -> Self {
        let owner_names = (0..schema.owner_count())
            .map(|idx| {
                schema
                    .owner_name(crate::schema::handle::OwnerId(idx as u32))
                    .to_string()
            })
            .collect();

        let env_names = schema
            .owners
            .iter()
            .map(|kind| match kind {
                OwnerKind::Option(idx) => schema.options[*idx as usize].env.clone(),
                OwnerKind::Positional(_) => None,
            })
            .collect();

        Self {
            cells,
            domain: active.map(|idx| schema.domain_name(idx).to_string()),
            owner_names,
            env_names,
        }
    }

    fn cell(&self, handle: &impl HandleRef) -> &ValueCell {
        &self.cells[handle.owner().index()]
    }

    /// The selected domain, if any.
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// The scalar value, when one was bound.
    #[must_use]
    pub fn get<T: FromValue>(&self, handle: &ScalarHandle<T>) -> Option<T> {
        self.cell(handle).scalar().and_then(T::from_value)
    }

    /// Boolean flag convenience: missing means `false`.
    #[must_use]
    pub fn flag(&self, handle: &ScalarHandle<bool>) -> bool {
        self.get(handle).unwrap_or(false)
    }

    /// All list values, in binding order.
    #[must_use]
    pub fn list<T: FromValue>(&self, handle: &ListHandle<T>) -> Vec<T> {
        self.cell(handle)
            .collected()
            .into_iter()
            .filter_map(T::from_value)
            .collect()
    }

    /// All set values, deduplicated, first occurrence first.
    #[must_use]
    pub fn set<T: FromValue>(&self, handle: &SetHandle<T>) -> Vec<T> {
        self.cell(handle)
            .collected()
            .into_iter()
            .filter_map(T::from_value)
            .collect()
    }

    /// Key/value pairs of a set cell.
    #[must_use]
    pub fn pairs(&self, handle: &SetHandle<KeyValue>) -> Vec<KeyValue> {
        cell::keyvalues(&self.cell(handle).collected())
    }

    /// The occurrence counter.
    #[must_use]
    pub fn count(&self, handle: &CountHandle) -> u64 {
        self.cell(handle).counter()
    }

    /// One tuple per occurrence of a fixed-arity option.
    #[must_use]
    pub fn fixed<T: FromValue>(&self, handle: &FixedHandle<T>) -> Vec<Vec<T>> {
        self.cell(handle)
            .tuples()
            .iter()
            .map(|tuple| tuple.iter().filter_map(T::from_value).collect())
            .collect()
    }

    /// Where the owner's value came from.
    #[must_use]
    pub fn source(&self, handle: &impl HandleRef) -> Source {
        self.cell(handle).source
    }

    /// Whether an operator (command line or environment) provided the
    /// value.
    #[must_use]
    pub fn is_present(&self, handle: &impl HandleRef) -> bool {
        self.cell(handle).is_provided()
    }

    /// How many occurrences were bound.
    #[must_use]
    pub fn occurrences(&self, handle: &impl HandleRef) -> u32 {
        self.cell(handle).count
    }

    /// The raw occurrence strings, flattened.
    #[must_use]
    pub fn raw(&self, handle: &impl HandleRef) -> Vec<String> {
        self.cell(handle).raw_flat()
    }

    /// Source attribution for every owner, in declaration order.
    #[must_use]
    pub fn origins(&self) -> Origins {
        let mut origins = Origins::new();
        for (idx, cell) in self.cells.iter().enumerate() {
            let env = match cell.source {
                Source::Environment => self.env_names[idx].clone(),
                _ => None,
            };
            origins.push(self.owner_names[idx].clone(), cell.source, env);
        }
        origins
    }
}
