//! Schema model: specs, handles, constraints, the fluent builder and the
//! sealed registry.

pub mod builder;
pub mod constraint;
pub mod handle;
pub mod registry;
pub mod spec;

pub use builder::{DomainBuilder, FlagBuilder, OptionBuilder, PositionalBuilder, SchemaBuilder};
pub use constraint::{
    CondMode, Constraint, ValuePredicate, at_least_one, at_most_one, conflict, exactly_one,
    require, require_if_all_absent, require_if_all_present, require_if_any_absent,
    require_if_any_present, require_if_value,
};
pub use handle::{
    CountHandle, DomainHandle, FixedHandle, HandleRef, ListHandle, OwnerId, ScalarHandle,
    SetHandle,
};
pub use registry::Schema;
pub use spec::{Arity, EagerAction, PositionalArity, ValuePolicy};
