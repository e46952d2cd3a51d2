//! The fluent schema description surface.
//!
//! The builder registers specs and returns typed handles; `build()` seals
//! the description into an immutable [`Schema`]. Description mistakes never
//! panic and never return `Err` — they accumulate as construction errors on
//! the snapshot, and parsing against such a schema fails fast.
//!
//! # Example
//!
//! ```rust,ignore
//! let mut b = Schema::builder();
//!
//! let verbose = b.flag("verbose").short('v').long("verbose").counted();
//! let name = b.option("name").long("name").required().scalar();
//! let port = b.option("port").long("port").int().env("PORT")
//!     .default_value(8080).scalar();
//!
//! let auth = b.fragment("auth").register();
//! let deploy = b.domain("deploy").alias("d").inherit(&auth).register();
//! let key = b.option("key").long("key").only_in(&deploy).scalar();
//! let token = b.option("token").long("token").only_in(&deploy).scalar();
//! b.constrain_in(&auth, exactly_one([key.owner(), token.owner()]));
//!
//! let schema = b.build();
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use crate::convert::Converter;
use crate::error::SchemaError;
use crate::schema::constraint::Constraint;
use crate::schema::handle::{
    CountHandle, DomainHandle, FixedHandle, ListHandle, OwnerId, ScalarHandle, SetHandle,
};
use crate::schema::registry::{RawSchema, Schema};
use crate::schema::spec::{
    Arity, DomainSpec, EagerAction, OptionSpec, OwnerKind, PositionalArity, PositionalSpec,
    SwitchForm, ValuePolicy,
};
use crate::settings::Settings;
use crate::validate::{Validator, ValidatorKind};
use crate::value::{FromValue, KeyValue, Value};

/// Mutable schema description; sealed by [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    settings: Settings,
    options: Vec<OptionSpec>,
    positionals: Vec<PositionalSpec>,
    domains: Vec<DomainSpec>,
    global_constraints: Vec<Constraint>,
    owners: Vec<OwnerKind>,
    pending_errors: Vec<SchemaError>,
    next_seq: u32,
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaBuilder {
    /// Creates an empty description with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: Settings::default(),
            options: Vec::new(),
            positionals: Vec::new(),
            domains: Vec::new(),
            global_constraints: Vec::new(),
            owners: Vec::new(),
            pending_errors: Vec::new(),
            next_seq: 0,
        }
    }

    /// Grammar and pipeline settings, mutable until `build()`.
    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Starts describing a value-carrying option. The initial value type is
    /// `String`; refine with `.int()`, `.float()`, `.one_of()` and friends
    /// before attaching defaults or checks.
    pub fn option(&mut self, name: impl Into<String>) -> OptionBuilder<'_, String> {
        OptionBuilder {
            builder: self,
            name: name.into(),
            switches: Vec::new(),
            converter: Converter::string(),
            wrap: Arc::new(Value::Str),
            policy: ValuePolicy::RequiresValue,
            presence: None,
            env: None,
            hidden: false,
            eager: None,
            scope: None,
            min_required: 0,
            interactive: false,
            help: None,
            value_name: None,
            validators: Vec::new(),
            default: None,
            _marker: PhantomData,
        }
    }

    /// Starts describing a boolean flag (no value tokens accepted).
    pub fn flag(&mut self, name: impl Into<String>) -> FlagBuilder<'_> {
        FlagBuilder {
            builder: self,
            name: name.into(),
            switches: Vec::new(),
            env: None,
            hidden: false,
            negatable: false,
            eager: None,
            scope: None,
            min_required: 0,
            help: None,
        }
    }

    /// Starts describing a positional slot. Sequence order is declaration
    /// order.
    pub fn positional(&mut self, name: impl Into<String>) -> PositionalBuilder<'_, String> {
        PositionalBuilder {
            builder: self,
            name: name.into(),
            converter: Converter::string(),
            min_required: 0,
            scope: None,
            help: None,
            value_name: None,
            validators: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Starts describing a selectable domain.
    pub fn domain(&mut self, name: impl Into<String>) -> DomainBuilder<'_> {
        DomainBuilder {
            builder: self,
            name: name.into(),
            aliases: Vec::new(),
            label: None,
            description: None,
            fragment: false,
            parents: Vec::new(),
        }
    }

    /// Starts describing a fragment: never selectable, contributes
    /// constraints through inheritance only.
    pub fn fragment(&mut self, name: impl Into<String>) -> DomainBuilder<'_> {
        DomainBuilder {
            fragment: true,
            ..self.domain(name)
        }
    }

    /// Adds a schema-level constraint, active in every domain.
    pub fn constrain(&mut self, constraint: Constraint) {
        self.global_constraints.push(constraint);
    }

    /// Adds a constraint declared by `domain`; it fires when that domain is
    /// active or inherited by the active domain.
    pub fn constrain_in(&mut self, domain: &DomainHandle, constraint: Constraint) {
        self.domains[domain.index as usize]
            .constraints
            .push(constraint);
    }

    /// Seals the description. Construction problems are captured on the
    /// snapshot, never thrown.
    #[must_use]
    pub fn build(self) -> Schema {
        Schema::finish(RawSchema {
            settings: self.settings,
            options: self.options,
            positionals: self.positionals,
            domains: self.domains,
            global_constraints: self.global_constraints,
            owners: self.owners,
            pending_errors: self.pending_errors,
        })
    }

    fn register_option(&mut self, spec: OptionSpec) -> OwnerId {
        let id = OwnerId(self.owners.len() as u32);
        self.owners.push(OwnerKind::Option(self.options.len() as u32));
        self.options.push(spec);
        id
    }

    fn register_positional(&mut self, spec: PositionalSpec) -> OwnerId {
        let id = OwnerId(self.owners.len() as u32);
        self.owners
            .push(OwnerKind::Positional(self.positionals.len() as u32));
        self.positionals.push(spec);
        id
    }
}

// ============================================================================
// Option builder
// ============================================================================

/// Fluent description of one value-carrying option.
///
/// The type parameter tracks the converter's output; refinements like
/// [`int`](Self::int) replace both. Attach defaults and checks *after* the
/// type refinement.
pub struct OptionBuilder<'b, T> {
    builder: &'b mut SchemaBuilder,
    name: String,
    switches: Vec<SwitchForm>,
    converter: Converter,
    wrap: Arc<dyn Fn(T) -> Value + Send + Sync>,
    policy: ValuePolicy,
    presence: Option<Value>,
    env: Option<String>,
    hidden: bool,
    eager: Option<EagerAction>,
    scope: Option<Vec<u32>>,
    min_required: u32,
    interactive: bool,
    help: Option<String>,
    value_name: Option<String>,
    validators: Vec<Validator>,
    default: Option<Arc<dyn Fn() -> Value + Send + Sync>>,
    _marker: PhantomData<fn() -> T>,
}

impl<'b, T: Send + Sync + 'static> OptionBuilder<'b, T> {
    /// Adds a long switch (matched after the long prefix).
    #[must_use]
    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.switches.push(SwitchForm::Long(name.into()));
        self
    }

    /// Adds a short switch character.
    #[must_use]
    pub fn short(mut self, ch: char) -> Self {
        self.switches.push(SwitchForm::Short(ch));
        self
    }

    /// Help text for renderers.
    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Expected-value description for renderers and `missing-value`
    /// diagnostics.
    #[must_use]
    pub fn value_name(mut self, text: impl Into<String>) -> Self {
        self.value_name = Some(text.into());
        self
    }

    /// Environment fallback variable, consulted when no token bound the
    /// option.
    #[must_use]
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Excludes the option from help output; it still parses.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Marks the option as interactively-prompted; the host layer honours
    /// this after parsing.
    #[must_use]
    pub fn interactive(mut self) -> Self {
        self.interactive = true;
        self
    }

    /// The option must be provided at least once.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.min_required = self.min_required.max(1);
        self
    }

    /// The option must be provided at least `n` times.
    #[must_use]
    pub fn at_least(mut self, n: u32) -> Self {
        self.min_required = n;
        self
    }

    /// Limits the option to `domain` (and every domain inheriting it).
    /// May be called repeatedly to widen the scope.
    #[must_use]
    pub fn only_in(mut self, domain: &DomainHandle) -> Self {
        self.scope.get_or_insert_with(Vec::new).push(domain.index);
        self
    }

    /// Bare occurrences bind `presence` instead of requiring a value;
    /// attached values (`--opt=v`) still convert normally.
    #[must_use]
    pub fn optional_value(mut self, presence: T) -> Self {
        self.policy = ValuePolicy::OptionalValue;
        self.presence = Some((self.wrap)(presence));
        self
    }

    /// Default producer, invoked only when no other source bound a value.
    #[must_use]
    pub fn default<F>(mut self, producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let wrap = Arc::clone(&self.wrap);
        self.default = Some(Arc::new(move || wrap(producer())));
        self
    }

    /// Constant default convenience.
    #[must_use]
    pub fn default_value(self, value: T) -> Self
    where
        T: Clone,
    {
        self.default(move || value.clone())
    }

    /// Per-value check; `template` supports `{value}`, `{switches}` and
    /// `{name}`.
    #[must_use]
    pub fn check<F>(mut self, template: impl Into<String>, predicate: F) -> Self
    where
        T: FromValue,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validators.push(Validator {
            template: template.into(),
            kind: ValidatorKind::PerValue(Arc::new(move |value| {
                T::from_value(value).is_none_or(|typed| predicate(&typed))
            })),
        });
        self
    }

    /// Per-collection check on the gathered size; `template` supports
    /// `{count}`, `{value}` and `{option}`.
    #[must_use]
    pub fn check_count<F>(mut self, template: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(usize) -> bool + Send + Sync + 'static,
    {
        self.validators.push(Validator {
            template: template.into(),
            kind: ValidatorKind::PerCollection(Arc::new(move |values| {
                predicate(values.len())
            })),
        });
        self
    }

    // ------------------------------------------------------------------
    // Type refinement
    // ------------------------------------------------------------------

    fn retype<U>(
        self,
        converter: Converter,
        wrap: impl Fn(U) -> Value + Send + Sync + 'static,
    ) -> OptionBuilder<'b, U> {
        OptionBuilder {
            builder: self.builder,
            name: self.name,
            switches: self.switches,
            converter,
            wrap: Arc::new(wrap),
            policy: self.policy,
            presence: self.presence,
            env: self.env,
            hidden: self.hidden,
            eager: self.eager,
            scope: self.scope,
            min_required: self.min_required,
            interactive: self.interactive,
            help: self.help,
            value_name: self.value_name,
            validators: self.validators,
            default: self.default,
            _marker: PhantomData,
        }
    }

    /// Signed 64-bit integer values.
    #[must_use]
    pub fn int(self) -> OptionBuilder<'b, i64> {
        self.retype(Converter::integer(), Value::Int)
    }

    /// Floating-point values.
    #[must_use]
    pub fn float(self) -> OptionBuilder<'b, f64> {
        self.retype(Converter::float(), Value::Float)
    }

    /// Boolean token values (`true|false|yes|no|on|off|1|0`).
    #[must_use]
    pub fn bool(self) -> OptionBuilder<'b, bool> {
        self.retype(Converter::boolean(), Value::Bool)
    }

    /// Restricted string: membership in `choices`, case-insensitive; the
    /// declared spelling is stored.
    #[must_use]
    pub fn one_of(self, choices: &[&str]) -> OptionBuilder<'b, String> {
        self.retype(Converter::one_of(choices), Value::Str)
    }

    /// Case-sensitive variant of [`one_of`](Self::one_of).
    #[must_use]
    pub fn one_of_exact(self, choices: &[&str]) -> OptionBuilder<'b, String> {
        self.retype(Converter::one_of_exact(choices), Value::Str)
    }

    /// Case-insensitive variant match producing a host enum value.
    ///
    /// The host type implements [`FromValue`] by downcast for typed
    /// queries.
    #[must_use]
    pub fn enumerated<U>(self, variants: &[(&str, U)]) -> OptionBuilder<'b, U>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.retype(Converter::enumerated(variants, &[]), Value::other)
    }

    /// [`enumerated`](Self::enumerated) with an alias map layered on top.
    #[must_use]
    pub fn enumerated_with_aliases<U>(
        self,
        variants: &[(&str, U)],
        aliases: &[(&str, &str)],
    ) -> OptionBuilder<'b, U>
    where
        U: Clone + Send + Sync + 'static,
    {
        self.retype(Converter::enumerated(variants, aliases), Value::other)
    }

    /// `key<sep>value` pair values.
    #[must_use]
    pub fn keyvalue(self, separator: char) -> OptionBuilder<'b, KeyValue> {
        self.retype(Converter::keyvalue(separator), Value::KeyValue)
    }

    /// Host-supplied conversion; `None` renders as an invalid value of the
    /// described shape.
    #[must_use]
    pub fn map<U, F>(self, describe: impl Into<String>, convert: F) -> OptionBuilder<'b, U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&str) -> Option<U> + Send + Sync + 'static,
    {
        self.retype(Converter::map(describe, convert), Value::other)
    }

    // ------------------------------------------------------------------
    // Terminals
    // ------------------------------------------------------------------

    fn finish(self, arity: Arity) -> OwnerId {
        let spec = OptionSpec {
            name: self.name,
            switches: self.switches,
            arity,
            policy: self.policy,
            presence: self.presence,
            converter: self.converter,
            default: self.default,
            env: self.env,
            hidden: self.hidden,
            negatable: false,
            eager: self.eager,
            scope: self.scope,
            min_required: self.min_required,
            interactive: self.interactive,
            help: self.help,
            value_name: self.value_name,
            validators: self.validators,
        };
        self.builder.register_option(spec)
    }

    /// Registers as a scalar: one value, last occurrence wins.
    #[must_use]
    pub fn scalar(self) -> ScalarHandle<T> {
        ScalarHandle::new(self.finish(Arity::Scalar))
    }

    /// Registers as a list: every occurrence appends, order preserved.
    #[must_use]
    pub fn list(self) -> ListHandle<T> {
        ListHandle::new(self.finish(Arity::List))
    }

    /// Registers as a set: occurrences deduplicate, first wins.
    #[must_use]
    pub fn set(self) -> SetHandle<T> {
        SetHandle::new(self.finish(Arity::Set))
    }

    /// Registers with exactly `n` values per occurrence.
    #[must_use]
    pub fn fixed(mut self, n: usize) -> FixedHandle<T> {
        let n = if n == 0 {
            self.builder
                .pending_errors
                .push(SchemaError::ZeroFixedArity {
                    owner: self.name.clone(),
                });
            1
        } else {
            n
        };
        FixedHandle::new(self.finish(Arity::Fixed(n)))
    }
}

// ============================================================================
// Flag builder
// ============================================================================

/// Fluent description of one boolean flag.
pub struct FlagBuilder<'b> {
    builder: &'b mut SchemaBuilder,
    name: String,
    switches: Vec<SwitchForm>,
    env: Option<String>,
    hidden: bool,
    negatable: bool,
    eager: Option<EagerAction>,
    scope: Option<Vec<u32>>,
    min_required: u32,
    help: Option<String>,
}

impl<'b> FlagBuilder<'b> {
    /// Adds a long switch.
    #[must_use]
    pub fn long(mut self, name: impl Into<String>) -> Self {
        self.switches.push(SwitchForm::Long(name.into()));
        self
    }

    /// Adds a short switch character.
    #[must_use]
    pub fn short(mut self, ch: char) -> Self {
        self.switches.push(SwitchForm::Short(ch));
        self
    }

    /// Help text for renderers.
    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Environment fallback variable (boolean token).
    #[must_use]
    pub fn env(mut self, name: impl Into<String>) -> Self {
        self.env = Some(name.into());
        self
    }

    /// Excludes the flag from help output.
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Derives `--no-<name>` negation switches for every long switch.
    #[must_use]
    pub fn negatable(mut self) -> Self {
        self.negatable = true;
        self
    }

    /// Matching this flag publishes a help outcome and stops the pipeline.
    #[must_use]
    pub fn eager_help(mut self) -> Self {
        self.eager = Some(EagerAction::ShowHelp);
        self
    }

    /// Matching this flag publishes a version outcome and stops the
    /// pipeline.
    #[must_use]
    pub fn eager_version(mut self) -> Self {
        self.eager = Some(EagerAction::ShowVersion);
        self
    }

    /// The flag must be provided.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.min_required = self.min_required.max(1);
        self
    }

    /// Limits the flag to `domain` (and every domain inheriting it).
    #[must_use]
    pub fn only_in(mut self, domain: &DomainHandle) -> Self {
        self.scope.get_or_insert_with(Vec::new).push(domain.index);
        self
    }

    fn finish(self, arity: Arity) -> OwnerId {
        let spec = OptionSpec {
            name: self.name,
            switches: self.switches,
            arity,
            policy: ValuePolicy::FlagOnly,
            presence: None,
            converter: Converter::boolean(),
            default: None,
            env: self.env,
            hidden: self.hidden,
            negatable: self.negatable,
            eager: self.eager,
            scope: self.scope,
            min_required: self.min_required,
            interactive: false,
            help: self.help,
            value_name: None,
            validators: Vec::new(),
        };
        self.builder.register_option(spec)
    }

    /// Registers as a boolean scalar.
    #[must_use]
    pub fn scalar(self) -> ScalarHandle<bool> {
        ScalarHandle::new(self.finish(Arity::Scalar))
    }

    /// Registers as an occurrence counter (`-vvv`).
    #[must_use]
    pub fn counted(self) -> CountHandle {
        CountHandle::new(self.finish(Arity::Count))
    }
}

// ============================================================================
// Positional builder
// ============================================================================

/// Fluent description of one positional slot.
pub struct PositionalBuilder<'b, T> {
    builder: &'b mut SchemaBuilder,
    name: String,
    converter: Converter,
    min_required: u32,
    scope: Option<Vec<u32>>,
    help: Option<String>,
    value_name: Option<String>,
    validators: Vec<Validator>,
    _marker: PhantomData<fn() -> T>,
}

impl<'b, T: Send + Sync + 'static> PositionalBuilder<'b, T> {
    /// Help text for renderers.
    #[must_use]
    pub fn help(mut self, text: impl Into<String>) -> Self {
        self.help = Some(text.into());
        self
    }

    /// Expected-value description.
    #[must_use]
    pub fn value_name(mut self, text: impl Into<String>) -> Self {
        self.value_name = Some(text.into());
        self
    }

    /// The slot must be filled at least once.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.min_required = self.min_required.max(1);
        self
    }

    /// The slot must collect at least `n` tokens (variadic slots).
    #[must_use]
    pub fn at_least(mut self, n: u32) -> Self {
        self.min_required = n;
        self
    }

    /// Limits the slot to `domain` (and every domain inheriting it).
    #[must_use]
    pub fn only_in(mut self, domain: &DomainHandle) -> Self {
        self.scope.get_or_insert_with(Vec::new).push(domain.index);
        self
    }

    /// Per-value check; `template` supports `{value}`, `{switches}` and
    /// `{name}`.
    #[must_use]
    pub fn check<F>(mut self, template: impl Into<String>, predicate: F) -> Self
    where
        T: FromValue,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.validators.push(Validator {
            template: template.into(),
            kind: ValidatorKind::PerValue(Arc::new(move |value| {
                T::from_value(value).is_none_or(|typed| predicate(&typed))
            })),
        });
        self
    }

    fn retype<U>(self, converter: Converter) -> PositionalBuilder<'b, U> {
        PositionalBuilder {
            builder: self.builder,
            name: self.name,
            converter,
            min_required: self.min_required,
            scope: self.scope,
            help: self.help,
            value_name: self.value_name,
            validators: self.validators,
            _marker: PhantomData,
        }
    }

    /// Signed 64-bit integer values.
    #[must_use]
    pub fn int(self) -> PositionalBuilder<'b, i64> {
        self.retype(Converter::integer())
    }

    /// Floating-point values.
    #[must_use]
    pub fn float(self) -> PositionalBuilder<'b, f64> {
        self.retype(Converter::float())
    }

    /// Restricted string values.
    #[must_use]
    pub fn one_of(self, choices: &[&str]) -> PositionalBuilder<'b, String> {
        self.retype(Converter::one_of(choices))
    }

    /// Host-supplied conversion.
    #[must_use]
    pub fn map<U, F>(self, describe: impl Into<String>, convert: F) -> PositionalBuilder<'b, U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&str) -> Option<U> + Send + Sync + 'static,
    {
        self.retype(Converter::map(describe, convert))
    }

    fn finish(self, arity: PositionalArity) -> OwnerId {
        let seq = self.builder.next_seq;
        self.builder.next_seq += 1;

        let spec = PositionalSpec {
            name: self.name,
            arity,
            seq,
            min_required: self.min_required,
            converter: self.converter,
            scope: self.scope,
            help: self.help,
            value_name: self.value_name,
            validators: self.validators,
        };
        self.builder.register_positional(spec)
    }

    /// Registers as a single-token slot.
    #[must_use]
    pub fn single(self) -> ScalarHandle<T> {
        ScalarHandle::new(self.finish(PositionalArity::Single))
    }

    /// Registers as a greedy ordered collection; must be the last slot in
    /// any domain it is active in.
    #[must_use]
    pub fn variadic(self) -> ListHandle<T> {
        ListHandle::new(self.finish(PositionalArity::List))
    }

    /// Registers as a greedy deduplicated collection.
    #[must_use]
    pub fn variadic_set(self) -> SetHandle<T> {
        SetHandle::new(self.finish(PositionalArity::Set))
    }
}

// ============================================================================
// Domain builder
// ============================================================================

/// Fluent description of one domain or fragment.
pub struct DomainBuilder<'b> {
    builder: &'b mut SchemaBuilder,
    name: String,
    aliases: Vec<String>,
    label: Option<String>,
    description: Option<String>,
    fragment: bool,
    parents: Vec<u32>,
}

impl<'b> DomainBuilder<'b> {
    /// Adds a selection alias. Fragments may not declare aliases; doing so
    /// is captured as a construction error at `build()`.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Short label for listings.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Longer description.
    #[must_use]
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Inherits another domain's constraints (transitively). Inheritance
    /// must stay acyclic; cycles are captured as construction errors.
    #[must_use]
    pub fn inherit(mut self, parent: &DomainHandle) -> Self {
        self.parents.push(parent.index);
        self
    }

    /// Registers the domain and returns its handle.
    #[must_use]
    pub fn register(self) -> DomainHandle {
        let index = self.builder.domains.len() as u32;
        self.builder.domains.push(DomainSpec {
            name: self.name,
            aliases: self.aliases,
            label: self.label,
            description: self.description,
            fragment: self.fragment,
            parents: self.parents,
            constraints: Vec::new(),
        });
        DomainHandle { index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::constraint::require;
    use crate::schema::handle::HandleRef;

    #[test]
    fn test_builder_registers_owners_in_order() {
        let mut b = SchemaBuilder::new();
        let name = b.option("name").long("name").scalar();
        let verbose = b.flag("verbose").short('v').scalar();
        let input = b.positional("input").single();

        assert_eq!(name.owner(), OwnerId(0));
        assert_eq!(verbose.owner(), OwnerId(1));
        assert_eq!(input.owner(), OwnerId(2));

        let schema = b.build();
        assert!(schema.snapshot().is_valid());
        assert_eq!(schema.snapshot().options.len(), 2);
        assert_eq!(schema.snapshot().positionals.len(), 1);
    }

    #[test]
    fn test_duplicate_switch_is_captured() {
        let mut b = SchemaBuilder::new();
        let _a = b.option("alpha").long("x").scalar();
        let _b = b.option("beta").long("x").scalar();

        let schema = b.build();
        assert!(matches!(
            schema.snapshot().errors.as_slice(),
            [SchemaError::DuplicateSwitch { switch, .. }] if switch == "--x"
        ));
    }

    #[test]
    fn test_duplicate_owner_is_captured() {
        let mut b = SchemaBuilder::new();
        let _a = b.option("name").long("a").scalar();
        let _b = b.option("name").long("b").scalar();

        let schema = b.build();
        assert!(schema
            .snapshot()
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::DuplicateOwner { owner } if owner == "name")));
    }

    #[test]
    fn test_negation_collision_is_captured() {
        let mut b = SchemaBuilder::new();
        let _explicit = b.option("manual").long("no-cache").scalar();
        let _negatable = b.flag("cache").long("cache").negatable().scalar();

        let schema = b.build();
        assert!(schema
            .snapshot()
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::NegationCollision { switch, .. } if switch == "--no-cache")));
    }

    #[test]
    fn test_inheritance_cycle_is_captured_and_named() {
        let mut b = SchemaBuilder::new();
        let first = b.fragment("first").register();
        let second = b.domain("second").inherit(&first).register();
        // Close the loop through the back door.
        b.domains[first.index as usize].parents.push(second.index);

        let schema = b.build();
        let cycle = schema
            .snapshot()
            .errors
            .iter()
            .find_map(|e| match e {
                SchemaError::InheritanceCycle { cycle } => Some(cycle.clone()),
                _ => None,
            })
            .expect("cycle reported");
        assert!(cycle.contains(&"first".to_string()));
        assert!(cycle.contains(&"second".to_string()));
    }

    #[test]
    fn test_fragment_alias_is_captured() {
        let mut b = SchemaBuilder::new();
        let _auth = b.fragment("auth").alias("a").register();

        let schema = b.build();
        assert!(schema
            .snapshot()
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::FragmentAlias { domain } if domain == "auth")));
    }

    #[test]
    fn test_positional_after_variadic_is_captured() {
        let mut b = SchemaBuilder::new();
        let _rest = b.positional("rest").variadic();
        let _late = b.positional("late").single();

        let schema = b.build();
        assert!(schema
            .snapshot()
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::PositionalAfterVariadic { .. })));
    }

    #[test]
    fn test_zero_fixed_arity_is_captured() {
        let mut b = SchemaBuilder::new();
        let _pair = b.option("pair").long("pair").fixed(0);

        let schema = b.build();
        assert!(schema
            .snapshot()
            .errors
            .iter()
            .any(|e| matches!(e, SchemaError::ZeroFixedArity { owner } if owner == "pair")));
    }

    #[test]
    fn test_domain_constraints_attach_to_declaring_domain() {
        let mut b = SchemaBuilder::new();
        let auth = b.fragment("auth").register();
        let key = b.option("key").long("key").scalar();
        b.constrain_in(&auth, require(&key));

        let schema = b.build();
        let tagged = schema
            .snapshot()
            .constraints
            .iter()
            .any(|c| matches!(c, crate::snapshot::ConstraintInfo::Require { owner, domain: Some(d) } if owner == "key" && d == "auth"));
        assert!(tagged);
    }
}
