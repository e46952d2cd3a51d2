//! Declarative command-line argument parsing with typed handles, domains
//! and constraint evaluation.
//!
//! A host describes its CLI as a schema — named options, positional slots,
//! typed values, subcommand-like *domains*, requirement and group
//! constraints — then hands the parser a raw argument vector and gets back
//! a populated set of typed values, or a structured error explaining why
//! parsing failed.
//!
//! # Basic example
//!
//! ```rust
//! use argos::Schema;
//!
//! let mut b = Schema::builder();
//! let verbose = b.flag("verbose").short('v').long("verbose").counted();
//! let name = b.option("name").long("name").required().scalar();
//! let port = b
//!     .option("port")
//!     .long("port")
//!     .int()
//!     .env("ARGOS_DOC_PORT")
//!     .default_value(8080)
//!     .scalar();
//! let schema = b.build();
//!
//! let matches = schema
//!     .parse(["--name", "Ada", "-vv"])
//!     .unwrap_matches();
//! assert_eq!(matches.get(&name).as_deref(), Some("Ada"));
//! assert_eq!(matches.count(&verbose), 2);
//! assert_eq!(matches.get(&port), Some(8080));
//! ```
//!
//! # Domains and constraints
//!
//! Domains gate which options and constraints are active. Fragments are
//! inheritance-only: they contribute constraints to the domains that
//! inherit them but cannot be selected themselves.
//!
//! ```rust
//! use argos::{Schema, HandleRef, exactly_one, require};
//!
//! let mut b = Schema::builder();
//! let auth = b.fragment("auth").register();
//! let deploy = b.domain("deploy").alias("d").inherit(&auth).register();
//!
//! let env = b.option("env").long("env").only_in(&deploy).scalar();
//! let key = b.option("key").long("key").only_in(&deploy).scalar();
//! let token = b.option("token").long("token").only_in(&deploy).scalar();
//!
//! b.constrain_in(&auth, exactly_one([key.owner(), token.owner()]));
//! b.constrain_in(&deploy, require(&env));
//! let schema = b.build();
//!
//! let matches = schema
//!     .parse(["deploy", "--env", "prod", "--key", "K"])
//!     .unwrap_matches();
//! assert_eq!(matches.domain(), Some("deploy"));
//! ```
//!
//! # Pipeline
//!
//! Raw args flow through argument-file expansion and tokenisation, the
//! parser, the environment binder, the default pass, user validators, and
//! the constraint evaluator. Any stage may record errors; in aggregating
//! mode (the default) the pipeline continues best-effort and collects them
//! up to a cap. An eager help/version switch short-circuits everything.
//!
//! The core performs no ambient I/O: environment and file access go
//! through the [`provider`] traits, so parses can run hermetically.

mod binder;
mod cell;
pub mod convert;
mod error;
mod evaluate;
mod outcome;
mod parser;
pub mod provider;
pub mod schema;
mod settings;
mod snapshot;
mod source;
pub mod suggest;
mod tokens;
mod validate;
mod value;

pub use convert::Converter;
pub use error::{Error, ErrorKind, GroupKind, SchemaError};
pub use outcome::{Matches, Outcome};
pub use schema::{
    Arity, CondMode, Constraint, CountHandle, DomainBuilder, DomainHandle, EagerAction,
    FixedHandle, FlagBuilder, HandleRef, ListHandle, OptionBuilder, OwnerId, PositionalArity,
    PositionalBuilder, ScalarHandle, Schema, SchemaBuilder, SetHandle, ValuePolicy,
    ValuePredicate, at_least_one, at_most_one, conflict, exactly_one, require,
    require_if_all_absent, require_if_all_present, require_if_any_absent,
    require_if_any_present, require_if_value,
};
pub use settings::Settings;
pub use snapshot::{ConstraintInfo, DomainInfo, OptionInfo, PositionalInfo, Snapshot};
pub use source::{OriginEntry, Origins, Source};
pub use value::{FromValue, KeyValue, Value};
