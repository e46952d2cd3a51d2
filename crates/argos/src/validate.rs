//! User-supplied value validators and their message templates.
//!
//! Validators run after binding, on operator-provided cells only (defaults
//! are never validated; they were never converted from user text). A failing
//! predicate appends an `invalid-value` diagnostic but does not remove the
//! value from its cell.
//!
//! Template placeholders: per-value templates support `{value}`,
//! `{switches}` and `{name}`; per-collection templates support `{count}`,
//! `{value}` (same as count) and `{option}`.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::cell::ValueCell;
use crate::error::{Diagnostics, Error};
use crate::schema::handle::OwnerId;
use crate::schema::registry::Schema;
use crate::schema::spec::OwnerKind;
use crate::value::Value;

/// One validation rule attached to a spec.
#[derive(Clone)]
pub(crate) struct Validator {
    pub template: String,
    pub kind: ValidatorKind,
}

#[derive(Clone)]
pub(crate) enum ValidatorKind {
    /// Runs on every converted occurrence value.
    PerValue(Arc<dyn Fn(&Value) -> bool + Send + Sync>),
    /// Runs once on the gathered collection.
    PerCollection(Arc<dyn Fn(&[&Value]) -> bool + Send + Sync>),
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ValidatorKind::PerValue(_) => "per-value",
            ValidatorKind::PerCollection(_) => "per-collection",
        };
        f.debug_struct("Validator")
            .field("template", &self.template)
            .field("kind", &kind)
            .finish()
    }
}

/// Substitutes `{placeholder}` occurrences.
fn render(template: &str, substitutions: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (placeholder, replacement) in substitutions {
        out = out.replace(&format!("{{{placeholder}}}"), replacement);
    }
    out
}

/// Runs every validator of every in-scope, operator-provided owner.
pub(crate) fn run(
    schema: &Schema,
    cells: &[ValueCell],
    active: Option<u32>,
    diagnostics: &mut Diagnostics,
) {
    for owner_index in 0..schema.owner_count() {
        let id = OwnerId(owner_index as u32);
        let cell = &cells[owner_index];

        if !cell.is_provided() || !schema.in_scope(id, active) {
            continue;
        }

        let (validators, switches, name) = match schema.owners[owner_index] {
            OwnerKind::Option(idx) => {
                let spec = &schema.options[idx as usize];
                (
                    &spec.validators,
                    spec.rendered_switches(&schema.settings).join(", "),
                    spec.name.clone(),
                )
            }
            OwnerKind::Positional(idx) => {
                let spec = &schema.positionals[idx as usize];
                (
                    &spec.validators,
                    spec.display_name(),
                    spec.name.clone(),
                )
            }
        };

        if validators.is_empty() {
            continue;
        }

        let display = schema.display_of(id);
        let collected = cell.collected();
        trace!(owner = %name, validators = validators.len(), "validating");

        for validator in validators {
            match &validator.kind {
                ValidatorKind::PerValue(predicate) => {
                    for value in &collected {
                        if predicate(value) {
                            continue;
                        }

                        let message = render(
                            &validator.template,
                            &[
                                ("value", value.to_string()),
                                ("switches", switches.clone()),
                                ("name", name.clone()),
                            ],
                        );
                        diagnostics.push(invalid(schema, id, cell, value, message));
                    }
                }
                ValidatorKind::PerCollection(predicate) => {
                    if predicate(&collected) {
                        continue;
                    }

                    let count = collected.len().to_string();
                    let message = render(
                        &validator.template,
                        &[
                            ("count", count.clone()),
                            ("value", count),
                            ("option", display.clone()),
                        ],
                    );
                    diagnostics.push(Error::invalid_value(
                        display.clone(),
                        cell.raw_flat().join(" "),
                        message,
                    ));
                }
            }
        }
    }
}

/// Per-value failure, citing the environment when that is where the value
/// came from.
fn invalid(
    schema: &Schema,
    id: OwnerId,
    cell: &ValueCell,
    value: &Value,
    message: String,
) -> Error {
    let display = schema.display_of(id);
    let env = match cell.source {
        crate::source::Source::Environment => {
            schema.opt(id).and_then(|spec| spec.env.clone())
        }
        _ => None,
    };

    match env {
        Some(env) => Error::invalid_env_value(display, env, value.to_string(), message),
        None => Error::invalid_value(display, value.to_string(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_placeholders() {
        let rendered = render(
            "value {value} for {name} ({switches})",
            &[
                ("value", "11".to_string()),
                ("name", "port".to_string()),
                ("switches", "--port, -p".to_string()),
            ],
        );
        assert_eq!(rendered, "value 11 for port (--port, -p)");
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let rendered = render("{value} {unknown}", &[("value", "1".to_string())]);
        assert_eq!(rendered, "1 {unknown}");
    }
}
