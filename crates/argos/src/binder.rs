//! Environment fallback and default binding.
//!
//! Runs after token parsing: each in-scope option with an environment name
//! whose cell is still missing is looked up through the environment
//! provider. Defaults run last, and only for cells no other source
//! reached — the default producer is never invoked otherwise.

use tracing::{debug, trace};

use crate::cell::{CellShape, ValueCell};
use crate::error::{Diagnostics, Error};
use crate::provider::Providers;
use crate::schema::handle::OwnerId;
use crate::schema::registry::Schema;
use crate::schema::spec::OwnerKind;
use crate::source::Source;
use crate::tokens::split_quoted;

/// Populates missing cells from the environment provider.
pub(crate) fn bind_environment(
    schema: &Schema,
    cells: &mut [ValueCell],
    active: Option<u32>,
    providers: &Providers<'_>,
    diagnostics: &mut Diagnostics,
) {
    for owner_index in 0..schema.owner_count() {
        let id = OwnerId(owner_index as u32);
        let spec = match schema.owners[owner_index] {
            OwnerKind::Option(idx) => &schema.options[idx as usize],
            OwnerKind::Positional(_) => continue,
        };

        let env_name = match &spec.env {
            Some(name) => name.clone(),
            None => continue,
        };

        if cells[owner_index].source != Source::Missing || !schema.in_scope(id, active) {
            continue;
        }

        let raw = match providers.env.var(&env_name) {
            Some(raw) => raw,
            None => continue,
        };

        trace!(owner = %spec.name, env = %env_name, "binding from environment");
        let display = spec.display_name(&schema.settings);
        let cell = &mut cells[owner_index];

        match cell.shape() {
            CellShape::Scalar => match spec.converter.convert(&raw) {
                Ok(value) => cell.bind_value(&raw, value, Source::Environment),
                Err(reason) => diagnostics.push(Error::invalid_env_value(
                    display, env_name, raw, reason,
                )),
            },

            // Counters accept a boolean token; a truthy value counts one
            // occurrence, a falsy one leaves the cell missing.
            CellShape::Count => match spec.converter.convert(&raw) {
                Ok(value) => {
                    if value.to_bool() == Some(true) {
                        cell.bind_flag(&raw, true, Source::Environment);
                    }
                }
                Err(reason) => diagnostics.push(Error::invalid_env_value(
                    display, env_name, raw, reason,
                )),
            },

            CellShape::List | CellShape::Set => {
                let elements = match split_quoted(&raw) {
                    Ok(elements) => elements,
                    Err(reason) => {
                        diagnostics.push(Error::invalid_env_value(
                            display, env_name, raw, reason,
                        ));
                        continue;
                    }
                };

                for element in elements {
                    match spec.converter.convert(&element) {
                        Ok(value) => {
                            cell.bind_value(&element, value, Source::Environment);
                        }
                        Err(reason) => diagnostics.push(Error::invalid_env_value(
                            display.clone(),
                            env_name.clone(),
                            element,
                            reason,
                        )),
                    }
                }
            }

            CellShape::Fixed(n) => {
                let elements = match split_quoted(&raw) {
                    Ok(elements) => elements,
                    Err(reason) => {
                        diagnostics.push(Error::invalid_env_value(
                            display, env_name, raw, reason,
                        ));
                        continue;
                    }
                };

                if elements.len() != n {
                    diagnostics.push(Error::invalid_env_value(
                        display,
                        env_name,
                        raw,
                        format!("expected {n} whitespace-separated values"),
                    ));
                    continue;
                }

                let mut values = Vec::with_capacity(n);
                let mut failed = false;
                for element in &elements {
                    match spec.converter.convert(element) {
                        Ok(value) => values.push(value),
                        Err(reason) => {
                            failed = true;
                            diagnostics.push(Error::invalid_env_value(
                                display.clone(),
                                env_name.clone(),
                                element.clone(),
                                reason,
                            ));
                        }
                    }
                }

                if !failed {
                    cell.bind_tuple(elements, values, Source::Environment);
                }
            }
        }
    }
}

/// Binds default producers to the cells no other source reached.
pub(crate) fn apply_defaults(schema: &Schema, cells: &mut [ValueCell], active: Option<u32>) {
    let mut applied = 0usize;

    for owner_index in 0..schema.owner_count() {
        let id = OwnerId(owner_index as u32);
        let spec = match schema.owners[owner_index] {
            OwnerKind::Option(idx) => &schema.options[idx as usize],
            OwnerKind::Positional(_) => continue,
        };

        let producer = match &spec.default {
            Some(producer) => producer,
            None => continue,
        };

        if cells[owner_index].source != Source::Missing || !schema.in_scope(id, active) {
            continue;
        }

        cells[owner_index].bind_default(producer());
        applied += 1;
    }

    if applied > 0 {
        debug!(applied, "bound default values");
    }
}
