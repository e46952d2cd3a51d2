//! Constraint evaluation over the bound cells.
//!
//! The active constraint set is the schema-level records plus those of the
//! active domain and every domain it transitively inherits. Presence means
//! operator-provided: a value with `default` source never satisfies a
//! presence condition.

use tracing::debug;

use crate::cell::ValueCell;
use crate::error::{Diagnostics, Error, GroupKind};
use crate::schema::constraint::{CondMode, Constraint};
use crate::schema::handle::OwnerId;
use crate::schema::registry::Schema;

/// Evaluates every active constraint. Returns the number of violations
/// found (before capping), so the pipeline can tell whether root-mode
/// failures warrant an unknown-domain diagnostic.
pub(crate) fn run(
    schema: &Schema,
    cells: &[ValueCell],
    active: Option<u32>,
    diagnostics: &mut Diagnostics,
) -> usize {
    let mut violations = 0;

    let present = |id: OwnerId| cells[id.index()].is_provided();
    let count = |id: OwnerId| cells[id.index()].count;

    // Implicit requirements from per-spec minimums.
    for owner_index in 0..schema.owner_count() {
        let id = OwnerId(owner_index as u32);
        let minimum = schema.min_required_of(id);
        if minimum == 0 || !schema.in_scope(id, active) {
            continue;
        }

        if count(id) < minimum {
            violations += 1;
            diagnostics.push(Error::missing_required(
                schema.display_of(id),
                minimum,
                None,
            ));
        }
    }

    let constraints = schema.active_constraints(active);
    debug!(
        active = active.map(|idx| schema.domain_name(idx)),
        constraints = constraints.len(),
        "evaluating constraints"
    );

    for (constraint, domain) in constraints {
        let domain = domain.map(ToString::to_string);

        match constraint {
            Constraint::Require(owner) => {
                if !schema.in_scope(*owner, active) {
                    continue;
                }
                let minimum = schema.min_required_of(*owner).max(1);
                if count(*owner) < minimum {
                    violations += 1;
                    diagnostics.push(Error::missing_required(
                        schema.display_of(*owner),
                        minimum,
                        domain,
                    ));
                }
            }

            Constraint::RequireIf { owner, mode, refs } => {
                if !schema.in_scope(*owner, active) {
                    continue;
                }

                let triggered = match mode {
                    CondMode::AnyPresent => refs.iter().any(|r| present(*r)),
                    CondMode::AllPresent => {
                        !refs.is_empty() && refs.iter().all(|r| present(*r))
                    }
                    CondMode::AnyAbsent => refs.iter().any(|r| !present(*r)),
                    CondMode::AllAbsent => refs.iter().all(|r| !present(*r)),
                };

                if triggered && !present(*owner) {
                    violations += 1;
                    let triggers: Vec<String> =
                        refs.iter().map(|r| schema.display_of(*r)).collect();
                    diagnostics.push(Error::ConditionalRequirement {
                        option: schema.display_of(*owner),
                        condition: describe_condition(*mode, &triggers),
                        triggers,
                        domain,
                    });
                }
            }

            Constraint::RequireIfValue {
                owner,
                reference,
                predicate,
            } => {
                if !schema.in_scope(*owner, active) {
                    continue;
                }

                let reference_cell = &cells[reference.index()];
                let triggered = reference_cell.is_provided()
                    && reference_cell
                        .scalar()
                        .is_some_and(|value| predicate.matches(value));

                if triggered && !present(*owner) {
                    violations += 1;
                    diagnostics.push(Error::ConditionalRequirement {
                        option: schema.display_of(*owner),
                        condition: predicate.condition.clone(),
                        triggers: vec![schema.display_of(*reference)],
                        domain,
                    });
                }
            }

            Constraint::Group { kind, members } => {
                let bound: Vec<OwnerId> =
                    members.iter().copied().filter(|m| present(*m)).collect();

                let violated = match kind {
                    GroupKind::ExactlyOne => bound.len() != 1,
                    GroupKind::AtMostOne => bound.len() > 1,
                    GroupKind::AtLeastOne => bound.is_empty(),
                };

                if violated {
                    violations += 1;
                    diagnostics.push(Error::group_violation(
                        *kind,
                        members.iter().map(|m| schema.display_of(*m)).collect(),
                        bound.iter().map(|m| schema.display_of(*m)).collect(),
                        domain,
                    ));
                }
            }

            Constraint::Conflict { members } => {
                let bound: Vec<OwnerId> =
                    members.iter().copied().filter(|m| present(*m)).collect();

                if bound.len() > 1 {
                    violations += 1;
                    diagnostics.push(Error::Conflict {
                        bound: bound.iter().map(|m| schema.display_of(*m)).collect(),
                        domain,
                    });
                }
            }
        }
    }

    violations
}

fn describe_condition(mode: CondMode, triggers: &[String]) -> String {
    let listed = triggers.join(", ");
    match (mode, triggers.len()) {
        (CondMode::AnyPresent, 1) => format!("when '{listed}' is provided"),
        (CondMode::AnyPresent, _) => format!("when any of ({listed}) is provided"),
        (CondMode::AllPresent, 1) => format!("when '{listed}' is provided"),
        (CondMode::AllPresent, _) => format!("when all of ({listed}) are provided"),
        (CondMode::AnyAbsent, 1) => format!("when '{listed}' is missing"),
        (CondMode::AnyAbsent, _) => format!("when any of ({listed}) is missing"),
        (CondMode::AllAbsent, 1) => format!("when '{listed}' is missing"),
        (CondMode::AllAbsent, _) => format!("when none of ({listed}) are provided"),
    }
}
