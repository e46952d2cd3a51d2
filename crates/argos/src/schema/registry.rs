//! The sealed schema: spec catalog, switch indices, inheritance closures,
//! construction-time validation and snapshot capture.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::cell::CellShape;
use crate::error::SchemaError;
use crate::outcome::Outcome;
use crate::parser;
use crate::provider::Providers;
use crate::schema::builder::SchemaBuilder;
use crate::schema::constraint::Constraint;
use crate::schema::handle::OwnerId;
use crate::schema::spec::{DomainSpec, OptionSpec, OwnerKind, PositionalSpec, SwitchForm};
use crate::settings::Settings;
use crate::snapshot::{
    ConstraintInfo, DomainInfo, OptionInfo, PositionalInfo, Snapshot,
};

/// Resolution of a long switch literal.
#[derive(Clone, Copy, Debug)]
pub(crate) struct LongTarget {
    pub owner: OwnerId,
    /// The literal is a derived negation form.
    pub negated: bool,
}

/// Everything the builder hands over for sealing.
pub(crate) struct RawSchema {
    pub settings: Settings,
    pub options: Vec<OptionSpec>,
    pub positionals: Vec<PositionalSpec>,
    pub domains: Vec<DomainSpec>,
    pub global_constraints: Vec<Constraint>,
    pub owners: Vec<OwnerKind>,
    pub pending_errors: Vec<SchemaError>,
}

/// A sealed CLI description.
///
/// Immutable after construction and safe to share across threads; each parse
/// invocation owns its own cells and diagnostics. Construction problems are
/// captured on the snapshot rather than thrown — a parse against a broken
/// schema fails fast with a `schema-invalid` error.
pub struct Schema {
    pub(crate) settings: Settings,
    pub(crate) options: Vec<OptionSpec>,
    pub(crate) positionals: Vec<PositionalSpec>,
    pub(crate) domains: Vec<DomainSpec>,
    pub(crate) global_constraints: Vec<Constraint>,
    pub(crate) owners: Vec<OwnerKind>,
    pub(crate) long_index: HashMap<String, LongTarget>,
    pub(crate) short_index: HashMap<char, OwnerId>,
    pub(crate) selector_index: HashMap<String, u32>,
    pub(crate) closures: Vec<Vec<u32>>,
    pub(crate) construction_errors: Vec<SchemaError>,
    snapshot: Snapshot,
}

impl std::fmt::Debug for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Schema")
            .field("options", &self.options.len())
            .field("positionals", &self.positionals.len())
            .field("domains", &self.domains.len())
            .field("construction_errors", &self.construction_errors)
            .finish_non_exhaustive()
    }
}

impl Schema {
    /// Starts a new schema description.
    #[must_use]
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// Parses an argument vector with the OS-backed providers.
    pub fn parse<I, S>(&self, args: I) -> Outcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse_with(args, &Providers::default())
    }

    /// Parses an argument vector with explicit providers.
    pub fn parse_with<I, S>(&self, args: I, providers: &Providers<'_>) -> Outcome
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        parser::run(self, args, providers)
    }

    /// The frozen schema description.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    // ------------------------------------------------------------------
    // Internal accessors
    // ------------------------------------------------------------------

    pub(crate) fn owner_count(&self) -> usize {
        self.owners.len()
    }

    pub(crate) fn opt(&self, id: OwnerId) -> Option<&OptionSpec> {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => Some(&self.options[idx as usize]),
            OwnerKind::Positional(_) => None,
        }
    }

    pub(crate) fn pos(&self, id: OwnerId) -> Option<&PositionalSpec> {
        match self.owners[id.index()] {
            OwnerKind::Positional(idx) => Some(&self.positionals[idx as usize]),
            OwnerKind::Option(_) => None,
        }
    }

    pub(crate) fn owner_name(&self, id: OwnerId) -> &str {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => &self.options[idx as usize].name,
            OwnerKind::Positional(idx) => &self.positionals[idx as usize].name,
        }
    }

    /// User-facing display name for diagnostics.
    pub(crate) fn display_of(&self, id: OwnerId) -> String {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => self.options[idx as usize].display_name(&self.settings),
            OwnerKind::Positional(idx) => self.positionals[idx as usize].display_name(),
        }
    }

    pub(crate) fn shape_of(&self, id: OwnerId) -> CellShape {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => {
                CellShape::from_arity(self.options[idx as usize].arity)
            }
            OwnerKind::Positional(idx) => {
                CellShape::from_positional(self.positionals[idx as usize].arity)
            }
        }
    }

    pub(crate) fn min_required_of(&self, id: OwnerId) -> u32 {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => self.options[idx as usize].min_required,
            OwnerKind::Positional(idx) => self.positionals[idx as usize].min_required,
        }
    }

    fn scope_of(&self, id: OwnerId) -> Option<&[u32]> {
        match self.owners[id.index()] {
            OwnerKind::Option(idx) => self.options[idx as usize].scope.as_deref(),
            OwnerKind::Positional(idx) => self.positionals[idx as usize].scope.as_deref(),
        }
    }

    /// Whether the owner is available under the active domain.
    pub(crate) fn in_scope(&self, id: OwnerId, active: Option<u32>) -> bool {
        match self.scope_of(id) {
            None => true,
            Some(scope) => {
                let closure = self.closure(active);
                scope.iter().any(|domain| closure.contains(domain))
            }
        }
    }

    /// The active domain's inheritance closure (self first), or empty for
    /// root mode.
    pub(crate) fn closure(&self, active: Option<u32>) -> &[u32] {
        match active {
            Some(idx) => &self.closures[idx as usize],
            None => &[],
        }
    }

    /// Positional schedule (owner ids) for the active domain, in sequence
    /// order.
    pub(crate) fn schedule(&self, active: Option<u32>) -> Vec<OwnerId> {
        let mut slots: Vec<(u32, OwnerId)> = self
            .owners
            .iter()
            .enumerate()
            .filter_map(|(owner_idx, kind)| match kind {
                OwnerKind::Positional(idx) => {
                    let id = OwnerId(owner_idx as u32);
                    let spec = &self.positionals[*idx as usize];
                    self.in_scope(id, active).then_some((spec.seq, id))
                }
                OwnerKind::Option(_) => None,
            })
            .collect();

        slots.sort_by_key(|(seq, _)| *seq);
        slots.into_iter().map(|(_, id)| id).collect()
    }

    /// All switch tokens visible under the active domain, for suggestions.
    pub(crate) fn switch_candidates(&self, active: Option<u32>) -> Vec<String> {
        self.owners
            .iter()
            .enumerate()
            .filter_map(|(owner_idx, kind)| match kind {
                OwnerKind::Option(idx) => {
                    let id = OwnerId(owner_idx as u32);
                    let spec = &self.options[*idx as usize];
                    self.in_scope(id, active)
                        .then(|| spec.rendered_switches(&self.settings))
                }
                OwnerKind::Positional(_) => None,
            })
            .flatten()
            .collect()
    }

    /// All domain selection tokens, for suggestions.
    pub(crate) fn domain_candidates(&self) -> Vec<String> {
        let mut out = Vec::new();
        for domain in &self.domains {
            if !domain.fragment {
                out.push(domain.name.clone());
                out.extend(domain.aliases.iter().cloned());
            }
        }
        out
    }

    /// Whether any concrete domain exists.
    pub(crate) fn has_selectable_domains(&self) -> bool {
        self.domains.iter().any(|domain| !domain.fragment)
    }

    pub(crate) fn domain_name(&self, idx: u32) -> &str {
        &self.domains[idx as usize].name
    }

    /// The active constraint set: schema-level records, then the active
    /// domain's own, then inherited ones in closure order. Each record is
    /// tagged with its declaring domain's name.
    pub(crate) fn active_constraints(
        &self,
        active: Option<u32>,
    ) -> Vec<(&Constraint, Option<&str>)> {
        let mut out: Vec<(&Constraint, Option<&str>)> = self
            .global_constraints
            .iter()
            .map(|constraint| (constraint, None))
            .collect();

        for &domain_idx in self.closure(active) {
            let domain = &self.domains[domain_idx as usize];
            out.extend(
                domain
                    .constraints
                    .iter()
                    .map(|constraint| (constraint, Some(domain.name.as_str()))),
            );
        }

        out
    }

    // ------------------------------------------------------------------
    // Sealing
    // ------------------------------------------------------------------

    pub(crate) fn finish(raw: RawSchema) -> Self {
        let RawSchema {
            settings,
            options,
            positionals,
            domains,
            global_constraints,
            owners,
            pending_errors,
        } = raw;

        let mut errors = pending_errors;

        check_owner_names(&options, &positionals, &mut errors);
        let (long_index, short_index) =
            index_switches(&options, &owners, &settings, &mut errors);
        let selector_index = index_selectors(&domains, &mut errors);
        let closures = compute_closures(&domains, &mut errors);

        let mut schema = Self {
            settings,
            options,
            positionals,
            domains,
            global_constraints,
            owners,
            long_index,
            short_index,
            selector_index,
            closures,
            construction_errors: errors,
            snapshot: Snapshot {
                settings: Settings::default(),
                domains: Vec::new(),
                options: Vec::new(),
                positionals: Vec::new(),
                constraints: Vec::new(),
                errors: Vec::new(),
            },
        };

        schema.check_schedules();
        schema.snapshot = schema.capture_snapshot();

        debug!(
            options = schema.options.len(),
            positionals = schema.positionals.len(),
            domains = schema.domains.len(),
            errors = schema.construction_errors.len(),
            "schema sealed"
        );

        schema
    }

    /// Validates the positional schedule of root mode and every concrete
    /// domain: at most one variadic, and nothing scheduled after it.
    fn check_schedules(&mut self) {
        let mut contexts: Vec<(String, Option<u32>)> =
            vec![("<root>".to_string(), None)];
        for (idx, domain) in self.domains.iter().enumerate() {
            if !domain.fragment {
                contexts.push((domain.name.clone(), Some(idx as u32)));
            }
        }

        let mut reported: HashSet<(String, String)> = HashSet::new();
        let mut errors = Vec::new();

        for (context, active) in contexts {
            let schedule = self.schedule(active);
            let mut variadic: Option<OwnerId> = None;

            for id in schedule {
                let spec = self.pos(id).expect("schedule yields positionals");
                match variadic {
                    None => {
                        if spec.arity.is_variadic() {
                            variadic = Some(id);
                        }
                    }
                    Some(first) => {
                        let first_name =
                            self.pos(first).expect("positional").name.clone();
                        let pair = (first_name.clone(), spec.name.clone());
                        if !reported.insert(pair) {
                            continue;
                        }

                        if spec.arity.is_variadic() {
                            errors.push(SchemaError::MultipleVariadic {
                                domain: context.clone(),
                                first: first_name,
                                second: spec.name.clone(),
                            });
                        } else {
                            errors.push(SchemaError::PositionalAfterVariadic {
                                positional: spec.name.clone(),
                                variadic: first_name,
                            });
                        }
                    }
                }
            }
        }

        self.construction_errors.extend(errors);
    }

    fn capture_snapshot(&self) -> Snapshot {
        let domain_names = |scope: &Option<Vec<u32>>| -> Option<Vec<String>> {
            scope.as_ref().map(|indices| {
                indices
                    .iter()
                    .map(|&idx| self.domains[idx as usize].name.clone())
                    .collect()
            })
        };

        let options = self
            .options
            .iter()
            .map(|spec| OptionInfo {
                name: spec.name.clone(),
                switches: spec.rendered_switches(&self.settings),
                arity: spec.arity,
                policy: spec.policy,
                eager: spec.eager,
                env: spec.env.clone(),
                hidden: spec.hidden,
                negatable: spec.negatable,
                interactive: spec.interactive,
                has_default: spec.default.is_some(),
                min_required: spec.min_required,
                domains: domain_names(&spec.scope),
                help: spec.help.clone(),
                value_name: spec.value_name.clone(),
            })
            .collect();

        let positionals = self
            .positionals
            .iter()
            .map(|spec| PositionalInfo {
                name: spec.name.clone(),
                arity: spec.arity,
                seq: spec.seq,
                min_required: spec.min_required,
                domains: domain_names(&spec.scope),
                help: spec.help.clone(),
                value_name: spec.value_name.clone(),
            })
            .collect();

        let domains = self
            .domains
            .iter()
            .map(|spec| DomainInfo {
                name: spec.name.clone(),
                aliases: spec.aliases.clone(),
                label: spec.label.clone(),
                description: spec.description.clone(),
                fragment: spec.fragment,
                inherits: spec
                    .parents
                    .iter()
                    .map(|&idx| self.domains[idx as usize].name.clone())
                    .collect(),
            })
            .collect();

        let mut constraints = Vec::new();
        for constraint in &self.global_constraints {
            constraints.push(self.constraint_info(constraint, None));
        }
        for domain in &self.domains {
            for constraint in &domain.constraints {
                constraints.push(self.constraint_info(constraint, Some(domain.name.clone())));
            }
        }

        Snapshot {
            settings: self.settings.clone(),
            domains,
            options,
            positionals,
            constraints,
            errors: self.construction_errors.clone(),
        }
    }

    fn constraint_info(
        &self,
        constraint: &Constraint,
        domain: Option<String>,
    ) -> ConstraintInfo {
        let name = |id: &OwnerId| self.owner_name(*id).to_string();

        match constraint {
            Constraint::Require(owner) => ConstraintInfo::Require {
                owner: name(owner),
                domain,
            },
            Constraint::RequireIf { owner, mode, refs } => ConstraintInfo::Conditional {
                owner: name(owner),
                mode: *mode,
                refs: refs.iter().map(name).collect(),
                domain,
            },
            Constraint::RequireIfValue {
                owner,
                reference,
                predicate,
            } => ConstraintInfo::ConditionalOnValue {
                owner: name(owner),
                reference: name(reference),
                condition: predicate.condition.clone(),
                domain,
            },
            Constraint::Group { kind, members } => ConstraintInfo::Group {
                kind: *kind,
                members: members.iter().map(name).collect(),
                domain,
            },
            Constraint::Conflict { members } => ConstraintInfo::Conflict {
                members: members.iter().map(name).collect(),
                domain,
            },
        }
    }
}

// ============================================================================
// Construction checks
// ============================================================================

fn check_owner_names(
    options: &[OptionSpec],
    positionals: &[PositionalSpec],
    errors: &mut Vec<SchemaError>,
) {
    let mut seen: HashSet<&str> = HashSet::new();
    let names = options
        .iter()
        .map(|spec| spec.name.as_str())
        .chain(positionals.iter().map(|spec| spec.name.as_str()));

    for name in names {
        if !seen.insert(name) {
            errors.push(SchemaError::DuplicateOwner {
                owner: name.to_string(),
            });
        }
    }
}

fn index_switches(
    options: &[OptionSpec],
    owners: &[OwnerKind],
    settings: &Settings,
    errors: &mut Vec<SchemaError>,
) -> (HashMap<String, LongTarget>, HashMap<char, OwnerId>) {
    let mut long_index: HashMap<String, LongTarget> = HashMap::new();
    let mut short_index: HashMap<char, OwnerId> = HashMap::new();
    // owner name per long literal, for collision messages
    let mut long_owner: HashMap<String, String> = HashMap::new();
    let mut short_owner: HashMap<char, String> = HashMap::new();

    let option_owner = |option_idx: usize| -> OwnerId {
        let position = owners
            .iter()
            .position(|kind| matches!(kind, OwnerKind::Option(idx) if *idx as usize == option_idx))
            .expect("every option has an owner id");
        OwnerId(position as u32)
    };

    // Explicit switches first.
    for (option_idx, spec) in options.iter().enumerate() {
        let id = option_owner(option_idx);

        for switch in &spec.switches {
            match switch {
                SwitchForm::Long(name) => {
                    if let Some(first) = long_owner.get(name) {
                        errors.push(SchemaError::DuplicateSwitch {
                            switch: format!("{}{name}", settings.long_prefix),
                            first: first.clone(),
                            second: spec.name.clone(),
                        });
                        continue;
                    }
                    long_owner.insert(name.clone(), spec.name.clone());
                    long_index.insert(name.clone(), LongTarget { owner: id, negated: false });
                }
                SwitchForm::Short(ch) => {
                    if let Some(first) = short_owner.get(ch) {
                        let prefix = settings.short_prefix.map(String::from).unwrap_or_default();
                        errors.push(SchemaError::DuplicateSwitch {
                            switch: format!("{prefix}{ch}"),
                            first: first.clone(),
                            second: spec.name.clone(),
                        });
                        continue;
                    }
                    short_owner.insert(*ch, spec.name.clone());
                    short_index.insert(*ch, id);
                }
            }
        }
    }

    // Derived negation switches may not collide with anything explicit.
    for (option_idx, spec) in options.iter().enumerate() {
        if !spec.negatable {
            continue;
        }
        let id = option_owner(option_idx);

        for switch in &spec.switches {
            if let SwitchForm::Long(name) = switch {
                let negated = format!("{}{name}", settings.negation_prefix);
                if long_owner.contains_key(&negated) {
                    errors.push(SchemaError::NegationCollision {
                        switch: format!("{}{negated}", settings.long_prefix),
                        owner: spec.name.clone(),
                    });
                    continue;
                }
                long_owner.insert(negated.clone(), spec.name.clone());
                long_index.insert(negated, LongTarget { owner: id, negated: true });
            }
        }
    }

    (long_index, short_index)
}

fn index_selectors(
    domains: &[DomainSpec],
    errors: &mut Vec<SchemaError>,
) -> HashMap<String, u32> {
    let mut index: HashMap<String, u32> = HashMap::new();
    let mut first_owner: HashMap<String, String> = HashMap::new();

    for (idx, domain) in domains.iter().enumerate() {
        if domain.fragment {
            if !domain.aliases.is_empty() {
                errors.push(SchemaError::FragmentAlias {
                    domain: domain.name.clone(),
                });
            }
            continue;
        }

        let selectors =
            std::iter::once(&domain.name).chain(domain.aliases.iter());
        for selector in selectors {
            if let Some(first) = first_owner.get(selector) {
                errors.push(SchemaError::DuplicateDomainSelector {
                    selector: selector.clone(),
                    first: first.clone(),
                    second: domain.name.clone(),
                });
                continue;
            }
            first_owner.insert(selector.clone(), domain.name.clone());
            index.insert(selector.clone(), idx as u32);
        }
    }

    index
}

/// Depth-first cycle detection plus closure computation.
///
/// Closures list each domain first, then its ancestry in declaration-order
/// depth-first preorder, each domain once. Cycles are reported naming the
/// offending path and broken by the visited set so closure computation
/// terminates.
fn compute_closures(
    domains: &[DomainSpec],
    errors: &mut Vec<SchemaError>,
) -> Vec<Vec<u32>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    fn detect(
        node: u32,
        domains: &[DomainSpec],
        colors: &mut [Color],
        path: &mut Vec<u32>,
        cycles: &mut Vec<Vec<u32>>,
    ) {
        colors[node as usize] = Color::Gray;
        path.push(node);

        for &parent in &domains[node as usize].parents {
            match colors[parent as usize] {
                Color::White => detect(parent, domains, colors, path, cycles),
                Color::Gray => {
                    let start = path
                        .iter()
                        .position(|&n| n == parent)
                        .unwrap_or(0);
                    let mut cycle: Vec<u32> = path[start..].to_vec();
                    cycle.push(parent);
                    cycles.push(cycle);
                }
                Color::Black => {}
            }
        }

        path.pop();
        colors[node as usize] = Color::Black;
    }

    let mut colors = vec![Color::White; domains.len()];
    let mut cycles = Vec::new();
    for idx in 0..domains.len() {
        if colors[idx] == Color::White {
            detect(
                idx as u32,
                domains,
                &mut colors,
                &mut Vec::new(),
                &mut cycles,
            );
        }
    }

    let mut seen_cycles: HashSet<Vec<String>> = HashSet::new();
    for cycle in cycles {
        let named: Vec<String> = cycle
            .iter()
            .map(|&idx| domains[idx as usize].name.clone())
            .collect();
        if seen_cycles.insert(named.clone()) {
            errors.push(SchemaError::InheritanceCycle { cycle: named });
        }
    }

    // Closure with a visited set, immune to the (already reported) cycles.
    fn collect(
        node: u32,
        domains: &[DomainSpec],
        visited: &mut HashSet<u32>,
        out: &mut Vec<u32>,
    ) {
        if !visited.insert(node) {
            return;
        }
        out.push(node);
        for &parent in &domains[node as usize].parents {
            collect(parent, domains, visited, out);
        }
    }

    (0..domains.len() as u32)
        .map(|idx| {
            let mut out = Vec::new();
            collect(idx, domains, &mut HashSet::new(), &mut out);
            out
        })
        .collect()
}
