//! The token-to-cell parser and the parse pipeline.
//!
//! Single pass over the classified token stream with a cursor into the
//! active domain's positional schedule. Domain selection happens at most
//! once, on the first positional candidate. An eager switch (help/version)
//! short-circuits the whole pipeline the moment it is bound.

use tracing::{debug, trace};

use crate::binder;
use crate::cell::ValueCell;
use crate::error::{Diagnostics, Error};
use crate::evaluate;
use crate::outcome::{Matches, Outcome};
use crate::provider::Providers;
use crate::schema::handle::OwnerId;
use crate::schema::registry::Schema;
use crate::schema::spec::{EagerAction, OptionSpec, ValuePolicy};
use crate::source::Source;
use crate::suggest::rank_candidates;
use crate::tokens::{self, Tok};
use crate::validate;
use crate::value::Value;

/// Runs the full pipeline for one argument vector.
pub(crate) fn run(schema: &Schema, args: Vec<String>, providers: &Providers<'_>) -> Outcome {
    // A schema with construction errors fails fast, before any token is
    // read.
    if !schema.construction_errors.is_empty() {
        return Outcome::Failed {
            errors: vec![Error::SchemaInvalid {
                problems: schema.construction_errors.clone(),
            }],
        };
    }

    let toks = match tokens::tokenize(args, providers.files, &schema.settings) {
        Ok(toks) => toks,
        Err(error) => {
            return Outcome::Failed {
                errors: vec![error],
            };
        }
    };

    let mut state = ParseState::new(schema);

    if let Some(action) = state.parse(&toks) {
        let domain = state
            .active
            .map(|idx| schema.domain_name(idx).to_string());
        debug!(?action, ?domain, "eager short-circuit");

        return match action {
            EagerAction::ShowHelp => Outcome::Help {
                snapshot: schema.snapshot().clone(),
                domain,
            },
            EagerAction::ShowVersion => Outcome::Version {
                snapshot: schema.snapshot().clone(),
            },
        };
    }

    let ParseState {
        mut cells,
        active,
        domain_candidate,
        mut diagnostics,
        ..
    } = state;

    // Fixed stage ordering: parser errors claim "first" before the
    // binder, validator and evaluator get a turn.
    if diagnostics.stage_may_continue() {
        binder::bind_environment(schema, &mut cells, active, providers, &mut diagnostics);
        binder::apply_defaults(schema, &mut cells, active);
    }

    if diagnostics.stage_may_continue() {
        validate::run(schema, &cells, active, &mut diagnostics);
    }

    let mut constraint_violations = 0;
    if diagnostics.stage_may_continue() {
        constraint_violations = evaluate::run(schema, &cells, active, &mut diagnostics);
    }

    let mut errors = diagnostics.into_errors();

    // Root-mode constraint failures against a schema with selectable
    // domains usually mean the operator misspelled the command word.
    if constraint_violations > 0 && active.is_none() && schema.has_selectable_domains() {
        if let Some(candidate) = domain_candidate {
            let candidates = schema.domain_candidates();
            let suggestions = if schema.settings.suggestions {
                rank_candidates(
                    &candidate,
                    candidates.iter().map(String::as_str),
                    schema.settings.max_edit_distance,
                )
            } else {
                Vec::new()
            };
            errors.insert(0, Error::unknown_domain(candidate, suggestions));

            let limit = if schema.settings.aggregate_errors {
                schema.settings.max_errors.max(1)
            } else {
                1
            };
            errors.truncate(limit);
        }
    }

    if errors.is_empty() {
        Outcome::Parsed(Matches::from_parts(schema, cells, active))
    } else {
        Outcome::Failed { errors }
    }
}

/// Mutable state of one parsing pass.
struct ParseState<'s> {
    schema: &'s Schema,
    cells: Vec<ValueCell>,
    active: Option<u32>,
    selection_attempted: bool,
    domain_candidate: Option<String>,
    schedule: Vec<OwnerId>,
    schedule_pos: usize,
    diagnostics: Diagnostics,
}

impl<'s> ParseState<'s> {
    fn new(schema: &'s Schema) -> Self {
        let cells = (0..schema.owner_count())
            .map(|idx| ValueCell::new(schema.shape_of(OwnerId(idx as u32))))
            .collect();

        Self {
            schema,
            cells,
            active: None,
            selection_attempted: false,
            domain_candidate: None,
            schedule: schema.schedule(None),
            schedule_pos: 0,
            diagnostics: Diagnostics::new(
                schema.settings.max_errors,
                schema.settings.aggregate_errors,
            ),
        }
    }

    /// Consumes the token stream. Returns the eager action when one was
    /// bound.
    fn parse(&mut self, toks: &[Tok]) -> Option<EagerAction> {
        let mut i = 0;

        while i < toks.len() {
            match &toks[i] {
                Tok::Sentinel => {}

                Tok::Long {
                    text,
                    name,
                    attached,
                } => {
                    if let Some(action) =
                        self.bind_long(text, name, attached.as_deref(), toks, &mut i)
                    {
                        return Some(action);
                    }
                }

                Tok::Short { text, chars } => {
                    if let Some(action) = self.bind_cluster(text, chars, toks, &mut i) {
                        return Some(action);
                    }
                }

                Tok::Plain(text) => self.bind_positional(text.clone()),
            }

            i += 1;
        }

        None
    }

    // ------------------------------------------------------------------
    // Switch binding
    // ------------------------------------------------------------------

    fn bind_long(
        &mut self,
        text: &str,
        name: &str,
        attached: Option<&str>,
        toks: &[Tok],
        i: &mut usize,
    ) -> Option<EagerAction> {
        let target = match self.schema.long_index.get(name) {
            Some(target) => *target,
            None => {
                self.unknown_switch(text);
                return None;
            }
        };

        if !self.schema.in_scope(target.owner, self.active) {
            self.unknown_switch(text);
            return None;
        }

        let spec = self
            .schema
            .opt(target.owner)
            .expect("long switches resolve to options");

        if let Some(action) = spec.eager {
            return Some(action);
        }

        if target.negated {
            match attached {
                Some(value) => self.diagnostics.push(Error::invalid_value(
                    text,
                    value,
                    "flag takes no value",
                )),
                None => self.cells[target.owner.index()].bind_flag(text, false, Source::User),
            }
            return None;
        }

        self.bind_option(target.owner, spec, text, attached, toks, i);
        None
    }

    fn bind_cluster(
        &mut self,
        text: &str,
        chars: &str,
        toks: &[Tok],
        i: &mut usize,
    ) -> Option<EagerAction> {
        let cluster: Vec<char> = chars.chars().collect();

        // Clustering only applies when the first character resolves.
        if cluster
            .first()
            .is_none_or(|ch| !self.schema.short_index.contains_key(ch))
        {
            self.unknown_switch(text);
            return None;
        }

        let prefix = self.schema.settings.short_prefix.unwrap_or('-');
        let mut pos = 0;

        while pos < cluster.len() {
            let ch = cluster[pos];
            let rendered = format!("{prefix}{ch}");

            // An attached value can only follow a value-taking switch;
            // `-v=x` against a flag is an error, not a cluster.
            if pos > 0 && self.schema.settings.value_separators.contains(&ch) {
                let rest: String = cluster[pos + 1..].iter().collect();
                self.diagnostics.push(Error::invalid_value(
                    text,
                    rest,
                    "flag takes no value",
                ));
                return None;
            }

            let owner = match self.schema.short_index.get(&ch) {
                Some(owner) => *owner,
                None => {
                    self.unknown_switch(&rendered);
                    pos += 1;
                    continue;
                }
            };

            if !self.schema.in_scope(owner, self.active) {
                self.unknown_switch(&rendered);
                pos += 1;
                continue;
            }

            let spec = self
                .schema
                .opt(owner)
                .expect("short switches resolve to options");

            if let Some(action) = spec.eager {
                return Some(action);
            }

            match spec.policy {
                ValuePolicy::FlagOnly => {
                    self.cells[owner.index()].bind_flag(&rendered, true, Source::User);
                    pos += 1;
                }

                _ => {
                    // The remaining characters become the value, even when
                    // they would match other short switches. A leading
                    // separator is dropped (`-o=v` carries the value `v`)
                    // but separators later on are ordinary characters
                    // (`-Da=1` carries `a=1`).
                    let remainder: String = cluster[pos + 1..].iter().collect();
                    let inline = match remainder.chars().next() {
                        Some(first)
                            if self.schema.settings.value_separators.contains(&first) =>
                        {
                            Some(remainder[first.len_utf8()..].to_string())
                        }
                        Some(_) => Some(remainder),
                        None => None,
                    };

                    self.bind_option(owner, spec, &rendered, inline.as_deref(), toks, i);
                    return None;
                }
            }
        }

        None
    }

    /// Binds one occurrence of a value-carrying option.
    fn bind_option(
        &mut self,
        owner: OwnerId,
        spec: &OptionSpec,
        switch: &str,
        attached: Option<&str>,
        toks: &[Tok],
        i: &mut usize,
    ) {
        match spec.policy {
            ValuePolicy::FlagOnly => match attached {
                Some(value) => self.diagnostics.push(Error::invalid_value(
                    switch,
                    value,
                    "flag takes no value",
                )),
                None => self.cells[owner.index()].bind_flag(switch, true, Source::User),
            },

            ValuePolicy::OptionalValue => match attached {
                Some(value) => self.convert_and_bind(owner, spec, switch, value),
                None => {
                    let presence = spec
                        .presence
                        .clone()
                        .unwrap_or(Value::Bool(true));
                    self.cells[owner.index()].bind_value(switch, presence, Source::User);
                }
            },

            ValuePolicy::RequiresValue => {
                if let crate::cell::CellShape::Fixed(n) = self.cells[owner.index()].shape() {
                    self.bind_fixed(owner, spec, switch, attached, n, toks, i);
                    return;
                }

                let value = match attached {
                    Some(value) => Some(value.to_string()),
                    None => match toks.get(*i + 1) {
                        Some(Tok::Plain(next)) => {
                            *i += 1;
                            Some(next.clone())
                        }
                        _ => None,
                    },
                };

                match value {
                    Some(value) => self.convert_and_bind(owner, spec, switch, &value),
                    None => self.diagnostics.push(Error::missing_value(
                        switch,
                        spec.value_name.clone().or_else(|| {
                            Some(spec.converter.describe().to_string())
                        }),
                    )),
                }
            }
        }
    }

    /// Consumes exactly `n` values for one fixed-arity occurrence.
    fn bind_fixed(
        &mut self,
        owner: OwnerId,
        spec: &OptionSpec,
        switch: &str,
        attached: Option<&str>,
        n: usize,
        toks: &[Tok],
        i: &mut usize,
    ) {
        let mut raws: Vec<String> = Vec::with_capacity(n);
        if let Some(value) = attached {
            raws.push(value.to_string());
        }

        while raws.len() < n {
            match toks.get(*i + 1) {
                Some(Tok::Plain(next)) => {
                    *i += 1;
                    raws.push(next.clone());
                }
                _ => break,
            }
        }

        if raws.len() < n {
            self.diagnostics.push(Error::missing_value(
                switch,
                Some(format!("{n} values ({})", spec.converter.describe())),
            ));
            return;
        }

        let mut values = Vec::with_capacity(n);
        let mut failed = false;
        for raw in &raws {
            match spec.converter.convert(raw) {
                Ok(value) => values.push(value),
                Err(reason) => {
                    failed = true;
                    self.diagnostics
                        .push(Error::invalid_value(switch, raw.clone(), reason));
                }
            }
        }

        if !failed {
            self.cells[owner.index()].bind_tuple(raws, values, Source::User);
        }
    }

    fn convert_and_bind(&mut self, owner: OwnerId, spec: &OptionSpec, switch: &str, raw: &str) {
        match spec.converter.convert(raw) {
            Ok(value) => {
                trace!(owner = %spec.name, %raw, "bound option value");
                self.cells[owner.index()].bind_value(raw, value, Source::User);
            }
            Err(reason) => {
                self.diagnostics
                    .push(Error::invalid_value(switch, raw, reason));
            }
        }
    }

    fn unknown_switch(&mut self, text: &str) {
        if self.schema.settings.unknown_as_positionals {
            self.bind_positional(text.to_string());
            return;
        }

        let suggestions = if self.schema.settings.suggestions {
            let candidates = self.schema.switch_candidates(self.active);
            rank_candidates(
                text,
                candidates.iter().map(String::as_str),
                self.schema.settings.max_edit_distance,
            )
        } else {
            Vec::new()
        };

        self.diagnostics.push(Error::unknown_option(text, suggestions));
    }

    // ------------------------------------------------------------------
    // Positional binding
    // ------------------------------------------------------------------

    fn bind_positional(&mut self, text: String) {
        // Domain selection: first positional candidate only, at most once.
        if self.active.is_none() && !self.selection_attempted {
            self.selection_attempted = true;

            if let Some(&idx) = self.schema.selector_index.get(text.as_str()) {
                self.active = Some(idx);
                self.schedule = self.schema.schedule(self.active);
                self.schedule_pos = 0;
                debug!(domain = %self.schema.domain_name(idx), "domain selected");
                return;
            }

            self.domain_candidate = Some(text.clone());
        }

        let slot = match self.schedule.get(self.schedule_pos) {
            Some(slot) => *slot,
            None => {
                self.diagnostics
                    .push(Error::UnexpectedPositional { token: text });
                return;
            }
        };

        let spec = self
            .schema
            .pos(slot)
            .expect("schedule yields positionals");
        let variadic = spec.arity.is_variadic();

        match spec.converter.convert(&text) {
            Ok(value) => {
                trace!(owner = %spec.name, raw = %text, "bound positional");
                self.cells[slot.index()].bind_value(&text, value, Source::User);
            }
            Err(reason) => {
                self.diagnostics.push(Error::invalid_value(
                    spec.display_name(),
                    text,
                    reason,
                ));
            }
        }

        // A variadic slot greedily consumes every remaining positional.
        if !variadic {
            self.schedule_pos += 1;
        }
    }
}
