//! Per-parse value cells: raw occurrences, typed containers, provenance.

use crate::schema::spec::{Arity, PositionalArity};
use crate::source::Source;
use crate::value::{KeyValue, Value};

/// Container shape a cell was created with.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum CellShape {
    Scalar,
    List,
    Set,
    Count,
    Fixed(usize),
}

impl CellShape {
    pub(crate) fn from_arity(arity: Arity) -> Self {
        match arity {
            Arity::Scalar => Self::Scalar,
            Arity::List => Self::List,
            Arity::Set => Self::Set,
            Arity::Count => Self::Count,
            Arity::Fixed(n) => Self::Fixed(n),
        }
    }

    pub(crate) fn from_positional(arity: PositionalArity) -> Self {
        match arity {
            PositionalArity::Single => Self::Scalar,
            PositionalArity::List => Self::List,
            PositionalArity::Set => Self::Set,
        }
    }
}

/// Typed container of a cell.
#[derive(Clone, Debug)]
pub(crate) enum CellData {
    /// No value bound yet. Distinguishable from an empty collection.
    Unset,
    Scalar(Value),
    List(Vec<Value>),
    /// Deduplicated; raw tokens kept for host-typed equality fallback.
    Set(Vec<(String, Value)>),
    Count(u64),
    Fixed(Vec<Vec<Value>>),
}

/// One owner's parse state.
#[derive(Clone, Debug)]
pub(crate) struct ValueCell {
    shape: CellShape,
    /// Raw strings per occurrence; fixed-arity occurrences are tuples.
    pub raw: Vec<Vec<String>>,
    pub data: CellData,
    pub source: Source,
    /// Occurrence count; for collections this can exceed the stored
    /// element count (sets deduplicate).
    pub count: u32,
}

impl ValueCell {
    pub(crate) fn new(shape: CellShape) -> Self {
        Self {
            shape,
            raw: Vec::new(),
            data: CellData::Unset,
            source: Source::Missing,
            count: 0,
        }
    }

    pub(crate) fn shape(&self) -> CellShape {
        self.shape
    }

    /// Sources only move up the ladder; assignment from a weaker source is
    /// a caller bug and ignored.
    fn raise_source(&mut self, source: Source) {
        if source.rank() >= self.source.rank() {
            self.source = source;
        }
    }

    /// Binds one occurrence carrying a single value.
    ///
    /// Scalar cells replace their value (last one wins); collections
    /// append or deduplicate.
    pub(crate) fn bind_value(&mut self, raw: &str, value: Value, source: Source) {
        self.raw.push(vec![raw.to_string()]);
        self.count += 1;
        self.raise_source(source);

        match (&mut self.data, self.shape) {
            (data @ CellData::Unset, CellShape::Scalar) | (data @ CellData::Scalar(_), _) => {
                *data = CellData::Scalar(value);
            }
            (CellData::List(items), _) => items.push(value),
            (data @ CellData::Unset, CellShape::List) => {
                *data = CellData::List(vec![value]);
            }
            (CellData::Set(items), _) => insert_deduped(items, raw, value),
            (data @ CellData::Unset, CellShape::Set) => {
                *data = CellData::Set(vec![(raw.to_string(), value)]);
            }
            _ => {
                debug_assert!(false, "bind_value against incompatible cell shape");
            }
        }
    }

    /// Binds one flag occurrence: counters increment, boolean scalars set.
    pub(crate) fn bind_flag(&mut self, raw: &str, value: bool, source: Source) {
        self.raw.push(vec![raw.to_string()]);
        self.count += 1;
        self.raise_source(source);

        match (&mut self.data, self.shape) {
            (CellData::Count(n), _) => *n += 1,
            (data @ CellData::Unset, CellShape::Count) => {
                *data = CellData::Count(1);
            }
            (data, _) => *data = CellData::Scalar(Value::Bool(value)),
        }
    }

    /// Binds one fixed-arity occurrence tuple.
    pub(crate) fn bind_tuple(&mut self, raw: Vec<String>, values: Vec<Value>, source: Source) {
        self.raw.push(raw);
        self.count += 1;
        self.raise_source(source);

        match &mut self.data {
            CellData::Fixed(tuples) => tuples.push(values),
            data @ CellData::Unset => *data = CellData::Fixed(vec![values]),
            _ => debug_assert!(false, "bind_tuple against incompatible cell shape"),
        }
    }

    /// Installs a default-produced value without counting an occurrence.
    pub(crate) fn bind_default(&mut self, value: Value) {
        if self.source != Source::Missing {
            return;
        }
        self.source = Source::Default;
        self.data = match self.shape {
            CellShape::Scalar => CellData::Scalar(value),
            CellShape::List => CellData::List(vec![value]),
            CellShape::Set => CellData::Set(vec![(value.to_string(), value)]),
            CellShape::Count => CellData::Count(0),
            CellShape::Fixed(_) => CellData::Fixed(vec![vec![value]]),
        };
    }

    /// Whether an operator-supplied value is present.
    pub(crate) fn is_provided(&self) -> bool {
        self.source.is_provided()
    }

    /// All stored values, flattened, for validators.
    pub(crate) fn collected(&self) -> Vec<&Value> {
        match &self.data {
            CellData::Unset | CellData::Count(_) => Vec::new(),
            CellData::Scalar(value) => vec![value],
            CellData::List(items) => items.iter().collect(),
            CellData::Set(items) => items.iter().map(|(_, value)| value).collect(),
            CellData::Fixed(tuples) => tuples.iter().flatten().collect(),
        }
    }

    /// The scalar value, when this cell holds one.
    pub(crate) fn scalar(&self) -> Option<&Value> {
        match &self.data {
            CellData::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Flattened raw occurrence strings.
    pub(crate) fn raw_flat(&self) -> Vec<String> {
        self.raw.iter().flatten().cloned().collect()
    }

    /// The counter value for counting cells, else the occurrence count.
    pub(crate) fn counter(&self) -> u64 {
        match &self.data {
            CellData::Count(n) => *n,
            _ => u64::from(self.count),
        }
    }

    /// The stored tuples of a fixed-arity cell.
    pub(crate) fn tuples(&self) -> &[Vec<Value>] {
        match &self.data {
            CellData::Fixed(tuples) => tuples,
            _ => &[],
        }
    }
}

/// First occurrence wins. Key/value entries compare by key; host-typed
/// values fall back to raw-token equality.
fn insert_deduped(items: &mut Vec<(String, Value)>, raw: &str, value: Value) {
    let duplicate = items.iter().any(|(existing_raw, existing)| {
        match (existing, &value) {
            (Value::KeyValue(a), Value::KeyValue(b)) => a.key == b.key,
            (Value::Other(_), _) | (_, Value::Other(_)) => existing_raw == raw,
            (a, b) => a == b,
        }
    });

    if !duplicate {
        items.push((raw.to_string(), value));
    }
}

/// Key/value view used by map-style accessors.
pub(crate) fn keyvalues(values: &[&Value]) -> Vec<KeyValue> {
    values
        .iter()
        .filter_map(|value| match value {
            Value::KeyValue(kv) => Some(kv.clone()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_rebind_replaces_value_keeps_count() {
        let mut cell = ValueCell::new(CellShape::Scalar);
        cell.bind_value("1", Value::Int(1), Source::User);
        cell.bind_value("2", Value::Int(2), Source::User);

        assert_eq!(cell.scalar(), Some(&Value::Int(2)));
        assert_eq!(cell.count, 2);
        assert_eq!(cell.source, Source::User);
    }

    #[test]
    fn test_source_never_regresses() {
        let mut cell = ValueCell::new(CellShape::Scalar);
        cell.bind_value("9090", Value::Int(9090), Source::User);
        cell.bind_value("7070", Value::Int(7070), Source::Environment);

        // The stronger source survives.
        assert_eq!(cell.source, Source::User);
    }

    #[test]
    fn test_default_never_overwrites() {
        let mut cell = ValueCell::new(CellShape::Scalar);
        cell.bind_value("x", Value::Str("x".into()), Source::Environment);
        cell.bind_default(Value::Str("d".into()));

        assert_eq!(cell.source, Source::Environment);
        assert_eq!(cell.scalar(), Some(&Value::Str("x".into())));
    }

    #[test]
    fn test_list_preserves_order() {
        let mut cell = ValueCell::new(CellShape::List);
        cell.bind_value("b", Value::Str("b".into()), Source::User);
        cell.bind_value("a", Value::Str("a".into()), Source::User);

        let collected: Vec<String> =
            cell.collected().iter().map(|v| v.to_string()).collect();
        assert_eq!(collected, vec!["b", "a"]);
    }

    #[test]
    fn test_set_dedup_by_value_equality() {
        let mut cell = ValueCell::new(CellShape::Set);
        cell.bind_value("1", Value::Int(1), Source::User);
        cell.bind_value("01", Value::Int(1), Source::User);
        cell.bind_value("2", Value::Int(2), Source::User);

        assert_eq!(cell.collected().len(), 2);
        assert_eq!(cell.count, 3);
    }

    #[test]
    fn test_set_dedup_keyvalue_first_key_wins() {
        let mut cell = ValueCell::new(CellShape::Set);
        cell.bind_value(
            "a=1",
            Value::KeyValue(KeyValue::new("a", "1")),
            Source::User,
        );
        cell.bind_value(
            "a=2",
            Value::KeyValue(KeyValue::new("a", "2")),
            Source::User,
        );

        let collected = cell.collected();
        assert_eq!(collected.len(), 1);
        assert_eq!(collected[0].to_string(), "a=1");
    }

    #[test]
    fn test_count_increments() {
        let mut cell = ValueCell::new(CellShape::Count);
        cell.bind_flag("-v", true, Source::User);
        cell.bind_flag("-v", true, Source::User);

        match cell.data {
            CellData::Count(n) => assert_eq!(n, 2),
            ref other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_missing_distinguishable_from_empty() {
        let cell = ValueCell::new(CellShape::List);
        assert!(matches!(cell.data, CellData::Unset));
        assert_eq!(cell.source, Source::Missing);
        assert!(cell.collected().is_empty());
    }

    #[test]
    fn test_fixed_tuples() {
        let mut cell = ValueCell::new(CellShape::Fixed(2));
        cell.bind_tuple(
            vec!["1".into(), "2".into()],
            vec![Value::Int(1), Value::Int(2)],
            Source::User,
        );
        cell.bind_tuple(
            vec!["3".into(), "4".into()],
            vec![Value::Int(3), Value::Int(4)],
            Source::User,
        );

        assert_eq!(cell.count, 2);
        assert_eq!(cell.raw.len(), 2);
        assert_eq!(cell.collected().len(), 4);
    }
}
