//! Conversion primitives: raw command-line strings into dynamic [`Value`]s.
//!
//! A [`Converter`] is a pure function of the raw string plus a short
//! description of the expected shape, used verbatim in `invalid-value`
//! diagnostics. Converters never panic; rejection is a message explaining
//! what was expected.

use std::sync::Arc;

use crate::value::{KeyValue, Value, parse_bool_token};

/// A named, shareable `&str -> Value` conversion.
#[derive(Clone)]
pub struct Converter {
    describe: String,
    run: Arc<dyn Fn(&str) -> Result<Value, String> + Send + Sync>,
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Converter")
            .field("describe", &self.describe)
            .finish_non_exhaustive()
    }
}

impl Converter {
    /// Builds a converter from a description and a conversion function.
    pub fn new(
        describe: impl Into<String>,
        run: impl Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            describe: describe.into(),
            run: Arc::new(run),
        }
    }

    /// The expected-shape description used in diagnostics.
    #[must_use]
    pub fn describe(&self) -> &str {
        &self.describe
    }

    /// Runs the conversion.
    ///
    /// # Errors
    ///
    /// Returns a human-readable rejection message when the raw string does
    /// not have the expected shape.
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        (self.run)(raw)
    }

    // ------------------------------------------------------------------
    // Built-ins
    // ------------------------------------------------------------------

    /// Identity conversion; trims nothing.
    #[must_use]
    pub fn string() -> Self {
        Self::new("string", |raw| Ok(Value::Str(raw.to_string())))
    }

    /// Signed 64-bit decimal integer. A leading `+` is accepted; embedded
    /// whitespace is not.
    #[must_use]
    pub fn integer() -> Self {
        Self::new("integer", |raw| {
            raw.parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("'{raw}' is not a valid integer"))
        })
    }

    /// Floating-point number in decimal or scientific notation. NaN and
    /// infinity tokens are rejected.
    #[must_use]
    pub fn float() -> Self {
        Self::new("number", |raw| match raw.parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(Value::Float(x)),
            _ => Err(format!("'{raw}' is not a valid number")),
        })
    }

    /// Boolean token: `true|false|yes|no|on|off|1|0`, case-insensitive.
    #[must_use]
    pub fn boolean() -> Self {
        Self::new("boolean", |raw| {
            parse_bool_token(raw)
                .map(Value::Bool)
                .ok_or_else(|| format!("'{raw}' is not a valid boolean"))
        })
    }

    /// Membership test against a fixed choice set. Matching is
    /// case-insensitive; the declared spelling is what gets stored.
    #[must_use]
    pub fn one_of(choices: &[&str]) -> Self {
        let choices: Vec<String> = choices.iter().map(|c| (*c).to_string()).collect();
        let listed = choices.join(", ");

        Self::new(format!("one of: {listed}"), move |raw| {
            choices
                .iter()
                .find(|choice| choice.eq_ignore_ascii_case(raw))
                .map(|choice| Value::Str(choice.clone()))
                .ok_or_else(|| format!("'{raw}' is not one of: {listed}"))
        })
    }

    /// Case-sensitive variant of [`Converter::one_of`].
    #[must_use]
    pub fn one_of_exact(choices: &[&str]) -> Self {
        let choices: Vec<String> = choices.iter().map(|c| (*c).to_string()).collect();
        let listed = choices.join(", ");

        Self::new(format!("one of: {listed}"), move |raw| {
            choices
                .iter()
                .find(|choice| choice.as_str() == raw)
                .map(|choice| Value::Str(choice.clone()))
                .ok_or_else(|| format!("'{raw}' is not one of: {listed}"))
        })
    }

    /// Case-insensitive variant-name match against a declared set, with an
    /// alias map layered on top. Aliases resolve before variant names.
    #[must_use]
    pub fn enumerated<T>(variants: &[(&str, T)], aliases: &[(&str, &str)]) -> Self
    where
        T: Clone + Send + Sync + 'static,
    {
        let variants: Vec<(String, T)> = variants
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect();
        let aliases: Vec<(String, String)> = aliases
            .iter()
            .map(|(alias, target)| ((*alias).to_string(), (*target).to_string()))
            .collect();
        let listed = variants
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        Self::new(format!("one of: {listed}"), move |raw| {
            let wanted = aliases
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(raw))
                .map_or(raw, |(_, target)| target.as_str());

            variants
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
                .map(|(_, value)| Value::other(value.clone()))
                .ok_or_else(|| format!("'{raw}' is not one of: {listed}"))
        })
    }

    /// Splits on the first occurrence of `separator`; both sides must be
    /// non-empty.
    #[must_use]
    pub fn keyvalue(separator: char) -> Self {
        Self::new(format!("key{separator}value pair"), move |raw| {
            match raw.split_once(separator) {
                Some((key, value)) if !key.is_empty() && !value.is_empty() => {
                    Ok(Value::KeyValue(KeyValue::new(key, value)))
                }
                _ => Err(format!(
                    "'{raw}' is not a key{separator}value pair with non-empty sides"
                )),
            }
        })
    }

    /// Host-supplied conversion returning `None` on rejection; `describe`
    /// names the expected shape in diagnostics.
    #[must_use]
    pub fn map<T, F>(describe: impl Into<String>, convert: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&str) -> Option<T> + Send + Sync + 'static,
    {
        let describe = describe.into();
        let expected = describe.clone();

        Self::new(describe, move |raw| {
            convert(raw)
                .map(Value::other)
                .ok_or_else(|| format!("'{raw}' is not a valid {expected}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_accepts_leading_plus() {
        let conv = Converter::integer();
        assert_eq!(conv.convert("+42").unwrap(), Value::Int(42));
        assert_eq!(conv.convert("-7").unwrap(), Value::Int(-7));
    }

    #[test]
    fn test_integer_rejects_whitespace_and_junk() {
        let conv = Converter::integer();
        assert!(conv.convert(" 42").is_err());
        assert!(conv.convert("42 ").is_err());
        assert!(conv.convert("4.2").is_err());
        assert!(conv.convert("").is_err());
    }

    #[test]
    fn test_float_scientific_and_rejections() {
        let conv = Converter::float();
        assert_eq!(conv.convert("1.5e3").unwrap(), Value::Float(1500.0));
        assert!(conv.convert("NaN").is_err());
        assert!(conv.convert("inf").is_err());
        assert!(conv.convert("1e999").is_err());
    }

    #[test]
    fn test_boolean_token_set() {
        let conv = Converter::boolean();
        assert_eq!(conv.convert("YES").unwrap(), Value::Bool(true));
        assert_eq!(conv.convert("off").unwrap(), Value::Bool(false));
        assert!(conv.convert("maybe").is_err());
    }

    #[test]
    fn test_one_of_stores_declared_spelling() {
        let conv = Converter::one_of(&["fast", "slow"]);
        assert_eq!(conv.convert("FAST").unwrap(), Value::Str("fast".into()));
        assert!(conv.convert("medium").is_err());

        let exact = Converter::one_of_exact(&["fast"]);
        assert!(exact.convert("FAST").is_err());
    }

    #[test]
    fn test_enumerated_with_aliases() {
        #[derive(Clone, Debug, PartialEq)]
        enum Mode {
            Fast,
            Slow,
        }

        let conv = Converter::enumerated(
            &[("fast", Mode::Fast), ("slow", Mode::Slow)],
            &[("quick", "fast")],
        );

        let value = conv.convert("Quick").unwrap();
        assert_eq!(value.downcast_ref::<Mode>(), Some(&Mode::Fast));
        assert!(conv.convert("medium").is_err());
    }

    #[test]
    fn test_keyvalue_split_on_first() {
        let conv = Converter::keyvalue('=');
        let value = conv.convert("a=b=c").unwrap();
        let kv = match value {
            Value::KeyValue(kv) => kv,
            other => panic!("expected key/value, got {other:?}"),
        };
        assert_eq!(kv.key, "a");
        assert_eq!(kv.value, "b=c");

        assert!(conv.convert("=b").is_err());
        assert!(conv.convert("a=").is_err());
        assert!(conv.convert("ab").is_err());
    }

    #[test]
    fn test_map_rejection_message_names_shape() {
        let conv = Converter::map("port range", |raw: &str| {
            let (low, high) = raw.split_once("..")?;
            Some((low.parse::<u16>().ok()?, high.parse::<u16>().ok()?))
        });

        assert!(conv.convert("80..90").is_ok());
        let err = conv.convert("oops").unwrap_err();
        assert!(err.contains("port range"), "{err}");
    }
}
