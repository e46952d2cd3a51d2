#![no_main]

use argos::suggest::{damerau_levenshtein, rank_candidates};
use argos::{Converter, FromValue, KeyValue, Value};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // === Converters never panic and never accept garbage silently ===
    for converter in [
        Converter::string(),
        Converter::integer(),
        Converter::float(),
        Converter::boolean(),
        Converter::one_of(&["alpha", "beta"]),
        Converter::keyvalue('='),
    ] {
        let _ = converter.describe();
        if let Ok(value) = converter.convert(data) {
            // === Every accepted value displays and casts safely ===
            let _ = value.to_string();
            let _ = format!("{value:?}");
            let _ = value.type_name();
            let _ = value.to_bool();
            let _ = value.to_i64();
            let _ = value.to_u16();
            let _ = value.to_f64();
            let _ = String::from_value(&value);
            let _ = KeyValue::from_value(&value);
            let _ = i64::from_value(&value);

            let cloned = value.clone();
            let _ = value == cloned;
        }
    }

    // === Suggestion engine never panics ===
    let _ = damerau_levenshtein(data, "verbose");
    let _ = rank_candidates(data, ["--verbose", "--version", "deploy"], 2);
});
