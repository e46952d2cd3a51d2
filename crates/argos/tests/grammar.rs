//! CLI grammar boundary behaviours.

use argos::{ErrorKind, KeyValue, Schema, SchemaBuilder, Source};

// ----------------------------------------------------------------------
// End-of-options sentinel
// ----------------------------------------------------------------------

#[test]
fn lone_sentinel_absorbs_itself() {
    let mut b = Schema::builder();
    let rest = b.positional("rest").variadic();
    let schema = b.build();

    let matches = schema.parse(["--"]).unwrap_matches();
    assert!(matches.list(&rest).is_empty());
    assert_eq!(matches.source(&rest), Source::Missing);
}

#[test]
fn tokens_after_sentinel_are_positional() {
    let mut b = Schema::builder();
    let v = b.flag("verbose").long("verbose").short('v').scalar();
    let rest = b.positional("rest").variadic();
    let schema = b.build();

    let matches = schema
        .parse(["-v", "--", "--verbose", "-v", "--"])
        .unwrap_matches();
    assert!(matches.flag(&v));
    assert_eq!(matches.list(&rest), vec!["--verbose", "-v", "--"]);
}

// ----------------------------------------------------------------------
// Attached values
// ----------------------------------------------------------------------

#[test]
fn empty_attached_value_is_empty_string() {
    let mut b = Schema::builder();
    let name = b.option("name").long("name").scalar();
    let schema = b.build();

    let matches = schema.parse(["--name="]).unwrap_matches();
    assert_eq!(matches.get(&name).as_deref(), Some(""));
}

#[test]
fn empty_attached_value_rejected_by_numeric_converter() {
    let mut b = Schema::builder();
    let _port = b.option("port").long("port").int().scalar();
    let schema = b.build();

    let errors = schema.parse(["--port="]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::InvalidValue);
}

#[test]
fn colon_separator_and_value_with_separators() {
    let mut b = Schema::builder();
    let port = b.option("port").long("port").int().scalar();
    let url = b.option("url").long("url").scalar();
    let schema = b.build();

    let matches = schema
        .parse(["--port:8080", "--url=http://example.com:80"])
        .unwrap_matches();
    assert_eq!(matches.get(&port), Some(8080));
    assert_eq!(matches.get(&url).as_deref(), Some("http://example.com:80"));
}

#[test]
fn detached_switch_like_token_is_not_a_value() {
    let mut b = Schema::builder();
    let _name = b.option("name").long("name").scalar();
    let _verbose = b.flag("verbose").long("verbose").scalar();
    let schema = b.build();

    // --verbose is a switch, so --name has no value; --verbose still
    // binds (missing-value recovery keeps parsing).
    let errors = schema.parse(["--name", "--verbose"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::MissingValue);
}

// ----------------------------------------------------------------------
// Clusters
// ----------------------------------------------------------------------

#[test]
fn cluster_remainder_wins_over_switch_chars() {
    let mut b = Schema::builder();
    let out = b.option("out").short('o').scalar();
    let v = b.flag("verbose").short('v').scalar();
    let schema = b.build();

    // 'v' is a registered switch, but after -o it is the value.
    let matches = schema.parse(["-ov"]).unwrap_matches();
    assert_eq!(matches.get(&out).as_deref(), Some("v"));
    assert!(!matches.flag(&v));
}

#[test]
fn cluster_attached_value_reaches_value_option() {
    let mut b = Schema::builder();
    let v = b.flag("verbose").short('v').scalar();
    let n = b.option("count").short('n').int().scalar();
    let schema = b.build();

    let matches = schema.parse(["-vn=42"]).unwrap_matches();
    assert!(matches.flag(&v));
    assert_eq!(matches.get(&n), Some(42));
}

#[test]
fn unknown_cluster_head_is_one_unknown_option() {
    let mut b = Schema::builder();
    let _v = b.flag("verbose").short('v').scalar();
    let schema = b.build();

    let errors = schema.parse(["-x"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::UnknownOption);
    assert!(errors[0].to_string().contains("-x"));
}

// ----------------------------------------------------------------------
// Negation
// ----------------------------------------------------------------------

#[test]
fn negation_switch_binds_false() {
    let mut b = Schema::builder();
    let cache = b.flag("cache").long("cache").negatable().scalar();
    let schema = b.build();

    let matches = schema.parse(["--no-cache"]).unwrap_matches();
    assert_eq!(matches.get(&cache), Some(false));
    assert!(matches.is_present(&cache));

    let matches = schema.parse(["--cache"]).unwrap_matches();
    assert_eq!(matches.get(&cache), Some(true));

    // Last occurrence wins.
    let matches = schema.parse(["--cache", "--no-cache"]).unwrap_matches();
    assert_eq!(matches.get(&cache), Some(false));
}

#[test]
fn negation_appears_in_snapshot_switches() {
    let mut b = Schema::builder();
    let _cache = b.flag("cache").long("cache").negatable().scalar();
    let schema = b.build();

    let info = &schema.snapshot().options[0];
    assert!(info.switches.contains(&"--cache".to_string()));
    assert!(info.switches.contains(&"--no-cache".to_string()));
}

// ----------------------------------------------------------------------
// Optional values
// ----------------------------------------------------------------------

#[test]
fn optional_value_uses_attached_or_presence_default() {
    let mut b = Schema::builder();
    let color = b
        .option("color")
        .long("color")
        .optional_value("auto".to_string())
        .scalar();
    let rest = b.positional("rest").variadic();
    let schema = b.build();

    let matches = schema.parse(["--color"]).unwrap_matches();
    assert_eq!(matches.get(&color).as_deref(), Some("auto"));

    let matches = schema.parse(["--color=always"]).unwrap_matches();
    assert_eq!(matches.get(&color).as_deref(), Some("always"));

    // A detached token is never consumed as the value.
    let matches = schema.parse(["--color", "always"]).unwrap_matches();
    assert_eq!(matches.get(&color).as_deref(), Some("auto"));
    assert_eq!(matches.list(&rest), vec!["always"]);
}

// ----------------------------------------------------------------------
// Fixed arity
// ----------------------------------------------------------------------

#[test]
fn fixed_arity_consumes_tuples() {
    let mut b = Schema::builder();
    let point = b.option("point").long("point").int().fixed(2);
    let schema = b.build();

    let matches = schema
        .parse(["--point", "3", "4", "--point", "5", "6"])
        .unwrap_matches();
    assert_eq!(matches.fixed(&point), vec![vec![3, 4], vec![5, 6]]);
    assert_eq!(matches.occurrences(&point), 2);
}

#[test]
fn fixed_arity_underflow_is_missing_value() {
    let mut b = Schema::builder();
    let _point = b.option("point").long("point").int().fixed(3);
    let schema = b.build();

    let errors = schema.parse(["--point", "3", "4"]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::MissingValue);
}

// ----------------------------------------------------------------------
// Collections
// ----------------------------------------------------------------------

#[test]
fn list_preserves_order_set_dedups() {
    let mut b = Schema::builder();
    let tag = b.option("tag").long("tag").list();
    let kind = b.option("kind").long("kind").set();
    let schema = b.build();

    let matches = schema
        .parse([
            "--tag", "b", "--tag", "a", "--tag", "b", "--kind", "x", "--kind", "x",
        ])
        .unwrap_matches();
    assert_eq!(matches.list(&tag), vec!["b", "a", "b"]);
    assert_eq!(matches.set(&kind), vec!["x"]);
    assert_eq!(matches.occurrences(&kind), 2);
}

#[test]
fn keyvalue_set_first_key_wins() {
    let mut b = Schema::builder();
    let define = b.option("define").short('D').keyvalue('=').set();
    let schema = b.build();

    let matches = schema
        .parse(["-Da=1", "-D", "b=2", "-Da=3"])
        .unwrap_matches();
    let pairs = matches.pairs(&define);
    assert_eq!(
        pairs,
        vec![KeyValue::new("a", "1"), KeyValue::new("b", "2")]
    );
}

#[test]
fn counted_flag_counts() {
    let mut b = Schema::builder();
    let v = b.flag("verbose").short('v').long("verbose").counted();
    let schema = b.build();

    let matches = schema.parse(["-vvv", "--verbose"]).unwrap_matches();
    assert_eq!(matches.count(&v), 4);
}

// ----------------------------------------------------------------------
// Unknown switches
// ----------------------------------------------------------------------

#[test]
fn unknown_switches_demote_when_configured() {
    let mut b = SchemaBuilder::new();
    b.settings_mut().unknown_as_positionals = true;
    let v = b.flag("verbose").long("verbose").scalar();
    let rest = b.positional("rest").variadic();
    let schema = b.build();

    let matches = schema
        .parse(["--wat=1", "--verbose", "-zz", "plain"])
        .unwrap_matches();
    assert!(matches.flag(&v));
    assert_eq!(matches.list(&rest), vec!["--wat=1", "-zz", "plain"]);
}

#[test]
fn scalar_rebinding_keeps_user_source() {
    let mut b = Schema::builder();
    let name = b.option("name").long("name").scalar();
    let schema = b.build();

    let matches = schema
        .parse(["--name", "first", "--name", "second"])
        .unwrap_matches();
    assert_eq!(matches.get(&name).as_deref(), Some("second"));
    assert_eq!(matches.occurrences(&name), 2);
    assert_eq!(matches.source(&name), Source::User);
}

#[test]
fn excess_positionals_are_reported() {
    let mut b = Schema::builder();
    let input = b.positional("input").single();
    let schema = b.build();

    let errors = schema.parse(["a", "b"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::UnexpectedPositional);

    let matches = schema.parse(["a"]).unwrap_matches();
    assert_eq!(matches.get(&input).as_deref(), Some("a"));
}
