//! Constraint scoping, inheritance and suggestion behaviour.

use argos::{
    Error, ErrorKind, HandleRef, Schema, at_least_one, at_most_one, conflict,
    require, require_if_all_absent, require_if_all_present, require_if_value,
};

// ----------------------------------------------------------------------
// Scoping
// ----------------------------------------------------------------------

#[test]
fn constraint_fires_only_for_declaring_or_inheriting_domain() {
    let mut b = Schema::builder();
    let frag = b.fragment("credentials").register();
    let with_auth = b.domain("with-auth").inherit(&frag).register();
    let _plain = b.domain("plain").register();
    let secret = b.option("secret").long("secret").scalar();
    b.constrain_in(&frag, require(&secret));
    let schema = b.build();

    // Declared on the fragment: fires for the inheriting domain...
    let errors = schema.parse(["with-auth"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::MissingRequired);

    // ...not for a sibling, not in root mode.
    assert!(schema.parse(["plain"]).matches().is_some());
    assert!(schema.parse(Vec::<String>::new()).matches().is_some());

    // And the inheriting domain parses once satisfied.
    let matches = schema
        .parse(["with-auth", "--secret", "s"])
        .unwrap_matches();
    assert_eq!(matches.domain(), Some("with-auth"));
    let _ = with_auth;
}

#[test]
fn transitive_inheritance_carries_constraints() {
    let mut b = Schema::builder();
    let base = b.fragment("base").register();
    let middle = b.fragment("middle").inherit(&base).register();
    let top = b.domain("top").inherit(&middle).register();
    let opt = b.option("opt").long("opt").scalar();
    b.constrain_in(&base, require(&opt));
    let schema = b.build();

    let errors = schema.parse(["top"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::MissingRequired);
    let _ = top;
}

#[test]
fn domain_alias_selects_domain() {
    let mut b = Schema::builder();
    let deploy = b.domain("deploy").alias("d").register();
    let env = b.option("env").long("env").only_in(&deploy).scalar();
    b.constrain_in(&deploy, require(&env));
    let schema = b.build();

    let matches = schema.parse(["d", "--env", "prod"]).unwrap_matches();
    assert_eq!(matches.domain(), Some("deploy"));
}

#[test]
fn scoped_option_is_unknown_outside_its_domain() {
    let mut b = Schema::builder();
    let deploy = b.domain("deploy").register();
    let _env = b.option("env").long("env").only_in(&deploy).scalar();
    let schema = b.build();

    let errors = schema.parse(["--env", "prod"]).unwrap_errors();
    assert!(errors
        .iter()
        .any(|e| e.kind() == ErrorKind::UnknownOption));
}

// ----------------------------------------------------------------------
// Groups and conflicts
// ----------------------------------------------------------------------

#[test]
fn at_most_one_allows_zero() {
    let mut b = Schema::builder();
    let a = b.flag("a").long("a").scalar();
    let c = b.flag("c").long("c").scalar();
    b.constrain(at_most_one([a.owner(), c.owner()]));
    let schema = b.build();

    assert!(schema.parse(Vec::<String>::new()).matches().is_some());
    assert!(schema.parse(["--a"]).matches().is_some());

    let errors = schema.parse(["--a", "--c"]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::GroupViolation);
}

#[test]
fn at_least_one_requires_a_member() {
    let mut b = Schema::builder();
    let a = b.flag("a").long("a").scalar();
    let c = b.flag("c").long("c").scalar();
    b.constrain(at_least_one([a.owner(), c.owner()]));
    let schema = b.build();

    let errors = schema.parse(Vec::<String>::new()).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::GroupViolation);
    assert!(schema.parse(["--c"]).matches().is_some());
    assert!(schema.parse(["--a", "--c"]).matches().is_some());
}

#[test]
fn conflict_lists_all_bound_members() {
    let mut b = Schema::builder();
    let json = b.flag("json").long("json").scalar();
    let yaml = b.flag("yaml").long("yaml").scalar();
    let toml = b.flag("toml").long("toml").scalar();
    b.constrain(conflict([json.owner(), yaml.owner(), toml.owner()]));
    let schema = b.build();

    let errors = schema.parse(["--json", "--toml"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    match &errors[0] {
        Error::Conflict { bound, .. } => {
            assert_eq!(bound, &vec!["--json".to_string(), "--toml".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }

    assert!(schema.parse(["--yaml"]).matches().is_some());
}

// ----------------------------------------------------------------------
// Conditional requirements
// ----------------------------------------------------------------------

#[test]
fn require_if_all_present_needs_every_ref() {
    let mut b = Schema::builder();
    let user = b.option("user").long("user").scalar();
    let host = b.option("host").long("host").scalar();
    let pass = b.option("pass").long("pass").scalar();
    b.constrain(require_if_all_present(&pass, [user.owner(), host.owner()]));
    let schema = b.build();

    assert!(schema.parse(["--user", "u"]).matches().is_some());

    let errors = schema
        .parse(["--user", "u", "--host", "h"])
        .unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::ConditionalRequirement);
    assert!(errors[0].to_string().contains("--pass"));
}

#[test]
fn require_if_all_absent_fires_on_empty_input() {
    let mut b = Schema::builder();
    let stdin = b.flag("stdin").long("stdin").scalar();
    let file = b.option("file").long("file").scalar();
    b.constrain(require_if_all_absent(&stdin, [file.owner()]));
    let schema = b.build();

    let errors = schema.parse(Vec::<String>::new()).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::ConditionalRequirement);

    assert!(schema.parse(["--file", "f"]).matches().is_some());
    assert!(schema.parse(["--stdin"]).matches().is_some());
}

#[test]
fn require_if_value_inspects_the_referenced_cell() {
    let mut b = Schema::builder();
    let proto = b.option("proto").long("proto").scalar();
    let cert = b.option("cert").long("cert").scalar();
    b.constrain(require_if_value(
        &cert,
        &proto,
        "when '--proto' is 'https'",
        |p: &String| p == "https",
    ));
    let schema = b.build();

    assert!(schema.parse(["--proto", "http"]).matches().is_some());

    let errors = schema.parse(["--proto", "https"]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::ConditionalRequirement);
    assert_eq!(
        errors[0].to_string(),
        "'--cert' is required when '--proto' is 'https'"
    );

    assert!(schema
        .parse(["--proto", "https", "--cert", "c"])
        .matches()
        .is_some());
}

#[test]
fn minimum_occurrences_reported_in_message() {
    let mut b = Schema::builder();
    let _tag = b.option("tag").long("tag").at_least(2).list();
    let schema = b.build();

    let errors = schema.parse(["--tag", "one"]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::MissingRequired);
    assert!(errors[0].to_string().contains("at least 2"));

    assert!(schema
        .parse(["--tag", "one", "--tag", "two"])
        .matches()
        .is_some());
}

// ----------------------------------------------------------------------
// Suggestions
// ----------------------------------------------------------------------

#[test]
fn unknown_option_suggests_close_switches() {
    let mut b = Schema::builder();
    let _verbose = b.flag("verbose").long("verbose").scalar();
    let _version = b.flag("version").long("version").scalar();
    let schema = b.build();

    let errors = schema.parse(["--verbsoe"]).unwrap_errors();
    match &errors[0] {
        Error::UnknownOption { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("--verbose"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn misspelled_domain_gets_unknown_domain_first() {
    let mut b = Schema::builder();
    let deploy = b.domain("deploy").register();
    let env = b.option("env").long("env").only_in(&deploy).scalar();
    b.constrain_in(&deploy, require(&env));
    let _name = b.option("name").long("name").required().scalar();
    let schema = b.build();

    let errors = schema.parse(["depoly"]).unwrap_errors();
    assert_eq!(errors[0].kind(), ErrorKind::UnknownDomain);
    match &errors[0] {
        Error::UnknownDomain { suggestions, .. } => {
            assert_eq!(suggestions.first().map(String::as_str), Some("deploy"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn suggestions_can_be_disabled() {
    let mut b = Schema::builder();
    b.settings_mut().suggestions = false;
    let _verbose = b.flag("verbose").long("verbose").scalar();
    let schema = b.build();

    let errors = schema.parse(["--verbsoe"]).unwrap_errors();
    match &errors[0] {
        Error::UnknownOption { suggestions, .. } => assert!(suggestions.is_empty()),
        other => panic!("unexpected {other:?}"),
    }
}

// ----------------------------------------------------------------------
// Non-aggregating mode
// ----------------------------------------------------------------------

#[test]
fn first_error_mode_stops_at_first_stage() {
    let mut b = Schema::builder();
    b.settings_mut().aggregate_errors = false;
    let _name = b.option("name").long("name").required().scalar();
    let _port = b.option("port").long("port").int().scalar();
    let schema = b.build();

    // Parser-stage errors (unknown + invalid) win over the missing
    // requirement, and only the first is kept.
    let errors = schema
        .parse(["--bogus", "--port", "abc"])
        .unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::UnknownOption);

    // With a clean parse, the constraint stage reports.
    let errors = schema.parse(Vec::<String>::new()).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::MissingRequired);
}

// ----------------------------------------------------------------------
// Broken schemas fail fast
// ----------------------------------------------------------------------

#[test]
fn construction_errors_fail_parse_before_tokens() {
    let mut b = Schema::builder();
    let _a = b.option("alpha").long("x").scalar();
    let _b = b.option("beta").long("x").scalar();
    let schema = b.build();

    let errors = schema.parse(["--x", "1"]).unwrap_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::SchemaInvalid);
}
