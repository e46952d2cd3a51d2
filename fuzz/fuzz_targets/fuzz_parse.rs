#![no_main]

use arbitrary::Arbitrary;
use argos::provider::{MapEnv, MapFiles, Providers};
use argos::{Outcome, Schema, SchemaBuilder, exactly_one, HandleRef};
use libfuzzer_sys::fuzz_target;

/// Structured input: an argument vector plus a few environment knobs.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    args: Vec<String>,
    env_port: Option<String>,
    env_tags: Option<String>,
    aggregate: bool,
    unknown_as_positionals: bool,
    max_errors: u8,
}

fn build_schema(aggregate: bool, unknown_as_positionals: bool, max_errors: u8) -> Schema {
    let mut b = SchemaBuilder::new();
    b.settings_mut().aggregate_errors = aggregate;
    b.settings_mut().unknown_as_positionals = unknown_as_positionals;
    b.settings_mut().max_errors = usize::from(max_errors).max(1);
    b.settings_mut().file_prefix = None;

    let _verbose = b.flag("verbose").short('v').long("verbose").counted();
    let _cache = b.flag("cache").long("cache").negatable().scalar();
    let _name = b.option("name").long("name").required().scalar();
    let _port = b
        .option("port")
        .long("port")
        .short('p')
        .int()
        .env("PORT")
        .default_value(8080)
        .scalar();
    let _tags = b.option("tag").long("tag").short('t').env("TAGS").list();
    let _define = b.option("define").short('D').keyvalue('=').set();
    let _point = b.option("point").long("point").float().fixed(2);
    let _help = b.flag("help").long("help").eager_help().scalar();

    let auth = b.fragment("auth").register();
    let deploy = b.domain("deploy").alias("d").inherit(&auth).register();
    let key = b.option("key").long("key").only_in(&deploy).scalar();
    let token = b.option("token").long("token").only_in(&deploy).scalar();
    b.constrain_in(&auth, exactly_one([key.owner(), token.owner()]));

    let _input = b.positional("input").single();
    let _rest = b.positional("rest").variadic();

    b.build()
}

fuzz_target!(|input: FuzzInput| {
    let schema = build_schema(
        input.aggregate,
        input.unknown_as_positionals,
        input.max_errors,
    );

    let mut env = MapEnv::new();
    if let Some(port) = &input.env_port {
        env.set("PORT", port.clone());
    }
    if let Some(tags) = &input.env_tags {
        env.set("TAGS", tags.clone());
    }
    let files = MapFiles::new();
    let providers = Providers::default().with_env(&env).with_files(&files);

    // Parsing must never panic, and the error list must honour the cap.
    match schema.parse_with(input.args.clone(), &providers) {
        Outcome::Failed { errors } => {
            assert!(!errors.is_empty());
            assert!(errors.len() <= usize::from(input.max_errors).max(1));
            for error in &errors {
                let _ = error.to_string();
                let _ = format!("{error:?}");
            }
        }
        Outcome::Parsed(matches) => {
            let _ = matches.origins().to_string();
        }
        _ => {}
    }

    // Determinism: a second parse of the same input agrees on the
    // outcome discriminant.
    let first = schema.parse_with(input.args.clone(), &providers);
    let second = schema.parse_with(input.args, &providers);
    assert_eq!(
        std::mem::discriminant(&first),
        std::mem::discriminant(&second)
    );
});
