//! Domains, fragments and constraint inheritance.
//!
//! Try:
//!   cargo run --package argos --example domains -- deploy --env prod --key K
//!   cargo run --package argos --example domains -- deploy --key K --token T
//!   cargo run --package argos --example domains -- depoly

use argos::{HandleRef, Outcome, Schema, exactly_one, require};

fn main() {
    let mut b = Schema::builder();

    // Shared credential rules, contributed to every domain inheriting the
    // fragment.
    let auth = b.fragment("auth").register();
    let deploy = b
        .domain("deploy")
        .alias("d")
        .label("Deploy a service")
        .inherit(&auth)
        .register();
    let status = b.domain("status").label("Show deployment status").register();

    let env = b.option("env").long("env").only_in(&deploy).scalar();
    let key = b.option("key").long("key").only_in(&deploy).scalar();
    let token = b.option("token").long("token").only_in(&deploy).scalar();
    let service = b.positional("service").only_in(&status).single();

    b.constrain_in(&auth, exactly_one([key.owner(), token.owner()]));
    b.constrain_in(&deploy, require(&env));

    let schema = b.build();

    match schema.parse(std::env::args().skip(1)) {
        Outcome::Parsed(matches) => match matches.domain() {
            Some("deploy") => {
                println!(
                    "deploying to {} with {}",
                    matches.get(&env).unwrap_or_default(),
                    if matches.is_present(&key) { "key" } else { "token" },
                );
            }
            Some("status") => {
                println!(
                    "status of {}",
                    matches.get(&service).unwrap_or_else(|| "everything".into())
                );
            }
            _ => println!("no command given; try 'deploy' or 'status'"),
        },
        Outcome::Failed { errors } => {
            for error in errors {
                eprintln!("error: {error}");
            }
            std::process::exit(2);
        }
        _ => {}
    }
}
