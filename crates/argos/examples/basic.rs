//! Minimal end-to-end usage: describe, parse, query.
//!
//! Run with: cargo run --package argos --example basic -- --name Ada -vv

use argos::{Outcome, Schema};

fn main() {
    let mut b = Schema::builder();
    let verbose = b
        .flag("verbose")
        .short('v')
        .long("verbose")
        .help("increase chattiness")
        .counted();
    let name = b
        .option("name")
        .long("name")
        .required()
        .help("who to greet")
        .scalar();
    let port = b
        .option("port")
        .long("port")
        .int()
        .env("APP_PORT")
        .default_value(8080)
        .help("port to listen on")
        .scalar();
    let help = b.flag("help").short('h').long("help").eager_help().scalar();
    let _ = help;
    let schema = b.build();

    match schema.parse(std::env::args().skip(1)) {
        Outcome::Parsed(matches) => {
            println!("hello, {}!", matches.get(&name).unwrap_or_default());
            println!(
                "port {} ({}), verbosity {}",
                matches.get(&port).unwrap_or_default(),
                matches.source(&port),
                matches.count(&verbose),
            );
        }
        Outcome::Help { snapshot, .. } => {
            println!("usage: basic [options]");
            for option in snapshot.visible_options() {
                println!(
                    "  {:<24} {}",
                    option.switches.join(", "),
                    option.help.as_deref().unwrap_or("")
                );
            }
        }
        Outcome::Version { .. } => println!("basic {}", env!("CARGO_PKG_VERSION")),
        Outcome::Failed { errors } => {
            for error in errors {
                eprintln!("error: {error}");
            }
            std::process::exit(2);
        }
    }
}
