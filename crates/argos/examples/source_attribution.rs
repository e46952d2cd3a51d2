//! Shows where every value came from after a parse.
//!
//! Try:
//!   APP_HOST=example.org cargo run --package argos --example source_attribution -- --port 9090

use argos::{Outcome, Schema};

fn main() {
    let mut b = Schema::builder();
    let _host = b
        .option("host")
        .long("host")
        .env("APP_HOST")
        .default_value("localhost".to_string())
        .scalar();
    let _port = b
        .option("port")
        .long("port")
        .int()
        .env("APP_PORT")
        .default_value(8080)
        .scalar();
    let _debug = b.flag("debug").long("debug").env("APP_DEBUG").scalar();
    let schema = b.build();

    match schema.parse(std::env::args().skip(1)) {
        Outcome::Parsed(matches) => print!("{}", matches.origins()),
        Outcome::Failed { errors } => {
            for error in errors {
                eprintln!("error: {error}");
            }
            std::process::exit(2);
        }
        _ => {}
    }
}
