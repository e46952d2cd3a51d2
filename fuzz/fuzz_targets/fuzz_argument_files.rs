#![no_main]

use arbitrary::Arbitrary;
use argos::provider::{MapEnv, MapFiles, Providers};
use argos::Schema;
use libfuzzer_sys::fuzz_target;

/// A small virtual filesystem plus the argument vector referencing it.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    files: Vec<(String, String)>,
    args: Vec<String>,
}

fuzz_target!(|input: FuzzInput| {
    let mut b = Schema::builder();
    let _name = b.option("name").long("name").scalar();
    let _rest = b.positional("rest").variadic();
    let schema = b.build();

    let mut files = MapFiles::new();
    for (path, contents) in input.files {
        files = files.with(path, contents);
    }
    let env = MapEnv::new();
    let providers = Providers::default().with_env(&env).with_files(&files);

    // Expansion may fail (missing files, depth, broken quoting) but must
    // never panic or loop forever.
    let _ = schema.parse_with(input.args, &providers);
});
