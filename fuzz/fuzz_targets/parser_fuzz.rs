//! Parser fuzz target: feed arbitrary bytes to the schema parser and resolver.
//! Neither may panic; schemas that resolve must also survive the printer and generator.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    let Ok(schema) = peechy::parse(s) else {
        return;
    };
    let text = peechy::pretty_print(&schema);
    if let Ok(resolved) = peechy::ResolvedSchema::resolve(schema) {
        let _ = peechy::generate_rust(&resolved, &peechy::GeneratorOptions::default());
        assert!(peechy::parse(&text).is_ok(), "printed schema must re-parse");
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
