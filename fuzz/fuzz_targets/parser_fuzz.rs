//! Ingestion fuzz target: feed arbitrary bytes to the DEX parser.
//! The parser must not panic; every input yields a report.
//! Build with: cargo fuzz run parser_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let report = dexaudit::DexParser::default().parse_bytes(data);
    assert_eq!(
        report.canonical.is_none(),
        report.status == dexaudit::IngestionStatus::FatalFailure
    );
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run parser_fuzz");
}
