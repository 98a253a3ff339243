// src/logging.rs
// =============================================================================
// Sets up the `log` facade with env_logger as the backend.
//
// RUST_LOG is read first, then the --log-level flag overrides it. Chatty
// dependencies (the HTML parser, the HTTP stack) are capped so a debug run
// shows our own messages instead of theirs.
//
// Logs go to stderr, so `--json` output on stdout stays machine readable.
// =============================================================================

use log::LevelFilter;

use crate::error::InitializationError;

pub fn init_logger(level: LevelFilter) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("page_inspector", level);

    // try_init: a second call (tests) returns an error instead of panicking
    builder.try_init()?;

    Ok(())
}
