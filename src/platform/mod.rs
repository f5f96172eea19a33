// CrashWatch - platform/mod.rs
//
// Platform abstraction layer.
// Dependencies: standard library, directories, chrono, toml.
// Must NOT depend on: core, app.

pub mod clock;
pub mod config;
pub mod fs;
pub mod host;
