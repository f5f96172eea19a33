// CrashWatch - core/mod.rs
//
// Core business logic layer.
// Dependencies: standard library, chrono, uuid, serde derive.
// Must NOT depend on: platform, app, or touch the filesystem directly.

pub mod model;
pub mod record;
pub mod span;
