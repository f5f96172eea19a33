// CrashWatch - app/mod.rs
//
// Application layer: log persistence, fallback delivery, session lifecycle.
// Dependencies: core, platform, util.

pub mod fallback;
pub mod session;
pub mod store;
