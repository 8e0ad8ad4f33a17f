//! Birth-location coordinate resolution for chart generation.
//!
//! Validates caller-supplied coordinates and falls back to a priority-ordered
//! keyword table of known places when they are unusable.

pub mod config;
pub mod location;
pub mod logging;
pub mod server;
