//! Observability helpers for the Slack client.
//!
//! The crate logs through `tracing`; this module only keeps secrets out
//! of those records.

pub mod logging;

pub use logging::*;
