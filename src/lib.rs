//! Pirate Run (workspace facade crate).
//!
//! Re-exports the workspace crates under short names so the binary, the
//! integration tests and the benches share one import path:
//! `pirate_run::{types, core, input, term, adapter}`.

pub use pirate_run_adapter as adapter;
pub use pirate_run_core as core;
pub use pirate_run_input as input;
pub use pirate_run_term as term;
pub use pirate_run_types as types;
