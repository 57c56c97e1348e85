//! Terminal input module.
//!
//! Maps `crossterm` key events into [`crate::types::GameAction`] and provides a
//! held-key handler (lane auto-repeat, slide hold) suitable for terminal
//! environments, including terminals without key-release events.

pub mod handler;
pub mod map;

pub use pirate_run_types as types;

pub use handler::{InputHandler, LaneDirection};
pub use map::{handle_key_event, should_quit};
