//! Terminal "game renderer" module.
//!
//! This is a small, game-oriented rendering layer for terminal gameplay.
//! It avoids widget/layout libraries and instead projects the 3D scene into a
//! simple framebuffer that can be flushed to a terminal backend.
//!
//! Goals:
//! - Keep `core` deterministic and testable
//! - Draw the run from the chase camera with a real perspective projection
//! - Only write the cells that changed between frames

pub mod fb;
pub mod game_view;
pub mod projection;
pub mod render_throttle;
pub mod renderer;

pub use pirate_run_core as core;
pub use pirate_run_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{AdapterStatusView, GameView, Viewport};
pub use projection::{Projector, ScreenPoint};
pub use render_throttle::RenderThrottle;
pub use renderer::{encode_diff_into, encode_full_into, FrameStats, TerminalRenderer};
