//! Core game logic module - pure, deterministic, and testable
//!
//! This crate contains the rules of the run: the trail layout, the player's
//! movement, hit resolution, scoring and the run lifecycle.
//! It has **no dependencies** on terminal, networking, or I/O, making it:
//!
//! - **Deterministic**: Same seed and inputs produce identical runs
//! - **Testable**: Rules are exercised directly, without a renderer
//! - **Portable**: Runs headless (tests, benches, the control adapter)
//!
//! # Module Structure
//!
//! - [`world`]: obstacles, coins and pirates, plus the seeded layout generator
//! - [`player`]: lane changes, jump arc, slide, sword swing, health
//! - [`camera`]: chase camera following the player
//! - [`game_state`]: lifecycle, forward speed, collisions and scoring
//! - [`hud`]: the numbers the heads-up display shows
//! - [`rng`]: small LCG used for the layout and pirate attack rolls
//!
//! # Rules
//!
//! - The player runs down -Z, starting at 15 u/s and ramping up to 25 u/s
//! - Coins score 50; health coins also restore 10 health
//! - Barrels and crates cost 20 health unless jumped over
//! - Pirates cost 5 health; a sword swing defeats them for 50 points
//! - Sliding ducks a swinging pirate's sword
//! - Reaching 745 m completes the level; running out of health ends the run
//!
//! # Example
//!
//! ```
//! use pirate_run_core::GameState;
//! use pirate_run_types::{GameAction, TICK_MS};
//!
//! let mut game = GameState::new(12345);
//! game.start();
//!
//! game.apply_action(GameAction::MoveLeft);
//! for _ in 0..60 {
//!     game.tick(TICK_MS, false);
//! }
//!
//! assert_eq!(game.player().lane, -1);
//! assert!(game.distance() > 14.0);
//! ```
//!
//! # Timing
//!
//! Call [`GameState::tick`](game_state::GameState::tick) every frame with the
//! fixed timestep and whether the slide key is currently held.

pub mod camera;
pub mod game_state;
pub mod hud;
pub mod player;
pub mod rng;
pub mod snapshot;
pub mod world;

pub use pirate_run_types as types;

pub use camera::Camera;
pub use game_state::{EventBuffer, GameState};
pub use hud::{Banner, HealthTier, Hud};
pub use player::Player;
pub use rng::SimpleRng;
pub use snapshot::{GameSnapshot, PlayerSnapshot};
pub use world::{Coin, Footprint, Obstacle, Pirate, PirateFate, World};
