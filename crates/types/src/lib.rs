//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the application.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (core logic, terminal rendering, control protocol).
//!
//! # Trail Geometry
//!
//! The run goes down the negative Z axis. X is lateral, Y is up.
//!
//! - **Lanes**: three slots, indexed -1 (left), 0 (centre), 1 (right)
//! - **Lane width**: 2 world units between lane centres
//! - **Trail half width**: 3 units (borders sit at x = ±3)
//! - **Finish**: 745 units from the start line
//!
//! # Timing
//!
//! The simulation uses a fixed timestep of [`TICK_MS`] (16ms ≈ 60 FPS).
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `ATTACK_MS` | 300 | Sword swing duration |
//! | `ATTACK_COOLDOWN_MS` | 500 | Time before another swing |
//! | `PIRATE_ATTACK_MS` | 1000 | Pirate sword swing duration |
//! | `SLIDE_GRACE_MS` | 150 | Slide stays held this long after the last slide input |
//! | `DEFAULT_DAS_MS` | 170 | Delay before a held lane key repeats |
//! | `DEFAULT_ARR_MS` | 120 | Interval between lane repeats |
//!
//! # Examples
//!
//! ```
//! use pirate_run_types::{GameAction, Outcome, Phase, LANE_MAX, LANE_MIN};
//!
//! let action = GameAction::from_str("moveLeft").unwrap();
//! assert_eq!(action, GameAction::MoveLeft);
//! assert_eq!(action.as_str(), "moveLeft");
//!
//! assert!(Phase::Ended(Outcome::Defeated).is_ended());
//! assert_eq!(LANE_MAX - LANE_MIN, 2);
//! ```

/// Fixed timestep interval in milliseconds (16ms ≈ 60 FPS)
pub const TICK_MS: u32 = 16;

/// Leftmost lane index
pub const LANE_MIN: i8 = -1;

/// Rightmost lane index
pub const LANE_MAX: i8 = 1;

/// Distance between lane centres in world units
pub const LANE_WIDTH: f32 = 2.0;

/// Half width of the trail; the borders sit at ±this value
pub const TRAIL_HALF_WIDTH: f32 = 3.0;

/// Fraction of the remaining lateral gap closed each tick when changing lanes
pub const LANE_EASE: f32 = 0.2;

/// Forward speed at the start of a run (units per second)
pub const START_SPEED: f32 = 15.0;

/// Forward speed cap
pub const MAX_SPEED: f32 = 25.0;

/// Forward speed gained per second of running
pub const SPEED_RAMP_PER_SEC: f32 = 0.05;

/// Upward velocity applied by a jump
pub const JUMP_VELOCITY: f32 = 6.0;

/// Downward acceleration (units per second squared)
pub const GRAVITY: f32 = 18.0;

/// Distance at which the level is complete
pub const FINISH_DISTANCE: f32 = 745.0;

/// Starting and maximum health
pub const MAX_HEALTH: u32 = 100;

/// Points for picking up any coin
pub const COIN_SCORE: u32 = 50;

/// Health restored by a health coin
pub const HEALTH_COIN_HEAL: u32 = 10;

/// Health lost running into a barrel or crate
pub const OBSTACLE_DAMAGE: u32 = 20;

/// Health lost running into a pirate
pub const PIRATE_DAMAGE: u32 = 5;

/// Points for defeating a pirate
pub const PIRATE_DEFEAT_SCORE: u32 = 50;

/// Sword swing duration
pub const ATTACK_MS: u32 = 300;

/// Minimum time between sword swings
pub const ATTACK_COOLDOWN_MS: u32 = 500;

/// How far ahead (in Z) a swing reaches
pub const ATTACK_REACH: f32 = 3.0;

/// Pirate sword swing duration
pub const PIRATE_ATTACK_MS: u32 = 1000;

/// Idle pirates start a swing with probability 1 / this, rolled once per tick
pub const PIRATE_ATTACK_ODDS: u32 = 100;

/// Slide stays active for this long after the last slide input
pub const SLIDE_GRACE_MS: u32 = 150;

/// Delay before a held lane key starts repeating
pub const DEFAULT_DAS_MS: u32 = 170;

/// Interval between lane repeats once DAS has elapsed
pub const DEFAULT_ARR_MS: u32 = 120;

/// Slide repeat interval while the slide key is held
pub const SLIDE_ARR_MS: u32 = 50;

/// Game actions that can be applied to modify game state
///
/// These actions are used by both keyboard input and the control adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameAction {
    /// Leave the start screen and begin running
    Start,
    /// Shift one lane to the left
    MoveLeft,
    /// Shift one lane to the right
    MoveRight,
    /// Jump (only when grounded)
    Jump,
    /// Duck under a pirate's sword (held; see [`SLIDE_GRACE_MS`])
    Slide,
    /// Swing the sword
    Attack,
    /// Toggle pause state
    Pause,
    /// Restart the run from the same seed
    Restart,
}

impl GameAction {
    /// Parse action from string (for the control protocol)
    ///
    /// # Examples
    ///
    /// ```
    /// use pirate_run_types::GameAction;
    ///
    /// assert_eq!(GameAction::from_str("jump"), Some(GameAction::Jump));
    /// assert_eq!(GameAction::from_str("MOVERIGHT"), Some(GameAction::MoveRight));
    /// assert_eq!(GameAction::from_str("fly"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "start" => Some(GameAction::Start),
            "moveleft" => Some(GameAction::MoveLeft),
            "moveright" => Some(GameAction::MoveRight),
            "jump" => Some(GameAction::Jump),
            "slide" => Some(GameAction::Slide),
            "attack" => Some(GameAction::Attack),
            "pause" => Some(GameAction::Pause),
            "restart" => Some(GameAction::Restart),
            _ => None,
        }
    }

    /// Convert to camelCase string for the control protocol
    pub fn as_str(&self) -> &'static str {
        match self {
            GameAction::Start => "start",
            GameAction::MoveLeft => "moveLeft",
            GameAction::MoveRight => "moveRight",
            GameAction::Jump => "jump",
            GameAction::Slide => "slide",
            GameAction::Attack => "attack",
            GameAction::Pause => "pause",
            GameAction::Restart => "restart",
        }
    }
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Reached [`FINISH_DISTANCE`]
    LevelComplete,
    /// Health dropped to zero
    Defeated,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::LevelComplete => "level_complete",
            Outcome::Defeated => "defeated",
        }
    }
}

/// Lifecycle of a run
///
/// `Ready` is the start screen. `Running` and `Paused` toggle. `Ended` is terminal
/// until a restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Ready,
    Running,
    Paused,
    Ended(Outcome),
}

impl Phase {
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Phase::Paused)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Phase::Ended(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            Phase::Ended(o) => Some(*o),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Ready => "ready",
            Phase::Running => "running",
            Phase::Paused => "paused",
            Phase::Ended(_) => "ended",
        }
    }
}

/// Obstacle kinds placed on the trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObstacleKind {
    Barrel,
    Crate,
}

impl ObstacleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObstacleKind::Barrel => "barrel",
            ObstacleKind::Crate => "crate",
        }
    }
}

/// Coin kinds
///
/// Every coin scores; health coins also restore [`HEALTH_COIN_HEAL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoinKind {
    Gold,
    Health,
}

impl CoinKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinKind::Gold => "gold",
            CoinKind::Health => "health",
        }
    }
}

/// Core-side event emitted during a tick or an action.
///
/// Observers (logging, control adapter) drain these after each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    Started,
    Paused,
    Resumed,
    LaneChanged { lane: i8 },
    Jumped,
    Landed,
    Swung,
    CoinCollected { kind: CoinKind },
    ObstacleHit { kind: ObstacleKind },
    PirateDefeated { index: u16 },
    PirateHit { index: u16 },
    SwordDucked { index: u16 },
    Finished(Outcome),
}

impl GameEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameEvent::Started => "started",
            GameEvent::Paused => "paused",
            GameEvent::Resumed => "resumed",
            GameEvent::LaneChanged { .. } => "lane_changed",
            GameEvent::Jumped => "jumped",
            GameEvent::Landed => "landed",
            GameEvent::Swung => "swung",
            GameEvent::CoinCollected { .. } => "coin_collected",
            GameEvent::ObstacleHit { .. } => "obstacle_hit",
            GameEvent::PirateDefeated { .. } => "pirate_defeated",
            GameEvent::PirateHit { .. } => "pirate_hit",
            GameEvent::SwordDucked { .. } => "sword_ducked",
            GameEvent::Finished(_) => "finished",
        }
    }
}
