//! HUD model - what the heads-up display shows, derived from a snapshot
//!
//! Kept free of any drawing so the terminal view and the control adapter agree
//! on the same numbers.

use crate::snapshot::GameSnapshot;
use crate::types::{Outcome, MAX_SPEED};

/// Health above this is shown as good
pub const HEALTH_GOOD_ABOVE: u32 = 50;
/// Health above this (and not good) is shown as a warning
pub const HEALTH_WARNING_ABOVE: u32 = 20;
/// Below this the view may flash a low-health warning
pub const LOW_HEALTH_BELOW: u32 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HealthTier {
    Good,
    Warning,
    Critical,
}

impl HealthTier {
    pub fn from_health(health: u32) -> Self {
        if health > HEALTH_GOOD_ABOVE {
            HealthTier::Good
        } else if health > HEALTH_WARNING_ABOVE {
            HealthTier::Warning
        } else {
            HealthTier::Critical
        }
    }
}

/// End-of-run banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Banner {
    pub outcome: Outcome,
    pub final_score: u32,
    pub distance_m: u32,
}

impl Banner {
    pub fn title(&self) -> &'static str {
        match self.outcome {
            Outcome::LevelComplete => "LEVEL COMPLETE!",
            Outcome::Defeated => "GAME OVER!",
        }
    }

    pub fn subtitle(&self) -> &'static str {
        match self.outcome {
            Outcome::LevelComplete => "You reached the end of the trail!",
            Outcome::Defeated => "The pirates got you!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hud {
    pub score: u32,
    pub coins: u32,
    /// Floored distance in meters
    pub distance_m: u32,
    pub health: u32,
    pub tier: HealthTier,
    /// Speed bar fill, 0..=100
    pub speed_percent: f32,
    pub paused: bool,
    pub banner: Option<Banner>,
}

impl Hud {
    pub fn from_snapshot(s: &GameSnapshot) -> Self {
        let distance_m = s.distance.max(0.0).floor() as u32;
        Self {
            score: s.score,
            coins: s.coins,
            distance_m,
            health: s.player.health,
            tier: HealthTier::from_health(s.player.health),
            speed_percent: speed_percent(s.speed),
            paused: s.phase.is_paused(),
            banner: s.phase.outcome().map(|outcome| Banner {
                outcome,
                final_score: s.score,
                distance_m,
            }),
        }
    }

    pub fn low_health(&self) -> bool {
        self.health < LOW_HEALTH_BELOW
    }
}

pub fn speed_percent(speed: f32) -> f32 {
    speed.clamp(0.0, MAX_SPEED) / MAX_SPEED * 100.0
}
