//! Player module - the runner's physical state
//!
//! Lane changes, jumping, sliding and the sword swing live here. Forward motion
//! is owned by [`GameState`](crate::GameState), which moves `z` by the current speed.

use crate::world::Footprint;
use crate::types::{
    ATTACK_COOLDOWN_MS, ATTACK_MS, GRAVITY, JUMP_VELOCITY, LANE_EASE, LANE_MAX, LANE_MIN,
    LANE_WIDTH, MAX_HEALTH,
};

pub const PLAYER_HALF_WIDTH: f32 = 0.4;
pub const PLAYER_HALF_DEPTH: f32 = 0.3;
pub const PLAYER_HEIGHT: f32 = 1.6;

/// Height while sliding
pub const SLIDE_HEIGHT: f32 = 0.6;

/// Walk bob amplitude and frequency (visual only)
const BOB_AMPLITUDE: f32 = 0.1;
const BOB_FREQUENCY: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Player {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Vertical velocity (units/s)
    pub vy: f32,
    pub lane: i8,
    pub health: u32,
    pub jumping: bool,
    pub sliding: bool,
    /// Remaining swing time
    pub attack_ms: u32,
    /// Remaining time before another swing is allowed
    pub cooldown_ms: u32,
}

impl Player {
    pub fn new() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            vy: 0.0,
            lane: 0,
            health: MAX_HEALTH,
            jumping: false,
            sliding: false,
            attack_ms: 0,
            cooldown_ms: 0,
        }
    }

    pub fn is_grounded(&self) -> bool {
        !self.jumping && self.y <= 0.0
    }

    pub fn is_attacking(&self) -> bool {
        self.attack_ms > 0
    }

    pub fn can_attack(&self) -> bool {
        self.cooldown_ms == 0
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// X of the lane the player is heading for
    pub fn target_x(&self) -> f32 {
        self.lane as f32 * LANE_WIDTH
    }

    /// Move one lane left (`dir < 0`) or right (`dir > 0`).
    pub fn shift_lane(&mut self, dir: i8) -> bool {
        let lane = (self.lane + dir.signum()).clamp(LANE_MIN, LANE_MAX);
        if lane == self.lane {
            return false;
        }
        self.lane = lane;
        true
    }

    pub fn jump(&mut self) -> bool {
        if !self.is_grounded() {
            return false;
        }
        self.jumping = true;
        self.sliding = false;
        self.vy = JUMP_VELOCITY;
        true
    }

    pub fn set_sliding(&mut self, held: bool) {
        self.sliding = held && self.is_grounded();
    }

    pub fn attack(&mut self) -> bool {
        if !self.can_attack() {
            return false;
        }
        self.attack_ms = ATTACK_MS;
        self.cooldown_ms = ATTACK_COOLDOWN_MS;
        true
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount).min(MAX_HEALTH);
    }

    pub fn damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
    }

    /// Advance physics by `elapsed_ms`. Returns true on the tick the player lands.
    pub fn step(&mut self, elapsed_ms: u32) -> bool {
        let dt = elapsed_ms as f32 / 1000.0;

        self.attack_ms = self.attack_ms.saturating_sub(elapsed_ms);
        self.cooldown_ms = self.cooldown_ms.saturating_sub(elapsed_ms);

        self.x += (self.target_x() - self.x) * LANE_EASE;

        let mut landed = false;
        if self.jumping {
            self.vy -= GRAVITY * dt;
            self.y += self.vy * dt;
            if self.y <= 0.0 {
                self.y = 0.0;
                self.vy = 0.0;
                self.jumping = false;
                landed = true;
            }
        }
        landed
    }

    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.x, self.z, PLAYER_HALF_WIDTH, PLAYER_HALF_DEPTH)
    }

    pub fn height(&self) -> f32 {
        if self.sliding {
            SLIDE_HEIGHT
        } else {
            PLAYER_HEIGHT
        }
    }

    /// Height to draw the player at, including the walk bob.
    pub fn visual_y(&self, elapsed_secs: f32) -> f32 {
        if self.is_grounded() && !self.sliding {
            (elapsed_secs * BOB_FREQUENCY).sin() * BOB_AMPLITUDE
        } else {
            self.y
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}
