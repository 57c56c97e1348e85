use crate::player::Player;
use crate::types::{Phase, START_SPEED};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub lane: i8,
    pub health: u32,
    pub jumping: bool,
    pub sliding: bool,
    pub attacking: bool,
}

impl From<&Player> for PlayerSnapshot {
    fn from(value: &Player) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
            lane: value.lane,
            health: value.health,
            jumping: value.jumping,
            sliding: value.sliding,
            attacking: value.is_attacking(),
        }
    }
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        Self::from(&Player::new())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GameSnapshot {
    pub phase: Phase,
    pub episode_id: u32,
    pub seed: u32,
    /// Fixed ticks advanced in this episode
    pub step: u32,
    pub elapsed_ms: u64,
    pub player: PlayerSnapshot,
    pub speed: f32,
    pub distance: f32,
    pub score: u32,
    pub coins: u32,
    pub pirates_defeated: u32,
}

impl GameSnapshot {
    pub fn playable(&self) -> bool {
        self.phase.is_running()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Ready,
            episode_id: 0,
            seed: 0,
            step: 0,
            elapsed_ms: 0,
            player: PlayerSnapshot::default(),
            speed: START_SPEED,
            distance: 0.0,
            score: 0,
            coins: 0,
            pirates_defeated: 0,
        }
    }
}
