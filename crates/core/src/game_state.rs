//! Game state module - manages the complete run
//!
//! This module ties together the world layout, the player, the camera and the
//! RNG. It owns the run lifecycle (ready, running, paused, ended), forward speed,
//! scoring and hit resolution.

use arrayvec::ArrayVec;

use crate::camera::Camera;
use crate::player::Player;
use crate::rng::SimpleRng;
use crate::snapshot::{GameSnapshot, PlayerSnapshot};
use crate::types::*;
use crate::world::{PirateFate, World, OBSTACLE_HEIGHT};

/// Pirates further ahead than this don't roll for attacks
pub const PIRATE_AWARENESS: f32 = 30.0;

/// Maximum events buffered between two `take_events` calls
pub const EVENT_CAPACITY: usize = 32;

pub type EventBuffer = ArrayVec<GameEvent, EVENT_CAPACITY>;

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    seed: u32,
    rng: SimpleRng,
    world: World,
    player: Player,
    camera: Camera,
    phase: Phase,
    /// Monotonic episode id (increments on restart).
    episode_id: u32,
    /// Fixed ticks advanced in the current episode.
    step: u32,
    elapsed_ms: u64,
    speed: f32,
    distance: f32,
    score: u32,
    coins: u32,
    pirates_defeated: u32,
    /// Events since the last `take_events` (overflow is dropped).
    events: EventBuffer,
}

impl GameState {
    /// Create a new run with the given RNG seed
    pub fn new(seed: u32) -> Self {
        let mut rng = SimpleRng::new(seed);
        let world = World::generate(&mut rng);
        Self::from_parts(seed, rng, world)
    }

    /// Create a run over a hand-built world.
    ///
    /// The seed still drives pirate attack rolls. A restart regenerates the
    /// layout from the seed.
    pub fn with_world(seed: u32, world: World) -> Self {
        Self::from_parts(seed, SimpleRng::new(seed), world)
    }

    fn from_parts(seed: u32, rng: SimpleRng, world: World) -> Self {
        Self {
            seed,
            rng,
            world,
            player: Player::new(),
            camera: Camera::new(),
            phase: Phase::Ready,
            episode_id: 0,
            step: 0,
            elapsed_ms: 0,
            speed: START_SPEED,
            distance: 0.0,
            score: 0,
            coins: 0,
            pirates_defeated: 0,
            events: ArrayVec::new(),
        }
    }

    /// Leave the start screen
    pub fn start(&mut self) -> bool {
        if self.phase != Phase::Ready {
            return false;
        }
        self.phase = Phase::Running;
        self.push_event(GameEvent::Started);
        true
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn paused(&self) -> bool {
        self.phase.is_paused()
    }

    pub fn ended(&self) -> bool {
        self.phase.is_ended()
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn step(&self) -> u32 {
        self.step
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn pirates_defeated(&self) -> u32 {
        self.pirates_defeated
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// Events emitted since the previous call.
    pub fn take_events(&mut self) -> EventBuffer {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    pub fn snapshot_into(&self, out: &mut GameSnapshot) {
        out.phase = self.phase;
        out.episode_id = self.episode_id;
        out.seed = self.seed;
        out.step = self.step;
        out.elapsed_ms = self.elapsed_ms;
        out.player = PlayerSnapshot::from(&self.player);
        out.speed = self.speed;
        out.distance = self.distance;
        out.score = self.score;
        out.coins = self.coins;
        out.pirates_defeated = self.pirates_defeated;
    }

    pub fn snapshot(&self) -> GameSnapshot {
        let mut s = GameSnapshot::default();
        self.snapshot_into(&mut s);
        s
    }

    /// Apply one action. Returns true if it changed the state.
    pub fn apply_action(&mut self, action: GameAction) -> bool {
        match action {
            GameAction::Start => self.start(),
            GameAction::Pause => self.toggle_pause(),
            GameAction::Restart => {
                self.restart();
                true
            }
            _ if !self.phase.is_running() => false,
            GameAction::MoveLeft | GameAction::MoveRight => {
                let dir = if action == GameAction::MoveLeft { -1 } else { 1 };
                if !self.player.shift_lane(dir) {
                    return false;
                }
                self.push_event(GameEvent::LaneChanged {
                    lane: self.player.lane,
                });
                true
            }
            GameAction::Jump => {
                if !self.player.jump() {
                    return false;
                }
                self.push_event(GameEvent::Jumped);
                true
            }
            GameAction::Slide => {
                self.player.set_sliding(true);
                self.player.sliding
            }
            GameAction::Attack => {
                if !self.player.attack() {
                    return false;
                }
                self.push_event(GameEvent::Swung);
                self.resolve_swing();
                true
            }
        }
    }

    fn toggle_pause(&mut self) -> bool {
        match self.phase {
            Phase::Running => {
                self.phase = Phase::Paused;
                self.push_event(GameEvent::Paused);
                true
            }
            Phase::Paused => {
                self.phase = Phase::Running;
                self.push_event(GameEvent::Resumed);
                true
            }
            _ => false,
        }
    }

    /// Rebuild the run from the same seed and start it immediately.
    pub fn restart(&mut self) {
        let episode_id = self.episode_id.wrapping_add(1);
        *self = Self::new(self.seed);
        self.episode_id = episode_id;
        self.phase = Phase::Running;
        self.push_event(GameEvent::Started);
    }

    /// Main game tick. Returns true if the simulation advanced.
    pub fn tick(&mut self, elapsed_ms: u32, slide_held: bool) -> bool {
        if !self.phase.is_running() {
            return false;
        }

        if self.distance >= FINISH_DISTANCE {
            self.finish(Outcome::LevelComplete);
            return false;
        }

        let dt = elapsed_ms as f32 / 1000.0;
        self.step = self.step.wrapping_add(1);
        self.elapsed_ms += elapsed_ms as u64;

        self.speed = (self.speed + SPEED_RAMP_PER_SEC * dt).min(MAX_SPEED);

        self.player.set_sliding(slide_held);
        if self.player.step(elapsed_ms) {
            self.push_event(GameEvent::Landed);
        }
        let advance = self.speed * dt;
        self.player.z -= advance;
        self.distance += advance;

        self.world
            .update_pirates(elapsed_ms, self.player.z, PIRATE_AWARENESS, &mut self.rng);

        self.resolve_collisions();

        if !self.player.is_alive() {
            self.finish(Outcome::Defeated);
        }

        self.camera.follow(&self.player);
        true
    }

    fn finish(&mut self, outcome: Outcome) {
        self.phase = Phase::Ended(outcome);
        self.push_event(GameEvent::Finished(outcome));
    }

    /// A fresh swing cuts down the nearest live pirate within reach ahead.
    fn resolve_swing(&mut self) {
        let px = self.player.x;
        let pz = self.player.z;

        let target = self
            .world
            .pirates
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_live())
            .filter(|(_, p)| (p.x - px).abs() < LANE_WIDTH)
            .map(|(i, p)| (i, pz - p.z))
            .filter(|(_, ahead)| (0.0..=ATTACK_REACH).contains(ahead))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i);

        if let Some(i) = target {
            self.world.pirates[i].fate = Some(PirateFate::Defeated);
            self.score += PIRATE_DEFEAT_SCORE;
            self.pirates_defeated += 1;
            self.push_event(GameEvent::PirateDefeated { index: i as u16 });
        }
    }

    fn resolve_collisions(&mut self) {
        let body = self.player.footprint();

        for coin in self.world.coins.iter_mut() {
            if coin.collected || !body.overlaps(&coin.footprint()) {
                continue;
            }
            coin.collected = true;
            self.score += COIN_SCORE;
            self.coins += 1;
            if coin.kind == CoinKind::Health {
                self.player.heal(HEALTH_COIN_HEAL);
            }
            let _ = self
                .events
                .try_push(GameEvent::CoinCollected { kind: coin.kind });
        }

        for obstacle in self.world.obstacles.iter_mut() {
            if obstacle.struck || self.player.y >= OBSTACLE_HEIGHT {
                continue;
            }
            if !body.overlaps(&obstacle.footprint()) {
                continue;
            }
            obstacle.struck = true;
            self.player.damage(OBSTACLE_DAMAGE);
            let _ = self.events.try_push(GameEvent::ObstacleHit {
                kind: obstacle.kind,
            });
        }

        for (i, pirate) in self.world.pirates.iter_mut().enumerate() {
            if !pirate.is_live() || !body.overlaps(&pirate.footprint()) {
                continue;
            }
            let index = i as u16;
            let event = if self.player.is_attacking() {
                pirate.fate = Some(PirateFate::Defeated);
                self.score += PIRATE_DEFEAT_SCORE;
                self.pirates_defeated += 1;
                GameEvent::PirateDefeated { index }
            } else if pirate.is_attacking() && self.player.sliding {
                pirate.fate = Some(PirateFate::Ducked);
                GameEvent::SwordDucked { index }
            } else {
                pirate.fate = Some(PirateFate::Struck);
                self.player.damage(PIRATE_DAMAGE);
                GameEvent::PirateHit { index }
            };
            let _ = self.events.try_push(event);
        }
    }

    fn push_event(&mut self, event: GameEvent) {
        let _ = self.events.try_push(event);
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}
