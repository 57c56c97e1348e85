//! World module - the trail's obstacles, coins and pirates
//!
//! The layout is generated once per run from the game RNG and then only mutated
//! to mark entities as resolved (collected, struck, defeated...) and to drive the
//! pirates' sword swings. Entities are stored nearest-first (descending Z).
//! Entities the player has run past keep their flags unset; being behind the
//! player is enough to keep them out of play.
//!
//! Collision uses axis-aligned footprints on the X/Z plane; height is handled by
//! the caller (only obstacles can be jumped).

use crate::rng::SimpleRng;
use crate::types::{
    CoinKind, ObstacleKind, FINISH_DISTANCE, LANE_MAX, LANE_MIN, LANE_WIDTH, PIRATE_ATTACK_MS,
    PIRATE_ATTACK_ODDS,
};

/// Obstacles are unit cubes scaled down to this size
pub const OBSTACLE_SCALE: f32 = 0.6;

/// Top of an obstacle; a player above this height clears it
pub const OBSTACLE_HEIGHT: f32 = OBSTACLE_SCALE;

pub const COIN_HALF_EXTENT: f32 = 0.35;

pub const PIRATE_HALF_WIDTH: f32 = 0.4;
pub const PIRATE_HALF_DEPTH: f32 = 0.4;
pub const PIRATE_HEIGHT: f32 = 1.7;

/// Extra reach (towards the player) while a pirate is swinging
pub const PIRATE_SWORD_REACH: f32 = 1.0;

pub const FIRST_OBSTACLE_AT: f32 = 80.0;
pub const OBSTACLE_SPACING: f32 = 40.0;
pub const FIRST_COIN_AT: f32 = 30.0;
pub const COIN_SPACING: f32 = 15.0;
pub const FIRST_PIRATE_AT: f32 = 50.0;
pub const PIRATE_SPACING: f32 = 50.0;

/// Roughly one coin in this many restores health
pub const HEALTH_COIN_ODDS: u32 = 5;

/// Nothing is placed this close to the finish line
const FINISH_CLEARANCE: f32 = 10.0;

/// Two entities closer than this (in Z) must not share a lane
const LANE_CLEARANCE: f32 = 3.0;

/// Axis-aligned rectangle on the ground plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    pub x: f32,
    pub z: f32,
    pub half_w: f32,
    pub half_d: f32,
}

impl Footprint {
    pub fn new(x: f32, z: f32, half_w: f32, half_d: f32) -> Self {
        Self {
            x,
            z,
            half_w,
            half_d,
        }
    }

    pub fn overlaps(&self, other: &Footprint) -> bool {
        (self.x - other.x).abs() < self.half_w + other.half_w
            && (self.z - other.z).abs() < self.half_d + other.half_d
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    pub x: f32,
    pub z: f32,
    pub struck: bool,
}

impl Obstacle {
    pub fn footprint(&self) -> Footprint {
        let h = OBSTACLE_SCALE / 2.0;
        Footprint::new(self.x, self.z, h, h)
    }

    /// Display color (sRGB)
    pub fn color(&self) -> [u8; 3] {
        match self.kind {
            ObstacleKind::Barrel => [0x8b, 0x45, 0x13],
            ObstacleKind::Crate => [0x65, 0x43, 0x21],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coin {
    pub kind: CoinKind,
    pub x: f32,
    pub z: f32,
    pub collected: bool,
}

impl Coin {
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.x, self.z, COIN_HALF_EXTENT, COIN_HALF_EXTENT)
    }
}

/// How a pirate encounter was settled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PirateFate {
    /// Cut down by the player
    Defeated,
    /// Ran into the player and dealt damage
    Struck,
    /// Swung while the player slid underneath
    Ducked,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pirate {
    pub x: f32,
    pub z: f32,
    pub attack_ms: u32,
    pub fate: Option<PirateFate>,
}

impl Pirate {
    pub fn is_live(&self) -> bool {
        self.fate.is_none()
    }

    pub fn is_attacking(&self) -> bool {
        self.is_live() && self.attack_ms > 0
    }

    /// Body footprint, stretched towards the player while swinging.
    pub fn footprint(&self) -> Footprint {
        if self.is_attacking() {
            let half_d = PIRATE_HALF_DEPTH + PIRATE_SWORD_REACH / 2.0;
            Footprint::new(
                self.x,
                self.z + PIRATE_SWORD_REACH / 2.0,
                PIRATE_HALF_WIDTH,
                half_d,
            )
        } else {
            Footprint::new(self.x, self.z, PIRATE_HALF_WIDTH, PIRATE_HALF_DEPTH)
        }
    }
}

/// All entities on the trail for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub(crate) obstacles: Vec<Obstacle>,
    pub(crate) coins: Vec<Coin>,
    pub(crate) pirates: Vec<Pirate>,
}

impl World {
    /// An empty trail (handy for tests that place entities by hand).
    pub fn empty() -> Self {
        Self {
            obstacles: Vec::new(),
            coins: Vec::new(),
            pirates: Vec::new(),
        }
    }

    /// Lay out the trail from the RNG.
    ///
    /// Obstacles and pirates are placed first; a pirate sharing a row with an
    /// obstacle always takes a different lane, so every row keeps a way through.
    /// Coins then avoid any lane already occupied nearby.
    pub fn generate(rng: &mut SimpleRng) -> Self {
        let mut world = Self::empty();
        let last = FINISH_DISTANCE - FINISH_CLEARANCE;

        let mut d = FIRST_OBSTACLE_AT;
        let mut i = 0u32;
        while d <= last {
            let kind = if i % 2 == 0 {
                ObstacleKind::Barrel
            } else {
                ObstacleKind::Crate
            };
            let lane = rng.next_lane();
            world.obstacles.push(Obstacle {
                kind,
                x: lane_x(lane),
                z: -d,
                struck: false,
            });
            d += OBSTACLE_SPACING;
            i += 1;
        }

        let mut d = FIRST_PIRATE_AT;
        while d <= last {
            let mut lane = rng.next_lane();
            if world.lane_taken(lane, -d) {
                lane = next_free_lane(lane, rng);
            }
            world.pirates.push(Pirate {
                x: lane_x(lane),
                z: -d,
                attack_ms: 0,
                fate: None,
            });
            d += PIRATE_SPACING;
        }

        let mut d = FIRST_COIN_AT;
        while d <= last {
            let mut lane = rng.next_lane();
            let mut tries = 0;
            while world.lane_taken(lane, -d) && tries < 3 {
                lane = if lane == 1 { -1 } else { lane + 1 };
                tries += 1;
            }
            let kind = if rng.one_in(HEALTH_COIN_ODDS) {
                CoinKind::Health
            } else {
                CoinKind::Gold
            };
            if tries < 3 {
                world.coins.push(Coin {
                    kind,
                    x: lane_x(lane),
                    z: -d,
                    collected: false,
                });
            }
            d += COIN_SPACING;
        }

        world
    }

    fn lane_taken(&self, lane: i8, z: f32) -> bool {
        let x = lane_x(lane);
        let near = |ex: f32, ez: f32| (ex - x).abs() < 0.01 && (ez - z).abs() < LANE_CLEARANCE;
        self.obstacles.iter().any(|o| near(o.x, o.z)) || self.pirates.iter().any(|p| near(p.x, p.z))
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn pirates(&self) -> &[Pirate] {
        &self.pirates
    }

    pub fn push_obstacle(&mut self, kind: ObstacleKind, lane: i8, distance: f32) {
        self.obstacles.push(Obstacle {
            kind,
            x: lane_x(lane),
            z: -distance,
            struck: false,
        });
    }

    pub fn push_coin(&mut self, kind: CoinKind, lane: i8, distance: f32) {
        self.coins.push(Coin {
            kind,
            x: lane_x(lane),
            z: -distance,
            collected: false,
        });
    }

    pub fn push_pirate(&mut self, lane: i8, distance: f32) {
        self.pirates.push(Pirate {
            x: lane_x(lane),
            z: -distance,
            attack_ms: 0,
            fate: None,
        });
    }

    /// Advance pirate swing timers and roll new swings for idle pirates.
    ///
    /// Only pirates within `horizon` units ahead of `player_z` roll, so the RNG
    /// stream does not depend on how many pirates are far away.
    pub fn update_pirates(&mut self, elapsed_ms: u32, player_z: f32, horizon: f32, rng: &mut SimpleRng) {
        for p in self.pirates.iter_mut().filter(|p| p.is_live()) {
            if p.attack_ms > 0 {
                p.attack_ms = p.attack_ms.saturating_sub(elapsed_ms);
                continue;
            }
            let ahead = player_z - p.z;
            if (0.0..=horizon).contains(&ahead) && rng.one_in(PIRATE_ATTACK_ODDS) {
                p.attack_ms = PIRATE_ATTACK_MS;
            }
        }
    }

    /// Live entity count (not yet resolved), for HUD/debug purposes.
    pub fn remaining_coins(&self) -> usize {
        self.coins.iter().filter(|c| !c.collected).count()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::generate(&mut SimpleRng::default())
    }
}

/// World X of a lane centre.
pub fn lane_x(lane: i8) -> f32 {
    lane as f32 * LANE_WIDTH
}

/// Nearest lane to a world X, clamped to the trail.
pub fn lane_at(x: f32) -> i8 {
    ((x / LANE_WIDTH).round() as i8).clamp(LANE_MIN, LANE_MAX)
}

fn next_free_lane(taken: i8, rng: &mut SimpleRng) -> i8 {
    // Pick one of the two other lanes.
    let step = 1 + rng.next_range(2) as i8;
    (taken + 1 + step) % 3 - 1
}
