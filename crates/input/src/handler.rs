//! Held-key input handler for terminal environments.
//!
//! Lane keys repeat after a delay (DAS/ARR) so a held key walks across lanes.
//! The slide key repeats every [`SLIDE_ARR_MS`] while held, which keeps the
//! game's slide grace window open.
//!
//! Supports terminals that do not emit key release events by using a timeout.

use std::time::Instant;

use arrayvec::ArrayVec;
use crossterm::event::KeyCode;

use crate::types::{GameAction, DEFAULT_ARR_MS, DEFAULT_DAS_MS, SLIDE_ARR_MS};

/// Direction for lane movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDirection {
    Left,
    Right,
    None,
}

/// Tracks held keys for DAS/ARR handling.
#[derive(Debug, Clone)]
pub struct InputHandler {
    lane: LaneDirection,
    slide_held: bool,
    last_key_time: Instant,
    lane_das_timer: u32,
    lane_arr_accumulator: u32,
    slide_arr_accumulator: u32,
    das_delay: u32,
    arr_rate: u32,
    key_release_timeout_ms: u32,
}

// In terminals without key-release events, a short timeout prevents a single tap
// from turning into a sustained "held" state.
const DEFAULT_KEY_RELEASE_TIMEOUT_MS: u32 = 150;

fn is_left(code: KeyCode) -> bool {
    matches!(code, KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A'))
}

fn is_right(code: KeyCode) -> bool {
    matches!(code, KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D'))
}

fn is_slide(code: KeyCode) -> bool {
    matches!(code, KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S'))
}

impl InputHandler {
    pub fn new() -> Self {
        Self::with_config(DEFAULT_DAS_MS, DEFAULT_ARR_MS)
    }

    pub fn with_config(das_delay: u32, arr_rate: u32) -> Self {
        Self {
            lane: LaneDirection::None,
            slide_held: false,
            last_key_time: Instant::now(),
            lane_das_timer: 0,
            lane_arr_accumulator: 0,
            slide_arr_accumulator: 0,
            das_delay,
            arr_rate: arr_rate.max(1),
            key_release_timeout_ms: DEFAULT_KEY_RELEASE_TIMEOUT_MS,
        }
    }

    pub fn with_key_release_timeout_ms(mut self, timeout_ms: u32) -> Self {
        self.key_release_timeout_ms = timeout_ms;
        self
    }

    pub fn key_release_timeout_ms(&self) -> u32 {
        self.key_release_timeout_ms
    }

    pub fn slide_held(&self) -> bool {
        self.slide_held
    }

    pub fn lane_direction(&self) -> LaneDirection {
        self.lane
    }

    /// Returns the action for a fresh press; repeats of a held key return None.
    pub fn handle_key_press(&mut self, code: KeyCode) -> Option<GameAction> {
        let (dir, action) = if is_left(code) {
            (LaneDirection::Left, GameAction::MoveLeft)
        } else if is_right(code) {
            (LaneDirection::Right, GameAction::MoveRight)
        } else if is_slide(code) {
            self.last_key_time = Instant::now();
            if self.slide_held {
                return None;
            }
            self.slide_held = true;
            self.slide_arr_accumulator = 0;
            return Some(GameAction::Slide);
        } else {
            return None;
        };

        self.last_key_time = Instant::now();
        if self.lane == dir {
            return None;
        }
        self.lane = dir;
        self.lane_das_timer = 0;
        self.lane_arr_accumulator = 0;
        Some(action)
    }

    pub fn handle_key_release(&mut self, code: KeyCode) {
        if (is_left(code) && self.lane == LaneDirection::Left)
            || (is_right(code) && self.lane == LaneDirection::Right)
        {
            self.release_lane();
        } else if is_slide(code) {
            self.release_slide();
        }
    }

    fn release_lane(&mut self) {
        self.lane = LaneDirection::None;
        self.lane_das_timer = 0;
        self.lane_arr_accumulator = 0;
    }

    fn release_slide(&mut self) {
        self.slide_held = false;
        self.slide_arr_accumulator = 0;
    }

    /// Advance timers and return the repeat actions due this frame.
    pub fn update(&mut self, elapsed_ms: u32) -> ArrayVec<GameAction, 32> {
        let mut actions = ArrayVec::<GameAction, 32>::new();

        // Auto-release when terminal does not emit release events.
        let since_last_key = self.last_key_time.elapsed().as_millis() as u32;
        if since_last_key > self.key_release_timeout_ms {
            if self.lane != LaneDirection::None {
                self.release_lane();
            }
            if self.slide_held {
                self.release_slide();
            }
        }

        let repeat = match self.lane {
            LaneDirection::Left => Some(GameAction::MoveLeft),
            LaneDirection::Right => Some(GameAction::MoveRight),
            LaneDirection::None => None,
        };
        if let Some(action) = repeat {
            let prev_das = self.lane_das_timer;
            self.lane_das_timer += elapsed_ms;

            if self.lane_das_timer >= self.das_delay {
                let excess = if prev_das < self.das_delay {
                    self.lane_das_timer - self.das_delay
                } else {
                    elapsed_ms
                };
                self.lane_arr_accumulator += excess;

                while self.lane_arr_accumulator >= self.arr_rate {
                    let _ = actions.try_push(action);
                    self.lane_arr_accumulator -= self.arr_rate;
                }
            }
        }

        if self.slide_held {
            self.slide_arr_accumulator += elapsed_ms;
            while self.slide_arr_accumulator >= SLIDE_ARR_MS {
                let _ = actions.try_push(GameAction::Slide);
                self.slide_arr_accumulator -= SLIDE_ARR_MS;
            }
        }

        actions
    }

    pub fn reset(&mut self) {
        self.release_lane();
        self.release_slide();
        self.last_key_time = Instant::now();
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_lane_das_arr_repeats_after_delay() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        assert_eq!(ih.handle_key_press(KeyCode::Left), Some(GameAction::MoveLeft));
        assert_eq!(ih.handle_key_press(KeyCode::Left), None);

        // Before DAS expires: no repeats.
        assert!(ih.update(99).is_empty());

        // Exactly at DAS: still no repeats.
        assert!(ih.update(1).is_empty());

        assert_eq!(ih.update(25).as_slice(), &[GameAction::MoveLeft]);
        assert_eq!(ih.update(50).as_slice(), &[GameAction::MoveLeft, GameAction::MoveLeft]);
    }

    #[test]
    fn test_switching_direction_fires_immediately() {
        let mut ih = InputHandler::new();
        assert_eq!(ih.handle_key_press(KeyCode::Char('a')), Some(GameAction::MoveLeft));
        assert_eq!(ih.handle_key_press(KeyCode::Char('d')), Some(GameAction::MoveRight));
        assert_eq!(ih.lane_direction(), LaneDirection::Right);
    }

    #[test]
    fn test_release_of_other_direction_is_ignored() {
        let mut ih = InputHandler::new();
        ih.handle_key_press(KeyCode::Right);
        ih.handle_key_release(KeyCode::Left);
        assert_eq!(ih.lane_direction(), LaneDirection::Right);
        ih.handle_key_release(KeyCode::Right);
        assert_eq!(ih.lane_direction(), LaneDirection::None);
    }

    #[test]
    fn test_slide_repeats_while_held() {
        let mut ih = InputHandler::new().with_key_release_timeout_ms(10_000);

        assert_eq!(ih.handle_key_press(KeyCode::Down), Some(GameAction::Slide));
        assert!(ih.slide_held());

        assert!(ih.update(SLIDE_ARR_MS - 1).is_empty());
        assert_eq!(ih.update(1).as_slice(), &[GameAction::Slide]);
        assert_eq!(
            ih.update(SLIDE_ARR_MS * 2).as_slice(),
            &[GameAction::Slide, GameAction::Slide]
        );

        ih.handle_key_release(KeyCode::Down);
        assert!(!ih.slide_held());
        assert!(ih.update(SLIDE_ARR_MS * 4).is_empty());
    }

    #[test]
    fn test_auto_release_triggers_after_timeout_without_key_release_events() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(50);

        ih.handle_key_press(KeyCode::Left);
        ih.handle_key_press(KeyCode::Down);

        // Simulate no key-release events by moving the last key time into the past.
        ih.last_key_time = Instant::now() - Duration::from_millis(51);

        assert!(ih.update(0).is_empty());
        assert_eq!(ih.lane_direction(), LaneDirection::None);
        assert!(!ih.slide_held());
    }

    #[test]
    fn test_non_held_key_does_not_extend_auto_release_timeout() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(50);

        ih.handle_key_press(KeyCode::Left);
        ih.last_key_time = Instant::now() - Duration::from_millis(51);
        assert_eq!(ih.handle_key_press(KeyCode::Up), None);

        assert!(ih.update(0).is_empty());
        assert_eq!(ih.lane_direction(), LaneDirection::None);
    }

    #[test]
    fn test_default_key_release_timeout_is_non_zero() {
        let ih = InputHandler::new();
        assert!(ih.key_release_timeout_ms() > 0);
    }

    #[test]
    fn test_reset_clears_held_state_and_stops_repeats() {
        let mut ih = InputHandler::with_config(100, 25).with_key_release_timeout_ms(10_000);

        ih.handle_key_press(KeyCode::Left);
        ih.handle_key_press(KeyCode::Down);
        assert!(!ih.update(200).is_empty(), "expected repeats before reset");

        ih.reset();
        assert!(ih.update(200).is_empty(), "reset should stop repeats");
    }
}
