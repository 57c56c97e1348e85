//! Redraw throttling for static screens.
//!
//! While the run is moving every frame differs, so every frame is drawn. On the
//! start, pause and end screens nothing moves; those are redrawn when their
//! content changes and otherwise only every `min_static_interval_ms`.

use crate::core::GameSnapshot;

#[derive(Debug, Clone)]
pub struct RenderThrottle {
    min_static_interval_ms: u64,
    last_render_ms: u64,
    last_fingerprint: u64,
    has_rendered: bool,
}

impl RenderThrottle {
    pub fn new(min_static_interval_ms: u64) -> Self {
        Self {
            min_static_interval_ms,
            last_render_ms: 0,
            last_fingerprint: 0,
            has_rendered: false,
        }
    }

    /// Decide whether to render a new frame.
    ///
    /// - When `is_static=false`: always render.
    /// - When `is_static=true`: render immediately on fingerprint change, otherwise at most
    ///   once per `min_static_interval_ms`.
    pub fn should_render(&mut self, now_ms: u64, fingerprint: u64, is_static: bool) -> bool {
        let due = !self.has_rendered
            || !is_static
            || fingerprint != self.last_fingerprint
            || now_ms.saturating_sub(self.last_render_ms) >= self.min_static_interval_ms;
        if due {
            self.has_rendered = true;
            self.last_render_ms = now_ms;
            self.last_fingerprint = fingerprint;
        }
        due
    }

    /// Same as [`should_render`](Self::should_render), deriving the inputs from a snapshot.
    pub fn should_render_snapshot(&mut self, now_ms: u64, snap: &GameSnapshot) -> bool {
        self.should_render(now_ms, fingerprint(snap), !snap.playable())
    }

    /// Force the next call to render (e.g. after a resize).
    pub fn reset(&mut self) {
        self.has_rendered = false;
    }
}

/// FNV-1a over the fields visible on static screens.
pub fn fingerprint(snap: &GameSnapshot) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    let phase_tag: u32 = match snap.phase.outcome() {
        Some(o) => 10 + o as u32,
        None => snap.phase.is_paused() as u32 + 2 * snap.phase.is_running() as u32,
    };
    let fields = [
        phase_tag,
        snap.episode_id,
        snap.score,
        snap.coins,
        snap.player.health,
        snap.distance.floor() as u32,
        snap.player.lane as u32,
    ];

    let mut h = OFFSET;
    for v in fields {
        for b in v.to_le_bytes() {
            h ^= b as u64;
            h = h.wrapping_mul(PRIME);
        }
    }
    h
}
