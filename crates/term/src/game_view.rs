//! GameView: maps `core::GameState` into a terminal framebuffer.
//!
//! The left part of the screen is the 3D scene (trail, entities, player) drawn
//! through the chase camera; the right part is the HUD panel. Start, pause and
//! end screens are drawn as overlays on top of the scene.
//!
//! This module is pure (no I/O). It can be unit-tested.

use arrayvec::ArrayVec;
use glam::Vec3;

use crate::core::player::{PLAYER_HALF_WIDTH, SLIDE_HEIGHT};
use crate::core::world::{
    COIN_HALF_EXTENT, OBSTACLE_HEIGHT, OBSTACLE_SCALE, PIRATE_HALF_WIDTH, PIRATE_HEIGHT,
};
use crate::core::{GameState, HealthTier, Hud};
use crate::fb::{Cell, CellStyle, FrameBuffer, Rgb};
use crate::projection::Projector;
use crate::types::{
    CoinKind, ObstacleKind, Outcome, Phase, FINISH_DISTANCE, LANE_WIDTH, TRAIL_HALF_WIDTH,
};

/// Terminal viewport dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u16,
    pub height: u16,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterStatusView {
    pub enabled: bool,
    /// The adapter was requested but its listener could not start
    pub failed: bool,
    pub client_count: u16,
    pub controller_id: Option<usize>,
    pub streaming_count: u16,
}

/// Width of the HUD panel in columns
pub const PANEL_WIDTH: u16 = 24;

/// Below this the panel is dropped and the scene takes the full width
const MIN_SCENE_WIDTH: u16 = 30;

/// How far ahead of the player the scene is drawn
const VIEW_DISTANCE: f32 = 150.0;

/// Entities beyond this are not drawn
const SPRITE_DISTANCE: f32 = 110.0;

const FOG_DISTANCE: f32 = 160.0;

/// Trail stripes alternate every this many units
const STRIPE_LENGTH: f32 = 5.0;

const SPEED_BAR_HEIGHT: u16 = 8;

const SKY_TOP: Rgb = Rgb::new(96, 170, 226);
const SKY_HORIZON: Rgb = Rgb::new(200, 228, 246);
const GRASS: Rgb = Rgb::new(58, 130, 52);
const SAND: Rgb = Rgb::new(196, 176, 124);
const SAND_DARK: Rgb = Rgb::new(182, 160, 110);
const TRAIL_EDGE: Rgb = Rgb::new(112, 80, 48);
const COIN_GOLD: Rgb = Rgb::new(0xff, 0xd7, 0x00);
const COIN_HEALTH: Rgb = Rgb::new(235, 70, 80);
const PIRATE_COAT: Rgb = Rgb::new(120, 24, 28);
const PIRATE_HAT: Rgb = Rgb::new(24, 24, 28);
const SWORD: Rgb = Rgb::new(210, 214, 224);
const PLAYER_SHIRT: Rgb = Rgb::new(220, 40, 40);
const PLAYER_OVERALLS: Rgb = Rgb::new(40, 70, 200);

const PANEL_BG: Rgb = Rgb::new(12, 14, 22);
const TEXT: Rgb = Rgb::new(220, 220, 220);
const GOOD: Rgb = Rgb::new(80, 210, 100);
const WARNING: Rgb = Rgb::new(240, 200, 60);
const CRITICAL: Rgb = Rgb::new(240, 70, 70);

#[derive(Debug, Clone, Copy, PartialEq)]
enum Look {
    Obstacle { color: Rgb, ch: char, struck: bool },
    Coin(CoinKind),
    Pirate { attacking: bool },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sprite {
    pos: Vec3,
    half_w: f32,
    height: f32,
    look: Look,
}

/// A lightweight terminal renderer for the run.
pub struct GameView {
    panel_w: u16,
}

impl Default for GameView {
    fn default() -> Self {
        Self {
            panel_w: PANEL_WIDTH,
        }
    }
}

impl GameView {
    pub fn new(panel_w: u16) -> Self {
        Self { panel_w }
    }

    /// Render the current game state into an existing framebuffer.
    ///
    /// Callers can reuse a framebuffer across frames and only resize when the
    /// terminal size changes.
    pub fn render_into(&self, game: &GameState, viewport: Viewport, fb: &mut FrameBuffer) {
        self.render_into_with_adapter(game, None, viewport, fb);
    }

    pub fn render_into_with_adapter(
        &self,
        game: &GameState,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
        fb: &mut FrameBuffer,
    ) {
        fb.resize(viewport.width, viewport.height);
        fb.clear(CellStyle::default().into_cell(' '));

        let hud = Hud::from_snapshot(&game.snapshot());
        let scene_w = self.scene_width(viewport);

        self.draw_scene(fb, game, scene_w, viewport.height);

        if scene_w < viewport.width {
            self.draw_panel(fb, game, &hud, adapter, scene_w, viewport);
        }

        match game.phase() {
            Phase::Ready => self.draw_start_screen(fb, scene_w, viewport.height),
            Phase::Paused => self.draw_pause_screen(fb, &hud, scene_w, viewport.height),
            Phase::Ended(_) => self.draw_end_screen(fb, &hud, scene_w, viewport.height),
            Phase::Running => {}
        }
    }

    /// Convenience helper that allocates a new framebuffer.
    pub fn render(&self, game: &GameState, viewport: Viewport) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into(game, viewport, &mut fb);
        fb
    }

    pub fn render_with_adapter(
        &self,
        game: &GameState,
        adapter: Option<&AdapterStatusView>,
        viewport: Viewport,
    ) -> FrameBuffer {
        let mut fb = FrameBuffer::new(viewport.width, viewport.height);
        self.render_into_with_adapter(game, adapter, viewport, &mut fb);
        fb
    }

    pub fn scene_width(&self, viewport: Viewport) -> u16 {
        if viewport.width >= self.panel_w + MIN_SCENE_WIDTH {
            viewport.width - self.panel_w
        } else {
            viewport.width
        }
    }

    fn draw_scene(&self, fb: &mut FrameBuffer, game: &GameState, w: u16, h: u16) {
        if w == 0 || h == 0 {
            return;
        }
        let pr = Projector::new(game.camera(), 0, 0, w, h);
        let player = game.player();

        // Sky gradient, then grass from the horizon down.
        let horizon = pr
            .project(Vec3::new(0.0, 0.0, player.z - FOG_DISTANCE * 4.0))
            .map(|sp| sp.row().clamp(0, h as i32))
            .unwrap_or(h as i32 / 3) as u16;
        for y in 0..h {
            let color = if y < horizon {
                SKY_TOP.lerp(SKY_HORIZON, y as f32 / horizon.max(1) as f32)
            } else {
                let t = (y - horizon) as f32 / (h - horizon).max(1) as f32;
                GRASS.lerp(SKY_HORIZON, 0.35 * (1.0 - t))
            };
            fb.fill_span(y, 0, w as i32, ' ', CellStyle::new(color, color));
        }

        self.draw_trail(fb, &pr, player.z, w, h);

        let mut sprites: ArrayVec<(f32, Sprite), 64> = ArrayVec::new();
        collect_sprites(game, &mut sprites);
        sprites.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));
        for (_, sprite) in sprites.iter() {
            draw_sprite(fb, &pr, sprite, w);
        }

        self.draw_player(fb, &pr, game, w);
    }

    fn draw_trail(&self, fb: &mut FrameBuffer, pr: &Projector, player_z: f32, w: u16, h: u16) {
        // Slices from far to near; rows between consecutive slices are filled by
        // interpolating the trail edges so close-up rows have no gaps.
        let mut prev: Option<(i32, f32, f32)> = None;
        let mut dist = VIEW_DISTANCE;
        let near_limit = -8.0;
        while dist > near_limit {
            let z = player_z - dist;
            let l = pr.project(Vec3::new(-TRAIL_HALF_WIDTH, 0.0, z));
            let r = pr.project(Vec3::new(TRAIL_HALF_WIDTH, 0.0, z));
            if let (Some(l), Some(r)) = (l, r) {
                let row = l.row();
                let stripe = ((-z / STRIPE_LENGTH).floor() as i64).rem_euclid(2) == 0;
                let fog = (l.depth / FOG_DISTANCE).clamp(0.0, 1.0) * 0.7;
                let sand = if stripe { SAND } else { SAND_DARK }.lerp(SKY_HORIZON, fog);
                let edge = TRAIL_EDGE.lerp(SKY_HORIZON, fog);

                let (from_row, from_l, from_r) = prev.unwrap_or((row, l.x, r.x));
                let span = (row - from_row).max(1) as f32;
                for y in from_row.max(0)..=row.min(h as i32 - 1) {
                    let t = ((y - from_row) as f32 / span).clamp(0.0, 1.0);
                    let lx = from_l + (l.x - from_l) * t;
                    let rx = from_r + (r.x - from_r) * t;
                    let y = y as u16;
                    fb.fill_span(y, lx.round() as i32, rx.round() as i32, ' ', CellStyle::new(sand, sand));
                    let edge_style = CellStyle::new(edge, edge);
                    fb.fill_span(y, lx.round() as i32 - 1, lx.round() as i32, ' ', edge_style);
                    fb.fill_span(y, rx.round() as i32, rx.round() as i32 + 1, ' ', edge_style);

                    if stripe {
                        // Lane dividers sit halfway between lane centres.
                        for divider in [-LANE_WIDTH / 2.0, LANE_WIDTH / 2.0] {
                            let frac = (divider + TRAIL_HALF_WIDTH) / (2.0 * TRAIL_HALF_WIDTH);
                            let x = (lx + (rx - lx) * frac) as i32;
                            if (0..w as i32).contains(&x) {
                                fb.put_char_i(x, y as i32, '¦', CellStyle::new(edge, sand));
                            }
                        }
                    }
                }

                if (z + FINISH_DISTANCE).abs() < step_for(dist) {
                    draw_finish_line(fb, row, l.x, r.x, h);
                }
                prev = Some((row, l.x, r.x));
            }
            dist -= step_for(dist);
        }
    }

    fn draw_player(&self, fb: &mut FrameBuffer, pr: &Projector, game: &GameState, w: u16) {
        let p = game.player();
        let secs = game.elapsed_ms() as f32 / 1000.0;
        let y = p.visual_y(secs).max(0.0);
        let height = p.height();
        let (Some(base), Some(top)) = (
            pr.project(Vec3::new(p.x, y, p.z)),
            pr.project(Vec3::new(p.x, y + height, p.z)),
        ) else {
            return;
        };

        let cols = pr.cells_wide(PLAYER_HALF_WIDTH * 2.0, base.depth).max(1.0);
        let x0 = (base.x - cols / 2.0).round() as i32;
        let x1 = (base.x + cols / 2.0).round().max(x0 as f32 + 1.0) as i32;
        let top_row = top.row().min(base.row());
        let rows = (base.row() - top_row).max(1);

        for (i, row) in (top_row..base.row().max(top_row + 1)).enumerate() {
            let upper = (i as i32) * 2 < rows;
            let color = if upper || height <= SLIDE_HEIGHT {
                PLAYER_SHIRT
            } else {
                PLAYER_OVERALLS
            };
            if row >= 0 {
                fb.fill_span(row as u16, x0.max(0), x1.min(w as i32), '█', CellStyle::new(color, color));
            }
        }

        if p.is_attacking() {
            let mid = top_row + rows / 2;
            let blade = CellStyle::new(SWORD, SKY_HORIZON).bold();
            for dx in 0..3 {
                if x1 + dx < w as i32 {
                    fb.put_char_i(x1 + dx, mid, '─', blade);
                }
            }
        }
    }

    fn draw_panel(
        &self,
        fb: &mut FrameBuffer,
        game: &GameState,
        hud: &Hud,
        adapter: Option<&AdapterStatusView>,
        x: u16,
        viewport: Viewport,
    ) {
        let w = viewport.width - x;
        let bg = CellStyle::new(TEXT, PANEL_BG);
        fb.fill_rect(x, 0, w, viewport.height, ' ', bg);

        let label = CellStyle::new(Rgb::new(150, 160, 180), PANEL_BG).bold();
        let value = CellStyle::new(TEXT, PANEL_BG);
        let px = x + 2;
        let mut y = 1;

        fb.put_str(px, y, "PIRATE RUN", CellStyle::new(COIN_GOLD, PANEL_BG).bold());
        y += 2;

        fb.put_str(px, y, "SCORE", label);
        fb.put_u32(px + 10, y, hud.score, value);
        y += 1;
        fb.put_str(px, y, "COINS", label);
        fb.put_u32(px + 10, y, hud.coins, CellStyle::new(COIN_GOLD, PANEL_BG));
        y += 1;
        fb.put_str(px, y, "DISTANCE", label);
        let n = fb.put_u32(px + 10, y, hud.distance_m, value);
        fb.put_char(px + 10 + n, y, 'm', value);
        y += 1;

        let tier = CellStyle::new(tier_color(hud.tier), PANEL_BG).bold();
        fb.put_str(px, y, "HEALTH", label);
        let n = fb.put_u32(px + 10, y, hud.health, tier);
        fb.put_char(px + 10 + n, y, '%', tier);
        y += 1;
        if hud.low_health() && !game.ended() && (game.elapsed_ms() / 250) % 2 == 0 {
            fb.put_str(px, y, "LOW HEALTH!", CellStyle::new(CRITICAL, PANEL_BG).bold());
        }
        y += 2;

        fb.put_str(px, y, "SPEED", label);
        y += 1;
        self.draw_speed_bar(fb, px + 1, y, hud.speed_percent);
        y += SPEED_BAR_HEIGHT + 1;

        let dim = CellStyle::new(TEXT, PANEL_BG).dim();
        for line in [
            "A/D   lanes",
            "W     jump",
            "S     slide",
            "Space sword",
            "P     pause",
        ] {
            if y >= viewport.height {
                break;
            }
            fb.put_str(px, y, line, dim);
            y += 1;
        }

        if hud.paused && y < viewport.height {
            fb.put_str(px, y, "PAUSED", CellStyle::new(WARNING, PANEL_BG).bold());
        }

        let ai_y = viewport.height.saturating_sub(2);
        if ai_y > y {
            fb.put_str(px, ai_y, "AI", label);
            match adapter {
                Some(st) if st.failed => {
                    fb.put_str(px + 3, ai_y, "ERR", CellStyle::new(CRITICAL, PANEL_BG).bold());
                }
                Some(st) if st.enabled => {
                    fb.put_str(px + 3, ai_y, "C", value);
                    fb.put_u32(px + 5, ai_y, st.client_count as u32, value);
                    fb.put_str(px + 8, ai_y, "S", value);
                    fb.put_u32(px + 10, ai_y, st.streaming_count as u32, value);
                    fb.put_str(px + 13, ai_y, "CTRL", value);
                    match st.controller_id {
                        Some(id) => {
                            fb.put_u32(px + 18, ai_y, id as u32, value);
                        }
                        None => fb.put_char(px + 18, ai_y, '-', value),
                    }
                }
                _ => fb.put_str(px + 3, ai_y, "OFF", dim),
            }
        }
    }

    fn draw_speed_bar(&self, fb: &mut FrameBuffer, x: u16, y: u16, percent: f32) {
        let frame = CellStyle::new(Rgb::new(110, 110, 130), PANEL_BG);
        let filled = ((percent / 100.0) * SPEED_BAR_HEIGHT as f32).round() as u16;
        for i in 0..SPEED_BAR_HEIGHT {
            let row = y + i;
            fb.put_char(x, row, '│', frame);
            fb.put_char(x + 3, row, '│', frame);
            // Fill from the bottom up.
            if SPEED_BAR_HEIGHT - i <= filled {
                let t = (SPEED_BAR_HEIGHT - i) as f32 / SPEED_BAR_HEIGHT as f32;
                let c = GOOD.lerp(CRITICAL, t);
                fb.fill_rect(x + 1, row, 2, 1, '█', CellStyle::new(c, PANEL_BG));
            }
        }
    }

    fn draw_start_screen(&self, fb: &mut FrameBuffer, w: u16, h: u16) {
        let lines: [(&str, CellStyle); 9] = [
            ("PIRATE RUN", title_style(COIN_GOLD)),
            ("", text_style()),
            ("Reach 745m to complete the level!", text_style()),
            ("Collect coins, dodge barrels and crates,", text_style()),
            ("and beat the pirates with your sword.", text_style()),
            ("", text_style()),
            ("A/D lanes  W jump  S slide  Space sword", text_style().dim()),
            ("", text_style()),
            ("Press ENTER to start", title_style(GOOD)),
        ];
        draw_overlay_box(fb, w, h, &lines);
    }

    fn draw_pause_screen(&self, fb: &mut FrameBuffer, hud: &Hud, w: u16, h: u16) {
        let mut score = NumLine::new("Score: ");
        score.push_u32(hud.score);
        let mut distance = NumLine::new("Distance: ");
        distance.push_u32(hud.distance_m);
        distance.push_str("m");
        let mut health = NumLine::new("Health: ");
        health.push_u32(hud.health);
        health.push_str("%");

        let lines: [(&str, CellStyle); 7] = [
            ("PAUSED", title_style(WARNING)),
            ("", text_style()),
            (score.as_str(), text_style()),
            (distance.as_str(), text_style()),
            (health.as_str(), text_style()),
            ("", text_style()),
            ("P / Esc to resume", text_style().dim()),
        ];
        draw_overlay_box(fb, w, h, &lines);
    }

    fn draw_end_screen(&self, fb: &mut FrameBuffer, hud: &Hud, w: u16, h: u16) {
        let Some(banner) = hud.banner else {
            return;
        };
        let color = match banner.outcome {
            Outcome::LevelComplete => GOOD,
            Outcome::Defeated => CRITICAL,
        };
        let mut score = NumLine::new("Final Score: ");
        score.push_u32(banner.final_score);
        let mut distance = NumLine::new("Distance: ");
        distance.push_u32(banner.distance_m);
        distance.push_str("m");

        let lines: [(&str, CellStyle); 7] = [
            (banner.title(), title_style(color)),
            (banner.subtitle(), text_style()),
            ("", text_style()),
            (score.as_str(), text_style()),
            (distance.as_str(), text_style()),
            ("", text_style()),
            ("R restart   Q quit", text_style().dim()),
        ];
        draw_overlay_box(fb, w, h, &lines);
    }
}

fn step_for(dist: f32) -> f32 {
    (dist.abs() * 0.03).max(0.25)
}

fn tier_color(tier: HealthTier) -> Rgb {
    match tier {
        HealthTier::Good => GOOD,
        HealthTier::Warning => WARNING,
        HealthTier::Critical => CRITICAL,
    }
}

fn title_style(color: Rgb) -> CellStyle {
    CellStyle::new(color, PANEL_BG).bold()
}

fn text_style() -> CellStyle {
    CellStyle::new(TEXT, PANEL_BG)
}

fn collect_sprites(game: &GameState, out: &mut ArrayVec<(f32, Sprite), 64>) {
    let pz = game.player().z;
    let cam_z = game.camera().position.z;
    let visible = |z: f32| z < cam_z - 1.0 && pz - z < SPRITE_DISTANCE;
    let world = game.world();

    let obstacles = world.obstacles().iter().filter(|o| visible(o.z)).map(|o| Sprite {
        pos: Vec3::new(o.x, 0.0, o.z),
        half_w: OBSTACLE_SCALE / 2.0,
        height: OBSTACLE_HEIGHT,
        look: Look::Obstacle {
            color: Rgb::from_array(o.color()),
            ch: match o.kind {
                ObstacleKind::Barrel => '▒',
                ObstacleKind::Crate => '▓',
            },
            struck: o.struck,
        },
    });
    let coins = world
        .coins()
        .iter()
        .filter(|c| !c.collected && visible(c.z))
        .map(|c| Sprite {
            pos: Vec3::new(c.x, 0.6, c.z),
            half_w: COIN_HALF_EXTENT,
            height: COIN_HALF_EXTENT * 2.0,
            look: Look::Coin(c.kind),
        });
    let pirates = world
        .pirates()
        .iter()
        .filter(|p| p.is_live() && visible(p.z))
        .map(|p| Sprite {
            pos: Vec3::new(p.x, 0.0, p.z),
            half_w: PIRATE_HALF_WIDTH,
            height: PIRATE_HEIGHT,
            look: Look::Pirate {
                attacking: p.is_attacking(),
            },
        });

    for sprite in obstacles.chain(coins).chain(pirates) {
        if out.is_full() {
            break;
        }
        out.push((cam_z - sprite.pos.z, sprite));
    }
}

fn draw_sprite(fb: &mut FrameBuffer, pr: &Projector, s: &Sprite, w: u16) {
    let (Some(base), Some(top)) = (
        pr.project(s.pos),
        pr.project(s.pos + Vec3::new(0.0, s.height, 0.0)),
    ) else {
        return;
    };
    let fog = (base.depth / FOG_DISTANCE).clamp(0.0, 1.0) * 0.7;
    let cols = pr.cells_wide(s.half_w * 2.0, base.depth).max(1.0);
    let x0 = (base.x - cols / 2.0).round() as i32;
    let x1 = ((base.x + cols / 2.0).round() as i32).max(x0 + 1).min(w as i32);
    let top_row = top.row().min(base.row());
    let bottom = base.row().max(top_row + 1);

    match s.look {
        Look::Coin(kind) => {
            let (color, ch) = match kind {
                CoinKind::Gold => (COIN_GOLD, '●'),
                CoinKind::Health => (COIN_HEALTH, '♥'),
            };
            let style = CellStyle::new(color.lerp(SKY_HORIZON, fog), SAND).bold();
            fb.put_char_i(((x0 + x1) / 2).min(w as i32 - 1), top_row, ch, style);
        }
        Look::Obstacle { color, ch, struck } => {
            let mut style = CellStyle::new(color.lerp(SKY_HORIZON, fog), SAND_DARK);
            if struck {
                style = style.dim();
            }
            for row in top_row..bottom {
                fill_row(fb, row, x0, x1, ch, style);
            }
        }
        Look::Pirate { attacking } => {
            let rows = bottom - top_row;
            for (i, row) in (top_row..bottom).enumerate() {
                let color = if (i as i32) * 4 < rows { PIRATE_HAT } else { PIRATE_COAT };
                let c = color.lerp(SKY_HORIZON, fog);
                fill_row(fb, row, x0, x1, '█', CellStyle::new(c, c));
            }
            if attacking {
                let blade = CellStyle::new(SWORD, SAND).bold();
                let mid = top_row + rows / 2;
                fb.put_char_i(x0 - 1, mid, '\\', blade);
                fb.put_char_i(x0 - 2, mid + 1, '\\', blade);
            }
        }
    }
}

fn fill_row(fb: &mut FrameBuffer, row: i32, x0: i32, x1: i32, ch: char, style: CellStyle) {
    if row < 0 || row > u16::MAX as i32 {
        return;
    }
    fb.fill_span(row as u16, x0, x1, ch, style);
}

fn draw_finish_line(fb: &mut FrameBuffer, row: i32, lx: f32, rx: f32, h: u16) {
    if row < 0 || row >= h as i32 {
        return;
    }
    let white = CellStyle::new(Rgb::new(245, 245, 245), Rgb::new(20, 20, 20));
    for x in lx.round() as i32..rx.round() as i32 {
        let ch = if x % 2 == 0 { '▀' } else { '▄' };
        fb.put_char_i(x, row, ch, white);
    }
}

fn draw_overlay_box(fb: &mut FrameBuffer, w: u16, h: u16, lines: &[(&str, CellStyle)]) {
    let text_w = lines.iter().map(|(s, _)| s.chars().count() as u16).max().unwrap_or(0);
    let box_w = (text_w + 6).min(w);
    let box_h = (lines.len() as u16 + 4).min(h);
    let x = (w - box_w) / 2;
    let y = (h - box_h) / 2;

    let bg = text_style();
    fb.fill_rect(x, y, box_w, box_h, ' ', bg);
    draw_border(fb, x, y, box_w, box_h, CellStyle::new(Rgb::new(150, 160, 180), PANEL_BG));

    for (i, (text, style)) in lines.iter().enumerate() {
        let row = y + 2 + i as u16;
        if row + 1 >= y + box_h {
            break;
        }
        fb.put_str_centered(x + 1, row, box_w.saturating_sub(2), text, *style);
    }
}

fn draw_border(fb: &mut FrameBuffer, x: u16, y: u16, w: u16, h: u16, style: CellStyle) {
    if w < 2 || h < 2 {
        return;
    }

    fb.put_char(x, y, '┌', style);
    fb.put_char(x + w - 1, y, '┐', style);
    fb.put_char(x, y + h - 1, '└', style);
    fb.put_char(x + w - 1, y + h - 1, '┘', style);

    for dx in 1..w - 1 {
        fb.put_char(x + dx, y, '─', style);
        fb.put_char(x + dx, y + h - 1, '─', style);
    }
    for dy in 1..h - 1 {
        fb.put_char(x, y + dy, '│', style);
        fb.put_char(x + w - 1, y + dy, '│', style);
    }
}

/// Short label plus number, built on the stack.
struct NumLine {
    buf: ArrayVec<u8, 48>,
}

impl NumLine {
    fn new(label: &str) -> Self {
        let mut line = Self {
            buf: ArrayVec::new(),
        };
        line.push_str(label);
        line
    }

    fn push_str(&mut self, s: &str) {
        for b in s.bytes() {
            if self.buf.try_push(b).is_err() {
                break;
            }
        }
    }

    fn push_u32(&mut self, mut n: u32) {
        let mut digits = [0u8; 10];
        let mut len = 0;
        loop {
            digits[len] = b'0' + (n % 10) as u8;
            len += 1;
            n /= 10;
            if n == 0 {
                break;
            }
        }
        for i in (0..len).rev() {
            let _ = self.buf.try_push(digits[i]);
        }
    }

    fn as_str(&self) -> &str {
        // Only ASCII labels and digits are pushed.
        std::str::from_utf8(&self.buf).unwrap_or("")
    }
}

trait IntoCell {
    fn into_cell(self, ch: char) -> Cell;
}

impl IntoCell for CellStyle {
    fn into_cell(self, ch: char) -> Cell {
        Cell { ch, style: self }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn num_line_formats_without_allocating() {
        let mut line = NumLine::new("Distance: ");
        line.push_u32(407);
        line.push_str("m");
        assert_eq!(line.as_str(), "Distance: 407m");

        let mut zero = NumLine::new("");
        zero.push_u32(0);
        assert_eq!(zero.as_str(), "0");
    }

    #[test]
    fn narrow_viewport_drops_panel() {
        let view = GameView::default();
        assert_eq!(view.scene_width(Viewport::new(40, 20)), 40);
        assert_eq!(view.scene_width(Viewport::new(100, 20)), 100 - PANEL_WIDTH);
    }

    #[test]
    fn tier_colors_are_distinct() {
        assert_ne!(tier_color(HealthTier::Good), tier_color(HealthTier::Warning));
        assert_ne!(tier_color(HealthTier::Warning), tier_color(HealthTier::Critical));
    }
}
