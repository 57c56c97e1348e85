use pirate_run::core::{GameState, World};
use pirate_run::term::{AdapterStatusView, FrameBuffer, GameView, Viewport};
use pirate_run::types::{GameAction, ObstacleKind, TICK_MS};

fn screen_text(fb: &FrameBuffer) -> String {
    let mut all = String::new();
    for y in 0..fb.height() {
        all.push_str(&fb.row_text(y));
        all.push('\n');
    }
    all
}

fn running_game() -> GameState {
    let mut gs = GameState::new(1);
    gs.start();
    for _ in 0..10 {
        gs.tick(TICK_MS, false);
    }
    gs
}

#[test]
fn term_view_start_screen_shows_instructions() {
    let gs = GameState::new(1);
    let fb = GameView::default().render(&gs, Viewport::new(100, 30));
    let text = screen_text(&fb);

    assert!(text.contains("Reach 745m to complete the level!"));
    assert!(text.contains("Press ENTER to start"));
}

#[test]
fn term_view_draws_side_panel_when_wide_enough() {
    let gs = running_game();
    let view = GameView::default();
    let fb = view.render(&gs, Viewport::new(100, 30));
    let text = screen_text(&fb);

    assert!(text.contains("PIRATE RUN"));
    assert!(text.contains("SCORE"));
    assert!(text.contains("DISTANCE"));
    assert!(text.contains("HEALTH"));
    assert!(text.contains("100%"));
    assert!(text.contains("SPEED"));
    assert!(!text.contains("Press ENTER"));
}

#[test]
fn term_view_drops_panel_on_narrow_terminals() {
    let gs = running_game();
    let view = GameView::default();
    let vp = Viewport::new(40, 20);
    assert_eq!(view.scene_width(vp), 40);

    let text = screen_text(&view.render(&gs, vp));
    assert!(!text.contains("SCORE"));
}

#[test]
fn term_view_pause_overlay_shows_run_summary() {
    let mut gs = running_game();
    assert!(gs.apply_action(GameAction::Pause));

    let text = screen_text(&GameView::default().render(&gs, Viewport::new(100, 30)));
    assert!(text.contains("PAUSED"));
    assert!(text.contains("Health: 100%"));
    assert!(text.contains("P / Esc to resume"));
}

#[test]
fn term_view_end_screen_after_defeat() {
    let mut world = World::empty();
    for i in 1..=5 {
        world.push_obstacle(ObstacleKind::Barrel, 0, i as f32 * 4.0);
    }
    let mut gs = GameState::with_world(1, world);
    gs.start();
    while !gs.ended() {
        gs.tick(TICK_MS, false);
    }

    let text = screen_text(&GameView::default().render(&gs, Viewport::new(100, 30)));
    assert!(text.contains("GAME OVER!"));
    assert!(text.contains("Final Score: 0"));
    assert!(text.contains("R restart"));
}

#[test]
fn term_view_scene_has_sky_above_ground() {
    let gs = running_game();
    let view = GameView::default();
    let vp = Viewport::new(100, 30);
    let fb = view.render(&gs, vp);

    let top = fb.get(1, 0).unwrap();
    let bottom = fb.get(1, vp.height - 1).unwrap();
    assert_ne!(top.style.bg, bottom.style.bg);
}

#[test]
fn term_view_shows_adapter_status() {
    let gs = running_game();
    let view = GameView::default();
    let status = AdapterStatusView {
        enabled: true,
        failed: false,
        client_count: 2,
        controller_id: Some(1),
        streaming_count: 1,
    };
    let fb = view.render_with_adapter(&gs, Some(&status), Viewport::new(100, 30));
    let text = screen_text(&fb);
    assert!(text.contains("CTRL"));

    let fb = view.render_with_adapter(&gs, None, Viewport::new(100, 30));
    assert!(screen_text(&fb).contains("OFF"));
}

#[test]
fn term_view_flags_adapter_that_failed_to_listen() {
    let gs = running_game();
    let view = GameView::default();
    let status = AdapterStatusView {
        enabled: false,
        failed: true,
        client_count: 0,
        controller_id: None,
        streaming_count: 0,
    };
    let text = screen_text(&view.render_with_adapter(&gs, Some(&status), Viewport::new(100, 30)));
    assert!(text.contains("ERR"));
    assert!(!text.contains("CTRL"));

    // Still starting up: neither live counters nor an error.
    let starting = AdapterStatusView {
        failed: false,
        ..status
    };
    let text = screen_text(&view.render_with_adapter(&gs, Some(&starting), Viewport::new(100, 30)));
    assert!(text.contains("OFF"));
    assert!(!text.contains("ERR"));
}

#[test]
fn term_view_render_into_reuses_buffer_across_sizes() {
    let gs = running_game();
    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);

    view.render_into(&gs, Viewport::new(80, 24), &mut fb);
    assert_eq!((fb.width(), fb.height()), (80, 24));

    view.render_into(&gs, Viewport::new(120, 40), &mut fb);
    assert_eq!((fb.width(), fb.height()), (120, 40));
}
