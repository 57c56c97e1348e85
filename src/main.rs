//! Pirate Run terminal runner (default binary).
//!
//! Reads crossterm key events, steps the simulation on a fixed timestep and
//! draws it through the framebuffer renderer. When enabled, the control
//! adapter feeds commands into the same loop and receives observations.

use std::env;
use std::fs::OpenOptions;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyEventKind};

use pirate_run::adapter::{
    build_observation, create_ack, Adapter, ClientCommand, InboundPayload, ListenState,
    OutboundMessage,
};
use pirate_run::core::GameState;
use pirate_run::input::{handle_key_event, should_quit, InputHandler};
use pirate_run::term::{
    AdapterStatusView, FrameBuffer, GameView, RenderThrottle, TerminalRenderer, Viewport,
};
use pirate_run::types::{GameAction, GameEvent, SLIDE_GRACE_MS, TICK_MS};

const DEFAULT_SEED: u32 = 1;

/// Static screens (start, pause, end) redraw at most this often
const STATIC_REDRAW_MS: u64 = 250;

/// While running, an observation is streamed every this many ticks
const OBSERVE_EVERY_TICKS: u32 = 4;

fn main() -> Result<()> {
    init_logging()?;
    let seed = seed_from_env();
    log::info!("starting run with seed {}", seed);

    let adapter = Adapter::start_from_env()?;

    let mut term = TerminalRenderer::new();
    term.enter("Pirate Run")?;

    let result = run(&mut term, seed, adapter);

    // Always try to restore terminal state.
    let _ = term.exit();
    if let Err(e) = &result {
        log::error!("run aborted: {:#}", e);
    }
    result
}

/// Logging goes to `PIRATE_RUN_LOG_PATH` only; the terminal belongs to the game.
fn init_logging() -> Result<()> {
    let Some(path) = env::var_os("PIRATE_RUN_LOG_PATH").filter(|p| !p.is_empty()) else {
        return Ok(());
    };
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("cannot open log file {}", path.to_string_lossy()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(())
}

fn seed_from_env() -> u32 {
    env::var("PIRATE_RUN_SEED")
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(DEFAULT_SEED)
}

/// Game state plus the slide grace window that turns slide taps into a held slide.
struct Session {
    game: GameState,
    slide_grace_ms: u32,
}

impl Session {
    fn new(seed: u32) -> Self {
        Self {
            game: GameState::new(seed),
            slide_grace_ms: 0,
        }
    }

    fn apply(&mut self, action: GameAction) -> bool {
        if action == GameAction::Slide {
            self.slide_grace_ms = SLIDE_GRACE_MS;
        }
        self.game.apply_action(action)
    }

    fn tick(&mut self) -> bool {
        let sliding = self.slide_grace_ms > 0;
        self.slide_grace_ms = self.slide_grace_ms.saturating_sub(TICK_MS);
        self.game.tick(TICK_MS, sliding)
    }
}

fn run(term: &mut TerminalRenderer, seed: u32, mut adapter: Option<Adapter>) -> Result<()> {
    let mut session = Session::new(seed);

    let view = GameView::default();
    let mut fb = FrameBuffer::new(0, 0);
    let mut input_handler = InputHandler::new();
    let mut throttle = RenderThrottle::new(STATIC_REDRAW_MS);
    let mut last_size = (0u16, 0u16);

    let mut pending_events: Vec<GameEvent> = Vec::new();
    let mut out_seq: u64 = 0;

    let clock = Instant::now();
    let mut last_tick = Instant::now();
    let tick_duration = Duration::from_millis(TICK_MS as u64);

    loop {
        // Render.
        let size = crossterm::terminal::size().unwrap_or((80, 24));
        if size != last_size {
            last_size = size;
            term.invalidate();
            throttle.reset();
        }
        let now_ms = clock.elapsed().as_millis() as u64;
        if throttle.should_render_snapshot(now_ms, &session.game.snapshot()) {
            let status = adapter.as_ref().map(|a| {
                let s = a.status();
                AdapterStatusView {
                    enabled: s.listen == ListenState::Listening,
                    failed: s.listen == ListenState::Failed,
                    client_count: s.client_count,
                    controller_id: s.controller_id,
                    streaming_count: s.streaming_count,
                }
            });
            view.render_into_with_adapter(
                &session.game,
                status.as_ref(),
                Viewport::new(size.0, size.1),
                &mut fb,
            );
            term.draw_swap(&mut fb)?;
        }

        // Input with timeout until next tick.
        let timeout = tick_duration
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => match key.kind {
                    KeyEventKind::Press => {
                        if should_quit(key) {
                            log::info!("quit at {:.0}m", session.game.distance());
                            return Ok(());
                        }

                        if let Some(action) = input_handler.handle_key_press(key.code) {
                            session.apply(action);
                        }

                        match handle_key_event(key) {
                            // Lane and slide keys go through the held-key handler above.
                            Some(GameAction::MoveLeft | GameAction::MoveRight | GameAction::Slide)
                            | None => {}
                            Some(GameAction::Restart) => {
                                input_handler.reset();
                                session.apply(GameAction::Restart);
                            }
                            Some(action) => {
                                session.apply(action);
                            }
                        }
                    }
                    KeyEventKind::Repeat => {
                        // Ignore terminal auto-repeat; DAS/ARR handles repeats internally.
                    }
                    KeyEventKind::Release => {
                        input_handler.handle_key_release(key.code);
                    }
                },
                Event::Resize(..) => {
                    term.invalidate();
                    throttle.reset();
                }
                _ => {}
            }
        }

        // Tick.
        if last_tick.elapsed() < tick_duration {
            continue;
        }
        last_tick = Instant::now();

        for action in input_handler.update(TICK_MS) {
            session.apply(action);
        }

        if let Some(adapter) = adapter.as_mut() {
            while let Some(cmd) = adapter.try_recv() {
                match cmd.payload {
                    InboundPayload::Command(ClientCommand::Actions(actions)) => {
                        let mut applied = 0;
                        for action in actions {
                            if session.apply(action) {
                                applied += 1;
                            }
                        }
                        log::debug!("client {} seq {}: {} applied", cmd.client_id, cmd.seq, applied);
                        adapter.send(OutboundMessage::ToClientAck {
                            client_id: cmd.client_id,
                            ack: create_ack(cmd.seq, applied),
                        });
                    }
                    InboundPayload::SnapshotRequest => {
                        out_seq += 1;
                        adapter.send(OutboundMessage::ToClientObservation {
                            client_id: cmd.client_id,
                            obs: build_observation(&session.game, out_seq, &[]),
                        });
                    }
                }
            }
        }

        session.tick();

        for ev in session.game.take_events() {
            match ev {
                GameEvent::Finished(outcome) => log::info!(
                    "run finished: {} score={} distance={:.0}m",
                    outcome.as_str(),
                    session.game.score(),
                    session.game.distance()
                ),
                _ => log::debug!("event: {:?}", ev),
            }
            if adapter.is_some() {
                pending_events.push(ev);
            }
        }

        if let Some(adapter) = adapter.as_ref() {
            let periodic = session.game.phase().is_running()
                && session.game.step() % OBSERVE_EVERY_TICKS == 0;
            if periodic || !pending_events.is_empty() {
                out_seq += 1;
                adapter.send(OutboundMessage::BroadcastObservation {
                    obs: build_observation(&session.game, out_seq, &pending_events),
                });
                pending_events.clear();
            }
        }
    }
}
