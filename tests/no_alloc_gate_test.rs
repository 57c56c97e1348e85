use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use pirate_run::core::{GameSnapshot, GameState};
use pirate_run::term::{AdapterStatusView, FrameBuffer, GameView, Viewport};
use pirate_run::types::{GameAction, TICK_MS};

struct CountingAlloc;

static COUNT_ENABLED: AtomicBool = AtomicBool::new(false);
static ALLOC_COUNT: AtomicUsize = AtomicUsize::new(0);

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

unsafe impl GlobalAlloc for CountingAlloc {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        if COUNT_ENABLED.load(Ordering::Relaxed) {
            ALLOC_COUNT.fetch_add(1, Ordering::Relaxed);
        }
        System.realloc(ptr, layout, new_size)
    }
}

fn with_alloc_counting<F: FnOnce()>(f: F) -> usize {
    ALLOC_COUNT.store(0, Ordering::Relaxed);
    COUNT_ENABLED.store(true, Ordering::Relaxed);
    f();
    COUNT_ENABLED.store(false, Ordering::Relaxed);
    ALLOC_COUNT.load(Ordering::Relaxed)
}

// Both gates live in one test so the counter is never shared between threads.
#[test]
fn hot_paths_do_not_allocate() {
    // Setup (outside counting) so one-time allocations don't trip the gate.
    let mut gs = GameState::new(1);
    gs.start();
    let _ = gs.tick(TICK_MS, false);
    let mut snap = GameSnapshot::default();

    let allocs = with_alloc_counting(|| {
        for i in 0..600u32 {
            match i % 40 {
                0 => {
                    let _ = gs.apply_action(GameAction::MoveLeft);
                }
                10 => {
                    let _ = gs.apply_action(GameAction::Jump);
                }
                20 => {
                    let _ = gs.apply_action(GameAction::MoveRight);
                }
                30 => {
                    let _ = gs.apply_action(GameAction::Attack);
                }
                _ => {}
            }
            let _ = gs.tick(TICK_MS, i % 7 == 0);
            let _ = gs.take_events();
            gs.snapshot_into(&mut snap);
        }
    });
    assert_eq!(allocs, 0, "core tick allocated");

    let view = GameView::default();
    let viewport = Viewport::new(100, 30);
    let mut fb = FrameBuffer::new(viewport.width, viewport.height);
    let status = AdapterStatusView {
        enabled: true,
        failed: false,
        client_count: 1,
        controller_id: Some(1),
        streaming_count: 1,
    };

    // Warm-up.
    view.render_into_with_adapter(&gs, Some(&status), viewport, &mut fb);

    let allocs = with_alloc_counting(|| {
        for _ in 0..200 {
            let _ = gs.tick(TICK_MS, false);
            view.render_into_with_adapter(&gs, Some(&status), viewport, &mut fb);
        }
    });
    assert_eq!(allocs, 0, "render allocated");
}
