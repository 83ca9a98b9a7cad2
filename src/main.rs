//! Dots Meet entry point
//!
//! Web: wires browser input into the level and hands a JSON snapshot to the
//! page's renderer every frame. Native: headless run driven by the autopilot.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, KeyboardEvent, PointerEvent};

    use dots_meet::consts::MAX_FRAME_DT;
    use dots_meet::input::{InputMapper, Viewport};
    use dots_meet::sim::{Autopilot, LevelEvent, LevelState, tick};
    use dots_meet::{LevelConfig, LevelSnapshot};

    // The page draws whatever we hand it; missing renderer is not an error
    #[wasm_bindgen(inline_js = "
        export function present(json) {
            if (typeof window.dotsMeetPresent === 'function') {
                window.dotsMeetPresent(JSON.parse(json));
            }
        }
    ")]
    extern "C" {
        fn present(json: &str);
    }

    /// Game instance holding all state
    struct Game {
        state: LevelState,
        mapper: InputMapper,
        viewport: Viewport,
        autopilot: Option<Autopilot>,
        last_time: f64,
    }

    impl Game {
        fn update(&mut self, dt: f32) {
            let dt = dt.min(MAX_FRAME_DT);
            let mut input = self.mapper.take_frame(&self.state);
            if let Some(pilot) = self.autopilot.as_mut() {
                let auto = pilot.input_for(&self.state, dt);
                input.merge_presses(auto.events);
            }
            for event in tick(&mut self.state, &input, dt) {
                match event {
                    LevelEvent::Resolved { outcome } => log::info!("{:?}", outcome),
                    LevelEvent::Regenerated { level_index } => {
                        log::info!("Level {}", level_index)
                    }
                    _ => {}
                }
            }
        }

        fn present(&self) {
            present(&LevelSnapshot::capture(&self.state).to_json());
        }
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info).expect("Failed to init logger");

        log::info!("Dots Meet starting...");

        let window = web_sys::window().expect("no window");
        let document = window.document().expect("no document");

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .expect("no canvas")
            .dyn_into()
            .expect("not a canvas");

        let config = LevelConfig::load();
        let seed = config.seed.unwrap_or_else(|| js_sys::Date::now() as u64);
        let state = match LevelState::new(&config, seed) {
            Ok(state) => state,
            Err(e) => {
                log::error!("Invalid config ({}), falling back to defaults", e);
                LevelState::new(&LevelConfig::default(), seed).expect("default config is valid")
            }
        };
        log::info!("Game initialized with seed: {}", seed);

        let size = Vec2::new(canvas.client_width() as f32, canvas.client_height() as f32);
        let center = Vec2::new(config.center_x, 0.0);
        let game = Rc::new(RefCell::new(Game {
            mapper: InputMapper::new(config.key_bindings.clone(), state.line.midpoint()),
            viewport: Viewport::fit_width(size, center, config.viewport_half_width),
            state,
            autopilot: None,
            last_time: 0.0,
        }));

        setup_input_handlers(&canvas, game.clone());
        request_animation_frame(game);

        log::info!("Dots Meet running!");
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        // Pointer (mouse and touch)
        {
            let game = game.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
                let mut g = game.borrow_mut();
                let rect = canvas_clone.get_bounding_client_rect();
                let screen = Vec2::new(
                    event.client_x() as f32 - rect.left() as f32,
                    event.client_y() as f32 - rect.top() as f32,
                );
                g.viewport.size = Vec2::new(rect.width() as f32, rect.height() as f32);
                let viewport = g.viewport;
                g.mapper.pointer_down_screen(screen, &viewport);
                event.prevent_default();
            });
            let _ = canvas
                .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        // Keyboard
        {
            let window = web_sys::window().unwrap();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
                if event.repeat() {
                    return;
                }
                let mut g = game.borrow_mut();
                let code = event.code();
                if code == "KeyI" {
                    let seed = g.state.seed();
                    g.autopilot = match g.autopilot {
                        Some(_) => None,
                        None => Some(Autopilot::new(seed, 0.05)),
                    };
                    log::info!("Idle mode: {}", g.autopilot.is_some());
                } else if g.mapper.key_down(&code) {
                    event.prevent_default();
                }
            });
            let _ = window
                .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let window = web_sys::window().unwrap();
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        {
            let mut g = game.borrow_mut();

            let dt = if g.last_time > 0.0 {
                ((time - g.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            g.last_time = time;

            g.update(dt);
            g.present();
        }

        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use dots_meet::LevelConfig;
    use dots_meet::sim::LevelState;

    env_logger::init();
    log::info!("Dots Meet (native) starting...");
    log::info!("Native mode runs headless with the autopilot - serve the web build to play");

    let config = match std::env::args().nth(1) {
        Some(path) => match LevelConfig::load_from_path(&path) {
            Ok(config) => config,
            Err(e) => {
                log::error!("Failed to load config {}: {}", path, e);
                std::process::exit(2);
            }
        },
        None => LevelConfig::default(),
    };

    log::debug!("Config: {}", config.to_json());

    let seed = config.seed.unwrap_or_else(clock_seed);
    let mut state = match LevelState::new(&config, seed) {
        Ok(state) => state,
        Err(e) => {
            log::error!("Invalid config: {}", e);
            std::process::exit(2);
        }
    };
    log::info!("Seed: {}, mode: {:?}", seed, state.mode);

    run_headless(&mut state, seed, 10);

    let summary = dots_meet::LevelSnapshot::capture(&state);
    println!("{}", summary.to_json());
}

/// Let the autopilot play until `levels` have been cleared (or time runs out)
#[cfg(not(target_arch = "wasm32"))]
fn run_headless(state: &mut dots_meet::sim::LevelState, seed: u64, levels: u32) {
    use dots_meet::consts::HEADLESS_DT;
    use dots_meet::sim::{Autopilot, LevelEvent, tick};

    // Generous upper bound so a misconfigured run still terminates
    let max_ticks = levels as u64 * 60 * 60;
    let mut pilot = Autopilot::new(seed.rotate_left(17), 0.05);

    for _ in 0..max_ticks {
        if state.stats.cleared >= levels {
            break;
        }
        let input = pilot.input_for(state, HEADLESS_DT);
        for event in tick(state, &input, HEADLESS_DT) {
            if let LevelEvent::Resolved { outcome } = event {
                log::info!(
                    "{:?} (cleared {}, misses {})",
                    outcome,
                    state.stats.cleared,
                    state.stats.misses
                );
            }
        }
    }

    log::info!(
        "Cleared {} levels with {} misses (best streak {})",
        state.stats.cleared,
        state.stats.misses,
        state.stats.best_streak
    );
}

#[cfg(not(target_arch = "wasm32"))]
fn clock_seed() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
