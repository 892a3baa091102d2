//! MindGym entry point
//!
//! Handles platform-specific initialization and runs the frame loop.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::f64::consts::TAU;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{
        CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlInputElement,
        HtmlSelectElement, HtmlTextAreaElement, PointerEvent,
    };

    use mind_gym::audio::WebFeedback;
    use mind_gym::consts::BOARD_SIZE;
    use mind_gym::platform::{KeyValueStore, LocalStore, MemoryStore, StorageError};
    use mind_gym::sim::layout::PUZZLES;
    use mind_gym::sim::{GameEvent, GridGeometry, HitShape, Layout, SessionState};
    use mind_gym::tuning::{
        BUTTON_HIT_FRACTION, REACTION_HIT_FRACTION, REFLECTION_PROMPTS, SEQUENCE_HIT_FRACTION,
    };
    use mind_gym::{FpsCap, GameId, MindGym, Theme};

    const COLOR_BG: &str = "#10131a";
    const COLOR_SLOT: &str = "#2a3040";
    const COLOR_ACCENT: &str = "#4fd1c5";
    const COLOR_FLASH: &str = "#f6e05e";
    const COLOR_TEXT: &str = "#e2e8f0";

    /// LocalStorage, or memory when the browser refuses it (private mode)
    enum BrowserStore {
        Local(LocalStore),
        Memory(MemoryStore),
    }

    impl KeyValueStore for BrowserStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            match self {
                BrowserStore::Local(s) => s.get(key),
                BrowserStore::Memory(s) => s.get(key),
            }
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            match self {
                BrowserStore::Local(s) => s.set(key, value),
                BrowserStore::Memory(s) => s.set(key, value),
            }
        }

        fn remove(&mut self, key: &str) -> Result<(), StorageError> {
            match self {
                BrowserStore::Local(s) => s.remove(key),
                BrowserStore::Memory(s) => s.remove(key),
            }
        }
    }

    /// Page-level state around the app shell
    struct Game {
        app: MindGym<BrowserStore, WebFeedback>,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        document: Document,
        last_time: f64,
        prompt: Option<usize>,
    }

    impl Game {
        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                0.0
            };
            self.last_time = time;

            let events = self.app.advance(dt);
            self.handle_events(&events);
            self.render();
            self.update_hud();
        }

        fn handle_events(&mut self, events: &[GameEvent]) {
            for event in events {
                match *event {
                    GameEvent::LevelUp { level } => {
                        self.toast(&format!("Level Up! Lvl {}", level))
                    }
                    GameEvent::NewBest { score, .. } => {
                        self.toast(&format!("New best: {}", score))
                    }
                    GameEvent::ReflectionPrompt { index } => self.prompt = Some(index),
                    GameEvent::SessionEnded { score } => self.toast(&format!("Score {}", score)),
                    _ => {}
                }
            }
        }

        /// Client coordinates to board coordinates
        fn board_point(&self, client_x: i32, client_y: i32) -> Vec2 {
            let rect = self.canvas.get_bounding_client_rect();
            let scale = if rect.width() > 0.0 {
                BOARD_SIZE as f64 / rect.width()
            } else {
                1.0
            };
            Vec2::new(
                ((client_x as f64 - rect.left()) * scale) as f32,
                ((client_y as f64 - rect.top()) * scale) as f32,
            )
        }

        fn resize(&self) {
            let dpr = web_sys::window().map(|w| w.device_pixel_ratio()).unwrap_or(1.0);
            let side = (self.canvas.client_width() as f64 * dpr) as u32;
            self.canvas.set_width(side);
            self.canvas.set_height(side);
        }

        fn render(&self) {
            let ctx = &self.ctx;
            let scale = self.canvas.width() as f64 / BOARD_SIZE as f64;
            let _ = ctx.set_transform(scale, 0.0, 0.0, scale, 0.0, 0.0);
            ctx.set_fill_style_str(COLOR_BG);
            ctx.fill_rect(0.0, 0.0, BOARD_SIZE as f64, BOARD_SIZE as f64);

            let Some(engine) = self.app.engine() else { return };
            let Some(layout) = engine.layout() else { return };
            if engine.state() == SessionState::Idle {
                return;
            }

            match layout {
                Layout::Target { geometry, target } => {
                    let radius = geometry.pitch * REACTION_HIT_FRACTION;
                    for i in 0..geometry.count {
                        let color = if i == *target { COLOR_ACCENT } else { COLOR_SLOT };
                        self.circle(geometry.cell_center(i), radius, color);
                    }
                }
                Layout::OddOneOut { geometry, .. } => {
                    // Drawn exactly as large as the hit region
                    for i in 0..geometry.count {
                        if let HitShape::Circle { radius_fraction } = engine.slot_shape(i) {
                            let r = geometry.pitch * radius_fraction;
                            self.circle(geometry.cell_center(i), r, COLOR_ACCENT);
                        }
                    }
                }
                Layout::Sequence { geometry, .. } => {
                    let lit = engine.flashing_cell();
                    let radius = geometry.pitch * SEQUENCE_HIT_FRACTION;
                    for i in 0..geometry.count {
                        let color = if lit == Some(i) { COLOR_FLASH } else { COLOR_SLOT };
                        self.circle(geometry.cell_center(i), radius, color);
                    }
                }
                Layout::Stimulus { geometry, letter, n, .. } => {
                    let center = Vec2::new(BOARD_SIZE / 2.0, BOARD_SIZE / 2.0 - 40.0);
                    self.text(&letter.to_string(), center, 96.0);
                    self.text(&format!("N = {}", n), Vec2::new(BOARD_SIZE / 2.0, 24.0), 16.0);
                    self.button(geometry, 0, "Match");
                }
                Layout::Puzzle { geometry, index } => {
                    let puzzle = &PUZZLES[*index % PUZZLES.len()];
                    self.text(puzzle.prompt, Vec2::new(BOARD_SIZE / 2.0, 60.0), 12.0);
                    for (i, option) in puzzle.options.iter().enumerate() {
                        self.button(geometry, i, option);
                    }
                }
                Layout::Reflection { geometry } => {
                    let prompt = self
                        .prompt
                        .and_then(|i| REFLECTION_PROMPTS.get(i))
                        .copied()
                        .unwrap_or("Notice thoughts, feelings, sensations.");
                    self.text(prompt, Vec2::new(BOARD_SIZE / 2.0, 80.0), 13.0);
                    self.button(geometry, 0, "Log");
                }
            }
        }

        fn circle(&self, center: Vec2, radius: f32, color: &str) {
            self.ctx.set_fill_style_str(color);
            self.ctx.begin_path();
            let _ = self
                .ctx
                .arc(center.x as f64, center.y as f64, radius as f64, 0.0, TAU);
            self.ctx.fill();
        }

        fn button(&self, geometry: &GridGeometry, index: usize, label: &str) {
            let center = geometry.cell_center(index);
            let half = geometry.pitch * BUTTON_HIT_FRACTION;
            self.ctx.set_fill_style_str(COLOR_SLOT);
            self.ctx.fill_rect(
                (center.x - half) as f64,
                (center.y - half) as f64,
                (half * 2.0) as f64,
                (half * 2.0) as f64,
            );
            self.text(label, center, 20.0);
        }

        fn text(&self, text: &str, center: Vec2, size: f32) {
            self.ctx.set_fill_style_str(COLOR_TEXT);
            self.ctx.set_font(&format!("{}px system-ui, sans-serif", size));
            self.ctx.set_text_align("center");
            self.ctx.set_text_baseline("middle");
            let _ = self.ctx.fill_text(text, center.x as f64, center.y as f64);
        }

        fn set_text(&self, id: &str, text: &str) {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(text));
            }
        }

        fn update_hud(&self) {
            let profile = self.app.profile();
            self.set_text("lvl", &format!("Lvl {}", profile.level));
            self.set_text("xp", &format!("XP {}", profile.xp));
            self.set_text("streak", &format!("Streak {}", profile.streak));

            let Some(engine) = self.app.engine() else { return };
            self.set_text("score", &engine.score().to_string());
            self.set_text("best", &profile.best(engine.game()).to_string());
            let timer = engine
                .time_remaining()
                .map(|t| format!("{:.1}s", t))
                .unwrap_or_default();
            self.set_text("timer", &timer);
        }

        fn toast(&self, msg: &str) {
            self.set_text("toast", msg);
            if let Some(el) = self.document.get_element_by_id("toast") {
                let _ = el.class_list().add_1("show");
            }
        }

        fn open(&mut self, game: GameId) {
            let events = self.app.open_game(game);
            self.handle_events(&events);
            self.prompt = None;
            if game == GameId::NBackMatch {
                // Selector may already show a choice from an earlier visit
                let n = self
                    .document
                    .get_element_by_id("nback")
                    .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
                    .and_then(|select| select.value().parse::<usize>().ok());
                if let Some(n) = n {
                    self.app.set_n_back(n);
                }
            }
            self.set_text("moduleTitle", game.title());
            self.set_text("tBody", game.how_to_play());
            if let Some(el) = self.document.get_element_by_id("module") {
                let _ = el.class_list().remove_1("hidden");
            }
        }

        fn close(&mut self) {
            let events = self.app.close_game();
            self.handle_events(&events);
            if let Some(el) = self.document.get_element_by_id("module") {
                let _ = el.class_list().add_1("hidden");
            }
        }
    }

    fn apply_theme(document: &Document, theme: Theme) {
        let prefers_light = web_sys::window()
            .and_then(|w| w.match_media("(prefers-color-scheme: light)").ok().flatten())
            .is_some_and(|m| m.matches());
        if let Some(root) = document.document_element() {
            let _ = root.set_attribute("data-theme", theme.resolve(prefers_light).as_str());
        }
    }

    fn open_store() -> BrowserStore {
        match LocalStore::open() {
            Ok(store) => BrowserStore::Local(store),
            Err(e) => {
                log::warn!("{} - progress will not be kept", e);
                BrowserStore::Memory(MemoryStore::new())
            }
        }
    }

    fn today() -> chrono::NaiveDate {
        chrono::Local::now().date_naive()
    }

    pub fn run() {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        log::info!("MindGym starting...");

        let Some(window) = web_sys::window() else {
            log::error!("no window");
            return;
        };
        let Some(document) = window.document() else {
            log::error!("no document");
            return;
        };
        let Some(canvas) = document
            .get_element_by_id("board")
            .and_then(|el| el.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("no #board canvas");
            return;
        };
        let Some(ctx) = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
        else {
            log::error!("2d context unavailable");
            return;
        };

        let seed = js_sys::Date::now() as u64;
        let app = MindGym::new(open_store(), WebFeedback::new(), seed, today());
        apply_theme(&document, app.settings().theme);
        log::info!("Initialized with seed: {}", seed);

        let game = Rc::new(RefCell::new(Game {
            app,
            canvas: canvas.clone(),
            ctx,
            document: document.clone(),
            last_time: 0.0,
            prompt: None,
        }));
        game.borrow().resize();
        game.borrow().update_hud();

        setup_board_input(&canvas, game.clone());
        setup_tiles(&document, game.clone());
        setup_controls(&document, game.clone());
        setup_settings(&document, game.clone());
        setup_auto_stop(&document, game.clone());

        request_animation_frame(game);
        log::info!("MindGym running!");
    }

    fn on_click(document: &Document, id: &str, mut f: impl FnMut() + 'static) {
        let Some(el) = document.get_element_by_id(id) else { return };
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| f());
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn on_change(
        document: &Document,
        id: &str,
        event: &str,
        mut f: impl FnMut(web_sys::Element) + 'static,
    ) {
        let Some(el) = document.get_element_by_id(id) else { return };
        let target = el.clone();
        let closure =
            Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| f(target.clone()));
        let _ = el.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_board_input(canvas: &HtmlCanvasElement, game: Rc<RefCell<Game>>) {
        let closure = Closure::<dyn FnMut(_)>::new(move |event: PointerEvent| {
            event.prevent_default();
            let mut g = game.borrow_mut();
            let point = g.board_point(event.client_x(), event.client_y());
            let events = g.app.pointer(point);
            g.handle_events(&events);
        });
        let _ = canvas
            .add_event_listener_with_callback("pointerdown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_tiles(document: &Document, game: Rc<RefCell<Game>>) {
        let Ok(tiles) = document.query_selector_all(".tile") else { return };
        for i in 0..tiles.length() {
            let Some(tile) = tiles
                .item(i)
                .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            else {
                continue;
            };
            let Some(id) = tile
                .get_attribute("data-module")
                .and_then(|k| GameId::from_key(&k))
            else {
                continue;
            };
            let game = game.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
                game.borrow_mut().open(id);
            });
            let _ = tile.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
            closure.forget();
        }
    }

    fn setup_controls(document: &Document, game: Rc<RefCell<Game>>) {
        {
            let game = game.clone();
            on_click(document, "btnStart", move || {
                let mut g = game.borrow_mut();
                g.prompt = None;
                let events = g.app.start();
                g.handle_events(&events);
            });
        }
        {
            let game = game.clone();
            on_click(document, "btnStop", move || {
                let mut g = game.borrow_mut();
                let events = g.app.stop();
                g.handle_events(&events);
            });
        }
        {
            let game = game.clone();
            on_click(document, "btnExit", move || game.borrow_mut().close());
        }
        {
            let game = game.clone();
            on_change(document, "nback", "change", move |el| {
                if let Ok(select) = el.dyn_into::<HtmlSelectElement>() {
                    if let Ok(n) = select.value().parse::<usize>() {
                        game.borrow_mut().app.set_n_back(n);
                    }
                }
            });
        }
        {
            let game = game.clone();
            on_change(document, "journal", "input", move |el| {
                if let Ok(area) = el.dyn_into::<HtmlTextAreaElement>() {
                    game.borrow_mut().app.set_journal_draft(&area.value());
                }
            });
        }
        if let Some(area) = document
            .get_element_by_id("journal")
            .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
        {
            area.set_value(&game.borrow().app.profile().journal_draft);
        }
    }

    fn setup_settings(document: &Document, game: Rc<RefCell<Game>>) {
        let settings = game.borrow().app.settings().clone();
        let select = |id: &str| {
            document
                .get_element_by_id(id)
                .and_then(|e| e.dyn_into::<HtmlSelectElement>().ok())
        };
        if let Some(el) = select("theme") {
            el.set_value(settings.theme.as_str());
        }
        if let Some(el) = select("fps") {
            el.set_value(&settings.fps_cap.fps().to_string());
        }
        for (id, checked) in [("haptics", settings.haptics), ("sounds", settings.sound)] {
            if let Some(el) = document
                .get_element_by_id(id)
                .and_then(|e| e.dyn_into::<HtmlInputElement>().ok())
            {
                el.set_checked(checked);
            }
        }

        {
            let game = game.clone();
            on_change(document, "theme", "change", move |el| {
                let Ok(select) = el.dyn_into::<HtmlSelectElement>() else { return };
                let Some(theme) = Theme::from_str(&select.value()) else { return };
                let mut g = game.borrow_mut();
                g.app.set_theme(theme);
                apply_theme(&g.document, theme);
            });
        }
        {
            let game = game.clone();
            on_change(document, "fps", "change", move |el| {
                let Ok(select) = el.dyn_into::<HtmlSelectElement>() else { return };
                let Ok(fps) = select.value().parse::<u32>() else { return };
                game.borrow_mut().app.set_fps_cap(FpsCap::from(fps));
            });
        }
        {
            let game = game.clone();
            on_change(document, "haptics", "change", move |el| {
                if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
                    game.borrow_mut().app.set_haptics(input.checked());
                }
            });
        }
        {
            let game = game.clone();
            on_change(document, "sounds", "change", move |el| {
                if let Ok(input) = el.dyn_into::<HtmlInputElement>() {
                    game.borrow_mut().app.set_sound(input.checked());
                }
            });
        }
        on_click(document, "btnReset", move || {
            let confirmed = web_sys::window()
                .and_then(|w| w.confirm_with_message("Reset all progress?").ok())
                .unwrap_or(false);
            if confirmed {
                let mut g = game.borrow_mut();
                g.app.reset_progress();
                g.close();
                g.update_hud();
            }
        });
    }

    fn setup_auto_stop(document: &Document, game: Rc<RefCell<Game>>) {
        let document_clone = document.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::Event| {
            if document_clone.visibility_state() == web_sys::VisibilityState::Hidden {
                let mut g = game.borrow_mut();
                let events = g.app.suspend();
                if !events.is_empty() {
                    log::info!("Auto-stopped (tab hidden)");
                }
                g.handle_events(&events);
            }
        });
        let _ = document
            .add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn request_animation_frame(game: Rc<RefCell<Game>>) {
        let Some(window) = web_sys::window() else { return };
        let closure = Closure::once(move |time: f64| {
            game_loop(game, time);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn game_loop(game: Rc<RefCell<Game>>, time: f64) {
        game.borrow_mut().frame(time);
        request_animation_frame(game);
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    wasm_game::run();
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("MindGym (native) starting...");
    log::info!("The UI is web-only - run with `trunk serve`; playing a headless demo");

    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

/// A bot that plays every game for a few seconds of simulated time
#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use mind_gym::feedback::NullSink;
    use mind_gym::platform::MemoryStore;
    use mind_gym::sim::Layout;
    use mind_gym::{GameId, MindGym};

    const FRAME_DT: f32 = 1.0 / 60.0;
    const FRAMES_PER_GAME: u32 = 600;
    /// The bot answers on every this many frames
    const THINK_FRAMES: u32 = 20;

    /// Slots that answer the current layout, in tap order
    fn answer(layout: &Layout) -> Vec<usize> {
        match layout {
            Layout::Sequence { sequence, .. } => sequence.clone(),
            other => (0..other.geometry().count)
                .find(|&i| other.accepts(i))
                .into_iter()
                .collect(),
        }
    }

    pub fn run() {
        let today = chrono::Local::now().date_naive();
        let mut app = MindGym::new(MemoryStore::new(), NullSink, 42, today);

        for game in GameId::ALL {
            app.open_game(game);
            app.start();
            for frame in 0..FRAMES_PER_GAME {
                app.advance(FRAME_DT);
                if !frame.is_multiple_of(THINK_FRAMES) {
                    continue;
                }
                let taps = app
                    .engine()
                    .and_then(|e| e.layout())
                    .map(answer)
                    .unwrap_or_default();
                for tap in taps {
                    app.tap_target(Some(tap));
                }
            }
            let score = app.engine().map(|e| e.score()).unwrap_or(0);
            app.stop();
            println!(
                "{:<12} score {:>3}  best {:>3}",
                game.title(),
                score,
                app.profile().best(game)
            );
        }

        let profile = app.profile();
        println!(
            "Lvl {}  XP {}  Streak {}",
            profile.level, profile.xp, profile.streak
        );
    }
}
