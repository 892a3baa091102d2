//! Application shell
//!
//! Owns the profile, settings, stepper and the one open round engine, and is
//! what the UI talks to. Every call returns the game events it produced,
//! after they have been realised as feedback and the profile has been
//! written through.

use chrono::NaiveDate;
use glam::Vec2;

use crate::feedback::{Feedback, FeedbackSink};
use crate::persistence::Persistence;
use crate::platform::storage::KeyValueStore;
use crate::platform::time::FixedStepper;
use crate::profile::Profile;
use crate::settings::{FpsCap, Settings, Theme};
use crate::sim::{GameEvent, RoundEngine, hit_test_slots};
use crate::tuning::GameId;

pub struct MindGym<S, F> {
    persistence: Persistence<S>,
    feedback: Feedback<F>,
    profile: Profile,
    /// Last profile written to storage
    saved_profile: Profile,
    settings: Settings,
    stepper: FixedStepper,
    engine: Option<RoundEngine>,
    seed: u64,
    games_opened: u64,
}

impl<S: KeyValueStore, F: FeedbackSink> MindGym<S, F> {
    /// Load stored state and run the daily streak bookkeeping
    pub fn new(store: S, sink: F, seed: u64, today: NaiveDate) -> Self {
        let persistence = Persistence::new(store);
        let profile = persistence.load_profile();
        let settings = persistence.load_settings();

        let mut app = Self {
            feedback: Feedback::new(sink, &settings),
            stepper: FixedStepper::new(settings.fps_cap),
            saved_profile: profile.clone(),
            persistence,
            profile,
            settings,
            engine: None,
            seed,
            games_opened: 0,
        };

        if app.profile.bump_streak(today) {
            log::info!("Streak {}", app.profile.streak);
        }
        app.persist_profile();
        app
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn feedback(&self) -> &Feedback<F> {
        &self.feedback
    }

    pub fn store(&self) -> &S {
        self.persistence.store()
    }

    /// Engine of the open game, if any
    pub fn engine(&self) -> Option<&RoundEngine> {
        self.engine.as_ref()
    }

    pub fn active_game(&self) -> Option<GameId> {
        self.engine.as_ref().map(|engine| engine.game())
    }

    pub fn tick_dt(&self) -> f32 {
        self.stepper.tick_dt()
    }

    /// Open a game, stopping whatever session was running before
    pub fn open_game(&mut self, game: GameId) -> Vec<GameEvent> {
        let events = self.close_game();
        self.games_opened += 1;
        let seed = self.seed.wrapping_add(self.games_opened);
        self.engine = Some(RoundEngine::with_seed(game, seed));
        self.stepper.reset();
        log::info!("Opened {}", game.title());
        events
    }

    pub fn close_game(&mut self) -> Vec<GameEvent> {
        let Some(mut engine) = self.engine.take() else {
            return Vec::new();
        };
        engine.stop(&mut self.profile);
        let events = engine.drain_events();
        self.realise(&events);
        events
    }

    pub fn start(&mut self) -> Vec<GameEvent> {
        match self.engine.as_mut() {
            Some(engine) => engine.start(),
            None => log::debug!("start with no game open"),
        }
        self.stepper.reset();
        self.flush()
    }

    pub fn stop(&mut self) -> Vec<GameEvent> {
        if let Some(engine) = self.engine.as_mut() {
            engine.stop(&mut self.profile);
        }
        self.flush()
    }

    /// Page hidden or app backgrounded
    pub fn suspend(&mut self) -> Vec<GameEvent> {
        self.stepper.reset();
        self.stop()
    }

    pub fn set_n_back(&mut self, n: usize) {
        if let Some(engine) = self.engine.as_mut() {
            engine.set_n_back(n);
        }
    }

    /// Feed one frame delta from the frame clock
    pub fn advance(&mut self, frame_dt: f32) -> Vec<GameEvent> {
        let steps = self.stepper.advance(frame_dt);
        let dt = self.stepper.tick_dt();
        if let Some(engine) = self.engine.as_mut() {
            for _ in 0..steps {
                engine.update(dt, &mut self.profile);
            }
        }
        self.flush()
    }

    /// Pointer down at `point` in board coordinates
    pub fn pointer(&mut self, point: Vec2) -> Vec<GameEvent> {
        let target = self.engine.as_ref().and_then(|engine| {
            let layout = engine.layout()?;
            hit_test_slots(layout.geometry(), point, |i| engine.slot_shape(i))
        });
        self.tap_target(target)
    }

    /// Tap already resolved to a slot (`None` = nothing hit)
    pub fn tap_target(&mut self, target: Option<usize>) -> Vec<GameEvent> {
        if let Some(engine) = self.engine.as_mut() {
            engine.resolve_tap(target, &mut self.profile);
        }
        self.flush()
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.settings.theme = theme;
        self.persist_settings();
    }

    pub fn set_sound(&mut self, enabled: bool) {
        self.settings.sound = enabled;
        self.feedback.apply_settings(&self.settings);
        self.persist_settings();
    }

    pub fn set_haptics(&mut self, enabled: bool) {
        self.settings.haptics = enabled;
        self.feedback.apply_settings(&self.settings);
        self.persist_settings();
    }

    pub fn set_fps_cap(&mut self, cap: FpsCap) {
        self.settings.fps_cap = cap;
        self.stepper.set_fps_cap(cap);
        self.persist_settings();
    }

    /// Autosaved micro-journal text
    pub fn set_journal_draft(&mut self, text: &str) {
        self.profile.journal_draft = text.to_string();
        self.persist_profile();
    }

    /// Wipe level, XP, streak and best scores
    pub fn reset_progress(&mut self) {
        self.close_game();
        self.profile = match self.persistence.reset_profile() {
            Ok(profile) => profile,
            Err(e) => {
                log::warn!("Failed to store reset profile: {}", e);
                Profile::default()
            }
        };
        self.saved_profile = self.profile.clone();
    }

    fn flush(&mut self) -> Vec<GameEvent> {
        let events = self
            .engine
            .as_mut()
            .map(|engine| engine.drain_events())
            .unwrap_or_default();
        self.realise(&events);
        events
    }

    fn realise(&mut self, events: &[GameEvent]) {
        for event in events {
            self.feedback.dispatch(event);
        }
        self.persist_profile();
    }

    fn persist_profile(&mut self) {
        if self.profile == self.saved_profile {
            return;
        }
        match self.persistence.save_profile(&self.profile) {
            Ok(()) => self.saved_profile = self.profile.clone(),
            Err(e) => log::warn!("Failed to save profile: {}", e),
        }
    }

    fn persist_settings(&mut self) {
        if let Err(e) = self.persistence.save_settings(&self.settings) {
            log::warn!("Failed to save settings: {}", e);
        }
    }
}
