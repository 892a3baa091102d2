//! Round engine
//!
//! The shared lifecycle controller every game runs through:
//!
//! ```text
//! Idle -> RoundActive <-> Running -> Ended
//!   ^__________________________/   (stop)
//! ```
//!
//! One engine per open game, configured by the game's [`GameTuning`] and
//! difficulty curve. All calls happen on one logical thread; operations
//! invoked in a state that does not support them are silent no-ops.

use rand_pcg::Pcg32;

use super::difficulty::{self, N_BACK_MAX, N_BACK_MIN, SEQUENCE_MAX_LEN, baseline_level};
use super::hit::HitShape;
use super::layout::{self, Layout, LayoutRequest, PUZZLES};
use super::rng::{RandomSource, session_rng};
use super::state::{GameEvent, Session, SessionState};
use crate::profile::Profile;
use crate::tuning::{
    GameId, GameTuning, N_BACK_HISTORY, REFLECTION_DURATION, REFLECTION_PROMPT_INTERVAL,
    REFLECTION_PROMPTS, SEQUENCE_FLASH_ON, SEQUENCE_FLASH_STEP, TimeoutPolicy, WrongTapPolicy,
};

pub struct RoundEngine<R: RandomSource = Pcg32> {
    game: GameId,
    tuning: &'static GameTuning,
    session: Session,
    rng: R,
    events: Vec<GameEvent>,
    /// N picked on the n-back selector; each session starts from it
    chosen_n: usize,
}

impl RoundEngine<Pcg32> {
    /// Engine driven by a seeded PCG generator
    pub fn with_seed(game: GameId, seed: u64) -> Self {
        Self::new(game, session_rng(seed))
    }
}

impl<R: RandomSource> RoundEngine<R> {
    pub fn new(game: GameId, rng: R) -> Self {
        Self {
            game,
            tuning: game.tuning(),
            session: Session {
                difficulty_level: baseline_level(game),
                ..Session::default()
            },
            rng,
            events: Vec::new(),
            chosen_n: N_BACK_MIN,
        }
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> SessionState {
        self.session.state
    }

    pub fn score(&self) -> u32 {
        self.session.score
    }

    pub fn round_index(&self) -> u32 {
        self.session.round_index
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.session.layout.as_ref()
    }

    pub fn time_remaining(&self) -> Option<f32> {
        self.session.time_remaining
    }

    pub fn difficulty_level(&self) -> u32 {
        self.session.difficulty_level
    }

    /// Token for callback-style timers; compare with [`Self::fire_round_timer`]
    pub fn generation(&self) -> u64 {
        self.session.generation
    }

    pub fn hit_shape(&self) -> HitShape {
        self.tuning.hit_shape
    }

    /// Hit region (and drawn shape) of one slot of the current layout
    pub fn slot_shape(&self, index: usize) -> HitShape {
        match &self.session.layout {
            Some(layout) => layout.slot_shape(index, self.tuning.hit_shape),
            None => self.tuning.hit_shape,
        }
    }

    /// Take the events produced since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Begin a fresh session. No-op while one is already in progress.
    pub fn start(&mut self) {
        if self.session.state.is_active() {
            log::debug!("{}: start ignored, session in progress", self.game.title());
            return;
        }

        let difficulty_level = if self.game == GameId::NBackMatch {
            self.chosen_n as u32
        } else {
            baseline_level(self.game)
        };
        self.session = Session {
            generation: self.session.generation + 1,
            difficulty_level,
            ..Session::default()
        };
        self.present_round(false);
        log::info!("{} started", self.game.title());
    }

    /// Advance timers by `dt` seconds
    pub fn update(&mut self, dt: f32, profile: &mut Profile) {
        if dt <= 0.0 || !dt.is_finite() || !self.timers_running() {
            return;
        }

        if self.game == GameId::SequenceRecall {
            self.session.playback += dt;
        }
        if self.tuning.timeout == TimeoutPolicy::Complete {
            self.advance_prompts(dt);
        }

        let Some(remaining) = self.session.time_remaining else {
            return;
        };
        let remaining = remaining - dt;
        if remaining > 0.0 {
            self.session.time_remaining = Some(remaining);
            return;
        }
        self.session.time_remaining = Some(0.0);
        self.on_timer_expired(profile);
    }

    /// Entry point for an externally scheduled round timer. Callbacks armed
    /// before the last start/stop carry an old generation and are dropped.
    pub fn fire_round_timer(&mut self, generation: u64, profile: &mut Profile) {
        if generation != self.session.generation {
            log::debug!(
                "{}: stale timer (generation {} != {})",
                self.game.title(),
                generation,
                self.session.generation
            );
            return;
        }
        if !self.timers_running() || self.session.time_remaining.is_none() {
            return;
        }
        self.session.time_remaining = Some(0.0);
        self.on_timer_expired(profile);
    }

    /// Resolve a tap on slot `target` (`None` = the tap hit no slot)
    pub fn resolve_tap(&mut self, target: Option<usize>, profile: &mut Profile) {
        if self.session.state != SessionState::RoundActive {
            log::debug!(
                "{}: tap ignored in {:?}",
                self.game.title(),
                self.session.state
            );
            return;
        }
        let Some(layout) = self.session.layout.as_ref() else {
            return;
        };

        let slots = layout.geometry().count;
        let Some(index) = target.filter(|&i| i < slots) else {
            if self.tuning.empty_tap_is_wrong {
                self.on_wrong();
                self.record_best(profile);
            }
            return;
        };

        let correct = if self.game == GameId::SequenceRecall {
            self.session.input.push(index);
            if self.session.input.len() < layout.expected_input_length() {
                return;
            }
            layout.accepts_sequence(&self.session.input)
        } else {
            layout.accepts(index)
        };

        if correct {
            self.on_correct(profile);
        } else {
            self.on_wrong();
        }
        self.record_best(profile);
    }

    /// Stop from any state. The score is kept so the caller can read it.
    pub fn stop(&mut self, profile: &mut Profile) {
        let was_active = self.session.state.is_active();
        self.session.generation += 1;
        self.session.time_remaining = None;
        self.session.state = SessionState::Idle;
        self.record_best(profile);
        if was_active {
            self.events.push(GameEvent::SessionEnded {
                score: self.session.score,
            });
            log::info!(
                "{} stopped with score {}",
                self.game.title(),
                self.session.score
            );
        }
    }

    /// Player-chosen N for the n-back stream; resets the score and is kept
    /// for later sessions
    pub fn set_n_back(&mut self, n: usize) {
        if self.game != GameId::NBackMatch {
            return;
        }
        let n = n.clamp(N_BACK_MIN, N_BACK_MAX);
        self.chosen_n = n;
        self.session.difficulty_level = n as u32;
        self.session.correct_run = 0;
        self.session.score = 0;

        // Re-judge the letter on screen against the new N
        if let Some(Layout::Stimulus {
            letter,
            n: shown,
            is_match,
            ..
        }) = self.session.layout.as_mut()
        {
            let history = &self.session.history;
            let n_back = history
                .len()
                .checked_sub(n + 1)
                .and_then(|i| history.get(i).copied());
            *shown = n;
            *is_match = n_back == Some(*letter);
        }
    }

    /// Cell lit by the sequence playback right now, if any
    pub fn flashing_cell(&self) -> Option<usize> {
        if self.session.state != SessionState::RoundActive {
            return None;
        }
        let Some(Layout::Sequence { sequence, .. }) = &self.session.layout else {
            return None;
        };
        let step = (self.session.playback / SEQUENCE_FLASH_STEP).floor() as usize;
        let into_step = self.session.playback - step as f32 * SEQUENCE_FLASH_STEP;
        if into_step < SEQUENCE_FLASH_ON {
            sequence.get(step).copied()
        } else {
            None
        }
    }

    /// Timers tick in RoundActive; the n-back stream also keeps going while
    /// a claim is pending in Running.
    fn timers_running(&self) -> bool {
        match self.session.state {
            SessionState::RoundActive => true,
            SessionState::Running => self.tuning.timeout == TimeoutPolicy::NextStimulus,
            _ => false,
        }
    }

    fn present_round(&mut self, advance: bool) {
        if advance {
            self.session.round_index += 1;
        }

        let curve = difficulty::curve(self.game, self.session.difficulty_level);
        let request = LayoutRequest {
            game: self.game,
            curve,
            history: &self.session.history,
            puzzle_index: self.session.puzzle_index,
        };
        let layout = layout::generate(&request, &mut self.rng);

        if let Layout::Stimulus { letter, .. } = layout {
            self.session.history.push(letter);
            if self.session.history.len() > N_BACK_HISTORY {
                self.session.history.remove(0);
            }
        }

        self.session.time_remaining = match self.tuning.timeout {
            TimeoutPolicy::Untimed => None,
            TimeoutPolicy::EndWhenScoreless | TimeoutPolicy::NextStimulus => curve.round_window,
            // Armed once for the whole session
            TimeoutPolicy::Complete => self
                .session
                .time_remaining
                .or(Some(REFLECTION_DURATION)),
        };
        self.session.layout = Some(layout);
        self.session.input.clear();
        self.session.playback = 0.0;
        self.session.state = SessionState::RoundActive;
        self.events.push(GameEvent::RoundStarted {
            round: self.session.round_index,
        });
        log::debug!(
            "{}: round {} (level {}, window {:?})",
            self.game.title(),
            self.session.round_index,
            self.session.difficulty_level,
            self.session.time_remaining
        );
    }

    fn advance_prompts(&mut self, dt: f32) {
        self.session.elapsed += dt;
        loop {
            let due = (self.session.prompts_shown + 1) as f32 * REFLECTION_PROMPT_INTERVAL;
            if due >= REFLECTION_DURATION || self.session.elapsed < due {
                break;
            }
            self.events.push(GameEvent::ReflectionPrompt {
                index: self.session.prompts_shown % REFLECTION_PROMPTS.len(),
            });
            self.session.prompts_shown += 1;
        }
    }

    fn on_timer_expired(&mut self, profile: &mut Profile) {
        match self.tuning.timeout {
            TimeoutPolicy::Untimed => {}
            TimeoutPolicy::EndWhenScoreless => {
                self.events.push(GameEvent::RoundTimeout {
                    score: self.session.score,
                });
                if self.session.score == 0 {
                    self.end_session(profile);
                } else {
                    self.session.score -= 1;
                    self.present_round(true);
                }
            }
            TimeoutPolicy::NextStimulus => self.present_round(true),
            TimeoutPolicy::Complete => {
                self.award(profile, self.tuning.completion_bonus_xp);
                self.end_session(profile);
            }
        }
    }

    fn on_correct(&mut self, profile: &mut Profile) {
        self.session.score += 1;
        self.session.correct += 1;
        self.events.push(GameEvent::CorrectTap {
            score: self.session.score,
        });
        self.award(profile, self.tuning.xp_per_correct);
        self.session.state = SessionState::Running;

        match self.game {
            GameId::ReactionTap | GameId::OddOneOut => {
                self.session.difficulty_level = self.session.correct;
                self.present_round(true);
            }
            GameId::SequenceRecall => {
                self.session.difficulty_level =
                    (self.session.difficulty_level + 1).min(SEQUENCE_MAX_LEN as u32);
                self.present_round(true);
            }
            GameId::NBackMatch => {
                // The stream timer presents the next stimulus
                self.session.correct_run += 1;
                self.session.difficulty_level = difficulty::next_n_back(
                    self.session.difficulty_level as usize,
                    self.session.correct_run,
                ) as u32;
            }
            GameId::PatternPuzzle => {
                self.session.puzzle_index = (self.session.puzzle_index + 1) % PUZZLES.len();
                self.present_round(true);
            }
            GameId::TimedReflection => {
                self.session.state = SessionState::RoundActive;
            }
        }
    }

    fn on_wrong(&mut self) {
        let policy = self.tuning.wrong_tap;
        if policy == WrongTapPolicy::Ignore {
            return;
        }

        if policy == WrongTapPolicy::ResetToMinimum {
            self.session.score = 0;
        } else {
            self.session.score = self.session.score.saturating_sub(1);
        }
        self.events.push(GameEvent::WrongTap {
            score: self.session.score,
        });

        match policy {
            WrongTapPolicy::DeductAndNewRound => {
                self.session.state = SessionState::Running;
                self.present_round(true);
            }
            WrongTapPolicy::DeductAndStay => {
                // Same layout stays up
            }
            WrongTapPolicy::ResetToMinimum => {
                self.session.state = SessionState::Running;
                self.session.difficulty_level = baseline_level(self.game);
                self.present_round(true);
            }
            WrongTapPolicy::DeductAndResetN => {
                self.session.state = SessionState::Running;
                self.session.difficulty_level = N_BACK_MIN as u32;
                self.session.correct_run = 0;
            }
            WrongTapPolicy::DeductAndAdvance => {
                self.session.state = SessionState::Running;
                self.session.puzzle_index = (self.session.puzzle_index + 1) % PUZZLES.len();
                self.present_round(true);
            }
            WrongTapPolicy::Ignore => {}
        }
    }

    fn end_session(&mut self, profile: &mut Profile) {
        self.session.state = SessionState::Ended;
        self.session.time_remaining = None;
        self.session.generation += 1;
        self.record_best(profile);
        self.events.push(GameEvent::SessionEnded {
            score: self.session.score,
        });
        log::info!(
            "{} ended with score {}",
            self.game.title(),
            self.session.score
        );
    }

    fn award(&mut self, profile: &mut Profile, amount: u32) {
        if amount == 0 {
            return;
        }
        for level in profile.award_xp(amount) {
            log::info!("Level up! Lvl {}", level);
            self.events.push(GameEvent::LevelUp { level });
        }
    }

    fn record_best(&mut self, profile: &mut Profile) {
        if profile.record_best(self.game, self.session.score) && !self.session.best_announced {
            self.session.best_announced = true;
            self.events.push(GameEvent::NewBest {
                game: self.game,
                score: self.session.score,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::difficulty::{REACTION_WINDOW_FLOOR, SEQUENCE_MIN_LEN};
    use crate::sim::rng::ScriptedRandom;
    use proptest::prelude::*;

    /// Slot that answers the current layout (first element for sequences)
    fn answer<R: RandomSource>(engine: &RoundEngine<R>) -> usize {
        match engine.layout().expect("layout") {
            Layout::Target { target, .. } => *target,
            Layout::OddOneOut { odd_index, .. } => *odd_index,
            Layout::Sequence { sequence, .. } => sequence[0],
            Layout::Stimulus { .. } | Layout::Reflection { .. } => 0,
            Layout::Puzzle { index, .. } => {
                let p = &PUZZLES[*index];
                p.options.iter().position(|o| *o == p.answer).unwrap()
            }
        }
    }

    fn wrong<R: RandomSource>(engine: &RoundEngine<R>) -> usize {
        let layout = engine.layout().expect("layout");
        let count = layout.geometry().count;
        (0..count).find(|&i| !layout.accepts(i)).unwrap()
    }

    fn sequence_of<R: RandomSource>(engine: &RoundEngine<R>) -> Vec<usize> {
        match engine.layout() {
            Some(Layout::Sequence { sequence, .. }) => sequence.clone(),
            other => panic!("expected sequence, got {:?}", other),
        }
    }

    #[test]
    fn test_start_enters_round_active() {
        let mut engine = RoundEngine::new(GameId::ReactionTap, ScriptedRandom::new(vec![5]));
        assert_eq!(engine.state(), SessionState::Idle);
        engine.start();
        assert_eq!(engine.state(), SessionState::RoundActive);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.round_index(), 0);
        assert_eq!(engine.time_remaining(), Some(1.2));
        assert!(matches!(
            engine.layout(),
            Some(Layout::Target { target: 5, .. })
        ));
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::RoundStarted { round: 0 }]
        );
    }

    #[test]
    fn test_start_twice_keeps_progress() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::OddOneOut, 3);
        engine.start();
        let idx = answer(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        assert_eq!(engine.score(), 1);

        engine.start();
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.round_index(), 1);
    }

    #[test]
    fn test_correct_tap_adds_exactly_one_in_every_game() {
        for game in GameId::ALL {
            let mut profile = Profile::new();
            let rng = ScriptedRandom::new(vec![1, 6, 2]).with_units(vec![0.0]);
            let mut engine = RoundEngine::new(game, rng);
            engine.start();
            if game == GameId::NBackMatch {
                // First stimulus has no history; let the stream move on
                engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
            }

            let before = engine.score();
            if game == GameId::SequenceRecall {
                for cell in sequence_of(&engine) {
                    engine.resolve_tap(Some(cell), &mut profile);
                }
            } else {
                let idx = answer(&engine);
                engine.resolve_tap(Some(idx), &mut profile);
            }
            assert_eq!(engine.score(), before + 1, "{:?}", game);
            assert_eq!(profile.best(game), 1, "{:?}", game);
            assert_eq!(profile.xp, game.tuning().xp_per_correct, "{:?}", game);
        }
    }

    #[test]
    fn test_wrong_taps_floor_at_zero() {
        for game in [GameId::ReactionTap, GameId::OddOneOut, GameId::PatternPuzzle] {
            let mut profile = Profile::new();
            let mut engine = RoundEngine::with_seed(game, 11);
            engine.start();
            let idx = answer(&engine);
            engine.resolve_tap(Some(idx), &mut profile);
            for _ in 0..10 {
                let idx = wrong(&engine);
                engine.resolve_tap(Some(idx), &mut profile);
            }
            assert_eq!(engine.score(), 0, "{:?}", game);
            assert_eq!(engine.state(), SessionState::RoundActive, "{:?}", game);
            assert_eq!(profile.best(game), 1);
        }
    }

    #[test]
    fn test_odd_one_out_wrong_tap_keeps_layout() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::OddOneOut, 5);
        engine.start();
        let before = engine.layout().cloned();
        let idx = wrong(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        assert_eq!(engine.layout().cloned(), before);
        assert_eq!(engine.round_index(), 0);
    }

    #[test]
    fn test_reaction_timeout_without_score_ends_session() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 1);
        engine.start();
        engine.drain_events();
        engine.update(0.6, &mut profile);
        assert_eq!(engine.state(), SessionState::RoundActive);
        engine.update(0.6, &mut profile);
        assert_eq!(engine.state(), SessionState::Ended);
        assert_eq!(
            engine.drain_events(),
            vec![
                GameEvent::RoundTimeout { score: 0 },
                GameEvent::SessionEnded { score: 0 }
            ]
        );
        // Further ticks and taps do nothing
        engine.update(5.0, &mut profile);
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.state(), SessionState::Ended);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_reaction_timeout_with_score_deducts_and_continues() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 8);
        engine.start();
        for _ in 0..3 {
            let idx = answer(&engine);
            engine.resolve_tap(Some(idx), &mut profile);
        }
        assert_eq!(engine.score(), 3);
        let round = engine.round_index();

        engine.update(2.0, &mut profile);
        assert_eq!(engine.score(), 2);
        assert_eq!(engine.state(), SessionState::RoundActive);
        assert_eq!(engine.round_index(), round + 1);
        assert_eq!(profile.best(GameId::ReactionTap), 3);
    }

    #[test]
    fn test_reaction_window_shrinks_with_score() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 21);
        engine.start();
        let mut prev = engine.time_remaining().unwrap();
        for _ in 0..60 {
            let idx = answer(&engine);
            engine.resolve_tap(Some(idx), &mut profile);
            let window = engine.time_remaining().unwrap();
            assert!(window <= prev);
            assert!(window >= REACTION_WINDOW_FLOOR);
            prev = window;
        }
        assert_eq!(prev, REACTION_WINDOW_FLOOR);
        assert_eq!(engine.layout().unwrap().geometry().count, 36);
    }

    #[test]
    fn test_empty_tap_policy() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 2);
        engine.start();
        let idx = answer(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        engine.resolve_tap(None, &mut profile);
        assert_eq!(engine.score(), 0);

        let mut engine = RoundEngine::with_seed(GameId::SequenceRecall, 2);
        engine.start();
        engine.resolve_tap(None, &mut profile);
        engine.resolve_tap(Some(99), &mut profile);
        assert!(engine.session().input.is_empty());
    }

    #[test]
    fn test_update_zero_is_noop() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 4);
        engine.start();
        engine.update(0.0, &mut profile);
        engine.update(f32::NAN, &mut profile);
        assert_eq!(engine.time_remaining(), Some(1.2));
    }

    #[test]
    fn test_stale_timer_is_discarded() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 4);
        engine.start();
        let stale = engine.generation();
        engine.stop(&mut profile);
        engine.start();
        engine.fire_round_timer(stale, &mut profile);
        assert_eq!(engine.state(), SessionState::RoundActive);

        let current = engine.generation();
        engine.fire_round_timer(current, &mut profile);
        assert_eq!(engine.state(), SessionState::Ended);
    }

    #[test]
    fn test_stop_keeps_score_and_writes_best() {
        let mut profile = Profile::new();
        profile.record_best(GameId::OddOneOut, 1);
        let mut engine = RoundEngine::with_seed(GameId::OddOneOut, 6);
        engine.start();
        for _ in 0..4 {
            let idx = answer(&engine);
            engine.resolve_tap(Some(idx), &mut profile);
        }
        engine.drain_events();
        engine.stop(&mut profile);
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.score(), 4);
        assert_eq!(engine.time_remaining(), None);
        assert_eq!(profile.best(GameId::OddOneOut), 4);
        assert_eq!(
            engine.drain_events(),
            vec![GameEvent::SessionEnded { score: 4 }]
        );

        // A weaker session never lowers the best
        engine.start();
        engine.stop(&mut profile);
        assert_eq!(profile.best(GameId::OddOneOut), 4);
    }

    #[test]
    fn test_tap_while_idle_is_noop() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::PatternPuzzle, 1);
        engine.resolve_tap(Some(0), &mut profile);
        engine.update(1.0, &mut profile);
        assert_eq!(engine.state(), SessionState::Idle);
        assert_eq!(engine.score(), 0);
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_sequence_recall_scenario() {
        let mut profile = Profile::new();
        let mut engine =
            RoundEngine::new(GameId::SequenceRecall, ScriptedRandom::new(vec![0, 4, 8]));
        engine.start();
        assert_eq!(engine.difficulty_level(), 3);
        assert_eq!(sequence_of(&engine), vec![0, 4, 8]);

        for cell in [0, 4, 8] {
            engine.resolve_tap(Some(cell), &mut profile);
        }
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.state(), SessionState::RoundActive);
        assert_eq!(sequence_of(&engine).len(), 4);
        assert_eq!(engine.layout().unwrap().expected_input_length(), 4);

        let mut engine =
            RoundEngine::new(GameId::SequenceRecall, ScriptedRandom::new(vec![0, 4, 8]));
        engine.start();
        for cell in [0, 4, 7] {
            engine.resolve_tap(Some(cell), &mut profile);
        }
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.difficulty_level(), SEQUENCE_MIN_LEN as u32);
        assert_eq!(sequence_of(&engine).len(), 3);
        assert_eq!(engine.state(), SessionState::RoundActive);
    }

    #[test]
    fn test_sequence_wrong_after_progress_resets() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::SequenceRecall, 12);
        engine.start();
        for _ in 0..3 {
            for cell in sequence_of(&engine) {
                engine.resolve_tap(Some(cell), &mut profile);
            }
        }
        assert_eq!(engine.score(), 3);
        assert_eq!(sequence_of(&engine).len(), 6);

        let mut taps = sequence_of(&engine);
        let last = taps.len() - 1;
        taps[last] = (taps[last] + 1) % 9;
        for cell in taps {
            engine.resolve_tap(Some(cell), &mut profile);
        }
        assert_eq!(engine.score(), 0);
        assert_eq!(sequence_of(&engine).len(), 3);
        assert_eq!(profile.best(GameId::SequenceRecall), 3);
    }

    #[test]
    fn test_sequence_playback_flashes_in_order() {
        let mut profile = Profile::new();
        let mut engine =
            RoundEngine::new(GameId::SequenceRecall, ScriptedRandom::new(vec![0, 4, 8]));
        engine.start();
        assert_eq!(engine.flashing_cell(), Some(0));
        engine.update(0.38, &mut profile);
        assert_eq!(engine.flashing_cell(), None);
        engine.update(0.1, &mut profile);
        assert_eq!(engine.flashing_cell(), Some(4));
        engine.update(0.42, &mut profile);
        assert_eq!(engine.flashing_cell(), Some(8));
        engine.update(1.0, &mut profile);
        assert_eq!(engine.flashing_cell(), None);
    }

    #[test]
    fn test_n_back_stream_and_claims() {
        let mut profile = Profile::new();
        let rng = ScriptedRandom::new(vec![0, 1, 2]).with_units(vec![0.0]);
        let mut engine = RoundEngine::new(GameId::NBackMatch, rng);
        engine.start();
        assert_eq!(engine.difficulty_level(), 1);

        // No history yet: a claim is wrong but the stream carries on
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.state(), SessionState::Running);
        engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
        assert_eq!(engine.state(), SessionState::RoundActive);

        // Forced repeat of the previous letter
        assert!(engine.layout().unwrap().accepts(0));
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.state(), SessionState::Running);

        // Claiming the same stimulus twice does nothing
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.score(), 1);

        // Taps never stop the stream
        let round = engine.round_index();
        engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
        assert_eq!(engine.round_index(), round + 1);
    }

    #[test]
    fn test_n_back_raises_and_resets_n() {
        let mut profile = Profile::new();
        let rng = ScriptedRandom::new(vec![0]).with_units(vec![0.0]);
        let mut engine = RoundEngine::new(GameId::NBackMatch, rng);
        engine.start();
        for _ in 0..5 {
            engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
            engine.resolve_tap(Some(0), &mut profile);
        }
        assert_eq!(engine.score(), 5);
        assert_eq!(engine.difficulty_level(), 2);

        // With N = 2 the stream needs a stimulus to settle; then a forced match
        engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
        let Some(Layout::Stimulus { n, .. }) = engine.layout() else {
            panic!("expected stimulus");
        };
        assert_eq!(*n, 2);

        engine.set_n_back(3);
        assert_eq!(engine.score(), 0);
        assert_eq!(engine.difficulty_level(), 3);

        // The first stimulus of a session never matches
        let mut engine = RoundEngine::with_seed(GameId::NBackMatch, 99);
        engine.start();
        engine.set_n_back(2);
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.difficulty_level(), 1);
    }

    #[test]
    fn test_n_back_choice_survives_start() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::NBackMatch, 1);
        engine.set_n_back(2);
        engine.start();
        assert_eq!(engine.difficulty_level(), 2);
        let Some(Layout::Stimulus { n, .. }) = engine.layout() else {
            panic!("expected stimulus");
        };
        assert_eq!(*n, 2);

        // Kept for the next session too
        engine.stop(&mut profile);
        engine.start();
        assert_eq!(engine.difficulty_level(), 2);

        // Other games ignore the selector
        let mut engine = RoundEngine::with_seed(GameId::SequenceRecall, 1);
        engine.set_n_back(3);
        engine.start();
        assert_eq!(engine.difficulty_level(), SEQUENCE_MIN_LEN as u32);
    }

    #[test]
    fn test_n_back_change_rejudges_current_letter() {
        let mut profile = Profile::new();
        // Letters B, C, B; never a forced repeat
        let rng = ScriptedRandom::new(vec![0, 1, 0]).with_units(vec![1.0]);
        let mut engine = RoundEngine::new(GameId::NBackMatch, rng);
        engine.start();
        engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
        engine.update(crate::tuning::N_BACK_INTERVAL, &mut profile);
        assert!(!engine.layout().unwrap().accepts(0));

        engine.set_n_back(2);
        let Some(Layout::Stimulus { letter, n, is_match, .. }) = engine.layout() else {
            panic!("expected stimulus");
        };
        assert_eq!((*letter, *n, *is_match), ('B', 2, true));
        engine.resolve_tap(Some(0), &mut profile);
        assert_eq!(engine.score(), 1);
        assert_eq!(engine.difficulty_level(), 2);
    }

    #[test]
    fn test_puzzle_rotation_advances_regardless() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::PatternPuzzle, 0);
        engine.start();
        assert!(matches!(engine.layout(), Some(Layout::Puzzle { index: 0, .. })));
        let idx = wrong(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        assert!(matches!(engine.layout(), Some(Layout::Puzzle { index: 1, .. })));
        let idx = answer(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        assert!(matches!(engine.layout(), Some(Layout::Puzzle { index: 2, .. })));
        assert_eq!(engine.score(), 1);
        assert_eq!(profile.xp, 8);
    }

    #[test]
    fn test_timed_reflection_runs_to_completion() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::TimedReflection, 0);
        engine.start();
        assert_eq!(engine.time_remaining(), Some(REFLECTION_DURATION));
        for _ in 0..3 {
            engine.resolve_tap(Some(0), &mut profile);
        }
        assert_eq!(engine.score(), 3);
        assert_eq!(engine.state(), SessionState::RoundActive);
        // Log taps never restart the session clock
        assert_eq!(engine.time_remaining(), Some(REFLECTION_DURATION));
        engine.drain_events();

        for _ in 0..119 {
            engine.update(1.0, &mut profile);
        }
        let prompts: Vec<_> = engine
            .drain_events()
            .into_iter()
            .filter(|e| matches!(e, GameEvent::ReflectionPrompt { .. }))
            .collect();
        assert_eq!(
            prompts,
            vec![
                GameEvent::ReflectionPrompt { index: 0 },
                GameEvent::ReflectionPrompt { index: 1 },
                GameEvent::ReflectionPrompt { index: 2 },
            ]
        );
        assert_eq!(engine.state(), SessionState::RoundActive);

        engine.update(1.0, &mut profile);
        assert_eq!(engine.state(), SessionState::Ended);
        // 3 logs at 2 XP plus the completion bonus
        assert_eq!(profile.xp, 16);
        assert_eq!(profile.best(GameId::TimedReflection), 3);
    }

    #[test]
    fn test_level_up_event() {
        let mut profile = Profile::new();
        profile.xp = 98;
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 3);
        engine.start();
        engine.drain_events();
        let idx = answer(&engine);
        engine.resolve_tap(Some(idx), &mut profile);
        let events = engine.drain_events();
        assert!(events.contains(&GameEvent::LevelUp { level: 2 }));
        assert!(events.contains(&GameEvent::NewBest {
            game: GameId::ReactionTap,
            score: 1
        }));
        assert_eq!((profile.level, profile.xp), (2, 1));
    }

    #[test]
    fn test_restart_after_end() {
        let mut profile = Profile::new();
        let mut engine = RoundEngine::with_seed(GameId::ReactionTap, 3);
        engine.start();
        engine.update(5.0, &mut profile);
        assert_eq!(engine.state(), SessionState::Ended);
        engine.start();
        assert_eq!(engine.state(), SessionState::RoundActive);
        assert_eq!(engine.score(), 0);
    }

    proptest! {
        #[test]
        fn prop_score_never_underflows_and_best_is_max(
            seed in any::<u64>(),
            taps in prop::collection::vec(prop::option::of(0usize..40), 1..80),
        ) {
            let mut profile = Profile::new();
            let mut engine = RoundEngine::with_seed(GameId::OddOneOut, seed);
            engine.start();
            let mut highest = 0;
            for tap in taps {
                let before = engine.score();
                engine.resolve_tap(tap, &mut profile);
                let after = engine.score();
                prop_assert!(after <= before + 1);
                highest = highest.max(after);
            }
            prop_assert_eq!(profile.best(GameId::OddOneOut), highest);
        }
    }
}
