//! Feedback dispatch
//!
//! Game events are realised as a short tone and/or a vibration. Sinks are
//! fire-and-forget: they never report failure and never block the loop.

use crate::settings::Settings;
use crate::sim::GameEvent;

/// What an event sounds and feels like
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCue {
    /// Taps, timeouts and reflection prompts
    Ping,
    LevelUp,
}

impl FeedbackCue {
    pub fn for_event(event: &GameEvent) -> Option<Self> {
        match event {
            GameEvent::CorrectTap { .. }
            | GameEvent::WrongTap { .. }
            | GameEvent::RoundTimeout { .. }
            | GameEvent::ReflectionPrompt { .. } => Some(FeedbackCue::Ping),
            GameEvent::LevelUp { .. } => Some(FeedbackCue::LevelUp),
            GameEvent::RoundStarted { .. }
            | GameEvent::NewBest { .. }
            | GameEvent::SessionEnded { .. } => None,
        }
    }

    /// Tone frequency (Hz) and duration (ms)
    pub fn tone(&self) -> (f32, u32) {
        match self {
            FeedbackCue::Ping => (440.0, 80),
            FeedbackCue::LevelUp => (880.0, 80),
        }
    }

    /// Vibration duration (ms)
    pub fn vibration_ms(&self) -> u32 {
        match self {
            FeedbackCue::Ping => 20,
            FeedbackCue::LevelUp => 60,
        }
    }
}

/// Platform output for feedback
pub trait FeedbackSink {
    fn play_tone(&mut self, freq: f32, duration_ms: u32);
    fn vibrate(&mut self, duration_ms: u32);
}

/// Sink for headless runs
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl FeedbackSink for NullSink {
    fn play_tone(&mut self, _freq: f32, _duration_ms: u32) {}
    fn vibrate(&mut self, _duration_ms: u32) {}
}

/// Sink that remembers every call
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub tones: Vec<(f32, u32)>,
    pub vibrations: Vec<u32>,
}

impl FeedbackSink for RecordingSink {
    fn play_tone(&mut self, freq: f32, duration_ms: u32) {
        self.tones.push((freq, duration_ms));
    }

    fn vibrate(&mut self, duration_ms: u32) {
        self.vibrations.push(duration_ms);
    }
}

/// Maps events to cues and gates them on the sound/haptics settings
#[derive(Debug)]
pub struct Feedback<K> {
    sink: K,
    sound: bool,
    haptics: bool,
}

impl<K: FeedbackSink> Feedback<K> {
    pub fn new(sink: K, settings: &Settings) -> Self {
        Self {
            sink,
            sound: settings.sound,
            haptics: settings.haptics,
        }
    }

    pub fn apply_settings(&mut self, settings: &Settings) {
        self.sound = settings.sound;
        self.haptics = settings.haptics;
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn dispatch(&mut self, event: &GameEvent) {
        if let Some(cue) = FeedbackCue::for_event(event) {
            self.play(cue);
        }
    }

    pub fn play(&mut self, cue: FeedbackCue) {
        if self.haptics {
            self.sink.vibrate(cue.vibration_ms());
        }
        if self.sound {
            let (freq, duration_ms) = cue.tone();
            self.sink.play_tone(freq, duration_ms);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_cues() {
        assert_eq!(
            FeedbackCue::for_event(&GameEvent::CorrectTap { score: 1 }),
            Some(FeedbackCue::Ping)
        );
        assert_eq!(
            FeedbackCue::for_event(&GameEvent::LevelUp { level: 2 }),
            Some(FeedbackCue::LevelUp)
        );
        assert_eq!(
            FeedbackCue::for_event(&GameEvent::RoundStarted { round: 0 }),
            None
        );
    }

    #[test]
    fn test_dispatch_honours_settings() {
        let mut settings = Settings::default();
        let mut feedback = Feedback::new(RecordingSink::default(), &settings);
        feedback.dispatch(&GameEvent::WrongTap { score: 0 });
        feedback.dispatch(&GameEvent::LevelUp { level: 3 });
        assert_eq!(feedback.sink().tones, vec![(440.0, 80), (880.0, 80)]);
        assert_eq!(feedback.sink().vibrations, vec![20, 60]);

        settings.sound = false;
        feedback.apply_settings(&settings);
        feedback.dispatch(&GameEvent::CorrectTap { score: 1 });
        assert_eq!(feedback.sink().tones.len(), 2);
        assert_eq!(feedback.sink().vibrations.len(), 3);

        settings.haptics = false;
        feedback.apply_settings(&settings);
        feedback.dispatch(&GameEvent::CorrectTap { score: 2 });
        assert_eq!(feedback.sink().vibrations.len(), 3);
    }
}
