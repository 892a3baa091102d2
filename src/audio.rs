//! Browser feedback sink: Web Audio tones and navigator vibration
//!
//! Tones are generated procedurally, no external files needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use crate::feedback::FeedbackSink;

/// Peak gain of a tone
const TONE_GAIN: f32 = 0.25;
/// Attack time of the tone envelope (seconds)
const TONE_ATTACK: f64 = 0.004;

pub struct WebFeedback {
    /// Created lazily on first use (browsers want a user gesture first)
    ctx: Option<AudioContext>,
    audio_failed: bool,
}

impl Default for WebFeedback {
    fn default() -> Self {
        Self::new()
    }
}

impl WebFeedback {
    pub fn new() -> Self {
        Self {
            ctx: None,
            audio_failed: false,
        }
    }

    fn context(&mut self) -> Option<&AudioContext> {
        if self.ctx.is_none() && !self.audio_failed {
            // May fail outside a secure context
            match AudioContext::new() {
                Ok(ctx) => self.ctx = Some(ctx),
                Err(_) => {
                    log::warn!("Failed to create AudioContext - tones disabled");
                    self.audio_failed = true;
                }
            }
        }
        let ctx = self.ctx.as_ref()?;

        // Resume context if suspended (browsers require user gesture)
        if ctx.state() == web_sys::AudioContextState::Suspended {
            let _ = ctx.resume();
        }
        Some(ctx)
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
        ctx: &AudioContext,
        freq: f32,
        osc_type: OscillatorType,
    ) -> Option<(OscillatorNode, GainNode)> {
        let osc = ctx.create_oscillator().ok()?;
        let gain = ctx.create_gain().ok()?;

        osc.set_type(osc_type);
        osc.frequency().set_value(freq);
        osc.connect_with_audio_node(&gain).ok()?;
        gain.connect_with_audio_node(&ctx.destination()).ok()?;

        Some((osc, gain))
    }
}

impl FeedbackSink for WebFeedback {
    fn play_tone(&mut self, freq: f32, duration_ms: u32) {
        let Some(ctx) = self.context() else { return };
        let Some((osc, gain)) = Self::create_osc(ctx, freq, OscillatorType::Sine) else {
            return;
        };
        let t = ctx.current_time();
        let duration = f64::from(duration_ms) / 1000.0;

        gain.gain().set_value_at_time(0.0001, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(TONE_GAIN, t + TONE_ATTACK)
            .ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.0001, t + duration)
            .ok();

        osc.start().ok();
        osc.stop_with_when(t + duration + 0.01).ok();
    }

    fn vibrate(&mut self, duration_ms: u32) {
        if let Some(window) = web_sys::window() {
            // Unsupported browsers just return false
            let _ = window.navigator().vibrate_with_duration(duration_ms);
        }
    }
}
