//! Fixed-step scheduling
//!
//! The frame clock (requestAnimationFrame on web) delivers variable deltas;
//! the stepper turns them into whole ticks of `1 / fps` seconds so the round
//! engine only ever sees a fixed dt.

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};
use crate::settings::FpsCap;

#[derive(Debug, Clone)]
pub struct FixedStepper {
    tick_dt: f32,
    accumulator: f32,
}

impl FixedStepper {
    pub fn new(cap: FpsCap) -> Self {
        Self {
            tick_dt: cap.tick_dt(),
            accumulator: 0.0,
        }
    }

    /// Seconds per tick
    pub fn tick_dt(&self) -> f32 {
        self.tick_dt
    }

    pub fn set_fps_cap(&mut self, cap: FpsCap) {
        self.tick_dt = cap.tick_dt();
        self.accumulator = 0.0;
    }

    /// Drop any partial tick, e.g. after the page was hidden
    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    /// Feed one frame delta; returns how many ticks to run now
    pub fn advance(&mut self, frame_dt: f32) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt.min(MAX_FRAME_DT);

        let mut substeps = 0;
        while self.accumulator >= self.tick_dt && substeps < MAX_SUBSTEPS {
            self.accumulator -= self.tick_dt;
            substeps += 1;
        }
        substeps
    }
}
