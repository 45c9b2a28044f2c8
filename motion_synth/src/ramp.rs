//! Linear parameter ramps.
//!
//! A ramp moves from wherever it currently is toward a target over a fixed
//! duration.  Retargeting mid-ramp restarts from the current value, so a
//! stream of per-tick targets produces a continuous glide.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Ramp durations per control, in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RampTimes {
    /// Gain toward an audible level.
    pub attack_ms:  u64,
    /// Gain toward silence.
    pub release_ms: u64,
    pub cutoff_ms:  u64,
    pub pitch_ms:   u64,
}

impl Default for RampTimes {
    fn default() -> Self {
        RampTimes {
            attack_ms:  50,
            release_ms: 200,
            cutoff_ms:  50,
            pitch_ms:   100,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ramp {
    value:    f32,
    start:    f32,
    target:   f32,
    elapsed:  Duration,
    duration: Duration,
}

impl Ramp {
    /// A settled ramp resting at `value`.
    pub fn new(value: f32) -> Self {
        Ramp {
            value,
            start:    value,
            target:   value,
            elapsed:  Duration::ZERO,
            duration: Duration::ZERO,
        }
    }

    pub fn value(&self)  -> f32 { self.value }
    pub fn target(&self) -> f32 { self.target }

    pub fn is_settled(&self) -> bool { self.value == self.target }

    /// Head for `target`, arriving after `duration`.
    ///
    /// Asking again for the target already being approached keeps the
    /// current schedule.
    pub fn retarget(&mut self, target: f32, duration: Duration) {
        if target == self.target {
            return;
        }
        self.start    = self.value;
        self.target   = target;
        self.elapsed  = Duration::ZERO;
        self.duration = duration;
    }

    /// Advance by `dt` and return the new value.
    pub fn advance(&mut self, dt: Duration) -> f32 {
        if self.is_settled() {
            return self.value;
        }
        self.elapsed += dt;
        if self.duration.is_zero() || self.elapsed >= self.duration {
            self.value = self.target;
        } else {
            let t = self.elapsed.as_secs_f32() / self.duration.as_secs_f32();
            self.value = self.start + (self.target - self.start) * t;
        }
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration { Duration::from_millis(n) }

    #[test]
    fn reaches_target_exactly() {
        let mut r = Ramp::new(0.0);
        r.retarget(10.0, ms(100));
        r.advance(ms(50));
        assert!((r.value() - 5.0).abs() < 1e-4);
        r.advance(ms(60));
        assert_eq!(r.value(), 10.0);
        assert!(r.is_settled());
    }

    #[test]
    fn zero_duration_jumps() {
        let mut r = Ramp::new(1.0);
        r.retarget(3.0, Duration::ZERO);
        assert_eq!(r.advance(ms(1)), 3.0);
    }

    #[test]
    fn retarget_mid_ramp_starts_from_current_value() {
        let mut r = Ramp::new(0.0);
        r.retarget(100.0, ms(100));
        r.advance(ms(50));
        r.retarget(0.0, ms(100));
        r.advance(ms(50));
        assert!((r.value() - 25.0).abs() < 1e-3);
    }

    #[test]
    fn repeated_target_keeps_schedule() {
        let mut r = Ramp::new(0.0);
        r.retarget(10.0, ms(100));
        r.advance(ms(90));
        // Per-tick resend of the same target must not restart the glide.
        r.retarget(10.0, ms(100));
        r.advance(ms(10));
        assert_eq!(r.value(), 10.0);
    }
}
