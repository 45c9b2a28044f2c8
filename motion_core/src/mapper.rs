//! Motion magnitude → synthesis control targets.
//!
//! The mapper is a pure function of `(m, DeviceProfile, BaseParams)` plus
//! its [`MappingCurve`].  Below the profile's noise floor it asks for
//! silence; above it, three clamped linear ramps drive gain, filter cutoff
//! and pitch.  Saturation points are fractions of the profile's
//! `max_magnitude`, so one curve serves every device class and metric.
//!
//! ```text
//!  gain dB
//!   max ┤            ┌──────────────
//!       │          ╱
//!   min ┤ ·······╱
//!  silent ───────┘
//!       └────────┬───┬──────────────▶ m
//!              floor  gain_saturation
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::profile::DeviceProfile;

// ════════════════════════════════════════════════════════════════════════════
// Gain
// ════════════════════════════════════════════════════════════════════════════

/// Output level target.  `Silent` orders below every `Db` value.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum Gain {
    /// Mute (−∞ dB); how it is reached is up to the audio engine.
    Silent,
    Db(f32),
}

impl Gain {
    pub fn is_silent(self) -> bool { matches!(self, Gain::Silent) }

    /// Level in decibels, `-inf` for silence.
    pub fn db(self) -> f32 {
        match self {
            Gain::Silent => f32::NEG_INFINITY,
            Gain::Db(db) => db,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// BaseParams / ControlParameters
// ════════════════════════════════════════════════════════════════════════════

/// Live user-adjustable bases, read every tick.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseParams {
    pub base_cutoff_hz: f32,
    pub base_pitch_hz:  f32,
}

impl Default for BaseParams {
    fn default() -> Self {
        BaseParams {
            base_cutoff_hz: 500.0,
            base_pitch_hz:  65.41, // C2
        }
    }
}

/// Targets for one tick.  The engine ramps toward them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlParameters {
    pub gain:         Gain,
    pub cutoff_hz:    f32,
    /// Motion-driven part of the pitch, in Hz.
    pub pitch_offset: f32,
    /// `base_pitch_hz + pitch_offset`.
    pub pitch_hz:     f32,
}

impl ControlParameters {
    /// Silence with the filter and pitch resting at their bases.
    pub fn silent(base: &BaseParams) -> Self {
        ControlParameters {
            gain:         Gain::Silent,
            cutoff_hz:    base.base_cutoff_hz.max(0.0),
            pitch_offset: 0.0,
            pitch_hz:     base.base_pitch_hz,
        }
    }

    pub fn is_silent(&self) -> bool { self.gain.is_silent() }
}

// ════════════════════════════════════════════════════════════════════════════
// MappingCurve
// ════════════════════════════════════════════════════════════════════════════

/// Output ranges and saturation points of the three ramps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingCurve {
    pub min_db:            f32,
    pub max_db:            f32,
    /// Gain reaches `max_db` at this fraction of `max_magnitude`.
    pub gain_saturation:   f32,
    /// Widest cutoff sweep above the base, in Hz.
    pub max_sweep_hz:      f32,
    pub filter_saturation: f32,
    /// Pitch offset at full magnitude, in Hz.
    pub pitch_scale_hz:    f32,
    /// Optional clamp for the pitch ramp; full magnitude when absent.
    pub pitch_saturation:  Option<f32>,
}

impl Default for MappingCurve {
    fn default() -> Self {
        MappingCurve {
            min_db:            -10.0,
            max_db:            6.0,
            gain_saturation:   0.15,
            max_sweep_hz:      6000.0,
            filter_saturation: 0.3,
            pitch_scale_hz:    50.0,
            pitch_saturation:  None,
        }
    }
}

impl MappingCurve {
    /// Reject curves that are not monotonic or whose ramps would start at
    /// or after they saturate under `profile`.
    pub fn validate(&self, profile: &DeviceProfile) -> Result<()> {
        let finite = [
            self.min_db, self.max_db, self.gain_saturation,
            self.max_sweep_hz, self.filter_saturation, self.pitch_scale_hz,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidCurve("values must be finite".into()));
        }
        if self.min_db > self.max_db {
            return Err(CoreError::InvalidCurve(format!(
                "min_db {} above max_db {}", self.min_db, self.max_db
            )));
        }
        if self.max_sweep_hz < 0.0 || self.pitch_scale_hz < 0.0 {
            return Err(CoreError::InvalidCurve("sweep and pitch scale must be non-negative".into()));
        }
        let floor = profile.noise_floor;
        let sats = [
            ("gain_saturation",   Some(self.gain_saturation)),
            ("filter_saturation", Some(self.filter_saturation)),
            ("pitch_saturation",  self.pitch_saturation),
        ];
        for (name, frac) in sats {
            if let Some(frac) = frac {
                if !(frac * profile.max_magnitude > floor) {
                    return Err(CoreError::InvalidCurve(format!(
                        "{name} {frac} does not lie above the noise floor {floor}"
                    )));
                }
            }
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SignalMapper
// ════════════════════════════════════════════════════════════════════════════

/// Stateless motion → control mapping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SignalMapper {
    curve: MappingCurve,
}

impl SignalMapper {
    pub fn new(curve: MappingCurve) -> Self {
        SignalMapper { curve }
    }

    pub fn curve(&self) -> &MappingCurve { &self.curve }

    /// Map magnitude `m` (in `profile.metric` units) to control targets.
    pub fn map(&self, m: f32, profile: &DeviceProfile, base: &BaseParams) -> ControlParameters {
        let floor = profile.noise_floor;
        let max   = profile.max_magnitude;

        // NaN falls through to silence as well.
        if !(m > floor) {
            return ControlParameters::silent(base);
        }

        let c = &self.curve;
        let gain_db = ramp(m, floor, c.gain_saturation * max, c.min_db, c.max_db);
        let sweep   = ramp(m, floor, c.filter_saturation * max, 0.0, c.max_sweep_hz);

        let pitch_sat    = c.pitch_saturation.map_or(max, |f| f * max);
        let pitch_offset = if max > 0.0 {
            c.pitch_scale_hz * m.min(pitch_sat) / max
        } else {
            0.0
        };

        ControlParameters {
            gain:         Gain::Db(gain_db),
            cutoff_hz:    (base.base_cutoff_hz + sweep).max(0.0),
            pitch_offset,
            pitch_hz:     base.base_pitch_hz + pitch_offset,
        }
    }
}

/// Linear map of `m` from `[lo, hi]` onto `[out_lo, out_hi]`, clamped.
///
/// At or past `hi` the result is exactly `out_hi`; a degenerate domain
/// (`hi ≤ lo`) saturates immediately.
fn ramp(m: f32, lo: f32, hi: f32, out_lo: f32, out_hi: f32) -> f32 {
    if hi <= lo || m >= hi {
        return out_hi;
    }
    let t = ((m - lo) / (hi - lo)).clamp(0.0, 1.0);
    out_lo + t * (out_hi - out_lo)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{DeviceClass, MotionMetric};

    fn ratio_profile() -> DeviceProfile {
        DeviceProfile::for_class(DeviceClass::Capable, MotionMetric::Ratio)
    }

    #[test]
    fn gate_requests_silence() {
        let p = ratio_profile();
        let base = BaseParams::default();
        let out = SignalMapper::default().map(p.noise_floor, &p, &base);
        assert_eq!(out.gain, Gain::Silent);
        assert_eq!(out.cutoff_hz, base.base_cutoff_hz);
        assert_eq!(out.pitch_hz, base.base_pitch_hz);
        assert_eq!(SignalMapper::default().map(0.0, &p, &base).gain, Gain::Silent);
    }

    #[test]
    fn nan_is_gated() {
        let p = ratio_profile();
        let out = SignalMapper::default().map(f32::NAN, &p, &BaseParams::default());
        assert!(out.is_silent());
    }

    #[test]
    fn just_above_floor_starts_at_min_db() {
        let p = ratio_profile();
        let out = SignalMapper::default().map(p.noise_floor + 1e-6, &p, &BaseParams::default());
        assert!((out.gain.db() - (-10.0)).abs() < 0.01);
    }

    #[test]
    fn saturation_clamps_exactly() {
        let p = ratio_profile();
        let base = BaseParams { base_cutoff_hz: 300.0, base_pitch_hz: 110.0 };
        let mapper = SignalMapper::default();
        for m in [0.3, 0.5, 1.0, 7.5] {
            let out = mapper.map(m, &p, &base);
            assert_eq!(out.gain, Gain::Db(6.0));
            assert_eq!(out.cutoff_hz, 6300.0);
        }
        // Pitch saturates at full magnitude by default.
        assert_eq!(mapper.map(7.5, &p, &base).pitch_offset, 50.0);
    }

    #[test]
    fn midpoint_gain() {
        let p = ratio_profile();
        let mapper = SignalMapper::default();
        let mid = (p.noise_floor + 0.15) / 2.0;
        let out = mapper.map(mid, &p, &BaseParams::default());
        assert!((out.gain.db() - (-2.0)).abs() < 1e-3);
    }

    #[test]
    fn pitch_is_proportional() {
        let p = ratio_profile();
        let base = BaseParams { base_cutoff_hz: 500.0, base_pitch_hz: 100.0 };
        let out = SignalMapper::default().map(0.2, &p, &base);
        assert!((out.pitch_offset - 10.0).abs() < 1e-4);
        assert!((out.pitch_hz - 110.0).abs() < 1e-4);
    }

    #[test]
    fn pitch_saturation_clamps() {
        let p = ratio_profile();
        let curve = MappingCurve { pitch_saturation: Some(0.5), ..MappingCurve::default() };
        let out = SignalMapper::new(curve).map(0.9, &p, &BaseParams::default());
        assert_eq!(out.pitch_offset, 25.0);
    }

    #[test]
    fn negative_base_cutoff_clamps_to_zero() {
        let p = ratio_profile();
        let base = BaseParams { base_cutoff_hz: -100.0, base_pitch_hz: 65.0 };
        assert_eq!(SignalMapper::default().map(0.0, &p, &base).cutoff_hz, 0.0);
    }

    #[test]
    fn silent_orders_below_db() {
        assert!(Gain::Silent < Gain::Db(-120.0));
        assert!(Gain::Db(-3.0) < Gain::Db(0.0));
        assert_eq!(Gain::Silent.db(), f32::NEG_INFINITY);
    }

    #[test]
    fn validate_rejects_saturation_below_floor() {
        let p = DeviceProfile::for_class(DeviceClass::Constrained, MotionMetric::Ratio);
        let curve = MappingCurve { gain_saturation: 0.001, ..MappingCurve::default() };
        assert!(matches!(curve.validate(&p), Err(CoreError::InvalidCurve(_))));
        assert!(MappingCurve::default().validate(&p).is_ok());
    }

    #[test]
    fn validate_rejects_inverted_db_range() {
        let curve = MappingCurve { min_db: 3.0, max_db: -3.0, ..MappingCurve::default() };
        assert!(curve.validate(&ratio_profile()).is_err());
    }

    #[test]
    fn degenerate_domain_saturates() {
        assert_eq!(ramp(0.5, 1.0, 1.0, -10.0, 6.0), 6.0);
    }
}
