//! Resolution / sampling policy.
//!
//! A [`DeviceProfile`] is derived once per session from a single coarse
//! capability signal (the viewport width) and then held read-only.  It
//! fixes the capture size, so recomputing it mid-session would invalidate
//! the detector's retained frame.

use serde::{Deserialize, Serialize};

/// Viewports narrower than this are treated as constrained devices.
pub const CONSTRAINED_VIEWPORT_WIDTH: u32 = 800;

// ════════════════════════════════════════════════════════════════════════════
// DeviceClass
// ════════════════════════════════════════════════════════════════════════════

/// Coarse device capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    /// Small screen / weak CPU: low resolution, sparse sampling.
    Constrained,
    /// Desktop-class: full resolution, every pixel sampled.
    Capable,
}

impl DeviceClass {
    pub fn from_viewport_width(width: u32) -> Self {
        if width < CONSTRAINED_VIEWPORT_WIDTH {
            DeviceClass::Constrained
        } else {
            DeviceClass::Capable
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DeviceClass::Constrained => "constrained",
            DeviceClass::Capable     => "capable",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionMetric
// ════════════════════════════════════════════════════════════════════════════

/// Which scalar the detector's counts are reduced to before mapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionMetric {
    /// Fraction of sampled pixels that moved, in `[0, 1]`.
    #[default]
    Ratio,
    /// Moved pixels scaled to full resolution, in `[0, width × height]`.
    ScaledCount,
}

impl MotionMetric {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ratio"                          => Some(MotionMetric::Ratio),
            "count" | "scaled_count" | "scaled-count" => Some(MotionMetric::ScaledCount),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DeviceProfile
// ════════════════════════════════════════════════════════════════════════════

/// Session-wide capture and scoring configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DeviceProfile {
    pub class:            DeviceClass,
    pub capture_width:    usize,
    pub capture_height:   usize,
    /// Step between sampled pixels along both axes (≥ 1).
    pub stride:           usize,
    /// Per-channel change threshold; a pixel moved when the summed RGB
    /// delta exceeds three times this.
    pub change_threshold: u16,
    /// Magnitudes at or below this are silent (in `metric` units).
    pub noise_floor:      f32,
    /// Largest magnitude the metric can produce (in `metric` units).
    pub max_magnitude:    f32,
    pub metric:           MotionMetric,
}

impl DeviceProfile {
    /// The tuned profile for `class`.
    pub fn for_class(class: DeviceClass, metric: MotionMetric) -> Self {
        let (w, h, stride, threshold, floor_fraction) = match class {
            DeviceClass::Constrained => (320, 240, 2, 50, 0.005),
            DeviceClass::Capable     => (640, 480, 1, 30, 0.001),
        };
        Self::with_capture(class, w, h, stride, threshold, floor_fraction, metric)
    }

    /// Convenience: classify a viewport width and return its profile.
    pub fn for_viewport(width: u32, metric: MotionMetric) -> Self {
        Self::for_class(DeviceClass::from_viewport_width(width), metric)
    }

    /// Build a profile with explicit capture parameters.
    ///
    /// `floor_fraction` is the noise floor as a fraction of sampled pixels;
    /// it is converted into `metric` units here.
    pub fn with_capture(
        class:          DeviceClass,
        width:          usize,
        height:         usize,
        stride:         usize,
        threshold:      u16,
        floor_fraction: f32,
        metric:         MotionMetric,
    ) -> Self {
        let max_magnitude = match metric {
            MotionMetric::Ratio       => 1.0,
            MotionMetric::ScaledCount => (width * height) as f32,
        };
        DeviceProfile {
            class,
            capture_width:    width,
            capture_height:   height,
            stride:           stride.max(1),
            change_threshold: threshold,
            noise_floor:      floor_fraction * max_magnitude,
            max_magnitude,
            metric,
        }
    }

    pub fn describe(&self) -> String {
        format!(
            "{} {}x{} stride {} threshold {} floor {:.4} max {:.1}",
            self.class.name(), self.capture_width, self.capture_height,
            self.stride, self.change_threshold, self.noise_floor, self.max_magnitude,
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
