//! Frame-differencing motion detector.
//!
//! Each tick compares the current RGBA frame with the one retained from the
//! previous tick at every `stride`-th pixel along both axes.  A pixel has
//! *moved* when the Manhattan distance of its RGB channels exceeds
//! `3 × change_threshold`.  Moved pixels are painted in a highlight colour
//! on the feedback image; every other sampled pixel is painted as a dimmed
//! copy of the live frame.
//!
//! ## Tick outcomes
//!
//! | Situation | Outcome | Feedback |
//! |---|---|---|
//! | frame empty / zero-sized | [`TickOutcome::NotReady`] | withdrawn |
//! | first frame, or size changed | [`TickOutcome::Primed`] | dimmed frame |
//! | otherwise | [`TickOutcome::Scored`] | highlight + dimmed |
//!
//! Priming never scores: there is nothing valid to compare against, and
//! comparing a fresh frame with a zeroed or stale buffer would read as a
//! full-frame motion spike.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CoreError, Result};
use crate::frame::{FrameBuffer, CHANNELS};
use crate::profile::{DeviceProfile, MotionMetric};

/// Colour painted over moved pixels.
pub const HIGHLIGHT: [u8; 4] = [0, 255, 100, 255];
/// Brightness kept for unmoved pixels on the feedback image.
pub const DIM_FACTOR: f32 = 0.2;

const OPAQUE_BLACK: [u8; 4] = [0, 0, 0, 255];

// ════════════════════════════════════════════════════════════════════════════
// Policies
// ════════════════════════════════════════════════════════════════════════════

/// What the next tick is compared against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareBasis {
    /// The raw camera frame: strict frame-to-frame differencing.
    #[default]
    RawFrame,
    /// The annotated feedback image: highlights linger as a trail because
    /// the next frame is compared against green / dimmed pixels.
    AnnotatedFrame,
}

impl CompareBasis {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" | "raw_frame"             => Some(CompareBasis::RawFrame),
            "annotated" | "annotated_frame" | "trail" => Some(CompareBasis::AnnotatedFrame),
            _ => None,
        }
    }
}

/// How pixels skipped by a stride > 1 are treated when a sample moves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GapFill {
    /// Only the sampled pixel is painted.
    Off,
    /// The whole stride×stride block is painted; counts are per sample.
    #[default]
    FeedbackOnly,
    /// The block is painted and each of its pixels is counted, in both the
    /// moved and the sampled totals.
    Counted,
}

impl GapFill {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none"                   => Some(GapFill::Off),
            "feedback" | "feedback_only"     => Some(GapFill::FeedbackOnly),
            "counted" | "count"              => Some(GapFill::Counted),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DetectorConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct DetectorConfig {
    pub stride:           usize,
    pub change_threshold: u16,
    pub compare:          CompareBasis,
    pub gap_fill:         GapFill,
    pub highlight:        [u8; 4],
    pub dim_factor:       f32,
}

impl DetectorConfig {
    /// Stride and threshold from the session profile, default policies.
    pub fn from_profile(profile: &DeviceProfile) -> Self {
        DetectorConfig {
            stride:           profile.stride,
            change_threshold: profile.change_threshold,
            compare:          CompareBasis::default(),
            gap_fill:         GapFill::default(),
            highlight:        HIGHLIGHT,
            dim_factor:       DIM_FACTOR,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.stride == 0 {
            return Err(CoreError::ZeroStride);
        }
        Ok(())
    }

    /// Sum-of-channels distance above which a pixel counts as moved.
    fn moved_above(&self) -> u32 {
        self.change_threshold as u32 * 3
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionSample / TickOutcome
// ════════════════════════════════════════════════════════════════════════════

/// Raw counts from one scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MotionSample {
    /// Moved pixels (per sample, or per represented pixel under [`GapFill::Counted`]).
    pub moved:   usize,
    /// Pixels examined, in the same units as `moved`.
    pub sampled: usize,
    /// Full-resolution pixels each unit of `moved` stands for.
    pub weight:  usize,
}

impl MotionSample {
    pub const ZERO: MotionSample = MotionSample { moved: 0, sampled: 0, weight: 1 };

    /// Fraction of examined pixels that moved, in `[0, 1]`.
    pub fn ratio(&self) -> f32 {
        if self.sampled == 0 {
            return 0.0;
        }
        (self.moved as f32 / self.sampled as f32).min(1.0)
    }

    /// Moved pixels scaled up to the full-resolution frame.
    pub fn scaled_count(&self) -> f32 {
        (self.moved * self.weight) as f32
    }

    pub fn magnitude(&self, metric: MotionMetric) -> f32 {
        match metric {
            MotionMetric::Ratio       => self.ratio(),
            MotionMetric::ScaledCount => self.scaled_count(),
        }
    }
}

/// Result of one [`MotionDetector::process`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The source had no frame yet; nothing was scored or painted.
    NotReady,
    /// The retained frame was (re)initialised; feedback holds the dimmed frame.
    Primed,
    /// The frame was compared against the retained one.
    Scored(MotionSample),
}

impl TickOutcome {
    /// The sample for this tick; zero unless the frame was scored.
    pub fn sample(&self) -> MotionSample {
        match self {
            TickOutcome::Scored(s) => *s,
            _ => MotionSample::ZERO,
        }
    }

    pub fn has_feedback(&self) -> bool {
        !matches!(self, TickOutcome::NotReady)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MotionDetector
// ════════════════════════════════════════════════════════════════════════════

/// Owns the retained previous frame and the feedback image.
#[derive(Debug)]
pub struct MotionDetector {
    config:         DetectorConfig,
    previous:       Option<FrameBuffer>,
    feedback:       FrameBuffer,
    feedback_ready: bool,
}

impl MotionDetector {
    pub fn new(config: DetectorConfig) -> Self {
        MotionDetector {
            config,
            previous:       None,
            feedback:       FrameBuffer::default(),
            feedback_ready: false,
        }
    }

    pub fn config(&self) -> &DetectorConfig { &self.config }

    /// Score `frame` against the retained frame and repaint the feedback image.
    pub fn process(&mut self, frame: &FrameBuffer) -> TickOutcome {
        if frame.is_empty() {
            self.feedback_ready = false;
            return TickOutcome::NotReady;
        }

        let previous = match self.previous.as_mut() {
            Some(prev) if prev.same_shape(frame) => prev,
            Some(prev) => {
                info!(
                    "frame size changed {}x{} ({} bytes) -> {}x{} ({} bytes); re-priming",
                    prev.width, prev.height, prev.len(),
                    frame.width, frame.height, frame.len(),
                );
                self.prime(frame);
                return TickOutcome::Primed;
            }
            None => {
                debug!("first frame {}x{}; priming", frame.width, frame.height);
                self.prime(frame);
                return TickOutcome::Primed;
            }
        };

        let sample = scan(&self.config, frame, previous, &mut self.feedback);

        match self.config.compare {
            CompareBasis::RawFrame       => previous.copy_from(frame),
            CompareBasis::AnnotatedFrame => previous.copy_from(&self.feedback),
        }
        self.feedback_ready = true;
        TickOutcome::Scored(sample)
    }

    /// The feedback image from the last tick, unless that tick was not ready.
    pub fn feedback(&self) -> Option<&FrameBuffer> {
        self.feedback_ready.then_some(&self.feedback)
    }

    /// Byte length of the retained frame, if one is held.
    pub fn retained_len(&self) -> Option<usize> {
        self.previous.as_ref().map(FrameBuffer::len)
    }

    /// Drop the retained frame; the next frame primes again.
    pub fn reset(&mut self) {
        self.previous = None;
        self.feedback_ready = false;
    }

    fn prime(&mut self, frame: &FrameBuffer) {
        match self.previous.as_mut() {
            Some(prev) => prev.copy_from(frame),
            None       => self.previous = Some(frame.clone()),
        }
        paint_dimmed(&self.config, frame, &mut self.feedback);
        self.feedback_ready = true;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scan
// ════════════════════════════════════════════════════════════════════════════

/// Offsets of the sampled pixels, in raster order.
fn sampled_offsets(width: usize, height: usize, stride: usize) -> impl Iterator<Item = (usize, usize)> {
    (0..height).step_by(stride).flat_map(move |y| {
        (0..width).step_by(stride).map(move |x| (x, y))
    })
}

fn scan(
    config:   &DetectorConfig,
    current:  &FrameBuffer,
    previous: &FrameBuffer,
    feedback: &mut FrameBuffer,
) -> MotionSample {
    let (w, h)  = (current.width, current.height);
    let stride  = config.stride.max(1);
    let limit   = config.moved_above();
    let counted = config.gap_fill == GapFill::Counted && stride > 1;
    let fill    = config.gap_fill != GapFill::Off && stride > 1;

    feedback.reset(w, h, OPAQUE_BLACK);

    let cur  = current.as_bytes();
    let prev = previous.as_bytes();
    let out  = feedback.as_bytes_mut();

    let mut sample = MotionSample {
        moved:   0,
        sampled: 0,
        weight:  if counted { 1 } else { stride * stride },
    };

    for (x, y) in sampled_offsets(w, h, stride) {
        let i = (y * w + x) * CHANNELS;
        let end = i + CHANNELS;
        if end > cur.len() || end > prev.len() || end > out.len() {
            continue;
        }

        let diff = (cur[i]     as i32 - prev[i]     as i32).unsigned_abs()
                 + (cur[i + 1] as i32 - prev[i + 1] as i32).unsigned_abs()
                 + (cur[i + 2] as i32 - prev[i + 2] as i32).unsigned_abs();

        let units = if counted { block_len(x, y, w, h, stride) } else { 1 };
        sample.sampled += units;

        if diff > limit {
            sample.moved += units;
            if fill {
                paint_block(out, x, y, w, h, stride, config.highlight);
            } else {
                out[i..end].copy_from_slice(&config.highlight);
            }
        } else {
            out[i..end].copy_from_slice(&dim(&cur[i..end], config.dim_factor));
        }
    }

    sample
}

/// Paint every sampled pixel of `frame` dimmed, nothing highlighted.
fn paint_dimmed(config: &DetectorConfig, frame: &FrameBuffer, feedback: &mut FrameBuffer) {
    let (w, h) = (frame.width, frame.height);
    feedback.reset(w, h, OPAQUE_BLACK);
    let cur = frame.as_bytes();
    let out = feedback.as_bytes_mut();
    for (x, y) in sampled_offsets(w, h, config.stride.max(1)) {
        let i = (y * w + x) * CHANNELS;
        let end = i + CHANNELS;
        if end > cur.len() || end > out.len() {
            continue;
        }
        out[i..end].copy_from_slice(&dim(&cur[i..end], config.dim_factor));
    }
}

fn dim(px: &[u8], factor: f32) -> [u8; 4] {
    let scale = |c: u8| (c as f32 * factor).round().clamp(0.0, 255.0) as u8;
    [scale(px[0]), scale(px[1]), scale(px[2]), 255]
}

/// Number of frame pixels in the stride block anchored at `(x, y)`.
fn block_len(x: usize, y: usize, w: usize, h: usize, stride: usize) -> usize {
    stride.min(w - x) * stride.min(h - y)
}

fn paint_block(out: &mut [u8], x: usize, y: usize, w: usize, h: usize, stride: usize, rgba: [u8; 4]) {
    for by in y..(y + stride).min(h) {
        for bx in x..(x + stride).min(w) {
            let i = (by * w + bx) * CHANNELS;
            if let Some(px) = out.get_mut(i..i + CHANNELS) {
                px.copy_from_slice(&rgba);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
