//! What the driver shows each tick, and the player's live controls.

use motion_core::{BaseParams, ControlParameters, DeviceProfile, FrameBuffer};
use motion_synth::VoiceSettings;

use crate::error::Result;

/// Motion ratio at which the on-screen meter reads 100 %.
pub const METER_FULL_RATIO: f32 = 0.1;

/// Meter reading for a moved/sampled ratio, `0 ..= 100`.
pub fn meter_percent(ratio: f32) -> f32 {
    if !(ratio > 0.0) {
        return 0.0;
    }
    (ratio / METER_FULL_RATIO * 100.0).min(100.0)
}

/// Everything drawn on top of the feedback image.
#[derive(Clone, Debug)]
pub struct Overlay<'a> {
    pub motion_percent: f32,
    /// Targets sent this tick; `None` when the tick was not scored.
    pub params:         Option<ControlParameters>,
    pub base:           BaseParams,
    pub voice:          &'a VoiceSettings,
    pub profile:        &'a DeviceProfile,
    pub status:         &'a str,
    /// False until the player unlocks audio.
    pub audio_started:  bool,
}

/// Where the feedback buffer and overlay end up.
pub trait RenderSurface {
    /// Show one tick.  `feedback` is `None` while the source is not ready.
    fn present(&mut self, feedback: Option<&FrameBuffer>, overlay: &Overlay<'_>) -> Result<()>;
}

/// Player input, independent of how it was read.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ControlEvent {
    /// Start audio.
    Unlock,
    /// Move the base pitch by this many semitones.
    Transpose(f32),
    /// Scale the base cutoff by this factor.
    Brighten(f32),
    CycleWaveform,
    Resonance(f32),
    Distortion(f32),
    ReverbMix(f32),
    Quit,
}

/// A surface that draws nothing, for headless runs and tests.
#[derive(Default)]
pub struct NullSurface {
    pub presented: usize,
}

impl RenderSurface for NullSurface {
    fn present(&mut self, _feedback: Option<&FrameBuffer>, _overlay: &Overlay<'_>) -> Result<()> {
        self.presented += 1;
        Ok(())
    }
}
