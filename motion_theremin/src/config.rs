//! Session configuration, read from a TOML file.
//!
//! Every field has a default, so an empty file (or no file) gives the tuned
//! instrument.  A minimal override looks like:
//!
//! ```toml
//! viewport_width = 640
//! compare = "annotated_frame"
//!
//! [curve]
//! gain_saturation = 0.2
//!
//! [source]
//! kind = "sequence"
//! path = "captures/wave"
//! fps  = 15.0
//! ```

use std::path::{Path, PathBuf};

use motion_core::{
    BaseParams, CompareBasis, DetectorConfig, DeviceProfile, GapFill, MappingCurve, MotionMetric,
};
use motion_synth::{RampTimes, VoiceSettings};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;

/// Where frames come from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Synthetic camera steered by the mouse.
    #[default]
    Simulated,
    /// A directory of still images.
    Sequence,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub kind:  SourceKind,
    /// Image directory for [`SourceKind::Sequence`].
    pub path:  Option<PathBuf>,
    /// Playback rate for sequences.
    pub fps:   f32,
    /// Per-pixel sensor noise amplitude of the simulated camera.
    pub noise: u8,
    /// Fixed RNG seed for the simulated camera.
    pub seed:  Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig { kind: SourceKind::Simulated, path: None, fps: 15.0, noise: 6, seed: None }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MidiConfig {
    /// Substring of the output port name to prefer.
    pub port:    Option<String>,
    pub channel: u8,
}

impl Default for MidiConfig {
    fn default() -> Self {
        MidiConfig { port: None, channel: 0 }
    }
}

/// Configuration for the full application.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Coarse capability signal; below 800 selects the constrained profile.
    pub viewport_width: u32,
    pub metric:         MotionMetric,
    pub compare:        CompareBasis,
    pub gap_fill:       GapFill,
    pub curve:          MappingCurve,
    pub base:           BaseParams,
    pub voice:          VoiceSettings,
    pub ramps:          RampTimes,
    pub source:         SourceConfig,
    pub midi:           MidiConfig,
    /// `tracing` level name; `RUST_LOG` overrides it.
    pub log_level:      String,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            viewport_width: 1280,
            metric:         MotionMetric::Ratio,
            compare:        CompareBasis::RawFrame,
            gap_fill:       GapFill::FeedbackOnly,
            curve:          MappingCurve::default(),
            base:           BaseParams::default(),
            voice:          VoiceSettings::default(),
            ramps:          RampTimes::default(),
            source:         SourceConfig::default(),
            midi:           MidiConfig::default(),
            log_level:      "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Read and validate a config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let cfg: AppConfig = toml::from_str(&text)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        cfg.validate()?;
        info!("loaded config from {}", path.display());
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// The session's device profile.
    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile::for_viewport(self.viewport_width, self.metric)
    }

    /// Detector settings for `profile` with this config's policies applied.
    pub fn detector_config(&self, profile: &DeviceProfile) -> DetectorConfig {
        let mut cfg = DetectorConfig::from_profile(profile);
        cfg.compare = self.compare;
        cfg.gap_fill = self.gap_fill;
        cfg
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let profile = self.profile();
        self.curve.validate(&profile)?;
        self.detector_config(&profile).validate()?;

        if !(self.base.base_cutoff_hz >= 0.0) || !(self.base.base_pitch_hz > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "base cutoff must be >= 0 and base pitch > 0 (got {} Hz, {} Hz)",
                self.base.base_cutoff_hz, self.base.base_pitch_hz
            )));
        }
        if self.midi.channel > 15 {
            return Err(ConfigError::Invalid(format!("MIDI channel {} is not 0-15", self.midi.channel)));
        }
        if self.source.kind == SourceKind::Sequence {
            if self.source.path.is_none() {
                return Err(ConfigError::Invalid("sequence source needs a path".to_string()));
            }
            if !(self.source.fps > 0.0) {
                return Err(ConfigError::Invalid(format!("sequence fps {} must be positive", self.source.fps)));
            }
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
