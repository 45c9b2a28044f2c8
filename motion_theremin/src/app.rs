//! Top-level session state and the window loop.
//!
//! `Session` owns the device profile, the detector with its retained frame,
//! the mapper and the live player settings.  The audio engine is attached
//! only after the player unlocks audio; until then every tick still runs
//! detection and mapping and the control targets are simply not sent.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use motion_core::{
    BaseParams, ControlParameters, DeviceProfile, FrameBuffer, MotionDetector, SignalMapper,
    TickOutcome,
};
use motion_synth::voice::RESONANCE_MAX;
use motion_synth::{open_midi_output, AudioEngine, MidiEngine, SynthError, VoiceSettings};
use tracing::{debug, error, info, warn};

use crate::config::{AppConfig, SourceKind};
use crate::error::{AppError, ConfigError, Result};
use crate::source::{FrameSource, SequenceFrameSource, SimFrameSource};
use crate::surface::{meter_percent, ControlEvent, Overlay, RenderSurface};
use crate::visualizer::Visualizer;

const MIN_PITCH_HZ:  f32 = 20.0;
const MAX_PITCH_HZ:  f32 = 2_000.0;
const MIN_CUTOFF_HZ: f32 = 20.0;
const MAX_CUTOFF_HZ: f32 = 20_000.0;

// ════════════════════════════════════════════════════════════════════════════
// TickReport
// ════════════════════════════════════════════════════════════════════════════

/// What one call to [`Session::tick`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum TickReport {
    /// The source had no usable frame; nothing was scored or sent.
    NotReady,
    /// The detector ran and the mapper produced targets.
    Ran {
        outcome:   TickOutcome,
        magnitude: f32,
        params:    ControlParameters,
    },
    /// The tick was abandoned after an error or panic.
    Faulted(String),
}

impl TickReport {
    pub fn params(&self) -> Option<&ControlParameters> {
        match self {
            TickReport::Ran { params, .. } => Some(params),
            _ => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

pub struct Session {
    profile:  DeviceProfile,
    detector: MotionDetector,
    mapper:   SignalMapper,
    base:     BaseParams,
    voice:    VoiceSettings,
    engine:   Option<Box<dyn AudioEngine>>,
    status:   String,
    faults:   u64,
}

impl Session {
    /// Derive the profile once and build the pipeline.  The profile cannot
    /// change for the life of the session.
    pub fn new(cfg: &AppConfig) -> Result<Self> {
        cfg.validate()?;
        let profile = cfg.profile();
        let detector = MotionDetector::new(cfg.detector_config(&profile));
        info!("session profile: {}", profile.describe());
        Ok(Session {
            status: format!("Ready: {}", profile.describe()),
            profile,
            detector,
            mapper:  SignalMapper::new(cfg.curve.clone()),
            base:    cfg.base,
            voice:   cfg.voice.clamped(),
            engine:  None,
            faults:  0,
        })
    }

    pub fn profile(&self) -> &DeviceProfile { &self.profile }
    pub fn base_params(&self) -> &BaseParams { &self.base }
    /// Read on every tick, so edits take effect on the next one.
    pub fn base_params_mut(&mut self) -> &mut BaseParams { &mut self.base }
    pub fn voice_settings(&self) -> &VoiceSettings { &self.voice }
    pub fn status(&self) -> &str { &self.status }
    pub fn has_engine(&self) -> bool { self.engine.is_some() }
    /// Ticks abandoned so far.
    pub fn faults(&self) -> u64 { self.faults }

    /// Start sending targets to `engine`, replacing any previous one.
    pub fn attach_engine(&mut self, mut engine: Box<dyn AudioEngine>) {
        if let Err(e) = engine.configure(&self.voice) {
            warn!("audio engine rejected voice settings: {}", e);
        }
        if let Some(mut old) = self.engine.replace(engine) {
            old.shutdown();
        }
        self.status = "Audio started".to_string();
        info!("audio engine attached");
    }

    /// Silence and drop the engine, if any.
    pub fn detach_engine(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.shutdown();
            info!("audio engine detached");
        }
    }

    /// Replace the cosmetic voice controls and forward them to the engine.
    pub fn set_voice_settings(&mut self, settings: VoiceSettings) -> Result<()> {
        self.voice = settings.clamped();
        if let Some(engine) = self.engine.as_mut() {
            engine.configure(&self.voice)?;
        }
        Ok(())
    }

    // ── player controls ───────────────────────────────────────────────────

    /// Apply one control event.  `Unlock` and `Quit` belong to the caller.
    pub fn handle_control(&mut self, event: ControlEvent) {
        let mut voice = self.voice.clone();
        match event {
            ControlEvent::Transpose(semis) => {
                let hz = self.base.base_pitch_hz * 2f32.powf(semis / 12.0);
                self.base.base_pitch_hz = hz.clamp(MIN_PITCH_HZ, MAX_PITCH_HZ);
                self.status = format!("Base pitch {:.1} Hz", self.base.base_pitch_hz);
                return;
            }
            ControlEvent::Brighten(factor) => {
                let hz = self.base.base_cutoff_hz.max(MIN_CUTOFF_HZ) * factor;
                self.base.base_cutoff_hz = hz.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_HZ);
                self.status = format!("Base cutoff {:.0} Hz", self.base.base_cutoff_hz);
                return;
            }
            ControlEvent::CycleWaveform => voice.waveform = voice.waveform.next(),
            ControlEvent::Resonance(d)  => voice.resonance = (voice.resonance + d).clamp(0.0, RESONANCE_MAX),
            ControlEvent::Distortion(d) => voice.distortion = (voice.distortion + d).clamp(0.0, 1.0),
            ControlEvent::ReverbMix(d)  => voice.reverb_mix = (voice.reverb_mix + d).clamp(0.0, 1.0),
            ControlEvent::Unlock | ControlEvent::Quit => return,
        }
        self.status = format!(
            "{}  res {:.1}  dist {:.2}  reverb {:.2}",
            voice.waveform.name(), voice.resonance, voice.distortion, voice.reverb_mix
        );
        if let Err(e) = self.set_voice_settings(voice) {
            warn!("voice settings not applied: {}", e);
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    /// Run one tick: poll `source`, score, map, send, present.
    ///
    /// Any error or panic inside the tick is logged and the tick abandoned;
    /// the session stays usable for the next one.
    pub fn tick(&mut self, source: &mut dyn FrameSource, surface: &mut dyn RenderSurface) -> TickReport {
        match panic::catch_unwind(AssertUnwindSafe(|| self.run_tick(source, surface))) {
            Ok(Ok(report)) => report,
            Ok(Err(e)) => {
                self.faults += 1;
                error!("tick abandoned: {}", e);
                if matches!(e, AppError::Synth(SynthError::EngineStopped)) {
                    self.engine = None;
                    self.status = "Audio engine stopped; press Space to restart".to_string();
                }
                TickReport::Faulted(e.to_string())
            }
            Err(payload) => {
                self.faults += 1;
                let msg = panic_message(payload.as_ref());
                error!("tick panicked: {}", msg);
                TickReport::Faulted(msg)
            }
        }
    }

    fn run_tick(&mut self, source: &mut dyn FrameSource, surface: &mut dyn RenderSurface) -> Result<TickReport> {
        source.poll()?;

        let empty = FrameBuffer::default();
        let frame = source.current_frame().unwrap_or(&empty);
        let outcome = self.detector.process(frame);

        if outcome == TickOutcome::NotReady {
            surface.present(None, &self.overlay(0.0, None))?;
            return Ok(TickReport::NotReady);
        }

        let sample = outcome.sample();
        let magnitude = sample.magnitude(self.profile.metric);
        let params = self.mapper.map(magnitude, &self.profile, &self.base);
        debug!(moved = sample.moved, sampled = sample.sampled, magnitude, gain = ?params.gain, "tick");

        if let Some(engine) = self.engine.as_mut() {
            engine.apply(&params)?;
        }

        let overlay = self.overlay(meter_percent(sample.ratio()), Some(params));
        surface.present(self.detector.feedback(), &overlay)?;

        Ok(TickReport::Ran { outcome, magnitude, params })
    }

    fn overlay(&self, motion_percent: f32, params: Option<ControlParameters>) -> Overlay<'_> {
        Overlay {
            motion_percent,
            params,
            base:          self.base,
            voice:         &self.voice,
            profile:       &self.profile,
            status:        &self.status,
            audio_started: self.engine.is_some(),
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.detach_engine();
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Build the frame source named by `cfg.source` at the profile's capture size.
pub fn open_source(cfg: &AppConfig, profile: &DeviceProfile) -> Result<Box<dyn FrameSource>> {
    let (w, h) = (profile.capture_width, profile.capture_height);
    Ok(match cfg.source.kind {
        SourceKind::Simulated => Box::new(SimFrameSource::new(w, h, cfg.source.noise, cfg.source.seed)),
        SourceKind::Sequence => {
            let dir = cfg.source.path.as_deref()
                .ok_or_else(|| ConfigError::Invalid("sequence source needs a path".to_string()))?;
            Box::new(SequenceFrameSource::open(dir, w, h, cfg.source.fps)?)
        }
    })
}

/// Run the full application.
///
/// Opens the window and the frame source, then ticks the session once per
/// frame (~60 fps) until the window closes or the player quits.
pub fn run(cfg: AppConfig) -> Result<()> {
    let mut session = Session::new(&cfg)?;
    let mut source = open_source(&cfg, session.profile())?;
    let mut vis = Visualizer::new()?;

    while vis.is_open() {
        // 1. Player input
        for event in vis.poll_input() {
            match event {
                ControlEvent::Quit => {
                    info!("quit requested");
                    return Ok(());
                }
                ControlEvent::Unlock if !session.has_engine() => {
                    let sink = open_midi_output(cfg.midi.port.as_deref());
                    let engine = MidiEngine::spawn(sink, cfg.midi.channel, cfg.ramps.clone(), session.voice_settings().clone());
                    session.attach_engine(Box::new(engine));
                }
                other => session.handle_control(other),
            }
        }
        source.steer(vis.pointer());

        // 2. Detection, mapping, audio and render
        session.tick(source.as_mut(), &mut vis);
    }

    info!("window closed after {} abandoned ticks", session.faults());
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
