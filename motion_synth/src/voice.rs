//! A single held voice driven by ramped control targets.
//!
//! The voice starts one long note and never releases it while the engine
//! runs; loudness comes entirely from CC 7, so silence is a volume of zero
//! rather than a note-off.  Pitch glides with pitch bend and re-strikes the
//! note only when the target leaves the bend range.

use std::time::Duration;

use motion_core::{BaseParams, ControlParameters, Gain};
use serde::{Deserialize, Serialize};

use crate::midi::{ControlSink, MidiMessage};
use crate::ramp::{Ramp, RampTimes};

pub const CC_DISTORTION: u8 = 12;
pub const CC_RESONANCE:  u8 = 71;
pub const CC_VOLUME:     u8 = 7;
pub const CC_BRIGHTNESS: u8 = 74;
pub const CC_REVERB:     u8 = 91;

/// Pitch-bend range assumed on the receiving synth.
pub const BEND_RANGE_SEMITONES: f32 = 2.0;
/// Gain that maps to full CC 7.
pub const FULL_SCALE_DB: f32 = 6.0;
/// Upper end of the resonance (Q) control.
pub const RESONANCE_MAX: f32 = 20.0;

const NOTE_VELOCITY: u8 = 100;
const BEND_CENTRE:   u16 = 8192;

// ════════════════════════════════════════════════════════════════════════════
// Waveform / VoiceSettings
// ════════════════════════════════════════════════════════════════════════════

/// Oscillator shape, realised as the closest General MIDI program.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Waveform {
    Sine,
    Square,
    #[default]
    Sawtooth,
    Triangle,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine, Waveform::Square, Waveform::Sawtooth, Waveform::Triangle,
    ];

    /// GM program: Ocarina, Lead 1 (square), Lead 2 (sawtooth), Flute.
    pub fn program(self) -> u8 {
        match self {
            Waveform::Sine     => 79,
            Waveform::Square   => 80,
            Waveform::Sawtooth => 81,
            Waveform::Triangle => 73,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Waveform::Sine     => "sine",
            Waveform::Square   => "square",
            Waveform::Sawtooth => "sawtooth",
            Waveform::Triangle => "triangle",
        }
    }

    /// The next shape in [`Waveform::ALL`], wrapping.
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

/// Cosmetic controls forwarded straight to the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    pub waveform:   Waveform,
    /// Filter Q, `0 ..= RESONANCE_MAX`.
    pub resonance:  f32,
    /// `0 ..= 1`.
    pub distortion: f32,
    /// `0 ..= 1`.
    pub reverb_mix: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        VoiceSettings {
            waveform:   Waveform::Sawtooth,
            resonance:  1.0,
            distortion: 0.4,
            reverb_mix: 0.4,
        }
    }
}

impl VoiceSettings {
    /// Clamp every control into its range.
    pub fn clamped(&self) -> Self {
        VoiceSettings {
            waveform:   self.waveform,
            resonance:  self.resonance.clamp(0.0, RESONANCE_MAX),
            distortion: self.distortion.clamp(0.0, 1.0),
            reverb_mix: self.reverb_mix.clamp(0.0, 1.0),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scaling helpers
// ════════════════════════════════════════════════════════════════════════════

/// Linear amplitude for a gain target; silence is zero.
pub fn amplitude(gain: Gain) -> f32 {
    match gain {
        Gain::Silent => 0.0,
        Gain::Db(db) => 10f32.powf(db / 20.0),
    }
}

/// CC 7 value for a linear amplitude.
pub fn volume_cc(amp: f32) -> u8 {
    let full = 10f32.powf(FULL_SCALE_DB / 20.0);
    unit_cc(amp / full)
}

/// CC 74 value for a cutoff, log-scaled over 20 Hz – 20 kHz.
pub fn cutoff_cc(hz: f32) -> u8 {
    if !(hz > 20.0) {
        return 0;
    }
    unit_cc((hz / 20.0).ln() / 1000f32.ln())
}

/// Fractional MIDI note number for a frequency.
pub fn note_number(hz: f32) -> Option<f32> {
    (hz > 0.0).then(|| 69.0 + 12.0 * (hz / 440.0).log2())
}

fn unit_cc(x: f32) -> u8 {
    (x.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// 14-bit bend for an offset of `semitones` from the held note.
fn bend_value(semitones: f32) -> u16 {
    let norm = (semitones / BEND_RANGE_SEMITONES).clamp(-1.0, 1.0);
    (BEND_CENTRE as f32 + norm * 8191.0).round().clamp(0.0, 16383.0) as u16
}

// ════════════════════════════════════════════════════════════════════════════
// Voice
// ════════════════════════════════════════════════════════════════════════════

pub struct Voice {
    sink:      Box<dyn ControlSink>,
    channel:   u8,
    times:     RampTimes,
    amplitude: Ramp,
    cutoff:    Ramp,
    pitch:     Ramp,
    settings:  Option<VoiceSettings>,
    note:      Option<u8>,
    sent_volume:     Option<u8>,
    sent_brightness: Option<u8>,
    sent_bend:       Option<u16>,
}

impl Voice {
    /// A silent voice resting at the default bases.
    pub fn new(sink: Box<dyn ControlSink>, channel: u8, times: RampTimes) -> Self {
        let rest = ControlParameters::silent(&BaseParams::default());
        Voice {
            sink,
            channel:   channel & 0x0F,
            times,
            amplitude: Ramp::new(0.0),
            cutoff:    Ramp::new(rest.cutoff_hz),
            pitch:     Ramp::new(rest.pitch_hz),
            settings:  None,
            note:      None,
            sent_volume:     None,
            sent_brightness: None,
            sent_bend:       None,
        }
    }

    /// Apply `settings`, then strike the held note at zero volume.
    pub fn start(&mut self, settings: &VoiceSettings) {
        self.configure(settings);
        self.send_volume(0);
        self.send_brightness(cutoff_cc(self.cutoff.value()));
        self.strike(self.pitch.value());
    }

    /// Send only the settings that differ from the last ones applied.
    pub fn configure(&mut self, settings: &VoiceSettings) {
        let new = settings.clamped();
        let old = self.settings.take();
        let changed = |f: fn(&VoiceSettings) -> u8| old.as_ref().map(f) != Some(f(&new));

        if changed(|s| s.waveform.program()) {
            self.send(MidiMessage::ProgramChange { channel: self.channel, program: new.waveform.program() });
        }
        if changed(|s| unit_cc(s.resonance / RESONANCE_MAX)) {
            self.send_cc(CC_RESONANCE, unit_cc(new.resonance / RESONANCE_MAX));
        }
        if changed(|s| unit_cc(s.distortion)) {
            self.send_cc(CC_DISTORTION, unit_cc(new.distortion));
        }
        if changed(|s| unit_cc(s.reverb_mix)) {
            self.send_cc(CC_REVERB, unit_cc(new.reverb_mix));
        }
        self.settings = Some(new);
    }

    /// Retarget the ramps.  Silence only moves the gain; filter and pitch
    /// hold where they are so the release tail keeps its colour.
    pub fn set_target(&mut self, params: &ControlParameters) {
        let target = amplitude(params.gain);
        let time = if params.is_silent() || target < self.amplitude.value() {
            self.times.release_ms
        } else {
            self.times.attack_ms
        };
        self.amplitude.retarget(target, Duration::from_millis(time));

        if !params.is_silent() {
            self.cutoff.retarget(params.cutoff_hz, Duration::from_millis(self.times.cutoff_ms));
            self.pitch.retarget(params.pitch_hz, Duration::from_millis(self.times.pitch_ms));
        }
    }

    /// Move every ramp forward by `dt` and send whatever changed.
    pub fn advance(&mut self, dt: Duration) {
        let amp   = self.amplitude.advance(dt);
        let hz    = self.cutoff.advance(dt);
        let pitch = self.pitch.advance(dt);

        self.send_volume(volume_cc(amp));
        self.send_brightness(cutoff_cc(hz));
        self.glide(pitch);
    }

    /// Release the held note and zero the volume.
    pub fn stop(&mut self) {
        if let Some(note) = self.note.take() {
            self.send(MidiMessage::NoteOff { channel: self.channel, note });
        }
        self.send_volume(0);
    }

    pub fn is_settled(&self) -> bool {
        self.amplitude.is_settled() && self.cutoff.is_settled() && self.pitch.is_settled()
    }

    pub fn held_note(&self) -> Option<u8> { self.note }

    // ── internals ────────────────────────────────────────────────────────

    fn glide(&mut self, hz: f32) {
        let Some(semis) = note_number(hz) else { return };
        match self.note {
            Some(note) if (semis - note as f32).abs() <= BEND_RANGE_SEMITONES => {
                self.send_bend(bend_value(semis - note as f32));
            }
            Some(_) => self.strike(hz),
            None    => {}
        }
    }

    /// (Re)strike the held note nearest `hz`, bent onto it exactly.
    fn strike(&mut self, hz: f32) {
        let Some(semis) = note_number(hz) else { return };
        let note = semis.round().clamp(0.0, 127.0) as u8;
        if let Some(old) = self.note.take() {
            self.send(MidiMessage::NoteOff { channel: self.channel, note: old });
        }
        self.send_bend(bend_value(semis - note as f32));
        self.send(MidiMessage::NoteOn { channel: self.channel, note, velocity: NOTE_VELOCITY });
        self.note = Some(note);
    }

    fn send_volume(&mut self, value: u8) {
        if self.sent_volume != Some(value) {
            self.sent_volume = Some(value);
            self.send_cc(CC_VOLUME, value);
        }
    }

    fn send_brightness(&mut self, value: u8) {
        if self.sent_brightness != Some(value) {
            self.sent_brightness = Some(value);
            self.send_cc(CC_BRIGHTNESS, value);
        }
    }

    fn send_bend(&mut self, value: u16) {
        if self.sent_bend != Some(value) {
            self.sent_bend = Some(value);
            self.send(MidiMessage::PitchBend { channel: self.channel, value });
        }
    }

    fn send_cc(&mut self, controller: u8, value: u8) {
        self.send(MidiMessage::ControlChange { channel: self.channel, controller, value });
    }

    fn send(&mut self, msg: MidiMessage) {
        self.sink.send(msg);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
