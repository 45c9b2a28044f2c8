//! # motion_synth
//!
//! The audio side of the motion theremin.  Control targets produced by
//! [`motion_core::SignalMapper`] are handed to an [`AudioEngine`]; the
//! MIDI-backed [`MidiEngine`] ramps toward them on its own thread and sends
//! the result to the first usable MIDI output port.
//!
//! | Control | MIDI |
//! |---|---|
//! | gain | CC 7 (channel volume), linear amplitude, 0 = silent |
//! | cutoff | CC 74 (brightness), log-scaled 20 Hz – 20 kHz |
//! | pitch | held note + 14-bit pitch bend (±2 semitones) |
//! | waveform | program change (GM synth leads) |
//! | resonance | CC 71 |
//! | distortion | CC 12 |
//! | reverb mix | CC 91 |
//!
//! The core only ever emits targets; every intermediate step of a ramp is
//! produced here.

pub mod error;
pub mod ramp;
pub mod midi;
pub mod voice;
pub mod engine;

pub use error::{Result, SynthError};
pub use ramp::{Ramp, RampTimes};
pub use midi::{open_midi_output, try_open_midi_output, ControlSink, MidiMessage, NullSink};
pub use voice::{Voice, VoiceSettings, Waveform};
pub use engine::{AudioEngine, MidiEngine};
