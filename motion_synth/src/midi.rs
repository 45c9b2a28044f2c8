//! MIDI output: a midir port or a null sink for headless runs.

use tracing::{info, warn};

use crate::error::{Result, SynthError};

/// Channel-voice messages the voice emits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MidiMessage {
    ProgramChange { channel: u8, program: u8 },
    NoteOn        { channel: u8, note: u8, velocity: u8 },
    NoteOff       { channel: u8, note: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    /// 14-bit bend, 8192 = centre.
    PitchBend     { channel: u8, value: u16 },
}

impl MidiMessage {
    /// Wire bytes for this message.
    pub fn to_bytes(self) -> Vec<u8> {
        match self {
            MidiMessage::ProgramChange { channel, program } =>
                vec![0xC0 | (channel & 0x0F), program & 0x7F],
            MidiMessage::NoteOn { channel, note, velocity } =>
                vec![0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F],
            MidiMessage::NoteOff { channel, note } =>
                vec![0x80 | (channel & 0x0F), note & 0x7F, 0],
            MidiMessage::ControlChange { channel, controller, value } =>
                vec![0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F],
            MidiMessage::PitchBend { channel, value } => {
                let v = value.min(0x3FFF);
                vec![0xE0 | (channel & 0x0F), (v & 0x7F) as u8, (v >> 7) as u8]
            }
        }
    }
}

/// Destination for MIDI messages.
pub trait ControlSink: Send {
    fn send(&mut self, msg: MidiMessage);
}

// ── midir backend ─────────────────────────────────────────────────────────

struct MidirSink {
    conn: midir::MidiOutputConnection,
}

impl ControlSink for MidirSink {
    fn send(&mut self, msg: MidiMessage) {
        if let Err(e) = self.conn.send(&msg.to_bytes()) {
            warn!("MIDI send failed: {}", e);
        }
    }
}

// ── null backend (used when no MIDI port is available) ────────────────────

/// Discards everything.
pub struct NullSink;

impl ControlSink for NullSink {
    fn send(&mut self, _msg: MidiMessage) {}
}

// ════════════════════════════════════════════════════════════════════════════
// Port selection
// ════════════════════════════════════════════════════════════════════════════

/// Open a MIDI output port, falling back to [`NullSink`] with a warning when
/// nothing can be opened.
pub fn open_midi_output(hint: Option<&str>) -> Box<dyn ControlSink> {
    match try_open_midi_output(hint) {
        Ok(sink) => sink,
        Err(e) => {
            warn!("{}; using null output", e);
            Box::new(NullSink)
        }
    }
}

/// Open a MIDI output port.
///
/// A port whose name contains `hint` (case-insensitive) wins; otherwise a
/// visible soft synth is preferred, then the first port.
pub fn try_open_midi_output(hint: Option<&str>) -> Result<Box<dyn ControlSink>> {
    let midi_out = midir::MidiOutput::new("motion_theremin")
        .map_err(|e| SynthError::MidiInit(e.to_string()))?;

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("install a MIDI synthesiser such as `fluidsynth` or `timidity -iA` (Linux); \
               macOS and Windows ship one");
        return Err(SynthError::MidiInit("no MIDI output ports found".to_string()));
    }

    let names: Vec<String> = ports.iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    let port_idx = pick_port(&names, hint);
    let port = &ports[port_idx];
    info!("opening MIDI port: {}", names[port_idx]);

    let conn = midi_out.connect(port, "motion-theremin")
        .map_err(|e| SynthError::MidiConnect { port: names[port_idx].clone(), reason: e.to_string() })?;
    Ok(Box::new(MidirSink { conn }))
}

/// Index of the port to open among `names` (non-empty).
fn pick_port(names: &[String], hint: Option<&str>) -> usize {
    if let Some(hint) = hint.map(str::to_lowercase).filter(|h| !h.is_empty()) {
        if let Some(i) = names.iter().position(|n| n.to_lowercase().contains(&hint)) {
            return i;
        }
        warn!("no MIDI port matches {:?}", hint);
    }
    names.iter()
        .position(|n| {
            let n = n.to_lowercase();
            n.contains("fluid") || n.contains("timidity") ||
            n.contains("microsoft") || n.contains("gm") ||
            n.contains("synth")
        })
        .unwrap_or(0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn names(v: &[&str]) -> Vec<String> { v.iter().map(|s| s.to_string()).collect() }

    #[test]
    fn control_change_bytes() {
        let m = MidiMessage::ControlChange { channel: 2, controller: 74, value: 64 };
        assert_eq!(m.to_bytes(), vec![0xB2, 74, 64]);
    }

    #[test]
    fn pitch_bend_centre_bytes() {
        let m = MidiMessage::PitchBend { channel: 0, value: 8192 };
        assert_eq!(m.to_bytes(), vec![0xE0, 0x00, 0x40]);
    }

    #[test]
    fn pitch_bend_clamps_to_14_bits() {
        let m = MidiMessage::PitchBend { channel: 0, value: 0xFFFF };
        assert_eq!(m.to_bytes(), vec![0xE0, 0x7F, 0x7F]);
    }

    #[test]
    fn note_off_has_zero_velocity() {
        assert_eq!(MidiMessage::NoteOff { channel: 0, note: 36 }.to_bytes(), vec![0x80, 36, 0]);
    }

    #[test]
    fn hint_wins_over_softsynth() {
        let n = names(&["Midi Through", "FLUID Synth", "My Keyboard"]);
        assert_eq!(pick_port(&n, Some("keyboard")), 2);
    }

    #[test]
    fn softsynth_preferred_without_hint() {
        let n = names(&["Midi Through", "FLUID Synth"]);
        assert_eq!(pick_port(&n, None), 1);
    }

    #[test]
    fn first_port_as_last_resort() {
        let n = names(&["Port A", "Port B"]);
        assert_eq!(pick_port(&n, Some("nowhere")), 0);
    }
}
