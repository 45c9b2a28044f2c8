//! The audio engine seam and its MIDI-backed implementation.
//!
//! The detection loop only pushes targets; [`MidiEngine`] owns a [`Voice`]
//! on a background thread that wakes every few milliseconds, drains its
//! command queue and advances the ramps by the real elapsed time.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use motion_core::ControlParameters;
use tracing::{debug, warn};

use crate::error::{Result, SynthError};
use crate::midi::ControlSink;
use crate::ramp::RampTimes;
use crate::voice::{Voice, VoiceSettings};

/// Scheduler period of the engine thread.
pub const ENGINE_TICK: Duration = Duration::from_millis(5);

/// Anything that can turn control targets into sound.
pub trait AudioEngine: Send {
    /// Glide toward `params`.  Called once per detection tick.
    fn apply(&mut self, params: &ControlParameters) -> Result<()>;
    /// Change the cosmetic voice controls.
    fn configure(&mut self, settings: &VoiceSettings) -> Result<()>;
    /// Silence and release the engine.  Idempotent.
    fn shutdown(&mut self);
}

// ════════════════════════════════════════════════════════════════════════════
// EngineCommand: sent to the engine thread
// ════════════════════════════════════════════════════════════════════════════

enum EngineCommand {
    Target(ControlParameters),
    Configure(VoiceSettings),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// MidiEngine
// ════════════════════════════════════════════════════════════════════════════

/// Handle to the ramp scheduler thread.
pub struct MidiEngine {
    cmd_tx: Sender<EngineCommand>,
    handle: Option<JoinHandle<()>>,
}

impl MidiEngine {
    /// Start the scheduler.  The voice strikes its held note silently
    /// before the first target arrives.
    pub fn spawn(
        sink:     Box<dyn ControlSink>,
        channel:  u8,
        times:    RampTimes,
        settings: VoiceSettings,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let handle = thread::spawn(move || {
            let mut voice = Voice::new(sink, channel, times);
            voice.start(&settings);
            engine_thread(voice, cmd_rx);
        });
        MidiEngine { cmd_tx, handle: Some(handle) }
    }

    fn send(&self, cmd: EngineCommand) -> Result<()> {
        self.cmd_tx.send(cmd).map_err(|_| SynthError::EngineStopped)
    }
}

impl AudioEngine for MidiEngine {
    fn apply(&mut self, params: &ControlParameters) -> Result<()> {
        self.send(EngineCommand::Target(*params))
    }

    fn configure(&mut self, settings: &VoiceSettings) -> Result<()> {
        self.send(EngineCommand::Configure(settings.clone()))
    }

    fn shutdown(&mut self) {
        let Some(handle) = self.handle.take() else { return };
        let _ = self.cmd_tx.send(EngineCommand::Quit);
        if handle.join().is_err() {
            warn!("audio engine thread panicked");
        }
    }
}

impl Drop for MidiEngine {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// engine_thread: the actual loop
// ════════════════════════════════════════════════════════════════════════════

fn engine_thread(mut voice: Voice, cmd_rx: Receiver<EngineCommand>) {
    let mut last = Instant::now();
    loop {
        // ── drain commands ────────────────────────────────────────────────
        loop {
            match cmd_rx.try_recv() {
                Ok(EngineCommand::Target(p))    => voice.set_target(&p),
                Ok(EngineCommand::Configure(s)) => voice.configure(&s),
                Ok(EngineCommand::Quit) | Err(mpsc::TryRecvError::Disconnected) => {
                    debug!("audio engine stopping");
                    voice.stop();
                    return;
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        let now = Instant::now();
        voice.advance(now - last);
        last = now;

        thread::sleep(ENGINE_TICK);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::midi::MidiMessage;
    use crate::voice::tests::Recorder;
    use crate::voice::{CC_REVERB, CC_VOLUME};
    use motion_core::Gain;

    fn engine() -> (MidiEngine, Recorder) {
        let rec = Recorder::default();
        let e = MidiEngine::spawn(Box::new(rec.clone()), 0, RampTimes::default(), VoiceSettings::default());
        (e, rec)
    }

    #[test]
    fn target_reaches_the_wire() {
        let (mut e, rec) = engine();
        e.apply(&ControlParameters {
            gain: Gain::Db(6.0), cutoff_hz: 1000.0, pitch_offset: 0.0, pitch_hz: 65.41,
        }).unwrap();
        thread::sleep(Duration::from_millis(300));
        e.shutdown();
        let msgs = rec.take();
        assert!(msgs.contains(&MidiMessage::ControlChange { channel: 0, controller: CC_VOLUME, value: 127 }));
        assert!(matches!(msgs.last(), Some(MidiMessage::ControlChange { controller: CC_VOLUME, value: 0, .. })));
    }

    #[test]
    fn configure_is_forwarded() {
        let (mut e, rec) = engine();
        e.configure(&VoiceSettings { reverb_mix: 0.0, ..VoiceSettings::default() }).unwrap();
        e.shutdown();
        assert_eq!(rec.last_cc(CC_REVERB), Some(0));
    }

    #[test]
    fn apply_after_shutdown_reports_stopped() {
        let (mut e, _rec) = engine();
        e.shutdown();
        e.shutdown();
        let err = e.apply(&ControlParameters::silent(&motion_core::BaseParams::default())).unwrap_err();
        assert!(matches!(err, SynthError::EngineStopped));
    }
}
