//! Error types for the synthesis side.

pub type Result<T> = std::result::Result<T, SynthError>;

#[derive(Debug, thiserror::Error)]
pub enum SynthError {
    /// The ramp scheduler thread has exited.
    #[error("audio engine has stopped")]
    EngineStopped,

    #[error("MIDI initialisation failed: {0}")]
    MidiInit(String),

    #[error("failed to connect to MIDI port {port}: {reason}")]
    MidiConnect { port: String, reason: String },
}
