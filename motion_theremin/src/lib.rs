//! # motion_theremin
//!
//! A theremin played by waving at a camera.  Each render tick the session
//! scores the change between the current and previous camera frames, maps
//! the amount of motion to gain, filter cutoff and pitch targets, and sends
//! those to a ramping MIDI synth voice while the window shows the
//! highlighted motion pixels.
//!
//! ```text
//! FrameSource ──▶ MotionDetector ──▶ SignalMapper ──▶ AudioEngine
//!                      │                                (MidiEngine)
//!                      └──▶ feedback ──▶ RenderSurface (Visualizer)
//! ```
//!
//! ## Frame sources
//!
//! * (default) **Simulated camera**: a still scene with sensor noise; the
//!   mouse over the view moves a "hand" through it.
//! * `--sequence <dir>`: a folder of still images played back at `--fps`.
//!
//! ## Keys
//!
//! | Key | Action |
//! |---|---|
//! | `Space` | Start audio (nothing is sent until then) |
//! | `←` / `→` | Base pitch down / up a semitone |
//! | `↓` / `↑` | Base cutoff down / up |
//! | `W` | Next waveform |
//! | `R` / `F` | Resonance up / down |
//! | `G` / `V` | Distortion up / down |
//! | `B` / `N` | Reverb mix up / down |
//! | `Q` / `Escape` | Quit |

pub mod error;
pub mod config;
pub mod source;
pub mod surface;
pub mod font;
pub mod visualizer;
pub mod app;

pub use app::{run, Session, TickReport};
pub use config::AppConfig;
pub use error::{AppError, ConfigError, Result};
