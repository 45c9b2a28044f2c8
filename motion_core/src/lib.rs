//! # motion_core
//!
//! The motion-to-control pipeline of the motion theremin:
//!
//! * [`profile`]: derives a [`DeviceProfile`] (capture size, sampling
//!   stride, thresholds) once per session from a viewport width.
//! * [`detector`]: frame-differencing [`MotionDetector`] that scores two
//!   successive RGBA buffers and paints a feedback image.
//! * [`mapper`]: [`SignalMapper`] turning a motion magnitude into
//!   gain / cutoff / pitch targets behind a noise-floor gate.
//!
//! ## Pipeline
//!
//! ```text
//! FrameBuffer ──▶ MotionDetector ──▶ MotionSample ──▶ SignalMapper ──▶ ControlParameters
//!                      │
//!                      └──▶ feedback FrameBuffer
//! ```
//!
//! ## Quick start
//!
//! ```rust
//! use motion_core::{
//!     BaseParams, DetectorConfig, DeviceClass, DeviceProfile, FrameBuffer,
//!     Gain, MotionDetector, MotionMetric, SignalMapper,
//! };
//!
//! let profile  = DeviceProfile::for_class(DeviceClass::Capable, MotionMetric::Ratio);
//! let mut det  = MotionDetector::new(DetectorConfig::from_profile(&profile));
//! let mapper   = SignalMapper::default();
//!
//! let frame = FrameBuffer::black(profile.capture_width, profile.capture_height);
//! det.process(&frame);                       // primes the previous frame
//! let outcome = det.process(&frame);         // identical frame → no motion
//!
//! let m = outcome.sample().magnitude(profile.metric);
//! let params = mapper.map(m, &profile, &BaseParams::default());
//! assert_eq!(params.gain, Gain::Silent);
//! ```

pub mod error;
pub mod frame;
pub mod profile;
pub mod detector;
pub mod mapper;
pub mod logging;

pub use error::{CoreError, Result};
pub use frame::FrameBuffer;
pub use profile::{DeviceClass, DeviceProfile, MotionMetric};
pub use detector::{
    CompareBasis, DetectorConfig, GapFill, MotionDetector, MotionSample, TickOutcome,
};
pub use mapper::{BaseParams, ControlParameters, Gain, MappingCurve, SignalMapper};
