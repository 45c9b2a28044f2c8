//! motion_probe: run the motion-to-control pipeline over a directory of
//! still frames and print what the instrument would do with each one.
//!
//! ```text
//! motion_probe <dir> [--viewport N] [--metric ratio|count]
//!                    [--compare raw|trail] [--gap-fill off|feedback|counted]
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use motion_core::{
    logging, BaseParams, CompareBasis, DetectorConfig, DeviceProfile, GapFill,
    MotionDetector, MotionMetric, SignalMapper, TickOutcome, FrameBuffer,
};
use motion_core::frame::list_image_files;
use tracing::warn;

struct ProbeArgs {
    dir:      PathBuf,
    viewport: u32,
    metric:   MotionMetric,
    compare:  CompareBasis,
    gap_fill: GapFill,
}

fn main() -> Result<()> {
    logging::init("info");
    let args = parse_args(std::env::args().skip(1))?;

    let profile = DeviceProfile::for_viewport(args.viewport, args.metric);
    let mut config = DetectorConfig::from_profile(&profile);
    config.compare = args.compare;
    config.gap_fill = args.gap_fill;

    let mut detector = MotionDetector::new(config);
    let mapper = SignalMapper::default();
    let base = BaseParams::default();

    let frames = list_image_files(&args.dir)
        .with_context(|| format!("cannot read {}", args.dir.display()))?;
    if frames.is_empty() {
        bail!("no image files in {}", args.dir.display());
    }
    println!("  profile: {}", profile.describe());
    println!("  {} frames from {}", frames.len(), args.dir.display());
    println!();
    println!("  {:>5}  {:<24} {:>8} {:>8} {:>10}  {:>8} {:>9} {:>8}",
             "#", "file", "moved", "sampled", "magnitude", "gain dB", "cutoff", "pitch");

    for (n, path) in frames.iter().enumerate() {
        let frame = match FrameBuffer::load(path, profile.capture_width, profile.capture_height) {
            Ok(f)  => f,
            Err(e) => {
                warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };
        let outcome = detector.process(&frame);
        let sample = outcome.sample();
        let m = sample.magnitude(profile.metric);
        let params = mapper.map(m, &profile, &base);

        let name = path.file_name().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
        let gain = if params.is_silent() { "silent".to_string() } else { format!("{:+.2}", params.gain.db()) };
        let note = match outcome {
            TickOutcome::Primed => "  (primed)",
            _ => "",
        };
        println!("  {:>5}  {:<24} {:>8} {:>8} {:>10.4}  {:>8} {:>9.1} {:>8.2}{}",
                 n, name, sample.moved, sample.sampled, m, gain,
                 params.cutoff_hz, params.pitch_hz, note);
    }
    Ok(())
}

fn parse_args<I: Iterator<Item = String>>(mut it: I) -> Result<ProbeArgs> {
    let mut dir      = None;
    let mut viewport = 1280;
    let mut metric   = MotionMetric::Ratio;
    let mut compare  = CompareBasis::RawFrame;
    let mut gap_fill = GapFill::FeedbackOnly;

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--viewport" => {
                let v = it.next().context("--viewport needs a width")?;
                viewport = v.parse().with_context(|| format!("bad viewport width {v:?}"))?;
            }
            "--metric" => {
                let v = it.next().context("--metric needs a value")?;
                metric = MotionMetric::parse(&v).with_context(|| format!("unknown metric {v:?}"))?;
            }
            "--compare" => {
                let v = it.next().context("--compare needs a value")?;
                compare = CompareBasis::parse(&v).with_context(|| format!("unknown basis {v:?}"))?;
            }
            "--gap-fill" => {
                let v = it.next().context("--gap-fill needs a value")?;
                gap_fill = GapFill::parse(&v).with_context(|| format!("unknown gap fill {v:?}"))?;
            }
            other if other.starts_with("--") => bail!("unknown flag {other}"),
            other => dir = Some(PathBuf::from(other)),
        }
    }

    let dir = dir.context("usage: motion_probe <dir> [--viewport N] [--metric ratio|count] [--compare raw|trail] [--gap-fill off|feedback|counted]")?;
    Ok(ProbeArgs { dir, viewport, metric, compare, gap_fill })
}
