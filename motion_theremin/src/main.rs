//! motion_theremin: interactive entry point.
//!
//! ```text
//! motion_theremin [--quick] [--config FILE] [--dump-config]
//!                 [--viewport N] [--sequence DIR] [--fps N]
//!                 [--compare raw|trail] [--gap-fill off|feedback|counted]
//!                 [--metric ratio|count] [--midi-port NAME]
//! ```

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use motion_core::{logging, CompareBasis, GapFill, MotionMetric};
use motion_synth::Waveform;
use motion_theremin::config::{AppConfig, SourceKind};
use motion_theremin::run;
use tracing::info;

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let overrides = parse_args(&args)?;

    let mut cfg = match &overrides.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    if overrides.dump_config {
        print!("{}", cfg.to_toml()?);
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Motion Theremin: play the camera with your hands    ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    if !overrides.quick && !overrides.any() && overrides.config.is_none() {
        configure_interactively(&mut cfg);
    } else if overrides.quick {
        println!("  Quick-start: simulated camera, sawtooth, tuned curve\n");
    }
    overrides.apply(&mut cfg);
    cfg.validate()?;

    logging::init(&cfg.log_level);
    info!("profile: {}", cfg.profile().describe());

    println!();
    println!("  Opening window. Press Space to start audio, Q to quit.");
    println!();

    run(cfg).context("theremin stopped with an error")
}

// ════════════════════════════════════════════════════════════════════════════
// Command line
// ════════════════════════════════════════════════════════════════════════════

#[derive(Default)]
struct Overrides {
    quick:       bool,
    dump_config: bool,
    config:      Option<PathBuf>,
    viewport:    Option<u32>,
    sequence:    Option<PathBuf>,
    fps:         Option<f32>,
    compare:     Option<CompareBasis>,
    gap_fill:    Option<GapFill>,
    metric:      Option<MotionMetric>,
    midi_port:   Option<String>,
}

impl Overrides {
    /// True when any setting was given on the command line.
    fn any(&self) -> bool {
        self.viewport.is_some() || self.sequence.is_some() || self.fps.is_some()
            || self.compare.is_some() || self.gap_fill.is_some() || self.metric.is_some()
            || self.midi_port.is_some()
    }

    fn apply(&self, cfg: &mut AppConfig) {
        if let Some(v) = self.viewport { cfg.viewport_width = v; }
        if let Some(dir) = &self.sequence {
            cfg.source.kind = SourceKind::Sequence;
            cfg.source.path = Some(dir.clone());
        }
        if let Some(fps) = self.fps { cfg.source.fps = fps; }
        if let Some(c) = self.compare { cfg.compare = c; }
        if let Some(g) = self.gap_fill { cfg.gap_fill = g; }
        if let Some(m) = self.metric { cfg.metric = m; }
        if let Some(p) = &self.midi_port { cfg.midi.port = Some(p.clone()); }
    }
}

fn parse_args(args: &[String]) -> Result<Overrides> {
    let mut o = Overrides::default();
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        let mut value = |flag: &str| it.next().cloned().with_context(|| format!("{flag} needs a value"));
        match arg.as_str() {
            "--quick"       => o.quick = true,
            "--dump-config" => o.dump_config = true,
            "--config"      => o.config = Some(PathBuf::from(value("--config")?)),
            "--sequence"    => o.sequence = Some(PathBuf::from(value("--sequence")?)),
            "--midi-port"   => o.midi_port = Some(value("--midi-port")?),
            "--viewport" => {
                let v = value("--viewport")?;
                o.viewport = Some(v.parse().with_context(|| format!("bad viewport width {v:?}"))?);
            }
            "--fps" => {
                let v = value("--fps")?;
                o.fps = Some(v.parse().with_context(|| format!("bad fps {v:?}"))?);
            }
            "--compare" => {
                let v = value("--compare")?;
                o.compare = Some(CompareBasis::parse(&v).with_context(|| format!("unknown basis {v:?}"))?);
            }
            "--gap-fill" => {
                let v = value("--gap-fill")?;
                o.gap_fill = Some(GapFill::parse(&v).with_context(|| format!("unknown gap fill {v:?}"))?);
            }
            "--metric" => {
                let v = value("--metric")?;
                o.metric = Some(MotionMetric::parse(&v).with_context(|| format!("unknown metric {v:?}"))?);
            }
            other => bail!("unknown argument {other}"),
        }
    }
    Ok(o)
}

// ════════════════════════════════════════════════════════════════════════════
// Interactive prompts
// ════════════════════════════════════════════════════════════════════════════

fn configure_interactively(cfg: &mut AppConfig) {
    println!("  Device class:");
    println!("    1. Capable     (640x480, every pixel)");
    println!("    2. Constrained (320x240, every other pixel)");
    cfg.viewport_width = match read_line("  Choice (default 1): ").trim() {
        "2" => 640,
        _   => 1280,
    };

    let dir = read_line("  Image sequence directory (blank = simulated camera): ");
    let dir = dir.trim();
    if !dir.is_empty() {
        cfg.source.kind = SourceKind::Sequence;
        cfg.source.path = Some(PathBuf::from(dir));
        cfg.source.fps = read_line("  Playback fps (default 15): ")
            .trim().parse::<f32>().unwrap_or(15.0).clamp(1.0, 60.0);
    }

    println!("  Waveform: 1=Sine  2=Square  3=Sawtooth  4=Triangle");
    cfg.voice.waveform = match read_line("  Choice (default 3): ").trim() {
        "1" => Waveform::Sine,
        "2" => Waveform::Square,
        "4" => Waveform::Triangle,
        _   => Waveform::Sawtooth,
    };

    cfg.base.base_pitch_hz = read_line("  Base pitch Hz (default 65.41 = C2): ")
        .trim().parse::<f32>().unwrap_or(cfg.base.base_pitch_hz).clamp(20.0, 2000.0);
    cfg.base.base_cutoff_hz = read_line("  Base cutoff Hz (default 500): ")
        .trim().parse::<f32>().unwrap_or(cfg.base.base_cutoff_hz).clamp(20.0, 20_000.0);

    println!("  Motion comparison: 1=Frame to frame  2=Against feedback (trails)");
    if read_line("  Choice (default 1): ").trim() == "2" {
        cfg.compare = CompareBasis::AnnotatedFrame;
    }
}

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    io::stdout().flush().ok();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf
}
