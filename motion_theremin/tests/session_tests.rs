use std::path::Path;

use motion_core::{Gain, TickOutcome};
use motion_theremin::config::{AppConfig, SourceKind};
use motion_theremin::source::{FrameSource, SequenceFrameSource, SimFrameSource};
use motion_theremin::surface::NullSurface;
use motion_theremin::{app, Session, TickReport};

fn write_frame(dir: &Path, name: &str, value: u8) {
    image::RgbaImage::from_pixel(16, 12, image::Rgba([value, value, value, 255]))
        .save(dir.join(name))
        .unwrap();
}

fn gains(session: &mut Session, source: &mut dyn FrameSource, ticks: usize) -> Vec<Option<Gain>> {
    let mut surface = NullSurface::default();
    (0..ticks)
        .map(|_| session.tick(source, &mut surface).params().map(|p| p.gain))
        .collect()
}

#[test]
fn sequence_black_then_white() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "000.png", 0);
    write_frame(dir.path(), "001.png", 0);
    write_frame(dir.path(), "002.png", 255);

    let mut cfg = AppConfig::default();
    cfg.source.kind = SourceKind::Sequence;
    cfg.source.path = Some(dir.path().to_path_buf());
    cfg.source.fps = 60.0; // one image per tick

    let mut session = Session::new(&cfg).unwrap();
    let mut source = app::open_source(&cfg, session.profile()).unwrap();

    let got = gains(&mut session, source.as_mut(), 3);
    assert_eq!(got, vec![Some(Gain::Silent), Some(Gain::Silent), Some(Gain::Db(cfg.curve.max_db))]);
}

#[test]
fn first_tick_primes() {
    let dir = tempfile::tempdir().unwrap();
    write_frame(dir.path(), "a.png", 40);
    let cfg = AppConfig::default();
    let mut session = Session::new(&cfg).unwrap();
    let p = session.profile().clone();
    let mut source = SequenceFrameSource::open(dir.path(), p.capture_width, p.capture_height, 15.0).unwrap();
    let report = session.tick(&mut source, &mut NullSurface::default());
    assert!(matches!(report, TickReport::Ran { outcome: TickOutcome::Primed, magnitude, .. } if magnitude == 0.0));
}

#[test]
fn still_simulated_scene_stays_silent() {
    for viewport in [640, 1280] {
        let cfg = AppConfig { viewport_width: viewport, ..AppConfig::default() };
        let mut session = Session::new(&cfg).unwrap();
        let p = session.profile().clone();
        let mut source = SimFrameSource::new(p.capture_width, p.capture_height, 6, Some(42));
        let got = gains(&mut session, &mut source, 10);
        assert!(got.iter().all(|g| *g == Some(Gain::Silent)), "viewport {}: {:?}", viewport, got);
    }
}

#[test]
fn waving_hand_makes_sound() {
    let cfg = AppConfig { viewport_width: 640, ..AppConfig::default() };
    let mut session = Session::new(&cfg).unwrap();
    let p = session.profile().clone();
    let mut source = SimFrameSource::new(p.capture_width, p.capture_height, 6, Some(9));
    let mut surface = NullSurface::default();

    source.steer(Some((0.3, 0.5)));
    session.tick(&mut source, &mut surface);
    source.steer(Some((0.7, 0.5)));
    let report = session.tick(&mut source, &mut surface);

    let params = report.params().copied().unwrap();
    assert!(!params.is_silent());
    assert!(params.cutoff_hz > cfg.base.base_cutoff_hz);
    assert!(params.pitch_hz > cfg.base.base_pitch_hz);
}

#[test]
fn missing_sequence_dir_fails_at_startup() {
    let mut cfg = AppConfig::default();
    cfg.source.kind = SourceKind::Sequence;
    cfg.source.path = Some("/nonexistent/frames".into());
    let session = Session::new(&cfg).unwrap();
    assert!(app::open_source(&cfg, session.profile()).is_err());
}
