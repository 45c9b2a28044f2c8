use motion_core::{
    BaseParams, CompareBasis, DetectorConfig, DeviceClass, DeviceProfile, FrameBuffer, Gain,
    GapFill, MappingCurve, MotionDetector, MotionMetric, SignalMapper, TickOutcome,
};
use proptest::prelude::*;

/// 4×1 capture, stride 1, threshold 50, noise floor 1 pixel, counted metric.
fn four_pixel_profile() -> DeviceProfile {
    DeviceProfile::with_capture(
        DeviceClass::Capable, 4, 1, 1, 50, 0.25, MotionMetric::ScaledCount,
    )
}

#[test]
fn identical_black_frames_are_still() {
    let profile = four_pixel_profile();
    let mut det = MotionDetector::new(DetectorConfig::from_profile(&profile));
    let black = FrameBuffer::black(4, 1);

    det.process(&black);
    let outcome = det.process(&black);

    assert!(matches!(outcome, TickOutcome::Scored(_)));
    assert_eq!(outcome.sample().magnitude(profile.metric), 0.0);
    let fb = det.feedback().expect("scored tick has feedback");
    for x in 0..4 {
        assert_eq!(fb.pixel(x, 0), Some([0, 0, 0, 255]));
    }
}

#[test]
fn black_to_white_reaches_full_gain() {
    let profile = four_pixel_profile();
    assert_eq!(profile.noise_floor, 1.0);
    assert_eq!(profile.max_magnitude, 4.0);

    let mut det = MotionDetector::new(DetectorConfig::from_profile(&profile));
    det.process(&FrameBuffer::black(4, 1));
    let sample = det.process(&FrameBuffer::filled(4, 1, [255, 255, 255, 255])).sample();
    let m = sample.magnitude(profile.metric);
    assert_eq!(m, 4.0);

    // Gain saturates at the full four pixels.
    let curve = MappingCurve { gain_saturation: 1.0, ..MappingCurve::default() };
    let params = SignalMapper::new(curve.clone()).map(m, &profile, &BaseParams::default());
    assert_eq!(params.gain, Gain::Db(curve.max_db));
}

#[test]
fn mismatched_lengths_reprime_without_motion() {
    let mut det = MotionDetector::new(DetectorConfig {
        stride: 1,
        change_threshold: 30,
        compare: CompareBasis::RawFrame,
        gap_fill: GapFill::FeedbackOnly,
        highlight: motion_core::detector::HIGHLIGHT,
        dim_factor: motion_core::detector::DIM_FACTOR,
    });
    det.process(&FrameBuffer::black(320, 240));
    let bigger = FrameBuffer::filled(640, 480, [255, 255, 255, 255]);
    let outcome = det.process(&bigger);
    assert_eq!(outcome, TickOutcome::Primed);
    assert_eq!(outcome.sample().ratio(), 0.0);
    assert_eq!(det.retained_len(), Some(640 * 480 * 4));
}

#[test]
fn gated_ticks_repeat_silence() {
    let profile = DeviceProfile::for_class(DeviceClass::Constrained, MotionMetric::Ratio);
    let mapper = SignalMapper::default();
    let base = BaseParams::default();
    for _ in 0..3 {
        assert_eq!(mapper.map(0.0, &profile, &base).gain, Gain::Silent);
    }
}

fn any_profile() -> impl Strategy<Value = DeviceProfile> {
    (prop_oneof![Just(DeviceClass::Constrained), Just(DeviceClass::Capable)],
     prop_oneof![Just(MotionMetric::Ratio), Just(MotionMetric::ScaledCount)])
        .prop_map(|(class, metric)| DeviceProfile::for_class(class, metric))
}

proptest! {
    #[test]
    fn identical_frames_never_move(w in 1usize..24, h in 1usize..24, stride in 1usize..5, seed in any::<u8>()) {
        let pixels: Vec<u8> = (0..w * h * 4).map(|i| (i as u8).wrapping_mul(seed)).collect();
        let frame = FrameBuffer::from_rgba(w, h, pixels).unwrap();
        let profile = DeviceProfile::with_capture(DeviceClass::Capable, w, h, stride, 10, 0.01, MotionMetric::Ratio);
        let mut det = MotionDetector::new(DetectorConfig::from_profile(&profile));
        det.process(&frame);
        prop_assert_eq!(det.process(&frame).sample().moved, 0);
    }

    #[test]
    fn mapping_is_monotonic(profile in any_profile(), a in 0.0f32..1.2, b in 0.0f32..1.2,
                            cutoff in 0.0f32..2000.0, pitch in 20.0f32..400.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let (lo, hi) = (lo * profile.max_magnitude, hi * profile.max_magnitude);
        let base = BaseParams { base_cutoff_hz: cutoff, base_pitch_hz: pitch };
        let mapper = SignalMapper::default();
        let p1 = mapper.map(lo, &profile, &base);
        let p2 = mapper.map(hi, &profile, &base);
        prop_assert!(p1.gain <= p2.gain);
        prop_assert!(p1.cutoff_hz <= p2.cutoff_hz);
        prop_assert!(p1.pitch_offset <= p2.pitch_offset);
    }

    #[test]
    fn saturated_outputs_hit_their_maximum(profile in any_profile(), over in 1.0f32..50.0) {
        let curve = MappingCurve::default();
        let m = curve.filter_saturation.max(curve.gain_saturation) * profile.max_magnitude * over;
        let base = BaseParams { base_cutoff_hz: 250.0, base_pitch_hz: 80.0 };
        let out = SignalMapper::new(curve.clone()).map(m, &profile, &base);
        prop_assert_eq!(out.gain, Gain::Db(curve.max_db));
        prop_assert_eq!(out.cutoff_hz, 250.0 + curve.max_sweep_hz);
        prop_assert!(out.pitch_offset <= curve.pitch_scale_hz);
    }

    #[test]
    fn malformed_buffers_never_panic(w in 0usize..20, h in 0usize..20, stride in 1usize..6,
                                     len_a in 0usize..2000, len_b in 0usize..2000,
                                     compare in prop_oneof![Just(CompareBasis::RawFrame), Just(CompareBasis::AnnotatedFrame)],
                                     gap in prop_oneof![Just(GapFill::Off), Just(GapFill::FeedbackOnly), Just(GapFill::Counted)]) {
        let profile = DeviceProfile::with_capture(DeviceClass::Capable, w, h, stride, 20, 0.01, MotionMetric::Ratio);
        let mut cfg = DetectorConfig::from_profile(&profile);
        cfg.compare = compare;
        cfg.gap_fill = gap;
        let mut det = MotionDetector::new(cfg);
        let a = FrameBuffer::from_raw(w, h, vec![0; len_a]);
        let b = FrameBuffer::from_raw(w, h, vec![255; len_b]);
        for frame in [&a, &b, &a, &b] {
            let outcome = det.process(frame);
            let s = outcome.sample();
            prop_assert!(s.moved <= s.sampled);
            prop_assert!(s.sampled <= w * h);
            if let Some(fb) = det.feedback() {
                prop_assert_eq!(fb.len(), w * h * 4);
            }
        }
    }
}
