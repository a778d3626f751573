//! End-to-end scenarios for the event camera emulator.

use event_emulation::{
    capture::{CaptureConfig, FrameSource, SyntheticSource},
    emulation::{visualize, ChannelPolicy, OFF_COLOR, ON_COLOR},
    ChannelOrder, EmulationError, Emulator, EmulatorConfig, EventStream, Frame, Polarity,
    StreamStatistics,
};

fn gray(value: u8) -> Frame {
    Frame::filled(16, 12, 1, value)
}

fn with(configure: impl FnOnce(&mut EmulatorConfig)) -> Emulator {
    let mut config = EmulatorConfig::default();
    configure(&mut config);
    Emulator::new(config).unwrap()
}

#[test]
fn uniform_brightening_crosses_default_theta() {
    let map = Emulator::default()
        .difference_and_classify(&gray(100), &gray(70))
        .unwrap();
    assert!(map.as_bytes().iter().all(|&b| b == 1));

    let map = with(|c| c.theta = 40.0)
        .difference_and_classify(&gray(100), &gray(70))
        .unwrap();
    assert!(map.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn uniform_darkening_is_off_or_collapsed_on() {
    let map = Emulator::default()
        .difference_and_classify(&gray(50), &gray(90))
        .unwrap();
    assert!(map.as_bytes().iter().all(|&b| b == 2));

    let map = with(|c| c.register_off_as_on = true)
        .difference_and_classify(&gray(50), &gray(90))
        .unwrap();
    assert!(map.as_bytes().iter().all(|&b| b == 1));

    let map = with(|c| c.record_off_events = false)
        .difference_and_classify(&gray(50), &gray(90))
        .unwrap();
    assert!(map.as_bytes().iter().all(|&b| b == 0));
}

#[test]
fn difference_equal_to_theta_is_not_an_event() {
    let map = Emulator::default()
        .difference_and_classify(&gray(120), &gray(100))
        .unwrap();
    assert_eq!(map.counts().events(), 0);
}

#[test]
fn shape_mismatch_fails_for_every_policy() {
    let emu = Emulator::default();

    let small = Frame::filled(10, 10, 1, 0);
    let large = Frame::filled(20, 20, 1, 0);
    assert!(matches!(
        emu.difference_and_classify(&small, &large),
        Err(EmulationError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        emu.classify_with_policy(&small, &large, ChannelPolicy::Grayscale),
        Err(EmulationError::ShapeMismatch { .. })
    ));

    let small = Frame::filled(10, 10, 3, 0);
    let large = Frame::filled(20, 20, 3, 0);
    for policy in [ChannelPolicy::AllChannels, ChannelPolicy::AnyChannel] {
        assert!(matches!(
            emu.classify_with_policy(&small, &large, policy),
            Err(EmulationError::ShapeMismatch { .. })
        ));
    }
    assert!(matches!(
        emu.classify_any_channel(&small, &large),
        Err(EmulationError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        with(|c| c.use_log_diff = true).difference_and_classify(&small, &large),
        Err(EmulationError::ShapeMismatch { .. })
    ));
    assert!(matches!(
        emu.structural_diff(&small, &large),
        Err(EmulationError::ShapeMismatch { .. })
    ));
}

#[test]
fn shape_mismatch_error_names_both_shapes() {
    let err = Emulator::default()
        .difference_and_classify(&Frame::filled(10, 10, 1, 0), &Frame::filled(20, 20, 1, 0))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "frame shape mismatch: current 10x10x1, previous 20x20x1"
    );
}

#[test]
fn invalid_thresholds_rejected() {
    for theta in [0.0, -20.0, f64::NAN, f64::NEG_INFINITY] {
        assert!(matches!(
            Emulator::new(EmulatorConfig::with_theta(theta)),
            Err(EmulationError::InvalidThreshold(_))
        ));
    }
}

#[test]
fn unsupported_channel_counts_rejected() {
    for channels in [2u8, 4] {
        let frame = Frame::filled(4, 4, channels, 0);
        assert!(matches!(
            Emulator::default().difference_and_classify(&frame, &frame),
            Err(EmulationError::UnsupportedChannelCount(c)) if c == channels
        ));
    }
}

#[test]
fn moving_square_produces_both_polarities() {
    let mut source = SyntheticSource::new();
    let mut config = CaptureConfig::with_dimensions(48, 32);
    config.grayscale = true;
    source.open(&config).unwrap();

    let mut stream = EventStream::new(Emulator::default());
    let mut stats = StreamStatistics::new();

    for _ in 0..6 {
        let frame = source.capture().unwrap();
        if let Some(map) = stream.process(&frame).unwrap() {
            stats.record(frame.sequence(), &map.counts());

            let img = visualize(&map);
            assert_eq!(img.dimensions(), (48, 32));
        }
    }

    assert_eq!(stats.frames_processed, 5);
    assert!(stats.total_on > 0);
    assert!(stats.total_off > 0);
    assert!(stats.peak_density < 0.5);
}

#[test]
fn colour_stream_matches_grayscale_conversion_path() {
    let mut source = SyntheticSource::new();
    source.open(&CaptureConfig::with_dimensions(32, 24)).unwrap();
    let previous = source.capture().unwrap();
    let current = source.capture().unwrap();

    let emu = Emulator::default();
    let via_gray = emu
        .grayscale_events(&current, &previous, ChannelOrder::Bgr)
        .unwrap();
    let direct = emu
        .difference_and_classify(
            &current.to_grayscale(ChannelOrder::Bgr),
            &previous.to_grayscale(ChannelOrder::Bgr),
        )
        .unwrap();

    assert_eq!(via_gray, direct);
    // Synthetic colour frames are neutral grey, so all channels agree too.
    assert_eq!(
        emu.difference_and_classify(&current, &previous)
            .unwrap()
            .counts()
            .events(),
        direct.counts().events()
    );
}

#[test]
fn red_only_change_needs_any_channel_policy() {
    let previous = Frame::filled(4, 4, 3, 50);
    let mut pixels = previous.pixels().to_vec();
    for px in pixels.chunks_exact_mut(3) {
        px[2] = 200;
    }
    let current = Frame::new(pixels, 4, 4, 3, 1);

    let emu = Emulator::default();
    assert_eq!(
        emu.difference_and_classify(&current, &previous)
            .unwrap()
            .counts()
            .events(),
        0
    );

    let any = emu.classify_any_channel(&current, &previous).unwrap();
    assert!(any.labels().iter().all(|&p| p == Polarity::On));

    let img = visualize(&any);
    assert!(img.pixels().all(|&p| p == ON_COLOR));
}

#[test]
fn darkening_visualized_blue() {
    let map = Emulator::default()
        .difference_and_classify(&gray(0), &gray(255))
        .unwrap();
    let img = visualize(&map);
    assert!(img.pixels().all(|&p| p == OFF_COLOR));
}

#[test]
fn structural_diff_flags_changed_region() {
    let previous = Frame::filled(24, 24, 1, 120);
    let mut pixels = previous.pixels().to_vec();
    for y in 8..16 {
        for x in 8..16 {
            pixels[y * 24 + x] = if (x + y) % 2 == 0 { 255 } else { 0 };
        }
    }
    let current = Frame::new(pixels, 24, 24, 1, 1);

    let img = Emulator::default()
        .structural_diff(&current, &previous)
        .unwrap();

    assert_eq!(img.dimensions(), (24, 24));
    assert_eq!(img.get_pixel(0, 0).0[0], 255);
    assert_eq!(img.get_pixel(23, 23).0[0], 255);
    assert_eq!(img.get_pixel(12, 12).0[0], 0);
    assert!(img
        .pixels()
        .all(|p| p.0[0] == 0 || p.0[0] == 255 || (50..=205).contains(&p.0[0])));
}

#[test]
fn emulator_is_shareable_across_threads() {
    let emu = Emulator::default();
    let pairs: Vec<(Frame, Frame)> = (0..4u8)
        .map(|i| (gray(100 + i * 10), gray(60)))
        .collect();

    let results: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = pairs
            .iter()
            .map(|(current, previous)| {
                scope.spawn(move || {
                    emu.difference_and_classify(current, previous)
                        .unwrap()
                        .counts()
                        .on
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|&on| on == 16 * 12));
}
