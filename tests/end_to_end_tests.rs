//! Capture, bank and replay scenarios on one simulated timeline

use rust_raw_ir::render::{parse_durations, render_sequence};
use rust_raw_ir::sim::{demodulate, drive_edges, run_for, SimClock, SimDelay, SimPin, SimTrace};
use rust_raw_ir::{
    CapturePhase, CaptureSession, Carrier, CarrierTransmitter, Clock, CollectOutcome,
    EdgeCapturer, EngineConfig, FrameDetector, IrEngine, LogStream, Transmit,
};

const NEC_FRAME: [u16; 19] = [
    9_000, 4_500, 560, 560, 560, 1_690, 560, 560, 560, 1_690, 560, 560, 560, 1_690, 560, 560, 560,
    1_690, 560,
];

/// Pulse-distance frame: short marks, spaces alternating short and long.
const PULSE_DISTANCE_FRAME: [u16; 19] = [
    420, 350, 430, 1_330, 410, 350, 440, 1_330, 420, 350, 450, 1_330, 400, 350, 430, 1_330, 420,
    350, 440,
];

/// Receiver edges for `durations`, active-low, starting with the falling edge.
fn receiver_edges(durations: &[u16]) -> Vec<(u32, bool)> {
    let mut edges = vec![(0, false)];
    let mut level = false;
    for &d in durations {
        level = !level;
        edges.push((d as u32, level));
    }
    edges
}

#[test]
fn test_short_burst_is_never_stored() {
    let config = EngineConfig::new();
    let session: CaptureSession = CaptureSession::new();
    let log = LogStream::new();
    let clock = SimClock::starting_at(1_000);
    let trace = SimTrace::<64>::new();
    let capturer = EdgeCapturer::new(&session, &config, &log);
    let detector = FrameDetector::new(&session, &config, &log);
    let tx = CarrierTransmitter::new(SimPin::new(&trace, &clock), SimDelay::new(&clock), &clock)
        .unwrap();
    let mut engine: IrEngine<'_, _> = IrEngine::new(&session, &config, &log, tx);

    let edges = [(0, false), (3_600, true), (1_760, false), (400, true), (1_300, false)];
    drive_edges(&clock, &capturer, &detector, &edges, |_| {});
    assert_eq!(session.count(), 4);

    for _ in 0..20 {
        run_for(&clock, &detector, 10_000);
        assert_eq!(engine.poll(clock.now_us()), CollectOutcome::NotReady);
    }
    assert!(engine.bank().is_empty());
    assert_eq!(session.phase(), CapturePhase::Capturing);
    assert!(session.is_stalled());

    // Operator reset clears the stall and the next frame is captured.
    engine.reset();
    drive_edges(&clock, &capturer, &detector, &receiver_edges(&NEC_FRAME), |_| {});
    run_for(&clock, &detector, 20_000);
    assert_eq!(
        engine.poll(clock.now_us()),
        CollectOutcome::Stored { index: 0 }
    );
}

#[test]
fn test_frame_is_stored_and_replayed() {
    let config = EngineConfig::new();
    let session: CaptureSession = CaptureSession::new();
    let log = LogStream::new();
    let clock = SimClock::starting_at(1_000);
    let trace = SimTrace::<2048>::new();
    let capturer = EdgeCapturer::new(&session, &config, &log);
    let detector = FrameDetector::new(&session, &config, &log);
    let tx = CarrierTransmitter::new(SimPin::new(&trace, &clock), SimDelay::new(&clock), &clock)
        .unwrap();
    let mut engine: IrEngine<'_, _> = IrEngine::new(&session, &config, &log, tx);

    let frame = PULSE_DISTANCE_FRAME;
    drive_edges(&clock, &capturer, &detector, &receiver_edges(&frame), |_| {});
    run_for(&clock, &detector, 20_000);
    assert_eq!(
        engine.poll(clock.now_us()),
        CollectOutcome::Stored { index: 0 }
    );

    let stored = engine.bank().get(0).unwrap();
    assert_eq!(stored.durations(), &frame[..]);
    assert_eq!(stored.label().as_str(), "SIGNAL_RAW_1");
    assert_eq!(session.phase(), CapturePhase::Idle);

    let carrier = Carrier::DEFAULT;
    let half = carrier.half_period_us();
    let stats = engine.transmit_stored(0, carrier).unwrap();
    assert_eq!(stats.segments, 19);
    assert!(!trace.level());
    assert!(engine.transmit_stored(1, carrier).is_none());

    // Envelope of the replay, one transition per segment boundary.
    let mut envelope = Vec::new();
    demodulate(&trace, 2 * half, false, |t, level| envelope.push((t, level)));
    assert_eq!(envelope.len(), 2 * 10);
    assert!(envelope.iter().step_by(2).all(|&(_, level)| level));

    for (i, pair) in envelope.windows(2).enumerate() {
        let got = pair[1].0 - pair[0].0;
        let sent = frame[i] as u32;
        if i % 2 == 0 {
            assert!(
                got + half >= sent && got < sent + half,
                "mark {}: sent {} replayed {}",
                i,
                sent,
                got
            );
        } else {
            assert!(
                got >= sent && got <= sent + half,
                "space {}: sent {} replayed {}",
                i,
                sent,
                got
            );
        }
    }

    // Carrier inside each mark.
    let rises: Vec<u32> = trace.rising_edges().collect();
    let (start, end) = (envelope[0].0, envelope[1].0);
    let first_mark: Vec<u32> = rises
        .iter()
        .copied()
        .filter(|&t| t >= start && t < end)
        .collect();
    assert!(first_mark.len() > 1);
    assert!(first_mark.windows(2).all(|w| w[1] - w[0] == 2 * half));
}

#[test]
fn test_transmit_then_recapture_preserves_shape() {
    let config = EngineConfig::new();
    let session: CaptureSession = CaptureSession::new();
    let log = LogStream::new();
    let clock = SimClock::starting_at(1_000);
    let trace = SimTrace::<2048>::new();
    let capturer = EdgeCapturer::new(&session, &config, &log);
    let detector = FrameDetector::new(&session, &config, &log);
    let mut tx =
        CarrierTransmitter::new(SimPin::new(&trace, &clock), SimDelay::new(&clock), &clock)
            .unwrap();

    let carrier = Carrier::DEFAULT;
    let half = carrier.half_period_us();
    tx.transmit(&NEC_FRAME, carrier);
    demodulate(&trace, 2 * half, config.active_low(), |t, level| {
        capturer.on_edge(t, level);
    });
    run_for(&clock, &detector, 20_000);
    assert_eq!(session.phase(), CapturePhase::Ready);

    let mut captured = [0u16; 32];
    let n = session.peek(&mut captured);
    assert_eq!(n, NEC_FRAME.len());
    for (i, (&got, &sent)) in captured[..n].iter().zip(NEC_FRAME.iter()).enumerate() {
        let diff = (got as i32 - sent as i32).unsigned_abs();
        assert!(diff <= 2 * half, "timing {}: sent {} got {}", i, sent, got);
        // Marks lose at most one carrier period at the tail, spaces gain it.
        if i % 2 == 0 {
            assert!(got <= sent, "mark {} grew: {} -> {}", i, sent, got);
        } else {
            assert!(got >= sent, "space {} shrank: {} -> {}", i, sent, got);
        }
    }
}

#[test]
fn test_rendered_signal_parses_back() {
    let config = EngineConfig::new();
    let session: CaptureSession = CaptureSession::new();
    let log = LogStream::new();
    let clock = SimClock::starting_at(1_000);
    let trace = SimTrace::<16>::new();
    let capturer = EdgeCapturer::new(&session, &config, &log);
    let detector = FrameDetector::new(&session, &config, &log);
    let tx = CarrierTransmitter::new(SimPin::new(&trace, &clock), SimDelay::new(&clock), &clock)
        .unwrap();
    let mut engine: IrEngine<'_, _> = IrEngine::new(&session, &config, &log, tx);

    drive_edges(&clock, &capturer, &detector, &receiver_edges(&NEC_FRAME), |_| {});
    run_for(&clock, &detector, 20_000);
    engine.poll(clock.now_us());

    let mut text = String::new();
    let view = engine.bank().get(0).unwrap().view();
    render_sequence(&view, 1, &mut text).unwrap();
    assert!(text.contains("uint16_t rawSignal1[] = {"));
    assert!(text.contains("#define RAW_SIGNAL1_LENGTH 19"));

    let mut parsed = [0u16; 64];
    let n = parse_durations(&text[text.find('{').unwrap()..], &mut parsed).unwrap();
    assert_eq!(&parsed[..n], &NEC_FRAME[..]);
}
