//! Module: detector
//!
//! Purpose: Periodic end-of-frame detection. Runs every
//! `DETECTOR_PERIOD_MS` from a timer task, independent of the edge ISR.
//!
//! A capture is finished once the line has been quiet for longer than the
//! silence gap and enough durations were recorded. A quiet capture with too
//! few durations is left as is and reported once; only an operator reset
//! clears it.
//!
//! Safety: RT-safe. Called from timer context.

use crate::config::{EngineConfig, MAX_TRANSITIONS};
use crate::logging::LogStream;
use crate::session::{CapturePhase, CaptureSession};
use crate::stats::Counter;
use crate::{isr_info, isr_warn};

/// What a single tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not capturing.
    Inactive,
    /// Capturing and the line is still active.
    Waiting,
    /// Capture finalized.
    Finalized { count: usize, total_ms: u32 },
    /// Silence exceeded with too few durations; left hanging.
    Stalled { count: usize },
}

/// Frame completion detector bound to one session.
pub struct FrameDetector<'a, const N: usize = MAX_TRANSITIONS> {
    session: &'a CaptureSession<N>,
    config: &'a EngineConfig,
    log: &'a LogStream,
}

impl<'a, const N: usize> FrameDetector<'a, N> {
    pub const fn new(
        session: &'a CaptureSession<N>,
        config: &'a EngineConfig,
        log: &'a LogStream,
    ) -> Self {
        Self {
            session,
            config,
            log,
        }
    }

    /// One detector period.
    pub fn tick(&self, now_us: u32) -> TickOutcome {
        let s = self.session;
        if s.phase() != CapturePhase::Capturing {
            return TickOutcome::Inactive;
        }

        let silence = now_us.wrapping_sub(s.last_edge_us());
        if silence <= self.config.silence_gap_us() {
            return TickOutcome::Waiting;
        }

        let count = s.count();
        if count > self.config.min_valid_count() as usize {
            return match s.finalize(now_us) {
                Some(total_ms) => {
                    s.counters().record(Counter::Frames);
                    isr_info!(self.log, now_us, "frame complete: {} timings, {}ms", count, total_ms);
                    TickOutcome::Finalized { count, total_ms }
                }
                // Overflow or reset got there first.
                None => TickOutcome::Inactive,
            };
        }

        // A reset may have landed since the phase check above.
        if s.phase() != CapturePhase::Capturing {
            return TickOutcome::Inactive;
        }
        if s.mark_stalled() {
            s.counters().record(Counter::Stalls);
            isr_warn!(
                self.log,
                now_us,
                "signal too short: {} timings after {}us silence, reset to clear",
                count,
                silence
            );
        }
        TickOutcome::Stalled { count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::EdgeCapturer;
    use crate::logging::LogLevel;

    fn feed(cap: &EdgeCapturer<'_, 64>, start: u32, durations: &[u32]) -> u32 {
        let mut t = start;
        let mut level = false;
        cap.on_edge(t, level);
        for &d in durations {
            t += d;
            level = !level;
            cap.on_edge(t, level);
        }
        t
    }

    #[test]
    fn test_idle_is_inactive() {
        let session = CaptureSession::<64>::new();
        let config = EngineConfig::new();
        let log = LogStream::new();
        let det = FrameDetector::new(&session, &config, &log);
        assert_eq!(det.tick(1_000_000), TickOutcome::Inactive);
    }

    #[test]
    fn test_finalizes_after_silence() {
        let session = CaptureSession::<64>::new();
        let config = EngineConfig::new();
        let log = LogStream::new();
        let cap = EdgeCapturer::new(&session, &config, &log);
        let det = FrameDetector::new(&session, &config, &log);

        let end = feed(&cap, 1_000, &[560; 12]);
        assert_eq!(det.tick(end + 5_000), TickOutcome::Waiting);
        assert_eq!(det.tick(end + 10_000), TickOutcome::Waiting);
        assert_eq!(
            det.tick(end + 10_001),
            TickOutcome::Finalized {
                count: 12,
                total_ms: 16
            }
        );
        assert_eq!(session.phase(), CapturePhase::Ready);
        assert_eq!(det.tick(end + 15_000), TickOutcome::Inactive);
    }

    #[test]
    fn test_short_capture_stalls_once() {
        let session = CaptureSession::<64>::new();
        let config = EngineConfig::new();
        let log = LogStream::new();
        let cap = EdgeCapturer::new(&session, &config, &log);
        let det = FrameDetector::new(&session, &config, &log);

        let end = feed(&cap, 1_000, &[560; 10]);
        while log.drain().is_some() {}

        assert_eq!(det.tick(end + 20_000), TickOutcome::Stalled { count: 10 });
        assert_eq!(det.tick(end + 25_000), TickOutcome::Stalled { count: 10 });
        assert_eq!(session.phase(), CapturePhase::Capturing);
        assert_eq!(session.counters().get(Counter::Stalls), 1);

        let entry = log.drain().unwrap();
        assert_eq!(entry.level, LogLevel::Warn);
        assert!(entry.message().starts_with("signal too short: 10 timings"));
        assert!(log.drain().is_none());
    }
}
