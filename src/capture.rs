//! Module: capture
//!
//! Purpose: Edge ISR body. Timestamps receiver transitions and turns them
//! into mark/space durations in the shared `CaptureSession`.
//!
//! Architecture:
//! ```text
//!   GPIO any-edge IRQ ──▶ EdgeCapturer::on_edge(now, level)
//!                              │
//!                              ├─ debounce gate
//!                              ├─ Idle + active level + armed ─▶ begin
//!                              └─ Capturing ─▶ classify duration ─▶ append
//! ```
//!
//! Safety: RT-safe. Bounded work, no locks, logs through the lock-free
//! `LogStream` only.

use crate::config::{CaptureParams, EngineConfig, MAX_TRANSITIONS};
use crate::logging::LogStream;
use crate::session::{Append, CapturePhase, CaptureSession};
use crate::stats::Counter;
use crate::{isr_debug, isr_info, isr_warn};

/// What a single edge did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeOutcome {
    /// Too close to the previous accepted edge; nothing changed.
    Debounced,
    /// Accepted but caused no capture activity.
    Ignored,
    /// Started a new capture.
    Started,
    /// Appended a duration at `index`.
    Recorded { index: usize, duration_us: u16 },
    /// Duration under the minimum pulse; dropped.
    TooShort { duration_us: u32 },
    /// Duration over the maximum pulse; dropped, capture continues.
    TooLong { duration_us: u32 },
    /// Duration over the maximum pulse with aborting enabled; session reset.
    Aborted { duration_us: u32 },
    /// Sequence full; the capture was finalized.
    Overflow { count: usize },
}

/// Edge handler bound to one session.
///
/// Holds only shared references, so it can live in a `static` and be called
/// from interrupt context.
pub struct EdgeCapturer<'a, const N: usize = MAX_TRANSITIONS> {
    session: &'a CaptureSession<N>,
    config: &'a EngineConfig,
    log: &'a LogStream,
}

impl<'a, const N: usize> EdgeCapturer<'a, N> {
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

    #[inline]
    pub fn session(&self) -> &'a CaptureSession<N> {
        self.session
    }

    /// Handle one transition of the receiver line.
    ///
    /// `level` is the line level after the transition (`true` = high).
    pub fn on_edge(&self, now_us: u32, level: bool) -> EdgeOutcome {
        let s = self.session;
        let p = self.config.capture_params();
        let counters = s.counters();

        if !s.debounce(now_us, p.debounce_us) {
            counters.record(Counter::Debounced);
            return EdgeOutcome::Debounced;
        }
        counters.record(Counter::Edges);

        let previous_edge = s.last_edge_us();
        s.set_last_edge(now_us, level);

        match s.phase() {
            CapturePhase::Idle => {
                let active = level != p.active_low;
                if active && s.is_armed() && s.begin(now_us) {
                    counters.record(Counter::Started);
                    isr_debug!(self.log, now_us, "capture started");
                    EdgeOutcome::Started
                } else {
                    EdgeOutcome::Ignored
                }
            }
            CapturePhase::Ready | CapturePhase::Finalizing => EdgeOutcome::Ignored,
            CapturePhase::Capturing => {
                let duration = now_us.wrapping_sub(previous_edge);
                self.classify(now_us, duration, &p)
            }
        }
    }

    fn classify(&self, now_us: u32, duration: u32, p: &CaptureParams) -> EdgeOutcome {
        let s = self.session;
        let counters = s.counters();

        if duration > p.max_pulse_us || duration > u16::MAX as u32 {
            counters.record(Counter::TooLong);
            if p.abort_on_long_pulse {
                s.abort();
                isr_warn!(self.log, now_us, "pulse too long: {}us, capture aborted", duration);
                return EdgeOutcome::Aborted {
                    duration_us: duration,
                };
            }
            isr_warn!(self.log, now_us, "pulse too long: {}us (max {}us)", duration, p.max_pulse_us);
            return EdgeOutcome::TooLong {
                duration_us: duration,
            };
        }

        if duration < p.min_pulse_us {
            counters.record(Counter::TooShort);
            return EdgeOutcome::TooShort {
                duration_us: duration,
            };
        }

        let duration_us = duration as u16;
        match s.append(duration_us) {
            Append::Stored(index) => {
                counters.record(Counter::Recorded);
                EdgeOutcome::Recorded { index, duration_us }
            }
            Append::Full => {
                if s.finalize(now_us).is_some() {
                    counters.record(Counter::Overflows);
                    isr_info!(self.log, now_us, "capture full at {} timings, finalized", N);
                }
                EdgeOutcome::Overflow { count: s.count() }
            }
        }
    }
}
