//! Module: engine
//!
//! Purpose: Main-loop side of the capture and replay engine.
//!
//! Architecture:
//! ```text
//!   Edge ISR ──▶ EdgeCapturer ──┐
//!                               ├──▶ CaptureSession (shared, atomics)
//!   Timer ────▶ FrameDetector ──┘            │
//!                                            ▼ poll()
//!   Main loop ──▶ IrEngine ──▶ SignalBank (owned)
//!                    │
//!                    └──▶ Transmit (busy-wait, main loop only)
//! ```
//!
//! The ISR and timer parts hold shared references to the same session and
//! configuration; `IrEngine` is the only owner of the bank and the
//! transmitter. No globals here: the firmware binary owns the statics.

use crate::bank::{CollectOutcome, SignalBank};
use crate::config::{EngineConfig, MAX_SIGNALS, MAX_TRANSITIONS};
use crate::console::{ConsoleError, ConsoleHost};
use crate::logging::LogStream;
use crate::pulse::{PulseSequence, SignalView};
use crate::session::{CaptureSession, SessionStatus};
use crate::stats::{CaptureCounters, Counter, CounterSnapshot};
use crate::transmit::{Carrier, Transmit, TransmitStats};
use crate::{log_info, log_warn};

/// Longest receiver wiring test, in seconds.
pub const MAX_RECEIVER_TEST_S: u32 = 60;

/// A running receiver wiring test.
#[derive(Clone, Copy, Debug)]
struct ReceiverTest {
    started_us: u32,
    seconds: u32,
    edges_at_start: u32,
}

/// Result of a finished receiver wiring test.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiverReport {
    pub seconds: u32,
    pub changes: u32,
}

/// Every level change the ISR saw, debounced or not.
fn edges_seen(counters: &CaptureCounters) -> u32 {
    counters
        .get(Counter::Edges)
        .wrapping_add(counters.get(Counter::Debounced))
}

/// Main-loop engine context.
pub struct IrEngine<'a, T, const N: usize = MAX_TRANSITIONS, const B: usize = MAX_SIGNALS> {
    session: &'a CaptureSession<N>,
    config: &'a EngineConfig,
    log: &'a LogStream,
    bank: SignalBank<N, B>,
    transmitter: T,
    receiver_level: Option<fn() -> bool>,
    receiver_test: Option<ReceiverTest>,
    now_us: u32,
}

impl<'a, T: Transmit, const N: usize, const B: usize> IrEngine<'a, T, N, B> {
    pub fn new(
        session: &'a CaptureSession<N>,
        config: &'a EngineConfig,
        log: &'a LogStream,
        transmitter: T,
    ) -> Self {
        Self {
            session,
            config,
            log,
            bank: SignalBank::new(),
            transmitter,
            receiver_level: None,
            receiver_test: None,
            now_us: 0,
        }
    }

    /// Let `status` show the live receiver line.
    pub fn with_receiver_level(mut self, read: fn() -> bool) -> Self {
        self.receiver_level = Some(read);
        self
    }

    /// One main-loop pass: move a finished capture into the bank and
    /// complete a receiver test whose time is up.
    pub fn poll(&mut self, now_us: u32) -> CollectOutcome {
        self.now_us = now_us;
        self.poll_receiver_test(now_us);
        let outcome = self
            .bank
            .try_collect(self.session, self.config.min_valid_count());

        match outcome {
            CollectOutcome::NotReady => {}
            CollectOutcome::Discarded { count } => {
                log_warn!(self.log, now_us, "signal discarded: only {} timings", count);
            }
            CollectOutcome::Full => {
                self.session.disarm();
                log_warn!(self.log, now_us, "signal bank full, frame dropped");
            }
            CollectOutcome::Stored { index } => {
                if let Some(seq) = self.bank.get(index) {
                    log_info!(
                        self.log,
                        now_us,
                        "stored {}: {} timings, {}ms ({}/{})",
                        seq.label(),
                        seq.len(),
                        seq.total_duration_ms(),
                        self.bank.len(),
                        B
                    );
                }
                if self.bank.is_full() {
                    self.session.disarm();
                    log_info!(self.log, now_us, "signal bank full, capture disarmed");
                }
            }
        }
        outcome
    }

    /// Start counting receiver level changes for `seconds`.
    ///
    /// Returns the line level at the start when the platform can read it.
    pub fn start_receiver_test(&mut self, seconds: u32) -> Result<Option<bool>, ConsoleError> {
        if seconds == 0 || seconds > MAX_RECEIVER_TEST_S {
            return Err(ConsoleError::OutOfRange);
        }
        self.receiver_test = Some(ReceiverTest {
            started_us: self.now_us,
            seconds,
            edges_at_start: edges_seen(self.session.counters()),
        });
        log_info!(self.log, self.now_us, "receiver test: watching for {}s", seconds);
        Ok(self.receiver_level.map(|read| read()))
    }

    #[inline]
    pub fn receiver_test_running(&self) -> bool {
        self.receiver_test.is_some()
    }

    fn poll_receiver_test(&mut self, now_us: u32) -> Option<ReceiverReport> {
        let test = self.receiver_test?;
        if now_us.wrapping_sub(test.started_us) < test.seconds * 1_000_000 {
            return None;
        }
        self.receiver_test = None;

        let changes = edges_seen(self.session.counters()).wrapping_sub(test.edges_at_start);
        if changes == 0 {
            log_warn!(
                self.log,
                now_us,
                "receiver test: no changes detected in {}s, check wiring",
                test.seconds
            );
        } else {
            log_info!(
                self.log,
                now_us,
                "receiver test: {} changes in {}s, receiver ok",
                changes,
                test.seconds
            );
        }
        Some(ReceiverReport {
            seconds: test.seconds,
            changes,
        })
    }

    /// Re-arm capture. Refused when the bank has no free slot.
    pub fn arm(&mut self) -> Result<(), ConsoleError> {
        if self.bank.is_full() {
            return Err(ConsoleError::BankFull);
        }
        self.session.arm();
        Ok(())
    }

    /// Operator reset: session back to `Idle`, bank cleared, capture armed.
    pub fn reset(&mut self) {
        self.session.reset();
        self.bank.clear();
        self.session.arm();
        log_info!(self.log, self.now_us, "reset: session and bank cleared");
    }

    #[inline]
    pub fn bank(&self) -> &SignalBank<N, B> {
        &self.bank
    }

    #[inline]
    pub fn session(&self) -> &'a CaptureSession<N> {
        self.session
    }

    #[inline]
    pub fn transmitter(&mut self) -> &mut T {
        &mut self.transmitter
    }

    /// Play stored signal `index` (0-based).
    pub fn transmit_stored(
        &mut self,
        index: usize,
        carrier: Carrier,
    ) -> Option<TransmitStats> {
        let seq: &PulseSequence<N> = self.bank.get(index)?;
        Some(self.transmitter.transmit(seq.durations(), carrier))
    }

    /// Play a literal sequence.
    pub fn transmit_raw(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats {
        self.transmitter.transmit(durations, carrier)
    }
}

impl<T: Transmit, const N: usize, const B: usize> ConsoleHost for IrEngine<'_, T, N, B> {
    fn config(&self) -> &EngineConfig {
        self.config
    }

    fn log(&self) -> &LogStream {
        self.log
    }

    fn session_status(&self) -> SessionStatus {
        self.session.status()
    }

    fn counters(&self) -> CounterSnapshot {
        self.session.counters().snapshot()
    }

    fn receiver_level(&self) -> Option<bool> {
        self.receiver_level.map(|read| read())
    }

    fn bank_len(&self) -> usize {
        self.bank.len()
    }

    fn bank_capacity(&self) -> usize {
        self.bank.capacity()
    }

    fn signal(&self, index: usize) -> Option<SignalView<'_>> {
        self.bank.get(index).map(|seq| seq.view())
    }

    fn start(&mut self) -> Result<(), ConsoleError> {
        self.arm()
    }

    fn start_receiver_test(&mut self, seconds: u32) -> Result<Option<bool>, ConsoleError> {
        IrEngine::start_receiver_test(self, seconds)
    }

    fn receiver_test_running(&self) -> bool {
        self.receiver_test.is_some()
    }

    fn reset(&mut self) {
        IrEngine::reset(self)
    }

    fn send_stored(&mut self, index: usize, carrier: Carrier) -> Result<TransmitStats, ConsoleError> {
        self.transmit_stored(index, carrier)
            .ok_or(ConsoleError::NoSuchSignal)
    }

    fn send_raw(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats {
        self.transmit_raw(durations, carrier)
    }
}
