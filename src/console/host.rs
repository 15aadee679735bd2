//! Interface between console commands and the engine.

use crate::config::EngineConfig;
use crate::logging::LogStream;
use crate::pulse::SignalView;
use crate::session::SessionStatus;
use crate::stats::CounterSnapshot;
use crate::transmit::{Carrier, TransmitStats};

use super::ConsoleError;

/// What the console can see and do.
///
/// Implemented by `IrEngine`; tests use small fakes.
pub trait ConsoleHost {
    fn config(&self) -> &EngineConfig;

    fn log(&self) -> &LogStream;

    fn session_status(&self) -> SessionStatus;

    fn counters(&self) -> CounterSnapshot;

    /// Live receiver line level, when the platform can read it.
    fn receiver_level(&self) -> Option<bool> {
        None
    }

    fn bank_len(&self) -> usize;

    fn bank_capacity(&self) -> usize;

    /// Stored signal at `index` (0-based).
    fn signal(&self, index: usize) -> Option<SignalView<'_>>;

    /// Re-arm capture. Fails with `BankFull` when no slot is left.
    fn start(&mut self) -> Result<(), ConsoleError>;

    /// Begin a receiver wiring test of `seconds`; the verdict is logged.
    /// Returns the line level at the start, when readable.
    fn start_receiver_test(&mut self, seconds: u32) -> Result<Option<bool>, ConsoleError>;

    fn receiver_test_running(&self) -> bool;

    /// Reset the session, clear the bank, re-arm.
    fn reset(&mut self);

    /// Play stored signal `index` (0-based).
    fn send_stored(&mut self, index: usize, carrier: Carrier) -> Result<TransmitStats, ConsoleError>;

    /// Play a literal sequence.
    fn send_raw(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats;
}
