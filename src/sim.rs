//! Simulated timeline for host tests and the host demo.
//!
//! Everything here is `no_std` and allocation free so the same helpers back
//! the integration tests and the host build of the binary.
//!
//! - `SimClock`: nanosecond timeline, read as wrapping microseconds
//! - `SimDelay`: `DelayNs` that advances the clock instead of sleeping
//! - `SimTrace` / `SimPin`: `OutputPin` recording level transitions
//! - `drive_edges`: play a relative edge timeline through capturer and
//!   detector, ticking the detector on its real period
//! - `demodulate`: turn a carrier trace into receiver envelope edges

use core::cell::{Cell, RefCell};
use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::capture::{EdgeCapturer, EdgeOutcome};
use crate::config::DETECTOR_PERIOD_MS;
use crate::detector::{FrameDetector, TickOutcome};
use crate::hal::Clock;

/// Detector period in microseconds.
const TICK_US: u64 = DETECTOR_PERIOD_MS as u64 * 1000;

/// Manually advanced clock.
#[derive(Debug, Default)]
pub struct SimClock {
    now_ns: Cell<u64>,
}

impl SimClock {
    pub const fn new() -> Self {
        Self { now_ns: Cell::new(0) }
    }

    /// Clock starting at `start_us`.
    pub const fn starting_at(start_us: u64) -> Self {
        Self {
            now_ns: Cell::new(start_us * 1000),
        }
    }

    #[inline]
    pub fn now_ns(&self) -> u64 {
        self.now_ns.get()
    }

    /// Full-width microseconds (never wraps).
    #[inline]
    pub fn now_us_wide(&self) -> u64 {
        self.now_ns.get() / 1000
    }

    #[inline]
    pub fn advance_ns(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    #[inline]
    pub fn advance_us(&self, us: u64) {
        self.advance_ns(us * 1000);
    }

    /// Jump forward to `us`; never moves backwards.
    pub fn advance_to_us(&self, us: u64) {
        let target = us * 1000;
        if target > self.now_ns.get() {
            self.now_ns.set(target);
        }
    }
}

impl Clock for SimClock {
    #[inline]
    fn now_us(&self) -> u32 {
        self.now_us_wide() as u32
    }
}

/// Delay provider that moves the simulated clock.
pub struct SimDelay<'a> {
    clock: &'a SimClock,
}

impl<'a> SimDelay<'a> {
    pub fn new(clock: &'a SimClock) -> Self {
        Self { clock }
    }
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance_ns(ns as u64);
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance_us(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance_us(ms as u64 * 1000);
    }
}

struct TraceBuf<const M: usize> {
    edges: [(u32, bool); M],
    len: usize,
    overflowed: bool,
}

/// Fixed-capacity record of output level changes.
///
/// Starts low. Writes that do not change the level are not recorded.
pub struct SimTrace<const M: usize = 4096> {
    buf: RefCell<TraceBuf<M>>,
    level: Cell<bool>,
}

impl<const M: usize> SimTrace<M> {
    pub const fn new() -> Self {
        Self {
            buf: RefCell::new(TraceBuf {
                edges: [(0, false); M],
                len: 0,
                overflowed: false,
            }),
            level: Cell::new(false),
        }
    }

    fn record(&self, time_us: u32, level: bool) {
        if self.level.replace(level) == level {
            return;
        }
        let mut buf = self.buf.borrow_mut();
        if buf.len < M {
            let len = buf.len;
            buf.edges[len] = (time_us, level);
            buf.len += 1;
        } else {
            buf.overflowed = true;
        }
    }

    /// Current level.
    #[inline]
    pub fn level(&self) -> bool {
        self.level.get()
    }

    pub fn len(&self) -> usize {
        self.buf.borrow().len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if transitions were lost to the capacity limit.
    pub fn overflowed(&self) -> bool {
        self.buf.borrow().overflowed
    }

    /// Transition `index` as `(time_us, new_level)`.
    pub fn get(&self, index: usize) -> Option<(u32, bool)> {
        let buf = self.buf.borrow();
        buf.edges[..buf.len].get(index).copied()
    }

    /// Time of the most recent transition.
    pub fn last_time_us(&self) -> Option<u32> {
        let len = self.len();
        len.checked_sub(1).and_then(|i| self.get(i)).map(|(t, _)| t)
    }

    /// All transitions in order.
    pub fn edges(&self) -> impl Iterator<Item = (u32, bool)> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// Rising edges only.
    pub fn rising_edges(&self) -> impl Iterator<Item = u32> + '_ {
        self.edges().filter(|&(_, level)| level).map(|(t, _)| t)
    }

    pub fn clear(&self) {
        let mut buf = self.buf.borrow_mut();
        buf.len = 0;
        buf.overflowed = false;
        self.level.set(false);
    }
}

impl<const M: usize> Default for SimTrace<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Output pin writing into a `SimTrace`, timestamped by a `SimClock`.
pub struct SimPin<'a, const M: usize = 4096> {
    trace: &'a SimTrace<M>,
    clock: &'a SimClock,
    write_cost_ns: u64,
}

impl<'a, const M: usize> SimPin<'a, M> {
    pub fn new(trace: &'a SimTrace<M>, clock: &'a SimClock) -> Self {
        Self {
            trace,
            clock,
            write_cost_ns: 0,
        }
    }

    /// Charge `ns` of simulated time for every pin write.
    pub fn with_write_cost(mut self, ns: u64) -> Self {
        self.write_cost_ns = ns;
        self
    }

    fn write(&mut self, level: bool) {
        self.trace.record(self.clock.now_us(), level);
        self.clock.advance_ns(self.write_cost_ns);
    }
}

impl<const M: usize> ErrorType for SimPin<'_, M> {
    type Error = Infallible;
}

impl<const M: usize> OutputPin for SimPin<'_, M> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

/// Advance `clock` by `delta_us`, ticking `detector` at every detector
/// period boundary crossed on the way. Returns the last tick outcome.
pub fn run_for<const N: usize>(
    clock: &SimClock,
    detector: &FrameDetector<'_, N>,
    delta_us: u64,
) -> TickOutcome {
    let target = clock.now_us_wide() + delta_us;
    let mut last = TickOutcome::Inactive;
    loop {
        let next_tick = (clock.now_us_wide() / TICK_US + 1) * TICK_US;
        if next_tick > target {
            break;
        }
        clock.advance_to_us(next_tick);
        last = detector.tick(clock.now_us());
    }
    clock.advance_to_us(target);
    last
}

/// Play `(delta_us, level)` edges through `capturer`, each `delta_us` after
/// the previous one, with the detector ticking in between.
///
/// `on_edge` sees every outcome, in order.
pub fn drive_edges<const N: usize>(
    clock: &SimClock,
    capturer: &EdgeCapturer<'_, N>,
    detector: &FrameDetector<'_, N>,
    edges: &[(u32, bool)],
    mut on_edge: impl FnMut(EdgeOutcome),
) {
    for &(delta_us, level) in edges {
        run_for(clock, detector, delta_us as u64);
        on_edge(capturer.on_edge(clock.now_us(), level));
    }
}

/// Recover the receiver envelope from a carrier trace.
///
/// A burst starts at a rising edge and ends at the last falling edge that
/// is not followed by another rising edge within `max_gap_us`. Calls
/// `emit(time_us, level)` for each envelope transition, with the active
/// level low when `active_low` is set.
pub fn demodulate<const M: usize>(
    trace: &SimTrace<M>,
    max_gap_us: u32,
    active_low: bool,
    mut emit: impl FnMut(u32, bool),
) {
    let mut in_burst = false;
    let mut last_fall: Option<u32> = None;

    for (t, level) in trace.edges() {
        if level {
            match (in_burst, last_fall) {
                (false, _) => {
                    emit(t, !active_low);
                    in_burst = true;
                }
                (true, Some(fall)) if t.wrapping_sub(fall) > max_gap_us => {
                    emit(fall, active_low);
                    emit(t, !active_low);
                }
                _ => {}
            }
            last_fall = None;
        } else {
            last_fall = Some(t);
        }
    }

    if let (true, Some(fall)) = (in_burst, last_fall) {
        emit(fall, active_low);
    }
}
