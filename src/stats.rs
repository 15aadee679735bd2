//! Capture counters.
//!
//! Every non-fatal condition on the capture path is counted here instead of
//! being treated as an error. Counters only ever grow; `snapshot()` gives the
//! console a consistent-enough copy for display.

use core::sync::atomic::{AtomicU32, Ordering};

/// Thread-safe capture statistics since boot.
///
/// Written from the edge ISR, the detector timer and the main loop.
///
/// # Usage
///
/// ```ignore
/// // In the edge ISR:
/// COUNTERS.record(Counter::Debounced);
///
/// // In the console:
/// let s = COUNTERS.snapshot();
/// writeln!(out, "frames: {}", s.frames);
/// ```
pub struct CaptureCounters {
    counts: [AtomicU32; Counter::COUNT],
}

/// Individual counter slots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(usize)]
pub enum Counter {
    /// Edges that passed the debounce gate.
    Edges = 0,
    /// Edges swallowed by debounce.
    Debounced,
    /// Captures started.
    Started,
    /// Durations appended to a sequence.
    Recorded,
    /// Durations below the minimum pulse.
    TooShort,
    /// Durations above the maximum pulse.
    TooLong,
    /// Sequences finalized by running out of capacity.
    Overflows,
    /// Sequences finalized by the silence detector.
    Frames,
    /// Sessions left hanging after the silence gap with too few durations.
    Stalls,
    /// Ready sequences discarded as noise at collection.
    Discarded,
    /// Sequences copied into the bank.
    Stored,
    /// Ready sequences dropped because the bank was full.
    RejectedFull,
}

impl Counter {
    pub const COUNT: usize = 12;
}

impl CaptureCounters {
    /// Create zeroed counters.
    pub const fn new() -> Self {
        const ZERO: AtomicU32 = AtomicU32::new(0);
        Self {
            counts: [ZERO; Counter::COUNT],
        }
    }

    /// Increment one counter.
    #[inline]
    pub fn record(&self, counter: Counter) {
        self.counts[counter as usize].fetch_add(1, Ordering::Relaxed);
    }

    /// Read one counter.
    #[inline]
    pub fn get(&self, counter: Counter) -> u32 {
        self.counts[counter as usize].load(Ordering::Relaxed)
    }

    /// Get a snapshot of all counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            edges: self.get(Counter::Edges),
            debounced: self.get(Counter::Debounced),
            started: self.get(Counter::Started),
            recorded: self.get(Counter::Recorded),
            too_short: self.get(Counter::TooShort),
            too_long: self.get(Counter::TooLong),
            overflows: self.get(Counter::Overflows),
            frames: self.get(Counter::Frames),
            stalls: self.get(Counter::Stalls),
            discarded: self.get(Counter::Discarded),
            stored: self.get(Counter::Stored),
            rejected_full: self.get(Counter::RejectedFull),
        }
    }
}

impl Default for CaptureCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters at a point in time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub edges: u32,
    pub debounced: u32,
    pub started: u32,
    pub recorded: u32,
    pub too_short: u32,
    pub too_long: u32,
    pub overflows: u32,
    pub frames: u32,
    pub stalls: u32,
    pub discarded: u32,
    pub stored: u32,
    pub rejected_full: u32,
}
