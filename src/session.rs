//! Module: session
//!
//! Purpose: The single in-flight capture, shared between the edge ISR, the
//! detector timer and the main loop.
//!
//! Architecture:
//! ```text
//!   Edge ISR ──┐                         ┌──▶ main loop (copy-out)
//!              ├──▶ [CaptureSession] ────┤
//!   Timer ─────┘     all atomics         └──▶ console (status)
//! ```
//!
//! Publication rules:
//! - Duration slots are written `Relaxed`, then `count` is stored `Release`
//! - Phase changes are compare-exchange; a finalize claims the session by
//!   moving it to `Finalizing`, stores the span, then publishes `Ready` with
//!   `Release`
//! - A reader that sees `Ready` with `Acquire` may copy the durations; the
//!   capturer no longer writes them until the session is back to `Idle`
//!
//! Safety: Safe. No unsafe blocks.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, AtomicU8, Ordering};

use crate::config::MAX_TRANSITIONS;
use crate::pulse::PulseSequence;
use crate::stats::CaptureCounters;

/// Capture lifecycle: `Idle -> Capturing -> Finalizing -> Ready -> Idle`.
///
/// `Finalizing` is held only for the duration of one `finalize` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CapturePhase {
    Idle = 0,
    Capturing = 1,
    Ready = 2,
    Finalizing = 3,
}

impl CapturePhase {
    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            1 => CapturePhase::Capturing,
            2 => CapturePhase::Ready,
            3 => CapturePhase::Finalizing,
            _ => CapturePhase::Idle,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Capturing => "capturing",
            CapturePhase::Ready => "ready",
            CapturePhase::Finalizing => "finalizing",
        }
    }
}

/// Result of appending one duration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Append {
    /// Stored at this index.
    Stored(usize),
    /// No room left.
    Full,
}

/// Point-in-time view for the console.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionStatus {
    pub phase: CapturePhase,
    pub armed: bool,
    pub count: usize,
    pub capacity: usize,
    pub stall_reported: bool,
    pub last_level: bool,
    pub total_duration_ms: u32,
}

/// In-flight capture state.
///
/// All timestamps are wrapping microseconds; differences use `wrapping_sub`.
pub struct CaptureSession<const N: usize = MAX_TRANSITIONS> {
    durations: [AtomicU16; N],
    count: AtomicU32,
    phase: AtomicU8,
    last_edge_us: AtomicU32,
    last_debounce_us: AtomicU32,
    edge_seen: AtomicBool,
    session_start_us: AtomicU32,
    total_duration_ms: AtomicU32,
    last_level: AtomicBool,
    armed: AtomicBool,
    stall_reported: AtomicBool,
    counters: CaptureCounters,
}

impl<const N: usize> CaptureSession<N> {
    /// Create an idle, armed session (receiver line idle high).
    pub const fn new() -> Self {
        assert!(N > 0 && N <= u32::MAX as usize, "capacity must fit in u32");

        const ZERO: AtomicU16 = AtomicU16::new(0);

        Self {
            durations: [ZERO; N],
            count: AtomicU32::new(0),
            phase: AtomicU8::new(CapturePhase::Idle as u8),
            last_edge_us: AtomicU32::new(0),
            last_debounce_us: AtomicU32::new(0),
            edge_seen: AtomicBool::new(false),
            session_start_us: AtomicU32::new(0),
            total_duration_ms: AtomicU32::new(0),
            last_level: AtomicBool::new(true),
            armed: AtomicBool::new(true),
            stall_reported: AtomicBool::new(false),
            counters: CaptureCounters::new(),
        }
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn phase(&self) -> CapturePhase {
        CapturePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.phase() == CapturePhase::Ready
    }

    /// Durations recorded so far.
    #[inline]
    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire) as usize
    }

    #[inline]
    pub fn counters(&self) -> &CaptureCounters {
        &self.counters
    }

    // ------------------------------------------------------------------
    // Arming
    // ------------------------------------------------------------------

    /// Whether a new capture may start.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn arm(&self) {
        self.armed.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Relaxed);
    }

    // ------------------------------------------------------------------
    // Edge bookkeeping (capturer)
    // ------------------------------------------------------------------

    #[inline]
    pub fn last_debounce_us(&self) -> u32 {
        self.last_debounce_us.load(Ordering::Relaxed)
    }

    /// Debounce gate. Returns `false` if `now_us` is within `window_us` of
    /// the previous accepted edge, otherwise accepts it and returns `true`.
    ///
    /// The very first edge is always accepted.
    #[inline]
    pub fn debounce(&self, now_us: u32, window_us: u32) -> bool {
        if self.edge_seen.load(Ordering::Relaxed)
            && now_us.wrapping_sub(self.last_debounce_us()) < window_us
        {
            return false;
        }
        self.last_debounce_us.store(now_us, Ordering::Relaxed);
        self.edge_seen.store(true, Ordering::Relaxed);
        true
    }

    #[inline]
    pub fn last_edge_us(&self) -> u32 {
        self.last_edge_us.load(Ordering::Acquire)
    }

    #[inline]
    pub fn last_level(&self) -> bool {
        self.last_level.load(Ordering::Relaxed)
    }

    /// Record the latest accepted edge.
    #[inline]
    pub fn set_last_edge(&self, now_us: u32, level: bool) {
        self.last_level.store(level, Ordering::Relaxed);
        self.last_edge_us.store(now_us, Ordering::Release);
    }

    #[inline]
    pub fn session_start_us(&self) -> u32 {
        self.session_start_us.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn total_duration_ms(&self) -> u32 {
        self.total_duration_ms.load(Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    /// `Idle -> Capturing`. Returns `false` if the session was not idle.
    ///
    /// Only the capturer leaves `Idle`, so the clearing stores below cannot
    /// land on a frame that is waiting for collection.
    pub fn begin(&self, now_us: u32) -> bool {
        if self.phase() != CapturePhase::Idle {
            return false;
        }
        self.count.store(0, Ordering::Relaxed);
        self.total_duration_ms.store(0, Ordering::Relaxed);
        self.session_start_us.store(now_us, Ordering::Relaxed);
        self.stall_reported.store(false, Ordering::Relaxed);
        self.phase
            .compare_exchange(
                CapturePhase::Idle as u8,
                CapturePhase::Capturing as u8,
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    /// Append one duration (single producer: the capturer).
    pub fn append(&self, duration_us: u16) -> Append {
        let idx = self.count.load(Ordering::Relaxed) as usize;
        if idx >= N {
            return Append::Full;
        }
        self.durations[idx].store(duration_us, Ordering::Relaxed);
        self.count.store(idx as u32 + 1, Ordering::Release);
        Append::Stored(idx)
    }

    /// `Capturing -> Ready`, computing the span from `session_start_us`.
    ///
    /// Returns the span in milliseconds, or `None` if the session was not
    /// capturing (the other context finalized first, or a reset won). A
    /// losing call never touches the published span.
    pub fn finalize(&self, now_us: u32) -> Option<u32> {
        self.phase
            .compare_exchange(
                CapturePhase::Capturing as u8,
                CapturePhase::Finalizing as u8,
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .ok()?;
        let total_ms = now_us.wrapping_sub(self.session_start_us()) / 1000;
        self.total_duration_ms.store(total_ms, Ordering::Relaxed);
        self.phase
            .compare_exchange(
                CapturePhase::Finalizing as u8,
                CapturePhase::Ready as u8,
                Ordering::Release,
                Ordering::Relaxed,
            )
            .ok()
            .map(|_| total_ms)
    }

    /// `Capturing -> Idle`, dropping what was recorded.
    pub fn abort(&self) -> bool {
        let aborted = self
            .phase
            .compare_exchange(
                CapturePhase::Capturing as u8,
                CapturePhase::Idle as u8,
                Ordering::AcqRel,
                Ordering::Relaxed,
            )
            .is_ok();
        if aborted {
            self.count.store(0, Ordering::Relaxed);
        }
        aborted
    }

    /// Any phase to `Idle`, clearing the in-flight sequence.
    ///
    /// Races benignly with the capturer: at worst one edge lands in or
    /// misses the cleared sequence.
    pub fn reset(&self) {
        self.count.store(0, Ordering::Relaxed);
        self.total_duration_ms.store(0, Ordering::Relaxed);
        self.stall_reported.store(false, Ordering::Relaxed);
        self.phase.store(CapturePhase::Idle as u8, Ordering::Release);
    }

    /// Flag the current capture as stalled.
    ///
    /// Returns `true` only the first time per capture, and never once the
    /// session has left `Capturing` (a reset between the silence check and
    /// this call must not leave an idle session flagged).
    pub fn mark_stalled(&self) -> bool {
        if self.phase() != CapturePhase::Capturing {
            return false;
        }
        let first = !self.stall_reported.swap(true, Ordering::Relaxed);
        if self.phase() != CapturePhase::Capturing {
            self.stall_reported.store(false, Ordering::Relaxed);
            return false;
        }
        first
    }

    /// Whether the in-flight capture has been reported as stalled.
    #[inline]
    pub fn is_stalled(&self) -> bool {
        self.stall_reported.load(Ordering::Relaxed) && self.phase() == CapturePhase::Capturing
    }

    // ------------------------------------------------------------------
    // Consumer side
    // ------------------------------------------------------------------

    /// Copy a `Ready` sequence into `out`.
    ///
    /// Returns `false` (leaving `out` untouched) unless the phase is `Ready`.
    pub fn copy_ready(&self, out: &mut PulseSequence<N>) -> bool {
        if !self.is_ready() {
            return false;
        }
        *out = PulseSequence::EMPTY;
        let count = self.count().min(N);
        for slot in &self.durations[..count] {
            out.push(slot.load(Ordering::Relaxed));
        }
        out.finalize(self.total_duration_ms());
        true
    }

    /// Durations recorded so far, copied into `out`. Returns the number copied.
    ///
    /// Intended for diagnostics while capturing; the copy is not atomic as a
    /// whole.
    pub fn peek(&self, out: &mut [u16]) -> usize {
        let count = self.count().min(N).min(out.len());
        for (dst, src) in out.iter_mut().zip(&self.durations[..count]) {
            *dst = src.load(Ordering::Relaxed);
        }
        count
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phase(),
            armed: self.is_armed(),
            count: self.count(),
            capacity: N,
            stall_reported: self.is_stalled(),
            last_level: self.last_level(),
            total_duration_ms: self.total_duration_ms(),
        }
    }
}

impl<const N: usize> Default for CaptureSession<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_idle_and_armed() {
        let s = CaptureSession::<8>::new();
        assert_eq!(s.phase(), CapturePhase::Idle);
        assert!(s.is_armed());
        assert_eq!(s.count(), 0);
        assert!(s.last_level());
    }

    #[test]
    fn test_debounce_gate() {
        let s = CaptureSession::<8>::new();
        assert!(s.debounce(0, 20));
        assert!(!s.debounce(19, 20));
        assert!(s.debounce(20, 20));
        assert_eq!(s.last_debounce_us(), 20);
        assert!(s.debounce(u32::MAX, 20));
        assert!(!s.debounce(5, 20));
    }

    #[test]
    fn test_begin_only_from_idle() {
        let s = CaptureSession::<8>::new();
        assert!(s.begin(100));
        assert_eq!(s.phase(), CapturePhase::Capturing);
        assert!(!s.begin(200));
        assert_eq!(s.session_start_us(), 100);
    }

    #[test]
    fn test_append_until_full() {
        let s = CaptureSession::<2>::new();
        s.begin(0);
        assert_eq!(s.append(500), Append::Stored(0));
        assert_eq!(s.append(600), Append::Stored(1));
        assert_eq!(s.append(700), Append::Full);
        assert_eq!(s.count(), 2);
    }

    #[test]
    fn test_finalize_and_copy() {
        let s = CaptureSession::<8>::new();
        s.begin(1_000);
        s.append(9000);
        s.append(4500);
        assert_eq!(s.finalize(15_500), Some(14));
        assert_eq!(s.finalize(16_000), None);

        let mut seq = PulseSequence::<8>::EMPTY;
        assert!(s.copy_ready(&mut seq));
        assert_eq!(seq.durations(), &[9000, 4500]);
        assert_eq!(seq.total_duration_ms(), 14);
        assert!(seq.is_complete());
    }

    #[test]
    fn test_late_finalize_keeps_published_span() {
        let s = CaptureSession::<8>::new();
        s.begin(0);
        s.append(420);
        assert_eq!(s.finalize(20_000), Some(20));
        assert_eq!(s.finalize(90_000), None);
        assert_eq!(s.total_duration_ms(), 20);

        let mut seq = PulseSequence::<8>::EMPTY;
        assert!(s.copy_ready(&mut seq));
        assert_eq!(seq.total_duration_ms(), 20);
    }

    #[test]
    fn test_finalize_on_idle_leaves_span_alone() {
        let s = CaptureSession::<8>::new();
        assert_eq!(s.finalize(70_000), None);
        assert_eq!(s.total_duration_ms(), 0);
        assert_eq!(s.phase(), CapturePhase::Idle);
        assert_eq!(CapturePhase::Finalizing.as_str(), "finalizing");
    }

    #[test]
    fn test_ready_frame_not_overwritten_by_begin() {
        let s = CaptureSession::<8>::new();
        s.begin(0);
        s.append(1234);
        s.finalize(20_000);
        assert!(!s.begin(30_000));
        assert_eq!(s.count(), 1);
    }

    #[test]
    fn test_copy_requires_ready() {
        let s = CaptureSession::<8>::new();
        s.begin(0);
        s.append(1);
        let mut seq = PulseSequence::<8>::EMPTY;
        assert!(!s.copy_ready(&mut seq));
        assert!(seq.is_empty());
    }

    #[test]
    fn test_stall_reported_once_per_capture() {
        let s = CaptureSession::<8>::new();
        s.begin(0);
        assert!(s.mark_stalled());
        assert!(!s.mark_stalled());
        s.reset();
        s.begin(100);
        assert!(s.mark_stalled());
    }

    #[test]
    fn test_stall_needs_capturing() {
        let s = CaptureSession::<8>::new();
        assert!(!s.mark_stalled());
        assert!(!s.is_stalled());

        s.begin(0);
        s.append(10);
        assert!(s.mark_stalled());
        s.reset();
        assert!(!s.mark_stalled());
        assert!(!s.status().stall_reported);
    }

    #[test]
    fn test_reset_from_any_phase() {
        let s = CaptureSession::<8>::new();
        s.begin(0);
        s.append(10);
        s.finalize(50_000);
        s.reset();
        assert_eq!(s.phase(), CapturePhase::Idle);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_abort() {
        let s = CaptureSession::<8>::new();
        assert!(!s.abort());
        s.begin(0);
        s.append(10);
        assert!(s.abort());
        assert_eq!(s.phase(), CapturePhase::Idle);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_ready_published_to_other_thread() {
        use std::sync::Arc;
        use std::thread;

        let s = Arc::new(CaptureSession::<64>::new());
        let producer = {
            let s = Arc::clone(&s);
            thread::spawn(move || {
                s.begin(0);
                for i in 0..64u16 {
                    s.append(100 + i);
                }
                s.finalize(100_000);
            })
        };

        let mut seq = PulseSequence::<64>::EMPTY;
        while !s.copy_ready(&mut seq) {
            std::hint::spin_loop();
        }
        producer.join().unwrap();

        assert_eq!(seq.len(), 64);
        assert!(seq.durations().iter().enumerate().all(|(i, &d)| d == 100 + i as u16));
    }
}
