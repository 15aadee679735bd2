//! Module: bank
//!
//! Purpose: Bounded, append-only store of completed captures.
//!
//! Main loop only. A sequence enters the bank only after the session reached
//! `Ready`; every collection (stored or not) returns the session to `Idle`.
//! No eviction: once full, further frames are discarded until `clear()`.

use crate::config::{MAX_SIGNALS, MAX_TRANSITIONS};
use crate::pulse::{Label, PulseSequence};
use crate::session::CaptureSession;
use crate::stats::Counter;

/// Result of `SignalBank::try_collect`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollectOutcome {
    /// Session not ready; nothing done.
    NotReady,
    /// Ready frame was too short to be a real signal.
    Discarded { count: usize },
    /// Ready frame dropped because every slot is taken.
    Full,
    /// Stored at `index` (0-based).
    Stored { index: usize },
}

/// Completed captures, oldest first.
pub struct SignalBank<const N: usize = MAX_TRANSITIONS, const B: usize = MAX_SIGNALS> {
    slots: [PulseSequence<N>; B],
    len: usize,
}

impl<const N: usize, const B: usize> SignalBank<N, B> {
    pub const fn new() -> Self {
        Self {
            slots: [PulseSequence::EMPTY; B],
            len: 0,
        }
    }

    /// Move a `Ready` capture into the bank.
    ///
    /// `min_valid_count`: frames with this many durations or fewer are noise.
    pub fn try_collect(
        &mut self,
        session: &CaptureSession<N>,
        min_valid_count: u16,
    ) -> CollectOutcome {
        if !session.is_ready() {
            return CollectOutcome::NotReady;
        }

        let count = session.count();
        let outcome = if count <= min_valid_count as usize {
            session.counters().record(Counter::Discarded);
            CollectOutcome::Discarded { count }
        } else if self.is_full() {
            session.counters().record(Counter::RejectedFull);
            CollectOutcome::Full
        } else {
            let index = self.len;
            let slot = &mut self.slots[index];
            if session.copy_ready(slot) {
                slot.set_label(Label::numbered(index + 1));
                self.len += 1;
                session.counters().record(Counter::Stored);
                CollectOutcome::Stored { index }
            } else {
                // Reset raced in between; nothing to keep.
                CollectOutcome::NotReady
            }
        };

        session.reset();
        outcome
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len >= B
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        B
    }

    /// Stored sequence at `index` (0-based).
    pub fn get(&self, index: usize) -> Option<&PulseSequence<N>> {
        self.slots[..self.len].get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PulseSequence<N>> {
        self.slots[..self.len].iter()
    }

    /// Forget every stored sequence.
    pub fn clear(&mut self) {
        for slot in &mut self.slots[..self.len] {
            *slot = PulseSequence::EMPTY;
        }
        self.len = 0;
    }
}

impl<const N: usize, const B: usize> Default for SignalBank<N, B> {
    fn default() -> Self {
        Self::new()
    }
}
