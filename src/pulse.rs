//! Module: pulse
//!
//! Purpose: Raw pulse sequence types. A sequence is an ordered list of
//! microsecond durations that alternate mark (carrier on) and space
//! (carrier off), always starting with a mark.
//!
//! Architecture:
//! - `PulseSequence<N>`: owned, fixed-capacity snapshot stored in the bank
//! - `SignalView`: borrowed, capacity-erased view used by console and render
//! - `Label`: fixed-size display name, no allocation
//!
//! Safety: Safe. No unsafe blocks.

use core::fmt::Write;

use crate::config::MAX_TRANSITIONS;

/// Phase of one duration inside a sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Carrier on.
    Mark,
    /// Carrier off.
    Space,
}

impl Phase {
    /// Phase of the duration at `index`: even is mark, odd is space.
    #[inline]
    pub const fn of_index(index: usize) -> Self {
        if index % 2 == 0 {
            Phase::Mark
        } else {
            Phase::Space
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Mark => "ON",
            Phase::Space => "OFF",
        }
    }
}

/// Maximum label length in bytes.
pub const LABEL_LEN: usize = 32;

/// Fixed-size display name.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Label {
    buf: [u8; LABEL_LEN],
    len: u8,
}

impl Label {
    pub const EMPTY: Self = Self {
        buf: [0; LABEL_LEN],
        len: 0,
    };

    /// Label from a string, truncated to `LABEL_LEN` bytes.
    pub fn new(text: &str) -> Self {
        let mut label = Self::EMPTY;
        let _ = label.write_str(text);
        label
    }

    /// Bank label for the `number`-th stored signal (1-based).
    pub fn numbered(number: usize) -> Self {
        let mut label = Self::EMPTY;
        let _ = write!(label, "SIGNAL_RAW_{}", number);
        label
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len as usize]).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Write for Label {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        for c in s.chars() {
            let mut utf8 = [0u8; 4];
            let bytes = c.encode_utf8(&mut utf8).as_bytes();
            let len = self.len as usize;
            if len + bytes.len() > LABEL_LEN {
                break;
            }
            self.buf[len..len + bytes.len()].copy_from_slice(bytes);
            self.len += bytes.len() as u8;
        }
        Ok(())
    }
}

impl core::fmt::Debug for Label {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

impl core::fmt::Display for Label {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured (or literal) raw IR sequence.
///
/// `durations[..count]` is valid; entry 0 is always a mark.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PulseSequence<const N: usize = MAX_TRANSITIONS> {
    durations: [u16; N],
    count: usize,
    total_duration_ms: u32,
    complete: bool,
    label: Label,
}

impl<const N: usize> PulseSequence<N> {
    pub const EMPTY: Self = Self {
        durations: [0; N],
        count: 0,
        total_duration_ms: 0,
        complete: false,
        label: Label::EMPTY,
    };

    /// Build a sequence from literal durations; anything past `N` is cut off.
    ///
    /// The result is marked complete and its span is the sum of durations.
    pub fn from_durations(durations: &[u16]) -> Self {
        let mut seq = Self::EMPTY;
        let count = durations.len().min(N);
        seq.durations[..count].copy_from_slice(&durations[..count]);
        seq.count = count;
        seq.total_duration_ms = (seq.span_us() / 1000) as u32;
        seq.complete = true;
        seq
    }

    /// Append one duration. Returns `false` when full.
    pub fn push(&mut self, duration_us: u16) -> bool {
        if self.count >= N {
            return false;
        }
        self.durations[self.count] = duration_us;
        self.count += 1;
        true
    }

    /// Mark the sequence finished.
    pub fn finalize(&mut self, total_duration_ms: u32) {
        self.total_duration_ms = total_duration_ms;
        self.complete = true;
    }

    pub fn set_label(&mut self, label: Label) {
        self.label = label;
    }

    /// Valid durations.
    #[inline]
    pub fn durations(&self) -> &[u16] {
        &self.durations[..self.count]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    #[inline]
    pub fn total_duration_ms(&self) -> u32 {
        self.total_duration_ms
    }

    #[inline]
    pub fn label(&self) -> &Label {
        &self.label
    }

    /// Sum of all durations in microseconds.
    pub fn span_us(&self) -> u64 {
        self.durations().iter().map(|&d| d as u64).sum()
    }

    /// Borrowed view with the capacity erased.
    pub fn view(&self) -> SignalView<'_> {
        SignalView {
            label: self.label.as_str(),
            durations: self.durations(),
            total_duration_ms: self.total_duration_ms,
            complete: self.complete,
        }
    }
}

impl<const N: usize> Default for PulseSequence<N> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<const N: usize> core::fmt::Debug for PulseSequence<N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PulseSequence")
            .field("label", &self.label)
            .field("count", &self.count)
            .field("total_duration_ms", &self.total_duration_ms)
            .field("complete", &self.complete)
            .field("durations", &self.durations())
            .finish()
    }
}

/// Borrowed view of a stored sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignalView<'a> {
    pub label: &'a str,
    pub durations: &'a [u16],
    pub total_duration_ms: u32,
    pub complete: bool,
}

impl SignalView<'_> {
    pub fn len(&self) -> usize {
        self.durations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.durations.is_empty()
    }

    /// Basic timing statistics, `None` for an empty sequence.
    pub fn stats(&self) -> Option<SequenceStats> {
        SequenceStats::of(self.durations)
    }
}

/// Timing summary printed with a dump.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SequenceStats {
    pub count: usize,
    pub first_us: u16,
    pub last_us: u16,
    pub last_phase: Phase,
    pub min_us: u16,
    pub max_us: u16,
    pub mean_us: u32,
    pub span_us: u64,
}

impl SequenceStats {
    pub fn of(durations: &[u16]) -> Option<Self> {
        let (&first, _) = durations.split_first()?;
        let last = *durations.last()?;
        let mut min = u16::MAX;
        let mut max = 0u16;
        let mut sum = 0u64;
        for &d in durations {
            min = min.min(d);
            max = max.max(d);
            sum += d as u64;
        }
        Some(Self {
            count: durations.len(),
            first_us: first,
            last_us: last,
            last_phase: Phase::of_index(durations.len() - 1),
            min_us: min,
            max_us: max,
            mean_us: (sum / durations.len() as u64) as u32,
            span_us: sum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parity() {
        assert_eq!(Phase::of_index(0), Phase::Mark);
        assert_eq!(Phase::of_index(1), Phase::Space);
        assert_eq!(Phase::of_index(18), Phase::Mark);
    }

    #[test]
    fn test_label_numbered() {
        assert_eq!(Label::numbered(3).as_str(), "SIGNAL_RAW_3");
        assert!(Label::EMPTY.is_empty());
    }

    #[test]
    fn test_label_truncates_on_char_boundary() {
        let long = "é".repeat(40);
        let label = Label::new(&long);
        assert_eq!(label.as_str().len(), LABEL_LEN);
        assert!(label.as_str().chars().all(|c| c == 'é'));
    }

    #[test]
    fn test_push_respects_capacity() {
        let mut seq = PulseSequence::<3>::EMPTY;
        assert!(seq.push(1));
        assert!(seq.push(2));
        assert!(seq.push(3));
        assert!(!seq.push(4));
        assert_eq!(seq.durations(), &[1, 2, 3]);
        assert!(!seq.is_complete());
    }

    #[test]
    fn test_from_durations() {
        let seq = PulseSequence::<8>::from_durations(&[9000, 4500, 560, 560]);
        assert_eq!(seq.len(), 4);
        assert!(seq.is_complete());
        assert_eq!(seq.span_us(), 14_620);
        assert_eq!(seq.total_duration_ms(), 14);
    }

    #[test]
    fn test_stats() {
        let stats = SequenceStats::of(&[3600, 1760, 400, 1300, 420]).unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.first_us, 3600);
        assert_eq!(stats.last_us, 420);
        assert_eq!(stats.last_phase, Phase::Mark);
        assert_eq!(stats.min_us, 400);
        assert_eq!(stats.max_us, 3600);
        assert_eq!(stats.mean_us, 1496);
        assert!(SequenceStats::of(&[]).is_none());
    }
}
