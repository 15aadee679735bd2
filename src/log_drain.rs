//! Log output from the main loop.
//!
//! Drains the ISR/timer `LogStream` into any `core::fmt::Write` sink. The
//! firmware points it at the serial console; tests use a `String`.
//!
//! ```text
//! [    123456] WARN: pulse too long: 60000us (max 50000us)
//! ```

use core::fmt::{self, Write};

use crate::logging::{LogEntry, LogStream};

/// Maximum entries written per `drain_to` call, so a log burst cannot
/// starve the console.
pub const MAX_DRAIN_PER_POLL: usize = 16;

/// Format one entry as `[timestamp_us] LEVEL: message`.
pub fn format_log_entry<W: Write + ?Sized>(entry: &LogEntry, out: &mut W) -> fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    )
}

/// Write pending entries, at most `MAX_DRAIN_PER_POLL`. Returns how many.
pub fn drain_to<const N: usize, W: Write + ?Sized>(stream: &LogStream<N>, out: &mut W) -> usize {
    let mut written = 0;
    while written < MAX_DRAIN_PER_POLL {
        let Some(entry) = stream.drain() else {
            break;
        };
        let _ = format_log_entry(&entry, out);
        written += 1;
    }
    written
}

/// Report and reset the dropped counter. Returns the count reported.
pub fn report_dropped<const N: usize, W: Write + ?Sized>(stream: &LogStream<N>, out: &mut W) -> u32 {
    let dropped = stream.dropped();
    if dropped > 0 {
        let _ = writeln!(out, "[log] {} messages dropped", dropped);
        stream.reset_dropped();
    }
    dropped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;

    #[test]
    fn test_format_entry() {
        let stream = LogStream::<4>::new();
        stream.push(42, LogLevel::Warn, b"pulse too long");
        let entry = stream.drain().unwrap();

        let mut s = String::new();
        format_log_entry(&entry, &mut s).unwrap();
        assert_eq!(s, "[        42] WARN: pulse too long\n");
    }

    #[test]
    fn test_drain_is_bounded() {
        let stream = LogStream::<32>::new();
        for t in 0..20 {
            stream.push(t, LogLevel::Info, b"x");
        }

        let mut s = String::new();
        assert_eq!(drain_to(&stream, &mut s), MAX_DRAIN_PER_POLL);
        assert_eq!(s.lines().count(), MAX_DRAIN_PER_POLL);
        assert_eq!(drain_to(&stream, &mut s), 4);
        assert_eq!(drain_to(&stream, &mut s), 0);
    }

    #[test]
    fn test_report_dropped_resets() {
        let stream = LogStream::<2>::new();
        for t in 0..3 {
            stream.push(t, LogLevel::Error, b"e");
        }
        let mut s = String::new();
        assert_eq!(report_dropped(&stream, &mut s), 1);
        assert_eq!(s, "[log] 1 messages dropped\n");
        assert_eq!(report_dropped(&stream, &mut s), 0);
    }
}
