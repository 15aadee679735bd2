//! ISR-safe logging.
//!
//! # Architecture
//!
//! ```text
//! GPIO ISR / timer        LogStream            Main loop
//! ────────────────        ─────────            ─────────
//!
//! isr_warn!() ──────────▶ [L0][L1][L2] ──────▶ console
//! no formatting I/O        lock-free            blocking ok
//! never blocks             ring buffer
//! ```
//!
//! # Rules
//!
//! - Edge and timer callbacks never print; they push into a `LogStream`
//! - A push that finds the ring full is dropped and counted
//! - Only the main loop drains (single consumer)

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU8, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 96;

/// Log buffer size (number of entries).
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }

    /// Convert from raw u8 value (saturates at `Trace`).
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => LogLevel::Error,
            1 => LogLevel::Warn,
            2 => LogLevel::Info,
            3 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a console level name, case-insensitive.
    pub fn parse(name: &str) -> Option<Self> {
        [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
        .into_iter()
        .find(|l| l.as_str().eq_ignore_ascii_case(name))
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds (wrapping).
    pub timestamp_us: u32,
    /// Log level.
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    pub const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text; invalid UTF-8 (a cut multi-byte char) is trimmed.
    pub fn message(&self) -> &str {
        let bytes = &self.msg[..self.len as usize];
        match core::str::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => core::str::from_utf8(&bytes[..e.valid_up_to()]).unwrap_or(""),
        }
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free log ring (multiple producers, single consumer).
///
/// Producers are the edge ISR and the detector timer, which may preempt each
/// other. Each reserves a slot with a compare-exchange on `write_idx`, fills
/// it, then sets the slot's commit flag. The consumer only reads committed
/// slots, so it never observes a half-written entry.
pub struct LogStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    committed: [AtomicBool; N],
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    min_level: AtomicU8,
}

// SAFETY: a slot is written only by the producer that reserved it and read
// only by the single consumer after the commit flag was published (Release /
// Acquire). The slot is not reused until `read_idx` moves past it.
unsafe impl<const N: usize> Sync for LogStream<N> {}
unsafe impl<const N: usize> Send for LogStream<N> {}

impl<const N: usize> LogStream<N> {
    const MASK: usize = N - 1;

    /// Create a new empty log stream at `Info` level.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log buffer size must be power of 2");

        const NOT_COMMITTED: AtomicBool = AtomicBool::new(false);

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            committed: [NOT_COMMITTED; N],
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            min_level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Most verbose level that is still recorded.
    #[inline]
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.min_level.load(Ordering::Relaxed))
    }

    /// Change the most verbose level that is still recorded.
    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    /// True if a message at `level` would be recorded.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.min_level.load(Ordering::Relaxed)
    }

    /// Push a log entry (ISR-safe, never blocks).
    ///
    /// Returns `true` if the message was queued, `false` if it was filtered
    /// out by level or dropped because the ring is full.
    pub fn push(&self, timestamp_us: u32, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        let mut write = self.write_idx.load(Ordering::Relaxed);
        loop {
            let read = self.read_idx.load(Ordering::Acquire);
            if write.wrapping_sub(read) >= N as u32 {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return false;
            }
            match self.write_idx.compare_exchange_weak(
                write,
                write.wrapping_add(1),
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => write = current,
            }
        }

        let idx = (write as usize) & Self::MASK;

        // SAFETY: the compare-exchange above handed slot `idx` to this
        // producer alone; the consumer ignores it until `committed` is set.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            let len = msg.len().min(MAX_MSG_LEN);
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        self.committed[idx].store(true, Ordering::Release);
        true
    }

    /// Take the oldest committed entry (main loop only).
    ///
    /// Returns `None` when empty, or when the oldest reserved slot is still
    /// being written by a preempted producer.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;
        if !self.committed[idx].load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: single consumer; the slot is committed and no producer can
        // reserve it again before `read_idx` advances below.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.committed[idx].store(false, Ordering::Relaxed);
        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Reset dropped counter (e.g., after reporting).
    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }
}

impl<const N: usize> Default for LogStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-buffer `core::fmt::Write` sink that truncates silently.
pub struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl core::fmt::Write for BufWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buf.len() - self.pos;
        let to_write = bytes.len().min(remaining);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format a message into a buffer.
///
/// Returns the number of bytes written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = core::fmt::write(&mut writer, args);
    writer.len()
}

/// ISR-safe log macro.
///
/// Skips formatting entirely when the level is filtered out.
///
/// # Example
///
/// ```ignore
/// isr_log!(LogLevel::Warn, log, now_us, "pulse too long: {}us", duration);
/// ```
#[macro_export]
macro_rules! isr_log {
    ($level:expr, $stream:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $stream.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $stream.push($timestamp, level, &buf[..len]);
        }
    }};
}

/// ISR-safe warning log.
#[macro_export]
macro_rules! isr_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// ISR-safe info log.
#[macro_export]
macro_rules! isr_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}

/// ISR-safe debug log.
#[macro_export]
macro_rules! isr_debug {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Debug, $stream, $timestamp, $($arg)*)
    };
}

/// Warning from the main loop. Same ring as the ISR macros, so ordering
/// with RT-side entries is kept.
#[macro_export]
macro_rules! log_warn {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Warn, $stream, $timestamp, $($arg)*)
    };
}

/// Info from the main loop.
#[macro_export]
macro_rules! log_info {
    ($stream:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::isr_log!($crate::logging::LogLevel::Info, $stream, $timestamp, $($arg)*)
    };
}
