//! Text export and import of raw sequences.
//!
//! Export is a C array initializer, twelve values per line, followed by a
//! short timing analysis. It can be pasted into an emitter firmware as is,
//! or back into the `sendraw` console command: `parse_durations` reads the
//! values between the first `{` and the next `}`, or the whole text when
//! there are no braces.

use core::fmt::{self, Write};

use crate::pulse::{Phase, SignalView};

/// Values per rendered line.
pub const VALUES_PER_LINE: usize = 12;

const RULE: &str = "=====================================";
const BANNER: &str = "###########################################";

/// Why a duration list was rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// No values at all.
    Empty,
    /// The value at `index` is not an unsigned 16-bit integer.
    InvalidNumber { index: usize },
    /// More than `max` values.
    TooMany { max: usize },
    /// The value at `index` is zero.
    ZeroDuration { index: usize },
}

impl ParseError {
    pub fn message(&self) -> &'static str {
        match self {
            ParseError::Empty => "empty sequence",
            ParseError::InvalidNumber { .. } => "invalid number",
            ParseError::TooMany { .. } => "too many values",
            ParseError::ZeroDuration { .. } => "zero duration",
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str(self.message()),
            ParseError::InvalidNumber { index } | ParseError::ZeroDuration { index } => {
                write!(f, "{} at position {}", self.message(), index + 1)
            }
            ParseError::TooMany { max } => write!(f, "{} (max {})", self.message(), max),
        }
    }
}

/// Parse a list of microsecond durations into `out`.
///
/// Separators are commas and whitespace; a trailing comma is allowed.
/// Returns the number of values written.
pub fn parse_durations(text: &str, out: &mut [u16]) -> Result<usize, ParseError> {
    let body = match text.find('{') {
        Some(open) => {
            let rest = &text[open + 1..];
            match rest.find('}') {
                Some(close) => &rest[..close],
                None => rest,
            }
        }
        None => text,
    };

    let cap = out.len();
    let mut count = 0;
    for token in body
        .split(|c: char| c == ',' || c.is_ascii_whitespace())
        .filter(|t| !t.is_empty())
    {
        let value: u16 = token
            .parse()
            .map_err(|_| ParseError::InvalidNumber { index: count })?;
        if value == 0 {
            return Err(ParseError::ZeroDuration { index: count });
        }
        let slot = out.get_mut(count).ok_or(ParseError::TooMany { max: cap })?;
        *slot = value;
        count += 1;
    }

    if count == 0 {
        return Err(ParseError::Empty);
    }
    Ok(count)
}

/// Write the values only, as `{ ... }` with twelve per line.
pub fn render_values<W: Write + ?Sized>(durations: &[u16], out: &mut W) -> fmt::Result {
    out.write_str("{\n")?;
    for (i, d) in durations.iter().enumerate() {
        if i % VALUES_PER_LINE == 0 {
            out.write_str("    ")?;
        }
        write!(out, "{}", d)?;
        if i + 1 < durations.len() {
            out.write_str(", ")?;
        }
        if i % VALUES_PER_LINE == VALUES_PER_LINE - 1 || i + 1 == durations.len() {
            out.write_str("\n")?;
        }
    }
    out.write_str("}")
}

/// Full export of one stored signal (`number` is 1-based).
pub fn render_sequence<W: Write + ?Sized>(
    signal: &SignalView<'_>,
    number: usize,
    out: &mut W,
) -> fmt::Result {
    writeln!(out, "{}", RULE)?;
    writeln!(out, "SIGNAL {} - RAW FORMAT", number)?;
    writeln!(out, "{}", RULE)?;
    writeln!(out, "// Signal {}: {}", number, signal.label)?;
    writeln!(
        out,
        "// Timings: {} | Duration: {} ms",
        signal.len(),
        signal.total_duration_ms
    )?;
    writeln!(out, "// First entry = ON, then alternating OFF/ON")?;
    write!(out, "uint16_t rawSignal{}[] = ", number)?;
    render_values(signal.durations, out)?;
    writeln!(out, ";")?;
    writeln!(out, "#define RAW_SIGNAL{}_LENGTH {}", number, signal.len())?;

    if let Some(stats) = signal.stats() {
        writeln!(out)?;
        writeln!(out, "// Analysis:")?;
        writeln!(out, "// - Timings: {}", stats.count)?;
        writeln!(out, "// - Duration: {} ms", signal.total_duration_ms)?;
        writeln!(out, "// - First: {}us ({})", stats.first_us, Phase::Mark.as_str())?;
        if stats.count > 1 {
            writeln!(
                out,
                "// - Last: {}us ({})",
                stats.last_us,
                stats.last_phase.as_str()
            )?;
        }
        writeln!(
            out,
            "// - Min: {}us, max: {}us, mean: {}us",
            stats.min_us, stats.max_us, stats.mean_us
        )?;
    }
    writeln!(out, "{}", RULE)
}

/// Export every signal plus pointer and length tables for an emitter build.
pub fn render_all<'a, W, I>(signals: I, out: &mut W) -> fmt::Result
where
    W: Write + ?Sized,
    I: IntoIterator<Item = SignalView<'a>>,
    I::IntoIter: Clone,
{
    let signals = signals.into_iter();
    let total = signals.clone().count();

    writeln!(out, "{}", BANNER)?;
    writeln!(out, "ALL SIGNALS - EMITTER FORMAT")?;
    writeln!(out, "{}", BANNER)?;

    for (i, signal) in signals.enumerate() {
        writeln!(out)?;
        render_sequence(&signal, i + 1, out)?;
    }

    writeln!(out)?;
    writeln!(out, "uint16_t* all_raw_signals[{}] = {{", total)?;
    for i in 1..=total {
        let sep = if i < total { "," } else { "" };
        writeln!(out, "    rawSignal{}{}", i, sep)?;
    }
    writeln!(out, "}};")?;
    writeln!(out, "uint16_t signal_lengths[{}] = {{", total)?;
    for i in 1..=total {
        let sep = if i < total { "," } else { "" };
        writeln!(out, "    RAW_SIGNAL{}_LENGTH{}", i, sep)?;
    }
    writeln!(out, "}};")?;
    writeln!(out, "{}", BANNER)
}
