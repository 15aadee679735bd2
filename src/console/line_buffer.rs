//! Line buffer for console input

/// Maximum line length. Holds a full-capacity capture pasted back into
/// `sendraw` (five digits, a comma and a space per value, plus indentation).
pub const LINE_SIZE: usize = 8192;

/// Line input buffer (printable ASCII only)
///
/// A push that does not fit is dropped and latches `overflowed` until the
/// next `clear`, so a cut-off line is never mistaken for a complete one.
pub struct LineBuffer {
    buf: [u8; LINE_SIZE],
    len: usize,
    overflowed: bool,
}

impl LineBuffer {
    /// Create empty buffer
    pub const fn new() -> Self {
        Self {
            buf: [0u8; LINE_SIZE],
            len: 0,
            overflowed: false,
        }
    }

    /// Push a character. Returns `false` when the line is full.
    pub fn push(&mut self, c: u8) -> bool {
        if self.len < LINE_SIZE {
            self.buf[self.len] = c;
            self.len += 1;
            true
        } else {
            self.overflowed = true;
            false
        }
    }

    /// Remove last character
    pub fn backspace(&mut self) -> bool {
        if self.len > 0 {
            self.len -= 1;
            true
        } else {
            false
        }
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.len = 0;
        self.overflowed = false;
    }

    /// Get buffer as string slice
    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Get buffer length
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Check if full
    pub fn is_full(&self) -> bool {
        self.len == LINE_SIZE
    }

    /// Whether input was dropped since the last `clear`
    pub fn overflowed(&self) -> bool {
        self.overflowed
    }
}

impl Default for LineBuffer {
    fn default() -> Self {
        Self::new()
    }
}
