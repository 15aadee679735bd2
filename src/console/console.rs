//! Main console struct integrating all components

use core::fmt::Write;

use super::{execute, parse_line, ConsoleError, ConsoleHost, LineBuffer};

/// Version string (set by build.rs, includes git hash)
pub const VERSION: &str = env!("VERSION_STRING");

/// Console state machine
///
/// A line holding an unclosed `{` is continued on the next line, so a
/// rendered C array can be pasted back as is.
pub struct Console {
    line: LineBuffer,
    /// Escape sequence state
    escape_state: EscapeState,
    /// Rest of an overflowed block being thrown away
    discard: Discard,
}

#[derive(Clone, Copy, PartialEq)]
enum Discard {
    Off,
    Block, // Until the closing brace
    Line,  // Until the end of the closing line
}

#[derive(Clone, Copy, PartialEq)]
enum EscapeState {
    Normal,
    Escape,  // Got ESC
    Bracket, // Got ESC [
}

impl Console {
    /// Create new console
    pub const fn new() -> Self {
        Self {
            line: LineBuffer::new(),
            escape_state: EscapeState::Normal,
            discard: Discard::Off,
        }
    }

    /// Current input line (not yet submitted)
    pub fn pending_line(&self) -> &str {
        self.line.as_str()
    }

    /// Process a single input byte
    ///
    /// Returns Some(result) if a command ran, None if more input needed.
    /// Errors are printed before the next prompt.
    pub fn process_byte(
        &mut self,
        byte: u8,
        host: &mut dyn ConsoleHost,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        match self.escape_state {
            EscapeState::Normal => self.process_normal(byte, host, out),
            EscapeState::Escape => {
                self.escape_state = if byte == b'[' {
                    EscapeState::Bracket
                } else {
                    EscapeState::Normal
                };
                None
            }
            EscapeState::Bracket => {
                // Cursor keys and the like: no line history, swallow them.
                if (0x40..=0x7E).contains(&byte) {
                    self.escape_state = EscapeState::Normal;
                }
                None
            }
        }
    }

    fn process_normal(
        &mut self,
        byte: u8,
        host: &mut dyn ConsoleHost,
        out: &mut dyn Write,
    ) -> Option<Result<(), ConsoleError>> {
        match byte {
            // Enter
            b'\r' | b'\n' => {
                let _ = writeln!(out);
                match self.discard {
                    Discard::Block => return None,
                    Discard::Line => {
                        self.discard = Discard::Off;
                        self.print_prompt(out);
                        return None;
                    }
                    Discard::Off => {}
                }

                if self.line.overflowed() {
                    if open_block(self.line.as_str()) {
                        self.discard = Discard::Block;
                    }
                    let result = Err(ConsoleError::LineTooLong);
                    let _ = writeln!(out, "{}", ConsoleError::LineTooLong);
                    self.line.clear();
                    if self.discard == Discard::Off {
                        self.print_prompt(out);
                    }
                    return Some(result);
                }

                if self.line.is_empty() {
                    self.print_prompt(out);
                    return None;
                }

                if open_block(self.line.as_str()) {
                    // Line break inside a block acts as a separator.
                    self.line.push(b' ');
                    let _ = write!(out, "... ");
                    return None;
                }

                let cmd = parse_line(self.line.as_str());
                let result = execute(&cmd, host, out);
                if let Err(e) = result {
                    let _ = writeln!(out, "{}", e);
                }
                self.line.clear();
                self.print_prompt(out);
                Some(result)
            }

            // Backspace
            0x7F | 0x08 => {
                if self.line.backspace() {
                    // Echo: backspace, space, backspace
                    let _ = write!(out, "\x08 \x08");
                }
                None
            }

            // Escape
            0x1B => {
                self.escape_state = EscapeState::Escape;
                None
            }

            // Ctrl+C
            0x03 => {
                let _ = writeln!(out, "^C");
                self.line.clear();
                self.discard = Discard::Off;
                self.print_prompt(out);
                None
            }

            // Ctrl+U (clear line)
            0x15 => {
                for _ in 0..self.line.len() {
                    let _ = write!(out, "\x08 \x08");
                }
                self.line.clear();
                None
            }

            // Printable character
            0x20..=0x7E => {
                if self.discard != Discard::Off {
                    if byte == b'}' {
                        self.discard = Discard::Line;
                    }
                } else if self.line.push(byte) {
                    let _ = write!(out, "{}", byte as char);
                } else {
                    // Bell: line full
                    let _ = write!(out, "\x07");
                }
                None
            }

            _ => None,
        }
    }

    /// Print the prompt
    pub fn print_prompt(&self, out: &mut dyn Write) {
        let _ = write!(out, "{}> ", VERSION);
    }

    /// Print welcome banner
    pub fn print_banner(&self, out: &mut dyn Write) {
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", VERSION);
        let _ = writeln!(out, "Raw IR capture and replay. Type 'help' for commands.");
        self.print_prompt(out);
    }
}

/// Whether `line` opens a `{` block that it does not close.
fn open_block(line: &str) -> bool {
    line.find('{').is_some_and(|open| !line[open..].contains('}'))
}

impl Default for Console {
    fn default() -> Self {
        Self::new()
    }
}
