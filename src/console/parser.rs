//! Command line parser
//!
//! Split on whitespace, max 3 arguments. Commands that take free text (a
//! pasted duration list) read `rest` instead of the split arguments.

/// Maximum number of arguments after the command.
pub const MAX_ARGS: usize = 3;

/// Parsed command with up to 3 arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    /// The command name (first token)
    pub command: &'a str,
    /// Up to 3 arguments
    pub args: [Option<&'a str>; MAX_ARGS],
    /// Everything after the command token, trimmed
    pub rest: &'a str,
    /// Tokens beyond the last argument were dropped
    pub truncated: bool,
}

impl<'a> ParsedCommand<'a> {
    /// Create empty command
    pub const fn empty() -> Self {
        Self {
            command: "",
            args: [None; MAX_ARGS],
            rest: "",
            truncated: false,
        }
    }

    /// Get argument by index (0-based)
    pub fn arg(&self, idx: usize) -> Option<&'a str> {
        self.args.get(idx).copied().flatten()
    }
}

/// Parse a command line into command and arguments
pub fn parse_line(line: &str) -> ParsedCommand<'_> {
    let line = line.trim();
    let (command, rest) = match line.find(char::is_whitespace) {
        Some(end) => (&line[..end], line[end..].trim_start()),
        None => (line, ""),
    };

    let mut parts = rest.split_whitespace();
    let mut args = [None; MAX_ARGS];
    for (slot, arg) in args.iter_mut().zip(parts.by_ref()) {
        *slot = Some(arg);
    }

    ParsedCommand {
        command,
        args,
        rest,
        truncated: parts.next().is_some(),
    }
}
