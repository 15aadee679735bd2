//! Serial console for capture control and diagnostics
//!
//! Polled from the main loop - no dedicated task.
//! Zero heap allocation - all static buffers.

pub mod commands;
#[allow(clippy::module_inception)]
pub mod console;
pub mod error;
pub mod host;
pub mod line_buffer;
pub mod parser;

pub use commands::{execute, COMMANDS};
pub use console::{Console, VERSION};
pub use error::ConsoleError;
pub use host::ConsoleHost;
pub use line_buffer::LineBuffer;
pub use parser::{parse_line, ParsedCommand};
