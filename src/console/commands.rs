//! Command handlers

use core::fmt::Write;

use super::host::ConsoleHost;
use super::parser::ParsedCommand;
use super::ConsoleError;
use crate::config::{find_param, find_params_matching, MAX_TRANSITIONS, PARAMS};
use crate::engine::MAX_RECEIVER_TEST_S;
use crate::logging::LogLevel;
use crate::presets::{find_preset, PRESETS};
use crate::render::{parse_durations, render_all, render_sequence};
use crate::transmit::Carrier;

/// Largest literal list `sendraw` accepts: one full capture.
pub const MAX_RAW_VALUES: usize = MAX_TRANSITIONS;

/// Receiver test length when none is given.
pub const DEFAULT_RECEIVER_TEST_S: u32 = 10;

type Handler =
    fn(&ParsedCommand<'_>, &mut dyn ConsoleHost, &mut dyn Write) -> Result<(), ConsoleError>;

/// Command descriptor
pub struct CommandDescriptor {
    pub name: &'static str,
    pub usage: &'static str,
    pub brief: &'static str,
    /// Reads the free text in `rest`; extra tokens are not an error
    pub takes_rest: bool,
    pub handler: Handler,
}

/// All available commands
pub static COMMANDS: &[CommandDescriptor] = &[
    CommandDescriptor { name: "help", usage: "help [cmd]", brief: "List commands", takes_rest: false, handler: cmd_help },
    CommandDescriptor { name: "start", usage: "start", brief: "Arm capture for the next signal", takes_rest: false, handler: cmd_start },
    CommandDescriptor { name: "reset", usage: "reset", brief: "Clear capture and stored signals", takes_rest: false, handler: cmd_reset },
    CommandDescriptor { name: "status", usage: "status", brief: "Capture state", takes_rest: false, handler: cmd_status },
    CommandDescriptor { name: "list", usage: "list", brief: "List stored signals and presets", takes_rest: false, handler: cmd_list },
    CommandDescriptor { name: "dump", usage: "dump [n]", brief: "Print signal n (or all) as raw timings", takes_rest: false, handler: cmd_dump },
    CommandDescriptor { name: "send", usage: "send <n|preset> [hz]", brief: "Transmit stored signal n or a preset", takes_rest: false, handler: cmd_send },
    CommandDescriptor { name: "sendraw", usage: "sendraw <v1,v2,...|{...}> [@hz]", brief: "Transmit a literal timing list", takes_rest: true, handler: cmd_sendraw },
    CommandDescriptor { name: "test", usage: "test [seconds]", brief: "Count receiver level changes", takes_rest: false, handler: cmd_test },
    CommandDescriptor { name: "set", usage: "set <param> <value>", brief: "Set parameter value", takes_rest: false, handler: cmd_set },
    CommandDescriptor { name: "config", usage: "config [param|prefix*]", brief: "Show parameters", takes_rest: false, handler: cmd_config },
    CommandDescriptor { name: "defaults", usage: "defaults", brief: "Restore default parameters", takes_rest: false, handler: cmd_defaults },
    CommandDescriptor { name: "debug", usage: "debug [level]", brief: "Show or set log level", takes_rest: false, handler: cmd_debug },
    CommandDescriptor { name: "stats", usage: "stats", brief: "Capture counters", takes_rest: false, handler: cmd_stats },
];

/// Execute a parsed command
pub fn execute(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if cmd.command.is_empty() {
        return Ok(()); // Empty line, do nothing
    }

    let handler = COMMANDS
        .iter()
        .find(|c| c.name == cmd.command)
        .ok_or(ConsoleError::UnknownCommand)?;

    if cmd.truncated && !handler.takes_rest {
        return Err(ConsoleError::InvalidValue);
    }
    (handler.handler)(cmd, host, out)
}

/// Parse a 1-based signal number into a bank index.
fn signal_index(arg: &str, host: &dyn ConsoleHost) -> Result<usize, ConsoleError> {
    let n: usize = arg.parse().map_err(|_| ConsoleError::InvalidValue)?;
    if n == 0 || n > host.bank_len() {
        return Err(ConsoleError::NoSuchSignal);
    }
    Ok(n - 1)
}

/// Carrier from an optional argument, falling back to the configured one.
fn carrier_arg(arg: Option<&str>, host: &dyn ConsoleHost) -> Result<Carrier, ConsoleError> {
    let hz = match arg {
        Some(text) => text.parse().map_err(|_| ConsoleError::InvalidValue)?,
        None => host.config().carrier_hz(),
    };
    Ok(Carrier::new(hz)?)
}

// --- Command Implementations ---

fn cmd_help(
    cmd: &ParsedCommand<'_>,
    _host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if let Some(name) = cmd.arg(0) {
        let c = COMMANDS
            .iter()
            .find(|c| c.name == name)
            .ok_or(ConsoleError::UnknownCommand)?;
        let _ = writeln!(out, "{}: {}", c.usage, c.brief);
    } else {
        for c in COMMANDS {
            let _ = writeln!(out, "  {:<32} {}", c.usage, c.brief);
        }
    }
    Ok(())
}

fn cmd_start(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    host.start()?;
    let _ = writeln!(
        out,
        "armed, waiting for signal ({}/{} stored)",
        host.bank_len(),
        host.bank_capacity()
    );
    Ok(())
}

fn cmd_reset(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    host.reset();
    let _ = writeln!(out, "capture reset, bank cleared");
    Ok(())
}

fn cmd_status(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let s = host.session_status();
    let _ = writeln!(out, "phase: {}", s.phase.as_str());
    let _ = writeln!(out, "armed: {}", s.armed);
    let _ = writeln!(out, "timings: {}/{}", s.count, s.capacity);
    if s.stall_reported {
        let _ = writeln!(out, "stalled: too few timings, 'reset' to clear");
    }
    let _ = writeln!(out, "bank: {}/{}", host.bank_len(), host.bank_capacity());
    if let Some(level) = host.receiver_level() {
        let _ = writeln!(out, "receiver: {}", if level { "HIGH" } else { "LOW" });
    }
    if host.receiver_test_running() {
        let _ = writeln!(out, "receiver test: running");
    }
    Ok(())
}

fn cmd_list(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if host.bank_len() == 0 {
        let _ = writeln!(out, "no signals stored");
    }
    for i in 0..host.bank_len() {
        if let Some(sig) = host.signal(i) {
            let _ = writeln!(
                out,
                "{}: {:<14} {:>4} timings {:>5} ms",
                i + 1,
                sig.label,
                sig.len(),
                sig.total_duration_ms
            );
        }
    }
    let _ = writeln!(out, "presets:");
    for p in PRESETS {
        let _ = writeln!(out, "  {:<8} {:>4} timings  {}", p.name, p.durations.len(), p.brief);
    }
    Ok(())
}

fn cmd_dump(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let host: &dyn ConsoleHost = host;
    match cmd.arg(0) {
        Some(arg) => {
            let index = signal_index(arg, host)?;
            let sig = host.signal(index).ok_or(ConsoleError::NoSuchSignal)?;
            let _ = render_sequence(&sig, index + 1, out);
        }
        None => {
            if host.bank_len() == 0 {
                let _ = writeln!(out, "no signals stored");
                return Ok(());
            }
            let _ = render_all((0..host.bank_len()).filter_map(|i| host.signal(i)), out);
        }
    }
    Ok(())
}

fn cmd_send(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let target = cmd.arg(0).ok_or(ConsoleError::MissingArg)?;
    let carrier = carrier_arg(cmd.arg(1), host)?;

    // Numbers address the bank, names the preset table.
    if target.bytes().all(|b| b.is_ascii_digit()) {
        let index = signal_index(target, host)?;
        let stats = host.send_stored(index, carrier)?;
        let _ = writeln!(
            out,
            "sent signal {}: {} timings at {}Hz in {}us",
            index + 1,
            stats.segments,
            carrier.hz(),
            stats.elapsed_us
        );
    } else {
        let preset = find_preset(target).ok_or(ConsoleError::NoSuchSignal)?;
        let stats = host.send_raw(preset.durations, carrier);
        let _ = writeln!(
            out,
            "sent {}: {} timings at {}Hz in {}us",
            preset.name,
            stats.segments,
            carrier.hz(),
            stats.elapsed_us
        );
    }
    Ok(())
}

/// Split an optional trailing `@hz` off a `sendraw` argument.
fn split_carrier(rest: &str) -> (&str, Option<&str>) {
    match rest.rfind('@') {
        Some(at) => (&rest[..at], Some(rest[at + 1..].trim())),
        None => (rest, None),
    }
}

fn cmd_sendraw(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    if cmd.rest.is_empty() {
        return Err(ConsoleError::MissingArg);
    }
    let (list, hz) = split_carrier(cmd.rest);
    let carrier = carrier_arg(hz, host)?;

    let mut durations = [0u16; MAX_RAW_VALUES];
    let count = match parse_durations(list, &mut durations) {
        Ok(count) => count,
        Err(e) => {
            let _ = writeln!(out, "{}", e);
            return Err(e.into());
        }
    };

    let stats = host.send_raw(&durations[..count], carrier);
    let _ = writeln!(
        out,
        "sent {} timings at {}Hz in {}us",
        stats.segments,
        carrier.hz(),
        stats.elapsed_us
    );
    Ok(())
}

fn cmd_test(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let seconds = match cmd.arg(0) {
        Some(text) => text.parse().map_err(|_| ConsoleError::InvalidValue)?,
        None => DEFAULT_RECEIVER_TEST_S,
    };
    if seconds == 0 || seconds > MAX_RECEIVER_TEST_S {
        return Err(ConsoleError::OutOfRange);
    }

    let initial = host.start_receiver_test(seconds)?;
    let _ = writeln!(out, "receiver test: {}s, point a remote at the receiver", seconds);
    if let Some(level) = initial {
        let idle = level == host.config().active_low();
        let _ = writeln!(
            out,
            "initial state: {} ({})",
            if level { "HIGH" } else { "LOW" },
            if idle { "idle" } else { "active" }
        );
    }
    let _ = writeln!(out, "result follows in the log");
    Ok(())
}

fn cmd_set(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let name = cmd.arg(0).ok_or(ConsoleError::MissingArg)?;
    let value = cmd.arg(1).ok_or(ConsoleError::MissingArg)?;

    let param = find_param(name).ok_or(ConsoleError::UnknownCommand)?;
    let applied = param.apply(host.config(), value)?;
    let _ = writeln!(out, "{}={}", param.name, applied);
    Ok(())
}

fn cmd_config(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let config = host.config();
    match cmd.arg(0) {
        Some(pattern) => {
            let mut found = false;
            for p in find_params_matching(pattern) {
                let _ = writeln!(out, "{}={}", p.name, p.get(config));
                found = true;
            }
            if !found {
                return Err(ConsoleError::UnknownCommand);
            }
        }
        None => {
            for p in PARAMS {
                let _ = writeln!(out, "{:<16}{:<8} {}", p.name, p.get(config), p.brief);
            }
        }
    }
    Ok(())
}

fn cmd_defaults(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    host.config().restore_defaults();
    let _ = writeln!(out, "parameters restored to defaults");
    Ok(())
}

fn cmd_debug(
    cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let log = host.log();
    if let Some(name) = cmd.arg(0) {
        let level = LogLevel::parse(name).ok_or(ConsoleError::InvalidValue)?;
        log.set_level(level);
    }
    let _ = writeln!(out, "log level: {}", log.level().as_str());
    Ok(())
}

fn cmd_stats(
    _cmd: &ParsedCommand<'_>,
    host: &mut dyn ConsoleHost,
    out: &mut dyn Write,
) -> Result<(), ConsoleError> {
    let s = host.counters();
    let _ = writeln!(out, "edges:      {} ({} debounced)", s.edges, s.debounced);
    let _ = writeln!(out, "captures:   {} started", s.started);
    let _ = writeln!(out, "timings:    {} recorded", s.recorded);
    let _ = writeln!(out, "too short:  {}", s.too_short);
    let _ = writeln!(out, "too long:   {}", s.too_long);
    let _ = writeln!(out, "frames:     {} ({} by overflow)", s.frames, s.overflows);
    let _ = writeln!(out, "stalls:     {}", s.stalls);
    let _ = writeln!(out, "discarded:  {}", s.discarded);
    let _ = writeln!(out, "stored:     {} ({} rejected, bank full)", s.stored, s.rejected_full);
    let _ = writeln!(out, "log drops:  {}", host.log().dropped());
    Ok(())
}
