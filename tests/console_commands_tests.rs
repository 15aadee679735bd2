//! Command handler tests against a live engine with a recording transmitter

use rust_raw_ir::console::commands::{execute, COMMANDS};
use rust_raw_ir::console::line_buffer::LINE_SIZE;
use rust_raw_ir::console::parser::parse_line;
use rust_raw_ir::console::{Console, ConsoleError};
use rust_raw_ir::render::render_values;
use rust_raw_ir::{
    find_preset, CaptureSession, Carrier, EngineConfig, IrEngine, LogLevel, LogStream, Transmit,
    TransmitStats,
};

#[derive(Default)]
struct Recorder {
    played: Vec<(Vec<u16>, u32)>,
}

impl Transmit for Recorder {
    fn transmit(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats {
        self.played.push((durations.to_vec(), carrier.hz()));
        TransmitStats {
            segments: durations.len(),
            carrier_cycles: 0,
            elapsed_us: durations.iter().map(|&d| d as u32).sum(),
        }
    }
}

struct Fixture {
    session: CaptureSession<64>,
    config: EngineConfig,
    log: LogStream,
}

impl Fixture {
    fn new() -> Self {
        Self {
            session: CaptureSession::new(),
            config: EngineConfig::new(),
            log: LogStream::new(),
        }
    }

    fn engine(&self) -> IrEngine<'_, Recorder, 64, 2> {
        IrEngine::new(&self.session, &self.config, &self.log, Recorder::default())
    }

    /// Put a finished frame in the session.
    fn capture(&self, durations: &[u16]) {
        assert!(self.session.begin(0));
        for &d in durations {
            self.session.append(d);
        }
        self.session.finalize(durations.iter().map(|&d| d as u32).sum());
    }
}

fn run(line: &str, engine: &mut IrEngine<'_, Recorder, 64, 2>) -> (Result<(), ConsoleError>, String) {
    let mut out = String::new();
    let result = execute(&parse_line(line), engine, &mut out);
    (result, out)
}

/// Type `input` into a console, returning the last command result.
fn type_into(
    console: &mut Console,
    input: &str,
    engine: &mut IrEngine<'_, Recorder, 64, 2>,
) -> Option<Result<(), ConsoleError>> {
    let mut out = String::new();
    let mut last = None;
    for &b in input.as_bytes() {
        if let Some(result) = console.process_byte(b, engine, &mut out) {
            last = Some(result);
        }
    }
    last
}

/// The `{ ... }` block of a rendered signal.
fn values_block(dump: &str) -> &str {
    let open = dump.find('{').unwrap();
    let close = open + dump[open..].find('}').unwrap();
    &dump[open..=close]
}

const FRAME: [u16; 19] = [
    420, 350, 430, 1_330, 410, 350, 440, 1_330, 420, 350, 450, 1_330, 400, 350, 430, 1_330, 420,
    350, 440,
];

#[test]
fn test_command_registry_has_all_commands() {
    let expected = [
        "help", "start", "reset", "status", "list", "dump", "send", "sendraw", "test", "set",
        "config", "defaults", "debug", "stats",
    ];

    for name in expected {
        assert!(
            COMMANDS.iter().any(|c| c.name == name),
            "Command '{}' should be in registry",
            name
        );
    }
}

#[test]
fn test_execute_unknown_command() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let (result, _) = run("foobar", &mut engine);

    assert_eq!(result, Err(ConsoleError::UnknownCommand));
}

#[test]
fn test_execute_help() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let (result, out) = run("help", &mut engine);

    assert!(result.is_ok());
    assert!(out.contains("sendraw <v1,v2,...|{...}> [@hz]"));

    let (result, out) = run("help send", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "send <n|preset> [hz]: Transmit stored signal n or a preset\n");
}

#[test]
fn test_list_and_dump_stored_signals() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let (_, out) = run("list", &mut engine);
    assert!(out.starts_with("no signals stored\npresets:\n"));
    assert!(out.contains("temp22"));

    fx.capture(&[9_000, 4_500, 560, 560, 560, 1_690, 560, 560, 560, 1_690, 560, 560]);
    engine.poll(0);

    let (result, out) = run("list", &mut engine);
    assert!(result.is_ok());
    assert!(out.starts_with("1: SIGNAL_RAW_1"));
    assert!(out.contains("12 timings"));

    let (result, out) = run("dump 1", &mut engine);
    assert!(result.is_ok());
    assert!(out.contains("uint16_t rawSignal1[] = {"));

    let (result, out) = run("dump", &mut engine);
    assert!(result.is_ok());
    assert!(out.contains("all_raw_signals[1]"));

    assert_eq!(run("dump 2", &mut engine).0, Err(ConsoleError::NoSuchSignal));
    assert_eq!(run("dump x", &mut engine).0, Err(ConsoleError::InvalidValue));
}

#[test]
fn test_send_uses_configured_or_given_carrier() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    fx.capture(&[600; 12]);
    engine.poll(0);

    let (result, out) = run("send 1", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "sent signal 1: 12 timings at 38000Hz in 7200us\n");

    assert!(run("send 1 40000", &mut engine).0.is_ok());
    assert_eq!(run("send 1 5", &mut engine).0, Err(ConsoleError::InvalidCarrier));
    assert_eq!(run("send", &mut engine).0, Err(ConsoleError::MissingArg));
    assert_eq!(run("send 0", &mut engine).0, Err(ConsoleError::NoSuchSignal));

    let played = &engine.transmitter().played;
    assert_eq!(played.len(), 2);
    assert_eq!(played[0].1, 38_000);
    assert_eq!(played[1].1, 40_000);
}

#[test]
fn test_sendraw_parses_and_plays() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let (result, out) = run("sendraw 9000,4500,560", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "sent 3 timings at 38000Hz in 14060us\n");
    assert_eq!(engine.transmitter().played[0].0, vec![9_000, 4_500, 560]);

    let (result, out) = run("sendraw 9000,0,560", &mut engine);
    assert_eq!(result, Err(ConsoleError::BadSequence));
    assert!(out.contains("zero duration at position 2"));
    assert_eq!(engine.transmitter().played.len(), 1);
}

#[test]
fn test_start_refused_when_bank_full() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    fx.capture(&[600; 12]);
    engine.poll(0);
    fx.capture(&[700; 12]);
    engine.poll(0);
    assert!(!fx.session.is_armed());

    assert_eq!(run("start", &mut engine).0, Err(ConsoleError::BankFull));

    let (result, out) = run("reset", &mut engine);
    assert!(result.is_ok());
    assert!(out.contains("bank cleared"));

    let (result, out) = run("start", &mut engine);
    assert!(result.is_ok());
    assert!(out.contains("(0/2 stored)"));
}

#[test]
fn test_set_and_config() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let (result, out) = run("set silence_gap_us 20000", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "silence_gap_us=20000\n");
    assert_eq!(fx.config.silence_gap_us(), 20_000);

    assert_eq!(
        run("set silence_gap_us 5", &mut engine).0,
        Err(ConsoleError::OutOfRange)
    );
    assert_eq!(
        run("set silence_gap_us abc", &mut engine).0,
        Err(ConsoleError::InvalidValue)
    );
    assert_eq!(run("set nope 1", &mut engine).0, Err(ConsoleError::UnknownCommand));
    assert_eq!(run("set debounce_us", &mut engine).0, Err(ConsoleError::MissingArg));

    let (_, out) = run("config min_*", &mut engine);
    assert_eq!(out, "min_pulse_us=50\nmin_valid_count=10\n");
}

#[test]
fn test_debug_sets_log_level() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let (result, out) = run("debug debug", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "log level: DEBUG\n");
    assert_eq!(fx.log.level(), LogLevel::Debug);

    assert_eq!(run("debug loud", &mut engine).0, Err(ConsoleError::InvalidValue));
}

#[test]
fn test_status_reports_stall() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    fx.session.begin(0);
    fx.session.append(3_600);
    fx.session.mark_stalled();

    let (_, out) = run("status", &mut engine);
    assert!(out.contains("phase: capturing"));
    assert!(out.contains("timings: 1/64"));
    assert!(out.contains("stalled"));
}

#[test]
fn test_console_prints_errors_before_prompt() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let mut console = Console::new();
    let mut out = String::new();

    let mut last = None;
    for &b in b"bogus\r" {
        last = console.process_byte(b, &mut engine, &mut out);
    }

    assert_eq!(last, Some(Err(ConsoleError::UnknownCommand)));
    let err_at = out.find("E01: unknown command").unwrap();
    let prompt_at = out.rfind("> ").unwrap();
    assert!(err_at < prompt_at);
    assert_eq!(console.pending_line(), "");
}

#[test]
fn test_console_rejects_extra_arguments() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let mut console = Console::new();

    let last = type_into(&mut console, "send 1 38000 extra more\n", &mut engine);

    assert_eq!(last, Some(Err(ConsoleError::InvalidValue)));
    assert!(engine.transmitter().played.is_empty());
}

#[test]
fn test_sendraw_takes_spaced_list_and_carrier() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    let (result, out) = run("sendraw 9000, 4500, 560, 560 @40000", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "sent 4 timings at 40000Hz in 14620us\n");
    assert_eq!(engine.transmitter().played[0], (vec![9_000, 4_500, 560, 560], 40_000));

    assert_eq!(run("sendraw", &mut engine).0, Err(ConsoleError::MissingArg));
    assert_eq!(run("sendraw 560 @5", &mut engine).0, Err(ConsoleError::InvalidCarrier));
    assert_eq!(run("sendraw 560 @", &mut engine).0, Err(ConsoleError::InvalidValue));
}

#[test]
fn test_dump_pastes_back_into_sendraw() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    fx.capture(&FRAME);
    engine.poll(0);

    let (_, dump) = run("dump 1", &mut engine);
    let block = values_block(&dump);
    assert!(block.contains('\n'));

    // As printed, one line at a time.
    let mut console = Console::new();
    let typed = format!("sendraw {}\r", block.replace('\n', "\r"));
    assert_eq!(type_into(&mut console, &typed, &mut engine), Some(Ok(())));

    // Joined onto a single line.
    let typed = format!("sendraw {} @38000\n", block.replace('\n', " "));
    assert_eq!(type_into(&mut console, &typed, &mut engine), Some(Ok(())));

    let played = &engine.transmitter().played;
    assert_eq!(played.len(), 2);
    assert_eq!(played[0].0, FRAME);
    assert_eq!(played[1].0, FRAME);
}

#[test]
fn test_sendraw_plays_full_reference_frame() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let frame = find_preset("off").unwrap().durations;

    let mut block = String::new();
    render_values(frame, &mut block).unwrap();
    let line = format!("sendraw {}\n", block.replace('\n', " "));
    assert!(line.len() > 1_000);

    let mut console = Console::new();
    assert_eq!(type_into(&mut console, &line, &mut engine), Some(Ok(())));
    assert_eq!(engine.transmitter().played[0].0, frame);
}

#[test]
fn test_overlong_line_is_refused() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let mut console = Console::new();

    let mut line = String::from("sendraw ");
    while line.len() < LINE_SIZE + 100 {
        line.push_str("560,");
    }
    line.push('\n');

    assert_eq!(
        type_into(&mut console, &line, &mut engine),
        Some(Err(ConsoleError::LineTooLong))
    );
    assert!(engine.transmitter().played.is_empty());
    assert_eq!(console.pending_line(), "");
}

#[test]
fn test_overlong_block_is_skipped_to_its_end() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let mut console = Console::new();

    let mut input = String::from("sendraw {\r");
    let row = "    9000, 9000, 9000, 9000, 9000, 9000, 9000, 9000, 9000, 9000, 9000, 9000,\r";
    while input.len() < LINE_SIZE + 200 {
        input.push_str(row);
    }
    assert_eq!(
        type_into(&mut console, &input, &mut engine),
        Some(Err(ConsoleError::LineTooLong))
    );

    // Remaining rows and the closing line are dropped, not run.
    assert_eq!(type_into(&mut console, row, &mut engine), None);
    assert_eq!(type_into(&mut console, "} @38000\r", &mut engine), None);
    assert!(engine.transmitter().played.is_empty());

    assert_eq!(type_into(&mut console, "status\r", &mut engine), Some(Ok(())));
}

#[test]
fn test_send_preset_by_name() {
    let fx = Fixture::new();
    let mut engine = fx.engine();
    let preset = find_preset("temp20").unwrap();
    let total: u32 = preset.durations.iter().map(|&d| d as u32).sum();

    let (result, out) = run("send temp20", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, format!("sent temp20: 227 timings at 38000Hz in {}us\n", total));
    assert_eq!(engine.transmitter().played[0].0, preset.durations);

    assert_eq!(run("send heat", &mut engine).0, Err(ConsoleError::NoSuchSignal));
}

#[test]
fn test_receiver_test_command() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    assert_eq!(run("test 0", &mut engine).0, Err(ConsoleError::OutOfRange));
    assert_eq!(run("test 61", &mut engine).0, Err(ConsoleError::OutOfRange));
    assert_eq!(run("test soon", &mut engine).0, Err(ConsoleError::InvalidValue));

    let (result, out) = run("test", &mut engine);
    assert!(result.is_ok());
    assert!(out.starts_with("receiver test: 10s"));

    let (_, out) = run("status", &mut engine);
    assert!(out.contains("receiver test: running"));

    while fx.log.drain().is_some() {}
    engine.poll(10_000_000);
    let (_, out) = run("status", &mut engine);
    assert!(!out.contains("receiver test"));

    let entry = fx.log.drain().unwrap();
    assert_eq!(entry.level, LogLevel::Warn);
    assert!(entry.message().contains("no changes detected"));
}

#[test]
fn test_defaults_restores_parameters() {
    let fx = Fixture::new();
    let mut engine = fx.engine();

    assert!(run("set debounce_us 500", &mut engine).0.is_ok());
    assert!(run("set active_low off", &mut engine).0.is_ok());

    let (result, out) = run("defaults", &mut engine);
    assert!(result.is_ok());
    assert_eq!(out, "parameters restored to defaults\n");
    assert_eq!(fx.config.debounce_us(), 20);
    assert!(fx.config.active_low());
}
