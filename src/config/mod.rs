//! Module: config
//!
//! Purpose: Runtime tunables for the capture path and the transmitter.
//!
//! Architecture:
//! - `EngineConfig`: one atomic per parameter, shared by ISR, timer and console
//! - `PARAMS`: descriptor table driving the console `set` / `config` commands
//!
//! Safety: RT-safe. All access via atomics, no locks.
//!
//! Nothing here is persisted; values return to their defaults on power-up
//! or on the console `defaults` command.

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU32, Ordering};

/// Capacity of one captured sequence (durations).
pub const MAX_TRANSITIONS: usize = 1024;

/// Number of completed sequences the bank holds.
pub const MAX_SIGNALS: usize = 5;

/// Frame completion detector period.
pub const DETECTOR_PERIOD_MS: u32 = 5;

/// Main loop poll period.
pub const MAIN_LOOP_PERIOD_MS: u32 = 10;

pub const DEFAULT_DEBOUNCE_US: u32 = 20;
pub const DEFAULT_MIN_PULSE_US: u32 = 50;
pub const DEFAULT_MAX_PULSE_US: u32 = 50_000;
pub const DEFAULT_SILENCE_GAP_US: u32 = 10_000;
pub const DEFAULT_MIN_VALID_COUNT: u16 = 10;
pub const DEFAULT_CARRIER_HZ: u32 = 38_000;

/// Engine configuration.
///
/// Loads are `Relaxed`: a parameter change only has to become visible
/// eventually, and no other data is published through these fields.
pub struct EngineConfig {
    debounce_us: AtomicU32,
    min_pulse_us: AtomicU32,
    max_pulse_us: AtomicU32,
    silence_gap_us: AtomicU32,
    min_valid_count: AtomicU16,
    carrier_hz: AtomicU32,
    active_low: AtomicBool,
    abort_on_long_pulse: AtomicBool,
}

/// Capture parameters loaded once per edge or tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureParams {
    pub debounce_us: u32,
    pub min_pulse_us: u32,
    pub max_pulse_us: u32,
    pub silence_gap_us: u32,
    pub min_valid_count: u16,
    pub active_low: bool,
    pub abort_on_long_pulse: bool,
}

impl EngineConfig {
    /// Create a configuration holding the defaults.
    pub const fn new() -> Self {
        Self {
            debounce_us: AtomicU32::new(DEFAULT_DEBOUNCE_US),
            min_pulse_us: AtomicU32::new(DEFAULT_MIN_PULSE_US),
            max_pulse_us: AtomicU32::new(DEFAULT_MAX_PULSE_US),
            silence_gap_us: AtomicU32::new(DEFAULT_SILENCE_GAP_US),
            min_valid_count: AtomicU16::new(DEFAULT_MIN_VALID_COUNT),
            carrier_hz: AtomicU32::new(DEFAULT_CARRIER_HZ),
            active_low: AtomicBool::new(true),
            abort_on_long_pulse: AtomicBool::new(false),
        }
    }

    /// Load everything the capturer and detector need.
    #[inline]
    pub fn capture_params(&self) -> CaptureParams {
        CaptureParams {
            debounce_us: self.debounce_us(),
            min_pulse_us: self.min_pulse_us(),
            max_pulse_us: self.max_pulse_us(),
            silence_gap_us: self.silence_gap_us(),
            min_valid_count: self.min_valid_count(),
            active_low: self.active_low(),
            abort_on_long_pulse: self.abort_on_long_pulse(),
        }
    }

    #[inline]
    pub fn debounce_us(&self) -> u32 {
        self.debounce_us.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn min_pulse_us(&self) -> u32 {
        self.min_pulse_us.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn max_pulse_us(&self) -> u32 {
        self.max_pulse_us.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn silence_gap_us(&self) -> u32 {
        self.silence_gap_us.load(Ordering::Relaxed)
    }

    /// Sequences with this many durations or fewer are treated as noise.
    #[inline]
    pub fn min_valid_count(&self) -> u16 {
        self.min_valid_count.load(Ordering::Relaxed)
    }

    /// Default carrier used when a transmit request names none.
    #[inline]
    pub fn carrier_hz(&self) -> u32 {
        self.carrier_hz.load(Ordering::Relaxed)
    }

    /// True for idle-high receivers (TSOP style): a falling edge starts a frame.
    #[inline]
    pub fn active_low(&self) -> bool {
        self.active_low.load(Ordering::Relaxed)
    }

    /// Abort (instead of continue) a capture when an over-long pulse shows up.
    #[inline]
    pub fn abort_on_long_pulse(&self) -> bool {
        self.abort_on_long_pulse.load(Ordering::Relaxed)
    }

    pub fn set_debounce_us(&self, value: u32) {
        self.debounce_us.store(value, Ordering::Relaxed);
    }

    pub fn set_min_pulse_us(&self, value: u32) {
        self.min_pulse_us.store(value, Ordering::Relaxed);
    }

    pub fn set_max_pulse_us(&self, value: u32) {
        self.max_pulse_us.store(value, Ordering::Relaxed);
    }

    pub fn set_silence_gap_us(&self, value: u32) {
        self.silence_gap_us.store(value, Ordering::Relaxed);
    }

    pub fn set_min_valid_count(&self, value: u16) {
        self.min_valid_count.store(value, Ordering::Relaxed);
    }

    pub fn set_carrier_hz(&self, value: u32) {
        self.carrier_hz.store(value, Ordering::Relaxed);
    }

    pub fn set_active_low(&self, value: bool) {
        self.active_low.store(value, Ordering::Relaxed);
    }

    pub fn set_abort_on_long_pulse(&self, value: bool) {
        self.abort_on_long_pulse.store(value, Ordering::Relaxed);
    }

    /// Restore every parameter to its default.
    pub fn restore_defaults(&self) {
        let defaults = Self::new();
        self.debounce_us.store(defaults.debounce_us(), Ordering::Relaxed);
        self.min_pulse_us.store(defaults.min_pulse_us(), Ordering::Relaxed);
        self.max_pulse_us.store(defaults.max_pulse_us(), Ordering::Relaxed);
        self.silence_gap_us.store(defaults.silence_gap_us(), Ordering::Relaxed);
        self.min_valid_count.store(defaults.min_valid_count(), Ordering::Relaxed);
        self.carrier_hz.store(defaults.carrier_hz(), Ordering::Relaxed);
        self.active_low.store(defaults.active_low(), Ordering::Relaxed);
        self.abort_on_long_pulse.store(defaults.abort_on_long_pulse(), Ordering::Relaxed);
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Console parameter table
// ============================================================================

/// Typed parameter value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamValue {
    U16(u16),
    U32(u32),
    Bool(bool),
}

impl core::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParamValue::U16(v) => core::fmt::Display::fmt(v, f),
            ParamValue::U32(v) => core::fmt::Display::fmt(v, f),
            ParamValue::Bool(v) => core::fmt::Display::fmt(v, f),
        }
    }
}

/// Parameter type with its accepted range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamType {
    U16 { min: u16, max: u16 },
    U32 { min: u32, max: u32 },
    Bool,
}

/// Why a parameter write was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamSetError {
    /// Value does not parse as the parameter's type.
    InvalidValue,
    /// Value parses but lies outside the accepted range.
    OutOfRange,
}

/// One entry of the parameter table.
pub struct ParamDescriptor {
    pub name: &'static str,
    pub brief: &'static str,
    pub param_type: ParamType,
    pub get_fn: fn(&EngineConfig) -> ParamValue,
    pub set_fn: fn(&EngineConfig, ParamValue),
}

impl ParamDescriptor {
    /// Parse `text` as this parameter's type and check the range.
    pub fn parse(&self, text: &str) -> Result<ParamValue, ParamSetError> {
        match self.param_type {
            ParamType::Bool => match text {
                "true" | "1" | "on" => Ok(ParamValue::Bool(true)),
                "false" | "0" | "off" => Ok(ParamValue::Bool(false)),
                _ => Err(ParamSetError::InvalidValue),
            },
            ParamType::U16 { min, max } => {
                let v: u16 = text.parse().map_err(|_| ParamSetError::InvalidValue)?;
                if v < min || v > max {
                    return Err(ParamSetError::OutOfRange);
                }
                Ok(ParamValue::U16(v))
            }
            ParamType::U32 { min, max } => {
                let v: u32 = text.parse().map_err(|_| ParamSetError::InvalidValue)?;
                if v < min || v > max {
                    return Err(ParamSetError::OutOfRange);
                }
                Ok(ParamValue::U32(v))
            }
        }
    }

    /// Parse, validate and store `text` into `config`.
    pub fn apply(&self, config: &EngineConfig, text: &str) -> Result<ParamValue, ParamSetError> {
        let value = self.parse(text)?;
        (self.set_fn)(config, value);
        Ok(value)
    }

    /// Current value in `config`.
    pub fn get(&self, config: &EngineConfig) -> ParamValue {
        (self.get_fn)(config)
    }
}

fn as_u32(v: ParamValue) -> u32 {
    match v {
        ParamValue::U32(n) => n,
        ParamValue::U16(n) => n as u32,
        ParamValue::Bool(b) => b as u32,
    }
}

fn as_bool(v: ParamValue) -> bool {
    match v {
        ParamValue::Bool(b) => b,
        ParamValue::U16(n) => n != 0,
        ParamValue::U32(n) => n != 0,
    }
}

/// All console-visible parameters.
pub static PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor {
        name: "debounce_us",
        brief: "Minimum spacing between accepted edges",
        param_type: ParamType::U32 { min: 0, max: 1_000 },
        get_fn: |c| ParamValue::U32(c.debounce_us()),
        set_fn: |c, v| c.set_debounce_us(as_u32(v)),
    },
    ParamDescriptor {
        name: "min_pulse_us",
        brief: "Shortest duration kept in a capture",
        param_type: ParamType::U32 { min: 1, max: 10_000 },
        get_fn: |c| ParamValue::U32(c.min_pulse_us()),
        set_fn: |c, v| c.set_min_pulse_us(as_u32(v)),
    },
    ParamDescriptor {
        name: "max_pulse_us",
        brief: "Longest duration kept in a capture",
        param_type: ParamType::U32 { min: 100, max: u16::MAX as u32 },
        get_fn: |c| ParamValue::U32(c.max_pulse_us()),
        set_fn: |c, v| c.set_max_pulse_us(as_u32(v)),
    },
    ParamDescriptor {
        name: "silence_gap_us",
        brief: "Silence that ends a frame",
        param_type: ParamType::U32 { min: 1_000, max: 1_000_000 },
        get_fn: |c| ParamValue::U32(c.silence_gap_us()),
        set_fn: |c, v| c.set_silence_gap_us(as_u32(v)),
    },
    ParamDescriptor {
        name: "min_valid_count",
        brief: "Frames with this many timings or fewer are noise",
        param_type: ParamType::U16 { min: 0, max: (MAX_TRANSITIONS - 1) as u16 },
        get_fn: |c| ParamValue::U16(c.min_valid_count()),
        set_fn: |c, v| c.set_min_valid_count(as_u32(v) as u16),
    },
    ParamDescriptor {
        name: "carrier_hz",
        brief: "Default transmit carrier",
        param_type: ParamType::U32 { min: 10_000, max: 500_000 },
        get_fn: |c| ParamValue::U32(c.carrier_hz()),
        set_fn: |c, v| c.set_carrier_hz(as_u32(v)),
    },
    ParamDescriptor {
        name: "active_low",
        brief: "Receiver idles high, falling edge starts a frame",
        param_type: ParamType::Bool,
        get_fn: |c| ParamValue::Bool(c.active_low()),
        set_fn: |c, v| c.set_active_low(as_bool(v)),
    },
    ParamDescriptor {
        name: "abort_long",
        brief: "Abort capture on an over-long pulse",
        param_type: ParamType::Bool,
        get_fn: |c| ParamValue::Bool(c.abort_on_long_pulse()),
        set_fn: |c, v| c.set_abort_on_long_pulse(as_bool(v)),
    },
];

/// Look up a parameter by exact name.
pub fn find_param(name: &str) -> Option<&'static ParamDescriptor> {
    PARAMS.iter().find(|p| p.name == name)
}

/// Parameters matching `pattern`; a trailing `*` matches by prefix.
pub fn find_params_matching(pattern: &str) -> impl Iterator<Item = &'static ParamDescriptor> + '_ {
    let (prefix, wildcard) = match pattern.strip_suffix('*') {
        Some(p) => (p, true),
        None => (pattern, false),
    };
    PARAMS.iter().filter(move |p| {
        if wildcard {
            p.name.starts_with(prefix)
        } else {
            p.name == prefix
        }
    })
}
