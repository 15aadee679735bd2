//! # RustRawIr
//!
//! Protocol-agnostic infrared capture and replay.
//!
//! ## Architecture
//!
//! A receiver edge ISR and a periodic detector timer fill a single
//! lock-free [`CaptureSession`]; the main loop moves finished captures into
//! a bounded [`SignalBank`] and replays them through a carrier-modulated
//! [`CarrierTransmitter`].
//!
//! - Interrupt and timer paths never block and never print
//! - All state shared with them is atomic, published with release/acquire
//! - No heap allocation, no globals: the firmware binary owns the statics

#![cfg_attr(not(test), no_std)]

pub mod bank;
pub mod capture;
pub mod config;
pub mod console;
pub mod detector;
pub mod engine;
pub mod hal;
pub mod log_drain;
pub mod logging;
pub mod presets;
pub mod pulse;
pub mod render;
pub mod session;
pub mod sim;
pub mod stats;
pub mod transmit;

pub use bank::{CollectOutcome, SignalBank};
pub use capture::{EdgeCapturer, EdgeOutcome};
pub use config::EngineConfig;
pub use detector::{FrameDetector, TickOutcome};
pub use engine::IrEngine;
pub use hal::Clock;
pub use logging::{LogLevel, LogStream};
pub use presets::{find_preset, Preset, PRESETS};
pub use pulse::{Label, Phase, PulseSequence, SignalView};
pub use session::{CapturePhase, CaptureSession};
pub use stats::{CaptureCounters, Counter};
pub use transmit::{Carrier, CarrierError, CarrierTransmitter, Transmit, TransmitStats};
