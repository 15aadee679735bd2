//! GPIO assignment for the IR receiver.
//!
//! The emitter (GPIO16) and status LED (GPIO25) are typed `PinDriver`s in
//! the firmware binary.

/// IR receiver input (TSOP style demodulator).
///
/// Interrupt on both edges, no pulls: the module drives the line itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReceiverConfig {
    pub pin: i32,
    /// Line idles high and goes low while carrier is present.
    pub active_low: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            pin: 17,
            active_low: true,
        }
    }
}
