//! Module: transmit
//!
//! Purpose: Replay a raw sequence through a carrier-modulated IR LED.
//!
//! Timing:
//! ```text
//!   index:   0 (mark)        1 (space)   2 (mark)
//!   pin:     ┌┐┌┐┌┐┌┐┌┐      ________    ┌┐┌┐┌┐
//!            ┘└┘└┘└┘└┘└──────        ────┘└┘└┘└──
//!            |<-- D0 -->|<--- D1 --->|
//! ```
//! - Marks toggle at `half_period_us` and are gated on elapsed wall-clock,
//!   checked before every half period, so a mark ends within one half
//!   period of its stored length regardless of toggle overhead
//! - Spaces hold the pin low for exactly the stored length
//! - The pin is driven low once the sequence has played
//!
//! Safety: Busy-waits. Main loop only; never call from ISR or timer context.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

use crate::hal::Clock;
use crate::pulse::Phase;

/// Lowest accepted carrier frequency.
pub const MIN_CARRIER_HZ: u32 = 10_000;

/// Highest accepted carrier frequency (half period of 1µs).
pub const MAX_CARRIER_HZ: u32 = 500_000;

/// Why a carrier frequency was refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CarrierError {
    /// Zero Hz.
    Zero,
    /// Below `MIN_CARRIER_HZ`.
    TooLow(u32),
    /// Above `MAX_CARRIER_HZ`; the half period would round to zero.
    TooHigh(u32),
}

impl core::fmt::Display for CarrierError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CarrierError::Zero => write!(f, "carrier frequency is zero"),
            CarrierError::TooLow(hz) => {
                write!(f, "carrier {}Hz below {}Hz", hz, MIN_CARRIER_HZ)
            }
            CarrierError::TooHigh(hz) => {
                write!(f, "carrier {}Hz above {}Hz", hz, MAX_CARRIER_HZ)
            }
        }
    }
}

/// Validated carrier frequency.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Carrier {
    hz: u32,
    half_period_us: u32,
}

impl Carrier {
    /// 38kHz, the common consumer IR carrier.
    pub const DEFAULT: Carrier = Carrier {
        hz: 38_000,
        half_period_us: 1_000_000 / (2 * 38_000),
    };

    pub fn new(hz: u32) -> Result<Self, CarrierError> {
        if hz == 0 {
            return Err(CarrierError::Zero);
        }
        if hz < MIN_CARRIER_HZ {
            return Err(CarrierError::TooLow(hz));
        }
        if hz > MAX_CARRIER_HZ {
            return Err(CarrierError::TooHigh(hz));
        }
        Ok(Self {
            hz,
            half_period_us: 1_000_000 / (2 * hz),
        })
    }

    #[inline]
    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// `1_000_000 / (2 * hz)`, truncated.
    #[inline]
    pub fn half_period_us(&self) -> u32 {
        self.half_period_us
    }
}

impl Default for Carrier {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What one transmission did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransmitStats {
    /// Marks plus spaces played.
    pub segments: usize,
    /// Full carrier cycles emitted (rising edges).
    pub carrier_cycles: u32,
    /// Wall-clock time of the whole call.
    pub elapsed_us: u32,
}

/// Anything that can play a raw sequence.
pub trait Transmit {
    fn transmit(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats;
}

/// Placeholder for an absent status LED.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPin;

impl ErrorType for NoPin {
    type Error = Infallible;
}

impl OutputPin for NoPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Busy-wait carrier transmitter.
///
/// Pin errors are ignored during playback: the pins are configured at
/// construction and a GPIO write on the target cannot fail afterwards.
pub struct CarrierTransmitter<P, D, C, L = NoPin> {
    pin: P,
    delay: D,
    clock: C,
    status_led: L,
}

impl<P, D, C> CarrierTransmitter<P, D, C, NoPin>
where
    P: OutputPin,
    D: DelayNs,
    C: Clock,
{
    /// Takes ownership of the output and drives it low.
    pub fn new(mut pin: P, delay: D, clock: C) -> Result<Self, P::Error> {
        pin.set_low()?;
        Ok(Self {
            pin,
            delay,
            clock,
            status_led: NoPin,
        })
    }
}

impl<P, D, C, L> CarrierTransmitter<P, D, C, L>
where
    P: OutputPin,
    D: DelayNs,
    C: Clock,
    L: OutputPin,
{
    /// Add a status LED, lit while a transmission runs.
    pub fn with_status_led<L2: OutputPin>(
        self,
        mut led: L2,
    ) -> Result<CarrierTransmitter<P, D, C, L2>, L2::Error> {
        led.set_low()?;
        Ok(CarrierTransmitter {
            pin: self.pin,
            delay: self.delay,
            clock: self.clock,
            status_led: led,
        })
    }

    fn mark(&mut self, duration_us: u32, half_us: u32) -> u32 {
        let start = self.clock.now_us();
        let mut cycles = 0;
        loop {
            if self.clock.now_us().wrapping_sub(start) >= duration_us {
                break;
            }
            let _ = self.pin.set_high();
            cycles += 1;
            self.delay.delay_us(half_us);

            if self.clock.now_us().wrapping_sub(start) >= duration_us {
                break;
            }
            let _ = self.pin.set_low();
            self.delay.delay_us(half_us);
        }
        let _ = self.pin.set_low();
        cycles
    }

    fn space(&mut self, duration_us: u32) {
        let _ = self.pin.set_low();
        self.delay.delay_us(duration_us);
    }
}

impl<P, D, C, L> Transmit for CarrierTransmitter<P, D, C, L>
where
    P: OutputPin,
    D: DelayNs,
    C: Clock,
    L: OutputPin,
{
    fn transmit(&mut self, durations: &[u16], carrier: Carrier) -> TransmitStats {
        let half_us = carrier.half_period_us();
        let start = self.clock.now_us();
        let mut stats = TransmitStats::default();

        let _ = self.status_led.set_high();

        for (i, &d) in durations.iter().enumerate() {
            match Phase::of_index(i) {
                Phase::Mark => stats.carrier_cycles += self.mark(d as u32, half_us),
                Phase::Space => self.space(d as u32),
            }
            stats.segments += 1;
        }

        let _ = self.pin.set_low();
        let _ = self.status_led.set_low();

        stats.elapsed_us = self.clock.now_us().wrapping_sub(start);
        stats
    }
}
