//! Hardware abstraction for the capture and replay engine.
//!
//! Thin seams only: the core modules see a microsecond `Clock` plus the
//! `embedded-hal` `OutputPin` and `DelayNs` traits. The ESP-IDF backing
//! lives in `esp` and is compiled for the device only.

pub mod gpio;

#[cfg(target_os = "espidf")]
pub mod esp;

pub use gpio::ReceiverConfig;

/// Free-running microsecond clock.
///
/// Wraps at `u32::MAX`; callers compare instants with `wrapping_sub`.
pub trait Clock {
    fn now_us(&self) -> u32;
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline]
    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}
