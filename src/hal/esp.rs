//! ESP-IDF backing for the HAL seams (device builds only).

use core::ffi::c_void;

use esp_idf_svc::sys::{self, esp, EspError};

use super::{Clock, ReceiverConfig};

/// `esp_timer` based microsecond clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct EspClock;

impl Clock for EspClock {
    #[inline]
    fn now_us(&self) -> u32 {
        // SAFETY: esp_timer is started by the IDF before app_main.
        unsafe { sys::esp_timer_get_time() as u32 }
    }
}

/// Edge interrupt handler signature expected by the GPIO ISR service.
pub type EdgeIsr = unsafe extern "C" fn(arg: *mut c_void);

/// Configure the receiver pin as input, interrupt on any edge, and attach
/// `handler`.
pub fn install_receiver_isr(config: &ReceiverConfig, handler: EdgeIsr) -> Result<(), EspError> {
    let io = sys::gpio_config_t {
        pin_bit_mask: 1u64 << config.pin,
        mode: sys::gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: sys::gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: sys::gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: sys::gpio_int_type_t_GPIO_INTR_ANYEDGE,
        ..Default::default()
    };

    // SAFETY: plain IDF driver calls with a valid config; the handler
    // receives a null argument and touches only atomics.
    unsafe {
        esp!(sys::gpio_config(&io))?;
        esp!(sys::gpio_install_isr_service(0))?;
        esp!(sys::gpio_isr_handler_add(config.pin, Some(handler), core::ptr::null_mut()))?;
    }
    Ok(())
}

/// Current level of an input pin (ISR-safe).
#[inline]
pub fn read_level(pin: i32) -> bool {
    // SAFETY: register read only.
    unsafe { sys::gpio_get_level(pin) != 0 }
}
