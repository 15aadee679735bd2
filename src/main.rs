//! RustRawIr - firmware entry point
//!
//! On the device (`target_os = "espidf"`):
//! 1. Receiver GPIO interrupt on both edges feeds the `EdgeCapturer`
//! 2. A 5ms esp_timer task ticks the `FrameDetector`
//! 3. The main loop (own thread, large stack for the bank) collects
//!    captures, drains logs and runs the UART0 console
//!
//! On the host the same engine runs on a simulated timeline: a sample frame
//! is replayed, demodulated and captured back, then stdin drives the
//! console.

#[cfg(target_os = "espidf")]
mod firmware {
    use core::ffi::c_void;
    use core::fmt;
    use core::sync::atomic::{AtomicI32, Ordering};
    use std::time::Duration;

    use esp_idf_svc::hal::delay::{Ets, FreeRtos, NON_BLOCK};
    use esp_idf_svc::hal::gpio::{AnyIOPin, PinDriver};
    use esp_idf_svc::hal::peripherals::Peripherals;
    use esp_idf_svc::hal::uart::{config::Config as UartConfig, UartDriver};
    use esp_idf_svc::hal::units::Hertz;
    use esp_idf_svc::sys::EspError;
    use esp_idf_svc::timer::EspTaskTimerService;

    use rust_raw_ir::config::{DETECTOR_PERIOD_MS, MAIN_LOOP_PERIOD_MS};
    use rust_raw_ir::console::Console;
    use rust_raw_ir::hal::esp::{install_receiver_isr, read_level, EspClock};
    use rust_raw_ir::hal::{Clock, ReceiverConfig};
    use rust_raw_ir::log_drain::{drain_to, report_dropped};
    use rust_raw_ir::{
        CaptureSession, CarrierTransmitter, EdgeCapturer, EngineConfig, FrameDetector, IrEngine,
        LogStream,
    };

    // Static allocations shared with the ISR and the timer task.
    static CONFIG: EngineConfig = EngineConfig::new();
    static SESSION: CaptureSession = CaptureSession::new();
    static LOG: LogStream = LogStream::new();
    static CAPTURER: EdgeCapturer<'static> = EdgeCapturer::new(&SESSION, &CONFIG, &LOG);
    static DETECTOR: FrameDetector<'static> = FrameDetector::new(&SESSION, &CONFIG, &LOG);
    static RECEIVER_PIN: AtomicI32 = AtomicI32::new(-1);

    // Bank (10KB), console line (8KB) and the sendraw scratch list live here.
    const MAIN_STACK_SIZE: usize = 40 * 1024;
    const DROPPED_REPORT_US: u32 = 10_000_000;

    unsafe extern "C" fn on_receiver_edge(_arg: *mut c_void) {
        let now_us = EspClock.now_us();
        CAPTURER.on_edge(now_us, read_level(RECEIVER_PIN.load(Ordering::Relaxed)));
    }

    fn receiver_line() -> bool {
        read_level(RECEIVER_PIN.load(Ordering::Relaxed))
    }

    /// `core::fmt::Write` over the console UART, LF to CRLF.
    struct UartOut<'a>(&'a UartDriver<'static>);

    impl fmt::Write for UartOut<'_> {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            for (i, part) in s.split('\n').enumerate() {
                if i > 0 {
                    self.0.write(b"\r\n").map_err(|_| fmt::Error)?;
                }
                self.0.write(part.as_bytes()).map_err(|_| fmt::Error)?;
            }
            Ok(())
        }
    }

    /// Why startup failed.
    #[derive(Debug)]
    pub enum StartupError {
        Esp(EspError),
        /// Emitter or status LED could not be driven low.
        OutputPin,
        /// Main loop thread could not be spawned.
        Thread,
    }

    impl From<EspError> for StartupError {
        fn from(e: EspError) -> Self {
            StartupError::Esp(e)
        }
    }

    pub fn run() -> Result<(), StartupError> {
        esp_idf_svc::sys::link_patches();

        let peripherals = Peripherals::take()?;
        let pins = peripherals.pins;

        let receiver = ReceiverConfig::default();
        CONFIG.set_active_low(receiver.active_low);
        RECEIVER_PIN.store(receiver.pin, Ordering::Relaxed);
        install_receiver_isr(&receiver, on_receiver_edge)?;

        let timer_service = EspTaskTimerService::new()?;
        let detector_timer = timer_service.timer(|| {
            DETECTOR.tick(EspClock.now_us());
        })?;
        detector_timer.every(Duration::from_millis(DETECTOR_PERIOD_MS as u64))?;

        let emitter = PinDriver::output(pins.gpio16)?;
        let status_led = PinDriver::output(pins.gpio25)?;
        let transmitter = CarrierTransmitter::new(emitter, Ets, EspClock)
            .map_err(|_| StartupError::OutputPin)?
            .with_status_led(status_led)
            .map_err(|_| StartupError::OutputPin)?;

        let uart = UartDriver::new(
            peripherals.uart0,
            pins.gpio1,
            pins.gpio3,
            Option::<AnyIOPin>::None,
            Option::<AnyIOPin>::None,
            &UartConfig::default().baudrate(Hertz(115_200)),
        )?;

        let main_loop = std::thread::Builder::new()
            .stack_size(MAIN_STACK_SIZE)
            .spawn(move || {
                let mut engine: IrEngine<'static, _> =
                    IrEngine::new(&SESSION, &CONFIG, &LOG, transmitter)
                        .with_receiver_level(receiver_line);
                let mut console = Console::new();
                let mut out = UartOut(&uart);
                let mut last_dropped_report = EspClock.now_us();

                console.print_banner(&mut out);

                loop {
                    let now_us = EspClock.now_us();
                    engine.poll(now_us);
                    drain_to(&LOG, &mut out);

                    if now_us.wrapping_sub(last_dropped_report) > DROPPED_REPORT_US {
                        report_dropped(&LOG, &mut out);
                        last_dropped_report = now_us;
                    }

                    let mut byte = [0u8; 1];
                    while let Ok(1) = uart.read(&mut byte, NON_BLOCK) {
                        console.process_byte(byte[0], &mut engine, &mut out);
                    }

                    FreeRtos::delay_ms(MAIN_LOOP_PERIOD_MS);
                }
            })
            .map_err(|_| StartupError::Thread)?;

        // The loop never returns; `detector_timer` must stay alive meanwhile.
        let _ = main_loop.join();
        drop(detector_timer);
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
mod host {
    use std::fmt;
    use std::io::{Read, Write as _};

    use rust_raw_ir::console::Console;
    use rust_raw_ir::hal::Clock;
    use rust_raw_ir::log_drain::drain_to;
    use rust_raw_ir::sim::{demodulate, run_for, SimClock, SimDelay, SimPin, SimTrace};
    use rust_raw_ir::{
        find_preset, Carrier, CaptureSession, CarrierTransmitter, EdgeCapturer, EngineConfig,
        FrameDetector, IrEngine, LogStream,
    };

    struct StdOut;

    impl fmt::Write for StdOut {
        fn write_str(&mut self, s: &str) -> fmt::Result {
            print!("{}", s);
            Ok(())
        }
    }

    pub fn run() {
        let config = EngineConfig::new();
        let session = CaptureSession::new();
        let log = LogStream::new();
        let clock = SimClock::starting_at(1_000);
        let trace = SimTrace::<8192>::new();

        let capturer = EdgeCapturer::new(&session, &config, &log);
        let detector = FrameDetector::new(&session, &config, &log);

        let transmitter =
            match CarrierTransmitter::new(SimPin::new(&trace, &clock), SimDelay::new(&clock), &clock) {
                Ok(tx) => tx,
                Err(never) => match never {},
            };
        let mut engine: IrEngine<'_, _> = IrEngine::new(&session, &config, &log, transmitter);
        let mut out = StdOut;

        // Loopback: replay a preset, recover the receiver envelope, capture it.
        let carrier = Carrier::DEFAULT;
        if let Some(preset) = find_preset("off") {
            engine.transmit_raw(preset.durations, carrier);
            demodulate(&trace, 2 * carrier.half_period_us(), config.active_low(), |t, level| {
                capturer.on_edge(t, level);
            });
            run_for(&clock, &detector, 2 * config.silence_gap_us() as u64);
            engine.poll(clock.now_us());
            drain_to(&log, &mut out);
        }

        let mut console = Console::new();
        console.print_banner(&mut out);
        let _ = std::io::stdout().flush();

        for byte in std::io::stdin().lock().bytes() {
            let Ok(byte) = byte else {
                break;
            };
            console.process_byte(byte, &mut engine, &mut out);
            run_for(&clock, &detector, 1_000);
            engine.poll(clock.now_us());
            drain_to(&log, &mut out);
            let _ = std::io::stdout().flush();
        }
        println!();
    }
}

#[cfg(target_os = "espidf")]
fn main() {
    if let Err(e) = firmware::run() {
        println!("startup failed: {:?}", e);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    host::run();
}
