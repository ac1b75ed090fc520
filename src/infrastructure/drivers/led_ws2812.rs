use esp_hal::xtensa_lx::interrupt;
use esp_hal::{gpio::interconnect::PeripheralOutput, peripherals::RMT, rmt::Rmt, time::Rate};
use esp_hal_smartled::{SmartLedsAdapter, buffer_size, smart_led_buffer};
use log::warn;
use smart_leds::SmartLedsWrite;
use static_cell::make_static;
use sunrise_core::Rgb;

use crate::config::LED_COUNT;
use crate::domain::ports::LedDriver;

/// WS2812B output on the RMT peripheral
pub struct EspLedDriver<'a> {
    adapter: SmartLedsAdapter<'a, { buffer_size(LED_COUNT) }>,
}

impl<'a> EspLedDriver<'a> {
    /// Create a driver for the pixel chain on `pin`
    pub fn new<O>(rmt: RMT<'a>, pin: O) -> Self
    where
        O: PeripheralOutput<'a>,
    {
        let rmt = Rmt::new(rmt, Rate::from_mhz(80)).unwrap();
        let rmt_buffer = make_static!(smart_led_buffer!(LED_COUNT));
        let adapter = SmartLedsAdapter::new(rmt.channel0, pin, rmt_buffer);

        Self { adapter }
    }
}

impl LedDriver for EspLedDriver<'static> {
    fn write(&mut self, colors: &[Rgb]) {
        // WS2812 timing does not survive an interrupt in the middle of a frame.
        let result = interrupt::free(|| self.adapter.write(colors.iter().copied()));
        if let Err(e) = result {
            warn!("led: write failed: {:?}", e);
        }
    }
}
