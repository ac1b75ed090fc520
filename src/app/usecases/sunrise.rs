use embassy_time::{Duration, Instant, Ticker};
use log::{info, warn};
use sunrise_core::{RefreshGate, Rgb, SunriseStepper, WallClock};

use crate::config::LED_COUNT;
use crate::domain::ports::{LedDriver, TimeSource};

/// State of the main loop: pixel buffer, clock refresh gate and heat stepper.
pub struct SunriseContext<L: LedDriver, T: TimeSource> {
    leds: [Rgb; LED_COUNT],
    led_driver: L,
    time_source: T,
    gate: RefreshGate,
    clock: WallClock,
    stepper: SunriseStepper,
}

impl<L: LedDriver, T: TimeSource> SunriseContext<L, T> {
    pub fn new(
        led_driver: L,
        time_source: T,
        sunrise_length: Duration,
        refresh_interval: Duration,
        utc_offset_secs: i64,
        now: Instant,
    ) -> Self {
        Self {
            leds: [Rgb::default(); LED_COUNT],
            led_driver,
            time_source,
            gate: RefreshGate::new(refresh_interval, now),
            clock: WallClock::new(utc_offset_secs),
            stepper: SunriseStepper::with_length(sunrise_length),
        }
    }

    /// Refresh the clock on the next frame regardless of the gate
    pub fn force_time_refresh(&mut self) {
        self.gate.force();
    }

    pub async fn run_frame(&mut self, now: Instant) {
        if self.gate.poll(now) {
            self.refresh_clock().await;
        }

        self.stepper.render(now, &mut self.leds);
        self.led_driver.write(&self.leds);
    }

    pub async fn run(mut self, frame_interval: Duration) -> ! {
        info!(
            "sunrise: stepping every {}s",
            self.stepper.interval().as_secs()
        );
        let mut ticker = Ticker::every(frame_interval);
        loop {
            self.run_frame(Instant::now()).await;
            ticker.next().await;
        }
    }

    async fn refresh_clock(&mut self) {
        match self.time_source.fetch_unix_time().await {
            Ok(unix_secs) => self.clock.synchronize(unix_secs, Instant::now()),
            Err(err) => warn!("time: update failed: {:?}", err),
        }

        match self.clock.local_time(Instant::now()) {
            Some(epoch) => info!("epoch time: {}", epoch),
            None => warn!("time: clock not synchronized"),
        }
    }
}
