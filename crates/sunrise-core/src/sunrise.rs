//! Sunrise animation stepper
//!
//! A single heat index walks the heat palette from black to white, one step
//! per fixed real-time interval, and stays at white once it gets there.

use embassy_time::{Duration, Instant};

use crate::color::{HEAT_COLORS, Rgb, color_from_palette, fill_solid};

/// Final heat index, reached after 255 steps
pub const MAX_HEAT_INDEX: u8 = u8::MAX;

/// Number of palette positions a sunrise is spread over
const PALETTE_STEPS: u64 = 256;

/// Time between two steps for a sunrise of `sunrise_length`.
///
/// `floor(length_secs / 256)` seconds, never below one second.
pub fn step_interval(sunrise_length: Duration) -> Duration {
    let secs = sunrise_length.as_secs() / PALETTE_STEPS;
    Duration::from_secs(secs.max(1))
}

#[derive(Debug, Clone)]
pub struct SunriseStepper {
    heat_index: u8,
    interval: Duration,
    last_step: Option<Instant>,
}

impl SunriseStepper {
    /// Create a stepper at black that advances once per `interval`
    pub const fn new(interval: Duration) -> Self {
        Self {
            heat_index: 0,
            interval,
            last_step: None,
        }
    }

    /// Create a stepper that reaches white after about `sunrise_length`
    pub fn with_length(sunrise_length: Duration) -> Self {
        Self::new(step_interval(sunrise_length))
    }

    pub fn heat_index(&self) -> u8 {
        self.heat_index
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_complete(&self) -> bool {
        self.heat_index == MAX_HEAT_INDEX
    }

    /// Colour for the current heat index
    pub fn color(&self) -> Rgb {
        color_from_palette(&HEAT_COLORS, self.heat_index)
    }

    /// Advance the heat index if a full interval has passed.
    ///
    /// The first call only starts the interval timer. Returns whether the
    /// index moved.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(last_step) = self.last_step else {
            self.last_step = Some(now);
            return false;
        };
        if now.saturating_duration_since(last_step) < self.interval {
            return false;
        }

        self.last_step = Some(now);
        if self.is_complete() {
            return false;
        }
        self.heat_index += 1;
        true
    }

    /// Paint the whole buffer with the current colour, then advance.
    ///
    /// Returns the colour that was painted.
    pub fn render(&mut self, now: Instant, leds: &mut [Rgb]) -> Rgb {
        let color = self.color();
        fill_solid(leds, color);
        self.tick(now);
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_only_arms_the_timer() {
        let mut stepper = SunriseStepper::new(Duration::from_secs(1));
        assert!(!stepper.tick(Instant::from_secs(100)));
        assert_eq!(stepper.heat_index(), 0);
        assert!(stepper.tick(Instant::from_secs(101)));
        assert_eq!(stepper.heat_index(), 1);
    }

    #[test]
    fn render_paints_before_advancing() {
        let mut stepper = SunriseStepper::new(Duration::from_secs(1));
        let mut leds = [Rgb::new(1, 2, 3); 2];
        stepper.render(Instant::from_secs(0), &mut leds);
        let painted = stepper.render(Instant::from_secs(1), &mut leds);
        assert_eq!(painted, Rgb::new(0, 0, 0));
        assert_eq!(leds, [Rgb::new(0, 0, 0); 2]);
        assert_eq!(stepper.heat_index(), 1);
    }
}
