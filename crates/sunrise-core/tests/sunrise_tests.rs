//! Integration tests for the heat palette and the sunrise stepper.

use embassy_time::{Duration, Instant};
use sunrise_core::color::rgb_from_u32;
use sunrise_core::sunrise::MAX_HEAT_INDEX;
use sunrise_core::{HEAT_COLORS, Rgb, SunriseStepper, color_from_palette, step_interval};

// -----------------------------------------------------------------------------
// Palette
// -----------------------------------------------------------------------------

#[test]
fn palette_entries_are_hit_exactly() {
    for (i, entry) in HEAT_COLORS.iter().enumerate() {
        let index = u8::try_from(i * 16).unwrap();
        assert_eq!(color_from_palette(&HEAT_COLORS, index), *entry, "index {index}");
    }
}

#[test]
fn sunrise_starts_black_and_ends_white() {
    assert_eq!(color_from_palette(&HEAT_COLORS, 0), Rgb::new(0, 0, 0));
    assert_eq!(color_from_palette(&HEAT_COLORS, 255), Rgb::new(255, 255, 255));
}

#[test]
fn last_band_does_not_wrap_to_black() {
    for index in 240..=255u8 {
        assert_eq!(color_from_palette(&HEAT_COLORS, index), rgb_from_u32(0xFF_FFFF));
    }
}

#[test]
fn blending_between_entries() {
    // Halfway between 0x000000 and 0x330000.
    assert_eq!(color_from_palette(&HEAT_COLORS, 8), Rgb::new(25, 0, 0));
    // Halfway between 0xFF0000 and 0xFF3300.
    assert_eq!(color_from_palette(&HEAT_COLORS, 88), Rgb::new(255, 25, 0));
}

#[test]
fn colors_never_get_darker_along_the_sunrise() {
    let mut previous = color_from_palette(&HEAT_COLORS, 0);
    for index in 1..=255u8 {
        let color = color_from_palette(&HEAT_COLORS, index);
        assert!(color.r >= previous.r, "red drops at {index}");
        assert!(color.g >= previous.g, "green drops at {index}");
        assert!(color.b >= previous.b, "blue drops at {index}");
        previous = color;
    }
}

#[test]
fn lookup_is_deterministic_for_every_index() {
    for index in 0..=255u8 {
        assert_eq!(
            color_from_palette(&HEAT_COLORS, index),
            color_from_palette(&HEAT_COLORS, index)
        );
    }
}

// -----------------------------------------------------------------------------
// Step interval
// -----------------------------------------------------------------------------

#[test]
fn five_minute_sunrise_steps_every_second() {
    assert_eq!(step_interval(Duration::from_secs(5 * 60)), Duration::from_secs(1));
}

#[test]
fn thirty_minute_sunrise_steps_every_seven_seconds() {
    assert_eq!(step_interval(Duration::from_secs(30 * 60)), Duration::from_secs(7));
}

#[test]
fn short_sunrise_is_clamped_to_one_second() {
    assert_eq!(step_interval(Duration::from_secs(60)), Duration::from_secs(1));
    assert_eq!(step_interval(Duration::from_secs(0)), Duration::from_secs(1));
}

// -----------------------------------------------------------------------------
// Stepper
// -----------------------------------------------------------------------------

#[test]
fn does_not_step_before_interval() {
    let mut stepper = SunriseStepper::new(Duration::from_secs(7));
    stepper.tick(Instant::from_secs(0));
    assert!(!stepper.tick(Instant::from_millis(6_999)));
    assert_eq!(stepper.heat_index(), 0);
    assert!(stepper.tick(Instant::from_secs(7)));
    assert_eq!(stepper.heat_index(), 1);
}

#[test]
fn steps_by_exactly_one_per_interval() {
    let mut stepper = SunriseStepper::new(Duration::from_secs(1));
    stepper.tick(Instant::from_secs(0));
    // A long stall still advances a single step.
    assert!(stepper.tick(Instant::from_secs(60)));
    assert_eq!(stepper.heat_index(), 1);
    // The interval restarts from the last step.
    assert!(!stepper.tick(Instant::from_millis(60_500)));
    assert!(stepper.tick(Instant::from_secs(61)));
    assert_eq!(stepper.heat_index(), 2);
}

#[test]
fn counter_saturates_and_never_decreases() {
    let mut stepper = SunriseStepper::new(Duration::from_secs(1));
    let mut leds = [Rgb::default(); 1];
    let mut previous = stepper.heat_index();

    for second in 0..400u64 {
        stepper.render(Instant::from_secs(second), &mut leds);
        assert!(stepper.heat_index() >= previous);
        previous = stepper.heat_index();
    }

    assert_eq!(stepper.heat_index(), MAX_HEAT_INDEX);
    assert!(stepper.is_complete());
    assert_eq!(leds[0], Rgb::new(255, 255, 255));
}

#[test]
fn render_overwrites_every_pixel_each_call() {
    let mut stepper = SunriseStepper::with_length(Duration::from_secs(30 * 60));
    let mut leds = [Rgb::new(9, 9, 9); 3];

    stepper.render(Instant::from_secs(0), &mut leds);
    assert_eq!(leds, [Rgb::new(0, 0, 0); 3]);

    leds[1] = Rgb::new(1, 1, 1);
    stepper.render(Instant::from_secs(1), &mut leds);
    assert_eq!(leds, [Rgb::new(0, 0, 0); 3]);
}
