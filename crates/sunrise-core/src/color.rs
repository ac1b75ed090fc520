//! Colour palette lookups

use smart_leds::RGB8;

use crate::math8::mix8;

/// RGB color type used throughout the lamp
pub type Rgb = RGB8;

/// A palette of 16 evenly spaced colours addressed by an 8-bit index
pub type Palette16 = [Rgb; 16];

/// Build a colour from a packed `0xRRGGBB` value
#[allow(clippy::cast_possible_truncation)]
pub const fn rgb_from_u32(packed: u32) -> Rgb {
    Rgb {
        r: (packed >> 16) as u8,
        g: (packed >> 8) as u8,
        b: packed as u8,
    }
}

/// Black through dark red, red, orange and yellow to white.
pub const HEAT_COLORS: Palette16 = [
    rgb_from_u32(0x00_0000),
    rgb_from_u32(0x33_0000),
    rgb_from_u32(0x66_0000),
    rgb_from_u32(0x99_0000),
    rgb_from_u32(0xCC_0000),
    rgb_from_u32(0xFF_0000),
    rgb_from_u32(0xFF_3300),
    rgb_from_u32(0xFF_6600),
    rgb_from_u32(0xFF_9900),
    rgb_from_u32(0xFF_CC00),
    rgb_from_u32(0xFF_FF00),
    rgb_from_u32(0xFF_FF33),
    rgb_from_u32(0xFF_FF66),
    rgb_from_u32(0xFF_FF99),
    rgb_from_u32(0xFF_FFCC),
    rgb_from_u32(0xFF_FFFF),
];

/// Look up a colour in a 16-entry palette with linear blending.
///
/// The high nibble of `index` picks an entry, the low nibble blends it
/// toward the next one. The last entry has no successor and does not wrap
/// around to the first, so indices 240..=255 all map to the last colour.
// Unlike FastLED's LINEARBLEND, which blends entry 15 back toward entry 0.
pub fn color_from_palette(palette: &Palette16, index: u8) -> Rgb {
    let hi4 = usize::from(index >> 4);
    let lo4 = index & 0x0F;

    let entry = palette[hi4];
    let Some(&next) = palette.get(hi4 + 1) else {
        return entry;
    };
    if lo4 == 0 {
        return entry;
    }

    let amount = lo4 << 4;
    Rgb {
        r: mix8(entry.r, next.r, amount),
        g: mix8(entry.g, next.g, amount),
        b: mix8(entry.b, next.b, amount),
    }
}

/// Fill every pixel with the same colour
pub fn fill_solid(leds: &mut [Rgb], color: Rgb) {
    for led in leds.iter_mut() {
        *led = color;
    }
}
