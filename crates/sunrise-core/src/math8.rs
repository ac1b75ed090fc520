/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
///
/// Uses the "fixed" variant (`scale + 1`) so that a scale of 255 keeps the
/// value unchanged.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Mix two 8-bit values
///
/// # Arguments
/// * `a` - First value
/// * `b` - Second value
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub const fn mix8(a: u8, b: u8, amount_of_b: u8) -> u8 {
    scale8(a, 255 - amount_of_b).saturating_add(scale8(b, amount_of_b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_scale_keeps_value() {
        for value in 0..=255u8 {
            assert_eq!(scale8(value, 255), value);
            assert_eq!(scale8(value, 0), 0);
        }
    }

    #[test]
    fn mix_of_equal_extremes_is_stable() {
        for amount in 0..=255u8 {
            assert_eq!(mix8(255, 255, amount), 255);
            assert_eq!(mix8(0, 0, amount), 0);
        }
    }
}
