use sunrise_core::Rgb;

/// Output stage for the pixel buffer
pub trait LedDriver {
    fn write(&mut self, colors: &[Rgb]);
}
