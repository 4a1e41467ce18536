//! Gamma correction for WS2812-class strips.
//!
//! LED output is roughly linear in duty cycle while perception is not; a
//! gamma curve around 2.2 makes low levels usable. The curve here is a
//! fixed-point approximation blending x^2 and x^3, which stays within one
//! step of the float curve and needs no tables.

use crate::OutputDriver;
use crate::color::{BLACK, Rgb};
use crate::math8::{blend8, scale8};

/// Fixed-point approximation of a gamma 2.2 transfer curve.
///
/// Monotonic, with exact endpoints: 0 maps to 0 and 255 to 255. Fits the
/// [`crate::math8::U8Adjuster`] shape so hosts can plug it into display
/// paths directly.
pub fn ws2812_gamma(value: u8) -> u8 {
    let squared = scale8(value, value);
    let cubed = scale8(squared, value);
    // x^2.2 sits about a fifth of the way from x^2 towards x^3.
    blend8(squared, cubed, 51)
}

/// Output driver adapter applying [`ws2812_gamma`] at the flush boundary.
pub struct GammaCorrected<O, const MAX_LEDS: usize> {
    inner: O,
    buffer: [Rgb; MAX_LEDS],
}

impl<O, const MAX_LEDS: usize> GammaCorrected<O, MAX_LEDS> {
    /// Wrap `inner` so every flush is gamma corrected.
    pub const fn new(inner: O) -> Self {
        Self {
            inner,
            buffer: [BLACK; MAX_LEDS],
        }
    }

    /// The wrapped driver.
    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: OutputDriver, const MAX_LEDS: usize> OutputDriver
    for GammaCorrected<O, MAX_LEDS>
{
    type Error = O::Error;

    fn write(&mut self, colors: &[Rgb]) -> Result<(), Self::Error> {
        let count = colors.len().min(MAX_LEDS);
        for (corrected, color) in self.buffer[..count].iter_mut().zip(colors) {
            *corrected = Rgb {
                r: ws2812_gamma(color.r),
                g: ws2812_gamma(color.g),
                b: ws2812_gamma(color.b),
            };
        }
        self.inner.write(&self.buffer[..count])
    }
}
