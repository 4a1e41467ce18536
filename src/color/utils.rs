use crate::{
    color::{Hsv, Rgb},
    math8::blend8,
};

/// Blend two RGB colors channel-wise
///
/// # Arguments
/// * `a` - First color
/// * `b` - Second color
/// * `amount_of_b` - Blend factor (0 = all a, 255 = all b)
#[inline]
pub fn blend_colors(a: Rgb, b: Rgb, amount_of_b: u8) -> Rgb {
    Rgb {
        r: blend8(a.r, b.r, amount_of_b),
        g: blend8(a.g, b.g, amount_of_b),
        b: blend8(a.b, b.b, amount_of_b),
    }
}

/// Create an RGB color from a u32 value (0xRRGGBB format)
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}

/// Convert RGB to HSV (all channels are 0-255).
///
/// Hue is represented on a 0-255 circle, matching `smart_leds::hsv::Hsv`.
/// Sectors use the common integer approximation with 0, 85 and 171 offsets
/// for the red, green and blue thirds of the wheel.
#[allow(
    clippy::cast_lossless,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn rgb2hsv(rgb: Rgb) -> Hsv {
    let max = rgb.r.max(rgb.g).max(rgb.b);
    let min = rgb.r.min(rgb.g).min(rgb.b);
    let delta = max - min;

    if delta == 0 {
        // Achromatic: hue is meaningless, report zero.
        return Hsv {
            hue: 0,
            sat: 0,
            val: max,
        };
    }

    let sat = ((u16::from(delta) * 255) / u16::from(max)) as u8;

    let (offset, span) = if max == rgb.r {
        (0i16, i16::from(rgb.g) - i16::from(rgb.b))
    } else if max == rgb.g {
        (85i16, i16::from(rgb.b) - i16::from(rgb.r))
    } else {
        (171i16, i16::from(rgb.r) - i16::from(rgb.g))
    };

    let h = offset + (43i16 * span) / i16::from(delta);
    let hue = if h < 0 { (h + 256) as u8 } else { h as u8 };

    Hsv {
        hue,
        sat,
        val: max,
    }
}
