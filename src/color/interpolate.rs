//! HSV interpolation along the shorter hue arc.

use crate::color::{Hsv, Rgb, hsv2rgb, rgb2hsv};
use crate::math8::blend8;

/// Half of the 0-255 hue circle.
const HALF_TURN: i32 = 128;

/// Interpolate between two RGB colors through HSV space.
///
/// `t` runs 0-255: 0 yields `from`, 255 yields `to`. Hue moves along the
/// shorter arc of the hue circle, so a blend from red to violet stays in the
/// pinks instead of sweeping the whole spectrum backwards. Saturation and
/// value blend linearly.
pub fn interpolate(from: Rgb, to: Rgb, t: u8) -> Rgb {
    // Endpoints are returned untouched: the HSV round trip is lossy in
    // 8-bit space and the ends must be exact.
    if t == 0 {
        return from;
    }
    if t == 255 {
        return to;
    }
    hsv2rgb(hsv_lerp(rgb2hsv(from), rgb2hsv(to), t))
}

/// Blend two HSV colors, hue along the shorter arc.
pub fn hsv_lerp(a: Hsv, b: Hsv, t: u8) -> Hsv {
    Hsv {
        hue: lerp_hue(a.hue, b.hue, t),
        sat: blend8(a.sat, b.sat, t),
        val: blend8(a.val, b.val, t),
    }
}

/// Blend two hues (0-255 circle) along the shorter arc.
///
/// When the raw difference exceeds half a turn, the smaller hue is advanced
/// by a full turn before blending and the result is reduced modulo 256.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn lerp_hue(a: u8, b: u8, t: u8) -> u8 {
    let mut ha = i32::from(a);
    let mut hb = i32::from(b);

    if (hb - ha).abs() > HALF_TURN {
        if ha < hb {
            ha += 256;
        } else {
            hb += 256;
        }
    }

    let blended = ha + ((hb - ha) * i32::from(t)) / 255;
    (blended & 0xFF) as u8
}
