//! Color types and hue-aware blending.
//!
//! Colors on the wire are 8-bit RGB. Fades and cross-color blends go through
//! HSV so that hue travels the short way around the color circle instead of
//! washing through gray.

mod interpolate;
mod utils;

pub use interpolate::{hsv_lerp, interpolate, lerp_hue};
use smart_leds::{RGB8, hsv::Hsv as HSV};
pub use smart_leds::hsv::hsv2rgb;
pub use utils::{blend_colors, rgb_from_u32, rgb2hsv};

pub type Rgb = RGB8;
pub type Hsv = HSV;

/// All channels off.
pub const BLACK: Rgb = Rgb::new(0, 0, 0);
