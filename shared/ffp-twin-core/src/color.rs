//! Packed color conversion.
//!
//! Fragment colors travel as ARGB words (`a<<24 | r<<16 | g<<8 | b`); each
//! channel is produced by truncating `channel * 255` in single precision.
//! Texels in external memory are RGBA with red in the low byte.

use glam::Vec4;

/// Clamp to `[0, 1]`.
#[inline]
pub fn clamp01(x: f32) -> f32 {
    x.min(1.0).max(0.0)
}

/// Pack float channels into an ARGB word.
#[inline]
pub fn pack_argb(r: f32, g: f32, b: f32, a: f32) -> u32 {
    pack_argb_bytes(
        (r * 255.0) as u32,
        (g * 255.0) as u32,
        (b * 255.0) as u32,
        (a * 255.0) as u32,
    )
}

/// Pack a float RGBA vector into an ARGB word.
#[inline]
pub fn pack_rgba_vec(c: Vec4) -> u32 {
    pack_argb(c.x, c.y, c.z, c.w)
}

#[inline]
pub fn pack_argb_bytes(r: u32, g: u32, b: u32, a: u32) -> u32 {
    (a << 24) | (r << 16) | (g << 8) | b
}

/// Unpack an ARGB word into normalized RGBA channels.
#[inline]
pub fn unpack_argb(color: u32) -> Vec4 {
    Vec4::new(
        ((color >> 16) & 0xFF) as f32 / 255.0,
        ((color >> 8) & 0xFF) as f32 / 255.0,
        (color & 0xFF) as f32 / 255.0,
        ((color >> 24) & 0xFF) as f32 / 255.0,
    )
}

/// Alpha byte of an ARGB word.
#[inline]
pub fn alpha_byte(color: u32) -> u32 {
    (color >> 24) & 0xFF
}

/// Unpack an RGBA texel (red in the low byte) into normalized channels.
///
/// The division is done in double precision and narrowed, which round-trips
/// every byte value through [`pack_argb`].
#[inline]
pub fn unpack_texel(texel: u32) -> Vec4 {
    let channel = |shift: u32| (((texel >> shift) & 0xFF) as f64 / 255.0) as f32;
    Vec4::new(channel(0), channel(8), channel(16), channel(24))
}

/// Convert an ARGB word to RGBA bytes for image output.
#[inline]
pub fn argb_to_rgba8(color: u32) -> [u8; 4] {
    [
        ((color >> 16) & 0xFF) as u8,
        ((color >> 8) & 0xFF) as u8,
        (color & 0xFF) as u8,
        ((color >> 24) & 0xFF) as u8,
    ]
}
