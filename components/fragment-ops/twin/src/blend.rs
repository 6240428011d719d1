//! Color blending.

use ffp_twin_core::color::{clamp01, pack_argb, unpack_argb};
use ffp_twin_core::{BlendFactor, PipeError};
use glam::Vec4;

/// Per-channel weights for `factor`, in RGBA order.
fn weights(factor: BlendFactor, src: Vec4) -> Result<Vec4, PipeError> {
    Ok(match factor {
        BlendFactor::Zero => Vec4::ZERO,
        BlendFactor::One => Vec4::ONE,
        BlendFactor::OneMinusSrcColor => Vec4::new(1.0 - src.x, 1.0 - src.y, 1.0 - src.z, 1.0 - src.w),
        BlendFactor::SrcAlpha => Vec4::splat(src.w),
        BlendFactor::OneMinusSrcAlpha => Vec4::splat(1.0 - src.w),
        other => return Err(PipeError::UnknownBlendFactor(other.bits())),
    })
}

fn decode(bits: u8) -> Result<BlendFactor, PipeError> {
    BlendFactor::from_bits(bits).map_err(PipeError::UnknownBlendFactor)
}

/// Blend `src` over `dst` (both ARGB) with the raw factor selectors.
///
/// `result = clamp(src * src_factor + dst * dst_factor)` per channel.
pub fn blend(src: u32, src_factor: u8, dst: u32, dst_factor: u8) -> Result<u32, PipeError> {
    let s = unpack_argb(src);
    let d = unpack_argb(dst);
    let sf = weights(decode(src_factor)?, s)?;
    let df = weights(decode(dst_factor)?, s)?;

    let channel = |i: usize| clamp01(s[i] * sf[i] + d[i] * df[i]);
    Ok(pack_argb(channel(0), channel(1), channel(2), channel(3)))
}
