//! Scalar vector helpers with a fixed operation order.
//!
//! Results must match the hardware bit for bit, so every sum here is written
//! out left to right with no fused operations unless stated.

use glam::{Mat4, Vec4};

/// `m * v`, each output component summed left to right over the row.
#[inline]
pub fn mul_mat4_vec4(m: &Mat4, v: Vec4) -> Vec4 {
    let row = |i: usize| {
        let r = m.row(i);
        r.x * v.x + r.y * v.y + r.z * v.z + r.w * v.w
    };
    Vec4::new(row(0), row(1), row(2), row(3))
}

/// `a + t * (b - a)`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

/// Component-wise [`lerp`].
#[inline]
pub fn lerp_vec4(a: Vec4, b: Vec4, t: f32) -> Vec4 {
    Vec4::new(
        lerp(a.x, b.x, t),
        lerp(a.y, b.y, t),
        lerp(a.z, b.z, t),
        lerp(a.w, b.w, t),
    )
}
