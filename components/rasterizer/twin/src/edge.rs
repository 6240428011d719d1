//! Edge functions and barycentric attribute evaluation.
//!
//! The hardware evaluates these with fused multiply-adds; every `mul_add`
//! below is part of the bit-exact contract and must not be expanded.

use ffp_twin_core::protocol::EDGE_SNAP;
use glam::Vec2;

/// Signed edge function of point `c` against edge `a -> b`.
///
/// `E(c) = (a.y*b.x - a.x*b.y) + c.y*(a.x - b.x) + c.x*(b.y - a.y)`, with
/// the constant term and both accumulations fused.
#[inline]
pub fn edge_function(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    let constant = (-a.x).mul_add(b.y, a.y * b.x);
    let dx = a.x - b.x;
    let dy = b.y - a.y;
    let partial = c.y.mul_add(dx, constant);
    c.x.mul_add(dy, partial)
}

/// Flush edge values too small to trust to zero.
#[inline]
pub fn snap_edge(w: f32) -> f32 {
    if w.abs() < EDGE_SNAP {
        0.0
    } else {
        w
    }
}

/// `w0*v0 + w1*v1 + w2*v2`, accumulated with two fused steps.
#[inline]
pub fn fmac(v: [f32; 3], w: [f32; 3]) -> f32 {
    w[2].mul_add(v[2], w[1].mul_add(v[1], w[0] * v[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_follows_winding() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(10.0, 0.0);
        assert!(edge_function(a, b, Vec2::new(5.0, 5.0)) < 0.0);
        assert!(edge_function(a, b, Vec2::new(5.0, -5.0)) > 0.0);
        assert_eq!(edge_function(a, b, Vec2::new(3.0, 0.0)), 0.0);
    }

    #[test]
    fn snapping_is_strict() {
        assert_eq!(snap_edge(EDGE_SNAP / 2.0), 0.0);
        assert_eq!(snap_edge(-EDGE_SNAP / 2.0), 0.0);
        assert_eq!(snap_edge(EDGE_SNAP), EDGE_SNAP);
    }
}
