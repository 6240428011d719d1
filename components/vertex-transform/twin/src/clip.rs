//! Single-plane Sutherland-Hodgman clipping against `w = W_CLIP`.
//!
//! Runs before the perspective divide, so plain linear interpolation of every
//! attribute is correct. A triangle clips to at most a quad, which is split
//! into two triangles; the scratch storage is fixed-capacity.

use ffp_twin_core::math::{lerp, lerp_vec4};
use ffp_twin_core::protocol::W_CLIP;
use ffp_twin_core::{PipeError, Vertex};
use glam::{Vec2, Vec3};

/// Vertices a clipped triangle can produce.
const MAX_CLIPPED_VERTICES: usize = 4;

/// Output of [`clip_near_w`]: zero, one or two triangles.
pub type ClippedTriangles = heapless::Vec<[Vertex; 3], 2>;

type Polygon = heapless::Vec<Vertex, MAX_CLIPPED_VERTICES>;

fn push(polygon: &mut Polygon, v: Vertex) -> Result<(), PipeError> {
    polygon.push(v).map_err(|_| PipeError::ClipCount {
        count: MAX_CLIPPED_VERTICES + 1,
    })
}

#[inline]
fn inside(v: &Vertex) -> bool {
    v.position.w >= W_CLIP
}

/// Interpolate every attribute at the crossing between `prev` and `cur`.
fn intersect(prev: &Vertex, cur: &Vertex) -> Vertex {
    let t = (W_CLIP - prev.position.w) / (cur.position.w - prev.position.w);
    Vertex {
        position: lerp_vec4(prev.position, cur.position, t),
        color: lerp_vec4(prev.color, cur.color, t),
        diffuse: lerp_vec4(prev.diffuse, cur.diffuse, t),
        normal: Vec3::new(
            lerp(prev.normal.x, cur.normal.x, t),
            lerp(prev.normal.y, cur.normal.y, t),
            lerp(prev.normal.z, cur.normal.z, t),
        ),
        texcoord: Vec2::new(
            lerp(prev.texcoord.x, cur.texcoord.x, t),
            lerp(prev.texcoord.y, cur.texcoord.y, t),
        ),
    }
}

/// Clip a clip-space triangle against the near W plane.
///
/// Returns no triangles when every vertex is outside, the input unchanged
/// when every vertex is inside, and otherwise one or two triangles whose
/// vertices all satisfy `w >= W_CLIP`.
pub fn clip_near_w(tri: &[Vertex; 3]) -> Result<ClippedTriangles, PipeError> {
    let mut out = ClippedTriangles::new();

    if tri.iter().all(inside) {
        out.push(*tri)
            .map_err(|_| PipeError::ClipCount { count: 3 })?;
        return Ok(out);
    }
    if !tri.iter().any(inside) {
        return Ok(out);
    }

    let mut polygon: Polygon = heapless::Vec::new();

    // Walk the edges (2,0), (0,1), (1,2).
    let mut prev = &tri[2];
    for cur in tri {
        if inside(prev) {
            push(&mut polygon, *prev)?;
        }
        if inside(prev) != inside(cur) {
            push(&mut polygon, intersect(prev, cur))?;
        }
        prev = cur;
    }

    match polygon.len() {
        3 => {
            out.push([polygon[0], polygon[1], polygon[2]])
                .map_err(|_| PipeError::ClipCount { count: 3 })?;
        }
        4 => {
            out.push([polygon[0], polygon[1], polygon[2]])
                .map_err(|_| PipeError::ClipCount { count: 4 })?;
            out.push([polygon[0], polygon[2], polygon[3]])
                .map_err(|_| PipeError::ClipCount { count: 4 })?;
        }
        count => return Err(PipeError::ClipCount { count }),
    }
    Ok(out)
}
