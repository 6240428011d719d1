//! Triangle rasterizer stage.
//!
//! Screen-space triangles are scanned over their clamped bounding box with
//! pixel centers at `(x + 0.5, y + 0.5)`. A pixel is covered when all three
//! snapped edge values share the sign of the triangle's winding (zero counts
//! as inside). Depth is interpolated linearly in screen space; colors and
//! texture coordinates are interpolated perspective-correct using the `1/w`
//! carried in each vertex's fourth position component.
//!
//! Colored triangles produce FRAGMENT commands, textured triangles produce
//! TEXFRAGMENT commands. Fragments come out row by row, left to right.

pub mod edge;

use std::io::Write;

use ffp_twin_core::color::{clamp01, pack_argb};
use ffp_twin_core::protocol::{MAX_DEPTH, MIN_TRIANGLE_AREA};
use ffp_twin_core::{
    Command, CommandWriter, Fragment, Opcode, PipeError, RasterState, Stage, TexFragment,
    Triangle, VertexLayout,
};
use glam::{Vec2, Vec4};

pub use edge::{edge_function, fmac, snap_edge};

/// Commands interpreted by this stage.
pub const DECODE_TABLE: &[Opcode] = &[Opcode::Vertex4, Opcode::Vertex4Tc, Opcode::RasterState];

/// Inclusive pixel bounds of a triangle, clamped to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x_min: u32,
    pub y_min: u32,
    pub x_max: u32,
    pub y_max: u32,
}

/// Lower bound along one axis, or `None` when the triangle lies past `hi`.
fn min_coord(a: f32, b: f32, c: f32, lo: i32, hi: i32) -> Option<i32> {
    let min = a.min(b).min(c) as i32;
    (min <= hi).then_some(min.max(lo))
}

/// Upper bound along one axis, or `None` when the triangle lies before `lo`.
fn max_coord(a: f32, b: f32, c: f32, lo: i32, hi: i32) -> Option<i32> {
    let max = a.max(b).max(c) as i32;
    (max >= lo).then_some(max.saturating_add(1).min(hi))
}

impl BoundingBox {
    /// Bounds of the three screen positions on a `width` x `height` screen.
    /// Returns `None` for triangles entirely off screen.
    pub fn of(p: [Vec2; 3], width: u32, height: u32) -> Option<Self> {
        let x_hi = width as i32 - 1;
        let y_hi = height as i32 - 1;
        let x_min = min_coord(p[0].x, p[1].x, p[2].x, 0, x_hi)?;
        let y_min = min_coord(p[0].y, p[1].y, p[2].y, 0, y_hi)?;
        let x_max = max_coord(p[0].x, p[1].x, p[2].x, 0, x_hi)?;
        let y_max = max_coord(p[0].y, p[1].y, p[2].y, 0, y_hi)?;
        if x_min < 0 || y_min < 0 || x_max < 0 || y_max < 0 {
            return None;
        }
        Some(Self {
            x_min: x_min as u32,
            y_min: y_min as u32,
            x_max: x_max as u32,
            y_max: y_max as u32,
        })
    }
}

/// Per-triangle values computed once before the pixel loop.
#[derive(Debug, Clone, Copy)]
struct Setup {
    pos: [Vec2; 3],
    depth: [f32; 3],
    inv_w: [f32; 3],
    inv_area: f32,
    front: bool,
    /// Colors and texcoords pre-multiplied by `1/w`.
    color: [Vec4; 3],
    texcoord: [Vec2; 3],
}

/// Rasterizer stage context.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    width: u32,
    height: u32,
    state: RasterState,
}

impl Rasterizer {
    /// Both faces drawn.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            state: RasterState::default(),
        }
    }

    pub fn state(&self) -> RasterState {
        self.state
    }

    /// Area test, culling and bounding box. `None` means nothing to draw.
    fn setup(&self, tri: &Triangle) -> Option<(Setup, BoundingBox)> {
        let [v0, v1, v2] = tri.vertices;
        let pos = [v0, v1, v2].map(|v| v.position.truncate().truncate());

        let area = edge_function(pos[0], pos[1], pos[2]);
        if area.abs() < MIN_TRIANGLE_AREA {
            log::trace!("rasterizer: degenerate triangle, area {}", area);
            return None;
        }
        let front = area < 0.0;
        if (front && !self.state.draw_front) || (!front && !self.state.draw_back) {
            log::trace!("rasterizer: culled {} face", if front { "front" } else { "back" });
            return None;
        }

        let bbox = BoundingBox::of(pos, self.width, self.height)?;
        let inv_w = [v0, v1, v2].map(|v| v.position.w);
        let color = [v0, v1, v2].map(|v| {
            let c = Vec4::new(
                clamp01(v.color.x),
                clamp01(v.color.y),
                clamp01(v.color.z),
                clamp01(v.color.w),
            );
            c * v.position.w
        });
        let texcoord = [v0, v1, v2].map(|v| v.texcoord * v.position.w);

        Some((
            Setup {
                pos,
                depth: [v0, v1, v2].map(|v| v.position.z),
                inv_w,
                inv_area: 1.0 / area,
                front,
                color,
                texcoord,
            },
            bbox,
        ))
    }

    /// Rasterize one screen-space triangle, handing every produced fragment
    /// command to `emit`. Returns the number of fragments produced.
    pub fn rasterize<E>(&self, tri: &Triangle, mut emit: E) -> Result<u64, PipeError>
    where
        E: FnMut(Command) -> Result<(), PipeError>,
    {
        let textured = tri.layout == VertexLayout::Vertex4Tc;
        let Some((s, bbox)) = self.setup(tri) else {
            return Ok(0);
        };

        let mut count = 0;
        for y in bbox.y_min..=bbox.y_max {
            for x in bbox.x_min..=bbox.x_max {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let w = [
                    snap_edge(edge_function(s.pos[1], s.pos[2], p)),
                    snap_edge(edge_function(s.pos[2], s.pos[0], p)),
                    snap_edge(edge_function(s.pos[0], s.pos[1], p)),
                ];
                let covered = if s.front {
                    w.iter().all(|&e| e <= 0.0)
                } else {
                    w.iter().all(|&e| e >= 0.0)
                };
                if !covered {
                    continue;
                }

                let fz = (s.depth[0] * w[0] + s.depth[1] * w[1] + s.depth[2] * w[2]) * s.inv_area;
                if !(0.0..=1.0).contains(&fz) {
                    continue;
                }
                let z = (fz * MAX_DEPTH as f32) as u32 & MAX_DEPTH;

                let wn = 1.0 / fmac(s.inv_w, w);
                let attr = |v: [f32; 3]| fmac(v, w) * wn;
                let (x, y) = (x as u16, y as u16);

                let cmd = if textured {
                    Command::TexFragment(TexFragment {
                        x,
                        y,
                        z,
                        s: attr(s.texcoord.map(|t| t.x)),
                        t: attr(s.texcoord.map(|t| t.y)),
                    })
                } else {
                    let r = attr(s.color.map(|c| c.x));
                    let g = attr(s.color.map(|c| c.y));
                    let b = attr(s.color.map(|c| c.z));
                    let a = attr(s.color.map(|c| c.w));
                    Command::Fragment(Fragment {
                        x,
                        y,
                        z,
                        color: pack_argb(r, g, b, a),
                    })
                };
                emit(cmd)?;
                count += 1;
            }
        }
        Ok(count)
    }
}

impl Stage for Rasterizer {
    fn name(&self) -> &'static str {
        "rasterizer"
    }

    fn decode_table(&self) -> &'static [Opcode] {
        DECODE_TABLE
    }

    fn handle<W: Write>(
        &mut self,
        cmd: Command,
        out: &mut CommandWriter<W>,
    ) -> Result<(), PipeError> {
        match cmd {
            Command::Triangle(tri) => {
                let n = self.rasterize(&tri, |frag| out.write_command(&frag))?;
                log::trace!("rasterizer: {} fragments", n);
                out.flush()
            }
            Command::RasterState(state) => {
                log::debug!(
                    "rasterizer: draw front {} back {}",
                    state.draw_front,
                    state.draw_back
                );
                self.state = state;
                Ok(())
            }
            other => Err(PipeError::Unsupported {
                stage: "rasterizer",
                word: other.word(),
            }),
        }
    }
}
