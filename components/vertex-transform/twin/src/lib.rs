//! Vertex transform and clip stage.
//!
//! Object-space triangles are taken through `projection * (model * v)`,
//! clipped against the near W plane, divided by W and mapped through the
//! viewport. Each surviving triangle is sent on as the screen-space vertex
//! command matching its attributes. Matrix and viewport commands are
//! consumed here; everything else is forwarded.

pub mod clip;

use std::io::Write;

use ffp_twin_core::math::mul_mat4_vec4;
use ffp_twin_core::{Command, CommandWriter, Opcode, PipeError, Stage, Triangle, Vertex, Viewport};
use glam::Mat4;

pub use clip::{clip_near_w, ClippedTriangles};

/// Commands interpreted by this stage.
pub const DECODE_TABLE: &[Opcode] = &[
    Opcode::Vertex3,
    Opcode::Vertex3N3,
    Opcode::Vertex3Tc,
    Opcode::ModelMatrix,
    Opcode::ProjectionMatrix,
    Opcode::NormalMatrix,
    Opcode::ViewportParams,
];

/// Transform stage context. Matrices and viewport persist until replaced.
#[derive(Debug, Clone)]
pub struct VertexTransform {
    model: Mat4,
    projection: Mat4,
    normal: Mat4,
    viewport: Viewport,
}

impl VertexTransform {
    /// Identity matrices and a viewport covering the whole screen.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            model: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            normal: Mat4::IDENTITY,
            viewport: Viewport::for_screen(width, height),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn model(&self) -> &Mat4 {
        &self.model
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn normal(&self) -> &Mat4 {
        &self.normal
    }

    /// Transform, clip and project one object-space triangle.
    pub fn transform_triangle(
        &self,
        tri: &Triangle,
    ) -> Result<heapless::Vec<Triangle, 2>, PipeError> {
        let layout = tri.layout.transformed();
        let clip_space = tri.vertices.map(|v| Vertex {
            position: mul_mat4_vec4(&self.projection, mul_mat4_vec4(&self.model, v.position)),
            ..v
        });

        let clipped = clip_near_w(&clip_space)?;
        if clipped.is_empty() {
            log::trace!("vertex-transform: triangle clipped away");
        }

        let mut out = heapless::Vec::new();
        for vertices in clipped {
            let mut screen = [Vertex::default(); 3];
            for (dst, src) in screen.iter_mut().zip(vertices) {
                *dst = self.to_screen(src)?;
                if layout.has_normal() {
                    dst.normal = mul_mat4_vec4(&self.normal, src.normal.extend(0.0)).truncate();
                }
            }
            out.push(Triangle::new(layout, screen))
                .map_err(|_| PipeError::ClipCount { count: 3 * (out.len() + 1) })?;
        }
        Ok(out)
    }

    /// Perspective divide and viewport transform. W is replaced by `1/w`.
    fn to_screen(&self, mut v: Vertex) -> Result<Vertex, PipeError> {
        let p = v.position;
        if !(p.w > 0.0) {
            return Err(PipeError::NonPositiveW { w: p.w });
        }
        let inv_w = 1.0 / p.w;
        let (x, y, z) = (p.x * inv_w, p.y * inv_w, p.z * inv_w);

        let vp = &self.viewport;
        v.position.x = vp.half_width * (x + 1.0) + vp.x0 as f32;
        v.position.y = vp.half_height * (y + 1.0) + vp.y0 as f32;
        v.position.z = vp.depth_scale * z + vp.depth_bias;
        v.position.w = inv_w;
        Ok(v)
    }
}

impl Stage for VertexTransform {
    fn name(&self) -> &'static str {
        "vertex-transform"
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
                for screen in self.transform_triangle(&tri)? {
                    out.write_command(&Command::Triangle(screen))?;
                }
                out.flush()
            }
            Command::ModelMatrix(m) => {
                log::debug!("vertex-transform: model matrix loaded");
                self.model = m;
                Ok(())
            }
            Command::ProjectionMatrix(m) => {
                log::debug!("vertex-transform: projection matrix loaded");
                self.projection = m;
                Ok(())
            }
            Command::NormalMatrix(m) => {
                log::debug!("vertex-transform: normal matrix loaded");
                self.normal = m;
                Ok(())
            }
            Command::Viewport(vp) => {
                log::debug!("vertex-transform: viewport {:?}", vp);
                self.viewport = vp;
                Ok(())
            }
            other => Err(PipeError::Unsupported {
                stage: "vertex-transform",
                word: other.word(),
            }),
        }
    }
}
