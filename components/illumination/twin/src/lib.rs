//! Per-vertex illumination stage.
//!
//! Lit screen-space triangles get a single directional light plus a fixed
//! scene ambient term:
//!
//! ```text
//! color.rgb = ambient_mat * SCENE_AMBIENT + (diffuse_mat * light) * max(0, N . L)
//! color.a   = diffuse_mat.a
//! ```
//!
//! The result is not clamped here; the rasterizer clamps interpolated colors.
//! Lit triangles leave as plain colored triangles.

use std::io::Write;

use ffp_twin_core::{
    Command, CommandWriter, LightParams, Opcode, PipeError, Stage, Triangle, Vertex, VertexLayout,
};
use glam::Vec4;

/// Commands interpreted by this stage.
pub const DECODE_TABLE: &[Opcode] = &[
    Opcode::Vertex4N3,
    Opcode::Vertex3N3,
    Opcode::LightParams,
    Opcode::LightState,
];

/// Scene ambient light.
pub const SCENE_AMBIENT: Vec4 = Vec4::new(0.2, 0.2, 0.2, 1.0);

/// Shade one vertex. `color` holds the ambient material color.
pub fn shade_vertex(v: &Vertex, light: &LightParams) -> Vec4 {
    let ambient = v.color * SCENE_AMBIENT;
    let intensity = v.normal.dot(light.direction.truncate()).max(0.0);
    let diffuse = (v.diffuse * light.diffuse_color) * intensity;
    let rgb = diffuse.truncate() + ambient.truncate();
    rgb.extend(v.diffuse.w)
}

/// Illumination stage context.
#[derive(Debug, Clone, Default)]
pub struct Illumination {
    light: LightParams,
    enabled: bool,
}

impl Illumination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn light(&self) -> &LightParams {
        &self.light
    }

    /// Last LIGHT_STATE enable bit. Stored for inspection only: shading runs
    /// for every lit triangle regardless.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Shade a lit screen-space triangle into a colored one.
    pub fn shade_triangle(&self, tri: &Triangle) -> Triangle {
        let vertices = tri
            .vertices
            .map(|v| Vertex::new(v.position, shade_vertex(&v, &self.light)));
        Triangle::new(VertexLayout::Vertex4, vertices)
    }
}

impl Stage for Illumination {
    fn name(&self) -> &'static str {
        "illumination"
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
            Command::Triangle(tri) if tri.layout == VertexLayout::Vertex4N3 => {
                out.write_command(&Command::Triangle(self.shade_triangle(&tri)))?;
                out.flush()
            }
            Command::LightParams(light) => {
                log::debug!(
                    "illumination: light dir {:?} color {:?}",
                    light.direction,
                    light.diffuse_color
                );
                self.light = light;
                Ok(())
            }
            Command::LightState { enabled } => {
                self.enabled = enabled;
                Ok(())
            }
            // Object-space lit vertices must be transformed first.
            other => Err(PipeError::Unsupported {
                stage: "illumination",
                word: other.word(),
            }),
        }
    }
}
