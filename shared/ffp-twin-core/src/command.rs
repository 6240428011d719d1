//! Typed pipeline commands.
//!
//! [`Command`] is a tagged union of the commands a stage knows how to
//! interpret plus a [`Command::Passthrough`] fallback that carries any other
//! command verbatim so it can be forwarded with its declared length.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::protocol::{fragment_state, light_state, raster_state, Opcode};

/// Per-vertex payload layout of a triangle command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexLayout {
    /// xyz, rgba
    Vertex3,
    /// xyzw, rgba
    Vertex4,
    /// xyz, ambient rgba, diffuse rgba, normal
    Vertex3N3,
    /// xyzw, ambient rgba, diffuse rgba, normal
    Vertex4N3,
    /// xyz, rgba, st
    Vertex3Tc,
    /// xyzw, rgba, st
    Vertex4Tc,
}

impl VertexLayout {
    pub fn from_opcode(op: Opcode) -> Option<Self> {
        match op {
            Opcode::Vertex3 => Some(VertexLayout::Vertex3),
            Opcode::Vertex4 => Some(VertexLayout::Vertex4),
            Opcode::Vertex3N3 => Some(VertexLayout::Vertex3N3),
            Opcode::Vertex4N3 => Some(VertexLayout::Vertex4N3),
            Opcode::Vertex3Tc => Some(VertexLayout::Vertex3Tc),
            Opcode::Vertex4Tc => Some(VertexLayout::Vertex4Tc),
            _ => None,
        }
    }

    pub fn opcode(self) -> Opcode {
        match self {
            VertexLayout::Vertex3 => Opcode::Vertex3,
            VertexLayout::Vertex4 => Opcode::Vertex4,
            VertexLayout::Vertex3N3 => Opcode::Vertex3N3,
            VertexLayout::Vertex4N3 => Opcode::Vertex4N3,
            VertexLayout::Vertex3Tc => Opcode::Vertex3Tc,
            VertexLayout::Vertex4Tc => Opcode::Vertex4Tc,
        }
    }

    /// Position carries a W component (screen-space layouts).
    pub fn has_w(self) -> bool {
        matches!(
            self,
            VertexLayout::Vertex4 | VertexLayout::Vertex4N3 | VertexLayout::Vertex4Tc
        )
    }

    /// Vertices carry a diffuse material color and a normal.
    pub fn has_normal(self) -> bool {
        matches!(self, VertexLayout::Vertex3N3 | VertexLayout::Vertex4N3)
    }

    /// Vertices carry a texture coordinate.
    pub fn has_texcoord(self) -> bool {
        matches!(self, VertexLayout::Vertex3Tc | VertexLayout::Vertex4Tc)
    }

    /// The screen-space layout a transformed triangle of this layout is sent as.
    pub fn transformed(self) -> Self {
        match self {
            VertexLayout::Vertex3 | VertexLayout::Vertex4 => VertexLayout::Vertex4,
            VertexLayout::Vertex3N3 | VertexLayout::Vertex4N3 => VertexLayout::Vertex4N3,
            VertexLayout::Vertex3Tc | VertexLayout::Vertex4Tc => VertexLayout::Vertex4Tc,
        }
    }

    /// Payload words per vertex.
    pub fn vertex_words(self) -> usize {
        let mut words = if self.has_w() { 4 } else { 3 } + 4;
        if self.has_texcoord() {
            words += 2;
        }
        if self.has_normal() {
            words += 4 + 3;
        }
        words
    }
}

/// One vertex of a triangle command.
///
/// Under lighting `color` carries the ambient material color and `diffuse`
/// the diffuse material color; otherwise `diffuse` and `normal` are unused.
/// Attributes absent from the layout are zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec4,
    pub color: Vec4,
    pub diffuse: Vec4,
    pub normal: Vec3,
    pub texcoord: Vec2,
}

impl Vertex {
    /// A vertex with only position and color.
    pub fn new(position: Vec4, color: Vec4) -> Self {
        Self {
            position,
            color,
            ..Default::default()
        }
    }

    pub fn with_texcoord(mut self, texcoord: Vec2) -> Self {
        self.texcoord = texcoord;
        self
    }

    pub fn with_lighting(mut self, diffuse: Vec4, normal: Vec3) -> Self {
        self.diffuse = diffuse;
        self.normal = normal;
        self
    }
}

/// A triangle command: three vertices sharing one layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub layout: VertexLayout,
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(layout: VertexLayout, vertices: [Vertex; 3]) -> Self {
        Self { layout, vertices }
    }
}

/// Viewport transform parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x0: u32,
    pub y0: u32,
    pub half_width: f32,
    pub half_height: f32,
    /// `(far - near) / 2`
    pub depth_scale: f32,
    /// `(far + near) / 2`
    pub depth_bias: f32,
}

impl Viewport {
    /// Start-up viewport covering a `width` x `height` screen.
    pub fn for_screen(width: u32, height: u32) -> Self {
        Self {
            x0: 0,
            y0: 0,
            half_width: (width / 2) as f32,
            half_height: (height / 2) as f32,
            depth_scale: 0.5,
            depth_bias: 0.5,
        }
    }
}

/// Face culling state of the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterState {
    pub draw_front: bool,
    pub draw_back: bool,
}

impl Default for RasterState {
    fn default() -> Self {
        Self::from_bits(raster_state::DRAW_BOTH)
    }
}

impl RasterState {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            draw_front: bits & raster_state::DRAW_FRONT != 0,
            draw_back: bits & raster_state::DRAW_BACK != 0,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.draw_front {
            bits |= raster_state::DRAW_FRONT;
        }
        if self.draw_back {
            bits |= raster_state::DRAW_BACK;
        }
        bits
    }
}

/// Blend factor selector.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero = 0,
    One = 1,
    SrcColor = 2,
    OneMinusSrcColor = 3,
    DstColor = 4,
    OneMinusDstColor = 5,
    SrcAlpha = 6,
    OneMinusSrcAlpha = 7,
    DstAlpha = 8,
    OneMinusDstAlpha = 9,
    SrcAlphaSaturate = 10,
}

impl BlendFactor {
    /// Decode a selector. Returns the raw bits for values with no variant.
    pub const fn from_bits(bits: u8) -> Result<Self, u8> {
        match bits {
            0 => Ok(Self::Zero),
            1 => Ok(Self::One),
            2 => Ok(Self::SrcColor),
            3 => Ok(Self::OneMinusSrcColor),
            4 => Ok(Self::DstColor),
            5 => Ok(Self::OneMinusDstColor),
            6 => Ok(Self::SrcAlpha),
            7 => Ok(Self::OneMinusSrcAlpha),
            8 => Ok(Self::DstAlpha),
            9 => Ok(Self::OneMinusDstAlpha),
            10 => Ok(Self::SrcAlphaSaturate),
            bits => Err(bits),
        }
    }

    #[must_use]
    pub const fn bits(&self) -> u8 {
        *self as u8
    }
}

/// Fragment test and blend state as carried on the wire.
///
/// Blend factors stay raw selectors here; the fragment stage validates them
/// when blending is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FragmentState {
    pub depth_test: bool,
    pub depth_write: bool,
    pub alpha_test: bool,
    pub blend: bool,
    pub src_factor: u8,
    pub dst_factor: u8,
}

impl Default for FragmentState {
    fn default() -> Self {
        Self {
            depth_test: false,
            depth_write: false,
            alpha_test: false,
            blend: false,
            src_factor: BlendFactor::One.bits(),
            dst_factor: BlendFactor::Zero.bits(),
        }
    }
}

impl FragmentState {
    pub fn from_bits(bits: u32) -> Self {
        Self {
            depth_test: bits & fragment_state::DEPTH_TEST != 0,
            depth_write: bits & fragment_state::DEPTH_WRITE != 0,
            alpha_test: bits & fragment_state::ALPHA_TEST != 0,
            blend: bits & fragment_state::BLEND != 0,
            src_factor: ((bits >> fragment_state::SRC_FACTOR_SHIFT) & fragment_state::FACTOR_MASK)
                as u8,
            dst_factor: ((bits >> fragment_state::DST_FACTOR_SHIFT) & fragment_state::FACTOR_MASK)
                as u8,
        }
    }

    pub fn bits(&self) -> u32 {
        let mut bits = 0;
        if self.depth_test {
            bits |= fragment_state::DEPTH_TEST;
        }
        if self.depth_write {
            bits |= fragment_state::DEPTH_WRITE;
        }
        if self.alpha_test {
            bits |= fragment_state::ALPHA_TEST;
        }
        if self.blend {
            bits |= fragment_state::BLEND;
        }
        bits | ((self.src_factor as u32 & fragment_state::FACTOR_MASK)
            << fragment_state::SRC_FACTOR_SHIFT)
            | ((self.dst_factor as u32 & fragment_state::FACTOR_MASK)
                << fragment_state::DST_FACTOR_SHIFT)
    }
}

/// Single light parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Pre-normalized direction towards the light, w = 0.
    pub direction: Vec4,
    pub diffuse_color: Vec4,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            direction: Vec4::new(0.0, 0.0, 1.0, 0.0),
            diffuse_color: Vec4::new(1.0, 1.0, 1.0, 0.0),
        }
    }
}

/// Texture binding: image location in external memory and its size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureBinding {
    pub offset: u32,
    pub width: u16,
    pub height: u16,
}

impl TextureBinding {
    pub fn size_word(&self) -> u32 {
        self.width as u32 | ((self.height as u32) << 16)
    }

    pub fn from_words(offset: u32, size: u32) -> Self {
        Self {
            offset,
            width: (size & 0xFFFF) as u16,
            height: ((size >> 16) & 0xFFFF) as u16,
        }
    }
}

/// A colored fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fragment {
    pub x: u16,
    pub y: u16,
    /// 24-bit depth.
    pub z: u32,
    /// Packed ARGB.
    pub color: u32,
}

/// A fragment carrying a texture coordinate instead of a color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TexFragment {
    pub x: u16,
    pub y: u16,
    pub z: u32,
    pub s: f32,
    pub t: f32,
}

/// Packs a fragment position into one payload word.
#[inline]
pub fn pack_xy(x: u16, y: u16) -> u32 {
    ((y as u32) << 16) | x as u32
}

/// Splits a packed fragment position into `(x, y)`.
#[inline]
pub fn unpack_xy(word: u32) -> (u16, u16) {
    ((word & 0xFFFF) as u16, ((word >> 16) & 0xFFFF) as u16)
}

/// A command this stage does not interpret, carried verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub word: u32,
    pub payload: Vec<u32>,
}

impl RawCommand {
    pub fn opcode(&self) -> u8 {
        crate::protocol::opcode_byte(self.word)
    }
}

/// A decoded pipeline command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Triangle(Triangle),
    ModelMatrix(Mat4),
    ProjectionMatrix(Mat4),
    NormalMatrix(Mat4),
    Viewport(Viewport),
    RasterState(RasterState),
    FragmentState(FragmentState),
    LightState { enabled: bool },
    LightParams(LightParams),
    BlendParams(u32),
    BindTexture(TextureBinding),
    Fragment(Fragment),
    TexFragment(TexFragment),
    Sync,
    ClearFramebuffer,
    ClearDepth,
    Nop,
    Passthrough(RawCommand),
}

impl Command {
    /// The command word this command is written with.
    pub fn word(&self) -> u32 {
        match self {
            Command::Triangle(tri) => tri.layout.opcode().word(),
            Command::ModelMatrix(_) => Opcode::ModelMatrix.word(),
            Command::ProjectionMatrix(_) => Opcode::ProjectionMatrix.word(),
            Command::NormalMatrix(_) => Opcode::NormalMatrix.word(),
            Command::Viewport(_) => Opcode::ViewportParams.word(),
            Command::RasterState(_) => Opcode::RasterState.word(),
            Command::FragmentState(_) => Opcode::FragmentState.word(),
            Command::LightState { .. } => Opcode::LightState.word(),
            Command::LightParams(_) => Opcode::LightParams.word(),
            Command::BlendParams(_) => Opcode::BlendParams.word(),
            Command::BindTexture(_) => Opcode::BindTexture.word(),
            Command::Fragment(_) => Opcode::Fragment.word(),
            Command::TexFragment(_) => Opcode::TexFragment.word(),
            Command::Sync => Opcode::Sync.word(),
            Command::ClearFramebuffer => Opcode::ClearFramebuffer.word(),
            Command::ClearDepth => Opcode::ClearDepth.word(),
            Command::Nop => Opcode::Nop.word(),
            Command::Passthrough(raw) => raw.word,
        }
    }

    pub fn light_state_bits(enabled: bool) -> u32 {
        if enabled {
            light_state::ENABLE
        } else {
            0
        }
    }
}
