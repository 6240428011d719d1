//! Command word layout and protocol constants.
//!
//! A command word carries the marker `0xFFFF` in bits 31..16, the number of
//! payload words in bits 15..8 and an opcode in bits 7..0. Payload words are
//! raw 32-bit values (IEEE-754 floats or integers) with no further framing.
//!
//! Commands are matched on the full 32-bit word: the 3- and 4-component
//! vertex commands share an opcode byte and differ only in their word count.

/// Marker carried in bits 31..16 of every command word.
pub const CMD_MARKER: u32 = 0xFFFF_0000;

/// Largest depth value; the depth buffer clear value.
pub const MAX_DEPTH: u32 = (1 << 24) - 1;

/// Near clipping plane on the homogeneous W axis (float exponent 114).
pub const W_CLIP: f32 = 0.000_122_070_31;

/// Triangles with `|area|` below this are dropped as degenerate.
pub const MIN_TRIANGLE_AREA: f32 = 1.0;

/// Edge function values below this magnitude snap to zero (float exponent 118).
pub const EDGE_SNAP: f32 = 0.001_953_125;

/// Alpha test passes only for alpha bytes strictly greater than this.
pub const ALPHA_REF: u32 = 171;

/// Texture offset bound at stage start-up.
pub const DEFAULT_TEXTURE_OFFSET: u32 = 0x40_0000;

/// Returns true when `word` carries the command marker.
#[inline]
pub const fn has_marker(word: u32) -> bool {
    word & CMD_MARKER == CMD_MARKER
}

/// Number of payload words declared by a command word.
#[inline]
pub const fn payload_len(word: u32) -> usize {
    ((word >> 8) & 0xFF) as usize
}

/// Opcode byte of a command word.
#[inline]
pub const fn opcode_byte(word: u32) -> u8 {
    (word & 0xFF) as u8
}

/// Every command word defined by the pipeline protocol.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// Object-space triangle, xyz + rgba per vertex.
    Vertex3 = 0xFFFF_1500,
    /// Screen-space triangle, xyzw + rgba per vertex.
    Vertex4 = 0xFFFF_1800,
    /// Object-space lit triangle, xyz + ambient + diffuse + normal.
    Vertex3N3 = 0xFFFF_2A01,
    /// Screen-space lit triangle, xyzw + ambient + diffuse + normal.
    Vertex4N3 = 0xFFFF_2D01,
    /// Object-space textured triangle, xyz + rgba + st.
    Vertex3Tc = 0xFFFF_1B02,
    /// Screen-space textured triangle, xyzw + rgba + st.
    Vertex4Tc = 0xFFFF_1E02,
    /// Frame boundary.
    Sync = 0xFFFF_0010,
    /// Reset the frame buffer to zero.
    ClearFramebuffer = 0xFFFF_0011,
    /// Reset the depth buffer to [`MAX_DEPTH`].
    ClearDepth = 0xFFFF_0012,
    /// Colored fragment.
    Fragment = 0xFFFF_0320,
    /// Texture-coordinate fragment.
    TexFragment = 0xFFFF_0421,
    /// Load the model matrix.
    ModelMatrix = 0xFFFF_1030,
    /// Load the projection matrix.
    ProjectionMatrix = 0xFFFF_1031,
    /// Load the normal matrix.
    NormalMatrix = 0xFFFF_1035,
    /// Rasterizer face culling state.
    RasterState = 0xFFFF_0140,
    /// Fragment test and blend state.
    FragmentState = 0xFFFF_0141,
    /// Lighting enable.
    LightState = 0xFFFF_0142,
    /// Viewport origin, half extents and depth range.
    ViewportParams = 0xFFFF_0650,
    /// Light direction and diffuse color.
    LightParams = 0xFFFF_0851,
    /// Reserved blend parameters, forwarded by every stage.
    BlendParams = 0xFFFF_0152,
    /// Bind a texture image in external memory.
    BindTexture = 0xFFFF_0260,
    /// No operation.
    Nop = 0xFFFF_00F0,
}

impl Opcode {
    /// All opcodes, in table order.
    pub const ALL: [Opcode; 22] = [
        Opcode::Vertex3,
        Opcode::Vertex4,
        Opcode::Vertex3N3,
        Opcode::Vertex4N3,
        Opcode::Vertex3Tc,
        Opcode::Vertex4Tc,
        Opcode::Sync,
        Opcode::ClearFramebuffer,
        Opcode::ClearDepth,
        Opcode::Fragment,
        Opcode::TexFragment,
        Opcode::ModelMatrix,
        Opcode::ProjectionMatrix,
        Opcode::NormalMatrix,
        Opcode::RasterState,
        Opcode::FragmentState,
        Opcode::LightState,
        Opcode::ViewportParams,
        Opcode::LightParams,
        Opcode::BlendParams,
        Opcode::BindTexture,
        Opcode::Nop,
    ];

    /// Look up the opcode for a full command word.
    pub fn from_word(word: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.word() == word)
    }

    /// The full 32-bit command word.
    #[must_use]
    pub const fn word(self) -> u32 {
        self as u32
    }

    /// Number of payload words that follow the command word.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        payload_len(self as u32)
    }
}

/// Bits of the rasterizer state word.
pub mod raster_state {
    /// Draw front-facing triangles.
    pub const DRAW_FRONT: u32 = 0x0000_0001;
    /// Draw back-facing triangles.
    pub const DRAW_BACK: u32 = 0x0000_0002;
    /// Both faces drawn (culling disabled).
    pub const DRAW_BOTH: u32 = DRAW_FRONT | DRAW_BACK;
}

/// Bits of the fragment state word.
pub mod fragment_state {
    pub const DEPTH_TEST: u32 = 0x0000_0001;
    pub const DEPTH_WRITE: u32 = 0x0000_0002;
    pub const ALPHA_TEST: u32 = 0x0000_0004;
    pub const BLEND: u32 = 0x0000_0008;
    pub const SRC_FACTOR_SHIFT: u32 = 12;
    pub const DST_FACTOR_SHIFT: u32 = 16;
    pub const FACTOR_MASK: u32 = 0xF;
}

/// Bits of the light state word.
pub mod light_state {
    pub const ENABLE: u32 = 0x0000_0001;
}
