//! Texturing stage.
//!
//! Texture-coordinate fragments are sampled from the bound texture with
//! repeat wrapping and nearest filtering and leave as colored fragments.
//! Texels are 32-bit RGBA words (red in the low byte) stored row-major at the
//! binding's offset in external memory.

use std::io::Write;

use ffp_memory::TexelMemory;
use ffp_twin_core::color::{pack_rgba_vec, unpack_texel};
use ffp_twin_core::protocol::DEFAULT_TEXTURE_OFFSET;
use ffp_twin_core::{
    Command, CommandWriter, Fragment, Opcode, PipeError, Stage, TexFragment, TextureBinding,
};

/// Commands interpreted by this stage.
pub const DECODE_TABLE: &[Opcode] = &[Opcode::TexFragment, Opcode::BindTexture];

/// Bytes per texel.
const TEXEL_BYTES: usize = 4;

/// Texel index along one axis for a coordinate under repeat wrapping.
///
/// The fractional part is scaled by the texture size and floored; a
/// fraction that rounds up to exactly one selects the last texel.
pub fn wrap_nearest(coord: f32, size: u16) -> usize {
    let frac = coord - coord.floor();
    if frac < 1.0 {
        (frac * size as f32).floor() as usize
    } else {
        (size as usize).saturating_sub(1)
    }
}

/// Texturing stage context. Borrows external memory through `M`.
#[derive(Debug)]
pub struct Texturing<M> {
    memory: M,
    binding: TextureBinding,
}

impl<M: TexelMemory> Texturing<M> {
    /// Stage with the start-up binding: the default offset and an empty size.
    pub fn new(memory: M) -> Self {
        Self {
            memory,
            binding: TextureBinding {
                offset: DEFAULT_TEXTURE_OFFSET,
                width: 0,
                height: 0,
            },
        }
    }

    pub fn binding(&self) -> &TextureBinding {
        &self.binding
    }

    /// Packed ARGB color of the bound texture at `(s, t)`.
    pub fn sample(&self, s: f32, t: f32) -> Result<u32, PipeError> {
        let b = &self.binding;
        let i = wrap_nearest(s, b.width);
        let j = wrap_nearest(t, b.height);
        let offset = b.offset as usize + (j * b.width as usize + i) * TEXEL_BYTES;
        let texel = self.memory.read_word(offset)?;
        Ok(pack_rgba_vec(unpack_texel(texel)))
    }

    /// Replace a texture-coordinate fragment with a colored one.
    pub fn shade(&self, frag: &TexFragment) -> Result<Fragment, PipeError> {
        Ok(Fragment {
            x: frag.x,
            y: frag.y,
            z: frag.z,
            color: self.sample(frag.s, frag.t)?,
        })
    }
}

impl<M: TexelMemory> Stage for Texturing<M> {
    fn name(&self) -> &'static str {
        "texturing"
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
            Command::TexFragment(frag) => {
                let colored = self.shade(&frag)?;
                out.write_command(&Command::Fragment(colored))
            }
            Command::BindTexture(binding) => {
                log::debug!(
                    "texturing: bind {}x{} at {:#X}",
                    binding.width,
                    binding.height,
                    binding.offset
                );
                self.binding = binding;
                Ok(())
            }
            other => Err(PipeError::Unsupported {
                stage: "texturing",
                word: other.word(),
            }),
        }
    }
}
