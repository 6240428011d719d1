//! Fragment operations stage: the pipeline sink.
//!
//! Owns the depth buffer (24-bit values, cleared to [`MAX_DEPTH`]) and the
//! frame buffer (ARGB words, cleared to zero), both row-major. Each incoming
//! fragment runs through, in order:
//!
//! 1. depth test (`z <= stored` passes) with optional depth write,
//! 2. alpha test (alpha byte `> ALPHA_REF` passes),
//! 3. blending against the stored color,
//!
//! then is written to the frame buffer and forwarded for display.

pub mod blend;

use std::io::Write;

use ffp_twin_core::color::alpha_byte;
use ffp_twin_core::protocol::{ALPHA_REF, MAX_DEPTH};
use ffp_twin_core::{Command, CommandWriter, Fragment, FragmentState, Opcode, PipeError, Stage};

pub use blend::blend;

/// Commands interpreted by this stage.
pub const DECODE_TABLE: &[Opcode] = &[
    Opcode::Fragment,
    Opcode::FragmentState,
    Opcode::ClearDepth,
    Opcode::ClearFramebuffer,
];

/// Fragment operations context.
#[derive(Debug, Clone)]
pub struct FragmentOps {
    width: u32,
    height: u32,
    state: FragmentState,
    depth: Vec<u32>,
    frame: Vec<u32>,
}

impl FragmentOps {
    /// Cleared buffers, every test and blending disabled.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            state: FragmentState::default(),
            depth: vec![MAX_DEPTH; len],
            frame: vec![0; len],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn state(&self) -> &FragmentState {
        &self.state
    }

    /// Row-major depth values.
    pub fn depth_buffer(&self) -> &[u32] {
        &self.depth
    }

    /// Row-major ARGB colors.
    pub fn frame_buffer(&self) -> &[u32] {
        &self.frame
    }

    pub fn clear_depth(&mut self) {
        self.depth.fill(MAX_DEPTH);
    }

    pub fn clear_frame(&mut self) {
        self.frame.fill(0);
    }

    fn index(&self, frag: &Fragment) -> Result<usize, PipeError> {
        let (x, y) = (frag.x as u32, frag.y as u32);
        if x >= self.width || y >= self.height {
            return Err(PipeError::FragmentOutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y as usize * self.width as usize + x as usize)
    }

    /// Run one fragment through the tests and blending.
    ///
    /// Returns the fragment as written to the frame buffer, or `None` when a
    /// test discarded it.
    pub fn process(&mut self, frag: Fragment) -> Result<Option<Fragment>, PipeError> {
        let idx = self.index(&frag)?;
        let state = self.state;

        if state.depth_test {
            if frag.z > self.depth[idx] {
                return Ok(None);
            }
            if state.depth_write {
                self.depth[idx] = frag.z;
            }
        }

        if state.alpha_test && alpha_byte(frag.color) <= ALPHA_REF {
            return Ok(None);
        }

        let color = if state.blend {
            blend(frag.color, state.src_factor, self.frame[idx], state.dst_factor)?
        } else {
            frag.color
        };
        self.frame[idx] = color;
        Ok(Some(Fragment { color, ..frag }))
    }
}

impl Stage for FragmentOps {
    fn name(&self) -> &'static str {
        "fragment-ops"
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
            Command::Fragment(frag) => match self.process(frag)? {
                Some(written) => {
                    out.write_fragment(&written)?;
                    out.flush()
                }
                None => Ok(()),
            },
            Command::FragmentState(state) => {
                log::debug!("fragment-ops: {:?}", state);
                self.state = state;
                Ok(())
            }
            Command::ClearDepth => {
                self.clear_depth();
                Ok(())
            }
            Command::ClearFramebuffer => {
                self.clear_frame();
                // The display keeps its own frame.
                out.write_command(&Command::ClearFramebuffer)?;
                out.flush()
            }
            other => Err(PipeError::Unsupported {
                stage: "fragment-ops",
                word: other.word(),
            }),
        }
    }
}
