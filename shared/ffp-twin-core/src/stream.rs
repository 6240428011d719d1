//! Word-level command stream codec.
//!
//! Streams are sequences of little-endian 32-bit words. [`CommandReader`]
//! decodes only the opcodes listed in the caller's decode table and reads
//! everything else raw by its declared length; [`CommandWriter`] encodes
//! typed commands and forwards raw ones.

use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::command::{
    pack_xy, unpack_xy, Command, Fragment, FragmentState, LightParams, RasterState, RawCommand,
    TexFragment, TextureBinding, Triangle, Vertex, VertexLayout, Viewport,
};
use crate::error::PipeError;
use crate::protocol::{self, light_state, Opcode};

/// Reads commands from a byte stream.
pub struct CommandReader<R: Read> {
    inner: BufReader<R>,
}

impl<R: Read> CommandReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
        }
    }

    /// Read one word. Returns `None` when the stream ends on a word boundary.
    pub fn read_word(&mut self) -> Result<Option<u32>, PipeError> {
        let mut buf = [0u8; 4];
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) if filled == 0 => return Ok(None),
                Ok(0) => {
                    return Err(PipeError::Truncated {
                        word: u32::from_le_bytes(buf),
                    })
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(Some(u32::from_le_bytes(buf)))
    }

    /// Read the next command.
    ///
    /// Commands whose word appears in `table` are decoded into their typed
    /// variant; any other command is returned as [`Command::Passthrough`]
    /// with exactly its declared number of payload words. Returns `None` at
    /// end of stream.
    pub fn next_command(&mut self, table: &[Opcode]) -> Result<Option<Command>, PipeError> {
        let Some(word) = self.read_word()? else {
            return Ok(None);
        };

        if let Some(op) = table.iter().copied().find(|op| op.word() == word) {
            return self.decode(op).map(Some);
        }

        if !protocol::has_marker(word) {
            return Err(PipeError::MissingMarker { word });
        }

        let len = protocol::payload_len(word);
        let mut payload = Vec::with_capacity(len);
        for _ in 0..len {
            payload.push(self.payload_u32(word)?);
        }
        Ok(Some(Command::Passthrough(RawCommand { word, payload })))
    }

    /// Read every remaining command.
    pub fn read_to_end(&mut self, table: &[Opcode]) -> Result<Vec<Command>, PipeError> {
        let mut commands = Vec::new();
        while let Some(cmd) = self.next_command(table)? {
            commands.push(cmd);
        }
        Ok(commands)
    }

    fn decode(&mut self, op: Opcode) -> Result<Command, PipeError> {
        let word = op.word();
        let cmd = match op {
            Opcode::Vertex3
            | Opcode::Vertex4
            | Opcode::Vertex3N3
            | Opcode::Vertex4N3
            | Opcode::Vertex3Tc
            | Opcode::Vertex4Tc => {
                let layout = VertexLayout::from_opcode(op).ok_or(PipeError::Unsupported {
                    stage: "reader",
                    word,
                })?;
                let vertices = [
                    self.vertex(layout, word)?,
                    self.vertex(layout, word)?,
                    self.vertex(layout, word)?,
                ];
                Command::Triangle(Triangle::new(layout, vertices))
            }
            Opcode::ModelMatrix => Command::ModelMatrix(self.matrix(word)?),
            Opcode::ProjectionMatrix => Command::ProjectionMatrix(self.matrix(word)?),
            Opcode::NormalMatrix => Command::NormalMatrix(self.matrix(word)?),
            Opcode::ViewportParams => Command::Viewport(Viewport {
                x0: self.payload_u32(word)?,
                y0: self.payload_u32(word)?,
                half_width: self.payload_f32(word)?,
                half_height: self.payload_f32(word)?,
                depth_scale: self.payload_f32(word)?,
                depth_bias: self.payload_f32(word)?,
            }),
            Opcode::RasterState => {
                Command::RasterState(RasterState::from_bits(self.payload_u32(word)?))
            }
            Opcode::FragmentState => {
                Command::FragmentState(FragmentState::from_bits(self.payload_u32(word)?))
            }
            Opcode::LightState => Command::LightState {
                enabled: self.payload_u32(word)? & light_state::ENABLE != 0,
            },
            Opcode::LightParams => Command::LightParams(LightParams {
                direction: self.vec4(word)?,
                diffuse_color: self.vec4(word)?,
            }),
            Opcode::BlendParams => Command::BlendParams(self.payload_u32(word)?),
            Opcode::BindTexture => {
                let offset = self.payload_u32(word)?;
                let size = self.payload_u32(word)?;
                Command::BindTexture(TextureBinding::from_words(offset, size))
            }
            Opcode::Fragment => {
                let (x, y) = unpack_xy(self.payload_u32(word)?);
                Command::Fragment(Fragment {
                    x,
                    y,
                    z: self.payload_u32(word)?,
                    color: self.payload_u32(word)?,
                })
            }
            Opcode::TexFragment => {
                let (x, y) = unpack_xy(self.payload_u32(word)?);
                Command::TexFragment(TexFragment {
                    x,
                    y,
                    z: self.payload_u32(word)?,
                    s: self.payload_f32(word)?,
                    t: self.payload_f32(word)?,
                })
            }
            Opcode::Sync => Command::Sync,
            Opcode::ClearFramebuffer => Command::ClearFramebuffer,
            Opcode::ClearDepth => Command::ClearDepth,
            Opcode::Nop => Command::Nop,
        };
        Ok(cmd)
    }

    fn vertex(&mut self, layout: VertexLayout, word: u32) -> Result<Vertex, PipeError> {
        let position = if layout.has_w() {
            self.vec4(word)?
        } else {
            self.vec3(word)?.extend(1.0)
        };
        let mut vertex = Vertex::new(position, self.vec4(word)?);
        if layout.has_texcoord() {
            vertex.texcoord = Vec2::new(self.payload_f32(word)?, self.payload_f32(word)?);
        }
        if layout.has_normal() {
            vertex.diffuse = self.vec4(word)?;
            vertex.normal = self.vec3(word)?;
        }
        Ok(vertex)
    }

    /// Matrices travel row-major.
    fn matrix(&mut self, word: u32) -> Result<Mat4, PipeError> {
        let mut rows = [[0.0f32; 4]; 4];
        for row in rows.iter_mut() {
            for value in row.iter_mut() {
                *value = self.payload_f32(word)?;
            }
        }
        Ok(Mat4::from_cols_array_2d(&rows).transpose())
    }

    fn vec4(&mut self, word: u32) -> Result<Vec4, PipeError> {
        Ok(Vec4::new(
            self.payload_f32(word)?,
            self.payload_f32(word)?,
            self.payload_f32(word)?,
            self.payload_f32(word)?,
        ))
    }

    fn vec3(&mut self, word: u32) -> Result<Vec3, PipeError> {
        Ok(Vec3::new(
            self.payload_f32(word)?,
            self.payload_f32(word)?,
            self.payload_f32(word)?,
        ))
    }

    fn payload_u32(&mut self, word: u32) -> Result<u32, PipeError> {
        self.read_word()?.ok_or(PipeError::Truncated { word })
    }

    fn payload_f32(&mut self, word: u32) -> Result<f32, PipeError> {
        self.payload_u32(word).map(f32::from_bits)
    }
}

/// Writes commands to a byte stream.
pub struct CommandWriter<W: Write> {
    inner: BufWriter<W>,
    emitted: u64,
}

impl<W: Write> CommandWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner: BufWriter::new(inner),
            emitted: 0,
        }
    }

    /// Number of commands written so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    pub fn write_word(&mut self, word: u32) -> Result<(), PipeError> {
        self.inner.write_all(&word.to_le_bytes())?;
        Ok(())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<(), PipeError> {
        self.write_word(value.to_bits())
    }

    /// Encode a typed command.
    pub fn write_command(&mut self, cmd: &Command) -> Result<(), PipeError> {
        if let Command::Passthrough(raw) = cmd {
            return self.forward(raw);
        }

        self.write_word(cmd.word())?;
        match cmd {
            Command::Triangle(tri) => {
                for vertex in &tri.vertices {
                    self.write_vertex(tri.layout, vertex)?;
                }
            }
            Command::ModelMatrix(m) | Command::ProjectionMatrix(m) | Command::NormalMatrix(m) => {
                for i in 0..4 {
                    self.write_vec4(m.row(i))?;
                }
            }
            Command::Viewport(vp) => {
                self.write_word(vp.x0)?;
                self.write_word(vp.y0)?;
                self.write_f32(vp.half_width)?;
                self.write_f32(vp.half_height)?;
                self.write_f32(vp.depth_scale)?;
                self.write_f32(vp.depth_bias)?;
            }
            Command::RasterState(state) => self.write_word(state.bits())?,
            Command::FragmentState(state) => self.write_word(state.bits())?,
            Command::LightState { enabled } => {
                self.write_word(Command::light_state_bits(*enabled))?
            }
            Command::LightParams(light) => {
                self.write_vec4(light.direction)?;
                self.write_vec4(light.diffuse_color)?;
            }
            Command::BlendParams(bits) => self.write_word(*bits)?,
            Command::BindTexture(binding) => {
                self.write_word(binding.offset)?;
                self.write_word(binding.size_word())?;
            }
            Command::Fragment(frag) => {
                self.write_word(pack_xy(frag.x, frag.y))?;
                self.write_word(frag.z)?;
                self.write_word(frag.color)?;
            }
            Command::TexFragment(frag) => {
                self.write_word(pack_xy(frag.x, frag.y))?;
                self.write_word(frag.z)?;
                self.write_f32(frag.s)?;
                self.write_f32(frag.t)?;
            }
            Command::Sync
            | Command::ClearFramebuffer
            | Command::ClearDepth
            | Command::Nop
            | Command::Passthrough(_) => {}
        }
        self.emitted += 1;
        Ok(())
    }

    /// Forward a command unchanged with its declared payload.
    pub fn forward(&mut self, raw: &RawCommand) -> Result<(), PipeError> {
        self.write_word(raw.word)?;
        for &word in &raw.payload {
            self.write_word(word)?;
        }
        self.emitted += 1;
        Ok(())
    }

    /// Write a colored fragment.
    pub fn write_fragment(&mut self, fragment: &Fragment) -> Result<(), PipeError> {
        self.write_command(&Command::Fragment(*fragment))
    }

    pub fn flush(&mut self) -> Result<(), PipeError> {
        self.inner.flush()?;
        Ok(())
    }

    /// Flush and return the underlying stream.
    pub fn into_inner(self) -> Result<W, PipeError> {
        self.inner
            .into_inner()
            .map_err(|e| PipeError::Io(e.into_error()))
    }

    fn write_vertex(&mut self, layout: VertexLayout, vertex: &Vertex) -> Result<(), PipeError> {
        if layout.has_w() {
            self.write_vec4(vertex.position)?;
        } else {
            self.write_vec3(vertex.position.truncate())?;
        }
        self.write_vec4(vertex.color)?;
        if layout.has_texcoord() {
            self.write_f32(vertex.texcoord.x)?;
            self.write_f32(vertex.texcoord.y)?;
        }
        if layout.has_normal() {
            self.write_vec4(vertex.diffuse)?;
            self.write_vec3(vertex.normal)?;
        }
        Ok(())
    }

    fn write_vec4(&mut self, v: Vec4) -> Result<(), PipeError> {
        for value in v.to_array() {
            self.write_f32(value)?;
        }
        Ok(())
    }

    fn write_vec3(&mut self, v: Vec3) -> Result<(), PipeError> {
        for value in v.to_array() {
            self.write_f32(value)?;
        }
        Ok(())
    }
}
