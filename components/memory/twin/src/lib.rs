//! External memory seen by the texturing stage.
//!
//! The host owns the memory region; stages only read it through
//! [`TexelMemory`]. [`FlatMemory`] is a byte-addressed, little-endian model of
//! that region which the host can fill from a raw image file, word by word,
//! or from PNG textures.

use std::path::Path;
use std::sync::Arc;

use ffp_twin_core::{PipeError, TextureBinding};

/// Size of the host memory region when none is given.
pub const DEFAULT_MEMORY_SIZE: usize = 64 * 1024 * 1024;

/// Read-only access to 32-bit texels.
pub trait TexelMemory {
    /// Little-endian word at byte offset `offset`.
    fn read_word(&self, offset: usize) -> Result<u32, PipeError>;

    /// Size of the region in bytes.
    fn size(&self) -> usize;
}

impl<T: TexelMemory + ?Sized> TexelMemory for &T {
    fn read_word(&self, offset: usize) -> Result<u32, PipeError> {
        (**self).read_word(offset)
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

impl<T: TexelMemory + ?Sized> TexelMemory for Arc<T> {
    fn read_word(&self, offset: usize) -> Result<u32, PipeError> {
        (**self).read_word(offset)
    }

    fn size(&self) -> usize {
        (**self).size()
    }
}

/// Flat byte-addressed memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatMemory {
    bytes: Vec<u8>,
}

impl FlatMemory {
    /// Zero-filled memory of `size` bytes.
    pub fn zeroed(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Load a raw memory image. The region is exactly the file's size.
    pub fn load(path: &Path) -> Result<Self, PipeError> {
        let bytes = std::fs::read(path).map_err(|e| {
            PipeError::Config(format!("cannot read memory image {}: {e}", path.display()))
        })?;
        log::info!("memory: loaded {} bytes from {}", bytes.len(), path.display());
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn range(&self, offset: usize, len: usize) -> Result<std::ops::Range<usize>, PipeError> {
        match offset.checked_add(len) {
            Some(end) if end <= self.bytes.len() => Ok(offset..end),
            _ => Err(PipeError::TexelOutOfRange {
                offset,
                len: self.bytes.len(),
            }),
        }
    }

    /// Store a little-endian word at byte offset `offset`.
    pub fn write_word(&mut self, offset: usize, word: u32) -> Result<(), PipeError> {
        let r = self.range(offset, 4)?;
        self.bytes[r].copy_from_slice(&word.to_le_bytes());
        Ok(())
    }

    /// Copy `data` into memory starting at `offset`.
    pub fn write_bytes(&mut self, offset: usize, data: &[u8]) -> Result<(), PipeError> {
        let r = self.range(offset, data.len())?;
        self.bytes[r].copy_from_slice(data);
        Ok(())
    }

    /// Decode a PNG and store it as RGBA8 texels (red in the low byte),
    /// row 0 first, at `offset`. Returns the binding that samples it.
    pub fn load_png(&mut self, path: &Path, offset: u32) -> Result<TextureBinding, PipeError> {
        let img = image::open(path).map_err(|e| {
            PipeError::Config(format!("cannot decode texture {}: {e}", path.display()))
        })?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(PipeError::Config(format!(
                "texture {} is {}x{}, larger than 65535 texels on a side",
                path.display(),
                width,
                height
            )));
        };
        self.write_bytes(offset as usize, rgba.as_raw())?;
        log::info!(
            "memory: texture {} ({}x{}) at {:#X}",
            path.display(),
            width,
            height,
            offset
        );
        Ok(TextureBinding {
            offset,
            width: w,
            height: h,
        })
    }
}

impl TexelMemory for FlatMemory {
    fn read_word(&self, offset: usize) -> Result<u32, PipeError> {
        let r = self.range(offset, 4)?;
        let b = &self.bytes[r];
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn size(&self) -> usize {
        self.bytes.len()
    }
}
