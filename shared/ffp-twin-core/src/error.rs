use thiserror::Error;

/// How an error is treated by the process hosting a stage.
///
/// None of the categories is retried: protocol and resource errors abort the
/// stage, configuration errors exit cleanly before any frame is processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Producer and consumer disagree about the command stream.
    Protocol,
    /// A fixed capacity was exceeded.
    Resource,
    /// Bad arguments or unreachable endpoints.
    Config,
}

/// Errors raised while decoding, processing or emitting pipeline commands.
#[derive(Debug, Error)]
pub enum PipeError {
    /// I/O error on one of the stage's streams.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A command word does not carry the `0xFFFF` marker in bits 31..16.
    #[error("command word {word:#010X} is missing the 0xFFFF marker")]
    MissingMarker { word: u32 },

    /// The input ended in the middle of a command payload.
    #[error("stream ended inside the payload of command {word:#010X}")]
    Truncated { word: u32 },

    /// The near-W clipper produced a vertex count other than 3 or 4.
    #[error("clipper produced {count} vertices, expected 3 or 4")]
    ClipCount { count: usize },

    /// A vertex survived clipping with a W that cannot be inverted.
    #[error("non-positive w ({w}) after clipping")]
    NonPositiveW { w: f32 },

    /// The stage recognises the command but cannot process it in this position.
    #[error("{stage} cannot process command {word:#010X}")]
    Unsupported { stage: &'static str, word: u32 },

    /// Blending was enabled with a factor selector outside the implemented subset.
    #[error("unsupported blend factor selector {0}")]
    UnknownBlendFactor(u8),

    /// A texel fetch fell outside the external memory region.
    #[error("texel read at byte offset {offset:#X} outside {len}-byte memory")]
    TexelOutOfRange { offset: usize, len: usize },

    /// A fragment addressed a pixel outside the stage's buffers.
    #[error("fragment ({x}, {y}) outside {width}x{height} buffer")]
    FragmentOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    /// A stage was configured with unusable parameters.
    #[error("configuration error: {0}")]
    Config(String),
}

impl PipeError {
    /// Classify the error for the hosting process.
    pub fn category(&self) -> ErrorCategory {
        match self {
            PipeError::Io(_) | PipeError::Config(_) => ErrorCategory::Config,
            PipeError::TexelOutOfRange { .. }
            | PipeError::FragmentOutOfBounds { .. } => ErrorCategory::Resource,
            PipeError::MissingMarker { .. }
            | PipeError::Truncated { .. }
            | PipeError::ClipCount { .. }
            | PipeError::NonPositiveW { .. }
            | PipeError::Unsupported { .. }
            | PipeError::UnknownBlendFactor(_) => ErrorCategory::Protocol,
        }
    }
}
