//! Shared types for the fixed-function pipeline twin.
//!
//! Every pipeline block is a [`Stage`] that reads one command stream and
//! writes the next. This crate defines the command protocol, the stream
//! codec, the stage loop and the small amount of math and color handling the
//! blocks share.

pub mod color;
pub mod command;
pub mod error;
pub mod math;
pub mod protocol;
pub mod stage;
pub mod stream;

pub use command::{
    BlendFactor, Command, Fragment, FragmentState, LightParams, RasterState, RawCommand,
    TexFragment, TextureBinding, Triangle, Vertex, VertexLayout, Viewport,
};
pub use error::{ErrorCategory, PipeError};
pub use protocol::Opcode;
pub use stage::{run_stage, Stage, StageReport};
pub use stream::{CommandReader, CommandWriter};

/// Re-exported so component crates and tests share one math library version.
pub use glam;
