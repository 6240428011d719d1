//! Software model of a five-block fixed-function 3D pipeline.
//!
//! Each block is its own crate and speaks the binary command stream defined
//! in `ffp-twin-core`. This crate wires the blocks together in one process
//! and adds the configuration layer used by the command-line front end.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{PipelineConfig, StageKind, TextureLoad, MAX_SCREEN_SIDE};
pub use error::TwinError;
pub use pipeline::{run_stage_kind, Pipeline, RenderSummary};

pub use ffp_display as display;
pub use ffp_fragment_ops as fragment_ops;
pub use ffp_illumination as illumination;
pub use ffp_memory as memory;
pub use ffp_rasterizer as rasterizer;
pub use ffp_texture as texture;
pub use ffp_twin_core as twin_core;
pub use ffp_vertex_transform as vertex_transform;
