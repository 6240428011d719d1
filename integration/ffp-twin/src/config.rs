//! Pipeline configuration.
//!
//! Loaded from JSON, for example:
//!
//! ```json
//! {
//!   "width": 640,
//!   "height": 480,
//!   "stages": ["vertex-transform", "illumination", "rasterizer", "fragment-ops"],
//!   "textures": [{ "path": "brick.png", "offset": 4194304 }],
//!   "frame_dir": "frames"
//! }
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::TwinError;

/// Largest screen side: fragment coordinates are 16-bit.
pub const MAX_SCREEN_SIDE: u32 = 1 << 16;

/// One pipeline block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageKind {
    VertexTransform,
    Illumination,
    Rasterizer,
    Texturing,
    FragmentOps,
}

impl StageKind {
    /// Every block in pipeline order.
    pub const ORDER: [StageKind; 5] = [
        StageKind::VertexTransform,
        StageKind::Illumination,
        StageKind::Rasterizer,
        StageKind::Texturing,
        StageKind::FragmentOps,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StageKind::VertexTransform => "vertex-transform",
            StageKind::Illumination => "illumination",
            StageKind::Rasterizer => "rasterizer",
            StageKind::Texturing => "texturing",
            StageKind::FragmentOps => "fragment-ops",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A PNG texture placed in texel memory before the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureLoad {
    pub path: PathBuf,
    pub offset: u32,
}

fn default_stages() -> Vec<StageKind> {
    vec![
        StageKind::VertexTransform,
        StageKind::Rasterizer,
        StageKind::FragmentOps,
    ]
}

/// Screen size, stage chain and external resources of a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_stages")]
    pub stages: Vec<StageKind>,
    /// Raw texel memory image. Zero-filled memory is used when absent.
    #[serde(default)]
    pub memory: Option<PathBuf>,
    /// Size of the zero-filled memory when no image is given.
    #[serde(default)]
    pub memory_size: Option<usize>,
    #[serde(default)]
    pub textures: Vec<TextureLoad>,
    /// Directory for per-frame PNG dumps.
    #[serde(default)]
    pub frame_dir: Option<PathBuf>,
}

impl PipelineConfig {
    /// Transform, rasterize and fragment stages with optional lighting and
    /// texturing.
    pub fn new(width: u32, height: u32, lighting: bool, texturing: bool) -> Self {
        let stages = StageKind::ORDER
            .into_iter()
            .filter(|s| match s {
                StageKind::Illumination => lighting,
                StageKind::Texturing => texturing,
                _ => true,
            })
            .collect();
        Self {
            width,
            height,
            stages,
            memory: None,
            memory_size: None,
            textures: Vec::new(),
            frame_dir: None,
        }
    }

    pub fn from_json(text: &str) -> Result<Self, TwinError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, TwinError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| TwinError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    pub fn has_stage(&self, kind: StageKind) -> bool {
        self.stages.contains(&kind)
    }

    /// Stages must appear at most once, in pipeline order, ending with the
    /// fragment stage that feeds the display.
    pub fn validate(&self) -> Result<(), TwinError> {
        for (name, side) in [("width", self.width), ("height", self.height)] {
            if side == 0 || side > MAX_SCREEN_SIDE {
                return Err(TwinError::Config(format!(
                    "{name} {side} outside 1..={MAX_SCREEN_SIDE}"
                )));
            }
        }
        if self.stages.last() != Some(&StageKind::FragmentOps) {
            return Err(TwinError::Config(
                "the last stage must be fragment-ops".into(),
            ));
        }
        if self.stages.windows(2).any(|pair| pair[0] >= pair[1]) {
            let names: Vec<&str> = self.stages.iter().map(|s| s.name()).collect();
            return Err(TwinError::Config(format!(
                "stages [{}] are not in pipeline order",
                names.join(", ")
            )));
        }
        if !self.textures.is_empty() && !self.has_stage(StageKind::Texturing) {
            log::warn!("textures configured without a texturing stage");
        }
        Ok(())
    }
}
