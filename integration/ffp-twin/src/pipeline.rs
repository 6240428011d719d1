//! In-process pipeline: one thread per stage, connected by OS pipes.
//!
//! Blocking reads and writes on the pipes are the only flow control. The
//! display sink runs on the calling thread and consumes the last stage's
//! output. When a stage fails its pipes close, so upstream stages see broken
//! pipes and downstream stages see end of input; the reported error is the
//! first one in pipeline order that is not a broken pipe.

use std::io::{self, Read, Write};
use std::path::Path;
use std::thread;

use ffp_display::Display;
use ffp_fragment_ops::FragmentOps;
use ffp_illumination::Illumination;
use ffp_memory::{FlatMemory, TexelMemory, DEFAULT_MEMORY_SIZE};
use ffp_rasterizer::Rasterizer;
use ffp_texture::Texturing;
use ffp_twin_core::{run_stage, PipeError, StageReport};
use ffp_vertex_transform::VertexTransform;

use crate::config::{PipelineConfig, StageKind};
use crate::error::TwinError;

/// Run one stage of the given kind from `input` to `output`.
///
/// Texturing reads its texels from `memory`; the other stages ignore it.
pub fn run_stage_kind<M, R, W>(
    kind: StageKind,
    width: u32,
    height: u32,
    memory: M,
    input: R,
    output: W,
) -> Result<StageReport, PipeError>
where
    M: TexelMemory,
    R: Read,
    W: Write,
{
    match kind {
        StageKind::VertexTransform => {
            run_stage(&mut VertexTransform::new(width, height), input, output)
        }
        StageKind::Illumination => run_stage(&mut Illumination::new(), input, output),
        StageKind::Rasterizer => run_stage(&mut Rasterizer::new(width, height), input, output),
        StageKind::Texturing => run_stage(&mut Texturing::new(memory), input, output),
        StageKind::FragmentOps => run_stage(&mut FragmentOps::new(width, height), input, output),
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct RenderSummary {
    display: Display,
    stages: Vec<(StageKind, StageReport)>,
}

impl RenderSummary {
    /// SYNC commands that reached the display.
    pub fn frames(&self) -> u64 {
        self.display.report().frames
    }

    /// Fragments that reached the display.
    pub fn fragments(&self) -> u64 {
        self.display.report().fragments
    }

    /// Final display frame, row-major ARGB with row 0 at the bottom.
    pub fn frame(&self) -> &[u32] {
        self.display.frame()
    }

    pub fn stage_reports(&self) -> &[(StageKind, StageReport)] {
        &self.stages
    }

    pub fn save_png(&self, path: &Path) -> Result<(), TwinError> {
        self.display.save_png(path).map_err(TwinError::Display)
    }
}

fn is_broken_pipe(e: &PipeError) -> bool {
    matches!(e, PipeError::Io(io) if io.kind() == io::ErrorKind::BrokenPipe)
}

/// A configured pipeline with its texel memory.
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    memory: FlatMemory,
}

impl Pipeline {
    /// Validate `config`, load texel memory and preload textures.
    pub fn new(config: PipelineConfig) -> Result<Self, TwinError> {
        let memory = match &config.memory {
            Some(path) => FlatMemory::load(path)?,
            None => FlatMemory::zeroed(config.memory_size.unwrap_or(DEFAULT_MEMORY_SIZE)),
        };
        Self::with_memory(config, memory)
    }

    /// Use `memory` instead of the configured image. Textures are still
    /// preloaded into it.
    pub fn with_memory(config: PipelineConfig, mut memory: FlatMemory) -> Result<Self, TwinError> {
        config.validate()?;
        for tex in &config.textures {
            memory.load_png(&tex.path, tex.offset)?;
        }
        Ok(Self { config, memory })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    /// Feed `input` through every stage and collect the display output.
    pub fn run<R: Read + Send>(&self, input: R) -> Result<RenderSummary, TwinError> {
        let PipelineConfig {
            width,
            height,
            ref stages,
            ref frame_dir,
            ..
        } = self.config;
        let mut display = Display::new(width, height);
        if let Some(dir) = frame_dir {
            display = display.with_frame_dir(dir);
        }
        log::info!(
            "pipeline: {}x{} with stages [{}]",
            width,
            height,
            stages
                .iter()
                .map(|s| s.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        thread::scope(|scope| -> Result<RenderSummary, TwinError> {
            let memory = &self.memory;
            let mut upstream: Box<dyn Read + Send + '_> = Box::new(input);
            let mut handles = Vec::with_capacity(stages.len());

            for &kind in stages {
                let (reader, writer) = io::pipe().map_err(PipeError::Io)?;
                let stage_input = std::mem::replace(&mut upstream, Box::new(reader));
                let handle = thread::Builder::new()
                    .name(kind.name().to_string())
                    .spawn_scoped(scope, move || {
                        run_stage_kind(kind, width, height, memory, stage_input, writer)
                    })
                    .map_err(PipeError::Io)?;
                handles.push((kind, handle));
            }

            let display_result = display.run(upstream);

            let mut reports = Vec::with_capacity(handles.len());
            let mut errors = Vec::new();
            for (kind, handle) in handles {
                match handle.join() {
                    Ok(Ok(report)) => reports.push((kind, report)),
                    Ok(Err(source)) => {
                        log::error!("pipeline: {} failed: {}", kind, source);
                        errors.push(TwinError::Stage { stage: kind, source });
                    }
                    Err(_) => errors.push(TwinError::Panicked(kind.name())),
                }
            }
            if let Err(e) = display_result {
                errors.push(TwinError::Display(e));
            }

            let root_cause = errors.iter().position(|e| match e {
                TwinError::Stage { source, .. } | TwinError::Display(source) => {
                    !is_broken_pipe(source)
                }
                _ => true,
            });
            if let Some(i) = root_cause {
                return Err(errors.swap_remove(i));
            }
            if let Some(first) = errors.into_iter().next() {
                return Err(first);
            }

            Ok(RenderSummary {
                display,
                stages: reports,
            })
        })
    }

    /// Run an in-memory command stream.
    pub fn run_bytes(&self, input: &[u8]) -> Result<RenderSummary, TwinError> {
        self.run(input)
    }
}
