//! Process plumbing shared by the stage binaries.
//!
//! Configuration problems (bad arguments, streams that cannot be opened,
//! unreadable memory images) are returned as [`anyhow::Error`] so `main`
//! prints them and exits non-zero. Any other error raised while a stream is
//! being processed, I/O failures included, is logged and aborts the process.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Args;
use ffp_twin::memory::{FlatMemory, DEFAULT_MEMORY_SIZE};
use ffp_twin::twin_core::{ErrorCategory, PipeError};
use ffp_twin::{run_stage_kind, StageKind, TwinError, MAX_SCREEN_SIDE};

/// Positional arguments every stage binary takes.
#[derive(Debug, Clone, Args)]
pub struct StageArgs {
    /// Screen width in pixels
    pub width: u32,

    /// Screen height in pixels
    pub height: u32,

    /// Input command stream (file or FIFO, "-" for stdin)
    pub input: PathBuf,

    /// Output command stream (file or FIFO, "-" for stdout)
    pub output: PathBuf,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

/// Start `env_logger` at `info`, or `warn` when quiet. `RUST_LOG` overrides.
pub fn init_logging(quiet: bool) {
    let level = if quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

pub fn check_screen(width: u32, height: u32) -> anyhow::Result<()> {
    for (name, side) in [("width", width), ("height", height)] {
        if side == 0 || side > MAX_SCREEN_SIDE {
            bail!("{name} {side} outside 1..={MAX_SCREEN_SIDE}");
        }
    }
    Ok(())
}

fn is_stdio(path: &Path) -> bool {
    path.as_os_str() == "-"
}

pub fn open_input(path: &Path) -> anyhow::Result<Box<dyn Read + Send>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path)
        .with_context(|| format!("cannot open input stream {}", path.display()))?;
    Ok(Box::new(file))
}

/// Open an output stream, replacing any previous contents of a regular file.
pub fn open_output(path: &Path) -> anyhow::Result<Box<dyn Write + Send>> {
    if is_stdio(path) {
        return Ok(Box::new(io::stdout()));
    }
    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .with_context(|| format!("cannot open output stream {}", path.display()))?;
    Ok(Box::new(file))
}

/// Whether an error raised while a stream is being processed aborts the
/// process. Only configuration errors exit cleanly; I/O errors do not.
pub fn aborts_processing(err: &PipeError) -> bool {
    match err {
        PipeError::Io(_) => true,
        other => other.category() != ErrorCategory::Config,
    }
}

/// Turn a processing error into the process outcome for its category.
pub fn fatal(context: &str, err: PipeError) -> anyhow::Error {
    if aborts_processing(&err) {
        log::error!("{context}: {err}");
        std::process::abort()
    }
    anyhow::Error::new(err).context(context.to_string())
}

/// Same as [`fatal`] for errors from the in-process pipeline. Setup errors
/// happen before any stream is read and exit cleanly.
pub fn fatal_pipeline(err: TwinError) -> anyhow::Error {
    let aborts = match &err {
        TwinError::Stage { source, .. } | TwinError::Display(source) => aborts_processing(source),
        TwinError::Panicked(_) => true,
        TwinError::Config(_) | TwinError::Json(_) | TwinError::Setup(_) => false,
    };
    if aborts {
        log::error!("{err}");
        std::process::abort()
    }
    anyhow::Error::new(err)
}

/// Texel memory for a stage binary: the given image, or zero-filled memory.
pub fn load_memory(path: Option<&Path>) -> anyhow::Result<FlatMemory> {
    match path {
        Some(path) => FlatMemory::load(path)
            .with_context(|| format!("cannot load texel memory {}", path.display())),
        None => Ok(FlatMemory::zeroed(DEFAULT_MEMORY_SIZE)),
    }
}

/// Run one stage between the streams named in `args`.
pub fn run_stage_binary(
    kind: StageKind,
    args: &StageArgs,
    memory: &FlatMemory,
) -> anyhow::Result<()> {
    check_screen(args.width, args.height)?;
    let input = open_input(&args.input)?;
    let output = open_output(&args.output)?;

    let report = run_stage_kind(kind, args.width, args.height, memory, input, output)
        .map_err(|e| fatal(kind.name(), e))?;
    log::info!(
        "{}: {} handled, {} forwarded, {} emitted",
        kind,
        report.handled,
        report.forwarded,
        report.emitted
    );
    Ok(())
}
