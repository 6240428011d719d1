use std::path::PathBuf;

use clap::Parser;
use ffp_twin::{Pipeline, PipelineConfig};
use ffp_twin_cli::{fatal_pipeline, init_logging, open_input};

#[derive(Parser)]
#[command(name = "ffp-render")]
#[command(about = "Run a command stream through the whole pipeline in one process", long_about = None)]
#[command(version)]
struct Cli {
    /// Pipeline configuration (JSON)
    config: PathBuf,

    /// Input command stream (file or FIFO, "-" for stdin)
    input: PathBuf,

    /// Write the final frame to this PNG
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    let config = PipelineConfig::load(&cli.config)?;
    if let Some(dir) = &config.frame_dir {
        std::fs::create_dir_all(dir)?;
    }
    let pipeline = Pipeline::new(config)?;
    let input = open_input(&cli.input)?;
    let summary = pipeline.run(input).map_err(fatal_pipeline)?;

    if !cli.quiet {
        eprintln!(
            "Rendered {} frames, {} fragments",
            summary.frames(),
            summary.fragments()
        );
    }
    if let Some(path) = &cli.output {
        summary.save_png(path).map_err(fatal_pipeline)?;
    }
    Ok(())
}
