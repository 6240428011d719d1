use std::path::PathBuf;

use clap::Parser;
use ffp_twin::StageKind;
use ffp_twin_cli::{init_logging, load_memory, run_stage_binary, StageArgs};

#[derive(Parser)]
#[command(name = "ffp-texturing")]
#[command(about = "Nearest-neighbour texturing stage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    stage: StageArgs,

    /// Raw texel memory image (zero-filled 64 MiB when omitted)
    #[arg(short, long)]
    memory: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.stage.quiet);
    let memory = load_memory(cli.memory.as_deref())?;
    run_stage_binary(StageKind::Texturing, &cli.stage, &memory)
}
