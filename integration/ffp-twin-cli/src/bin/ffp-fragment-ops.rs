use clap::Parser;
use ffp_twin::memory::FlatMemory;
use ffp_twin::StageKind;
use ffp_twin_cli::{init_logging, run_stage_binary, StageArgs};

#[derive(Parser)]
#[command(name = "ffp-fragment-ops")]
#[command(about = "Depth test, alpha test and blending stage", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    stage: StageArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.stage.quiet);
    run_stage_binary(StageKind::FragmentOps, &cli.stage, &FlatMemory::zeroed(0))
}
