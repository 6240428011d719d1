use std::path::PathBuf;

use clap::Parser;
use ffp_twin::display::Display;
use ffp_twin_cli::{check_screen, fatal, init_logging, open_input};

#[derive(Parser)]
#[command(name = "ffp-display")]
#[command(about = "Display sink for the fragment stage's output", long_about = None)]
#[command(version)]
struct Cli {
    /// Screen width in pixels
    width: u32,

    /// Screen height in pixels
    height: u32,

    /// Input command stream (file or FIFO, "-" for stdin)
    input: PathBuf,

    /// Write every completed frame as frame_NNNNN.png into this directory
    #[arg(long)]
    frame_dir: Option<PathBuf>,

    /// Write the last frame to this PNG when the input closes
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);
    check_screen(cli.width, cli.height)?;

    let mut display = Display::new(cli.width, cli.height);
    if let Some(dir) = &cli.frame_dir {
        std::fs::create_dir_all(dir)?;
        display = display.with_frame_dir(dir);
    }
    let input = open_input(&cli.input)?;
    display.run(input).map_err(|e| fatal("display", e))?;

    if let Some(path) = &cli.output {
        display.save_png(path).map_err(|e| fatal("display", e))?;
        log::info!("display: wrote {}", path.display());
    }
    Ok(())
}
