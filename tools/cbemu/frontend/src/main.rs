mod render;

use anyhow::{bail, Context, Result};
use cbemu_core::Amiga;
use clap::Parser;
use copperbars::{config::DemoConfig, demo};
use tracing::{info, Level};
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "cbemu")]
#[command(version, about = "Run the copper bars on a simulated Amiga", long_about = None)]
struct Cli {
    /// Frames to let the demo run before clicking the left mouse button
    #[arg(short, long, default_value_t = 250)]
    frames: u64,

    /// Click at this frame, counted from power on (overrides --frames)
    #[arg(long)]
    click_at: Option<u64>,

    /// Print every K-th frame's raster, 0 for none
    #[arg(short, long, default_value_t = 50)]
    every: u64,

    /// Terminal columns per raster row
    #[arg(short, long, default_value_t = 40)]
    width: usize,

    #[arg(long, default_value_t = Level::INFO)]
    log_level: Level,
}

fn setup_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .compact()
        .finish()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level);

    let mut amiga = Amiga::new();
    amiga.run_frames(1);
    let before = amiga.snapshot();

    let click = cli.click_at.unwrap_or(amiga.bus().frame() + cli.frames);
    if click <= amiga.bus().frame() {
        bail!("frame {click} has already gone by");
    }
    amiga.click_at(click);
    amiga.capture_every(cli.every);

    let summary = demo::run(&mut amiga, &DemoConfig::default()).context("demo did not start")?;

    for frame in amiga.take_captures().iter().filter(|f| f.handler_frames > 0) {
        println!("frame {} (handler frame {})", frame.frame, frame.handler_frames);
        print!("{}", render::raster(&frame.raster, cli.width));
    }

    info!("{} frames, restored {:?}", summary.frames, summary.restored);

    let after = amiga.snapshot();
    if after != before {
        bail!("system not restored\n before: {before:?}\n  after: {after:?}");
    }
    println!("ran {} frames, system restored", summary.frames);
    Ok(())
}
