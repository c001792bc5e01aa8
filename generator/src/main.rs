use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use common::log_setup::setup_logging;
use generator::prelude::{Config, FlatRenderer, Generator, Mode};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[derive(Parser)]
#[command(name = "generator")]
#[command(about = "Generate labeled training images from 3D models over background photos")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration.
    #[arg(long, default_value = "./config.json")]
    cfg: PathBuf,

    #[arg(long, value_enum, default_value_t = Mode::Preview)]
    mode: Mode,

    /// Seed for reproducible datasets. Random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    /// Log specification, e.g. `info` or `debug,generator=trace`.
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Stop after this many rendered frames, masks included.
    #[arg(long)]
    max_frames: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _logger = setup_logging(&cli.log_level);

    let config = Config::load(&cli.cfg)
        .with_context(|| format!("loading configuration {}", cli.cfg.display()))?;

    let rng = match cli.seed {
        Some(seed) => {
            log::info!("Using seed {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let mut renderer = FlatRenderer::new(config.generator.output.size.width);
    if let Some(limit) = cli.max_frames {
        renderer = renderer.with_frame_limit(limit);
    }

    let mut generator = Generator::new(config, renderer, rng, cli.mode);
    let summary = generator.run().await.context("generation failed")?;

    log::info!(
        "Done: {} frames, {} masks, {} saved, {} timed out, {} failed{}",
        summary.frames,
        summary.masks,
        summary.saved,
        summary.timed_out,
        summary.failed,
        if summary.interrupted { ", interrupted" } else { "" }
    );

    Ok(())
}
