use anyhow::Context;
use clap::Parser;
use generator::profile::SpotGenerator;
use generator::replay::{load_results, save_results};
use spotcore::DetectionResult;
use std::path::PathBuf;
use workflow::config::SessionConfig;
use workflow::runner::{RunOptions, Runner};

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Offline spot counter driver")]
struct Args {
    /// Load the session (cameras, display, colors) from YAML
    #[arg(long)]
    session: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    cameras: usize,
    /// Density image width in pixels
    #[arg(long, default_value_t = 512)]
    width: u32,
    /// Density image height in pixels
    #[arg(long, default_value_t = 512)]
    height: u32,
    #[arg(long, default_value_t = 256)]
    x_pixels: u32,
    #[arg(long, default_value_t = 256)]
    y_pixels: u32,
    /// Synthetic frames to generate
    #[arg(long, default_value_t = 1000)]
    frames: u64,
    /// Mean spots per synthetic frame
    #[arg(long, default_value_t = 20.0)]
    spots: f32,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Replay JSON-lines detections instead of generating them
    #[arg(long)]
    replay: Option<PathBuf>,
    /// Save the generated detections as JSON lines
    #[arg(long)]
    record: Option<PathBuf>,
    /// Root file name for the density images
    #[arg(long)]
    output: Option<String>,
    /// Render camera 1's rolling series to this PNG
    #[arg(long)]
    graph_out: Option<PathBuf>,
    /// Frames delivered before filming starts
    #[arg(long, default_value_t = 0)]
    idle_frames: u64,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let session = if let Some(path) = &args.session {
        SessionConfig::load(path)?
    } else {
        SessionConfig::from_args(
            args.cameras,
            args.width,
            args.height,
            args.x_pixels,
            args.y_pixels,
        )
    };

    let runner = Runner::new(session);
    let options = RunOptions {
        output: args.output.clone(),
        idle_frames: args.idle_frames,
        graph_out: args.graph_out.clone(),
    };

    let result = if let Some(path) = &args.replay {
        let results = load_results(path)?;
        runner.execute_replay(results, &options)?
    } else {
        let synthetic = runner.generator_config(args.frames, args.spots, args.seed);
        if let Some(record) = &args.record {
            let recorded: Vec<DetectionResult> = SpotGenerator::new(synthetic.clone())?.collect();
            save_results(record, &recorded)
                .with_context(|| format!("recording detections to {}", record.display()))?;
        }
        runner.execute_generated(synthetic, &options)?
    };

    println!(
        "Finished analysis -> frames {}, totals {:?}, images {}",
        result.frames,
        result.totals,
        result.exported.len()
    );
    println!(
        "{}",
        serde_json::to_string(&result).context("encoding run summary")?
    );
    Ok(())
}
