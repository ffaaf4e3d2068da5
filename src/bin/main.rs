use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use opencv::prelude::*;
use opencv::{highgui, imgcodecs};
use skin_detector::{init_logging, DetectorArgs, SkinDetector};
use tracing::info;

/// Run calibration and the window scan on a single image.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Image to scan. The calibration box is taken from this image too.
    #[clap(short, long)]
    input: PathBuf,

    /// Write the annotated frame here instead of showing it.
    #[clap(short, long)]
    output: Option<PathBuf>,

    #[command(flatten)]
    detector: DetectorArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    init_logging(args.detector.verbose);

    let input = args.input.to_string_lossy();
    let frame = imgcodecs::imread_def(&input)?;
    if frame.size()?.width == 0 {
        anyhow::bail!("Unable to read image {input}");
    }

    let mut detector = SkinDetector::new(args.detector.to_config()?);
    let report = detector.process_frame(&frame)?;

    info!(range = ?report.range, "Skin colour range");
    for row in &report.grid {
        let counts: Vec<usize> = row.iter().map(|window| window.count).collect();
        println!("{counts:?}");
    }
    match report.best {
        Some(best) => println!(
            "best window: x {} y {} {}x{} with {} skin pixels",
            best.x, best.y, best.width, best.height, best.count
        ),
        None => println!("best window: none"),
    }
    println!("people: {}", report.regions.len());

    match args.output {
        Some(output) => {
            let output = output.to_string_lossy();
            let written = imgcodecs::imwrite_def(&output, &report.debug_frame)?;
            if !written {
                anyhow::bail!("Unable to write image {output}");
            }
            info!("Wrote {output}");
        }
        None => {
            let window = "Skin detector";
            highgui::named_window_def(window)?;
            highgui::imshow(window, &report.debug_frame)
                .context("Failed to show annotated frame")?;
            highgui::wait_key(0)?;
        }
    }

    Ok(())
}
