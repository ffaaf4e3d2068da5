use clap::Parser;
use opencv::highgui;
use skin_detector::{init_logging, CameraSource, DetectorArgs, SkinDetector};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,

    #[command(flatten)]
    detector: DetectorArgs,
}

fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    init_logging(args.detector.verbose);

    let mut detector = SkinDetector::new(args.detector.to_config()?);

    let window = "Skin detector";
    highgui::named_window_def(window)?;

    let mut camera_source = CameraSource::new(args.camera).inspect_err(|err| error!("{err}"))?;
    info!("Press q to quit, c to recalibrate");

    loop {
        let frame = match camera_source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                error!("{err}");
                break;
            }
        };

        let report = detector.process_frame(&frame)?;
        highgui::imshow(window, &report.debug_frame)?;

        match highgui::wait_key(1)? & 0xFF {
            key if key == 'q' as i32 => break,
            key if key == 'c' as i32 => detector.recalibrate(),
            _ => {}
        }
    }

    drop(camera_source);
    highgui::destroy_all_windows()?;
    Ok(())
}
