use clap::Parser;
use opencv::highgui;
use skin_detector::{
    init_logging, jpeg_to_mat, open_session, DetectorArgs, DetectorError, SkinDetector, ZenohArgs,
    IMAGE_TOPIC,
};
use tracing::info;
use zenoh::prelude::r#async::*;

/// Run the skin detector on frames published by camera_driver.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    #[command(flatten)]
    zenoh: ZenohArgs,

    #[command(flatten)]
    detector: DetectorArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    init_logging(args.detector.verbose);

    let mut detector = SkinDetector::new(args.detector.to_config()?);

    let window = "Skin detector";
    highgui::named_window_def(window)?;

    let zenoh_session = open_session(&args.zenoh).await?;

    let subscriber = zenoh_session
        .declare_subscriber(IMAGE_TOPIC)
        .best_effort()
        .res()
        .await
        .map_err(DetectorError::ZenohError)?;
    info!(topic = IMAGE_TOPIC, "Waiting for frames");

    loop {
        let msg = subscriber.recv_async().await?;
        let payload: Vec<u8> = msg.value.try_into()?;

        let frame = jpeg_to_mat(&payload)?;

        let report = detector.process_frame(&frame)?;
        highgui::imshow(window, &report.debug_frame)?;

        match highgui::poll_key()? & 0xFF {
            key if key == 'q' as i32 => break,
            key if key == 'c' as i32 => detector.recalibrate(),
            _ => {}
        }
    }

    highgui::destroy_all_windows()?;
    Ok(())
}
