use clap::Parser;
use skin_detector::{
    init_logging, mat_to_jpeg, open_session, CameraSource, DetectorError, ZenohArgs, IMAGE_TOPIC,
};
use tracing::{error, info};
use zenoh::prelude::r#async::*;

/// Publish camera frames as JPEG over zenoh.
#[derive(Parser, Debug)]
#[command()]
struct Args {
    /// Camera device index.
    #[clap(short, long, default_value_t = 0)]
    camera: i32,

    #[command(flatten)]
    zenoh: ZenohArgs,

    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = Args::parse();
    init_logging(args.verbose);

    let zenoh_session = open_session(&args.zenoh).await?;

    let publisher = zenoh_session
        .declare_publisher(IMAGE_TOPIC)
        .congestion_control(CongestionControl::Drop)
        .priority(Priority::InteractiveHigh)
        .res()
        .await
        .map_err(DetectorError::ZenohError)?;

    let mut camera_source = CameraSource::new(args.camera).inspect_err(|err| error!("{err}"))?;
    info!(topic = IMAGE_TOPIC, "Publishing frames");

    loop {
        let frame = match camera_source.next_frame() {
            Ok(frame) => frame,
            Err(err) => {
                error!("{err}");
                break;
            }
        };

        let data = mat_to_jpeg(&frame)?;

        publisher
            .put(data)
            .res()
            .await
            .map_err(DetectorError::ZenohError)?;
    }

    Ok(())
}
