use std::sync::Arc;

use tracing::info;
use zenoh::prelude::r#async::*;

use crate::error::DetectorError;

/// Key expression camera frames are published on, JPEG encoded.
pub const IMAGE_TOPIC: &str = "skin-detector/image";

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ZenohArgs {
    /// Endpoints to connect to.
    #[clap(short = 'e', long)]
    pub connect: Vec<zenoh_config::EndPoint>,

    /// Endpoints to listen on.
    #[clap(long)]
    pub listen: Vec<zenoh_config::EndPoint>,
}

impl ZenohArgs {
    pub fn zenoh_config(&self) -> Config {
        let mut zenoh_config = Config::default();
        if !self.listen.is_empty() {
            zenoh_config.listen.endpoints = self.listen.clone();
            info!(endpoints = ?zenoh_config.listen.endpoints, "Configured listening endpoints");
        }
        if !self.connect.is_empty() {
            zenoh_config.connect.endpoints = self.connect.clone();
            info!(endpoints = ?zenoh_config.connect.endpoints, "Configured connect endpoints");
        }
        zenoh_config
    }
}

pub async fn open_session(args: &ZenohArgs) -> anyhow::Result<Arc<zenoh::Session>> {
    let zenoh_session = zenoh::open(args.zenoh_config())
        .res()
        .await
        .map_err(DetectorError::ZenohError)?;
    Ok(zenoh_session.into_arc())
}
