use opencv::core::{self, Vector};
use opencv::prelude::*;
use opencv::{imgcodecs, imgproc, videoio};
use tracing::{info, warn};

use crate::error::DetectorError;

/// Area interpolated resize to exactly `width` x `height`.
pub fn resize_frame(frame: &Mat, width: i32, height: i32) -> anyhow::Result<Mat> {
    if width <= 0 || height <= 0 {
        return Err(DetectorError::EmptyFrameSize { width, height }.into());
    }
    let mut resized = Mat::default();
    imgproc::resize(
        frame,
        &mut resized,
        core::Size { width, height },
        0.0,
        0.0,
        imgproc::INTER_AREA,
    )?;
    Ok(resized)
}

pub fn jpeg_to_mat(data: &[u8]) -> anyhow::Result<Mat> {
    let buffer = Vector::<u8>::from_slice(data);
    let frame = imgcodecs::imdecode(&buffer, imgcodecs::IMREAD_COLOR)?;
    Ok(frame)
}

pub fn mat_to_jpeg(frame: &Mat) -> anyhow::Result<Vec<u8>> {
    let mut buffer: Vector<u8> = Default::default();
    imgcodecs::imencode_def(".jpg", frame, &mut buffer)?;
    Ok(buffer.to_vec())
}

/// Capture device, released when dropped.
pub struct CameraSource {
    camera: videoio::VideoCapture,
}

impl CameraSource {
    pub fn new(index: i32) -> anyhow::Result<Self> {
        let camera = videoio::VideoCapture::new(index, videoio::CAP_ANY).map_err(|error| {
            warn!(?error, index, "Failed to create capture");
            DetectorError::CameraUnavailable(index)
        })?;
        if !camera.is_opened()? {
            return Err(DetectorError::CameraUnavailable(index).into());
        }
        info!(index, "Opened camera");
        Ok(Self { camera })
    }

    pub fn next_frame(&mut self) -> anyhow::Result<Mat> {
        let mut frame = Mat::default();
        let read = self.camera.read(&mut frame)?;
        if !read || frame.size()?.width == 0 {
            warn!("Camera returned no frame");
            return Err(DetectorError::FrameReadFailed.into());
        }
        Ok(frame)
    }
}

impl Drop for CameraSource {
    fn drop(&mut self) {
        if let Err(error) = self.camera.release() {
            warn!(?error, "Failed to release camera");
        }
    }
}
