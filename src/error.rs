use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Unable to open camera {0}")]
    CameraUnavailable(i32),
    #[error("Unable to read frame from camera")]
    FrameReadFailed,
    #[error("Unsupported frame type {0}, expected 8 bit 3 channel image")]
    UnsupportedFrame(i32),
    #[error("Frame size must be non zero, got {width}x{height}")]
    EmptyFrameSize { width: i32, height: i32 },
    #[error("Scan window must be non zero, got {width}x{height}")]
    InvalidWindow { width: usize, height: usize },
    #[error("Scan stride must be non zero, got {x}x{y}")]
    InvalidStride { x: usize, y: usize },
    #[error(
        "Calibration region {x},{y} {width}x{height} does not fit in {frame_width}x{frame_height} frame"
    )]
    CalibrationOutOfBounds {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        frame_width: i32,
        frame_height: i32,
    },
    #[error("Minimum fill must be between 0 and 1, got {0}")]
    InvalidFill(f32),
    #[error("Zenoh error {0:?}")]
    ZenohError(#[from] zenoh::Error),
}
