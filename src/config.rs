use clap::Parser;
use opencv::core::Rect;
use tracing::Level;

use crate::error::DetectorError;
use crate::scan::{EdgePolicy, ScanConfig};
use crate::skin::check_region;

/// Validated detector settings.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub frame_width: i32,
    pub frame_height: i32,
    /// Calibration box in resized frame coordinates.
    pub calibration: Rect,
    pub margin: u8,
    pub scan: ScanConfig,
    pub min_fill: f32,
    pub min_count: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            frame_width: 260,
            frame_height: 300,
            calibration: Rect::new(110, 130, 40, 40),
            margin: 0,
            scan: ScanConfig {
                window_width: 20,
                window_height: 20,
                stride_x: 10,
                stride_y: 10,
                edge: EdgePolicy::Clip,
            },
            min_fill: 0.5,
            min_count: 1,
        }
    }
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct DetectorArgs {
    /// Width frames are resized to before scanning.
    #[clap(long, default_value_t = 260)]
    pub width: i32,

    /// Height frames are resized to before scanning.
    #[clap(long, default_value_t = 300)]
    pub height: i32,

    #[clap(long, default_value_t = 20)]
    pub window_width: usize,

    #[clap(long, default_value_t = 20)]
    pub window_height: usize,

    /// Horizontal step between windows.
    #[clap(long, default_value_t = 10)]
    pub stride_x: usize,

    /// Vertical step between windows.
    #[clap(long, default_value_t = 10)]
    pub stride_y: usize,

    /// Handling of windows crossing the frame edge.
    #[clap(long, value_enum, default_value_t = EdgePolicy::Clip)]
    pub edge: EdgePolicy,

    #[clap(long, default_value_t = 110)]
    pub calib_x: i32,

    #[clap(long, default_value_t = 130)]
    pub calib_y: i32,

    #[clap(long, default_value_t = 40)]
    pub calib_width: i32,

    #[clap(long, default_value_t = 40)]
    pub calib_height: i32,

    /// Widen the calibrated colour range by this much on every channel.
    #[clap(long, default_value_t = 0)]
    pub margin: u8,

    /// Fraction of skin pixels for a grid cell to join a region.
    #[clap(long, default_value_t = 0.5)]
    pub min_fill: f32,

    /// Minimum count for the best window to be highlighted.
    #[clap(long, default_value_t = 1)]
    pub min_count: usize,

    /// Log per frame results.
    #[clap(short, long)]
    pub verbose: bool,
}

impl Default for DetectorArgs {
    fn default() -> Self {
        Self::parse_from(["skin-detector"])
    }
}

impl DetectorArgs {
    pub fn to_config(&self) -> Result<DetectorConfig, DetectorError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(DetectorError::EmptyFrameSize {
                width: self.width,
                height: self.height,
            });
        }
        let calibration = Rect::new(
            self.calib_x,
            self.calib_y,
            self.calib_width,
            self.calib_height,
        );
        check_region(calibration, self.width, self.height)?;
        if !(0.0..=1.0).contains(&self.min_fill) {
            return Err(DetectorError::InvalidFill(self.min_fill));
        }
        let scan = ScanConfig::new(
            self.window_width,
            self.window_height,
            self.stride_x,
            self.stride_y,
            self.edge,
        )?;

        Ok(DetectorConfig {
            frame_width: self.width,
            frame_height: self.height,
            calibration,
            margin: self.margin,
            scan,
            min_fill: self.min_fill,
            min_count: self.min_count,
        })
    }
}

pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classroom_setup() {
        let config = DetectorArgs::default().to_config().unwrap();
        assert_eq!(config, DetectorConfig::default());
        assert_eq!((config.frame_width, config.frame_height), (260, 300));
        assert_eq!(config.calibration, Rect::new(110, 130, 40, 40));
        assert_eq!(config.scan, ScanConfig::new(20, 20, 10, 10, EdgePolicy::Clip).unwrap());
        assert_eq!(config.margin, 0);
    }

    #[test]
    fn flags_override_defaults() {
        let args = DetectorArgs::parse_from([
            "skin-detector",
            "--window-width",
            "30",
            "--stride-x",
            "30",
            "--edge",
            "skip",
            "--margin",
            "12",
        ]);
        let config = args.to_config().unwrap();
        assert_eq!(config.scan.window_width, 30);
        assert_eq!(config.scan.stride_x, 30);
        assert_eq!(config.scan.edge, EdgePolicy::Skip);
        assert_eq!(config.margin, 12);
    }

    #[test]
    fn calibration_box_must_fit_resized_frame() {
        let args = DetectorArgs {
            calib_x: 240,
            ..DetectorArgs::default()
        };
        assert!(matches!(
            args.to_config(),
            Err(DetectorError::CalibrationOutOfBounds { .. })
        ));
    }

    #[test]
    fn invalid_scan_settings_are_rejected() {
        let args = DetectorArgs {
            stride_y: 0,
            ..DetectorArgs::default()
        };
        assert!(matches!(args.to_config(), Err(DetectorError::InvalidStride { .. })));

        let args = DetectorArgs {
            min_fill: -0.1,
            ..DetectorArgs::default()
        };
        assert!(matches!(args.to_config(), Err(DetectorError::InvalidFill(_))));
    }
}
