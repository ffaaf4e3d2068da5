pub mod config;
pub mod error;
pub mod frame;
pub mod regions;
pub mod scan;
pub mod skin;
pub mod transport;

use opencv::core::{Point, Scalar};
use opencv::imgproc;
use opencv::prelude::*;
use tracing::{debug, info};

pub use config::{init_logging, DetectorArgs, DetectorConfig};
pub use error::DetectorError;
pub use frame::{jpeg_to_mat, mat_to_jpeg, resize_frame, CameraSource};
pub use regions::{find_regions, SkinRegion};
pub use scan::{best_window, count_grid, scan_windows, EdgePolicy, ScanConfig, WindowCount};
pub use skin::{calibrate, count_skin_pixels, threshold_skin, SkinColorRange, SkinMask};
pub use transport::{open_session, ZenohArgs, IMAGE_TOPIC};

fn bgr(blue: u8, green: u8, red: u8) -> Scalar {
    Scalar::new(blue.into(), green.into(), red.into(), 0.0)
}

/// Everything found in one frame.
pub struct FrameReport {
    /// Resized frame with the calibration box, regions and best window drawn on it.
    pub debug_frame: Mat,
    /// Colour range the frame was classified with.
    pub range: SkinColorRange,
    /// Highest count window of the strided scan.
    pub best: Option<WindowCount>,
    /// Non overlapping window counts, one row per window row.
    pub grid: Vec<Vec<WindowCount>>,
    /// Connected skin regions, one per detected person.
    pub regions: Vec<SkinRegion>,
}

impl FrameReport {
    /// Best window if it holds enough skin to be worth highlighting.
    pub fn highlighted(&self, min_count: usize) -> Option<WindowCount> {
        self.best.filter(|best| best.count >= min_count && best.count > 0)
    }
}

pub struct SkinDetector {
    config: DetectorConfig,
    range: Option<SkinColorRange>,
}

impl SkinDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            range: None,
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Colour range from the first processed frame, if there was one.
    pub fn range(&self) -> Option<SkinColorRange> {
        self.range
    }

    /// Calibrate again on the next processed frame.
    pub fn recalibrate(&mut self) {
        info!("Calibration reset");
        self.range = None;
    }

    pub fn process_frame(&mut self, frame: &Mat) -> anyhow::Result<FrameReport> {
        let resized = resize_frame(frame, self.config.frame_width, self.config.frame_height)?;

        let range = match self.range {
            Some(range) => range,
            None => {
                let range = calibrate(&resized, self.config.calibration)?.widen(self.config.margin);
                self.range = Some(range);
                range
            }
        };

        let mask = SkinMask::from_frame(&resized, &range)?;
        let windows = scan_windows(&mask, &self.config.scan);
        let best = best_window(&windows);
        let grid = count_grid(
            &mask,
            self.config.scan.window_width,
            self.config.scan.window_height,
        )?;
        let regions = find_regions(&grid, self.config.min_fill)?;
        debug!(
            skin_pixels = mask.total(),
            windows = windows.len(),
            ?best,
            people = regions.len(),
            "Processed frame"
        );

        let mut report = FrameReport {
            debug_frame: resized,
            range,
            best,
            grid,
            regions,
        };
        self.annotate(&mut report)?;
        Ok(report)
    }

    fn annotate(&self, report: &mut FrameReport) -> anyhow::Result<()> {
        let highlighted = report.highlighted(self.config.min_count);
        let debug_frame = &mut report.debug_frame;

        // calibration box
        imgproc::rectangle_def(debug_frame, self.config.calibration, bgr(0, 255, 255))?;

        for region in &report.regions {
            imgproc::rectangle_def(debug_frame, region.bounds, bgr(255, 0, 0))?;
        }

        if let Some(best) = highlighted {
            imgproc::rectangle(
                debug_frame,
                best.rect(),
                bgr(0, 255, 0),
                2,
                imgproc::LINE_8,
                0,
            )?;
            let label = Point::new(best.x as i32, (best.y as i32 - 4).max(10));
            imgproc::put_text(
                debug_frame,
                &best.count.to_string(),
                label,
                imgproc::FONT_HERSHEY_SIMPLEX,
                0.4,
                bgr(0, 255, 0),
                1,
                imgproc::LINE_8,
                false,
            )?;
        }

        Ok(())
    }
}
