//! Skin colour range calibration and skin pixel classification.

use opencv::core::{self, Rect, Scalar, Vec3b};
use opencv::imgproc;
use opencv::prelude::*;
use tracing::info;

use crate::error::DetectorError;

/// Inclusive per channel colour interval, in the channel order of the frame (BGR).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl SkinColorRange {
    pub fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    /// Bounds as scalars for `core::in_range`.
    pub fn bounds(&self) -> (Scalar, Scalar) {
        let scalar = |[b, g, r]: [u8; 3]| Scalar::new(b.into(), g.into(), r.into(), 0.0);
        (scalar(self.lower), scalar(self.upper))
    }

    /// Widen both bounds by `margin`, saturating at the channel limits.
    pub fn widen(self, margin: u8) -> Self {
        Self {
            lower: self.lower.map(|value| value.saturating_sub(margin)),
            upper: self.upper.map(|value| value.saturating_add(margin)),
        }
    }
}

pub(crate) fn ensure_bgr(frame: &Mat) -> anyhow::Result<()> {
    if frame.typ() != core::CV_8UC3 {
        return Err(DetectorError::UnsupportedFrame(frame.typ()).into());
    }
    Ok(())
}

/// Fails unless `region` is non empty and lies entirely inside a `width` x `height` frame.
pub(crate) fn check_region(region: Rect, width: i32, height: i32) -> Result<(), DetectorError> {
    let fits = region.width > 0
        && region.height > 0
        && region.x >= 0
        && region.y >= 0
        && region.x + region.width <= width
        && region.y + region.height <= height;
    if fits {
        Ok(())
    } else {
        Err(DetectorError::CalibrationOutOfBounds {
            x: region.x,
            y: region.y,
            width: region.width,
            height: region.height,
            frame_width: width,
            frame_height: height,
        })
    }
}

/// Intersect `region` with the frame bounds, `None` when nothing is left.
pub(crate) fn clip_rect(region: Rect, width: i32, height: i32) -> Option<Rect> {
    let x1 = region.x.max(0);
    let y1 = region.y.max(0);
    let x2 = (region.x + region.width).min(width);
    let y2 = (region.y + region.height).min(height);
    if x2 <= x1 || y2 <= y1 {
        return None;
    }
    Some(Rect::new(x1, y1, x2 - x1, y2 - y1))
}

/// Derive the skin colour range from the per channel minimum and maximum inside `region`.
pub fn calibrate(frame: &Mat, region: Rect) -> anyhow::Result<SkinColorRange> {
    ensure_bgr(frame)?;
    check_region(region, frame.cols(), frame.rows())?;

    let mut lower = [u8::MAX; 3];
    let mut upper = [u8::MIN; 3];
    let columns = region.x as usize..(region.x + region.width) as usize;
    for row in region.y..region.y + region.height {
        let pixels = frame.at_row::<Vec3b>(row)?;
        for pixel in &pixels[columns.clone()] {
            for channel in 0..3 {
                lower[channel] = lower[channel].min(pixel[channel]);
                upper[channel] = upper[channel].max(pixel[channel]);
            }
        }
    }

    let range = SkinColorRange::new(lower, upper);
    info!(?range, ?region, "Calibrated skin colour range");
    Ok(range)
}

/// Count pixels inside `region` whose channels all fall in `range`.
/// The region is clipped to the frame.
pub fn count_skin_pixels(
    frame: &Mat,
    region: Rect,
    range: &SkinColorRange,
) -> anyhow::Result<usize> {
    let Some(region) = clip_rect(region, frame.cols(), frame.rows()) else {
        ensure_bgr(frame)?;
        return Ok(0);
    };
    let mask = SkinMask::from_frame(frame, range)?;
    Ok(mask.count(
        region.x as usize,
        region.y as usize,
        region.width as usize,
        region.height as usize,
    ))
}

/// 255 where every channel is inside `range`, 0 elsewhere.
pub fn threshold_skin(frame: &Mat, range: &SkinColorRange) -> anyhow::Result<Mat> {
    ensure_bgr(frame)?;
    let (lower, upper) = range.bounds();
    let mut mask = Mat::default();
    core::in_range(frame, &lower, &upper, &mut mask)?;
    Ok(mask)
}

/// Skin classification of a whole frame kept as a summed area table,
/// so the count of any window is four lookups.
#[derive(Debug, Clone)]
pub struct SkinMask {
    width: usize,
    height: usize,
    // (width + 1) x (height + 1), first row and column are zero
    integral: Vec<i32>,
}

impl SkinMask {
    pub fn from_frame(frame: &Mat, range: &SkinColorRange) -> anyhow::Result<Self> {
        let mask = threshold_skin(frame, range)?;

        let mut ones = Mat::default();
        mask.convert_to(&mut ones, core::CV_8U, 1.0 / 255.0, 0.0)?;
        let mut sum = Mat::default();
        imgproc::integral(&ones, &mut sum, core::CV_32S)?;

        Ok(Self {
            width: frame.cols() as usize,
            height: frame.rows() as usize,
            integral: sum.data_typed::<i32>()?.to_vec(),
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Skin pixels in the window, clipped to the mask.
    pub fn count(&self, x: usize, y: usize, width: usize, height: usize) -> usize {
        let x1 = x.min(self.width);
        let y1 = y.min(self.height);
        let x2 = x.saturating_add(width).min(self.width);
        let y2 = y.saturating_add(height).min(self.height);
        let stride = self.width + 1;
        let at = |x: usize, y: usize| i64::from(self.integral[y * stride + x]);
        (at(x2, y2) + at(x1, y1) - at(x1, y2) - at(x2, y1)) as usize
    }

    pub fn total(&self) -> usize {
        self.count(0, 0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Scalar;
    use opencv::imgproc;

    const SKIN: [u8; 3] = [120, 150, 200];

    fn solid_frame(width: i32, height: i32, color: [u8; 3]) -> Mat {
        Mat::new_rows_cols_with_default(height, width, core::CV_8UC3, scalar(color)).unwrap()
    }

    fn scalar(color: [u8; 3]) -> Scalar {
        Scalar::new(color[0] as f64, color[1] as f64, color[2] as f64, 0.0)
    }

    fn paint(frame: &mut Mat, region: Rect, color: [u8; 3]) {
        imgproc::rectangle(
            frame,
            region,
            scalar(color),
            imgproc::FILLED,
            imgproc::LINE_8,
            0,
        )
        .unwrap();
    }

    #[test]
    fn calibrating_uniform_region_gives_single_colour() {
        let frame = solid_frame(40, 30, SKIN);
        let range = calibrate(&frame, Rect::new(5, 5, 10, 10)).unwrap();
        assert_eq!(range.lower, SKIN);
        assert_eq!(range.upper, SKIN);
    }

    #[test]
    fn calibration_takes_per_channel_extremes() {
        let mut frame = solid_frame(40, 30, [10, 200, 50]);
        paint(&mut frame, Rect::new(10, 10, 2, 2), [90, 20, 60]);
        let range = calibrate(&frame, Rect::new(8, 8, 8, 8)).unwrap();
        assert_eq!(range.lower, [10, 20, 50]);
        assert_eq!(range.upper, [90, 200, 60]);
    }

    #[test]
    fn calibration_ignores_pixels_outside_region() {
        let mut frame = solid_frame(40, 30, SKIN);
        paint(&mut frame, Rect::new(0, 0, 5, 5), [0, 0, 0]);
        let range = calibrate(&frame, Rect::new(5, 5, 10, 10)).unwrap();
        assert_eq!(range, SkinColorRange::new(SKIN, SKIN));
    }

    #[test]
    fn calibration_region_must_fit() {
        let frame = solid_frame(40, 30, SKIN);
        let error = calibrate(&frame, Rect::new(35, 5, 10, 10)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DetectorError>(),
            Some(DetectorError::CalibrationOutOfBounds { .. })
        ));
        assert!(calibrate(&frame, Rect::new(5, 5, 0, 10)).is_err());
    }

    #[test]
    fn grayscale_frames_are_rejected() {
        let frame =
            Mat::new_rows_cols_with_default(10, 10, core::CV_8UC1, Scalar::all(0.0)).unwrap();
        let error = calibrate(&frame, Rect::new(0, 0, 5, 5)).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<DetectorError>(),
            Some(DetectorError::UnsupportedFrame(_))
        ));
    }

    #[test]
    fn widen_saturates() {
        let range = SkinColorRange::new([5, 100, 250], [10, 120, 252]).widen(10);
        assert_eq!(range.lower, [0, 90, 240]);
        assert_eq!(range.upper, [20, 130, 255]);
    }

    #[test]
    fn counting_outside_range_is_zero() {
        let frame = solid_frame(20, 20, [0, 0, 255]);
        let range = SkinColorRange::new(SKIN, SKIN);
        assert_eq!(count_skin_pixels(&frame, Rect::new(0, 0, 20, 20), &range).unwrap(), 0);
    }

    #[test]
    fn counting_inside_range_is_full_area() {
        let frame = solid_frame(20, 20, SKIN);
        let range = SkinColorRange::new([100, 140, 190], [130, 160, 210]);
        assert_eq!(count_skin_pixels(&frame, Rect::new(2, 3, 7, 5), &range).unwrap(), 35);
    }

    #[test]
    fn counting_bounds_are_inclusive() {
        let mut frame = solid_frame(10, 10, [100, 100, 100]);
        paint(&mut frame, Rect::new(0, 0, 10, 5), [110, 110, 110]);
        let range = SkinColorRange::new([100, 100, 100], [110, 110, 110]);
        assert_eq!(count_skin_pixels(&frame, Rect::new(0, 0, 10, 10), &range).unwrap(), 100);
    }

    #[test]
    fn counting_clips_region_to_frame() {
        let frame = solid_frame(10, 10, SKIN);
        let range = SkinColorRange::new(SKIN, SKIN);
        assert_eq!(count_skin_pixels(&frame, Rect::new(5, 5, 10, 10), &range).unwrap(), 25);
        assert_eq!(count_skin_pixels(&frame, Rect::new(20, 20, 5, 5), &range).unwrap(), 0);
    }

    #[test]
    fn threshold_marks_skin_with_full_intensity() {
        let mut frame = solid_frame(12, 8, [255, 0, 0]);
        paint(&mut frame, Rect::new(2, 2, 4, 3), SKIN);
        let mask = threshold_skin(&frame, &SkinColorRange::new(SKIN, SKIN)).unwrap();
        assert_eq!(mask.typ(), core::CV_8UC1);
        assert_eq!(core::count_non_zero(&mask).unwrap(), 12);
        assert_eq!(*mask.at_2d::<u8>(3, 3).unwrap(), 255);
        assert_eq!(*mask.at_2d::<u8>(0, 0).unwrap(), 0);
    }

    #[test]
    fn mask_counts_windows_over_patches() {
        let mut frame = solid_frame(30, 24, [255, 0, 0]);
        paint(&mut frame, Rect::new(4, 6, 13, 9), SKIN);
        paint(&mut frame, Rect::new(20, 1, 5, 20), SKIN);
        let range = SkinColorRange::new(SKIN, SKIN);
        let mask = SkinMask::from_frame(&frame, &range).unwrap();

        assert_eq!(mask.width(), 30);
        assert_eq!(mask.height(), 24);
        assert_eq!(mask.total(), 13 * 9 + 5 * 20);
        // patches span x 4..17, y 6..15 and x 20..25, y 1..21
        assert_eq!(mask.count(0, 0, 10, 10), 6 * 4);
        assert_eq!(mask.count(5, 5, 20, 7), 12 * 6 + 5 * 7);
        assert_eq!(mask.count(18, 0, 12, 24), 5 * 20);
        assert_eq!(mask.count(25, 20, 10, 10), 0);
        assert_eq!(mask.count(40, 40, 5, 5), 0);
    }
}
