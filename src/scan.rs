//! Sliding window scan over a skin mask.

use opencv::core::Rect;

use crate::error::DetectorError;
use crate::skin::SkinMask;

/// What to do with windows that would cross the image edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum EdgePolicy {
    /// Keep the window that reaches the edge, clipped to the image.
    #[default]
    Clip,
    /// Only keep windows that fit entirely.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    pub window_width: usize,
    pub window_height: usize,
    pub stride_x: usize,
    pub stride_y: usize,
    pub edge: EdgePolicy,
}

impl ScanConfig {
    pub fn new(
        window_width: usize,
        window_height: usize,
        stride_x: usize,
        stride_y: usize,
        edge: EdgePolicy,
    ) -> Result<Self, DetectorError> {
        if window_width == 0 || window_height == 0 {
            return Err(DetectorError::InvalidWindow {
                width: window_width,
                height: window_height,
            });
        }
        if stride_x == 0 || stride_y == 0 {
            return Err(DetectorError::InvalidStride {
                x: stride_x,
                y: stride_y,
            });
        }
        Ok(Self {
            window_width,
            window_height,
            stride_x,
            stride_y,
            edge,
        })
    }

    /// Windows laid side by side without overlap.
    pub fn non_overlapping(
        window_width: usize,
        window_height: usize,
    ) -> Result<Self, DetectorError> {
        Self::new(
            window_width,
            window_height,
            window_width,
            window_height,
            EdgePolicy::Clip,
        )
    }
}

/// One window position and the number of skin pixels inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub count: usize,
}

impl WindowCount {
    pub fn area(&self) -> usize {
        self.width * self.height
    }

    pub fn rect(&self) -> Rect {
        Rect::new(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

/// Start and extent of each window along one axis.
fn axis_spans(
    length: usize,
    window: usize,
    stride: usize,
    edge: EdgePolicy,
) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    while start < length {
        let end = start + window;
        match edge {
            EdgePolicy::Skip if end > length => break,
            EdgePolicy::Skip => spans.push((start, window)),
            EdgePolicy::Clip => spans.push((start, end.min(length) - start)),
        }
        if end >= length {
            break;
        }
        start += stride;
    }
    spans
}

/// Every window position in row major order with its skin pixel count.
pub fn scan_windows(mask: &SkinMask, config: &ScanConfig) -> Vec<WindowCount> {
    let columns = axis_spans(mask.width(), config.window_width, config.stride_x, config.edge);
    let rows = axis_spans(mask.height(), config.window_height, config.stride_y, config.edge);

    let mut windows = Vec::with_capacity(columns.len() * rows.len());
    for &(y, height) in &rows {
        for &(x, width) in &columns {
            windows.push(WindowCount {
                x,
                y,
                width,
                height,
                count: mask.count(x, y, width, height),
            });
        }
    }
    windows
}

/// Counts of non overlapping windows, one inner vector per row of windows.
pub fn count_grid(
    mask: &SkinMask,
    window_width: usize,
    window_height: usize,
) -> Result<Vec<Vec<WindowCount>>, DetectorError> {
    let config = ScanConfig::non_overlapping(window_width, window_height)?;
    let columns = axis_spans(mask.width(), window_width, window_width, config.edge).len();
    if columns == 0 {
        return Ok(Vec::new());
    }
    Ok(scan_windows(mask, &config)
        .chunks(columns)
        .map(|row| row.to_vec())
        .collect())
}

/// Highest count window, the first one in scan order on ties.
pub fn best_window(windows: &[WindowCount]) -> Option<WindowCount> {
    windows
        .iter()
        .copied()
        .reduce(|best, window| if window.count > best.count { window } else { best })
}
