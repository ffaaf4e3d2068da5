//! Grouping of skin dense grid cells into connected regions.
//!
//! Each region is expected to be one face (or one person), so the number of
//! regions doubles as a people count.

use std::collections::VecDeque;

use opencv::core::Rect;

use crate::error::DetectorError;
use crate::scan::WindowCount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkinRegion {
    /// Pixel bounding box of all cells in the region.
    pub bounds: Rect,
    pub cells: usize,
    pub skin_pixels: usize,
}

fn is_dense(window: &WindowCount, min_fill: f32) -> bool {
    window.area() > 0 && window.count as f32 >= min_fill * window.area() as f32
}

/// Flood fill 4-connected cells whose skin fill is at least `min_fill`.
///
/// Regions are returned in row major order of their first cell.
pub fn find_regions(
    grid: &[Vec<WindowCount>],
    min_fill: f32,
) -> Result<Vec<SkinRegion>, DetectorError> {
    if !(0.0..=1.0).contains(&min_fill) {
        return Err(DetectorError::InvalidFill(min_fill));
    }

    let mut visited: Vec<Vec<bool>> = grid.iter().map(|row| vec![false; row.len()]).collect();
    let mut regions = Vec::new();

    for (row, cells) in grid.iter().enumerate() {
        for (column, cell) in cells.iter().enumerate() {
            if visited[row][column] || !is_dense(cell, min_fill) {
                continue;
            }

            visited[row][column] = true;
            let mut queue = VecDeque::from([(row, column)]);
            let (mut x1, mut y1, mut x2, mut y2) = (usize::MAX, usize::MAX, 0, 0);
            let mut region_cells = 0;
            let mut skin_pixels = 0;

            while let Some((r, c)) = queue.pop_front() {
                let window = &grid[r][c];
                x1 = x1.min(window.x);
                y1 = y1.min(window.y);
                x2 = x2.max(window.x + window.width);
                y2 = y2.max(window.y + window.height);
                region_cells += 1;
                skin_pixels += window.count;

                let mut neighbours = Vec::with_capacity(4);
                if r > 0 {
                    neighbours.push((r - 1, c));
                }
                if r + 1 < grid.len() {
                    neighbours.push((r + 1, c));
                }
                if c > 0 {
                    neighbours.push((r, c - 1));
                }
                neighbours.push((r, c + 1));

                for (nr, nc) in neighbours {
                    let Some(neighbour) = grid[nr].get(nc) else {
                        continue;
                    };
                    if !visited[nr][nc] && is_dense(neighbour, min_fill) {
                        visited[nr][nc] = true;
                        queue.push_back((nr, nc));
                    }
                }
            }

            regions.push(SkinRegion {
                bounds: Rect::new(x1 as i32, y1 as i32, (x2 - x1) as i32, (y2 - y1) as i32),
                cells: region_cells,
                skin_pixels,
            });
        }
    }

    Ok(regions)
}
