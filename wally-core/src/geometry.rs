//! Grid tiling and sliding-window coordinate generation.
//!
//! Both layouts are pure functions of the image size and the tile/window parameters. Tiles never
//! overlap and never leave the image; windows step by `window_size - overlap` and are allowed to
//! run past the right and bottom edges.

use serde::Serialize;

use crate::error::{Result, WallyError};

/// One cell of a non-overlapping tile grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridTile {
    /// Zero-based grid column.
    pub column: u32,
    /// Zero-based grid row.
    pub row: u32,
    /// Left edge in image pixels.
    pub x: u32,
    /// Top edge in image pixels.
    pub y: u32,
    /// Edge length of the square tile.
    pub size: u32,
}

/// Window corners `(x1, y1)` inclusive to `(x2, y2)` exclusive.
///
/// `x2`/`y2` may exceed the scanned image's width/height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct WindowRect {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl WindowRect {
    pub fn width(&self) -> u32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> u32 {
        self.y2 - self.y1
    }

    /// Portion of the window inside a `image_w` x `image_h` raster as `(x, y, w, h)`.
    pub fn clipped(&self, image_w: u32, image_h: u32) -> Option<(u32, u32, u32, u32)> {
        let x2 = self.x2.min(image_w);
        let y2 = self.y2.min(image_h);
        if self.x1 >= x2 || self.y1 >= y2 {
            return None;
        }
        Some((self.x1, self.y1, x2 - self.x1, y2 - self.y1))
    }
}

/// Cover an image with a grid of `tile_size` squares, dropping any partial row or column.
///
/// Tiles are returned row-major; there are exactly `floor(w / s) * floor(h / s)` of them.
pub fn grid_tiles(image_w: u32, image_h: u32, tile_size: u32) -> Result<Vec<GridTile>> {
    ensure_dimensions(image_w, image_h)?;
    if tile_size == 0 {
        return Err(WallyError::geometry("tile size must be greater than zero"));
    }

    let columns = image_w / tile_size;
    let rows = image_h / tile_size;
    let mut tiles = Vec::with_capacity(cell_count(columns, rows));
    for row in 0..rows {
        for column in 0..columns {
            tiles.push(GridTile {
                column,
                row,
                x: column * tile_size,
                y: row * tile_size,
                size: tile_size,
            });
        }
    }
    Ok(tiles)
}

/// Enumerate overlapping scan windows row-major.
///
/// The step between windows is `window_size - overlap`; each axis gets `floor(dim / step)`
/// windows. Windows are not clamped to the image.
pub fn sliding_windows(
    image_w: u32,
    image_h: u32,
    window_size: u32,
    overlap: u32,
) -> Result<Vec<WindowRect>> {
    ensure_dimensions(image_w, image_h)?;
    if window_size == 0 {
        return Err(WallyError::geometry("window size must be greater than zero"));
    }
    if overlap >= window_size {
        return Err(WallyError::geometry(format!(
            "overlap {overlap} must be smaller than window size {window_size}"
        )));
    }

    let step = window_size - overlap;
    let columns = image_w / step;
    let rows = image_h / step;
    let mut windows = Vec::with_capacity(cell_count(columns, rows));
    for row in 0..rows {
        for column in 0..columns {
            let x1 = column * step;
            let y1 = row * step;
            windows.push(WindowRect {
                x1,
                y1,
                x2: x1 + window_size,
                y2: y1 + window_size,
            });
        }
    }
    Ok(windows)
}

/// Number of cells in a `columns x rows` layout, counted in `usize` so large grids cannot wrap.
fn cell_count(columns: u32, rows: u32) -> usize {
    columns as usize * rows as usize
}

fn ensure_dimensions(image_w: u32, image_h: u32) -> Result<()> {
    if image_w == 0 || image_h == 0 {
        return Err(WallyError::geometry(format!(
            "image dimensions must be non-zero (got {image_w}x{image_h})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn cell_count_does_not_wrap_for_huge_layouts() {
        assert_eq!(cell_count(70_000, 70_000), 4_900_000_000);
        assert_eq!(cell_count(u32::MAX, 2), 2 * u32::MAX as usize);
        assert_eq!(cell_count(0, 9), 0);
    }

    #[test]
    fn grid_drops_partial_row_and_column() {
        let tiles = grid_tiles(250, 120, 100).expect("grid");
        assert_eq!(tiles.len(), 2);
        assert_eq!(
            tiles[1],
            GridTile {
                column: 1,
                row: 0,
                x: 100,
                y: 0,
                size: 100
            }
        );
    }

    #[test]
    fn grid_rejects_zero_sizes() {
        assert!(matches!(
            grid_tiles(100, 100, 0),
            Err(WallyError::InvalidGeometry(_))
        ));
        assert!(matches!(
            grid_tiles(0, 100, 10),
            Err(WallyError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn windows_run_past_the_edge() {
        let windows = sliding_windows(200, 200, 100, 50).expect("windows");
        assert_eq!(windows.len(), 16);
        let last = windows.last().copied().expect("last window");
        assert_eq!(
            last,
            WindowRect {
                x1: 150,
                y1: 150,
                x2: 250,
                y2: 250
            }
        );
        assert_eq!(last.clipped(200, 200), Some((150, 150, 50, 50)));
    }

    #[test]
    fn windows_are_row_major() {
        let windows = sliding_windows(120, 80, 40, 0).expect("windows");
        let origins: Vec<_> = windows.iter().map(|w| (w.x1, w.y1)).collect();
        assert_eq!(
            origins,
            vec![(0, 0), (40, 0), (80, 0), (0, 40), (40, 40), (80, 40)]
        );
    }

    #[test]
    fn overlap_at_or_above_window_size_fails() {
        assert!(matches!(
            sliding_windows(200, 200, 50, 50),
            Err(WallyError::InvalidGeometry(_))
        ));
        assert!(matches!(
            sliding_windows(200, 200, 50, 80),
            Err(WallyError::InvalidGeometry(_))
        ));
    }

    proptest! {
        #[test]
        fn grid_count_bounds_and_disjointness(w in 1u32..600, h in 1u32..600, s in 1u32..200) {
            let tiles = grid_tiles(w, h, s).unwrap();
            prop_assert_eq!(tiles.len() as u32, (w / s) * (h / s));

            let mut cells = HashSet::new();
            for tile in &tiles {
                prop_assert!(tile.x + tile.size <= w);
                prop_assert!(tile.y + tile.size <= h);
                prop_assert_eq!(tile.x % s, 0);
                prop_assert_eq!(tile.y % s, 0);
                // Aligned equal squares overlap only when they share an origin.
                prop_assert!(cells.insert((tile.x, tile.y)));
            }
        }

        #[test]
        fn window_count_matches_step(
            w in 1u32..800,
            h in 1u32..800,
            window in 1u32..150,
            overlap_frac in 0.0f64..1.0,
        ) {
            let overlap = ((window as f64) * overlap_frac) as u32;
            prop_assume!(overlap < window);
            let step = window - overlap;
            let windows = sliding_windows(w, h, window, overlap).unwrap();
            prop_assert_eq!(windows.len() as u32, (w / step) * (h / step));
            for rect in &windows {
                prop_assert_eq!(rect.width(), window);
                prop_assert_eq!(rect.height(), window);
                prop_assert!(rect.x1 < w && rect.y1 < h);
            }
        }

        #[test]
        fn overlap_not_below_window_always_fails(window in 1u32..100, extra in 0u32..100) {
            let result = sliding_windows(500, 500, window, window + extra);
            prop_assert!(matches!(result, Err(WallyError::InvalidGeometry(_))));
        }
    }
}
