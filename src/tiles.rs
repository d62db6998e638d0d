// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Splitting the image into tiles of work.
//!
//! The image is cut into a `d` × `d` grid of equal tiles, where `d`
//! divides both the width and the height.  `d` is picked from the
//! middle of the list of candidates, which balances the number of
//! tiles against the work in each; it is a heuristic, not an optimum.

use itertools::iproduct;
use log::{debug, warn};

/// Smallest divisor considered when looking for a tile grid.
pub const MIN_DIVISOR: usize = 3;

/// A rectangle of pixels, half-open on the `to` ends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Tile {
    /// First column.
    pub from_x: usize,
    /// One past the last column.
    pub to_x: usize,
    /// First row.
    pub from_y: usize,
    /// One past the last row.
    pub to_y: usize,
}

impl Tile {
    /// Number of pixels in the tile.
    pub fn len(&self) -> usize {
        (self.to_x - self.from_x) * (self.to_y - self.from_y)
    }

    /// True for a tile with no pixels.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every (x, y) in the tile, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize)> {
        iproduct!(self.from_y..self.to_y, self.from_x..self.to_x).map(|(y, x)| (x, y))
    }
}

/// The shape of the tiles chosen for an image.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TileGrid {
    /// Width of every tile.
    pub tile_width: usize,
    /// Height of every tile.
    pub tile_height: usize,
    /// How many tiles fit along each axis.
    pub divisor: usize,
}

impl TileGrid {
    /// The tile grid for a given divisor.  The divisor must be
    /// positive; it need not divide the image, in which case the last
    /// row and column of tiles are clipped.
    pub fn with_divisor(width: usize, height: usize, divisor: usize) -> TileGrid {
        let divisor = divisor.max(1);
        TileGrid {
            tile_width: (width / divisor).max(1),
            tile_height: (height / divisor).max(1),
            divisor,
        }
    }

    /// Walks the image in steps of one tile, clipping tiles at the
    /// right and bottom edges.
    pub fn tiles(&self, width: usize, height: usize) -> impl Iterator<Item = Tile> {
        let (tw, th) = (self.tile_width, self.tile_height);
        iproduct!((0..width).step_by(tw), (0..height).step_by(th)).map(move |(x, y)| Tile {
            from_x: x,
            to_x: (x + tw).min(width),
            from_y: y,
            to_y: (y + th).min(height),
        })
    }
}

/// Every d in [3, width / 2] that divides both dimensions, ascending.
pub fn divisors(width: usize, height: usize) -> Vec<usize> {
    (MIN_DIVISOR..=width / 2)
        .filter(|d| width % d == 0 && height % d == 0)
        .collect()
}

/// Picks the tile grid for an image: the middle entry of `divisors`
/// (index len / 2).  When no divisor qualifies, for example when the
/// dimensions are coprime, the whole image becomes a single tile.
pub fn compute_tile_grid(width: usize, height: usize) -> TileGrid {
    let candidates = divisors(width, height);
    match candidates.get(candidates.len() / 2) {
        Some(&divisor) => {
            debug!(
                "{}x{}: divisor {} chosen from {:?}",
                width, height, divisor, candidates
            );
            TileGrid::with_divisor(width, height, divisor)
        }
        None => {
            warn!(
                "{}x{}: no common divisor in [{}, {}], rendering as a single tile",
                width,
                height,
                MIN_DIVISOR,
                width / 2
            );
            TileGrid::with_divisor(width, height, 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_exact_cover(width: usize, height: usize, grid: &TileGrid) {
        let mut seen = vec![0u8; width * height];
        for tile in grid.tiles(width, height) {
            assert!(!tile.is_empty(), "empty tile {:?}", tile);
            for (x, y) in tile.pixels() {
                assert!(x < width && y < height);
                seen[y * width + x] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1));
    }

    #[test]
    fn divisors_of_the_scenario_image() {
        let d = divisors(600, 400);
        assert_eq!(d, vec![4, 5, 8, 10, 20, 25, 40, 50, 100, 200]);
        assert!(d.iter().all(|&d| d >= 3 && d <= 300));
    }

    #[test]
    fn middle_divisor_is_chosen() {
        let grid = compute_tile_grid(600, 400);
        assert_eq!(grid.divisor, 25);
        assert_eq!(grid.tile_width, 24);
        assert_eq!(grid.tile_height, 16);

        // Odd number of candidates: [3, 5, 15] -> 5.
        assert_eq!(compute_tile_grid(30, 15).divisor, 5);
    }

    #[test]
    fn tiles_cover_the_image_once() {
        for &(w, h) in &[(600, 400), (30, 15), (64, 64), (12, 18), (7, 5), (1, 1)] {
            let grid = compute_tile_grid(w, h);
            assert_exact_cover(w, h, &grid);
            assert_eq!(grid.tiles(w, h).count(), grid.divisor * grid.divisor);
        }
    }

    #[test]
    fn coprime_dimensions_fall_back_to_one_tile() {
        let grid = compute_tile_grid(7, 5);
        assert_eq!(grid.divisor, 1);
        let tiles: Vec<Tile> = grid.tiles(7, 5).collect();
        assert_eq!(
            tiles,
            vec![Tile {
                from_x: 0,
                to_x: 7,
                from_y: 0,
                to_y: 5
            }]
        );
    }

    #[test]
    fn uneven_divisor_clips_the_last_tiles() {
        let grid = TileGrid::with_divisor(10, 7, 3);
        assert_exact_cover(10, 7, &grid);
        let tiles: HashSet<Tile> = grid.tiles(10, 7).collect();
        assert!(tiles.contains(&Tile {
            from_x: 9,
            to_x: 10,
            from_y: 6,
            to_y: 7
        }));
    }

    #[test]
    fn tiny_images_never_get_zero_sized_tiles() {
        let grid = TileGrid::with_divisor(2, 2, 5);
        assert_eq!((grid.tile_width, grid.tile_height), (1, 1));
        assert_exact_cover(2, 2, &grid);
    }
}
