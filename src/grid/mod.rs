//! Tile grid geometry.
//!
//! Pure coordinate math for a square-tile pyramid: zoom level selection,
//! tile ranges covering a world extent, world extents of individual tiles,
//! and parent/child relationships between zoom levels. No side effects and
//! no tile state; the compositor treats this as a supplied dependency.

mod extent;

pub use extent::Extent;

use thiserror::Error;

use crate::tile::{TileCoord, TileRange};

/// Web Mercator half-circumference in meters.
const WEB_MERCATOR_HALF_SIZE: f64 = 20_037_508.342_789_244;

/// Tolerance used when converting world extents to tile ranges so that
/// extents ending exactly on a tile boundary do not pull in the next tile.
const BOUNDARY_EPSILON: f64 = 1e-9;

/// Grid construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// Resolution list was empty or not strictly decreasing.
    #[error("resolutions must be non-empty and strictly decreasing: {0:?}")]
    InvalidResolutions(Vec<f64>),

    /// Tile size of zero pixels.
    #[error("tile size must be at least one pixel")]
    ZeroTileSize,
}

/// Geometry of a tile pyramid.
///
/// The origin is the bottom-left corner of the world extent; tile `x`
/// grows eastward and tile `y` northward from it. Resolutions are indexed
/// by zoom level and strictly decreasing (zoom 0 is coarsest).
#[derive(Debug, Clone)]
pub struct TileGrid {
    origin: (f64, f64),
    resolutions: Vec<f64>,
    tile_size: u32,
}

impl TileGrid {
    /// Create a grid from an origin, per-zoom resolutions, and tile size.
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if `resolutions` is empty or not strictly
    /// decreasing, or if `tile_size` is zero.
    pub fn new(
        origin: (f64, f64),
        resolutions: Vec<f64>,
        tile_size: u32,
    ) -> Result<Self, GridError> {
        if resolutions.is_empty()
            || resolutions.windows(2).any(|pair| pair[1] >= pair[0])
            || resolutions.iter().any(|r| !r.is_finite() || *r <= 0.0)
        {
            return Err(GridError::InvalidResolutions(resolutions));
        }
        if tile_size == 0 {
            return Err(GridError::ZeroTileSize);
        }
        Ok(Self {
            origin,
            resolutions,
            tile_size,
        })
    }

    /// Standard Web Mercator grid: one tile covers the world at zoom 0,
    /// each level halves the resolution of the previous one.
    pub fn web_mercator(max_zoom: u8, tile_size: u32) -> Result<Self, GridError> {
        let base = 2.0 * WEB_MERCATOR_HALF_SIZE / tile_size as f64;
        let resolutions = (0..=max_zoom as u32)
            .map(|z| base / f64::powi(2.0, z as i32))
            .collect();
        Self::new(
            (-WEB_MERCATOR_HALF_SIZE, -WEB_MERCATOR_HALF_SIZE),
            resolutions,
            tile_size,
        )
    }

    /// Bottom-left corner of the world extent.
    #[inline]
    pub fn origin(&self) -> (f64, f64) {
        self.origin
    }

    /// Tile edge length in pixels (uniform across zoom levels).
    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// Highest zoom level of the pyramid.
    #[inline]
    pub fn max_zoom(&self) -> u8 {
        (self.resolutions.len() - 1) as u8
    }

    /// Native resolution (world units per pixel) of a zoom level.
    ///
    /// `z` must be at most [`max_zoom`](Self::max_zoom).
    #[inline]
    pub fn resolution(&self, z: u8) -> f64 {
        self.resolutions[z as usize]
    }

    /// World-space edge length of one tile at a zoom level.
    #[inline]
    pub fn tile_world_size(&self, z: u8) -> f64 {
        self.tile_size as f64 * self.resolution(z)
    }

    /// Zoom level whose native resolution is closest to the requested one.
    ///
    /// Ties go to the coarser (smaller) zoom level.
    pub fn zoom_for_resolution(&self, resolution: f64) -> u8 {
        let mut best = 0usize;
        let mut best_diff = f64::INFINITY;
        for (z, r) in self.resolutions.iter().enumerate() {
            let diff = (r - resolution).abs();
            if diff < best_diff {
                best = z;
                best_diff = diff;
            }
        }
        best as u8
    }

    /// Tile range covering a world extent at a zoom level.
    ///
    /// Edges that lie exactly on a tile boundary are attributed to the
    /// tile on their interior side.
    pub fn tile_range_for_extent(&self, extent: &Extent, z: u8) -> TileRange {
        let world = self.tile_world_size(z);
        let min_x = ((extent.min_x - self.origin.0) / world + BOUNDARY_EPSILON).floor() as i32;
        let min_y = ((extent.min_y - self.origin.1) / world + BOUNDARY_EPSILON).floor() as i32;
        let max_x = (((extent.max_x - self.origin.0) / world - BOUNDARY_EPSILON).ceil() as i32 - 1)
            .max(min_x);
        let max_y = (((extent.max_y - self.origin.1) / world - BOUNDARY_EPSILON).ceil() as i32 - 1)
            .max(min_y);
        TileRange::new(min_x, min_y, max_x, max_y)
    }

    /// Tile range covering a world extent at the zoom level selected for
    /// the given resolution.
    pub fn tile_range_for_extent_and_resolution(
        &self,
        extent: &Extent,
        resolution: f64,
    ) -> (u8, TileRange) {
        let z = self.zoom_for_resolution(resolution);
        (z, self.tile_range_for_extent(extent, z))
    }

    /// World extent covered by a tile.
    pub fn tile_coord_extent(&self, coord: TileCoord) -> Extent {
        let world = self.tile_world_size(coord.z);
        let min_x = self.origin.0 + coord.x as f64 * world;
        let min_y = self.origin.1 + coord.y as f64 * world;
        Extent::new(min_x, min_y, min_x + world, min_y + world)
    }

    /// Coordinate of the tile one level coarser that covers this tile.
    ///
    /// Returns `None` at zoom 0.
    pub fn parent(&self, coord: TileCoord) -> Option<TileCoord> {
        if coord.z == 0 {
            return None;
        }
        // Arithmetic shift keeps flooring correct for negative coordinates.
        Some(TileCoord::new(coord.z - 1, coord.x >> 1, coord.y >> 1))
    }

    /// Range of the four tiles one level finer that cover this tile.
    ///
    /// Returns `None` at the pyramid's maximum zoom.
    pub fn child_range(&self, coord: TileCoord) -> Option<TileRange> {
        if coord.z >= self.max_zoom() {
            return None;
        }
        Some(TileRange::new(
            coord.x * 2,
            coord.y * 2,
            coord.x * 2 + 1,
            coord.y * 2 + 1,
        ))
    }
}
