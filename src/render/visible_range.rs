//! Visible tile range resolution.
//!
//! Pure function of the viewport state and grid geometry: picks the zoom
//! level, derives the tile pixel footprint, and produces the tile range
//! covering the viewport. No side effects.

use crate::grid::{Extent, TileGrid};
use crate::tile::TileRange;

/// Viewport state supplied by the host rendering loop each frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    /// Viewport center in world coordinates.
    pub center: (f64, f64),
    /// Requested resolution in world units per device pixel.
    pub resolution: f64,
    /// View rotation in radians.
    pub rotation: f64,
    /// Viewport size in device pixels.
    pub size: (u32, u32),
    /// Device pixel ratio.
    pub pixel_ratio: f64,
    /// World extent covered by the viewport, as computed by the camera.
    /// Used as-is when the requested resolution does not exactly match a
    /// native zoom level.
    pub extent: Extent,
}

impl ViewState {
    /// Convenience constructor deriving the extent from center, size,
    /// resolution, and rotation.
    pub fn new(
        center: (f64, f64),
        resolution: f64,
        rotation: f64,
        size: (u32, u32),
        pixel_ratio: f64,
    ) -> Self {
        Self {
            center,
            resolution,
            rotation,
            size,
            pixel_ratio,
            extent: Extent::for_center_size(center, resolution, rotation, size),
        }
    }
}

/// Tile range and pixel geometry for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    /// Selected zoom level.
    pub z: u8,
    /// Tiles covering the viewport at `z`.
    pub tile_range: TileRange,
    /// World extent the range was computed from (snapped when applicable).
    pub extent: Extent,
    /// Viewport center, snapped to a whole-pixel boundary when the native
    /// resolution matches the request exactly.
    pub center: (f64, f64),
    /// Native resolution of `z` in world units per CSS pixel.
    pub tile_resolution: f64,
    /// Tile footprint in device pixels.
    pub tile_pixel_size: u32,
    /// World units per device pixel at `z`.
    pub tile_pixel_resolution: f64,
    /// Effective device pixel ratio after rounding the tile footprint.
    pub pixel_ratio: f64,
}

/// Resolve the visible tile range for the current viewport.
///
/// When the native resolution of the selected zoom level equals the
/// requested resolution (and `snap_to_pixel` is on), the center is snapped
/// to the nearest whole-pixel boundary to avoid sub-pixel shimmer, and the
/// covered extent is recomputed from the snapped center. Otherwise the
/// caller-supplied extent is used unchanged.
pub fn resolve_visible_range(
    grid: &TileGrid,
    view: &ViewState,
    snap_to_pixel: bool,
) -> VisibleRange {
    let z = grid.zoom_for_resolution(view.resolution);
    let tile_resolution = grid.resolution(z);

    let tile_pixel_size = ((grid.tile_size() as f64 * view.pixel_ratio).round() as u32).max(1);
    let pixel_ratio = tile_pixel_size as f64 / grid.tile_size() as f64;
    let tile_pixel_resolution = tile_resolution / pixel_ratio;

    let (center, extent) = if tile_resolution == view.resolution && snap_to_pixel {
        let center = snap_center_to_pixel(view.center, tile_resolution, view.size);
        let extent = Extent::for_center_size(center, tile_resolution, view.rotation, view.size);
        (center, extent)
    } else {
        (view.center, view.extent)
    };

    VisibleRange {
        z,
        tile_range: grid.tile_range_for_extent(&extent, z),
        extent,
        center,
        tile_resolution,
        tile_pixel_size,
        tile_pixel_resolution,
        pixel_ratio,
    }
}

/// Snap a center coordinate so the viewport edges land on whole pixels.
fn snap_center_to_pixel(center: (f64, f64), resolution: f64, size: (u32, u32)) -> (f64, f64) {
    (
        resolution * ((center.0 / resolution).ceil() - (size.0 % 2) as f64 / 2.0),
        resolution * ((center.1 / resolution).ceil() - (size.1 % 2) as f64 / 2.0),
    )
}
