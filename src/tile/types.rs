//! Tile coordinate and range types.

/// Opaque handle to a GPU texture owned by the context layer.
///
/// This crate never owns tile pixel data; tiles carry a handle that the
/// [`RenderContext`](crate::render::RenderContext) knows how to bind and
/// query for residency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(pub u64);

/// Tile coordinates within a tile pyramid.
///
/// `x` grows eastward and `y` grows northward from the grid origin
/// (bottom-left of the grid's world extent). Coordinates may be negative
/// for extents that reach past the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    /// Zoom level (0 = coarsest).
    pub z: u8,
    /// Column, 0 at the grid origin.
    pub x: i32,
    /// Row, 0 at the grid origin.
    pub y: i32,
}

impl TileCoord {
    /// Create a tile coordinate.
    #[inline]
    pub fn new(z: u8, x: i32, y: i32) -> Self {
        Self { z, x, y }
    }
}

/// Load state of a tile, as reported by the external [`TileStore`](super::TileStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileState {
    /// Not yet requested.
    Idle,
    /// Fetch/decode in flight.
    Loading,
    /// Pixel data available; the texture may still be pending GPU upload.
    Loaded,
    /// Fetch or decode failed. Rendered transparent, never retried here.
    Error,
    /// The source has no content for this coordinate. Rendered transparent.
    Empty,
}

/// One tile of the pyramid: its coordinate, load state, and (once loaded)
/// the texture handle owned by the external store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub coord: TileCoord,
    pub state: TileState,
    pub texture: Option<TextureId>,
}

impl Tile {
    /// A tile that has not been requested yet.
    pub fn idle(coord: TileCoord) -> Self {
        Self {
            coord,
            state: TileState::Idle,
            texture: None,
        }
    }

    /// A loaded tile with its texture handle.
    pub fn loaded(coord: TileCoord, texture: TextureId) -> Self {
        Self {
            coord,
            state: TileState::Loaded,
            texture: Some(texture),
        }
    }
}

/// Inclusive rectangle of tile coordinates at one zoom level.
///
/// Equality is value equality; this is what the composite cache compares
/// between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileRange {
    /// Create a range. `min` components must not exceed `max` components.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Width and height in tiles.
    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (
            (self.max_x - self.min_x + 1) as u32,
            (self.max_y - self.min_y + 1) as u32,
        )
    }

    /// Number of cells in the range.
    #[inline]
    pub fn len(&self) -> usize {
        let (w, h) = self.size();
        w as usize * h as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false // min <= max always holds
    }

    /// Whether the range contains the given column/row.
    #[inline]
    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.min_x <= x && x <= self.max_x && self.min_y <= y && y <= self.max_y
    }

    /// Iterate over all cells in row-major order (row by row, columns
    /// within each row), tagging each with the given zoom level.
    pub fn cells(&self, z: u8) -> TileRangeCells {
        TileRangeCells {
            range: *self,
            z,
            x: self.min_x,
            y: self.min_y,
            done: false,
        }
    }
}

/// Row-major iterator over the cells of a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileRangeCells {
    range: TileRange,
    z: u8,
    x: i32,
    y: i32,
    done: bool,
}

impl Iterator for TileRangeCells {
    type Item = TileCoord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let coord = TileCoord::new(self.z, self.x, self.y);
        if self.x < self.range.max_x {
            self.x += 1;
        } else if self.y < self.range.max_y {
            self.x = self.range.min_x;
            self.y += 1;
        } else {
            self.done = true;
        }
        Some(coord)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        let per_row = (self.range.max_x - self.range.min_x + 1) as usize;
        let full_rows = (self.range.max_y - self.y) as usize;
        let remaining = full_rows * per_row + (self.range.max_x - self.x + 1) as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for TileRangeCells {}
