//! Tile types and the tile store seam.
//!
//! The compositor never loads tiles itself. It addresses them by
//! [`TileCoord`], polls their [`TileState`] through the [`TileStore`]
//! trait once per visible cell per frame, and references loaded pixel
//! data only through an opaque [`TextureId`] owned by the context layer.

mod store;
mod types;

pub use store::{MemoryTileStore, TileStore};
pub use types::{TextureId, Tile, TileCoord, TileRange, TileRangeCells, TileState};
