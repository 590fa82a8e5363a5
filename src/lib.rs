//! tilefall - tile pyramid compositor for raster map layers.
//!
//! Renders a pyramid of raster image tiles into a single composited
//! offscreen surface for a higher-level view compositor that applies
//! camera rotation, pan, and zoom. The core is the tile selection,
//! fallback, and framebuffer-caching algorithm: reuse a previously
//! rendered composite when nothing changed, otherwise pick the best
//! available tile for every visible cell (substituting from the adjacent
//! zoom levels while loading is in flight), pack the selection into a
//! power-of-two offscreen surface, and derive the transform mapping that
//! surface back into viewport space.
//!
//! Tile loading, GPU plumbing, and camera state are external
//! collaborators behind the [`tile::TileStore`] and
//! [`render::RenderContext`] seams.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tilefall::grid::TileGrid;
//! use tilefall::render::{RecordingContext, TileLayerRenderer, ViewState};
//! use tilefall::tile::{MemoryTileStore, TextureId, TileCoord};
//!
//! let grid = TileGrid::web_mercator(18, 256)?;
//! let store = Arc::new(MemoryTileStore::new());
//! store.set_loaded(TileCoord::new(0, 0, 0), TextureId(1));
//!
//! let mut renderer = TileLayerRenderer::new(grid.clone(), store);
//! let mut ctx = RecordingContext::new();
//!
//! let view = ViewState::new((0.0, 0.0), grid.resolution(0), 0.0, (256, 256), 1.0);
//! let output = renderer.prepare_frame(&view, &mut ctx)?;
//! assert!(!output.needs_another_frame);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod grid;
pub mod layer;
pub mod logging;
pub mod lookup;
pub mod render;
pub mod tile;

/// Version of the tilefall library, injected from `Cargo.toml` at compile
/// time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version_is_not_empty() {
        assert!(!super::VERSION.is_empty());
    }
}
