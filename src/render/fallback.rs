//! Pyramid fallback resolution.
//!
//! Guarantees every visible cell shows some imagery while exact tiles are
//! still loading, by substituting already-loaded tiles from the adjacent
//! zoom levels. The substitute is never more than one level away from the
//! requested zoom: a single coarser level avoids excessive blur, a single
//! finer level avoids wasted overdraw.

use std::collections::{BTreeMap, HashMap};

use tracing::trace;

use crate::grid::TileGrid;
use crate::render::context::RenderContext;
use crate::tile::{TextureId, TileCoord, TileRange, TileState, TileStore};

/// Tiles accepted for one frame, grouped by zoom level.
///
/// Iteration ascends by zoom so coarser fallback tiles are drawn first
/// and exact tiles overpaint them.
#[derive(Debug, Default)]
pub struct DrawSet {
    by_zoom: BTreeMap<u8, HashMap<TileCoord, TextureId>>,
    fully_loaded: bool,
}

impl DrawSet {
    fn insert(&mut self, coord: TileCoord, texture: TextureId) {
        self.by_zoom.entry(coord.z).or_default().insert(coord, texture);
    }

    /// Whether every requested cell resolved at the exact requested zoom.
    ///
    /// Cells in the `Error` or `Empty` state count as resolved: they are
    /// permanently unfillable and must not hold the frame open.
    #[inline]
    pub fn fully_loaded(&self) -> bool {
        self.fully_loaded
    }

    /// Number of accepted tiles across all zoom levels.
    pub fn len(&self) -> usize {
        self.by_zoom.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_zoom.values().all(HashMap::is_empty)
    }

    /// Accepted tiles in ascending zoom order. Order within one zoom
    /// level is unspecified; tiles at the same level never overlap.
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoord, TextureId)> + '_ {
        self.by_zoom
            .values()
            .flat_map(|tiles| tiles.iter().map(|(coord, texture)| (*coord, *texture)))
    }

    /// Zoom levels contributing to this frame, ascending.
    pub fn zoom_levels(&self) -> impl Iterator<Item = u8> + '_ {
        self.by_zoom.keys().copied()
    }
}

/// Select the best available tile for every cell of the requested range.
///
/// Per cell, in row-major order:
/// 1. an exact tile that is `Loaded` with a resident texture is accepted
///    at its native zoom;
/// 2. `Error`/`Empty` cells are skipped (rendered transparent) without
///    blocking the fully-loaded determination;
/// 3. anything else (including `Loaded` tiles whose texture has not
///    finished uploading) marks the frame as not fully loaded and probes
///    the immediate parent, then the direct children, for resident
///    substitutes. A cell with no substitute stays unfilled this frame
///    and is retried once loading progresses.
pub fn resolve_draw_set(
    grid: &TileGrid,
    store: &dyn TileStore,
    ctx: &dyn RenderContext,
    z: u8,
    tile_range: &TileRange,
) -> DrawSet {
    let mut set = DrawSet {
        fully_loaded: true,
        ..DrawSet::default()
    };

    for coord in tile_range.cells(z) {
        let tile = store.get_tile(coord);
        match tile.state {
            TileState::Loaded => {
                if let Some(texture) = resident_texture(ctx, tile.texture) {
                    set.insert(coord, texture);
                    continue;
                }
                // Loaded but not yet uploaded: fall through to fallback.
            }
            TileState::Error | TileState::Empty => continue,
            TileState::Idle | TileState::Loading => {}
        }

        set.fully_loaded = false;

        if let Some(parent) = grid.parent(coord) {
            if let Some(texture) = loaded_texture(store, ctx, parent) {
                trace!(?coord, ?parent, "cell filled from parent level");
                set.insert(parent, texture);
                continue;
            }
        }

        if let Some(children) = grid.child_range(coord) {
            let mut filled = 0usize;
            for child in children.cells(coord.z + 1) {
                if let Some(texture) = loaded_texture(store, ctx, child) {
                    set.insert(child, texture);
                    filled += 1;
                }
            }
            if filled > 0 {
                trace!(?coord, filled, "cell partially filled from child level");
            }
        }
    }

    set
}

fn loaded_texture(
    store: &dyn TileStore,
    ctx: &dyn RenderContext,
    coord: TileCoord,
) -> Option<TextureId> {
    let tile = store.get_tile(coord);
    if tile.state == TileState::Loaded {
        resident_texture(ctx, tile.texture)
    } else {
        None
    }
}

fn resident_texture(ctx: &dyn RenderContext, texture: Option<TextureId>) -> Option<TextureId> {
    texture.filter(|t| ctx.is_resident(*t))
}
