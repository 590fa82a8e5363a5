//! Tile store abstraction and in-memory reference implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;

use super::types::{Tile, TileCoord, TileState, TextureId};

/// Source of tiles and their load state.
///
/// The store owns tile loading (fetch, decode, eviction) entirely; the
/// compositor only polls it, once per visible cell per frame, and never
/// blocks on it. A tile that does not exist yet is reported as
/// [`TileState::Idle`], which the fallback resolver treats the same as
/// `Loading`.
///
/// # Implementors
///
/// - [`MemoryTileStore`] - in-memory store for tests and embedding hosts
///   that manage loading themselves
pub trait TileStore: Send + Sync {
    /// Current tile (and state) for the given coordinate.
    ///
    /// Never blocks; returns an `Idle` tile for unknown coordinates.
    fn get_tile(&self, coord: TileCoord) -> Tile;

    /// Monotonically increasing counter, bumped whenever the underlying
    /// tile content set changes.
    ///
    /// Tile *load-state* transitions do not bump the revision; only
    /// content changes (source switch, refresh, invalidation) do. Cached
    /// composites are valid only while the revision is unchanged.
    fn current_revision(&self) -> u64;

    /// Gutter (border) pixels baked around each tile's payload.
    fn gutter_pixels(&self) -> u32;
}

/// In-memory [`TileStore`] driven by explicit state updates.
///
/// Hosts (and the integration tests) push tile state transitions in as
/// loading progresses; the compositor polls them back out. All methods
/// take `&self` so one store can be shared behind an `Arc` between the
/// loading side and the render loop.
#[derive(Debug, Default)]
pub struct MemoryTileStore {
    tiles: RwLock<HashMap<TileCoord, Tile>>,
    revision: AtomicU64,
    gutter: u32,
}

impl MemoryTileStore {
    /// Create an empty store with no gutter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store whose tiles carry the given gutter.
    pub fn with_gutter(gutter: u32) -> Self {
        Self {
            gutter,
            ..Self::default()
        }
    }

    /// Set the load state of a tile, creating it if unknown.
    ///
    /// Clears the texture handle unless the new state is `Loaded`.
    pub fn set_state(&self, coord: TileCoord, state: TileState) {
        if let Ok(mut tiles) = self.tiles.write() {
            let tile = tiles.entry(coord).or_insert_with(|| Tile::idle(coord));
            tile.state = state;
            if state != TileState::Loaded {
                tile.texture = None;
            }
        }
    }

    /// Mark a tile loaded with its texture handle.
    ///
    /// This is a load-state transition, not a content change, so the
    /// revision is left alone.
    pub fn set_loaded(&self, coord: TileCoord, texture: TextureId) {
        if let Ok(mut tiles) = self.tiles.write() {
            tiles.insert(coord, Tile::loaded(coord, texture));
        }
    }

    /// Signal that the underlying tile content changed.
    ///
    /// Invalidates any composite cached against the previous revision.
    pub fn bump_revision(&self) {
        self.revision.fetch_add(1, Ordering::SeqCst);
    }

    /// Drop all tiles and bump the revision.
    pub fn clear(&self) {
        if let Ok(mut tiles) = self.tiles.write() {
            tiles.clear();
        }
        self.bump_revision();
    }
}

impl TileStore for MemoryTileStore {
    fn get_tile(&self, coord: TileCoord) -> Tile {
        self.tiles
            .read()
            .ok()
            .and_then(|tiles| tiles.get(&coord).copied())
            .unwrap_or_else(|| Tile::idle(coord))
    }

    fn current_revision(&self) -> u64 {
        self.revision.load(Ordering::SeqCst)
    }

    fn gutter_pixels(&self) -> u32 {
        self.gutter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_tile_is_idle() {
        let store = MemoryTileStore::new();
        let tile = store.get_tile(TileCoord::new(3, 1, 2));
        assert_eq!(tile.state, TileState::Idle);
        assert_eq!(tile.texture, None);
    }

    #[test]
    fn test_set_loaded_keeps_revision() {
        let store = MemoryTileStore::new();
        let before = store.current_revision();
        store.set_loaded(TileCoord::new(2, 0, 0), TextureId(1));
        assert_eq!(
            store.current_revision(),
            before,
            "load-state transitions must not bump the revision"
        );
    }

    #[test]
    fn test_bump_revision_is_monotonic() {
        let store = MemoryTileStore::new();
        let before = store.current_revision();
        store.bump_revision();
        store.bump_revision();
        assert_eq!(store.current_revision(), before + 2);
    }

    #[test]
    fn test_set_state_clears_texture_when_not_loaded() {
        let store = MemoryTileStore::new();
        let coord = TileCoord::new(1, 0, 0);
        store.set_loaded(coord, TextureId(5));
        store.set_state(coord, TileState::Error);

        let tile = store.get_tile(coord);
        assert_eq!(tile.state, TileState::Error);
        assert_eq!(tile.texture, None);
    }

    #[test]
    fn test_clear_bumps_revision() {
        let store = MemoryTileStore::new();
        store.set_loaded(TileCoord::new(0, 0, 0), TextureId(1));
        let before = store.current_revision();
        store.clear();
        assert_eq!(store.current_revision(), before + 1);
        assert_eq!(
            store.get_tile(TileCoord::new(0, 0, 0)).state,
            TileState::Idle
        );
    }

    #[test]
    fn test_store_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MemoryTileStore>();
    }

    #[test]
    fn test_gutter_pixels() {
        assert_eq!(MemoryTileStore::new().gutter_pixels(), 0);
        assert_eq!(MemoryTileStore::with_gutter(1).gutter_pixels(), 1);
    }
}
