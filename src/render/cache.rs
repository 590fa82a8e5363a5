//! Composite cache and validity gate.
//!
//! The primary performance guarantee of the compositor: panning or
//! zooming within an unchanged tile range costs zero GPU re-composition,
//! because the previously rendered surface is reused as long as the tile
//! range, source revision, and palette lookup are all unchanged.

use tracing::debug;

use crate::grid::Extent;
use crate::tile::TileRange;

/// Record of a successfully rendered composite surface.
///
/// Only fully loaded frames are committed; partial frames clear the entry
/// instead so the next frame re-renders. The record is always replaced as
/// a whole, never field by field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedComposite {
    /// Tile range the surface was rendered for.
    pub tile_range: TileRange,
    /// World extent covered by the offscreen surface.
    pub framebuffer_extent: Extent,
    /// Tile store revision at render time.
    pub revision: u64,
    /// Whether every cell resolved at the exact requested zoom.
    pub fully_loaded: bool,
}

/// Owns the single cached composite and the lookup dirty flag.
///
/// One instance per tile layer renderer, touched only from the rendering
/// loop call path.
#[derive(Debug, Default)]
pub struct CompositeCache {
    entry: Option<RenderedComposite>,
    lookup_dirty: bool,
}

impl CompositeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate for composite reuse.
    ///
    /// Returns the cached framebuffer extent iff no dirty flag is set, an
    /// entry exists, its tile range equals `tile_range` by value, and its
    /// revision matches. Otherwise clears the dirty flag (the caller is
    /// about to re-render) and returns `None`.
    pub fn validate(&mut self, tile_range: &TileRange, revision: u64) -> Option<Extent> {
        if !self.lookup_dirty {
            if let Some(entry) = &self.entry {
                if entry.tile_range == *tile_range && entry.revision == revision {
                    return Some(entry.framebuffer_extent);
                }
            }
        }
        self.lookup_dirty = false;
        None
    }

    /// Commit a fully loaded composite.
    pub fn commit(&mut self, composite: RenderedComposite) {
        debug!(
            revision = composite.revision,
            ?composite.tile_range,
            "composite committed"
        );
        self.entry = Some(composite);
    }

    /// Clear the cached composite (composition did not fully succeed, or
    /// external state changed out from under it).
    pub fn invalidate(&mut self) {
        if self.entry.take().is_some() {
            debug!("composite invalidated");
        }
    }

    /// Force the next frame to re-render regardless of range/revision
    /// match. Called when the driving layer's palette lookup changes.
    pub fn mark_lookup_dirty(&mut self) {
        self.lookup_dirty = true;
    }

    /// Currently cached composite, if any.
    pub fn entry(&self) -> Option<&RenderedComposite> {
        self.entry.as_ref()
    }
}
