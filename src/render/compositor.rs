//! Framebuffer compositor and per-frame entry point.
//!
//! Packs the tiles selected by the fallback resolver into a power-of-two
//! offscreen surface and derives the transform mapping that surface back
//! into viewport space. Composition is skipped entirely when the cached
//! surface is still valid for the requested tile range and revision.

use std::sync::Arc;

use glam::Mat4;
use tracing::{debug, warn};

use crate::config::CompositorConfig;
use crate::grid::{Extent, TileGrid};
use crate::layer::{LayerKind, LayerRenderer};
use crate::lookup::{ColorLookup, LookupTable};
use crate::render::cache::{CompositeCache, RenderedComposite};
use crate::render::context::{RenderContext, TilePlacement};
use crate::render::fallback::resolve_draw_set;
use crate::render::transform::build_view_transform;
use crate::render::visible_range::{resolve_visible_range, ViewState, VisibleRange};
use crate::render::RenderError;
use crate::tile::TileStore;

/// Result of one frame preparation, handed to the host rendering loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    /// World extent covered by the (cached or freshly rendered) surface.
    pub composite_extent: Extent,
    /// Transform from the surface's texture space into the viewport.
    pub view_transform: Mat4,
    /// Whether the host should schedule another frame because some cells
    /// have not yet resolved at the exact requested zoom.
    pub needs_another_frame: bool,
}

/// Tile layer compositor.
///
/// Owns the composite cache and the optional palette lookup. All mutable
/// state lives on this one instance and is touched only from the
/// rendering-loop call path, so no synchronization is needed.
pub struct TileLayerRenderer {
    grid: TileGrid,
    store: Arc<dyn TileStore>,
    config: CompositorConfig,
    cache: CompositeCache,
    lookup: Option<ColorLookup>,
    /// Expanded lookup tables, rebuilt lazily after a lookup change or
    /// context loss.
    lookup_tables: Option<(LookupTable, LookupTable)>,
}

impl TileLayerRenderer {
    /// Create a compositor with the default configuration.
    pub fn new(grid: TileGrid, store: Arc<dyn TileStore>) -> Self {
        Self::with_config(grid, store, CompositorConfig::default())
    }

    /// Create a compositor with an explicit configuration.
    pub fn with_config(grid: TileGrid, store: Arc<dyn TileStore>, config: CompositorConfig) -> Self {
        Self {
            grid,
            store,
            config,
            cache: CompositeCache::new(),
            lookup: None,
            lookup_tables: None,
        }
    }

    /// Replace the palette lookup and force the next frame to re-render.
    pub fn set_lookup(&mut self, lookup: Option<ColorLookup>) {
        self.lookup = lookup;
        self.lookup_tables = None;
        self.cache.mark_lookup_dirty();
    }

    /// Signal that the current lookup's colors changed in place.
    ///
    /// Checked synchronously at the start of the next frame; there is no
    /// hidden change subscription.
    pub fn mark_lookup_dirty(&mut self) {
        self.lookup_tables = None;
        self.cache.mark_lookup_dirty();
    }

    /// Currently cached composite, if any. Mainly useful for diagnostics.
    pub fn cached_composite(&self) -> Option<&RenderedComposite> {
        self.cache.entry()
    }

    /// Prepare one frame: reuse or re-render the composite surface, and
    /// derive its viewport transform.
    ///
    /// # Errors
    ///
    /// Propagates [`ContextError`](crate::render::ContextError) from the
    /// context layer; a tile that is merely not yet loaded is never an
    /// error.
    pub fn prepare_frame(
        &mut self,
        view: &ViewState,
        ctx: &mut dyn RenderContext,
    ) -> Result<FrameOutput, RenderError> {
        let visible = resolve_visible_range(&self.grid, view, self.config.snap_to_pixel);
        let revision = self.store.current_revision();

        let (composite_extent, fully_loaded) =
            match self.cache.validate(&visible.tile_range, revision) {
                Some(extent) => (extent, true),
                None => self.render_composite(&visible, revision, ctx)?,
            };

        let view_transform = build_view_transform(
            visible.center,
            view.size,
            view.resolution,
            view.rotation,
            &composite_extent,
        );

        Ok(FrameOutput {
            composite_extent,
            view_transform,
            needs_another_frame: !fully_loaded,
        })
    }

    /// Re-render the composite surface for the given visible range.
    ///
    /// Returns the surface's world extent and whether every cell resolved
    /// at the exact zoom.
    fn render_composite(
        &mut self,
        visible: &VisibleRange,
        revision: u64,
        ctx: &mut dyn RenderContext,
    ) -> Result<(Extent, bool), RenderError> {
        let (range_w, range_h) = visible.tile_range.size();
        let needed =
            u64::from(range_w.max(range_h)) * u64::from(visible.tile_pixel_size);
        let mut dimension = needed.next_power_of_two();
        let cap = u64::from(self.config.framebuffer_cap());
        if dimension > cap {
            warn!(
                needed = dimension,
                cap, "framebuffer dimension clamped; fidelity degrades beyond the cap"
            );
            dimension = cap;
        }
        let dimension = dimension as u32;

        // Square extent aligned to the tile range's minimum corner; its
        // side is a power-of-two multiple of one tile's world footprint.
        let extent_dimension = visible.tile_pixel_resolution * dimension as f64;
        let tile_world = visible.tile_pixel_size as f64 * visible.tile_pixel_resolution;
        let (origin_x, origin_y) = self.grid.origin();
        let min_x = origin_x + visible.tile_range.min_x as f64 * tile_world;
        let min_y = origin_y + visible.tile_range.min_y as f64 * tile_world;
        let framebuffer_extent = Extent::new(
            min_x,
            min_y,
            min_x + extent_dimension,
            min_y + extent_dimension,
        );

        ctx.bind_framebuffer(dimension)?;
        ctx.set_viewport(dimension, dimension);
        ctx.clear_to_transparent();
        ctx.set_blending(false);

        if let Some(lookup) = &self.lookup {
            let (source, target) = self
                .lookup_tables
                .get_or_insert_with(|| (lookup.source_table(), lookup.target_table()));
            ctx.set_lookup_enabled(true);
            ctx.bind_lookup_tables(source, target)?;
        } else {
            ctx.set_lookup_enabled(false);
        }

        let draw_set = resolve_draw_set(
            &self.grid,
            self.store.as_ref(),
            &*ctx,
            visible.z,
            &visible.tile_range,
        );
        let gutter = self.store.gutter_pixels() as f64 * visible.pixel_ratio;

        for (coord, texture) in draw_set.tiles() {
            let tile_extent = self.grid.tile_coord_extent(coord);
            let placement = TilePlacement {
                scale: (
                    (2.0 * tile_extent.width() / extent_dimension) as f32,
                    (2.0 * tile_extent.height() / extent_dimension) as f32,
                ),
                translate: (
                    (2.0 * (tile_extent.min_x - framebuffer_extent.min_x) / extent_dimension
                        - 1.0) as f32,
                    (2.0 * (tile_extent.min_y - framebuffer_extent.min_y) / extent_dimension
                        - 1.0) as f32,
                ),
            };
            ctx.bind_tile_texture(texture, visible.tile_pixel_size, gutter)?;
            ctx.draw_unit_quad(placement)?;
        }

        let fully_loaded = draw_set.fully_loaded();
        if fully_loaded {
            self.cache.commit(RenderedComposite {
                tile_range: visible.tile_range,
                framebuffer_extent,
                revision,
                fully_loaded,
            });
        } else {
            debug!(
                drawn = draw_set.len(),
                "frame not fully loaded; composite not cached"
            );
            self.cache.invalidate();
        }

        Ok((framebuffer_extent, fully_loaded))
    }
}

impl LayerRenderer for TileLayerRenderer {
    fn kind(&self) -> LayerKind {
        LayerKind::Tile
    }

    fn prepare_frame(
        &mut self,
        view: &ViewState,
        ctx: &mut dyn RenderContext,
    ) -> Result<FrameOutput, RenderError> {
        TileLayerRenderer::prepare_frame(self, view, ctx)
    }

    fn handle_context_lost(&mut self) {
        warn!("graphics context lost; dropping cached composite and lookup tables");
        self.cache.invalidate();
        self.lookup_tables = None;
    }

    fn dispose(&mut self, ctx: &mut dyn RenderContext) {
        self.cache.invalidate();
        self.lookup_tables = None;
        ctx.release_framebuffer();
    }
}
