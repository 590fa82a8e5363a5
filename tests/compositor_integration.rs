//! Frame-loop integration tests for the tile layer compositor.
//!
//! Drives `TileLayerRenderer` through multi-frame scenarios over an
//! in-memory tile store and a recording context, the way a host
//! rendering loop would, and asserts on the exact command streams.

use std::sync::Arc;

use tilefall::grid::TileGrid;
use tilefall::layer::{LayerKind, LayerRendererRegistry};
use tilefall::lookup::ColorLookup;
use tilefall::render::{Command, RecordingContext, TileLayerRenderer, ViewState};
use tilefall::tile::{MemoryTileStore, TextureId, TileCoord, TileState};

/// 256 px tiles; zoom 2 has resolution 1.0, so one tile spans 256 world
/// units there.
fn grid() -> TileGrid {
    TileGrid::new((0.0, 0.0), vec![4.0, 2.0, 1.0, 0.5], 256).expect("valid grid")
}

/// Viewport covering tiles (2, 0..1, 0..1): a 2x2 range at zoom 2.
fn view() -> ViewState {
    ViewState::new((256.0, 256.0), 1.0, 0.0, (512, 512), 1.0)
}

/// Texture id scheme: zoom level encoded in the hundreds digit.
fn texture(z: u8, x: i32, y: i32) -> TextureId {
    TextureId(z as u64 * 100 + (x as u64) * 10 + y as u64 + 1)
}

fn zoom_of(texture: TextureId) -> u8 {
    (texture.0 / 100) as u8
}

fn load_exact_range(store: &MemoryTileStore) {
    for y in 0..2 {
        for x in 0..2 {
            store.set_loaded(TileCoord::new(2, x, y), texture(2, x, y));
        }
    }
}

#[test]
fn test_unchanged_frame_reuses_composite() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    let first = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    let draws_after_first = ctx.draw_count();
    assert_eq!(draws_after_first, 4);

    let second = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(
        ctx.draw_count(),
        draws_after_first,
        "a valid cached composite must not be re-rendered"
    );
    assert_eq!(second.composite_extent, first.composite_extent);
    assert_eq!(second.view_transform, first.view_transform);
    assert!(!second.needs_another_frame);
}

#[test]
fn test_revision_bump_forces_rerender() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut renderer = TileLayerRenderer::new(grid(), store.clone());
    let mut ctx = RecordingContext::new();

    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    let draws_after_first = ctx.draw_count();

    store.bump_revision();
    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), draws_after_first * 2);
}

#[test]
fn test_range_change_forces_rerender() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    store.set_loaded(TileCoord::new(2, 2, 0), texture(2, 2, 0));
    store.set_loaded(TileCoord::new(2, 2, 1), texture(2, 2, 1));
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    let draws_after_first = ctx.draw_count();

    // Pan east by one tile: different range, re-render.
    let panned = ViewState::new((512.0, 256.0), 1.0, 0.0, (512, 512), 1.0);
    renderer.prepare_frame(&panned, &mut ctx).unwrap();
    assert!(ctx.draw_count() > draws_after_first);
}

#[test]
fn test_loading_cell_draws_parent_then_retries() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    store.set_state(TileCoord::new(2, 0, 0), TileState::Loading);
    store.set_loaded(TileCoord::new(1, 0, 0), texture(1, 0, 0));
    let mut renderer = TileLayerRenderer::new(grid(), store.clone());
    let mut ctx = RecordingContext::new();

    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert!(
        output.needs_another_frame,
        "fallback-filled frames must request a retry"
    );

    // Parent substitute plus the three exact tiles.
    let drawn = ctx.drawn_textures();
    assert_eq!(drawn.len(), 4);
    assert!(drawn.contains(&texture(1, 0, 0)));

    // The load completes; the next frame is exact and cacheable.
    store.set_loaded(TileCoord::new(2, 0, 0), texture(2, 0, 0));
    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert!(!output.needs_another_frame);

    let settled = ctx.draw_count();
    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), settled, "settled frame is cached again");
}

#[test]
fn test_coarse_tiles_drawn_before_exact() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    store.set_state(TileCoord::new(2, 0, 0), TileState::Loading);
    store.set_loaded(TileCoord::new(1, 0, 0), texture(1, 0, 0));
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    renderer.prepare_frame(&view(), &mut ctx).unwrap();

    let zooms: Vec<u8> = ctx.drawn_textures().iter().map(|t| zoom_of(*t)).collect();
    let parent_position = zooms.iter().position(|z| *z == 1).expect("parent drawn");
    let first_exact = zooms.iter().position(|z| *z == 2).expect("exact drawn");
    assert!(
        parent_position < first_exact,
        "coarser fallback must be overpainted by exact tiles, got {zooms:?}"
    );
    assert!(zooms.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_fallback_skips_distant_ancestors() {
    let store = Arc::new(MemoryTileStore::new());
    // Everything loading at zoom 2; only the zoom 0 root is loaded.
    for y in 0..2 {
        for x in 0..2 {
            store.set_state(TileCoord::new(2, x, y), TileState::Loading);
        }
    }
    store.set_loaded(TileCoord::new(0, 0, 0), texture(0, 0, 0));
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert!(output.needs_another_frame);
    assert_eq!(
        ctx.draw_count(),
        0,
        "a two-level-distant ancestor is never accepted"
    );
}

#[test]
fn test_error_cell_stays_transparent_without_blocking() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    store.set_state(TileCoord::new(2, 1, 1), TileState::Error);
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), 3, "error cell draws nothing");
    assert!(
        !output.needs_another_frame,
        "an unfillable cell must not hold the frame open"
    );

    // And the composite is cached like any fully loaded frame.
    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), 3);
}

#[test]
fn test_nonresident_texture_defers_tile() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();
    ctx.set_nonresident(texture(2, 0, 0));

    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert!(output.needs_another_frame);
    assert!(!ctx.drawn_textures().contains(&texture(2, 0, 0)));

    // Upload finishes; the tile is picked up on the next frame.
    ctx.set_resident(texture(2, 0, 0));
    let output = renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert!(!output.needs_another_frame);
    assert!(ctx.drawn_textures().contains(&texture(2, 0, 0)));
}

#[test]
fn test_lookup_dirty_forces_rerender_once() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut renderer = TileLayerRenderer::new(grid(), store);
    renderer.set_lookup(Some(
        ColorLookup::from_hex(&["ff0000"], &["112233"]).expect("valid lookup"),
    ));
    let mut ctx = RecordingContext::new();

    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    let draws_after_first = ctx.draw_count();

    renderer.mark_lookup_dirty();
    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), draws_after_first * 2);

    // The flag is consumed: the frame after that is cached again.
    renderer.prepare_frame(&view(), &mut ctx).unwrap();
    assert_eq!(ctx.draw_count(), draws_after_first * 2);
}

#[test]
fn test_registry_drives_tile_renderer() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut registry = LayerRendererRegistry::new();
    registry.register(Box::new(TileLayerRenderer::new(grid(), store)));
    let mut ctx = RecordingContext::new();

    let output = registry
        .prepare_frame(LayerKind::Tile, &view(), &mut ctx)
        .expect("tile renderer registered")
        .unwrap();
    assert!(!output.needs_another_frame);
    assert!(registry
        .prepare_frame(LayerKind::Vector, &view(), &mut ctx)
        .is_none());

    // Context loss through the registry invalidates the composite.
    registry.handle_context_lost();
    let draws_before = ctx.draw_count();
    registry
        .prepare_frame(LayerKind::Tile, &view(), &mut ctx)
        .unwrap()
        .unwrap();
    assert_eq!(ctx.draw_count(), draws_before * 2);
}

#[test]
fn test_frame_commands_lead_with_surface_setup() {
    let store = Arc::new(MemoryTileStore::new());
    load_exact_range(&store);
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();
    renderer.prepare_frame(&view(), &mut ctx).unwrap();

    assert_eq!(
        &ctx.commands()[..4],
        &[
            Command::BindFramebuffer { dimension: 512 },
            Command::SetViewport {
                width: 512,
                height: 512
            },
            Command::ClearToTransparent,
            Command::SetBlending { enabled: false },
        ]
    );
}

#[test]
fn test_gutter_scales_with_pixel_ratio() {
    let store = Arc::new(MemoryTileStore::with_gutter(1));
    store.set_loaded(TileCoord::new(2, 0, 0), texture(2, 0, 0));
    let mut renderer = TileLayerRenderer::new(grid(), store);
    let mut ctx = RecordingContext::new();

    let hidpi = ViewState::new((128.0, 128.0), 1.0, 0.0, (256, 256), 2.0);
    renderer.prepare_frame(&hidpi, &mut ctx).unwrap();

    let bind = ctx
        .commands()
        .iter()
        .find_map(|c| match c {
            Command::BindTileTexture {
                pixel_size, gutter, ..
            } => Some((*pixel_size, *gutter)),
            _ => None,
        })
        .expect("tile bound");
    assert_eq!(bind, (512, 2.0));
}
