//! Layer renderer capability seam.
//!
//! A map is composed of layers of different kinds, each with its own
//! renderer. Rather than inheriting from a common base, renderers
//! implement the [`LayerRenderer`] trait and are selected through a
//! [`LayerRendererRegistry`] keyed by [`LayerKind`].

use std::collections::HashMap;

use crate::render::{FrameOutput, RenderContext, RenderError, ViewState};

/// Kind of map layer a renderer draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Raster tile pyramid.
    Tile,
    /// Vector geometry.
    Vector,
    /// Single static image.
    Image,
}

/// Lifecycle hooks every layer renderer provides to the host loop.
///
/// # Implementors
///
/// - [`TileLayerRenderer`](crate::render::TileLayerRenderer) - the tile
///   pyramid compositor
pub trait LayerRenderer {
    /// The layer kind this renderer draws.
    fn kind(&self) -> LayerKind;

    /// Prepare one frame for this layer.
    fn prepare_frame(
        &mut self,
        view: &ViewState,
        ctx: &mut dyn RenderContext,
    ) -> Result<FrameOutput, RenderError>;

    /// The graphics context was lost: drop every cached GPU handle and
    /// rebuild lazily on the next frame.
    fn handle_context_lost(&mut self);

    /// Release GPU resources ahead of teardown.
    fn dispose(&mut self, ctx: &mut dyn RenderContext);
}

/// Dispatch table of layer renderers keyed by layer kind.
#[derive(Default)]
pub struct LayerRendererRegistry {
    renderers: HashMap<LayerKind, Box<dyn LayerRenderer>>,
}

impl LayerRendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a renderer under its own kind, replacing any previous
    /// renderer for that kind.
    pub fn register(&mut self, renderer: Box<dyn LayerRenderer>) {
        self.renderers.insert(renderer.kind(), renderer);
    }

    /// The renderer for a layer kind, if one is registered.
    pub fn get_mut(&mut self, kind: LayerKind) -> Option<&mut dyn LayerRenderer> {
        self.renderers
            .get_mut(&kind)
            .map(|r| &mut **r as &mut dyn LayerRenderer)
    }

    /// Prepare a frame for the given layer kind.
    ///
    /// Returns `None` when no renderer is registered for the kind.
    pub fn prepare_frame(
        &mut self,
        kind: LayerKind,
        view: &ViewState,
        ctx: &mut dyn RenderContext,
    ) -> Option<Result<FrameOutput, RenderError>> {
        self.get_mut(kind).map(|r| r.prepare_frame(view, ctx))
    }

    /// Notify every renderer of a context loss.
    pub fn handle_context_lost(&mut self) {
        for renderer in self.renderers.values_mut() {
            renderer.handle_context_lost();
        }
    }

    /// Dispose every renderer.
    pub fn dispose(&mut self, ctx: &mut dyn RenderContext) {
        for renderer in self.renderers.values_mut() {
            renderer.dispose(ctx);
        }
        self.renderers.clear();
    }

    pub fn len(&self) -> usize {
        self.renderers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Extent;
    use crate::render::RecordingContext;
    use glam::Mat4;

    struct StubRenderer {
        kind: LayerKind,
    }

    impl StubRenderer {
        fn new(kind: LayerKind) -> Self {
            Self { kind }
        }
    }

    impl LayerRenderer for StubRenderer {
        fn kind(&self) -> LayerKind {
            self.kind
        }

        fn prepare_frame(
            &mut self,
            _view: &ViewState,
            _ctx: &mut dyn RenderContext,
        ) -> Result<FrameOutput, RenderError> {
            Ok(FrameOutput {
                composite_extent: Extent::new(0.0, 0.0, 1.0, 1.0),
                view_transform: Mat4::IDENTITY,
                needs_another_frame: false,
            })
        }

        fn handle_context_lost(&mut self) {}

        fn dispose(&mut self, _ctx: &mut dyn RenderContext) {}
    }

    fn view() -> ViewState {
        ViewState::new((0.0, 0.0), 1.0, 0.0, (10, 10), 1.0)
    }

    #[test]
    fn test_register_and_dispatch_by_kind() {
        let mut registry = LayerRendererRegistry::new();
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));
        registry.register(Box::new(StubRenderer::new(LayerKind::Vector)));
        assert_eq!(registry.len(), 2);

        let mut ctx = RecordingContext::new();
        let output = registry
            .prepare_frame(LayerKind::Tile, &view(), &mut ctx)
            .expect("tile renderer registered")
            .unwrap();
        assert!(!output.needs_another_frame);
        assert!(registry
            .prepare_frame(LayerKind::Image, &view(), &mut ctx)
            .is_none());
    }

    #[test]
    fn test_get_mut_borrows_registered_renderer() {
        let mut registry = LayerRendererRegistry::new();
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));

        let renderer = registry.get_mut(LayerKind::Tile).expect("registered");
        assert_eq!(renderer.kind(), LayerKind::Tile);
        renderer.handle_context_lost();
        assert!(registry.get_mut(LayerKind::Vector).is_none());
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let mut registry = LayerRendererRegistry::new();
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_context_lost_reaches_all_renderers() {
        let mut registry = LayerRendererRegistry::new();
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));
        registry.register(Box::new(StubRenderer::new(LayerKind::Image)));
        registry.handle_context_lost();
        // Indirect check: renderers still dispatch after the event.
        let mut ctx = RecordingContext::new();
        assert!(registry
            .prepare_frame(LayerKind::Image, &view(), &mut ctx)
            .is_some());
    }

    #[test]
    fn test_dispose_clears_registry() {
        let mut registry = LayerRendererRegistry::new();
        registry.register(Box::new(StubRenderer::new(LayerKind::Tile)));
        let mut ctx = RecordingContext::new();
        registry.dispose(&mut ctx);
        assert!(registry.is_empty());
    }
}
