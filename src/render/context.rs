//! Graphics context abstraction.
//!
//! The compositor consumes the windowing/GL layer as an opaque "draw a
//! unit quad with a bound texture and uniform offsets" capability. This
//! module defines that seam plus a recording implementation used by the
//! tests to observe exactly which commands a frame issued.

use std::collections::HashSet;

use thiserror::Error;

use crate::lookup::LookupTable;
use crate::tile::TextureId;

/// Context-layer errors.
///
/// Context loss is fatal to cached GPU state but recoverable for the
/// session: the caller drops cached handles via
/// [`LayerRenderer::handle_context_lost`](crate::layer::LayerRenderer::handle_context_lost)
/// and rebuilds lazily on the next frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContextError {
    /// The underlying graphics context was lost or reset.
    #[error("graphics context lost")]
    Lost,

    /// A surface or texture could not be allocated.
    #[error("resource allocation failed: {0}")]
    Allocation(String),
}

/// Per-tile placement in framebuffer clip space.
///
/// `scale` is the tile's world size over the framebuffer's world size
/// (doubled for the [-1, 1] clip range); `translate` is the tile's world
/// origin relative to the framebuffer origin, normalized the same way.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TilePlacement {
    pub scale: (f32, f32),
    pub translate: (f32, f32),
}

/// Drawing primitives the compositor needs from the context layer.
///
/// Implementations own all GPU resources (offscreen surface, tile
/// textures, lookup textures); the compositor only sequences commands.
///
/// # Implementors
///
/// - [`RecordingContext`] - records commands for inspection in tests
pub trait RenderContext {
    /// Bind (creating if necessary) the square offscreen surface of the
    /// given pixel dimension as the draw target.
    fn bind_framebuffer(&mut self, dimension: u32) -> Result<(), ContextError>;

    /// Set the draw viewport in surface pixels.
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the bound surface to fully transparent.
    fn clear_to_transparent(&mut self);

    /// Enable or disable blending. Tiles are opaque and drawn without
    /// overlap except intentional ancestor overpaint, so composition runs
    /// with blending off.
    fn set_blending(&mut self, enabled: bool);

    /// Toggle the palette-substitution fragment path.
    fn set_lookup_enabled(&mut self, enabled: bool);

    /// Upload and bind the source/target palette tables as auxiliary
    /// samplers.
    fn bind_lookup_tables(
        &mut self,
        source: &LookupTable,
        target: &LookupTable,
    ) -> Result<(), ContextError>;

    /// Bind a tile texture for the next draw. `pixel_size` is the tile's
    /// on-surface footprint, `gutter` the border to crop, both in device
    /// pixels.
    fn bind_tile_texture(
        &mut self,
        texture: TextureId,
        pixel_size: u32,
        gutter: f64,
    ) -> Result<(), ContextError>;

    /// Draw the unit quad with the bound texture at the given placement.
    fn draw_unit_quad(&mut self, placement: TilePlacement) -> Result<(), ContextError>;

    /// Whether a tile texture has finished its GPU upload. Tiles whose
    /// textures are not yet resident are treated as unavailable, which
    /// caps per-frame upload work at the context layer.
    fn is_resident(&self, texture: TextureId) -> bool;

    /// Release the offscreen surface. Called from layer disposal.
    fn release_framebuffer(&mut self);
}

/// One recorded context command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    BindFramebuffer { dimension: u32 },
    SetViewport { width: u32, height: u32 },
    ClearToTransparent,
    SetBlending { enabled: bool },
    SetLookupEnabled { enabled: bool },
    BindLookupTables,
    BindTileTexture { texture: TextureId, pixel_size: u32, gutter: f64 },
    DrawUnitQuad { placement: TilePlacement },
    ReleaseFramebuffer,
}

/// [`RenderContext`] that records every command instead of drawing.
///
/// All textures count as resident unless marked otherwise, so tests can
/// exercise the "loaded but not yet uploaded" path explicitly.
#[derive(Debug, Default)]
pub struct RecordingContext {
    commands: Vec<Command>,
    nonresident: HashSet<TextureId>,
}

impl RecordingContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat a texture as not yet uploaded.
    pub fn set_nonresident(&mut self, texture: TextureId) {
        self.nonresident.insert(texture);
    }

    /// Mark a texture's upload as complete.
    pub fn set_resident(&mut self, texture: TextureId) {
        self.nonresident.remove(&texture);
    }

    /// Every command issued so far, in order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Number of unit-quad draws issued so far.
    pub fn draw_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, Command::DrawUnitQuad { .. }))
            .count()
    }

    /// Textures in the order they were drawn (each draw paired with the
    /// texture bound immediately before it).
    pub fn drawn_textures(&self) -> Vec<TextureId> {
        let mut bound = None;
        let mut drawn = Vec::new();
        for command in &self.commands {
            match command {
                Command::BindTileTexture { texture, .. } => bound = Some(*texture),
                Command::DrawUnitQuad { .. } => {
                    if let Some(texture) = bound {
                        drawn.push(texture);
                    }
                }
                _ => {}
            }
        }
        drawn
    }
}

impl RenderContext for RecordingContext {
    fn bind_framebuffer(&mut self, dimension: u32) -> Result<(), ContextError> {
        self.commands.push(Command::BindFramebuffer { dimension });
        Ok(())
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(Command::SetViewport { width, height });
    }

    fn clear_to_transparent(&mut self) {
        self.commands.push(Command::ClearToTransparent);
    }

    fn set_blending(&mut self, enabled: bool) {
        self.commands.push(Command::SetBlending { enabled });
    }

    fn set_lookup_enabled(&mut self, enabled: bool) {
        self.commands.push(Command::SetLookupEnabled { enabled });
    }

    fn bind_lookup_tables(
        &mut self,
        _source: &LookupTable,
        _target: &LookupTable,
    ) -> Result<(), ContextError> {
        self.commands.push(Command::BindLookupTables);
        Ok(())
    }

    fn bind_tile_texture(
        &mut self,
        texture: TextureId,
        pixel_size: u32,
        gutter: f64,
    ) -> Result<(), ContextError> {
        self.commands.push(Command::BindTileTexture {
            texture,
            pixel_size,
            gutter,
        });
        Ok(())
    }

    fn draw_unit_quad(&mut self, placement: TilePlacement) -> Result<(), ContextError> {
        self.commands.push(Command::DrawUnitQuad { placement });
        Ok(())
    }

    fn is_resident(&self, texture: TextureId) -> bool {
        !self.nonresident.contains(&texture)
    }

    fn release_framebuffer(&mut self) {
        self.commands.push(Command::ReleaseFramebuffer);
    }
}
