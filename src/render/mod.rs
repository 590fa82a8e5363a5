//! The compositor core.
//!
//! Control flow per frame: [`resolve_visible_range`] computes the tile
//! range and pixel geometry, the [`CompositeCache`] decides reuse versus
//! re-render, [`resolve_draw_set`] selects the best available tile per
//! cell with one-level pyramid fallback, the [`TileLayerRenderer`] packs
//! the selection into a power-of-two offscreen surface, and
//! [`build_view_transform`] maps that surface back into viewport space.

mod cache;
mod compositor;
mod context;
mod fallback;
mod transform;
mod visible_range;

pub use cache::{CompositeCache, RenderedComposite};
pub use compositor::{FrameOutput, TileLayerRenderer};
pub use context::{Command, ContextError, RecordingContext, RenderContext, TilePlacement};
pub use fallback::{resolve_draw_set, DrawSet};
pub use transform::build_view_transform;
pub use visible_range::{resolve_visible_range, ViewState, VisibleRange};

use thiserror::Error;

use crate::lookup::LookupError;

/// Frame preparation errors.
///
/// "Tile not yet loaded" is never an error; it is handled by the
/// fallback/retry path.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    /// The context layer failed (context loss, allocation failure).
    #[error("render context error: {0}")]
    Context(#[from] ContextError),

    /// The layer's palette lookup could not be built.
    #[error("palette lookup error: {0}")]
    Lookup(#[from] LookupError),
}
