//! Compositor configuration.

/// Tunables for the tile layer compositor.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositorConfig {
    /// Upper bound on the offscreen surface dimension in pixels.
    ///
    /// Extreme zoom-out requests can otherwise ask for unbounded surface
    /// allocations; dimensions are clamped here instead of failing, at
    /// the cost of visual fidelity beyond the bound (tiles outside the
    /// clamped extent are simply not covered by the surface). Rounded
    /// down to a power of two when applied; see
    /// [`framebuffer_cap`](Self::framebuffer_cap).
    pub max_framebuffer_dimension: u32,

    /// Snap the viewport center to a whole-pixel boundary when the
    /// requested resolution exactly matches a native zoom level, avoiding
    /// sub-pixel shimmer.
    pub snap_to_pixel: bool,
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            max_framebuffer_dimension: 8192,
            snap_to_pixel: true,
        }
    }
}

impl CompositorConfig {
    /// Set the framebuffer dimension cap, rounded down to a power of two.
    pub fn with_max_framebuffer_dimension(mut self, dimension: u32) -> Self {
        self.max_framebuffer_dimension = floor_power_of_two(dimension.max(1));
        self
    }

    /// Enable or disable whole-pixel center snapping.
    pub fn with_snap_to_pixel(mut self, snap: bool) -> Self {
        self.snap_to_pixel = snap;
        self
    }

    /// Effective framebuffer dimension cap: the configured bound rounded
    /// down to a power of two, never zero. Applied at composition time so
    /// that direct field assignment cannot produce a non-power-of-two
    /// surface.
    pub fn framebuffer_cap(&self) -> u32 {
        floor_power_of_two(self.max_framebuffer_dimension.max(1))
    }
}

/// Largest power of two less than or equal to `value` (which must be
/// nonzero).
fn floor_power_of_two(value: u32) -> u32 {
    1 << (31 - value.leading_zeros())
}
