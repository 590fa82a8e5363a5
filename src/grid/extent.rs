//! World-space extents.

/// Axis-aligned rectangle in world (projected map) coordinates.
///
/// `min_y` is the southern edge: the grid origin sits at the bottom-left
/// of the world extent and tile rows grow northward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Extent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Extent {
    /// Create an extent. `min` components must not exceed `max` components.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        debug_assert!(min_x <= max_x && min_y <= max_y);
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Bounding extent of a rotated viewport.
    ///
    /// The viewport is `size` device pixels at `resolution` world units
    /// per pixel, centered on `center` and rotated by `rotation` radians.
    /// The result is the axis-aligned box around its four corners.
    pub fn for_center_size(
        center: (f64, f64),
        resolution: f64,
        rotation: f64,
        size: (u32, u32),
    ) -> Self {
        let dx = resolution * size.0 as f64 / 2.0;
        let dy = resolution * size.1 as f64 / 2.0;
        let cos = rotation.cos();
        let sin = rotation.sin();
        let x_cos = dx * cos;
        let x_sin = dx * sin;
        let y_cos = dy * cos;
        let y_sin = dy * sin;

        let xs = [
            center.0 - x_cos + y_sin,
            center.0 - x_cos - y_sin,
            center.0 + x_cos - y_sin,
            center.0 + x_cos + y_sin,
        ];
        let ys = [
            center.1 - x_sin - y_cos,
            center.1 - x_sin + y_cos,
            center.1 + x_sin + y_cos,
            center.1 + x_sin - y_cos,
        ];

        Self {
            min_x: xs.iter().copied().fold(f64::INFINITY, f64::min),
            min_y: ys.iter().copied().fold(f64::INFINITY, f64::min),
            max_x: xs.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            max_y: ys.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}
