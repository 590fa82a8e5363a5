//! Surface-to-viewport transform derivation.

use glam::{Mat4, Vec3};

use crate::grid::Extent;

/// Build the affine transform mapping the composite surface's texture
/// space into the current viewport.
///
/// Construction order matters: translate by the center's fractional
/// position within the framebuffer extent, rotate about Z (skipped when
/// rotation is exactly zero), scale by viewport-size-in-world-units over
/// extent size, then translate by (-0.5, -0.5) to center the unit quad.
/// The surrounding rendering layer draws the final quad with this
/// transform; this function only derives it.
pub fn build_view_transform(
    center: (f64, f64),
    size: (u32, u32),
    resolution: f64,
    rotation: f64,
    framebuffer_extent: &Extent,
) -> Mat4 {
    let width = framebuffer_extent.width();
    let height = framebuffer_extent.height();

    let mut transform = Mat4::from_translation(Vec3::new(
        ((center.0 - framebuffer_extent.min_x) / width) as f32,
        ((center.1 - framebuffer_extent.min_y) / height) as f32,
        0.0,
    ));
    if rotation != 0.0 {
        transform *= Mat4::from_rotation_z(rotation as f32);
    }
    transform *= Mat4::from_scale(Vec3::new(
        (size.0 as f64 * resolution / width) as f32,
        (size.1 as f64 * resolution / height) as f32,
        1.0,
    ));
    transform * Mat4::from_translation(Vec3::new(-0.5, -0.5, 0.0))
}
