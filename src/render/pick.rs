//! Pick frustums
//!
//! Picking narrows the resolved frustum to the one pixel under the pointer and
//! hands its matrices to the renderer's intersection test. The pointer is
//! normalized against the image viewport, which is a centered sub-rectangle of
//! the window when the image is cropped to the camera frame; clicks that land
//! outside it come back as out of bounds and count as a deselect.
//!
//! The same intersection test also samples the closest visible surface for
//! automatic clipping, probing a tight depth range first and a wide one only
//! when the first pass finds nothing.

use glam::{DMat4, DVec2, DVec3};

use super::clipping::ClippingConfig;
use super::frustum::Frustum;
use super::resolve::ResolvedFrustum;
use super::window::{conformed_window, viewport_aspect, ViewportRect, WindowPolicy};

// ========================================================================
// PickHit / IntersectionTest — the renderer's side of picking
// ========================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub point: DVec3,
    pub normal: DVec3,
    /// Path of the hit prim. Empty means nothing was hit.
    pub path: String,
    pub instancer_path: Option<String>,
    pub instance_index: Option<u32>,
}

impl PickHit {
    pub fn is_none(&self) -> bool {
        self.path.is_empty()
    }
}

/// Renderer-provided hit test against the geometry inside a frustum.
pub trait IntersectionTest {
    fn test_intersection(&mut self, view: &DMat4, projection: &DMat4) -> Option<PickHit>;
}

/// Run the intersection test for `frustum`, treating empty hits as misses.
pub fn pick<T: IntersectionTest + ?Sized>(frustum: &Frustum, backend: &mut T) -> Option<PickHit> {
    backend
        .test_intersection(&frustum.view_matrix(), &frustum.projection_matrix())
        .filter(|hit| !hit.is_none())
}

// ========================================================================
// Pick frustum construction
// ========================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickFrustum {
    /// False when the pointer lies outside the image viewport.
    pub in_bounds: bool,
    pub frustum: Frustum,
}

/// The part of a `window`-sized viewport covered by a camera of
/// `camera_aspect`, snapped to whole pixels.
pub fn camera_viewport(window: DVec2, camera_aspect: f64) -> ViewportRect {
    let target_aspect = viewport_aspect(window.x, window.y);
    let policy = if target_aspect < camera_aspect {
        WindowPolicy::MatchHorizontally
    } else {
        WindowPolicy::MatchVertically
    };
    let full = ViewportRect::window(window.x, window.y).as_range();
    ViewportRect::from_range(conformed_window(full, policy, camera_aspect)).make_centered_integral()
}

/// Pixel rectangle the image is drawn into for `resolved`.
pub fn image_viewport(resolved: &ResolvedFrustum) -> ViewportRect {
    if resolved.crop_to_camera_viewport {
        camera_viewport(resolved.viewport, resolved.camera_aspect)
    } else {
        ViewportRect::window(resolved.viewport.x, resolved.viewport.y)
    }
}

/// One-pixel frustum under `pointer` (window pixels, y down).
pub fn build_pick_frustum(resolved: &ResolvedFrustum, pointer: DVec2) -> PickFrustum {
    let viewport = image_viewport(resolved);
    let normalized = (pointer - viewport.origin) / viewport.size;
    let point = DVec2::new(normalized.x * 2.0 - 1.0, -(normalized.y * 2.0 - 1.0));
    let size = DVec2::ONE / viewport.size;

    PickFrustum {
        in_bounds: point.x.abs() <= 1.0 && point.y.abs() <= 1.0,
        frustum: resolved.frustum.narrowed(point, size),
    }
}

/// Closest visible surface point within `frustum`, or `None` if the scene
/// is empty in both depth ranges.
pub fn closest_visible_point<T: IntersectionTest + ?Sized>(
    frustum: &Frustum,
    sel_size: f64,
    config: &ClippingConfig,
    backend: &mut T,
) -> Option<DVec3> {
    let true_far = frustum.far;
    let small_near = config.default_near.min(sel_size / 10.0);
    let tight = frustum.with_near_far(small_near, small_near * config.max_safe_z_resolution);
    if let Some(hit) = pick(&tight, backend) {
        return Some(hit.point);
    }

    log::debug!("No hit in the tight depth range, retrying up to far {true_far}");
    let wide = frustum.with_near_far(true_far / config.max_safe_z_resolution, true_far);
    pick(&wide, backend).map(|hit| hit.point)
}
