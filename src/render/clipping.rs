//! Automatic near/far clipping plane placement.
//!
//! We want every piece of visible geometry inside the frustum, but the
//! farther the near plane is from the geometry, the less depth precision is
//! left to separate nearly coplanar surfaces. The bound of the scene gives a
//! conservative range; a sampled distance to the closest visible surface lets
//! the near plane move out when the bound-derived one would waste precision.

use glam::DVec3;
use serde::{Deserialize, Serialize};

use super::frustum::Frustum;
use crate::scene::{ray_distance, SceneBound};

pub const DEFAULT_NEAR: f64 = 1.0;
pub const DEFAULT_FAR: f64 = 2_000_000.0;
/// Far/near ratios above this make z-fighting likely even close to the camera.
pub const MAX_GOOD_Z_RESOLUTION: f64 = 5e4;
/// Far/near ratios above this lose geometry in the back half of the volume.
pub const MAX_SAFE_Z_RESOLUTION: f64 = 1e6;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClippingConfig {
    pub default_near: f64,
    pub default_far: f64,
    pub max_good_z_resolution: f64,
    pub max_safe_z_resolution: f64,
}

impl Default for ClippingConfig {
    fn default() -> Self {
        Self {
            default_near: DEFAULT_NEAR,
            default_far: DEFAULT_FAR,
            max_good_z_resolution: MAX_GOOD_Z_RESOLUTION,
            max_safe_z_resolution: MAX_SAFE_Z_RESOLUTION,
        }
    }
}

/// Cached depth sample of the closest rendered surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestVisibleHint {
    /// Current estimate, adjusted as the camera dollies.
    pub distance: f64,
    /// The distance as sampled.
    pub captured_distance: f64,
    /// Camera-to-center distance when the sample was taken.
    pub camera_distance_at_capture: f64,
}

impl ClosestVisibleHint {
    pub fn capture(distance: f64, camera_distance: f64) -> Self {
        Self {
            distance,
            captured_distance: distance,
            camera_distance_at_capture: camera_distance,
        }
    }

    /// Follow a dolly to `camera_distance`. Moving in shifts the estimate by
    /// the same amount; moving out never recedes past the sampled distance.
    pub fn follow_dolly(&mut self, camera_distance: f64) {
        self.distance = if camera_distance > self.camera_distance_at_capture {
            self.captured_distance
        } else {
            self.captured_distance - self.camera_distance_at_capture + camera_distance
        };
    }

    /// True when the camera has moved closer since the sample was taken.
    pub fn is_stale(&self) -> bool {
        self.distance < self.captured_distance
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AutoClippingPlanner {
    pub config: ClippingConfig,
}

impl AutoClippingPlanner {
    pub fn new(config: ClippingConfig) -> Self {
        Self { config }
    }

    /// Defaults with any override substituted.
    pub fn default_near_far(&self, override_near: Option<f64>, override_far: Option<f64>) -> (f64, f64) {
        (
            override_near.unwrap_or(self.config.default_near),
            override_far.unwrap_or(self.config.default_far),
        )
    }

    /// Signed extent of `bound` projected on the ray from `origin` along
    /// `direction`, padded by 1% on both ends and clamped to the default near.
    pub fn range_of_bound_along_ray(&self, origin: DVec3, direction: DVec3, bound: &SceneBound) -> (f64, f64) {
        let mut min_dist = f64::INFINITY;
        let mut max_dist = f64::NEG_INFINITY;
        for corner in bound.world_corners() {
            let dist = ray_distance(origin, direction, corner);
            min_dist = min_dist.min(dist);
            max_dist = max_dist.max(dist);
        }
        log::debug!("Projected bounds near/far: {min_dist}, {max_dist}");

        // Part of the box is behind the camera, or touches it.
        if min_dist < self.config.default_near {
            min_dist = self.config.default_near;
        } else {
            min_dist *= 0.99;
        }
        max_dist *= 1.01;
        log::debug!("Contracted bounds near/far: {min_dist}, {max_dist}");
        (min_dist, max_dist)
    }

    /// Near/far for `frustum`'s pose given the scene bound, an optional
    /// closest-visible sample, and user overrides. Always `far >= near + 1`.
    pub fn compute_near_far(
        &self,
        frustum: &Frustum,
        bound: &SceneBound,
        hint: Option<&ClosestVisibleHint>,
        override_near: Option<f64>,
        override_far: Option<f64>,
    ) -> (f64, f64) {
        let (computed_near, computed_far) = if bound.is_empty()
            || bound.is_unbounded()
            || (override_near.is_some() && override_far.is_some())
        {
            (self.config.default_near, self.config.default_far)
        } else {
            let (bbox_near, bbox_far) =
                self.range_of_bound_along_ray(frustum.position, frustum.view_direction(), bound);
            let near = match hint {
                Some(hint) => self.near_from_hint(bbox_near, bbox_far, hint),
                None => bbox_near,
            };
            (near, bbox_far)
        };

        let near = override_near.unwrap_or(computed_near);
        let far = override_far.unwrap_or(computed_far).max(near + 1.0);
        log::debug!("Final near/far: {near}, {far}");
        (near, far)
    }

    fn near_from_hint(&self, bbox_near: f64, bbox_far: f64, hint: &ClosestVisibleHint) -> f64 {
        let precision_near = bbox_far / self.config.max_good_z_resolution;
        log::debug!(
            "Proposed near for precision: {precision_near}, closest distance: {}",
            hint.distance
        );

        // Orbiting or trucking may bring geometry closer than the sample, so
        // never go past half of it.
        let mut half_close = hint.distance / 2.0;
        if hint.is_stale() {
            // Zoomed in since sampling: trade clipping against z-fighting.
            half_close = precision_near.max(half_close).max(bbox_near);
            log::debug!("Accounting for zoom-in since the closest distance was sampled");
        }

        if half_close < bbox_near {
            log::debug!("Closest distance is nearer than the bound; pulling near in");
            half_close
        } else if precision_near > bbox_near {
            log::debug!("Pushing near out for depth precision");
            ((precision_near + half_close) / 2.0).min(half_close)
        } else {
            bbox_near
        }
    }
}
