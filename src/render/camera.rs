use glam::{DMat4, DVec3, EulerRot};

use super::clipping::{AutoClippingPlanner, ClippingConfig, ClosestVisibleHint};
use super::frustum::{rotation_of, Frustum, Projection};
use super::lens::{Lens, APERTURE_UNIT};
use crate::scene::{ray_distance, SceneBound};

pub const DEFAULT_FOV: f64 = 60.0;
pub const DEFAULT_DISTANCE: f64 = 100.0;
pub const DEFAULT_SEL_SIZE: f64 = 10.0;

/// Pending change notifications, consumed by [`OrbitCamera::take_changes`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CameraChanges {
    /// The frustum moved or reshaped.
    pub frustum: bool,
    /// A lens parameter was edited (projection, fov, apertures, focal length).
    pub settings: bool,
}

impl CameraChanges {
    pub fn any(&self) -> bool {
        self.frustum || self.settings
    }
}

/// User-driven camera orbiting a center point.
///
/// The pose is kept as `(center, distance, theta, phi, psi)` with angles in
/// degrees; the lens transform is derived from it lazily. Every mutator marks
/// the transform dirty and anything that reads the pose pushes first.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    lens: Lens,
    center: DVec3,
    dist: f64,
    rot_theta: f64,
    rot_phi: f64,
    rot_psi: f64,
    is_z_up: bool,
    yz_up: DMat4,
    yz_up_inv: DMat4,
    transform_dirty: bool,
    sel_size: f64,
    override_near: Option<f64>,
    override_far: Option<f64>,
    planner: AutoClippingPlanner,
    closest_hint: Option<ClosestVisibleHint>,
    changes: CameraChanges,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(false, DEFAULT_FOV, 1.0)
    }
}

impl OrbitCamera {
    pub fn new(is_z_up: bool, fov: f64, aspect_ratio: f64) -> Self {
        let mut lens = Lens::default();
        lens.set_perspective_from_aspect_and_fov(aspect_ratio, fov);
        let (yz_up, yz_up_inv) = if is_z_up {
            (
                DMat4::from_rotation_x((-90.0f64).to_radians()),
                DMat4::from_rotation_x(90.0f64.to_radians()),
            )
        } else {
            (DMat4::IDENTITY, DMat4::IDENTITY)
        };
        let mut camera = Self {
            lens,
            center: DVec3::ZERO,
            dist: DEFAULT_DISTANCE,
            rot_theta: 0.0,
            rot_phi: 0.0,
            rot_psi: 0.0,
            is_z_up,
            yz_up,
            yz_up_inv,
            transform_dirty: true,
            sel_size: DEFAULT_SEL_SIZE,
            override_near: None,
            override_far: None,
            planner: AutoClippingPlanner::default(),
            closest_hint: None,
            changes: CameraChanges::default(),
        };
        camera.reset_clipping_planes();
        camera
    }

    /// Adopt an authored lens. The orbit state is recovered by decomposing its
    /// transform, so a rolled scene camera yields a nonzero `rot_psi`.
    pub fn from_lens(lens: Lens, is_z_up: bool) -> Self {
        let mut camera = Self::new(is_z_up, DEFAULT_FOV, 1.0);
        camera.lens = lens;
        camera.pull_from_transform();
        camera
    }

    pub fn with_clipping_config(mut self, config: ClippingConfig) -> Self {
        self.planner = AutoClippingPlanner::new(config);
        self.reset_clipping_planes();
        self
    }

    pub fn with_overrides(mut self, near: Option<f64>, far: Option<f64>) -> Self {
        self.override_near = near;
        self.override_far = far;
        self.reset_clipping_planes();
        self
    }

    fn push_to_transform(&mut self) {
        if !self.transform_dirty {
            return;
        }
        self.lens.transform = DMat4::from_translation(self.center)
            * self.yz_up_inv
            * DMat4::from_rotation_y((-self.rot_theta).to_radians())
            * DMat4::from_rotation_x((-self.rot_phi).to_radians())
            * DMat4::from_rotation_z((-self.rot_psi).to_radians())
            * DMat4::from_translation(DVec3::Z * self.dist);
        self.lens.focus_distance = self.dist;
        self.transform_dirty = false;
    }

    fn pull_from_transform(&mut self) {
        let frustum = self.lens.frustum();
        self.dist = if self.lens.focus_distance > 0.0 && self.lens.focus_distance.is_finite() {
            self.lens.focus_distance
        } else {
            log::debug!(
                "Lens has no usable focus distance ({}); orbiting at {DEFAULT_DISTANCE}",
                self.lens.focus_distance
            );
            DEFAULT_DISTANCE
        };
        self.sel_size = self.dist / 10.0;
        self.center = frustum.position + self.dist * frustum.view_direction();

        let rotation = rotation_of(&(self.yz_up * self.lens.transform));
        let (theta, phi, psi) = rotation.to_euler(EulerRot::YXZ);
        self.rot_theta = -theta.to_degrees();
        self.rot_phi = -phi.to_degrees();
        self.rot_psi = -psi.to_degrees();
        self.transform_dirty = true;
    }

    fn mark_moved(&mut self) {
        self.transform_dirty = true;
        self.changes.frustum = true;
    }

    fn mark_lens_edited(&mut self) {
        self.changes.frustum = true;
        self.changes.settings = true;
    }

    /// Consume pending change flags.
    pub fn take_changes(&mut self) -> CameraChanges {
        std::mem::take(&mut self.changes)
    }

    pub fn tumble(&mut self, d_theta: f64, d_phi: f64) {
        self.rot_theta += d_theta;
        self.rot_phi += d_phi;
        self.mark_moved();
    }

    pub fn truck(&mut self, delta_right: f64, delta_up: f64) {
        self.push_to_transform();
        let frustum = self.lens.frustum();
        let up = frustum.up_vector();
        let right = frustum.view_direction().cross(up);
        self.center += delta_right * right + delta_up * up;
        self.mark_moved();
    }

    pub fn walk(&mut self, d_forward: f64, d_right: f64) {
        self.push_to_transform();
        let frustum = self.lens.frustum();
        let up = frustum.up_vector().normalize_or_zero();
        let forward = frustum.view_direction().normalize_or_zero();
        let right = forward.cross(up);
        self.center += d_forward * forward + d_right * right;
        self.mark_moved();
    }

    /// Rotate the camera in place about its own axes (degrees). Roll is
    /// always cleared afterwards.
    pub fn pan_tilt(&mut self, d_pan: f64, d_tilt: f64) {
        self.push_to_transform();
        self.lens.transform = self.lens.transform
            * DMat4::from_rotation_y(d_pan.to_radians())
            * DMat4::from_rotation_x(d_tilt.to_radians());
        self.pull_from_transform();
        self.rot_psi = 0.0;
        self.mark_moved();
    }

    /// Dolly by `scale_factor`. Below a distance of 2, zooming out steps
    /// additively so the camera cannot get stuck near the center.
    pub fn adjust_distance(&mut self, scale_factor: f64) {
        if scale_factor > 1.0 && self.dist < 2.0 {
            let step = scale_factor - 1.0;
            // A zero-size selection would otherwise freeze the dolly at the center.
            let sel_based_incr = match self.sel_size / 25.0 {
                incr if incr > 0.0 => incr.min(step),
                _ => step,
            };
            self.set_distance(self.dist + sel_based_incr);
        } else {
            self.set_distance(self.dist * scale_factor);
        }

        let dist = self.dist;
        if let Some(hint) = self.closest_hint.as_mut() {
            hint.follow_dolly(dist);
        }
    }

    /// Center on `bound` and back off far enough for it to fill
    /// `frame_fit` times the view.
    pub fn frame_selection(&mut self, bound: &SceneBound, frame_fit: f64) {
        if bound.is_empty() || bound.is_unbounded() {
            log::warn!("Ignoring request to frame an empty or unbounded selection");
            return;
        }
        self.closest_hint = None;

        self.set_center(bound.centroid());
        let size = bound.aligned_range().size();
        self.sel_size = size.max_element();
        let default_near = self.planner.config.default_near;
        match self.lens.projection {
            Projection::Orthographic => {
                self.set_fov(self.sel_size * frame_fit);
                self.set_distance(self.sel_size + default_near);
            }
            Projection::Perspective => {
                let half_fov = (self.fov() * 0.5).max(0.5);
                let length_to_fit = self.sel_size * frame_fit * 0.5;
                self.set_distance(length_to_fit / half_fov.to_radians().tan());
                // Small objects that fill their box would pierce the near plane.
                if self.dist < default_near + self.sel_size * 0.5 {
                    self.set_distance(default_near + length_to_fit.max(self.sel_size * 0.5));
                }
            }
        }
    }

    /// Snapshot of the lens with clipping planes chosen for `bound`.
    pub fn compute_lens(&mut self, bound: &SceneBound, auto_clip: bool) -> Lens {
        self.push_to_transform();
        if auto_clip {
            self.set_clipping_planes(bound);
        } else {
            self.reset_clipping_planes();
        }
        self.lens
    }

    fn set_clipping_planes(&mut self, bound: &SceneBound) {
        let frustum = self.lens.frustum();
        self.lens.clipping_range = self.planner.compute_near_far(
            &frustum,
            bound,
            self.closest_hint.as_ref(),
            self.override_near,
            self.override_far,
        );
    }

    pub fn reset_clipping_planes(&mut self) {
        self.lens.clipping_range = self
            .planner
            .default_near_far(self.override_near, self.override_far);
    }

    /// Record the distance to the closest visible surface, measured along
    /// the view axis from the camera through `point`.
    pub fn set_closest_visible_dist_from_point(&mut self, point: DVec3) {
        self.push_to_transform();
        let frustum = self.lens.frustum();
        let distance = ray_distance(frustum.position, frustum.view_direction(), point);
        self.closest_hint = Some(ClosestVisibleHint::capture(distance, self.dist));
    }

    pub fn clear_closest_visible_dist(&mut self) {
        self.closest_hint = None;
    }

    pub fn closest_visible_hint(&self) -> Option<&ClosestVisibleHint> {
        self.closest_hint.as_ref()
    }

    /// World units covered by one pixel at the center distance.
    pub fn pixels_to_world(&mut self, viewport_height: f64) -> f64 {
        self.push_to_transform();
        let height = viewport_height.max(1.0);
        match self.lens.projection {
            Projection::Orthographic => self.fov() / height,
            Projection::Perspective => {
                let window_height = self.lens.frustum().window.size().y;
                window_height * self.dist / height
            }
        }
    }

    pub fn transform(&mut self) -> DMat4 {
        self.push_to_transform();
        self.lens.transform
    }

    pub fn frustum(&mut self) -> Frustum {
        self.push_to_transform();
        self.lens.frustum()
    }

    pub fn center(&self) -> DVec3 {
        self.center
    }

    pub fn set_center(&mut self, center: DVec3) {
        self.center = center;
        self.mark_moved();
    }

    pub fn distance(&self) -> f64 {
        self.dist
    }

    pub fn set_distance(&mut self, dist: f64) {
        self.dist = dist;
        self.mark_moved();
    }

    pub fn rot_theta(&self) -> f64 {
        self.rot_theta
    }

    pub fn set_rot_theta(&mut self, value: f64) {
        self.rot_theta = value;
        self.mark_moved();
    }

    pub fn rot_phi(&self) -> f64 {
        self.rot_phi
    }

    pub fn set_rot_phi(&mut self, value: f64) {
        self.rot_phi = value;
        self.mark_moved();
    }

    pub fn rot_psi(&self) -> f64 {
        self.rot_psi
    }

    pub fn is_z_up(&self) -> bool {
        self.is_z_up
    }

    pub fn sel_size(&self) -> f64 {
        self.sel_size
    }

    pub fn projection(&self) -> Projection {
        self.lens.projection
    }

    pub fn is_orthographic(&self) -> bool {
        self.lens.projection == Projection::Orthographic
    }

    pub fn set_projection(&mut self, projection: Projection) {
        self.lens.projection = projection;
        self.mark_lens_edited();
    }

    /// Vertical field of view in degrees, or the vertical extent in world
    /// units for an orthographic camera.
    pub fn fov(&self) -> f64 {
        match self.lens.projection {
            Projection::Perspective => self.lens.field_of_view(),
            Projection::Orthographic => self.lens.vertical_aperture * APERTURE_UNIT,
        }
    }

    pub fn set_fov(&mut self, value: f64) {
        let aspect = self.lens.aspect_ratio();
        match self.lens.projection {
            Projection::Perspective => self.lens.set_perspective_from_aspect_and_fov(aspect, value),
            Projection::Orthographic => self.lens.set_orthographic_from_aspect_and_size(aspect, value),
        }
        self.mark_lens_edited();
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.lens.aspect_ratio()
    }

    /// Only the horizontal aperture changes; the vertical one is held.
    pub fn set_aspect_ratio(&mut self, value: f64) {
        self.set_horizontal_aperture(value * self.lens.vertical_aperture);
    }

    pub fn horizontal_aperture(&self) -> f64 {
        self.lens.horizontal_aperture
    }

    pub fn set_horizontal_aperture(&mut self, value: f64) {
        self.lens.horizontal_aperture = value;
        self.mark_lens_edited();
    }

    pub fn vertical_aperture(&self) -> f64 {
        self.lens.vertical_aperture
    }

    pub fn set_vertical_aperture(&mut self, value: f64) {
        self.lens.vertical_aperture = value;
        self.mark_lens_edited();
    }

    pub fn focal_length(&self) -> f64 {
        self.lens.focal_length
    }

    pub fn set_focal_length(&mut self, value: f64) {
        self.lens.focal_length = value;
        self.mark_lens_edited();
    }

    pub fn clipping_near(&self) -> f64 {
        self.lens.clipping_range.0
    }

    pub fn clipping_far(&self) -> f64 {
        self.lens.clipping_range.1
    }

    pub fn override_near(&self) -> Option<f64> {
        self.override_near
    }

    pub fn set_override_near(&mut self, value: Option<f64>) {
        self.override_near = value;
    }

    pub fn override_far(&self) -> Option<f64> {
        self.override_far
    }

    pub fn set_override_far(&mut self, value: Option<f64>) {
        self.override_far = value;
    }

    pub fn clipping_config(&self) -> &ClippingConfig {
        &self.planner.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Aabb;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn unit_cube() -> SceneBound {
        SceneBound::aligned(Aabb::new(DVec3::splat(-0.5), DVec3::splat(0.5)))
    }

    #[test]
    fn default_pose_looks_down_negative_z() {
        let mut camera = OrbitCamera::default();
        let frustum = camera.frustum();
        assert!((frustum.position - DVec3::new(0.0, 0.0, 100.0)).length() < 1e-9);
        assert!((frustum.view_direction() - DVec3::NEG_Z).length() < 1e-9);
        assert!(close(frustum.view_distance, 100.0));
    }

    #[test]
    fn z_up_basis_looks_along_y() {
        let mut camera = OrbitCamera::new(true, DEFAULT_FOV, 1.0);
        let frustum = camera.frustum();
        assert!((frustum.position - DVec3::new(0.0, -100.0, 0.0)).length() < 1e-9);
        assert!((frustum.view_direction() - DVec3::Y).length() < 1e-9);
        assert!((frustum.up_vector() - DVec3::Z).length() < 1e-9);
    }

    #[test]
    fn adopting_lens_recovers_orbit_state() {
        for z_up in [false, true] {
            let mut source = OrbitCamera::new(z_up, DEFAULT_FOV, 1.5);
            source.set_center(DVec3::new(1.0, 2.0, 3.0));
            source.set_distance(15.0);
            source.set_rot_theta(30.0);
            source.set_rot_phi(20.0);
            let lens = source.compute_lens(&SceneBound::empty(), false);

            let adopted = OrbitCamera::from_lens(lens, z_up);
            assert!((adopted.center() - DVec3::new(1.0, 2.0, 3.0)).length() < 1e-6);
            assert!(close(adopted.distance(), 15.0));
            assert!(close(adopted.sel_size(), 1.5));
            assert!(close(adopted.rot_theta(), 30.0));
            assert!(close(adopted.rot_phi(), 20.0));
            assert!(close(adopted.rot_psi(), 0.0));
        }
    }

    #[test]
    fn pan_tilt_always_clears_roll() {
        let mut lens = Lens::default();
        lens.transform = DMat4::from_translation(DVec3::new(0.0, 0.0, 10.0))
            * DMat4::from_rotation_z(30.0f64.to_radians());
        lens.focus_distance = 10.0;
        let mut camera = OrbitCamera::from_lens(lens, false);
        assert!(close(camera.rot_psi(), -30.0));

        camera.tumble(12.0, -7.0);
        camera.truck(0.5, -0.25);
        camera.walk(1.0, 2.0);
        assert!(close(camera.rot_psi(), -30.0));

        camera.pan_tilt(3.0, 4.0);
        assert_eq!(camera.rot_psi(), 0.0);
    }

    #[test]
    fn pan_tilt_clears_roll_on_z_up_camera() {
        let mut source = OrbitCamera::new(true, DEFAULT_FOV, 1.0);
        source.set_distance(10.0);
        source.set_rot_theta(25.0);
        source.set_rot_phi(15.0);
        let mut lens = source.compute_lens(&SceneBound::empty(), false);
        lens.transform = lens.transform * DMat4::from_rotation_z(20.0f64.to_radians());
        let mut camera = OrbitCamera::from_lens(lens, true);
        assert!(close(camera.rot_psi(), -20.0));

        let position = camera.frustum().position;
        camera.pan_tilt(5.0, -3.0);
        assert_eq!(camera.rot_psi(), 0.0);
        assert!(close(camera.distance(), 10.0));
        let frustum = camera.frustum();
        assert!((frustum.position - position).length() < 1e-6);
        // Without roll the camera's right vector stays level with the z-up ground.
        assert!(frustum.right_vector().z.abs() < 1e-9);
    }

    #[test]
    fn set_aspect_ratio_only_touches_horizontal_aperture() {
        let mut camera = OrbitCamera::default();
        let vertical = camera.vertical_aperture();
        for ratio in [0.5, 1.0, 16.0 / 9.0, 3.0] {
            camera.set_aspect_ratio(ratio);
            assert!((camera.aspect_ratio() - ratio).abs() < 1e-12);
            assert_eq!(camera.vertical_aperture(), vertical);
        }
    }

    #[test]
    fn zooming_out_from_close_range_never_stalls() {
        let mut camera = OrbitCamera::default();
        camera.set_distance(1.5);
        let mut last = camera.distance();
        for _ in 0..20 {
            camera.adjust_distance(1.5);
            assert!(camera.distance() > last);
            last = camera.distance();
        }
    }

    #[test]
    fn zooming_out_from_zero_size_selection_never_stalls() {
        let mut camera = OrbitCamera::default();
        let point = SceneBound::aligned(Aabb::new(DVec3::ONE, DVec3::ONE));
        camera.frame_selection(&point, 1.1);
        assert_eq!(camera.sel_size(), 0.0);
        camera.set_distance(1.5);
        camera.adjust_distance(1.5);
        assert!(close(camera.distance(), 2.0));
    }

    #[test]
    fn lens_without_focus_distance_orbits_at_default_distance() {
        let mut lens = Lens::default();
        lens.transform = DMat4::from_translation(DVec3::new(0.0, 0.0, 20.0));
        assert_eq!(lens.focus_distance, 0.0);
        let mut camera = OrbitCamera::from_lens(lens, false);
        assert!(close(camera.distance(), DEFAULT_DISTANCE));
        assert!(close(camera.sel_size(), DEFAULT_DISTANCE / 10.0));
        assert!((camera.center() - DVec3::new(0.0, 0.0, 20.0 - DEFAULT_DISTANCE)).length() < 1e-6);
        assert!((camera.frustum().position - DVec3::new(0.0, 0.0, 20.0)).length() < 1e-6);
        assert!(camera.pixels_to_world(100.0) > 0.0);

        let before = camera.distance();
        camera.adjust_distance(1.5);
        assert!(camera.distance() > before);
    }

    #[test]
    fn truck_and_walk_follow_camera_basis() {
        let mut camera = OrbitCamera::default();
        camera.truck(2.0, 3.0);
        assert!((camera.center() - DVec3::new(2.0, 3.0, 0.0)).length() < 1e-9);
        camera.walk(5.0, 1.0);
        assert!((camera.center() - DVec3::new(3.0, 3.0, -5.0)).length() < 1e-9);
    }

    #[test]
    fn frame_selection_keeps_small_objects_past_near() {
        let mut camera = OrbitCamera::default();
        camera.frame_selection(&unit_cube(), 1.1);
        assert!(close(camera.sel_size(), 1.0));
        assert!(close(camera.distance(), 1.55));

        let big = SceneBound::aligned(Aabb::new(DVec3::splat(-5.0), DVec3::splat(5.0)));
        camera.frame_selection(&big, 1.1);
        assert!(close(camera.distance(), 5.5 / 30.0f64.to_radians().tan()));
        assert!(camera.center().length() < 1e-12);
    }

    #[test]
    fn frame_selection_orthographic_sets_extent() {
        let mut camera = OrbitCamera::default();
        camera.set_projection(Projection::Orthographic);
        let bound = SceneBound::aligned(Aabb::new(DVec3::splat(-2.0), DVec3::splat(2.0)));
        camera.frame_selection(&bound, 1.1);
        assert!(close(camera.fov(), 4.4));
        assert!(close(camera.distance(), 5.0));
    }

    #[test]
    fn frame_selection_ignores_empty_bound() {
        let mut camera = OrbitCamera::default();
        camera.frame_selection(&SceneBound::empty(), 1.1);
        assert_eq!(camera.distance(), DEFAULT_DISTANCE);
        assert_eq!(camera.center(), DVec3::ZERO);
    }

    #[test]
    fn auto_clip_pads_bound_along_view_ray() {
        let mut camera = OrbitCamera::default();
        camera.set_distance(10.0);
        let lens = camera.compute_lens(&unit_cube(), true);
        assert!(close(lens.clipping_range.0, 9.405));
        assert!(close(lens.clipping_range.1, 10.605));

        let lens = camera.compute_lens(&unit_cube(), false);
        assert_eq!(lens.clipping_range, (1.0, 2_000_000.0));
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut camera = OrbitCamera::default().with_overrides(Some(0.1), Some(500.0));
        assert_eq!(camera.clipping_near(), 0.1);
        assert_eq!(camera.clipping_far(), 500.0);
        let lens = camera.compute_lens(&unit_cube(), true);
        assert_eq!(lens.clipping_range, (0.1, 500.0));
    }

    #[test]
    fn closest_hint_tracks_dolly() {
        let mut camera = OrbitCamera::default();
        camera.set_distance(10.0);
        camera.set_closest_visible_dist_from_point(DVec3::new(0.0, 0.0, 0.5));
        let hint = camera.closest_visible_hint().copied();
        assert!(hint.is_some_and(|h| close(h.distance, 9.5)));

        camera.adjust_distance(0.5);
        let hint = camera.closest_visible_hint().copied();
        assert!(hint.is_some_and(|h| close(h.distance, 4.5)));

        camera.frame_selection(&unit_cube(), 1.1);
        assert!(camera.closest_visible_hint().is_none());
    }

    #[test]
    fn pixels_to_world_by_projection() {
        let mut camera = OrbitCamera::new(false, 90.0, 1.0);
        camera.set_distance(10.0);
        assert!(close(camera.pixels_to_world(100.0), 2.0 * 10.0 / 100.0));
        // Zero-height viewports are clamped to one pixel.
        assert!(close(camera.pixels_to_world(0.0), 20.0));

        camera.set_projection(Projection::Orthographic);
        camera.set_fov(8.0);
        assert!(close(camera.pixels_to_world(200.0), 0.04));
    }

    #[test]
    fn change_flags_separate_motion_from_settings() {
        let mut camera = OrbitCamera::default();
        assert!(!camera.take_changes().any());

        camera.tumble(1.0, 0.0);
        let changes = camera.take_changes();
        assert!(changes.frustum && !changes.settings);
        assert!(!camera.take_changes().any());

        camera.set_fov(45.0);
        let changes = camera.take_changes();
        assert!(changes.frustum && changes.settings);
    }
}
