//! Physically based lens description, the value handed to renderers.
//!
//! Apertures and focal length are in millimetres scaled by [`APERTURE_UNIT`]
//! and [`FOCAL_LENGTH_UNIT`], so an orthographic lens with a vertical aperture
//! of `150` covers 15 world units.

use glam::{DMat4, DVec2};

use super::frustum::{Frustum, Projection};
use super::window::{conformed_window, Range2, WindowPolicy};

pub const APERTURE_UNIT: f64 = 0.1;
pub const FOCAL_LENGTH_UNIT: f64 = 0.1;
pub const DEFAULT_HORIZONTAL_APERTURE: f64 = 20.955;
pub const DEFAULT_VERTICAL_APERTURE: f64 = 15.2908;
pub const DEFAULT_FOCAL_LENGTH: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lens {
    /// Camera-to-world.
    pub transform: DMat4,
    pub projection: Projection,
    pub horizontal_aperture: f64,
    pub vertical_aperture: f64,
    pub horizontal_aperture_offset: f64,
    pub vertical_aperture_offset: f64,
    pub focal_length: f64,
    pub clipping_range: (f64, f64),
    pub focus_distance: f64,
}

impl Default for Lens {
    fn default() -> Self {
        Self {
            transform: DMat4::IDENTITY,
            projection: Projection::Perspective,
            horizontal_aperture: DEFAULT_HORIZONTAL_APERTURE,
            vertical_aperture: DEFAULT_VERTICAL_APERTURE,
            horizontal_aperture_offset: 0.0,
            vertical_aperture_offset: 0.0,
            focal_length: DEFAULT_FOCAL_LENGTH,
            clipping_range: (1.0, 1_000_000.0),
            focus_distance: 0.0,
        }
    }
}

impl Lens {
    pub fn aspect_ratio(&self) -> f64 {
        if self.vertical_aperture == 0.0 {
            0.0
        } else {
            self.horizontal_aperture / self.vertical_aperture
        }
    }

    /// Vertical field of view in degrees.
    pub fn field_of_view(&self) -> f64 {
        let half = 0.5 * self.vertical_aperture * APERTURE_UNIT
            / (self.focal_length * FOCAL_LENGTH_UNIT);
        2.0 * half.atan().to_degrees()
    }

    /// Perspective lens with the given vertical field of view (degrees); the
    /// horizontal aperture is reset to its default and the vertical one follows
    /// from the aspect ratio.
    pub fn set_perspective_from_aspect_and_fov(&mut self, aspect_ratio: f64, fov: f64) {
        self.projection = Projection::Perspective;
        self.horizontal_aperture = DEFAULT_HORIZONTAL_APERTURE;
        self.vertical_aperture = DEFAULT_HORIZONTAL_APERTURE / aspect_ratio;
        let tan_half = (0.5 * fov.to_radians()).tan();
        if tan_half != 0.0 {
            self.focal_length = self.vertical_aperture * APERTURE_UNIT
                / (2.0 * tan_half)
                / FOCAL_LENGTH_UNIT;
        }
    }

    /// Orthographic lens whose vertical extent is `size` world units.
    pub fn set_orthographic_from_aspect_and_size(&mut self, aspect_ratio: f64, size: f64) {
        self.projection = Projection::Orthographic;
        self.vertical_aperture = size / APERTURE_UNIT;
        self.horizontal_aperture = self.vertical_aperture * aspect_ratio;
    }

    fn aperture_window(&self) -> Range2 {
        let offset = DVec2::new(self.horizontal_aperture_offset, self.vertical_aperture_offset);
        let half = DVec2::new(self.horizontal_aperture, self.vertical_aperture) * 0.5;
        Range2::from_center_half_size(offset, half)
    }

    pub fn frustum(&self) -> Frustum {
        let aperture = self.aperture_window();
        let mut window = Range2::new(aperture.min * APERTURE_UNIT, aperture.max * APERTURE_UNIT);
        if self.projection == Projection::Perspective {
            let focal = self.focal_length * FOCAL_LENGTH_UNIT;
            window = Range2::new(window.min / focal, window.max / focal);
        }
        Frustum::from_transform(
            &self.transform,
            window,
            self.clipping_range,
            self.focus_distance,
            self.projection,
        )
    }

    /// Conform the aperture window to `target_aspect` under `policy`.
    pub fn conform_window(&mut self, policy: WindowPolicy, target_aspect: f64) {
        let window = conformed_window(self.aperture_window(), policy, target_aspect);
        let size = window.size();
        let mid = window.midpoint();
        self.horizontal_aperture = size.x;
        self.vertical_aperture = size.y;
        self.horizontal_aperture_offset = mid.x;
        self.vertical_aperture_offset = mid.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perspective_fov_round_trips() {
        let mut lens = Lens::default();
        lens.set_perspective_from_aspect_and_fov(1.5, 60.0);
        assert!((lens.field_of_view() - 60.0).abs() < 1e-9);
        assert!((lens.aspect_ratio() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn perspective_window_matches_fov() {
        let mut lens = Lens::default();
        lens.set_perspective_from_aspect_and_fov(1.0, 90.0);
        let window = lens.frustum().window;
        assert!((window.max.y - 1.0).abs() < 1e-9);
        assert!((window.min.x + 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthographic_window_is_world_units() {
        let mut lens = Lens::default();
        lens.set_orthographic_from_aspect_and_size(2.0, 10.0);
        let window = lens.frustum().window;
        assert!((window.size().y - 10.0).abs() < 1e-9);
        assert!((window.size().x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn conform_changes_only_one_axis() {
        let mut lens = Lens::default();
        lens.set_perspective_from_aspect_and_fov(1.0, 60.0);
        let vertical = lens.vertical_aperture;
        lens.conform_window(WindowPolicy::MatchVertically, 2.0);
        assert_eq!(lens.vertical_aperture, vertical);
        assert!((lens.aspect_ratio() - 2.0).abs() < 1e-12);
    }
}
