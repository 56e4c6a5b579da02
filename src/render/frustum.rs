use glam::{DMat3, DMat4, DQuat, DVec2, DVec3, DVec4};

use super::window::Range2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

/// Viewing volume: a pose, an image window on the plane at distance 1 (or in
/// world units for orthographic), and near/far distances along the view axis.
///
/// Equality is structural; two frustums compare equal only when every field does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    pub position: DVec3,
    pub rotation: DQuat,
    pub window: Range2,
    pub near: f64,
    pub far: f64,
    pub view_distance: f64,
    pub projection: Projection,
}

impl Frustum {
    /// Pose taken from a camera-to-world matrix; the rotation is orthonormalized first.
    pub fn from_transform(
        transform: &DMat4,
        window: Range2,
        near_far: (f64, f64),
        view_distance: f64,
        projection: Projection,
    ) -> Self {
        Self {
            position: transform.w_axis.truncate(),
            rotation: rotation_of(transform),
            window,
            near: near_far.0,
            far: near_far.1,
            view_distance,
            projection,
        }
    }

    pub fn view_direction(&self) -> DVec3 {
        self.rotation * DVec3::NEG_Z
    }

    pub fn up_vector(&self) -> DVec3 {
        self.rotation * DVec3::Y
    }

    pub fn right_vector(&self) -> DVec3 {
        self.view_direction().cross(self.up_vector())
    }

    pub fn with_near_far(mut self, near: f64, far: f64) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    /// World-to-camera matrix.
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::from_quat(self.rotation.inverse()) * DMat4::from_translation(-self.position)
    }

    /// OpenGL-style clip matrix for the (possibly off-center) window.
    pub fn projection_matrix(&self) -> DMat4 {
        let (n, f) = (self.near, self.far);
        match self.projection {
            Projection::Perspective => {
                let (l, r) = (self.window.min.x * n, self.window.max.x * n);
                let (b, t) = (self.window.min.y * n, self.window.max.y * n);
                DMat4::from_cols(
                    DVec4::new(2.0 * n / (r - l), 0.0, 0.0, 0.0),
                    DVec4::new(0.0, 2.0 * n / (t - b), 0.0, 0.0),
                    DVec4::new((r + l) / (r - l), (t + b) / (t - b), -(f + n) / (f - n), -1.0),
                    DVec4::new(0.0, 0.0, -2.0 * f * n / (f - n), 0.0),
                )
            }
            Projection::Orthographic => {
                let (l, r) = (self.window.min.x, self.window.max.x);
                let (b, t) = (self.window.min.y, self.window.max.y);
                DMat4::from_cols(
                    DVec4::new(2.0 / (r - l), 0.0, 0.0, 0.0),
                    DVec4::new(0.0, 2.0 / (t - b), 0.0, 0.0),
                    DVec4::new(0.0, 0.0, -2.0 / (f - n), 0.0),
                    DVec4::new(
                        -(r + l) / (r - l),
                        -(t + b) / (t - b),
                        -(f + n) / (f - n),
                        1.0,
                    ),
                )
            }
        }
    }

    /// Sub-frustum around `point` (in normalized `[-1, 1]` window coordinates)
    /// whose window is `half_size` times the current half-size on each axis.
    pub fn narrowed(&self, point: DVec2, half_size: DVec2) -> Self {
        let window_half = self.window.size() * 0.5;
        let center = self.window.midpoint() + point * window_half;
        let mut out = *self;
        out.window = Range2::from_center_half_size(center, half_size * window_half);
        out
    }
}

/// Rotation part of an affine matrix after Gram-Schmidt orthonormalization.
pub(crate) fn rotation_of(matrix: &DMat4) -> DQuat {
    let m = DMat3::from_mat4(*matrix);
    let x = m.x_axis.normalize_or_zero();
    let y = (m.y_axis - x * x.dot(m.y_axis)).normalize_or_zero();
    let z = x.cross(y);
    DQuat::from_mat3(&DMat3::from_cols(x, y, z)).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_window() -> Range2 {
        Range2::from_center_half_size(DVec2::ZERO, DVec2::splat(0.5))
    }

    #[test]
    fn identity_pose_looks_down_negative_z() {
        let frustum = Frustum::from_transform(
            &DMat4::from_translation(DVec3::new(0.0, 0.0, 10.0)),
            unit_window(),
            (1.0, 100.0),
            10.0,
            Projection::Perspective,
        );
        assert!((frustum.view_direction() - DVec3::NEG_Z).length() < 1e-12);
        assert!((frustum.up_vector() - DVec3::Y).length() < 1e-12);
        assert!((frustum.right_vector() - DVec3::X).length() < 1e-12);
        let eye = frustum.view_matrix().transform_point3(frustum.position);
        assert!(eye.length() < 1e-12);
    }

    #[test]
    fn perspective_projection_maps_near_and_far() {
        let frustum = Frustum::from_transform(
            &DMat4::IDENTITY,
            unit_window(),
            (2.0, 50.0),
            1.0,
            Projection::Perspective,
        );
        let proj = frustum.projection_matrix();
        let near = proj.project_point3(DVec3::new(0.0, 0.0, -2.0));
        let far = proj.project_point3(DVec3::new(0.0, 0.0, -50.0));
        assert!((near.z + 1.0).abs() < 1e-9);
        assert!((far.z - 1.0).abs() < 1e-9);
        // Window corner at distance 1 scaled out to the near plane.
        let corner = proj.project_point3(DVec3::new(1.0, 1.0, -2.0));
        assert!((corner.x - 1.0).abs() < 1e-9 && (corner.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn orthographic_projection_uses_window_directly() {
        let frustum = Frustum::from_transform(
            &DMat4::IDENTITY,
            Range2::new(DVec2::new(-4.0, -2.0), DVec2::new(4.0, 2.0)),
            (1.0, 11.0),
            1.0,
            Projection::Orthographic,
        );
        let p = frustum
            .projection_matrix()
            .project_point3(DVec3::new(4.0, -2.0, -6.0));
        assert!((p - DVec3::new(1.0, -1.0, 0.0)).length() < 1e-9);
    }

    #[test]
    fn narrowed_window_is_centered_on_point() {
        let frustum = Frustum::from_transform(
            &DMat4::IDENTITY,
            Range2::new(DVec2::new(-2.0, -1.0), DVec2::new(2.0, 1.0)),
            (1.0, 10.0),
            1.0,
            Projection::Perspective,
        );
        let narrowed = frustum.narrowed(DVec2::new(0.5, -1.0), DVec2::new(0.01, 0.02));
        assert!((narrowed.window.midpoint() - DVec2::new(1.0, -1.0)).length() < 1e-12);
        assert!((narrowed.window.size() - DVec2::new(0.04, 0.04)).length() < 1e-12);
        assert_eq!(narrowed.rotation, frustum.rotation);
    }

    #[test]
    fn rotation_ignores_scale() {
        let m = DMat4::from_scale_rotation_translation(
            DVec3::new(2.0, 3.0, 4.0),
            DQuat::from_rotation_y(0.3),
            DVec3::ZERO,
        );
        let q = rotation_of(&m);
        assert!(q.angle_between(DQuat::from_rotation_y(0.3)) < 1e-9);
    }
}
