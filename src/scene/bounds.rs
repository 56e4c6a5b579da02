use glam::{DMat4, DVec3};

/// Axis-aligned box. A box whose `min` exceeds its `max` on any axis is empty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: DVec3::splat(f64::INFINITY),
        max: DVec3::splat(f64::NEG_INFINITY),
    };

    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self { min, max }
    }

    pub fn from_center_extent(center: DVec3, extent: DVec3) -> Self {
        let half = extent * 0.5;
        Self::new(center - half, center + half)
    }

    /// Box with infinite extent on every axis.
    pub fn unbounded() -> Self {
        Self::new(DVec3::splat(f64::NEG_INFINITY), DVec3::splat(f64::INFINITY))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn is_finite(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }

    pub fn size(&self) -> DVec3 {
        if self.is_empty() {
            DVec3::ZERO
        } else {
            self.max - self.min
        }
    }

    pub fn center(&self) -> DVec3 {
        (self.min + self.max) * 0.5
    }

    /// Corner `index` in 0..8; bit 0 selects x, bit 1 y, bit 2 z.
    pub fn corner(&self, index: usize) -> DVec3 {
        DVec3::new(
            if index & 1 == 0 { self.min.x } else { self.max.x },
            if index & 2 == 0 { self.min.y } else { self.max.y },
            if index & 4 == 0 { self.min.z } else { self.max.z },
        )
    }

    pub fn corners(&self) -> [DVec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    pub fn extend(&mut self, point: DVec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        if self.is_empty() {
            return *other;
        }
        if other.is_empty() {
            return *self;
        }
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// World-space bound of the scene: a range in local space plus the matrix that
/// places it in the world. Empty and unbounded ranges are valid sentinel states.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBound {
    pub range: Aabb,
    pub matrix: DMat4,
}

impl SceneBound {
    pub fn new(range: Aabb, matrix: DMat4) -> Self {
        Self { range, matrix }
    }

    pub fn aligned(range: Aabb) -> Self {
        Self::new(range, DMat4::IDENTITY)
    }

    pub fn empty() -> Self {
        Self::aligned(Aabb::EMPTY)
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn is_unbounded(&self) -> bool {
        !self.range.is_empty() && !self.range.is_finite()
    }

    /// World-space corners of the oriented box.
    pub fn world_corners(&self) -> [DVec3; 8] {
        self.range
            .corners()
            .map(|corner| self.matrix.transform_point3(corner))
    }

    pub fn centroid(&self) -> DVec3 {
        self.matrix.transform_point3(self.range.center())
    }

    /// Axis-aligned world box enclosing the transformed range.
    pub fn aligned_range(&self) -> Aabb {
        if self.is_empty() {
            return Aabb::EMPTY;
        }
        let mut out = Aabb::EMPTY;
        for corner in self.world_corners() {
            out.extend(corner);
        }
        out
    }
}

impl Default for SceneBound {
    fn default() -> Self {
        Self::empty()
    }
}

/// Distance along a ray to the point on it closest to `point`.
///
/// Points behind the origin project onto the origin, so the result is never negative.
pub fn ray_distance(origin: DVec3, direction: DVec3, point: DVec3) -> f64 {
    let len2 = direction.length_squared();
    if len2 <= f64::EPSILON {
        return 0.0;
    }
    ((point - origin).dot(direction) / len2).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_box_reports_empty_and_zero_size() {
        let bbox = Aabb::EMPTY;
        assert!(bbox.is_empty());
        assert_eq!(bbox.size(), DVec3::ZERO);
        assert!(SceneBound::empty().is_empty());
        assert!(!SceneBound::empty().is_unbounded());
    }

    #[test]
    fn unbounded_box_is_not_empty() {
        let bound = SceneBound::aligned(Aabb::unbounded());
        assert!(!bound.is_empty());
        assert!(bound.is_unbounded());
    }

    #[test]
    fn corners_cover_both_extremes() {
        let bbox = Aabb::new(DVec3::new(-1.0, -2.0, -3.0), DVec3::new(1.0, 2.0, 3.0));
        let corners = bbox.corners();
        assert_eq!(corners[0], bbox.min);
        assert_eq!(corners[7], bbox.max);
        assert_eq!(corners[5], DVec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn transformed_bound_centroid_and_range() {
        let range = Aabb::from_center_extent(DVec3::ZERO, DVec3::new(2.0, 4.0, 6.0));
        let bound = SceneBound::new(
            range,
            DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0))
                * DMat4::from_rotation_z(std::f64::consts::FRAC_PI_2),
        );
        let centroid = bound.centroid();
        assert!((centroid - DVec3::new(10.0, 0.0, 0.0)).length() < 1e-9);
        let size = bound.aligned_range().size();
        assert!((size - DVec3::new(4.0, 2.0, 6.0)).length() < 1e-9);
    }

    #[test]
    fn ray_distance_clamps_behind_origin() {
        let d = ray_distance(DVec3::ZERO, DVec3::NEG_Z, DVec3::new(3.0, 0.0, -5.0));
        assert!((d - 5.0).abs() < 1e-12);
        let behind = ray_distance(DVec3::ZERO, DVec3::NEG_Z, DVec3::new(0.0, 0.0, 5.0));
        assert_eq!(behind, 0.0);
    }

    #[test]
    fn union_ignores_empty_side() {
        let a = Aabb::new(DVec3::ZERO, DVec3::ONE);
        assert_eq!(a.union(&Aabb::EMPTY), a);
        assert_eq!(Aabb::EMPTY.union(&a), a);
        let b = Aabb::new(DVec3::splat(-1.0), DVec3::splat(0.5));
        assert_eq!(a.union(&b), Aabb::new(DVec3::splat(-1.0), DVec3::ONE));
    }
}
