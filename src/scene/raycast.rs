use glam::{DMat4, DVec3};

use super::{object_aabb, Aabb, RuntimeObject, SceneRuntime};
use crate::render::{IntersectionTest, PickHit};

/// Intersection backend that hit-tests the center ray of a frustum against
/// object boxes. Stands in for a renderer's id pass.
#[derive(Debug, Clone, Default)]
pub struct BoundsRaycaster {
    objects: Vec<RuntimeObject>,
}

impl BoundsRaycaster {
    pub fn new(objects: Vec<RuntimeObject>) -> Self {
        Self { objects }
    }

    pub fn from_runtime(runtime: &SceneRuntime) -> Self {
        Self::new(runtime.objects().to_vec())
    }
}

impl IntersectionTest for BoundsRaycaster {
    fn test_intersection(&mut self, view: &DMat4, projection: &DMat4) -> Option<PickHit> {
        let inverse = (*projection * *view).inverse();
        let start = inverse.project_point3(DVec3::new(0.0, 0.0, -1.0));
        let end = inverse.project_point3(DVec3::new(0.0, 0.0, 1.0));
        let segment = end - start;
        let length = segment.length();
        if !length.is_finite() || length <= f64::EPSILON {
            return None;
        }
        let direction = segment / length;

        self.objects
            .iter()
            .filter_map(|object| {
                let (t, normal) = intersect_ray_aabb(start, direction, &object_aabb(object))?;
                (t <= length).then_some((t, normal, object))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(t, normal, object)| PickHit {
                point: start + direction * t,
                normal,
                path: object.path.clone(),
                instancer_path: None,
                instance_index: None,
            })
    }
}

/// Slab test. Returns the entry distance (0 when starting inside) and the
/// outward normal of the face that was entered.
fn intersect_ray_aabb(origin: DVec3, direction: DVec3, bbox: &Aabb) -> Option<(f64, DVec3)> {
    let mut t_min = 0.0f64;
    let mut t_max = f64::INFINITY;
    let mut normal = -direction;

    for axis in 0..3 {
        let o = origin[axis];
        let d = direction[axis];
        let (lo, hi) = (bbox.min[axis], bbox.max[axis]);
        if d.abs() < 1e-12 {
            if o < lo || o > hi {
                return None;
            }
            continue;
        }
        let (near, far) = {
            let a = (lo - o) / d;
            let b = (hi - o) / d;
            if a <= b { (a, b) } else { (b, a) }
        };
        if near > t_min {
            t_min = near;
            normal = DVec3::ZERO;
            normal[axis] = -d.signum();
        }
        t_max = t_max.min(far);
        if t_min > t_max {
            return None;
        }
    }
    Some((t_min, normal))
}
