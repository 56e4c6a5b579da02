//! The scene layer as seen by the camera core: world bounds, the up-axis
//! convention, and authored cameras looked up by path.

mod bounds;
mod raycast;

pub use bounds::{ray_distance, Aabb, SceneBound};
pub use raycast::BoundsRaycaster;

use crate::render::Lens;

/// An authored camera as read from the stage at the current time.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneCamera {
    pub lens: Lens,
    pub active: bool,
}

/// Data the camera core needs from the scene layer.
pub trait Stage {
    /// World-space bound of everything imageable. May be empty or unbounded.
    fn bounds(&self) -> SceneBound;

    /// Fixed per stage.
    fn is_z_up(&self) -> bool;

    /// `None` when no camera lives at `path` (for example after it was deleted).
    fn scene_camera(&self, path: &str) -> Option<SceneCamera>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeObject {
    pub path: String,
    pub center: [f64; 3],
    pub extent: [f64; 3],
}

/// In-memory stage: boxes and authored cameras.
#[derive(Debug, Default)]
pub struct SceneRuntime {
    objects: Vec<RuntimeObject>,
    cameras: Vec<(String, SceneCamera)>,
    z_up: bool,
}

impl SceneRuntime {
    pub fn new(z_up: bool) -> Self {
        Self {
            objects: Vec::new(),
            cameras: Vec::new(),
            z_up,
        }
    }

    pub fn push(&mut self, object: RuntimeObject) {
        self.objects.push(object);
    }

    pub fn objects(&self) -> &[RuntimeObject] {
        &self.objects
    }

    pub fn add_camera(&mut self, path: &str, camera: SceneCamera) {
        match self.cameras.iter_mut().find(|(p, _)| p == path) {
            Some((_, existing)) => *existing = camera,
            None => self.cameras.push((path.to_string(), camera)),
        }
    }

    pub fn remove_camera(&mut self, path: &str) {
        self.cameras.retain(|(p, _)| p != path);
    }

    pub fn object_bound(&self, path: &str) -> Option<Aabb> {
        self.objects
            .iter()
            .find(|object| object.path == path)
            .map(object_aabb)
    }
}

pub(crate) fn object_aabb(object: &RuntimeObject) -> Aabb {
    Aabb::from_center_extent(object.center.into(), object.extent.into())
}

impl Stage for SceneRuntime {
    fn bounds(&self) -> SceneBound {
        let range = self
            .objects
            .iter()
            .map(object_aabb)
            .fold(Aabb::EMPTY, |acc, bbox| acc.union(&bbox));
        SceneBound::aligned(range)
    }

    fn is_z_up(&self) -> bool {
        self.z_up
    }

    fn scene_camera(&self, path: &str) -> Option<SceneCamera> {
        self.cameras
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, camera)| camera.clone())
    }
}
