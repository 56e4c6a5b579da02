//! Per-frame camera resolution: pick the authored or the free camera, conform
//! it to the viewport, and report when the result differs from last frame.

use glam::{DMat4, DVec2};

use super::camera::OrbitCamera;
use super::frustum::Frustum;
use super::lens::Lens;
use super::window::{viewport_aspect, WindowPolicy};
use crate::config::ViewSettings;
use crate::scene::SceneBound;

/// The camera that drives this frame.
pub enum CameraSource<'a> {
    /// An active authored camera, used as is.
    Scene(&'a Lens),
    /// The user's orbit camera, with the bound used for auto clipping.
    Free {
        camera: &'a mut OrbitCamera,
        bound: &'a SceneBound,
        auto_clip: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedFrustum {
    /// Lens after window conformance.
    pub lens: Lens,
    pub frustum: Frustum,
    /// Aspect ratio of the camera before conformance.
    pub camera_aspect: f64,
    pub camera_was_scene: bool,
    pub window_policy: WindowPolicy,
    /// The image is drawn into the camera's sub-rectangle of the window.
    pub crop_to_camera_viewport: bool,
    /// Window size in pixels this frustum was resolved for.
    pub viewport: DVec2,
}

impl ResolvedFrustum {
    pub fn view_matrix(&self) -> DMat4 {
        self.frustum.view_matrix()
    }

    pub fn projection_matrix(&self) -> DMat4 {
        self.frustum.projection_matrix()
    }
}

pub type FrustumListener = Box<dyn FnMut(&ResolvedFrustum)>;

#[derive(Default)]
pub struct ViewResolver {
    last: Option<ResolvedFrustum>,
    listeners: Vec<FrustumListener>,
}

impl ViewResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once for every resolve whose frustum differs from the previous one.
    pub fn subscribe(&mut self, listener: impl FnMut(&ResolvedFrustum) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn last(&self) -> Option<&ResolvedFrustum> {
        self.last.as_ref()
    }

    /// Camera aspect of the last resolve, before conformance.
    pub fn last_aspect(&self) -> Option<f64> {
        self.last.as_ref().map(|resolved| resolved.camera_aspect)
    }

    /// Forget the previous frame, so the next resolve always notifies.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Resolve the frame's frustum for a `viewport` of the given pixel size.
    /// Returns the result and whether it differs from the previous one.
    pub fn resolve(
        &mut self,
        source: CameraSource<'_>,
        viewport: DVec2,
        settings: &ViewSettings,
    ) -> (ResolvedFrustum, bool) {
        let (mut lens, camera_was_scene) = match source {
            CameraSource::Scene(lens) => (*lens, true),
            CameraSource::Free {
                camera,
                bound,
                auto_clip,
            } => (camera.compute_lens(bound, auto_clip), false),
        };

        let has_locked_aspect = camera_was_scene || settings.lock_free_camera_aspect;
        let camera_aspect = lens.aspect_ratio();
        let target_aspect = viewport_aspect(viewport.x, viewport.y);
        let window_policy = settings.window_policy(has_locked_aspect, target_aspect, camera_aspect);
        let crop_to_camera_viewport = settings.crop_image_to_camera_viewport(has_locked_aspect);

        // Cropping shrinks the viewport instead of reshaping the frustum.
        if !crop_to_camera_viewport {
            lens.conform_window(window_policy, target_aspect);
        }

        let resolved = ResolvedFrustum {
            lens,
            frustum: lens.frustum(),
            camera_aspect,
            camera_was_scene,
            window_policy,
            crop_to_camera_viewport,
            viewport,
        };

        let changed = self
            .last
            .as_ref()
            .map_or(true, |last| last.frustum != resolved.frustum);
        self.last = Some(resolved);
        if changed {
            log::debug!(
                "Frustum changed: scene camera {}, policy {:?}, near/far {:?}",
                camera_was_scene,
                window_policy,
                lens.clipping_range
            );
            for listener in &mut self.listeners {
                listener(&resolved);
            }
        }
        (resolved, changed)
    }
}
