//! Stage view controller
//!
//! Owns the free camera and everything that decides which camera drives the
//! view: the selected scene camera, the presentation settings, and the last
//! resolved frustum. Pointer input is turned into camera gestures or picks
//! here; the scene and the renderer are reached through the [`Stage`] and
//! [`IntersectionTest`] seams.

mod input;

pub use input::{Gesture, Modifiers, PointerButton};

use glam::DVec2;

use crate::config::{ViewSettings, ViewerConfig};
use crate::render::{
    build_pick_frustum, closest_visible_point, pick, viewport_aspect, CameraChanges,
    CameraSource, ClippingConfig, Frustum, IntersectionTest, Lens, OrbitCamera, PickHit,
    ResolvedFrustum, ViewResolver, WindowPolicy,
};
use crate::scene::{ray_distance, SceneBound, SceneCamera, Stage};

/// Degrees of orbit per pixel of drag.
const TUMBLE_SPEED: f64 = 0.25;
/// Fractional zoom per pixel of drag.
const ZOOM_SPEED: f64 = 0.002;
const DEFAULT_VIEWPORT: f64 = 460.0;

#[derive(Debug, Clone, PartialEq)]
pub enum PickOutcome {
    Selected(PickHit),
    /// Nothing under the pointer, or the pointer was outside the image.
    Deselected,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    gesture: Gesture,
    last: DVec2,
}

pub struct StageView<S, R> {
    stage: S,
    renderer: R,
    settings: ViewSettings,
    clipping: ClippingConfig,
    free_camera: OrbitCamera,
    camera_path: Option<String>,
    resolver: ViewResolver,
    bbox: SceneBound,
    is_z_up: bool,
    viewport: DVec2,
    drag: Option<DragState>,
}

fn new_free_camera(is_z_up: bool, settings: &ViewSettings, clipping: ClippingConfig) -> OrbitCamera {
    let aspect_ratio = if settings.lock_free_camera_aspect {
        settings.free_camera_aspect
    } else {
        1.0
    };
    OrbitCamera::new(is_z_up, settings.free_camera_fov, aspect_ratio)
        .with_clipping_config(clipping)
        .with_overrides(
            settings.free_camera_override_near,
            settings.free_camera_override_far,
        )
}

impl<S: Stage, R: IntersectionTest> StageView<S, R> {
    pub fn new(stage: S, renderer: R, config: ViewerConfig) -> Self {
        let is_z_up = stage.is_z_up();
        let bbox = stage.bounds();
        let free_camera = new_free_camera(is_z_up, &config.view, config.clipping);
        Self {
            stage,
            renderer,
            settings: config.view,
            clipping: config.clipping,
            free_camera,
            camera_path: None,
            resolver: ViewResolver::new(),
            bbox,
            is_z_up,
            viewport: DVec2::splat(DEFAULT_VIEWPORT),
            drag: None,
        }
    }

    /// Swap in a new stage. The free camera starts over from the settings.
    pub fn stage_replaced(&mut self, stage: S) {
        self.stage = stage;
        self.is_z_up = self.stage.is_z_up();
        self.bbox = self.stage.bounds();
        self.camera_path = None;
        self.drag = None;
        self.resolver.reset();
        self.free_camera = new_free_camera(self.is_z_up, &self.settings, self.clipping);
        log::info!(
            "Stage replaced ({}-up), free camera reset",
            if self.is_z_up { "z" } else { "y" }
        );
    }

    pub fn stage(&self) -> &S {
        &self.stage
    }

    /// Call [`Self::recompute_bounds`] after edits that move geometry.
    pub fn stage_mut(&mut self) -> &mut S {
        &mut self.stage
    }

    pub fn recompute_bounds(&mut self) {
        self.bbox = self.stage.bounds();
    }

    pub fn bounds(&self) -> &SceneBound {
        &self.bbox
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport = DVec2::new(width, height);
    }

    pub fn viewport_size(&self) -> DVec2 {
        self.viewport
    }

    pub fn settings(&self) -> &ViewSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ViewSettings) {
        let auto_clip_enabled =
            settings.auto_compute_clipping_planes && !self.settings.auto_compute_clipping_planes;
        if !settings.auto_compute_clipping_planes {
            self.free_camera.clear_closest_visible_dist();
        }
        self.settings = settings;
        self.free_camera
            .set_override_near(self.settings.free_camera_override_near);
        self.free_camera
            .set_override_far(self.settings.free_camera_override_far);

        if auto_clip_enabled {
            if self.camera_path.is_some() {
                self.switch_to_free_camera(true);
            } else {
                self.compute_and_set_closest_distance();
            }
        }
    }

    pub fn free_camera(&self) -> &OrbitCamera {
        &self.free_camera
    }

    pub fn free_camera_mut(&mut self) -> &mut OrbitCamera {
        &mut self.free_camera
    }

    pub fn take_camera_changes(&mut self) -> CameraChanges {
        self.free_camera.take_changes()
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ResolvedFrustum) + 'static) {
        self.resolver.subscribe(listener);
    }

    pub fn last_resolved(&self) -> Option<&ResolvedFrustum> {
        self.resolver.last()
    }

    pub fn scene_camera_path(&self) -> Option<&str> {
        self.camera_path.as_deref()
    }

    /// Look through the camera at `path`, or hand control back to the free
    /// camera with `None`.
    pub fn set_scene_camera(&mut self, path: Option<&str>) {
        match path {
            Some(path) => {
                log::info!("Viewing through scene camera {path}");
                self.camera_path = Some(path.to_string());
            }
            None => self.switch_to_free_camera(true),
        }
    }

    fn active_scene_camera(&self) -> Option<SceneCamera> {
        let path = self.camera_path.as_deref()?;
        match self.stage.scene_camera(path) {
            Some(camera) if camera.active => Some(camera),
            Some(_) => None,
            None => {
                log::debug!("Scene camera {path} is gone; falling back to the free camera");
                None
            }
        }
    }

    pub fn has_locked_aspect_ratio(&self) -> bool {
        self.active_scene_camera().is_some() || self.settings.lock_free_camera_aspect
    }

    /// Resolve this frame's frustum. A selected scene camera that is missing
    /// or inactive hands over to the free camera.
    pub fn resolve(&mut self) -> (ResolvedFrustum, bool) {
        if let Some(camera) = self.active_scene_camera() {
            return self
                .resolver
                .resolve(CameraSource::Scene(&camera.lens), self.viewport, &self.settings);
        }

        // A stale handoff samples the closest distance after the one resolve.
        let switched = self.camera_path.is_some();
        self.switch_to_free_camera(false);
        let resolved = self.resolver.resolve(
            CameraSource::Free {
                camera: &mut self.free_camera,
                bound: &self.bbox,
                auto_clip: self.settings.auto_compute_clipping_planes,
            },
            self.viewport,
            &self.settings,
        );
        if switched {
            self.sample_closest_distance(&resolved.0.frustum);
        }
        resolved
    }

    /// Leave the scene camera, continuing from where it was looking.
    pub fn switch_to_free_camera(&mut self, compute_closest_distance: bool) {
        if self.camera_path.is_none() {
            return;
        }

        // The scene camera may be gone already, so start from what was last seen.
        let mut camera = match self.resolver.last() {
            Some(last) => {
                let mut lens = last.lens;
                // Authored cameras often leave focus distance at 0; orbit the stage instead.
                let bounded = !self.bbox.is_empty() && !self.bbox.is_unbounded();
                if lens.focus_distance <= 0.0 && bounded {
                    let frustum = lens.frustum();
                    let centroid = self.bbox.centroid();
                    lens.focus_distance =
                        ray_distance(frustum.position, frustum.view_direction(), centroid);
                }
                OrbitCamera::from_lens(lens, self.is_z_up).with_clipping_config(self.clipping)
            }
            None => new_free_camera(self.is_z_up, &self.settings, self.clipping),
        };

        if self.settings.lock_free_camera_aspect {
            let last_aspect = self
                .resolver
                .last_aspect()
                .unwrap_or_else(|| camera.aspect_ratio());
            if last_aspect > 0.0 {
                if last_aspect < camera.aspect_ratio() {
                    camera.set_horizontal_aperture(last_aspect * camera.vertical_aperture());
                } else {
                    camera.set_vertical_aperture(camera.horizontal_aperture() / last_aspect);
                }
            } else {
                log::warn!("Last camera had a degenerate aspect ratio; not locking to it");
            }
        }

        // Overrides persist across camera switches.
        camera.set_override_near(self.settings.free_camera_override_near);
        camera.set_override_far(self.settings.free_camera_override_far);
        self.free_camera = camera;
        self.camera_path = None;
        log::info!("Switched to the free camera");

        if compute_closest_distance {
            self.compute_and_set_closest_distance();
        }
    }

    /// Center the free camera on `bound`. Degenerate bounds are ignored.
    pub fn frame_selection(&mut self, bound: &SceneBound) {
        let range = bound.aligned_range();
        if range.is_empty() || range.min == range.max {
            log::warn!("Nothing to frame");
            return;
        }
        self.switch_to_free_camera(false);
        self.free_camera.frame_selection(bound, self.settings.frame_fit);
        if self.settings.auto_compute_clipping_planes {
            self.compute_and_set_closest_distance();
        }
    }

    pub fn frame_all(&mut self) {
        let bbox = self.bbox;
        self.frame_selection(&bbox);
    }

    pub fn handle_press(
        &mut self,
        button: PointerButton,
        modifiers: Modifiers,
        position: DVec2,
    ) -> Option<PickOutcome> {
        let gesture = Gesture::classify(button, modifiers);
        self.drag = Some(DragState {
            gesture,
            last: position,
        });
        if gesture.moves_camera() {
            self.switch_to_free_camera(true);
            None
        } else {
            Some(self.pick_object(position))
        }
    }

    /// Apply the active drag gesture. Returns true if the camera moved.
    pub fn handle_drag(&mut self, position: DVec2) -> bool {
        let Some(drag) = self.drag.as_mut() else {
            return false;
        };
        let delta = position - drag.last;
        if delta == DVec2::ZERO {
            return false;
        }
        drag.last = position;
        let (dx, dy) = (delta.x, delta.y);

        let camera = &mut self.free_camera;
        match drag.gesture {
            Gesture::Tumble => camera.tumble(TUMBLE_SPEED * dx, TUMBLE_SPEED * dy),
            Gesture::Zoom => {
                let zoom_delta = -ZOOM_SPEED * (dx + dy);
                if camera.is_orthographic() {
                    // Orthographic fov is the view height in world units.
                    let fov = camera.fov();
                    camera.set_fov(fov * (1.0 + zoom_delta));
                } else {
                    camera.adjust_distance(1.0 + zoom_delta);
                }
            }
            Gesture::Truck => {
                let factor = camera.pixels_to_world(self.viewport.y);
                camera.truck(-dx * factor, dy * factor);
            }
            Gesture::Walk => {
                let factor = camera.pixels_to_world(self.viewport.y);
                camera.walk(-dy * factor, dx * factor);
            }
            Gesture::Pick => return false,
        }
        true
    }

    pub fn handle_release(&mut self) {
        self.drag = None;
    }

    pub fn handle_scroll(&mut self, delta: f64) {
        self.switch_to_free_camera(true);
        let step = (delta / 1000.0).clamp(-0.5, 0.5);
        self.free_camera.adjust_distance(1.0 - step);
    }

    /// Pick under `position` in window pixels.
    pub fn pick_object(&mut self, position: DVec2) -> PickOutcome {
        let (resolved, _) = self.resolve();
        let picked = build_pick_frustum(&resolved, position);
        if !picked.in_bounds {
            log::debug!("Pick at {position} is outside the image; deselecting");
            return PickOutcome::Deselected;
        }
        match pick(&picked.frustum, &mut self.renderer) {
            Some(hit) => {
                log::info!("Picked {} at {}", hit.path, hit.point);
                PickOutcome::Selected(hit)
            }
            None => PickOutcome::Deselected,
        }
    }

    /// Sample the closest visible surface and hand it to the free camera.
    pub fn compute_and_set_closest_distance(&mut self) {
        if self.active_scene_camera().is_some() {
            return;
        }
        let (resolved, _) = self.resolve();
        self.sample_closest_distance(&resolved.frustum);
    }

    fn sample_closest_distance(&mut self, frustum: &Frustum) {
        let sel_size = self.free_camera.sel_size();
        let point = closest_visible_point(frustum, sel_size, &self.clipping, &mut self.renderer);
        if let Some(point) = point {
            self.free_camera.set_closest_visible_dist_from_point(point);
        }
    }

    /// The free camera as it would be exported for a `width` x `height`
    /// image: default clipping, matched vertically to the image aspect.
    /// `None` while a scene camera is selected.
    pub fn export_free_camera(&mut self, width: f64, height: f64) -> Option<Lens> {
        if self.camera_path.is_some() {
            return None;
        }
        let mut lens = self.free_camera.compute_lens(&self.bbox, false);
        lens.conform_window(WindowPolicy::MatchVertically, viewport_aspect(width, height));
        Some(lens)
    }
}
