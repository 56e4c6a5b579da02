//! Stage view - headless camera session
//!
//! Builds a small in-memory stage and drives the view through a scripted
//! series of camera gestures, picks and camera switches, logging every
//! resolved frustum. Pass a JSON config path to override the defaults:
//!
//! ```text
//! stageview [config.json]
//! ```

use glam::{DMat4, DVec2, DVec3};
use stageview::render::{Lens, ResolvedFrustum};
use stageview::scene::{BoundsRaycaster, RuntimeObject, SceneCamera, SceneRuntime};
use stageview::{load_config, Modifiers, PickOutcome, PointerButton, StageView, ViewerConfig};
use std::path::PathBuf;

const SHOT_CAMERA: &str = "/Cameras/Shot";

fn demo_stage() -> SceneRuntime {
    let mut stage = SceneRuntime::new(false);
    stage.push(RuntimeObject {
        path: "/World/Ground".to_string(),
        center: [0.0, -0.05, 0.0],
        extent: [40.0, 0.1, 40.0],
    });
    stage.push(RuntimeObject {
        path: "/World/Crate".to_string(),
        center: [0.0, 1.0, 0.0],
        extent: [2.0, 2.0, 2.0],
    });
    stage.push(RuntimeObject {
        path: "/World/Tower".to_string(),
        center: [8.0, 5.0, -6.0],
        extent: [2.0, 10.0, 2.0],
    });

    let mut lens = Lens::default();
    lens.set_perspective_from_aspect_and_fov(2.39, 35.0);
    lens.transform = DMat4::look_at_rh(DVec3::new(12.0, 4.0, 12.0), DVec3::ZERO, DVec3::Y).inverse();
    lens.focus_distance = DVec3::new(12.0, 4.0, 12.0).length();
    stage.add_camera(SHOT_CAMERA, SceneCamera { lens, active: true });
    stage
}

fn load_viewer_config() -> ViewerConfig {
    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        return ViewerConfig::default();
    };
    match load_config(&path) {
        Ok(config) => {
            log::info!("Loaded config from {}", path.display());
            config
        }
        Err(err) => {
            log::warn!("Failed to load config {}: {}; using defaults", path.display(), err);
            ViewerConfig::default()
        }
    }
}

fn describe(resolved: &ResolvedFrustum) -> String {
    let frustum = &resolved.frustum;
    format!(
        "{} camera at {:.3}, looking {:.3}, near/far {:.4}/{:.1}, policy {:?}",
        if resolved.camera_was_scene { "scene" } else { "free" },
        frustum.position,
        frustum.view_direction(),
        frustum.near,
        frustum.far,
        resolved.window_policy,
    )
}

fn report_pick(outcome: Option<PickOutcome>) {
    match outcome {
        Some(PickOutcome::Selected(hit)) => {
            log::info!("Selected {} (normal {:.2})", hit.path, hit.normal)
        }
        Some(PickOutcome::Deselected) => log::info!("Selection cleared"),
        None => {}
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let config = load_viewer_config();
    let stage = demo_stage();
    let raycaster = BoundsRaycaster::from_runtime(&stage);
    let mut view = StageView::new(stage, raycaster, config);
    view.set_viewport_size(1280.0, 720.0);
    view.subscribe(|resolved| log::info!("Frustum changed: {}", describe(resolved)));

    let center = DVec2::new(640.0, 360.0);
    let alt = Modifiers {
        alt: true,
        ..Modifiers::default()
    };

    view.frame_all();
    view.resolve();

    // Orbit, pan and dolly.
    view.handle_press(PointerButton::Left, alt, center);
    view.handle_drag(center + DVec2::new(80.0, -40.0));
    view.handle_release();
    view.resolve();

    view.handle_press(PointerButton::Middle, alt, center);
    view.handle_drag(center + DVec2::new(-25.0, 10.0));
    view.handle_release();
    view.resolve();

    view.handle_scroll(240.0);
    view.resolve();
    let changes = view.take_camera_changes();
    log::info!(
        "Free camera: distance {:.3}, theta {:.1}, phi {:.1} (moved: {}, lens edited: {})",
        view.free_camera().distance(),
        view.free_camera().rot_theta(),
        view.free_camera().rot_phi(),
        changes.frustum,
        changes.settings,
    );

    report_pick(view.handle_press(PointerButton::Left, Modifiers::default(), center));
    view.handle_release();

    // Look through the shot camera with an opaque mask, then click in the bars.
    let mut settings = view.settings().clone();
    settings.show_mask = true;
    settings.show_mask_opaque = true;
    view.set_settings(settings);
    view.set_scene_camera(Some(SHOT_CAMERA));
    view.resolve();
    report_pick(view.handle_press(PointerButton::Left, Modifiers::default(), DVec2::new(640.0, 10.0)));
    view.handle_release();

    // Deleting the camera hands control back to the free camera.
    view.stage_mut().remove_camera(SHOT_CAMERA);
    view.resolve();

    // New geometry only counts once bounds are recomputed.
    view.stage_mut().push(RuntimeObject {
        path: "/World/Beacon".to_string(),
        center: [-15.0, 3.0, 10.0],
        extent: [1.0, 6.0, 1.0],
    });
    view.recompute_bounds();
    view.frame_all();
    view.resolve();
    if let Some(resolved) = view.last_resolved() {
        log::info!(
            "Renderer matrices:\n  view {:.3}\n  projection {:.3}",
            resolved.view_matrix(),
            resolved.projection_matrix()
        );
    }

    if let Some(lens) = view.export_free_camera(1920.0, 1080.0) {
        log::info!(
            "Exported free camera: aspect {:.4}, focal length {:.3}, clipping {:?}",
            lens.aspect_ratio(),
            lens.focal_length,
            lens.clipping_range,
        );
    }
}
