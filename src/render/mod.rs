mod camera;
mod clipping;
mod frustum;
mod lens;
mod pick;
mod resolve;
mod window;

pub use camera::{CameraChanges, OrbitCamera, DEFAULT_DISTANCE, DEFAULT_FOV};
pub use clipping::{
    AutoClippingPlanner, ClippingConfig, ClosestVisibleHint, DEFAULT_FAR, DEFAULT_NEAR,
    MAX_GOOD_Z_RESOLUTION, MAX_SAFE_Z_RESOLUTION,
};
pub use frustum::{Frustum, Projection};
pub use lens::{Lens, APERTURE_UNIT, FOCAL_LENGTH_UNIT};
pub use pick::{
    build_pick_frustum, camera_viewport, closest_visible_point, pick, IntersectionTest,
    PickFrustum, PickHit,
};
pub use resolve::{CameraSource, FrustumListener, ResolvedFrustum, ViewResolver};
pub use window::{conformed_window, viewport_aspect, Range2, ViewportRect, WindowPolicy};
