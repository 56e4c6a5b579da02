//! Camera and view resolution for an interactive 3D stage viewer.
//!
//! [`render::OrbitCamera`] holds the user-driven free camera,
//! [`render::AutoClippingPlanner`] places near/far planes,
//! [`render::ViewResolver`] picks the frame's camera and conforms it to the
//! viewport, and [`render::build_pick_frustum`] narrows the result for hit testing.
//! [`app::StageView`] ties them to pointer input.

pub mod app;
pub mod config;
pub mod render;
pub mod scene;

pub use app::{Gesture, Modifiers, PickOutcome, PointerButton, StageView};
pub use config::{load_config, save_config, ConfigError, ViewSettings, ViewerConfig};
