use crate::render::{ClippingConfig, WindowPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Viewer-level camera preferences and presentation toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewSettings {
    pub free_camera_fov: f64,
    pub free_camera_aspect: f64,
    pub lock_free_camera_aspect: bool,
    pub free_camera_override_near: Option<f64>,
    pub free_camera_override_far: Option<f64>,
    pub auto_compute_clipping_planes: bool,
    pub show_mask: bool,
    pub show_mask_opaque: bool,
    pub show_mask_outline: bool,
    pub show_reticles_inside: bool,
    pub show_reticles_outside: bool,
    pub frame_fit: f64,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            free_camera_fov: 60.0,
            free_camera_aspect: 1.0,
            lock_free_camera_aspect: false,
            free_camera_override_near: None,
            free_camera_override_far: None,
            auto_compute_clipping_planes: false,
            show_mask: false,
            show_mask_opaque: true,
            show_mask_outline: false,
            show_reticles_inside: false,
            show_reticles_outside: false,
            frame_fit: 1.1,
        }
    }
}

impl ViewSettings {
    pub fn show_reticles(&self, has_locked_aspect: bool) -> bool {
        (self.show_reticles_inside || self.show_reticles_outside) && has_locked_aspect
    }

    /// Camera guides need the whole camera frame on screen.
    pub fn fit_camera_in_viewport(&self, has_locked_aspect: bool) -> bool {
        (self.show_mask || self.show_mask_outline || self.show_reticles(has_locked_aspect))
            && has_locked_aspect
    }

    /// An opaque mask hides everything outside the camera frame, so the
    /// image is rendered into that sub-rectangle only.
    pub fn crop_image_to_camera_viewport(&self, has_locked_aspect: bool) -> bool {
        self.show_mask && self.show_mask_opaque && has_locked_aspect
    }

    pub fn window_policy(
        &self,
        has_locked_aspect: bool,
        target_aspect: f64,
        camera_aspect: f64,
    ) -> WindowPolicy {
        if !has_locked_aspect {
            return WindowPolicy::MatchVertically;
        }
        if self.crop_image_to_camera_viewport(has_locked_aspect) {
            if target_aspect < camera_aspect {
                WindowPolicy::MatchHorizontally
            } else {
                WindowPolicy::MatchVertically
            }
        } else if self.fit_camera_in_viewport(has_locked_aspect) {
            WindowPolicy::Fit
        } else {
            WindowPolicy::MatchVertically
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub clipping: ClippingConfig,
    pub view: ViewSettings,
}

impl ViewerConfig {
    pub fn validate(&self) -> Result<()> {
        let clipping = &self.clipping;
        let positive = [
            ("clipping.default_near", clipping.default_near),
            ("clipping.default_far", clipping.default_far),
            ("clipping.max_good_z_resolution", clipping.max_good_z_resolution),
            ("clipping.max_safe_z_resolution", clipping.max_safe_z_resolution),
            ("view.free_camera_fov", self.view.free_camera_fov),
            ("view.free_camera_aspect", self.view.free_camera_aspect),
            ("view.frame_fit", self.view.frame_fit),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if clipping.default_far <= clipping.default_near {
            return Err(ConfigError::Invalid(format!(
                "clipping.default_far ({}) must exceed clipping.default_near ({})",
                clipping.default_far, clipping.default_near
            )));
        }
        Ok(())
    }
}

pub fn save_config(config: &ViewerConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn load_config(path: &Path) -> Result<ViewerConfig> {
    let json = std::fs::read_to_string(path)?;
    let config: ViewerConfig = serde_json::from_str(&json)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.clipping.default_near, 1.0);
        assert_eq!(config.clipping.default_far, 2_000_000.0);
        assert_eq!(config.view.free_camera_fov, 60.0);
        assert_eq!(config.view.frame_fit, 1.1);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{ "view": { "lock_free_camera_aspect": true, "free_camera_override_near": 0.5 } }"#;
        let config: ViewerConfig = serde_json::from_str(json).unwrap();
        assert!(config.view.lock_free_camera_aspect);
        assert_eq!(config.view.free_camera_override_near, Some(0.5));
        assert_eq!(config.view.free_camera_override_far, None);
        assert_eq!(config.clipping, ClippingConfig::default());
    }

    #[test]
    fn rejects_inverted_default_range() {
        let mut config = ViewerConfig::default();
        config.clipping.default_far = 0.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn rejects_non_positive_frame_fit() {
        let mut config = ViewerConfig::default();
        config.view.frame_fit = 0.0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn save_load_via_file() {
        let mut config = ViewerConfig::default();
        config.view.show_mask = true;
        config.view.free_camera_override_far = Some(1000.0);
        config.clipping.max_good_z_resolution = 1e4;

        let path = std::env::temp_dir().join(format!(
            "stageview_config_test_{}.json",
            std::process::id()
        ));
        save_config(&config, &path).unwrap();
        let loaded = load_config(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join("stageview_config_does_not_exist.json");
        assert!(matches!(load_config(&path), Err(ConfigError::Io(_))));
    }

    #[test]
    fn predicates_require_locked_aspect() {
        let settings = ViewSettings {
            show_mask: true,
            show_reticles_inside: true,
            ..ViewSettings::default()
        };
        assert!(!settings.show_reticles(false));
        assert!(!settings.fit_camera_in_viewport(false));
        assert!(!settings.crop_image_to_camera_viewport(false));
        assert!(settings.show_reticles(true));
        assert!(settings.fit_camera_in_viewport(true));
        assert!(settings.crop_image_to_camera_viewport(true));
    }

    #[test]
    fn window_policy_table() {
        let plain = ViewSettings::default();
        assert_eq!(plain.window_policy(true, 1.0, 2.0), WindowPolicy::MatchVertically);

        let outline = ViewSettings {
            show_mask_outline: true,
            ..ViewSettings::default()
        };
        assert_eq!(outline.window_policy(true, 1.0, 2.0), WindowPolicy::Fit);
        assert_eq!(outline.window_policy(false, 1.0, 2.0), WindowPolicy::MatchVertically);

        let cropped = ViewSettings {
            show_mask: true,
            show_mask_opaque: true,
            ..ViewSettings::default()
        };
        assert_eq!(cropped.window_policy(true, 1.0, 2.0), WindowPolicy::MatchHorizontally);
        assert_eq!(cropped.window_policy(true, 3.0, 2.0), WindowPolicy::MatchVertically);
    }
}
