//! Viewer configuration.
//!
//! Every field has a default, so an empty file (or no file at all) gives
//! the stock knot surface in an 800x800 window.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::surface::{Connectivity, MeshOptions, NormalSource, SurfaceParams, MAX_VERTICES};

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV_VAR: &str = "SURFACE_VIEWER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Knot surface".to_string(),
            width: 800,
            height: 800,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub window: WindowConfig,
    /// Light offset change per arrow key press.
    pub light_step: f32,
    pub surface: SurfaceParams,
    pub normals: NormalSource,
    pub connectivity: Connectivity,
    /// Trackball eye distance; 0 keeps the view a pure rotation.
    pub view_distance: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            light_step: 0.1,
            surface: SurfaceParams::default(),
            normals: NormalSource::default(),
            connectivity: Connectivity::default(),
            view_distance: 0.0,
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the viewer cannot render with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        let WindowConfig { width, height, .. } = self.window;
        if width == 0 || height == 0 {
            return invalid(format!("window size {width}x{height} is empty"));
        }
        if width.checked_mul(height).is_none() {
            return invalid(format!("window size {width}x{height} is too large"));
        }

        let s = &self.surface;
        if !s.step.is_finite() || s.step <= 0.0 {
            return invalid(format!("surface.step must be positive, got {}", s.step));
        }
        let values = [
            ("a", s.a),
            ("c", s.c),
            ("theta", s.theta),
            ("b", s.b),
            ("u_start", s.u_start),
            ("u_end", s.u_end),
            ("v_start", s.v_start),
            ("v_end", s.v_end),
        ];
        if let Some((name, value)) = values.iter().find(|(_, v)| !v.is_finite()) {
            return invalid(format!("surface.{name} must be finite, got {value}"));
        }
        if s.checked_grid_dims().is_none() {
            return invalid(format!("surface grid exceeds {MAX_VERTICES} vertices"));
        }

        if !self.light_step.is_finite() {
            return invalid(format!("light_step must be finite, got {}", self.light_step));
        }
        if !self.view_distance.is_finite() || self.view_distance < 0.0 {
            return invalid(format!(
                "view_distance must be finite and non-negative, got {}",
                self.view_distance
            ));
        }
        Ok(())
    }

    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads the file named by [`CONFIG_ENV_VAR`], or the defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) => {
                log::info!("loading config from {path}");
                Self::load_from_file(&path)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            normals: self.normals,
            connectivity: self.connectivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(AppConfig::from_toml_str("").unwrap(), AppConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            normals = "aliased"
            connectivity = "raw"

            [window]
            width = 400

            [surface]
            theta = 0.785
            "#,
        )
        .unwrap();

        assert_eq!(config.window.width, 400);
        assert_eq!(config.window.height, 800);
        assert_eq!(config.normals, NormalSource::Aliased);
        assert_eq!(config.connectivity, Connectivity::Raw);
        assert_eq!(config.surface.theta, 0.785);
        assert_eq!(config.surface.step, 0.1);
        assert_eq!(config.light_step, 0.1);
    }

    #[test]
    fn unknown_normal_source_is_a_parse_error() {
        let err = AppConfig::from_toml_str(r#"normals = "smooth""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    fn assert_invalid(contents: &str) {
        let err = AppConfig::from_toml_str(contents).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "{contents:?} gave {err}");
    }

    #[test]
    fn defaults_are_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn tiny_step_is_rejected() {
        assert_invalid("[surface]\nstep = 1e-300\n");
    }

    #[test]
    fn non_positive_step_is_rejected() {
        assert_invalid("[surface]\nstep = 0.0\n");
        assert_invalid("[surface]\nstep = -0.1\n");
        assert_invalid("[surface]\nstep = nan\n");
        assert_invalid("[surface]\nstep = inf\n");
    }

    #[test]
    fn non_finite_range_is_rejected() {
        assert_invalid("[surface]\nu_end = inf\n");
        assert_invalid("[surface]\nv_start = -inf\n");
        assert_invalid("[surface]\ntheta = nan\n");
    }

    #[test]
    fn grid_over_vertex_cap_is_rejected() {
        // 20000 x 20000 samples; each axis alone is under the cap.
        assert_invalid("[surface]\nstep = 0.001\n");
    }

    #[test]
    fn empty_window_is_rejected() {
        assert_invalid("[window]\nwidth = 0\n");
        assert_invalid("[window]\nheight = 0\n");
    }

    #[test]
    fn overflowing_window_is_rejected() {
        assert_invalid("[window]\nwidth = 100000\nheight = 100000\n");
    }

    #[test]
    fn negative_view_distance_is_rejected() {
        assert_invalid("view_distance = -1.0\n");
        assert_invalid("light_step = nan\n");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AppConfig::load_from_file("/nonexistent/knotview.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
