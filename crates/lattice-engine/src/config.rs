use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Initialization constants for the instanced cube renderer.
///
/// Every field has a default matching the reference scene (100 cubes on a
/// 10×10 grid, fixed camera looking down +Z at the origin). Missing TOML keys
/// fall back to these defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Number of cube instances. Fixed for the lifetime of the renderer.
    pub instance_count: usize,

    /// Distance between neighbouring grid cells, in world units.
    pub grid_spacing: f32,

    pub camera_eye: [f32; 3],
    pub camera_target: [f32; 3],
    pub camera_up: [f32; 3],

    /// Vertical field of view in degrees.
    pub fov_y_degrees: f32,
    pub near_plane: f32,
    pub far_plane: f32,

    /// Direction towards the light. Normalized every frame before upload.
    pub light_direction: [f32; 3],

    /// Linear RGBA clear color.
    pub clear_color: [f64; 4],

    /// MSAA sample count for the color and depth attachments (1 or 4).
    pub sample_count: u32,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            instance_count: 100,
            grid_spacing: 3.0,
            camera_eye: [1.0, 4.0, -46.0],
            camera_target: [0.0, 0.0, 0.0],
            camera_up: [0.0, 1.0, 0.0],
            fov_y_degrees: 30.0,
            near_plane: 0.5,
            far_plane: 100.0,
            light_direction: [1.0, 8.0, -10.0],
            clear_color: [0.0, 0.0, 0.0, 0.0],
            sample_count: 1,
        }
    }
}

impl RendererConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(src: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&src)
    }

    /// Rejects values the renderer cannot draw with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.instance_count == 0 {
            return Err(invalid("instance_count", "must be at least 1"));
        }
        if !(self.grid_spacing.is_finite() && self.grid_spacing > 0.0) {
            return Err(invalid("grid_spacing", format!("must be positive, got {}", self.grid_spacing)));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(invalid(
                "fov_y_degrees",
                format!("must be in (0, 180), got {}", self.fov_y_degrees),
            ));
        }
        if !(self.near_plane > 0.0) {
            return Err(invalid("near_plane", format!("must be positive, got {}", self.near_plane)));
        }
        if !(self.far_plane > self.near_plane) {
            return Err(invalid(
                "far_plane",
                format!("must exceed near_plane ({}), got {}", self.near_plane, self.far_plane),
            ));
        }
        if self.light_direction.iter().all(|c| *c == 0.0) {
            return Err(invalid("light_direction", "must be non-zero"));
        }
        if self.camera_eye == self.camera_target {
            return Err(invalid("camera_eye", "must differ from camera_target"));
        }
        if !matches!(self.sample_count, 1 | 4) {
            return Err(invalid("sample_count", format!("must be 1 or 4, got {}", self.sample_count)));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field, reason: reason.into() }
}
