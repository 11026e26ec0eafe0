//! Engine settings, read from a TOML file.
//!
//! Every field has a default, so a partial (or empty) file is valid:
//!
//! ```toml
//! max_frame_rate = 60
//! mesh_file = "Building.obj"
//!
//! [window]
//! title = "proto_gl"
//! width = 1024
//! height = 768
//!
//! [camera]
//! field_of_view = 90.0
//! position = [10.0, 8.0, 3.0]
//! ```

use std::path::{Path, PathBuf};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::math::Positioned;
use crate::core::rendering::camera::{
    Camera, CameraError, DEFAULT_FAR_PLANE, DEFAULT_FIELD_OF_VIEW, DEFAULT_NEAR_PLANE,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file")]
    Parse(#[from] toml::de::Error),
    #[error("window size must be non-zero, got {width}x{height}")]
    ZeroWindowSize { width: u32, height: u32 },
    #[error("invalid camera settings")]
    Camera(#[from] CameraError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        WindowConfig {
            title: "proto_gl".to_string(),
            width: 1024,
            height: 768,
            vsync: true,
        }
    }
}

impl WindowConfig {
    #[inline(always)]
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Horizontal, in degrees
    pub field_of_view: f32,
    pub near_plane: f32,
    pub far_plane: f32,
    pub position: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        CameraConfig {
            field_of_view: DEFAULT_FIELD_OF_VIEW,
            near_plane: DEFAULT_NEAR_PLANE,
            far_plane: DEFAULT_FAR_PLANE,
            position: Vec3::new(10.0, 8.0, 3.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub window: WindowConfig,
    /// Frames per second cap, 0 for none
    pub max_frame_rate: u32,
    pub clear_color: Vec4,
    /// Directory meshes and shaders are loaded from
    pub resource_dir: PathBuf,
    pub mesh_file: String,
    pub camera: CameraConfig,
    /// Startup fails if the driver lacks any of these
    pub required_extensions: Vec<String>,
    /// `env_logger` filter, overriding `RUST_LOG`
    pub log_filter: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            window: WindowConfig::default(),
            max_frame_rate: 60,
            clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
            resource_dir: PathBuf::from("resources"),
            mesh_file: "cube.obj".to_string(),
            camera: CameraConfig::default(),
            required_extensions: vec![],
            log_filter: None,
        }
    }
}

impl EngineConfig {
    /// Read and validate a config file. A missing file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::ZeroWindowSize {
                width: self.window.width,
                height: self.window.height,
            });
        }
        self.camera()?;
        Ok(())
    }

    #[inline(always)]
    pub fn mesh_path(&self) -> PathBuf {
        self.resource_dir.join(&self.mesh_file)
    }

    /// Camera with the configured lens looking at the origin, matrices
    /// already computed
    pub fn camera(&self) -> Result<Camera, ConfigError> {
        let mut camera = Camera::with_lens(self.camera.field_of_view, self.window.aspect_ratio())?;
        camera.set_clipping_planes(self.camera.near_plane, self.camera.far_plane)?;
        camera.set_position(self.camera.position);
        camera.look_at(Vec3::ZERO);
        camera.update_matrices()?;
        Ok(camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            max_frame_rate = 0
            required_extensions = ["GL_EXT_texture_compression_s3tc"]

            [window]
            width = 800
            height = 800

            [camera]
            position = [1.0, 2.0, 3.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.max_frame_rate, 0);
        assert_eq!(config.window.title, WindowConfig::default().title);
        assert_eq!(config.window.aspect_ratio(), 1.0);
        assert_eq!(config.camera.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(config.camera.far_plane, DEFAULT_FAR_PLANE);
        assert_eq!(config.required_extensions.len(), 1);
    }

    #[test]
    fn test_invalid_settings_are_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("[window]\nheight = 0"),
            Err(ConfigError::ZeroWindowSize { .. })
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[camera]\nfield_of_view = 180.0"),
            Err(ConfigError::Camera(CameraError::InvalidFieldOfView(_)))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("[camera]\nnear_plane = 10.0\nfar_plane = 1.0"),
            Err(ConfigError::Camera(CameraError::InvalidClippingPlanes { .. }))
        ));
        assert!(matches!(
            EngineConfig::from_toml_str("max_frame_rate = \"fast\""),
            Err(ConfigError::Parse(_))
        ));
        // Sitting on the point it looks at
        assert!(matches!(
            EngineConfig::from_toml_str("[camera]\nposition = [0.0, 0.0, 0.0]"),
            Err(ConfigError::Camera(CameraError::DegenerateView { .. }))
        ));
    }

    #[test]
    fn test_missing_file_is_reported() {
        assert!(matches!(
            EngineConfig::load("does/not/exist.toml"),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_sandbox_config_requires_extensions() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../sandbox/config.toml");
        let config = EngineConfig::load(path).unwrap();
        assert!(config
            .required_extensions
            .iter()
            .any(|extension| extension == "GL_EXT_texture_compression_s3tc"));
        assert!(config.mesh_path().ends_with("cube.obj"));
    }
}
