pub use crate::core::assets_management::models::{load_obj, parse_obj, MeshGeometry, ModelError};
pub use crate::core::config::{ConfigError, EngineConfig};
pub use crate::core::input::InputManager;
pub use crate::core::logging::{init_logging, LoggingConfig};
pub use crate::core::math::{Entity, Positioned, TransformMatrix};
pub use crate::core::platform::backend::{
    BufferTarget, BufferUsage, GlError, GraphicsBackend, StorageFlags,
};
pub use crate::core::platform::headless::HeadlessBackend;
pub use crate::core::platform::winit_window::{GlWindow, WindowError};
pub use crate::core::rendering::camera::{Camera, CameraError, LookDirection};
pub use crate::core::rendering::diagnostics::{
    check_compatibility, check_for_errors, log_driver_info,
};
pub use crate::core::rendering::drawable::Drawable;
pub use crate::core::rendering::gpu_buffer::{BufferError, GpuBuffer, StorageKind};
pub use crate::core::rendering::object::{Object, TexturedObject};
pub use crate::core::rendering::shader::{ShaderHandle, ShaderLibrary};
pub use crate::core::rendering::{RenderError, Renderer};
pub use crate::core::time::{FrameLimiter, Time};
