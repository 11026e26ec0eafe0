pub mod backend;
pub mod headless;
pub mod opengl;
pub mod winit_window;

pub use backend::GraphicsBackend;
