//! Winit window with an OpenGL 3.3 core context, exposed as a `glow::Context`.

use std::num::NonZeroU32;
use std::rc::Rc;

use glutin::config::{Config, ConfigTemplateBuilder, GlConfig};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, NotCurrentGlContext, PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};
use raw_window_handle::HasRawWindowHandle;
use thiserror::Error;
use winit::dpi::LogicalSize;
use winit::event_loop::EventLoopWindowTarget;
use winit::window::{Window, WindowBuilder};

use crate::core::config::WindowConfig;

#[derive(Debug, Error)]
pub enum WindowError {
    #[error("window size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },
    /// Display or window creation failed
    #[error("failed to create window: {0}")]
    Creation(String),
    #[error("OpenGL context error")]
    Context(#[from] glutin::error::Error),
}

pub struct GlWindow {
    window: Window,
    surface: Surface<WindowSurface>,
    context: PossiblyCurrentContext,
    gl: Rc<glow::Context>,
    vsync: bool,
}

impl GlWindow {
    pub fn new<T>(event_loop: &EventLoopWindowTarget<T>, props: &WindowConfig) -> Result<Self, WindowError> {
        let (width, height) = match (NonZeroU32::new(props.width), NonZeroU32::new(props.height)) {
            (Some(width), Some(height)) => (width, height),
            _ => {
                return Err(WindowError::ZeroSize {
                    width: props.width,
                    height: props.height,
                })
            }
        };

        let window_builder = WindowBuilder::new()
            .with_title(props.title.clone())
            .with_inner_size(LogicalSize::new(props.width, props.height))
            .with_decorations(true);

        // Window creation
        let template = ConfigTemplateBuilder::new().with_depth_size(24);
        let (window, cfg) = glutin_winit::DisplayBuilder::new()
            .with_window_builder(Some(window_builder))
            .build(event_loop, template, pick_config)
            .map_err(|err| WindowError::Creation(err.to_string()))?;
        let window = window.ok_or_else(|| WindowError::Creation("no window was built".to_string()))?;

        // Context creation
        let context_attrs = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(3, 3))))
            .build(Some(window.raw_window_handle()));
        let context = unsafe { cfg.display().create_context(&cfg, &context_attrs)? };

        let surface_attrs = SurfaceAttributesBuilder::<WindowSurface>::new()
            .with_srgb(Some(true))
            .build(window.raw_window_handle(), width, height);
        let surface = unsafe { cfg.display().create_window_surface(&cfg, &surface_attrs)? };

        let context = context.make_current(&surface)?;
        let gl = Rc::new(glow_context(&context));

        let mut gl_window = GlWindow {
            window,
            surface,
            context,
            gl,
            vsync: !props.vsync,
        };
        gl_window.set_vsync(props.vsync)?;
        log::info!(
            "Created window '{}' ({}x{})",
            props.title,
            props.width,
            props.height
        );
        Ok(gl_window)
    }

    #[inline(always)]
    pub fn gl(&self) -> &Rc<glow::Context> {
        &self.gl
    }

    #[inline(always)]
    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Inner size in physical pixels
    pub fn size(&self) -> (u32, u32) {
        let size = self.window.inner_size();
        (size.width, size.height)
    }

    #[inline(always)]
    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn set_vsync(&mut self, vsync: bool) -> Result<(), WindowError> {
        if self.vsync == vsync {
            return Ok(());
        }
        let interval = if vsync {
            SwapInterval::Wait(NonZeroU32::MIN)
        } else {
            SwapInterval::DontWait
        };
        self.surface.set_swap_interval(&self.context, interval)?;
        self.vsync = vsync;
        Ok(())
    }

    /// Resize the drawing surface. A zero sized (minimized) window is ignored.
    pub fn resize(&self, width: u32, height: u32) {
        if let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) {
            self.surface.resize(&self.context, width, height);
        }
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    pub fn swap_buffers(&self) -> Result<(), WindowError> {
        self.surface.swap_buffers(&self.context)?;
        Ok(())
    }
}

/// Prefer the config with the most samples
fn pick_config(configs: Box<dyn Iterator<Item = Config> + '_>) -> Config {
    configs
        .reduce(|best, config| {
            if config.num_samples() > best.num_samples() {
                config
            } else {
                best
            }
        })
        .expect("glutin offers at least one matching config")
}

fn glow_context(context: &PossiblyCurrentContext) -> glow::Context {
    unsafe {
        glow::Context::from_loader_function_cstr(|s| context.display().get_proc_address(s).cast())
    }
}
