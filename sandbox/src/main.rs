use std::time::Instant;

use anyhow::Context;
use glam::{Vec2, Vec3};
use proto_gl::core::logging::{init_logging, LoggingConfig};
use proto_gl::core::rendering::shader::TRANSFORM_UNIFORM;
use proto_gl::prelude::*;
use winit::event::{DeviceEvent, ElementState, Event, KeyEvent, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};

const DEFAULT_CONFIG_PATH: &str = "sandbox/config.toml";
const ORBIT_SPEED: f32 = 0.05;
const MIN_ORBIT_RADIUS: f32 = 0.5;
const MESH_YAW_DEGREES: f32 = 45.0;

/// Camera circling the origin at a fixed height
#[derive(Debug, Clone, Copy)]
struct Orbit {
    radius: f32,
    angle: f32,
    height: f32,
}

impl Orbit {
    fn from_position(position: Vec3) -> Self {
        Orbit {
            radius: Vec2::new(position.x, position.z).length().max(MIN_ORBIT_RADIUS),
            angle: position.z.atan2(position.x),
            height: position.y,
        }
    }

    fn position(&self) -> Vec3 {
        Vec3::new(
            self.radius * self.angle.cos(),
            self.height,
            self.radius * self.angle.sin(),
        )
    }

    fn update(&mut self, input: &InputManager<KeyCode>) {
        if input.is_key_pressed(KeyCode::ArrowUp) {
            self.radius = (self.radius - ORBIT_SPEED).max(MIN_ORBIT_RADIUS);
        }
        if input.is_key_pressed(KeyCode::ArrowDown) {
            self.radius += ORBIT_SPEED;
        }
        if input.is_key_pressed(KeyCode::ArrowLeft) {
            self.angle += ORBIT_SPEED;
        }
        if input.is_key_pressed(KeyCode::ArrowRight) {
            self.angle -= ORBIT_SPEED;
        }
    }
}

// Field order matters: GPU resources go before the window owning the context
struct Sandbox {
    renderer: Renderer<glow::Context>,
    camera: Camera,
    orbit: Orbit,
    initial_orbit: Orbit,
    input: InputManager<KeyCode>,
    time: Time,
    limiter: FrameLimiter,
    window: GlWindow,
}

impl Sandbox {
    fn new(config: &EngineConfig, window: GlWindow) -> anyhow::Result<Self> {
        let gl = window.gl().clone();
        log_driver_info(gl.as_ref());
        check_compatibility(gl.as_ref(), config.required_extensions.as_slice())?;

        let mut renderer = Renderer::new(gl.clone(), config.clear_color)?;

        let shader_dir = config.resource_dir.join("shaders");
        let vertex_src = std::fs::read_to_string(shader_dir.join("plain.v.glsl"))
            .with_context(|| format!("reading vertex shader from {:?}", shader_dir))?;
        let fragment_src = std::fs::read_to_string(shader_dir.join("plain.f.glsl"))
            .with_context(|| format!("reading fragment shader from {:?}", shader_dir))?;
        let shader = renderer.shaders_mut().create("plain", &vertex_src, &fragment_src)?;
        renderer.shaders_mut().add_uniform(shader, TRANSFORM_UNIFORM)?;

        let mut object = Object::from_obj_file(gl, config.mesh_path(), shader)?;
        let mut transform = TransformMatrix::default();
        transform.rotate(Vec3::new(0.0, MESH_YAW_DEGREES, 0.0));
        object.set_model_matrix(transform.matrix());
        renderer.add_drawable(Box::new(object));

        let camera = config.camera()?;
        let (width, height) = window.size();
        let mut sandbox = Sandbox {
            renderer,
            orbit: Orbit::from_position(camera.position()),
            initial_orbit: Orbit::from_position(camera.position()),
            camera,
            input: InputManager::new(),
            time: Time::new(Instant::now()),
            limiter: FrameLimiter::new(config.max_frame_rate),
            window,
        };
        sandbox.input.register_keys([
            KeyCode::ArrowUp,
            KeyCode::ArrowDown,
            KeyCode::ArrowLeft,
            KeyCode::ArrowRight,
            KeyCode::Space,
        ])?;
        // Physical size may differ from the configured logical one
        sandbox.renderer.on_resize(width, height, &mut sandbox.camera)?;
        Ok(sandbox)
    }

    fn on_key(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let pressed = event.state == ElementState::Pressed;
        if self.input.update_key(code, pressed) && code == KeyCode::Space && pressed {
            self.orbit = self.initial_orbit;
            log::debug!("Camera orbit reset");
        }
    }

    fn on_resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        self.window.resize(width, height);
        self.renderer.on_resize(width, height, &mut self.camera)?;
        Ok(())
    }

    fn frame(&mut self) -> anyhow::Result<()> {
        let frame_start = Instant::now();
        self.time.step(frame_start);

        self.orbit.update(&self.input);
        self.camera.set_position(self.orbit.position());
        self.camera.look_at(Vec3::ZERO);

        let errors = self.renderer.render_frame(&mut self.camera)?;
        if !errors.is_empty() {
            log::debug!("{} OpenGL errors this frame", errors.len());
        }
        self.window.swap_buffers()?;

        let motion = self.input.take_mouse_motion();
        log::trace!(
            "Frame took {:.2}ms, mouse moved {:?}",
            self.time.delta_milliseconds(),
            motion
        );
        self.limiter.wait(frame_start);
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path))?;

    init_logging(match &config.log_filter {
        Some(filter) => LoggingConfig::with_filter(filter.clone()),
        None => LoggingConfig::default(),
    });
    log::info!("Starting sandbox with config {}", config_path);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let window = GlWindow::new(&event_loop, &config.window)?;
    let mut sandbox = Some(Sandbox::new(&config, window)?);
    let mut failure: Option<anyhow::Error> = None;

    event_loop.run(|event, target| {
        if let Event::LoopExiting = event {
            // Release GPU resources while the context is still alive
            sandbox = None;
            return;
        }
        let Some(app) = sandbox.as_mut() else {
            return;
        };

        let result = match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    target.exit();
                    Ok(())
                }
                WindowEvent::Resized(size) => app.on_resize(size.width, size.height),
                WindowEvent::KeyboardInput { event, .. } => {
                    app.on_key(&event);
                    Ok(())
                }
                WindowEvent::CursorMoved { position, .. } => {
                    app.input
                        .update_mouse_position(Vec2::new(position.x as f32, position.y as f32));
                    Ok(())
                }
                WindowEvent::Focused(false) => {
                    app.input.release_all();
                    Ok(())
                }
                WindowEvent::RedrawRequested => app.frame(),
                _ => Ok(()),
            },
            Event::DeviceEvent {
                event: DeviceEvent::MouseMotion { delta },
                ..
            } => {
                app.input
                    .add_mouse_motion(Vec2::new(delta.0 as f32, delta.1 as f32));
                Ok(())
            }
            Event::AboutToWait => {
                app.window.request_redraw();
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            log::error!("{:#}", err);
            failure = Some(err);
            target.exit();
        }
    })?;

    match failure {
        Some(err) => Err(err),
        None => {
            log::info!("Sandbox closed");
            Ok(())
        }
    }
}
