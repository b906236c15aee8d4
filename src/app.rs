use glutin::config::{Config, ConfigTemplateBuilder};
use glutin::context::{
    ContextApi, ContextAttributesBuilder, GlProfile, NotCurrentGlContextSurfaceAccessor,
    PossiblyCurrentContext, Version,
};
use glutin::display::{GetGlDisplay, GlDisplay};
use glutin::surface::{GlSurface, Surface, SurfaceAttributesBuilder, SwapInterval, WindowSurface};

use glutin_winit::DisplayBuilder;

use raw_window_handle::HasRawWindowHandle;

use log::{debug, error, info, warn};

use std::ffi::CString;
use std::num::NonZeroU32;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use winit::dpi::LogicalSize;
use winit::event::{Event, StartCause, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder};

use gl_wrapper::device::{DeviceError, GlDevice, NativeGl};
use gl_wrapper::geometry::GBError;
use gl_wrapper::program::ShaderError;
use gl_wrapper::renderer::GlRenderer;

use crate::frame_loop::{FrameLoop, LoopState};
use crate::quad::{Quad, CENTER_QUAD, CORNER_QUAD};
use crate::shaders::{build_programs, Programs, ShaderPolicy, ShaderSources};

pub const WINDOW_WIDTH: u32 = 800;
pub const WINDOW_HEIGHT: u32 = 800;
pub const WINDOW_TITLE: &str = "Sikrusher";
pub const GL_VERSION: (u8, u8) = (4, 6);
pub const CLEAR_COLOR: (f32, f32, f32) = (0.2, 0.3, 0.3);

pub struct App {
    gl: NativeGl,
    gl_context: PossiblyCurrentContext,
    gl_window: GlWindow,
    event_loop: EventLoop<()>,
}

impl App {
    /// Opens the window, creates a current OpenGL core context on it and loads the function
    /// pointers. Every failure here is fatal.
    pub fn new() -> Result<Self, AppError> {
        let event_loop = EventLoop::new();
        let window_builder = WindowBuilder::new()
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT))
            .with_title(WINDOW_TITLE);
        let display_builder = DisplayBuilder::new().with_window_builder(Some(window_builder));
        let template = ConfigTemplateBuilder::new();

        let (window, gl_config) = build_display(|| {
            display_builder.build(&event_loop, template, |mut configs| {
                configs.next().expect("display offered no configs")
            })
        })?;

        let window = window.ok_or_else(|| AppError::Window("no window was built".to_string()))?;

        let handle = window.raw_window_handle();
        let gl_display = gl_config.display();

        let context_attr = ContextAttributesBuilder::new()
            .with_context_api(ContextApi::OpenGl(Some(Version::new(
                GL_VERSION.0,
                GL_VERSION.1,
            ))))
            .with_profile(GlProfile::Core)
            .build(Some(handle));

        let gl_window = GlWindow::new(window, &gl_config)?;

        let gl_context = unsafe { gl_display.create_context(&gl_config, &context_attr)? }
            .make_current(&gl_window.surface)?;

        info!(
            "OpenGL {}.{} core context created",
            GL_VERSION.0, GL_VERSION.1
        );

        if let Err(e) = gl_window
            .surface
            .set_swap_interval(&gl_context, SwapInterval::Wait(NonZeroU32::MIN))
        {
            warn!("Could not enable vsync: {e}");
        }

        // A name that is not a valid C string simply stays unloaded
        let gl = NativeGl::load_with(|s| match CString::new(s) {
            Ok(name) => gl_display.get_proc_address(name.as_c_str()),
            Err(_) => std::ptr::null(),
        })?;

        Ok(Self {
            gl,
            gl_context,
            gl_window,
            event_loop,
        })
    }

    /// Sets up the programs and quads, then renders until the window is closed.
    ///
    /// All GPU objects are released before the context and the window go away.
    pub fn run(self, policy: ShaderPolicy) -> Result<(), AppError> {
        let App {
            gl,
            gl_context,
            gl_window,
            mut event_loop,
        } = self;

        let programs = build_programs(&gl, &ShaderSources::default(), policy)?;
        let center = Quad::new(&gl, CENTER_QUAD)?;
        let corner = Quad::new(&gl, CORNER_QUAD)?;

        let mut gl_renderer = GlRenderer::new(&gl);
        let size = gl_window.window.inner_size();
        gl_renderer.resize(size.width, size.height);

        let mut frame_loop = FrameLoop::new();

        event_loop.run_return(|event, _window_target, control_flow| match event {
            Event::NewEvents(StartCause::Init) => {
                *control_flow = ControlFlow::Poll;
            }
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::Resized(size) => {
                    if let (Some(width), Some(height)) =
                        (NonZeroU32::new(size.width), NonZeroU32::new(size.height))
                    {
                        gl_window.surface.resize(&gl_context, width, height);
                        gl_renderer.resize(size.width, size.height);
                        debug!("Viewport set to {}x{}", size.width, size.height);
                    }
                }
                WindowEvent::KeyboardInput { input, .. } => {
                    frame_loop.handle_key(input.virtual_keycode, input.state);
                }
                WindowEvent::CloseRequested => {
                    frame_loop.request_close();
                    debug!("Close requested by the window system, {:?}", frame_loop.state());
                }
                _ => (),
            },
            Event::MainEventsCleared if frame_loop.should_render() => {
                draw_frame(&mut gl_renderer, &center, &corner, &programs);

                if let Err(e) = gl_window.surface.swap_buffers(&gl_context) {
                    error!("Could not present frame: {e}");
                }

                if frame_loop.finish_frame() == LoopState::Terminated {
                    control_flow.set_exit();
                }
            }
            _ => (),
        });

        info!("Shutting down after {} frames", frame_loop.frames());

        drop(gl_renderer);
        drop(corner);
        drop(center);
        drop(programs);

        drop(gl_context);
        drop(gl_window);

        Ok(())
    }
}

/// Runs a display build and turns every way it can fail into [`AppError::Window`].
///
/// glutin's config picker has no error path, so an empty config set can only unwind out of it.
pub fn build_display<T, F>(build: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, Box<dyn std::error::Error>>,
{
    panic::catch_unwind(AssertUnwindSafe(build))
        .map_err(|_| AppError::Window("display offered no usable GL config".to_string()))?
        .map_err(|e| AppError::Window(e.to_string()))
}

/// Clears the back buffer and draws the center quad in orange, then the corner quad in purple.
/// Presenting is left to the caller.
pub fn draw_frame<D: GlDevice>(
    renderer: &mut GlRenderer<'_, D>,
    center: &Quad<'_, D>,
    corner: &Quad<'_, D>,
    programs: &Programs<'_, D>,
) {
    let (r, g, b) = CLEAR_COLOR;
    renderer.clear_color(r, g, b);

    center.draw(renderer, &programs.orange);
    corner.draw(renderer, &programs.purple);
}

pub struct GlWindow {
    // XXX the surface must be dropped before the window.
    pub surface: Surface<WindowSurface>,
    pub window: Window,
}

impl GlWindow {
    pub fn new(window: Window, config: &Config) -> Result<Self, AppError> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let raw_window_handle = window.raw_window_handle();

        let (Some(width), Some(height)) = (NonZeroU32::new(width), NonZeroU32::new(height)) else {
            return Err(AppError::Window(format!("window has no area ({width}x{height})")));
        };

        let attrs =
            SurfaceAttributesBuilder::<WindowSurface>::new().build(raw_window_handle, width, height);

        let surface = unsafe {
            config
                .display()
                .create_window_surface(config, &attrs)
                .map_err(AppError::Surface)?
        };

        Ok(Self { window, surface })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Window failed to create: {0}")]
    Window(String),
    #[error("Could not create OpenGL context: {0}")]
    Context(#[from] glutin::error::Error),
    #[error("Could not create window surface: {0}")]
    Surface(glutin::error::Error),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error("Could not upload quad: {0}")]
    Geometry(#[from] GBError),
}
