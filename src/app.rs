use std::sync::Arc;

use glam::Vec2;
use image::RgbaImage;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::clock::FrameClock;
use crate::draw2d::{Color, Draw2d, SpriteId};
use crate::error::{AppError, GpuError};
use crate::gpu::GpuContext;
use crate::pivot::Placement;
use crate::texture::Texture;

/// Context provided during app setup.
pub struct SetupContext<'a> {
    pub gpu: &'a GpuContext,
    draw: &'a mut Draw2d,
}

impl SetupContext<'_> {
    /// Upload a decoded image as a sprite that lives for the whole app.
    pub fn sprite(&mut self, image: &RgbaImage, label: &str) -> SpriteId {
        let texture = Texture::from_image(self.gpu, image, label);
        self.draw.add_sprite(self.gpu, texture)
    }
}

/// Context provided each frame for rendering.
///
/// Everything drawn through a `Frame` is composited in call order on top of
/// the background color.
pub struct Frame<'a> {
    /// GPU context for advanced rendering.
    pub gpu: &'a GpuContext,
    /// Low-level 2D drawing API.
    pub draw: &'a mut Draw2d,
    /// Delta time since last frame in seconds.
    pub dt: f32,
    exit: &'a mut Option<Result<(), AppError>>,
}

impl Frame<'_> {
    /// Screen size in logical pixels.
    pub fn size(&self) -> Vec2 {
        self.gpu.logical_size()
    }

    /// Draw a sprite at its natural size with its top-left corner at `(x, y)`.
    pub fn sprite(&mut self, id: SpriteId, x: f32, y: f32) {
        self.draw.sprite(id, Vec2::new(x, y));
    }

    /// Draw the result of a [`PivotTransform`](crate::PivotTransform).
    pub fn placement(&mut self, placement: &Placement) {
        self.draw
            .image(self.gpu, &placement.image, placement.rect, "Pivot Placement");
    }

    /// Close the window after this frame and report `error` from the run call.
    pub fn fail(&mut self, error: impl Into<AppError>) {
        *self.exit = Some(Err(error.into()));
    }
}

/// Configuration for the app window.
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Frame rate cap; `0` runs as fast as presentation allows.
    pub target_fps: u32,
    pub background: Color,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Swivel".to_string(),
            width: 800,
            height: 600,
            target_fps: 60,
            background: Color::BLACK,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }
}

/// Run an app with a custom window configuration.
///
/// Blocks until the window is closed or something fails. Window, GPU and
/// frame failures reported through [`Frame::fail`] are returned rather than
/// panicking.
///
/// # Example
/// ```ignore
/// let logo = swivel::load_rgba("logo.png")?;
/// swivel::run_with_config(
///     AppConfig::new().title("Pivot").size(400, 300).target_fps(60),
///     move |ctx| {
///         let logo = ctx.sprite(&logo, "Logo");
///         move |frame| {
///             frame.sprite(logo, 10.0, 10.0);
///         }
///     },
/// )?;
/// ```
pub fn run_with_config<S, F>(config: AppConfig, setup: S) -> Result<(), AppError>
where
    S: FnOnce(&mut SetupContext) -> F + 'static,
    F: FnMut(&mut Frame) + 'static,
{
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = SwivelApp {
        state: AppState::Pending {
            config,
            setup: Some(Box::new(move |ctx: &mut SetupContext| {
                Box::new(setup(ctx)) as Box<dyn FnMut(&mut Frame)>
            })),
        },
        exit: None,
    };

    event_loop.run_app(&mut app)?;
    app.exit.unwrap_or(Ok(()))
}

type SetupFn = Box<dyn FnOnce(&mut SetupContext) -> Box<dyn FnMut(&mut Frame)>>;

struct SwivelApp {
    state: AppState,
    /// Set once the app should stop; `Err` is handed back from `run_with_config`.
    exit: Option<Result<(), AppError>>,
}

enum AppState {
    Pending {
        config: AppConfig,
        setup: Option<SetupFn>,
    },
    Running {
        window: Arc<Window>,
        gpu: GpuContext,
        draw_2d: Draw2d,
        frame_fn: Box<dyn FnMut(&mut Frame)>,
        background: Color,
        clock: FrameClock,
    },
}

impl AppState {
    fn start(
        event_loop: &ActiveEventLoop,
        config: &AppConfig,
        setup: SetupFn,
    ) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
            .with_resizable(false);

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;
        let mut draw_2d = Draw2d::new(&gpu);

        let frame_fn = {
            let mut ctx = SetupContext {
                gpu: &gpu,
                draw: &mut draw_2d,
            };
            setup(&mut ctx)
        };

        log::info!(
            "window '{}' ready at {}x{} (scale {:.2})",
            config.title,
            config.width,
            config.height,
            gpu.scale_factor
        );
        window.request_redraw();

        Ok(AppState::Running {
            window,
            gpu,
            draw_2d,
            frame_fn,
            background: config.background,
            clock: FrameClock::new(config.target_fps),
        })
    }
}

impl ApplicationHandler for SwivelApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config, setup } = &mut self.state else {
            return;
        };
        let Some(setup) = setup.take() else {
            return;
        };

        match AppState::start(event_loop, config, setup) {
            Ok(running) => self.state = running,
            Err(e) => {
                self.exit = Some(Err(e));
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running {
            window,
            gpu,
            draw_2d,
            frame_fn,
            background,
            clock,
        } = &mut self.state
        else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("close requested");
                if self.exit.is_none() {
                    self.exit = Some(Ok(()));
                }
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                gpu.resize(size.width, size.height);
            }
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                gpu.scale_factor = scale_factor;
            }
            WindowEvent::RedrawRequested => {
                let dt = clock.tick().as_secs_f32();

                draw_2d.clear();

                let mut frame = Frame {
                    gpu,
                    draw: draw_2d,
                    dt,
                    exit: &mut self.exit,
                };
                frame_fn(&mut frame);

                if let Err(e) = render_2d(gpu, draw_2d, *background) {
                    self.exit = Some(Err(e.into()));
                }

                if self.exit.is_some() {
                    event_loop.exit();
                } else {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

/// Clear to `background`, composite the frame's 2D draw calls and present.
fn render_2d(gpu: &GpuContext, draw_2d: &Draw2d, background: Color) -> Result<(), GpuError> {
    let output = match gpu.surface.get_current_texture() {
        Ok(output) => output,
        Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
            log::warn!("surface lost or outdated, reconfiguring");
            gpu.reconfigure();
            return Ok(());
        }
        Err(wgpu::SurfaceError::Timeout) => {
            log::warn!("timed out waiting for surface texture, skipping frame");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let view = output
        .texture
        .create_view(&wgpu::TextureViewDescriptor::default());

    let mut encoder = gpu
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("2D Encoder"),
        });

    {
        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("2D Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(background.to_wgpu()),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        draw_2d.render(gpu, &mut render_pass);
    }

    gpu.queue.submit(std::iter::once(encoder.finish()));
    output.present();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = AppConfig::new()
            .title("Pivot")
            .size(400, 300)
            .target_fps(30)
            .background(Color::WHITE);

        assert_eq!(config.title, "Pivot");
        assert_eq!((config.width, config.height), (400, 300));
        assert_eq!(config.target_fps, 30);
        assert_eq!(config.background, Color::WHITE);
    }

    #[test]
    fn config_defaults_cap_at_sixty() {
        let config = AppConfig::default();
        assert_eq!(config.target_fps, 60);
        assert_eq!((config.width, config.height), (800, 600));
    }
}
