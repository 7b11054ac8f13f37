use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use material::ShaderProgram;
use tracing::{debug, error, info, warn};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{ElementState, Event, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::{Window, WindowBuilder};

use crate::driver::FrameDriver;
use crate::gpu::GpuState;
use crate::runtime::{BoxedTimeSource, SystemTimeSource};
use crate::types::RendererConfig;

/// Cursor travel in pixels beyond which a press counts as a drag, not a click.
const DRAG_THRESHOLD: f64 = 4.0;
const PIXELS_PER_LINE: f32 = 40.0;

/// What a key press asks the frame driver to do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum KeyAction {
    Advance,
    Select(f32),
    Exit,
}

pub(crate) fn key_action(key: &Key) -> Option<KeyAction> {
    match key {
        Key::Named(NamedKey::Space | NamedKey::Enter) => Some(KeyAction::Advance),
        Key::Named(NamedKey::Escape) => Some(KeyAction::Exit),
        Key::Character(value) => match value.as_str() {
            " " => Some(KeyAction::Advance),
            digit => digit
                .parse::<u8>()
                .ok()
                .filter(|value| (2..=9).contains(value))
                .map(|value| KeyAction::Select(f32::from(value))),
        },
        _ => None,
    }
}

#[derive(Debug, Default)]
struct PointerState {
    position: Option<PhysicalPosition<f64>>,
    press_origin: Option<PhysicalPosition<f64>>,
    dragging: bool,
}

impl PointerState {
    /// Records the move and returns the drag delta when the left button is held.
    fn moved(&mut self, position: PhysicalPosition<f64>) -> Option<(f32, f32)> {
        let previous = self.position.replace(position);
        let origin = self.press_origin?;
        if !self.dragging {
            let travel = (position.x - origin.x).hypot(position.y - origin.y);
            self.dragging = travel > DRAG_THRESHOLD;
        }
        let previous = previous?;
        self.dragging
            .then(|| ((position.x - previous.x) as f32, (position.y - previous.y) as f32))
    }

    fn pressed(&mut self) {
        self.press_origin = self.position.or(Some(PhysicalPosition::new(0.0, 0.0)));
        self.dragging = false;
    }

    /// Returns true when the press ended without turning into a drag.
    fn released(&mut self) -> bool {
        let was_click = self.press_origin.is_some() && !self.dragging;
        self.press_origin = None;
        self.dragging = false;
        was_click
    }
}

/// Aggregates GPU state, the frame driver and input for the preview window.
pub(crate) struct WindowState {
    window: Arc<Window>,
    gpu: GpuState,
    driver: FrameDriver,
    clock: BoxedTimeSource,
    pointer: PointerState,
}

impl WindowState {
    pub(crate) fn new(
        window: Arc<Window>,
        config: &RendererConfig,
        program: ShaderProgram,
        driver: FrameDriver,
    ) -> Result<Self> {
        let size = window.inner_size();
        let gpu = GpuState::new(window.clone(), size, config, program)?;
        Ok(Self {
            window,
            gpu,
            driver,
            clock: Box::new(SystemTimeSource::new()),
            pointer: PointerState::default(),
        })
    }

    pub(crate) fn window(&self) -> &Window {
        self.window.as_ref()
    }

    pub(crate) fn size(&self) -> PhysicalSize<u32> {
        self.gpu.size()
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.gpu.resize(new_size);
    }

    fn trigger(&mut self, action: KeyAction) {
        let now = self.clock.elapsed();
        let accepted = match action {
            KeyAction::Advance => self.driver.advance(now),
            KeyAction::Select(value) => self.driver.select(now, value),
            KeyAction::Exit => return,
        };
        if accepted {
            info!(
                goal = self.driver.controller().target(),
                "amplitude target changed"
            );
        }
    }

    fn handle_key(&mut self, event: &KeyEvent) -> Option<KeyAction> {
        if event.state != ElementState::Pressed || event.repeat {
            return None;
        }
        let action = key_action(&event.logical_key)?;
        self.trigger(action);
        Some(action)
    }

    fn handle_cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        if let Some((dx, dy)) = self.pointer.moved(position) {
            let height = self.size().height as f32;
            self.gpu.camera_mut().rotate(dx, dy, height);
        }
    }

    fn handle_mouse_button(&mut self, state: ElementState) {
        match state {
            ElementState::Pressed => self.pointer.pressed(),
            ElementState::Released => {
                if self.pointer.released() {
                    self.trigger(KeyAction::Advance);
                }
            }
        }
    }

    fn handle_wheel(&mut self, delta: MouseScrollDelta) {
        let lines = match delta {
            MouseScrollDelta::LineDelta(_, y) => y,
            MouseScrollDelta::PixelDelta(position) => position.y as f32 / PIXELS_PER_LINE,
        };
        self.gpu.camera_mut().zoom(lines);
    }

    /// One frame: tick the driver against the clock, sync uniforms if the
    /// pipeline is ready, then draw.
    fn render_frame(&mut self) -> Result<Result<(), wgpu::SurfaceError>> {
        let now = self.clock.elapsed();
        let uniforms = self.gpu.material_uniforms()?;
        self.driver.on_frame(now, uniforms);
        Ok(self.gpu.render())
    }
}

/// Opens the preview window and runs until it is closed.
pub(crate) fn run_window(
    config: RendererConfig,
    program: ShaderProgram,
    driver: FrameDriver,
) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to initialize event loop")?;
    let window_size = PhysicalSize::new(config.surface_size.0, config.surface_size.1);
    let window = WindowBuilder::new()
        .with_title(config.title.as_str())
        .with_inner_size(window_size)
        .build(&event_loop)
        .map_err(|err| anyhow!("failed to create preview window: {err}"))?;
    let window = Arc::new(window);

    let mut state = WindowState::new(window.clone(), &config, program, driver)
        .context("failed to initialise window renderer")?;
    info!(
        width = window_size.width,
        height = window_size.height,
        antialiasing = %config.antialiasing,
        "preview window ready; space/enter/click to step the amplitude, 2-9 to pick one"
    );

    let mut failure: Option<anyhow::Error> = None;
    let run_result = event_loop.run(|event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == state.window().id() => {
            match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => {
                    elwt.exit();
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    if state.handle_key(&event) == Some(KeyAction::Exit) {
                        elwt.exit();
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    state.handle_cursor_moved(position);
                }
                WindowEvent::MouseInput {
                    state: button_state,
                    button: MouseButton::Left,
                    ..
                } => {
                    state.handle_mouse_button(button_state);
                }
                WindowEvent::MouseWheel { delta, .. } => {
                    state.handle_wheel(delta);
                }
                WindowEvent::Resized(new_size) => {
                    state.resize(new_size);
                }
                WindowEvent::RedrawRequested => match state.render_frame() {
                    Ok(Ok(())) => {}
                    Ok(Err(surface_err)) => match surface_err {
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                            debug!(?surface_err, "reconfiguring surface");
                            state.resize(state.size());
                        }
                        wgpu::SurfaceError::OutOfMemory => {
                            error!("surface out of memory; exiting preview");
                            elwt.exit();
                        }
                        wgpu::SurfaceError::Timeout => {
                            warn!("surface timeout; retrying next frame");
                        }
                        other => {
                            warn!("surface error: {other:?}; retrying next frame");
                        }
                    },
                    Err(err) => {
                        failure = Some(err.context("material pipeline failed to build"));
                        elwt.exit();
                    }
                },
                _ => {}
            }
        }
        Event::AboutToWait => {
            state.window().request_redraw();
            elwt.set_control_flow(ControlFlow::Poll);
        }
        _ => {}
    });

    if let Some(err) = failure {
        return Err(err);
    }
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
