//! Scene composer for undula: an icosphere drawn with the displaced material
//! in a `winit` preview window through `wgpu`.
//!
//! ```text
//!   undula CLI
//!        │ RendererConfig
//!        ▼
//!   Renderer::run ──▶ WindowState ──▶ winit event loop ──▶ render_frame()
//!                          │                                   │
//!                          │ input ──▶ FrameDriver::advance    ├─▶ FrameDriver::on_frame
//!                          │                                   └─▶ GpuState::render
//!                          └─▶ pipeline worker thread (GLSL ─▶ naga ─▶ RenderPipeline)
//! ```
//!
//! The material program is compiled off the event-loop thread. Until it
//! arrives the driver still ticks, the uniform sync is skipped and frames
//! clear to the background colour.

mod camera;
mod driver;
mod gpu;
mod mesh;
mod runtime;
mod types;
mod window;

use anyhow::{Context, Result};
use tracing::info;

pub use camera::OrbitCamera;
pub use driver::{easing_for, FrameDriver};
pub use mesh::{Icosphere, Vertex};
pub use runtime::{BoxedTimeSource, ManualTimeSource, SystemTimeSource, TimeSource};
pub use types::{Antialiasing, RendererConfig};

/// Entry point that owns the configuration and launches the preview window.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    /// Builds the displaced material and the frame driver, then blocks on
    /// the window event loop until the window closes.
    pub fn run(self) -> Result<()> {
        let scene = &self.config.scene;
        let driver =
            FrameDriver::from_config(scene).context("invalid amplitude configuration")?;
        let program = material::displaced_standard(driver.controller().current())
            .context("failed to inject displacement into the base material")?;
        info!(
            subdivisions = scene.mesh.subdivisions,
            amplitude = driver.controller().current(),
            "starting preview"
        );
        window::run_window(self.config, program, driver)
    }
}
