use std::fmt;

use sceneconfig::SceneConfig;

/// Anti-aliasing policy for the render pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Antialiasing {
    /// Pick the highest supported sample count up to 4x.
    #[default]
    Auto,
    /// Disable MSAA and render directly into the swapchain.
    Off,
    /// Request a specific MSAA sample count (clamped to what the device supports).
    Samples(u32),
}

impl fmt::Display for Antialiasing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Antialiasing::Auto => f.write_str("auto"),
            Antialiasing::Off => f.write_str("off"),
            Antialiasing::Samples(samples) => write!(f, "{samples}"),
        }
    }
}

/// Immutable configuration passed to the renderer at start-up.
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Window size in physical pixels.
    pub surface_size: (u32, u32),
    pub antialiasing: Antialiasing,
    /// Scene description: mesh, material, lights, camera and amplitude policy.
    pub scene: SceneConfig,
    pub title: String,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            surface_size: (1280, 720),
            antialiasing: Antialiasing::default(),
            scene: SceneConfig::default(),
            title: "undula".to_string(),
        }
    }
}
