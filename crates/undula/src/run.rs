use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use renderer::{Renderer, RendererConfig};
use sceneconfig::SceneConfig;
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads and validates the scene file, or returns the reference scene when
/// no file was given.
pub fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    let Some(path) = path else {
        tracing::debug!("no configuration file given; using the reference scene");
        return Ok(SceneConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration at {}", path.display()))?;
    let config = SceneConfig::from_toml_str(&raw)
        .with_context(|| format!("failed to load configuration at {}", path.display()))?;
    tracing::info!(path = %path.display(), "loaded scene configuration");
    Ok(config)
}

pub fn run(args: RunArgs, mut scene: SceneConfig) -> Result<()> {
    if let Some(amplitude) = args.amplitude {
        scene.amplitude.initial = amplitude;
        scene
            .validate()
            .context("--amplitude is outside the configured bounds")?;
    }

    let defaults = RendererConfig::default();
    let config = RendererConfig {
        surface_size: args.size.unwrap_or(defaults.surface_size),
        antialiasing: args.antialias,
        scene,
        ..defaults
    };
    Renderer::new(config).run()
}
