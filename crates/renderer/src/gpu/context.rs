use std::sync::Arc;

use anyhow::{bail, Context as AnyhowContext, Result};
use tracing::{debug, info, warn};
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::types::Antialiasing;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Highest sample count `Antialiasing::Auto` will pick.
const AUTO_SAMPLE_CAP: u32 = 4;

/// Device, queue and configured surface for the preview window.
pub(crate) struct GpuContext {
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: PhysicalSize<u32>,
    pub sample_count: u32,
    pub surface_format: wgpu::TextureFormat,
}

impl GpuContext {
    pub(crate) fn new(
        window: Arc<Window>,
        initial_size: PhysicalSize<u32>,
        antialiasing: Antialiasing,
    ) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window)
            .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;
        let adapter_info = adapter.get_info();
        info!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        // Two small uniform blocks and one mesh fit the downlevel limits; only
        // the texture size follows the adapter.
        let limits = wgpu::Limits::downlevel_defaults().using_resolution(adapter.limits());
        let size = PhysicalSize::new(initial_size.width.max(1), initial_size.height.max(1));
        let max_dimension = limits.max_texture_dimension_2d;
        if size.width > max_dimension || size.height > max_dimension {
            bail!(
                "window of {}x{} exceeds the GPU texture limit of {max_dimension}",
                size.width,
                size.height
            );
        }

        let capabilities = surface.get_capabilities(&adapter);
        let surface_format = pick_surface_format(&capabilities.formats)
            .context("surface reports no supported formats")?;
        if !surface_format.is_srgb() {
            warn!(?surface_format, "no sRGB surface format available; colours will look dark");
        }

        let format_features = adapter.get_texture_format_features(surface_format);
        let sample_count = select_sample_count(
            antialiasing,
            &format_features.flags.supported_sample_counts(),
            format_features
                .flags
                .contains(wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE),
            adapter_info.device_type == wgpu::DeviceType::Cpu,
        );

        // Counts above 4 are only reported through adapter-specific format features.
        let required_features = if sample_count > AUTO_SAMPLE_CAP {
            wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES
        } else {
            wgpu::Features::empty()
        };
        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("undula device"),
            required_features,
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: capabilities
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);
        debug!(?surface_format, sample_count, "surface configured");

        Ok(Self {
            surface,
            device,
            queue,
            config,
            size,
            sample_count,
            surface_format,
        })
    }

    pub(crate) fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn aspect(&self) -> f32 {
        self.size.width.max(1) as f32 / self.size.height.max(1) as f32
    }
}

/// First sRGB format, else whatever the surface lists first.
fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|format| format.is_srgb())
        .or_else(|| formats.first().copied())
}

/// Resolves the antialiasing policy against what the surface format allows.
/// Single sampling is always available.
fn select_sample_count(
    antialiasing: Antialiasing,
    supported: &[u32],
    can_resolve: bool,
    software: bool,
) -> u32 {
    let best_up_to = |limit: u32| {
        supported
            .iter()
            .copied()
            .filter(|&count| count <= limit)
            .max()
            .unwrap_or(1)
    };
    let wanted = match antialiasing {
        Antialiasing::Off => return 1,
        Antialiasing::Auto => best_up_to(AUTO_SAMPLE_CAP),
        Antialiasing::Samples(requested) => {
            let chosen = best_up_to(requested);
            if chosen != requested {
                warn!(requested, chosen, ?supported, "MSAA sample count not supported");
            }
            chosen
        }
    };
    if wanted > 1 && !can_resolve {
        warn!("surface format cannot resolve multisampled targets; disabling MSAA");
        return 1;
    }
    if wanted > 1 && software {
        warn!(wanted, "software rasterizer detected; disabling MSAA");
        return 1;
    }
    wanted
}
