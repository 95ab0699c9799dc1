use std::fmt;

use super::target::DEPTH_FORMAT;

/// Errors that can occur during GPU context initialization.
#[derive(Debug)]
pub enum RenderContextError {
    /// Failed to create a wgpu surface from the window handle.
    SurfaceCreation(wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    AdapterRequest(wgpu::RequestAdapterError),
    /// GPU device request failed (limits or features not met).
    DeviceRequest(wgpu::RequestDeviceError),
    /// Surface configuration not supported by the selected adapter.
    UnsupportedSurface,
}

impl fmt::Display for RenderContextError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceCreation(e) => {
                write!(f, "surface creation failed: {e}")
            }
            Self::AdapterRequest(e) => {
                write!(f, "no compatible GPU adapter found: {e}")
            }
            Self::DeviceRequest(e) => write!(f, "device request failed: {e}"),
            Self::UnsupportedSurface => {
                write!(f, "surface configuration not supported by adapter")
            }
        }
    }
}

impl std::error::Error for RenderContextError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::SurfaceCreation(e) => Some(e),
            Self::AdapterRequest(e) => Some(e),
            Self::DeviceRequest(e) => Some(e),
            Self::UnsupportedSurface => None,
        }
    }
}

/// Owns the core wgpu resources: device, queue, surface, and configuration.
pub struct RenderContext {
    /// The wgpu logical device.
    pub device: wgpu::Device,
    /// The wgpu command queue.
    pub queue: wgpu::Queue,
    /// The window surface for presentation (`None` in texture-only mode).
    pub surface: Option<wgpu::Surface<'static>>,
    /// Current surface configuration (format, size, present mode).
    pub config: wgpu::SurfaceConfiguration,
    /// Device capabilities for the surface format (MSAA sample counts).
    pub format_features: wgpu::TextureFormatFeatureFlags,
    /// Device capabilities for [`DEPTH_FORMAT`].
    pub depth_features: wgpu::TextureFormatFeatureFlags,
    /// Pixels per point of the hosting view.
    pub content_scale: f64,
}

impl RenderContext {
    /// Create a new render context from the given window surface target and
    /// initial size in pixels.
    ///
    /// # Errors
    ///
    /// Returns `RenderContextError` if surface creation, adapter request,
    /// device request, or surface configuration fails.
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        initial_size: (u32, u32),
    ) -> Result<Self, RenderContextError> {
        let instance = wgpu::Instance::default();
        let surface = instance
            .create_surface(window)
            .map_err(RenderContextError::SurfaceCreation)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                compatible_surface: Some(&surface),
                power_preference: wgpu::PowerPreference::HighPerformance,
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::AdapterRequest)?;

        let required_features = adapter.features()
            & wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES;
        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Primary Device"),
                required_features,
                required_limits: wgpu::Limits::default(),
                ..Default::default()
            })
            .await
            .map_err(RenderContextError::DeviceRequest)?;

        let mut config = surface
            .get_default_config(
                &adapter,
                initial_size.0.max(1),
                initial_size.1.max(1),
            )
            .ok_or(RenderContextError::UnsupportedSurface)?;
        config.present_mode = wgpu::PresentMode::Fifo;
        surface.configure(&device, &config);

        let format_features =
            device_format_features(&adapter, &device, config.format);
        let depth_features =
            device_format_features(&adapter, &device, DEPTH_FORMAT);
        log::info!(
            "surface {:?} {}x{}, MSAA flags {:?}, depth flags {:?}",
            config.format,
            config.width,
            config.height,
            format_features,
            depth_features
        );

        Ok(Self {
            device,
            queue,
            surface: Some(surface),
            config,
            format_features,
            depth_features,
            content_scale: 1.0,
        })
    }

    /// Create a render context from an externally-owned device and queue
    /// (no surface, for texture-only or embedded rendering). Only the
    /// sample counts `device` guarantees without adapter-specific format
    /// features are assumed.
    #[must_use]
    pub fn from_device(
        device: wgpu::Device,
        queue: wgpu::Queue,
        format: wgpu::TextureFormat,
        width: u32,
        height: u32,
    ) -> Self {
        let device_features = device.features();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            desired_maximum_frame_latency: 2,
            alpha_mode: wgpu::CompositeAlphaMode::Auto,
            view_formats: vec![],
        };
        Self {
            device,
            queue,
            surface: None,
            config,
            format_features: format
                .guaranteed_format_features(device_features)
                .flags,
            depth_features: DEPTH_FORMAT
                .guaranteed_format_features(device_features)
                .flags,
            content_scale: 1.0,
        }
    }

    /// The surface texture format.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current drawable size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Whether color targets of the surface format and their depth
    /// buffers accept `count` samples, and the color can be resolved.
    pub fn supports_samples(&self, count: u32) -> bool {
        samples_allowed(self.format_features, self.depth_features, count)
    }

    /// Reconfigure the surface for the new drawable size. Ignores
    /// zero-sized dimensions.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.config.width = width;
            self.config.height = height;
            if let Some(ref surface) = self.surface {
                surface.configure(&self.device, &self.config);
            }
        }
    }

    /// Reconfigure the surface at its current size (after loss).
    pub fn reconfigure(&self) {
        if let Some(ref surface) = self.surface {
            surface.configure(&self.device, &self.config);
        }
    }

    /// Record the hosting view's pixels-per-point.
    pub fn set_content_scale(&mut self, scale: f64) {
        if scale.is_finite() && scale > 0.0 {
            self.content_scale = scale;
        }
    }

    /// Acquire the next swapchain texture for rendering.
    ///
    /// # Errors
    ///
    /// Returns [`wgpu::SurfaceError`] if the surface is lost, outdated,
    /// or timed out, or if no surface is available (texture-only mode).
    pub fn get_next_frame(
        &self,
    ) -> Result<wgpu::SurfaceTexture, wgpu::SurfaceError> {
        self.surface
            .as_ref()
            .map_or(Err(wgpu::SurfaceError::Lost), |surface| {
                surface.get_current_texture()
            })
    }

    /// Returns `true` if this context has a presentation surface.
    pub fn has_surface(&self) -> bool {
        self.surface.is_some()
    }

    /// Create a new command encoder for recording GPU commands.
    pub fn create_encoder(&self) -> wgpu::CommandEncoder {
        self.device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            })
    }

    /// Finish the encoder and submit its command buffer to the GPU queue.
    pub fn submit(&self, encoder: wgpu::CommandEncoder) {
        let _ = self.queue.submit(std::iter::once(encoder.finish()));
    }
}

/// Format flags the device will validate textures against. Adapter-specific
/// sample counts only apply when the device enabled them or the backend is
/// downlevel; otherwise only the guaranteed flags hold.
fn device_format_features(
    adapter: &wgpu::Adapter,
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
) -> wgpu::TextureFormatFeatureFlags {
    let adapter_specific = device
        .features()
        .contains(wgpu::Features::TEXTURE_ADAPTER_SPECIFIC_FORMAT_FEATURES);
    let downlevel = !adapter.get_downlevel_capabilities().is_webgpu_compliant();
    if adapter_specific || downlevel {
        adapter.get_texture_format_features(format).flags
    } else {
        format.guaranteed_format_features(device.features()).flags
    }
}

fn samples_allowed(
    color: wgpu::TextureFormatFeatureFlags,
    depth: wgpu::TextureFormatFeatureFlags,
    count: u32,
) -> bool {
    let resolvable = wgpu::TextureFormatFeatureFlags::MULTISAMPLE_RESOLVE;
    count == 1
        || (color.sample_count_supported(count)
            && color.contains(resolvable)
            && depth.sample_count_supported(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guaranteed(
        format: wgpu::TextureFormat,
    ) -> wgpu::TextureFormatFeatureFlags {
        format.guaranteed_format_features(wgpu::Features::empty()).flags
    }

    #[test]
    fn guaranteed_flags_reject_counts_above_four() {
        let color = guaranteed(wgpu::TextureFormat::Bgra8UnormSrgb);
        let depth = guaranteed(DEPTH_FORMAT);
        assert!(samples_allowed(color, depth, 1));
        assert!(samples_allowed(color, depth, 4));
        assert!(!samples_allowed(color, depth, 8));
        assert!(!samples_allowed(color, depth, 16));
    }

    #[test]
    fn depth_flags_limit_sample_count() {
        use wgpu::TextureFormatFeatureFlags as Flags;
        let color = Flags::MULTISAMPLE_X4
            | Flags::MULTISAMPLE_X8
            | Flags::MULTISAMPLE_RESOLVE;
        assert!(samples_allowed(color, color, 8));
        assert!(!samples_allowed(color, Flags::MULTISAMPLE_X4, 8));
        assert!(samples_allowed(color, Flags::MULTISAMPLE_X4, 4));
    }

    #[test]
    fn unresolvable_color_rejects_multisampling() {
        use wgpu::TextureFormatFeatureFlags as Flags;
        let depth = Flags::MULTISAMPLE_X4;
        assert!(!samples_allowed(Flags::MULTISAMPLE_X4, depth, 4));
        assert!(samples_allowed(Flags::MULTISAMPLE_X4, depth, 1));
    }
}
