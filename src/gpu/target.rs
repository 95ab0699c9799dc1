//! wgpu implementation of [`RenderTargetBackend`].
//!
//! Offscreen targets own a multisampled color texture and depth buffer.
//! The visible target owns only a depth buffer and draws into the surface
//! texture acquired for the current frame; in texture-only mode (no
//! surface) it owns a single-sampled color texture instead.

use super::framebuffer::{
    RenderTarget, RenderTargetBackend, TargetDescriptor, TargetError,
    TargetKind,
};
use super::render_context::RenderContext;

/// Depth format shared by every target and pipeline.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// A texture and its default view.
#[derive(Debug)]
pub struct Attachment {
    /// The underlying GPU texture.
    pub texture: wgpu::Texture,
    /// A default full-texture view.
    pub view: wgpu::TextureView,
}

impl Attachment {
    fn new(
        device: &wgpu::Device,
        label: &str,
        (width, height): (u32, u32),
        sample_count: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }
}

/// Color and depth attachments of one target. GPU memory is released
/// when the target is dropped.
#[derive(Debug)]
pub struct WgpuTarget {
    kind: TargetKind,
    samples: u32,
    size: (u32, u32),
    color: Option<Attachment>,
    depth: Option<Attachment>,
}

impl WgpuTarget {
    /// Offscreen or surface-backed.
    #[must_use]
    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Owned color attachment (absent for surface-backed targets).
    #[must_use]
    pub fn color(&self) -> Option<&Attachment> {
        self.color.as_ref()
    }

    /// Owned depth attachment.
    #[must_use]
    pub fn depth(&self) -> Option<&Attachment> {
        self.depth.as_ref()
    }
}

impl RenderTarget for WgpuTarget {
    fn samples(&self) -> u32 {
        self.samples
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn has_color(&self) -> bool {
        self.color.is_some() || self.kind == TargetKind::Visible
    }

    fn has_depth(&self) -> bool {
        self.depth.is_some()
    }
}

impl Drop for WgpuTarget {
    fn drop(&mut self) {
        for attachment in [self.color.take(), self.depth.take()]
            .into_iter()
            .flatten()
        {
            attachment.texture.destroy();
        }
    }
}

struct Frame {
    surface_texture: Option<wgpu::SurfaceTexture>,
    surface_view: Option<wgpu::TextureView>,
    encoder: wgpu::CommandEncoder,
}

/// Render-target backend over a [`RenderContext`].
pub struct WgpuBackend {
    context: RenderContext,
    clear_color: wgpu::Color,
    frame: Option<Frame>,
}

impl WgpuBackend {
    /// Backend drawing with `context`, clearing to `clear_color`.
    #[must_use]
    pub fn new(context: RenderContext, clear_color: [f64; 4]) -> Self {
        let [r, g, b, a] = clear_color;
        Self {
            context,
            clear_color: wgpu::Color { r, g, b, a },
            frame: None,
        }
    }

    /// The GPU context.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Mutable GPU context (surface resize, content scale).
    pub fn context_mut(&mut self) -> &mut RenderContext {
        &mut self.context
    }

    /// Begin a render pass that loads and stores `target`'s attachments.
    /// `None` outside a frame or when the target has no color view.
    pub fn begin_pass<'a>(
        &'a mut self,
        target: &'a WgpuTarget,
        label: &'a str,
    ) -> Option<wgpu::RenderPass<'a>> {
        let frame = self.frame.as_mut()?;
        let color_view = match (&target.color, &frame.surface_view) {
            (Some(color), _) => &color.view,
            (None, Some(view)) => view,
            (None, None) => return None,
        };
        Some(begin(
            &mut frame.encoder,
            label,
            color_view,
            None,
            target.depth.as_ref().map(|d| &d.view),
            None,
        ))
    }
}

fn begin<'a>(
    encoder: &'a mut wgpu::CommandEncoder,
    label: &str,
    color: &'a wgpu::TextureView,
    resolve_target: Option<&'a wgpu::TextureView>,
    depth: Option<&'a wgpu::TextureView>,
    clear: Option<wgpu::Color>,
) -> wgpu::RenderPass<'a> {
    let color_load = clear.map_or(wgpu::LoadOp::Load, wgpu::LoadOp::Clear);
    let depth_load = if clear.is_some() {
        wgpu::LoadOp::Clear(1.0)
    } else {
        wgpu::LoadOp::Load
    };
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view: color,
            resolve_target,
            depth_slice: None,
            ops: wgpu::Operations {
                load: color_load,
                store: wgpu::StoreOp::Store,
            },
        })],
        depth_stencil_attachment: depth.map(|view| {
            wgpu::RenderPassDepthStencilAttachment {
                view,
                depth_ops: Some(wgpu::Operations {
                    load: depth_load,
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }
        }),
        timestamp_writes: None,
        occlusion_query_set: None,
    })
}

impl RenderTargetBackend for WgpuBackend {
    type Target = WgpuTarget;

    fn create_target(
        &mut self,
        desc: &TargetDescriptor,
    ) -> Result<WgpuTarget, TargetError> {
        if desc.width == 0 || desc.height == 0 {
            return Err(TargetError::ZeroSize);
        }
        let max = self.context.device.limits().max_texture_dimension_2d;
        if desc.width > max || desc.height > max {
            return Err(TargetError::Backend(format!(
                "{}x{} exceeds the {max} texture limit",
                desc.width, desc.height
            )));
        }
        if !self.context.supports_samples(desc.sample_count) {
            return Err(TargetError::UnsupportedSampleCount(desc.sample_count));
        }

        let device = &self.context.device;
        let size = (desc.width, desc.height);
        let owns_color = desc.color
            && (desc.kind == TargetKind::Offscreen
                || !self.context.has_surface());
        let color = owns_color.then(|| {
            Attachment::new(
                device,
                "Target Color",
                size,
                desc.sample_count,
                self.context.format(),
            )
        });
        let depth = desc.depth.then(|| {
            Attachment::new(
                device,
                "Target Depth",
                size,
                desc.sample_count,
                DEPTH_FORMAT,
            )
        });
        Ok(WgpuTarget {
            kind: desc.kind,
            samples: desc.sample_count,
            size,
            color,
            depth,
        })
    }

    fn begin_frame(&mut self) -> Result<(), TargetError> {
        self.frame = None;
        let (surface_texture, surface_view) = if self.context.has_surface() {
            match self.context.get_next_frame() {
                Ok(texture) => {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    (Some(texture), Some(view))
                }
                Err(e) => {
                    if matches!(
                        e,
                        wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated
                    ) {
                        self.context.reconfigure();
                    }
                    return Err(TargetError::Surface(e.to_string()));
                }
            }
        } else {
            (None, None)
        };
        self.frame = Some(Frame {
            surface_texture,
            surface_view,
            encoder: self.context.create_encoder(),
        });
        Ok(())
    }

    fn enable(&mut self, target: &WgpuTarget) {
        let clear = self.clear_color;
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let color_view = match (&target.color, &frame.surface_view) {
            (Some(color), _) => &color.view,
            (None, Some(view)) => view,
            (None, None) => return,
        };
        let _ = begin(
            &mut frame.encoder,
            "Clear Pass",
            color_view,
            None,
            target.depth.as_ref().map(|d| &d.view),
            Some(clear),
        );
    }

    fn resolve(&mut self, src: &WgpuTarget, dst: &WgpuTarget) {
        let Some(frame) = self.frame.as_mut() else {
            return;
        };
        let Some(src_color) = src.color.as_ref() else {
            return;
        };
        let dst_view = match (&dst.color, &frame.surface_view) {
            (Some(color), _) => &color.view,
            (None, Some(view)) => view,
            (None, None) => return,
        };
        let _ = begin(
            &mut frame.encoder,
            "Resolve Pass",
            &src_color.view,
            Some(dst_view),
            None,
            None,
        );
    }

    fn present(&mut self) {
        let Some(frame) = self.frame.take() else {
            return;
        };
        self.context.submit(frame.encoder);
        drop(frame.surface_view);
        if let Some(texture) = frame.surface_texture {
            texture.present();
        }
    }
}
