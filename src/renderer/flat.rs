//! Flat-shaded renderer for [`Scene`] meshes plus a wireframe of the scene
//! bounds.
//!
//! Pipelines are created lazily per (sample count, pass) so the same
//! renderer draws into both the multisampled and the visible target.

use rustc_hash::FxHashMap;
use wgpu::util::DeviceExt;

use super::pipeline_util;
use super::SceneRenderer;
use crate::camera::bounds::BoundingBox;
use crate::camera::core::{CameraUniform, ViewportPose};
use crate::gpu::framebuffer::RenderTarget;
use crate::gpu::render_context::RenderContext;
use crate::gpu::target::{WgpuBackend, WgpuTarget};
use crate::scene::{FlatVertex, MeshBuffers, Scene, SceneModel};

const VERTEX_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x4];

/// Corner pairs of a box's twelve edges, indexed as in
/// [`BoundingBox::corners`].
const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (2, 3),
    (4, 5),
    (6, 7),
    (0, 2),
    (1, 3),
    (4, 6),
    (5, 7),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum FlatPass {
    Opaque,
    Transparent,
    Lines,
}

impl FlatPass {
    const ALL: [Self; 3] = [Self::Opaque, Self::Transparent, Self::Lines];
}

struct Wireframe {
    bounds: BoundingBox,
    buffer: wgpu::Buffer,
    vertex_count: u32,
}

/// Line-list vertices for the edges of `bounds`.
#[must_use]
pub fn wireframe_vertices(
    bounds: &BoundingBox,
    color: [f32; 4],
) -> Vec<FlatVertex> {
    let corners = bounds.corners();
    BOX_EDGES
        .iter()
        .flat_map(|&(a, b)| {
            [
                FlatVertex::new(corners[a], color),
                FlatVertex::new(corners[b], color),
            ]
        })
        .collect()
}

/// Draws every registered mesh of a [`Scene`] and its bounds wireframe.
pub struct FlatRenderer {
    shader: wgpu::ShaderModule,
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    uniform: CameraUniform,
    pipelines: FxHashMap<(u32, FlatPass), wgpu::RenderPipeline>,
    wireframe: Option<Wireframe>,
    wireframe_color: [f32; 4],
}

impl FlatRenderer {
    /// Renderer for targets in the context's surface format.
    #[must_use]
    pub fn new(context: &RenderContext) -> Self {
        let device = &context.device;
        let shader =
            device.create_shader_module(wgpu::include_wgsl!("flat.wgsl"));

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Flat Camera Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });
        let uniform = CameraUniform::new();
        let camera_buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Flat Camera Buffer"),
                contents: bytemuck::bytes_of(&uniform),
                usage: wgpu::BufferUsages::UNIFORM
                    | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Flat Camera Bind Group"),
                layout: &bind_group_layout,
                entries: &[wgpu::BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            });
        let layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Flat Pipeline Layout"),
                bind_group_layouts: &[&bind_group_layout],
                push_constant_ranges: &[],
            });

        Self {
            shader,
            layout,
            format: context.format(),
            camera_buffer,
            camera_bind_group,
            uniform,
            pipelines: FxHashMap::default(),
            wireframe: None,
            wireframe_color: [0.9, 0.9, 0.9, 1.0],
        }
    }

    /// Color of the bounds wireframe.
    pub fn set_wireframe_color(&mut self, color: [f32; 4]) {
        self.wireframe_color = color;
        self.wireframe = None;
    }

    fn ensure_pipelines(&mut self, device: &wgpu::Device, samples: u32) {
        for pass in FlatPass::ALL {
            if !self.pipelines.contains_key(&(samples, pass)) {
                let pipeline = self.create_pipeline(device, samples, pass);
                let _ = self.pipelines.insert((samples, pass), pipeline);
            }
        }
    }

    fn create_pipeline(
        &self,
        device: &wgpu::Device,
        samples: u32,
        pass: FlatPass,
    ) -> wgpu::RenderPipeline {
        let (topology, blend, depth_write) = match pass {
            FlatPass::Opaque => (
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::BlendState::REPLACE,
                true,
            ),
            FlatPass::Transparent => (
                wgpu::PrimitiveTopology::TriangleList,
                wgpu::BlendState::ALPHA_BLENDING,
                false,
            ),
            FlatPass::Lines => (
                wgpu::PrimitiveTopology::LineList,
                wgpu::BlendState::REPLACE,
                true,
            ),
        };
        log::debug!("creating {pass:?} pipeline for {samples}x targets");
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(&format!("Flat {pass:?} {samples}x")),
            layout: Some(&self.layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: size_of::<FlatVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &VERTEX_ATTRIBUTES,
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &pipeline_util::color_target(self.format, Some(blend)),
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology,
                ..Default::default()
            },
            depth_stencil: Some(pipeline_util::depth_stencil_state(
                depth_write,
            )),
            multisample: wgpu::MultisampleState {
                count: samples,
                ..Default::default()
            },
            multiview: None,
            cache: None,
        })
    }

    fn update_wireframe(
        &mut self,
        device: &wgpu::Device,
        bounds: Option<BoundingBox>,
    ) {
        let Some(bounds) = bounds.filter(BoundingBox::is_valid) else {
            self.wireframe = None;
            return;
        };
        if self.wireframe.as_ref().is_some_and(|w| w.bounds == bounds) {
            return;
        }
        let vertices = wireframe_vertices(&bounds, self.wireframe_color);
        let buffer =
            device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Bounds Wireframe"),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        self.wireframe = Some(Wireframe {
            bounds,
            buffer,
            vertex_count: vertices.len() as u32,
        });
    }
}

/// Create and register GPU buffers for every non-empty mesh.
fn upload_meshes(device: &wgpu::Device, scene: &mut Scene) {
    let uploads: Vec<_> = scene
        .meshes()
        .iter()
        .filter(|mesh| !mesh.indices.is_empty())
        .map(|mesh| {
            let vertex =
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Vertices"),
                    contents: bytemuck::cast_slice(&mesh.vertices),
                    usage: wgpu::BufferUsages::VERTEX,
                });
            let index =
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("Mesh Indices"),
                    contents: bytemuck::cast_slice(&mesh.indices),
                    usage: wgpu::BufferUsages::INDEX,
                });
            let count = mesh.indices.len() as u32;
            (mesh.transparent, MeshBuffers::new(vertex, index, count))
        })
        .collect();
    log::debug!("uploaded {} meshes", uploads.len());
    let registry = scene.gpu_meshes_mut();
    for (transparent, buffers) in uploads {
        registry.register(transparent, buffers);
    }
}

impl SceneRenderer<Scene, WgpuBackend> for FlatRenderer {
    fn render_model(
        &mut self,
        scene: &mut Scene,
        viewport: &ViewportPose,
        backend: &mut WgpuBackend,
        target: &WgpuTarget,
    ) {
        let samples = target.samples();
        {
            let context = backend.context();
            self.uniform.update_view_proj(viewport);
            context.queue.write_buffer(
                &self.camera_buffer,
                0,
                bytemuck::bytes_of(&self.uniform),
            );
            self.ensure_pipelines(&context.device, samples);
            if scene.gpu_meshes().is_empty() && !scene.meshes().is_empty() {
                upload_meshes(&context.device, scene);
            }
            self.update_wireframe(&context.device, scene.bounding_box());
        }

        let Some(mut pass) = backend.begin_pass(target, "Flat Pass") else {
            return;
        };
        pass.set_bind_group(0, &self.camera_bind_group, &[]);

        let registry = scene.gpu_meshes();
        for (kind, meshes) in [
            (FlatPass::Opaque, registry.opaque()),
            (FlatPass::Transparent, registry.transparent()),
        ] {
            let Some(pipeline) = self.pipelines.get(&(samples, kind)) else {
                continue;
            };
            pass.set_pipeline(pipeline);
            for mesh in meshes {
                let (Some(vertex), Some(index)) = (mesh.vertex(), mesh.index())
                else {
                    continue;
                };
                pass.set_vertex_buffer(0, vertex.slice(..));
                pass.set_index_buffer(
                    index.slice(..),
                    wgpu::IndexFormat::Uint32,
                );
                pass.draw_indexed(0..mesh.index_count(), 0, 0..1);
            }
        }

        if let (Some(wire), Some(pipeline)) = (
            self.wireframe.as_ref(),
            self.pipelines.get(&(samples, FlatPass::Lines)),
        ) {
            pass.set_pipeline(pipeline);
            pass.set_vertex_buffer(0, wire.buffer.slice(..));
            pass.draw(0..wire.vertex_count, 0..1);
        }
    }
}
