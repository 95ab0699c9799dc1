//! CPU mesh data and the GPU buffers registered for it.

use bytemuck::{Pod, Zeroable};
use glam::DVec3;

use crate::camera::bounds::BoundingBox;

/// Interleaved vertex consumed by the flat-shaded renderer.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FlatVertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Linear RGBA color.
    pub color: [f32; 4],
}

impl FlatVertex {
    /// Vertex at `position` with `color`.
    #[must_use]
    pub fn new(position: DVec3, color: [f32; 4]) -> Self {
        Self {
            position: position.as_vec3().to_array(),
            color,
        }
    }
}

/// Triangle mesh on the CPU side.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertices.
    pub vertices: Vec<FlatVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
    /// Drawn after opaque meshes with depth writes off.
    pub transparent: bool,
}

impl MeshData {
    /// Whether every index refers to an existing vertex and the index
    /// count forms whole triangles.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let count = self.vertices.len();
        self.indices.len() % 3 == 0
            && self.indices.iter().all(|&i| (i as usize) < count)
    }

    /// Bounds of the vertex positions.
    #[must_use]
    pub fn bounds(&self) -> Option<BoundingBox> {
        let points: Vec<DVec3> = self
            .vertices
            .iter()
            .map(|v| DVec3::from(v.position.map(f64::from)))
            .collect();
        BoundingBox::from_points(&points)
    }

    /// Axis-aligned box filling `bounds`, one color per face pair.
    #[must_use]
    pub fn cuboid(bounds: &BoundingBox, color: [f32; 4]) -> Self {
        const FACES: [([usize; 4], f32); 6] = [
            ([0, 2, 6, 4], 0.70),
            ([1, 5, 7, 3], 0.70),
            ([0, 4, 5, 1], 0.85),
            ([2, 3, 7, 6], 0.85),
            ([0, 1, 3, 2], 1.00),
            ([4, 6, 7, 5], 1.00),
        ];
        let corners = bounds.corners();
        let mut mesh = Self {
            transparent: color[3] < 1.0,
            ..Self::default()
        };
        for (quad, shade) in FACES {
            let base = mesh.vertices.len() as u32;
            let shaded = [
                color[0] * shade,
                color[1] * shade,
                color[2] * shade,
                color[3],
            ];
            mesh.vertices.extend(
                quad.iter().map(|&c| FlatVertex::new(corners[c], shaded)),
            );
            mesh.indices.extend_from_slice(&[
                base,
                base + 1,
                base + 2,
                base,
                base + 2,
                base + 3,
            ]);
        }
        mesh
    }
}

/// Vertex and index buffers of one registered mesh. Either buffer may be
/// absent; releasing takes them so each is dropped exactly once.
#[derive(Debug)]
pub struct MeshBuffers<Buf> {
    vertex: Option<Buf>,
    index: Option<Buf>,
    index_count: u32,
}

impl<Buf> MeshBuffers<Buf> {
    /// Buffers drawing `index_count` indices.
    pub fn new(vertex: Buf, index: Buf, index_count: u32) -> Self {
        Self {
            vertex: Some(vertex),
            index: Some(index),
            index_count,
        }
    }

    /// Vertex buffer, if still held.
    #[must_use]
    pub fn vertex(&self) -> Option<&Buf> {
        self.vertex.as_ref()
    }

    /// Index buffer, if still held.
    #[must_use]
    pub fn index(&self) -> Option<&Buf> {
        self.index.as_ref()
    }

    /// Number of indices to draw.
    #[must_use]
    pub fn index_count(&self) -> u32 {
        self.index_count
    }

    /// Both buffers are held.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.vertex.is_some() && self.index.is_some()
    }

    /// Drop both buffers. Returns how many were held.
    pub fn release(&mut self) -> usize {
        let released = usize::from(self.vertex.take().is_some())
            + usize::from(self.index.take().is_some());
        self.index_count = 0;
        released
    }
}

/// GPU buffers of every opaque and transparent mesh of a scene.
#[derive(Debug)]
pub struct MeshRegistry<Buf> {
    opaque: Vec<MeshBuffers<Buf>>,
    transparent: Vec<MeshBuffers<Buf>>,
}

impl<Buf> Default for MeshRegistry<Buf> {
    fn default() -> Self {
        Self {
            opaque: Vec::new(),
            transparent: Vec::new(),
        }
    }
}

impl<Buf> MeshRegistry<Buf> {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add buffers to the opaque or transparent list.
    pub fn register(&mut self, transparent: bool, buffers: MeshBuffers<Buf>) {
        if transparent {
            self.transparent.push(buffers);
        } else {
            self.opaque.push(buffers);
        }
    }

    /// Opaque meshes in registration order.
    #[must_use]
    pub fn opaque(&self) -> &[MeshBuffers<Buf>] {
        &self.opaque
    }

    /// Transparent meshes in registration order.
    #[must_use]
    pub fn transparent(&self) -> &[MeshBuffers<Buf>] {
        &self.transparent
    }

    /// No meshes registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.opaque.is_empty() && self.transparent.is_empty()
    }

    /// Release the vertex and index buffers of every mesh and forget the
    /// meshes. Returns the number of buffers released.
    pub fn release_all(&mut self) -> usize {
        let released = self
            .opaque
            .iter_mut()
            .chain(self.transparent.iter_mut())
            .map(MeshBuffers::release)
            .sum();
        self.opaque.clear();
        self.transparent.clear();
        released
    }
}
