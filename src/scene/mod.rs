//! Scene content consumed by the engine: extents, stored camera views,
//! mesh readiness and the GPU buffers of its meshes.
//!
//! The engine only sees the [`SceneModel`] trait. [`Scene`] is the concrete
//! model used by the viewer and drawn by
//! [`FlatRenderer`](crate::renderer::flat::FlatRenderer).

/// CPU meshes and their registered GPU buffers.
pub mod mesh;

use glam::DVec3;

use crate::camera::bounds::BoundingBox;
use crate::camera::core::{PoseError, Projection, ViewportPose};
pub use mesh::{FlatVertex, MeshBuffers, MeshData, MeshRegistry};

/// A camera view stored with the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoredView {
    /// Camera position.
    pub camera_location: DVec3,
    /// Look-at point.
    pub target: DVec3,
    /// Up vector (need not be unit length).
    pub up: DVec3,
    /// Projection kind.
    pub projection: Projection,
    /// 35 mm equivalent lens length.
    pub lens_length: f64,
}

impl StoredView {
    /// Pose for this view.
    ///
    /// # Errors
    ///
    /// [`PoseError`] when the stored vectors do not form a valid pose.
    pub fn to_pose(&self) -> Result<ViewportPose, PoseError> {
        let mut pose =
            ViewportPose::new(self.camera_location, self.target, self.up)?;
        pose.projection = self.projection;
        pose.set_lens_length(self.lens_length);
        Ok(pose)
    }
}

/// What the render loop needs from a loaded scene.
pub trait SceneModel {
    /// World extents of the geometry, `None` before anything is loaded.
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Views stored with the scene, in file order.
    fn stored_views(&self) -> &[StoredView];

    /// Mesh preparation finished and the scene can be drawn.
    fn is_ready_for_rendering(&self) -> bool;

    /// Release every vertex and index buffer of the scene's meshes.
    /// Returns the number of buffers released.
    fn release_gpu_buffers(&mut self) -> usize;
}

/// Meshes plus stored views. `Buf` is the GPU buffer type the renderer
/// registers for each mesh.
#[derive(Debug)]
pub struct Scene<Buf = wgpu::Buffer> {
    meshes: Vec<MeshData>,
    views: Vec<StoredView>,
    bounds: Option<BoundingBox>,
    gpu: MeshRegistry<Buf>,
    prepared: bool,
}

impl<Buf> Default for Scene<Buf> {
    fn default() -> Self {
        Self {
            meshes: Vec::new(),
            views: Vec::new(),
            bounds: None,
            gpu: MeshRegistry::new(),
            prepared: false,
        }
    }
}

impl<Buf> Scene<Buf> {
    /// Empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a mesh. The scene needs preparing again afterwards and its
    /// GPU buffers are re-uploaded on the next draw.
    pub fn add_mesh(&mut self, mesh: MeshData) {
        let _ = self.gpu.release_all();
        self.meshes.push(mesh);
        self.prepared = false;
    }

    /// Append a stored view.
    pub fn add_view(&mut self, view: StoredView) {
        self.views.push(view);
    }

    /// CPU meshes in insertion order.
    #[must_use]
    pub fn meshes(&self) -> &[MeshData] {
        &self.meshes
    }

    /// GPU buffers registered by the renderer.
    #[must_use]
    pub fn gpu_meshes(&self) -> &MeshRegistry<Buf> {
        &self.gpu
    }

    /// Mutable GPU registry for the renderer's uploads.
    pub fn gpu_meshes_mut(&mut self) -> &mut MeshRegistry<Buf> {
        &mut self.gpu
    }

    /// Validate the meshes and compute the scene extents. Returns whether
    /// preparation succeeded; the scene is ready for rendering only then.
    pub fn prepare(&mut self) -> bool {
        if let Some(bad) = self.meshes.iter().position(|m| !m.is_valid()) {
            log::warn!("mesh {bad} has out-of-range indices");
            self.prepared = false;
            return false;
        }
        self.bounds = self
            .meshes
            .iter()
            .filter_map(MeshData::bounds)
            .reduce(|a, b| a.union(&b));
        self.prepared = self.bounds.is_some();
        log::info!(
            "scene prepared: {} meshes, bounds {:?}",
            self.meshes.len(),
            self.bounds
        );
        self.prepared
    }
}

impl<Buf> SceneModel for Scene<Buf> {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }

    fn stored_views(&self) -> &[StoredView] {
        &self.views
    }

    fn is_ready_for_rendering(&self) -> bool {
        self.prepared
    }

    fn release_gpu_buffers(&mut self) -> usize {
        self.gpu.release_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box(offset: f64) -> MeshData {
        MeshData::cuboid(
            &BoundingBox::new(
                DVec3::splat(offset),
                DVec3::splat(offset + 1.0),
            ),
            [1.0; 4],
        )
    }

    #[test]
    fn prepare_unions_mesh_bounds() {
        let mut scene: Scene<()> = Scene::new();
        assert!(!scene.prepare());
        scene.add_mesh(unit_box(0.0));
        scene.add_mesh(unit_box(2.0));
        assert!(!scene.is_ready_for_rendering());
        assert!(scene.prepare());
        assert!(scene.is_ready_for_rendering());
        assert_eq!(
            scene.bounding_box(),
            Some(BoundingBox::new(DVec3::ZERO, DVec3::splat(3.0)))
        );
    }

    #[test]
    fn invalid_mesh_fails_preparation() {
        let mut scene: Scene<()> = Scene::new();
        let mut mesh = unit_box(0.0);
        mesh.indices.push(7);
        scene.add_mesh(mesh);
        assert!(!scene.prepare());
        assert!(!scene.is_ready_for_rendering());
    }

    #[test]
    fn stored_view_builds_pose() {
        let view = StoredView {
            camera_location: DVec3::new(0.0, 0.0, 8.0),
            target: DVec3::ZERO,
            up: DVec3::new(0.0, 2.0, 0.0),
            projection: Projection::Perspective,
            lens_length: 35.0,
        };
        let pose = view.to_pose().unwrap();
        assert_eq!(pose.lens_length(), 35.0);
        assert!((pose.up().length() - 1.0).abs() < 1e-12);

        let bad = StoredView {
            target: view.camera_location,
            ..view
        };
        assert!(bad.to_pose().is_err());
    }

    #[test]
    fn release_gpu_buffers_empties_registry() {
        let mut scene: Scene<u8> = Scene::new();
        scene.gpu_meshes_mut().register(false, MeshBuffers::new(1, 2, 3));
        assert_eq!(scene.release_gpu_buffers(), 2);
        assert!(scene.gpu_meshes().is_empty());
    }
}
