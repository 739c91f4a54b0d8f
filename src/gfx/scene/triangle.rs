//! # Triangle Records
//!
//! Local-space triangles as they come out of a scene loader, and the
//! GPU-format world-space triangles produced by flattening.

use cgmath::Vector3;

use crate::gfx::geometry::{Bounds, GpuVec3};

/// Texture id meaning "no texture bound".
pub const NO_TEXTURE: u32 = u32::MAX;

/// Material references carried through flattening and the BVH build unchanged.
///
/// Texture ids index the process-wide [`MaterialTable`](super::MaterialTable).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MaterialRef {
    pub texture_id: u32,
    pub metallic_roughness_texture_id: u32,
    pub metallic_factor: f64,
    pub roughness_factor: f64,
    pub alpha_cutoff: f64,
    pub double_sided: bool,
}

impl Default for MaterialRef {
    fn default() -> Self {
        Self {
            texture_id: NO_TEXTURE,
            metallic_roughness_texture_id: NO_TEXTURE,
            metallic_factor: 1.0,
            roughness_factor: 1.0,
            alpha_cutoff: 0.0,
            double_sided: false,
        }
    }
}

/// A triangle in its node's local frame, in double precision.
///
/// `min`/`max` describe the local-space box only. After a transform the box
/// has to be rebuilt from the transformed vertices.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub v1: Vector3<f64>,
    pub v2: Vector3<f64>,
    pub v3: Vector3<f64>,
    pub uv1: [f64; 2],
    pub uv2: [f64; 2],
    pub uv3: [f64; 2],
    pub min: Vector3<f64>,
    pub max: Vector3<f64>,
    pub material: MaterialRef,
}

impl Triangle {
    /// Create a triangle with zeroed UVs and the default material.
    pub fn new(v1: Vector3<f64>, v2: Vector3<f64>, v3: Vector3<f64>) -> Self {
        let min = Vector3::new(
            v1.x.min(v2.x).min(v3.x),
            v1.y.min(v2.y).min(v3.y),
            v1.z.min(v2.z).min(v3.z),
        );
        let max = Vector3::new(
            v1.x.max(v2.x).max(v3.x),
            v1.y.max(v2.y).max(v3.y),
            v1.z.max(v2.z).max(v3.z),
        );

        Self {
            v1,
            v2,
            v3,
            uv1: [0.0; 2],
            uv2: [0.0; 2],
            uv3: [0.0; 2],
            min,
            max,
            material: MaterialRef::default(),
        }
    }

    pub fn with_uvs(mut self, uv1: [f64; 2], uv2: [f64; 2], uv3: [f64; 2]) -> Self {
        self.uv1 = uv1;
        self.uv2 = uv2;
        self.uv3 = uv3;
        self
    }

    pub fn with_material(mut self, material: MaterialRef) -> Self {
        self.material = material;
        self
    }

    pub fn vertices(&self) -> [Vector3<f64>; 3] {
        [self.v1, self.v2, self.v3]
    }
}

/// World-space triangle in the layout the ray tracing shader reads.
///
/// 128 bytes, no implicit padding. Every `GpuVec3` sits on a 16 byte offset
/// so the struct matches a std430 / WGSL storage layout byte-for-byte.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuTriangle {
    pub v1: GpuVec3,
    pub v2: GpuVec3,
    pub v3: GpuVec3,
    pub min: GpuVec3,
    pub max: GpuVec3,
    pub uv1: [f32; 2],
    pub uv2: [f32; 2],
    pub uv3: [f32; 2],
    pub texture_id: u32,
    pub metallic_roughness_texture_id: u32,
    pub metallic_factor: f32,
    pub roughness_factor: f32,
    pub alpha_cutoff: f32,
    pub double_sided: u32,
}

const _: () = assert!(std::mem::size_of::<GpuTriangle>() == 128);

impl GpuTriangle {
    /// Build a GPU triangle from already transformed vertices, recomputing
    /// its box from those vertices.
    pub fn from_world(vertices: [GpuVec3; 3], source: &Triangle) -> Self {
        let bounds = Bounds::from_points(vertices);
        let uv = |uv: [f64; 2]| [uv[0] as f32, uv[1] as f32];

        Self {
            v1: vertices[0],
            v2: vertices[1],
            v3: vertices[2],
            min: bounds.min,
            max: bounds.max,
            uv1: uv(source.uv1),
            uv2: uv(source.uv2),
            uv3: uv(source.uv3),
            texture_id: source.material.texture_id,
            metallic_roughness_texture_id: source.material.metallic_roughness_texture_id,
            metallic_factor: source.material.metallic_factor as f32,
            roughness_factor: source.material.roughness_factor as f32,
            alpha_cutoff: source.material.alpha_cutoff as f32,
            double_sided: source.material.double_sided as u32,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    pub fn vertices(&self) -> [GpuVec3; 3] {
        [self.v1, self.v2, self.v3]
    }
}
