//! GPU scene export
//!
//! Uploads a [`PreparedScene`] as two read-only storage arrays plus a small
//! uniform carrying the BVH root handle and the triangle count. The shader
//! side struct declarations live in [`SCENE_STRUCTS_WGSL`] and MUST match the
//! host layouts of [`GpuTriangle`], [`BvhBox`] and [`SceneUniforms`] exactly.

use crate::{
    gfx::{bvh::BvhBox, scene::GpuTriangle},
    pipeline::PreparedScene,
    wgpu_utils::{binding_types, ArrayBuffer, UniformBuffer},
};

/// Binding index of the triangle array.
pub const TRIANGLE_BINDING: u32 = 0;
/// Binding index of the box array.
pub const BOX_BINDING: u32 = 1;
/// Binding index of [`SceneUniforms`].
pub const UNIFORM_BINDING: u32 = 2;

/// Per-scene uniform content.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    /// Index of the root box, `-1` when the scene has no triangles.
    pub root_id: i32,
    pub triangle_count: u32,
    pub _padding: [u32; 2],
}

const _: () = assert!(std::mem::size_of::<SceneUniforms>() == 16);

impl SceneUniforms {
    pub fn new(root_id: i32, triangle_count: u32) -> Self {
        Self {
            root_id,
            triangle_count,
            _padding: [0; 2],
        }
    }
}

/// WGSL declarations matching the host structs byte for byte.
///
/// `vec3<f32>` members carry `@size(16)` so the padding float of
/// [`GpuVec3`](crate::gfx::geometry::GpuVec3) is accounted for.
pub const SCENE_STRUCTS_WGSL: &str = r#"
struct Triangle {
    @size(16) v1: vec3<f32>,
    @size(16) v2: vec3<f32>,
    @size(16) v3: vec3<f32>,
    @size(16) min: vec3<f32>,
    @size(16) max: vec3<f32>,
    uv1: vec2<f32>,
    uv2: vec2<f32>,
    uv3: vec2<f32>,
    texture_id: u32,
    metallic_roughness_texture_id: u32,
    metallic_factor: f32,
    roughness_factor: f32,
    alpha_cutoff: f32,
    double_sided: u32,
};

struct BvhBox {
    @size(16) min: vec3<f32>,
    @size(16) max: vec3<f32>,
    left_id: i32,
    right_id: i32,
    start: i32,
    end: i32,
};

struct SceneUniforms {
    root_id: i32,
    triangle_count: u32,
    _padding: vec2<u32>,
};

@group(0) @binding(0) var<storage, read> triangles: array<Triangle>;
@group(0) @binding(1) var<storage, read> boxes: array<BvhBox>;
@group(0) @binding(2) var<uniform> scene: SceneUniforms;
"#;

/// GPU resources of one uploaded scene.
pub struct GpuScene {
    triangles: ArrayBuffer<GpuTriangle>,
    boxes: ArrayBuffer<BvhBox>,
    uniforms: UniformBuffer<SceneUniforms>,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl GpuScene {
    /// Create all buffers for `scene` and the bind group exposing them.
    pub fn upload(device: &wgpu::Device, scene: &PreparedScene) -> Self {
        let triangles = ArrayBuffer::new_with_data(device, scene.triangles());
        let boxes = ArrayBuffer::new_with_data(device, scene.bvh().boxes());
        let uniforms = UniformBuffer::new_with_data(device, &scene.uniforms());
        let layout = Self::create_layout(device);
        let bind_group = create_bind_group(device, &layout, &triangles, &boxes, &uniforms);

        log::info!(
            "Uploaded scene: {} triangles, {} boxes, root {}",
            triangles.len(),
            boxes.len(),
            scene.root_id()
        );

        Self {
            triangles,
            boxes,
            uniforms,
            layout,
            bind_group,
        }
    }

    /// Replace the uploaded contents with a rebuilt scene.
    ///
    /// Buffers are rewritten in place when the new arrays fit. Otherwise they
    /// are recreated, and so is the bind group. The layout never changes.
    pub fn update(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &PreparedScene) {
        self.uniforms.update_content(queue, scene.uniforms());

        let mut recreated = false;
        if !self.triangles.update_data(queue, scene.triangles()) {
            self.triangles = ArrayBuffer::new_with_data(device, scene.triangles());
            recreated = true;
        }
        if !self.boxes.update_data(queue, scene.bvh().boxes()) {
            self.boxes = ArrayBuffer::new_with_data(device, scene.bvh().boxes());
            recreated = true;
        }

        if recreated {
            log::debug!("Scene buffers outgrown, recreating bind group");
            self.bind_group = create_bind_group(
                device,
                &self.layout,
                &self.triangles,
                &self.boxes,
                &self.uniforms,
            );
        }
    }

    /// Layout of the scene bind group, usable before any scene exists.
    pub fn create_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
        let visibility = wgpu::ShaderStages::FRAGMENT | wgpu::ShaderStages::COMPUTE;
        device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Scene Bind Group Layout"),
            entries: &[
                binding_types::layout_entry(
                    TRIANGLE_BINDING,
                    visibility,
                    binding_types::storage_buffer_read_only(),
                ),
                binding_types::layout_entry(
                    BOX_BINDING,
                    visibility,
                    binding_types::storage_buffer_read_only(),
                ),
                binding_types::layout_entry(UNIFORM_BINDING, visibility, binding_types::uniform()),
            ],
        })
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    pub fn triangle_buffer(&self) -> &wgpu::Buffer {
        self.triangles.buffer()
    }

    pub fn box_buffer(&self) -> &wgpu::Buffer {
        self.boxes.buffer()
    }

    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        self.uniforms.buffer()
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    triangles: &ArrayBuffer<GpuTriangle>,
    boxes: &ArrayBuffer<BvhBox>,
    uniforms: &UniformBuffer<SceneUniforms>,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Scene Bind Group"),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: TRIANGLE_BINDING,
                resource: triangles.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: BOX_BINDING,
                resource: boxes.binding_resource(),
            },
            wgpu::BindGroupEntry {
                binding: UNIFORM_BINDING,
                resource: uniforms.binding_resource(),
            },
        ],
    })
}
