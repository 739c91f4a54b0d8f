//! # GPU Geometry Helpers
//!
//! Shared vector and bounding-box types used by both the transform flattener
//! and the BVH builder.
//!
//! - [`GpuVec3`] - single precision vector padded to 16 bytes for storage buffers
//! - [`Bounds`] - axis-aligned bounding box over [`GpuVec3`] corners
//! - [`Axis`] - split axis that cycles x → y → z → x by tree depth

use cgmath::Vector3;

/// A 3-component single precision vector with one float of padding.
///
/// The padding makes the struct 16 bytes, matching the alignment a `vec3<f32>`
/// gets inside a WGSL/GLSL storage buffer struct. It is uploaded byte-for-byte,
/// so field order is part of the GPU contract.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub _pad: f32,
}

impl GpuVec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z, _pad: 0.0 }
    }

    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }

    /// Narrow a double precision vector to the GPU representation.
    pub fn from_f64(v: Vector3<f64>) -> Self {
        Self::new(v.x as f32, v.y as f32, v.z as f32)
    }

    pub fn min_by_component(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max_by_component(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn component(self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
        }
    }
}

impl From<[f32; 3]> for GpuVec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// Coordinate axis used as the partition key when splitting a BVH range.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// The axis used one level deeper in the tree.
    pub fn next(self) -> Self {
        match self {
            Axis::X => Axis::Y,
            Axis::Y => Axis::Z,
            Axis::Z => Axis::X,
        }
    }
}

/// Axis-aligned bounding box in world space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min: GpuVec3,
    pub max: GpuVec3,
}

impl Bounds {
    /// The identity element for [`Bounds::union`].
    ///
    /// The running maximum starts at negative infinity. `f32::MIN_POSITIVE`
    /// is the smallest positive float and would clip every negative coordinate.
    pub const EMPTY: Bounds = Bounds {
        min: GpuVec3::splat(f32::INFINITY),
        max: GpuVec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: GpuVec3, max: GpuVec3) -> Self {
        Self { min, max }
    }

    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = GpuVec3>,
    {
        points
            .into_iter()
            .fold(Self::EMPTY, |bounds, p| bounds.include_point(p))
    }

    pub fn include_point(self, p: GpuVec3) -> Self {
        Self {
            min: self.min.min_by_component(p),
            max: self.max.max_by_component(p),
        }
    }

    pub fn union(self, other: Bounds) -> Self {
        Self {
            min: self.min.min_by_component(other.min),
            max: self.max.max_by_component(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}
