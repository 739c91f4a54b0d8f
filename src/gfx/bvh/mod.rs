//! # Bounding Volume Hierarchy
//!
//! A binary BVH stored as a flat, append-only array of [`BvhBox`]es that a
//! shader can walk with plain integer indices.
//!
//! ## Layout
//!
//! - Children are always written before their parent, so every `left_id` /
//!   `right_id` is smaller than the index of the box referencing it.
//! - Each box covers a half-open range `[start, end)` of the triangle array as
//!   reordered by the build.
//! - Leaves hold at most [`LEAF_THRESHOLD`] triangles and use
//!   [`LEAF_SENTINEL`] for both child ids.
//!
//! ## Usage
//!
//! ```no_run
//! use raybake::gfx::bvh;
//! # let mut triangles: Vec<raybake::gfx::scene::GpuTriangle> = Vec::new();
//!
//! let tree = bvh::build(&mut triangles);
//! println!("root box: {}", tree.root_id());
//! ```

pub mod builder;
pub mod validate;

pub use builder::{build, build_range};
pub use validate::BvhError;

use crate::gfx::geometry::{Bounds, GpuVec3};

/// Maximum number of triangles a leaf references directly.
pub const LEAF_THRESHOLD: usize = 8;

/// Child id stored in both `left_id` and `right_id` of a leaf.
pub const LEAF_SENTINEL: i32 = -1;

/// Largest triangle count a tree can index.
///
/// Box ids and ranges are `i32` on the GPU and a tree over `n` triangles has
/// fewer than `2n` boxes, so `n` is capped at half of `i32::MAX`.
pub const MAX_TRIANGLES: usize = (i32::MAX / 2) as usize;

/// One node of the flattened tree, in the layout the shader reads.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BvhBox {
    pub min: GpuVec3,
    pub max: GpuVec3,
    pub left_id: i32,
    pub right_id: i32,
    pub start: i32,
    pub end: i32,
}

const _: () = assert!(std::mem::size_of::<BvhBox>() == 48);

// Callers keep every index below `2 * MAX_TRIANGLES`, which fits in `i32`.
impl BvhBox {
    pub fn leaf(bounds: Bounds, start: usize, end: usize) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            left_id: LEAF_SENTINEL,
            right_id: LEAF_SENTINEL,
            start: start as i32,
            end: end as i32,
        }
    }

    pub fn internal(bounds: Bounds, left: usize, right: usize, start: usize, end: usize) -> Self {
        Self {
            min: bounds.min,
            max: bounds.max,
            left_id: left as i32,
            right_id: right as i32,
            start: start as i32,
            end: end as i32,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.left_id == LEAF_SENTINEL
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.min, self.max)
    }

    /// Number of triangles covered by this box's subtree.
    pub fn len(&self) -> usize {
        (self.end - self.start).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A built tree: the box array plus the index of its root.
#[derive(Clone, Debug, Default)]
pub struct Bvh {
    boxes: Vec<BvhBox>,
    root: Option<usize>,
}

impl Bvh {
    /// A tree over zero triangles. Its root handle is [`LEAF_SENTINEL`].
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(boxes: Vec<BvhBox>, root: usize) -> Self {
        Self {
            boxes,
            root: Some(root),
        }
    }

    pub fn boxes(&self) -> &[BvhBox] {
        &self.boxes
    }

    pub fn into_boxes(self) -> Vec<BvhBox> {
        self.boxes
    }

    /// Root index as exposed to the shader, `-1` for an empty tree.
    pub fn root_id(&self) -> i32 {
        self.root.map_or(LEAF_SENTINEL, |root| root as i32)
    }

    pub fn root(&self) -> Option<&BvhBox> {
        self.root.and_then(|root| self.boxes.get(root))
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}
