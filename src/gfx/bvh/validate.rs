//! Structural checks and debug output for built trees.

use super::{Bvh, BvhBox, LEAF_SENTINEL, LEAF_THRESHOLD};
use crate::gfx::geometry::{Axis, Bounds};
use crate::gfx::scene::GpuTriangle;

/// A violated tree invariant, naming the offending box.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BvhError {
    #[error("root index {root} is outside the box array (len {len})")]
    RootOutOfBounds { root: i32, len: usize },

    #[error("box {index} covers [{start}, {end}) which is empty or outside {triangle_count} triangles")]
    BadRange {
        index: usize,
        start: i32,
        end: i32,
        triangle_count: usize,
    },

    #[error("leaf box {index} holds {len} triangles, more than the leaf threshold")]
    LeafTooLarge { index: usize, len: usize },

    #[error("box {index} has children ({left}, {right}), expected both -1 or both earlier boxes")]
    ChildOrder { index: usize, left: i32, right: i32 },

    #[error("box {index} children do not split its range at the midpoint")]
    RangePartition { index: usize },

    #[error("box {index} bounds are not the exact union of its contents")]
    UnionMismatch { index: usize },

    #[error("box {index} split is not ordered around its midpoint on {axis:?}")]
    SplitOrder { index: usize, axis: Axis },
}

impl Bvh {
    /// Check every tree invariant against the (already reordered) triangles.
    ///
    /// Walks from the root so that the split axis of every level is known.
    pub fn validate(&self, triangles: &[GpuTriangle]) -> Result<(), BvhError> {
        if self.is_empty() {
            return Ok(());
        }

        let root = self.root_id();
        if root < 0 || root as usize >= self.len() {
            return Err(BvhError::RootOutOfBounds {
                root,
                len: self.len(),
            });
        }

        self.validate_box(triangles, root as usize, Axis::X)
    }

    fn validate_box(
        &self,
        triangles: &[GpuTriangle],
        index: usize,
        axis: Axis,
    ) -> Result<(), BvhError> {
        let b = &self.boxes()[index];
        if b.start < 0 || b.start >= b.end || b.end as usize > triangles.len() {
            return Err(BvhError::BadRange {
                index,
                start: b.start,
                end: b.end,
                triangle_count: triangles.len(),
            });
        }
        let (start, end) = (b.start as usize, b.end as usize);

        if b.left_id == LEAF_SENTINEL && b.right_id == LEAF_SENTINEL {
            if end - start > LEAF_THRESHOLD {
                return Err(BvhError::LeafTooLarge {
                    index,
                    len: end - start,
                });
            }
            let union = triangles[start..end]
                .iter()
                .fold(Bounds::EMPTY, |acc, t| acc.union(t.bounds()));
            if union != b.bounds() {
                return Err(BvhError::UnionMismatch { index });
            }
            return Ok(());
        }

        let child_ok = |id: i32| id >= 0 && (id as usize) < index;
        if !child_ok(b.left_id) || !child_ok(b.right_id) {
            return Err(BvhError::ChildOrder {
                index,
                left: b.left_id,
                right: b.right_id,
            });
        }

        let left = &self.boxes()[b.left_id as usize];
        let right = &self.boxes()[b.right_id as usize];
        let mid = (start + (end - start) / 2) as i32;
        if left.start != b.start || left.end != mid || right.start != mid || right.end != b.end {
            return Err(BvhError::RangePartition { index });
        }

        if left.bounds().union(right.bounds()) != b.bounds() {
            return Err(BvhError::UnionMismatch { index });
        }

        // Deeper levels reorder each half on other axes, so only the split
        // itself is checked: no key on the left exceeds a key on the right.
        let mid = mid as usize;
        let key = |t: &GpuTriangle| t.min.component(axis);
        let left_max = triangles[start..mid]
            .iter()
            .map(key)
            .fold(f32::NEG_INFINITY, f32::max);
        let right_min = triangles[mid..end]
            .iter()
            .map(key)
            .fold(f32::INFINITY, f32::min);
        if left_max > right_min {
            return Err(BvhError::SplitOrder { index, axis });
        }

        self.validate_box(triangles, b.left_id as usize, axis.next())?;
        self.validate_box(triangles, b.right_id as usize, axis.next())
    }

    /// Dump the tree at trace level, one indented line per box.
    pub fn log_tree(&self) {
        if !log::log_enabled!(log::Level::Trace) {
            return;
        }
        match self.root() {
            Some(_) => self.log_box(self.root_id() as usize, 0),
            None => log::trace!("<empty bvh>"),
        }
    }

    fn log_box(&self, index: usize, depth: usize) {
        let b: &BvhBox = &self.boxes()[index];
        log::trace!(
            "{:indent$}#{index} min ({}, {}, {}) max ({}, {}, {}) [{}, {}) children ({}, {})",
            "",
            b.min.x,
            b.min.y,
            b.min.z,
            b.max.x,
            b.max.y,
            b.max.z,
            b.start,
            b.end,
            b.left_id,
            b.right_id,
            indent = depth * 2
        );
        if !b.is_leaf() {
            self.log_box(b.left_id as usize, depth + 1);
            self.log_box(b.right_id as usize, depth + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::bvh::build;
    use crate::gfx::geometry::GpuVec3;

    fn triangles(count: usize) -> Vec<GpuTriangle> {
        (0..count)
            .map(|i| {
                let x = ((i * 37) % count) as f32;
                let min = GpuVec3::new(x, -(i as f32), 0.5 * i as f32);
                let max = GpuVec3::new(x + 1.0, 1.0, 0.5 * i as f32 + 2.0);
                GpuTriangle {
                    v1: min,
                    v2: max,
                    v3: GpuVec3::new(x, 1.0, 0.5 * i as f32),
                    min,
                    max,
                    ..Default::default()
                }
            })
            .collect()
    }

    fn built(count: usize) -> (Vec<GpuTriangle>, Bvh) {
        let mut tris = triangles(count);
        let tree = build(&mut tris);
        (tris, tree)
    }

    fn with_boxes(tree: &Bvh, edit: impl FnOnce(&mut Vec<BvhBox>)) -> Bvh {
        let root = tree.root_id() as usize;
        let mut boxes = tree.boxes().to_vec();
        edit(&mut boxes);
        Bvh::from_parts(boxes, root)
    }

    #[test]
    fn test_valid_tree_passes() {
        let _ = env_logger::builder().is_test(true).try_init();
        let (tris, tree) = built(61);
        assert_eq!(tree.validate(&tris), Ok(()));
        tree.log_tree();
    }

    #[test]
    fn test_diagonal_tree_passes() {
        // Keys rise on x and fall on y, so the y split of every child
        // reverses the x order inside each half.
        let mut tris: Vec<GpuTriangle> = (0..18)
            .map(|i| {
                let v = GpuVec3::new(i as f32, -(i as f32), 0.0);
                GpuTriangle {
                    v1: v,
                    v2: v,
                    v3: v,
                    min: v,
                    max: v,
                    ..Default::default()
                }
            })
            .collect();
        let tree = build(&mut tris);
        assert!(!tree.root().unwrap().is_leaf());
        assert_eq!(tree.validate(&tris), Ok(()));
    }

    #[test]
    fn test_loose_leaf_bounds_detected() {
        let (tris, tree) = built(40);
        let leaf = tree.boxes().iter().position(BvhBox::is_leaf).unwrap();
        let broken = with_boxes(&tree, |boxes| boxes[leaf].max.x += 1.0);
        assert!(matches!(
            broken.validate(&tris),
            Err(BvhError::UnionMismatch { .. })
        ));
    }

    #[test]
    fn test_forward_child_reference_detected() {
        let (tris, tree) = built(40);
        let root = tree.root_id() as usize;
        let broken = with_boxes(&tree, |boxes| boxes[root].left_id = root as i32);
        assert!(matches!(
            broken.validate(&tris),
            Err(BvhError::ChildOrder { index, .. }) if index == root
        ));
    }

    #[test]
    fn test_oversized_leaf_detected() {
        let (tris, tree) = built(40);
        let root = tree.root_id() as usize;
        let broken = with_boxes(&tree, |boxes| {
            boxes[root].left_id = LEAF_SENTINEL;
            boxes[root].right_id = LEAF_SENTINEL;
        });
        assert_eq!(
            broken.validate(&tris),
            Err(BvhError::LeafTooLarge { index: root, len: 40 })
        );
    }

    #[test]
    fn test_shifted_partition_detected() {
        let (tris, tree) = built(40);
        let root = tree.root_id() as usize;
        let left = tree.boxes()[root].left_id as usize;
        let broken = with_boxes(&tree, |boxes| boxes[left].end -= 1);
        assert_eq!(
            broken.validate(&tris),
            Err(BvhError::RangePartition { index: root })
        );
    }

    #[test]
    fn test_reordered_triangles_detected() {
        let (mut tris, tree) = built(40);
        // Swapping across the root split breaks the x ordering.
        let last = tris.len() - 1;
        let lowest = (0..tris.len())
            .min_by(|&a, &b| tris[a].min.x.total_cmp(&tris[b].min.x))
            .unwrap();
        tris.swap(lowest, last);
        assert!(tree.validate(&tris).is_err());
    }

    #[test]
    fn test_bad_root_detected() {
        let (tris, tree) = built(20);
        let broken = Bvh::from_parts(tree.boxes().to_vec(), tree.len() + 3);
        assert!(matches!(
            broken.validate(&tris),
            Err(BvhError::RootOutOfBounds { .. })
        ));
    }
}
