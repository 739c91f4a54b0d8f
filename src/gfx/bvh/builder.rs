//! Median-split BVH construction.
//!
//! Each internal level partitions its range around the midpoint index with a
//! selection (not a full sort) keyed on the triangles' box minimum along the
//! current axis, then recurses into both halves with the next axis.

use std::cmp::Ordering;

use super::{Bvh, BvhBox, LEAF_THRESHOLD, MAX_TRIANGLES};
use crate::gfx::geometry::{Axis, Bounds};
use crate::gfx::scene::GpuTriangle;

/// Build a BVH over `triangles`, reordering them in place.
///
/// The returned box ranges index the slice as it is left by this call. An
/// empty slice yields [`Bvh::empty`] without entering the recursion.
///
/// # Panics
///
/// Panics if the slice holds more than [`MAX_TRIANGLES`] triangles.
pub fn build(triangles: &mut [GpuTriangle]) -> Bvh {
    if triangles.is_empty() {
        return Bvh::empty();
    }

    let mut boxes = Vec::with_capacity(box_capacity_hint(triangles.len()));
    let root = build_range(triangles, &mut boxes, 0, triangles.len(), Axis::X);

    log::debug!(
        "Built BVH over {} triangles: {} boxes, root {}",
        triangles.len(),
        boxes.len(),
        root
    );
    Bvh::from_parts(boxes, root)
}

/// Build the subtree covering `[start, end)` and return the index of its root
/// box in `boxes`.
///
/// Every box of the subtree is appended to `boxes`, children before parents.
///
/// # Panics
///
/// Panics if `start >= end`, or if `end` exceeds [`MAX_TRIANGLES`]. An empty
/// range is a caller bug: [`build`] handles the empty scene before recursing.
pub fn build_range(
    triangles: &mut [GpuTriangle],
    boxes: &mut Vec<BvhBox>,
    start: usize,
    end: usize,
    axis: Axis,
) -> usize {
    assert!(start < end, "BVH range [{start}, {end}) is empty");
    assert!(
        end <= MAX_TRIANGLES,
        "BVH range end {end} exceeds the limit of {MAX_TRIANGLES} triangles"
    );

    if end - start <= LEAF_THRESHOLD {
        let bounds = triangles[start..end]
            .iter()
            .fold(Bounds::EMPTY, |acc, t| acc.union(t.bounds()));
        boxes.push(BvhBox::leaf(bounds, start, end));
        return boxes.len() - 1;
    }

    let mid = start + (end - start) / 2;
    triangles[start..end]
        .select_nth_unstable_by(mid - start, |a, b| compare_min(a, b, axis));

    let left = build_range(triangles, boxes, start, mid, axis.next());
    let right = build_range(triangles, boxes, mid, end, axis.next());

    let bounds = boxes[left].bounds().union(boxes[right].bounds());
    boxes.push(BvhBox::internal(bounds, left, right, start, end));
    boxes.len() - 1
}

/// Order two triangles by the minimum of their boxes along `axis`.
fn compare_min(a: &GpuTriangle, b: &GpuTriangle, axis: Axis) -> Ordering {
    a.min.component(axis).total_cmp(&b.min.component(axis))
}

// A tree with n leaves has 2n - 1 boxes; this reserves 2n.
fn box_capacity_hint(count: usize) -> usize {
    2 * count.div_ceil(LEAF_THRESHOLD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::bvh::LEAF_SENTINEL;
    use crate::gfx::geometry::GpuVec3;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn triangle_at(x: f32, y: f32, z: f32) -> GpuTriangle {
        let v1 = GpuVec3::new(x, y, z);
        let v2 = GpuVec3::new(x + 1.0, y, z);
        let v3 = GpuVec3::new(x, y + 1.0, z);
        let bounds = Bounds::from_points([v1, v2, v3]);
        GpuTriangle {
            v1,
            v2,
            v3,
            min: bounds.min,
            max: bounds.max,
            ..Default::default()
        }
    }

    fn random_triangles(count: usize, seed: u64) -> Vec<GpuTriangle> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                triangle_at(
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                    rng.random_range(-50.0..50.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_empty_input_gives_empty_tree() {
        let mut triangles: Vec<GpuTriangle> = Vec::new();
        let tree = build(&mut triangles);
        assert!(tree.is_empty());
        assert_eq!(tree.root_id(), LEAF_SENTINEL);
    }

    #[test]
    fn test_small_input_is_single_leaf() {
        let mut triangles: Vec<_> = (0..LEAF_THRESHOLD)
            .map(|i| triangle_at(i as f32, 0.0, 0.0))
            .collect();
        let before = triangles.clone();

        let tree = build(&mut triangles);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root_id(), 0);

        let root = tree.root().unwrap();
        assert!(root.is_leaf());
        assert_eq!((root.start, root.end), (0, LEAF_THRESHOLD as i32));
        assert_eq!(root.min, GpuVec3::new(0.0, 0.0, 0.0));
        assert_eq!(root.max, GpuVec3::new(LEAF_THRESHOLD as f32, 1.0, 0.0));
        // A single leaf never partitions.
        assert_eq!(triangles, before);
    }

    #[test]
    #[should_panic(expected = "is empty")]
    fn test_empty_range_panics() {
        let mut triangles = vec![triangle_at(0.0, 0.0, 0.0)];
        let mut boxes = Vec::new();
        build_range(&mut triangles, &mut boxes, 1, 1, Axis::X);
    }

    #[test]
    #[should_panic(expected = "exceeds the limit")]
    fn test_range_beyond_index_limit_panics() {
        let mut triangles = vec![triangle_at(0.0, 0.0, 0.0)];
        let mut boxes = Vec::new();
        build_range(&mut triangles, &mut boxes, 0, MAX_TRIANGLES + 1, Axis::X);
    }

    #[test]
    fn test_invariants_hold_on_random_input() {
        let _ = env_logger::builder().is_test(true).try_init();

        for (count, seed) in [(9, 1), (17, 2), (100, 3), (1000, 4), (4097, 5)] {
            let mut triangles = random_triangles(count, seed);
            let tree = build(&mut triangles);

            assert_eq!(triangles.len(), count);
            let root = tree.root().unwrap();
            assert_eq!((root.start, root.end), (0, count as i32));
            assert_eq!(tree.root_id() as usize, tree.len() - 1);
            tree.validate(&triangles).unwrap();
        }
    }

    #[test]
    fn test_children_written_before_parent() {
        let mut triangles = random_triangles(300, 7);
        let tree = build(&mut triangles);

        for (index, b) in tree.boxes().iter().enumerate() {
            if b.is_leaf() {
                assert_eq!(b.right_id, LEAF_SENTINEL);
                assert!(b.start < b.end);
                assert!(b.len() <= LEAF_THRESHOLD);
            } else {
                assert!((b.left_id as usize) < index);
                assert!((b.right_id as usize) < index);
            }
        }
    }

    #[test]
    fn test_first_split_is_median_on_x() {
        let mut triangles: Vec<_> = (0..20)
            .rev()
            .map(|i| triangle_at(i as f32, (i % 3) as f32, 0.0))
            .collect();
        let tree = build(&mut triangles);

        let root = tree.root().unwrap();
        let left = tree.boxes()[root.left_id as usize];
        let right = tree.boxes()[root.right_id as usize];
        assert_eq!((left.start, left.end), (0, 10));
        assert_eq!((right.start, right.end), (10, 20));
        assert!(left.max.x <= right.min.x + 1.0);
        assert!(triangles[..10].iter().all(|t| t.min.x < 10.0));
        assert!(triangles[10..].iter().all(|t| t.min.x >= 10.0));
    }

    #[test]
    fn test_root_bounds_independent_of_input_order() {
        let original = random_triangles(257, 11);

        let mut a = original.clone();
        let mut b = original.clone();
        b.shuffle(&mut rand::rngs::StdRng::seed_from_u64(99));

        let tree_a = build(&mut a);
        let tree_b = build(&mut b);

        let root_a = tree_a.root().unwrap();
        let root_b = tree_b.root().unwrap();
        assert_eq!(root_a.min, root_b.min);
        assert_eq!(root_a.max, root_b.max);
    }

    #[test]
    fn test_negative_coordinates_bound_correctly() {
        let mut triangles: Vec<_> = (0..12)
            .map(|i| triangle_at(-100.0 - i as f32, -5.0, -7.0))
            .collect();
        let tree = build(&mut triangles);
        let root = tree.root().unwrap();
        assert_eq!(root.max, GpuVec3::new(-99.0, -4.0, -7.0));
        assert_eq!(root.min, GpuVec3::new(-111.0, -5.0, -7.0));
    }
}
