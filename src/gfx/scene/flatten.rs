//! # Transform Flattening
//!
//! Collapses a [`SceneNode`] tree into a single world-space [`GpuTriangle`]
//! array. The accumulated ancestor matrix is threaded down the recursion in
//! double precision and only narrowed to `f32` when a GPU triangle is emitted.
//!
//! Output order is: a node's own triangles, then each child's flattened
//! triangles in child order.

use cgmath::{Matrix4, SquareMatrix, Vector3, Vector4};

use super::node::SceneNode;
use super::triangle::{GpuTriangle, Triangle};
use crate::gfx::geometry::GpuVec3;

/// Flatten one scene tree into world-space triangles.
pub fn flatten(root: &SceneNode) -> Vec<GpuTriangle> {
    let mut out = Vec::with_capacity(root.triangle_count());
    flatten_into(root, &Matrix4::identity(), &mut out);
    out
}

/// Flatten several independently loaded scenes, concatenated in load order.
///
/// Concatenation has to happen before a BVH build: box ranges index one
/// global triangle ordering.
pub fn flatten_scenes(scenes: &[SceneNode]) -> Vec<GpuTriangle> {
    let capacity = scenes.iter().map(SceneNode::triangle_count).sum();
    let mut out = Vec::with_capacity(capacity);
    for scene in scenes {
        let start = out.len();
        flatten_into(scene, &Matrix4::identity(), &mut out);
        log::debug!(
            "Flattened scene '{}': {} triangles",
            scene.name,
            out.len() - start
        );
    }
    out
}

/// Append the triangles of `node` and its subtree, transformed by
/// `parent * node.matrix()`.
pub fn flatten_into(node: &SceneNode, parent: &Matrix4<f64>, out: &mut Vec<GpuTriangle>) {
    let world = *parent * *node.matrix();

    out.extend(
        node.triangles
            .iter()
            .map(|triangle| transform_triangle(&world, triangle)),
    );

    for child in &node.children {
        flatten_into(child, &world, out);
    }
}

/// Transform a local triangle and rebuild its box from the moved vertices.
///
/// The local `min`/`max` corners are ignored: a rotated box is
/// not the box of the rotated triangle.
pub fn transform_triangle(matrix: &Matrix4<f64>, triangle: &Triangle) -> GpuTriangle {
    let vertices = triangle
        .vertices()
        .map(|v| GpuVec3::from_f64(transform_point(matrix, v)));
    GpuTriangle::from_world(vertices, triangle)
}

pub fn transform_point(matrix: &Matrix4<f64>, p: Vector3<f64>) -> Vector3<f64> {
    let h = *matrix * Vector4::new(p.x, p.y, p.z, 1.0);
    Vector3::new(h.x, h.y, h.z)
}
