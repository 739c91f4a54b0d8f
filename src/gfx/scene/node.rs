//! # Scene Nodes
//!
//! A scene is a tree of [`SceneNode`]s. Each node owns its children and its
//! local-space triangles, and carries a local transform that is resolved to a
//! matrix once at construction.

use cgmath::{Matrix, Matrix4, Quaternion, SquareMatrix, Vector3};

use super::triangle::Triangle;

/// Source of a node's local matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NodeTransform {
    /// Decomposed translation / rotation / scale, composed as `T * R * S`.
    Trs {
        translation: Vector3<f64>,
        rotation: Quaternion<f64>,
        scale: Vector3<f64>,
    },
    /// Explicit matrix, 16 values in row-major order (four rows of four).
    Matrix([f64; 16]),
}

impl NodeTransform {
    pub fn identity() -> Self {
        NodeTransform::Trs {
            translation: Vector3::new(0.0, 0.0, 0.0),
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn from_translation(translation: Vector3<f64>) -> Self {
        NodeTransform::Trs {
            translation,
            rotation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            scale: Vector3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn to_matrix(&self) -> Matrix4<f64> {
        match *self {
            NodeTransform::Trs {
                translation,
                rotation,
                scale,
            } => compose_matrix(translation, rotation, scale),
            // cgmath takes columns, so the row-major array is transposed
            #[rustfmt::skip]
            NodeTransform::Matrix(m) => Matrix4::new(
                m[0], m[1], m[2], m[3],
                m[4], m[5], m[6], m[7],
                m[8], m[9], m[10], m[11],
                m[12], m[13], m[14], m[15],
            )
            .transpose(),
        }
    }
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Compose `Translation * Rotation * Scale`.
///
/// The rotation uses the unit-quaternion formula with diagonal terms written
/// as `2(w² + a²) - 1`. The quaternion is not normalized first, so a non-unit
/// quaternion produces a non-rigid matrix. Callers own normalization.
pub fn compose_matrix(
    translation: Vector3<f64>,
    rotation: Quaternion<f64>,
    scale: Vector3<f64>,
) -> Matrix4<f64> {
    let w = rotation.s;
    let (x, y, z) = (rotation.v.x, rotation.v.y, rotation.v.z);

    let r00 = 2.0 * (w * w + x * x) - 1.0;
    let r01 = 2.0 * (x * y - w * z);
    let r02 = 2.0 * (x * z + w * y);

    let r10 = 2.0 * (x * y + w * z);
    let r11 = 2.0 * (w * w + y * y) - 1.0;
    let r12 = 2.0 * (y * z - w * x);

    let r20 = 2.0 * (x * z - w * y);
    let r21 = 2.0 * (y * z + w * x);
    let r22 = 2.0 * (w * w + z * z) - 1.0;

    // cgmath takes columns
    #[rustfmt::skip]
    let r = Matrix4::new(
        r00, r10, r20, 0.0,
        r01, r11, r21, 0.0,
        r02, r12, r22, 0.0,
        0.0, 0.0, 0.0, 1.0,
    );

    let t = Matrix4::from_translation(translation);
    let s = Matrix4::from_nonuniform_scale(scale.x, scale.y, scale.z);
    t * r * s // Order matters: T * R * S
}

/// A node of the scene tree.
#[derive(Clone, Debug)]
pub struct SceneNode {
    pub name: String,
    transform: NodeTransform,
    matrix: Matrix4<f64>,
    pub children: Vec<SceneNode>,
    pub triangles: Vec<Triangle>,
}

impl SceneNode {
    /// Create an empty node with an identity transform.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: NodeTransform::identity(),
            matrix: Matrix4::identity(),
            children: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.set_transform(transform);
        self
    }

    pub fn with_child(mut self, child: SceneNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_triangles(mut self, triangles: Vec<Triangle>) -> Self {
        self.triangles.extend(triangles);
        self
    }

    /// Replace the local transform and re-resolve the local matrix.
    pub fn set_transform(&mut self, transform: NodeTransform) {
        self.transform = transform;
        self.matrix = transform.to_matrix();
    }

    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    /// The resolved local matrix.
    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// Number of triangles in this node and all of its descendants.
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
            + self
                .children
                .iter()
                .map(SceneNode::triangle_count)
                .sum::<usize>()
    }
}
