//! # Raybake Prelude
//!
//! Commonly used types for preparing and uploading a scene.
//!
//! ```no_run
//! use raybake::prelude::*;
//!
//! # fn main() -> Result<(), PipelineError> {
//! let mut pipeline = ScenePipeline::with_defaults();
//! pipeline.add_scene(SceneNode::new("empty"));
//! let prepared = pipeline.build()?;
//! assert_eq!(prepared.root_id(), -1);
//! # Ok(())
//! # }
//! ```

// Re-export pipeline types
pub use crate::pipeline::{PipelineConfig, PipelineError, PreparedScene, ScenePipeline};

// Re-export scene and BVH types
pub use crate::gfx::bvh::{Bvh, BvhBox, BvhError};
pub use crate::gfx::export::{GpuScene, SceneUniforms, SCENE_STRUCTS_WGSL};
pub use crate::gfx::scene::{
    GpuTriangle, LoadConfig, LoadError, MaterialRef, MaterialTable, NodeTransform, SceneNode,
    Triangle,
};

// Re-export common external dependencies
pub use cgmath::{Quaternion, Vector3};
pub use wgpu::{Device, Queue};
