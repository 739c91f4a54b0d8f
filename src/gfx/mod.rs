//! # Graphics Module
//!
//! Everything between a loaded scene and the GPU buffers a ray tracing shader
//! reads.
//!
//! ## Architecture Overview
//!
//! - **Geometry** ([`geometry`]) - GPU vector, axis and bounding box helpers
//! - **Scene** ([`scene`]) - Scene tree, OBJ loading and transform flattening
//! - **BVH** ([`bvh`]) - Median-split hierarchy over the flattened triangles
//! - **Export** ([`export`]) - Storage/uniform buffers and their bind group
//!
//! The stages are normally driven through [`ScenePipeline`](crate::pipeline::ScenePipeline).

pub mod bvh;
pub mod export;
pub mod geometry;
pub mod scene;

// Re-export commonly used types
pub use export::GpuScene;
