//! # Scene Module
//!
//! Host-side scene description and its conversion into GPU-ready triangles.
//!
//! ## Key Components
//!
//! - [`SceneNode`] - A node of the scene tree with a local transform, its own
//!   triangles and child nodes
//! - [`Triangle`] - Object-space triangle with UVs and a [`MaterialRef`]
//! - [`GpuTriangle`] - World-space triangle in the layout the shader reads
//! - [`flatten`] - Bakes node transforms into a flat triangle list
//! - [`load_obj`] - Builds a scene tree from a Wavefront OBJ file
//! - [`MaterialTable`] - Texture ids shared by every loaded scene
//!
//! ## Usage
//!
//! ```no_run
//! use raybake::gfx::scene::{flatten, load_obj, LoadConfig, MaterialTable};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut materials = MaterialTable::new();
//! let scene = load_obj("model.obj", &LoadConfig::default(), &mut materials)?;
//! let triangles = flatten(&scene);
//! println!("{} world-space triangles", triangles.len());
//! # Ok(())
//! # }
//! ```

pub mod flatten;
pub mod loader;
pub mod materials;
pub mod node;
pub mod triangle;

// Re-export main types
pub use flatten::{flatten, flatten_scenes};
pub use loader::{load_obj, load_obj_reader, LoadConfig, LoadError};
pub use materials::MaterialTable;
pub use node::{compose_matrix, NodeTransform, SceneNode};
pub use triangle::{GpuTriangle, MaterialRef, Triangle, NO_TEXTURE};
