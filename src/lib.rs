// src/lib.rs
//! Raybake
//!
//! Host-side scene preparation for GPU ray tracing: hierarchical scenes are
//! flattened into one world-space triangle array and indexed by a
//! pointer-free BVH that a shader walks with integer ids.

pub mod gfx;
pub mod pipeline;
pub mod prelude;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use pipeline::{PipelineConfig, PipelineError, PreparedScene, ScenePipeline};

/// Initialise `env_logger` with an `info` default filter.
///
/// `RUST_LOG` overrides the default. Calling this more than once is harmless.
pub fn init_logger() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
