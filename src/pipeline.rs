//! # Scene Preparation Pipeline
//!
//! Drives the host-side preparation of a ray tracing scene: scenes are
//! collected in load order, flattened into one world-space triangle array and
//! a single BVH is built over the concatenation.
//!
//! ```no_run
//! use raybake::pipeline::ScenePipeline;
//!
//! # fn main() -> anyhow::Result<()> {
//! raybake::init_logger();
//!
//! let mut pipeline = ScenePipeline::with_defaults();
//! pipeline.load_obj("sponza.obj")?.load_obj("lamp.obj")?;
//! let prepared = pipeline.build()?;
//! println!("{} triangles, root {}", prepared.triangle_count(), prepared.root_id());
//! # Ok(())
//! # }
//! ```

use std::io::BufRead;
use std::path::Path;

use crate::gfx::bvh::{self, Bvh, BvhError};
use crate::gfx::export::SceneUniforms;
use crate::gfx::scene::{self, GpuTriangle, LoadConfig, LoadError, MaterialTable, SceneNode};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("BVH validation failed: {0}")]
    Bvh(#[from] BvhError),
}

/// Pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Options for every OBJ load.
    pub load: LoadConfig,
    /// Check every tree invariant after the build.
    pub validate: bool,
    /// Dump the tree at trace level after the build.
    pub log_tree: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load: LoadConfig::default(),
            validate: cfg!(debug_assertions),
            log_tree: false,
        }
    }
}

impl PipelineConfig {
    pub fn with_load(mut self, load: LoadConfig) -> Self {
        self.load = load;
        self
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    pub fn with_tree_log(mut self, log_tree: bool) -> Self {
        self.log_tree = log_tree;
        self
    }
}

/// Collects scenes and turns them into a [`PreparedScene`].
pub struct ScenePipeline {
    config: PipelineConfig,
    scenes: Vec<SceneNode>,
    materials: MaterialTable,
}

impl ScenePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            scenes: Vec::new(),
            materials: MaterialTable::new(),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(PipelineConfig::default())
    }

    /// Append an already built scene tree.
    pub fn add_scene(&mut self, scene: SceneNode) -> &mut Self {
        self.scenes.push(scene);
        self
    }

    /// Load an OBJ file and append it as the next scene.
    pub fn load_obj(&mut self, path: impl AsRef<Path>) -> Result<&mut Self, PipelineError> {
        let scene = scene::load_obj(path, &self.config.load, &mut self.materials)?;
        Ok(self.add_scene(scene))
    }

    /// Parse OBJ text from `reader` and append it as the next scene.
    pub fn load_obj_reader<R: BufRead>(
        &mut self,
        name: &str,
        reader: &mut R,
    ) -> Result<&mut Self, PipelineError> {
        let scene = scene::load_obj_reader(name, reader, &self.config.load, &mut self.materials)?;
        Ok(self.add_scene(scene))
    }

    pub fn scenes(&self) -> &[SceneNode] {
        &self.scenes
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Flatten every scene, then build one BVH over all of them.
    pub fn build(self) -> Result<PreparedScene, PipelineError> {
        let mut triangles = scene::flatten_scenes(&self.scenes);
        let bvh = bvh::build(&mut triangles);

        if self.config.validate {
            bvh.validate(&triangles)?;
        }
        if self.config.log_tree {
            bvh.log_tree();
        }

        log::info!(
            "Prepared {} scenes: {} triangles, {} boxes, root {}",
            self.scenes.len(),
            triangles.len(),
            bvh.len(),
            bvh.root_id()
        );

        Ok(PreparedScene {
            triangles,
            bvh,
            materials: self.materials,
        })
    }
}

/// Reordered world-space triangles, their BVH and the texture table.
#[derive(Debug, Default)]
pub struct PreparedScene {
    triangles: Vec<GpuTriangle>,
    bvh: Bvh,
    materials: MaterialTable,
}

impl PreparedScene {
    /// Triangles in BVH order; box ranges index this slice.
    pub fn triangles(&self) -> &[GpuTriangle] {
        &self.triangles
    }

    pub fn bvh(&self) -> &Bvh {
        &self.bvh
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.materials
    }

    /// Never above [`MAX_TRIANGLES`](crate::gfx::bvh::MAX_TRIANGLES), which
    /// the BVH build enforces, so the count always fits.
    pub fn triangle_count(&self) -> u32 {
        self.triangles.len() as u32
    }

    /// Root box index, `-1` for an empty scene.
    pub fn root_id(&self) -> i32 {
        self.bvh.root_id()
    }

    pub fn uniforms(&self) -> SceneUniforms {
        SceneUniforms::new(self.root_id(), self.triangle_count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::bvh::{LEAF_SENTINEL, LEAF_THRESHOLD};
    use crate::gfx::scene::{NodeTransform, Triangle};
    use cgmath::{Quaternion, Vector3};

    fn strip(count: usize, x_offset: f64) -> Vec<Triangle> {
        (0..count)
            .map(|i| {
                let x = x_offset + i as f64;
                Triangle::new(
                    Vector3::new(x, 0.0, 0.0),
                    Vector3::new(x + 1.0, 0.0, 0.0),
                    Vector3::new(x, 1.0, 0.0),
                )
            })
            .collect()
    }

    fn validating() -> ScenePipeline {
        ScenePipeline::new(PipelineConfig::default().with_validation(true))
    }

    #[test]
    fn test_root_with_two_children() -> anyhow::Result<()> {
        let _ = env_logger::builder().is_test(true).try_init();

        let root = SceneNode::new("root")
            .with_child(SceneNode::new("a").with_triangles(strip(5, 0.0)))
            .with_child(
                SceneNode::new("b")
                    .with_transform(NodeTransform::from_translation(Vector3::new(0.0, 10.0, 0.0)))
                    .with_triangles(strip(10, 0.0)),
            );

        let mut pipeline = ScenePipeline::new(
            PipelineConfig::default()
                .with_validation(true)
                .with_tree_log(true),
        );
        pipeline.add_scene(root);
        let prepared = pipeline.build()?;

        assert_eq!(prepared.triangle_count(), 15);
        let tree = prepared.bvh();
        let root = tree.root().unwrap();
        assert_eq!((root.start, root.end), (0, 15));
        assert!(!root.is_leaf());
        assert!(tree
            .boxes()
            .iter()
            .filter(|b| b.is_leaf())
            .all(|b| b.len() <= LEAF_THRESHOLD));
        let leaves = 15usize.div_ceil(LEAF_THRESHOLD);
        assert_eq!(tree.len(), 2 * leaves - 1);

        // Child b was moved up by its own transform only.
        let lifted = prepared.triangles().iter().filter(|t| t.min.y >= 10.0).count();
        assert_eq!(lifted, 10);
        assert_eq!(root.min.y, 0.0);
        assert_eq!(root.max.y, 11.0);
        Ok(())
    }

    #[test]
    fn test_default_config_accepts_diagonal_scene() -> anyhow::Result<()> {
        let triangles = (0..18)
            .map(|i| {
                let v = Vector3::new(i as f64, -(i as f64), 0.0);
                Triangle::new(v, v, v)
            })
            .collect();
        let mut pipeline = ScenePipeline::with_defaults();
        pipeline.add_scene(SceneNode::new("diagonal").with_triangles(triangles));
        let prepared = pipeline.build()?;

        assert_eq!(prepared.triangle_count(), 18);
        prepared.bvh().validate(prepared.triangles())?;
        Ok(())
    }

    #[test]
    fn test_scenes_are_concatenated_before_build() -> anyhow::Result<()> {
        let mut pipeline = validating();
        pipeline
            .add_scene(SceneNode::new("first").with_triangles(strip(6, 0.0)))
            .add_scene(SceneNode::new("second").with_triangles(strip(7, 100.0)));
        let prepared = pipeline.build()?;

        assert_eq!(prepared.triangle_count(), 13);
        let root = prepared.bvh().root().unwrap();
        assert_eq!((root.start, root.end), (0, 13));
        assert_eq!(root.min.x, 0.0);
        assert_eq!(root.max.x, 107.0);
        Ok(())
    }

    #[test]
    fn test_empty_scene_has_sentinel_root() -> anyhow::Result<()> {
        let prepared = validating().build()?;
        assert_eq!(prepared.triangle_count(), 0);
        assert_eq!(prepared.root_id(), LEAF_SENTINEL);
        assert!(prepared.bvh().is_empty());
        assert_eq!(prepared.uniforms(), SceneUniforms::new(-1, 0));
        Ok(())
    }

    #[test]
    fn test_uniforms_follow_build() -> anyhow::Result<()> {
        let mut pipeline = validating();
        pipeline.add_scene(SceneNode::new("s").with_triangles(strip(20, 0.0)));
        let prepared = pipeline.build()?;

        let uniforms = prepared.uniforms();
        assert_eq!(uniforms.triangle_count, 20);
        assert_eq!(uniforms.root_id as usize, prepared.bvh().len() - 1);
        Ok(())
    }

    #[test]
    fn test_obj_reader_feeds_pipeline() -> anyhow::Result<()> {
        let obj = "\
o quad
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
f 1 2 3 4
";
        let rotation = Quaternion::new(1.0, 0.0, 0.0, 0.0);
        let load = LoadConfig::default().with_root_transform(NodeTransform::Trs {
            translation: Vector3::new(0.0, 0.0, -5.0),
            rotation,
            scale: Vector3::new(2.0, 2.0, 2.0),
        });
        let mut pipeline = ScenePipeline::new(PipelineConfig::default().with_load(load));
        pipeline.load_obj_reader("quad", &mut obj.as_bytes())?;
        let prepared = pipeline.build()?;

        assert_eq!(prepared.triangle_count(), 2);
        let root = prepared.bvh().root().unwrap();
        assert!(root.is_leaf());
        assert_eq!(root.max.x, 2.0);
        assert_eq!(root.min.z, -5.0);
        Ok(())
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let mut pipeline = ScenePipeline::with_defaults();
        let result = pipeline.load_obj("does/not/exist.obj");
        assert!(matches!(result, Err(PipelineError::Load(LoadError::Obj { .. }))));
    }
}
