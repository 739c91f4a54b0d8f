//! # OBJ Scene Loader
//!
//! Loads Wavefront OBJ/MTL files through `tobj` into a [`SceneNode`] tree:
//! one root node carrying the configured placement transform, with one child
//! per OBJ model. Texture references are resolved into the shared
//! [`MaterialTable`].
//!
//! Malformed input is rejected here. The flattener and BVH builder assume a
//! well-formed tree and never re-validate it.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use cgmath::Vector3;

use super::materials::MaterialTable;
use super::node::{NodeTransform, SceneNode};
use super::triangle::{MaterialRef, Triangle, NO_TEXTURE};

/// Errors raised while turning an OBJ file into a scene tree.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to load OBJ file {}: {source}", .path.display())]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },

    #[error("mesh '{mesh}' has {count} indices, which is not a multiple of 3")]
    IncompleteTriangle { mesh: String, count: usize },

    #[error("mesh '{mesh}' references vertex {index} but only has {vertex_count} vertices")]
    IndexOutOfRange {
        mesh: String,
        index: u32,
        vertex_count: usize,
    },
}

/// Options applied to every loaded scene.
#[derive(Debug, Clone, Default)]
pub struct LoadConfig {
    /// Transform of the root node every loaded model is placed under.
    pub root_transform: NodeTransform,
}

impl LoadConfig {
    pub fn with_root_transform(mut self, transform: NodeTransform) -> Self {
        self.root_transform = transform;
        self
    }
}

fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

/// Load an OBJ file (and its MTL library, if any) from disk.
///
/// Texture paths in the MTL file are resolved relative to the OBJ's directory.
pub fn load_obj(
    path: impl AsRef<Path>,
    config: &LoadConfig,
    materials: &mut MaterialTable,
) -> Result<SceneNode, LoadError> {
    let path = path.as_ref();
    let (models, mtl) = tobj::load_obj(path, &load_options()).map_err(|source| LoadError::Obj {
        path: path.to_path_buf(),
        source,
    })?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scene".to_string());
    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

    build_scene(name, models, mtl, base_dir, config, materials)
}

/// Parse OBJ text from any reader. `mtllib` references are not followed,
/// so every model gets the default material.
pub fn load_obj_reader<R: BufRead>(
    name: &str,
    reader: &mut R,
    config: &LoadConfig,
    materials: &mut MaterialTable,
) -> Result<SceneNode, LoadError> {
    let (models, mtl) = tobj::load_obj_buf(reader, &load_options(), |mtl_path| {
        log::warn!(
            "Ignoring material library {} referenced from in-memory OBJ",
            mtl_path.display()
        );
        Err(tobj::LoadError::OpenFileFailed)
    })
    .map_err(|source| LoadError::Obj {
        path: PathBuf::from(name),
        source,
    })?;

    build_scene(name.to_string(), models, mtl, Path::new(""), config, materials)
}

fn build_scene(
    name: String,
    models: Vec<tobj::Model>,
    mtl: Result<Vec<tobj::Material>, tobj::LoadError>,
    base_dir: &Path,
    config: &LoadConfig,
    table: &mut MaterialTable,
) -> Result<SceneNode, LoadError> {
    let mtl = mtl.unwrap_or_else(|err| {
        log::warn!("No usable MTL file for '{name}' ({err}), using default materials");
        Vec::new()
    });

    let material_refs: Vec<MaterialRef> = mtl
        .iter()
        .map(|material| material_ref(material, base_dir, table))
        .collect();

    let mut root = SceneNode::new(name).with_transform(config.root_transform);
    for model in models {
        let material = model
            .mesh
            .material_id
            .and_then(|id| material_refs.get(id))
            .copied()
            .unwrap_or_default();

        let triangles = mesh_triangles(&model.name, &model.mesh, material)?;
        log::debug!("Mesh '{}': {} triangles", model.name, triangles.len());
        root.children
            .push(SceneNode::new(model.name).with_triangles(triangles));
    }

    log::info!(
        "Loaded scene '{}': {} meshes, {} triangles, {} materials",
        root.name,
        root.children.len(),
        root.triangle_count(),
        material_refs.len()
    );
    Ok(root)
}

fn mesh_triangles(
    name: &str,
    mesh: &tobj::Mesh,
    material: MaterialRef,
) -> Result<Vec<Triangle>, LoadError> {
    if mesh.indices.len() % 3 != 0 {
        return Err(LoadError::IncompleteTriangle {
            mesh: name.to_string(),
            count: mesh.indices.len(),
        });
    }

    let vertex_count = mesh.positions.len() / 3;
    let has_uvs = vertex_count > 0 && mesh.texcoords.len() >= vertex_count * 2;

    let position = |index: u32| -> Result<Vector3<f64>, LoadError> {
        let i = index as usize;
        if i >= vertex_count {
            return Err(LoadError::IndexOutOfRange {
                mesh: name.to_string(),
                index,
                vertex_count,
            });
        }
        Ok(Vector3::new(
            mesh.positions[i * 3] as f64,
            mesh.positions[i * 3 + 1] as f64,
            mesh.positions[i * 3 + 2] as f64,
        ))
    };

    let uv = |index: u32| -> [f64; 2] {
        if !has_uvs {
            return [0.0; 2];
        }
        let i = index as usize;
        [mesh.texcoords[i * 2] as f64, mesh.texcoords[i * 2 + 1] as f64]
    };

    mesh.indices
        .chunks_exact(3)
        .map(|face| {
            let triangle = Triangle::new(position(face[0])?, position(face[1])?, position(face[2])?)
                .with_uvs(uv(face[0]), uv(face[1]), uv(face[2]))
                .with_material(material);
            Ok(triangle)
        })
        .collect()
}

/// Map an MTL material onto the shader's material payload.
///
/// MTL has no metallic-roughness model of its own; the PBR extension keys
/// `Pm`, `Pr` and `map_Pr` arrive through tobj's `unknown_param`.
fn material_ref(mtl: &tobj::Material, base_dir: &Path, table: &mut MaterialTable) -> MaterialRef {
    let param = |key: &str| {
        mtl.unknown_param
            .get(key)
            .and_then(|value| value.trim().parse::<f64>().ok())
    };

    let texture_id = match mtl.diffuse_texture.as_deref() {
        Some(texture) => table.intern_texture(base_dir.join(texture)),
        None => NO_TEXTURE,
    };

    let metallic_roughness = mtl
        .unknown_param
        .get("map_Pr")
        .or_else(|| mtl.unknown_param.get("map_Pm"));
    let metallic_roughness_texture_id = match metallic_roughness {
        Some(texture) => table.intern_texture(base_dir.join(texture.trim())),
        None => NO_TEXTURE,
    };

    let alpha_cutoff = param("alpha_cutoff").unwrap_or_else(|| {
        if mtl.dissolve.unwrap_or(1.0) < 1.0 {
            0.5
        } else {
            0.0
        }
    });

    MaterialRef {
        texture_id,
        metallic_roughness_texture_id,
        metallic_factor: param("Pm").unwrap_or(1.0),
        roughness_factor: param("Pr").unwrap_or(1.0),
        alpha_cutoff,
        double_sided: mtl
            .unknown_param
            .get("double_sided")
            .is_some_and(|value| value.trim() == "1"),
    }
}
