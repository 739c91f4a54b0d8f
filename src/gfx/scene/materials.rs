//! Process-wide texture table.
//!
//! Loaders resolve file-local texture references to stable ids here, so that
//! every triangle in the flattened array points into one shared table. Packing
//! the textures into an atlas happens outside this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Clone)]
pub struct MaterialTable {
    textures: Vec<PathBuf>,
    ids: HashMap<PathBuf, u32>,
}

impl MaterialTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `path`, assigning the next free id on first sight.
    pub fn intern_texture(&mut self, path: impl AsRef<Path>) -> u32 {
        let path = path.as_ref();
        if let Some(&id) = self.ids.get(path) {
            return id;
        }

        let id = self.textures.len() as u32;
        self.textures.push(path.to_path_buf());
        self.ids.insert(path.to_path_buf(), id);
        log::debug!("Registered texture {} as id {}", path.display(), id);
        id
    }

    pub fn texture_path(&self, id: u32) -> Option<&Path> {
        self.textures.get(id as usize).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Textures in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Path)> {
        self.textures
            .iter()
            .enumerate()
            .map(|(id, path)| (id as u32, path.as_path()))
    }
}
