use crate::manifest::{AssetManifest, MaterialPaths, PACK_COUNT};
use crate::model::ModelData;
use crate::texture::{CubemapImages, TextureImage};
use std::path::{Path, PathBuf};

const FALLBACK_DIFFUSE: [u8; 4] = [128, 128, 128, 255];
const FALLBACK_SPECULAR: [u8; 4] = [0, 0, 0, 255];
const FALLBACK_SKY: [u8; 4] = [40, 44, 60, 255];

/// Decoded diffuse + specular pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterialImages {
    pub diffuse: TextureImage,
    pub specular: TextureImage,
}

impl MaterialImages {
    pub fn placeholder() -> Self {
        Self {
            diffuse: TextureImage::solid(FALLBACK_DIFFUSE),
            specular: TextureImage::solid(FALLBACK_SPECULAR),
        }
    }
}

/// Decoded floor and wall materials of one texture pack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackImages {
    pub floor: MaterialImages,
    pub wall: MaterialImages,
}

/// Every asset the viewer needs, decoded and ready for upload.
#[derive(Debug, Clone)]
pub struct AssetLibrary {
    pub packs: [PackImages; PACK_COUNT],
    pub skybox: CubemapImages,
    /// `None` when the model could not be imported; model cells are then
    /// left empty.
    pub model: Option<ModelData>,
    /// Paths that fell back to placeholders, in load order.
    pub missing: Vec<PathBuf>,
}

impl AssetLibrary {
    /// Decode everything `manifest` lists, resolving paths against `root`.
    ///
    /// Never fails: each unreadable asset is logged and replaced.
    pub fn load(manifest: &AssetManifest, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let mut loader = Loader {
            root,
            missing: Vec::new(),
        };

        let packs = std::array::from_fn(|i| {
            let paths = &manifest.texture_packs[i];
            PackImages {
                floor: loader.material(&paths.floor),
                wall: loader.material(&paths.wall),
            }
        });

        let faces = std::array::from_fn(|i| loader.texture(&manifest.skybox[i], FALLBACK_SKY));
        let skybox = CubemapImages::from_faces(faces);

        let model_path = root.join(&manifest.model);
        let model = match ModelData::import(&model_path) {
            Ok(model) if model.is_empty() => {
                tracing::warn!("model {} has no triangles", model_path.display());
                None
            }
            Ok(model) => Some(model),
            Err(e) => {
                tracing::warn!("model failed to load at {}: {e}", model_path.display());
                loader.missing.push(model_path);
                None
            }
        };

        if loader.missing.is_empty() {
            tracing::info!("all assets loaded from {}", root.display());
        } else {
            tracing::warn!(
                "{} asset(s) under {} replaced by placeholders",
                loader.missing.len(),
                root.display()
            );
        }

        Self {
            packs,
            skybox,
            model,
            missing: loader.missing,
        }
    }

    /// A library made only of placeholders, without touching the filesystem.
    pub fn placeholder() -> Self {
        Self {
            packs: std::array::from_fn(|_| PackImages {
                floor: MaterialImages::placeholder(),
                wall: MaterialImages::placeholder(),
            }),
            skybox: CubemapImages::solid(FALLBACK_SKY),
            model: None,
            missing: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

struct Loader<'a> {
    root: &'a Path,
    missing: Vec<PathBuf>,
}

impl Loader<'_> {
    fn texture(&mut self, relative: &Path, fallback: [u8; 4]) -> TextureImage {
        let path = self.root.join(relative);
        let (texture, found) = TextureImage::load_or_solid(&path, fallback);
        if !found {
            self.missing.push(path);
        }
        texture
    }

    fn material(&mut self, paths: &MaterialPaths) -> MaterialImages {
        MaterialImages {
            diffuse: self.texture(&paths.diffuse, FALLBACK_DIFFUSE),
            specular: self.texture(&paths.specular, FALLBACK_SPECULAR),
        }
    }
}
