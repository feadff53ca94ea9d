//! Asset pipeline: manifest, texture and cubemap decoding, glTF and OBJ model import.
//!
//! Everything is decoded to CPU-side buffers once at startup. The GPU backend
//! uploads from these buffers and never touches file paths.
//!
//! # Invariants
//! - A missing or undecodable asset never aborts startup; it is logged and a
//!   placeholder takes its place.
//! - Paths in the manifest are relative to the asset root unless absolute.

mod library;
mod manifest;
mod model;
mod texture;

pub use library::{AssetLibrary, MaterialImages, PackImages};
pub use manifest::{AssetManifest, MaterialPaths, PackPaths, PACK_COUNT};
pub use model::{ModelData, ModelVertex};
pub use texture::{CubemapImages, TextureImage};

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),
    #[error("glTF error: {0}")]
    Gltf(#[from] gltf::Error),
    #[error("OBJ error: {0}")]
    Obj(#[from] tobj::LoadError),
    #[error("unsupported model format: {0}")]
    UnsupportedModel(String),
    #[error("glTF primitive in mesh {0:?} has no positions")]
    MissingPositions(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    concat!("tilescape-assets v", env!("CARGO_PKG_VERSION"))
}
