use crate::AssetError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tilescape_map::{SymbolRule, SymbolTable};

/// Number of selectable texture packs.
pub const PACK_COUNT: usize = 3;

/// Diffuse and specular maps of one surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPaths {
    pub diffuse: PathBuf,
    pub specular: PathBuf,
}

impl MaterialPaths {
    fn in_dir(dir: &str, extension: &str) -> Self {
        Self {
            diffuse: PathBuf::from(format!("textures/{dir}/diff.{extension}")),
            specular: PathBuf::from(format!("textures/{dir}/spec.{extension}")),
        }
    }
}

/// Floor and wall materials swapped together by a texture pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackPaths {
    pub floor: MaterialPaths,
    pub wall: MaterialPaths,
}

/// Where every asset lives, relative to the asset root.
///
/// Missing fields in a manifest file take their default value, so a manifest
/// only needs to list what it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetManifest {
    pub texture_packs: [PackPaths; PACK_COUNT],
    /// Cube faces in +X, -X, +Y, -Y, +Z, -Z order.
    pub skybox: [PathBuf; 6],
    /// Model placed at every model cell (`.obj`, `.gltf` or `.glb`).
    pub model: PathBuf,
    /// Extra or replacement map symbols on top of the standard table.
    pub symbols: Vec<SymbolRule>,
}

impl Default for AssetManifest {
    fn default() -> Self {
        let sky = |face: &str| PathBuf::from(format!("textures/skyboxnn/{face}.jpg"));
        Self {
            texture_packs: [
                PackPaths {
                    floor: MaterialPaths::in_dir("floor", "jpg"),
                    wall: MaterialPaths::in_dir("wall1", "png"),
                },
                PackPaths {
                    floor: MaterialPaths::in_dir("floor2", "jpg"),
                    wall: MaterialPaths::in_dir("wall2", "png"),
                },
                PackPaths {
                    floor: MaterialPaths::in_dir("floor3", "jpg"),
                    wall: MaterialPaths::in_dir("wall3", "png"),
                },
            ],
            // The shipped skybox reuses "right" and "front" for their
            // opposite faces; kept as-is.
            skybox: [
                sky("right"),
                sky("right"),
                sky("top"),
                sky("bottom"),
                sky("front"),
                sky("front"),
            ],
            model: PathBuf::from("model/nanosuit/nanosuit.obj"),
            symbols: Vec::new(),
        }
    }
}

impl AssetManifest {
    /// Load a manifest from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let file = std::fs::File::open(path)?;
        let manifest: Self = serde_json::from_reader(std::io::BufReader::new(file))?;
        Ok(manifest)
    }

    /// Save the manifest as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    pub fn to_json_pretty(&self) -> Result<String, AssetError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The standard symbol table with this manifest's rules applied on top.
    pub fn symbol_table(&self) -> SymbolTable {
        let mut table = SymbolTable::standard();
        table.extend(self.symbols.iter().copied());
        table
    }
}
