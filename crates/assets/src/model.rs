use crate::texture::TextureImage;
use crate::AssetError;
use glam::{Mat3, Mat4, Vec3};
use std::path::Path;

/// Interleaved vertex of an imported model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// An imported scene flattened into one indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct ModelData {
    pub name: String,
    pub vertices: Vec<ModelVertex>,
    pub indices: Vec<u32>,
    /// First base color texture found on any material.
    pub base_color: Option<TextureImage>,
}

impl ModelData {
    /// Import a model, choosing the loader by file extension.
    pub fn import(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "obj" => Self::import_obj(path),
            "gltf" | "glb" => Self::import_gltf(path),
            _ => Err(AssetError::UnsupportedModel(path.display().to_string())),
        }
    }

    /// Import a Wavefront `.obj` file and its material library.
    ///
    /// Faces are triangulated. Texture coordinates are flipped to a top-left
    /// origin. The first diffuse map named by any material becomes the base
    /// color; a missing `.mtl` only loses textures.
    pub fn import_obj(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let (models, materials) = tobj::load_obj(path, &tobj::GPU_LOAD_OPTIONS)?;
        let materials = materials.unwrap_or_else(|e| {
            tracing::warn!("no materials for {}: {e}", path.display());
            Vec::new()
        });

        let mut model = ModelData {
            name: file_stem(path),
            ..Default::default()
        };
        for obj in &models {
            model.append_obj_mesh(&obj.mesh);
        }

        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        model.base_color = materials
            .iter()
            .filter_map(|m| m.diffuse_texture.as_deref())
            .find(|t| !t.is_empty())
            .and_then(|texture| {
                let texture_path = dir.join(texture.replace('\\', "/"));
                match TextureImage::load(&texture_path) {
                    Ok(image) => Some(image),
                    Err(e) => {
                        tracing::warn!(
                            "model texture failed to load at {}: {e}",
                            texture_path.display()
                        );
                        None
                    }
                }
            });

        tracing::info!(
            "imported model {}: {} vertices, {} triangles, texture={}",
            path.display(),
            model.vertices.len(),
            model.triangle_count(),
            model.base_color.is_some()
        );
        Ok(model)
    }

    /// Import a `.gltf` or `.glb` file.
    ///
    /// Node transforms are baked into the vertices. Missing normals default to
    /// +Y, missing texture coordinates to zero, missing indices to a plain
    /// triangle list.
    pub fn import_gltf(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let (document, buffers, images) = gltf::import(path)?;

        let mut model = ModelData {
            name: file_stem(path),
            ..Default::default()
        };

        let scene = document
            .default_scene()
            .or_else(|| document.scenes().next());
        if let Some(scene) = scene {
            for node in scene.nodes() {
                model.append_node(&node, Mat4::IDENTITY, &buffers, &images)?;
            }
        }

        tracing::info!(
            "imported model {}: {} vertices, {} triangles, texture={}",
            path.display(),
            model.vertices.len(),
            model.triangle_count(),
            model.base_color.is_some()
        );
        Ok(model)
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned bounds of all vertices.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let mut points = self.vertices.iter().map(|v| Vec3::from(v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p))))
    }

    fn append_obj_mesh(&mut self, mesh: &tobj::Mesh) {
        let count = mesh.positions.len() / 3;
        let base = self.vertices.len() as u32;
        for i in 0..count {
            let normal = mesh
                .normals
                .get(i * 3..i * 3 + 3)
                .map_or(Vec3::Y, Vec3::from_slice)
                .normalize_or(Vec3::Y);
            let uv = mesh
                .texcoords
                .get(i * 2..i * 2 + 2)
                .map_or([0.0, 0.0], |t| [t[0], 1.0 - t[1]]);
            self.vertices.push(ModelVertex {
                position: Vec3::from_slice(&mesh.positions[i * 3..i * 3 + 3]).into(),
                normal: normal.into(),
                uv,
            });
        }
        self.indices.extend(mesh.indices.iter().map(|&i| base + i));
    }

    fn append_node(
        &mut self,
        node: &gltf::Node,
        parent: Mat4,
        buffers: &[gltf::buffer::Data],
        images: &[gltf::image::Data],
    ) -> Result<(), AssetError> {
        let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());

        if let Some(mesh) = node.mesh() {
            let normal_matrix = Mat3::from_mat4(world).inverse().transpose();
            for primitive in mesh.primitives() {
                self.append_primitive(&primitive, mesh.name(), world, normal_matrix, buffers)?;
                if self.base_color.is_none() {
                    self.base_color = base_color_image(&primitive, images);
                }
            }
        }

        for child in node.children() {
            self.append_node(&child, world, buffers, images)?;
        }
        Ok(())
    }

    fn append_primitive(
        &mut self,
        primitive: &gltf::Primitive,
        mesh_name: Option<&str>,
        world: Mat4,
        normal_matrix: Mat3,
        buffers: &[gltf::buffer::Data],
    ) -> Result<(), AssetError> {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            tracing::warn!(
                "skipping non-triangle primitive ({:?}) in mesh {:?}",
                primitive.mode(),
                mesh_name
            );
            return Ok(());
        }

        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let positions: Vec<[f32; 3]> = reader
            .read_positions()
            .ok_or_else(|| AssetError::MissingPositions(mesh_name.unwrap_or("unnamed").into()))?
            .collect();
        let normals: Vec<[f32; 3]> = reader
            .read_normals()
            .map(|iter| iter.collect())
            .unwrap_or_else(|| vec![[0.0, 1.0, 0.0]; positions.len()]);
        let uvs: Vec<[f32; 2]> = reader
            .read_tex_coords(0)
            .map(|tc| tc.into_f32().collect())
            .unwrap_or_else(|| vec![[0.0, 0.0]; positions.len()]);

        let base = self.vertices.len() as u32;
        for (i, p) in positions.iter().enumerate() {
            let position = world.transform_point3(Vec3::from(*p));
            let normal = normals.get(i).map_or(Vec3::Y, |n| Vec3::from(*n));
            let normal = (normal_matrix * normal).normalize_or(Vec3::Y);
            self.vertices.push(ModelVertex {
                position: position.into(),
                normal: normal.into(),
                uv: uvs.get(i).copied().unwrap_or([0.0, 0.0]),
            });
        }

        match reader.read_indices() {
            Some(indices) => self.indices.extend(indices.into_u32().map(|i| base + i)),
            None => self.indices.extend(base..base + positions.len() as u32),
        }
        Ok(())
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".into())
}

fn base_color_image(
    primitive: &gltf::Primitive,
    images: &[gltf::image::Data],
) -> Option<TextureImage> {
    let info = primitive
        .material()
        .pbr_metallic_roughness()
        .base_color_texture()?;
    let data = images.get(info.texture().source().index())?;
    to_rgba8(data)
}

fn to_rgba8(data: &gltf::image::Data) -> Option<TextureImage> {
    use gltf::image::Format;

    let rgba = match data.format {
        Format::R8G8B8A8 => data.pixels.clone(),
        Format::R8G8B8 => data
            .pixels
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 255])
            .collect(),
        Format::R8G8 => data
            .pixels
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        Format::R8 => data.pixels.iter().flat_map(|&l| [l, l, l, 255]).collect(),
        other => {
            tracing::warn!("unsupported glTF texture format {other:?}, using flat color");
            return None;
        }
    };
    Some(TextureImage {
        width: data.width,
        height: data.height,
        rgba,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    // One triangle: (0,0,0), (1,0,0), (0,1,0); no normals, uvs or indices.
    const TRIANGLE_GLTF: &str = r#"{
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "translation": [2.0, 0.0, 0.0] }],
        "meshes": [{ "name": "tri", "primitives": [{ "attributes": { "POSITION": 0 } }] }],
        "buffers": [{
            "byteLength": 36,
            "uri": "data:application/octet-stream;base64,AAAAAAAAAAAAAAAAAACAPwAAAAAAAAAAAAAAAAAAgD8AAAAA"
        }],
        "bufferViews": [{ "buffer": 0, "byteLength": 36 }],
        "accessors": [{
            "bufferView": 0,
            "componentType": 5126,
            "count": 3,
            "type": "VEC3",
            "min": [0.0, 0.0, 0.0],
            "max": [1.0, 1.0, 0.0]
        }]
    }"#;

    #[test]
    fn import_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ModelData::import_gltf(dir.path().join("nanosuit.gltf")).unwrap_err();
        assert!(matches!(err, AssetError::Gltf(_)));
    }

    #[test]
    fn import_single_triangle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tri.gltf");
        std::fs::write(&path, TRIANGLE_GLTF).unwrap();

        let model = ModelData::import_gltf(&path).unwrap();
        assert_eq!(model.name, "tri");
        assert_eq!(model.vertices.len(), 3);
        assert_eq!(model.indices, vec![0, 1, 2]);
        assert_eq!(model.triangle_count(), 1);
        assert!(model.base_color.is_none());

        // Node translation is baked in.
        assert_eq!(model.vertices[1].position, [3.0, 0.0, 0.0]);
        assert_eq!(model.vertices[0].normal, [0.0, 1.0, 0.0]);

        let (lo, hi) = model.bounds().unwrap();
        assert_eq!(lo, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(hi, Vec3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn import_obj_quad_with_material() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("crate.obj"),
            "mtllib crate.mtl\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             vn 0 0 2\n\
             usemtl box\n\
             f 1/1/1 2/2/1 3/3/1 4/4/1\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("crate.mtl"),
            "newmtl box\nmap_Kd crate.png\n",
        )
        .unwrap();
        image::RgbaImage::from_pixel(2, 2, image::Rgba([5, 6, 7, 255]))
            .save(dir.path().join("crate.png"))
            .unwrap();

        let model = ModelData::import(dir.path().join("crate.obj")).unwrap();
        assert_eq!(model.name, "crate");
        assert_eq!(model.vertices.len(), 4);
        assert_eq!(model.triangle_count(), 2);
        assert_eq!(model.vertices[0].normal, [0.0, 0.0, 1.0]);
        // v is flipped to a top-left origin.
        assert_eq!(model.vertices[0].uv, [0.0, 1.0]);
        assert_eq!(model.vertices[2].uv, [1.0, 0.0]);
        let texture = model.base_color.unwrap();
        assert_eq!((texture.width, texture.height), (2, 2));
    }

    #[test]
    fn import_obj_without_material_library() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bare.obj");
        std::fs::write(&path, "mtllib gone.mtl\nv 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n").unwrap();

        let model = ModelData::import_obj(&path).unwrap();
        assert_eq!(model.triangle_count(), 1);
        assert!(model.base_color.is_none());
        assert_eq!(model.vertices[1].normal, [0.0, 1.0, 0.0]);
    }

    #[test]
    fn import_rejects_unknown_extension() {
        let err = ModelData::import("model/suit.fbx").unwrap_err();
        assert!(matches!(err, AssetError::UnsupportedModel(_)));
    }

    #[test]
    fn empty_model_has_no_bounds() {
        let model = ModelData::default();
        assert!(model.is_empty());
        assert!(model.bounds().is_none());
    }

    #[test]
    fn grayscale_alpha_expands_to_rgba() {
        let data = gltf::image::Data {
            pixels: vec![7, 200],
            format: gltf::image::Format::R8G8,
            width: 1,
            height: 1,
        };
        assert_eq!(to_rgba8(&data).unwrap().rgba, vec![7, 7, 7, 200]);
    }
}
