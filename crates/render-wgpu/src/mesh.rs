use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use tilescape_assets::ModelData;

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// Indexed triangle list ready for upload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Axis-aligned box with outward normals and one full texture per face.
    pub fn cuboid(lo: Vec3, hi: Vec3) -> Self {
        let mut mesh = Self::default();
        mesh.push_cuboid(lo, hi);
        mesh
    }

    /// The wall and lamp cube, one unit wide and centered on the cell.
    pub fn unit_cube() -> Self {
        Self::cuboid(Vec3::splat(-0.5), Vec3::splat(0.5))
    }

    /// Thin slab just below the walls' base.
    pub fn floor_tile() -> Self {
        Self::cuboid(Vec3::new(-0.5, -0.6, -0.5), Vec3::new(0.5, -0.5, 0.5))
    }

    /// Two pillars and a lintel, open along Z.
    pub fn door_frame() -> Self {
        let mut mesh = Self::default();
        mesh.push_cuboid(Vec3::new(-0.5, -0.5, -0.17), Vec3::new(-0.25, 0.4, 0.17));
        mesh.push_cuboid(Vec3::new(0.25, -0.5, -0.17), Vec3::new(0.5, 0.4, 0.17));
        mesh.push_cuboid(Vec3::new(-0.5, 0.4, -0.17), Vec3::new(0.5, 0.5, 0.17));
        mesh
    }

    /// Cube seen from inside, for the skybox.
    pub fn sky_cube() -> Self {
        Self::cuboid(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    pub fn from_model(model: &ModelData) -> Self {
        Self {
            vertices: model
                .vertices
                .iter()
                .map(|v| Vertex {
                    position: v.position,
                    normal: v.normal,
                    uv: v.uv,
                })
                .collect(),
            indices: model.indices.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }

    fn push_cuboid(&mut self, lo: Vec3, hi: Vec3) {
        // Corners per face run bottom-left, bottom-right, top-right, top-left
        // as seen from outside.
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            ([0.0, 0.0, 1.0], [
                [lo.x, lo.y, hi.z], [hi.x, lo.y, hi.z], [hi.x, hi.y, hi.z], [lo.x, hi.y, hi.z],
            ]),
            ([0.0, 0.0, -1.0], [
                [hi.x, lo.y, lo.z], [lo.x, lo.y, lo.z], [lo.x, hi.y, lo.z], [hi.x, hi.y, lo.z],
            ]),
            ([1.0, 0.0, 0.0], [
                [hi.x, lo.y, hi.z], [hi.x, lo.y, lo.z], [hi.x, hi.y, lo.z], [hi.x, hi.y, hi.z],
            ]),
            ([-1.0, 0.0, 0.0], [
                [lo.x, lo.y, lo.z], [lo.x, lo.y, hi.z], [lo.x, hi.y, hi.z], [lo.x, hi.y, lo.z],
            ]),
            ([0.0, 1.0, 0.0], [
                [lo.x, hi.y, hi.z], [hi.x, hi.y, hi.z], [hi.x, hi.y, lo.z], [lo.x, hi.y, lo.z],
            ]),
            ([0.0, -1.0, 0.0], [
                [lo.x, lo.y, lo.z], [hi.x, lo.y, lo.z], [hi.x, lo.y, hi.z], [lo.x, lo.y, hi.z],
            ]),
        ];
        const UVS: [[f32; 2]; 4] = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        for (normal, corners) in faces {
            let base = self.vertices.len() as u32;
            for (position, uv) in corners.into_iter().zip(UVS) {
                self.vertices.push(Vertex {
                    position,
                    normal,
                    uv,
                });
            }
            self.indices
                .extend([0, 1, 2, 2, 3, 0].into_iter().map(|i| base + i));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(mesh: &MeshData) -> (Vec3, Vec3) {
        mesh.vertices.iter().map(|v| Vec3::from(v.position)).fold(
            (Vec3::splat(f32::MAX), Vec3::splat(f32::MIN)),
            |(lo, hi), p| (lo.min(p), hi.max(p)),
        )
    }

    #[test]
    fn unit_cube_shape() {
        let cube = MeshData::unit_cube();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        assert_eq!(bounds(&cube), (Vec3::splat(-0.5), Vec3::splat(0.5)));
    }

    #[test]
    fn cube_faces_wind_outward() {
        let cube = MeshData::unit_cube();
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|i| Vec3::from(cube.vertices[tri[i] as usize].position));
            let face_normal = (b - a).cross(c - a).normalize();
            let declared = Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.abs_diff_eq(declared, 1e-6));
            // Outward: the face sits on the side its normal points to.
            assert!(a.dot(declared) > 0.0);
        }
    }

    #[test]
    fn floor_tile_sits_below_walls() {
        let (lo, hi) = bounds(&MeshData::floor_tile());
        assert_eq!(lo.y, -0.6);
        assert_eq!(hi.y, -0.5);
        assert_eq!((lo.x, hi.x), (-0.5, 0.5));
    }

    #[test]
    fn door_frame_fits_cell() {
        let door = MeshData::door_frame();
        assert_eq!(door.vertices.len(), 72);
        assert_eq!(door.index_count(), 108);
        let (lo, hi) = bounds(&door);
        assert_eq!(lo, Vec3::new(-0.5, -0.5, -0.17));
        assert_eq!(hi, Vec3::new(0.5, 0.5, 0.17));
        assert!(door.indices.iter().all(|&i| (i as usize) < door.vertices.len()));
    }

    #[test]
    fn model_conversion_keeps_indices() {
        let model = ModelData {
            name: "tri".into(),
            vertices: vec![
                tilescape_assets::ModelVertex {
                    position: [0.0, 0.0, 0.0],
                    normal: [0.0, 1.0, 0.0],
                    uv: [0.5, 0.5],
                };
                3
            ],
            indices: vec![2, 1, 0],
            base_color: None,
        };
        let mesh = MeshData::from_model(&model);
        assert_eq!(mesh.indices, vec![2, 1, 0]);
        assert_eq!(mesh.vertices[0].uv, [0.5, 0.5]);
        assert!(!mesh.is_empty());
    }
}
