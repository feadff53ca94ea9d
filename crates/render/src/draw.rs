use crate::lighting::LightingSetup;
use glam::{Mat4, Vec3};
use tilescape_common::{Category, Placement};
use tilescape_input::TexturePack;
use tilescape_map::SceneStore;

/// Scale of the marker cube drawn at the sun.
pub const SUN_LAMP_SCALE: f32 = 0.2;
/// Scale of the marker cube drawn at each map light.
pub const LIGHT_LAMP_SCALE: f32 = 0.05;

/// Geometry a pass is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MeshKind {
    Floor,
    Wall,
    Door,
    Model,
    Lamp,
}

/// Textures bound while a pass is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaterialSlot {
    Floor(TexturePack),
    Wall(TexturePack),
    /// The imported model's own texture.
    Model,
    /// Unlit, flat white.
    Lamp,
}

/// Offset and uniform scale that size a mesh to one grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshFit {
    pub offset: Vec3,
    pub scale: f32,
}

impl MeshFit {
    pub const IDENTITY: Self = Self {
        offset: Vec3::ZERO,
        scale: 1.0,
    };

    /// Brings the imported model down to the floor and to cell size.
    pub const MODEL: Self = Self {
        offset: Vec3::new(0.0, -0.5, 0.0),
        scale: 0.05,
    };

    pub fn for_category(category: Category) -> Self {
        match category {
            Category::Model => Self::MODEL,
            _ => Self::IDENTITY,
        }
    }

    /// `translate(position + offset) * rotate_y * scale(scale * fit)`.
    pub fn transform(&self, placement: &Placement) -> Mat4 {
        Mat4::from_scale_rotation_translation(
            placement.scale * self.scale,
            placement.orientation(),
            placement.position + self.offset,
        )
    }
}

/// One instanced draw: a mesh, its material and one transform per instance.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawPass {
    pub mesh: MeshKind,
    pub material: MaterialSlot,
    pub transforms: Vec<Mat4>,
}

impl DrawPass {
    fn from_records(
        mesh: MeshKind,
        material: MaterialSlot,
        fit: MeshFit,
        records: &[Placement],
    ) -> Self {
        Self {
            mesh,
            material,
            transforms: records.iter().map(|p| fit.transform(p)).collect(),
        }
    }

    fn lamps(positions: impl IntoIterator<Item = Vec3>, scale: f32) -> Self {
        Self {
            mesh: MeshKind::Lamp,
            material: MaterialSlot::Lamp,
            transforms: positions
                .into_iter()
                .map(|p| {
                    Placement::at(p)
                        .with_scale(Vec3::splat(scale))
                        .model_matrix()
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }
}

/// Every draw of one frame, in submission order.
///
/// The list always holds the same six passes; a pass with no instances is
/// kept so the order stays fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawList {
    passes: Vec<DrawPass>,
}

impl DrawList {
    pub fn build(scene: &SceneStore, lighting: &LightingSetup, pack: TexturePack) -> Self {
        let passes = vec![
            DrawPass::from_records(
                MeshKind::Floor,
                MaterialSlot::Floor(pack),
                MeshFit::IDENTITY,
                scene.floors(),
            ),
            DrawPass::from_records(
                MeshKind::Wall,
                MaterialSlot::Wall(pack),
                MeshFit::IDENTITY,
                scene.walls(),
            ),
            // Doors share the wall textures.
            DrawPass::from_records(
                MeshKind::Door,
                MaterialSlot::Wall(pack),
                MeshFit::IDENTITY,
                scene.doors(),
            ),
            DrawPass::from_records(
                MeshKind::Model,
                MaterialSlot::Model,
                MeshFit::MODEL,
                scene.models(),
            ),
            DrawPass::lamps([lighting.sun.position], SUN_LAMP_SCALE),
            DrawPass::lamps(scene.lights().iter().map(|p| p.position), LIGHT_LAMP_SCALE),
        ];
        tracing::debug!(
            "built draw list: {} passes, {} instances, {pack}",
            passes.len(),
            passes.iter().map(DrawPass::len).sum::<usize>()
        );
        Self { passes }
    }

    pub fn passes(&self) -> &[DrawPass] {
        &self.passes
    }

    pub fn instance_count(&self) -> usize {
        self.passes.iter().map(DrawPass::len).sum()
    }

    /// The largest pass, for sizing instance buffers.
    pub fn max_pass_len(&self) -> usize {
        self.passes.iter().map(DrawPass::len).max().unwrap_or(0)
    }
}
