use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of object a placement describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Wall,
    Door,
    Floor,
    Light,
    Model,
}

impl Category {
    /// All categories, in scene store order.
    pub const ALL: [Category; 5] = [
        Category::Wall,
        Category::Door,
        Category::Floor,
        Category::Light,
        Category::Model,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Wall => "wall",
            Category::Door => "door",
            Category::Floor => "floor",
            Category::Light => "light",
            Category::Model => "model",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where and how one object instance sits in the world grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub position: Vec3,
    /// Degrees about the vertical axis.
    pub rotation: f32,
    pub scale: Vec3,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: 0.0,
            scale: Vec3::ONE,
        }
    }
}

impl Placement {
    /// A placement at `position` with no rotation and unit scale.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, degrees: f32) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Rotation about +Y as a quaternion.
    pub fn orientation(&self) -> Quat {
        Quat::from_rotation_y(self.rotation.to_radians())
    }

    /// translate(position) * rotate_y(rotation) * scale(scale).
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.orientation(), self.position)
    }
}
