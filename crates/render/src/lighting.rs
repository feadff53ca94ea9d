use glam::Vec3;
use tilescape_map::SceneStore;

/// Upper bound on point lights uploaded per frame.
pub const MAX_POINT_LIGHTS: usize = 32;

/// Fixed position of the global sun light.
pub const SUN_POSITION: Vec3 = Vec3::new(1.2, 20.0, 2.0);

/// Shininess shared by every lit material.
pub const SHININESS: f32 = 64.0;

/// Phong light terms at a world position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub ambient: Vec3,
    pub diffuse: Vec3,
    pub specular: Vec3,
    /// Constant, linear and quadratic falloff. `(1, 0, 0)` means no falloff.
    pub attenuation: Vec3,
}

impl PointLight {
    /// A light placed by an `l` cell.
    pub fn map_light(position: Vec3) -> Self {
        Self {
            position,
            ambient: Vec3::splat(0.2),
            diffuse: Vec3::splat(0.5),
            specular: Vec3::splat(1.0),
            attenuation: Vec3::new(1.0, 0.09, 0.032),
        }
    }

    /// The dim global light high above the map.
    pub fn sun() -> Self {
        Self {
            position: SUN_POSITION,
            ambient: Vec3::splat(0.04),
            diffuse: Vec3::splat(0.1),
            specular: Vec3::splat(0.2),
            attenuation: Vec3::X,
        }
    }
}

/// Every light affecting the lit pass, derived from the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingSetup {
    pub sun: PointLight,
    /// At most [`MAX_POINT_LIGHTS`] entries, in scan order.
    pub points: Vec<PointLight>,
    pub shininess: f32,
    /// Light records beyond the cap.
    pub dropped: usize,
}

impl Default for LightingSetup {
    fn default() -> Self {
        Self {
            sun: PointLight::sun(),
            points: Vec::new(),
            shininess: SHININESS,
            dropped: 0,
        }
    }
}

impl LightingSetup {
    pub fn from_scene(scene: &SceneStore) -> Self {
        let lights = scene.lights();
        let points: Vec<PointLight> = lights
            .iter()
            .take(MAX_POINT_LIGHTS)
            .map(|p| PointLight::map_light(p.position))
            .collect();
        let dropped = lights.len() - points.len();
        if dropped > 0 {
            tracing::warn!(
                "map has {} lights, only the first {MAX_POINT_LIGHTS} are used",
                lights.len()
            );
        }
        Self {
            points,
            dropped,
            ..Self::default()
        }
    }

    pub fn point_count(&self) -> usize {
        self.points.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_map::parse_lines;

    #[test]
    fn lights_follow_light_cells() {
        let scene = parse_lines(["l.l", "", "  l"]);
        let setup = LightingSetup::from_scene(&scene);

        assert_eq!(setup.point_count(), 3);
        assert_eq!(setup.dropped, 0);
        assert_eq!(setup.points[1].position, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(setup.points[2].position, Vec3::new(2.0, 0.0, 2.0));
        assert_eq!(setup.points[0].diffuse, Vec3::splat(0.5));
        assert_eq!(setup.points[0].attenuation, Vec3::new(1.0, 0.09, 0.032));
        assert_eq!(setup.shininess, 64.0);
    }

    #[test]
    fn sun_is_always_present() {
        let setup = LightingSetup::from_scene(&SceneStore::new());
        assert!(setup.points.is_empty());
        assert_eq!(setup.sun.position, SUN_POSITION);
        assert_eq!(setup.sun.ambient, Vec3::splat(0.04));
        assert_eq!(setup.sun.specular, Vec3::splat(0.2));
        // No falloff for the sun.
        assert_eq!(setup.sun.attenuation, Vec3::X);
    }

    #[test]
    fn excess_lights_are_dropped() {
        let row = "l".repeat(MAX_POINT_LIGHTS + 5);
        let setup = LightingSetup::from_scene(&parse_lines([row]));
        assert_eq!(setup.point_count(), MAX_POINT_LIGHTS);
        assert_eq!(setup.dropped, 5);
        assert_eq!(
            setup.points.last().unwrap().position.x,
            (MAX_POINT_LIGHTS - 1) as f32
        );
    }
}
