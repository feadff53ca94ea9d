use crate::draw::{DrawList, MaterialSlot};
use crate::lighting::LightingSetup;
use glam::Vec3;
use std::fmt::Write;
use tilescape_common::Category;
use tilescape_input::TexturePack;
use tilescape_map::SceneStore;

/// Camera/view configuration for rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderView {
    /// Camera position in world space.
    pub eye: Vec3,
    /// Unit look direction.
    pub forward: Vec3,
    /// Vertical field of view in degrees.
    pub fov_degrees: f32,
    pub texture_pack: TexturePack,
}

impl Default for RenderView {
    fn default() -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 3.0),
            forward: Vec3::NEG_Z,
            fov_degrees: 45.0,
            texture_pack: TexturePack::default(),
        }
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
///
/// The renderer reads the scene and a view configuration, then produces
/// output. It never mutates the scene.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    /// Render one frame of `scene` as seen from `view`.
    fn render(&self, scene: &SceneStore, view: &RenderView) -> Self::Output;
}

/// Produces a human-readable dump of the scene and its draw list.
///
/// Used by the CLI and by tests of the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    /// Print every placement, not only the counts.
    pub list_placements: bool,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placements() -> Self {
        Self {
            list_placements: true,
        }
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, scene: &SceneStore, view: &RenderView) -> String {
        let lighting = LightingSetup::from_scene(scene);
        let list = DrawList::build(scene, &lighting, view.texture_pack);

        let mut out = String::new();
        let _ = writeln!(out, "=== Scene ({}) ===", scene.counts());
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) forward=({:.2}, {:.2}, {:.2}) fov={:.0}",
            view.eye.x,
            view.eye.y,
            view.eye.z,
            view.forward.x,
            view.forward.y,
            view.forward.z,
            view.fov_degrees
        );
        let _ = writeln!(
            out,
            "Lights: {} point (+sun), {} dropped",
            lighting.point_count(),
            lighting.dropped
        );

        let _ = writeln!(out, "Draws:");
        for pass in list.passes() {
            let material = match pass.material {
                MaterialSlot::Floor(pack) => format!("floor/{pack}"),
                MaterialSlot::Wall(pack) => format!("wall/{pack}"),
                MaterialSlot::Model => "model".to_string(),
                MaterialSlot::Lamp => "lamp".to_string(),
            };
            let _ = writeln!(out, "  {:?} x{} [{material}]", pass.mesh, pass.len());
        }

        if self.list_placements {
            for category in Category::ALL {
                for p in scene.get(category) {
                    let _ = writeln!(
                        out,
                        "  {:<5} pos=({:.0}, {:.0}, {:.0}) rot={:.0}",
                        category.label(),
                        p.position.x,
                        p.position.y,
                        p.position.z,
                        p.rotation
                    );
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescape_map::parse_lines;

    #[test]
    fn debug_renderer_empty_scene() {
        let output = DebugTextRenderer::new().render(&SceneStore::new(), &RenderView::default());

        assert!(output.contains("walls=0"));
        assert!(output.contains("Lights: 0 point"));
        assert!(output.contains("Lamp x1 [lamp]"));
        assert!(output.contains("fov=45"));
    }

    #[test]
    fn debug_renderer_with_placements() {
        let scene = parse_lines(["WdO"]);
        let view = RenderView {
            texture_pack: TexturePack::new(2).unwrap(),
            ..RenderView::default()
        };
        let output = DebugTextRenderer::with_placements().render(&scene, &view);

        assert!(output.contains("Floor x2 [floor/pack 2]"));
        assert!(output.contains("Door x1 [wall/pack 2]"));
        assert!(output.contains("pos=(1, 0, 0) rot=90"));
    }

    #[test]
    fn render_view_default() {
        let view = RenderView::default();
        assert_eq!(view.fov_degrees, 45.0);
        assert_eq!(view.forward, Vec3::NEG_Z);
        assert_eq!(view.texture_pack.number(), 1);
    }
}
