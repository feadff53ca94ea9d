//! Rendering adapter: renderer-agnostic interface.
//!
//! Turns a parsed [`SceneStore`](tilescape_map::SceneStore) into an ordered
//! list of instanced draws plus the lights that shade them. Backends consume
//! the list; they never look at map text or placements directly.
//!
//! # Invariants
//! - Renderers read the scene; nothing here mutates it.
//! - The selected texture pack changes materials only, never transforms.
//! - Draw order is fixed: floors, walls, doors, models, sun lamp, light lamps.

mod draw;
mod lighting;
mod renderer;

pub use draw::{DrawList, DrawPass, MaterialSlot, MeshFit, MeshKind, LIGHT_LAMP_SCALE, SUN_LAMP_SCALE};
pub use lighting::{LightingSetup, PointLight, MAX_POINT_LIGHTS, SHININESS, SUN_POSITION};
pub use renderer::{DebugTextRenderer, RenderView, Renderer};

pub fn crate_info() -> &'static str {
    concat!("tilescape-render v", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
