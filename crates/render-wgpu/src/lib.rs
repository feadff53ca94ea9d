//! wgpu render backend for tilescape.
//!
//! Draws a [`DrawList`](tilescape_render::DrawList) with Phong lighting from
//! the map's point lights and the sun, then the skybox. The camera is a
//! free-flying first-person camera driven by WASD and the mouse.
//!
//! # Invariants
//! - The backend never mutates the scene.
//! - GPU resources are created once; only the instance and frame buffers are
//!   rewritten per frame.

mod camera;
mod gpu;
mod mesh;
mod shaders;
mod texture;

pub use camera::FlyCamera;
pub use gpu::WgpuRenderer;
pub use mesh::{MeshData, Vertex};
