//! wgpu render backend for the shadow puzzle.
//!
//! Draws the room, carving and pedestal layers in order onto one surface,
//! each with its own shadow map. The camera orbits a fixed target.
//!
//! # Invariants
//! - Renderer never mutates scene or puzzle state.
//! - Camera motion is not part of the puzzle state.

mod camera;
mod gpu;
mod shaders;

pub use camera::OrbitCamera;
pub use gpu::WgpuRenderer;
