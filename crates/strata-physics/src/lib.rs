//! Voxel queries used by movement and effects code: line tracing, collision
//! triangles around a body, baked point lighting, and explosion breakage.

pub mod explosion;
pub mod face_colliders;
pub mod lighting;
pub mod voxel_raycast;

pub use explosion::{break_chance, carve_explosion};
pub use face_colliders::{ColliderExtent, FaceCollider, face_colliders};
pub use lighting::{LIGHTING_HARD_CUTOFF, Light, lighting_pass, voxel_shades};
pub use voxel_raycast::{SolidityLookup, TraceResult, trace_line};
