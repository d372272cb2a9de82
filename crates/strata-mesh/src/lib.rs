//! Chunk meshing: exposed-face collection, greedy quad merging, the material
//! color palette, and the flat vertex buffer handed to the renderer.

pub mod chunk_mesh;
pub mod face_direction;
pub mod greedy;
pub mod palette;

pub use chunk_mesh::{ChunkMesh, FLOATS_PER_VERTEX, MeshVertex, QuadInfo, VERTICES_PER_QUAD};
pub use face_direction::FaceDirection;
pub use greedy::greedy_mesh;
pub use palette::{Palette, Rgb, color_map_coords, generate_palette, get_color, hsv_to_rgb, palette};
