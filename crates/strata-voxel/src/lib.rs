//! Chunked voxel storage: the packed voxel buffer, chunk keys and addressing,
//! the chunk store, sparse structures, the persistence record codec, and
//! chunk selection around a viewpoint.

pub mod buffer;
pub mod chunk;
pub mod chunk_selection;
pub mod chunk_serial;
pub mod coords;
pub mod store;
pub mod structure;
pub mod voxel;

pub use buffer::{VoxelBuffer, VoxelMode};
pub use chunk::{CHUNK_SIZE, CHUNK_VOLUME, Chunk};
pub use chunk_selection::{ChunkSelectConfig, ChunkSelection, select_chunks};
pub use chunk_serial::ChunkSerError;
pub use coords::{ChunkKey, KeyParseError, LocalPos};
pub use store::{ChunkState, ChunkStore};
pub use structure::{Axis, Connection, Direction, Doorway, Structure, StructureError, Thing, Transform};
pub use voxel::{DEFAULT_SHADING, EMPTY_VOXEL, Material, Voxel, VoxelEdit, VoxelWrite};
