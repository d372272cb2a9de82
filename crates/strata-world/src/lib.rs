//! The streamed voxel world: worker pools, chunk persistence, and the
//! main-context coordinator that ties the store, generator, and mesher
//! together.

pub mod jobs;
pub mod persistence;
pub mod task_pool;
pub mod terrain_world;

pub use jobs::{GenerateJob, GenerateResult, MeshJob, MeshResult, UnloadJob, UnloadResult};
pub use persistence::{
    ChunkPersistence, DirectoryPersistence, MemoryPersistence, PersistenceError, load_chunk,
    open_backend, store_chunk,
};
pub use task_pool::{Handler, Job, TaskPool};
pub use terrain_world::{PoolCounts, TerrainWorld, WorldError, worker_threads};
