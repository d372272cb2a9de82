//! The three worker job kinds: terrain generation, re-meshing, and
//! unload-and-save.
//!
//! Jobs own everything they touch. Chunk buffers are moved or cloned into a
//! job by the dispatch hook in [`crate::terrain_world`], so workers never see
//! the main store.

use std::sync::Arc;
use std::time::Instant;

use strata_mesh::{ChunkMesh, greedy_mesh};
use strata_terrain::{DensityField, generate_chunk};
use strata_voxel::{Chunk, ChunkKey};

use crate::persistence::{ChunkPersistence, load_chunk, store_chunk};
use crate::task_pool::{Handler, Job};

/// Meshes `chunk`, mapping an empty result to `None`.
fn build_mesh(chunk: &Chunk) -> Option<ChunkMesh> {
    let mesh = greedy_mesh(chunk);
    (!mesh.is_empty()).then_some(mesh)
}

// --- Generation ---

/// Produce the chunk at `key`, from persistence if saved, else from terrain.
#[derive(Debug)]
pub struct GenerateJob {
    pub key: ChunkKey,
    pub field: Arc<DensityField>,
    /// Mesh timestamp, stamped at dispatch.
    pub dispatched_at: u64,
}

impl GenerateJob {
    pub fn new(key: ChunkKey, field: Arc<DensityField>) -> Self {
        Self {
            key,
            field,
            dispatched_at: 0,
        }
    }
}

/// A chunk ready to be merged into the store.
#[derive(Debug)]
pub struct GenerateResult {
    pub key: ChunkKey,
    pub chunk: Chunk,
    pub mesh: Option<ChunkMesh>,
    pub dispatched_at: u64,
    /// Whether the chunk came from a saved record.
    pub from_save: bool,
}

impl Job for GenerateJob {
    type Key = ChunkKey;
    type Output = GenerateResult;

    fn idempotency_key(&self) -> Option<ChunkKey> {
        Some(self.key)
    }
}

/// Runs a generation job.
///
/// A saved record always gets meshed. A freshly generated chunk is meshed
/// only when generation placed any solid voxel. A record that fails to
/// decode is logged and regenerated.
pub fn run_generate(job: GenerateJob, persistence: &dyn ChunkPersistence) -> GenerateResult {
    let start = Instant::now();
    let GenerateJob {
        key,
        field,
        dispatched_at,
    } = job;

    let saved = match load_chunk(persistence, key) {
        Ok(saved) => saved,
        Err(e) => {
            tracing::error!(%key, error = %e, "failed to load saved chunk, regenerating");
            None
        }
    };

    let (mut chunk, mesh, from_save) = match saved {
        Some(chunk) => {
            let mesh = build_mesh(&chunk);
            (chunk, mesh, true)
        }
        None => {
            let chunk = generate_chunk(key, &field);
            let mesh = if chunk.is_modified() {
                build_mesh(&chunk)
            } else {
                None
            };
            (chunk, mesh, false)
        }
    };
    chunk.set_modified(false);

    tracing::trace!(
        %key,
        from_save,
        elapsed_us = start.elapsed().as_micros() as u64,
        "chunk generated"
    );
    GenerateResult {
        key,
        chunk,
        mesh,
        dispatched_at,
        from_save,
    }
}

/// Worker handler for generation pools.
pub fn generate_handler(persistence: Arc<dyn ChunkPersistence>) -> Handler<GenerateJob> {
    Arc::new(move |job| run_generate(job, persistence.as_ref()))
}

// --- Meshing ---

/// Rebuild the mesh of `key`. The chunk snapshot is taken at dispatch.
#[derive(Debug)]
pub struct MeshJob {
    pub key: ChunkKey,
    pub chunk: Option<Chunk>,
    pub dispatched_at: u64,
}

impl MeshJob {
    pub fn new(key: ChunkKey) -> Self {
        Self {
            key,
            chunk: None,
            dispatched_at: 0,
        }
    }
}

#[derive(Debug)]
pub struct MeshResult {
    pub key: ChunkKey,
    pub mesh: Option<ChunkMesh>,
    pub dispatched_at: u64,
}

impl Job for MeshJob {
    type Key = ChunkKey;
    type Output = MeshResult;

    /// One re-mesh per chunk at a time. The snapshot is taken at dispatch, so
    /// a queued job already covers edits made after it was pushed.
    fn idempotency_key(&self) -> Option<ChunkKey> {
        Some(self.key)
    }
}

pub fn run_mesh(job: MeshJob) -> MeshResult {
    MeshResult {
        key: job.key,
        mesh: job.chunk.as_ref().and_then(build_mesh),
        dispatched_at: job.dispatched_at,
    }
}

/// Worker handler for meshing pools.
pub fn mesh_handler() -> Handler<MeshJob> {
    Arc::new(run_mesh)
}

// --- Unloading ---

/// Save and drop the chunk at `key`. The chunk is moved in at dispatch.
#[derive(Debug)]
pub struct UnloadJob {
    pub key: ChunkKey,
    pub chunk: Option<Chunk>,
}

impl UnloadJob {
    pub fn new(key: ChunkKey) -> Self {
        Self { key, chunk: None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnloadResult {
    pub key: ChunkKey,
    /// False when the record could not be written.
    pub success: bool,
    /// Whether the job carried a chunk at all.
    pub saved: bool,
}

impl Job for UnloadJob {
    type Key = ChunkKey;
    type Output = UnloadResult;

    fn idempotency_key(&self) -> Option<ChunkKey> {
        Some(self.key)
    }
}

/// Runs an unload job, writing the chunk to `persistence`.
pub fn run_unload(job: UnloadJob, persistence: &dyn ChunkPersistence, compress: bool) -> UnloadResult {
    let Some(chunk) = job.chunk else {
        return UnloadResult {
            key: job.key,
            success: true,
            saved: false,
        };
    };
    match store_chunk(persistence, job.key, &chunk, compress) {
        Ok(()) => UnloadResult {
            key: job.key,
            success: true,
            saved: true,
        },
        Err(e) => {
            tracing::error!(key = %job.key, error = %e, "failed to save chunk on unload");
            UnloadResult {
                key: job.key,
                success: false,
                saved: false,
            }
        }
    }
}

/// Worker handler for unload pools.
pub fn unload_handler(persistence: Arc<dyn ChunkPersistence>, compress: bool) -> Handler<UnloadJob> {
    Arc::new(move |job| run_unload(job, persistence.as_ref(), compress))
}
