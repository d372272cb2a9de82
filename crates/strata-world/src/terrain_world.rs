//! The main-context owner of the voxel world.
//!
//! [`TerrainWorld`] owns the [`ChunkStore`] and three worker pools. Each
//! [`update`](TerrainWorld::update) periodically reselects the chunks around
//! the viewpoint, merges finished jobs, queues re-meshes for edited chunks,
//! and hands queued jobs to idle workers. Nothing here ever blocks on a
//! worker.

use std::sync::Arc;

use glam::{DVec3, I64Vec3};
use strata_config::Config;
use strata_mesh::ChunkMesh;
use strata_physics::{TraceResult, trace_line};
use strata_terrain::{DensityField, DensityParams, noise_seed, random_world_seed, spawn_platform};
use strata_voxel::{
    Chunk, ChunkKey, ChunkSelectConfig, ChunkSelection, ChunkState, ChunkStore, Structure, Voxel,
    VoxelEdit, select_chunks,
};

use crate::jobs::{
    GenerateJob, GenerateResult, MeshJob, MeshResult, UnloadJob, UnloadResult, generate_handler,
    mesh_handler, unload_handler,
};
use crate::persistence::{ChunkPersistence, PersistenceError};
use crate::task_pool::TaskPool;

/// Errors raised while setting up or driving a [`TerrainWorld`].
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A worker thread could not be spawned.
    #[error("failed to spawn {kind} workers: {source}")]
    SpawnError {
        kind: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// The persistence backend failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Thread count for a pool: the configured value, else all but two cores
/// (at least one).
pub fn worker_threads(setting: Option<usize>) -> usize {
    setting.unwrap_or_else(|| num_cpus::get().max(2).saturating_sub(2).max(1))
}

/// Job counts across the three pools.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolCounts {
    pub generate_queued: usize,
    pub generate_in_flight: usize,
    pub mesh_queued: usize,
    pub mesh_in_flight: usize,
    pub unload_queued: usize,
    pub unload_in_flight: usize,
}

/// The streamed voxel world.
pub struct TerrainWorld {
    store: ChunkStore<ChunkMesh>,
    field: Arc<DensityField>,
    seed: u64,
    select_config: ChunkSelectConfig,
    selection_interval: u64,
    tick: u64,
    selection: Option<ChunkSelection>,
    generators: TaskPool<GenerateJob>,
    meshers: TaskPool<MeshJob>,
    unloaders: TaskPool<UnloadJob>,
    persistence: Arc<dyn ChunkPersistence>,
}

impl TerrainWorld {
    /// Builds a world from `config`, saving unloaded chunks to `persistence`.
    pub fn new(config: &Config, persistence: Arc<dyn ChunkPersistence>) -> Result<Self, WorldError> {
        let seed = match config.terrain.seed {
            0 => random_world_seed(),
            seed => seed,
        };
        let params = DensityParams {
            scale: config.generation.scale,
            z_scale: config.generation.z_scale,
            height_scale: config.generation.height_scale,
            ..DensityParams::default()
        };
        let field = Arc::new(DensityField::new(noise_seed(seed), params));

        let workers = &config.workers;
        let spawn_err = |kind| move |source| WorldError::SpawnError { kind, source };
        let generators = TaskPool::new(
            "gen",
            worker_threads(workers.generator_threads),
            generate_handler(Arc::clone(&persistence)),
        )
        .map_err(spawn_err("gen"))?;
        let meshers = TaskPool::new("mesh", worker_threads(workers.mesher_threads), mesh_handler())
            .map_err(spawn_err("mesh"))?;
        let unloaders = TaskPool::new(
            "unload",
            worker_threads(workers.unloader_threads),
            unload_handler(Arc::clone(&persistence), config.persistence.compress),
        )
        .map_err(spawn_err("unload"))?;

        let mut world = Self {
            store: ChunkStore::new(),
            field,
            seed,
            select_config: ChunkSelectConfig {
                load_distance: config.terrain.load_distance,
                keep_margin: config.terrain.keep_margin,
            },
            selection_interval: config.terrain.selection_interval_ticks.max(1),
            tick: 0,
            selection: None,
            generators,
            meshers,
            unloaders,
            persistence,
        };
        if config.terrain.spawn_platform {
            world.place_spawn_platform();
        }

        tracing::info!(
            seed,
            load_distance = config.terrain.load_distance,
            generators = world.generators.thread_count(),
            meshers = world.meshers.thread_count(),
            unloaders = world.unloaders.thread_count(),
            "terrain world created"
        );
        Ok(world)
    }

    fn place_spawn_platform(&mut self) {
        let key = ChunkKey::new(0, 0, 0);
        self.store.insert_chunk(key, Chunk::new());
        self.store.set_state(key, ChunkState::Loaded);
        spawn_platform().merge_into_world(&mut self.store, I64Vec3::ZERO, None);
    }

    /// The world seed in use (random if the config asked for one).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of `update` calls so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn store(&self) -> &ChunkStore<ChunkMesh> {
        &self.store
    }

    /// Direct store access for effects such as lighting and explosions.
    /// Edits made here are re-meshed on the next update.
    pub fn store_mut(&mut self) -> &mut ChunkStore<ChunkMesh> {
        &mut self.store
    }

    /// The most recent chunk selection.
    pub fn selection(&self) -> Option<&ChunkSelection> {
        self.selection.as_ref()
    }

    /// Advances the world by one tick around `viewpoint`.
    pub fn update(&mut self, viewpoint: DVec3) {
        if self.tick % self.selection_interval == 0 {
            let selection = select_chunks(viewpoint, &self.select_config);
            self.load_chunks(&selection);
            self.selection = Some(selection);
        }
        self.tick += 1;

        for result in self.generators.poll() {
            self.finish_generate(result);
        }
        for result in self.meshers.poll() {
            self.finish_mesh(result);
        }
        for result in self.unloaders.poll() {
            self.finish_unload(result);
        }
        self.release_failed_jobs();

        self.rebuild_chunk_meshes();
        self.assign_jobs();
    }

    /// Replaces the generation and unload queues with the work `selection`
    /// calls for.
    pub fn load_chunks(&mut self, selection: &ChunkSelection) {
        self.generators.clear_queue();
        self.unloaders.clear_queue();

        let mut queued_loads = 0;
        for &key in &selection.to_load {
            if self.store.state(key).is_none()
                && self.generators.push(GenerateJob::new(key, Arc::clone(&self.field)))
            {
                queued_loads += 1;
            }
        }

        let mut queued_unloads = 0;
        for key in self.store.keys_in_state(ChunkState::Loaded) {
            if !selection.is_retained(key) && self.unloaders.push(UnloadJob::new(key)) {
                queued_unloads += 1;
            }
        }

        tracing::debug!(queued_loads, queued_unloads, "chunk selection applied");
    }

    /// Queues a re-mesh for every loaded chunk edited since its last one.
    ///
    /// A chunk whose previous re-mesh is still running keeps its `modified`
    /// flag and is picked up once that result is in.
    pub fn rebuild_chunk_meshes(&mut self) {
        for key in self.store.modified_keys() {
            if self.store.state(key) != Some(ChunkState::Loaded)
                || self.meshers.is_in_flight(&key)
            {
                continue;
            }
            if let Some(chunk) = self.store.chunk_mut(key) {
                chunk.take_modified();
                // Rejected only if already queued, and that job snapshots at dispatch.
                self.meshers.push(MeshJob::new(key));
            }
        }
    }

    fn assign_jobs(&mut self) {
        let store = &mut self.store;

        self.generators.assign(|job| {
            store.set_state(job.key, ChunkState::Loading);
            job.dispatched_at = store.next_mesh_timestamp();
        });

        self.meshers.assign(|job| {
            job.chunk = store.chunk(job.key).cloned();
            job.dispatched_at = store.next_mesh_timestamp();
        });

        self.unloaders.assign(|job| {
            if store.state(job.key) != Some(ChunkState::Loaded) {
                return;
            }
            job.chunk = store.take_chunk(job.key);
            store.remove_mesh(job.key);
            store.set_state(job.key, ChunkState::Unloading);
        });
    }

    fn finish_generate(&mut self, result: GenerateResult) {
        let GenerateResult {
            key,
            chunk,
            mesh,
            dispatched_at,
            from_save,
        } = result;
        self.store.insert_chunk(key, chunk);
        self.store.apply_mesh(key, mesh, dispatched_at);
        self.store.set_state(key, ChunkState::Loaded);
        tracing::trace!(%key, from_save, "chunk loaded");
    }

    fn finish_mesh(&mut self, result: MeshResult) {
        if !self.store.apply_mesh(result.key, result.mesh, result.dispatched_at) {
            tracing::trace!(key = %result.key, "stale mesh discarded");
        }
    }

    fn finish_unload(&mut self, result: UnloadResult) {
        if self.store.state(result.key) != Some(ChunkState::Unloading) {
            return;
        }
        if !result.success {
            tracing::error!(key = %result.key, "chunk unload failed, its edits are lost");
        }
        self.store.clear_state(result.key);
    }

    /// Clears the state of chunks whose generation or unload job panicked, so
    /// the next selection picks them up again.
    fn release_failed_jobs(&mut self) {
        for key in self.generators.take_failed() {
            if self.store.state(key) == Some(ChunkState::Loading) {
                self.store.clear_state(key);
            }
        }
        for key in self.unloaders.take_failed() {
            if self.store.state(key) == Some(ChunkState::Unloading) {
                tracing::error!(%key, "chunk unload panicked, its edits are lost");
                self.store.clear_state(key);
            }
        }
        for key in self.meshers.take_failed() {
            tracing::warn!(%key, "chunk keeps its previous mesh");
        }
    }

    // --- Passthroughs ---

    /// Reads the voxel at `position`.
    pub fn get_voxel(&self, position: I64Vec3, assume_solid_if_missing: bool) -> Voxel {
        self.store.get_voxel(position, assume_solid_if_missing)
    }

    /// Applies an edit. Returns true if the chunk needs a re-mesh.
    pub fn edit_voxel(&mut self, position: I64Vec3, edit: &VoxelEdit) -> bool {
        self.store.edit_voxel(position, edit)
    }

    /// Traces a segment against the loaded world.
    pub fn trace_line(&self, start: DVec3, end: DVec3, ignore_first_voxel: bool) -> TraceResult {
        trace_line(&self.store, start, end, ignore_first_voxel)
    }

    /// Merges `structure` into the loaded world at `position`.
    pub fn merge_structure(
        &mut self,
        structure: &Structure,
        position: I64Vec3,
        global_override: Option<&VoxelEdit>,
    ) {
        structure.merge_into_world(&mut self.store, position, global_override);
    }

    /// Deletes every saved chunk.
    pub fn clear_persistence(&self) -> Result<(), WorldError> {
        self.persistence.clear_all()?;
        Ok(())
    }

    // --- Pool status ---

    pub fn pool_counts(&self) -> PoolCounts {
        PoolCounts {
            generate_queued: self.generators.queued_len(),
            generate_in_flight: self.generators.in_flight_count(),
            mesh_queued: self.meshers.queued_len(),
            mesh_in_flight: self.meshers.in_flight_count(),
            unload_queued: self.unloaders.queued_len(),
            unload_in_flight: self.unloaders.in_flight_count(),
        }
    }

    /// Whether every pool is empty.
    pub fn is_idle(&self) -> bool {
        self.generators.is_idle() && self.meshers.is_idle() && self.unloaders.is_idle()
    }

    /// Stops all worker threads. Outstanding queued jobs are dropped.
    pub fn shutdown(&mut self) {
        self.generators.shutdown();
        self.meshers.shutdown();
        self.unloaders.shutdown();
    }
}
