//! Chunk record storage.
//!
//! Backends are plain key-value stores keyed by the canonical `"x,y,z"`
//! chunk key string. They are shared with worker threads and must be
//! callable concurrently. Absence is `Ok(None)`, never an error.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use strata_config::{PersistenceBackend, PersistenceConfig};
use strata_voxel::{Chunk, ChunkKey, ChunkSerError};

/// Errors raised by persistence backends.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Failed to read a record.
    #[error("failed to read chunk record {key}: {source}")]
    ReadError {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Failed to write a record.
    #[error("failed to write chunk record {key}: {source}")]
    WriteError {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Failed to wipe the store.
    #[error("failed to clear chunk records: {0}")]
    ClearError(#[source] io::Error),

    /// A stored record could not be decoded.
    #[error("corrupt chunk record: {0}")]
    CodecError(#[from] ChunkSerError),
}

/// A key-value store for serialized chunks.
pub trait ChunkPersistence: Send + Sync {
    /// Reads the record stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Stores `record` under `key`, replacing any previous record.
    fn put(&self, key: &str, record: &[u8]) -> Result<(), PersistenceError>;

    /// Removes every record.
    fn clear_all(&self) -> Result<(), PersistenceError>;
}

/// Reads and decodes the chunk stored for `key`.
pub fn load_chunk(
    persistence: &dyn ChunkPersistence,
    key: ChunkKey,
) -> Result<Option<Chunk>, PersistenceError> {
    match persistence.get(&key.to_string())? {
        Some(record) => Ok(Some(Chunk::deserialize(&record)?)),
        None => Ok(None),
    }
}

/// Encodes and stores `chunk` under `key`.
pub fn store_chunk(
    persistence: &dyn ChunkPersistence,
    key: ChunkKey,
    chunk: &Chunk,
    compress: bool,
) -> Result<(), PersistenceError> {
    persistence.put(&key.to_string(), &chunk.serialize(compress))
}

/// In-memory backend. Records live as long as the backend.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    records: DashMap<String, Vec<u8>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ChunkPersistence for MemoryPersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        Ok(self.records.get(key).map(|record| record.value().clone()))
    }

    fn put(&self, key: &str, record: &[u8]) -> Result<(), PersistenceError> {
        self.records.insert(key.to_string(), record.to_vec());
        Ok(())
    }

    fn clear_all(&self) -> Result<(), PersistenceError> {
        self.records.clear();
        Ok(())
    }
}

/// File extension of chunk records on disk.
const RECORD_EXTENSION: &str = "chunk";

/// One file per record under a save directory.
///
/// Records are written to a temporary file and renamed into place, so a
/// reader never sees a partial record.
#[derive(Debug, Clone)]
pub struct DirectoryPersistence {
    dir: PathBuf,
}

impl DirectoryPersistence {
    /// Opens (creating if needed) a save directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| PersistenceError::WriteError {
            key: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// The save directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{RECORD_EXTENSION}"))
    }
}

impl ChunkPersistence for DirectoryPersistence {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        match fs::read(self.record_path(key)) {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::ReadError {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn put(&self, key: &str, record: &[u8]) -> Result<(), PersistenceError> {
        let path = self.record_path(key);
        let tmp = path.with_extension(format!("{RECORD_EXTENSION}.tmp"));
        let write_err = |source| PersistenceError::WriteError {
            key: key.to_string(),
            source,
        };
        fs::write(&tmp, record).map_err(write_err)?;
        fs::rename(&tmp, &path).map_err(write_err)
    }

    fn clear_all(&self) -> Result<(), PersistenceError> {
        let entries = fs::read_dir(&self.dir).map_err(PersistenceError::ClearError)?;
        let mut removed = 0usize;
        for entry in entries {
            let path = entry.map_err(PersistenceError::ClearError)?.path();
            if path.extension().is_some_and(|ext| ext == RECORD_EXTENSION) {
                fs::remove_file(&path).map_err(PersistenceError::ClearError)?;
                removed += 1;
            }
        }
        tracing::info!(dir = %self.dir.display(), removed, "cleared saved chunks");
        Ok(())
    }
}

/// Opens the backend `config` asks for.
///
/// A directory backend without a resolvable save directory falls back to
/// memory.
pub fn open_backend(config: &PersistenceConfig) -> Result<Arc<dyn ChunkPersistence>, PersistenceError> {
    match (config.backend, config.resolved_save_dir()) {
        (PersistenceBackend::Memory, _) => Ok(Arc::new(MemoryPersistence::new())),
        (PersistenceBackend::Directory, Some(dir)) => {
            tracing::info!(dir = %dir.display(), "saving chunks to directory");
            Ok(Arc::new(DirectoryPersistence::open(dir)?))
        }
        (PersistenceBackend::Directory, None) => {
            tracing::warn!("no save directory available, chunk saves kept in memory");
            Ok(Arc::new(MemoryPersistence::new()))
        }
    }
}
