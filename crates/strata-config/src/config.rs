//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Streaming and world setup.
    pub terrain: TerrainConfig,
    /// Density field shape.
    pub generation: GenerationConfig,
    /// Worker pool sizes.
    pub workers: WorkersConfig,
    /// Chunk save storage.
    pub persistence: PersistenceConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// Streaming and world setup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TerrainConfig {
    /// Horizontal load radius in chunks.
    pub load_distance: u32,
    /// Extra chunks kept loaded beyond the load radius.
    pub keep_margin: u32,
    /// Ticks between chunk selection passes.
    pub selection_interval_ticks: u64,
    /// World seed. `0` picks a random seed at startup.
    pub seed: u64,
    /// Place the spawn platform in chunk `(0, 0, 0)`.
    pub spawn_platform: bool,
}

/// Density field shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    /// Horizontal feature size in voxels.
    pub scale: f64,
    /// Vertical squash of the fine octaves.
    pub z_scale: f64,
    /// Voxels of height per unit of falloff.
    pub height_scale: f64,
}

/// Worker pool sizes. `None` picks from the CPU count; `Some(0)` runs that
/// kind of job inline on the main thread.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkersConfig {
    pub generator_threads: Option<usize>,
    pub mesher_threads: Option<usize>,
    pub unloader_threads: Option<usize>,
}

/// Where chunk saves go.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum PersistenceBackend {
    /// One file per chunk under the save directory.
    #[default]
    Directory,
    /// Kept in memory for the lifetime of the process.
    Memory,
}

/// Chunk save storage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    pub backend: PersistenceBackend,
    /// Save directory. Defaults to a `strata/save` folder in the user data dir.
    pub save_dir: Option<PathBuf>,
    /// LZ4-compress chunk records.
    pub compress: bool,
}

impl PersistenceConfig {
    /// The configured save directory, or the default one if the platform
    /// has a user data dir.
    pub fn resolved_save_dir(&self) -> Option<PathBuf> {
        self.save_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("strata").join("save")))
    }
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

// --- Default implementations ---

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            load_distance: 5,
            keep_margin: 2,
            selection_interval_ticks: 60,
            seed: 0,
            spawn_platform: true,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            scale: 20.0,
            z_scale: 0.5,
            height_scale: 14.0,
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            backend: PersistenceBackend::Directory,
            save_dir: None,
            compress: true,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join("config.ron");

        if config_path.exists() {
            let config = read_config(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(|source| ConfigError::WriteError {
            path: config_dir.to_path_buf(),
            source,
        })?;

        let config_path = config_dir.join("config.ron");
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(|source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        })?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = read_config(&config_dir.join("config.ron"))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

fn read_config(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    ron::from_str(&contents).map_err(|source| ConfigError::ParseError {
        path: path.to_path_buf(),
        source,
    })
}
