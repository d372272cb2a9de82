//! Configuration for the terrain engine.
//!
//! Settings persist to disk as a RON file and can be overridden from the
//! command line. Every section defaults field by field, so old and new
//! config files both load.

mod cli;
mod config;
mod error;

pub use cli::CliArgs;
pub use config::{
    Config, DebugConfig, GenerationConfig, PersistenceBackend, PersistenceConfig, TerrainConfig,
    WorkersConfig,
};
pub use error::ConfigError;
