//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

use crate::{Config, PersistenceBackend};

/// Strata command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "strata", about = "Chunked voxel terrain engine")]
pub struct CliArgs {
    /// Horizontal load radius in chunks.
    #[arg(long)]
    pub load_distance: Option<u32>,

    /// World seed (0 = random).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Threads per worker pool (0 = run jobs inline).
    #[arg(long)]
    pub threads: Option<usize>,

    /// Number of ticks to simulate before exiting.
    #[arg(long, default_value_t = 600)]
    pub ticks: u64,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Keep chunk saves in memory instead of on disk.
    #[arg(long)]
    pub memory_store: bool,

    /// Delete every saved chunk before starting.
    #[arg(long)]
    pub clear_save: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(distance) = args.load_distance {
            self.terrain.load_distance = distance;
        }
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(threads) = args.threads {
            self.workers.generator_threads = Some(threads);
            self.workers.mesher_threads = Some(threads);
            self.workers.unloader_threads = Some(threads);
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.memory_store {
            self.persistence.backend = PersistenceBackend::Memory;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_override() {
        let mut config = Config::default();
        let args = CliArgs {
            load_distance: Some(3),
            seed: Some(77),
            threads: Some(0),
            memory_store: true,
            ..CliArgs::default()
        };
        config.apply_cli_overrides(&args);
        assert_eq!(config.terrain.load_distance, 3);
        assert_eq!(config.terrain.seed, 77);
        assert_eq!(config.workers.mesher_threads, Some(0));
        assert_eq!(config.persistence.backend, PersistenceBackend::Memory);
        // Non-overridden fields retain defaults
        assert_eq!(config.terrain.keep_margin, 2);
        assert_eq!(config.debug.log_level, "info");
    }

    #[test]
    fn test_cli_no_override() {
        let original = Config::default();
        let mut config = Config::default();
        config.apply_cli_overrides(&CliArgs::default());
        assert_eq!(config, original);
    }

    #[test]
    fn test_cli_parses_flags() {
        let args = CliArgs::parse_from([
            "strata",
            "--load-distance",
            "2",
            "--ticks",
            "10",
            "--clear-save",
        ]);
        assert_eq!(args.load_distance, Some(2));
        assert_eq!(args.ticks, 10);
        assert!(args.clear_save);
        assert!(!args.memory_store);
    }
}
