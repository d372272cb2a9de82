//! Headless terrain streaming demo.
//!
//! Walks a viewpoint across the world for a number of ticks, streaming
//! chunks in and out around it, and exercises the query API along the way:
//! line traces, collision triangles, a lighting pass, an explosion, and a
//! structure merge.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p strata-demo -- --ticks 300 --load-distance 3`.

use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use glam::{DVec3, I64Vec3};
use strata_config::{CliArgs, Config};
use strata_physics::{ColliderExtent, Light, carve_explosion, face_colliders, lighting_pass};
use strata_terrain::{RoomParams, room};
use strata_voxel::{ChunkState, Material, VoxelEdit};
use strata_world::{TerrainWorld, open_backend};
use tracing::{error, info};

/// Viewpoint speed in voxels per tick.
const WALK_SPEED: f64 = 0.5;

/// Target tick length.
const TICK: Duration = Duration::from_millis(16);

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = args.config.clone().unwrap_or_else(|| {
        dirs::config_dir()
            .map(|dir| dir.join("strata"))
            .unwrap_or_else(|| std::path::PathBuf::from(".strata"))
    });

    // Load or create config, then apply CLI overrides
    let mut config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    strata_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));

    match run(&config, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run(config: &Config, args: &CliArgs) -> Result<(), strata_world::WorldError> {
    let persistence = open_backend(&config.persistence)?;
    let mut world = TerrainWorld::new(config, persistence)?;
    if args.clear_save {
        world.clear_persistence()?;
    }

    place_landmark(&mut world);

    let mut viewpoint = DVec3::new(16.0, 16.0, 12.0);
    let mut rng = rand::rng();
    let start = Instant::now();

    for tick in 0..args.ticks {
        let tick_start = Instant::now();
        viewpoint.x += WALK_SPEED;
        world.update(viewpoint);

        if tick % 120 == 60 {
            survey_ground(&mut world, viewpoint, &mut rng);
        }
        if tick % 120 == 0 {
            let counts = world.pool_counts();
            info!(
                tick,
                x = viewpoint.x,
                loaded = world.store().keys_in_state(ChunkState::Loaded).len(),
                meshes = world.store().meshes().count(),
                ?counts,
                "streaming"
            );
        }

        if let Some(rest) = TICK.checked_sub(tick_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    info!(
        ticks = args.ticks,
        elapsed_ms = start.elapsed().as_millis() as u64,
        seed = world.seed(),
        "demo finished"
    );
    world.shutdown();
    Ok(())
}

/// A stone hut on the spawn platform.
fn place_landmark(world: &mut TerrainWorld) {
    let params = RoomParams {
        width: 7,
        length: 5,
        height: 5,
        ..RoomParams::default()
    };
    let hut = room(VoxelEdit::solid(Material::StoneAccent), &params);
    world.merge_structure(&hut, I64Vec3::new(12, 12, 7), None);
}

/// Drops a trace to the ground under the viewpoint, then lights and blasts
/// the spot it hits.
fn survey_ground<R: rand::Rng>(world: &mut TerrainWorld, viewpoint: DVec3, rng: &mut R) {
    let below = viewpoint - DVec3::new(0.0, 0.0, 64.0);
    let trace = world.trace_line(viewpoint, below, false);
    if !trace.hit {
        info!(?viewpoint, "no ground under viewpoint yet");
        return;
    }

    let colliders = face_colliders(
        world.store(),
        trace.position,
        ColliderExtent::STANDING_BODY,
        true,
    );
    let light = Light {
        position: trace.position + DVec3::new(0.0, 0.0, 6.0),
        brightness: 2000.0,
    };
    let lit = lighting_pass(world.store_mut(), &light);
    let cleared = carve_explosion(world.store_mut(), trace.position, 2, rng);

    info!(
        voxel = ?trace.voxel,
        distance = trace.distance,
        colliders = colliders.len(),
        lit,
        cleared,
        "surveyed ground"
    );
}
