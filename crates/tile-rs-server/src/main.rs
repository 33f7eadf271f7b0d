mod config;

use std::time::Duration;

use config::ServerConfig;
use tile_rs_game::clock::{Clock, Rate};
use tile_rs_game::spawner::{register_spawner, Spawner};
use tile_rs_game::{GameWorld, Simulation};
use tile_rs_world::sector::FlatSectorLoader;
use tile_rs_world::{Partition, Point, WorldMap};
use tracing::{info, warn};

/// Build the world and simulation described by `config`.
fn build_simulation(config: &ServerConfig) -> Result<Simulation, Box<dyn std::error::Error>> {
    let mut map = WorldMap::default();
    map.add_partition(
        0,
        Partition::new(
            config.world.width,
            config.world.height,
            config.world.depth,
            Box::new(FlatSectorLoader::new(config.world.floor)),
        ),
    )?;
    let world = GameWorld::new(map, Clock::new(config.server.tick_ms), config.world.seed);
    let mut sim = Simulation::new(world);

    for section in &config.spawners {
        let Some(template_id) = sim.world.monsters.by_name(&section.monster).map(|t| t.id) else {
            warn!("Unknown monster '{}' in spawner, skipping", section.monster);
            continue;
        };
        let center = Point::new(0, section.x, section.y, section.z);
        info!(
            "Spawner: up to {} {} around {} every {}s",
            section.limit, section.monster, center, section.rate
        );
        register_spawner(
            &mut sim,
            Spawner::new(template_id, section.limit, center, section.radius),
            Rate::Seconds(section.rate),
        );
    }

    if config.server.stats_interval > 0 {
        sim.register_stats_section(Rate::Seconds(config.server.stats_interval as f32));
    }
    Ok(sim)
}

#[tokio::main]
async fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "server.toml".into());
    let config = match ServerConfig::load(&path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load {path}: {e}");
            std::process::exit(1);
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("tile-rs server v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        "World: {}x{}x{} (floor {}, seed {})",
        config.world.width,
        config.world.height,
        config.world.depth,
        config.world.floor,
        config.world.seed
    );

    let mut sim = match build_simulation(&config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Failed to build world: {e}");
            std::process::exit(1);
        }
    };

    let mut interval = tokio::time::interval(Duration::from_millis(config.server.tick_ms.max(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    info!("Ticking every {}ms", config.server.tick_ms.max(1));

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            _ = interval.tick() => {
                sim.tick();
                // No transport attached; outgoing events are discarded.
                sim.drain_events();
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    let stats = sim.stats();
    info!(
        "Stopped after {} ticks with {} creatures",
        stats.ticks, stats.creatures
    );
}
