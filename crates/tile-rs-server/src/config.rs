use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSection,
    pub world: WorldSection,
    #[serde(default)]
    pub logging: LoggingSection,
    #[serde(default, rename = "spawner")]
    pub spawners: Vec<SpawnerSection>,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    /// Milliseconds per simulation tick.
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,
    /// Seconds between stats log lines. 0 = disabled.
    #[serde(default = "default_stats_interval")]
    pub stats_interval: u64,
}

fn default_tick_ms() -> u64 {
    50
}

fn default_stats_interval() -> u64 {
    60
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            stats_interval: default_stats_interval(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WorldSection {
    pub width: u32,
    pub height: u32,
    #[serde(default = "default_depth")]
    pub depth: u32,
    /// Floor every sector starts with.
    #[serde(default = "default_floor")]
    pub floor: u16,
    #[serde(default)]
    pub seed: u64,
}

fn default_depth() -> u32 {
    1
}

fn default_floor() -> u16 {
    150
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "info".into()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SpawnerSection {
    /// Monster template name, e.g. "Rat".
    pub monster: String,
    pub limit: usize,
    /// Seconds between spawn attempts.
    #[serde(default = "default_spawn_rate")]
    pub rate: f32,
    pub x: i32,
    pub y: i32,
    #[serde(default)]
    pub z: i32,
    #[serde(default = "default_spawn_radius")]
    pub radius: u32,
}

fn default_spawn_rate() -> f32 {
    10.0
}

fn default_spawn_radius() -> u32 {
    5
}

impl ServerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }
}
