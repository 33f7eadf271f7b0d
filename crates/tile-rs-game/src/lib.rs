//! Game logic: creatures, combat, tick scheduling, and creature AI.

pub mod ai;
pub mod clock;
pub mod combat;
pub mod command;
pub mod creature;
pub mod error;
pub mod events;
pub mod game_world;
pub mod monster;
pub mod registry;
pub mod simulation;
pub mod spawner;
pub mod spells;
pub mod tasks;

pub use error::GameError;
pub use game_world::GameWorld;
pub use simulation::Simulation;
