//! Player commands applied to the simulation.

use serde::{Deserialize, Serialize};
use tile_rs_world::{CreatureId, Point};
use tracing::debug;

use crate::creature::PlayerId;
use crate::error::GameError;
use crate::simulation::Simulation;
use crate::spells::SpellTarget;

/// Tiles within which a player can tame a creature.
pub const TAME_RANGE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    /// Step to an adjacent tile.
    Move { to: Point },
    /// Start or stop attacking a creature.
    SetAttackTarget { target: Option<CreatureId> },
    /// Cast a spell. Spells aimed at others use `target`, or the current
    /// attack target when `target` is omitted.
    CastSpell {
        spell: u32,
        #[serde(default)]
        target: Option<CreatureId>,
    },
    Tame { creature: CreatureId },
}

impl Simulation {
    /// Apply a command from a connected player.
    pub fn apply_command(&mut self, player: PlayerId, command: Command) -> Result<(), GameError> {
        let (id, pos) = self
            .world
            .creatures
            .creature_for_player(player)
            .map(|c| (c.id, c.pos))
            .ok_or(GameError::PlayerNotConnected(player))?;
        debug!("{} command: {:?}", player, command);

        match command {
            Command::Move { to } => {
                if pos.max_diff(to) != 1 {
                    return Err(GameError::InvalidMove { from: pos, to });
                }
                self.world.move_creature(id, to)
            }
            Command::SetAttackTarget { target } => {
                if let Some(target) = target {
                    self.check_target(id, target)?;
                }
                if let Some(state) = self.state_mut(id) {
                    state.set_target(target);
                }
                Ok(())
            }
            Command::CastSpell { spell, target } => {
                let spell = self
                    .world
                    .spells
                    .get(spell)
                    .cloned()
                    .ok_or(GameError::UnknownSpell(spell))?;
                match spell.target {
                    SpellTarget::Caster => {
                        self.with_state(id, |state, world, peers| {
                            state.attack(world, peers, Some(spell), true)
                        });
                        Ok(())
                    }
                    SpellTarget::Other => {
                        if let Some(target) = target {
                            self.check_target(id, target)?;
                        }
                        if let Some(state) = self.state_mut(id) {
                            if target.is_some() {
                                state.set_target(target);
                            }
                            state.set_current_spell(Some(spell.id));
                        }
                        Ok(())
                    }
                }
            }
            Command::Tame { creature } => {
                let other = self
                    .world
                    .creatures
                    .get(creature)
                    .ok_or(GameError::UnknownCreature(creature))?;
                if pos.max_diff(other.pos) > TAME_RANGE {
                    return Err(GameError::InvalidTarget(creature));
                }
                self.tame(creature, player)
            }
        }
    }

    fn check_target(&self, me: CreatureId, target: CreatureId) -> Result<(), GameError> {
        if target == me || !self.world.creatures.contains(target) {
            return Err(GameError::InvalidTarget(target));
        }
        Ok(())
    }
}
