//! A module for defining AI behaviors for non-player combatants.

use crate::battle::commands::{mp_cost, Command, CommandAction};
use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::content::GameData;
use combat_schema::SkillData;

/// Probability that an actor with an affordable skill uses one instead of attacking.
pub const SKILL_USE_CHANCE: f64 = 0.5;

/// Read-only view of the battle handed to a behavior.
pub struct BattleView<'a> {
    pub actors: &'a [Combatant],
    pub data: &'a GameData,
    pub config: &'a BattleConfig,
}

/// A trait for any system that can decide on a battle action.
pub trait Behavior: Send {
    /// Decide the next command for the combatant at `actor_index`.
    fn decide_action(&self, actor_index: usize, view: &BattleView<'_>, rng: &mut TurnRng) -> Command;
}

/// Coin flip between a random affordable skill and a basic attack, with random targets.
pub struct RandomSkillAI;

impl RandomSkillAI {
    pub fn new() -> Self {
        Self
    }

    fn affordable_skills(&self, actor: &Combatant, view: &BattleView<'_>) -> Vec<SkillData> {
        let multiplier = view.config.mechanics.mp_cost_multiplier;
        actor
            .skills
            .iter()
            .filter_map(|skill| view.data.resolve_skill(skill).ok())
            .filter(|skill| actor.mp >= mp_cost(skill, multiplier))
            .collect()
    }
}

impl Default for RandomSkillAI {
    fn default() -> Self {
        Self::new()
    }
}

impl Behavior for RandomSkillAI {
    fn decide_action(&self, actor_index: usize, view: &BattleView<'_>, rng: &mut TurnRng) -> Command {
        let actor = &view.actors[actor_index];
        if actor.is_stunned {
            return Command::stunned(&actor.id);
        }

        let opponents: Vec<&Combatant> = view
            .actors
            .iter()
            .filter(|c| c.is_alive() && !c.is_ally_of(actor))
            .collect();
        if opponents.is_empty() {
            return Command::defend(&actor.id);
        }

        let skills = self.affordable_skills(actor, view);
        if !skills.is_empty() && rng.chance(SKILL_USE_CHANCE, "ai uses skill") {
            if let Some(skill) = rng.pick(&skills, "ai skill choice") {
                let target_id = if skill.targets_allies() {
                    let allies: Vec<&Combatant> = view
                        .actors
                        .iter()
                        .filter(|c| c.is_alive() && c.is_ally_of(actor))
                        .collect();
                    rng.pick(&allies, "ai ally target")
                        .map_or_else(|| actor.id.clone(), |ally| ally.id.clone())
                } else {
                    rng.pick(&opponents, "ai skill target")
                        .map_or_else(|| actor.id.clone(), |target| target.id.clone())
                };

                return Command {
                    actor_id: actor.id.clone(),
                    action: CommandAction::Skill {
                        skill: skill.clone().into(),
                        target_id: Some(target_id),
                    },
                };
            }
        }

        let target = rng.pick(&opponents, "ai attack target");
        Command {
            actor_id: actor.id.clone(),
            action: CommandAction::Attack {
                target_id: target.map(|t| t.id.clone()),
            },
        }
    }
}
