//! Command types and the executor that applies one actor's command.

use crate::battle::calculators::DamageCalculator;
use crate::battle::effects;
use crate::battle::state::{BattleEvent, BattleStats, EventBus, TurnRng};
use crate::combatant::{Buff, Combatant};
use crate::content::GameData;
use crate::errors::{BattleResult, DataError};
use crate::player::{Inventory, PlayerModel};
use combat_schema::{ItemData, ItemEffectType, ItemRef, SkillData, SkillKind, SkillRef};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Share of max HP restored by a heal skill without an explicit amount.
pub const DEFAULT_HEAL_FRACTION: f64 = 0.3;
pub const DEFAULT_ITEM_BUFF_DURATION: u32 = 3;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum CommandAction {
    Attack { target_id: Option<String> },
    Defend,
    Skill { skill: SkillRef, target_id: Option<String> },
    Item { item: ItemRef, target_id: Option<String> },
    Flee,
    Stunned,
}

/// One actor's intended action for the round.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Command {
    pub actor_id: String,
    pub action: CommandAction,
}

impl Command {
    pub fn attack(actor_id: &str, target_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Attack {
                target_id: Some(target_id.to_string()),
            },
        }
    }

    pub fn defend(actor_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Defend,
        }
    }

    pub fn skill(actor_id: &str, skill: impl Into<SkillRef>, target_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Skill {
                skill: skill.into(),
                target_id: Some(target_id.to_string()),
            },
        }
    }

    pub fn item(actor_id: &str, item: impl Into<ItemRef>, target_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Item {
                item: item.into(),
                target_id: Some(target_id.to_string()),
            },
        }
    }

    pub fn flee(actor_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Flee,
        }
    }

    pub fn stunned(actor_id: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            action: CommandAction::Stunned,
        }
    }
}

/// Everything a command may read or mutate while it resolves.
pub struct CommandContext<'a> {
    pub actors: &'a mut [Combatant],
    pub models: &'a mut [PlayerModel],
    pub data: &'a GameData,
    pub calculator: &'a DamageCalculator,
    pub stats: &'a mut BattleStats,
    pub rng: &'a mut TurnRng,
    pub bus: &'a mut EventBus,
}

pub fn find_actor(actors: &[Combatant], id: &str) -> Option<usize> {
    actors.iter().position(|actor| actor.id == id)
}

/// `floor(cost * multiplier)`
pub fn mp_cost(skill: &SkillData, multiplier: f64) -> u32 {
    (skill.cost.mp as f64 * multiplier).floor().max(0.0) as u32
}

/// Model index of the party member who owns the shared inventory: the first
/// model-backed player combatant.
pub fn inventory_holder(actors: &[Combatant]) -> Option<usize> {
    actors
        .iter()
        .find(|actor| actor.is_player && actor.model_index.is_some())
        .and_then(|actor| actor.model_index)
}

/// Mutable access to two different actors at once.
fn pair_mut(actors: &mut [Combatant], a: usize, b: usize) -> (&mut Combatant, &mut Combatant) {
    if a < b {
        let (left, right) = actors.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = actors.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}

/// Apply one command. Invalid targets are redirected and missing data degrades
/// to a safe default; an `Err` here means the battle state itself is broken.
pub fn execute_command(command: &Command, ctx: &mut CommandContext<'_>) -> BattleResult<()> {
    let actor_idx = find_actor(ctx.actors, &command.actor_id)
        .ok_or_else(|| DataError::ActorNotFound(command.actor_id.clone()))?;

    if !ctx.actors[actor_idx].is_alive() {
        debug!("{} is down, skipping command", command.actor_id);
        return Ok(());
    }

    if ctx.actors[actor_idx].is_stunned || command.action == CommandAction::Stunned {
        ctx.bus.push(BattleEvent::Stunned {
            actor: ctx.actors[actor_idx].name.clone(),
        });
        return Ok(());
    }

    match &command.action {
        CommandAction::Attack { target_id } => {
            execute_offense(actor_idx, None, target_id.as_deref(), ctx)
        }
        CommandAction::Skill { skill, target_id } => match ctx.data.resolve_skill(skill) {
            Ok(skill) => execute_skill(actor_idx, &skill, target_id.as_deref(), ctx),
            Err(err) => {
                warn!("{}: {}, falling back to a basic attack", command.actor_id, err);
                ctx.bus.push(BattleEvent::SkillUnavailable {
                    actor: ctx.actors[actor_idx].name.clone(),
                    skill: skill.id().to_string(),
                });
                execute_offense(actor_idx, None, target_id.as_deref(), ctx)
            }
        },
        CommandAction::Item { item, target_id } => {
            execute_item(actor_idx, item, target_id.as_deref(), ctx);
            Ok(())
        }
        // Fleeing resolves at submission; one that reaches execution defends.
        CommandAction::Defend | CommandAction::Flee => {
            let actor = &mut ctx.actors[actor_idx];
            actor.is_defending = true;
            ctx.bus.push(BattleEvent::Defended {
                actor: actor.name.clone(),
            });
            Ok(())
        }
        CommandAction::Stunned => Ok(()),
    }
}

/// Pick the final target index, or `None` when the pool is exhausted.
fn resolve_target(
    actor_idx: usize,
    target_id: Option<&str>,
    friendly_intent: bool,
    ctx: &mut CommandContext<'_>,
) -> Option<usize> {
    let actor_is_player = ctx.actors[actor_idx].is_player;
    let mut target_idx = target_id.and_then(|id| find_actor(ctx.actors, id));

    if let Some(idx) = target_idx {
        let same_faction = ctx.actors[idx].is_player == actor_is_player;
        if same_faction && !friendly_intent {
            let opponents = living(ctx.actors, |c| c.is_player != actor_is_player);
            match ctx.rng.pick(&opponents, "friendly fire redirect") {
                Some(&new_idx) => {
                    debug!(
                        "{} would hit ally {}, redirected to {}",
                        ctx.actors[actor_idx].name, ctx.actors[idx].name, ctx.actors[new_idx].name
                    );
                    target_idx = Some(new_idx);
                }
                None => {
                    debug!("{} has no opponent left to redirect to", ctx.actors[actor_idx].name);
                    return None;
                }
            }
        }
    }

    match target_idx {
        Some(idx) if ctx.actors[idx].is_alive() => Some(idx),
        _ => {
            let pool = living(ctx.actors, |c| (c.is_player == actor_is_player) == friendly_intent);
            match ctx.rng.pick(&pool, "dead target redirect") {
                Some(&new_idx) => {
                    ctx.bus.push(BattleEvent::TargetRedirected {
                        actor: ctx.actors[actor_idx].name.clone(),
                        target: ctx.actors[new_idx].name.clone(),
                    });
                    Some(new_idx)
                }
                None => {
                    ctx.bus.push(BattleEvent::TargetLost {
                        actor: ctx.actors[actor_idx].name.clone(),
                    });
                    None
                }
            }
        }
    }
}

fn living(actors: &[Combatant], filter: impl Fn(&Combatant) -> bool) -> Vec<usize> {
    actors
        .iter()
        .enumerate()
        .filter(|(_, c)| c.is_alive() && filter(c))
        .map(|(i, _)| i)
        .collect()
}

fn execute_skill(
    actor_idx: usize,
    skill: &SkillData,
    target_id: Option<&str>,
    ctx: &mut CommandContext<'_>,
) -> BattleResult<()> {
    let cost = mp_cost(skill, ctx.calculator.config().mechanics.mp_cost_multiplier);
    if ctx.actors[actor_idx].mp < cost {
        let actor = &ctx.actors[actor_idx];
        warn!("{} cannot afford {} ({} < {})", actor.name, skill.name, actor.mp, cost);
        ctx.bus.push(BattleEvent::InsufficientMp {
            actor: actor.name.clone(),
            skill: skill.name.clone(),
            required: cost,
            available: actor.mp,
        });
        return Ok(());
    }

    if skill.kind == SkillKind::Heal {
        let Some(target_idx) = resolve_target(actor_idx, target_id, true, ctx) else {
            return Ok(());
        };
        ctx.actors[actor_idx].spend_mp(cost);

        let target = &mut ctx.actors[target_idx];
        let amount = skill
            .heal_amount
            .unwrap_or_else(|| (target.max_hp as f64 * DEFAULT_HEAL_FRACTION).floor() as u32);
        let healed = target.heal(amount);
        let target_name = target.name.clone();
        let outcomes = effects::apply_effects(&skill.effects, target, ctx.rng);

        ctx.bus.push(BattleEvent::Healed {
            actor: ctx.actors[actor_idx].name.clone(),
            target: target_name.clone(),
            action: skill.name.clone(),
            amount: healed,
        });
        for outcome in outcomes {
            ctx.bus.push(BattleEvent::EffectResolved {
                target: target_name.clone(),
                outcome,
            });
        }
        return Ok(());
    }

    execute_offense(actor_idx, Some((skill, cost)), target_id, ctx)
}

/// Basic attacks and every non-heal skill go through `attack_target`.
fn execute_offense(
    actor_idx: usize,
    skill: Option<(&SkillData, u32)>,
    target_id: Option<&str>,
    ctx: &mut CommandContext<'_>,
) -> BattleResult<()> {
    let friendly_intent = skill.is_some_and(|(s, _)| s.is_support());
    let Some(target_idx) = resolve_target(actor_idx, target_id, friendly_intent, ctx) else {
        return Ok(());
    };

    let skill_data = skill.map(|(s, _)| s);
    if let Some((_, cost)) = skill {
        ctx.actors[actor_idx].spend_mp(cost);
    }

    let result = if actor_idx == target_idx {
        let attacker = ctx.actors[actor_idx].clone();
        attacker.attack_target(&mut ctx.actors[target_idx], skill_data, ctx.calculator, ctx.rng)
    } else {
        let (attacker, target) = pair_mut(ctx.actors, actor_idx, target_idx);
        attacker.attack_target(target, skill_data, ctx.calculator, ctx.rng)
    };

    let actor = &ctx.actors[actor_idx];
    let target = &ctx.actors[target_idx];

    if result.dodged {
        ctx.bus.push(BattleEvent::AttackDodged {
            actor: actor.name.clone(),
            target: target.name.clone(),
        });
        return Ok(());
    }

    if result.damage > 0 {
        ctx.bus.push(BattleEvent::AttackHit {
            actor: actor.name.clone(),
            target: target.name.clone(),
            action: skill_data.map_or_else(|| "Attack".to_string(), |s| s.name.clone()),
            damage: result.damage,
            critical: result.critical,
            advantage: result.is_advantage,
        });
        if actor.is_player {
            ctx.stats.total_damage_dealt += result.damage;
        } else {
            ctx.stats.total_damage_taken += result.damage;
        }
    }

    for outcome in result.effects {
        ctx.bus.push(BattleEvent::EffectResolved {
            target: target.name.clone(),
            outcome,
        });
    }

    if !target.is_alive() && result.damage > 0 {
        ctx.bus.push(BattleEvent::CombatantDefeated {
            target: target.name.clone(),
        });
    }

    Ok(())
}

fn execute_item(actor_idx: usize, item_ref: &ItemRef, target_id: Option<&str>, ctx: &mut CommandContext<'_>) {
    let actor_name = ctx.actors[actor_idx].name.clone();
    let unavailable = |bus: &mut EventBus| {
        bus.push(BattleEvent::ItemUnavailable {
            actor: actor_name.clone(),
            item: item_ref.id().to_string(),
        })
    };

    let item: ItemData = match ctx.data.resolve_item(item_ref) {
        Ok(item) => item,
        Err(err) => {
            warn!("{}: {}, skipping item command", actor_name, err);
            unavailable(ctx.bus);
            return;
        }
    };

    let usable = match item.effect_type {
        ItemEffectType::Passive => false,
        ItemEffectType::BuffStat => item.stat.is_some(),
        _ => true,
    };
    if !usable {
        warn!("{} has no battle effect", item.id);
        unavailable(ctx.bus);
        return;
    }

    let Some(holder) = inventory_holder(ctx.actors) else {
        warn!("No inventory holder in the party, cannot use {}", item.id);
        unavailable(ctx.bus);
        return;
    };
    let removed = ctx
        .models
        .get_mut(holder)
        .is_some_and(|model| model.remove_item(&item.id, 1));
    if !removed {
        unavailable(ctx.bus);
        return;
    }
    ctx.stats.items_used += 1;

    let actor_is_player = ctx.actors[actor_idx].is_player;
    let target_idx = target_id
        .and_then(|id| find_actor(ctx.actors, id))
        .filter(|&idx| ctx.actors[idx].is_alive() && ctx.actors[idx].is_player == actor_is_player)
        .unwrap_or(actor_idx);
    let target = &mut ctx.actors[target_idx];

    match (item.effect_type, item.stat) {
        (ItemEffectType::BuffStat, Some(stat)) => {
            target.apply_buff(Buff {
                stat,
                value: item.value,
                level: 1,
                duration: item.duration.unwrap_or(DEFAULT_ITEM_BUFF_DURATION),
            });
            ctx.bus.push(BattleEvent::ItemBuffApplied {
                actor: actor_name,
                target: target.name.clone(),
                item: item.name.clone(),
            });
        }
        (effect_type, _) => {
            let hp = if effect_type.restores_hp() {
                target.heal((target.max_hp as f64 * item.value).floor().max(0.0) as u32)
            } else {
                0
            };
            let mp = if effect_type.restores_mp() {
                target.restore_mp((target.max_mp as f64 * item.value).floor().max(0.0) as u32)
            } else {
                0
            };
            ctx.bus.push(BattleEvent::Restored {
                actor: actor_name,
                target: target.name.clone(),
                item: item.name.clone(),
                hp,
                mp,
            });
        }
    }
}
