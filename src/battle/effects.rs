//! Buff, debuff and DOT lifecycle.

use crate::battle::state::TurnRng;
use crate::combatant::{Buff, BuffApplication, Combatant, Debuff, DebuffKind, Dot};
use combat_schema::{EffectDescriptor, StatKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Success chance for stun and DOT effects that do not declare one.
pub const DEFAULT_EFFECT_CHANCE: f64 = 0.1;

/// What happened when one effect descriptor was applied to a target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectOutcome {
    StatChanged {
        stat: StatKind,
        value: f64,
        application: BuffApplication,
    },
    Stun {
        applied: bool,
        duration: u32,
    },
    Dot {
        dot_type: String,
        applied: bool,
    },
    Healed {
        amount: u32,
    },
}

impl EffectOutcome {
    pub fn succeeded(&self) -> bool {
        match self {
            EffectOutcome::StatChanged { .. } | EffectOutcome::Healed { .. } => true,
            EffectOutcome::Stun { applied, .. } | EffectOutcome::Dot { applied, .. } => *applied,
        }
    }
}

pub fn apply_buff(combatant: &mut Combatant, buff: Buff) -> BuffApplication {
    let application = match combatant.buffs.iter_mut().find(|b| b.stat == buff.stat) {
        Some(existing) => {
            existing.value += buff.value;
            existing.level += buff.level;
            existing.duration = existing.duration.max(buff.duration);
            BuffApplication::Stacked
        }
        None => {
            combatant.buffs.push(buff);
            BuffApplication::Added
        }
    };

    combatant.update_stats();
    application
}

/// Age every buff, debuff and DOT by one round. Returns DOT damage dealt.
pub fn update_effects(combatant: &mut Combatant) -> u32 {
    let buffs_before = combatant.buffs.len();
    combatant.buffs.retain_mut(|buff| {
        buff.duration = buff.duration.saturating_sub(1);
        buff.duration > 0
    });
    if combatant.buffs.len() != buffs_before {
        combatant.update_stats();
    }

    combatant.debuffs.retain_mut(|debuff| {
        debuff.duration = debuff.duration.saturating_sub(1);
        debuff.duration > 0
    });

    let mut dot_damage = 0;
    combatant.dots.retain_mut(|dot| {
        dot_damage += dot.damage;
        dot.duration = dot.duration.saturating_sub(1);
        dot.duration > 0
    });
    let dealt = if dot_damage > 0 {
        combatant.take_damage(dot_damage)
    } else {
        0
    };

    combatant.is_stunned = combatant
        .debuffs
        .iter()
        .any(|debuff| debuff.kind == DebuffKind::Stun);

    dealt
}

/// Apply one effect to `target`. A heal that would restore nothing produces no outcome.
pub fn apply_effect(
    effect: &EffectDescriptor,
    target: &mut Combatant,
    rng: &mut TurnRng,
) -> Option<EffectOutcome> {
    match effect {
        EffectDescriptor::StatModifier {
            stat,
            value,
            duration,
            level,
        } => {
            let application = target.apply_buff(Buff {
                stat: *stat,
                value: *value,
                level: *level,
                duration: *duration,
            });
            Some(EffectOutcome::StatChanged {
                stat: *stat,
                value: *value,
                application,
            })
        }
        EffectDescriptor::Stun { chance, duration } => {
            let applied = rng.chance(chance.unwrap_or(DEFAULT_EFFECT_CHANCE), "stun chance");
            if applied {
                target.debuffs.push(Debuff {
                    kind: DebuffKind::Stun,
                    duration: *duration,
                });
                target.is_stunned = true;
            }
            debug!("Stun on {}: {}", target.name, applied);
            Some(EffectOutcome::Stun {
                applied,
                duration: *duration,
            })
        }
        EffectDescriptor::Dot {
            damage,
            duration,
            chance,
            dot_type,
        } => {
            let applied = rng.chance(chance.unwrap_or(DEFAULT_EFFECT_CHANCE), "dot chance");
            if applied {
                target.dots.push(Dot {
                    dot_type: dot_type.clone(),
                    damage: *damage,
                    duration: *duration,
                });
            }
            debug!("{} on {}: {}", dot_type, target.name, applied);
            Some(EffectOutcome::Dot {
                dot_type: dot_type.clone(),
                applied,
            })
        }
        EffectDescriptor::Heal {
            heal_amount,
            heal_percent,
        } => {
            let amount = match (heal_amount, heal_percent) {
                (Some(amount), _) => *amount,
                (None, Some(percent)) => (target.max_hp as f64 * percent).floor().max(0.0) as u32,
                (None, None) => 0,
            };
            if amount == 0 {
                return None;
            }
            Some(EffectOutcome::Healed {
                amount: target.heal(amount),
            })
        }
    }
}

/// Each descriptor is rolled independently.
pub fn apply_effects(
    effects: &[EffectDescriptor],
    target: &mut Combatant,
    rng: &mut TurnRng,
) -> Vec<EffectOutcome> {
    effects
        .iter()
        .filter_map(|effect| apply_effect(effect, target, rng))
        .collect()
}
