use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use combat_schema::StatKind;

pub const MAX_CRIT_RATE: f64 = 1.0;
pub const MAX_DODGE_RATE: f64 = 0.8;

/// Minimum resistance divisor; keeps damage finite.
pub const MIN_RESISTANCE: f64 = 0.1;

const ACTION_POINTS_MIN: f64 = 8.0;
const ACTION_POINTS_MAX: f64 = 10.0;

fn scale(base: u32, bonus: f64) -> u32 {
    (base as f64 * (1.0 + bonus)).floor().max(0.0) as u32
}

fn scaled_stat_mut(combatant: &mut Combatant, stat: StatKind) -> Option<&mut u32> {
    match stat {
        StatKind::Atk => Some(&mut combatant.atk),
        StatKind::DefPhys => Some(&mut combatant.def_phys),
        StatKind::DefMagic => Some(&mut combatant.def_magic),
        _ => None,
    }
}

// Speed has no runtime field; its buff levels feed initiative directly.
fn additive_stat_mut(combatant: &mut Combatant, stat: StatKind) -> Option<&mut f64> {
    match stat {
        StatKind::CritRate => Some(&mut combatant.crit_rate),
        StatKind::CritDamage => Some(&mut combatant.crit_damage),
        StatKind::DodgeRate => Some(&mut combatant.dodge_rate),
        StatKind::ResPhys => Some(&mut combatant.res_phys),
        StatKind::ResMagic => Some(&mut combatant.res_magic),
        _ => None,
    }
}

/// Rebuild runtime stats from the base values. Percentage buffs on attack and
/// defenses compound per buff entry; everything else is additive. Speed is left
/// to initiative.
pub fn recompute_stats(combatant: &mut Combatant) {
    combatant.atk = combatant.base_atk;
    combatant.def_phys = combatant.base_def_phys;
    combatant.def_magic = combatant.base_def_magic;
    combatant.crit_rate = combatant.base_crit_rate;
    combatant.crit_damage = combatant.base_crit_damage;
    combatant.dodge_rate = combatant.base_dodge_rate;
    combatant.res_phys = combatant.base_res_phys;
    combatant.res_magic = combatant.base_res_magic;

    for buff in combatant.buffs.clone() {
        if buff.stat.is_multiplicative() {
            if let Some(stat) = scaled_stat_mut(combatant, buff.stat) {
                *stat = scale(*stat, buff.value);
            }
        } else if let Some(stat) = additive_stat_mut(combatant, buff.stat) {
            *stat += buff.value;
        }
    }

    combatant.crit_rate = combatant.crit_rate.clamp(0.0, MAX_CRIT_RATE);
    combatant.dodge_rate = combatant.dodge_rate.clamp(0.0, MAX_DODGE_RATE);
}

/// Initiative for this round: `U(8 + L*w, 10 + L*w)` plus speed buff levels.
pub fn calculate_action_points(combatant: &Combatant, config: &BattleConfig, rng: &mut TurnRng) -> f64 {
    let level_bonus = combatant.level as f64 * config.mechanics.speed_level_weight;
    let min = ACTION_POINTS_MIN + level_bonus;
    let max = ACTION_POINTS_MAX + level_bonus;

    rng.range(min, max, "action points") + combatant.speed_bonus()
}
