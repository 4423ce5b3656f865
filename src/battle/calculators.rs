//! Damage formulas. Nothing here mutates a combatant; every random roll goes
//! through the supplied `TurnRng`.

use crate::battle::state::TurnRng;
use crate::battle::stats::MIN_RESISTANCE;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use combat_schema::{AttackType, Element, SkillData};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DamageResult {
    pub damage: u32,
    pub is_critical: bool,
    pub is_advantage: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementMatchup {
    pub multiplier: f64,
    pub is_advantage: bool,
}

#[derive(Debug, Clone)]
pub struct DamageCalculator {
    config: BattleConfig,
}

impl DamageCalculator {
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Advantage multiplies by `elemental_advantage`. Losing the matchup applies
    /// `elemental_disadvantage`, which is neutral by default.
    pub fn element_multiplier(&self, attacker: Element, defender: Element) -> ElementMatchup {
        if attacker.has_advantage_over(defender) {
            ElementMatchup {
                multiplier: self.config.mechanics.elemental_advantage,
                is_advantage: true,
            }
        } else if defender.has_advantage_over(attacker) {
            ElementMatchup {
                multiplier: self.config.mechanics.elemental_disadvantage,
                is_advantage: false,
            }
        } else {
            ElementMatchup {
                multiplier: 1.0,
                is_advantage: false,
            }
        }
    }

    pub fn basic_damage(&self, attacker: &Combatant, target: &Combatant, rng: &mut TurnRng) -> DamageResult {
        let (is_critical, crit_multiplier) = self.critical_roll(attacker, rng);
        let matchup = self.element_multiplier(attacker.element, target.element);
        let resistance = target.resistance(attacker.basic_attack_type);

        let raw = attacker.atk as f64 * crit_multiplier * matchup.multiplier / resistance.max(MIN_RESISTANCE);
        let damage = self.apply_damage_modifiers(attacker.is_player, raw, rng);

        debug!(
            "{} -> {}: raw {:.2}, final {} (crit: {}, advantage: {})",
            attacker.name, target.name, raw, damage, is_critical, matchup.is_advantage
        );

        DamageResult {
            damage,
            is_critical,
            is_advantage: matchup.is_advantage,
        }
    }

    /// Skills without any base damage short-circuit before rolling anything.
    pub fn skill_damage(
        &self,
        attacker: &Combatant,
        skill: &SkillData,
        target: &Combatant,
        rng: &mut TurnRng,
    ) -> DamageResult {
        let base = (attacker.atk as f64 * skill.power_multiplier()).floor();
        if base <= 0.0 {
            return DamageResult::default();
        }

        let (is_critical, crit_multiplier) = self.critical_roll(attacker, rng);
        let element = skill.element.unwrap_or(attacker.element);
        let matchup = self.element_multiplier(element, target.element);
        let resistance = target.resistance(skill.attack_type());

        let raw = base * crit_multiplier * matchup.multiplier / resistance.max(MIN_RESISTANCE);
        if raw.floor() <= 0.0 {
            return DamageResult::default();
        }
        let damage = self.apply_damage_modifiers(attacker.is_player, raw, rng);

        debug!(
            "{} [{}] -> {}: raw {:.2}, final {}",
            attacker.name, skill.name, target.name, raw, damage
        );

        DamageResult {
            damage,
            is_critical,
            is_advantage: matchup.is_advantage,
        }
    }

    /// Variance, then the faction's difficulty multiplier. Landed damage is at least 1.
    pub fn apply_damage_modifiers(&self, attacker_is_player: bool, raw: f64, rng: &mut TurnRng) -> u32 {
        let variance = self.config.rng.damage_variance;
        let factor = 1.0 - variance + rng.next_outcome("damage variance") * variance * 2.0;

        let varied = (raw * factor).floor();
        let scaled = (varied * self.config.damage_multiplier_for(attacker_is_player)).floor();

        scaled.max(1.0) as u32
    }

    fn critical_roll(&self, attacker: &Combatant, rng: &mut TurnRng) -> (bool, f64) {
        let crit_rate = attacker.crit_rate.clamp(0.0, 1.0);
        if rng.chance(crit_rate, "critical hit") {
            (true, attacker.crit_damage)
        } else {
            (false, 1.0)
        }
    }
}

/// Which resistance a given attack reads from.
pub fn resolve_attack_type(attacker: &Combatant, skill: Option<&SkillData>) -> AttackType {
    match skill {
        Some(skill) => skill.attack_type(),
        None => attacker.basic_attack_type,
    }
}
