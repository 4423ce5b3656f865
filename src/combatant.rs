//! Runtime state of one battle participant.

use crate::battle::calculators::DamageCalculator;
use crate::battle::effects::{self, EffectOutcome};
use crate::battle::state::TurnRng;
use crate::battle::stats;
use crate::config::BattleConfig;
use crate::content::GameData;
use crate::player::PlayerModel;
use combat_schema::{AttackType, Element, EnemyTemplate, Rewards, SkillData, SkillRef, StatKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A timed stat modifier. Entries are unique per `stat`; re-applying stacks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buff {
    pub stat: StatKind,
    pub value: f64,
    pub level: i32,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DebuffKind {
    Stun,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Debuff {
    pub kind: DebuffKind,
    pub duration: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dot {
    pub dot_type: String,
    pub damage: u32,
    pub duration: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuffApplication {
    Added,
    Stacked,
}

/// Explicit constructor arguments, used by hand-written party members and
/// (after conversion) by enemy templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyParams {
    pub id: String,
    pub name: String,
    pub hp: u32,
    pub mp: u32,
    pub attack: u32,
    pub defense: u32,
    pub level: u32,
    #[serde(default)]
    pub element: Element,
    pub is_player: bool,
    #[serde(default)]
    pub rewards: Option<Rewards>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
    #[serde(default)]
    pub res_phys: f64,
    #[serde(default)]
    pub res_magic: f64,
}

impl LegacyParams {
    fn from_template(template: &EnemyTemplate, instance_id: String) -> Self {
        Self {
            id: instance_id,
            name: template.name.clone(),
            hp: template.hp,
            mp: template.mp,
            attack: template.stats.atk,
            defense: template.stats.def,
            level: template.level,
            element: template.element,
            is_player: false,
            rewards: template.rewards.clone(),
            description: template.description.clone(),
            skills: template.skills.clone(),
            res_phys: template.base_res_phys,
            res_magic: template.base_res_magic,
        }
    }
}

/// The three ways a combatant can enter a battle.
pub enum CombatantOrigin<'a> {
    Model {
        model: &'a PlayerModel,
        model_index: usize,
        runtime_id: String,
    },
    Legacy(LegacyParams),
    Template {
        template: &'a EnemyTemplate,
        instance_id: String,
    },
}

/// Result of one `attack_target` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttackResult {
    pub damage: u32,
    pub critical: bool,
    pub is_advantage: bool,
    pub dodged: bool,
    pub stunned: bool,
    pub effects: Vec<EffectOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub is_player: bool,
    pub level: u32,
    pub element: Element,
    pub description: String,

    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,

    pub base_atk: u32,
    pub base_def_phys: u32,
    pub base_def_magic: u32,
    pub base_speed: u32,
    pub base_crit_rate: f64,
    pub base_crit_damage: f64,
    pub base_dodge_rate: f64,
    pub base_res_phys: f64,
    pub base_res_magic: f64,

    // Derived from the base values and active buffs.
    pub atk: u32,
    pub def_phys: u32,
    pub def_magic: u32,
    pub crit_rate: f64,
    pub crit_damage: f64,
    pub dodge_rate: f64,
    pub res_phys: f64,
    pub res_magic: f64,

    /// Routing for basic attacks, taken from the equipped weapon.
    pub basic_attack_type: AttackType,

    pub is_defending: bool,
    pub is_stunned: bool,
    pub action_points: f64,

    pub buffs: Vec<Buff>,
    pub debuffs: Vec<Debuff>,
    pub dots: Vec<Dot>,
    pub skills: Vec<SkillRef>,
    pub rewards: Option<Rewards>,

    /// Index into the session's player models, for model-backed combatants.
    pub model_index: Option<usize>,
}

impl Combatant {
    /// Single construction path. Origin-specific parsing stays in here.
    pub fn from_origin(origin: CombatantOrigin<'_>, config: &BattleConfig, data: &GameData) -> Self {
        match origin {
            CombatantOrigin::Model {
                model,
                model_index,
                runtime_id,
            } => Self::from_model(model, model_index, runtime_id, data),
            CombatantOrigin::Legacy(params) => Self::from_legacy(params, config),
            CombatantOrigin::Template {
                template,
                instance_id,
            } => Self::from_legacy(LegacyParams::from_template(template, instance_id), config),
        }
    }

    fn from_model(model: &PlayerModel, model_index: usize, runtime_id: String, data: &GameData) -> Self {
        let s = &model.combat_stats;
        let or_one = |res: f64| if res > 0.0 { res } else { 1.0 };

        let skills = model
            .skills
            .equipped
            .iter()
            .map(|equipped| match equipped {
                SkillRef::Id(id) => model
                    .skills
                    .learned
                    .iter()
                    .find(|learned| matches!(learned, SkillRef::Inline(skill) if &skill.id == id))
                    .cloned()
                    .unwrap_or_else(|| equipped.clone()),
                inline => inline.clone(),
            })
            .collect();

        let basic_attack_type = match &model.equipment.weapon {
            Some(weapon) => match data.resolve_equipment(weapon) {
                Ok(equipment) => equipment.atk_type.unwrap_or_default(),
                Err(err) => {
                    warn!("{}: {}, falling back to physical attacks", model.name, err);
                    AttackType::Physical
                }
            },
            None => AttackType::Physical,
        };

        let mut combatant = Self {
            id: runtime_id,
            name: model.name.clone(),
            is_player: true,
            level: model.level,
            element: model.element,
            description: String::new(),
            hp: model.hp.min(model.max_hp),
            max_hp: model.max_hp,
            mp: model.mp.min(model.max_mp),
            max_mp: model.max_mp,
            base_atk: s.final_atk,
            base_def_phys: s.final_def_phys,
            base_def_magic: s.final_def_magic,
            base_speed: if s.final_speed > 0 { s.final_speed } else { 10 },
            base_crit_rate: s.final_crit_rate,
            base_crit_damage: 1.0 + s.final_crit_dmg,
            base_dodge_rate: s.final_dodge,
            base_res_phys: or_one(s.final_res_phys),
            base_res_magic: or_one(s.final_res_magic),
            atk: 0,
            def_phys: 0,
            def_magic: 0,
            crit_rate: 0.0,
            crit_damage: 0.0,
            dodge_rate: 0.0,
            res_phys: 0.0,
            res_magic: 0.0,
            basic_attack_type,
            is_defending: false,
            is_stunned: false,
            action_points: 0.0,
            buffs: Vec::new(),
            debuffs: Vec::new(),
            dots: Vec::new(),
            skills,
            rewards: None,
            model_index: Some(model_index),
        };
        combatant.update_stats();
        combatant
    }

    fn from_legacy(params: LegacyParams, config: &BattleConfig) -> Self {
        let max_hp = if params.is_player {
            params.hp
        } else {
            (params.hp as f64 * config.difficulty.enemy_hp_multiplier).floor() as u32
        };

        let base_crit_rate = if params.is_player {
            config.rng.base_crit_rate
        } else {
            (config.rng.base_crit_rate - 0.1).max(0.0)
        };

        let k = config.mechanics.defense_balance_factor;
        let def = params.defense as f64;
        let def_contribution = if def + k > 0.0 { def / (def + k) } else { 0.0 };

        let mut combatant = Self {
            id: params.id,
            name: params.name,
            is_player: params.is_player,
            level: params.level,
            element: params.element,
            description: params.description,
            hp: max_hp,
            max_hp,
            mp: params.mp,
            max_mp: params.mp,
            base_atk: params.attack,
            base_def_phys: params.defense,
            base_def_magic: params.defense,
            base_speed: 10,
            base_crit_rate,
            base_crit_damage: config.rng.crit_damage_multiplier,
            base_dodge_rate: config.rng.base_dodge_rate,
            base_res_phys: 1.0 + def_contribution + params.res_phys,
            base_res_magic: 1.0 + def_contribution + params.res_magic,
            atk: 0,
            def_phys: 0,
            def_magic: 0,
            crit_rate: 0.0,
            crit_damage: 0.0,
            dodge_rate: 0.0,
            res_phys: 0.0,
            res_magic: 0.0,
            basic_attack_type: AttackType::Physical,
            is_defending: false,
            is_stunned: false,
            action_points: 0.0,
            buffs: Vec::new(),
            debuffs: Vec::new(),
            dots: Vec::new(),
            skills: params.skills,
            rewards: params.rewards,
            model_index: None,
        };
        combatant.update_stats();
        combatant
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn is_ally_of(&self, other: &Combatant) -> bool {
        self.is_player == other.is_player
    }

    /// Re-derive every runtime stat from its base value plus active buffs.
    pub fn update_stats(&mut self) {
        stats::recompute_stats(self);
    }

    pub fn resistance(&self, attack_type: AttackType) -> f64 {
        match attack_type {
            AttackType::Physical => self.res_phys,
            AttackType::Magic => self.res_magic,
        }
    }

    /// Summed `level` of active speed buffs, added to initiative.
    pub fn speed_bonus(&self) -> f64 {
        self.buffs
            .iter()
            .filter(|buff| buff.stat == StatKind::Speed)
            .map(|buff| buff.level as f64)
            .sum()
    }

    /// Returns the damage actually removed.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let dealt = amount.min(self.hp);
        self.hp -= dealt;
        dealt
    }

    /// Returns the HP actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let before = self.hp;
        self.hp = self.hp.saturating_add(amount).min(self.max_hp);
        self.hp - before
    }

    pub fn restore_mp(&mut self, amount: u32) -> u32 {
        let before = self.mp;
        self.mp = self.mp.saturating_add(amount).min(self.max_mp);
        self.mp - before
    }

    /// MP never goes below zero.
    pub fn spend_mp(&mut self, amount: u32) {
        self.mp = self.mp.saturating_sub(amount);
    }

    pub fn apply_buff(&mut self, buff: Buff) -> BuffApplication {
        effects::apply_buff(self, buff)
    }

    /// One round of effect ageing. Returns DOT damage taken.
    pub fn update_effects(&mut self) -> u32 {
        effects::update_effects(self)
    }

    pub fn calculate_action_points(&mut self, config: &BattleConfig, rng: &mut TurnRng) -> f64 {
        self.action_points = stats::calculate_action_points(self, config, rng);
        self.action_points
    }

    /// Basic attack when `skill` is `None`. Damage lands on `target` and any
    /// skill effects are applied to it unless the attack was dodged.
    pub fn attack_target(
        &self,
        target: &mut Combatant,
        skill: Option<&SkillData>,
        calculator: &DamageCalculator,
        rng: &mut TurnRng,
    ) -> AttackResult {
        if self.is_stunned {
            return AttackResult {
                stunned: true,
                ..AttackResult::default()
            };
        }

        let mut calc = match skill {
            Some(skill) => calculator.skill_damage(self, skill, target, rng),
            None => calculator.basic_damage(self, target, rng),
        };

        let can_dodge = skill.map_or(true, |s| s.can_be_dodged());
        if can_dodge && rng.chance(target.dodge_rate, "dodge check") {
            return AttackResult {
                dodged: true,
                ..AttackResult::default()
            };
        }

        if calc.damage > 0 {
            if target.is_defending {
                calc.damage = (calc.damage / 2).max(1);
            }
            calc.damage = target.take_damage(calc.damage);
        }

        let effects = match skill {
            Some(skill) => effects::apply_effects(&skill.effects, target, rng),
            None => Vec::new(),
        };

        AttackResult {
            damage: calc.damage,
            critical: calc.is_critical,
            is_advantage: calc.is_advantage,
            dodged: false,
            stunned: false,
            effects,
        }
    }
}
