use crate::{AttackType, Element};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which side of the field a skill is meant for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    #[default]
    Enemy,
    Ally,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkillKind {
    /// Direct damage; the only kind that can be dodged.
    #[default]
    ActiveDmg,
    ActiveBuff,
    Stun,
    Dot,
    /// Restores HP and never touches the damage pipeline.
    Heal,
}

/// Stats a buff or debuff can modify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Atk,
    DefPhys,
    DefMagic,
    Speed,
    CritRate,
    CritDamage,
    DodgeRate,
    ResPhys,
    ResMagic,
}

impl StatKind {
    /// Percentage modifiers stack multiplicatively on the base value;
    /// everything else is added to it.
    pub fn is_multiplicative(self) -> bool {
        matches!(self, StatKind::Atk | StatKind::DefPhys | StatKind::DefMagic)
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let display_name = match self {
            StatKind::Atk => "attack",
            StatKind::DefPhys => "physical defense",
            StatKind::DefMagic => "magic defense",
            StatKind::Speed => "speed",
            StatKind::CritRate => "critical rate",
            StatKind::CritDamage => "critical damage",
            StatKind::DodgeRate => "evasion",
            StatKind::ResPhys => "physical resistance",
            StatKind::ResMagic => "magic resistance",
        };
        write!(f, "{}", display_name)
    }
}

fn default_buff_duration() -> u32 {
    3
}

fn default_stun_duration() -> u32 {
    1
}

fn default_dot_duration() -> u32 {
    3
}

fn default_level() -> i32 {
    1
}

fn default_dot_type() -> String {
    "damage over time".to_string()
}

/// The uniform shape every skill or item effect is expressed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectDescriptor {
    /// Always applies. `value` is a fraction for multiplicative stats.
    StatModifier {
        stat: StatKind,
        value: f64,
        #[serde(default = "default_buff_duration")]
        duration: u32,
        #[serde(default = "default_level")]
        level: i32,
    },
    Stun {
        #[serde(default)]
        chance: Option<f64>,
        #[serde(default = "default_stun_duration")]
        duration: u32,
    },
    Dot {
        damage: u32,
        #[serde(default = "default_dot_duration")]
        duration: u32,
        #[serde(default)]
        chance: Option<f64>,
        #[serde(default = "default_dot_type")]
        dot_type: String,
    },
    /// Fixed amount wins over a percentage of the target's max HP.
    Heal {
        #[serde(default)]
        heal_amount: Option<u32>,
        #[serde(default)]
        heal_percent: Option<f64>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillCost {
    #[serde(default)]
    pub mp: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub kind: SkillKind,
    #[serde(default)]
    pub power: Option<f64>,
    #[serde(default)]
    pub cost: SkillCost,
    #[serde(default)]
    pub target_type: TargetType,
    #[serde(default)]
    pub element: Option<Element>,
    #[serde(default)]
    pub atk_type: Option<AttackType>,
    #[serde(default)]
    pub effects: Vec<EffectDescriptor>,
    #[serde(default)]
    pub heal_amount: Option<u32>,
    #[serde(default)]
    pub description: String,
}

impl SkillData {
    pub fn is_support(&self) -> bool {
        self.target_type == TargetType::Ally
    }

    /// Heals always land on the caster's side, whatever `target_type` says.
    pub fn targets_allies(&self) -> bool {
        self.kind == SkillKind::Heal || self.is_support()
    }

    /// Explicit power wins; pure support skills without one deal no damage.
    pub fn power_multiplier(&self) -> f64 {
        match self.power {
            Some(power) => power,
            None if self.is_support() => 0.0,
            None => 1.0,
        }
    }

    pub fn attack_type(&self) -> AttackType {
        self.atk_type.unwrap_or_default()
    }

    pub fn can_be_dodged(&self) -> bool {
        self.kind == SkillKind::ActiveDmg && !self.is_support()
    }
}

/// A skill as it appears in rosters and content: either a table id or a full object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SkillRef {
    Id(String),
    Inline(SkillData),
}

impl SkillRef {
    pub fn id(&self) -> &str {
        match self {
            SkillRef::Id(id) => id,
            SkillRef::Inline(skill) => &skill.id,
        }
    }
}

impl From<&str> for SkillRef {
    fn from(id: &str) -> Self {
        SkillRef::Id(id.to_string())
    }
}

impl From<SkillData> for SkillRef {
    fn from(skill: SkillData) -> Self {
        SkillRef::Inline(skill)
    }
}
