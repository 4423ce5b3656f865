use crate::{Element, EquipmentData, ItemData, SkillRef};
use serde::{Deserialize, Serialize};

fn default_level() -> u32 {
    1
}

fn default_speed() -> u32 {
    10
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyStats {
    pub atk: u32,
    pub def: u32,
    #[serde(default = "default_speed")]
    pub speed: u32,
}

/// What a loot entry drops: a table id or an already complete object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LootDrop {
    Id(String),
    Item(ItemData),
    Equipment(EquipmentData),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub drop: LootDrop,
    /// Missing means a guaranteed drop.
    #[serde(default)]
    pub chance: Option<f64>,
    #[serde(default)]
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rewards {
    #[serde(default)]
    pub exp: u32,
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub items: Vec<LootEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub id: String,
    pub name: String,
    #[serde(default = "default_level")]
    pub level: u32,
    pub hp: u32,
    #[serde(default)]
    pub mp: u32,
    #[serde(default)]
    pub element: Element,
    pub stats: EnemyStats,
    /// Added on top of the defense-derived resistance.
    #[serde(default)]
    pub base_res_phys: f64,
    #[serde(default)]
    pub base_res_magic: f64,
    #[serde(default)]
    pub rewards: Option<Rewards>,
    #[serde(default)]
    pub skills: Vec<SkillRef>,
    #[serde(default)]
    pub description: String,
}

/// An enemy as it appears in a roster: a template id or an inline template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EnemyRef {
    Id(String),
    Inline(EnemyTemplate),
}

impl From<&str> for EnemyRef {
    fn from(id: &str) -> Self {
        EnemyRef::Id(id.to_string())
    }
}

impl From<EnemyTemplate> for EnemyRef {
    fn from(template: EnemyTemplate) -> Self {
        EnemyRef::Inline(template)
    }
}
