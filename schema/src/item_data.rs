use crate::{AttackType, StatKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemEffectType {
    RestoreHpPercent,
    RestoreMpPercent,
    RestoreBothPercent,
    BuffStat,
    /// Loot, keys and other things with no battle use.
    Passive,
}

impl ItemEffectType {
    pub fn restores_hp(self) -> bool {
        matches!(self, ItemEffectType::RestoreHpPercent | ItemEffectType::RestoreBothPercent)
    }

    pub fn restores_mp(self) -> bool {
        matches!(self, ItemEffectType::RestoreMpPercent | ItemEffectType::RestoreBothPercent)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub id: String,
    pub name: String,
    pub effect_type: ItemEffectType,
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub stat: Option<StatKind>,
    #[serde(default)]
    pub duration: Option<u32>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub atk_type: Option<AttackType>,
    #[serde(default)]
    pub quality: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ItemRef {
    Id(String),
    Inline(ItemData),
}

impl ItemRef {
    pub fn id(&self) -> &str {
        match self {
            ItemRef::Id(id) => id,
            ItemRef::Inline(item) => &item.id,
        }
    }
}

impl From<&str> for ItemRef {
    fn from(id: &str) -> Self {
        ItemRef::Id(id.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EquipmentRef {
    Id(String),
    Inline(EquipmentData),
}
