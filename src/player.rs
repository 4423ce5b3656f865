use crate::combatant::Combatant;
use combat_schema::{Element, EquipmentRef, SkillRef};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Shared party inventory, owned by whichever player model is the inventory holder.
pub trait Inventory {
    fn has_item(&self, item_id: &str) -> bool;
    /// Removes `quantity` copies; returns false and changes nothing when stock is short.
    fn remove_item(&mut self, item_id: &str, quantity: u32) -> bool;
}

/// Final stats as already computed by the character sheet outside battle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatStats {
    pub final_atk: u32,
    pub final_def_phys: u32,
    pub final_def_magic: u32,
    pub final_speed: u32,
    pub final_crit_rate: f64,
    /// Bonus on top of the base 1x crit multiplier.
    pub final_crit_dmg: f64,
    pub final_dodge: f64,
    pub final_res_phys: f64,
    pub final_res_magic: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillLoadout {
    pub equipped: Vec<SkillRef>,
    /// Inline versions of learned skills shadow equipped ids with the same id.
    pub learned: Vec<SkillRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipment {
    pub weapon: Option<EquipmentRef>,
}

fn default_deployed() -> bool {
    true
}

/// A persistent party member. Only `hp`, `mp` and `is_dead` are written back after a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerModel {
    pub name: String,
    #[serde(default)]
    pub level: u32,
    #[serde(default)]
    pub element: Element,
    pub hp: u32,
    pub max_hp: u32,
    #[serde(default)]
    pub mp: u32,
    #[serde(default)]
    pub max_mp: u32,
    #[serde(default)]
    pub is_dead: bool,
    #[serde(default = "default_deployed")]
    pub is_deployed: bool,
    #[serde(default)]
    pub combat_stats: CombatStats,
    #[serde(default)]
    pub skills: SkillLoadout,
    #[serde(default)]
    pub equipment: Equipment,
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
}

impl PlayerModel {
    pub fn new(name: &str, level: u32, max_hp: u32, max_mp: u32, combat_stats: CombatStats) -> Self {
        Self {
            name: name.to_string(),
            level,
            element: Element::None,
            hp: max_hp,
            max_hp,
            mp: max_mp,
            max_mp,
            is_dead: false,
            is_deployed: true,
            combat_stats,
            skills: SkillLoadout::default(),
            equipment: Equipment::default(),
            inventory: BTreeMap::new(),
        }
    }

    pub fn add_item(&mut self, item_id: &str, quantity: u32) {
        *self.inventory.entry(item_id.to_string()).or_insert(0) += quantity;
    }

    pub fn item_count(&self, item_id: &str) -> u32 {
        self.inventory.get(item_id).copied().unwrap_or(0)
    }

    /// Write the battle's HP/MP back. A model that dropped to 0 HP is marked dead.
    pub fn sync_from(&mut self, combatant: &Combatant) {
        self.hp = combatant.hp.min(self.max_hp);
        self.mp = combatant.mp.min(self.max_mp);
        if self.hp == 0 {
            self.is_dead = true;
        }
    }
}

impl Inventory for PlayerModel {
    fn has_item(&self, item_id: &str) -> bool {
        self.item_count(item_id) > 0
    }

    fn remove_item(&mut self, item_id: &str, quantity: u32) -> bool {
        match self.inventory.get_mut(item_id) {
            Some(count) if *count >= quantity => {
                *count -= quantity;
                if *count == 0 {
                    self.inventory.remove(item_id);
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_remove_item_refuses_when_stock_is_short() {
        let mut model = PlayerModel::new("Aria", 5, 100, 30, CombatStats::default());
        model.add_item("potion", 1);

        assert!(!model.remove_item("potion", 2));
        assert_eq!(model.item_count("potion"), 1);

        assert!(model.remove_item("potion", 1));
        assert!(!model.has_item("potion"));
        assert!(model.inventory.is_empty());
    }
}
