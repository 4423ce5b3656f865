use crate::battle::state::{Outcome, TurnRng};
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::content::{DroppedItem, GameData};
use combat_schema::{LootEntry, Rewards};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Drop chance for loot entries that do not declare one.
const GUARANTEED_DROP: f64 = 1.0;
const DEFAULT_DROP_COUNT: u32 = 1;

/// Final result handed to the caller once a battle is over.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BattleOutcome {
    pub outcome: Outcome,
    pub exp: u32,
    pub gold: u32,
    pub items: Vec<DroppedItem>,
}

impl BattleOutcome {
    pub fn empty(outcome: Outcome) -> Self {
        Self {
            outcome,
            exp: 0,
            gold: 0,
            items: Vec::new(),
        }
    }
}

/// Calculator for experience, gold and loot from defeated enemies
pub struct RewardCalculator {
    xp_gain_multiplier: f64,
}

impl RewardCalculator {
    pub fn new(config: &BattleConfig) -> Self {
        Self {
            xp_gain_multiplier: config.difficulty.xp_gain_multiplier,
        }
    }

    /// `floor(exp * xp_gain_multiplier)`
    pub fn calculate_exp(&self, rewards: &Rewards) -> u32 {
        (rewards.exp as f64 * self.xp_gain_multiplier).floor().max(0.0) as u32
    }

    /// Roll one loot entry. A hit yields `count` copies of the drop.
    pub fn roll_loot(&self, entry: &LootEntry, data: &GameData, rng: &mut TurnRng) -> Vec<DroppedItem> {
        let chance = entry.chance.unwrap_or(GUARANTEED_DROP);
        if !rng.chance(chance, "loot drop") {
            return Vec::new();
        }

        let item = data.resolve_drop(&entry.drop);
        let count = entry.count.unwrap_or(DEFAULT_DROP_COUNT);
        debug!("Dropped {} x{}", item.id(), count);
        vec![item; count as usize]
    }

    /// Accumulate rewards over every defeated enemy that carries a payload.
    pub fn calculate(&self, actors: &[Combatant], data: &GameData, rng: &mut TurnRng) -> BattleOutcome {
        let mut outcome = BattleOutcome::empty(Outcome::Victory);

        for enemy in actors.iter().filter(|a| !a.is_player && !a.is_alive()) {
            let Some(rewards) = &enemy.rewards else {
                continue;
            };
            outcome.exp += self.calculate_exp(rewards);
            outcome.gold += rewards.gold;
            for entry in &rewards.items {
                outcome.items.extend(self.roll_loot(entry, data, rng));
            }
        }

        outcome
    }
}
