//! Battle tuning knobs.
//!
//! A `BattleConfig` is built once (defaults, or a RON file) and handed by value to
//! every component that needs it. Nothing in the engine reads configuration from
//! global state.

use crate::errors::LoadError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Global scaling applied on top of the raw formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Difficulty {
    pub player_damage_multiplier: f64,
    pub enemy_damage_multiplier: f64,
    pub enemy_hp_multiplier: f64,
    pub xp_gain_multiplier: f64,
}

impl Default for Difficulty {
    fn default() -> Self {
        Self {
            player_damage_multiplier: 1.0,
            enemy_damage_multiplier: 1.0,
            enemy_hp_multiplier: 1.0,
            xp_gain_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RngSettings {
    pub base_crit_rate: f64,
    pub crit_damage_multiplier: f64,
    pub base_dodge_rate: f64,
    /// Symmetric damage spread, 0.1 means +/-10%.
    pub damage_variance: f64,
}

impl Default for RngSettings {
    fn default() -> Self {
        Self {
            base_crit_rate: 0.25,
            crit_damage_multiplier: 1.5,
            base_dodge_rate: 0.1,
            damage_variance: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mechanics {
    pub base_flee_chance: f64,
    pub elemental_advantage: f64,
    pub elemental_disadvantage: f64,
    /// K in the `def / (def + K)` resistance curve for enemy templates.
    pub defense_balance_factor: f64,
    pub speed_level_weight: f64,
    pub mp_cost_multiplier: f64,
}

impl Default for Mechanics {
    fn default() -> Self {
        Self {
            base_flee_chance: 1.0,
            elemental_advantage: 1.5,
            elemental_disadvantage: 1.0,
            defense_balance_factor: 100.0,
            speed_level_weight: 0.2,
            mp_cost_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub animation_speed_ms: u64,
    pub log_max_entries: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            animation_speed_ms: 1000,
            log_max_entries: 50,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    pub difficulty: Difficulty,
    pub rng: RngSettings,
    pub mechanics: Mechanics,
    pub settings: Settings,
}

impl BattleConfig {
    /// Load a config from a RON file. Sections or fields the file leaves out keep
    /// their defaults.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron_str(&content).map_err(|err| match err {
            LoadError::Parse { source, .. } => LoadError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    pub fn from_ron_str(content: &str) -> Result<Self, LoadError> {
        ron::from_str(content).map_err(|source| LoadError::Parse {
            path: "<inline>".to_string(),
            source,
        })
    }

    /// Damage multiplier for the attacking faction.
    pub fn damage_multiplier_for(&self, is_player: bool) -> f64 {
        if is_player {
            self.difficulty.player_damage_multiplier
        } else {
            self.difficulty.enemy_damage_multiplier
        }
    }
}
