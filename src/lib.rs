//! RPG Combat Engine
//!
//! Turn-based party combat: action-point initiative, a crit/element/resistance
//! damage pipeline, timed buffs, stuns and damage over time, AI opponents and
//! victory rewards. Rendering, persistence and narrative are left to callers,
//! which supply rosters and read back events, snapshots and the final result.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod combatant;
pub mod config;
pub mod content;
pub mod errors;
pub mod player;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use combat_schema::{
    AttackType, EffectDescriptor, Element, EnemyRef, EnemyStats, EnemyTemplate, EquipmentData,
    EquipmentRef, ItemData, ItemEffectType, ItemRef, LootDrop, LootEntry, Rewards, SkillCost,
    SkillData, SkillKind, SkillRef, StatKind, TargetType,
};

// --- From this crate's modules (`src/`) ---

// Session control and the records it hands out.
pub use battle::engine::{BattleContext, BattleSession, BattleSource, PlayerEntry, Roster, StepOutcome};
pub use battle::rewards::BattleOutcome;
pub use battle::state::{BattleEvent, BattleStats, EventBus, Outcome, Phase, SessionSnapshot, TurnRng};

// Commands and extension points.
pub use battle::ai::{Behavior, RandomSkillAI};
pub use battle::commands::{Command, CommandAction};
pub use battle::turn_orchestrator::InitiativeRoller;

// Runtime and persistent participant types.
pub use combatant::{Combatant, CombatantOrigin, LegacyParams};
pub use player::{CombatStats, Inventory, PlayerModel};

pub use config::BattleConfig;
pub use content::{DroppedItem, GameData};

// Crate-specific error and result types.
pub use errors::{ActionError, BattleEngineError, BattleResult, BattleStateError, DataError, LoadError};
