use crate::battle::calculators::DamageCalculator;
use crate::battle::commands::{execute_command, Command, CommandContext};
use crate::battle::engine::{BattleContext, BattleSession, PlayerEntry, Roster};
use crate::battle::state::{BattleEvent, BattleStats, EventBus, TurnRng};
use crate::combatant::{Combatant, CombatantOrigin, LegacyParams};
use crate::config::BattleConfig;
use crate::content::GameData;
use crate::errors::BattleResult;
use crate::player::PlayerModel;
use combat_schema::{
    EffectDescriptor, Element, EnemyRef, EnemyStats, EnemyTemplate, ItemData, ItemEffectType, Rewards,
    SkillCost, SkillData, SkillKind, SkillRef, StatKind, TargetType,
};

/// A builder for creating test combatants with predictable stats.
///
/// Defaults: level 1, 100/100 HP, 50 MP, 10 attack, no crit, no dodge,
/// resistance 1.0 and no element.
///
/// # Example
/// ```ignore
/// let knight = TestCombatantBuilder::new("knight", true)
///     .with_atk(40)
///     .with_hp(25)
///     .build();
/// ```
pub struct TestCombatantBuilder {
    id: String,
    is_player: bool,
    level: u32,
    max_hp: u32,
    hp: Option<u32>,
    mp: u32,
    atk: u32,
    crit_rate: f64,
    crit_damage: f64,
    dodge_rate: f64,
    res_phys: f64,
    res_magic: f64,
    element: Element,
    skills: Vec<SkillRef>,
    rewards: Option<Rewards>,
    model_index: Option<usize>,
}

impl TestCombatantBuilder {
    pub fn new(id: &str, is_player: bool) -> Self {
        Self {
            id: id.to_string(),
            is_player,
            level: 1,
            max_hp: 100,
            hp: None,
            mp: 50,
            atk: 10,
            crit_rate: 0.0,
            crit_damage: 1.5,
            dodge_rate: 0.0,
            res_phys: 1.0,
            res_magic: 1.0,
            element: Element::None,
            skills: Vec::new(),
            rewards: None,
            model_index: None,
        }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = level;
        self
    }

    pub fn with_max_hp(mut self, max_hp: u32) -> Self {
        self.max_hp = max_hp;
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u32) -> Self {
        self.hp = Some(hp);
        self
    }

    pub fn with_mp(mut self, mp: u32) -> Self {
        self.mp = mp;
        self
    }

    pub fn with_atk(mut self, atk: u32) -> Self {
        self.atk = atk;
        self
    }

    pub fn with_crit_rate(mut self, crit_rate: f64) -> Self {
        self.crit_rate = crit_rate;
        self
    }

    pub fn with_crit_damage(mut self, crit_damage: f64) -> Self {
        self.crit_damage = crit_damage;
        self
    }

    pub fn with_dodge(mut self, dodge_rate: f64) -> Self {
        self.dodge_rate = dodge_rate;
        self
    }

    pub fn with_res_phys(mut self, res_phys: f64) -> Self {
        self.res_phys = res_phys;
        self
    }

    pub fn with_res_magic(mut self, res_magic: f64) -> Self {
        self.res_magic = res_magic;
        self
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_skills(mut self, skills: Vec<SkillRef>) -> Self {
        self.skills = skills;
        self
    }

    pub fn with_rewards(mut self, rewards: Rewards) -> Self {
        self.rewards = Some(rewards);
        self
    }

    pub fn with_model_index(mut self, index: usize) -> Self {
        self.model_index = Some(index);
        self
    }

    pub fn build(self) -> Combatant {
        let params = LegacyParams {
            id: self.id.clone(),
            name: self.id,
            hp: self.max_hp,
            mp: self.mp,
            attack: self.atk,
            defense: 0,
            level: self.level,
            element: self.element,
            is_player: self.is_player,
            rewards: self.rewards,
            description: String::new(),
            skills: self.skills,
            res_phys: 0.0,
            res_magic: 0.0,
        };
        let mut combatant =
            Combatant::from_origin(CombatantOrigin::Legacy(params), &flat_config(), &GameData::new());

        combatant.base_crit_rate = self.crit_rate;
        combatant.base_crit_damage = self.crit_damage;
        combatant.base_dodge_rate = self.dodge_rate;
        combatant.base_res_phys = self.res_phys;
        combatant.base_res_magic = self.res_magic;
        combatant.model_index = self.model_index;
        combatant.update_stats();

        if let Some(hp) = self.hp {
            combatant.hp = hp.min(combatant.max_hp);
        }
        combatant
    }
}

/// Default config with damage variance removed, so damage equals the raw formula.
pub fn flat_config() -> BattleConfig {
    let mut config = BattleConfig::default();
    config.rng.damage_variance = 0.0;
    config
}

/// Every roll is 0.5: no crits, no dodges, no stuns, flee succeeds, the AI attacks.
pub fn predictable_rng() -> TurnRng {
    TurnRng::new_for_test(vec![0.5; 500])
}

pub fn legacy_player(id: &str, hp: u32, atk: u32) -> PlayerEntry {
    PlayerEntry::Legacy(LegacyParams {
        id: id.to_string(),
        name: id.to_string(),
        hp,
        mp: 30,
        attack: atk,
        defense: 0,
        level: 1,
        element: Element::None,
        is_player: true,
        rewards: None,
        description: String::new(),
        skills: Vec::new(),
        res_phys: 0.0,
        res_magic: 0.0,
    })
}

/// Zero defense, so resistance is exactly 1.0.
pub fn enemy_template(id: &str, name: &str, hp: u32, atk: u32) -> EnemyTemplate {
    EnemyTemplate {
        id: id.to_string(),
        name: name.to_string(),
        level: 1,
        hp,
        mp: 0,
        element: Element::None,
        stats: EnemyStats { atk, def: 0, speed: 10 },
        base_res_phys: 0.0,
        base_res_magic: 0.0,
        rewards: None,
        skills: Vec::new(),
        description: String::new(),
    }
}

pub fn create_test_session_with_config(
    players: Vec<PlayerEntry>,
    enemies: Vec<EnemyTemplate>,
    config: BattleConfig,
    data: GameData,
) -> BattleSession {
    let roster = Roster {
        players,
        enemies: enemies.into_iter().map(EnemyRef::Inline).collect(),
    };
    BattleSession::new(roster, BattleContext::default(), config, data).with_rng(predictable_rng())
}

/// A started session with a flat config and `predictable_rng`.
pub fn create_test_session(players: Vec<PlayerEntry>, enemies: Vec<EnemyTemplate>) -> BattleSession {
    let mut session = create_test_session_with_config(players, enemies, flat_config(), GameData::new());
    assert_ok(session.start());
    session
}

pub fn strike_skill(mp: u32) -> SkillData {
    SkillData {
        id: "power_strike".to_string(),
        name: "Power Strike".to_string(),
        kind: SkillKind::ActiveDmg,
        power: Some(1.5),
        cost: SkillCost { mp },
        target_type: TargetType::Enemy,
        element: None,
        atk_type: None,
        effects: Vec::new(),
        heal_amount: None,
        description: String::new(),
    }
}

pub fn heal_skill(mp: u32) -> SkillData {
    SkillData {
        id: "mend".to_string(),
        name: "Mend".to_string(),
        kind: SkillKind::Heal,
        power: None,
        cost: SkillCost { mp },
        target_type: TargetType::Ally,
        element: None,
        atk_type: None,
        effects: Vec::new(),
        heal_amount: None,
        description: String::new(),
    }
}

pub fn stun_skill(chance: f64) -> SkillData {
    SkillData {
        id: "shield_bash".to_string(),
        name: "Shield Bash".to_string(),
        kind: SkillKind::ActiveDmg,
        power: Some(1.0),
        cost: SkillCost { mp: 0 },
        target_type: TargetType::Enemy,
        element: None,
        atk_type: None,
        effects: vec![EffectDescriptor::Stun {
            chance: Some(chance),
            duration: 1,
        }],
        heal_amount: None,
        description: String::new(),
    }
}

pub fn ally_buff_skill(stat: StatKind, value: f64, duration: u32) -> SkillData {
    SkillData {
        id: "war_cry".to_string(),
        name: "War Cry".to_string(),
        kind: SkillKind::ActiveBuff,
        power: None,
        cost: SkillCost { mp: 0 },
        target_type: TargetType::Ally,
        element: None,
        atk_type: None,
        effects: vec![EffectDescriptor::StatModifier {
            stat,
            value,
            duration,
            level: 1,
        }],
        heal_amount: None,
        description: String::new(),
    }
}

pub fn potion() -> ItemData {
    ItemData {
        id: "potion".to_string(),
        name: "Potion".to_string(),
        effect_type: ItemEffectType::RestoreHpPercent,
        value: 0.3,
        stat: None,
        duration: None,
        quality: None,
        description: String::new(),
    }
}

/// Runs single commands against a fixed set of combatants.
pub struct CommandHarness {
    pub actors: Vec<Combatant>,
    pub models: Vec<PlayerModel>,
    pub data: GameData,
    pub calculator: DamageCalculator,
    pub stats: BattleStats,
}

impl CommandHarness {
    pub fn new(actors: Vec<Combatant>) -> Self {
        Self {
            actors,
            models: Vec::new(),
            data: GameData::new(),
            calculator: DamageCalculator::new(flat_config()),
            stats: BattleStats::default(),
        }
    }

    pub fn with_models(mut self, models: Vec<PlayerModel>) -> Self {
        self.models = models;
        self
    }

    pub fn with_data(mut self, data: GameData) -> Self {
        self.data = data;
        self
    }

    pub fn with_config(mut self, config: BattleConfig) -> Self {
        self.calculator = DamageCalculator::new(config);
        self
    }

    pub fn execute(&mut self, command: &Command, rng: &mut TurnRng) -> BattleResult<EventBus> {
        let mut bus = EventBus::new();
        let mut ctx = CommandContext {
            actors: &mut self.actors,
            models: &mut self.models,
            data: &self.data,
            calculator: &self.calculator,
            stats: &mut self.stats,
            rng,
            bus: &mut bus,
        };
        execute_command(command, &mut ctx)?;
        Ok(bus)
    }

    pub fn actor(&self, id: &str) -> &Combatant {
        match self.actors.iter().find(|a| a.id == id) {
            Some(actor) => actor,
            None => panic!("No combatant with id {}", id),
        }
    }
}

/// Count events matching a predicate.
pub fn count_events(bus: &EventBus, predicate: impl Fn(&BattleEvent) -> bool) -> usize {
    bus.events().iter().filter(|e| predicate(e)).count()
}

/// Helper function to assert that a Result is Ok and return the value.
pub fn assert_ok<T>(result: BattleResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("Expected Ok but got error: {}", err),
    }
}
