//! The battle session: roster ingest, the input/execution state machine,
//! termination checks and rewards.

use crate::battle::ai::{BattleView, Behavior, RandomSkillAI};
use crate::battle::calculators::DamageCalculator;
use crate::battle::commands::{
    execute_command, find_actor, inventory_holder, mp_cost, Command, CommandAction, CommandContext,
};
use crate::battle::rewards::{BattleOutcome, RewardCalculator};
use crate::battle::state::{
    ActorSnapshot, BattleEvent, BattleLog, BattleStats, EventBus, Outcome, Phase, SessionSnapshot,
    TurnRng,
};
use crate::battle::turn_orchestrator::{InitiativeRoller, TurnScheduler};
use crate::combatant::{Combatant, CombatantOrigin, LegacyParams};
use crate::config::BattleConfig;
use crate::content::GameData;
use crate::errors::{ActionError, BattleResult, BattleStateError, DataError};
use crate::player::{Inventory, PlayerModel};
use combat_schema::EnemyRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

/// A party member entering battle.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum PlayerEntry {
    Model(PlayerModel),
    Legacy(LegacyParams),
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Roster {
    pub players: Vec<PlayerEntry>,
    pub enemies: Vec<EnemyRef>,
}

/// What started the battle.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BattleSource {
    #[default]
    Encounter,
    /// Battles forced by a story choice cannot be fled.
    ChoiceEvent,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BattleContext {
    pub source: BattleSource,
}

impl BattleContext {
    pub fn can_flee(&self) -> bool {
        self.source != BattleSource::ChoiceEvent
    }
}

/// Result of executing one actor's turn.
pub enum StepOutcome {
    /// One actor resolved its command; the round continues.
    Acted { actor_id: String, events: EventBus },
    /// The round finished and the next input phase has begun.
    RoundComplete { events: EventBus },
    BattleEnded { outcome: Outcome, events: EventBus },
}

impl StepOutcome {
    pub fn events(&self) -> &EventBus {
        match self {
            StepOutcome::Acted { events, .. }
            | StepOutcome::RoundComplete { events }
            | StepOutcome::BattleEnded { events, .. } => events,
        }
    }
}

pub struct BattleSession {
    round: u32,
    phase: Phase,
    actors: Vec<Combatant>,
    models: Vec<PlayerModel>,
    action_order: Vec<usize>,
    cursor: usize,
    command_queue: Vec<Command>,
    result: Option<Outcome>,
    rewards: Option<BattleOutcome>,
    flee_failed: bool,
    context: BattleContext,
    config: BattleConfig,
    data: GameData,
    calculator: DamageCalculator,
    scheduler: TurnScheduler,
    behavior: Box<dyn Behavior>,
    rng: TurnRng,
    stats: BattleStats,
    log: BattleLog,
}

/// Ids stay unique within a battle; a clash gets the first free `_{n}` suffix.
fn admit(actors: &mut Vec<Combatant>, mut combatant: Combatant) {
    let taken = |id: &str| actors.iter().any(|a| a.id == id);
    if taken(&combatant.id) {
        let unique = (2..)
            .map(|n| format!("{}_{}", combatant.id, n))
            .find(|candidate| !taken(candidate))
            .unwrap_or_default();
        warn!("Duplicate combatant id {}; using {}", combatant.id, unique);
        combatant.id = unique;
    }
    actors.push(combatant);
}

impl BattleSession {
    /// Ingest the roster. Undeployed models stay out of the fight but are still
    /// returned by `finish`; unknown enemy templates are skipped.
    pub fn new(roster: Roster, context: BattleContext, config: BattleConfig, data: GameData) -> Self {
        let mut actors = Vec::new();
        let mut models = Vec::new();

        for (index, entry) in roster.players.into_iter().enumerate() {
            match entry {
                PlayerEntry::Model(model) => {
                    let model_index = models.len();
                    if model.is_deployed {
                        let combatant = Combatant::from_origin(
                            CombatantOrigin::Model {
                                model: &model,
                                model_index,
                                runtime_id: format!("player_{}", index + 1),
                            },
                            &config,
                            &data,
                        );
                        admit(&mut actors, combatant);
                    } else {
                        debug!("{} is not deployed", model.name);
                    }
                    models.push(model);
                }
                PlayerEntry::Legacy(params) => {
                    let combatant = Combatant::from_origin(CombatantOrigin::Legacy(params), &config, &data);
                    admit(&mut actors, combatant);
                }
            }
        }

        for (index, enemy) in roster.enemies.iter().enumerate() {
            match data.resolve_enemy(enemy) {
                Ok(template) => {
                    let combatant = Combatant::from_origin(
                        CombatantOrigin::Template {
                            template: &template,
                            instance_id: format!("{}_{}", template.id, index),
                        },
                        &config,
                        &data,
                    );
                    admit(&mut actors, combatant);
                }
                Err(err) => warn!("Skipping roster entry: {}", err),
            }
        }

        Self {
            round: 1,
            phase: Phase::Init,
            actors,
            models,
            action_order: Vec::new(),
            cursor: 0,
            command_queue: Vec::new(),
            result: None,
            rewards: None,
            flee_failed: false,
            context,
            calculator: DamageCalculator::new(config.clone()),
            scheduler: TurnScheduler::new(config.clone()),
            log: BattleLog::new(config.settings.log_max_entries),
            config,
            data,
            behavior: Box::new(RandomSkillAI::new()),
            rng: TurnRng::new_random(),
            stats: BattleStats::default(),
        }
    }

    pub fn with_rng(mut self, rng: TurnRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_behavior(mut self, behavior: Box<dyn Behavior>) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn with_initiative_roller(mut self, roller: Box<dyn InitiativeRoller>) -> Self {
        self.scheduler = TurnScheduler::new(self.config.clone()).with_roller(roller);
        self
    }

    // --- Read-only accessors ---

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    pub fn flee_failed(&self) -> bool {
        self.flee_failed
    }

    pub fn actors(&self) -> &[Combatant] {
        &self.actors
    }

    pub fn actor(&self, id: &str) -> Option<&Combatant> {
        self.actors.iter().find(|actor| actor.id == id)
    }

    /// Only for setting up unusual states in tests and tools.
    pub fn actor_mut(&mut self, id: &str) -> Option<&mut Combatant> {
        self.actors.iter_mut().find(|actor| actor.id == id)
    }

    pub fn models(&self) -> &[PlayerModel] {
        &self.models
    }

    pub fn action_order(&self) -> Vec<&str> {
        self.action_order
            .iter()
            .map(|&i| self.actors[i].id.as_str())
            .collect()
    }

    pub fn queued_command(&self, actor_id: &str) -> Option<&Command> {
        self.command_queue.iter().find(|c| c.actor_id == actor_id)
    }

    /// Totals so far; `rounds` is the round currently being played (or the last one).
    pub fn stats(&self) -> BattleStats {
        BattleStats {
            rounds: self.round,
            ..self.stats.clone()
        }
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    pub fn data(&self) -> &GameData {
        &self.data
    }

    /// A read-only view for driving player combatants with a `Behavior`.
    pub fn view(&self) -> BattleView<'_> {
        BattleView {
            actors: &self.actors,
            data: &self.data,
            config: &self.config,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            round: self.round,
            phase: self.phase,
            result: self.result,
            actors: self.actors.iter().map(ActorSnapshot::from).collect(),
            action_order: self
                .action_order
                .iter()
                .map(|&i| ActorSnapshot::from(&self.actors[i]))
                .collect(),
        }
    }

    /// The result object, available once the battle has ended.
    pub fn outcome(&self) -> Option<BattleOutcome> {
        let outcome = self.result?;
        Some(match &self.rewards {
            Some(rewards) => rewards.clone(),
            None => BattleOutcome::empty(outcome),
        })
    }

    // --- Phase control ---

    fn require_phase(&self, expected: Phase) -> BattleResult<()> {
        if self.phase == expected {
            return Ok(());
        }
        if self.phase == Phase::Ended {
            return Err(BattleStateError::BattleEnded.into());
        }
        Err(BattleStateError::WrongPhase {
            expected: expected.to_string(),
            actual: self.phase.to_string(),
        }
        .into())
    }

    pub fn start(&mut self) -> BattleResult<EventBus> {
        self.require_phase(Phase::Init)?;
        let mut bus = EventBus::new();

        info!(
            "Battle started: {} players vs {} enemies",
            self.actors.iter().filter(|a| a.is_player).count(),
            self.actors.iter().filter(|a| !a.is_player).count()
        );

        if !self.check_battle_end(&mut bus) {
            self.begin_input_phase(&mut bus);
        }
        self.record(&bus);
        Ok(bus)
    }

    fn begin_input_phase(&mut self, bus: &mut EventBus) {
        self.phase = Phase::Input;
        self.cursor = 0;
        self.command_queue.clear();
        bus.push(BattleEvent::RoundStarted { round: self.round });
        info!("Round {} begins", self.round);

        self.action_order = self
            .scheduler
            .compute_action_order(&mut self.actors, &self.models, &mut self.rng);
        bus.push(BattleEvent::ActionOrderDetermined {
            order: self.action_order().iter().map(|id| id.to_string()).collect(),
        });

        self.queue_stunned_players();
    }

    fn queue_stunned_players(&mut self) {
        let stunned: Vec<String> = self
            .actors
            .iter()
            .filter(|a| a.is_player && a.is_alive() && a.is_stunned)
            .map(|a| a.id.clone())
            .collect();
        for id in stunned {
            self.command_queue.push(Command::stunned(&id));
        }
    }

    /// Drop every queued command and collect input again for the same round.
    pub fn replan(&mut self) -> BattleResult<()> {
        self.require_phase(Phase::Input)?;
        if self.flee_failed {
            return Err(ActionError::FleeAlreadyFailed.into());
        }
        self.command_queue.clear();
        self.queue_stunned_players();
        debug!("Round {} replanned", self.round);
        Ok(())
    }

    /// Living, non-stunned player combatants without a queued command.
    pub fn pending_players(&self) -> Vec<&str> {
        self.actors
            .iter()
            .filter(|a| a.is_player && a.is_alive() && !a.is_stunned)
            .filter(|a| self.queued_command(&a.id).is_none())
            .map(|a| a.id.as_str())
            .collect()
    }

    pub fn all_commands_ready(&self) -> bool {
        self.phase == Phase::Input && self.pending_players().is_empty()
    }

    fn validate_player(&self, actor_id: &str) -> BattleResult<usize> {
        let idx = find_actor(&self.actors, actor_id)
            .ok_or_else(|| DataError::ActorNotFound(actor_id.to_string()))?;
        let actor = &self.actors[idx];
        if !actor.is_player {
            return Err(ActionError::NotAPlayer(actor.name.clone()).into());
        }
        if !actor.is_alive() {
            return Err(ActionError::ActorDefeated(actor.name.clone()).into());
        }
        Ok(idx)
    }

    /// Queue a player's command for this round, replacing any earlier one.
    /// Fleeing resolves immediately and its events are returned.
    pub fn submit_command(&mut self, command: Command) -> BattleResult<EventBus> {
        self.require_phase(Phase::Input)?;
        let idx = self.validate_player(&command.actor_id)?;
        let actor = &self.actors[idx];

        if actor.is_stunned && command.action != CommandAction::Stunned {
            return Err(ActionError::ActorStunned(actor.name.clone()).into());
        }

        match &command.action {
            CommandAction::Flee => return self.attempt_flee(&command.actor_id),
            CommandAction::Skill { skill, .. } => {
                let skill = self.data.resolve_skill(skill)?;
                let required = mp_cost(&skill, self.config.mechanics.mp_cost_multiplier);
                if actor.mp < required {
                    return Err(ActionError::InsufficientMp {
                        actor: actor.name.clone(),
                        required,
                        available: actor.mp,
                    }
                    .into());
                }
            }
            CommandAction::Item { item, .. } => {
                let item = self.data.resolve_item(item)?;
                let in_stock = inventory_holder(&self.actors)
                    .and_then(|holder| self.models.get(holder))
                    .is_some_and(|model| model.has_item(&item.id));
                if !in_stock {
                    return Err(ActionError::ItemUnavailable(item.id).into());
                }
            }
            CommandAction::Attack { .. } | CommandAction::Defend | CommandAction::Stunned => {}
        }

        self.command_queue.retain(|c| c.actor_id != command.actor_id);
        debug!("Queued {:?}", command);
        self.command_queue.push(command);
        Ok(EventBus::new())
    }

    /// Success ends the battle as escaped. Failure locks the actor into defending
    /// and suppresses every player action until the round ends.
    pub fn attempt_flee(&mut self, actor_id: &str) -> BattleResult<EventBus> {
        self.require_phase(Phase::Input)?;
        if !self.context.can_flee() {
            return Err(ActionError::FleeForbidden.into());
        }
        if self.flee_failed {
            return Err(ActionError::FleeAlreadyFailed.into());
        }
        let idx = self.validate_player(actor_id)?;
        if self.actors[idx].is_stunned {
            return Err(ActionError::ActorStunned(self.actors[idx].name.clone()).into());
        }

        let mut bus = EventBus::new();
        let name = self.actors[idx].name.clone();

        if self.rng.chance(self.config.mechanics.base_flee_chance, "flee attempt") {
            bus.push(BattleEvent::FleeSucceeded { actor: name });
            self.end_battle(Outcome::Escaped, &mut bus);
        } else {
            info!("{} failed to flee", name);
            self.flee_failed = true;
            self.actors[idx].is_defending = true;
            self.command_queue.retain(|c| c.actor_id != actor_id);
            self.command_queue.push(Command::defend(actor_id));
            bus.push(BattleEvent::FleeFailed { actor: name });
        }

        self.record(&bus);
        Ok(bus)
    }

    pub fn begin_execution(&mut self) -> BattleResult<()> {
        self.require_phase(Phase::Input)?;
        self.phase = Phase::Execution;
        self.cursor = 0;
        debug!("Round {} execution begins", self.round);
        Ok(())
    }

    /// Resolve the next living actor in the action order.
    pub fn step(&mut self) -> BattleResult<StepOutcome> {
        self.require_phase(Phase::Execution)?;
        let mut bus = EventBus::new();

        let next = self.action_order[self.cursor..]
            .iter()
            .position(|&i| self.actors[i].is_alive())
            .map(|offset| self.cursor + offset);

        let Some(order_pos) = next else {
            return Ok(self.finish_round(bus));
        };
        self.cursor = order_pos + 1;
        let actor_idx = self.action_order[order_pos];
        let actor_id = self.actors[actor_idx].id.clone();

        let command = if self.actors[actor_idx].is_player {
            if self.flee_failed {
                bus.push(BattleEvent::ActionsSuppressed {
                    actor: self.actors[actor_idx].name.clone(),
                });
                None
            } else {
                Some(
                    self.queued_command(&actor_id)
                        .cloned()
                        .unwrap_or_else(|| Command::defend(&actor_id)),
                )
            }
        } else {
            let view = BattleView {
                actors: &self.actors,
                data: &self.data,
                config: &self.config,
            };
            Some(self.behavior.decide_action(actor_idx, &view, &mut self.rng))
        };

        if let Some(command) = command {
            let mut ctx = CommandContext {
                actors: &mut self.actors,
                models: &mut self.models,
                data: &self.data,
                calculator: &self.calculator,
                stats: &mut self.stats,
                rng: &mut self.rng,
                bus: &mut bus,
            };
            if let Err(err) = execute_command(&command, &mut ctx) {
                error!("Round {} aborted while resolving {:?}: {}", self.round, command, err);
                bus.push(BattleEvent::RoundAborted {
                    round: self.round,
                    reason: err.to_string(),
                });
                return Ok(self.finish_round(bus));
            }
        }

        if self.check_battle_end(&mut bus) {
            self.record(&bus);
            return Ok(StepOutcome::BattleEnded {
                outcome: self.result.unwrap_or(Outcome::Escaped),
                events: bus,
            });
        }

        self.record(&bus);
        Ok(StepOutcome::Acted { actor_id, events: bus })
    }

    /// Run the rest of the round. Starts execution first when called during input.
    pub fn execute_round(&mut self) -> BattleResult<EventBus> {
        if self.phase == Phase::Input {
            self.begin_execution()?;
        }
        self.require_phase(Phase::Execution)?;

        let mut all = EventBus::new();
        loop {
            match self.step()? {
                StepOutcome::Acted { events, .. } => all.extend(events),
                StepOutcome::RoundComplete { events } | StepOutcome::BattleEnded { events, .. } => {
                    all.extend(events);
                    return Ok(all);
                }
            }
        }
    }

    /// End-of-round processing, then either the next input phase or the end.
    fn finish_round(&mut self, mut bus: EventBus) -> StepOutcome {
        for actor in self.actors.iter_mut() {
            if actor.is_alive() {
                let dot_damage = actor.update_effects();
                if dot_damage > 0 {
                    bus.push(BattleEvent::DotDamage {
                        target: actor.name.clone(),
                        damage: dot_damage,
                    });
                    if !actor.is_alive() {
                        bus.push(BattleEvent::CombatantDefeated {
                            target: actor.name.clone(),
                        });
                    }
                }
            }
            actor.is_defending = false;
        }
        self.flee_failed = false;

        if self.check_battle_end(&mut bus) {
            self.record(&bus);
            return StepOutcome::BattleEnded {
                outcome: self.result.unwrap_or(Outcome::Escaped),
                events: bus,
            };
        }

        self.round += 1;
        self.begin_input_phase(&mut bus);
        self.record(&bus);
        StepOutcome::RoundComplete { events: bus }
    }

    fn check_battle_end(&mut self, bus: &mut EventBus) -> bool {
        if self.phase == Phase::Ended {
            return true;
        }
        let enemies_alive = self.actors.iter().any(|a| !a.is_player && a.is_alive());
        let players_alive = self.actors.iter().any(|a| a.is_player && a.is_alive());

        if !enemies_alive {
            self.end_battle(Outcome::Victory, bus);
            true
        } else if !players_alive {
            self.end_battle(Outcome::Defeat, bus);
            true
        } else {
            false
        }
    }

    fn end_battle(&mut self, outcome: Outcome, bus: &mut EventBus) {
        self.phase = Phase::Ended;
        self.result = Some(outcome);
        self.command_queue.clear();

        if outcome == Outcome::Victory {
            let calculator = RewardCalculator::new(&self.config);
            self.rewards = Some(calculator.calculate(&self.actors, &self.data, &mut self.rng));
        }

        bus.push(BattleEvent::BattleEnded { outcome });
        info!(
            "Battle ended in round {}: {} (dealt {}, taken {})",
            self.round, outcome, self.stats.total_damage_dealt, self.stats.total_damage_taken
        );
    }

    /// External cancellation. Ends the battle as escaped with no rewards.
    pub fn abort(&mut self) -> BattleResult<EventBus> {
        if self.phase == Phase::Ended {
            return Err(BattleStateError::BattleEnded.into());
        }
        let mut bus = EventBus::new();
        self.end_battle(Outcome::Escaped, &mut bus);
        self.record(&bus);
        Ok(bus)
    }

    /// Write HP/MP back into the player models and release the session.
    pub fn finish(mut self) -> (BattleOutcome, Vec<PlayerModel>) {
        for actor in &self.actors {
            if let Some(model) = actor.model_index.and_then(|i| self.models.get_mut(i)) {
                model.sync_from(actor);
            }
        }

        let outcome = self
            .outcome()
            .unwrap_or_else(|| BattleOutcome::empty(Outcome::Escaped));
        info!("Session finished: {}", outcome.outcome);
        (outcome, self.models)
    }

    fn record(&mut self, bus: &EventBus) {
        for event in bus.events() {
            self.log.record(event);
        }
    }
}
