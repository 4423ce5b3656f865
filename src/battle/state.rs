use crate::battle::effects::EffectOutcome;
use crate::combatant::Combatant;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Init,
    Input,
    Execution,
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Input => "input",
            Phase::Execution => "execution",
            Phase::Ended => "ended",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Victory,
    Defeat,
    Escaped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Victory => "victory",
            Outcome::Defeat => "defeat",
            Outcome::Escaped => "escaped",
        };
        write!(f, "{}", name)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum BattleEvent {
    // Round management
    RoundStarted {
        round: u32,
    },
    ActionOrderDetermined {
        order: Vec<String>,
    },

    // Actions
    AttackHit {
        actor: String,
        target: String,
        action: String,
        damage: u32,
        critical: bool,
        advantage: bool,
    },
    AttackDodged {
        actor: String,
        target: String,
    },
    EffectResolved {
        target: String,
        outcome: EffectOutcome,
    },
    Healed {
        actor: String,
        target: String,
        action: String,
        amount: u32,
    },
    Restored {
        actor: String,
        target: String,
        item: String,
        hp: u32,
        mp: u32,
    },
    ItemBuffApplied {
        actor: String,
        target: String,
        item: String,
    },
    Defended {
        actor: String,
    },
    Stunned {
        actor: String,
    },
    CombatantDefeated {
        target: String,
    },

    // Redirects and rejected actions
    TargetRedirected {
        actor: String,
        target: String,
    },
    TargetLost {
        actor: String,
    },
    InsufficientMp {
        actor: String,
        skill: String,
        required: u32,
        available: u32,
    },
    SkillUnavailable {
        actor: String,
        skill: String,
    },
    ItemUnavailable {
        actor: String,
        item: String,
    },

    // End of round
    DotDamage {
        target: String,
        damage: u32,
    },

    // Fleeing
    FleeSucceeded {
        actor: String,
    },
    FleeFailed {
        actor: String,
    },
    ActionsSuppressed {
        actor: String,
    },

    RoundAborted {
        round: u32,
        reason: String,
    },
    BattleEnded {
        outcome: Outcome,
    },
}

impl BattleEvent {
    /// Human-readable line for the battle log. Silent events return `None`.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::RoundStarted { round } => Some(format!("=== Round {} ===", round)),
            BattleEvent::ActionOrderDetermined { .. } => None,

            BattleEvent::AttackHit {
                actor,
                target,
                action,
                damage,
                critical,
                advantage,
            } => {
                let mut line = format!("{} used {} on {} for {} damage", actor, action, target, damage);
                if *advantage {
                    line.push_str(" (advantage!)");
                }
                if *critical {
                    line.push_str(" (critical!!)");
                }
                line.push('!');
                Some(line)
            }
            BattleEvent::AttackDodged { target, .. } => Some(format!("{} dodged!", target)),
            BattleEvent::EffectResolved { target, outcome } => Some(format_effect(target, outcome)),
            BattleEvent::Healed {
                actor,
                target,
                action,
                amount,
            } => Some(format!("{} used {}, {} recovered {} HP", actor, action, target, amount)),
            BattleEvent::Restored {
                actor,
                target,
                item,
                hp,
                mp,
            } => {
                let mut parts = Vec::new();
                if *hp > 0 {
                    parts.push(format!("HP+{}", hp));
                }
                if *mp > 0 {
                    parts.push(format!("MP+{}", mp));
                }
                if parts.is_empty() {
                    parts.push("no effect".to_string());
                }
                Some(format!("{} used {} on {}: {}", actor, item, target, parts.join(" / ")))
            }
            BattleEvent::ItemBuffApplied { actor, target, item } => {
                Some(format!("{} used {} on {}, stats rose!", actor, item, target))
            }
            BattleEvent::Defended { actor } => Some(format!("{} takes a defensive stance", actor)),
            BattleEvent::Stunned { actor } => Some(format!("{} is stunned...", actor)),
            BattleEvent::CombatantDefeated { target } => Some(format!("{} was defeated!", target)),

            BattleEvent::TargetRedirected { actor, target } => Some(format!(
                "{}'s original target is gone, acting on {} instead",
                actor, target
            )),
            BattleEvent::TargetLost { actor } => {
                Some(format!("{} stops, with no target left", actor))
            }
            BattleEvent::InsufficientMp {
                actor,
                skill,
                required,
                available,
            } => Some(format!(
                "{} lacks the MP for {} ({}/{})",
                actor, skill, available, required
            )),
            BattleEvent::SkillUnavailable { actor, skill } => Some(format!(
                "{} could not use {}, attacking instead",
                actor, skill
            )),
            BattleEvent::ItemUnavailable { actor, item } => {
                Some(format!("{} has no {} to use", actor, item))
            }

            BattleEvent::DotDamage { target, damage } => {
                Some(format!("{} takes {} damage over time", target, damage))
            }

            BattleEvent::FleeSucceeded { actor } => Some(format!("{} led the party to safety!", actor)),
            BattleEvent::FleeFailed { actor } => {
                Some(format!("{} failed to escape and braces for impact!", actor))
            }
            BattleEvent::ActionsSuppressed { actor } => {
                Some(format!("{} is thrown into disarray!", actor))
            }

            BattleEvent::RoundAborted { round, reason } => {
                Some(format!("Round {} was cut short: {}", round, reason))
            }
            BattleEvent::BattleEnded { outcome } => Some(match outcome {
                Outcome::Victory => "Victory!".to_string(),
                Outcome::Defeat => "The party has fallen...".to_string(),
                Outcome::Escaped => "Escaped from battle.".to_string(),
            }),
        }
    }
}

fn format_effect(target: &str, outcome: &EffectOutcome) -> String {
    match outcome {
        EffectOutcome::StatChanged { stat, value, .. } => {
            if *value < 0.0 {
                format!("[effect] {}'s {} fell!", target, stat)
            } else {
                format!("[effect] {}'s {} rose!", target, stat)
            }
        }
        EffectOutcome::Stun { applied: true, .. } => format!("[effect] {} is stunned!", target),
        EffectOutcome::Stun { applied: false, .. } => format!("[resisted] {} resisted the stun", target),
        EffectOutcome::Dot {
            dot_type,
            applied: true,
        } => format!("[effect] {} is afflicted with {}!", target, dot_type),
        EffectOutcome::Dot {
            dot_type,
            applied: false,
        } => format!("[resisted] {} resisted {}", target, dot_type),
        EffectOutcome::Healed { amount } => format!("[heal] {} recovered {} HP", target, amount),
    }
}

pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn extend(&mut self, other: EventBus) {
        self.events.extend(other.events);
    }

    /// Print all events in debug format with indentation.
    pub fn print_debug(&self) {
        for event in &self.events {
            println!("  {:?}", event);
        }
    }

    /// Print all events in debug format with a custom prefix message.
    pub fn print_debug_with_message(&self, message: &str) {
        println!("{}", message);
        self.print_debug();
    }

    /// Print formatted lines, falling back to debug format for silent events.
    pub fn print_formatted(&self) {
        for event in &self.events {
            match event.format() {
                Some(formatted) => println!("  {}", formatted),
                None => println!("  {:?} (silent)", event),
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for event in &self.events {
            writeln!(f, "  {:?}", event)?;
        }
        Ok(())
    }
}

/// Rolling window of formatted log lines kept by the session.
#[derive(Debug, Clone)]
pub struct BattleLog {
    lines: VecDeque<String>,
    max_entries: usize,
}

impl BattleLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_entries,
        }
    }

    /// Formats and stores the event; silent events are skipped.
    pub fn record(&mut self, event: &BattleEvent) {
        if let Some(line) = event.format() {
            self.push_line(line);
        }
    }

    pub fn push_line(&mut self, line: String) {
        if self.max_entries == 0 {
            return;
        }
        while self.lines.len() >= self.max_entries {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ActorSnapshot {
    pub id: String,
    pub name: String,
    pub is_player: bool,
    pub hp: u32,
    pub max_hp: u32,
    pub mp: u32,
    pub max_mp: u32,
    pub action_points: f64,
    pub is_stunned: bool,
    pub is_defending: bool,
}

impl From<&Combatant> for ActorSnapshot {
    fn from(combatant: &Combatant) -> Self {
        Self {
            id: combatant.id.clone(),
            name: combatant.name.clone(),
            is_player: combatant.is_player,
            hp: combatant.hp,
            max_hp: combatant.max_hp,
            mp: combatant.mp,
            max_mp: combatant.max_mp,
            action_points: combatant.action_points,
            is_stunned: combatant.is_stunned,
            is_defending: combatant.is_defending,
        }
    }
}

/// Read-only timeline view handed to presentation layers.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub round: u32,
    pub phase: Phase,
    pub result: Option<Outcome>,
    pub actors: Vec<ActorSnapshot>,
    pub action_order: Vec<ActorSnapshot>,
}

/// Running totals for the result screen.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct BattleStats {
    pub total_damage_dealt: u32,
    pub total_damage_taken: u32,
    pub items_used: u32,
    pub rounds: u32,
}

#[derive(Debug, Clone)]
enum RngSource {
    Scripted { outcomes: Vec<f64>, index: usize },
    Live(StdRng),
}

/// The battle's only source of randomness. Every roll is a float in `[0, 1)`.
#[derive(Debug, Clone)]
pub struct TurnRng {
    source: RngSource,
}

impl TurnRng {
    /// Scripted rolls, consumed in order.
    pub fn new_for_test(outcomes: Vec<f64>) -> Self {
        Self {
            source: RngSource::Scripted { outcomes, index: 0 },
        }
    }

    pub fn new_random() -> Self {
        Self {
            source: RngSource::Live(StdRng::from_os_rng()),
        }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            source: RngSource::Live(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn next_outcome(&mut self, reason: &str) -> f64 {
        match &mut self.source {
            RngSource::Live(rng) => rng.random::<f64>(),
            RngSource::Scripted { outcomes, index } => {
                if *index >= outcomes.len() {
                    panic!(
                        "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                        reason
                    );
                }
                let outcome = outcomes[*index];

                #[cfg(test)]
                println!("[RNG] Consumed {} for: {}", outcome, reason);

                *index += 1;
                outcome
            }
        }
    }

    /// `roll < chance`. Always consumes a roll.
    pub fn chance(&mut self, chance: f64, reason: &str) -> bool {
        self.next_outcome(reason) < chance
    }

    pub fn range(&mut self, min: f64, max: f64, reason: &str) -> f64 {
        min + self.next_outcome(reason) * (max - min)
    }

    /// Uniform pick. An empty slice returns `None` without consuming a roll.
    pub fn pick<'a, T>(&mut self, items: &'a [T], reason: &str) -> Option<&'a T> {
        if items.is_empty() {
            return None;
        }
        let roll = self.next_outcome(reason);
        let index = ((roll * items.len() as f64).floor() as usize).min(items.len() - 1);
        items.get(index)
    }

    /// Scripted rolls left, `None` for a live generator.
    pub fn remaining(&self) -> Option<usize> {
        match &self.source {
            RngSource::Scripted { outcomes, index } => Some(outcomes.len() - index),
            RngSource::Live(_) => None,
        }
    }
}
