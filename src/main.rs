//! Autopilot battle simulator: loads the bundled content, lets the default AI
//! drive both sides and prints the log and the final result.

use rpg_combat::battle::ai::{Behavior, RandomSkillAI};
use rpg_combat::{
    BattleConfig, BattleContext, BattleSession, CombatStats, Command, Element, EnemyRef, EquipmentRef,
    GameData, LegacyParams, PlayerEntry, PlayerModel, Roster, SkillRef, StepOutcome, TurnRng,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Hard stop for battles where nobody can finish the other side off.
const MAX_ROUNDS: u32 = 100;
const DEFAULT_ENEMIES: [&str; 2] = ["slime", "goblin"];
/// The terminal does not need the full animation delay.
const PACE_DIVISOR: u64 = 4;

/// `rpg-combat-sim [--seed=N] [enemy_id ...]`
fn parse_args() -> (Option<u64>, Vec<String>) {
    let mut seed = None;
    let mut enemies = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.strip_prefix("--seed=") {
            Some(value) => match value.parse::<u64>() {
                Ok(value) => seed = Some(value),
                Err(_) => warn!("Ignoring invalid seed '{}'", value),
            },
            None => enemies.push(arg),
        }
    }
    if enemies.is_empty() {
        enemies = DEFAULT_ENEMIES.iter().map(|id| id.to_string()).collect();
    }
    (seed, enemies)
}

fn demo_party() -> Vec<PlayerEntry> {
    let mut aria = PlayerModel::new(
        "Aria",
        5,
        120,
        60,
        CombatStats {
            final_atk: 24,
            final_def_phys: 8,
            final_def_magic: 14,
            final_speed: 12,
            final_crit_rate: 0.15,
            final_crit_dmg: 0.5,
            final_dodge: 0.05,
            final_res_phys: 1.0,
            final_res_magic: 1.2,
        },
    );
    aria.element = Element::Fire;
    aria.skills.equipped = vec![SkillRef::from("fireball"), SkillRef::from("mend")];
    aria.equipment.weapon = Some(EquipmentRef::Id("oak_staff".to_string()));
    aria.add_item("potion", 2);

    let bran = LegacyParams {
        id: "bran".to_string(),
        name: "Bran".to_string(),
        hp: 160,
        mp: 20,
        attack: 30,
        defense: 18,
        level: 4,
        element: Element::None,
        is_player: true,
        rewards: None,
        description: "A sellsword who joined for the pay.".to_string(),
        skills: vec![SkillRef::from("shield_bash"), SkillRef::from("war_cry")],
        res_phys: 0.1,
        res_magic: 0.0,
    };

    vec![PlayerEntry::Model(aria), PlayerEntry::Legacy(bran)]
}

/// Let the AI pick a command for every player still waiting. Rejected
/// commands (e.g. a skill that just became unaffordable) fall back to defending.
fn autopilot(session: &mut BattleSession, ai: &RandomSkillAI, rng: &mut TurnRng) {
    let pending: Vec<String> = session.pending_players().iter().map(|id| id.to_string()).collect();
    for actor_id in pending {
        let Some(index) = session.actors().iter().position(|a| a.id == actor_id) else {
            continue;
        };
        let command = ai.decide_action(index, &session.view(), rng);
        if let Err(err) = session.submit_command(command) {
            warn!("{}: {}, defending instead", actor_id, err);
            if let Err(err) = session.submit_command(Command::defend(&actor_id)) {
                warn!("{}: {}", actor_id, err);
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let data_path = Path::new("data");
    let config = match BattleConfig::load(&data_path.join("battle_config.ron")) {
        Ok(config) => config,
        Err(e) => {
            warn!("Using default battle config: {}", e);
            BattleConfig::default()
        }
    };
    let data = match GameData::load_all(data_path) {
        Ok(data) => data,
        Err(e) => {
            println!("Error loading game data: {}", e);
            return;
        }
    };
    info!(
        "Loaded {} skills, {} items, {} equipment, {} enemies",
        data.skills.len(),
        data.items.len(),
        data.equipment.len(),
        data.enemies.len()
    );

    let (seed, enemy_ids) = parse_args();
    let (battle_rng, mut party_rng) = match seed {
        Some(seed) => (TurnRng::from_seed(seed), TurnRng::from_seed(seed.wrapping_add(1))),
        None => (TurnRng::new_random(), TurnRng::new_random()),
    };

    let roster = Roster {
        players: demo_party(),
        enemies: enemy_ids.iter().map(|id| EnemyRef::from(id.as_str())).collect(),
    };
    let delay = Duration::from_millis(config.settings.animation_speed_ms / PACE_DIVISOR);
    let mut session = BattleSession::new(roster, BattleContext::default(), config, data).with_rng(battle_rng);
    let party_ai = RandomSkillAI::new();

    match session.start() {
        Ok(events) => events.print_formatted(),
        Err(e) => {
            println!("Error starting battle: {}", e);
            return;
        }
    }

    while session.result().is_none() {
        if session.round() > MAX_ROUNDS {
            warn!("No result after {} rounds, calling the battle off", MAX_ROUNDS);
            if let Ok(events) = session.abort() {
                events.print_formatted();
            }
            break;
        }

        autopilot(&mut session, &party_ai, &mut party_rng);
        if let Err(e) = session.begin_execution() {
            println!("Error starting execution: {}", e);
            return;
        }

        loop {
            match session.step() {
                Ok(StepOutcome::Acted { events, .. }) => events.print_formatted(),
                Ok(StepOutcome::RoundComplete { events }) | Ok(StepOutcome::BattleEnded { events, .. }) => {
                    events.print_formatted();
                    break;
                }
                Err(e) => {
                    println!("Error during round {}: {}", session.round(), e);
                    return;
                }
            }
            tokio::time::sleep(delay).await;
        }
    }

    let stats = session.stats();
    let (outcome, models) = session.finish();
    println!();
    println!(
        "Rounds: {}  Dealt: {}  Taken: {}  Items: {}",
        stats.rounds, stats.total_damage_dealt, stats.total_damage_taken, stats.items_used
    );
    match serde_json::to_string_pretty(&outcome) {
        Ok(json) => println!("{}", json),
        Err(e) => println!("Error serializing outcome: {}", e),
    }
    for model in &models {
        println!(
            "  {}: HP {}/{}  MP {}/{}{}",
            model.name,
            model.hp,
            model.max_hp,
            model.mp,
            model.max_mp,
            if model.is_dead { "  (fallen)" } else { "" }
        );
    }
}
