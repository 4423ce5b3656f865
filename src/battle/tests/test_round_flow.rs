#[cfg(test)]
mod tests {
    use crate::battle::ai::{BattleView, Behavior};
    use crate::battle::commands::Command;
    use crate::battle::engine::{PlayerEntry, StepOutcome};
    use crate::battle::state::{BattleEvent, Outcome, Phase, TurnRng};
    use crate::battle::tests::common::{
        assert_ok, count_events, create_test_session, create_test_session_with_config, enemy_template,
        flat_config, legacy_player,
    };
    use crate::combatant::{Debuff, DebuffKind, Dot};
    use crate::content::GameData;
    use crate::errors::{ActionError, BattleEngineError, BattleStateError};
    use crate::player::{CombatStats, PlayerModel};
    use pretty_assertions::assert_eq;

    /// Always issues a command for an actor that does not exist.
    struct RogueBehavior;

    impl Behavior for RogueBehavior {
        fn decide_action(&self, _actor_index: usize, _view: &BattleView<'_>, _rng: &mut TurnRng) -> Command {
            Command::defend("ghost")
        }
    }

    #[test]
    fn test_start_opens_first_input_phase() {
        let session = create_test_session(
            vec![legacy_player("knight", 100, 10), legacy_player("bard", 100, 10)],
            vec![enemy_template("slime", "Slime", 100, 10)],
        );

        assert_eq!(session.round(), 1);
        assert_eq!(session.phase(), Phase::Input);
        // Equal initiative keeps roster order.
        assert_eq!(session.action_order(), vec!["knight", "bard", "slime_0"]);
        assert_eq!(session.pending_players(), vec!["knight", "bard"]);
        assert!(!session.all_commands_ready());
        assert!(session.log().lines().any(|line| line == "=== Round 1 ==="));
    }

    #[test]
    fn test_phase_guards() {
        let mut session = create_test_session_with_config(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 100, 10)],
            flat_config(),
            GameData::new(),
        );

        let early = session.submit_command(Command::defend("knight"));
        assert_eq!(
            early.err(),
            Some(BattleEngineError::BattleState(BattleStateError::WrongPhase {
                expected: "input".to_string(),
                actual: "init".to_string(),
            }))
        );

        assert_ok(session.start());
        assert!(matches!(
            session.start(),
            Err(BattleEngineError::BattleState(BattleStateError::WrongPhase { .. }))
        ));
        assert!(matches!(
            session.step(),
            Err(BattleEngineError::BattleState(BattleStateError::WrongPhase { .. }))
        ));
    }

    #[test]
    fn test_dead_combatants_are_left_out() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10), legacy_player("bard", 0, 10)],
            vec![
                enemy_template("orc", "Orc", 100, 10),
                enemy_template("ghost", "Ghost", 0, 10),
            ],
        );

        assert_eq!(session.action_order(), vec!["knight", "orc_0"]);
        assert_eq!(session.pending_players(), vec!["knight"]);
        assert_eq!(
            session.submit_command(Command::defend("bard")).err(),
            Some(BattleEngineError::Action(ActionError::ActorDefeated(
                "bard".to_string()
            )))
        );
    }

    #[test]
    fn test_enemies_cannot_be_commanded() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 100, 10)],
        );

        let result = session.submit_command(Command::defend("slime_0"));

        assert_eq!(
            result.err(),
            Some(BattleEngineError::Action(ActionError::NotAPlayer(
                "Slime".to_string()
            )))
        );
    }

    #[test]
    fn test_resubmission_and_replan() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 100, 10)],
        );

        assert_ok(session.submit_command(Command::defend("knight")));
        assert_ok(session.submit_command(Command::attack("knight", "slime_0")));
        assert_eq!(
            session.queued_command("knight"),
            Some(&Command::attack("knight", "slime_0"))
        );
        assert!(session.all_commands_ready());

        assert_ok(session.replan());

        assert_eq!(session.queued_command("knight"), None);
        assert_eq!(session.pending_players(), vec!["knight"]);
        assert_eq!(session.phase(), Phase::Input);
    }

    #[test]
    fn test_player_without_command_defends() {
        // Arrange
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 1000, 10)],
        );

        // Act
        let bus = assert_ok(session.execute_round());
        bus.print_debug_with_message("Events for idle round:");

        // Assert
        assert!(bus.events().contains(&BattleEvent::Defended {
            actor: "knight".to_string(),
        }));
        let knight = session.actor("knight").unwrap();
        // 10 damage, halved by the stance.
        assert_eq!(knight.hp, 95);
        assert!(!knight.is_defending);
        assert_eq!(session.stats().total_damage_taken, 5);
        assert_eq!(session.round(), 2);
        assert_eq!(session.stats().rounds, 2);
        assert_eq!(session.phase(), Phase::Input);
    }

    #[test]
    fn test_victory_stops_remaining_commands() {
        // Arrange
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 100), legacy_player("bard", 100, 100)],
            vec![enemy_template("slime", "Slime", 50, 10)],
        );
        assert_ok(session.submit_command(Command::attack("knight", "slime_0")));
        assert_ok(session.submit_command(Command::attack("bard", "slime_0")));

        // Act
        let bus = assert_ok(session.execute_round());
        bus.print_debug_with_message("Events for decisive round:");

        // Assert
        assert_eq!(session.result(), Some(Outcome::Victory));
        assert_eq!(session.phase(), Phase::Ended);
        assert_eq!(count_events(&bus, |e| matches!(e, BattleEvent::AttackHit { .. })), 1);
        assert_eq!(session.stats().total_damage_dealt, 50);
        assert_eq!(
            bus.events().last(),
            Some(&BattleEvent::BattleEnded {
                outcome: Outcome::Victory,
            })
        );
        assert_eq!(
            session.submit_command(Command::defend("knight")).err(),
            Some(BattleEngineError::BattleState(BattleStateError::BattleEnded))
        );
    }

    #[test]
    fn test_stepping_through_a_round() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 1000, 10)],
        );
        assert_ok(session.submit_command(Command::attack("knight", "slime_0")));
        assert_ok(session.begin_execution());
        assert_eq!(session.phase(), Phase::Execution);

        match assert_ok(session.step()) {
            StepOutcome::Acted { actor_id, .. } => assert_eq!(actor_id, "knight"),
            _ => panic!("Expected the knight to act first"),
        }
        match assert_ok(session.step()) {
            StepOutcome::Acted { actor_id, .. } => assert_eq!(actor_id, "slime_0"),
            _ => panic!("Expected the slime to act second"),
        }
        let last = assert_ok(session.step());
        assert!(matches!(last, StepOutcome::RoundComplete { .. }));
        assert!(last.events().events().contains(&BattleEvent::RoundStarted { round: 2 }));

        assert_eq!(session.round(), 2);
        assert_eq!(session.phase(), Phase::Input);
        assert_eq!(session.queued_command("knight"), None);
    }

    #[test]
    fn test_stunned_player_is_queued_automatically() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 1000, 10)],
        );
        {
            let knight = session.actor_mut("knight").unwrap();
            knight.is_stunned = true;
            knight.debuffs.push(Debuff {
                kind: DebuffKind::Stun,
                duration: 1,
            });
        }
        assert_ok(session.replan());

        assert_eq!(session.queued_command("knight"), Some(&Command::stunned("knight")));
        assert!(session.pending_players().is_empty());
        assert_eq!(
            session.submit_command(Command::attack("knight", "slime_0")).err(),
            Some(BattleEngineError::Action(ActionError::ActorStunned(
                "knight".to_string()
            )))
        );

        let bus = assert_ok(session.execute_round());
        bus.print_debug_with_message("Events for stunned round:");

        assert!(bus.events().contains(&BattleEvent::Stunned {
            actor: "knight".to_string(),
        }));
        assert_eq!(session.actor("slime_0").unwrap().hp, 1000);
        // The stun expired at the end of the round.
        assert!(!session.actor("knight").unwrap().is_stunned);
    }

    #[test]
    fn test_damage_over_time_can_end_the_battle() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 1000, 10)],
        );
        session.actor_mut("slime_0").unwrap().dots.push(Dot {
            dot_type: "poison".to_string(),
            damage: 5000,
            duration: 2,
        });

        let bus = assert_ok(session.execute_round());
        bus.print_debug_with_message("Events for poisoned round:");

        assert!(bus.events().contains(&BattleEvent::DotDamage {
            target: "Slime".to_string(),
            damage: 1000,
        }));
        assert_eq!(session.result(), Some(Outcome::Victory));
        assert_eq!(session.round(), 1);
    }

    #[test]
    fn test_broken_command_aborts_the_round() {
        let mut session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 1000, 10)],
        )
        .with_behavior(Box::new(RogueBehavior));
        assert_ok(session.submit_command(Command::attack("knight", "slime_0")));

        let bus = assert_ok(session.execute_round());
        bus.print_debug_with_message("Events for aborted round:");

        assert_eq!(
            count_events(&bus, |e| matches!(e, BattleEvent::RoundAborted { round: 1, .. })),
            1
        );
        assert_eq!(session.actor("slime_0").unwrap().hp, 990);
        assert_eq!(session.round(), 2);
        assert_eq!(session.phase(), Phase::Input);
        assert_eq!(session.result(), None);
    }

    #[test]
    fn test_snapshot_follows_action_order() {
        let session = create_test_session(
            vec![legacy_player("knight", 100, 10)],
            vec![enemy_template("slime", "Slime", 100, 10)],
        );

        let snapshot = session.snapshot();

        assert_eq!(snapshot.round, 1);
        assert_eq!(snapshot.phase, Phase::Input);
        assert_eq!(snapshot.result, None);
        let order: Vec<&str> = snapshot.action_order.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(order, vec!["knight", "slime_0"]);
        assert!(snapshot.actors.iter().all(|a| a.action_points > 0.0));
    }

    #[test]
    fn test_colliding_ids_are_suffixed() {
        let hero = PlayerModel::new("Aria", 1, 100, 50, CombatStats::default());
        let session = create_test_session(
            vec![legacy_player("player_2", 100, 10), PlayerEntry::Model(hero)],
            vec![enemy_template("slime", "Slime", 100, 10)],
        );

        let ids: Vec<&str> = session.actors().iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, vec!["player_2", "player_2_2", "slime_0"]);
        assert_eq!(session.actor("player_2_2").unwrap().name, "Aria");
    }
}
