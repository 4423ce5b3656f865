use crate::battle::state::TurnRng;
use crate::combatant::Combatant;
use crate::config::BattleConfig;
use crate::player::PlayerModel;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use tracing::debug;

/// Hook for model-backed combatants that roll their own initiative.
pub trait InitiativeRoller: Send {
    fn roll_action_points(&self, model: &PlayerModel, rng: &mut TurnRng) -> f64;
}

pub struct TurnScheduler {
    config: BattleConfig,
    roller: Option<Box<dyn InitiativeRoller>>,
}

impl TurnScheduler {
    pub fn new(config: BattleConfig) -> Self {
        Self { config, roller: None }
    }

    pub fn with_roller(mut self, roller: Box<dyn InitiativeRoller>) -> Self {
        self.roller = Some(roller);
        self
    }

    /// Roll initiative for everyone alive and return actor indices, highest first.
    /// The dead get -1 and are left out. Ties keep roster order.
    pub fn compute_action_order(
        &self,
        actors: &mut [Combatant],
        models: &[PlayerModel],
        rng: &mut TurnRng,
    ) -> Vec<usize> {
        for actor in actors.iter_mut() {
            if !actor.is_alive() {
                actor.action_points = -1.0;
                continue;
            }

            let model = actor.model_index.and_then(|index| models.get(index));
            match (&self.roller, model) {
                (Some(roller), Some(model)) => {
                    actor.action_points = roller.roll_action_points(model, rng);
                }
                _ => {
                    actor.calculate_action_points(&self.config, rng);
                }
            }
        }

        let mut order: Vec<usize> = (0..actors.len()).filter(|&i| actors[i].is_alive()).collect();
        order.sort_by_key(|&i| Reverse(OrderedFloat(actors[i].action_points)));

        debug!(
            "Action order: {:?}",
            order
                .iter()
                .map(|&i| (&actors[i].name, actors[i].action_points))
                .collect::<Vec<_>>()
        );
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::tests::common::TestCombatantBuilder;
    use crate::player::CombatStats;
    use pretty_assertions::assert_eq;

    struct FixedRoller(f64);

    impl InitiativeRoller for FixedRoller {
        fn roll_action_points(&self, _model: &PlayerModel, _rng: &mut TurnRng) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_order_is_descending_and_skips_the_dead() {
        let mut actors = vec![
            TestCombatantBuilder::new("slow", true).build(),
            TestCombatantBuilder::new("dead", false).with_hp(0).build(),
            TestCombatantBuilder::new("fast", false).build(),
        ];
        let scheduler = TurnScheduler::new(BattleConfig::default());
        let mut rng = TurnRng::new_for_test(vec![0.1, 0.9]);

        let order = scheduler.compute_action_order(&mut actors, &[], &mut rng);

        assert_eq!(order, vec![2, 0]);
        assert_eq!(actors[1].action_points, -1.0);
    }

    #[test]
    fn test_ties_keep_roster_order() {
        let mut actors = vec![
            TestCombatantBuilder::new("first", true).build(),
            TestCombatantBuilder::new("second", false).build(),
        ];
        let scheduler = TurnScheduler::new(BattleConfig::default());
        let mut rng = TurnRng::new_for_test(vec![0.5, 0.5]);

        assert_eq!(scheduler.compute_action_order(&mut actors, &[], &mut rng), vec![0, 1]);
    }

    #[test]
    fn test_roller_only_applies_to_model_backed_actors() {
        let models = vec![PlayerModel::new("Aria", 1, 50, 10, CombatStats::default())];
        let mut actors = vec![
            TestCombatantBuilder::new("enemy", false).build(),
            TestCombatantBuilder::new("hero", true).with_model_index(0).build(),
        ];
        let scheduler = TurnScheduler::new(BattleConfig::default()).with_roller(Box::new(FixedRoller(99.0)));
        // Only the enemy consumes a roll.
        let mut rng = TurnRng::new_for_test(vec![0.5]);

        let order = scheduler.compute_action_order(&mut actors, &models, &mut rng);

        assert_eq!(order, vec![1, 0]);
        assert_eq!(actors[1].action_points, 99.0);
        assert_eq!(rng.remaining(), Some(0));
    }
}
