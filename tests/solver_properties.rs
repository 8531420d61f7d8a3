//! Property tests for rating aggregation and team assignment

use matchday_balancer::config::SolverConfiguration;
use matchday_balancer::rating::{OutlierFilteringAggregator, RatingAggregator};
use matchday_balancer::solver::TeamAssignmentSolver;
use matchday_balancer::types::{
    CouplingConstraint, DecouplingConstraint, Player, RatingSample, Role, SolveOutcome,
    TeamAssignment,
};
use proptest::prelude::*;
use std::collections::HashMap;

fn role_strategy() -> impl Strategy<Value = Role> {
    prop_oneof![
        1 => Just(Role::Goalkeeper),
        3 => Just(Role::Defensive),
        3 => Just(Role::Offensive),
        3 => Just(Role::AllAround),
    ]
}

/// Rosters of 4 to 10 players. Field ratings sit on a half-point grid plus a
/// small per-player offset so no two field players tie.
fn roster_strategy() -> impl Strategy<Value = Vec<Player>> {
    prop::collection::vec((role_strategy(), 2u32..=20), 4..=10).prop_map(|entries| {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, (role, half_points))| {
                if role.is_goalkeeper() {
                    Player::goalkeeper(format!("p{}", i))
                } else {
                    let rating = half_points as f64 / 2.0 + i as f64 / 1000.0;
                    Player::new(format!("p{}", i), role, rating)
                }
            })
            .collect()
    })
}

fn config_strategy() -> impl Strategy<Value = SolverConfiguration> {
    (2usize..=3, any::<[bool; 5]>()).prop_map(
        |(num_teams, [balance, tiers, defense, offense, roles])| SolverConfiguration {
            num_teams,
            balance_ratings: balance,
            enforce_tiers: tiers,
            enforce_defense_balance: defense,
            enforce_offense_balance: offense,
            enforce_role_balance: roles,
            ..SolverConfiguration::default()
        },
    )
}

/// Largest minus smallest per-team count of players matching `selects`
fn count_gap(assignment: &TeamAssignment, selects: impl Fn(Role) -> bool) -> usize {
    let counts: Vec<usize> = assignment
        .teams
        .iter()
        .map(|t| t.players.iter().filter(|p| selects(p.role)).count())
        .collect();
    let max = counts.iter().max().copied().unwrap_or(0);
    let min = counts.iter().min().copied().unwrap_or(0);
    max - min
}

/// Tier of every field player: rank in descending rating order divided by
/// the team count. Goalkeepers all rate 0 and rank last, so field ranks do
/// not depend on how rating ties are broken.
fn field_tiers(roster: &[Player], num_teams: usize) -> HashMap<String, usize> {
    let mut ranked: Vec<&Player> = roster.iter().collect();
    ranked.sort_by(|a, b| b.rating.total_cmp(&a.rating));
    ranked
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.role.is_goalkeeper())
        .map(|(rank, p)| (p.name.clone(), rank / num_teams))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_assignment_is_a_valid_partition(
        roster in roster_strategy(),
        config in config_strategy(),
        seed in any::<u64>(),
    ) {
        let solver = TeamAssignmentSolver::new().with_seed(seed);
        let outcome = solver.solve(&roster, &config, &[], &[]).unwrap();

        let k = config.num_teams;
        let goalkeepers = roster.iter().filter(|p| p.role.is_goalkeeper()).count();

        match outcome {
            SolveOutcome::Assigned(assignment) => {
                prop_assert_eq!(assignment.teams.len(), k);
                prop_assert_eq!(assignment.player_count(), roster.len());
                for player in &roster {
                    prop_assert!(assignment.team_of(&player.name).is_some());
                }

                let floor = roster.len() / k;
                let ceil = roster.len().div_ceil(k);
                for team in &assignment.teams {
                    prop_assert!(team.size() >= floor && team.size() <= ceil);
                    prop_assert!(team.goalkeeper_count() <= 1);

                    let ratings: Vec<f64> = team.players.iter().map(|p| p.rating).collect();
                    prop_assert!(ratings.windows(2).all(|w| w[0] >= w[1]));
                }

                if config.enforce_tiers {
                    let tiers = field_tiers(&roster, k);
                    let full_tiers = roster.len() / k;
                    for team in &assignment.teams {
                        let mut seen = vec![0usize; full_tiers];
                        for player in team.players.iter().filter(|p| !p.role.is_goalkeeper()) {
                            if let Some(&tier) = tiers.get(&player.name) {
                                if tier < full_tiers {
                                    seen[tier] += 1;
                                }
                            }
                        }
                        prop_assert!(seen.iter().all(|&n| n <= 1), "tiers per team: {:?}", seen);
                    }
                }
                if config.enforce_defense_balance {
                    prop_assert!(count_gap(&assignment, |r| r == Role::Defensive) <= 1);
                }
                if config.enforce_offense_balance {
                    prop_assert!(count_gap(&assignment, |r| r == Role::Offensive) <= 1);
                }
                if config.enforce_role_balance {
                    prop_assert!(count_gap(&assignment, |r| r.is_specialist()) <= 1);
                }
            }
            SolveOutcome::Infeasible(_) => {
                let positional = config.enforce_tiers
                    || config.enforce_defense_balance
                    || config.enforce_offense_balance
                    || config.enforce_role_balance;
                // with only structural rules, the goalkeeper count alone blocks a split
                if !positional {
                    prop_assert!(goalkeepers > k);
                }
            }
        }
    }

    #[test]
    fn prop_pairing_rules_hold(
        roster in roster_strategy(),
        seed in any::<u64>(),
    ) {
        let config = SolverConfiguration::structural_only(2);
        let field: Vec<&Player> = roster.iter().filter(|p| !p.role.is_goalkeeper()).collect();
        prop_assume!(field.len() >= 4);

        let coupling = CouplingConstraint::new([field[0].name.clone(), field[1].name.clone()]);
        let decoupling = DecouplingConstraint::new([field[2].name.clone(), field[3].name.clone()]);

        let solver = TeamAssignmentSolver::new().with_seed(seed);
        let outcome = solver
            .solve(&roster, &config, &[coupling], &[decoupling])
            .unwrap();

        // small rosters can leave no room for both rules, only check solved ones
        if let SolveOutcome::Assigned(assignment) = outcome {
            prop_assert_eq!(
                assignment.team_of(&field[0].name),
                assignment.team_of(&field[1].name)
            );
            prop_assert_ne!(
                assignment.team_of(&field[2].name),
                assignment.team_of(&field[3].name)
            );
            for team in &assignment.teams {
                prop_assert!(team.goalkeeper_count() <= 1);
            }
        }
    }

    #[test]
    fn prop_aggregate_stays_within_sample_range(
        scores in prop::collection::vec(1.0f64..=10.0, 1..12),
        threshold in 0.5f64..3.0,
    ) {
        let samples: Vec<RatingSample> = scores.iter().copied().map(RatingSample::from).collect();
        let result = OutlierFilteringAggregator::new(threshold).aggregate(Role::AllAround, &samples);

        let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(result.rating >= min - 1e-9 && result.rating <= max + 1e-9);
        prop_assert_eq!(result.samples_used + result.samples_discarded, scores.len());

        if scores.len() < 5 {
            prop_assert_eq!(result.samples_discarded, 0);
        }
        if result.samples_discarded > 0 {
            prop_assert!(result.samples_used >= std::cmp::max(2, scores.len() / 2));
        }
    }

    #[test]
    fn prop_goalkeepers_are_never_rated(
        scores in prop::collection::vec(1.0f64..=10.0, 0..8),
    ) {
        let samples: Vec<RatingSample> = scores.into_iter().map(RatingSample::from).collect();
        let result = OutlierFilteringAggregator::default().aggregate(Role::Goalkeeper, &samples);
        prop_assert_eq!(result.rating, 0.0);
    }
}
