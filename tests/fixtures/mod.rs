//! Shared setup for the integration tests

use chrono::NaiveDate;
use matchday_balancer::config::SolverConfiguration;
use matchday_balancer::matchday::{InMemoryMatchdayStore, Matchday, MatchdayService, MatchdayStore};
use matchday_balancer::rating::{InMemoryRatingStore, RatingStore};
use matchday_balancer::solver::TeamAssignmentSolver;
use matchday_balancer::types::Role;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered players with the average score every rater gives them
pub const SQUAD: &[(&str, Role, f64)] = &[
    ("Avi", Role::Offensive, 8.5),
    ("Beni", Role::Defensive, 6.5),
    ("Gadi", Role::AllAround, 7.0),
    ("Dani", Role::Offensive, 8.0),
    ("Eli", Role::Goalkeeper, 0.0),
    ("Fadi", Role::Defensive, 5.0),
    ("Guy", Role::AllAround, 6.0),
    ("Hezi", Role::Offensive, 7.5),
    ("Itai", Role::Defensive, 4.5),
    ("Kobi", Role::Goalkeeper, 0.0),
];

pub fn matchday_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
}

pub struct TestSystem {
    pub service: MatchdayService,
    pub ratings: Arc<InMemoryRatingStore>,
    pub matchdays: Arc<InMemoryMatchdayStore>,
}

/// Register the squad, have three raters score everyone and store a matchday
/// with the whole squad on the roster
pub async fn create_test_system(config: SolverConfiguration) -> TestSystem {
    let ratings = Arc::new(InMemoryRatingStore::default());
    for (name, role, _) in SQUAD {
        ratings.register_player(name, *role).await.unwrap();
    }

    // raters spread -0.5, 0, +0.5 around the target so the mean is exact
    for (rater, offset) in [("r1", -0.5), ("r2", 0.0), ("r3", 0.5)] {
        let scores: HashMap<String, f64> = SQUAD
            .iter()
            .filter(|(_, role, _)| !role.is_goalkeeper())
            .map(|(name, _, score)| (name.to_string(), score + offset))
            .collect();
        ratings.submit_scores(rater, scores).await.unwrap();
    }

    let matchdays = Arc::new(InMemoryMatchdayStore::new());
    matchdays
        .create_matchday(
            Matchday::new(matchday_date(), SQUAD.iter().map(|(name, _, _)| *name)),
            false,
        )
        .await
        .unwrap();

    let service = MatchdayService::new(
        ratings.clone(),
        matchdays.clone(),
        TeamAssignmentSolver::new().with_seed(42),
        config,
    );

    TestSystem {
        service,
        ratings,
        matchdays,
    }
}
