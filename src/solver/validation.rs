//! Request validation and presolve checks
//!
//! Validation rejects malformed requests outright. Presolve spots the
//! infeasibilities that follow directly from counting, so they can be reported
//! with a precise cause instead of a bare "no solution" from the engine.

use crate::error::{MatchdayError, Result};
use crate::types::{
    CouplingConstraint, DecouplingConstraint, InfeasibilityCause, Player, PlayerName,
};
use crate::utils::{goalkeeper_count, max_team_size};
use std::collections::{HashMap, HashSet};

/// Distinct names of a constraint group, in first-seen order
pub fn distinct_names(names: &[PlayerName]) -> Vec<&str> {
    let mut seen = HashSet::new();
    names
        .iter()
        .map(|name| name.as_str())
        .filter(|name| seen.insert(*name))
        .collect()
}

/// Reject malformed rosters and constraint groups
pub fn validate_request(
    roster: &[Player],
    couplings: &[CouplingConstraint],
    decouplings: &[DecouplingConstraint],
) -> Result<()> {
    if roster.is_empty() {
        return Err(MatchdayError::InvalidRoster {
            reason: "roster is empty".to_string(),
        }
        .into());
    }

    let mut names = HashSet::with_capacity(roster.len());
    for player in roster {
        if !names.insert(player.name.as_str()) {
            return Err(MatchdayError::InvalidRoster {
                reason: format!("player '{}' appears more than once", player.name),
            }
            .into());
        }
        if !player.rating.is_finite() {
            return Err(MatchdayError::InvalidRating {
                reason: format!("player '{}' has rating {}", player.name, player.rating),
            }
            .into());
        }
    }

    let groups = couplings
        .iter()
        .map(|c| ("coupling", &c.players))
        .chain(decouplings.iter().map(|d| ("decoupling", &d.players)));

    for (kind, group) in groups {
        if let Some(unknown) = group.iter().find(|name| !names.contains(name.as_str())) {
            return Err(MatchdayError::UnknownPlayer {
                name: unknown.clone(),
            }
            .into());
        }
        if distinct_names(group).len() < 2 {
            return Err(MatchdayError::InvalidConstraint {
                reason: format!(
                    "{} group [{}] needs at least two distinct players",
                    kind,
                    group.join(", ")
                ),
            }
            .into());
        }
    }

    Ok(())
}

/// Players linked by coupling groups, transitively
struct CoupledSets {
    parent: Vec<usize>,
}

impl CoupledSets {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
        }
    }

    fn find(&mut self, mut node: usize) -> usize {
        while self.parent[node] != node {
            self.parent[node] = self.parent[self.parent[node]];
            node = self.parent[node];
        }
        node
    }

    fn union(&mut self, a: usize, b: usize) {
        let (root_a, root_b) = (self.find(a), self.find(b));
        if root_a != root_b {
            self.parent[root_b] = root_a;
        }
    }
}

/// Detect guaranteed infeasibility of a validated request
pub fn detect_infeasibility(
    roster: &[Player],
    num_teams: usize,
    couplings: &[CouplingConstraint],
    decouplings: &[DecouplingConstraint],
) -> Option<InfeasibilityCause> {
    let goalkeepers = goalkeeper_count(roster);
    if goalkeepers > num_teams {
        return Some(InfeasibilityCause::TooManyGoalkeepers {
            goalkeepers,
            num_teams,
        });
    }

    for decoupling in decouplings {
        let group = distinct_names(&decoupling.players);
        if group.len() > num_teams {
            return Some(InfeasibilityCause::DecouplingGroupTooLarge {
                group: group.into_iter().map(String::from).collect(),
                num_teams,
            });
        }
    }

    let index: HashMap<&str, usize> = roster
        .iter()
        .enumerate()
        .map(|(i, p)| (p.name.as_str(), i))
        .collect();

    let mut sets = CoupledSets::new(roster.len());
    for coupling in couplings {
        let members: Vec<usize> = coupling
            .players
            .iter()
            .filter_map(|name| index.get(name.as_str()).copied())
            .collect();
        for pair in members.windows(2) {
            sets.union(pair[0], pair[1]);
        }
    }

    let mut components: HashMap<usize, Vec<usize>> = HashMap::new();
    for i in 0..roster.len() {
        let root = sets.find(i);
        components.entry(root).or_default().push(i);
    }
    let mut components: Vec<Vec<usize>> = components
        .into_values()
        .filter(|members| members.len() > 1)
        .collect();
    components.sort_by_key(|members| members[0]);

    let names_of = |members: &[usize]| -> Vec<PlayerName> {
        members.iter().map(|&i| roster[i].name.clone()).collect()
    };

    let max_size = max_team_size(roster.len(), num_teams);
    for members in &components {
        if members.len() > max_size {
            return Some(InfeasibilityCause::CouplingGroupTooLarge {
                group: names_of(members),
                max_team_size: max_size,
            });
        }
        if goalkeeper_count(members.iter().map(|&i| &roster[i])) > 1 {
            return Some(InfeasibilityCause::CoupledGoalkeepers {
                group: names_of(members),
            });
        }
    }

    for decoupling in decouplings {
        let members: Vec<usize> = distinct_names(&decoupling.players)
            .into_iter()
            .filter_map(|name| index.get(name).copied())
            .collect();
        for (pos, &a) in members.iter().enumerate() {
            for &b in &members[pos + 1..] {
                if sets.find(a) == sets.find(b) {
                    return Some(InfeasibilityCause::ConflictingConstraints {
                        first: roster[a].name.clone(),
                        second: roster[b].name.clone(),
                    });
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    fn roster(names: &[&str]) -> Vec<Player> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| Player::new(*name, Role::AllAround, i as f64 + 1.0))
            .collect()
    }

    fn error_of(result: Result<()>) -> MatchdayError {
        result
            .unwrap_err()
            .downcast::<MatchdayError>()
            .expect("typed error")
    }

    #[test]
    fn test_valid_request_passes() {
        let players = roster(&["A", "B", "C", "D"]);
        let couplings = vec![CouplingConstraint::new(["A", "B"])];
        let decouplings = vec![DecouplingConstraint::new(["A", "C"])];
        assert!(validate_request(&players, &couplings, &decouplings).is_ok());
    }

    #[test]
    fn test_empty_roster_rejected() {
        let err = error_of(validate_request(&[], &[], &[]));
        assert!(matches!(err, MatchdayError::InvalidRoster { .. }));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let players = roster(&["A", "B", "A"]);
        let err = error_of(validate_request(&players, &[], &[]));
        assert!(matches!(err, MatchdayError::InvalidRoster { .. }));
    }

    #[test]
    fn test_non_finite_rating_rejected() {
        let mut players = roster(&["A", "B"]);
        players[1].rating = f64::NAN;
        let err = error_of(validate_request(&players, &[], &[]));
        assert!(matches!(err, MatchdayError::InvalidRating { .. }));
    }

    #[test]
    fn test_unknown_name_rejected() {
        let players = roster(&["A", "B"]);
        let couplings = vec![CouplingConstraint::new(["A", "Z"])];
        let err = error_of(validate_request(&players, &couplings, &[]));
        assert!(matches!(err, MatchdayError::UnknownPlayer { name } if name == "Z"));
    }

    #[test]
    fn test_degenerate_group_rejected() {
        let players = roster(&["A", "B"]);
        let decouplings = vec![DecouplingConstraint::new(["A", "A"])];
        let err = error_of(validate_request(&players, &[], &decouplings));
        assert!(matches!(err, MatchdayError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_too_many_goalkeepers() {
        let mut players = roster(&["A", "B", "C", "D"]);
        players.extend((0..3).map(|i| Player::goalkeeper(format!("gk{}", i))));
        assert_eq!(
            detect_infeasibility(&players, 2, &[], &[]),
            Some(InfeasibilityCause::TooManyGoalkeepers {
                goalkeepers: 3,
                num_teams: 2
            })
        );
    }

    #[test]
    fn test_decoupling_larger_than_team_count() {
        let players = roster(&["A", "B", "C", "D"]);
        let decouplings = vec![DecouplingConstraint::new(["A", "B", "C"])];
        assert!(matches!(
            detect_infeasibility(&players, 2, &[], &decouplings),
            Some(InfeasibilityCause::DecouplingGroupTooLarge { num_teams: 2, .. })
        ));
    }

    #[test]
    fn test_transitive_coupling_too_large() {
        // A-B and B-C chain into one group of three; teams of four hold two
        let players = roster(&["A", "B", "C", "D"]);
        let couplings = vec![
            CouplingConstraint::new(["A", "B"]),
            CouplingConstraint::new(["B", "C"]),
        ];
        assert_eq!(
            detect_infeasibility(&players, 2, &couplings, &[]),
            Some(InfeasibilityCause::CouplingGroupTooLarge {
                group: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                max_team_size: 2,
            })
        );
    }

    #[test]
    fn test_coupled_goalkeepers() {
        let mut players = roster(&["A", "B", "C", "D"]);
        players.push(Player::goalkeeper("K1"));
        players.push(Player::goalkeeper("K2"));
        let couplings = vec![CouplingConstraint::new(["K1", "K2"])];
        assert!(matches!(
            detect_infeasibility(&players, 2, &couplings, &[]),
            Some(InfeasibilityCause::CoupledGoalkeepers { .. })
        ));
    }

    #[test]
    fn test_coupled_and_decoupled_pair() {
        let players = roster(&["A", "B", "C", "D"]);
        let couplings = vec![
            CouplingConstraint::new(["A", "B"]),
            CouplingConstraint::new(["B", "C"]),
        ];
        let decouplings = vec![DecouplingConstraint::new(["C", "A"])];
        assert_eq!(
            detect_infeasibility(&players, 2, &couplings, &decouplings),
            // the chained group is already too big for teams of two
            Some(InfeasibilityCause::CouplingGroupTooLarge {
                group: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                max_team_size: 2,
            })
        );

        let players = roster(&["A", "B", "C", "D", "E", "F"]);
        assert_eq!(
            detect_infeasibility(&players, 2, &couplings, &decouplings),
            Some(InfeasibilityCause::ConflictingConstraints {
                first: "C".to_string(),
                second: "A".to_string(),
            })
        );
    }

    #[test]
    fn test_satisfiable_request_has_no_cause() {
        let players = roster(&["A", "B", "C", "D"]);
        let couplings = vec![CouplingConstraint::new(["A", "B"])];
        let decouplings = vec![DecouplingConstraint::new(["A", "C"])];
        assert_eq!(
            detect_infeasibility(&players, 2, &couplings, &decouplings),
            None
        );
    }
}
