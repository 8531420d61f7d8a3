//! Utility functions for the matchday balancer

use crate::types::{Player, RequestId};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Generate a new unique request ID
pub fn generate_request_id() -> RequestId {
    Uuid::new_v4()
}

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Number of goalkeepers among `players`
pub fn goalkeeper_count<'a>(players: impl IntoIterator<Item = &'a Player>) -> usize {
    players
        .into_iter()
        .filter(|p| p.role.is_goalkeeper())
        .count()
}

/// Tier of the player at `sorted_index` in the rating-sorted roster
pub fn tier_index(sorted_index: usize, num_teams: usize) -> usize {
    sorted_index / num_teams
}

/// Smallest admissible team size
pub fn min_team_size(roster_size: usize, num_teams: usize) -> usize {
    roster_size / num_teams
}

/// Largest admissible team size
pub fn max_team_size(roster_size: usize, num_teams: usize) -> usize {
    roster_size.div_ceil(num_teams)
}

/// Arithmetic mean, 0 for an empty slice
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_generate_unique_ids() {
        let id1 = generate_request_id();
        let id2 = generate_request_id();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_team_size_bounds() {
        assert_eq!(min_team_size(10, 3), 3);
        assert_eq!(max_team_size(10, 3), 4);
        assert_eq!(min_team_size(9, 3), 3);
        assert_eq!(max_team_size(9, 3), 3);
        assert_eq!(max_team_size(1, 2), 1);
    }

    #[test]
    fn test_tier_index() {
        assert_eq!(tier_index(0, 3), 0);
        assert_eq!(tier_index(2, 3), 0);
        assert_eq!(tier_index(3, 3), 1);
        assert_eq!(tier_index(8, 3), 2);
    }

    #[test]
    fn test_goalkeeper_count() {
        let players = vec![
            Player::goalkeeper("k1"),
            Player::new("a", Role::Defensive, 4.0),
            Player::goalkeeper("k2"),
        ];
        assert_eq!(goalkeeper_count(&players), 2);
        assert_eq!(goalkeeper_count(players.iter().skip(1).take(1)), 0);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean(&[2.0, 4.0]), 3.0);
    }
}
