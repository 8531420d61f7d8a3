//! Common types used throughout the matchday balancer

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique key of a player within a roster
pub type PlayerName = String;

/// Identifier of a peer who submits ratings
pub type RaterId = String;

/// Identifier attached to every team generation request
pub type RequestId = Uuid;

/// Positional role of a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(alias = "GK", alias = "goalkeeper")]
    Goalkeeper,
    #[serde(alias = "DEF", alias = "defensive")]
    Defensive,
    #[serde(alias = "ATT", alias = "offensive")]
    Offensive,
    #[serde(alias = "ALL", alias = "all_around", alias = "allaround")]
    AllAround,
}

impl Role {
    pub fn is_goalkeeper(&self) -> bool {
        matches!(self, Role::Goalkeeper)
    }

    /// Offensive and defensive players are "specialists"; the role-balance
    /// rule spreads them against the all-around players.
    pub fn is_specialist(&self) -> bool {
        match self {
            Role::Defensive | Role::Offensive => true,
            Role::Goalkeeper | Role::AllAround => false,
        }
    }

    /// Short code used in compact output
    pub fn code(&self) -> &'static str {
        match self {
            Role::Goalkeeper => "GK",
            Role::Defensive => "DEF",
            Role::Offensive => "ATT",
            Role::AllAround => "ALL",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Goalkeeper => write!(f, "Goalkeeper"),
            Role::Defensive => write!(f, "Defensive"),
            Role::Offensive => write!(f, "Offensive"),
            Role::AllAround => write!(f, "AllAround"),
        }
    }
}

impl FromStr for Role {
    type Err = crate::error::MatchdayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gk" | "goalkeeper" => Ok(Role::Goalkeeper),
            "def" | "defensive" => Ok(Role::Defensive),
            "att" | "offensive" => Ok(Role::Offensive),
            "all" | "allaround" | "all_around" => Ok(Role::AllAround),
            other => Err(crate::error::MatchdayError::InvalidRoster {
                reason: format!("unknown role '{}'", other),
            }),
        }
    }
}

/// A roster member as seen by the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub name: PlayerName,
    pub role: Role,
    pub rating: f64,
}

impl Player {
    pub fn new(name: impl Into<PlayerName>, role: Role, rating: f64) -> Self {
        Self {
            name: name.into(),
            role,
            rating,
        }
    }

    /// Goalkeepers are never peer rated and always carry rating 0
    pub fn goalkeeper(name: impl Into<PlayerName>) -> Self {
        Self::new(name, Role::Goalkeeper, 0.0)
    }
}

/// One peer's score for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingSample {
    pub rater: Option<RaterId>,
    pub score: f64,
}

impl RatingSample {
    pub fn new(rater: impl Into<RaterId>, score: f64) -> Self {
        Self {
            rater: Some(rater.into()),
            score,
        }
    }
}

impl From<f64> for RatingSample {
    fn from(score: f64) -> Self {
        Self { rater: None, score }
    }
}

/// Players that must end up in the same team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CouplingConstraint {
    pub players: Vec<PlayerName>,
}

impl CouplingConstraint {
    pub fn new<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        Self {
            players: players.into_iter().map(Into::into).collect(),
        }
    }
}

/// Players of which at most one may be placed in any team
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecouplingConstraint {
    pub players: Vec<PlayerName>,
}

impl DecouplingConstraint {
    pub fn new<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        Self {
            players: players.into_iter().map(Into::into).collect(),
        }
    }
}

/// One generated team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub players: Vec<Player>,
    /// Sum of member ratings, after the goalkeeper correction
    pub rating: f64,
}

impl Team {
    pub fn size(&self) -> usize {
        self.players.len()
    }

    pub fn goalkeeper_count(&self) -> usize {
        self.players.iter().filter(|p| p.role.is_goalkeeper()).count()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.players.iter().any(|p| p.name == name)
    }

    /// Mean rating of the outfield players, 0 when there are none
    pub fn field_average(&self) -> f64 {
        let field: Vec<f64> = self
            .players
            .iter()
            .filter(|p| !p.role.is_goalkeeper())
            .map(|p| p.rating)
            .collect();

        if field.is_empty() {
            0.0
        } else {
            field.iter().sum::<f64>() / field.len() as f64
        }
    }
}

/// A complete partition of the roster into teams
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamAssignment {
    pub teams: Vec<Team>,
}

impl TeamAssignment {
    pub fn player_count(&self) -> usize {
        self.teams.iter().map(Team::size).sum()
    }

    /// Index of the team holding `name`
    pub fn team_of(&self, name: &str) -> Option<usize> {
        self.teams.iter().position(|team| team.contains(name))
    }

    /// Strongest minus weakest team rating
    pub fn rating_spread(&self) -> f64 {
        let ratings = self.teams.iter().map(|t| t.rating);
        let max = ratings.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = ratings.fold(f64::INFINITY, f64::min);
        if self.teams.is_empty() {
            0.0
        } else {
            max - min
        }
    }
}

/// Why a team request could not be satisfied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InfeasibilityCause {
    TooManyGoalkeepers {
        goalkeepers: usize,
        num_teams: usize,
    },
    DecouplingGroupTooLarge {
        group: Vec<PlayerName>,
        num_teams: usize,
    },
    CouplingGroupTooLarge {
        group: Vec<PlayerName>,
        max_team_size: usize,
    },
    CoupledGoalkeepers {
        group: Vec<PlayerName>,
    },
    ConflictingConstraints {
        first: PlayerName,
        second: PlayerName,
    },
    /// The optimization engine proved the model has no solution
    NoFeasibleAssignment,
}

impl std::fmt::Display for InfeasibilityCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InfeasibilityCause::TooManyGoalkeepers {
                goalkeepers,
                num_teams,
            } => write!(
                f,
                "{} goalkeepers cannot be spread over {} teams",
                goalkeepers, num_teams
            ),
            InfeasibilityCause::DecouplingGroupTooLarge { group, num_teams } => write!(
                f,
                "{} players must be kept apart but there are only {} teams ({})",
                group.len(),
                num_teams,
                group.join(", ")
            ),
            InfeasibilityCause::CouplingGroupTooLarge {
                group,
                max_team_size,
            } => write!(
                f,
                "{} players must play together but teams hold at most {} ({})",
                group.len(),
                max_team_size,
                group.join(", ")
            ),
            InfeasibilityCause::CoupledGoalkeepers { group } => write!(
                f,
                "coupled group contains more than one goalkeeper ({})",
                group.join(", ")
            ),
            InfeasibilityCause::ConflictingConstraints { first, second } => write!(
                f,
                "{} and {} are required both together and apart",
                first, second
            ),
            InfeasibilityCause::NoFeasibleAssignment => {
                write!(f, "no assignment satisfies the enabled constraints")
            }
        }
    }
}

/// Result of a solve: either a full partition or an explicit infeasibility
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SolveOutcome {
    Assigned(TeamAssignment),
    Infeasible(InfeasibilityCause),
}

impl SolveOutcome {
    pub fn is_feasible(&self) -> bool {
        matches!(self, SolveOutcome::Assigned(_))
    }

    pub fn assignment(&self) -> Option<&TeamAssignment> {
        match self {
            SolveOutcome::Assigned(assignment) => Some(assignment),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    pub fn into_assignment(self) -> Option<TeamAssignment> {
        match self {
            SolveOutcome::Assigned(assignment) => Some(assignment),
            SolveOutcome::Infeasible(_) => None,
        }
    }

    /// Label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            SolveOutcome::Assigned(_) => "assigned",
            SolveOutcome::Infeasible(_) => "infeasible",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(players: Vec<Player>, rating: f64) -> Team {
        Team { players, rating }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("GK".parse::<Role>().unwrap(), Role::Goalkeeper);
        assert_eq!("att".parse::<Role>().unwrap(), Role::Offensive);
        assert_eq!("AllAround".parse::<Role>().unwrap(), Role::AllAround);
        assert!("striker".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serde_aliases() {
        let role: Role = serde_json::from_str("\"DEF\"").unwrap();
        assert_eq!(role, Role::Defensive);
        let role: Role = serde_json::from_str("\"Goalkeeper\"").unwrap();
        assert_eq!(role, Role::Goalkeeper);
    }

    #[test]
    fn test_specialists() {
        assert!(Role::Offensive.is_specialist());
        assert!(Role::Defensive.is_specialist());
        assert!(!Role::AllAround.is_specialist());
        assert!(!Role::Goalkeeper.is_specialist());
    }

    #[test]
    fn test_field_average_ignores_goalkeepers() {
        let t = team(
            vec![
                Player::goalkeeper("keeper"),
                Player::new("a", Role::AllAround, 6.0),
                Player::new("b", Role::Offensive, 8.0),
            ],
            14.0,
        );
        assert_eq!(t.field_average(), 7.0);
        assert_eq!(t.goalkeeper_count(), 1);

        let only_keeper = team(vec![Player::goalkeeper("keeper")], 0.0);
        assert_eq!(only_keeper.field_average(), 0.0);
    }

    #[test]
    fn test_assignment_queries() {
        let assignment = TeamAssignment {
            teams: vec![
                team(vec![Player::new("a", Role::AllAround, 5.0)], 5.0),
                team(vec![Player::new("b", Role::AllAround, 7.5)], 7.5),
            ],
        };
        assert_eq!(assignment.player_count(), 2);
        assert_eq!(assignment.team_of("b"), Some(1));
        assert_eq!(assignment.team_of("z"), None);
        assert_eq!(assignment.rating_spread(), 2.5);
    }

    #[test]
    fn test_constraints_serialize_as_plain_lists() {
        let coupling = CouplingConstraint::new(["a", "b"]);
        assert_eq!(serde_json::to_string(&coupling).unwrap(), "[\"a\",\"b\"]");
        let decoupling: DecouplingConstraint = serde_json::from_str("[\"x\",\"y\",\"z\"]").unwrap();
        assert_eq!(decoupling.players.len(), 3);
    }
}
