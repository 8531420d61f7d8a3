//! Team generation configuration

use crate::error::{MatchdayError, Result};
use serde::{Deserialize, Serialize};

/// Which team generation rules to apply to a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfiguration {
    /// Number of teams to split the roster into
    pub num_teams: usize,
    /// Minimize the gap between the strongest and weakest team
    pub balance_ratings: bool,
    /// At most one player of each rating tier per team
    pub enforce_tiers: bool,
    /// Defensive player counts differ by at most one between teams
    pub enforce_defense_balance: bool,
    /// Offensive player counts differ by at most one between teams
    pub enforce_offense_balance: bool,
    /// Specialist (offensive + defensive) counts differ by at most one
    pub enforce_role_balance: bool,
    /// z-score cutoff for discarding outlying peer ratings
    pub deviation_threshold: f64,
}

impl Default for SolverConfiguration {
    fn default() -> Self {
        Self {
            num_teams: 3,
            balance_ratings: true,
            enforce_tiers: true,
            enforce_defense_balance: false,
            enforce_offense_balance: false,
            enforce_role_balance: false,
            deviation_threshold: 1.0,
        }
    }
}

impl SolverConfiguration {
    /// Configuration with only the hard rules enabled
    pub fn structural_only(num_teams: usize) -> Self {
        Self {
            num_teams,
            balance_ratings: false,
            enforce_tiers: false,
            enforce_defense_balance: false,
            enforce_offense_balance: false,
            enforce_role_balance: false,
            ..Self::default()
        }
    }

    pub fn with_num_teams(mut self, num_teams: usize) -> Self {
        self.num_teams = num_teams;
        self
    }

    /// Whether any of the positional balance rules is switched on
    pub fn any_role_rule(&self) -> bool {
        self.enforce_defense_balance || self.enforce_offense_balance || self.enforce_role_balance
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.num_teams < 2 {
            return Err(MatchdayError::ConfigurationError {
                message: format!("num_teams must be at least 2, got {}", self.num_teams),
            }
            .into());
        }

        if !self.deviation_threshold.is_finite() || self.deviation_threshold < 0.0 {
            return Err(MatchdayError::ConfigurationError {
                message: format!(
                    "deviation_threshold must be a non-negative number, got {}",
                    self.deviation_threshold
                ),
            }
            .into());
        }

        Ok(())
    }
}
