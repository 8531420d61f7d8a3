//! Team assignment solver
//!
//! Splits a rated roster into teams. The request is validated, checked for
//! counting infeasibilities, turned into an [`AssignmentModel`] and handed to
//! a [`MilpBackend`]. The engine's answer is decoded into teams whose ratings
//! are then corrected for missing goalkeepers.
//!
//! [`AssignmentModel`]: crate::solver::model::AssignmentModel

use crate::config::{AppConfig, SolverConfiguration};
use crate::error::Result;
use crate::solver::backend::{BackendOutcome, GoodLpBackend, MilpBackend};
use crate::solver::builder::ModelBuilder;
use crate::solver::validation::{detect_infeasibility, distinct_names, validate_request};
use crate::types::{
    CouplingConstraint, DecouplingConstraint, InfeasibilityCause, Player, SolveOutcome, Team,
    TeamAssignment,
};
use crate::utils::{goalkeeper_count, max_team_size};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Partitions a roster into balanced teams
#[derive(Clone)]
pub struct TeamAssignmentSolver {
    backend: Arc<dyn MilpBackend>,
    seed: Option<u64>,
}

impl std::fmt::Debug for TeamAssignmentSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeamAssignmentSolver")
            .field("backend", &self.backend.name())
            .field("seed", &self.seed)
            .finish()
    }
}

impl Default for TeamAssignmentSolver {
    fn default() -> Self {
        Self::with_backend(Arc::new(GoodLpBackend::new()))
    }
}

impl TeamAssignmentSolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn MilpBackend>) -> Self {
        Self {
            backend,
            seed: None,
        }
    }

    /// Solver using the engine time limit and seed from `config`
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = GoodLpBackend::new().with_time_limit(config.solver_time_limit());
        let mut solver = Self::with_backend(Arc::new(backend));
        solver.seed = config.solver.seed;
        solver
    }

    /// Fix the tie-breaking shuffle for reproducible runs
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Split `roster` into `config.num_teams` teams.
    ///
    /// Returns `SolveOutcome::Infeasible` when no partition satisfies the
    /// enabled rules. Malformed input and engine failures are errors.
    pub fn solve(
        &self,
        roster: &[Player],
        config: &SolverConfiguration,
        couplings: &[CouplingConstraint],
        decouplings: &[DecouplingConstraint],
    ) -> Result<SolveOutcome> {
        config.validate()?;
        validate_request(roster, couplings, decouplings)?;

        if let Some(cause) = detect_infeasibility(roster, config.num_teams, couplings, decouplings)
        {
            info!(
                roster_size = roster.len(),
                num_teams = config.num_teams,
                "Request is infeasible before solving: {}",
                cause
            );
            return Ok(SolveOutcome::Infeasible(cause));
        }

        let players = self.tier_order(roster);
        let index: HashMap<&str, usize> = players
            .iter()
            .enumerate()
            .map(|(i, p)| (p.name.as_str(), i))
            .collect();
        let coupling_groups = group_indices(couplings.iter().map(|c| &c.players[..]), &index);
        let decoupling_groups = group_indices(decouplings.iter().map(|d| &d.players[..]), &index);

        let model = ModelBuilder::new(config).build(&players, &coupling_groups, &decoupling_groups);

        debug!(
            roster_size = players.len(),
            num_teams = config.num_teams,
            variables = model.variables().len(),
            constraints = model.constraints().len(),
            engine = self.backend.name(),
            "Solving assignment model"
        );

        let started = Instant::now();
        let solved = self.backend.solve(&model)?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let values = match solved {
            BackendOutcome::Solved(values) => values,
            BackendOutcome::Infeasible => {
                info!(
                    roster_size = players.len(),
                    num_teams = config.num_teams,
                    elapsed_ms,
                    "No feasible assignment exists"
                );
                return Ok(SolveOutcome::Infeasible(
                    InfeasibilityCause::NoFeasibleAssignment,
                ));
            }
        };

        let team_of = model.decode(&values)?;
        let mut teams = vec![
            Team {
                players: Vec::new(),
                rating: 0.0,
            };
            config.num_teams
        ];
        for (player, team) in players.into_iter().zip(team_of) {
            teams[team].rating += player.rating;
            teams[team].players.push(player);
        }

        apply_rating_correction(
            &mut teams,
            roster.len(),
            config.num_teams,
            goalkeeper_count(roster),
        );

        let assignment = TeamAssignment { teams };
        info!(
            roster_size = assignment.player_count(),
            num_teams = assignment.teams.len(),
            elapsed_ms,
            "Assigned players to teams, rating spread {:.2}",
            assignment.rating_spread()
        );
        Ok(SolveOutcome::Assigned(assignment))
    }

    /// Shuffle, then stable sort by descending rating, so tied players are
    /// ordered randomly rather than by input position
    fn tier_order(&self, roster: &[Player]) -> Vec<Player> {
        let mut rng = match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let mut players = roster.to_vec();
        players.shuffle(&mut rng);
        players.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        players
    }
}

fn group_indices<'a>(
    groups: impl Iterator<Item = &'a [String]>,
    index: &HashMap<&str, usize>,
) -> Vec<Vec<usize>> {
    groups
        .map(|group| {
            distinct_names(group)
                .into_iter()
                .filter_map(|name| index.get(name).copied())
                .collect()
        })
        .collect()
}

/// Scale down teams that fill a full-size slot without a goalkeeper.
///
/// Applies only when some team is missing a goalkeeper. Every goalkeeper-less
/// team of the maximum size is multiplied by `(size - 1) / size`.
pub fn apply_rating_correction(
    teams: &mut [Team],
    roster_size: usize,
    num_teams: usize,
    goalkeepers: usize,
) {
    if goalkeepers == num_teams {
        return;
    }

    let full_size = max_team_size(roster_size, num_teams);
    if full_size == 0 {
        return;
    }
    for team in teams.iter_mut() {
        if team.size() == full_size && team.goalkeeper_count() == 0 {
            team.rating *= (full_size - 1) as f64 / full_size as f64;
        }
    }
}
