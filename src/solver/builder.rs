//! Construction of the assignment model from a sorted roster

use crate::config::SolverConfiguration;
use crate::solver::model::{AssignmentModel, ConstraintFamily, LinearExpr, Relation};
use crate::types::{Player, Role};
use crate::utils::{goalkeeper_count, max_team_size, min_team_size, tier_index};
use tracing::debug;

/// Whether the rating spread objective is meaningful for this roster.
///
/// Team sums are only comparable when all teams have the same size and either
/// every team or no team has a goalkeeper.
pub fn rating_objective_applies(
    config: &SolverConfiguration,
    roster_size: usize,
    goalkeepers: usize,
) -> bool {
    config.balance_ratings
        && roster_size % config.num_teams == 0
        && (goalkeepers == 0 || goalkeepers == config.num_teams)
}

/// Builds an [`AssignmentModel`] for one request
pub struct ModelBuilder<'a> {
    config: &'a SolverConfiguration,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(config: &'a SolverConfiguration) -> Self {
        Self { config }
    }

    /// Build the model for `players`, which must already be in tier order
    /// (descending rating). Constraint groups refer to indices in `players`.
    pub fn build(
        &self,
        players: &[Player],
        couplings: &[Vec<usize>],
        decouplings: &[Vec<usize>],
    ) -> AssignmentModel {
        let num_teams = self.config.num_teams;
        let mut model = AssignmentModel::new(players.len(), num_teams);

        self.add_assign_once(&mut model);
        self.add_team_sizes(&mut model);
        self.add_goalkeeper_cap(&mut model, players);
        self.add_couplings(&mut model, couplings);
        self.add_decouplings(&mut model, decouplings);

        if self.config.enforce_tiers {
            self.add_tiers(&mut model);
        }
        if self.config.enforce_defense_balance {
            self.add_count_balance(&mut model, players, ConstraintFamily::DefenseBalance, |r| {
                r == Role::Defensive
            });
        }
        if self.config.enforce_offense_balance {
            self.add_count_balance(&mut model, players, ConstraintFamily::OffenseBalance, |r| {
                r == Role::Offensive
            });
        }
        if self.config.enforce_role_balance {
            self.add_count_balance(&mut model, players, ConstraintFamily::RoleBalance, |r| {
                r.is_specialist()
            });
        }
        if rating_objective_applies(self.config, players.len(), goalkeeper_count(players)) {
            self.add_rating_spread(&mut model, players);
        }

        debug!(
            "Built model: {} variables, {} constraints, objective: {}",
            model.variables().len(),
            model.constraints().len(),
            model.objective().is_some()
        );
        model
    }

    fn add_assign_once(&self, model: &mut AssignmentModel) {
        for player in 0..model.num_players() {
            let expr = LinearExpr::sum_of(
                (0..model.num_teams()).map(|team| model.assignment_var(player, team)),
            );
            model.add_constraint(
                format!("assign_once_{}", player),
                ConstraintFamily::AssignOnce,
                expr,
                Relation::Equal,
                1.0,
            );
        }
    }

    fn add_team_sizes(&self, model: &mut AssignmentModel) {
        let n = model.num_players();
        let k = model.num_teams();
        let (lower, upper) = (min_team_size(n, k), max_team_size(n, k));

        for team in 0..k {
            let size = model.team_expr(team, |_| 1.0);
            if lower == upper {
                model.add_constraint(
                    format!("team_size_{}", team),
                    ConstraintFamily::TeamSize,
                    size,
                    Relation::Equal,
                    lower as f64,
                );
            } else {
                model.add_constraint(
                    format!("team_size_min_{}", team),
                    ConstraintFamily::TeamSize,
                    size.clone(),
                    Relation::GreaterOrEqual,
                    lower as f64,
                );
                model.add_constraint(
                    format!("team_size_max_{}", team),
                    ConstraintFamily::TeamSize,
                    size,
                    Relation::LessOrEqual,
                    upper as f64,
                );
            }
        }
    }

    fn add_goalkeeper_cap(&self, model: &mut AssignmentModel, players: &[Player]) {
        if goalkeeper_count(players) == 0 {
            return;
        }
        for team in 0..model.num_teams() {
            let keepers = model.team_expr(team, |p| indicator(players[p].role.is_goalkeeper()));
            model.add_constraint(
                format!("goalkeeper_cap_{}", team),
                ConstraintFamily::Goalkeeper,
                keepers,
                Relation::LessOrEqual,
                1.0,
            );
        }
    }

    fn add_couplings(&self, model: &mut AssignmentModel, couplings: &[Vec<usize>]) {
        for (group_idx, group) in couplings.iter().enumerate() {
            for pair in group.windows(2) {
                for team in 0..model.num_teams() {
                    let expr = LinearExpr::new()
                        .with_term(model.assignment_var(pair[0], team), 1.0)
                        .with_term(model.assignment_var(pair[1], team), -1.0);
                    model.add_constraint(
                        format!("coupling_{}_{}_{}_team{}", group_idx, pair[0], pair[1], team),
                        ConstraintFamily::Coupling,
                        expr,
                        Relation::Equal,
                        0.0,
                    );
                }
            }
        }
    }

    fn add_decouplings(&self, model: &mut AssignmentModel, decouplings: &[Vec<usize>]) {
        for (group_idx, group) in decouplings.iter().enumerate() {
            for team in 0..model.num_teams() {
                let expr = LinearExpr::sum_of(
                    group.iter().map(|&player| model.assignment_var(player, team)),
                );
                model.add_constraint(
                    format!("decoupling_{}_team{}", group_idx, team),
                    ConstraintFamily::Decoupling,
                    expr,
                    Relation::LessOrEqual,
                    1.0,
                );
            }
        }
    }

    /// Only complete tiers are constrained; leftover players of an uneven
    /// roster may land anywhere.
    fn add_tiers(&self, model: &mut AssignmentModel) {
        let k = model.num_teams();
        let full_tiers = model.num_players() / k;

        for team in 0..k {
            for tier in 0..full_tiers {
                let expr = model.team_expr(team, |p| indicator(tier_index(p, k) == tier));
                model.add_constraint(
                    format!("tier_{}_team{}", tier, team),
                    ConstraintFamily::Tier,
                    expr,
                    Relation::LessOrEqual,
                    1.0,
                );
            }
        }
    }

    /// Counts of matching players differ by at most one across teams
    fn add_count_balance(
        &self,
        model: &mut AssignmentModel,
        players: &[Player],
        family: ConstraintFamily,
        selects: impl Fn(Role) -> bool,
    ) {
        let matching = players.iter().filter(|p| selects(p.role)).count();
        if matching == 0 {
            return;
        }

        let label = format!("{:?}", family).to_lowercase();
        let fewest = model.add_continuous(format!("{}_min", label), 0.0, matching as f64);
        let most = model.add_continuous(format!("{}_max", label), 0.0, matching as f64);

        for team in 0..model.num_teams() {
            let count = model.team_expr(team, |p| indicator(selects(players[p].role)));
            model.add_constraint(
                format!("{}_floor_team{}", label, team),
                family,
                count.clone().with_term(fewest, -1.0),
                Relation::GreaterOrEqual,
                0.0,
            );
            model.add_constraint(
                format!("{}_ceiling_team{}", label, team),
                family,
                count.with_term(most, -1.0),
                Relation::LessOrEqual,
                0.0,
            );
        }

        model.add_constraint(
            format!("{}_gap", label),
            family,
            LinearExpr::new()
                .with_term(most, 1.0)
                .with_term(fewest, -1.0),
            Relation::LessOrEqual,
            1.0,
        );
    }

    fn add_rating_spread(&self, model: &mut AssignmentModel, players: &[Player]) {
        let lowest: f64 = players.iter().map(|p| p.rating.min(0.0)).sum();
        let highest: f64 = players.iter().map(|p| p.rating.max(0.0)).sum();

        let weakest = model.add_continuous("weakest_team_rating", lowest, highest);
        let strongest = model.add_continuous("strongest_team_rating", lowest, highest);

        for team in 0..model.num_teams() {
            let rating = model.team_expr(team, |p| players[p].rating);
            model.add_constraint(
                format!("rating_floor_team{}", team),
                ConstraintFamily::RatingSpread,
                rating.clone().with_term(weakest, -1.0),
                Relation::GreaterOrEqual,
                0.0,
            );
            model.add_constraint(
                format!("rating_ceiling_team{}", team),
                ConstraintFamily::RatingSpread,
                rating.with_term(strongest, -1.0),
                Relation::LessOrEqual,
                0.0,
            );
        }

        model.set_objective(
            LinearExpr::new()
                .with_term(strongest, 1.0)
                .with_term(weakest, -1.0),
        );
    }
}

fn indicator(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}
