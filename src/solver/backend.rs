//! Optimization engines that solve an [`AssignmentModel`]

use crate::error::{MatchdayError, Result};
use crate::solver::model::{AssignmentModel, LinearExpr, Relation, VariableKind};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable, WithTimeLimit,
};
use std::time::Duration;
use tracing::{debug, warn};

/// What an engine concluded about a model
#[derive(Debug, Clone, PartialEq)]
pub enum BackendOutcome {
    /// Values of all model variables, indexed like `model.variables()`
    Solved(Vec<f64>),
    /// The engine proved no assignment satisfies the constraints
    Infeasible,
}

/// Trait for MILP engines
#[cfg_attr(test, mockall::automock)]
pub trait MilpBackend: Send + Sync {
    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Solve `model`. Infeasibility is an outcome; errors mean the engine
    /// could not reach a conclusion.
    fn solve(&self, model: &AssignmentModel) -> Result<BackendOutcome>;
}

/// `good_lp` backed engine using the pure-Rust microlp solver
#[derive(Debug, Clone, Default)]
pub struct GoodLpBackend {
    time_limit: Option<Duration>,
}

impl GoodLpBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give up with [`MatchdayError::SolverTimedOut`] after `limit`
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl MilpBackend for GoodLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, model: &AssignmentModel) -> Result<BackendOutcome> {
        solve_with_microlp(model, self.time_limit)
    }
}

/// Map an engine error to an outcome or a crate error. microlp reports a
/// time limit hit before any feasible point as `Other`.
fn resolution_error(err: ResolutionError, limit: Option<Duration>) -> Result<BackendOutcome> {
    match (err, limit) {
        (ResolutionError::Infeasible, _) => Ok(BackendOutcome::Infeasible),
        (ResolutionError::Other(_), Some(limit)) => {
            warn!("Solver exceeded time limit of {:?}", limit);
            Err(MatchdayError::SolverTimedOut { limit }.into())
        }
        (err, _) => Err(MatchdayError::SolverFailure {
            message: err.to_string(),
        }
        .into()),
    }
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::from_other_affine(expr.constant);
    for (var, coefficient) in &expr.terms {
        out.add_mul(*coefficient, vars[var.index()]);
    }
    out
}

fn solve_with_microlp(model: &AssignmentModel, limit: Option<Duration>) -> Result<BackendOutcome> {
    let mut problem = ProblemVariables::new();
    let vars: Vec<Variable> = model
        .variables()
        .iter()
        .map(|v| match v.kind {
            VariableKind::Binary => problem.add(variable().binary()),
            VariableKind::Continuous { min, max } => problem.add(variable().min(min).max(max)),
        })
        .collect();

    let objective = model
        .objective()
        .map(|expr| to_expression(expr, &vars))
        .unwrap_or_else(|| to_expression(&LinearExpr::new(), &vars));

    let mut lp = problem
        .minimise(objective)
        .using(good_lp::solvers::microlp::microlp);
    if let Some(limit) = limit {
        lp = lp.with_time_limit(limit.as_secs_f64());
    }

    for c in model.constraints() {
        let lhs = to_expression(&c.expr, &vars);
        let rhs = c.rhs;
        let built = match c.relation {
            Relation::Equal => constraint!(lhs == rhs),
            Relation::LessOrEqual => constraint!(lhs <= rhs),
            Relation::GreaterOrEqual => constraint!(lhs >= rhs),
        };
        lp.add_constraint(built);
    }

    debug!(
        "Solving model with {} variables and {} constraints",
        vars.len(),
        model.constraints().len()
    );

    match lp.solve() {
        Ok(solution) => {
            // A limit hit after a feasible point still satisfies every hard rule
            if matches!(solution.status(), SolutionStatus::TimeLimit) {
                warn!("Solver stopped at its time limit, using best assignment found");
            }
            Ok(BackendOutcome::Solved(
                vars.iter().map(|v| solution.value(*v)).collect(),
            ))
        }
        Err(e) => resolution_error(e, limit),
    }
}
