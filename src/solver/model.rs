//! Solver-agnostic description of the team assignment problem
//!
//! The model is plain data: a list of variables, linear constraints over them
//! and an optional linear objective to minimize. Backends translate it into
//! whatever their engine expects, and tests can inspect it directly.

use crate::error::{MatchdayError, Result};
use serde::{Deserialize, Serialize};

/// Tolerance used when checking a solution against the model
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// Handle of a variable inside an [`AssignmentModel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VariableId(usize);

impl VariableId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Domain of a model variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum VariableKind {
    Binary,
    Continuous { min: f64, max: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelVariable {
    pub name: String,
    pub kind: VariableKind,
}

/// `sum(coefficient * variable) + constant`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearExpr {
    pub terms: Vec<(VariableId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of the given variables, each with coefficient 1
    pub fn sum_of(vars: impl IntoIterator<Item = VariableId>) -> Self {
        Self {
            terms: vars.into_iter().map(|v| (v, 1.0)).collect(),
            constant: 0.0,
        }
    }

    pub fn with_term(mut self, var: VariableId, coefficient: f64) -> Self {
        self.add_term(var, coefficient);
        self
    }

    pub fn add_term(&mut self, var: VariableId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Value of the expression under a full variable assignment
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(var, coefficient)| coefficient * values[var.index()])
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    Equal,
    LessOrEqual,
    GreaterOrEqual,
}

/// Which rule a constraint belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConstraintFamily {
    AssignOnce,
    TeamSize,
    Goalkeeper,
    Coupling,
    Decoupling,
    Tier,
    DefenseBalance,
    OffenseBalance,
    RoleBalance,
    RatingSpread,
}

/// `expr (relation) rhs`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    pub name: String,
    pub family: ConstraintFamily,
    pub expr: LinearExpr,
    pub relation: Relation,
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn is_satisfied(&self, values: &[f64]) -> bool {
        let lhs = self.expr.evaluate(values);
        match self.relation {
            Relation::Equal => (lhs - self.rhs).abs() <= FEASIBILITY_TOLERANCE,
            Relation::LessOrEqual => lhs <= self.rhs + FEASIBILITY_TOLERANCE,
            Relation::GreaterOrEqual => lhs >= self.rhs - FEASIBILITY_TOLERANCE,
        }
    }
}

/// 0/1 assignment model: one binary per (player, team) plus auxiliaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentModel {
    variables: Vec<ModelVariable>,
    /// `assignment[player][team]`
    assignment: Vec<Vec<VariableId>>,
    constraints: Vec<LinearConstraint>,
    objective: Option<LinearExpr>,
}

impl AssignmentModel {
    /// Create a model with the assignment variables and no constraints
    pub fn new(num_players: usize, num_teams: usize) -> Self {
        let mut variables = Vec::with_capacity(num_players * num_teams);
        let assignment = (0..num_players)
            .map(|player| {
                (0..num_teams)
                    .map(|team| {
                        variables.push(ModelVariable {
                            name: format!("x_player{}_team{}", player, team),
                            kind: VariableKind::Binary,
                        });
                        VariableId(variables.len() - 1)
                    })
                    .collect()
            })
            .collect();

        Self {
            variables,
            assignment,
            constraints: Vec::new(),
            objective: None,
        }
    }

    pub fn num_players(&self) -> usize {
        self.assignment.len()
    }

    pub fn num_teams(&self) -> usize {
        self.assignment.first().map_or(0, Vec::len)
    }

    pub fn variables(&self) -> &[ModelVariable] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> Option<&LinearExpr> {
        self.objective.as_ref()
    }

    /// The variable meaning "player is on team"
    pub fn assignment_var(&self, player: usize, team: usize) -> VariableId {
        self.assignment[player][team]
    }

    /// Add a bounded continuous auxiliary variable
    pub fn add_continuous(&mut self, name: impl Into<String>, min: f64, max: f64) -> VariableId {
        self.variables.push(ModelVariable {
            name: name.into(),
            kind: VariableKind::Continuous { min, max },
        });
        VariableId(self.variables.len() - 1)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        family: ConstraintFamily,
        expr: LinearExpr,
        relation: Relation,
        rhs: f64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            family,
            expr,
            relation,
            rhs,
        });
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = Some(objective);
    }

    /// Number of constraints belonging to `family`
    pub fn count_family(&self, family: ConstraintFamily) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.family == family)
            .count()
    }

    /// Sum of `weight(player)` over the players assigned to `team`
    pub fn team_expr(&self, team: usize, weight: impl Fn(usize) -> f64) -> LinearExpr {
        let mut expr = LinearExpr::new();
        for player in 0..self.num_players() {
            let w = weight(player);
            if w != 0.0 {
                expr.add_term(self.assignment_var(player, team), w);
            }
        }
        expr
    }

    /// Names of the constraints violated by `values`
    pub fn violations(&self, values: &[f64]) -> Vec<&str> {
        self.constraints
            .iter()
            .filter(|c| !c.is_satisfied(values))
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Team index of every player under `values`
    pub fn decode(&self, values: &[f64]) -> Result<Vec<usize>> {
        if values.len() != self.variables.len() {
            return Err(MatchdayError::SolverFailure {
                message: format!(
                    "expected {} variable values, got {}",
                    self.variables.len(),
                    values.len()
                ),
            }
            .into());
        }

        self.assignment
            .iter()
            .enumerate()
            .map(|(player, teams)| {
                let chosen: Vec<usize> = teams
                    .iter()
                    .enumerate()
                    .filter(|(_, var)| values[var.index()] > 0.5)
                    .map(|(team, _)| team)
                    .collect();
                match chosen.as_slice() {
                    [team] => Ok(*team),
                    _ => Err(MatchdayError::SolverFailure {
                        message: format!(
                            "player {} assigned to {} teams in the returned solution",
                            player,
                            chosen.len()
                        ),
                    }
                    .into()),
                }
            })
            .collect()
    }
}
