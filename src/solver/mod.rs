//! Team assignment as a mixed-integer program
//!
//! The [`model`] is plain data built by the [`builder`] from a sorted roster
//! and solved by a pluggable [`backend`]. [`TeamAssignmentSolver`] wraps the
//! whole pipeline.

pub mod assignment;
pub mod backend;
pub mod builder;
pub mod model;
pub mod validation;

// Re-export commonly used types
pub use assignment::{apply_rating_correction, TeamAssignmentSolver};
pub use backend::{BackendOutcome, GoodLpBackend, MilpBackend};
pub use builder::{rating_objective_applies, ModelBuilder};
pub use model::{
    AssignmentModel, ConstraintFamily, LinearConstraint, LinearExpr, ModelVariable, Relation,
    VariableId, VariableKind,
};
pub use validation::{detect_infeasibility, validate_request};
