//! Matchdays and team generation
//!
//! A matchday holds the roster, guests and pairing constraints for one date.
//! The [`MatchdayService`] turns a stored matchday into teams.

pub mod import;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use import::{ImportSummary, MatchdayImport};
pub use service::{GenerationOutcome, MatchdayService};
pub use store::{Guest, InMemoryMatchdayStore, Matchday, MatchdayStore};
