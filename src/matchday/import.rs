//! TOML import of players, peer scores and a matchday
//!
//! ```toml
//! [[players]]
//! name = "Avi"
//! role = "ATT"
//!
//! [[raters]]
//! id = "coach"
//! scores = { Avi = 7.5 }
//!
//! [matchday]
//! date = "2024-05-03"
//! roster = ["Avi"]
//! ```

use crate::error::{MatchdayError, Result};
use crate::matchday::store::{Guest, Matchday, MatchdayStore};
use crate::rating::RatingStore;
use crate::types::{CouplingConstraint, DecouplingConstraint, PlayerName, RaterId, Role};
use anyhow::Context;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerEntry {
    pub name: PlayerName,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RaterEntry {
    pub id: RaterId,
    #[serde(default)]
    pub scores: HashMap<PlayerName, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchdayEntry {
    pub date: NaiveDate,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub kickoff: Option<NaiveTime>,
    pub roster: Vec<PlayerName>,
    #[serde(default)]
    pub couplings: Vec<CouplingConstraint>,
    #[serde(default)]
    pub decouplings: Vec<DecouplingConstraint>,
    #[serde(default)]
    pub guests: Vec<Guest>,
}

/// Everything needed to generate teams for one matchday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchdayImport {
    #[serde(default)]
    pub players: Vec<PlayerEntry>,
    #[serde(default)]
    pub raters: Vec<RaterEntry>,
    pub matchday: MatchdayEntry,
}

/// Counts of what an import stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub players: usize,
    pub scores_accepted: usize,
    pub scores_rejected: usize,
}

impl MatchdayImport {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| {
            MatchdayError::ConfigurationError {
                message: format!("invalid matchday import: {}", e),
            }
            .into()
        })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read matchday file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse matchday file {}", path.display()))
    }

    /// Build the stored form of the matchday section
    pub fn to_matchday(&self) -> Matchday {
        let entry = &self.matchday;
        let mut roster = entry.roster.clone();
        for guest in &entry.guests {
            if !roster.contains(&guest.name) {
                roster.push(guest.name.clone());
            }
        }

        let mut matchday = Matchday::new(entry.date, roster);
        matchday.location = entry.location.clone();
        matchday.kickoff = entry.kickoff;
        matchday.couplings = entry.couplings.clone();
        matchday.decouplings = entry.decouplings.clone();
        matchday.guests = entry
            .guests
            .iter()
            .map(|g| Guest::new(g.name.clone(), g.role, g.rating))
            .collect();
        matchday
    }

    /// Register players, submit scores and store the matchday, replacing one
    /// already stored on the same date
    pub async fn load_into(
        &self,
        ratings: &dyn RatingStore,
        matchdays: &dyn MatchdayStore,
    ) -> Result<ImportSummary> {
        let mut summary = ImportSummary::default();

        for player in &self.players {
            match ratings.player_role(&player.name).await? {
                Some(_) => ratings.set_role(&player.name, player.role).await?,
                None => ratings.register_player(&player.name, player.role).await?,
            }
            summary.players += 1;
        }

        for rater in &self.raters {
            let accepted = ratings
                .submit_scores(&rater.id, rater.scores.clone())
                .await?;
            let rejected = rater.scores.len() - accepted.len();
            if rejected > 0 {
                warn!(
                    "Ignored {} scores from rater '{}' (unknown player, goalkeeper or out of range)",
                    rejected, rater.id
                );
            }
            summary.scores_accepted += accepted.len();
            summary.scores_rejected += rejected;
        }

        matchdays.create_matchday(self.to_matchday(), true).await?;

        info!(
            "Imported {} players, {} scores and matchday {}",
            summary.players, summary.scores_accepted, self.matchday.date
        );
        Ok(summary)
    }
}
