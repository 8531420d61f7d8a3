//! Matchday storage
//!
//! A matchday is one game date with its roster, the coupling and decoupling
//! groups requested for it, guest players and, once generated, the teams.

use crate::error::{MatchdayError, Result};
use crate::types::{
    CouplingConstraint, DecouplingConstraint, Player, PlayerName, Role, TeamAssignment,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// A one-off player with a fixed rating instead of peer scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub name: PlayerName,
    pub role: Role,
    pub rating: f64,
}

impl Guest {
    /// Goalkeeper guests always carry rating 0
    pub fn new(name: impl Into<PlayerName>, role: Role, rating: f64) -> Self {
        let rating = if role.is_goalkeeper() { 0.0 } else { rating };
        Self {
            name: name.into(),
            role,
            rating,
        }
    }

    pub fn to_player(&self) -> Player {
        Player::new(self.name.clone(), self.role, self.rating)
    }
}

/// One game date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchday {
    pub date: NaiveDate,
    pub location: Option<String>,
    pub kickoff: Option<NaiveTime>,
    pub roster: Vec<PlayerName>,
    pub couplings: Vec<CouplingConstraint>,
    pub decouplings: Vec<DecouplingConstraint>,
    pub guests: Vec<Guest>,
    /// Last generated teams, cleared whenever the roster or constraints change
    pub teams: Option<TeamAssignment>,
    /// Bumped on every roster or constraint change
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl Matchday {
    pub fn new<I, S>(date: NaiveDate, roster: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<PlayerName>,
    {
        Self {
            date,
            location: None,
            kickoff: None,
            roster: roster.into_iter().map(Into::into).collect(),
            couplings: Vec::new(),
            decouplings: Vec::new(),
            guests: Vec::new(),
            teams: None,
            revision: 0,
            created_at: crate::utils::current_timestamp(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_kickoff(mut self, kickoff: NaiveTime) -> Self {
        self.kickoff = Some(kickoff);
        self
    }

    pub fn guest(&self, name: &str) -> Option<&Guest> {
        self.guests.iter().find(|g| g.name == name)
    }

    pub fn in_roster(&self, name: &str) -> bool {
        self.roster.iter().any(|n| n == name)
    }

    /// Record a change to the solver inputs. Generated teams no longer apply.
    fn touch(&mut self) {
        self.revision += 1;
        self.teams = None;
    }

    /// Keep every constraint group consistent with the current roster
    fn normalize_constraints(&mut self) {
        let roster: HashSet<&str> = self.roster.iter().map(String::as_str).collect();
        let couplings = normalize_groups(
            self.couplings.iter().map(|c| c.players.as_slice()),
            &roster,
        );
        let decouplings = normalize_groups(
            self.decouplings.iter().map(|d| d.players.as_slice()),
            &roster,
        );
        self.couplings = couplings.into_iter().map(CouplingConstraint::new).collect();
        self.decouplings = decouplings
            .into_iter()
            .map(DecouplingConstraint::new)
            .collect();
    }
}

/// Drop duplicate and off-roster names, then groups left with fewer than two
fn normalize_groups<'a>(
    groups: impl Iterator<Item = &'a [PlayerName]>,
    roster: &HashSet<&str>,
) -> Vec<Vec<PlayerName>> {
    groups
        .filter_map(|group| {
            let mut kept: Vec<PlayerName> = Vec::with_capacity(group.len());
            for name in group {
                if roster.contains(name.as_str()) && !kept.contains(name) {
                    kept.push(name.clone());
                }
            }
            (kept.len() >= 2).then_some(kept)
        })
        .collect()
}

/// Trait for matchday storage operations
#[async_trait]
pub trait MatchdayStore: Send + Sync {
    /// Store a new matchday. With `overwrite` an existing one on the same
    /// date is replaced, otherwise that is an error.
    async fn create_matchday(&self, matchday: Matchday, overwrite: bool) -> Result<()>;

    async fn get_matchday(&self, date: NaiveDate) -> Result<Option<Matchday>>;

    async fn delete_matchday(&self, date: NaiveDate) -> Result<bool>;

    /// Append constraint groups, or replace all existing ones when `replace`
    async fn add_constraints(
        &self,
        date: NaiveDate,
        couplings: Vec<CouplingConstraint>,
        decouplings: Vec<DecouplingConstraint>,
        replace: bool,
    ) -> Result<()>;

    /// Add a guest or update the one with the same name
    async fn upsert_guest(&self, date: NaiveDate, guest: Guest) -> Result<()>;

    /// Remove a guest and take them off the roster
    async fn remove_guest(&self, date: NaiveDate, name: &str) -> Result<bool>;

    /// Swap a roster member for someone not yet on it. Constraints follow the
    /// rename and previously generated teams are discarded.
    async fn replace_player(
        &self,
        date: NaiveDate,
        current: &str,
        replacement: &str,
        replacement_guest: Option<Guest>,
    ) -> Result<()>;

    /// Store teams generated from the matchday at `revision`. Returns false,
    /// storing nothing, when the matchday changed since that revision.
    async fn store_teams(
        &self,
        date: NaiveDate,
        revision: u64,
        teams: TeamAssignment,
    ) -> Result<bool>;
}

/// In-memory matchday storage implementation
#[derive(Debug, Default)]
pub struct InMemoryMatchdayStore {
    matchdays: RwLock<BTreeMap<NaiveDate, Matchday>>,
}

impl InMemoryMatchdayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matchdays
    pub async fn len(&self) -> usize {
        self.matchdays.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.matchdays.read().await.is_empty()
    }
}

fn not_found(date: NaiveDate) -> MatchdayError {
    MatchdayError::MatchdayNotFound {
        date: date.to_string(),
    }
}

#[async_trait]
impl MatchdayStore for InMemoryMatchdayStore {
    async fn create_matchday(&self, mut matchday: Matchday, overwrite: bool) -> Result<()> {
        {
            let mut seen = HashSet::new();
            for name in &matchday.roster {
                if name.trim().is_empty() || !seen.insert(name.as_str()) {
                    return Err(MatchdayError::InvalidRoster {
                        reason: format!("roster entry '{}' is empty or repeated", name),
                    }
                    .into());
                }
            }
        }
        for guest in &matchday.guests {
            if !matchday.in_roster(&guest.name) {
                return Err(MatchdayError::InvalidRoster {
                    reason: format!("guest '{}' is not on the roster", guest.name),
                }
                .into());
            }
        }
        matchday.normalize_constraints();

        let mut matchdays = self.matchdays.write().await;
        if let Some(existing) = matchdays.get(&matchday.date) {
            if !overwrite {
                return Err(MatchdayError::MatchdayExists {
                    date: matchday.date.to_string(),
                }
                .into());
            }
            matchday.revision = existing.revision + 1;
        }

        info!(
            "Stored matchday {} with {} players",
            matchday.date,
            matchday.roster.len()
        );
        matchdays.insert(matchday.date, matchday);
        Ok(())
    }

    async fn get_matchday(&self, date: NaiveDate) -> Result<Option<Matchday>> {
        Ok(self.matchdays.read().await.get(&date).cloned())
    }

    async fn delete_matchday(&self, date: NaiveDate) -> Result<bool> {
        Ok(self.matchdays.write().await.remove(&date).is_some())
    }

    async fn add_constraints(
        &self,
        date: NaiveDate,
        couplings: Vec<CouplingConstraint>,
        decouplings: Vec<DecouplingConstraint>,
        replace: bool,
    ) -> Result<()> {
        let mut matchdays = self.matchdays.write().await;
        let matchday = matchdays.get_mut(&date).ok_or_else(|| not_found(date))?;

        let unknown = couplings
            .iter()
            .flat_map(|c| c.players.iter())
            .chain(decouplings.iter().flat_map(|d| d.players.iter()))
            .find(|name| !matchday.in_roster(name));
        if let Some(name) = unknown {
            return Err(MatchdayError::UnknownPlayer { name: name.clone() }.into());
        }

        if replace {
            matchday.couplings.clear();
            matchday.decouplings.clear();
        }
        matchday.couplings.extend(couplings);
        matchday.decouplings.extend(decouplings);
        matchday.normalize_constraints();
        matchday.touch();

        debug!(
            "Matchday {} now has {} couplings and {} decouplings",
            date,
            matchday.couplings.len(),
            matchday.decouplings.len()
        );
        Ok(())
    }

    async fn upsert_guest(&self, date: NaiveDate, guest: Guest) -> Result<()> {
        let mut matchdays = self.matchdays.write().await;
        let matchday = matchdays.get_mut(&date).ok_or_else(|| not_found(date))?;

        let guest = Guest::new(guest.name, guest.role, guest.rating);
        matchday.guests.retain(|g| g.name != guest.name);
        if !matchday.in_roster(&guest.name) {
            matchday.roster.push(guest.name.clone());
        }
        debug!("Guest '{}' added to matchday {}", guest.name, date);
        matchday.guests.push(guest);
        matchday.touch();
        Ok(())
    }

    async fn remove_guest(&self, date: NaiveDate, name: &str) -> Result<bool> {
        let mut matchdays = self.matchdays.write().await;
        let matchday = matchdays.get_mut(&date).ok_or_else(|| not_found(date))?;

        let before = matchday.guests.len();
        matchday.guests.retain(|g| g.name != name);
        if matchday.guests.len() == before {
            return Ok(false);
        }

        matchday.roster.retain(|n| n != name);
        matchday.normalize_constraints();
        matchday.touch();
        Ok(true)
    }

    async fn replace_player(
        &self,
        date: NaiveDate,
        current: &str,
        replacement: &str,
        replacement_guest: Option<Guest>,
    ) -> Result<()> {
        let mut matchdays = self.matchdays.write().await;
        let matchday = matchdays.get_mut(&date).ok_or_else(|| not_found(date))?;

        if !matchday.in_roster(current) {
            return Err(MatchdayError::PlayerNotFound {
                name: current.to_string(),
            }
            .into());
        }
        if matchday.in_roster(replacement) {
            return Err(MatchdayError::InvalidRoster {
                reason: format!("'{}' is already on the roster", replacement),
            }
            .into());
        }

        let rename = |name: &mut PlayerName| {
            if name.as_str() == current {
                *name = replacement.to_string();
            }
        };
        matchday.roster.iter_mut().for_each(rename);
        matchday
            .couplings
            .iter_mut()
            .flat_map(|c| c.players.iter_mut())
            .for_each(rename);
        matchday
            .decouplings
            .iter_mut()
            .flat_map(|d| d.players.iter_mut())
            .for_each(rename);

        matchday
            .guests
            .retain(|g| g.name != current && g.name != replacement);
        if let Some(guest) = replacement_guest {
            matchday
                .guests
                .push(Guest::new(replacement, guest.role, guest.rating));
        }

        matchday.normalize_constraints();
        matchday.touch();

        info!(
            "Replaced '{}' with '{}' on matchday {}",
            current, replacement, date
        );
        Ok(())
    }

    async fn store_teams(
        &self,
        date: NaiveDate,
        revision: u64,
        teams: TeamAssignment,
    ) -> Result<bool> {
        let mut matchdays = self.matchdays.write().await;
        let matchday = matchdays.get_mut(&date).ok_or_else(|| not_found(date))?;
        if matchday.revision != revision {
            debug!(
                "Discarding teams for matchday {}: generated at revision {}, now {}",
                date, revision, matchday.revision
            );
            return Ok(false);
        }
        matchday.teams = Some(teams);
        Ok(true)
    }
}
