//! Player directory and peer rating storage
//!
//! This module defines the interface the service uses to look up player roles
//! and the scores submitted by raters, with an in-memory implementation.

use crate::config::RatingConfig;
use crate::error::{MatchdayError, Result};
use crate::types::{PlayerName, RaterId, RatingSample, Role};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::debug;

/// A registered player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: PlayerName,
    pub role: Role,
    pub registered_at: DateTime<Utc>,
}

/// Trait for player and rating storage operations
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Register a new player; fails if the name is taken
    async fn register_player(&self, name: &str, role: Role) -> Result<()>;

    /// Change the role of a registered player
    async fn set_role(&self, name: &str, role: Role) -> Result<()>;

    /// Role of a registered player, `None` if unknown
    async fn player_role(&self, name: &str) -> Result<Option<Role>>;

    /// Remove a player and every score submitted for them
    async fn remove_player(&self, name: &str) -> Result<bool>;

    /// All registered players, ordered by name
    async fn players(&self) -> Result<Vec<PlayerRecord>>;

    /// Store a rater's scores, returning the subset that was accepted.
    /// Unknown players, goalkeepers and out-of-range scores are skipped.
    async fn submit_scores(
        &self,
        rater: &str,
        scores: HashMap<PlayerName, f64>,
    ) -> Result<HashMap<PlayerName, f64>>;

    /// Scores previously submitted by `rater`
    async fn scores_by(&self, rater: &str) -> Result<HashMap<PlayerName, f64>>;

    /// Every rater's score for `name`
    async fn samples_for(&self, name: &str) -> Result<Vec<RatingSample>>;
}

/// In-memory rating storage implementation
#[derive(Debug, Default)]
pub struct InMemoryRatingStore {
    players: RwLock<BTreeMap<PlayerName, PlayerRecord>>,
    rankings: RwLock<BTreeMap<RaterId, HashMap<PlayerName, f64>>>,
    config: RatingConfig,
}

impl InMemoryRatingStore {
    /// Create a new in-memory store accepting scores within `config`'s range
    pub fn new(config: RatingConfig) -> Self {
        Self {
            players: RwLock::new(BTreeMap::new()),
            rankings: RwLock::new(BTreeMap::new()),
            config,
        }
    }
}

#[async_trait]
impl RatingStore for InMemoryRatingStore {
    async fn register_player(&self, name: &str, role: Role) -> Result<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(MatchdayError::InvalidRoster {
                reason: "player name cannot be empty".to_string(),
            }
            .into());
        }

        let mut players = self.players.write().await;
        if players.contains_key(name) {
            return Err(MatchdayError::InvalidRoster {
                reason: format!("player '{}' is already registered", name),
            }
            .into());
        }

        players.insert(
            name.to_string(),
            PlayerRecord {
                name: name.to_string(),
                role,
                registered_at: crate::utils::current_timestamp(),
            },
        );
        debug!("Registered player '{}' as {}", name, role);
        Ok(())
    }

    async fn set_role(&self, name: &str, role: Role) -> Result<()> {
        let mut players = self.players.write().await;
        let record = players
            .get_mut(name)
            .ok_or_else(|| MatchdayError::PlayerNotFound {
                name: name.to_string(),
            })?;
        record.role = role;
        Ok(())
    }

    async fn player_role(&self, name: &str) -> Result<Option<Role>> {
        let players = self.players.read().await;
        Ok(players.get(name).map(|record| record.role))
    }

    async fn remove_player(&self, name: &str) -> Result<bool> {
        let removed = self.players.write().await.remove(name).is_some();
        if removed {
            let mut rankings = self.rankings.write().await;
            for scores in rankings.values_mut() {
                scores.remove(name);
            }
        }
        Ok(removed)
    }

    async fn players(&self) -> Result<Vec<PlayerRecord>> {
        let players = self.players.read().await;
        Ok(players.values().cloned().collect())
    }

    async fn submit_scores(
        &self,
        rater: &str,
        scores: HashMap<PlayerName, f64>,
    ) -> Result<HashMap<PlayerName, f64>> {
        let players = self.players.read().await;

        let accepted: HashMap<PlayerName, f64> = scores
            .into_iter()
            .filter_map(|(name, score)| {
                let name = name.trim().to_string();
                let record = players.get(&name)?;
                if record.role.is_goalkeeper() || !self.config.accepts(score) {
                    return None;
                }
                Some((name, score))
            })
            .collect();
        drop(players);

        let mut rankings = self.rankings.write().await;
        rankings
            .entry(rater.to_string())
            .or_default()
            .extend(accepted.iter().map(|(name, score)| (name.clone(), *score)));

        debug!(
            "Rater '{}' submitted {} accepted scores",
            rater,
            accepted.len()
        );
        Ok(accepted)
    }

    async fn scores_by(&self, rater: &str) -> Result<HashMap<PlayerName, f64>> {
        let rankings = self.rankings.read().await;
        Ok(rankings.get(rater).cloned().unwrap_or_default())
    }

    async fn samples_for(&self, name: &str) -> Result<Vec<RatingSample>> {
        let rankings = self.rankings.read().await;
        Ok(rankings
            .iter()
            .filter_map(|(rater, scores)| {
                scores
                    .get(name)
                    .map(|score| RatingSample::new(rater.clone(), *score))
            })
            .collect())
    }
}
