//! Matchday team generation service
//!
//! Resolves a matchday roster to rated players, runs the solver off the async
//! executor and stores the generated teams.

use crate::config::SolverConfiguration;
use crate::error::{MatchdayError, Result};
use crate::matchday::store::{Matchday, MatchdayStore};
use crate::metrics::MetricsCollector;
use crate::rating::{OutlierFilteringAggregator, RatingAggregator, RatingStore};
use crate::solver::TeamAssignmentSolver;
use crate::types::{Player, RequestId, SolveOutcome};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of one team generation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutcome {
    pub request_id: RequestId,
    pub date: NaiveDate,
    pub outcome: SolveOutcome,
    pub generated_at: DateTime<Utc>,
}

/// Generates teams for stored matchdays
#[derive(Clone)]
pub struct MatchdayService {
    ratings: Arc<dyn RatingStore>,
    matchdays: Arc<dyn MatchdayStore>,
    aggregator: Arc<dyn RatingAggregator>,
    solver: TeamAssignmentSolver,
    config: SolverConfiguration,
    metrics: Option<Arc<MetricsCollector>>,
}

impl MatchdayService {
    pub fn new(
        ratings: Arc<dyn RatingStore>,
        matchdays: Arc<dyn MatchdayStore>,
        solver: TeamAssignmentSolver,
        config: SolverConfiguration,
    ) -> Self {
        let aggregator = Arc::new(OutlierFilteringAggregator::new(config.deviation_threshold));
        Self {
            ratings,
            matchdays,
            aggregator,
            solver,
            config,
            metrics: None,
        }
    }

    pub fn with_aggregator(mut self, aggregator: Arc<dyn RatingAggregator>) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &SolverConfiguration {
        &self.config
    }

    /// Rated player for a registered name
    pub async fn player_rating(&self, name: &str) -> Result<Player> {
        let role = self
            .ratings
            .player_role(name)
            .await?
            .ok_or_else(|| MatchdayError::PlayerNotFound {
                name: name.to_string(),
            })?;

        let samples = self.ratings.samples_for(name).await?;
        let started = std::time::Instant::now();
        let aggregated = self.aggregator.aggregate(role, &samples);
        if let Some(metrics) = &self.metrics {
            metrics.record_aggregation(&aggregated, started.elapsed());
        }

        if aggregated.samples_discarded > 0 {
            debug!(
                "Discarded {} of {} scores for '{}'",
                aggregated.samples_discarded,
                samples.len(),
                name
            );
        }
        Ok(Player::new(name, role, aggregated.rating))
    }

    /// Every roster member with role and rating. Guests use their fixed
    /// rating, everyone else is aggregated from peer scores.
    pub async fn roster_ratings(&self, date: NaiveDate) -> Result<Vec<Player>> {
        let matchday = self.load_matchday(date).await?;
        self.rate_roster(&matchday).await
    }

    async fn load_matchday(&self, date: NaiveDate) -> Result<Matchday> {
        self.matchdays
            .get_matchday(date)
            .await?
            .ok_or_else(|| {
                MatchdayError::MatchdayNotFound {
                    date: date.to_string(),
                }
                .into()
            })
    }

    async fn rate_roster(&self, matchday: &Matchday) -> Result<Vec<Player>> {
        let mut players = Vec::with_capacity(matchday.roster.len());
        for name in &matchday.roster {
            let player = match matchday.guest(name) {
                Some(guest) => guest.to_player(),
                None => self.player_rating(name).await?,
            };
            players.push(player);
        }
        Ok(players)
    }

    /// Generate and store teams for the matchday on `date`
    pub async fn generate_teams(&self, date: NaiveDate) -> Result<GenerationOutcome> {
        self.run(date, true).await
    }

    /// Generate teams without storing them
    pub async fn preview_teams(&self, date: NaiveDate) -> Result<GenerationOutcome> {
        self.run(date, false).await
    }

    async fn run(&self, date: NaiveDate, persist: bool) -> Result<GenerationOutcome> {
        let request_id = crate::utils::generate_request_id();

        // Roster, constraints and revision all come from this one snapshot
        let matchday = self.load_matchday(date).await?;
        let roster = self.rate_roster(&matchday).await?;
        let revision = matchday.revision;

        info!(
            request_id = %request_id,
            %date,
            revision,
            num_teams = self.config.num_teams,
            roster_size = roster.len(),
            "Generating teams"
        );

        let solver = self.solver.clone();
        let config = self.config.clone();
        let couplings = matchday.couplings;
        let decouplings = matchday.decouplings;
        let roster_size = roster.len();
        let started = std::time::Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            solver.solve(&roster, &config, &couplings, &decouplings)
        })
        .await
        .map_err(|e| MatchdayError::InternalError {
            message: format!("solver task failed: {}", e),
        })?;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    request_id = %request_id,
                    %date,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Team generation failed: {}",
                    e
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_solve_error(&e);
                }
                return Err(e);
            }
        };

        let elapsed = started.elapsed();
        if let Some(metrics) = &self.metrics {
            metrics.record_solve(&outcome, roster_size, elapsed);
        }
        let elapsed_ms = elapsed.as_millis() as u64;

        match &outcome {
            SolveOutcome::Assigned(assignment) => {
                info!(
                    request_id = %request_id,
                    %date,
                    elapsed_ms,
                    spread = assignment.rating_spread(),
                    "Teams generated"
                );
                if persist
                    && !self
                        .matchdays
                        .store_teams(date, revision, assignment.clone())
                        .await?
                {
                    warn!(
                        request_id = %request_id,
                        %date,
                        revision,
                        "Matchday changed while solving, teams not stored"
                    );
                }
            }
            SolveOutcome::Infeasible(cause) => {
                warn!(
                    request_id = %request_id,
                    %date,
                    elapsed_ms,
                    "No teams for matchday: {}",
                    cause
                );
            }
        }

        Ok(GenerationOutcome {
            request_id,
            date,
            outcome,
            generated_at: crate::utils::current_timestamp(),
        })
    }
}
