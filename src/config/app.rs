//! Main application configuration
//!
//! This module defines the primary configuration structures for the matchday
//! balancer, including environment variable loading, TOML files and validation.

use super::{RatingConfig, SolverConfiguration};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub solver: SolverSettings,
    pub teams: SolverConfiguration,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Optimization engine settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Upper bound on a single solve in seconds, 0 disables the limit
    pub time_limit_seconds: u64,
    /// Fixed seed for rating tie-breaking, random when unset
    pub seed: Option<u64>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "matchday-balancer".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(contents).map_err(|e| anyhow!("Invalid configuration: {}", e))?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Solver settings
        if let Ok(limit) = env::var("SOLVER_TIME_LIMIT_SECONDS") {
            self.solver.time_limit_seconds = limit
                .parse()
                .map_err(|_| anyhow!("Invalid SOLVER_TIME_LIMIT_SECONDS value: {}", limit))?;
        }
        if let Ok(seed) = env::var("SOLVER_SEED") {
            self.solver.seed = Some(
                seed.parse()
                    .map_err(|_| anyhow!("Invalid SOLVER_SEED value: {}", seed))?,
            );
        }

        // Team generation settings
        if let Ok(num_teams) = env::var("NUM_TEAMS") {
            self.teams.num_teams = num_teams
                .parse()
                .map_err(|_| anyhow!("Invalid NUM_TEAMS value: {}", num_teams))?;
        }
        if let Ok(flag) = env::var("BALANCE_RATINGS") {
            self.teams.balance_ratings = flag
                .parse()
                .map_err(|_| anyhow!("Invalid BALANCE_RATINGS value: {}", flag))?;
        }
        if let Ok(flag) = env::var("ENFORCE_TIERS") {
            self.teams.enforce_tiers = flag
                .parse()
                .map_err(|_| anyhow!("Invalid ENFORCE_TIERS value: {}", flag))?;
        }
        if let Ok(flag) = env::var("ENFORCE_DEFENSE_BALANCE") {
            self.teams.enforce_defense_balance = flag
                .parse()
                .map_err(|_| anyhow!("Invalid ENFORCE_DEFENSE_BALANCE value: {}", flag))?;
        }
        if let Ok(flag) = env::var("ENFORCE_OFFENSE_BALANCE") {
            self.teams.enforce_offense_balance = flag
                .parse()
                .map_err(|_| anyhow!("Invalid ENFORCE_OFFENSE_BALANCE value: {}", flag))?;
        }
        if let Ok(flag) = env::var("ENFORCE_ROLE_BALANCE") {
            self.teams.enforce_role_balance = flag
                .parse()
                .map_err(|_| anyhow!("Invalid ENFORCE_ROLE_BALANCE value: {}", flag))?;
        }
        if let Ok(threshold) = env::var("DEVIATION_THRESHOLD") {
            self.teams.deviation_threshold = threshold
                .parse()
                .map_err(|_| anyhow!("Invalid DEVIATION_THRESHOLD value: {}", threshold))?;
        }

        Ok(())
    }

    /// Get the solve time limit as Duration, if any
    pub fn solver_time_limit(&self) -> Option<Duration> {
        match self.solver.time_limit_seconds {
            0 => None,
            seconds => Some(Duration::from_secs(seconds)),
        }
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    config.teams.validate()?;

    // Validate rating range
    if !(config.rating.min_score.is_finite() && config.rating.max_score.is_finite()) {
        return Err(anyhow!("Rating score bounds must be finite"));
    }
    if config.rating.min_score > config.rating.max_score {
        return Err(anyhow!(
            "Rating min_score {} exceeds max_score {}",
            config.rating.min_score,
            config.rating.max_score
        ));
    }

    Ok(())
}
