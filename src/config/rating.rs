//! Peer rating configuration

use serde::{Deserialize, Serialize};

/// Accepted range for submitted peer scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub min_score: f64,
    pub max_score: f64,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            min_score: 1.0,
            max_score: 10.0,
        }
    }
}

impl RatingConfig {
    pub fn accepts(&self, score: f64) -> bool {
        score.is_finite() && score >= self.min_score && score <= self.max_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_range() {
        let config = RatingConfig::default();
        assert!(config.accepts(1.0));
        assert!(config.accepts(10.0));
        assert!(config.accepts(6.5));
        assert!(!config.accepts(0.5));
        assert!(!config.accepts(11.0));
        assert!(!config.accepts(f64::NAN));
    }
}
