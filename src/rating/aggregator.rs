//! Peer rating aggregation
//!
//! Turns the scores submitted for one player into a single skill value. When
//! enough samples exist, scores further than the deviation threshold from the
//! mean (in standard deviations) are discarded as troll scores, unless that
//! would throw away too much of the data.

use crate::rating::statistics::SampleStats;
use crate::types::{RatingSample, Role};
use serde::{Deserialize, Serialize};

/// Below this many samples no outlier filtering takes place
pub const MIN_SAMPLES_FOR_FILTERING: usize = 5;

/// Detailed result of aggregating one player's samples
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRating {
    pub rating: f64,
    /// Samples that contributed to `rating`
    pub samples_used: usize,
    /// Samples dropped as outliers
    pub samples_discarded: usize,
}

impl AggregatedRating {
    fn unrated() -> Self {
        Self {
            rating: 0.0,
            samples_used: 0,
            samples_discarded: 0,
        }
    }
}

/// Trait for turning peer scores into one rating
pub trait RatingAggregator: Send + Sync {
    /// Aggregate the samples submitted for a player with the given role
    fn aggregate(&self, role: Role, samples: &[RatingSample]) -> AggregatedRating;

    /// Aggregate and return only the rating value
    fn rating(&self, role: Role, samples: &[RatingSample]) -> f64 {
        self.aggregate(role, samples).rating
    }
}

/// Mean of the samples after z-score based outlier removal
#[derive(Debug, Clone)]
pub struct OutlierFilteringAggregator {
    deviation_threshold: f64,
}

impl OutlierFilteringAggregator {
    pub fn new(deviation_threshold: f64) -> Self {
        Self {
            deviation_threshold,
        }
    }
}

impl Default for OutlierFilteringAggregator {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl RatingAggregator for OutlierFilteringAggregator {
    fn aggregate(&self, role: Role, samples: &[RatingSample]) -> AggregatedRating {
        // Goalkeepers are rated 0 even if they were peer rated before a role change
        if role.is_goalkeeper() || samples.is_empty() {
            return AggregatedRating::unrated();
        }

        let scores: Vec<f64> = samples.iter().map(|s| s.score).collect();
        let stats = SampleStats::from_scores(&scores);

        if scores.len() < MIN_SAMPLES_FOR_FILTERING || !stats.has_spread() {
            return AggregatedRating {
                rating: stats.mean,
                samples_used: scores.len(),
                samples_discarded: 0,
            };
        }

        let kept: Vec<f64> = scores
            .iter()
            .copied()
            .filter(|score| stats.z_score(*score) <= self.deviation_threshold)
            .collect();

        let min_kept = std::cmp::max(2, scores.len() / 2);
        if kept.len() < min_kept {
            return AggregatedRating {
                rating: stats.mean,
                samples_used: scores.len(),
                samples_discarded: 0,
            };
        }

        AggregatedRating {
            rating: crate::utils::mean(&kept),
            samples_used: kept.len(),
            samples_discarded: scores.len() - kept.len(),
        }
    }
}

/// Aggregate `samples` for a player with `role` using `deviation_threshold`
pub fn aggregate(role: Role, samples: &[RatingSample], deviation_threshold: f64) -> f64 {
    OutlierFilteringAggregator::new(deviation_threshold).rating(role, samples)
}
