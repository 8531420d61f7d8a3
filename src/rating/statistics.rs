//! Descriptive statistics over peer rating samples

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of a set of scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleStats {
    /// Number of samples the statistics were computed from
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation (N denominator)
    pub std_dev: f64,
}

impl SampleStats {
    /// Compute statistics for `scores`; all zeros for an empty slice
    pub fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                count: 0,
                mean: 0.0,
                std_dev: 0.0,
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Self {
            count: scores.len(),
            mean,
            std_dev: variance.sqrt(),
        }
    }

    /// Absolute distance of `score` from the mean in standard deviations.
    /// Returns 0 when the samples have no spread.
    pub fn z_score(&self, score: f64) -> f64 {
        if self.std_dev == 0.0 {
            return 0.0;
        }
        ((score - self.mean) / self.std_dev).abs()
    }

    pub fn has_spread(&self) -> bool {
        self.std_dev > 0.0
    }
}
