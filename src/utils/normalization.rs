//! Normalization Utilities
//!
//! Z-score normalization of raw feature vectors using per-feature mean and
//! population standard deviation fitted on the reference set. The epsilon
//! guard lives here and nowhere else.

use crate::error::{AdvisorError, Result};
use crate::features::{FeatureVector, FEATURE_COUNT};
use serde::{Deserialize, Serialize};

/// Added to every standard deviation before dividing
pub const STD_EPSILON: f64 = 1e-8;

/// Per-feature mean and standard deviation, fitted once per dataset load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParameters {
    pub mean: FeatureVector,
    pub std: FeatureVector,
}

/// Fitted normalization space shared by the reference matrix and queries
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSpace {
    params: NormalizationParameters,
}

impl FeatureSpace {
    /// Fit mean and population std over `vectors`
    pub fn fit<'a, I>(vectors: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a FeatureVector>,
        I::IntoIter: Clone,
    {
        let iter = vectors.into_iter();

        let mut count = 0usize;
        let mut sum = [0.0; FEATURE_COUNT];
        for v in iter.clone() {
            count += 1;
            for i in 0..FEATURE_COUNT {
                sum[i] += v[i];
            }
        }

        if count == 0 {
            return Err(AdvisorError::InvalidDataset(
                "cannot fit normalization on an empty reference set".to_string(),
            ));
        }

        let n = count as f64;
        let mean = sum.map(|s| s / n);

        let mut sq = [0.0; FEATURE_COUNT];
        for v in iter {
            for i in 0..FEATURE_COUNT {
                let d = v[i] - mean[i];
                sq[i] += d * d;
            }
        }
        let std = sq.map(|s| (s / n).sqrt());

        Ok(Self {
            params: NormalizationParameters { mean, std },
        })
    }

    /// `(v - mean) / (std + ε)`, component-wise
    pub fn normalize(&self, vector: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for i in 0..FEATURE_COUNT {
            out[i] = (vector[i] - self.params.mean[i]) / guarded_std(self.params.std[i]);
        }
        out
    }

    pub fn params(&self) -> &NormalizationParameters {
        &self.params
    }
}

/// Divisor used for a fitted standard deviation
pub fn guarded_std(std: f64) -> f64 {
    std + STD_EPSILON
}
