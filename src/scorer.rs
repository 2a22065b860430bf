//! Suitability Scorer - range-fit scoring for yield potential and crop ranking
//!
//! Each observed value is scored against a crop's acceptable range with a
//! ratio falloff (1.0 inside, `value / min` below, `max / value` above),
//! then the seven scores are combined with fixed weights into a percentage.
//! The scorer never consults the reference samples, only the profile table.

use crate::error::{AdvisorError, Result};
use crate::features::{CropQuery, Feature, FeatureVector, FEATURE_COUNT};
use crate::profiles::{CropRangeProfile, RangeProfileTable};
use rayon::prelude::*;
use serde::Serialize;

/// Aggregate weights in enumeration order (N, P, K, temperature, humidity, pH, rainfall)
pub const FEATURE_WEIGHTS: FeatureVector = [0.15, 0.15, 0.15, 0.15, 0.10, 0.15, 0.15];

/// Number of lowest-scoring features reported as limiting factors
pub const LIMITING_FACTOR_COUNT: usize = 2;

/// How well `value` fits `[min, max]`, in 0..=1
///
/// Ratio-based and scale-invariant: half the minimum scores 0.5, twice the
/// maximum scores 0.5. A range floor at or below zero cannot be undershot
/// by a ratio, so a value below such a floor scores 0; likewise a
/// non-positive value above the range scores 0.
pub fn parameter_score(value: f64, min: f64, max: f64) -> f64 {
    if value < min {
        if min <= 0.0 {
            return 0.0;
        }
        (value / min).max(0.0)
    } else if value > max {
        if value <= 0.0 {
            return 0.0;
        }
        (max / value).max(0.0)
    } else {
        1.0
    }
}

/// Weighted sum of per-feature scores as a percentage
pub fn aggregate_score(scores: &FeatureVector, weights: &FeatureVector) -> f64 {
    scores
        .iter()
        .zip(weights.iter())
        .map(|(s, w)| s * w)
        .sum::<f64>()
        * 100.0
}

/// Fit of one feature against a crop's range
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterScore {
    pub feature: Feature,
    pub name: &'static str,
    /// 0..=1
    pub fit: f64,
    /// `fit` as a percentage
    pub percent: f64,
}

/// Suitability of one crop for one query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuitabilityResult {
    pub crop: String,
    /// Weighted yield potential, 0..=100
    pub score: f64,
    /// One entry per feature in enumeration order
    pub parameter_scores: Vec<ParameterScore>,
    /// Lowest-scoring features, ascending
    pub limiting_factors: Vec<ParameterScore>,
}

/// Scores queries against a range-profile table
pub struct SuitabilityScorer<'a> {
    profiles: &'a RangeProfileTable,
    weights: FeatureVector,
}

impl<'a> SuitabilityScorer<'a> {
    pub fn new(profiles: &'a RangeProfileTable) -> Self {
        Self {
            profiles,
            weights: FEATURE_WEIGHTS,
        }
    }

    /// Yield potential of `crop` plus its limiting factors
    pub fn yield_potential(&self, crop: &str, query: &CropQuery) -> Result<SuitabilityResult> {
        let profile = self
            .profiles
            .get(crop)
            .ok_or_else(|| AdvisorError::UnknownCrop(crop.to_string()))?;

        Ok(self.score_profile(crop, profile, query))
    }

    /// Every crop in the table scored against the same query, best first
    ///
    /// Ties keep table order.
    pub fn rank_all_crops(&self, query: &CropQuery) -> Vec<SuitabilityResult> {
        let entries: Vec<(&str, &CropRangeProfile)> = self.profiles.iter().collect();

        let mut results: Vec<SuitabilityResult> = entries
            .par_iter()
            .map(|(crop, profile)| self.score_profile(crop, profile, query))
            .collect();

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results
    }

    /// The `limit` best crops from [`rank_all_crops`](Self::rank_all_crops)
    pub fn top_suitable_crops(&self, query: &CropQuery, limit: usize) -> Vec<SuitabilityResult> {
        let mut ranked = self.rank_all_crops(query);
        ranked.truncate(limit);
        ranked
    }

    fn score_profile(&self, crop: &str, profile: &CropRangeProfile, query: &CropQuery) -> SuitabilityResult {
        let values = query.to_vector();

        let mut fits = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            let range = profile.range(feature);
            fits[feature.index()] = parameter_score(values[feature.index()], range.min, range.max);
        }

        let parameter_scores: Vec<ParameterScore> = Feature::ALL
            .iter()
            .map(|&feature| {
                let fit = fits[feature.index()];
                ParameterScore {
                    feature,
                    name: feature.display_name(),
                    fit,
                    percent: fit * 100.0,
                }
            })
            .collect();

        // Stable sort: equal scores stay in enumeration order
        let mut ascending = parameter_scores.clone();
        ascending.sort_by(|a, b| a.fit.total_cmp(&b.fit));
        ascending.truncate(LIMITING_FACTOR_COUNT);

        SuitabilityResult {
            crop: crop.to_string(),
            score: aggregate_score(&fits, &self.weights),
            parameter_scores,
            limiting_factors: ascending,
        }
    }
}
