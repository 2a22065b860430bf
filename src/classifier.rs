//! Nearest-Neighbour Crop Classifier
//!
//! Labels an unseen observation by majority vote among the `k` closest
//! reference samples in normalized feature space.
//!
//! Algorithm:
//! 1. Normalize the query with the fitted [`FeatureSpace`]
//! 2. Euclidean distance to every reference vector (linear scan)
//! 3. Stable sort by distance, so equal distances keep dataset order
//! 4. Majority vote over the first `k`; a tie goes to the label met first
//!    when walking neighbours nearest-first
//! 5. Confidence = votes / neighbours × 100, zero for every other known crop
//!
//! O(n × 7) per prediction. Fine for hundreds to low thousands of samples.

use crate::data::ReferenceDataset;
use crate::error::{AdvisorError, Result};
use crate::features::{CropQuery, FeatureVector};
use crate::utils::normalization::FeatureSpace;
use rayon::prelude::*;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use tracing::debug;

/// Neighbours consulted per prediction unless configured otherwise
pub const DEFAULT_K: usize = 5;

/// k-nearest-neighbour classifier over a fitted reference matrix
#[derive(Debug, Clone)]
pub struct CropClassifier {
    space: FeatureSpace,
    /// Normalized reference vectors, one row per sample
    matrix: Vec<FeatureVector>,
    /// Index into `labels` for each row of `matrix`
    label_ids: Vec<usize>,
    labels: Vec<String>,
    k: usize,
}

/// One neighbour that took part in the vote
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub crop: String,
    pub distance: f64,
}

/// Confidence percentage per known crop, in known-crop order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfidenceMap(Vec<(String, f64)>);

impl ConfidenceMap {
    pub fn get(&self, crop: &str) -> Option<f64> {
        self.0.iter().find(|(c, _)| c == crop).map(|(_, v)| *v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(c, v)| (c.as_str(), *v))
    }

    pub fn crops(&self) -> Vec<&str> {
        self.0.iter().map(|(c, _)| c.as_str()).collect()
    }

    /// Sum over crops that received at least one vote
    pub fn voted_total(&self) -> f64 {
        self.0.iter().map(|(_, v)| *v).filter(|v| *v > 0.0).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn set(&mut self, crop: &str, value: f64) {
        match self.0.iter_mut().find(|(c, _)| c == crop) {
            Some(entry) => entry.1 = value,
            None => self.0.push((crop.to_string(), value)),
        }
    }
}

impl Serialize for ConfidenceMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (crop, value) in &self.0 {
            map.serialize_entry(crop, value)?;
        }
        map.end()
    }
}

/// Recommended crop plus the evidence behind it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub crop: String,
    pub confidence: ConfidenceMap,
    /// Neighbours nearest-first
    pub neighbors: Vec<Neighbor>,
}

impl CropClassifier {
    /// Fit the feature space and build the normalized neighbour table
    pub fn fit(dataset: &ReferenceDataset, k: usize) -> Result<Self> {
        if k == 0 {
            return Err(AdvisorError::InvalidInput(
                "k must be at least 1".to_string(),
            ));
        }

        let space = FeatureSpace::fit(dataset.samples().iter().map(|s| s.features()))?;

        let mut matrix = Vec::with_capacity(dataset.len());
        let mut label_ids = Vec::with_capacity(dataset.len());
        for sample in dataset.samples() {
            matrix.push(space.normalize(sample.features()));
            // from_samples registers every sample's label
            label_ids.push(dataset.label_position(sample.label()).unwrap_or_default());
        }

        Ok(Self {
            space,
            matrix,
            label_ids,
            labels: dataset.labels().to_vec(),
            k,
        })
    }

    /// Predict the crop for `query`
    ///
    /// `known_crops` fixes the keys of the confidence map: every known crop
    /// without a vote gets 0.
    pub fn predict(&self, query: &CropQuery, known_crops: &[String]) -> PredictionResult {
        let q = self.space.normalize(&query.to_vector());

        let mut distances: Vec<(f64, usize)> = self
            .matrix
            .iter()
            .enumerate()
            .map(|(idx, row)| (euclidean_distance(&q, row), idx))
            .collect();
        distances.sort_by(|a, b| a.0.total_cmp(&b.0));

        let take = self.k.min(distances.len());
        let nearest = &distances[..take];

        // (label id, votes) in first-seen order
        let mut tally: SmallVec<[(usize, usize); 8]> = SmallVec::new();
        for &(_, idx) in nearest {
            let id = self.label_ids[idx];
            match tally.iter_mut().find(|(l, _)| *l == id) {
                Some(entry) => entry.1 += 1,
                None => tally.push((id, 1)),
            }
        }

        let mut winner = tally[0];
        for &entry in tally.iter().skip(1) {
            if entry.1 > winner.1 {
                winner = entry;
            }
        }

        let mut confidence =
            ConfidenceMap(known_crops.iter().map(|c| (c.clone(), 0.0)).collect());
        for &(id, votes) in &tally {
            confidence.set(&self.labels[id], votes as f64 / take as f64 * 100.0);
        }

        let neighbors = nearest
            .iter()
            .map(|&(distance, idx)| Neighbor {
                crop: self.labels[self.label_ids[idx]].clone(),
                distance,
            })
            .collect();

        let crop = self.labels[winner.0].clone();
        debug!("Predicted {} ({} of {} neighbours)", crop, winner.1, take);

        PredictionResult {
            crop,
            confidence,
            neighbors,
        }
    }

    /// Predict many queries in parallel; output order matches input order
    pub fn predict_batch(&self, queries: &[CropQuery], known_crops: &[String]) -> Vec<PredictionResult> {
        queries
            .par_iter()
            .map(|q| self.predict(q, known_crops))
            .collect()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn feature_space(&self) -> &FeatureSpace {
        &self.space
    }

    /// Number of reference samples
    pub fn len(&self) -> usize {
        self.matrix.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.is_empty()
    }
}

/// `sqrt(Σ (a_i - b_i)^2)` over all features
pub fn euclidean_distance(a: &FeatureVector, b: &FeatureVector) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
