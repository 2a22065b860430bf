//! Crop Advisor - composition root for classifier, profiles and scoring
//!
//! Holds one immutable [`AdvisorSnapshot`] (fitted classifier + range-profile
//! table built from the same dataset). A reload builds the next snapshot
//! completely before swapping it in with a single write, so readers never
//! see a feature space from one dataset next to profiles from another.

use crate::classifier::{CropClassifier, PredictionResult};
use crate::config::AdvisorConfig;
use crate::data::{ReferenceDataset, ReferenceSample};
use crate::error::{AdvisorError, Result};
use crate::features::CropQuery;
use crate::profiles::{CropRangeProfile, RangeProfileTable};
use crate::scorer::{SuitabilityResult, SuitabilityScorer};
use crate::soil_health::{analyze_soil_health, SoilHealthReport};
use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::Serialize;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};
use tracing::info;

/// Samples per crop in a loaded dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CropCount {
    pub crop: String,
    pub samples: usize,
}

/// Summary returned by every successful load
///
/// `crop_count` and `crops` follow the profile table, so crops added with
/// [`CropAdvisor::add_crop_profile`] are listed with 0 samples.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub source: String,
    pub sample_count: usize,
    pub crop_count: usize,
    pub crops: Vec<CropCount>,
    pub k: usize,
    pub loaded_at: DateTime<Utc>,
}

impl DatasetSummary {
    fn new(dataset: &ReferenceDataset, k: usize) -> Self {
        let crops: Vec<CropCount> = dataset
            .label_counts()
            .into_iter()
            .map(|(crop, samples)| CropCount { crop, samples })
            .collect();

        Self {
            source: dataset.source().to_string(),
            sample_count: dataset.len(),
            crop_count: crops.len(),
            crops,
            k,
            loaded_at: Utc::now(),
        }
    }

    /// Same load, crop list taken from `profiles`
    fn with_profiles(&self, profiles: &RangeProfileTable) -> Self {
        let crops: Vec<CropCount> = profiles
            .crops()
            .into_iter()
            .map(|crop| {
                let samples = self
                    .crops
                    .iter()
                    .find(|c| c.crop == crop)
                    .map_or(0, |c| c.samples);
                CropCount { crop, samples }
            })
            .collect();

        Self {
            crop_count: crops.len(),
            crops,
            ..self.clone()
        }
    }
}

/// Everything derived from one dataset load
#[derive(Debug)]
pub struct AdvisorSnapshot {
    classifier: Arc<CropClassifier>,
    profiles: RangeProfileTable,
    summary: DatasetSummary,
}

impl AdvisorSnapshot {
    pub fn classifier(&self) -> &CropClassifier {
        &self.classifier
    }

    pub fn profiles(&self) -> &RangeProfileTable {
        &self.profiles
    }

    pub fn summary(&self) -> &DatasetSummary {
        &self.summary
    }
}

/// Decision-support entry point consumed by outer layers
#[derive(Debug)]
pub struct CropAdvisor {
    k: usize,
    state: RwLock<Option<Arc<AdvisorSnapshot>>>,
}

impl CropAdvisor {
    /// Empty advisor; every dataset-backed call fails until a load succeeds
    pub fn new(k: usize) -> Self {
        Self {
            k,
            state: RwLock::new(None),
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Self {
        Self::new(config.k)
    }

    /// Fit from typed rows
    pub fn load_reference_dataset(&self, rows: Vec<ReferenceSample>) -> Result<DatasetSummary> {
        self.install(ReferenceDataset::from_samples(rows)?)
    }

    pub fn load_csv(&self, path: &Path) -> Result<DatasetSummary> {
        self.install(ReferenceDataset::from_csv(path)?)
    }

    /// Fit from uploaded CSV bytes
    pub fn load_csv_bytes(&self, bytes: &[u8]) -> Result<DatasetSummary> {
        self.install(ReferenceDataset::from_csv_bytes(bytes)?)
    }

    pub fn load_dataframe(&self, df: &DataFrame) -> Result<DatasetSummary> {
        self.install(ReferenceDataset::from_dataframe(df)?)
    }

    fn install(&self, dataset: ReferenceDataset) -> Result<DatasetSummary> {
        let classifier = CropClassifier::fit(&dataset, self.k)?;
        let profiles = RangeProfileTable::from_dataset(&dataset);
        let summary = DatasetSummary::new(&dataset, self.k);

        let snapshot = Arc::new(AdvisorSnapshot {
            classifier: Arc::new(classifier),
            profiles,
            summary: summary.clone(),
        });
        *self.write_state() = Some(snapshot);

        info!(
            "Reference dataset installed: {} samples, {} crops (k = {}, source: {})",
            summary.sample_count, summary.crop_count, summary.k, summary.source
        );
        Ok(summary)
    }

    /// Current snapshot; cheap to clone and safe to hold across a reload
    pub fn snapshot(&self) -> Result<Arc<AdvisorSnapshot>> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(AdvisorError::ModelNotInitialized)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, Option<Arc<AdvisorSnapshot>>> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_initialized(&self) -> bool {
        self.snapshot().is_ok()
    }

    pub fn predict(&self, query: &CropQuery) -> Result<PredictionResult> {
        let snapshot = self.snapshot()?;
        let known = snapshot.profiles.crops();
        Ok(snapshot.classifier.predict(query, &known))
    }

    /// Predictions for many queries against one snapshot, in input order
    pub fn predict_batch(&self, queries: &[CropQuery]) -> Result<Vec<PredictionResult>> {
        let snapshot = self.snapshot()?;
        let known = snapshot.profiles.crops();
        Ok(snapshot.classifier.predict_batch(queries, &known))
    }

    pub fn get_range_profile(&self, crop: &str) -> Result<CropRangeProfile> {
        self.snapshot()?
            .profiles
            .get(crop)
            .cloned()
            .ok_or_else(|| AdvisorError::UnknownCrop(crop.to_string()))
    }

    /// Add a crop profile or overwrite an existing one
    ///
    /// The classifier is shared with the new snapshot; only the profile
    /// table is copied.
    pub fn add_crop_profile(&self, crop: &str, profile: CropRangeProfile) -> Result<()> {
        if crop.is_empty() {
            return Err(AdvisorError::InvalidInput("crop name must not be empty".to_string()));
        }

        let mut state = self.write_state();
        let current = state.as_ref().ok_or(AdvisorError::ModelNotInitialized)?;

        let mut profiles = current.profiles.clone();
        profiles.insert(crop, profile);

        let next = AdvisorSnapshot {
            classifier: Arc::clone(&current.classifier),
            summary: current.summary.with_profiles(&profiles),
            profiles,
        };
        *state = Some(Arc::new(next));

        info!("Crop profile stored: {}", crop);
        Ok(())
    }

    /// Known crop labels in table order; empty before the first load
    pub fn list_known_crops(&self) -> Vec<String> {
        self.snapshot()
            .map(|s| s.profiles.crops())
            .unwrap_or_default()
    }

    pub fn yield_potential(&self, crop: &str, query: &CropQuery) -> Result<SuitabilityResult> {
        let snapshot = self.snapshot()?;
        SuitabilityScorer::new(&snapshot.profiles).yield_potential(crop, query)
    }

    pub fn rank_all_crops(&self, query: &CropQuery) -> Result<Vec<SuitabilityResult>> {
        let snapshot = self.snapshot()?;
        Ok(SuitabilityScorer::new(&snapshot.profiles).rank_all_crops(query))
    }

    pub fn top_suitable_crops(&self, query: &CropQuery, limit: usize) -> Result<Vec<SuitabilityResult>> {
        let snapshot = self.snapshot()?;
        Ok(SuitabilityScorer::new(&snapshot.profiles).top_suitable_crops(query, limit))
    }

    /// Rule-table soil assessment; needs no dataset
    pub fn soil_health(&self, n: f64, p: f64, k: f64, ph: f64) -> SoilHealthReport {
        analyze_soil_health(n, p, k, ph)
    }

    pub fn summary(&self) -> Result<DatasetSummary> {
        Ok(self.snapshot()?.summary.clone())
    }

    pub fn k(&self) -> usize {
        self.k
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiles::FeatureRange;
    use crate::features::FEATURE_COUNT;

    fn rows() -> Vec<ReferenceSample> {
        vec![
            ReferenceSample::new("rice", [90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]),
            ReferenceSample::new("maize", [71.0, 54.0, 16.0, 22.6, 63.7, 5.7, 87.8]),
            ReferenceSample::new("chickpea", [40.0, 72.0, 77.0, 17.0, 17.0, 7.5, 88.6]),
        ]
    }

    #[test]
    fn test_operations_fail_before_load() {
        let advisor = CropAdvisor::new(1);
        let query = CropQuery::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0).unwrap();

        assert_eq!(advisor.predict(&query), Err(AdvisorError::ModelNotInitialized));
        assert_eq!(advisor.rank_all_crops(&query), Err(AdvisorError::ModelNotInitialized));
        assert_eq!(
            advisor.yield_potential("rice", &query),
            Err(AdvisorError::ModelNotInitialized)
        );
        assert!(advisor.list_known_crops().is_empty());
        assert!(!advisor.is_initialized());
        // Soil health needs no dataset
        assert_eq!(advisor.soil_health(20.0, 50.0, 50.0, 6.5).points, 10);
    }

    #[test]
    fn test_exact_match_scenario() {
        let advisor = CropAdvisor::new(1);
        let summary = advisor.load_reference_dataset(rows()).unwrap();
        assert_eq!(summary.crop_count, 3);

        let query = CropQuery::new(90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9).unwrap();
        let result = advisor.predict(&query).unwrap();
        assert_eq!(result.crop, "rice");
        assert_eq!(result.confidence.get("rice"), Some(100.0));
        assert_eq!(result.confidence.get("maize"), Some(0.0));
        assert_eq!(result.confidence.get("chickpea"), Some(0.0));
        assert_eq!(result.confidence.crops(), advisor.list_known_crops());
    }

    #[test]
    fn test_added_profile_appears_in_predictions_and_ranking() {
        let advisor = CropAdvisor::new(1);
        advisor.load_reference_dataset(rows()).unwrap();

        let profile = CropRangeProfile::new(
            [FeatureRange { min: 0.0, max: 500.0 }; FEATURE_COUNT],
            "Grows anywhere",
        )
        .unwrap();
        advisor.add_crop_profile("jute", profile).unwrap();

        assert_eq!(advisor.list_known_crops(), vec!["rice", "maize", "chickpea", "jute"]);
        let query = CropQuery::new(90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9).unwrap();
        let result = advisor.predict(&query).unwrap();
        assert_eq!(result.confidence.get("jute"), Some(0.0));

        let ranked = advisor.rank_all_crops(&query).unwrap();
        assert_eq!(ranked.len(), 4);
        assert_eq!(advisor.get_range_profile("jute").unwrap().description, "Grows anywhere");
    }

    #[test]
    fn test_summary_counts_added_crops() {
        let advisor = CropAdvisor::new(1);
        advisor.load_reference_dataset(rows()).unwrap();
        let loaded = advisor.summary().unwrap();

        let profile = CropRangeProfile::new(
            [FeatureRange { min: 0.0, max: 500.0 }; FEATURE_COUNT],
            "",
        )
        .unwrap();
        advisor.add_crop_profile("jute", profile.clone()).unwrap();
        // Overwriting a dataset crop keeps its sample count
        advisor.add_crop_profile("rice", profile).unwrap();

        let summary = advisor.summary().unwrap();
        assert_eq!(summary.crop_count, advisor.list_known_crops().len());
        assert_eq!(summary.crop_count, 4);
        assert_eq!(summary.crops[0], CropCount { crop: "rice".to_string(), samples: 1 });
        assert_eq!(summary.crops[3], CropCount { crop: "jute".to_string(), samples: 0 });
        assert_eq!(summary.sample_count, loaded.sample_count);
        assert_eq!(summary.loaded_at, loaded.loaded_at);
    }

    #[test]
    fn test_add_profile_requires_dataset() {
        let advisor = CropAdvisor::new(1);
        let profile = CropRangeProfile::new(
            [FeatureRange { min: 0.0, max: 1.0 }; FEATURE_COUNT],
            "",
        )
        .unwrap();
        assert_eq!(
            advisor.add_crop_profile("jute", profile),
            Err(AdvisorError::ModelNotInitialized)
        );
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let advisor = CropAdvisor::new(1);
        advisor.load_reference_dataset(rows()).unwrap();
        let before = advisor.snapshot().unwrap();

        advisor
            .load_reference_dataset(vec![ReferenceSample::new("cotton", [1.0; FEATURE_COUNT])])
            .unwrap();

        assert_eq!(before.profiles().crops(), vec!["rice", "maize", "chickpea"]);
        assert_eq!(advisor.list_known_crops(), vec!["cotton"]);
    }
}
