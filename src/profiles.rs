//! Crop Range Profiles
//!
//! Per-crop acceptable min/max band for each feature, derived from the
//! reference set by padding the observed per-crop span by 10% on each side.
//!
//! Padding policy (defined once, here):
//! - lower bound floored at 0
//! - humidity upper bound capped at 100
//! - pH upper bound capped at 14

use crate::data::ReferenceDataset;
use crate::error::{AdvisorError, Result};
use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Fraction of the observed span added on each side
pub const RANGE_PADDING: f64 = 0.1;

/// Acceptable band for one feature
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }
}

/// Known acceptable ranges and a short description for one crop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRangeProfile {
    /// Indexed by [`Feature::index`]
    pub ranges: [FeatureRange; FEATURE_COUNT],
    pub description: String,
    /// Reference samples the profile was derived from (0 when added by hand)
    #[serde(default)]
    pub sample_count: usize,
}

impl CropRangeProfile {
    /// Build a profile by hand; each range must be finite with `min <= max`
    pub fn new(ranges: [FeatureRange; FEATURE_COUNT], description: impl Into<String>) -> Result<Self> {
        for feature in Feature::ALL {
            let r = ranges[feature.index()];
            if !r.min.is_finite() || !r.max.is_finite() || r.min > r.max {
                return Err(AdvisorError::InvalidInput(format!(
                    "{} range [{}, {}] is not a valid interval",
                    feature.column_name(),
                    r.min,
                    r.max
                )));
            }
        }

        Ok(Self {
            ranges,
            description: description.into(),
            sample_count: 0,
        })
    }

    pub fn range(&self, feature: Feature) -> FeatureRange {
        self.ranges[feature.index()]
    }
}

/// Upper clamp applied after padding, if the feature has a physical ceiling
pub fn upper_cap(feature: Feature) -> Option<f64> {
    match feature {
        Feature::Humidity => Some(100.0),
        Feature::Ph => Some(14.0),
        _ => None,
    }
}

/// Pad an observed `[min, max]` span into an acceptable range
pub fn padded_range(feature: Feature, observed_min: f64, observed_max: f64) -> FeatureRange {
    let span = observed_max - observed_min;
    let min = (observed_min - RANGE_PADDING * span).max(0.0);
    let max = observed_max + RANGE_PADDING * span;
    let max = match upper_cap(feature) {
        Some(cap) => max.min(cap),
        None => max,
    };
    FeatureRange { min, max }
}

/// Insertion-ordered crop → profile table
#[derive(Debug, Clone, Default)]
pub struct RangeProfileTable {
    crops: Vec<(String, CropRangeProfile)>,
    index: FxHashMap<String, usize>,
}

/// Running per-crop statistics while scanning the reference set
struct CropStats {
    count: usize,
    sum: FeatureVector,
    min: FeatureVector,
    max: FeatureVector,
}

impl CropStats {
    fn new() -> Self {
        Self {
            count: 0,
            sum: [0.0; FEATURE_COUNT],
            min: [f64::INFINITY; FEATURE_COUNT],
            max: [f64::NEG_INFINITY; FEATURE_COUNT],
        }
    }

    fn add(&mut self, features: &FeatureVector) {
        self.count += 1;
        for i in 0..FEATURE_COUNT {
            self.sum[i] += features[i];
            self.min[i] = self.min[i].min(features[i]);
            self.max[i] = self.max[i].max(features[i]);
        }
    }
}

impl RangeProfileTable {
    /// Derive one profile per distinct label, in first-appearance order
    pub fn from_dataset(dataset: &ReferenceDataset) -> Self {
        let mut stats: Vec<CropStats> = dataset.labels().iter().map(|_| CropStats::new()).collect();
        for sample in dataset.samples() {
            if let Some(pos) = dataset.label_position(sample.label()) {
                stats[pos].add(sample.features());
            }
        }

        let mut table = Self::default();
        for (crop, s) in dataset.labels().iter().zip(stats) {
            if s.count == 0 {
                continue;
            }

            let mut ranges = [FeatureRange { min: 0.0, max: 0.0 }; FEATURE_COUNT];
            for feature in Feature::ALL {
                let i = feature.index();
                ranges[i] = padded_range(feature, s.min[i], s.max[i]);
            }
            let averages = s.sum.map(|v| v / s.count as f64);

            table.insert(
                crop,
                CropRangeProfile {
                    ranges,
                    description: describe_crop(crop, &averages),
                    sample_count: s.count,
                },
            );
        }

        table
    }

    /// Add a crop or overwrite an existing one (keeps its position)
    pub fn insert(&mut self, crop: &str, profile: CropRangeProfile) {
        match self.index.get(crop) {
            Some(&pos) => self.crops[pos].1 = profile,
            None => {
                self.index.insert(crop.to_string(), self.crops.len());
                self.crops.push((crop.to_string(), profile));
            }
        }
    }

    pub fn get(&self, crop: &str) -> Option<&CropRangeProfile> {
        self.index.get(crop).map(|&pos| &self.crops[pos].1)
    }

    /// Crop names in table order
    pub fn crops(&self) -> Vec<String> {
        self.crops.iter().map(|(c, _)| c.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CropRangeProfile)> {
        self.crops.iter().map(|(c, p)| (c.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.crops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.crops.is_empty()
    }
}

/// Plain-language summary of a crop's average growing conditions
fn describe_crop(crop: &str, avg: &FeatureVector) -> String {
    format!(
        "{} typically grows well with nitrogen levels around {:.1} kg/ha, \
         phosphorus around {:.1} kg/ha, and potassium around {:.1} kg/ha. \
         Optimal temperature is approximately {:.1}°C with humidity of {:.1}%. \
         It prefers soil with pH of {:.1} and rainfall of about {:.1} mm.",
        capitalize(crop),
        avg[Feature::Nitrogen.index()],
        avg[Feature::Phosphorus.index()],
        avg[Feature::Potassium.index()],
        avg[Feature::Temperature.index()],
        avg[Feature::Humidity.index()],
        avg[Feature::Ph.index()],
        avg[Feature::Rainfall.index()],
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}
