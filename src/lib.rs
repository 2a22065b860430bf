//! Crop Advisor Rust Implementation
//!
//! Agricultural decision support from soil and climate measurements:
//! - `utils/`: Feature normalization (z-score with epsilon guard)
//! - `data`: Reference dataset loading with Polars
//! - `classifier`: k-nearest-neighbour crop recommendation
//! - `profiles`: Per-crop acceptable ranges derived from the dataset
//! - `scorer`: Range-fit yield potential and multi-crop ranking
//! - `soil_health`: N/P/K/pH rule table
//! - `advisor`: Snapshot-swapping entry point tying it all together

pub mod error;
pub mod features;
pub mod utils;
pub mod data;
pub mod classifier;
pub mod profiles;
pub mod scorer;
pub mod soil_health;
pub mod config;
pub mod advisor;

// Re-export commonly used types
pub use advisor::{CropAdvisor, DatasetSummary};
pub use classifier::{CropClassifier, PredictionResult, DEFAULT_K};
pub use config::AdvisorConfig;
pub use data::{ReferenceDataset, ReferenceSample};
pub use error::{AdvisorError, Result};
pub use features::{CropQuery, Feature, FeatureVector};
pub use profiles::{CropRangeProfile, FeatureRange, RangeProfileTable};
pub use scorer::{parameter_score, aggregate_score, SuitabilityResult, SuitabilityScorer};
pub use soil_health::{analyze_soil_health, HealthCategory, SoilHealthReport};
pub use utils::FeatureSpace;
