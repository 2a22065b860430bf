//! Utility modules shared by the classifier and scorer
//!
//! - Normalization: z-score feature space with the epsilon guard

pub mod normalization;

// Re-export commonly used types
pub use normalization::{FeatureSpace, NormalizationParameters, STD_EPSILON};
