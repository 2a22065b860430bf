//! Agronomic Features
//!
//! The seven soil/climate inputs shared by the classifier and the suitability
//! scorer, in their fixed enumeration order: N, P, K, temperature, humidity,
//! pH, rainfall. Every per-feature array in the crate is indexed by
//! [`Feature::index`].

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Number of features per observation
pub const FEATURE_COUNT: usize = 7;

/// Raw or normalized observation, indexed by [`Feature::index`]
pub type FeatureVector = [f64; FEATURE_COUNT];

/// One of the seven numeric soil/climate inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Nitrogen,
    Phosphorus,
    Potassium,
    Temperature,
    Humidity,
    Ph,
    Rainfall,
}

impl Feature {
    /// All features in enumeration order
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Nitrogen,
        Feature::Phosphorus,
        Feature::Potassium,
        Feature::Temperature,
        Feature::Humidity,
        Feature::Ph,
        Feature::Rainfall,
    ];

    /// Position in every [`FeatureVector`]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Column header in reference CSV files (matched verbatim)
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "N",
            Feature::Phosphorus => "P",
            Feature::Potassium => "K",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    /// Form field name used by query submitters
    pub fn field_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "nitrogen",
            Feature::Phosphorus => "phosphorus",
            Feature::Potassium => "potassium",
            Feature::Temperature => "temperature",
            Feature::Humidity => "humidity",
            Feature::Ph => "ph",
            Feature::Rainfall => "rainfall",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Feature::Nitrogen => "Nitrogen",
            Feature::Phosphorus => "Phosphorus",
            Feature::Potassium => "Potassium",
            Feature::Temperature => "Temperature",
            Feature::Humidity => "Humidity",
            Feature::Ph => "pH",
            Feature::Rainfall => "Rainfall",
        }
    }
}

/// A single observation submitted for prediction or scoring
///
/// Transient; constructed per request and never persisted. All values are
/// guaranteed finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropQuery {
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl CropQuery {
    /// Build a query from the seven raw values
    pub fn new(
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        temperature: f64,
        humidity: f64,
        ph: f64,
        rainfall: f64,
    ) -> Result<Self> {
        Self::from_vector([nitrogen, phosphorus, potassium, temperature, humidity, ph, rainfall])
    }

    /// Build a query from a vector in enumeration order
    pub fn from_vector(values: FeatureVector) -> Result<Self> {
        for feature in Feature::ALL {
            let value = values[feature.index()];
            if !value.is_finite() {
                return Err(AdvisorError::InvalidInput(format!(
                    "{} must be a finite number, got {}",
                    feature.field_name(),
                    value
                )));
            }
        }

        Ok(Self {
            nitrogen: values[0],
            phosphorus: values[1],
            potassium: values[2],
            temperature: values[3],
            humidity: values[4],
            ph: values[5],
            rainfall: values[6],
        })
    }

    /// Parse a query from submitted form fields (`nitrogen`, `phosphorus`, ...)
    ///
    /// Missing, blank or non-numeric fields fail with `InvalidInput` naming
    /// the offending field.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self> {
        let mut values = [0.0; FEATURE_COUNT];
        for feature in Feature::ALL {
            values[feature.index()] = parse_field(fields, feature.field_name())?;
        }
        Self::from_vector(values)
    }

    pub fn to_vector(&self) -> FeatureVector {
        [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ]
    }

    pub fn value(&self, feature: Feature) -> f64 {
        self.to_vector()[feature.index()]
    }
}

/// Parse one numeric form field
pub fn parse_field(fields: &HashMap<String, String>, name: &str) -> Result<f64> {
    let raw = fields
        .get(name)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AdvisorError::InvalidInput(format!("missing field: {}", name)))?;

    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AdvisorError::InvalidInput(format!("{} is not a number: '{}'", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_enumeration_order_matches_index() {
        for (i, feature) in Feature::ALL.iter().enumerate() {
            assert_eq!(feature.index(), i);
        }
        assert_eq!(Feature::Ph.column_name(), "ph");
        assert_eq!(Feature::Ph.display_name(), "pH");
    }

    #[test]
    fn test_from_fields_parses_all_values() {
        let fields = form(&[
            ("nitrogen", "90"),
            ("phosphorus", "42"),
            ("potassium", "43"),
            ("temperature", " 20.8 "),
            ("humidity", "82"),
            ("ph", "6.5"),
            ("rainfall", "202.9"),
        ]);

        let query = CropQuery::from_fields(&fields).unwrap();
        assert_eq!(query.to_vector(), [90.0, 42.0, 43.0, 20.8, 82.0, 6.5, 202.9]);
        assert_eq!(query.value(Feature::Rainfall), 202.9);
    }

    #[test]
    fn test_from_fields_rejects_missing_and_non_numeric() {
        let missing = form(&[("nitrogen", "90")]);
        match CropQuery::from_fields(&missing) {
            Err(AdvisorError::InvalidInput(msg)) => assert!(msg.contains("phosphorus")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }

        let mut bad = form(&[
            ("nitrogen", "90"),
            ("phosphorus", "42"),
            ("potassium", "43"),
            ("temperature", "warm"),
            ("humidity", "82"),
            ("ph", "6.5"),
            ("rainfall", "202.9"),
        ]);
        match CropQuery::from_fields(&bad) {
            Err(AdvisorError::InvalidInput(msg)) => assert!(msg.contains("temperature")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }

        bad.insert("temperature".to_string(), "NaN".to_string());
        assert!(CropQuery::from_fields(&bad).is_err());
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(CropQuery::new(1.0, 2.0, 3.0, f64::INFINITY, 5.0, 6.0, 7.0).is_err());
        assert!(CropQuery::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0).is_ok());
    }
}
