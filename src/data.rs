//! Reference Dataset Loading
//!
//! Loads historical (features, crop label) observations using Polars.
//! The header must carry `label, N, P, K, temperature, humidity, ph,
//! rainfall` verbatim; a missing column rejects the whole load. Extra
//! columns are ignored.

use crate::error::{AdvisorError, Result};
use crate::features::{Feature, FeatureVector, FEATURE_COUNT};
use polars::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;
use std::io::Cursor;
use std::path::Path;
use tracing::warn;

/// Column holding the crop label
pub const LABEL_COLUMN: &str = "label";

/// All columns a reference dataset must provide
pub const REQUIRED_COLUMNS: [&str; FEATURE_COUNT + 1] =
    ["label", "N", "P", "K", "temperature", "humidity", "ph", "rainfall"];

/// One historical observation: seven features plus the crop grown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReferenceSample {
    label: String,
    features: FeatureVector,
}

impl ReferenceSample {
    pub fn new(label: impl Into<String>, features: FeatureVector) -> Self {
        Self {
            label: label.into(),
            features,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn features(&self) -> &FeatureVector {
        &self.features
    }
}

/// Immutable reference set used by both the classifier and the profile builder
#[derive(Debug, Clone)]
pub struct ReferenceDataset {
    samples: Vec<ReferenceSample>,
    /// Distinct labels in first-appearance order
    labels: Vec<String>,
    label_index: FxHashMap<String, usize>,
    source: String,
}

impl ReferenceDataset {
    /// Build from typed rows
    ///
    /// Fails with `InvalidDataset` when `samples` is empty, when a label is
    /// blank, or when a feature value is not finite.
    pub fn from_samples(samples: Vec<ReferenceSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(AdvisorError::InvalidDataset(
                "dataset contains no samples".to_string(),
            ));
        }

        let mut labels = Vec::new();
        let mut label_index = FxHashMap::default();

        for (row, sample) in samples.iter().enumerate() {
            if sample.label.is_empty() {
                return Err(AdvisorError::InvalidDataset(format!(
                    "sample {} has an empty label",
                    row
                )));
            }
            if let Some(feature) = Feature::ALL
                .iter()
                .find(|f| !sample.features[f.index()].is_finite())
            {
                return Err(AdvisorError::InvalidDataset(format!(
                    "sample {} has a non-finite {} value",
                    row,
                    feature.column_name()
                )));
            }
            if !label_index.contains_key(&sample.label) {
                label_index.insert(sample.label.clone(), labels.len());
                labels.push(sample.label.clone());
            }
        }

        Ok(Self {
            samples,
            labels,
            label_index,
            source: "in-memory rows".to_string(),
        })
    }

    /// Load from a CSV file on disk
    pub fn from_csv(path: &Path) -> Result<Self> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None) // Scan entire file
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .and_then(|reader| reader.finish())
            .map_err(|e| {
                AdvisorError::InvalidDataset(format!("failed to read {}: {}", path.display(), e))
            })?;

        let mut dataset = Self::from_dataframe(&df)?;
        dataset.source = path.display().to_string();
        Ok(dataset)
    }

    /// Load from raw CSV bytes (e.g. an uploaded file)
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(AdvisorError::InvalidDataset("uploaded file is empty".to_string()));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(None)
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| AdvisorError::InvalidDataset(format!("Invalid CSV format: {}", e)))?;

        let mut dataset = Self::from_dataframe(&df)?;
        dataset.source = "uploaded CSV".to_string();
        Ok(dataset)
    }

    /// Load from a pre-loaded Polars DataFrame
    ///
    /// Numeric columns are cast to f64; a cell that cannot be read as a
    /// number rejects the load. Rows whose label is empty are skipped.
    pub fn from_dataframe(df: &DataFrame) -> Result<Self> {
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| df.column(name).is_err())
            .collect();

        if !missing.is_empty() {
            return Err(AdvisorError::InvalidDataset(format!(
                "Missing required columns: {}",
                missing.join(", ")
            )));
        }

        let label_col = df
            .column(LABEL_COLUMN)
            .and_then(|c| c.cast(&DataType::String))
            .map_err(column_error(LABEL_COLUMN))?;
        let labels = label_col.str().map_err(column_error(LABEL_COLUMN))?;

        let mut feature_cols = Vec::with_capacity(FEATURE_COUNT);
        for feature in Feature::ALL {
            let name = feature.column_name();
            let col = df
                .column(name)
                .and_then(|c| c.cast(&DataType::Float64))
                .map_err(column_error(name))?;
            feature_cols.push(col);
        }
        let values = feature_cols
            .iter()
            .zip(Feature::ALL)
            .map(|(c, f)| c.f64().map_err(column_error(f.column_name())))
            .collect::<Result<Vec<_>>>()?;

        let mut samples = Vec::with_capacity(df.height());
        let mut skipped = 0usize;

        for idx in 0..df.height() {
            let label = match labels.get(idx) {
                Some(label) if !label.is_empty() => label,
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            let mut features = [0.0; FEATURE_COUNT];
            for feature in Feature::ALL {
                // Row numbers are reported 1-based, counting the header line
                features[feature.index()] = values[feature.index()]
                    .get(idx)
                    .filter(|v| v.is_finite())
                    .ok_or_else(|| {
                        AdvisorError::InvalidDataset(format!(
                            "row {}: column '{}' is missing or non-numeric",
                            idx + 2,
                            feature.column_name()
                        ))
                    })?;
            }

            samples.push(ReferenceSample::new(label, features));
        }

        if skipped > 0 {
            warn!("Skipped {} rows with an empty label", skipped);
        }

        let mut dataset = Self::from_samples(samples)?;
        dataset.source = "dataframe".to_string();
        Ok(dataset)
    }

    pub fn samples(&self) -> &[ReferenceSample] {
        &self.samples
    }

    /// Distinct labels in first-appearance order
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Position of `label` in [`labels`](Self::labels)
    pub fn label_position(&self, label: &str) -> Option<usize> {
        self.label_index.get(label).copied()
    }

    /// Number of samples per label, in label order
    pub fn label_counts(&self) -> Vec<(String, usize)> {
        let mut counts = vec![0usize; self.labels.len()];
        for sample in &self.samples {
            counts[self.label_index[&sample.label]] += 1;
        }
        self.labels.iter().cloned().zip(counts).collect()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn column_error(name: &'static str) -> impl Fn(PolarsError) -> AdvisorError {
    move |e| AdvisorError::InvalidDataset(format!("column '{}': {}", name, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_CSV: &str = "\
N,P,K,temperature,humidity,ph,rainfall,label
90,42,43,20.87,82.00,6.50,202.93,rice
85,58,41,21.77,80.31,7.03,226.65,rice
71,54,16,22.61,63.69,5.74,87.75,maize
40,72,77,17.02,16.98,7.48,88.55,chickpea
";

    #[test]
    fn test_from_csv_bytes_reads_labels_in_order() {
        let ds = ReferenceDataset::from_csv_bytes(SAMPLE_CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 4);
        assert_eq!(ds.labels(), &["rice", "maize", "chickpea"]);
        assert_eq!(ds.samples()[2].features()[0], 71.0);
        assert_eq!(ds.label_position("chickpea"), Some(2));
        assert_eq!(
            ds.label_counts(),
            vec![
                ("rice".to_string(), 2),
                ("maize".to_string(), 1),
                ("chickpea".to_string(), 1)
            ]
        );
    }

    #[test]
    fn test_missing_columns_lists_every_name() {
        let csv = "N,P,K,temperature,label\n1,2,3,4,rice\n";
        match ReferenceDataset::from_csv_bytes(csv.as_bytes()) {
            Err(AdvisorError::InvalidDataset(msg)) => {
                assert!(msg.contains("humidity"));
                assert!(msg.contains("ph"));
                assert!(msg.contains("rainfall"));
                assert!(!msg.contains("temperature"));
            }
            other => panic!("expected InvalidDataset, got {:?}", other),
        }
    }

    #[test]
    fn test_header_match_is_case_sensitive() {
        let csv = "n,P,K,temperature,humidity,ph,rainfall,label\n1,2,3,4,5,6,7,rice\n";
        assert!(matches!(
            ReferenceDataset::from_csv_bytes(csv.as_bytes()),
            Err(AdvisorError::InvalidDataset(_))
        ));
    }

    #[test]
    fn test_non_numeric_cell_rejects_load() {
        let csv = "N,P,K,temperature,humidity,ph,rainfall,label\n1,2,3,hot,5,6,7,rice\n";
        match ReferenceDataset::from_csv_bytes(csv.as_bytes()) {
            Err(AdvisorError::InvalidDataset(msg)) => assert!(msg.contains("temperature")),
            other => panic!("expected InvalidDataset, got {:?}", other),
        }
    }

    #[test]
    fn test_late_decimal_after_integer_rows() {
        let mut csv = String::from("N,P,K,temperature,humidity,ph,rainfall,label\n");
        for i in 0..150 {
            csv.push_str(&format!("{},42,43,20,82,6,202,rice\n", 60 + i % 30));
        }
        csv.push_str("72.5,42,43,20.5,82,6.5,202.9,maize\n");

        let ds = ReferenceDataset::from_csv_bytes(csv.as_bytes()).unwrap();
        assert_eq!(ds.len(), 151);
        assert_eq!(ds.labels(), &["rice", "maize"]);
        assert_eq!(ds.samples()[150].features()[0], 72.5);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        assert!(ReferenceDataset::from_samples(Vec::new()).is_err());
        assert!(ReferenceDataset::from_csv_bytes(b"").is_err());
    }

    #[test]
    fn test_blank_label_rows_are_skipped() {
        let df = df! {
            "label" => &[Some("rice"), None, Some("maize")],
            "N" => &[1.0, 2.0, 3.0],
            "P" => &[1.0, 2.0, 3.0],
            "K" => &[1.0, 2.0, 3.0],
            "temperature" => &[1.0, 2.0, 3.0],
            "humidity" => &[1.0, 2.0, 3.0],
            "ph" => &[1.0, 2.0, 3.0],
            "rainfall" => &[1.0, 2.0, 3.0],
        }
        .unwrap();

        let ds = ReferenceDataset::from_dataframe(&df).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.labels(), &["rice", "maize"]);
    }

    #[test]
    fn test_from_samples_rejects_non_finite() {
        let rows = vec![ReferenceSample::new("rice", [1.0, 2.0, f64::NAN, 4.0, 5.0, 6.0, 7.0])];
        match ReferenceDataset::from_samples(rows) {
            Err(AdvisorError::InvalidDataset(msg)) => assert!(msg.contains("K")),
            other => panic!("expected InvalidDataset, got {:?}", other),
        }
    }
}
