//! Soil Health Rule Table
//!
//! Maps nitrogen, phosphorus, potassium and pH bands to points (1-3 each)
//! plus recommendations. Points out of 12 become a 0-100 percentage:
//! Good (>= 75), Moderate (>= 50), Poor (< 50).

use serde::Serialize;

/// Maximum attainable points (4 factors × 3)
pub const MAX_POINTS: u32 = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthCategory {
    Good,
    Moderate,
    Poor,
}

impl HealthCategory {
    pub fn from_percentage(pct: f64) -> Self {
        if pct >= 75.0 {
            HealthCategory::Good
        } else if pct >= 50.0 {
            HealthCategory::Moderate
        } else {
            HealthCategory::Poor
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            HealthCategory::Good => "Good",
            HealthCategory::Moderate => "Moderate",
            HealthCategory::Poor => "Poor",
        }
    }
}

/// Band a single factor falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NutrientLevel {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SoilHealthReport {
    /// 0..=100
    pub score: f64,
    pub category: HealthCategory,
    pub points: u32,
    pub nitrogen: NutrientLevel,
    pub phosphorus: NutrientLevel,
    pub potassium: NutrientLevel,
    pub ph: NutrientLevel,
    pub recommendations: Vec<String>,
}

/// Score soil from its N, P, K and pH readings
pub fn analyze_soil_health(n: f64, p: f64, k: f64, ph: f64) -> SoilHealthReport {
    let mut recommendations = Vec::new();

    let (nitrogen, n_points) = if n < 30.0 {
        recommendations.push("Low nitrogen levels. Consider adding nitrogen-rich fertilizers or compost.");
        (NutrientLevel::Low, 1)
    } else if n > 100.0 {
        recommendations.push("High nitrogen levels. Consider planting nitrogen-depleting crops.");
        (NutrientLevel::High, 2)
    } else {
        (NutrientLevel::Optimal, 3)
    };

    let (phosphorus, p_points) = if p < 20.0 {
        recommendations.push("Low phosphorus levels. Consider adding bone meal or rock phosphate.");
        (NutrientLevel::Low, 1)
    } else if p > 80.0 {
        recommendations.push("High phosphorus levels. Avoid adding more phosphorus-rich fertilizers.");
        (NutrientLevel::High, 2)
    } else {
        (NutrientLevel::Optimal, 3)
    };

    let (potassium, k_points) = if k < 20.0 {
        recommendations.push("Low potassium levels. Consider adding wood ash or potassium-rich fertilizers.");
        (NutrientLevel::Low, 1)
    } else if k > 80.0 {
        recommendations.push("High potassium levels. Avoid adding more potassium-rich fertilizers.");
        (NutrientLevel::High, 2)
    } else {
        (NutrientLevel::Optimal, 3)
    };

    // Acidic and alkaline soils are penalized equally
    let (ph_level, ph_points) = if ph < 5.5 {
        recommendations.push("Soil is too acidic. Consider adding lime to raise pH.");
        (NutrientLevel::Low, 1)
    } else if ph > 7.5 {
        recommendations.push("Soil is too alkaline. Consider adding sulfur to lower pH.");
        (NutrientLevel::High, 1)
    } else {
        (NutrientLevel::Optimal, 3)
    };

    let points = n_points + p_points + k_points + ph_points;
    let score = points as f64 / MAX_POINTS as f64 * 100.0;

    SoilHealthReport {
        score,
        category: HealthCategory::from_percentage(score),
        points,
        nitrogen,
        phosphorus,
        potassium,
        ph: ph_level,
        recommendations: recommendations.into_iter().map(String::from).collect(),
    }
}
