//! Standard scaling of numeric feature columns.

use crate::utils::{mean, median};
use serde::Serialize;

/// Fitted mean and population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub std: f64,
}

impl StandardScaler {
    /// `None` for an empty input.
    pub fn fit(values: &[f64]) -> Option<Self> {
        let mean = mean(values.iter().copied().map(Some))?;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(Self {
            mean,
            std: variance.sqrt(),
        })
    }

    /// Zero-variance columns scale to 0.
    pub fn transform(&self, value: f64) -> f64 {
        if self.std == 0.0 {
            0.0
        } else {
            (value - self.mean) / self.std
        }
    }
}

/// A `{source}_SCALED` column: missing cells take the column median, then
/// every value is standardized.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScaledColumn {
    pub source: String,
    pub fill_value: f64,
    pub scaler: StandardScaler,
    #[serde(skip)]
    pub values: Vec<f64>,
}

impl ScaledColumn {
    /// `None` when the column has no numeric value at all.
    pub fn median_fill_scale(source: &str, cells: &[Option<f64>]) -> Option<Self> {
        let fill_value = median(cells.iter().copied())?;
        let filled: Vec<f64> = cells.iter().map(|v| v.unwrap_or(fill_value)).collect();
        let scaler = StandardScaler::fit(&filled)?;
        let values = filled.iter().map(|&v| scaler.transform(v)).collect();
        Some(Self {
            source: source.to_string(),
            fill_value,
            scaler,
            values,
        })
    }

    pub fn output_name(&self) -> String {
        format!("{}_SCALED", self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scaler_population_std() {
        let scaler = StandardScaler::fit(&[1.0, 3.0]).unwrap();
        assert_eq!(scaler.mean, 2.0);
        assert_eq!(scaler.std, 1.0);
        assert_eq!(scaler.transform(3.0), 1.0);
    }

    #[test]
    fn test_median_fill_then_scale() {
        let column = ScaledColumn::median_fill_scale("AGE_GRP", &[Some(20.0), None, Some(40.0)]).unwrap();
        assert_eq!(column.output_name(), "AGE_GRP_SCALED");
        assert_eq!(column.fill_value, 30.0);
        assert_eq!(column.values[1], 0.0);
        assert!(column.values[0] < 0.0 && column.values[2] > 0.0);
    }

    #[test]
    fn test_constant_and_empty_columns() {
        let constant = ScaledColumn::median_fill_scale("X", &[Some(5.0), Some(5.0)]).unwrap();
        assert_eq!(constant.values, vec![0.0, 0.0]);
        assert!(ScaledColumn::median_fill_scale("X", &[None, None]).is_none());
    }
}
