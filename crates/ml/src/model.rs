//! Logistic-regression priority model.
//!
//! Small enough to train in-process with batch gradient descent; the fitted
//! weights double as the explanation mechanism (signed per-feature
//! contributions) and, normalized, as feature importance.

use serde::{Deserialize, Serialize};
use vulnscan_core::features::feature_description;
use vulnscan_store::models::FeatureImportance;

use crate::error::MlError;

// ---------------------------------------------------------------------------
// Hyperparameters
// ---------------------------------------------------------------------------

/// Training hyperparameters, read from the model record's free-form
/// hyperparameter map. Unknown keys are ignored; missing keys default.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hyperparameters {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            epochs: 2000,
            l2_penalty: 0.001,
        }
    }
}

impl Hyperparameters {
    pub fn from_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let defaults = Self::default();
        Self {
            learning_rate: map
                .get("learning_rate")
                .and_then(|v| v.as_f64())
                .filter(|v| *v > 0.0)
                .unwrap_or(defaults.learning_rate),
            epochs: map
                .get("epochs")
                .and_then(|v| v.as_u64())
                .filter(|v| *v > 0)
                .map(|v| v as usize)
                .unwrap_or(defaults.epochs),
            l2_penalty: map
                .get("l2_penalty")
                .and_then(|v| v.as_f64())
                .filter(|v| *v >= 0.0)
                .unwrap_or(defaults.l2_penalty),
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A fitted logistic-regression model over a fixed feature ordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorityModel {
    pub feature_names: Vec<String>,
    pub weights: Vec<f64>,
    pub bias: f64,
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl PriorityModel {
    /// Fit by batch gradient descent on log loss.
    ///
    /// `rows` are feature vectors in `feature_names` order; `labels` mark
    /// high-priority samples. Requires a non-empty dataset with both classes
    /// present.
    pub fn fit(
        feature_names: Vec<String>,
        rows: &[Vec<f64>],
        labels: &[bool],
        params: &Hyperparameters,
    ) -> Result<Self, MlError> {
        if rows.is_empty() || labels.is_empty() {
            return Err(MlError::EmptyDataset);
        }
        if labels.iter().all(|l| *l) || labels.iter().all(|l| !*l) {
            return Err(MlError::SingleClassDataset);
        }

        let n_features = feature_names.len();
        let n_samples = rows.len() as f64;
        let mut weights = vec![0.0; n_features];
        let mut bias = 0.0;

        // CVSS sits on a 0..10 scale next to 0/1 indicators; scaling rows
        // into comparable magnitudes keeps one learning rate workable.
        let scale: Vec<f64> = (0..n_features)
            .map(|i| {
                let max = rows
                    .iter()
                    .map(|row| row.get(i).copied().unwrap_or(0.0).abs())
                    .fold(0.0_f64, f64::max);
                if max > 0.0 {
                    max
                } else {
                    1.0
                }
            })
            .collect();

        for _ in 0..params.epochs {
            let mut grad_w = vec![0.0; n_features];
            let mut grad_b = 0.0;

            for (row, label) in rows.iter().zip(labels) {
                let z: f64 = bias
                    + row
                        .iter()
                        .zip(&weights)
                        .zip(&scale)
                        .map(|((x, w), s)| w * x / s)
                        .sum::<f64>();
                let error = sigmoid(z) - if *label { 1.0 } else { 0.0 };

                for ((g, x), s) in grad_w.iter_mut().zip(row).zip(&scale) {
                    *g += error * x / s;
                }
                grad_b += error;
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= params.learning_rate * (g / n_samples + params.l2_penalty * *w);
            }
            bias -= params.learning_rate * grad_b / n_samples;
        }

        // Fold the scaling back into the weights so prediction runs on raw
        // feature values.
        for (w, s) in weights.iter_mut().zip(&scale) {
            *w /= s;
        }

        Ok(Self {
            feature_names,
            weights,
            bias,
        })
    }

    /// Priority score in `[0, 1]` for a feature vector in this model's
    /// ordering.
    pub fn predict_score(&self, values: &[f64]) -> f64 {
        let z: f64 = self.bias
            + values
                .iter()
                .zip(&self.weights)
                .map(|(x, w)| x * w)
                .sum::<f64>();
        sigmoid(z)
    }

    /// Signed per-feature contributions (`weight * value`) for one sample.
    pub fn contributions(&self, values: &[f64]) -> Vec<(String, f64)> {
        self.feature_names
            .iter()
            .zip(values.iter().zip(&self.weights))
            .map(|(name, (x, w))| (name.clone(), x * w))
            .collect()
    }

    /// Feature importance as normalized absolute weights, descending.
    pub fn feature_importance(&self) -> Vec<FeatureImportance> {
        let total: f64 = self.weights.iter().map(|w| w.abs()).sum();
        let mut importance: Vec<FeatureImportance> = self
            .feature_names
            .iter()
            .zip(&self.weights)
            .map(|(name, w)| FeatureImportance {
                feature: name.clone(),
                importance: if total > 0.0 { w.abs() / total } else { 0.0 },
                description: feature_description(name).to_string(),
            })
            .collect();
        importance.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        importance
    }

    // -- Payload serialization --

    pub fn to_bytes(&self) -> Result<Vec<u8>, MlError> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MlError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    // -- Fitting --

    #[test]
    fn fit_separates_a_separable_dataset() {
        // High CVSS + exploit -> high priority; low CVSS, no exploit -> low.
        let rows = vec![
            vec![9.8, 1.0],
            vec![8.5, 1.0],
            vec![9.1, 0.0],
            vec![2.0, 0.0],
            vec![1.5, 0.0],
            vec![3.2, 0.0],
        ];
        let labels = vec![true, true, true, false, false, false];
        let model =
            PriorityModel::fit(names(2), &rows, &labels, &Hyperparameters::default()).unwrap();

        assert!(model.predict_score(&[9.8, 1.0]) > 0.5);
        assert!(model.predict_score(&[1.0, 0.0]) < 0.5);
        assert!(model.predict_score(&[9.8, 1.0]) > model.predict_score(&[2.0, 0.0]));
    }

    #[test]
    fn fit_rejects_empty_dataset() {
        let result = PriorityModel::fit(names(2), &[], &[], &Hyperparameters::default());
        assert_matches!(result, Err(MlError::EmptyDataset));
    }

    #[test]
    fn fit_rejects_single_class() {
        let rows = vec![vec![1.0], vec![2.0]];
        let result =
            PriorityModel::fit(names(1), &rows, &[true, true], &Hyperparameters::default());
        assert_matches!(result, Err(MlError::SingleClassDataset));
    }

    // -- Prediction --

    #[test]
    fn predict_score_is_bounded_and_monotone_in_weights() {
        let model = PriorityModel {
            feature_names: names(2),
            weights: vec![1.0, 2.0],
            bias: -3.0,
        };
        let low = model.predict_score(&[0.0, 0.0]);
        let high = model.predict_score(&[10.0, 1.0]);
        assert!((0.0..=1.0).contains(&low));
        assert!((0.0..=1.0).contains(&high));
        assert!(high > low);
    }

    #[test]
    fn zero_weights_score_at_decision_boundary() {
        let model = PriorityModel {
            feature_names: names(2),
            weights: vec![0.0, 0.0],
            bias: 0.0,
        };
        assert_eq!(model.predict_score(&[5.0, 1.0]), 0.5);
    }

    // -- Contributions and importance --

    #[test]
    fn contributions_are_signed_weight_times_value() {
        let model = PriorityModel {
            feature_names: vec!["cvss_score".to_string(), "patch_available".to_string()],
            weights: vec![0.5, -2.0],
            bias: 0.0,
        };
        let contributions = model.contributions(&[8.0, 1.0]);
        assert_eq!(contributions[0], ("cvss_score".to_string(), 4.0));
        assert_eq!(contributions[1], ("patch_available".to_string(), -2.0));
    }

    #[test]
    fn importance_is_normalized_and_sorted() {
        let model = PriorityModel {
            feature_names: vec!["a".to_string(), "b".to_string(), "c".to_string()],
            weights: vec![1.0, -3.0, 0.0],
            bias: 0.0,
        };
        let importance = model.feature_importance();
        assert_eq!(importance[0].feature, "b");
        assert!((importance[0].importance - 0.75).abs() < 1e-12);
        let total: f64 = importance.iter().map(|i| i.importance).sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    // -- Payload --

    #[test]
    fn payload_round_trips() {
        let model = PriorityModel {
            feature_names: names(3),
            weights: vec![0.1, -0.2, 0.3],
            bias: 0.05,
        };
        let bytes = model.to_bytes().unwrap();
        assert_eq!(PriorityModel::from_bytes(&bytes).unwrap(), model);
    }

    #[test]
    fn garbage_payload_is_a_serialization_error() {
        assert_matches!(
            PriorityModel::from_bytes(b"not a model"),
            Err(MlError::Serialization(_))
        );
    }
}
