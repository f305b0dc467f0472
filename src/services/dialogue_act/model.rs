//! Serialized dialogue-act models.
//!
//! A model is a JSON file:
//!
//! ```json
//! {
//!   "labels": ["Offer", "Other"],
//!   "features": [
//!     {"kind": "continuous", "name": "num_tokens"},
//!     {"kind": "discrete", "name": "ends_with_qtn", "values": ["True", "False"]}
//!   ],
//!   "weights": {
//!     "Offer": {"bias": 0.5, "weights": {"num_tokens": 0.1, "ends_with_qtn=True": 2.0}}
//!   }
//! }
//! ```
//!
//! Continuous features are weighted by name, discrete ones by `name=value`.
//! Discrete values outside the declared domain become `?`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::features::{FeatureValue, FeatureVector};

/// Value standing in for anything outside a discrete feature's domain.
pub const UNKNOWN_VALUE: &str = "?";

/// Errors loading a model or its resources.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid model {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Model has no labels")]
    NoLabels,

    #[error("Model has weights for undeclared label '{0}'")]
    UnknownLabel(String),
}

/// Trait for pluggable dialogue-act classifiers.
pub trait Classifier {
    /// Human-readable classifier identifier.
    fn classifier_id(&self) -> &str;

    /// Labels the classifier can predict, in preference order.
    fn labels(&self) -> &[String];

    /// Most likely label for a feature vector.
    fn predict(&self, features: &FeatureVector) -> &str;
}

/// Declared domain of one feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FeatureSpec {
    Continuous { name: String },
    Discrete { name: String, values: Vec<String> },
}

impl FeatureSpec {
    pub fn name(&self) -> &str {
        match self {
            Self::Continuous { name } | Self::Discrete { name, .. } => name,
        }
    }
}

/// Bias and feature weights of one label.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelWeights {
    #[serde(default)]
    pub bias: f64,
    #[serde(default)]
    pub weights: HashMap<String, f64>,
}

/// Linear one-vs-rest model over a declared feature domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub labels: Vec<String>,
    pub features: Vec<FeatureSpec>,
    #[serde(default)]
    pub weights: HashMap<String, LabelWeights>,
}

impl LinearModel {
    /// Load and check a model file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let contents = fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let model: LinearModel =
            serde_json::from_str(&contents).map_err(|source| ModelError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        model.validate()?;
        tracing::info!(
            "Loaded model {} ({} labels, {} features)",
            path.display(),
            model.labels.len(),
            model.features.len()
        );
        Ok(model)
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.labels.is_empty() {
            return Err(ModelError::NoLabels);
        }
        if let Some(label) = self.weights.keys().find(|l| !self.labels.contains(l)) {
            return Err(ModelError::UnknownLabel(label.clone()));
        }
        Ok(())
    }

    /// Weight keys active for a feature vector, with their values.
    ///
    /// Features the model does not declare are ignored; declared features
    /// missing from the vector count as `?` (discrete) or zero.
    fn active(&self, features: &FeatureVector) -> Vec<(String, f64)> {
        self.features
            .iter()
            .map(|spec| match spec {
                FeatureSpec::Continuous { name } => {
                    let value = match features.get(name) {
                        Some(FeatureValue::Continuous(v)) => *v,
                        Some(FeatureValue::Discrete(v)) => v.parse().unwrap_or(0.0),
                        None => 0.0,
                    };
                    (name.clone(), value)
                }
                FeatureSpec::Discrete { name, values } => {
                    let raw = features.get(name).map(|v| v.to_string());
                    let value = raw
                        .filter(|v| values.contains(v))
                        .unwrap_or_else(|| UNKNOWN_VALUE.to_string());
                    (format!("{}={}", name, value), 1.0)
                }
            })
            .collect()
    }

    /// Score of every label, in label order.
    pub fn scores(&self, features: &FeatureVector) -> Vec<(&str, f64)> {
        let active = self.active(features);
        self.labels
            .iter()
            .map(|label| {
                let score = self.weights.get(label).map_or(0.0, |w| {
                    w.bias
                        + active
                            .iter()
                            .map(|(key, x)| w.weights.get(key).copied().unwrap_or(0.0) * x)
                            .sum::<f64>()
                });
                (label.as_str(), score)
            })
            .collect()
    }
}

impl Classifier for LinearModel {
    fn classifier_id(&self) -> &str {
        "linear"
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict(&self, features: &FeatureVector) -> &str {
        let mut best: Option<(&str, f64)> = None;
        for (label, score) in self.scores(features) {
            // Strictly greater, so the first label wins ties.
            if best.map_or(true, |(_, top)| score > top) {
                best = Some((label, score));
            }
        }
        best.map_or(UNKNOWN_VALUE, |(label, _)| label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = r#"{
        "labels": ["Other", "Offer", "Accept"],
        "features": [
            {"kind": "continuous", "name": "num_tokens"},
            {"kind": "discrete", "name": "word_first", "values": ["i", "ok"]}
        ],
        "weights": {
            "Offer": {"bias": -1.0, "weights": {"word_first=i": 3.0, "num_tokens": 0.1}},
            "Accept": {"weights": {"word_first=ok": 2.0, "word_first=?": 0.5}}
        }
    }"#;

    fn model() -> LinearModel {
        serde_json::from_str(MODEL).unwrap()
    }

    fn vector(first: &str, tokens: f64) -> FeatureVector {
        let mut features = FeatureVector::new();
        features.insert("num_tokens".to_string(), FeatureValue::Continuous(tokens));
        features.insert(
            "word_first".to_string(),
            FeatureValue::Discrete(first.to_string()),
        );
        features
    }

    #[test]
    fn test_predicts_top_scoring_label() {
        let model = model();
        assert_eq!(model.predict(&vector("i", 5.0)), "Offer");
        assert_eq!(model.predict(&vector("ok", 2.0)), "Accept");
    }

    #[test]
    fn test_unknown_discrete_value_maps_to_question_mark() {
        let model = model();
        let scores = model.scores(&vector("anyone", 0.0));
        assert_eq!(scores, vec![("Other", 0.0), ("Offer", -1.0), ("Accept", 0.5)]);
        assert_eq!(model.predict(&vector("anyone", 0.0)), "Accept");
    }

    #[test]
    fn test_ties_go_to_first_label() {
        let model = LinearModel {
            labels: vec!["Other".to_string(), "Offer".to_string()],
            features: Vec::new(),
            weights: HashMap::new(),
        };
        assert_eq!(model.predict(&FeatureVector::new()), "Other");
    }

    #[test]
    fn test_validation() {
        let mut model = model();
        model.weights.insert("Bogus".to_string(), LabelWeights::default());
        assert!(matches!(model.validate(), Err(ModelError::UnknownLabel(l)) if l == "Bogus"));

        model.labels.clear();
        assert!(matches!(model.validate(), Err(ModelError::NoLabels)));
    }

    #[test]
    fn test_load_failures() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = LinearModel::load(&dir.path().join("none.json")).unwrap_err();
        assert!(matches!(missing, ModelError::Io { .. }));

        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(
            LinearModel::load(&bad).unwrap_err(),
            ModelError::Parse { .. }
        ));

        let empty = dir.path().join("empty.json");
        fs::write(&empty, r#"{"labels": [], "features": []}"#).unwrap();
        assert!(matches!(
            LinearModel::load(&empty).unwrap_err(),
            ModelError::NoLabels
        ));
    }
}
