//! Predictor models scoring candidate terms and tuples.
//!
//! A [`Predictor`] maps a fixed-length feature vector to a score; higher
//! means "try earlier". The engine treats models as opaque, so anything
//! implementing the trait plugs in. Two serde-loadable models are provided:
//! a logistic-regression scorer and a regression-tree ensemble.

use serde::{Deserialize, Serialize};

use crate::error::{EnumError, Result};

/// Opaque scoring model over a fixed feature layout.
pub trait Predictor {
    /// Number of features this model consumes.
    fn num_features(&self) -> usize;

    /// Score a feature vector. `features.len()` must equal
    /// [`num_features`](Predictor::num_features).
    fn predict(&self, features: &[f64]) -> f64;
}

/// Numerically stable logistic sigmoid.
///
/// Splits on the sign of the exponent so neither branch exponentiates a
/// large positive value.
pub fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Logistic-regression predictor.
///
/// Coefficients are intercept-first: slot 0 is the bias, slot `i + 1`
/// multiplies feature `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigmoidPredictor {
    coefficients: Vec<f64>,
}

impl SigmoidPredictor {
    /// Build from an intercept-first coefficient vector.
    pub fn new(coefficients: Vec<f64>) -> Result<Self> {
        if coefficients.is_empty() {
            return Err(EnumError::InvalidModel(
                "sigmoid predictor needs at least the intercept coefficient".to_string(),
            ));
        }
        Ok(Self { coefficients })
    }

    /// Load from the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| EnumError::Serialization(e.to_string()))?;
        if model.coefficients.is_empty() {
            return Err(EnumError::InvalidModel(
                "sigmoid predictor needs at least the intercept coefficient".to_string(),
            ));
        }
        Ok(model)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EnumError::Serialization(e.to_string()))
    }
}

impl Predictor for SigmoidPredictor {
    fn num_features(&self) -> usize {
        self.coefficients.len() - 1
    }

    fn predict(&self, features: &[f64]) -> f64 {
        debug_assert_eq!(features.len(), self.num_features());
        let mut exponent = self.coefficients[0];
        for (c, f) in self.coefficients[1..].iter().zip(features) {
            exponent += c * f;
        }
        sigmoid(exponent)
    }
}

/// One node of a regression tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: go left when `features[feature] < threshold`.
    Internal {
        /// Feature slot tested at this node.
        feature: usize,
        /// Split threshold.
        threshold: f64,
        /// Subtree for `features[feature] < threshold`.
        left: Box<TreeNode>,
        /// Subtree for `features[feature] >= threshold`.
        right: Box<TreeNode>,
    },
    /// Leaf contribution.
    Leaf {
        /// Value added to the ensemble output.
        value: f64,
    },
}

impl TreeNode {
    fn eval(&self, features: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                if features[*feature] < *threshold {
                    left.eval(features)
                } else {
                    right.eval(features)
                }
            }
        }
    }

    fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf { .. } => None,
            TreeNode::Internal {
                feature,
                left,
                right,
                ..
            } => {
                let mut max = *feature;
                if let Some(m) = left.max_feature() {
                    max = max.max(m);
                }
                if let Some(m) = right.max_feature() {
                    max = max.max(m);
                }
                Some(max)
            }
        }
    }
}

/// Additive regression-tree ensemble.
///
/// Output is `base_score` plus the sum of the leaf values each tree routes
/// the feature vector to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoostedTreesPredictor {
    trees: Vec<TreeNode>,
    base_score: f64,
    num_features: usize,
}

impl BoostedTreesPredictor {
    /// Build an ensemble; rejects trees referencing features outside
    /// `0..num_features`.
    pub fn new(trees: Vec<TreeNode>, base_score: f64, num_features: usize) -> Result<Self> {
        for tree in &trees {
            if let Some(max) = tree.max_feature() {
                if max >= num_features {
                    return Err(EnumError::InvalidModel(format!(
                        "tree references feature {max} but the model declares {num_features}"
                    )));
                }
            }
        }
        Ok(Self {
            trees,
            base_score,
            num_features,
        })
    }

    /// Load from the JSON produced by [`to_json`](Self::to_json).
    pub fn from_json(json: &str) -> Result<Self> {
        let model: Self =
            serde_json::from_str(json).map_err(|e| EnumError::Serialization(e.to_string()))?;
        Self::new(model.trees, model.base_score, model.num_features)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EnumError::Serialization(e.to_string()))
    }
}

impl Predictor for BoostedTreesPredictor {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict(&self, features: &[f64]) -> f64 {
        debug_assert_eq!(features.len(), self.num_features);
        self.base_score + self.trees.iter().map(|t| t.eval(features)).sum::<f64>()
    }
}

/// Predictor returning a fixed score regardless of input.
///
/// Baseline model: under a constant score the best-first enumerator reduces
/// to breadth-first order.
#[derive(Debug, Clone)]
pub struct ConstantPredictor {
    value: f64,
    num_features: usize,
}

impl ConstantPredictor {
    /// Constant model with the given score and declared feature count.
    pub fn new(value: f64, num_features: usize) -> Self {
        Self {
            value,
            num_features,
        }
    }
}

impl Predictor for ConstantPredictor {
    fn num_features(&self) -> usize {
        self.num_features
    }

    fn predict(&self, _features: &[f64]) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_values() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!((sigmoid(4.0) + sigmoid(-4.0) - 1.0).abs() < 1e-12);
        assert!(sigmoid(40.0) > 0.999);
        assert!(sigmoid(-40.0) < 0.001);
        // extreme inputs stay finite
        assert!(sigmoid(1e6).is_finite());
        assert!(sigmoid(-1e6).is_finite());
    }

    #[test]
    fn test_sigmoid_predictor() {
        // bias 1, weights [2, -1]
        let p = SigmoidPredictor::new(vec![1.0, 2.0, -1.0]).unwrap();
        assert_eq!(p.num_features(), 2);
        // exponent = 1 + 2*0.5 - 1*2 = 0
        assert!((p.predict(&[0.5, 2.0]) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_sigmoid_predictor_rejects_empty() {
        assert!(matches!(
            SigmoidPredictor::new(vec![]),
            Err(EnumError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_tree_ensemble_routing() {
        let tree = TreeNode::Internal {
            feature: 0,
            threshold: 1.0,
            left: Box::new(TreeNode::Leaf { value: -1.0 }),
            right: Box::new(TreeNode::Leaf { value: 2.0 }),
        };
        let p = BoostedTreesPredictor::new(vec![tree], 0.5, 1).unwrap();
        assert_eq!(p.num_features(), 1);
        assert!((p.predict(&[0.0]) - (-0.5)).abs() < 1e-12);
        assert!((p.predict(&[1.0]) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_tree_ensemble_rejects_out_of_range_feature() {
        let tree = TreeNode::Internal {
            feature: 3,
            threshold: 0.0,
            left: Box::new(TreeNode::Leaf { value: 0.0 }),
            right: Box::new(TreeNode::Leaf { value: 0.0 }),
        };
        assert!(matches!(
            BoostedTreesPredictor::new(vec![tree], 0.0, 2),
            Err(EnumError::InvalidModel(_))
        ));
    }

    #[test]
    fn test_sigmoid_json_round_trip() {
        let p = SigmoidPredictor::new(vec![0.25, -1.5, 3.0]).unwrap();
        let json = p.to_json().unwrap();
        let q = SigmoidPredictor::from_json(&json).unwrap();
        assert_eq!(q.num_features(), 2);
        let f = [1.0, 2.0];
        assert_eq!(p.predict(&f), q.predict(&f));
    }
}
