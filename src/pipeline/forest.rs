//! Random forest over binary indicator features.
//!
//! Fixed configuration: 100 CART trees, Gini impurity, bootstrap samples,
//! `sqrt(n_features)` candidate features per split, trees grown until every
//! leaf is pure or cannot be split further. All randomness flows from one
//! seeded `StdRng`, so a given design matrix always yields the same forest.
//!
//! Class probabilities are the mean of the per-tree leaf class distributions.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

pub const N_ESTIMATORS: usize = 100;
pub const RANDOM_SEED: u64 = 42;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForestError {
    #[error("No training samples")]
    NoSamples,

    #[error("Feature matrix has {rows} rows but {labels} labels")]
    LabelCount { rows: usize, labels: usize },

    #[error("Expected {expected} features, got {actual}")]
    FeatureWidth { expected: usize, actual: usize },

    #[error("Corrupt tree: {0}")]
    CorruptTree(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Node {
    Split {
        feature: usize,
        /// Child for samples with the feature absent.
        absent: usize,
        /// Child for samples with the feature present.
        present: usize,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct DecisionTree {
    nodes: Vec<Node>,
}

impl DecisionTree {
    fn distribution(&self, features: &[u8]) -> Result<&[f64], ForestError> {
        let mut index = 0;
        // A well-formed tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..=self.nodes.len() {
            match self.nodes.get(index) {
                Some(Node::Leaf { distribution }) => return Ok(distribution),
                Some(Node::Split {
                    feature,
                    absent,
                    present,
                }) => {
                    let bit = features.get(*feature).copied().ok_or_else(|| {
                        ForestError::CorruptTree(format!("feature {feature} out of range"))
                    })?;
                    index = if bit == 0 { *absent } else { *present };
                }
                None => {
                    return Err(ForestError::CorruptTree(format!("node {index} missing")));
                }
            }
        }
        Err(ForestError::CorruptTree("cycle detected".into()))
    }
}

/// Trained multi-class classifier. Class labels are kept sorted; class
/// index `i` in every probability vector refers to `classes()[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    classes: Vec<String>,
    n_features: usize,
    trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Fit with the fixed configuration (100 trees, seed 42).
    pub fn fit(features: &[Vec<u8>], labels: &[String]) -> Result<Self, ForestError> {
        Self::fit_with(features, labels, N_ESTIMATORS, RANDOM_SEED)
    }

    pub(crate) fn fit_with(
        features: &[Vec<u8>],
        labels: &[String],
        n_trees: usize,
        seed: u64,
    ) -> Result<Self, ForestError> {
        if features.is_empty() {
            return Err(ForestError::NoSamples);
        }
        if features.len() != labels.len() {
            return Err(ForestError::LabelCount {
                rows: features.len(),
                labels: labels.len(),
            });
        }
        let n_features = features[0].len();
        if let Some(row) = features.iter().find(|row| row.len() != n_features) {
            return Err(ForestError::FeatureWidth {
                expected: n_features,
                actual: row.len(),
            });
        }

        let mut classes: Vec<String> = labels.to_vec();
        classes.sort();
        classes.dedup();
        let targets: Vec<usize> = labels
            .iter()
            .map(|label| classes.binary_search(label).unwrap_or_default())
            .collect();

        let max_features = ((n_features as f64).sqrt() as usize).max(1);
        let mut rng = StdRng::seed_from_u64(seed);
        let n_samples = features.len();

        let trees = (0..n_trees)
            .map(|_| {
                let tree_seed: u64 = rng.gen();
                let mut builder = TreeBuilder {
                    features,
                    targets: &targets,
                    n_classes: classes.len(),
                    max_features,
                    rng: StdRng::seed_from_u64(tree_seed),
                    nodes: Vec::new(),
                };
                let sample: Vec<usize> = (0..n_samples)
                    .map(|_| builder.rng.gen_range(0..n_samples))
                    .collect();
                builder.grow(sample);
                DecisionTree {
                    nodes: builder.nodes,
                }
            })
            .collect();

        Ok(Self {
            classes,
            n_features,
            trees,
        })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Mean class distribution across all trees.
    pub fn predict_proba(&self, features: &[u8]) -> Result<Vec<f64>, ForestError> {
        if features.len() != self.n_features {
            return Err(ForestError::FeatureWidth {
                expected: self.n_features,
                actual: features.len(),
            });
        }

        let mut totals = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            let distribution = tree.distribution(features)?;
            if distribution.len() != totals.len() {
                return Err(ForestError::CorruptTree(format!(
                    "leaf has {} classes, forest has {}",
                    distribution.len(),
                    totals.len()
                )));
            }
            for (total, p) in totals.iter_mut().zip(distribution) {
                *total += p;
            }
        }

        let n_trees = self.trees.len().max(1) as f64;
        Ok(totals.into_iter().map(|t| t / n_trees).collect())
    }

    /// Most probable class and its probability.
    ///
    /// Equal maxima resolve to the lowest class index, i.e. the
    /// alphabetically first label. That ordering carries no meaning.
    pub fn predict(&self, features: &[u8]) -> Result<(&str, f64), ForestError> {
        let proba = self.predict_proba(features)?;
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        match self.classes.get(best) {
            Some(class) => Ok((class.as_str(), proba[best])),
            None => Err(ForestError::CorruptTree("forest has no classes".into())),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Tree growth
// ═══════════════════════════════════════════════════════════

struct TreeBuilder<'a> {
    features: &'a [Vec<u8>],
    targets: &'a [usize],
    n_classes: usize,
    max_features: usize,
    rng: StdRng,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `samples` and return its root index.
    fn grow(&mut self, samples: Vec<usize>) -> usize {
        let counts = self.class_counts(&samples);
        let is_pure = counts.iter().filter(|&&c| c > 0).count() <= 1;

        let split = if is_pure || samples.len() < 2 {
            None
        } else {
            self.best_split(&samples, &counts)
        };

        let Some(feature) = split else {
            return self.push_leaf(&counts, samples.len());
        };

        let (present, absent): (Vec<usize>, Vec<usize>) = samples
            .into_iter()
            .partition(|&s| self.features[s][feature] != 0);

        let index = self.nodes.len();
        // Placeholder, replaced once both children exist.
        self.nodes.push(Node::Leaf {
            distribution: Vec::new(),
        });
        let absent = self.grow(absent);
        let present = self.grow(present);
        self.nodes[index] = Node::Split {
            feature,
            absent,
            present,
        };
        index
    }

    fn push_leaf(&mut self, counts: &[usize], total: usize) -> usize {
        let total = total.max(1) as f64;
        self.nodes.push(Node::Leaf {
            distribution: counts.iter().map(|&c| c as f64 / total).collect(),
        });
        self.nodes.len() - 1
    }

    fn class_counts(&self, samples: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.n_classes];
        for &s in samples {
            counts[self.targets[s]] += 1;
        }
        counts
    }

    /// Lowest weighted Gini impurity among up to `max_features` randomly
    /// drawn non-constant features. Keeps drawing past the budget until at
    /// least one usable feature is found or none remain.
    fn best_split(&mut self, samples: &[usize], counts: &[usize]) -> Option<usize> {
        let n_features = self.features[samples[0]].len();
        let mut order: Vec<usize> = (0..n_features).collect();
        order.shuffle(&mut self.rng);

        let mut best: Option<(usize, f64)> = None;
        let mut evaluated = 0;

        for feature in order {
            if evaluated >= self.max_features && best.is_some() {
                break;
            }

            let mut present = vec![0usize; self.n_classes];
            let mut n_present = 0;
            for &s in samples {
                if self.features[s][feature] != 0 {
                    present[self.targets[s]] += 1;
                    n_present += 1;
                }
            }
            let n_absent = samples.len() - n_present;
            if n_present == 0 || n_absent == 0 {
                continue;
            }
            evaluated += 1;

            let absent: Vec<usize> = counts.iter().zip(&present).map(|(c, p)| c - p).collect();
            let impurity = (n_present as f64 * gini(&present, n_present)
                + n_absent as f64 * gini(&absent, n_absent))
                / samples.len() as f64;

            if best.map_or(true, |(_, b)| impurity < b) {
                best = Some((feature, impurity));
            }
        }

        best.map(|(feature, _)| feature)
    }
}

fn gini(counts: &[usize], total: usize) -> f64 {
    let total = total as f64;
    1.0 - counts
        .iter()
        .map(|&c| {
            let p = c as f64 / total;
            p * p
        })
        .sum::<f64>()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Three classes, each identified by its own feature.
    fn separable() -> (Vec<Vec<u8>>, Vec<String>) {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for _ in 0..10 {
            x.push(vec![1, 0, 0, 1]);
            y.push("Alpha".to_string());
            x.push(vec![0, 1, 0, 1]);
            y.push("Beta".to_string());
            x.push(vec![0, 0, 1, 0]);
            y.push("Gamma".to_string());
        }
        (x, y)
    }

    #[test]
    fn classes_are_sorted_and_distinct() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y).unwrap();
        assert_eq!(forest.classes(), &["Alpha", "Beta", "Gamma"]);
        assert_eq!(forest.n_trees(), N_ESTIMATORS);
        assert_eq!(forest.n_features(), 4);
    }

    #[test]
    fn training_patterns_are_predicted_with_full_confidence() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y).unwrap();
        for (row, label) in [
            (vec![1, 0, 0, 1], "Alpha"),
            (vec![0, 1, 0, 1], "Beta"),
            (vec![0, 0, 1, 0], "Gamma"),
        ] {
            let (class, confidence) = forest.predict(&row).unwrap();
            assert_eq!(class, label);
            assert!(confidence > 0.9, "{label}: {confidence}");
        }
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (x, y) = separable();
        let forest = RandomForest::fit(&x, &y).unwrap();
        for row in [vec![0, 0, 0, 1], vec![1, 1, 0, 0], vec![0, 0, 0, 0]] {
            let proba = forest.predict_proba(&row).unwrap();
            let sum: f64 = proba.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9, "sum was {sum}");
        }
    }

    #[test]
    fn same_seed_same_forest() {
        let (x, y) = separable();
        let a = RandomForest::fit_with(&x, &y, 10, 7).unwrap();
        let b = RandomForest::fit_with(&x, &y, 10, 7).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn identical_features_with_mixed_labels_form_a_leaf() {
        let x = vec![vec![1, 0]; 4];
        let y = labels(&["A", "B", "A", "B"]);
        let forest = RandomForest::fit_with(&x, &y, 5, 1).unwrap();
        assert_eq!(forest.classes(), &["A", "B"]);
        let proba = forest.predict_proba(&[1, 0]).unwrap();
        let sum: f64 = proba.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn wrong_width_is_rejected() {
        let (x, y) = separable();
        let forest = RandomForest::fit_with(&x, &y, 3, 1).unwrap();
        assert_eq!(
            forest.predict(&[1, 0]).unwrap_err(),
            ForestError::FeatureWidth {
                expected: 4,
                actual: 2
            }
        );
    }

    #[test]
    fn fit_validates_inputs() {
        assert_eq!(
            RandomForest::fit(&[], &[]).unwrap_err(),
            ForestError::NoSamples
        );
        assert!(matches!(
            RandomForest::fit(&[vec![1]], &labels(&["A", "B"])),
            Err(ForestError::LabelCount { .. })
        ));
        assert!(matches!(
            RandomForest::fit(&[vec![1], vec![1, 0]], &labels(&["A", "B"])),
            Err(ForestError::FeatureWidth { .. })
        ));
    }

    #[test]
    fn serde_round_trip_predicts_identically() {
        let (x, y) = separable();
        let forest = RandomForest::fit_with(&x, &y, 8, 3).unwrap();
        let json = serde_json::to_string(&forest).unwrap();
        let restored: RandomForest = serde_json::from_str(&json).unwrap();
        let restored_proba = restored.predict_proba(&[0, 1, 0, 1]).unwrap();
        let proba = forest.predict_proba(&[0, 1, 0, 1]).unwrap();
        for (a, b) in restored_proba.iter().zip(&proba) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
