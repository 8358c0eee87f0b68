use facecascade_core::IntegralImage;
use serde::{Deserialize, Serialize};

use crate::feature::Feature;

/// Single-feature binary rule with the weight it contributes when it passes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WeakClassifier {
    pub feature: Feature,
    pub voting_weight: f32,
}

impl WeakClassifier {
    pub fn new(feature: Feature, voting_weight: f32) -> Self {
        Self {
            feature,
            voting_weight,
        }
    }

    #[inline]
    pub fn classify(&self, integral: &IntegralImage, x: i32, y: i32, scale: f32) -> bool {
        self.feature
            .decide(self.feature.value(integral, x, y, scale))
    }
}

/// Strong classifier: one gate of the attentional cascade.
///
/// Classifiers are evaluated in insertion order and every vote is summed;
/// there is no early exit inside a stage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    classifiers: Vec<WeakClassifier>,
    threshold: f32,
}

impl Stage {
    pub fn new(threshold: f32) -> Self {
        Self {
            classifiers: Vec::new(),
            threshold,
        }
    }

    pub fn with_classifiers(threshold: f32, classifiers: Vec<WeakClassifier>) -> Self {
        Self {
            classifiers,
            threshold,
        }
    }

    pub fn push(&mut self, classifier: WeakClassifier) {
        self.classifiers.push(classifier);
    }

    #[inline]
    pub fn classifiers(&self) -> &[WeakClassifier] {
        &self.classifiers
    }

    #[inline]
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.classifiers.is_empty()
    }

    /// Sum of the voting weights of every classifier that passes.
    pub fn vote(&self, integral: &IntegralImage, x: i32, y: i32, scale: f32) -> f32 {
        self.classifiers
            .iter()
            .filter(|wc| wc.classify(integral, x, y, scale))
            .map(|wc| wc.voting_weight)
            .sum()
    }

    /// Whether the window passes this gate. An empty stage never passes.
    pub fn passes(&self, integral: &IntegralImage, x: i32, y: i32, scale: f32) -> bool {
        if self.classifiers.is_empty() {
            return false;
        }
        self.vote(integral, x, y, scale) >= self.threshold
    }
}
