//! Prediction types produced by image classifiers

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Probability assigned to a single class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassScore {
    /// Class label
    pub label: String,

    /// Probability (0.0-1.0)
    pub probability: f32,
}

/// Result of classifying one image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Highest-probability label
    pub label: String,

    /// Probability of `label`
    pub probability: f32,

    /// Full distribution, in label order
    pub scores: Vec<ClassScore>,

    /// Inference latency in microseconds
    pub latency_us: u64,
}

impl Prediction {
    /// Build a prediction from a probability distribution over `labels`.
    ///
    /// The two slices must have the same, non-zero length.
    pub fn from_probabilities(labels: &[String], probabilities: &[f32]) -> Result<Self> {
        if labels.len() != probabilities.len() {
            return Err(Error::model(format!(
                "model produced {} scores for {} labels",
                probabilities.len(),
                labels.len()
            )));
        }

        let (best, &probability) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .ok_or_else(|| Error::model("model produced no scores"))?;

        let scores = labels
            .iter()
            .zip(probabilities)
            .map(|(label, &probability)| ClassScore {
                label: label.clone(),
                probability,
            })
            .collect();

        Ok(Self {
            label: labels[best].clone(),
            probability,
            scores,
            latency_us: 0,
        })
    }

    /// Set the measured latency
    pub fn with_latency_us(mut self, latency_us: u64) -> Self {
        self.latency_us = latency_us;
        self
    }

    /// Human-readable summary, e.g. `amtrak train with probability 0.93`
    pub fn summary(&self) -> String {
        format!("{} with probability {}", self.label, self.probability)
    }

    /// The `k` most probable classes, highest first
    pub fn top_k(&self, k: usize) -> Vec<ClassScore> {
        let mut scores = self.scores.clone();
        scores.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        scores.truncate(k);
        scores
    }
}
