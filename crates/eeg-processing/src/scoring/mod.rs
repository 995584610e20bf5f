//! Rule-based condition scorers
//!
//! Every scorer sums fixed rule points, adds a small bounded perturbation
//! drawn from a caller-supplied generator and clamps to `[0, 1]`. A rule
//! whose inputs are missing contributes nothing.

pub mod mental;
pub mod neuro;

pub use mental::*;
pub use neuro::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Threshold crossing that contributed to a score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    pub value: f64,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Mild,
    Moderate,
    Elevated,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::None => "none",
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Elevated => "elevated",
            Severity::High => "high",
        };
        f.write_str(label)
    }
}

/// Output of one scorer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionScore {
    pub condition: String,
    /// Always within `[0, 1]`
    pub score: f64,
    pub markers: Vec<Marker>,
    pub severity: Severity,
    /// Short human-readable category, e.g. "Good" or "Fatigued"
    pub label: String,
    pub interpretation: Option<String>,
    pub suggestion: Option<String>,
}

/// Perturbation applied to a rule sum
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Jitter {
    /// Uniform in `[-half_width, half_width)`
    Symmetric(f64),
    /// Uniform in `[0, max)`
    Positive(f64),
}

impl Jitter {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.gen();
        match *self {
            Jitter::Symmetric(half_width) => u * 2.0 * half_width - half_width,
            Jitter::Positive(max) => u * max,
        }
    }

    /// Largest absolute deviation this jitter can introduce
    pub fn bound(&self) -> f64 {
        match *self {
            Jitter::Symmetric(w) | Jitter::Positive(w) => w,
        }
    }
}

/// Accumulates rule points and markers for one scorer
#[derive(Debug, Default)]
pub(crate) struct Tally {
    points: f64,
    markers: Vec<Marker>,
}

impl Tally {
    pub(crate) fn add(&mut self, points: f64) {
        self.points += points;
    }

    /// Add points and record the threshold crossing
    pub(crate) fn mark(&mut self, points: f64, name: &str, value: f64, description: impl Into<String>) {
        self.points += points;
        self.markers.push(Marker {
            name: name.to_string(),
            value,
            description: description.into(),
        });
    }

    /// Apply jitter, clamp and return `(score, markers)`
    pub(crate) fn finish<R: Rng + ?Sized>(self, jitter: Jitter, rng: &mut R) -> (f64, Vec<Marker>) {
        let score = (self.points + jitter.sample(rng)).clamp(0.0, 1.0);
        (score, self.markers)
    }
}

/// Population standard deviation
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// `max − min`, `None` with fewer than two values
pub(crate) fn spread(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
    let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
    Some(max - min)
}
