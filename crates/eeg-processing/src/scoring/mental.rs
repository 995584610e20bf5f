//! Screening scorers for mood, attention, seizure-like activity and state

use super::{ConditionScore, Jitter, Severity, Tally};
use crate::features::{mean_over, ChannelFeatures, EegFeatures};
use rand::Rng;
use serde::{Deserialize, Serialize};

const SCREENING_JITTER: Jitter = Jitter::Symmetric(0.1);
const STATE_JITTER: Jitter = Jitter::Positive(0.1);

/// Conditions are reported by [`screen_conditions`] above this score
pub const REPORT_THRESHOLD: f64 = 0.6;

fn mean_band<F>(features: &EegFeatures, f: F) -> Option<f64>
where
    F: Fn(&ChannelFeatures) -> Option<f64>,
{
    mean_over(features.channels.values(), f)
}

fn screening_result(condition: &str, score: f64, markers: Vec<super::Marker>) -> ConditionScore {
    let severity = if score > 0.8 {
        Severity::High
    } else if score > REPORT_THRESHOLD {
        Severity::Moderate
    } else {
        Severity::None
    };
    ConditionScore {
        condition: condition.to_string(),
        score,
        markers,
        label: severity.to_string(),
        severity,
        interpretation: None,
        suggestion: None,
    }
}

pub fn score_depression<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(asymmetry) = features.asymmetry.frontal.filter(|a| *a != 0.0) {
        if asymmetry > 0.1 {
            tally.mark(0.4, "frontal_alpha_asymmetry", asymmetry, "right-dominant frontal alpha");
        } else if asymmetry < -0.1 {
            tally.mark(0.1, "frontal_alpha_asymmetry", asymmetry, "left-dominant frontal alpha");
        } else {
            tally.add(0.2);
        }
    }

    let alpha_theta = mean_band(features, |c| {
        (c.bands.theta > 0.0).then(|| c.bands.alpha / c.bands.theta)
    });
    if let Some(ratio) = alpha_theta {
        if ratio < 0.8 {
            tally.mark(0.4, "alpha_theta_ratio", ratio, "markedly low alpha/theta ratio");
        } else if ratio < 1.0 {
            tally.mark(0.3, "alpha_theta_ratio", ratio, "low alpha/theta ratio");
        } else if ratio < 1.2 {
            tally.mark(0.2, "alpha_theta_ratio", ratio, "slightly low alpha/theta ratio");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(SCREENING_JITTER, rng);
    screening_result("Depression", score, markers)
}

pub fn score_anxiety<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(beta) = mean_band(features, |c| Some(c.bands.beta)) {
        if beta > 0.3 {
            tally.mark(0.5, "beta_power", beta, "strongly elevated beta activity");
        } else if beta > 0.2 {
            tally.mark(0.4, "beta_power", beta, "elevated beta activity");
        } else if beta > 0.15 {
            tally.mark(0.3, "beta_power", beta, "moderately elevated beta activity");
        } else if beta > 0.1 {
            tally.mark(0.2, "beta_power", beta, "slightly elevated beta activity");
        } else {
            tally.add(0.1);
        }
    }

    if let Some(alpha) = mean_band(features, |c| Some(c.bands.alpha)) {
        if alpha < 0.1 {
            tally.mark(0.3, "alpha_power", alpha, "suppressed alpha activity");
        } else if alpha < 0.15 {
            tally.mark(0.2, "alpha_power", alpha, "reduced alpha activity");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(SCREENING_JITTER, rng);
    screening_result("Anxiety", score, markers)
}

pub fn score_adhd<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    let theta_beta = mean_band(features, |c| {
        (c.bands.beta > 0.0).then(|| c.bands.theta / c.bands.beta)
    });
    if let Some(ratio) = theta_beta {
        if ratio > 3.0 {
            tally.mark(0.5, "theta_beta_ratio", ratio, "very high theta/beta ratio");
        } else if ratio > 2.5 {
            tally.mark(0.4, "theta_beta_ratio", ratio, "high theta/beta ratio");
        } else if ratio > 2.0 {
            tally.mark(0.3, "theta_beta_ratio", ratio, "elevated theta/beta ratio");
        } else if ratio > 1.5 {
            tally.mark(0.2, "theta_beta_ratio", ratio, "borderline theta/beta ratio");
        } else {
            tally.add(0.1);
        }
    }

    if let Some(delta) = mean_band(features, |c| Some(c.bands.delta)) {
        if delta > 0.3 {
            tally.mark(0.3, "delta_power", delta, "elevated delta activity");
        } else if delta > 0.2 {
            tally.mark(0.2, "delta_power", delta, "slightly elevated delta activity");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(SCREENING_JITTER, rng);
    screening_result("ADHD", score, markers)
}

pub fn score_epilepsy<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(complexity) = mean_band(features, |c| Some(c.complexity)) {
        if complexity < 0.2 {
            tally.mark(0.4, "signal_complexity", complexity, "highly regular signal");
        } else if complexity < 0.3 {
            tally.mark(0.3, "signal_complexity", complexity, "low signal complexity");
        } else if complexity < 0.4 {
            tally.mark(0.2, "signal_complexity", complexity, "reduced signal complexity");
        } else {
            tally.add(0.1);
        }
    }

    if let Some(gamma) = mean_band(features, |c| Some(c.bands.gamma)) {
        if gamma > 0.2 {
            tally.mark(0.4, "gamma_power", gamma, "strongly elevated gamma activity");
        } else if gamma > 0.15 {
            tally.mark(0.3, "gamma_power", gamma, "elevated gamma activity");
        } else if gamma > 0.1 {
            tally.mark(0.2, "gamma_power", gamma, "slightly elevated gamma activity");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(SCREENING_JITTER, rng);
    screening_result("Epilepsy", score, markers)
}

pub fn score_cognitive_state<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    let alpha_beta = mean_band(features, |c| {
        (c.bands.beta > 0.0).then(|| c.bands.alpha / c.bands.beta)
    });
    if let Some(ratio) = alpha_beta {
        if ratio > 0.8 && ratio < 1.5 {
            tally.mark(0.6, "alpha_beta_ratio", ratio, "balanced alpha/beta ratio");
        } else if ratio > 0.6 && ratio < 2.0 {
            tally.mark(0.4, "alpha_beta_ratio", ratio, "near-balanced alpha/beta ratio");
        } else {
            tally.add(0.2);
        }
    }

    if let Some(gamma) = mean_band(features, |c| Some(c.bands.gamma)) {
        if gamma > 0.1 && gamma < 0.2 {
            tally.mark(0.4, "gamma_power", gamma, "gamma in the active-processing range");
        } else if gamma > 0.05 && gamma < 0.25 {
            tally.mark(0.3, "gamma_power", gamma, "gamma near the active-processing range");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(STATE_JITTER, rng);
    let label = if score > 0.8 {
        "Excellent"
    } else if score > 0.6 {
        "Good"
    } else if score > 0.4 {
        "Fair"
    } else {
        "Weak"
    };

    ConditionScore {
        condition: "Cognitive state".to_string(),
        score,
        markers,
        severity: Severity::None,
        label: label.to_string(),
        interpretation: None,
        suggestion: None,
    }
}

pub fn score_alertness<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(theta) = mean_band(features, |c| Some(c.bands.theta)) {
        if theta > 0.3 {
            tally.mark(0.2, "theta_power", theta, "high theta, drowsiness pattern");
        } else if theta > 0.2 {
            tally.mark(0.4, "theta_power", theta, "moderate theta");
        } else if theta > 0.1 {
            tally.mark(0.6, "theta_power", theta, "low theta");
        } else {
            tally.add(0.5);
        }
    }

    if let Some(beta) = mean_band(features, |c| Some(c.bands.beta)) {
        if beta > 0.2 {
            tally.mark(0.4, "beta_power", beta, "strong beta, engaged state");
        } else if beta > 0.1 {
            tally.mark(0.3, "beta_power", beta, "moderate beta");
        } else {
            tally.add(0.1);
        }
    }

    let (score, markers) = tally.finish(STATE_JITTER, rng);
    let label = if score > 0.8 {
        "Highly alert"
    } else if score > 0.6 {
        "Alert"
    } else if score > 0.4 {
        "Relaxed"
    } else if score > 0.2 {
        "Fatigued"
    } else {
        "Drowsy"
    };

    ConditionScore {
        condition: "Alertness".to_string(),
        score,
        markers,
        severity: Severity::None,
        label: label.to_string(),
        interpretation: None,
        suggestion: None,
    }
}

/// Screening condition that crossed the report threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PotentialCondition {
    pub score: ConditionScore,
    /// In `[0.55, 0.95)`
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningReport {
    pub conditions: Vec<PotentialCondition>,
    pub cognitive_state: ConditionScore,
    pub alertness: ConditionScore,
    /// In `[0.65, 0.95)`
    pub confidence: f64,
}

/// Run every screening scorer and keep the conditions scoring above
/// [`REPORT_THRESHOLD`]
pub fn screen_conditions<R: Rng + ?Sized>(features: &EegFeatures, rng: &mut R) -> ScreeningReport {
    let candidates = [
        score_depression(features, rng),
        score_anxiety(features, rng),
        score_adhd(features, rng),
        score_epilepsy(features, rng),
    ];
    let cognitive_state = score_cognitive_state(features, rng);
    let alertness = score_alertness(features, rng);
    let confidence = 0.65 + rng.gen::<f64>() * 0.3;

    let conditions = candidates
        .into_iter()
        .filter(|score| score.score > REPORT_THRESHOLD)
        .map(|score| PotentialCondition {
            score,
            confidence: 0.55 + rng.gen::<f64>() * 0.4,
        })
        .collect();

    ScreeningReport {
        conditions,
        cognitive_state,
        alertness,
        confidence,
    }
}
