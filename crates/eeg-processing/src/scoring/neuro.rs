//! Neurodegenerative pattern scorers

use super::{spread, std_dev, ConditionScore, Jitter, Marker, Severity, Tally};
use crate::biomarkers::band_ratio;
use crate::features::{mean_over, NeuroChannelFeatures, NeuroFeatures};
use eeg_core::{Montage, Region};
use rand::Rng;
use serde::{Deserialize, Serialize};

const NEURO_JITTER: Jitter = Jitter::Symmetric(0.05);
const PARKINSONS_JITTER: Jitter = Jitter::Symmetric(0.025);

/// Scores of all four neurodegenerative patterns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeurodegenerativeReport {
    pub alzheimers: ConditionScore,
    pub parkinsons: ConditionScore,
    pub vascular_dementia: ConditionScore,
    pub lewy_bodies: ConditionScore,
}

fn values<F>(features: &NeuroFeatures, f: F) -> Vec<f64>
where
    F: Fn(&NeuroChannelFeatures) -> f64,
{
    features.channels.values().map(f).collect()
}

fn mean(features: &NeuroFeatures, f: impl Fn(&NeuroChannelFeatures) -> Option<f64>) -> Option<f64> {
    mean_over(features.channels.values(), f)
}

/// Mean of `f` over the selected channels of a region pair
fn region_mean(
    features: &NeuroFeatures,
    montage: &Montage,
    region: Region,
    f: impl Fn(&NeuroChannelFeatures) -> Option<f64>,
) -> Option<f64> {
    let (left, right) = montage.pair(region)?;
    let channels = [left, right];
    mean_over(
        channels.iter().filter_map(|name| features.channels.get(*name)),
        f,
    )
}

/// Denominator floor for sub-band ratios
fn floor(power: f64) -> f64 {
    if power > 0.0 {
        power
    } else {
        0.001
    }
}

fn three_band_result(condition: &str, score: f64, markers: Vec<Marker>) -> ConditionScore {
    let (severity, interpretation) = if score > 0.7 {
        (Severity::High, format!("Pattern strongly consistent with {}", condition))
    } else if score > 0.4 {
        (Severity::Moderate, format!("Some features consistent with {}", condition))
    } else {
        (Severity::None, format!("No significant {} pattern", condition))
    };
    ConditionScore {
        condition: condition.to_string(),
        score,
        markers,
        label: severity.to_string(),
        severity,
        interpretation: Some(interpretation),
        suggestion: None,
    }
}

/// Frontal/temporal coherence imbalance, shared by the dementia scorers
fn coherence_asymmetry_rule(features: &NeuroFeatures, tally: &mut Tally) {
    if let (Some(frontal), Some(temporal)) = (features.coherence.frontal, features.coherence.temporal) {
        let diff = (frontal - temporal).abs();
        if diff > 0.3 {
            tally.mark(0.25, "coherence_asymmetry", diff, "marked frontal/temporal coherence imbalance");
        } else if diff > 0.15 {
            tally.mark(0.15, "coherence_asymmetry", diff, "frontal/temporal coherence imbalance");
        }
    }
}

fn entropy_spread_rule(features: &NeuroFeatures, tally: &mut Tally) {
    if let Some(diff) = spread(&values(features, |c| c.spectral_entropy)) {
        if diff > 0.3 {
            tally.mark(0.2, "entropy_spread", diff, "large regional differences in spectral entropy");
        } else if diff > 0.15 {
            tally.mark(0.1, "entropy_spread", diff, "regional differences in spectral entropy");
        }
    }
}

pub fn score_alzheimers<R: Rng + ?Sized>(features: &NeuroFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();
    let slow_wave = mean(features, |c| Some(c.slow_wave_ratio));

    if let Some(ratio) = slow_wave.filter(|r| *r > 2.5) {
        tally.mark(0.3, "slow_wave_ratio", ratio, "diffuse slowing of background rhythm");
    }
    coherence_asymmetry_rule(features, &mut tally);
    entropy_spread_rule(features, &mut tally);
    if let Some(ratio) = slow_wave.filter(|r| *r > 2.2) {
        tally.mark(0.15, "theta_delta_dominance", ratio, "slow bands dominate fast bands");
    }

    let (score, markers) = tally.finish(NEURO_JITTER, rng);
    three_band_result("Alzheimer's disease", score, markers)
}

pub fn score_vascular_dementia<R: Rng + ?Sized>(features: &NeuroFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(diff) = spread(&values(features, |c| c.slow_wave_ratio)) {
        if diff > 1.0 {
            tally.mark(0.3, "focal_slowing", diff, "strongly focal slow-wave distribution");
        } else if diff > 0.5 {
            tally.mark(0.2, "focal_slowing", diff, "focal slow-wave distribution");
        }
    }
    coherence_asymmetry_rule(features, &mut tally);
    entropy_spread_rule(features, &mut tally);
    if let Some(ratio) = mean(features, |c| Some(c.slow_wave_ratio)).filter(|r| *r > 2.2) {
        tally.mark(0.15, "slow_wave_ratio", ratio, "overall slowing");
    }

    let (score, markers) = tally.finish(NEURO_JITTER, rng);
    three_band_result("vascular dementia", score, markers)
}

pub fn score_parkinsons<R: Rng + ?Sized>(
    features: &NeuroFeatures,
    montage: &Montage,
    rng: &mut R,
) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(high_beta) = mean(features, |c| Some(c.high_beta)) {
        if high_beta > 0.25 {
            tally.mark(0.3, "high_beta_power", high_beta, "strongly elevated high beta");
        } else if high_beta > 0.2 {
            tally.mark(0.2, "high_beta_power", high_beta, "elevated high beta");
        }
    }
    let beta_ratio = mean(features, |c| Some(c.high_beta / floor(c.low_beta)));
    if let Some(ratio) = beta_ratio.filter(|r| *r > 1.5) {
        tally.mark(0.15, "beta_ratio", ratio, "high beta outweighs low beta");
    }

    if let Some(tremor) = mean(features, |c| Some(c.tremor)) {
        if tremor > 0.18 {
            tally.mark(0.3, "tremor_band_power", tremor, "strong 4-6Hz tremor band activity");
        } else if tremor > 0.12 {
            tally.mark(0.2, "tremor_band_power", tremor, "4-6Hz tremor band activity");
        }
    }
    let tremor_ratio = mean(features, |c| Some(c.tremor / floor(c.non_tremor)));
    if let Some(ratio) = tremor_ratio.filter(|r| *r > 1.5) {
        tally.mark(0.15, "tremor_ratio", ratio, "tremor band dominates theta");
    }

    let motor_coherence = mean_over(
        [features.coherence.frontal, features.coherence.central].iter(),
        |c| *c,
    );
    if let Some(coherence) = motor_coherence {
        if coherence > 0.65 {
            tally.mark(0.25, "motor_frontal_coherence", coherence, "strong motor/frontal coupling");
        } else if coherence > 0.5 {
            tally.mark(0.15, "motor_frontal_coherence", coherence, "increased motor/frontal coupling");
        }
    }

    if let Some(mu) = region_mean(features, montage, Region::TemporoParietal, |c| Some(c.bands.alpha)) {
        if mu > 0.25 {
            tally.mark(0.2, "mu_rhythm", mu, "strong mu rhythm over sensorimotor cortex");
        } else if mu > 0.2 {
            tally.mark(0.1, "mu_rhythm", mu, "elevated mu rhythm");
        }
    }

    let frontal_alpha_theta = region_mean(features, montage, Region::Frontal, |c| {
        (c.bands.theta > 0.0).then(|| c.bands.alpha / c.bands.theta)
    });
    if let Some(ratio) = frontal_alpha_theta {
        if ratio < 0.8 {
            tally.mark(0.2, "frontal_alpha_theta", ratio, "markedly low frontal alpha/theta");
        } else if ratio < 1.0 {
            tally.mark(0.1, "frontal_alpha_theta", ratio, "low frontal alpha/theta");
        }
    }

    let modulation = values(features, |c| c.amplitude_modulation);
    if modulation.len() > 1 {
        let mean = modulation.iter().sum::<f64>() / modulation.len() as f64;
        let variation = band_ratio(std_dev(&modulation), mean);
        if variation > 0.5 {
            tally.mark(0.15, "amplitude_modulation_variation", variation, "highly irregular amplitude modulation");
        } else if variation > 0.3 {
            tally.mark(0.1, "amplitude_modulation_variation", variation, "irregular amplitude modulation");
        }
    }

    let (score, markers) = tally.finish(PARKINSONS_JITTER, rng);
    let (severity, interpretation, suggestion) = if score > 0.75 {
        (
            Severity::High,
            "Multiple strong markers of Parkinsonian activity",
            "Recommend prompt neurological evaluation",
        )
    } else if score > 0.6 {
        (
            Severity::Elevated,
            "Several markers of Parkinsonian activity",
            "Recommend neurological consultation",
        )
    } else if score > 0.4 {
        (
            Severity::Moderate,
            "Some markers of Parkinsonian activity",
            "Consider follow-up recording and clinical review",
        )
    } else if score > 0.25 {
        (
            Severity::Mild,
            "Isolated markers of Parkinsonian activity",
            "Monitor with periodic recordings",
        )
    } else {
        (
            Severity::None,
            "No significant Parkinsonian pattern",
            "No action indicated",
        )
    };

    ConditionScore {
        condition: "Parkinson's disease".to_string(),
        score,
        markers,
        label: severity.to_string(),
        severity,
        interpretation: Some(interpretation.to_string()),
        suggestion: Some(suggestion.to_string()),
    }
}

pub fn score_lewy_bodies<R: Rng + ?Sized>(features: &NeuroFeatures, rng: &mut R) -> ConditionScore {
    let mut tally = Tally::default();

    if let Some(am) = mean(features, |c| Some(c.amplitude_modulation)) {
        if am > 0.8 || am < 0.2 {
            tally.mark(0.3, "amplitude_fluctuation", am, "marked fluctuation in amplitude modulation");
        } else if am > 0.7 || am < 0.3 {
            tally.mark(0.2, "amplitude_fluctuation", am, "fluctuation in amplitude modulation");
        }
    }

    let theta_alpha = mean(features, |c| {
        (c.bands.alpha > 0.0).then(|| c.bands.theta / c.bands.alpha)
    });
    if let Some(ratio) = theta_alpha.filter(|r| *r > 1.2 && *r < 1.8) {
        tally.mark(0.25, "theta_alpha_ratio", ratio, "posterior theta/alpha in the fluctuating range");
    }

    if let Some(coherence) = features.coherence.fronto_temporal {
        if coherence < 0.25 {
            tally.mark(0.25, "fronto_temporal_coherence", coherence, "strongly reduced fronto-temporal coupling");
        } else if coherence < 0.35 {
            tally.mark(0.15, "fronto_temporal_coherence", coherence, "reduced fronto-temporal coupling");
        }
    }

    let peaks = values(features, |c| c.alpha_peak);
    if peaks.len() > 1 {
        let variability = std_dev(&peaks);
        if variability > 0.8 {
            tally.mark(0.2, "alpha_peak_variability", variability, "unstable alpha peak frequency");
        } else if variability > 0.5 {
            tally.mark(0.1, "alpha_peak_variability", variability, "variable alpha peak frequency");
        }
    }

    let (score, markers) = tally.finish(NEURO_JITTER, rng);
    three_band_result("Lewy body dementia", score, markers)
}

pub fn score_neurodegenerative<R: Rng + ?Sized>(
    features: &NeuroFeatures,
    montage: &Montage,
    rng: &mut R,
) -> NeurodegenerativeReport {
    NeurodegenerativeReport {
        alzheimers: score_alzheimers(features, rng),
        parkinsons: score_parkinsons(features, montage, rng),
        vascular_dementia: score_vascular_dementia(features, rng),
        lewy_bodies: score_lewy_bodies(features, rng),
    }
}
