//! One-shot analysis of a recording
//!
//! [`Analyzer`] assembles transforms, band powers, biomarkers and scorers
//! into the result types handed to the host. Channel pairs are resolved
//! through the [`Montage`], never by name literals.

use crate::bands::band_powers;
use crate::biomarkers::{
    alpha_asymmetry, band_ratio, coherence_matrix, detect_spikes, front_posterior_ratio, hfo_ratio,
    power_ratios, spike_frequency, HfoResult, PairCoherence, PowerRatios, Spike,
};
use crate::config::AnalysisConfig;
use crate::features::FeatureExtractor;
use crate::scoring::{score_neurodegenerative, screen_conditions, NeurodegenerativeReport, ScreeningReport};
use crate::spectrum::{transform, Spectrum};
use eeg_core::{
    invalid_input, BandLayout, BandPowerMap, BandPowers, ChannelStats, EegResult, Montage, Recording,
    Region,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisKind {
    /// Statistics and magnitude spectrum per channel
    Spectrum,
    /// Statistics only
    Statistics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    pub statistics: ChannelStats,
    pub spectrum: Option<Spectrum>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub kind: AnalysisKind,
    pub channels: BTreeMap<String, ChannelSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Laterality {
    /// Right hemisphere carries more alpha, the depression-associated pattern
    RightDominant,
    LeftDominant,
    Balanced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioLevel {
    Low,
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepressionInterpretation {
    /// From the frontal pair, absent when that pair was omitted
    pub frontal_asymmetry: Option<Laterality>,
    /// From the mean α/θ over channels with θ > 0
    pub alpha_theta: Option<RatioLevel>,
    pub theta_elevated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepressionResult {
    pub band_powers: BandPowerMap,
    /// Keyed by region (`"frontal"`, `"central"`); pairs with zero alpha are omitted
    pub alpha_asymmetry: BTreeMap<String, f64>,
    pub theta_power: BTreeMap<String, f64>,
    pub alpha_theta_ratio: BTreeMap<String, f64>,
    /// Keyed by hemisphere (`"left"`, `"right"`)
    pub front_posterior_ratio: BTreeMap<String, BandPowers>,
    pub interpretation: DepressionInterpretation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEpilepsyFeatures {
    pub spikes: Vec<Spike>,
    pub spikes_per_minute: f64,
    pub hfo: HfoResult,
    pub power_ratios: PowerRatios,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpilepsyResult {
    pub band_powers: BandPowerMap,
    pub channels: BTreeMap<String, ChannelEpilepsyFeatures>,
    pub coherence: Vec<PairCoherence>,
    /// Channels with a high spike rate or an abnormal β/γ ratio
    pub abnormal_channels: Vec<String>,
    pub high_coherence_pairs: Vec<PairCoherence>,
}

/// Analysis facade over one montage and configuration
#[derive(Debug, Clone)]
pub struct Analyzer {
    config: AnalysisConfig,
    montage: Montage,
    extractor: FeatureExtractor,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default(), Montage::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig, montage: Montage) -> Self {
        let extractor = FeatureExtractor::new(montage.clone())
            .with_windows(config.screening_window, config.neuro_window);
        Self {
            config,
            montage,
            extractor,
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn montage(&self) -> &Montage {
        &self.montage
    }

    fn select<'a, S: AsRef<str>>(
        recording: &Recording,
        channels: &'a [S],
        minimum: usize,
    ) -> EegResult<Vec<&'a str>> {
        let names = recording.resolve(channels)?;
        if names.len() < minimum {
            return Err(invalid_input!(
                "at least {} channel(s) required, {} selected",
                minimum,
                names.len()
            ));
        }
        Ok(names)
    }

    /// Statistics, and for [`AnalysisKind::Spectrum`] the spectrum, of each
    /// selected channel
    pub fn analyze_batch<S: AsRef<str>>(
        &self,
        recording: &Recording,
        channels: &[S],
        kind: AnalysisKind,
    ) -> EegResult<BatchResult> {
        let mut result = BTreeMap::new();
        for name in Self::select(recording, channels, 1)? {
            let samples = recording.channel(name)?;
            let spectrum = match kind {
                AnalysisKind::Spectrum => Some(transform(samples, recording.sample_rate())?),
                AnalysisKind::Statistics => None,
            };
            result.insert(
                name.to_string(),
                ChannelSummary {
                    statistics: ChannelStats::calculate(samples),
                    spectrum,
                },
            );
        }
        Ok(BatchResult {
            kind,
            channels: result,
        })
    }

    pub fn analyze_depression_features<S: AsRef<str>>(
        &self,
        recording: &Recording,
        channels: &[S],
    ) -> EegResult<DepressionResult> {
        let names = Self::select(recording, channels, 2)?;
        let powers = band_powers(recording, &names, &BandLayout::depression(), None)?;

        let mut alpha_asym = BTreeMap::new();
        for (label, region) in [("frontal", Region::Frontal), ("central", Region::Central)] {
            let pair = self
                .montage
                .pair(region)
                .and_then(|(l, r)| Some((powers.get(l)?, powers.get(r)?)));
            match pair.and_then(|(left, right)| alpha_asymmetry(left.alpha, right.alpha)) {
                Some(value) => {
                    alpha_asym.insert(label.to_string(), value);
                }
                None => debug!(region = label, "alpha asymmetry omitted"),
            }
        }

        let theta_power = powers
            .iter()
            .map(|(name, p)| (name.clone(), p.theta))
            .collect();
        let alpha_theta_ratio: BTreeMap<String, f64> = powers
            .iter()
            .map(|(name, p)| (name.clone(), band_ratio(p.alpha, p.theta)))
            .collect();

        let mut fp_ratio = BTreeMap::new();
        let front = self.montage.pair(Region::Frontal);
        let posterior = self.montage.pair(Region::TemporoParietal);
        if let (Some(front), Some(posterior)) = (front, posterior) {
            for (label, f, p) in [("left", front.0, posterior.0), ("right", front.1, posterior.1)] {
                if let (Some(f), Some(p)) = (powers.get(f), powers.get(p)) {
                    fp_ratio.insert(label.to_string(), front_posterior_ratio(f, p));
                }
            }
        }

        let interpretation = self.interpret_depression(&powers, alpha_asym.get("frontal").copied());

        Ok(DepressionResult {
            band_powers: powers,
            alpha_asymmetry: alpha_asym,
            theta_power,
            alpha_theta_ratio,
            front_posterior_ratio: fp_ratio,
            interpretation,
        })
    }

    fn interpret_depression(&self, powers: &BandPowerMap, frontal: Option<f64>) -> DepressionInterpretation {
        let cuts = &self.config.depression;

        let frontal_asymmetry = frontal.map(|a| {
            if a > cuts.asymmetry {
                Laterality::RightDominant
            } else if a < -cuts.asymmetry {
                Laterality::LeftDominant
            } else {
                Laterality::Balanced
            }
        });

        let ratios: Vec<f64> = powers
            .values()
            .filter(|p| p.theta > 0.0)
            .map(|p| p.alpha / p.theta)
            .collect();
        let alpha_theta = (!ratios.is_empty()).then(|| {
            let mean = ratios.iter().sum::<f64>() / ratios.len() as f64;
            if mean < cuts.low_alpha_theta {
                RatioLevel::Low
            } else if mean > cuts.high_alpha_theta {
                RatioLevel::High
            } else {
                RatioLevel::Normal
            }
        });

        let mean_theta = powers.values().map(|p| p.theta).sum::<f64>() / powers.len().max(1) as f64;

        DepressionInterpretation {
            frontal_asymmetry,
            alpha_theta,
            theta_elevated: mean_theta > cuts.elevated_theta,
        }
    }

    pub fn analyze_epilepsy_features<S: AsRef<str>>(
        &self,
        recording: &Recording,
        channels: &[S],
    ) -> EegResult<EpilepsyResult> {
        let thresholds = &self.config.epilepsy;
        let names = Self::select(recording, channels, 2)?;
        let powers = band_powers(recording, &names, &BandLayout::epilepsy(), None)?;
        let sample_rate = recording.sample_rate();

        let mut per_channel = BTreeMap::new();
        let mut abnormal_channels = Vec::new();
        for name in &names {
            let samples = recording.channel(name)?;
            let spikes = detect_spikes(samples, sample_rate, thresholds.spike_amplitude);
            let spikes_per_minute = spike_frequency(&spikes);
            let ratios = powers
                .get(*name)
                .map(|p| power_ratios(p, thresholds.beta_gamma_ratio))
                .unwrap_or(PowerRatios {
                    beta_gamma: 0.0,
                    theta_beta: 0.0,
                    abnormal: false,
                });

            if spikes_per_minute > thresholds.spike_frequency || ratios.abnormal {
                abnormal_channels.push(name.to_string());
            }

            per_channel.insert(
                name.to_string(),
                ChannelEpilepsyFeatures {
                    spikes,
                    spikes_per_minute,
                    hfo: hfo_ratio(samples, sample_rate, thresholds.hfo_ratio)?,
                    power_ratios: ratios,
                },
            );
        }

        let coherence = coherence_matrix(recording, &names)?;
        let high_coherence_pairs = coherence
            .iter()
            .filter(|pair| pair.coherence > thresholds.high_coherence)
            .cloned()
            .collect();

        Ok(EpilepsyResult {
            band_powers: powers,
            channels: per_channel,
            coherence,
            abnormal_channels,
            high_coherence_pairs,
        })
    }

    pub fn analyze_neurodegenerative_features<S: AsRef<str>, R: Rng + ?Sized>(
        &self,
        recording: &Recording,
        channels: &[S],
        rng: &mut R,
    ) -> EegResult<NeurodegenerativeReport> {
        let names = Self::select(recording, channels, 1)?;
        let features = self.extractor.neuro_features(recording, &names)?;
        Ok(score_neurodegenerative(&features, &self.montage, rng))
    }

    /// Heuristic screening over the trailing screening window
    pub fn screen_conditions<S: AsRef<str>, R: Rng + ?Sized>(
        &self,
        recording: &Recording,
        channels: &[S],
        rng: &mut R,
    ) -> EegResult<ScreeningReport> {
        let names = Self::select(recording, channels, 1)?;
        let features = self.extractor.screening_features(recording, &names)?;
        Ok(screen_conditions(&features, rng))
    }
}
