//! Feature extraction for the condition scorers
//!
//! Two feature sets are built from the trailing window of each selected
//! channel: [`EegFeatures`] for the screening scorers and [`NeuroFeatures`]
//! for the neurodegenerative scorers.

use crate::bands::{band_power, channel_band_powers};
use crate::biomarkers::{
    amplitude_modulation, asymmetry_index, phase_coherence_proxy, signal_complexity,
    slow_wave_ratio, spectral_entropy,
};
use crate::spectrum::transform;
use eeg_core::{BandLayout, BandPowers, ChannelStats, EegResult, Montage, Recording, Region};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per channel screening features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelFeatures {
    pub mean: f64,
    pub std_dev: f64,
    pub variance: f64,
    pub bands: BandPowers,
    pub complexity: f64,
}

/// Alpha asymmetry of homologous pairs, present only when both channels
/// of the pair were selected
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AsymmetryFeatures {
    pub frontal: Option<f64>,
    pub temporal: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EegFeatures {
    pub channels: BTreeMap<String, ChannelFeatures>,
    pub asymmetry: AsymmetryFeatures,
}

/// Per channel neurodegenerative features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NeuroChannelFeatures {
    pub bands: BandPowers,
    pub slow_wave_ratio: f64,
    /// Strongest frequency inside 8–13 Hz
    pub alpha_peak: f64,
    pub spectral_entropy: f64,
    pub dominant_frequency: f64,
    pub amplitude_modulation: f64,
    /// 13–20 Hz power
    pub low_beta: f64,
    /// 20–30 Hz power
    pub high_beta: f64,
    /// 4–6 Hz power
    pub tremor: f64,
    /// 6–8 Hz power
    pub non_tremor: f64,
}

/// Alpha-band magnitude-product coherence between region pairs
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PhaseCoherence {
    pub frontal: Option<f64>,
    pub temporal: Option<f64>,
    pub fronto_temporal: Option<f64>,
    pub central: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NeuroFeatures {
    pub channels: BTreeMap<String, NeuroChannelFeatures>,
    pub coherence: PhaseCoherence,
}

/// Mean of `f` over all channels, `None` when no channel qualifies
pub(crate) fn mean_over<'a, T: 'a, I, F>(items: I, f: F) -> Option<f64>
where
    I: IntoIterator<Item = &'a T>,
    F: Fn(&T) -> Option<f64>,
{
    let (sum, count) = items
        .into_iter()
        .filter_map(|item| f(item))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Builds feature sets from a recording and a channel selection
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    pub montage: Montage,
    pub layout: BandLayout,
    /// Trailing samples used for screening features
    pub screening_window: usize,
    /// Trailing samples used for neurodegenerative features
    pub neuro_window: usize,
}

impl Default for FeatureExtractor {
    fn default() -> Self {
        Self::new(Montage::default())
    }
}

impl FeatureExtractor {
    pub fn new(montage: Montage) -> Self {
        Self {
            montage,
            layout: BandLayout::standard(),
            screening_window: 200,
            neuro_window: 300,
        }
    }

    pub fn with_windows(mut self, screening_window: usize, neuro_window: usize) -> Self {
        self.screening_window = screening_window;
        self.neuro_window = neuro_window;
        self
    }

    pub fn screening_features<S: AsRef<str>>(
        &self,
        recording: &Recording,
        channels: &[S],
    ) -> EegResult<EegFeatures> {
        let names = recording.resolve(channels)?;
        let mut features = EegFeatures::default();

        for name in &names {
            let window = recording.tail(name, self.screening_window)?;
            let stats = ChannelStats::calculate(window);
            let spectrum = transform(window, recording.sample_rate())?;

            features.channels.insert(
                name.to_string(),
                ChannelFeatures {
                    mean: stats.mean,
                    std_dev: stats.std_dev,
                    variance: stats.variance(),
                    bands: channel_band_powers(&spectrum, &self.layout),
                    complexity: signal_complexity(window),
                },
            );
        }

        let alpha_index = |region: Region| {
            let (left, right) = self.montage.pair(region)?;
            let left = features.channels.get(left)?;
            let right = features.channels.get(right)?;
            Some(asymmetry_index(left.bands.alpha, right.bands.alpha))
        };
        features.asymmetry = AsymmetryFeatures {
            frontal: alpha_index(Region::Frontal),
            temporal: alpha_index(Region::TemporoParietal),
        };

        Ok(features)
    }

    pub fn neuro_features<S: AsRef<str>>(
        &self,
        recording: &Recording,
        channels: &[S],
    ) -> EegResult<NeuroFeatures> {
        let names = recording.resolve(channels)?;
        let sample_rate = recording.sample_rate();
        let mut features = NeuroFeatures::default();

        for name in &names {
            let window = recording.tail(name, self.neuro_window)?;
            let spectrum = transform(window, sample_rate)?;
            let bands = channel_band_powers(&spectrum, &self.layout);

            features.channels.insert(
                name.to_string(),
                NeuroChannelFeatures {
                    bands,
                    slow_wave_ratio: slow_wave_ratio(&bands),
                    alpha_peak: spectrum.peak_frequency_in(self.layout.alpha.min, self.layout.alpha.max),
                    spectral_entropy: spectral_entropy(&spectrum),
                    dominant_frequency: spectrum.dominant_frequency(),
                    amplitude_modulation: amplitude_modulation(window),
                    low_beta: band_power(&spectrum, 13.0, 20.0),
                    high_beta: band_power(&spectrum, 20.0, 30.0),
                    tremor: band_power(&spectrum, 4.0, 6.0),
                    non_tremor: band_power(&spectrum, 6.0, 8.0),
                },
            );
        }

        let coherence = |first: Option<&str>, second: Option<&str>| -> EegResult<Option<f64>> {
            match (first, second) {
                (Some(a), Some(b)) if names.iter().any(|n| *n == a) && names.iter().any(|n| *n == b) => {
                    let x = recording.tail(a, self.neuro_window)?;
                    let y = recording.tail(b, self.neuro_window)?;
                    Ok(Some(phase_coherence_proxy(x, y, sample_rate)?))
                }
                _ => Ok(None),
            }
        };

        let frontal = self.montage.pair(Region::Frontal);
        let temporal = self.montage.pair(Region::TemporoParietal);
        let central = self.montage.pair(Region::Central);

        features.coherence = PhaseCoherence {
            frontal: coherence(frontal.map(|p| p.0), frontal.map(|p| p.1))?,
            temporal: coherence(temporal.map(|p| p.0), temporal.map(|p| p.1))?,
            fronto_temporal: coherence(frontal.map(|p| p.0), temporal.map(|p| p.0))?,
            central: coherence(central.map(|p| p.0), central.map(|p| p.1))?,
        };

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::tests::sine;

    fn recording() -> Recording {
        Recording::from_pairs(
            100.0,
            vec![
                ("Channel1", sine(10.0, 1.0, 100.0, 500)),
                ("Channel2", sine(10.0, 0.5, 100.0, 500)),
                (
                    "Channel3",
                    sine(5.0, 1.0, 100.0, 500)
                        .iter()
                        .zip(sine(10.0, 0.3, 100.0, 500))
                        .map(|(a, b)| a + b)
                        .collect(),
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_screening_features() {
        let extractor = FeatureExtractor::default();
        let features = extractor
            .screening_features(&recording(), &["Channel1", "Channel2", "Channel3"])
            .unwrap();

        assert_eq!(features.channels.len(), 3);
        let ch1 = features.channels["Channel1"];
        assert!(ch1.bands.alpha > ch1.bands.theta);
        assert!((ch1.variance - ch1.std_dev * ch1.std_dev).abs() < 1e-12);

        // Channel2 carries a quarter of Channel1's alpha power
        let frontal = features.asymmetry.frontal.unwrap();
        assert!((frontal - (0.25 - 1.0) / 1.25).abs() < 1e-6);
        // Channel4 is not selected
        assert_eq!(features.asymmetry.temporal, None);
    }

    #[test]
    fn test_neuro_features() {
        let extractor = FeatureExtractor::default();
        let features = extractor
            .neuro_features(&recording(), &["Channel1", "Channel2", "Channel3"])
            .unwrap();

        let ch1 = features.channels["Channel1"];
        assert_eq!(ch1.alpha_peak, 10.0);
        assert_eq!(ch1.dominant_frequency, 10.0);
        assert!(ch1.spectral_entropy < 1e-6);

        let ch3 = features.channels["Channel3"];
        assert!(ch3.slow_wave_ratio > 1.0);

        assert!(features.coherence.frontal.unwrap() > 0.0);
        assert!(features.coherence.fronto_temporal.is_some());
        assert_eq!(features.coherence.temporal, None);
        assert_eq!(features.coherence.central, None);
    }

    #[test]
    fn test_mean_over_skips_missing() {
        let values = [1.0, -1.0, 3.0];
        assert_eq!(mean_over(&values, |&v| (v > 0.0).then_some(v)), Some(2.0));
        assert_eq!(mean_over(&values, |_| None), None);
    }
}
