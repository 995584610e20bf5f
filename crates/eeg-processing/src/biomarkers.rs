//! Biomarker library
//!
//! Pure functions over raw windows, spectra and band powers. None of them
//! fail on degenerate denominators: a zero sum or an empty range yields a
//! neutral value (0, `None`, or [`HfoResult::NotComputable`]).

use crate::bands::band_power;
use crate::spectrum::{transform, Spectrum};
use eeg_core::{BandPowers, ChannelStats, EegResult, FrequencyBand, Recording};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Lowest sample rate at which the 80 Hz+ HFO band is meaningful
pub const HFO_MIN_SAMPLE_RATE: f64 = 200.0;
const HFO_LOW_HZ: f64 = 80.0;
const HFO_CEILING_HZ: f64 = 500.0;

/// `(right − left) / (right + left)`, `None` when both powers sum to 0.
///
/// Positive values mean the right channel dominates.
pub fn alpha_asymmetry(left: f64, right: f64) -> Option<f64> {
    let sum = right + left;
    if sum == 0.0 {
        None
    } else {
        Some((right - left) / sum)
    }
}

/// Same as [`alpha_asymmetry`] but 0 when the sum vanishes
pub fn asymmetry_index(left: f64, right: f64) -> f64 {
    alpha_asymmetry(left, right).unwrap_or(0.0)
}

/// `numerator / denominator`, 0 when the denominator is not positive
pub fn band_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Per band front/posterior power ratio
pub fn front_posterior_ratio(front: &BandPowers, posterior: &BandPowers) -> BandPowers {
    let mut ratio = BandPowers::default();
    for band in FrequencyBand::ALL {
        ratio.set(band, band_ratio(front.get(band), posterior.get(band)));
    }
    ratio
}

/// `(δ + θ) / (α + β)`, 0 when the fast bands carry no power
pub fn slow_wave_ratio(bands: &BandPowers) -> f64 {
    band_ratio(bands.delta + bands.theta, bands.alpha + bands.beta)
}

/// Epileptiform band ratios for one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRatios {
    pub beta_gamma: f64,
    pub theta_beta: f64,
    /// β/γ above the configured threshold
    pub abnormal: bool,
}

pub fn power_ratios(bands: &BandPowers, beta_gamma_threshold: f64) -> PowerRatios {
    let beta_gamma = band_ratio(bands.beta, bands.gamma);
    PowerRatios {
        beta_gamma,
        theta_beta: band_ratio(bands.theta, bands.beta),
        abnormal: beta_gamma > beta_gamma_threshold,
    }
}

/// Detected epileptiform spike
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Spike {
    pub sample_index: usize,
    /// Signed amplitude at the spike sample
    pub amplitude: f64,
    pub time_seconds: f64,
}

/// Find sharp local extrema exceeding an adaptive amplitude threshold.
///
/// The threshold is `max(amplitude_threshold, 3σ)` over the window and both
/// one-step slopes around the candidate must exceed a fifth of it with
/// opposite sign. After a hit the scan jumps ahead by `0.1·fs` samples.
pub fn detect_spikes(signal: &[f64], sample_rate: f64, amplitude_threshold: f64) -> Vec<Spike> {
    let mut spikes = Vec::new();
    if signal.len() < 5 {
        return spikes;
    }

    let stats = ChannelStats::calculate(signal);
    let threshold = amplitude_threshold.max(3.0 * stats.std_dev);
    let slope_threshold = threshold / 5.0;
    let refractory = (sample_rate * 0.1).floor().max(0.0) as usize;

    let mut i = 2;
    while i + 2 < signal.len() {
        let rising = signal[i] - signal[i - 1];
        let falling = signal[i + 1] - signal[i];

        if signal[i].abs() > threshold
            && rising.abs() > slope_threshold
            && falling.abs() > slope_threshold
            && rising.signum() != falling.signum()
        {
            spikes.push(Spike {
                sample_index: i,
                amplitude: signal[i],
                time_seconds: i as f64 / sample_rate,
            });
            i += refractory;
        }
        i += 1;
    }

    spikes
}

/// Spikes per minute between the first and last spike
pub fn spike_frequency(spikes: &[Spike]) -> f64 {
    match (spikes.first(), spikes.last()) {
        (Some(first), Some(last)) if spikes.len() >= 2 => {
            let span_minutes = (last.time_seconds - first.time_seconds) / 60.0;
            if span_minutes > 0.0 {
                spikes.len() as f64 / span_minutes
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Relative high-frequency oscillation energy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HfoResult {
    NotComputable { reason: String },
    Computed { ratio: f64, power: f64, detected: bool },
}

impl HfoResult {
    pub fn is_detected(&self) -> bool {
        matches!(self, HfoResult::Computed { detected: true, .. })
    }
}

/// HFO band power relative to the mean power of the whole spectrum.
///
/// The band runs from 80 Hz to `min(500, fs/2 − 1)`, which can be very
/// narrow (or empty) for short windows at rates just above 200 Hz.
pub fn hfo_ratio(signal: &[f64], sample_rate: f64, threshold: f64) -> EegResult<HfoResult> {
    if sample_rate < HFO_MIN_SAMPLE_RATE {
        debug!(sample_rate, "HFO analysis skipped");
        return Ok(HfoResult::NotComputable {
            reason: format!(
                "sampling rate {}Hz too low, at least {}Hz required",
                sample_rate, HFO_MIN_SAMPLE_RATE
            ),
        });
    }

    let spectrum = transform(signal, sample_rate)?;
    let upper = HFO_CEILING_HZ.min(sample_rate / 2.0 - 1.0);
    let power = band_power(&spectrum, HFO_LOW_HZ, upper);
    let ratio = band_ratio(power, spectrum.mean_power());

    Ok(HfoResult::Computed {
        ratio,
        power,
        detected: ratio > threshold,
    })
}

/// |Pearson r| over the common prefix of two windows, 0 when undefined
pub fn channel_coherence(x: &[f64], y: &[f64]) -> f64 {
    let n = x.len().min(y.len());
    if n == 0 {
        return 0.0;
    }

    let (mut sx, mut sy, mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0, 0.0, 0.0);
    for (&a, &b) in x[..n].iter().zip(&y[..n]) {
        sx += a;
        sy += b;
        sxy += a * b;
        sxx += a * a;
        syy += b * b;
    }

    let n = n as f64;
    let numerator = n * sxy - sx * sy;
    let denominator = ((n * sxx - sx * sx) * (n * syy - sy * sy)).sqrt();
    if denominator == 0.0 || !denominator.is_finite() {
        debug!("coherence undefined for constant window");
        return 0.0;
    }
    (numerator / denominator).abs()
}

/// Coherence of one channel pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairCoherence {
    /// `"first-second"`
    pub pair: String,
    pub first: String,
    pub second: String,
    pub coherence: f64,
}

/// [`channel_coherence`] for every pair `i < j` in selection order
pub fn coherence_matrix<S: AsRef<str>>(
    recording: &Recording,
    channels: &[S],
) -> EegResult<Vec<PairCoherence>> {
    let names = recording.resolve(channels)?;
    let mut pairs = Vec::new();
    for (i, first) in names.iter().enumerate() {
        for second in &names[i + 1..] {
            pairs.push(PairCoherence {
                pair: format!("{}-{}", first, second),
                first: first.to_string(),
                second: second.to_string(),
                coherence: channel_coherence(recording.channel(first)?, recording.channel(second)?),
            });
        }
    }
    Ok(pairs)
}

/// Mean of `|X₁(f)|·|X₂(f)|` over the 8–13 Hz bins of both windows.
///
/// A magnitude-product stand-in for cross-spectral phase coherence.
pub fn phase_coherence_proxy(x: &[f64], y: &[f64], sample_rate: f64) -> EegResult<f64> {
    let n = x.len().min(y.len());
    if n == 0 {
        return Ok(0.0);
    }

    let first = transform(&x[..n], sample_rate)?;
    let second = transform(&y[..n], sample_rate)?;

    let (sum, count) = first
        .bins()
        .zip(second.magnitudes.iter())
        .filter(|((frequency, _), _)| (8.0..=13.0).contains(frequency))
        .fold((0.0, 0usize), |(sum, count), ((_, a), b)| (sum + a * b, count + 1));

    Ok(if count == 0 { 0.0 } else { sum / count as f64 })
}

/// Shannon entropy (bits) of the normalised 0.5–30 Hz power distribution
pub fn spectral_entropy(spectrum: &Spectrum) -> f64 {
    let powers: Vec<f64> = spectrum
        .bins()
        .filter(|&(frequency, _)| (0.5..=30.0).contains(&frequency))
        .map(|(_, magnitude)| magnitude * magnitude)
        .collect();

    let total: f64 = powers.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    powers
        .iter()
        .map(|&power| power / total)
        .filter(|&p| p > 0.0)
        .map(|p| -p * p.log2())
        .sum()
}

/// Fraction of samples that are turning points relative to their two
/// predecessors
pub fn signal_complexity(signal: &[f64]) -> f64 {
    if signal.len() < 3 {
        return 0.0;
    }

    let turning = signal
        .windows(3)
        .filter(|w| (w[2] > w[1] && w[1] < w[0]) || (w[2] < w[1] && w[1] > w[0]))
        .count();
    turning as f64 / (signal.len() - 2) as f64
}

/// Coefficient of variation of a 10-sample peak-to-peak envelope
pub fn amplitude_modulation(signal: &[f64]) -> f64 {
    const MIN_LEN: usize = 100;
    const WINDOW: usize = 10;

    if signal.len() < MIN_LEN {
        return 0.0;
    }

    let envelope: Vec<f64> = (0..signal.len() - WINDOW)
        .map(|i| {
            let stats = ChannelStats::calculate(&signal[i..i + WINDOW]);
            stats.peak_to_peak
        })
        .collect();

    let stats = ChannelStats::calculate(&envelope);
    band_ratio(stats.std_dev, stats.mean)
}
