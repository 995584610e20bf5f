//! Discrete frequency transform shared by every analysis path
//!
//! A direct O(n²) evaluation over the first ⌊n/2⌋ bins. Windows are at most
//! a few hundred samples, and a bin grid of exactly `k·fs/n` keeps band
//! membership identical across all consumers.

use eeg_core::{invalid_input, EegError, EegResult};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// One-sided magnitude spectrum
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spectrum {
    /// Bin centre frequencies in Hz, ascending from 0
    pub frequencies: Vec<f64>,
    /// Magnitudes normalised by the window length
    pub magnitudes: Vec<f64>,
    sample_rate: f64,
    window_len: usize,
}

/// Transform `signal` sampled at `sample_rate` Hz.
///
/// Returns `⌊n/2⌋` bins where bin `k` sits at `k·fs/n` and carries
/// `|Σ x[t]·e^{-2πikt/n}| / n`.
pub fn transform(signal: &[f64], sample_rate: f64) -> EegResult<Spectrum> {
    if signal.is_empty() {
        return Err(invalid_input!("cannot transform an empty signal"));
    }
    if !sample_rate.is_finite() || sample_rate <= 0.0 {
        return Err(EegError::InvalidSamplingRate { rate: sample_rate });
    }

    let n = signal.len();
    let bins = n / 2;
    let mut frequencies = Vec::with_capacity(bins);
    let mut magnitudes = Vec::with_capacity(bins);

    for k in 0..bins {
        let step = -2.0 * PI * k as f64 / n as f64;
        let acc = signal
            .iter()
            .enumerate()
            .fold(Complex::new(0.0, 0.0), |acc, (t, &x)| {
                acc + Complex::from_polar(x, step * t as f64)
            });

        frequencies.push(k as f64 * sample_rate / n as f64);
        magnitudes.push(acc.norm() / n as f64);
    }

    Ok(Spectrum {
        frequencies,
        magnitudes,
        sample_rate,
        window_len: n,
    })
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Number of input samples the spectrum was computed from
    pub fn window_len(&self) -> usize {
        self.window_len
    }

    /// Frequency resolution `fs / n`
    pub fn bin_width(&self) -> f64 {
        self.sample_rate / self.window_len as f64
    }

    /// `(frequency, magnitude)` pairs
    pub fn bins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.frequencies
            .iter()
            .copied()
            .zip(self.magnitudes.iter().copied())
    }

    /// Frequency of the largest non-DC bin, 0 when there is none.
    ///
    /// Ties keep the lowest frequency.
    pub fn dominant_frequency(&self) -> f64 {
        let mut best = (0.0, 0.0);
        for (frequency, magnitude) in self.bins().skip(1) {
            if magnitude > best.1 {
                best = (frequency, magnitude);
            }
        }
        best.0
    }

    /// Frequency of the largest bin inside `[min, max]`, 0 when no bin has
    /// positive magnitude there
    pub fn peak_frequency_in(&self, min: f64, max: f64) -> f64 {
        let mut best = (0.0, 0.0);
        for (frequency, magnitude) in self.bins() {
            if frequency >= min && frequency <= max && magnitude > best.1 {
                best = (frequency, magnitude);
            }
        }
        best.0
    }

    /// Mean squared magnitude over every bin
    pub fn mean_power(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.magnitudes.iter().map(|m| m * m).sum::<f64>() / self.len() as f64
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rustfft::FftPlanner;

    pub(crate) fn sine(frequency: f64, amplitude: f64, sample_rate: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| amplitude * (2.0 * PI * frequency * i as f64 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_sinusoid_peak_within_one_bin() {
        for &(f0, fs, n) in &[(10.0, 100.0, 500), (7.3, 128.0, 256), (21.7, 250.0, 300)] {
            let spectrum = transform(&sine(f0, 1.0, fs, n), fs).unwrap();
            let peak = spectrum.dominant_frequency();
            assert!(
                (peak - f0).abs() <= spectrum.bin_width(),
                "peak {} too far from {}",
                peak,
                f0
            );
        }
    }

    #[test]
    fn test_bin_layout() {
        let spectrum = transform(&vec![0.0; 101], 100.0).unwrap();
        assert_eq!(spectrum.len(), 50);
        assert_eq!(spectrum.frequencies[0], 0.0);
        assert!(spectrum.frequencies.windows(2).all(|w| w[1] > w[0]));
        assert!(spectrum.magnitudes.iter().all(|&m| m == 0.0));
        assert_eq!(spectrum.dominant_frequency(), 0.0);
    }

    #[test]
    fn test_matches_fft_magnitudes() {
        let signal: Vec<f64> = (0..128)
            .map(|i| (i as f64 * 0.37).sin() + 0.5 * (i as f64 * 1.3).cos() + 0.1)
            .collect();
        let spectrum = transform(&signal, 128.0).unwrap();

        let mut buffer: Vec<rustfft::num_complex::Complex<f64>> = signal
            .iter()
            .map(|&x| rustfft::num_complex::Complex::new(x, 0.0))
            .collect();
        FftPlanner::new().plan_fft_forward(buffer.len()).process(&mut buffer);

        for (k, magnitude) in spectrum.magnitudes.iter().enumerate() {
            let expected = buffer[k].norm() / signal.len() as f64;
            assert!((magnitude - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_dc_magnitude() {
        let spectrum = transform(&vec![2.0; 64], 64.0).unwrap();
        assert!((spectrum.magnitudes[0] - 2.0).abs() < 1e-12);
        assert!((spectrum.mean_power() - 4.0 / 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(transform(&[], 100.0), Err(EegError::InvalidInput { .. })));
        assert!(matches!(
            transform(&[1.0, 2.0], 0.0),
            Err(EegError::InvalidSamplingRate { .. })
        ));
        assert!(transform(&[1.0], f64::NAN).is_err());
    }

    #[test]
    fn test_peak_frequency_in_range() {
        let mut signal = sine(10.0, 1.0, 100.0, 200);
        for (v, s) in signal.iter_mut().zip(sine(30.0, 2.0, 100.0, 200)) {
            *v += s;
        }
        let spectrum = transform(&signal, 100.0).unwrap();
        assert_eq!(spectrum.dominant_frequency(), 30.0);
        assert_eq!(spectrum.peak_frequency_in(8.0, 13.0), 10.0);
    }
}
