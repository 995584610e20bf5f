//! Frequency band definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical EEG frequency bands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FrequencyBand {
    Delta,
    Theta,
    Alpha,
    Beta,
    Gamma,
}

impl FrequencyBand {
    pub const ALL: [FrequencyBand; 5] = [
        FrequencyBand::Delta,
        FrequencyBand::Theta,
        FrequencyBand::Alpha,
        FrequencyBand::Beta,
        FrequencyBand::Gamma,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            FrequencyBand::Delta => "delta",
            FrequencyBand::Theta => "theta",
            FrequencyBand::Alpha => "alpha",
            FrequencyBand::Beta => "beta",
            FrequencyBand::Gamma => "gamma",
        }
    }
}

impl fmt::Display for FrequencyBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Inclusive frequency range in Hz
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandRange {
    pub min: f64,
    pub max: f64,
}

impl BandRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Both edges are inclusive, so a bin sitting exactly on a shared edge
    /// belongs to both neighbouring bands.
    pub fn contains(&self, frequency: f64) -> bool {
        frequency >= self.min && frequency <= self.max
    }
}

/// Band edges used by one analysis context.
///
/// Only the gamma ceiling differs between contexts.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandLayout {
    pub delta: BandRange,
    pub theta: BandRange,
    pub alpha: BandRange,
    pub beta: BandRange,
    pub gamma: BandRange,
}

impl BandLayout {
    const fn with_gamma_ceiling(gamma_max: f64) -> Self {
        Self {
            delta: BandRange::new(0.5, 4.0),
            theta: BandRange::new(4.0, 8.0),
            alpha: BandRange::new(8.0, 13.0),
            beta: BandRange::new(13.0, 30.0),
            gamma: BandRange::new(30.0, gamma_max),
        }
    }

    /// Layout used for screening and neurodegenerative features
    pub const fn standard() -> Self {
        Self::with_gamma_ceiling(50.0)
    }

    /// Depression context, gamma capped at 45 Hz
    pub const fn depression() -> Self {
        Self::with_gamma_ceiling(45.0)
    }

    /// Epilepsy context, gamma extends to 100 Hz
    pub const fn epilepsy() -> Self {
        Self::with_gamma_ceiling(100.0)
    }

    pub fn range(&self, band: FrequencyBand) -> BandRange {
        match band {
            FrequencyBand::Delta => self.delta,
            FrequencyBand::Theta => self.theta,
            FrequencyBand::Alpha => self.alpha,
            FrequencyBand::Beta => self.beta,
            FrequencyBand::Gamma => self.gamma,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrequencyBand, BandRange)> + '_ {
        FrequencyBand::ALL.iter().map(move |&band| (band, self.range(band)))
    }
}

impl Default for BandLayout {
    fn default() -> Self {
        Self::standard()
    }
}

/// Mean spectral power per band for one channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BandPowers {
    pub delta: f64,
    pub theta: f64,
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl BandPowers {
    pub fn get(&self, band: FrequencyBand) -> f64 {
        match band {
            FrequencyBand::Delta => self.delta,
            FrequencyBand::Theta => self.theta,
            FrequencyBand::Alpha => self.alpha,
            FrequencyBand::Beta => self.beta,
            FrequencyBand::Gamma => self.gamma,
        }
    }

    pub fn set(&mut self, band: FrequencyBand, power: f64) {
        match band {
            FrequencyBand::Delta => self.delta = power,
            FrequencyBand::Theta => self.theta = power,
            FrequencyBand::Alpha => self.alpha = power,
            FrequencyBand::Beta => self.beta = power,
            FrequencyBand::Gamma => self.gamma = power,
        }
    }

    /// Sum over all five bands, boundary bins included twice
    pub fn total(&self) -> f64 {
        FrequencyBand::ALL.iter().map(|&band| self.get(band)).sum()
    }
}

/// Band powers keyed by channel name
pub type BandPowerMap = BTreeMap<String, BandPowers>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_contexts() {
        assert_eq!(BandLayout::depression().gamma.max, 45.0);
        assert_eq!(BandLayout::epilepsy().gamma.max, 100.0);
        assert_eq!(BandLayout::standard().gamma.max, 50.0);
        assert_eq!(BandLayout::default(), BandLayout::standard());
    }

    #[test]
    fn test_shared_edges_are_inclusive() {
        let layout = BandLayout::standard();
        assert!(layout.alpha.contains(13.0));
        assert!(layout.beta.contains(13.0));
        assert!(!layout.delta.contains(0.4));
    }

    #[test]
    fn test_band_powers_accessors() {
        let mut powers = BandPowers::default();
        powers.set(FrequencyBand::Alpha, 2.0);
        powers.set(FrequencyBand::Theta, 1.0);
        assert_eq!(powers.get(FrequencyBand::Alpha), 2.0);
        assert_eq!(powers.total(), 3.0);
        assert_eq!(FrequencyBand::Gamma.to_string(), "gamma");
    }
}
