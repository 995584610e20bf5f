//! Per channel waveform presets for the synthetic EEG source

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Two-tone waveform: a carrier at `base_frequency` plus a weaker
/// component at half that frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelPattern {
    pub base_frequency: f64,
    pub carrier_amplitude: f64,
    pub subharmonic_amplitude: f64,
}

impl ChannelPattern {
    pub const fn new(base_frequency: f64) -> Self {
        Self {
            base_frequency,
            carrier_amplitude: 0.8,
            subharmonic_amplitude: 0.3,
        }
    }

    /// Noise-free value at `time` seconds
    pub fn value_at(&self, time: f64) -> f64 {
        self.carrier_amplitude * (2.0 * PI * self.base_frequency * time).sin()
            + self.subharmonic_amplitude * (2.0 * PI * (self.base_frequency / 2.0) * time).sin()
    }

    /// Name of the band the carrier falls in
    pub fn description(&self) -> &'static str {
        match self.base_frequency {
            f if f < 4.0 => "Delta-dominant",
            f if f < 8.0 => "Theta-dominant",
            f if f < 13.0 => "Alpha-dominant",
            f if f < 30.0 => "Beta-dominant",
            _ => "Gamma-dominant",
        }
    }
}

/// Named channel with its waveform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelPreset {
    pub name: String,
    pub pattern: ChannelPattern,
}

/// Carrier frequencies of the standard eight channel montage
pub const DEFAULT_BASE_FREQUENCIES: [f64; 8] = [10.0, 20.0, 5.0, 3.0, 15.0, 8.0, 40.0, 12.0];

/// `Channel1..Channel8` with their default carriers
pub fn presets() -> Vec<ChannelPreset> {
    DEFAULT_BASE_FREQUENCIES
        .iter()
        .enumerate()
        .map(|(i, &frequency)| ChannelPreset {
            name: format!("Channel{}", i + 1),
            pattern: ChannelPattern::new(frequency),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let presets = presets();
        assert_eq!(presets.len(), 8);
        assert_eq!(presets[0].name, "Channel1");
        assert_eq!(presets[0].pattern.base_frequency, 10.0);
        assert_eq!(presets[6].pattern.description(), "Gamma-dominant");
        assert_eq!(presets[3].pattern.description(), "Delta-dominant");
    }

    #[test]
    fn test_pattern_value() {
        let pattern = ChannelPattern::new(10.0);
        assert_eq!(pattern.value_at(0.0), 0.0);
        // quarter period of the carrier, eighth of the subharmonic
        let expected = 0.8 + 0.3 * (PI / 4.0).sin();
        assert!((pattern.value_at(0.025) - expected).abs() < 1e-12);
    }
}
