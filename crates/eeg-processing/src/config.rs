//! Configuration management for the analysis facade

use eeg_core::{config_error, EegError, EegResult};
use serde::{Deserialize, Serialize};

/// Epileptiform detection thresholds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpilepsyThresholds {
    /// Fixed spike amplitude floor (µV)
    pub spike_amplitude: f64,
    /// Spikes per minute above which a channel is abnormal
    pub spike_frequency: f64,
    /// HFO ratio above which HFOs are reported
    pub hfo_ratio: f64,
    /// β/γ ratio above which a channel is abnormal
    pub beta_gamma_ratio: f64,
    /// Pair coherence above which a pair is reported
    pub high_coherence: f64,
}

impl Default for EpilepsyThresholds {
    fn default() -> Self {
        Self {
            spike_amplitude: 75.0,
            spike_frequency: 5.0,
            hfo_ratio: 0.15,
            beta_gamma_ratio: 1.5,
            high_coherence: 0.85,
        }
    }
}

/// Cut points used to interpret depression features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepressionThresholds {
    /// |asymmetry| beyond this is lateralised
    pub asymmetry: f64,
    pub low_alpha_theta: f64,
    pub high_alpha_theta: f64,
    /// Mean theta power above this is elevated
    pub elevated_theta: f64,
}

impl Default for DepressionThresholds {
    fn default() -> Self {
        Self {
            asymmetry: 0.1,
            low_alpha_theta: 0.7,
            high_alpha_theta: 1.5,
            elevated_theta: 0.3,
        }
    }
}

/// Global analysis configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub epilepsy: EpilepsyThresholds,
    pub depression: DepressionThresholds,
    /// Trailing samples used by the screening scorers
    pub screening_window: usize,
    /// Trailing samples used by the neurodegenerative scorers
    pub neuro_window: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            epilepsy: EpilepsyThresholds::default(),
            depression: DepressionThresholds::default(),
            screening_window: 200,
            neuro_window: 300,
        }
    }
}

impl AnalysisConfig {
    /// Validate the configuration
    pub fn validate(&self) -> EegResult<()> {
        let e = &self.epilepsy;
        if e.spike_amplitude <= 0.0 {
            return Err(config_error!("Spike amplitude threshold must be positive"));
        }
        if e.spike_frequency < 0.0 || e.hfo_ratio < 0.0 || e.beta_gamma_ratio < 0.0 {
            return Err(config_error!("Epilepsy thresholds must not be negative"));
        }
        if !(0.0..=1.0).contains(&e.high_coherence) {
            return Err(config_error!(
                "High coherence threshold {} outside [0, 1]",
                e.high_coherence
            ));
        }

        let d = &self.depression;
        if d.low_alpha_theta > d.high_alpha_theta {
            return Err(config_error!(
                "Low alpha/theta cut {} exceeds high cut {}",
                d.low_alpha_theta,
                d.high_alpha_theta
            ));
        }

        if self.screening_window < 3 || self.neuro_window < 3 {
            return Err(config_error!("Analysis windows must hold at least 3 samples"));
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> EegResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EegError::ConfigurationError {
            message: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> EegResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| EegError::ConfigurationError {
            message: format!("Failed to deserialize configuration: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.epilepsy.spike_amplitude, 75.0);
        assert_eq!(config.epilepsy.high_coherence, 0.85);
    }

    #[test]
    fn test_config_json() {
        let mut config = AnalysisConfig::default();
        config.epilepsy.spike_frequency = 8.0;
        let json = config.to_json().unwrap();
        assert_eq!(AnalysisConfig::from_json(&json).unwrap(), config);

        assert!(AnalysisConfig::from_json("{}").is_err());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = AnalysisConfig::default();
        config.epilepsy.high_coherence = 1.5;
        assert!(matches!(
            config.validate(),
            Err(EegError::ConfigurationError { .. })
        ));

        let mut config = AnalysisConfig::default();
        config.depression.low_alpha_theta = 2.0;
        assert!(config.validate().is_err());
    }
}
