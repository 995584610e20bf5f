//! Configuration for a streaming session

use crate::simulator::SimulatorConfig;
use eeg_core::{config_error, EegError, EegResult, Montage, MAX_CHANNELS};
use eeg_processing::AnalysisConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Channels the integrated analysis needs (the depression and epilepsy
/// analyses compare channel pairs)
pub const INTEGRATED_MIN_CHANNELS: usize = 2;

/// Inclusive acceptable range of a monitored value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub min: f64,
    pub max: f64,
}

impl Limits {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Periodic whole-buffer analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratedConfig {
    pub enabled: bool,
    pub interval_ms: u64,
    /// Include the condition screening
    pub screening: bool,
    /// Include the neurodegenerative scorers
    pub neurodegenerative: bool,
}

impl Default for IntegratedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_ms: 5000,
            screening: true,
            neurodegenerative: true,
        }
    }
}

/// Streaming session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub tick_interval_ms: u64,
    /// Samples kept per channel
    pub buffer_size: usize,
    /// Nominal rate handed to the analyses (Hz)
    pub sample_rate: f64,
    /// Run the spectral analysis every N samples
    pub analysis_every: u64,
    /// Check amplitudes every N samples
    pub anomaly_check_every: u64,
    /// Trailing samples fed to the spectral analysis
    pub spectral_window: usize,
    pub amplitude_limits: Limits,
    pub frequency_limits: Limits,
    /// A low dominant frequency is reported only above this (Hz)
    pub low_frequency_floor: f64,
    pub integrated: IntegratedConfig,
    /// Channels monitored and analysed
    pub channels: Vec<String>,
    pub simulator: SimulatorConfig,
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub montage: Montage,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            buffer_size: 500,
            sample_rate: 100.0,
            analysis_every: 100,
            anomaly_check_every: 20,
            spectral_window: 100,
            amplitude_limits: Limits::new(-2.0, 2.0),
            frequency_limits: Limits::new(0.0, 30.0),
            low_frequency_floor: 0.5,
            integrated: IntegratedConfig::default(),
            channels: (1..=4).map(|i| format!("Channel{}", i)).collect(),
            simulator: SimulatorConfig::default(),
            analysis: AnalysisConfig::default(),
            montage: Montage::default(),
        }
    }
}

impl StreamConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn integrated_interval(&self) -> Duration {
        Duration::from_millis(self.integrated.interval_ms)
    }

    /// Validate the configuration
    pub fn validate(&self) -> EegResult<()> {
        if self.tick_interval_ms == 0 || self.integrated.interval_ms == 0 {
            return Err(config_error!("Intervals must be positive"));
        }
        if self.buffer_size == 0 {
            return Err(config_error!("Buffer size must be positive"));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(EegError::InvalidSamplingRate {
                rate: self.sample_rate,
            });
        }
        if self.analysis_every == 0 || self.anomaly_check_every == 0 {
            return Err(config_error!("Check cadences must be positive"));
        }
        if self.spectral_window == 0 {
            return Err(config_error!("Spectral window must be positive"));
        }
        for (name, limits) in [
            ("amplitude", self.amplitude_limits),
            ("frequency", self.frequency_limits),
        ] {
            if limits.min > limits.max {
                return Err(config_error!(
                    "Invalid {} limits: {} > {}",
                    name,
                    limits.min,
                    limits.max
                ));
            }
        }
        if self.channels.is_empty() || self.channels.len() > MAX_CHANNELS {
            return Err(config_error!(
                "Between 1 and {} channels must be selected",
                MAX_CHANNELS
            ));
        }
        for (index, channel) in self.channels.iter().enumerate() {
            if self.channels[..index].contains(channel) {
                return Err(EegError::DuplicateChannel {
                    channel: channel.clone(),
                });
            }
        }
        if self.integrated.enabled && self.channels.len() < INTEGRATED_MIN_CHANNELS {
            return Err(config_error!(
                "Integrated analysis needs at least {} channels, {} selected",
                INTEGRATED_MIN_CHANNELS,
                self.channels.len()
            ));
        }
        self.simulator.validate()?;
        self.montage.validate()?;
        self.analysis.validate()
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
