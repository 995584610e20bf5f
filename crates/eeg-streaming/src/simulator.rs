//! Synthetic EEG source with random anomaly injection

use crate::signal_patterns::{presets, ChannelPreset};
use eeg_core::{config_error, EegResult, MAX_CHANNELS};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Bernoulli, Distribution, Uniform};
use serde::{Deserialize, Serialize};

/// Anomaly written into one channel of a sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InjectedAnomaly {
    Spike { channel: String, value: f64 },
    Flatline { channel: String },
}

impl InjectedAnomaly {
    pub fn channel(&self) -> &str {
        match self {
            InjectedAnomaly::Spike { channel, .. } | InjectedAnomaly::Flatline { channel } => channel,
        }
    }
}

/// One multichannel sample in source channel order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Seconds since the start of the session
    pub time: f64,
    pub values: Vec<f64>,
    pub anomaly: Option<InjectedAnomaly>,
}

/// Anything the scheduler can pull samples from
pub trait SampleSource: Send {
    /// Channel names, matching the order of [`Sample::values`]
    fn channel_names(&self) -> Vec<String>;

    /// Produce the sample with the given session index
    fn next_sample(&mut self, index: u64) -> EegResult<Sample>;

    /// Return to the initial state for a new session
    fn reset(&mut self);
}

/// Configuration for the EEG simulator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub channels: Vec<ChannelPreset>,
    /// Rate used to map sample indices to time (Hz)
    pub sample_rate: f64,
    /// Half width of the uniform noise added to every value
    pub noise_amplitude: f64,
    /// Per-sample probability of injecting an anomaly
    pub anomaly_probability: f64,
    /// Spike magnitude range, sign chosen at random
    pub spike_range: (f64, f64),
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            channels: presets(),
            sample_rate: 100.0,
            noise_amplitude: 0.125,
            anomaly_probability: 0.03,
            spike_range: (2.0, 3.5),
            seed: None,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> EegResult<()> {
        if self.channels.is_empty() || self.channels.len() > MAX_CHANNELS {
            return Err(config_error!(
                "Simulator needs between 1 and {} channels, got {}",
                MAX_CHANNELS,
                self.channels.len()
            ));
        }
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(config_error!("Invalid simulator sample rate: {}", self.sample_rate));
        }
        if self.noise_amplitude < 0.0 {
            return Err(config_error!("Noise amplitude must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.anomaly_probability) {
            return Err(config_error!(
                "Anomaly probability {} outside [0, 1]",
                self.anomaly_probability
            ));
        }
        let (low, high) = self.spike_range;
        if low < 0.0 || low >= high {
            return Err(config_error!("Invalid spike range: {}..{}", low, high));
        }
        Ok(())
    }
}

/// EEG simulator producing the preset waveforms plus noise
pub struct EegSimulator {
    config: SimulatorConfig,
    rng: StdRng,
    noise: Option<Uniform<f64>>,
    injection: Bernoulli,
}

impl EegSimulator {
    pub fn new(config: SimulatorConfig) -> EegResult<Self> {
        config.validate()?;

        let injection = Bernoulli::new(config.anomaly_probability)
            .map_err(|e| config_error!("Invalid anomaly probability: {}", e))?;
        let noise = (config.noise_amplitude > 0.0)
            .then(|| Uniform::new(-config.noise_amplitude, config.noise_amplitude));

        Ok(Self {
            rng: StdRng::seed_from_u64(Self::seed_of(&config)),
            config,
            noise,
            injection,
        })
    }

    fn seed_of(config: &SimulatorConfig) -> u64 {
        config.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default()
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    fn inject(&mut self, values: &mut [f64]) -> InjectedAnomaly {
        let index = self.rng.gen_range(0..values.len());
        let channel = self.config.channels[index].name.clone();

        if self.rng.gen_bool(0.5) {
            let (low, high) = self.config.spike_range;
            let magnitude = self.rng.gen_range(low..high);
            let value = if self.rng.gen_bool(0.5) { magnitude } else { -magnitude };
            values[index] = value;
            InjectedAnomaly::Spike { channel, value }
        } else {
            values[index] = 0.0;
            InjectedAnomaly::Flatline { channel }
        }
    }
}

impl SampleSource for EegSimulator {
    fn channel_names(&self) -> Vec<String> {
        self.config.channels.iter().map(|c| c.name.clone()).collect()
    }

    fn next_sample(&mut self, index: u64) -> EegResult<Sample> {
        let time = index as f64 / self.config.sample_rate;

        let mut values = Vec::with_capacity(self.config.channels.len());
        for preset in &self.config.channels {
            let noise = match &self.noise {
                Some(dist) => dist.sample(&mut self.rng),
                None => 0.0,
            };
            values.push(preset.pattern.value_at(time) + noise);
        }

        let anomaly = if self.injection.sample(&mut self.rng) {
            Some(self.inject(&mut values))
        } else {
            None
        };

        Ok(Sample {
            time,
            values,
            anomaly,
        })
    }

    fn reset(&mut self) {
        if let Some(seed) = self.config.seed {
            self.rng = StdRng::seed_from_u64(seed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(probability: f64) -> EegSimulator {
        EegSimulator::new(SimulatorConfig {
            anomaly_probability: probability,
            seed: Some(42),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_simulator_values_within_bounds() {
        let mut sim = seeded(0.0);
        assert_eq!(sim.channel_names().len(), 8);

        for index in 0..500 {
            let sample = sim.next_sample(index).unwrap();
            assert!(sample.anomaly.is_none());
            assert_eq!(sample.values.len(), 8);
            for v in sample.values {
                assert!(v.abs() <= 0.8 + 0.3 + 0.125 + 1e-9);
            }
        }
    }

    #[test]
    fn test_anomaly_injection() {
        let mut sim = seeded(1.0);
        for index in 0..100 {
            let sample = sim.next_sample(index).unwrap();
            let anomaly = sample.anomaly.expect("every sample carries an anomaly");
            let position = sim
                .channel_names()
                .iter()
                .position(|n| n == anomaly.channel())
                .unwrap();
            match anomaly {
                InjectedAnomaly::Spike { value, .. } => {
                    assert!((2.0..3.5).contains(&value.abs()));
                    assert_eq!(sample.values[position], value);
                }
                InjectedAnomaly::Flatline { .. } => assert_eq!(sample.values[position], 0.0),
            }
        }
    }

    #[test]
    fn test_seed_reproducibility() {
        let mut a = seeded(0.03);
        let mut b = seeded(0.03);
        for index in 0..200 {
            assert_eq!(a.next_sample(index).unwrap(), b.next_sample(index).unwrap());
        }

        let first = {
            a.reset();
            a.next_sample(0).unwrap()
        };
        let mut c = seeded(0.03);
        assert_eq!(first, c.next_sample(0).unwrap());
    }

    #[test]
    fn test_noise_free_timebase() {
        let mut sim = EegSimulator::new(SimulatorConfig {
            noise_amplitude: 0.0,
            anomaly_probability: 0.0,
            seed: Some(1),
            ..Default::default()
        })
        .unwrap();
        let sample = sim.next_sample(25).unwrap();
        assert!((sample.time - 0.25).abs() < 1e-12);
        let expected = presets()[0].pattern.value_at(0.25);
        assert!((sample.values[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_config() {
        let config = SimulatorConfig {
            anomaly_probability: 1.5,
            ..Default::default()
        };
        assert!(EegSimulator::new(config).is_err());

        let config = SimulatorConfig {
            channels: Vec::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
