//! Recording: validated container for multichannel EEG data

use crate::error::{EegError, EegResult};
use crate::invalid_input;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of channels a recording may carry
pub const MAX_CHANNELS: usize = 8;

/// Samples of a single named channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelData {
    pub name: String,
    pub samples: Vec<f64>,
}

impl ChannelData {
    pub fn new(name: impl Into<String>, samples: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            samples,
        }
    }
}

/// Multichannel recording sampled at a fixed rate.
///
/// Construction validates that the rate is positive, that there are between
/// one and [`MAX_CHANNELS`] uniquely named channels, and that every channel
/// holds the same non-zero number of samples. Deserialization goes through
/// the same checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RecordingData")]
pub struct Recording {
    /// Unique identifier for this recording
    pub id: Uuid,
    sample_rate: f64,
    channels: Vec<ChannelData>,
}

/// Unvalidated wire shape of a [`Recording`]
#[derive(Debug, Deserialize)]
struct RecordingData {
    #[serde(default)]
    id: Option<Uuid>,
    sample_rate: f64,
    channels: Vec<ChannelData>,
}

impl TryFrom<RecordingData> for Recording {
    type Error = EegError;

    fn try_from(data: RecordingData) -> EegResult<Self> {
        let mut recording = Recording::new(data.sample_rate, data.channels)?;
        if let Some(id) = data.id {
            recording.id = id;
        }
        Ok(recording)
    }
}

impl Recording {
    /// Create a recording from ordered channel data
    pub fn new(sample_rate: f64, channels: Vec<ChannelData>) -> EegResult<Self> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(EegError::InvalidSamplingRate { rate: sample_rate });
        }
        if channels.is_empty() {
            return Err(invalid_input!("recording has no channels"));
        }
        if channels.len() > MAX_CHANNELS {
            return Err(EegError::TooManyChannels {
                requested: channels.len(),
                max_supported: MAX_CHANNELS,
            });
        }

        let expected = channels[0].samples.len();
        if expected == 0 {
            return Err(invalid_input!("channel {} has no samples", channels[0].name));
        }

        for (index, channel) in channels.iter().enumerate() {
            if channels[..index].iter().any(|c| c.name == channel.name) {
                return Err(EegError::DuplicateChannel {
                    channel: channel.name.clone(),
                });
            }
            if channel.samples.len() != expected {
                return Err(EegError::LengthMismatch {
                    channel: channel.name.clone(),
                    expected,
                    actual: channel.samples.len(),
                });
            }
            if channel.samples.iter().any(|v| !v.is_finite()) {
                return Err(invalid_input!("channel {} contains non-finite samples", channel.name));
            }
        }

        Ok(Recording {
            id: Uuid::new_v4(),
            sample_rate,
            channels,
        })
    }

    /// Build a recording from `(name, samples)` pairs
    pub fn from_pairs<I, S>(sample_rate: f64, pairs: I) -> EegResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f64>)>,
        S: Into<String>,
    {
        let channels = pairs
            .into_iter()
            .map(|(name, samples)| ChannelData::new(name, samples))
            .collect();
        Self::new(sample_rate, channels)
    }

    /// Get sampling rate in Hz
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel names in recording order
    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn channels(&self) -> &[ChannelData] {
        &self.channels
    }

    pub fn has_channel(&self, name: &str) -> bool {
        self.channels.iter().any(|c| c.name == name)
    }

    /// Get number of samples per channel
    pub fn samples_per_channel(&self) -> usize {
        self.channels.first().map_or(0, |c| c.samples.len())
    }

    /// Get signal duration in seconds
    pub fn duration(&self) -> f64 {
        self.samples_per_channel() as f64 / self.sample_rate
    }

    /// Samples of a channel by name
    pub fn channel(&self, name: &str) -> EegResult<&[f64]> {
        self.channels
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.samples.as_slice())
            .ok_or_else(|| EegError::UnknownChannel {
                channel: name.to_string(),
            })
    }

    /// Last `n` samples of a channel, or the whole channel when shorter
    pub fn tail(&self, name: &str, n: usize) -> EegResult<&[f64]> {
        let samples = self.channel(name)?;
        let start = samples.len().saturating_sub(n);
        Ok(&samples[start..])
    }

    /// Resolve a channel selection, failing on the first unknown or
    /// repeated name
    pub fn resolve<'a, S: AsRef<str>>(&self, names: &'a [S]) -> EegResult<Vec<&'a str>> {
        let mut resolved: Vec<&'a str> = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            if !self.has_channel(name) {
                return Err(EegError::UnknownChannel {
                    channel: name.to_string(),
                });
            }
            if resolved.contains(&name) {
                return Err(EegError::DuplicateChannel {
                    channel: name.to_string(),
                });
            }
            resolved.push(name);
        }
        Ok(resolved)
    }

    /// Get time vector for plotting
    pub fn time_vector(&self) -> Vec<f64> {
        let dt = 1.0 / self.sample_rate;
        (0..self.samples_per_channel()).map(|i| i as f64 * dt).collect()
    }

    /// Calculate basic statistics for a channel
    pub fn channel_stats(&self, name: &str) -> EegResult<ChannelStats> {
        Ok(ChannelStats::calculate(self.channel(name)?))
    }
}

/// Basic statistics for a signal channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelStats {
    pub mean: f64,
    pub rms: f64,
    /// Population standard deviation
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub peak_to_peak: f64,
}

impl ChannelStats {
    pub fn calculate(data: &[f64]) -> Self {
        if data.is_empty() {
            return Self::default();
        }

        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;

        let sum_sq: f64 = data.iter().map(|x| x * x).sum();
        let rms = (sum_sq / n).sqrt();

        let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();

        let min = data.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = data.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        Self {
            mean,
            rms,
            std_dev,
            min,
            max,
            peak_to_peak: max - min,
        }
    }

    pub fn variance(&self) -> f64 {
        self.std_dev * self.std_dev
    }
}
