//! Rolling per-channel sample buffer

use crate::simulator::Sample;
use eeg_core::{config_error, invalid_input, EegError, EegResult, Recording};
use std::collections::VecDeque;

/// Rolling buffer holding the most recent samples of each channel
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    channel_names: Vec<String>,
    per_channel: Vec<VecDeque<f64>>,
    times: VecDeque<f64>,
    capacity: usize,
}

impl StreamBuffer {
    pub fn new(channel_names: Vec<String>, capacity: usize) -> EegResult<Self> {
        if capacity == 0 {
            return Err(config_error!("Buffer capacity must be positive"));
        }
        let per_channel = channel_names
            .iter()
            .map(|_| VecDeque::with_capacity(capacity))
            .collect();
        Ok(Self {
            channel_names,
            per_channel,
            times: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn channel_names(&self) -> &[String] {
        &self.channel_names
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Change the capacity, dropping the oldest samples that no longer fit
    pub fn set_capacity(&mut self, capacity: usize) -> EegResult<()> {
        if capacity == 0 {
            return Err(config_error!("Buffer capacity must be positive"));
        }
        self.capacity = capacity;
        self.trim();
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn clear(&mut self) {
        self.times.clear();
        self.per_channel.iter_mut().for_each(VecDeque::clear);
    }

    /// Append one sample and trim to capacity
    pub fn push(&mut self, sample: &Sample) -> EegResult<()> {
        if sample.values.len() != self.per_channel.len() {
            return Err(invalid_input!(
                "sample carries {} values for {} channels",
                sample.values.len(),
                self.per_channel.len()
            ));
        }
        for (queue, &value) in self.per_channel.iter_mut().zip(&sample.values) {
            queue.push_back(value);
        }
        self.times.push_back(sample.time);
        self.trim();
        Ok(())
    }

    fn trim(&mut self) {
        while self.times.len() > self.capacity {
            self.times.pop_front();
            for queue in &mut self.per_channel {
                queue.pop_front();
            }
        }
    }

    fn index_of(&self, name: &str) -> EegResult<usize> {
        self.channel_names
            .iter()
            .position(|n| n == name)
            .ok_or_else(|| EegError::UnknownChannel {
                channel: name.to_string(),
            })
    }

    /// Most recent value of a channel
    pub fn latest(&self, name: &str) -> EegResult<Option<f64>> {
        Ok(self.per_channel[self.index_of(name)?].back().copied())
    }

    /// Up to the last `n` values of a channel, oldest first
    pub fn tail(&self, name: &str, n: usize) -> EegResult<Vec<f64>> {
        let queue = &self.per_channel[self.index_of(name)?];
        let skip = queue.len().saturating_sub(n);
        Ok(queue.iter().skip(skip).copied().collect())
    }

    /// Time of the most recent sample
    pub fn latest_time(&self) -> Option<f64> {
        self.times.back().copied()
    }

    /// Copy the buffered samples into a [`Recording`]
    pub fn snapshot(&self, sample_rate: f64) -> EegResult<Recording> {
        Recording::from_pairs(
            sample_rate,
            self.channel_names
                .iter()
                .zip(&self.per_channel)
                .map(|(name, queue)| (name.clone(), queue.iter().copied().collect::<Vec<_>>())),
        )
    }
}
