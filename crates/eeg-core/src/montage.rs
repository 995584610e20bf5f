//! Montage: explicit mapping from channel names to scalp positions
//!
//! Pairwise biomarkers (asymmetry, coherence, front/posterior ratios) look
//! channels up by anatomical role through this table rather than by name.

use crate::config_error;
use crate::error::EegResult;
use serde::{Deserialize, Serialize};

/// Coarse scalp region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Frontal,
    TemporoParietal,
    Central,
    Occipital,
}

/// Hemisphere
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Left,
    Right,
}

/// Anatomical role of one electrode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelRole {
    pub region: Region,
    pub side: Side,
}

impl ChannelRole {
    pub const fn new(region: Region, side: Side) -> Self {
        Self { region, side }
    }
}

/// One row of the montage table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MontageEntry {
    pub channel: String,
    pub role: ChannelRole,
}

/// Channel name to anatomical role table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Montage {
    pub entries: Vec<MontageEntry>,
}

impl Montage {
    pub fn new(entries: Vec<MontageEntry>) -> EegResult<Self> {
        let montage = Self { entries };
        montage.validate()?;
        Ok(montage)
    }

    /// Standard eight electrode layout: Channel1/2 frontal, Channel3/4
    /// temporo-parietal, Channel5/6 central, Channel7/8 occipital, odd
    /// channels on the left.
    pub fn default_eight_channel() -> Self {
        let regions = [
            Region::Frontal,
            Region::TemporoParietal,
            Region::Central,
            Region::Occipital,
        ];
        let entries = regions
            .iter()
            .enumerate()
            .flat_map(|(index, &region)| {
                [(Side::Left, 2 * index + 1), (Side::Right, 2 * index + 2)]
                    .into_iter()
                    .map(move |(side, number)| MontageEntry {
                        channel: format!("Channel{}", number),
                        role: ChannelRole::new(region, side),
                    })
            })
            .collect();
        Self { entries }
    }

    /// Each channel and each role may appear at most once
    pub fn validate(&self) -> EegResult<()> {
        for (index, entry) in self.entries.iter().enumerate() {
            let earlier = &self.entries[..index];
            if earlier.iter().any(|e| e.channel == entry.channel) {
                return Err(config_error!("channel {} mapped twice", entry.channel));
            }
            if earlier.iter().any(|e| e.role == entry.role) {
                return Err(config_error!(
                    "role {:?}/{:?} assigned to more than one channel",
                    entry.role.region,
                    entry.role.side
                ));
            }
        }
        Ok(())
    }

    pub fn role_of(&self, channel: &str) -> Option<ChannelRole> {
        self.entries
            .iter()
            .find(|e| e.channel == channel)
            .map(|e| e.role)
    }

    pub fn channel_for(&self, role: ChannelRole) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.role == role)
            .map(|e| e.channel.as_str())
    }

    /// Homologous `(left, right)` channels of a region
    pub fn pair(&self, region: Region) -> Option<(&str, &str)> {
        let left = self.channel_for(ChannelRole::new(region, Side::Left))?;
        let right = self.channel_for(ChannelRole::new(region, Side::Right))?;
        Some((left, right))
    }

    pub fn to_json(&self) -> EegResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> EegResult<Self> {
        let montage: Montage = serde_json::from_str(json)?;
        montage.validate()?;
        Ok(montage)
    }
}

impl Default for Montage {
    fn default() -> Self {
        Self::default_eight_channel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EegError;

    #[test]
    fn test_default_layout() {
        let montage = Montage::default();
        assert_eq!(montage.entries.len(), 8);
        assert_eq!(montage.pair(Region::Frontal), Some(("Channel1", "Channel2")));
        assert_eq!(montage.pair(Region::TemporoParietal), Some(("Channel3", "Channel4")));
        assert_eq!(montage.pair(Region::Central), Some(("Channel5", "Channel6")));
        assert_eq!(
            montage.role_of("Channel8"),
            Some(ChannelRole::new(Region::Occipital, Side::Right))
        );
        assert!(montage.validate().is_ok());
    }

    #[test]
    fn test_json_round_trip_rejects_duplicates() {
        let montage = Montage::default();
        let json = montage.to_json().unwrap();
        assert_eq!(Montage::from_json(&json).unwrap(), montage);

        let duplicated = Montage {
            entries: vec![
                MontageEntry {
                    channel: "Fp1".into(),
                    role: ChannelRole::new(Region::Frontal, Side::Left),
                },
                MontageEntry {
                    channel: "F3".into(),
                    role: ChannelRole::new(Region::Frontal, Side::Left),
                },
            ],
        };
        assert!(matches!(
            duplicated.validate(),
            Err(EegError::ConfigurationError { .. })
        ));
    }

    #[test]
    fn test_missing_pair() {
        let montage = Montage::new(vec![MontageEntry {
            channel: "Fp1".into(),
            role: ChannelRole::new(Region::Frontal, Side::Left),
        }])
        .unwrap();
        assert_eq!(montage.pair(Region::Frontal), None);
    }
}
