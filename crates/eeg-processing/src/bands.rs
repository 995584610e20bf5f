//! Band aggregation over a [`Spectrum`]

use crate::spectrum::{transform, Spectrum};
use eeg_core::{BandLayout, BandPowerMap, BandPowers, BandRange, EegResult, Recording};

/// Mean squared magnitude of the bins with `min <= f <= max`.
///
/// Returns 0 when no bin falls inside the range.
pub fn band_power(spectrum: &Spectrum, min: f64, max: f64) -> f64 {
    let (sum, count) = spectrum
        .bins()
        .filter(|&(frequency, _)| frequency >= min && frequency <= max)
        .fold((0.0, 0usize), |(sum, count), (_, magnitude)| {
            (sum + magnitude * magnitude, count + 1)
        });

    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

pub fn range_power(spectrum: &Spectrum, range: BandRange) -> f64 {
    band_power(spectrum, range.min, range.max)
}

/// Power of every band of `layout` for one spectrum
pub fn channel_band_powers(spectrum: &Spectrum, layout: &BandLayout) -> BandPowers {
    let mut powers = BandPowers::default();
    for (band, range) in layout.iter() {
        powers.set(band, range_power(spectrum, range));
    }
    powers
}

/// Band powers for each selected channel.
///
/// With `window = Some(n)` only the trailing `n` samples of each channel are
/// transformed.
pub fn band_powers<S: AsRef<str>>(
    recording: &Recording,
    channels: &[S],
    layout: &BandLayout,
    window: Option<usize>,
) -> EegResult<BandPowerMap> {
    let mut map = BandPowerMap::new();
    for name in recording.resolve(channels)? {
        let samples = match window {
            Some(n) => recording.tail(name, n)?,
            None => recording.channel(name)?,
        };
        let spectrum = transform(samples, recording.sample_rate())?;
        map.insert(name.to_string(), channel_band_powers(&spectrum, layout));
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spectrum::tests::sine;
    use eeg_core::EegError;

    #[test]
    fn test_band_power_empty_range() {
        let spectrum = transform(&sine(10.0, 1.0, 100.0, 100), 100.0).unwrap();
        assert_eq!(band_power(&spectrum, 60.0, 80.0), 0.0);
        assert_eq!(band_power(&spectrum, 10.2, 10.8), 0.0);
    }

    #[test]
    fn test_boundary_bin_counts_in_both_bands() {
        // 13 Hz sits exactly on the alpha/beta edge at 1 Hz resolution
        let spectrum = transform(&sine(13.0, 1.0, 100.0, 100), 100.0).unwrap();
        let powers = channel_band_powers(&spectrum, &BandLayout::standard());
        assert!(powers.alpha > 0.0);
        assert!(powers.beta > 0.0);
        assert!(powers.theta < 1e-12);
    }

    #[test]
    fn test_dc_offset_stays_out_of_alpha_and_beta() {
        let tone = sine(10.0, 1.0, 100.0, 500);
        let shifted: Vec<f64> = tone.iter().map(|v| v + 3.0).collect();
        let layout = BandLayout::standard();

        let plain = channel_band_powers(&transform(&tone, 100.0).unwrap(), &layout);
        let offset = channel_band_powers(&transform(&shifted, 100.0).unwrap(), &layout);

        assert!((plain.alpha - offset.alpha).abs() < 1e-12);
        assert!((plain.beta - offset.beta).abs() < 1e-12);
        assert!((plain.gamma - offset.gamma).abs() < 1e-12);
    }

    #[test]
    fn test_band_powers_selection() {
        let recording = Recording::from_pairs(
            100.0,
            vec![
                ("Channel1", sine(10.0, 1.0, 100.0, 500)),
                ("Channel2", sine(20.0, 1.0, 100.0, 500)),
            ],
        )
        .unwrap();

        let map = band_powers(&recording, &["Channel1", "Channel2"], &BandLayout::standard(), None)
            .unwrap();
        assert!(map["Channel1"].alpha > map["Channel1"].beta);
        assert!(map["Channel2"].beta > map["Channel2"].alpha);

        let windowed =
            band_powers(&recording, &["Channel1"], &BandLayout::standard(), Some(100)).unwrap();
        assert_eq!(windowed.len(), 1);

        let err = band_powers(&recording, &["Channel7"], &BandLayout::standard(), None);
        assert!(matches!(err, Err(EegError::UnknownChannel { .. })));
    }
}
