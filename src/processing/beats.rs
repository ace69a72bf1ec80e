use crate::error::{EcgError, Result};

/// Samples per beat window expected by the classifier.
pub const BEAT_WINDOW_LEN: usize = 187;

/// Fixed-length window cut from a normalized signal between two peaks.
#[derive(Debug, Clone, PartialEq)]
pub struct Beat {
    samples: Vec<f64>,
}

impl Beat {
    pub fn from_samples(samples: Vec<f64>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Extracts `signal[peaks[0]..peaks[1]]` as a window of exactly
/// `window_length` samples: zero-padded on the right when the interval is
/// shorter, cut after `window_length` samples when it is longer.
pub fn segment(signal: &[f64], peaks: &[usize], window_length: usize) -> Result<Beat> {
    if peaks.len() < 2 {
        return Err(EcgError::InsufficientPeaks { found: peaks.len() });
    }

    let (start, end) = (peaks[0], peaks[1]);
    if start >= end || end > signal.len() {
        return Err(EcgError::Input(format!(
            "peaks {}..{} do not describe a range inside a signal of {} samples",
            start,
            end,
            signal.len()
        )));
    }

    let mut samples: Vec<f64> = signal[start..end].iter().copied().take(window_length).collect();
    samples.resize(window_length, 0.0);

    Ok(Beat { samples })
}

/// Heart rate in beats per minute from the mean spacing of consecutive peaks.
pub fn estimate_rate(peaks: &[usize], fs: f64) -> Result<f64> {
    if peaks.len() < 2 {
        return Err(EcgError::InsufficientPeaks { found: peaks.len() });
    }

    if let Some(pair) = peaks.windows(2).find(|pair| pair[1] <= pair[0]) {
        return Err(EcgError::Input(format!(
            "peak indices must increase, got {} then {}",
            pair[0], pair[1]
        )));
    }

    let total: usize = peaks.windows(2).map(|pair| pair[1] - pair[0]).sum();
    let mean_spacing = total as f64 / (peaks.len() - 1) as f64;

    Ok(fs * 60.0 / mean_spacing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn ramp(n: usize) -> Vec<f64> {
        (0..n).map(|i| i as f64 / n as f64).collect()
    }

    #[test]
    fn short_interval_is_zero_padded() {
        let signal = ramp(500);
        let beat = segment(&signal, &[10, 110], BEAT_WINDOW_LEN).unwrap();

        assert_eq!(beat.len(), BEAT_WINDOW_LEN);
        assert_eq!(&beat.samples()[..100], &signal[10..110]);
        assert!(beat.samples()[100..].iter().all(|&v| v == 0.0));
    }

    #[test]
    fn long_interval_is_truncated() {
        let signal = ramp(1000);
        let beat = segment(&signal, &[50, 450, 800], BEAT_WINDOW_LEN).unwrap();

        assert_eq!(beat.len(), BEAT_WINDOW_LEN);
        assert_eq!(beat.samples(), &signal[50..50 + BEAT_WINDOW_LEN]);
    }

    #[test]
    fn exact_interval_is_copied() {
        let signal = ramp(400);
        let beat = segment(&signal, &[0, BEAT_WINDOW_LEN], BEAT_WINDOW_LEN).unwrap();
        assert_eq!(beat.samples(), &signal[..BEAT_WINDOW_LEN]);
    }

    #[test]
    fn segment_needs_two_peaks() {
        let signal = ramp(10);
        assert!(matches!(
            segment(&signal, &[3], BEAT_WINDOW_LEN),
            Err(EcgError::InsufficientPeaks { found: 1 })
        ));
        assert!(matches!(
            segment(&signal, &[], BEAT_WINDOW_LEN),
            Err(EcgError::InsufficientPeaks { found: 0 })
        ));
    }

    #[test]
    fn rate_from_mean_spacing() {
        let bpm = estimate_rate(&[100, 225, 350], 125.0).unwrap();
        assert!(approx_eq!(f64, bpm, 60.0, ulps = 2));

        // spacings 100 and 150 -> mean 125
        let bpm = estimate_rate(&[0, 100, 250], 125.0).unwrap();
        assert!(approx_eq!(f64, bpm, 60.0, ulps = 2));

        let bpm = estimate_rate(&[0, 50], 100.0).unwrap();
        assert!(approx_eq!(f64, bpm, 120.0, ulps = 2));
    }

    #[test]
    fn rate_rejects_unordered_peaks() {
        assert!(matches!(
            estimate_rate(&[300, 100], 125.0),
            Err(EcgError::Input(_))
        ));
        assert!(matches!(
            estimate_rate(&[100, 100], 125.0),
            Err(EcgError::Input(_))
        ));
        assert!(matches!(
            estimate_rate(&[10, 200, 150], 125.0),
            Err(EcgError::Input(_))
        ));
    }

    #[test]
    fn rate_needs_two_peaks() {
        assert!(matches!(
            estimate_rate(&[], 125.0),
            Err(EcgError::InsufficientPeaks { found: 0 })
        ));
        assert!(matches!(
            estimate_rate(&[42], 125.0),
            Err(EcgError::InsufficientPeaks { found: 1 })
        ));
    }
}
