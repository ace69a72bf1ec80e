use serde::{Deserialize, Serialize};

/// How the height threshold and minimum peak spacing are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum ThresholdPolicy {
    /// Threshold `ratio * max(signal)`, spacing `floor(min_distance_seconds * fs)`.
    Adaptive {
        ratio: f64,
        min_distance_seconds: f64,
    },
    /// Fixed height and spacing in samples, used for exploratory sweeps.
    Absolute { height: f64, distance: usize },
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        ThresholdPolicy::Adaptive {
            ratio: 0.6,
            min_distance_seconds: 0.2,
        }
    }
}

impl ThresholdPolicy {
    pub fn exploratory() -> Self {
        ThresholdPolicy::Absolute {
            height: 0.1,
            distance: 50,
        }
    }

    /// Returns `(threshold, min_distance)` for `signal` sampled at `fs`.
    pub fn resolve(&self, signal: &[f64], fs: f64) -> (f64, usize) {
        match *self {
            ThresholdPolicy::Adaptive {
                ratio,
                min_distance_seconds,
            } => {
                let max = signal.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let distance = (min_distance_seconds * fs).floor() as usize;
                (ratio * max, distance.max(1))
            }
            ThresholdPolicy::Absolute { height, distance } => (height, distance.max(1)),
        }
    }
}

/// Peak indices together with the threshold that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSet {
    pub indices: Vec<usize>,
    pub threshold: f64,
    pub min_distance: usize,
}

pub struct PeakDetector {
    policy: ThresholdPolicy,
    fs: f64,
}

impl PeakDetector {
    pub fn new(policy: ThresholdPolicy, fs: f64) -> Self {
        Self { policy, fs }
    }

    pub fn detect(&self, signal: &[f64]) -> PeakSet {
        let (threshold, min_distance) = self.policy.resolve(signal, self.fs);
        PeakSet {
            indices: find_peaks(signal, threshold, min_distance),
            threshold,
            min_distance,
        }
    }
}

/// Local maxima with `value >= threshold`, thinned so that kept peaks are at
/// least `min_distance` samples apart.
///
/// A local maximum is a sample strictly greater than its left neighbour and
/// greater than the first differing sample to its right. For a flat top the
/// first sample of the plateau is reported. The first and last samples never
/// qualify. Thinning is greedy from the left: a peak is dropped when it lies
/// closer than `min_distance` to the last kept one.
pub fn find_peaks(signal: &[f64], threshold: f64, min_distance: usize) -> Vec<usize> {
    let n = signal.len();
    let mut peaks: Vec<usize> = Vec::new();
    if n < 3 {
        return peaks;
    }

    let mut i = 1;
    while i < n - 1 {
        if signal[i - 1] < signal[i] {
            // walk over a plateau
            let mut ahead = i + 1;
            while ahead < n - 1 && signal[ahead] == signal[i] {
                ahead += 1;
            }

            if signal[ahead] < signal[i] {
                if signal[i] >= threshold {
                    let far_enough = peaks
                        .last()
                        .map_or(true, |&last| i - last >= min_distance);
                    if far_enough {
                        peaks.push(i);
                    }
                }
                i = ahead;
                continue;
            }
        }
        i += 1;
    }

    peaks
}
