use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

/// Frequency-domain band-pass: every bin whose absolute frequency is not
/// strictly inside `(lowcut, highcut)` is zeroed.
///
/// Both edges are excluded, so a component sitting exactly on `lowcut` or
/// `highcut` is removed.
#[derive(Debug, Clone)]
pub struct FftMaskFilter {
    lowcut: f64,
    highcut: f64,
    fs: f64,
}

impl FftMaskFilter {
    pub fn new(lowcut: f64, highcut: f64, fs: f64) -> Self {
        Self { lowcut, highcut, fs }
    }

    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let mut planner = FftPlanner::<f64>::new();
        let forward = planner.plan_fft_forward(n);
        let inverse = planner.plan_fft_inverse(n);

        let mut buffer: Vec<Complex<f64>> =
            samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
        forward.process(&mut buffer);

        for (k, bin) in buffer.iter_mut().enumerate() {
            if !self.passes(bin_frequency(k, n, self.fs)) {
                *bin = Complex::new(0.0, 0.0);
            }
        }

        inverse.process(&mut buffer);

        // rustfft does not normalise the inverse transform
        let scale = 1.0 / n as f64;
        buffer.iter().map(|c| c.re * scale).collect()
    }

    fn passes(&self, frequency: f64) -> bool {
        let f = frequency.abs();
        f > self.lowcut && f < self.highcut
    }
}

/// Signed frequency of bin `k` in an `n`-point transform, laid out like
/// `[0, 1, ..., ceil(n/2)-1, -floor(n/2), ..., -1] * fs / n`.
pub fn bin_frequency(k: usize, n: usize, fs: f64) -> f64 {
    let step = fs / n as f64;
    if k <= (n - 1) / 2 {
        k as f64 * step
    } else {
        (k as f64 - n as f64) * step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use std::f64::consts::PI;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    fn peak_amplitude(samples: &[f64]) -> f64 {
        samples.iter().fold(0.0f64, |acc, s| acc.max(s.abs()))
    }

    #[test]
    fn bin_frequencies_follow_fft_layout() {
        // even length
        let even: Vec<f64> = (0..4).map(|k| bin_frequency(k, 4, 4.0)).collect();
        assert_eq!(even, vec![0.0, 1.0, -2.0, -1.0]);
        // odd length
        let odd: Vec<f64> = (0..5).map(|k| bin_frequency(k, 5, 5.0)).collect();
        assert_eq!(odd, vec![0.0, 1.0, 2.0, -2.0, -1.0]);
    }

    #[test]
    fn in_band_sine_keeps_amplitude() {
        let fs = 125.0;
        let input = sine(5.0, fs, 1000);
        let output = FftMaskFilter::new(0.5, 50.0, fs).apply(&input);

        assert!(approx_eq!(f64, peak_amplitude(&output), 1.0, epsilon = 1e-6));
        for (a, b) in input.iter().zip(output.iter()) {
            assert!(approx_eq!(f64, *a, *b, epsilon = 1e-9));
        }
    }

    #[test]
    fn out_of_band_sine_is_removed() {
        let fs = 125.0;
        let output = FftMaskFilter::new(0.5, 50.0, fs).apply(&sine(60.0, fs, 1000));
        assert!(peak_amplitude(&output) < 1e-9);
    }

    #[test]
    fn band_edges_are_excluded() {
        let fs = 125.0;
        // 0.5 Hz and 50 Hz both fall exactly on bins of a 1000-point transform
        let low_edge = FftMaskFilter::new(0.5, 50.0, fs).apply(&sine(0.5, fs, 1000));
        let high_edge = FftMaskFilter::new(0.5, 50.0, fs).apply(&sine(50.0, fs, 1000));

        assert!(peak_amplitude(&low_edge) < 1e-9);
        assert!(peak_amplitude(&high_edge) < 1e-9);
    }

    #[test]
    fn dc_offset_is_removed() {
        let output = FftMaskFilter::new(0.5, 50.0, 125.0).apply(&[3.0; 250]);
        assert!(peak_amplitude(&output) < 1e-9);
    }
}
