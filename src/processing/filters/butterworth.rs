use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

// Bilinear transform constant for a design normalised to Nyquist = 1 (2 * fs with fs = 2).
const BILINEAR_K: f64 = 4.0;

/// Band-pass Butterworth filter stored as a cascade of second-order sections.
#[derive(Debug, Clone)]
pub struct ButterworthFilter {
    sections: Vec<SecondOrderSection>,
    fs: f64,
}

#[derive(Debug, Clone, Copy)]
struct SecondOrderSection {
    b: [f64; 3],
    a: [f64; 3],
}

// Direct form I history of one section
#[derive(Debug, Clone, Copy)]
struct SectionState {
    x: [f64; 2],
    y: [f64; 2],
}

impl SecondOrderSection {
    // Every band-pass section carries one zero at z = 1 and one at z = -1.
    fn band_pass(a1: f64, a2: f64) -> Self {
        Self {
            b: [1.0, 0.0, -1.0],
            a: [1.0, a1, a2],
        }
    }

    fn from_complex_pole(pole: Complex64) -> Self {
        Self::band_pass(-2.0 * pole.re, pole.norm_sqr())
    }

    fn from_real_poles(p1: f64, p2: f64) -> Self {
        Self::band_pass(-(p1 + p2), p1 * p2)
    }

    fn dc_gain(&self) -> f64 {
        (self.b[0] + self.b[1] + self.b[2]) / (self.a[0] + self.a[1] + self.a[2])
    }

    fn response(&self, omega: f64) -> Complex64 {
        let z1 = Complex64::from_polar(1.0, -omega);
        let z2 = z1 * z1;
        let num = z1 * self.b[1] + z2 * self.b[2] + self.b[0];
        let den = z1 * self.a[1] + z2 * self.a[2] + self.a[0];
        num / den
    }
}

impl SectionState {
    // History for a section that has seen `input` forever.
    fn steady(input: f64, gain: f64) -> Self {
        Self {
            x: [input, input],
            y: [input * gain, input * gain],
        }
    }

    fn calculate_output(&mut self, section: &SecondOrderSection, input: f64) -> f64 {
        let (a, b) = (&section.a, &section.b);
        let output = (b[0] / a[0]) * input + (b[1] / a[0]) * self.x[0] + (b[2] / a[0]) * self.x[1]
            - (a[1] / a[0]) * self.y[0]
            - (a[2] / a[0]) * self.y[1];

        // Update internal sample history
        self.x[1] = self.x[0];
        self.x[0] = input;
        self.y[1] = self.y[0];
        self.y[0] = output;

        output
    }
}

impl ButterworthFilter {
    /// Designs an `order`-th order band-pass Butterworth filter (`2 * order`
    /// poles) with pass band `lowcut..highcut` Hz.
    ///
    /// Callers validate the band first: `0 < lowcut < highcut < fs / 2`.
    pub fn design(lowcut: f64, highcut: f64, fs: f64, order: usize) -> Self {
        let nyquist = fs / 2.0;
        let warp = |f: f64| BILINEAR_K * (PI * (f / nyquist) / 2.0).tan();
        let (w_low, w_high) = (warp(lowcut), warp(highcut));
        let bandwidth = w_high - w_low;
        let w_center_sq = w_low * w_high;

        let bilinear = |p: Complex64| (p + BILINEAR_K) / (-p + BILINEAR_K);
        // low-pass prototype pole -> the two band-pass poles it maps to
        let to_band_pass = |p: Complex64| {
            let scaled = p * (bandwidth / 2.0);
            let root = (scaled * scaled - w_center_sq).sqrt();
            (scaled + root, scaled - root)
        };

        let n = order as i32;
        let mut sections = Vec::with_capacity(order);
        for m in (-(n - 1)..=(n - 1)).step_by(2) {
            let prototype = -Complex64::from_polar(1.0, PI * m as f64 / (2.0 * n as f64));

            if m > 0 {
                // The conjugate prototype pole (-m) yields the conjugates of these two.
                let (p1, p2) = to_band_pass(prototype);
                sections.push(SecondOrderSection::from_complex_pole(bilinear(p1)));
                sections.push(SecondOrderSection::from_complex_pole(bilinear(p2)));
            } else if m == 0 {
                let half_bw = bandwidth / 2.0;
                let disc = half_bw * half_bw - w_center_sq;
                if disc >= 0.0 {
                    let p1 = bilinear(Complex64::new(-half_bw + disc.sqrt(), 0.0));
                    let p2 = bilinear(Complex64::new(-half_bw - disc.sqrt(), 0.0));
                    sections.push(SecondOrderSection::from_real_poles(p1.re, p2.re));
                } else {
                    let p = bilinear(Complex64::new(-half_bw, (-disc).sqrt()));
                    sections.push(SecondOrderSection::from_complex_pole(p));
                }
            }
        }

        // Unit gain at the geometric centre of the pre-warped band.
        let omega_center = 2.0 * (w_center_sq.sqrt() / BILINEAR_K).atan();
        let gain = sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(omega_center))
            .norm();
        if let Some(first) = sections.first_mut() {
            for coefficient in first.b.iter_mut() {
                *coefficient /= gain;
            }
        }

        Self { sections, fs }
    }

    /// Magnitude response of a single forward pass at `frequency` Hz.
    pub fn magnitude_at(&self, frequency: f64) -> f64 {
        let omega = 2.0 * PI * frequency / self.fs;
        self.sections
            .iter()
            .fold(Complex64::new(1.0, 0.0), |acc, s| acc * s.response(omega))
            .norm()
    }

    pub fn order(&self) -> usize {
        self.sections.len()
    }

    /// Zero-phase filtering: forward pass, then a pass over the reversed
    /// output. The signal is padded by odd reflection at both ends and each
    /// pass starts from steady-state section history.
    pub fn filtfilt(&self, samples: &[f64]) -> Vec<f64> {
        let n = samples.len();
        if n == 0 {
            return Vec::new();
        }

        let padlen = (3 * (2 * self.sections.len() + 1)).min(n - 1);
        let extended = odd_extend(samples, padlen);

        let mut forward = self.run(&extended);
        forward.reverse();
        let mut backward = self.run(&forward);
        backward.reverse();

        backward[padlen..padlen + n].to_vec()
    }

    fn run(&self, input: &[f64]) -> Vec<f64> {
        let mut level = input.first().copied().unwrap_or_default();
        let mut states: Vec<SectionState> = self
            .sections
            .iter()
            .map(|section| {
                let gain = section.dc_gain();
                let state = SectionState::steady(level, gain);
                level *= gain;
                state
            })
            .collect();

        input
            .iter()
            .map(|&sample| {
                self.sections
                    .iter()
                    .zip(states.iter_mut())
                    .fold(sample, |acc, (section, state)| {
                        state.calculate_output(section, acc)
                    })
            })
            .collect()
    }
}

fn odd_extend(samples: &[f64], padlen: usize) -> Vec<f64> {
    let n = samples.len();
    let first = samples[0];
    let last = samples[n - 1];

    let mut extended = Vec::with_capacity(n + 2 * padlen);
    extended.extend((1..=padlen).rev().map(|i| 2.0 * first - samples[i]));
    extended.extend_from_slice(samples);
    extended.extend((1..=padlen).map(|i| 2.0 * last - samples[n - 1 - i]));
    extended
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    fn sine(freq: f64, fs: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f64 / fs).sin())
            .collect()
    }

    #[test]
    fn design_has_one_section_per_order() {
        for order in 1..=6 {
            assert_eq!(ButterworthFilter::design(0.5, 40.0, 125.0, order).order(), order);
        }
    }

    #[test]
    fn response_is_flat_in_band_and_small_outside() {
        let filter = ButterworthFilter::design(5.0, 40.0, 250.0, 5);
        assert!(approx_eq!(f64, filter.magnitude_at(15.0), 1.0, epsilon = 1e-3));
        assert!(filter.magnitude_at(100.0) < 1e-3);
        assert!(filter.magnitude_at(0.5) < 1e-3);
    }

    #[test]
    fn odd_extension_mirrors_about_edges() {
        let extended = odd_extend(&[1.0, 2.0, 4.0, 7.0], 2);
        assert_eq!(extended, vec![-3.0, 0.0, 1.0, 2.0, 4.0, 7.0, 10.0, 12.0]);
    }

    #[test]
    fn constant_signal_filters_to_zero() {
        let filter = ButterworthFilter::design(0.5, 50.0, 125.0, 5);
        let output = filter.filtfilt(&[2.5; 300]);
        assert_eq!(output.len(), 300);
        assert!(output.iter().all(|v| v.abs() < 1e-9));
    }

    #[test]
    fn in_band_sine_passes_without_phase_shift() {
        let fs = 250.0;
        let input = sine(15.0, fs, 1000);
        let output = ButterworthFilter::design(5.0, 40.0, fs, 5).filtfilt(&input);

        for i in 250..750 {
            assert!(
                (input[i] - output[i]).abs() < 1e-2,
                "sample {} deviates: {} vs {}",
                i,
                input[i],
                output[i]
            );
        }
    }

    #[test]
    fn out_of_band_sine_is_attenuated() {
        let fs = 250.0;
        let output = ButterworthFilter::design(5.0, 40.0, fs, 5).filtfilt(&sine(100.0, fs, 1000));
        let peak = output[250..750].iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
        assert!(peak < 1e-2, "residual amplitude {}", peak);
    }

    #[test]
    fn short_signals_are_handled() {
        let filter = ButterworthFilter::design(0.5, 50.0, 125.0, 5);
        assert_eq!(filter.filtfilt(&[1.0]).len(), 1);
        assert_eq!(filter.filtfilt(&[1.0, -1.0, 0.5]).len(), 3);
    }
}
