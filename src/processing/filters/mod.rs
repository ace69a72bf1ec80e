pub mod butterworth;
pub mod fft_mask;

use crate::error::{EcgError, Result};
use crate::processing::signal::RawSignal;
use butterworth::ButterworthFilter;
use fft_mask::FftMaskFilter;

use serde::{Deserialize, Serialize};

pub const DEFAULT_BUTTERWORTH_ORDER: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Zero every FFT bin outside the band. Fast path for online use.
    FftMask,
    /// Zero-phase band-pass Butterworth. Quality path for batch analysis.
    Butterworth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub strategy: FilterStrategy,
    pub lowcut: f64,
    pub highcut: f64,
    #[serde(default = "default_order")]
    pub order: usize,
}

fn default_order() -> usize {
    DEFAULT_BUTTERWORTH_ORDER
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::fft_mask(0.5, 50.0)
    }
}

impl FilterConfig {
    pub fn fft_mask(lowcut: f64, highcut: f64) -> Self {
        Self {
            strategy: FilterStrategy::FftMask,
            lowcut,
            highcut,
            order: DEFAULT_BUTTERWORTH_ORDER,
        }
    }

    pub fn butterworth(lowcut: f64, highcut: f64, order: usize) -> Self {
        Self {
            strategy: FilterStrategy::Butterworth,
            lowcut,
            highcut,
            order,
        }
    }

    /// Checks `0 <= lowcut < highcut <= fs/2`. The Butterworth design needs
    /// both critical frequencies strictly inside `(0, fs/2)`.
    pub fn validate(&self, fs: f64) -> Result<()> {
        let nyquist = fs / 2.0;
        if !(self.lowcut >= 0.0 && self.lowcut < self.highcut && self.highcut <= nyquist) {
            return Err(EcgError::InvalidConfig(format!(
                "filter band must satisfy 0 <= lowcut < highcut <= fs/2 (lowcut={}, highcut={}, fs/2={})",
                self.lowcut, self.highcut, nyquist
            )));
        }

        if self.strategy == FilterStrategy::Butterworth {
            if self.lowcut == 0.0 || self.highcut == nyquist {
                return Err(EcgError::InvalidConfig(
                    "butterworth critical frequencies must lie strictly between 0 and fs/2"
                        .to_string(),
                ));
            }
            if self.order == 0 {
                return Err(EcgError::InvalidConfig(
                    "butterworth order must be at least 1".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// A band-pass filter ready to run over whole signals.
pub enum Filter {
    FftMask(FftMaskFilter),
    Butterworth(ButterworthFilter),
}

impl Filter {
    pub fn new(config: &FilterConfig, fs: f64) -> Result<Self> {
        config.validate(fs)?;
        Ok(match config.strategy {
            FilterStrategy::FftMask => {
                Filter::FftMask(FftMaskFilter::new(config.lowcut, config.highcut, fs))
            }
            FilterStrategy::Butterworth => Filter::Butterworth(ButterworthFilter::design(
                config.lowcut,
                config.highcut,
                fs,
                config.order,
            )),
        })
    }

    /// Output has the same length as `samples`.
    pub fn apply(&self, samples: &[f64]) -> Vec<f64> {
        match self {
            Filter::FftMask(filter) => filter.apply(samples),
            Filter::Butterworth(filter) => filter.filtfilt(samples),
        }
    }
}

/// Filters a raw signal with the strategy selected by `config`.
pub fn filter(signal: &RawSignal, config: &FilterConfig) -> Result<Vec<f64>> {
    let filter = Filter::new(config, signal.fs())?;
    Ok(filter.apply(signal.samples()))
}
