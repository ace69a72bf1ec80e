use crate::processing::beats::estimate_rate;
use crate::processing::detectors::ThresholdPolicy;
use crate::processing::filters::FilterConfig;
use crate::processing::pipeline::{process, ProcessingSettings};
use crate::processing::signal::RawSignal;

use log::{debug, warn};
use rayon::prelude::*;
use serde::Serialize;

pub const DEFAULT_LOWCUTS: [f64; 4] = [1.0, 3.0, 5.0, 7.0];
pub const DEFAULT_HIGHCUTS: [f64; 4] = [15.0, 20.0, 25.0, 30.0];

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub lowcut: f64,
    pub highcut: f64,
    pub peaks: Vec<usize>,
    pub heart_rate_bpm: Option<f64>,
}

/// Runs the Butterworth path over every `(lowcut, highcut)` combination.
///
/// Pairs that do not form a valid band for the signal's rate are skipped.
/// Results come back in grid order (lowcut-major).
pub fn sweep(
    raw: &RawSignal,
    lowcuts: &[f64],
    highcuts: &[f64],
    order: usize,
    policy: ThresholdPolicy,
) -> Vec<SweepResult> {
    let grid: Vec<FilterConfig> = lowcuts
        .iter()
        .flat_map(|&lowcut| {
            highcuts
                .iter()
                .map(move |&highcut| FilterConfig::butterworth(lowcut, highcut, order))
        })
        .filter(|config| match config.validate(raw.fs()) {
            Ok(()) => true,
            Err(e) => {
                debug!("skipping band {}-{} Hz: {}", config.lowcut, config.highcut, e);
                false
            }
        })
        .collect();

    grid.par_iter()
        .filter_map(|filter| {
            let settings = ProcessingSettings {
                filter: filter.clone(),
                threshold: policy,
            };
            match process(raw, &settings) {
                Ok(processed) => {
                    let peaks = processed.peaks.indices;
                    Some(SweepResult {
                        lowcut: filter.lowcut,
                        highcut: filter.highcut,
                        heart_rate_bpm: estimate_rate(&peaks, raw.fs()).ok(),
                        peaks,
                    })
                }
                Err(e) => {
                    warn!("band {}-{} Hz failed: {}", filter.lowcut, filter.highcut, e);
                    None
                }
            }
        })
        .collect()
}
