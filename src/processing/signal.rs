use crate::error::{EcgError, Result};
use std::sync::Arc;

/// An immutable single-lead recording sampled at `fs` Hz.
///
/// Samples live behind an `Arc`, so clones share the buffer and keep the
/// same [`Fingerprint`].
#[derive(Debug, Clone)]
pub struct RawSignal {
    samples: Arc<[f64]>,
    fs: f64,
}

/// Identity of a [`RawSignal`] buffer: its address plus its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    address: usize,
    len: usize,
}

impl RawSignal {
    pub fn new(samples: Vec<f64>, fs: f64) -> Result<Self> {
        if !(fs > 0.0) || !fs.is_finite() {
            return Err(EcgError::InvalidConfig(format!(
                "sampling rate must be positive, got {}",
                fs
            )));
        }
        if samples.is_empty() {
            return Err(EcgError::Input("signal contains no samples".to_string()));
        }
        if let Some(idx) = samples.iter().position(|s| !s.is_finite()) {
            return Err(EcgError::Input(format!(
                "sample {} is not a finite number",
                idx
            )));
        }

        Ok(Self {
            samples: samples.into(),
            fs,
        })
    }

    pub fn samples(&self) -> &[f64] {
        &self.samples
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint {
            address: self.samples.as_ptr() as usize,
            len: self.samples.len(),
        }
    }

    /// Content comparison, used by the online path to recognise a repeated payload.
    pub fn same_samples(&self, other: &[f64]) -> bool {
        self.samples.as_ref() == other
    }
}
