use super::{BeatClassifier, NUM_CLASSES};
use crate::error::{EcgError, Result};
use crate::processing::beats::BEAT_WINDOW_LEN;

use std::fs::File;
use std::path::Path;

/// Reference-beat classifier: one stored template per class, scored by
/// correlation with the incoming window.
pub struct TemplateClassifier {
    templates: Vec<Vec<f64>>,
}

impl TemplateClassifier {
    pub fn new(templates: Vec<Vec<f64>>) -> Result<Self> {
        if templates.len() != NUM_CLASSES {
            return Err(EcgError::InvalidConfig(format!(
                "expected {} templates, got {}",
                NUM_CLASSES,
                templates.len()
            )));
        }
        if let Some((i, t)) = templates
            .iter()
            .enumerate()
            .find(|(_, t)| t.len() != BEAT_WINDOW_LEN)
        {
            return Err(EcgError::InvalidConfig(format!(
                "template {} has {} samples, expected {}",
                i,
                t.len(),
                BEAT_WINDOW_LEN
            )));
        }

        Ok(Self { templates })
    }

    /// Reads one template per row from a header-less CSV file, in class order.
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(File::open(path)?);

        let mut templates = Vec::with_capacity(NUM_CLASSES);
        for (row, result) in rdr.records().enumerate() {
            let record = result?;
            let template = record
                .iter()
                .map(|value| {
                    value.trim().parse::<f64>().map_err(|e| {
                        EcgError::Input(format!("template row {}: '{}': {}", row, value, e))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            templates.push(template);
        }

        Self::new(templates)
    }
}

impl BeatClassifier for TemplateClassifier {
    fn predict(&self, window: &[f64]) -> Result<[f64; NUM_CLASSES]> {
        if window.len() != BEAT_WINDOW_LEN {
            return Err(EcgError::ModelInference(format!(
                "window has {} samples, expected {}",
                window.len(),
                BEAT_WINDOW_LEN
            )));
        }

        let mut scores = [0.0; NUM_CLASSES];
        for (score, template) in scores.iter_mut().zip(&self.templates) {
            *score = (calculate_correlation(window, template) + 1.0) / 2.0;
        }

        let total: f64 = scores.iter().sum();
        if total <= 0.0 {
            return Ok([1.0 / NUM_CLASSES as f64; NUM_CLASSES]);
        }
        for score in scores.iter_mut() {
            *score /= total;
        }

        Ok(scores)
    }
}

/// Pearson correlation of two equally long sequences. Zero when either is flat.
fn calculate_correlation(a: &[f64], b: &[f64]) -> f64 {
    let len = a.len().min(b.len()) as f64;
    let mean_a = a.iter().sum::<f64>() / len;
    let mean_b = b.iter().sum::<f64>() / len;

    let covariance: f64 = a
        .iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - mean_a) * (y - mean_b))
        .sum::<f64>()
        / len;

    let std_dev_a = (a.iter().map(|&x| (x - mean_a).powi(2)).sum::<f64>() / len).sqrt();
    let std_dev_b = (b.iter().map(|&y| (y - mean_b).powi(2)).sum::<f64>() / len).sqrt();

    // Avoid division by zero
    if std_dev_a == 0.0 || std_dev_b == 0.0 {
        return 0.0;
    }

    (covariance / (std_dev_a * std_dev_b)).clamp(-1.0, 1.0)
}
