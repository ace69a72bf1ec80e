use crate::config::Config;
use crate::error::{EcgError, Result};
use crate::processing::beats::{estimate_rate, segment, Beat, BEAT_WINDOW_LEN};
use crate::processing::classifier::template::TemplateClassifier;
use crate::processing::classifier::{ClassificationResult, ClassifierAdapter};
use crate::processing::detectors::{PeakDetector, PeakSet, ThresholdPolicy};
use crate::processing::filters::{self, FilterConfig};
use crate::processing::normalize::normalize;
use crate::processing::session::{lock_session, SharedSession, Ticket};
use crate::processing::signal::RawSignal;
use crate::utils::log::log_csv;

use log::{debug, info, warn};
use std::sync::Arc;

// -----------------------------------------------------------------------------
// CACHED STAGE: FILTER -> NORMALIZE -> PEAKS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProcessingSettings {
    pub filter: FilterConfig,
    pub threshold: ThresholdPolicy,
}

#[derive(Debug, Clone)]
pub struct ProcessedSignal {
    pub filtered: Vec<f64>,
    pub normalized: Vec<f64>,
    pub peaks: PeakSet,
}

impl ProcessedSignal {
    pub fn threshold(&self) -> f64 {
        self.peaks.threshold
    }
}

pub fn process(raw: &RawSignal, settings: &ProcessingSettings) -> Result<ProcessedSignal> {
    // A constant input filters to a constant signal, whatever rounding noise
    // the transform leaves behind, so it can never be normalized.
    let samples = raw.samples();
    if samples.iter().all(|&s| s == samples[0]) {
        return Err(EcgError::DivideByZero);
    }

    let filtered = filters::filter(raw, &settings.filter)?;
    let normalized = normalize(&filtered)?;
    let peaks = PeakDetector::new(settings.threshold, raw.fs()).detect(&normalized);

    debug!(
        "processed {} samples: {} peaks above {:.3}",
        raw.len(),
        peaks.indices.len(),
        peaks.threshold
    );

    Ok(ProcessedSignal {
        filtered,
        normalized,
        peaks,
    })
}

// -----------------------------------------------------------------------------
// FULL ANALYSIS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub processed: Arc<ProcessedSignal>,
    pub heart_rate_bpm: f64,
    pub beat: Beat,
    pub classification: Option<ClassificationResult>,
    /// Set when the classifier failed; the rest of the report is still valid.
    pub classification_error: Option<String>,
}

/// Work started under the session lock, finished outside it.
pub struct PendingAnalysis {
    ticket: Ticket,
    pub processed: Arc<ProcessedSignal>,
    fs: f64,
}

pub struct Pipeline {
    fs: f64,
    settings: ProcessingSettings,
    window_length: usize,
    classifier: Option<ClassifierAdapter>,
    session_log: Option<String>,
}

impl Pipeline {
    pub fn new(fs: f64, settings: ProcessingSettings) -> Self {
        Self {
            fs,
            settings,
            window_length: BEAT_WINDOW_LEN,
            classifier: None,
            session_log: None,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut pipeline = Self::new(config.processor.fs, config.processing_settings())
            .with_window_length(config.segmenter.window_length);

        if let Some(path) = &config.classifier.templates_path {
            let model = TemplateClassifier::from_csv(path)?;
            info!("loaded beat templates from {}", path);
            pipeline = pipeline.with_classifier(ClassifierAdapter::new(Box::new(model)));
        }
        if config.processor.enable_debug_logging {
            pipeline.session_log = Some(config.processor.session_log.clone());
        }

        Ok(pipeline)
    }

    pub fn with_window_length(mut self, window_length: usize) -> Self {
        self.window_length = window_length;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierAdapter) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn fs(&self) -> f64 {
        self.fs
    }

    pub fn settings(&self) -> &ProcessingSettings {
        &self.settings
    }

    /// Rate, beat window and (if a classifier is installed) classification.
    /// Inference failures are kept in the report instead of failing it.
    pub fn measure(&self, processed: Arc<ProcessedSignal>, fs: f64) -> Result<AnalysisReport> {
        let peaks = &processed.peaks.indices;
        let heart_rate_bpm = estimate_rate(peaks, fs)?;
        let beat = segment(&processed.normalized, peaks, self.window_length)?;

        let (classification, classification_error) = match &self.classifier {
            None => (None, None),
            Some(classifier) => match classifier.classify(&beat) {
                Ok(result) => (Some(result), None),
                Err(e) => {
                    warn!("classification skipped: {}", e);
                    (None, Some(e.to_string()))
                }
            },
        };

        Ok(AnalysisReport {
            processed,
            heart_rate_bpm,
            beat,
            classification,
            classification_error,
        })
    }

    /// Runs the cached stage for the session's current signal under the lock.
    pub fn begin(&self, shared: &SharedSession) -> Result<PendingAnalysis> {
        let mut session = lock_session(shared);
        let raw = session
            .raw()
            .cloned()
            .ok_or_else(|| EcgError::Input("no signal loaded".to_string()))?;
        let ticket = session.issue_ticket();
        let processed = session.cache_mut().get_or_compute(&raw, &self.settings)?;

        Ok(PendingAnalysis {
            ticket,
            processed,
            fs: raw.fs(),
        })
    }

    /// Measures outside the lock, then commits. `Ok(None)` means a newer
    /// request was committed first and this result was discarded.
    pub fn complete(
        &self,
        shared: &SharedSession,
        pending: PendingAnalysis,
    ) -> Result<Option<AnalysisReport>> {
        let report = self.measure(pending.processed, pending.fs)?;

        let mut session = lock_session(shared);
        if !session.commit(pending.ticket, report.clone()) {
            debug!("discarding stale analysis result");
            return Ok(None);
        }
        drop(session);

        self.log_report(&report);
        Ok(Some(report))
    }

    /// The manual "analyze" action.
    pub fn analyze(&self, shared: &SharedSession) -> Result<Option<AnalysisReport>> {
        let pending = self.begin(shared)?;
        self.complete(shared, pending)
    }

    fn log_report(&self, report: &AnalysisReport) {
        let Some(filename) = &self.session_log else {
            return;
        };

        let timestamp = chrono::Local::now().to_rfc3339();
        let samples = report.processed.normalized.len().to_string();
        let peaks = report.processed.peaks.indices.len().to_string();
        let bpm = format!("{:.1}", report.heart_rate_bpm);
        let (label, confidence) = match &report.classification {
            Some(c) => (c.label.code().to_string(), format!("{:.4}", c.confidence)),
            None => (String::new(), String::new()),
        };

        if let Err(e) = log_csv(
            filename,
            &["timestamp", "samples", "peaks", "bpm", "label", "confidence"],
            &[&timestamp, &samples, &peaks, &bpm, &label, &confidence],
        ) {
            warn!("failed to write session log: {}", e);
        }
    }
}
