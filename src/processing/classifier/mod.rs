pub mod template;

use crate::error::{EcgError, Result};
use crate::processing::beats::{Beat, BEAT_WINDOW_LEN};
use serde::Serialize;
use std::fmt;

pub const NUM_CLASSES: usize = 5;

/// Anything that maps a 187-sample beat window (logically shaped
/// `(1, 187, 1)`) to five per-class probabilities (logically `(1, 5)`).
pub trait BeatClassifier: Send + Sync {
    fn predict(&self, window: &[f64]) -> Result<[f64; NUM_CLASSES]>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BeatClass {
    Normal,
    SupraventricularPremature,
    VentricularEscape,
    Fusion,
    Unclassifiable,
}

impl BeatClass {
    /// Index order of the classifier output.
    pub const ALL: [BeatClass; NUM_CLASSES] = [
        BeatClass::Normal,
        BeatClass::SupraventricularPremature,
        BeatClass::VentricularEscape,
        BeatClass::Fusion,
        BeatClass::Unclassifiable,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            BeatClass::Normal => "Normal",
            BeatClass::SupraventricularPremature => "Supra-ventricular premature",
            BeatClass::VentricularEscape => "Ventricular escape",
            BeatClass::Fusion => "Fusion of ventricular and normal",
            BeatClass::Unclassifiable => "Unclassifiable",
        }
    }

    pub fn code(&self) -> char {
        match self {
            BeatClass::Normal => 'N',
            BeatClass::SupraventricularPremature => 'S',
            BeatClass::VentricularEscape => 'V',
            BeatClass::Fusion => 'F',
            BeatClass::Unclassifiable => 'Q',
        }
    }
}

impl fmt::Display for BeatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub label: BeatClass,
    pub confidence: f64,
}

impl fmt::Display for ClassificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {:.2}%", self.label, self.confidence * 100.0)
    }
}

/// Owns the injected model and turns its probabilities into a label.
pub struct ClassifierAdapter {
    model: Box<dyn BeatClassifier>,
}

impl ClassifierAdapter {
    pub fn new(model: Box<dyn BeatClassifier>) -> Self {
        Self { model }
    }

    pub fn classify(&self, beat: &Beat) -> Result<ClassificationResult> {
        if beat.len() != BEAT_WINDOW_LEN {
            return Err(EcgError::ModelInference(format!(
                "classifier expects {} samples, got {}",
                BEAT_WINDOW_LEN,
                beat.len()
            )));
        }

        let probabilities = self.model.predict(beat.samples())?;

        if let Some(bad) = probabilities
            .iter()
            .find(|p| !p.is_finite() || **p < 0.0 || **p > 1.0)
        {
            return Err(EcgError::ModelInference(format!(
                "probability {} is outside [0, 1]",
                bad
            )));
        }

        // ties resolve to the lowest index
        let (index, confidence) = probabilities.iter().copied().enumerate().fold(
            (0, probabilities[0]),
            |best, (i, p)| if p > best.1 { (i, p) } else { best },
        );

        let label = BeatClass::from_index(index).ok_or_else(|| {
            EcgError::ModelInference(format!("class index {} out of range", index))
        })?;

        log::debug!("classified beat as {} ({:.3})", label.code(), confidence);
        Ok(ClassificationResult { label, confidence })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed([f64; NUM_CLASSES]);

    impl BeatClassifier for Fixed {
        fn predict(&self, _window: &[f64]) -> Result<[f64; NUM_CLASSES]> {
            Ok(self.0)
        }
    }

    struct Failing;

    impl BeatClassifier for Failing {
        fn predict(&self, _window: &[f64]) -> Result<[f64; NUM_CLASSES]> {
            Err(EcgError::ModelInference("runtime unavailable".to_string()))
        }
    }

    fn beat() -> Beat {
        Beat::from_samples(vec![0.5; BEAT_WINDOW_LEN])
    }

    #[test]
    fn picks_most_probable_class() {
        let adapter = ClassifierAdapter::new(Box::new(Fixed([0.05, 0.1, 0.7, 0.1, 0.05])));
        let result = adapter.classify(&beat()).unwrap();
        assert_eq!(result.label, BeatClass::VentricularEscape);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn ties_go_to_lowest_index() {
        let adapter = ClassifierAdapter::new(Box::new(Fixed([0.1, 0.4, 0.4, 0.1, 0.0])));
        let result = adapter.classify(&beat()).unwrap();
        assert_eq!(result.label, BeatClass::SupraventricularPremature);
    }

    #[test]
    fn model_failure_is_propagated() {
        let adapter = ClassifierAdapter::new(Box::new(Failing));
        assert!(matches!(
            adapter.classify(&beat()),
            Err(EcgError::ModelInference(_))
        ));
    }

    #[test]
    fn invalid_probabilities_are_rejected() {
        let adapter = ClassifierAdapter::new(Box::new(Fixed([0.1, f64::NAN, 0.2, 0.3, 0.4])));
        assert!(matches!(
            adapter.classify(&beat()),
            Err(EcgError::ModelInference(_))
        ));

        let adapter = ClassifierAdapter::new(Box::new(Fixed([1.2, 0.0, 0.0, 0.0, 0.0])));
        assert!(matches!(
            adapter.classify(&beat()),
            Err(EcgError::ModelInference(_))
        ));
    }

    #[test]
    fn wrong_window_length_is_rejected() {
        let adapter = ClassifierAdapter::new(Box::new(Fixed([1.0, 0.0, 0.0, 0.0, 0.0])));
        let short = Beat::from_samples(vec![0.0; 10]);
        assert!(matches!(
            adapter.classify(&short),
            Err(EcgError::ModelInference(_))
        ));
    }

    #[test]
    fn labels_and_codes_follow_index_order() {
        let codes: String = BeatClass::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes, "NSVFQ");
        assert_eq!(BeatClass::from_index(0), Some(BeatClass::Normal));
        assert_eq!(BeatClass::from_index(5), None);
        assert_eq!(
            ClassificationResult {
                label: BeatClass::Normal,
                confidence: 0.9876
            }
            .to_string(),
            "Normal  98.76%"
        );
    }
}
