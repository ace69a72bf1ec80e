// src/acquisition/mod.rs
//
// Online acquisition: where samples come from, the connection state machine
// and the events it reports to the front end.

pub mod client;
pub mod controller;
pub mod worker;

pub use client::HttpSource;
pub use controller::AcquisitionController;
pub use worker::AcquisitionWorker;

use crate::error::{EcgError, Result};
use crate::processing::classifier::ClassificationResult;
use crate::processing::pipeline::ProcessedSignal;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::mpsc::Sender;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AcquisitionState {
    Idle,
    Polling,
    ErrorNotified,
    Disconnected,
}

impl fmt::Display for AcquisitionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AcquisitionState::Idle => "idle",
            AcquisitionState::Polling => "polling",
            AcquisitionState::ErrorNotified => "error notified",
            AcquisitionState::Disconnected => "disconnected",
        };
        f.write_str(name)
    }
}

/// What happens after the first failure of an episode has been reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Give up and move to `Disconnected`.
    #[default]
    Stop,
    /// Keep polling without further notifications until a fetch succeeds.
    Retry,
}

#[derive(Debug)]
pub enum EcgEvent {
    StateChanged(AcquisitionState),
    DataUpdated {
        processed: Arc<ProcessedSignal>,
        heart_rate_bpm: Option<f64>,
    },
    ClassificationReady(ClassificationResult),
    AnalysisWarning(EcgError),
    AcquisitionFailed(EcgError),
}

pub trait EventSink {
    fn emit(&mut self, event: EcgEvent);
}

impl EventSink for Vec<EcgEvent> {
    fn emit(&mut self, event: EcgEvent) {
        self.push(event);
    }
}

impl EventSink for Sender<EcgEvent> {
    fn emit(&mut self, event: EcgEvent) {
        // a closed receiver means nobody is watching any more
        let _ = self.send(event);
    }
}

/// A source of sample windows, one per poll.
pub trait DataSource {
    fn fetch(&mut self) -> Result<Vec<f64>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn sender_sink_survives_closed_receiver() {
        let (tx, rx) = mpsc::channel();
        let mut sink = tx;
        sink.emit(EcgEvent::StateChanged(AcquisitionState::Polling));
        assert!(matches!(
            rx.recv().unwrap(),
            EcgEvent::StateChanged(AcquisitionState::Polling)
        ));

        drop(rx);
        sink.emit(EcgEvent::StateChanged(AcquisitionState::Idle));
    }

    #[test]
    fn failure_policy_parses_from_yaml() {
        let policy: FailurePolicy = serde_yaml::from_str("retry").unwrap();
        assert_eq!(policy, FailurePolicy::Retry);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Stop);
    }
}
