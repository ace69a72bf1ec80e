use super::{AcquisitionState, DataSource, EcgEvent, EventSink, FailurePolicy};
use crate::error::EcgError;
use crate::processing::pipeline::Pipeline;
use crate::processing::session::{lock_session, SharedSession};

use log::{debug, info, warn};

/// Connection state machine for the online mode.
///
/// Each failure episode produces exactly one `AcquisitionFailed` event: the
/// first failure after entering `Polling` notifies, later ones are only
/// logged. Returning to `Polling` (a successful fetch, or a reconnect)
/// re-arms the notification.
pub struct AcquisitionController<S: DataSource> {
    source: S,
    policy: FailurePolicy,
    state: AcquisitionState,
    notified: bool,
}

impl<S: DataSource> AcquisitionController<S> {
    pub fn new(source: S, policy: FailurePolicy) -> Self {
        Self {
            source,
            policy,
            state: AcquisitionState::Idle,
            notified: false,
        }
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    pub fn connect(&mut self, session: &SharedSession, sink: &mut dyn EventSink) {
        match self.state {
            AcquisitionState::Idle | AcquisitionState::Disconnected => {
                info!("acquisition started");
                self.transition(AcquisitionState::Polling, session, sink);
            }
            _ => debug!("connect ignored while {}", self.state),
        }
    }

    pub fn disconnect(&mut self, session: &SharedSession, sink: &mut dyn EventSink) {
        if self.state != AcquisitionState::Disconnected {
            info!("acquisition stopped");
            self.transition(AcquisitionState::Disconnected, session, sink);
        }
    }

    /// One poll. Does nothing unless the controller is polling.
    pub fn tick(
        &mut self,
        session: &SharedSession,
        pipeline: &Pipeline,
        sink: &mut dyn EventSink,
    ) -> AcquisitionState {
        if !matches!(
            self.state,
            AcquisitionState::Polling | AcquisitionState::ErrorNotified
        ) {
            return self.state;
        }

        match self.source.fetch() {
            Ok(samples) => {
                self.transition(AcquisitionState::Polling, session, sink);
                self.handle_payload(samples, session, pipeline, sink);
            }
            Err(error) => self.handle_failure(error, session, sink),
        }

        self.state
    }

    fn handle_failure(
        &mut self,
        error: EcgError,
        session: &SharedSession,
        sink: &mut dyn EventSink,
    ) {
        warn!("acquisition failed: {}", error);
        self.transition(AcquisitionState::ErrorNotified, session, sink);

        if self.notified {
            debug!("failure already reported for this episode");
        } else {
            self.notified = true;
            sink.emit(EcgEvent::AcquisitionFailed(error));
        }

        if self.policy == FailurePolicy::Stop {
            self.transition(AcquisitionState::Disconnected, session, sink);
        }
    }

    fn handle_payload(
        &mut self,
        samples: Vec<f64>,
        session: &SharedSession,
        pipeline: &Pipeline,
        sink: &mut dyn EventSink,
    ) {
        let loaded = lock_session(session).load(samples, pipeline.fs());
        match loaded {
            Ok(true) => {}
            Ok(false) => debug!("payload unchanged, reusing current signal"),
            Err(e) => {
                sink.emit(EcgEvent::AnalysisWarning(e));
                return;
            }
        }

        let pending = match pipeline.begin(session) {
            Ok(pending) => pending,
            Err(e) => {
                warn!("analysis skipped: {}", e);
                sink.emit(EcgEvent::AnalysisWarning(e));
                return;
            }
        };
        let processed = pending.processed.clone();

        match pipeline.complete(session, pending) {
            Ok(Some(report)) => {
                sink.emit(EcgEvent::DataUpdated {
                    processed,
                    heart_rate_bpm: Some(report.heart_rate_bpm),
                });
                if let Some(result) = report.classification {
                    sink.emit(EcgEvent::ClassificationReady(result));
                } else if let Some(message) = report.classification_error {
                    sink.emit(EcgEvent::AnalysisWarning(EcgError::ModelInference(message)));
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("analysis incomplete: {}", e);
                sink.emit(EcgEvent::DataUpdated {
                    processed,
                    heart_rate_bpm: None,
                });
                sink.emit(EcgEvent::AnalysisWarning(e));
            }
        }
    }

    fn transition(
        &mut self,
        next: AcquisitionState,
        session: &SharedSession,
        sink: &mut dyn EventSink,
    ) {
        if next == AcquisitionState::Polling {
            self.notified = false;
        }
        if self.state == next {
            return;
        }

        debug!("acquisition {} -> {}", self.state, next);
        self.state = next;
        lock_session(session).set_state(next);
        sink.emit(EcgEvent::StateChanged(next));
    }
}
