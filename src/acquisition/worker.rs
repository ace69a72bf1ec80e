use super::{AcquisitionController, AcquisitionState, DataSource, EcgEvent};
use crate::processing::pipeline::Pipeline;
use crate::processing::session::SharedSession;

use log::debug;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

enum Command {
    Stop,
}

/// Runs an [`AcquisitionController`] on its own thread, one tick per
/// `interval`.
///
/// The wait between ticks is a `recv_timeout` on the command channel, so a
/// stop request is seen as soon as the current fetch returns.
pub struct AcquisitionWorker {
    commands: Sender<Command>,
    handle: Option<JoinHandle<()>>,
}

impl AcquisitionWorker {
    pub fn spawn<S>(
        mut controller: AcquisitionController<S>,
        session: SharedSession,
        pipeline: Arc<Pipeline>,
        events: Sender<EcgEvent>,
        interval: Duration,
    ) -> Self
    where
        S: DataSource + Send + 'static,
    {
        let (commands, inbox) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut sink = events;
            controller.connect(&session, &mut sink);

            loop {
                let state = controller.tick(&session, &pipeline, &mut sink);
                if state == AcquisitionState::Disconnected {
                    debug!("acquisition worker exiting after disconnect");
                    break;
                }

                match inbox.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(Command::Stop) | Err(RecvTimeoutError::Disconnected) => {
                        controller.disconnect(&session, &mut sink);
                        break;
                    }
                }
            }
        });

        Self {
            commands,
            handle: Some(handle),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Stops polling and waits for the thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        let _ = self.commands.send(Command::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for AcquisitionWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::FailurePolicy;
    use crate::error::{EcgError, Result};
    use crate::processing::pipeline::ProcessingSettings;
    use crate::processing::session::{lock_session, Mode, Session};

    struct Steady(Vec<f64>);

    impl DataSource for Steady {
        fn fetch(&mut self) -> Result<Vec<f64>> {
            Ok(self.0.clone())
        }
    }

    struct Unreachable;

    impl DataSource for Unreachable {
        fn fetch(&mut self) -> Result<Vec<f64>> {
            Err(EcgError::Network("connection refused".to_string()))
        }
    }

    fn pipeline() -> Arc<Pipeline> {
        Arc::new(Pipeline::new(125.0, ProcessingSettings::default()))
    }

    #[test]
    fn stop_disconnects() {
        let mut samples = vec![0.0; 1000];
        for i in [100, 225, 350] {
            samples[i] = 1.0;
        }
        let session = Session::new(Mode::Online).into_shared();
        let (tx, rx) = mpsc::channel();
        let controller = AcquisitionController::new(Steady(samples), FailurePolicy::Stop);

        let worker = AcquisitionWorker::spawn(
            controller,
            Arc::clone(&session),
            pipeline(),
            tx,
            Duration::from_millis(10),
        );

        // wait for the first analysed window
        let mut updated = false;
        while let Ok(event) = rx.recv_timeout(Duration::from_secs(5)) {
            if let EcgEvent::DataUpdated { .. } = event {
                updated = true;
                break;
            }
        }
        assert!(updated);

        worker.stop();
        assert_eq!(lock_session(&session).state(), AcquisitionState::Disconnected);
    }

    #[test]
    fn exits_on_disconnect() {
        let session = Session::new(Mode::Online).into_shared();
        let (tx, rx) = mpsc::channel();
        let controller = AcquisitionController::new(Unreachable, FailurePolicy::Stop);

        let worker = AcquisitionWorker::spawn(
            controller,
            Arc::clone(&session),
            pipeline(),
            tx,
            Duration::from_millis(10),
        );

        // the channel closes when the worker thread drops its sender
        let events: Vec<EcgEvent> = rx.iter().collect();
        worker.stop();
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, EcgEvent::AcquisitionFailed(_)))
                .count(),
            1
        );
        assert!(matches!(
            events.last(),
            Some(EcgEvent::StateChanged(AcquisitionState::Disconnected))
        ));
    }
}
