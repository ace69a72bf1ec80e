use crate::acquisition::{
    AcquisitionController, AcquisitionState, AcquisitionWorker, EcgEvent, HttpSource,
};
use crate::config::Config;
use crate::error::Result;
use crate::processing::pipeline::Pipeline;
use crate::processing::session::{Mode, Session};

use colored::{ColoredString, Colorize};
use std::sync::mpsc;
use std::sync::Arc;

const BAR_WIDTH: usize = 60;
const BPM_PER_BAR: f64 = 4.0;

/// Polls the configured server until the connection is given up.
pub fn run(config: &Config) -> Result<()> {
    let pipeline = Arc::new(Pipeline::from_config(config)?);
    let session = Session::new(Mode::Online).into_shared();

    let source = HttpSource::new(&config.acquisition.host, config.acquisition.timeout())?;
    println!("polling {}", source.url());
    let controller = AcquisitionController::new(source, config.acquisition.failure_policy);

    let (tx, rx) = mpsc::channel();
    let worker = AcquisitionWorker::spawn(
        controller,
        session,
        pipeline,
        tx,
        config.acquisition.poll_interval(),
    );

    // ends once the worker thread exits and drops its sender
    for event in rx {
        println!("{}", describe(&event));
    }
    worker.stop();

    Ok(())
}

pub fn describe(event: &EcgEvent) -> ColoredString {
    match event {
        EcgEvent::StateChanged(AcquisitionState::Disconnected) => {
            "disconnected, stopping acquisition".red()
        }
        EcgEvent::StateChanged(state) => format!("acquisition {}", state).cyan(),
        EcgEvent::DataUpdated {
            processed,
            heart_rate_bpm,
        } => {
            match heart_rate_bpm {
                Some(bpm) => format!(
                    "{:>6.1} bpm  {} beats  {}",
                    bpm,
                    processed.peaks.indices.len(),
                    "|".repeat(((bpm / BPM_PER_BAR) as usize).min(BAR_WIDTH))
                )
                .green(),
                None => format!("   --- bpm  {} beats", processed.peaks.indices.len()).yellow(),
            }
        }
        EcgEvent::ClassificationReady(result) => format!("Beat: {}", result).green(),
        EcgEvent::AnalysisWarning(error) => format!("warning: {}", error).yellow(),
        EcgEvent::AcquisitionFailed(error) => format!("{}", error).red(),
    }
}
