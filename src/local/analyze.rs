use crate::config::{Config, OfflineConfig};
use crate::error::{EcgError, Result};
use crate::local::process_file::{export_samples, read_ecg_csv};
use crate::processing::detectors::ThresholdPolicy;
use crate::processing::pipeline::{AnalysisReport, Pipeline};
use crate::processing::session::{lock_session, Mode, Session};
use crate::processing::signal::RawSignal;
use crate::processing::sweep::{sweep, DEFAULT_HIGHCUTS, DEFAULT_LOWCUTS};

use colored::Colorize;
use std::path::Path;

/// Offline analysis of one recording, printed to the terminal.
pub fn run_analyze(path: &Path, config: &Config) -> Result<()> {
    let samples = read_ecg_csv(path, &config.offline)?;
    let pipeline = Pipeline::from_config(config)?;

    let mut session = Session::new(Mode::Offline);
    session.load(samples, pipeline.fs())?;
    let shared = session.into_shared();

    match pipeline.analyze(&shared) {
        Ok(Some(report)) => print_report(&report),
        Ok(None) => {}
        Err(e @ (EcgError::InsufficientPeaks { .. } | EcgError::DivideByZero)) => {
            println!("{}", format!("warning: {}", e).yellow());
            let session = lock_session(&shared);
            if let Some(raw) = session.raw() {
                println!("{} samples at {} Hz", raw.len(), raw.fs());
            }
        }
        Err(e) => return Err(e),
    }

    Ok(())
}

pub fn print_report(report: &AnalysisReport) {
    let processed = &report.processed;
    println!(
        "{} samples, threshold {:.3}, peaks at {:?}",
        processed.normalized.len(),
        processed.threshold(),
        processed.peaks.indices
    );
    println!(
        "{}",
        format!("Heart rate: {:.1} bpm", report.heart_rate_bpm).green()
    );

    match (&report.classification, &report.classification_error) {
        (Some(result), _) => println!("{}", format!("Beat: {}", result).green()),
        (None, Some(error)) => {
            println!("{}", format!("classification unavailable: {}", error).yellow())
        }
        (None, None) => println!("no classifier configured"),
    }
}

/// Runs the exploratory filter grid over a recording.
pub fn run_sweep(path: &Path, config: &Config) -> Result<()> {
    let samples = read_ecg_csv(path, &config.offline)?;
    let raw = RawSignal::new(samples, config.processor.fs)?;

    let results = sweep(
        &raw,
        &DEFAULT_LOWCUTS,
        &DEFAULT_HIGHCUTS,
        config.filter.order,
        ThresholdPolicy::exploratory(),
    );

    println!("{:>8} {:>8} {:>6} {:>8}", "low Hz", "high Hz", "peaks", "bpm");
    for result in &results {
        let bpm = match result.heart_rate_bpm {
            Some(bpm) => format!("{:8.1}", bpm).green(),
            None => format!("{:>8}", "-").yellow(),
        };
        println!(
            "{:>8.1} {:>8.1} {:>6} {}",
            result.lowcut,
            result.highcut,
            result.peaks.len(),
            bpm
        );
    }

    Ok(())
}

/// Saves the selected slice of a recording as a single-column CSV.
pub fn run_export(input: &Path, output: &Path, offline: &OfflineConfig) -> Result<()> {
    let samples = read_ecg_csv(input, offline)?;
    export_samples(output, &samples)?;
    println!(
        "{}",
        format!("exported {} samples to {}", samples.len(), output.display()).green()
    );
    Ok(())
}
