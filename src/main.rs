use colored::Colorize;
use ecg_monitor::config::{load_config, Config, OfflineConfig};
use ecg_monitor::local::process_file::read_ecg_csv;
use ecg_monitor::local::{analyze, monitor, server};
use ecg_monitor::utils::log::init_logging;
use ecg_monitor::Result;

use std::path::Path;
use std::process::exit;

const USAGE: &str = "usage: ecg-monitor <command>
  analyze <csv> [config]
  sweep <csv> [config]
  monitor [config]
  serve [csv] [config]
  export <csv> <out> [config]";

/// Length of the generated recording served when no file is given.
const SIMULATED_SAMPLES: usize = 11000;

fn load(path: Option<&String>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    init_logging(&config.processor.log_level)?;
    Ok(config)
}

fn run(args: &[String]) -> Result<()> {
    let arg = |i: usize| args.get(i);

    match (arg(1).map(String::as_str), arg(2), arg(3)) {
        (Some("analyze"), Some(csv), config) => {
            let config = load(config)?;
            analyze::run_analyze(Path::new(csv), &config)
        }
        (Some("sweep"), Some(csv), config) => {
            let config = load(config)?;
            analyze::run_sweep(Path::new(csv), &config)
        }
        (Some("monitor"), config, _) => {
            let config = load(config)?;
            monitor::run(&config)
        }
        (Some("serve"), None, _) => {
            let config = load(None)?;
            let samples = server::synthesize_ecg(SIMULATED_SAMPLES, config.processor.fs);
            server::serve(&config.server, samples)
        }
        (Some("serve"), Some(csv), config) => {
            let config = load(config)?;
            let selection = OfflineConfig {
                column: Some(config.server.column),
                max_samples: None,
                ..config.offline.clone()
            };
            let samples = read_ecg_csv(csv, &selection)?;
            server::serve(&config.server, samples)
        }
        (Some("export"), Some(csv), Some(out)) => {
            let config = load(arg(4))?;
            analyze::run_export(Path::new(csv), Path::new(out), &config.offline)
        }
        _ => {
            println!("{}", USAGE);
            Ok(())
        }
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if let Err(e) = run(&args) {
        eprintln!("{}", format!("error: {}", e).red());
        exit(1);
    }
}
