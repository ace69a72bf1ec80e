use crate::error::{EcgError, Result};

use log::LevelFilter;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

pub const LOG_DIR: &str = "logs";

/// Installs the terminal logger for the binary
///
/// # Arguments
///
/// * `level` - A `log` level name such as `"info"` or `"debug"`
///
/// # Returns
///
/// * `Result<()>` - `InvalidConfig` for an unknown level or a second install
pub fn init_logging(level: &str) -> Result<()> {
    let level: LevelFilter = level
        .parse()
        .map_err(|_| EcgError::InvalidConfig(format!("unknown log level '{}'", level)))?;

    simple_logger::SimpleLogger::new()
        .with_level(level)
        .with_colors(true)
        .init()
        .map_err(|e| EcgError::InvalidConfig(format!("logger already installed: {}", e)))
}

/// Appends a row to `logs/<filename>`, writing the header row first if the
/// file is new
///
/// # Arguments
///
/// * `filename` - The name of the CSV file inside `logs/`
/// * `headers` - Column headers (only written if file is new)
/// * `data` - Row of data to append
pub fn log_csv(filename: &str, headers: &[&str], data: &[&str]) -> io::Result<()> {
    log_csv_in(Path::new(LOG_DIR), filename, headers, data)
}

/// Same as [`log_csv`] with an explicit log directory.
pub fn log_csv_in(dir: &Path, filename: &str, headers: &[&str], data: &[&str]) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }

    let path = dir.join(filename);
    let file_exists = path.exists();

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);

    if !file_exists && !headers.is_empty() {
        writer.write_record(headers)?;
    }
    writer.write_record(data)?;
    writer.flush()?;

    Ok(())
}
