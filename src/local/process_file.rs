use crate::config::OfflineConfig;
use crate::error::{EcgError, Result};

use log::info;
use std::fs::File;
use std::path::Path;

/// ECG column of the four-column recordings.
pub const ECG_COLUMN: usize = 2;

pub const EXPORT_HEADER: &str = "ecg";

/// Reads one ECG lead from a CSV recording.
///
/// Single-column files use that column; wider files use [`ECG_COLUMN`]
/// unless `config.column` says otherwise. Rows `[start_row, end_row)` are
/// kept (counted after the header), then at most `max_samples` of them.
pub fn read_ecg_csv<P: AsRef<Path>>(path: P, config: &OfflineConfig) -> Result<Vec<f64>> {
    let path = path.as_ref();
    if let Some(end_row) = config.end_row {
        if end_row <= config.start_row {
            return Err(EcgError::InvalidConfig(format!(
                "offline rows {}..{} select nothing",
                config.start_row, end_row
            )));
        }
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(config.has_header)
        .flexible(true)
        .from_reader(File::open(path)?);

    let span = config.end_row.map_or(usize::MAX, |end| end - config.start_row);
    let limit = config.max_samples.map_or(span, |max| span.min(max));

    let mut samples = Vec::new();
    for (offset, result) in rdr.records().skip(config.start_row).take(limit).enumerate() {
        let record = result?;
        let row = config.start_row + offset;

        let column = match config.column {
            Some(column) => column,
            None if record.len() == 1 => 0,
            None => ECG_COLUMN,
        };
        let field = record.get(column).ok_or_else(|| {
            EcgError::Input(format!(
                "row {} has {} columns, no column {}",
                row,
                record.len(),
                column
            ))
        })?;
        let value = field
            .trim()
            .parse::<f64>()
            .map_err(|e| EcgError::Input(format!("row {}: '{}': {}", row, field, e)))?;

        samples.push(value);
    }

    if samples.is_empty() {
        return Err(EcgError::Input(format!(
            "{} has no samples in the selected range",
            path.display()
        )));
    }

    info!("read {} samples from {}", samples.len(), path.display());
    Ok(samples)
}

/// Writes `samples` as a single-column CSV with an [`EXPORT_HEADER`] row,
/// readable again by [`read_ecg_csv`] with the default settings.
pub fn export_samples<P: AsRef<Path>>(path: P, samples: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record([EXPORT_HEADER])?;
    for sample in samples {
        writer.write_record([sample.to_string()])?;
    }
    writer.flush()?;

    info!("exported {} samples to {}", samples.len(), path.as_ref().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn four_columns(rows: usize) -> NamedTempFile {
        let mut contents = String::new();
        for i in 0..rows {
            contents.push_str(&format!("{},{},{}.5,{}\n", i, -(i as i64), i, i * 10));
        }
        write_csv(&contents)
    }

    fn unlimited() -> OfflineConfig {
        OfflineConfig {
            max_samples: None,
            has_header: false,
            ..OfflineConfig::default()
        }
    }

    #[test]
    fn multi_column_uses_ecg_column() {
        let file = four_columns(5);
        let samples = read_ecg_csv(file.path(), &unlimited()).unwrap();
        assert_eq!(samples, vec![0.5, 1.5, 2.5, 3.5, 4.5]);
    }

    #[test]
    fn column_override() {
        let file = four_columns(3);
        let config = OfflineConfig {
            column: Some(3),
            ..unlimited()
        };
        assert_eq!(read_ecg_csv(file.path(), &config).unwrap(), vec![0.0, 10.0, 20.0]);
    }

    #[test]
    fn single_column_with_header() {
        let file = write_csv("ecg\n0.1\n0.2\n0.3\n");
        let samples = read_ecg_csv(file.path(), &OfflineConfig::default()).unwrap();
        assert_eq!(samples, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn row_slice_then_sample_limit() {
        let file = four_columns(20);
        let config = OfflineConfig {
            start_row: 5,
            end_row: Some(15),
            max_samples: Some(4),
            ..unlimited()
        };
        let samples = read_ecg_csv(file.path(), &config).unwrap();
        assert_eq!(samples, vec![5.5, 6.5, 7.5, 8.5]);

        let config = OfflineConfig {
            max_samples: None,
            ..config
        };
        assert_eq!(read_ecg_csv(file.path(), &config).unwrap().len(), 10);
    }

    #[test]
    fn default_limit_is_500_samples() {
        let file = four_columns(800);
        let config = OfflineConfig {
            has_header: false,
            ..OfflineConfig::default()
        };
        assert_eq!(read_ecg_csv(file.path(), &config).unwrap().len(), 500);
    }

    #[test]
    fn bad_input_is_reported() {
        let file = write_csv("1.0\nabc\n");
        assert!(matches!(
            read_ecg_csv(file.path(), &unlimited()),
            Err(EcgError::Input(_))
        ));

        let file = four_columns(3);
        let config = OfflineConfig {
            start_row: 10,
            ..unlimited()
        };
        assert!(matches!(
            read_ecg_csv(file.path(), &config),
            Err(EcgError::Input(_))
        ));

        let config = OfflineConfig {
            start_row: 2,
            end_row: Some(2),
            ..unlimited()
        };
        assert!(matches!(
            read_ecg_csv(file.path(), &config),
            Err(EcgError::InvalidConfig(_))
        ));
    }

    #[test]
    fn export_can_be_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        let samples = vec![0.25, -1.5, 3.0];

        export_samples(&path, &samples).unwrap();
        let config = OfflineConfig {
            max_samples: None,
            ..OfflineConfig::default()
        };
        assert_eq!(read_ecg_csv(&path, &config).unwrap(), samples);
    }
}
